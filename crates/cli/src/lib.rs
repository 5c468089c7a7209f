//! CLI for planning coverage over partitioned hash rings.
//!
//! Provides commands for:
//! - Computing coverage and subpartitioned plans
//! - Locating keys on the ring
//! - Inspecting ring ownership

pub mod commands;
pub mod config;

pub use commands::Command;
pub use config::CliConfig;
