//! Error types for the ring core.

use thiserror::Error;

/// Result type alias for the ring core.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or querying ring metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Partition counts must be nonzero powers of two so that partitions
    /// divide the hash space evenly.
    #[error("partition count must be a nonzero power of two, got {0}")]
    InvalidPartitionCount(u64),

    /// A ring cannot be built without at least one node to own partitions.
    #[error("cannot build a ring with no nodes")]
    NoNodes,
}
