//! Error types for coverage planning.

use thiserror::Error;

/// Result type alias for coverage planning.
pub type Result<T> = std::result::Result<T, CoverageError>;

/// Errors produced while building a coverage plan.
///
/// Ring construction failures propagate unchanged; everything else is
/// produced by the planner itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoverageError {
    /// The available vnodes cannot cover every partition the requested
    /// number of times. Only surfaced when the caller demanded full
    /// coverage; best-effort requests get a partial plan instead.
    #[error("insufficient vnodes available to cover the keyspace")]
    InsufficientVnodes,

    #[error("replication factor must be positive")]
    ZeroReplicationFactor,

    #[error("coverage factor must be positive")]
    ZeroCoverageFactor,

    /// Subpartition counts must be powers of two no smaller than the
    /// partition count, so each subpartition is an equal bit-range within a
    /// single partition.
    #[error("invalid subpartition count {0}")]
    InvalidSubpartitionCount(u64),

    /// A subpartitioned request names the ring size it was computed
    /// against; planning it against a different ring would mis-route every
    /// subpartition.
    #[error("request was built for a {requested}-partition ring but the current ring has {actual}")]
    RingSizeMismatch { requested: u32, actual: u32 },

    #[error(transparent)]
    Ring(#[from] ringcore::Error),
}
