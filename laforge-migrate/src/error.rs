//! Error types for the migration engine.

use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Errors that can occur during snapshot handling and migration emission.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization error.
    #[error("snapshot serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Snapshot written by an incompatible layout version.
    #[error("snapshot version {found} is not supported (expected {expected}); delete the snapshot and re-baseline")]
    SnapshotVersion { found: u32, expected: u32 },
}
