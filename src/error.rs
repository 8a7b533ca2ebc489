//! Error types for scullmem
//!
//! Provides a unified error type for all device operations.

use std::io;

use thiserror::Error;

/// Result type alias using ScullError
pub type Result<T> = std::result::Result<T, ScullError>;

/// Unified error type for scullmem operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScullError {
    // -------------------------------------------------------------------------
    // Locking
    // -------------------------------------------------------------------------
    /// Lock acquisition was interrupted. Nothing was changed; retry.
    #[error("interrupted while waiting for the device lock")]
    Interrupted,

    // -------------------------------------------------------------------------
    // Allocation
    // -------------------------------------------------------------------------
    #[error("out of memory")]
    OutOfMemory,

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("bad caller buffer: requested {requested} bytes, buffer holds {available}")]
    BoundaryFault { requested: usize, available: usize },

    #[error("unsupported control command {0:#x}")]
    UnsupportedCommand(u32),

    #[error("no such device: {0}")]
    NoDevice(usize),

    // -------------------------------------------------------------------------
    // State Errors
    // -------------------------------------------------------------------------
    /// Truncation refused because the device has active mappings.
    #[error("device busy: active mappings")]
    Busy,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl ScullError {
    /// Whether the caller may simply reissue the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScullError::Interrupted)
    }
}

impl From<ScullError> for io::Error {
    fn from(err: ScullError) -> Self {
        let kind = match err {
            ScullError::Interrupted => io::ErrorKind::Interrupted,
            ScullError::OutOfMemory => io::ErrorKind::OutOfMemory,
            ScullError::InvalidArgument(_) | ScullError::BoundaryFault { .. } => {
                io::ErrorKind::InvalidInput
            }
            ScullError::UnsupportedCommand(_) => io::ErrorKind::Unsupported,
            ScullError::NoDevice(_) => io::ErrorKind::NotFound,
            ScullError::Busy | ScullError::Config(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
