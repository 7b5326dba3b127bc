//! Error types for seamcarve.

use thiserror::Error;

/// Result alias for seamcarve operations.
pub type CarveResult<T> = std::result::Result<T, CarveError>;

/// Coarse classification of a [`CarveError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller broke an API contract; retrying the same call cannot succeed.
    ContractViolation,
    /// A buffer could not be allocated; a smaller request may succeed.
    Resource,
    /// The operation stopped because its cancel token was set.
    Cancelled,
}

/// Errors that can occur while carving.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CarveError {
    /// Width, height or channel count is zero or overflows.
    #[error("invalid dimensions: width={width}, height={height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The sample buffer does not hold exactly `width * height * channels` values.
    #[error("buffer length mismatch: expected {expected} samples, got {got}")]
    BufferLength { expected: usize, got: usize },
    /// A reader variant was used with an image of a different channel count.
    #[error("{reader} reader needs {expected} channel(s), image has {got}")]
    ChannelMismatch {
        reader: &'static str,
        expected: usize,
        got: usize,
    },
    /// A coordinate lies outside the current image bounds.
    #[error("coordinate ({x}, {y}) is outside a {width}x{height} image")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    /// A visibility cell already holds a generation.
    #[error("pixel ({x}, {y}) was already removed at generation {existing}")]
    GenerationReassigned { x: usize, y: usize, existing: u32 },
    /// A generation older than the last recorded one was submitted.
    #[error("generation {generation} is older than last recorded generation {last}")]
    GenerationOutOfOrder { generation: u32, last: u32 },
    /// A requested size is zero or outside the reachable range.
    #[error("invalid target size {width}x{height}")]
    InvalidTargetSize { width: usize, height: usize },
    /// A seam path does not fit the image it is applied to.
    #[error("invalid seam: {reason}")]
    InvalidSeam { reason: &'static str },
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A carver operation was invoked in the wrong state.
    #[error("carver is {state}, operation needs {expected}")]
    InvalidState {
        state: &'static str,
        expected: &'static str,
    },
    /// Reserving memory for a map or buffer failed.
    #[error("failed to allocate {len} elements for {what}")]
    Allocation { what: &'static str, len: usize },
    /// The cancel token was set while the operation was running.
    #[error("operation cancelled")]
    Cancelled,
}

impl CarveError {
    /// Classifies the error per the engine's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CarveError::Allocation { .. } => ErrorKind::Resource,
            CarveError::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::ContractViolation,
        }
    }
}
