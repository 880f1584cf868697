//! Device-level error types.

use crate::backend::BackendError;
use thiserror::Error;

/// Errors surfaced by [`Device`](crate::Device) operations.
///
/// Every variant is returned before anything partial is left allocated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// A generic format has no native equivalent.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    /// The resource was not created with the capability the operation needs.
    #[error("capability mismatch: {0}")]
    CapabilityMismatch(String),
    /// A value or data block does not match its declared size.
    #[error("size mismatch for {what}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },
    /// The native API rejected an allocation.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// A bound-state slot index is past the fixed capacity.
    #[error("slot {slot} out of range (max {max})")]
    SlotOutOfRange { slot: usize, max: usize },
    #[error("invalid handle: {0}")]
    InvalidHandle(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type GraphicsResult<T> = Result<T, GraphicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::SlotOutOfRange { slot: 9, max: 8 };
        assert_eq!(err.to_string(), "slot 9 out of range (max 8)");

        let err = GraphicsError::SizeMismatch {
            what: "param 'color'".to_string(),
            expected: 16,
            actual: 12,
        };
        assert_eq!(
            err.to_string(),
            "size mismatch for param 'color': expected 16 bytes, got 12"
        );
    }

    #[test]
    fn test_backend_error_converts() {
        let err: GraphicsError = BackendError::OutOfMemory.into();
        assert_eq!(err, GraphicsError::Backend(BackendError::OutOfMemory));
        assert_eq!(err.to_string(), "Out of memory");
    }
}
