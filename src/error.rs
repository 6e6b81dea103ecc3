//! Capture error types
//!
//! Every platform failure surfaces immediately as one of these kinds. Nothing in
//! the crate retries; transient and permanent failures look the same.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("screen capture is not supported here: {0}")]
    UnsupportedPlatform(String),

    #[error("failed to acquire drawing surface: {0}")]
    Acquisition(String),

    #[error("failed to allocate capture surface: {0}")]
    Allocation(String),

    #[error("pixel copy failed: {0}")]
    Blit(String),

    #[error("monitor enumeration failed: {0}")]
    Enumeration(String),

    #[error("invalid display index {index} ({count} active displays)")]
    Index { index: i64, count: usize },

    #[error("invalid capture size {width}x{height}")]
    Dimension { width: i64, height: i64 },

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    CorruptBuffer { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, CaptureError>;

impl CaptureError {
    pub fn dimension(width: impl Into<i64>, height: impl Into<i64>) -> Self {
        CaptureError::Dimension {
            width: width.into(),
            height: height.into(),
        }
    }

    /// Platform failures worth logging at warn level; argument errors are not.
    pub fn is_platform_failure(&self) -> bool {
        !matches!(
            self,
            CaptureError::Index { .. }
                | CaptureError::Dimension { .. }
                | CaptureError::UnsupportedPlatform(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_error_message_names_the_count() {
        let err = CaptureError::Index { index: -1, count: 2 };
        assert_eq!(err.to_string(), "invalid display index -1 (2 active displays)");
    }

    #[test]
    fn argument_errors_are_not_platform_failures() {
        assert!(!CaptureError::dimension(0, 10).is_platform_failure());
        assert!(!CaptureError::Index { index: 3, count: 1 }.is_platform_failure());
        assert!(CaptureError::Blit("BitBlt".into()).is_platform_failure());
    }
}
