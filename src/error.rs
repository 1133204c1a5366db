use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("Browser error: {0}")]
    BrowserError(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Screenshot capture failed: {0}")]
    CaptureFailed(String),

    #[error("Image encoding failed: {0}")]
    EncodingFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CaptureError {
    /// Whether the run left (or may have left) a partial artifact on disk.
    ///
    /// Only the write step touches the filesystem; everything upstream fails
    /// before the destination file is created.
    pub fn may_leave_partial_file(&self) -> bool {
        matches!(self, CaptureError::IoError(_))
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        CaptureError::EncodingFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CaptureError = io.into();
        assert!(matches!(err, CaptureError::IoError(_)));
        assert!(err.may_leave_partial_file());
    }

    #[test]
    fn test_upstream_errors_leave_no_file() {
        assert!(!CaptureError::CaptureFailed("x".to_string()).may_leave_partial_file());
        assert!(!CaptureError::EncodingFailed("x".to_string()).may_leave_partial_file());
        assert!(!CaptureError::BrowserLaunchFailed("x".to_string()).may_leave_partial_file());
    }
}
