use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a camera failure, shared by capability and session errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unavailable,
    PermissionDenied,
    HardwareBusy,
    Unsupported,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::HardwareBusy => "hardware_busy",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported by a camera capability (open or capture).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct CameraError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CameraError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, message)
    }

    pub fn hardware_busy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HardwareBusy, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Build an error from free-form backend text, inferring the kind from keywords.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        let kind = if lower.contains("permission")
            || lower.contains("denied")
            || lower.contains("not authorized")
        {
            ErrorKind::PermissionDenied
        } else if lower.contains("busy") || lower.contains("in use") {
            ErrorKind::HardwareBusy
        } else if lower.contains("not supported")
            || lower.contains("unsupported")
            || lower.contains("not implemented")
        {
            ErrorKind::Unsupported
        } else if lower.contains("not found")
            || lower.contains("no such device")
            || lower.contains("disconnected")
            || lower.contains("unavailable")
        {
            ErrorKind::Unavailable
        } else {
            ErrorKind::Unknown
        };

        Self { kind, message }
    }
}

/// Failure surfaced by `CameraSessionController`.
///
/// Stored inside `SessionState::Failed` and the last capture slot, so it is
/// cheap to clone and serializable for the plugin boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionError {
    #[error("No camera device available")]
    NoDeviceAvailable,
    #[error("Failed to open camera ({kind}): {message}")]
    OpenFailed { kind: ErrorKind, message: String },
    #[error("Failed to capture photo ({kind}): {message}")]
    CaptureFailed { kind: ErrorKind, message: String },
    #[error("Camera switch unavailable: fewer than two devices")]
    SwitchUnavailable,
}

impl SessionError {
    pub fn open_failed(error: CameraError) -> Self {
        SessionError::OpenFailed {
            kind: error.kind,
            message: error.message,
        }
    }

    pub fn capture_failed(error: CameraError) -> Self {
        SessionError::CaptureFailed {
            kind: error.kind,
            message: error.message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::NoDeviceAvailable => ErrorKind::Unavailable,
            SessionError::OpenFailed { kind, .. } => *kind,
            SessionError::CaptureFailed { kind, .. } => *kind,
            SessionError::SwitchUnavailable => ErrorKind::Unsupported,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keywords() {
        assert_eq!(
            CameraError::classify("Permission denied by user").kind,
            ErrorKind::PermissionDenied
        );
        assert_eq!(
            CameraError::classify("Device or resource busy").kind,
            ErrorKind::HardwareBusy
        );
        assert_eq!(
            CameraError::classify("Format not supported").kind,
            ErrorKind::Unsupported
        );
        assert_eq!(
            CameraError::classify("No such device").kind,
            ErrorKind::Unavailable
        );
        assert_eq!(CameraError::classify("boom").kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_classify_keeps_message() {
        let error = CameraError::classify("Camera in use by another app");
        assert_eq!(error.message, "Camera in use by another app");
        assert_eq!(error.to_string(), "Camera in use by another app");
    }

    #[test]
    fn test_session_error_kind() {
        assert_eq!(
            SessionError::NoDeviceAvailable.kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            SessionError::SwitchUnavailable.kind(),
            ErrorKind::Unsupported
        );
        let err = SessionError::capture_failed(CameraError::hardware_busy("busy"));
        assert_eq!(err.kind(), ErrorKind::HardwareBusy);
    }
}
