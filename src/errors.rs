//! Error types for camera discovery, size negotiation and the session lifecycle.

use crate::types::FacingDirection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the platform refused to open a camera device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenFailureCause {
    Busy,
    Disabled,
    FatalDevice,
    FatalService,
    TooManyOpen,
    Unknown,
}

impl OpenFailureCause {
    /// Maps the numeric device error codes reported by camera device callbacks.
    pub fn from_platform_code(code: i32) -> Self {
        match code {
            1 => OpenFailureCause::Busy,
            2 => OpenFailureCause::TooManyOpen,
            3 => OpenFailureCause::Disabled,
            4 => OpenFailureCause::FatalDevice,
            5 => OpenFailureCause::FatalService,
            _ => OpenFailureCause::Unknown,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            OpenFailureCause::Busy => "Camera in use",
            OpenFailureCause::Disabled => "Device policy",
            OpenFailureCause::FatalDevice => "Fatal (device)",
            OpenFailureCause::FatalService => "Fatal (service)",
            OpenFailureCause::TooManyOpen => "Maximum cameras in use",
            OpenFailureCause::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for OpenFailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum PreviewError {
    #[error("Permission denied: camera access has not been granted")]
    PermissionDenied,
    #[error("Camera catalog error: {0}")]
    CatalogError(String),
    #[error("No {0} camera found")]
    NotFound(FacingDirection),
    #[error("Camera {camera_id} error: {cause}")]
    DeviceOpenFailed {
        camera_id: String,
        cause: OpenFailureCause,
    },
    #[error("Session configuration failed: {0}")]
    SessionConfigFailed(String),
    #[error("Camera {0} is already opening")]
    AlreadyOpening(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Open of camera {0} was cancelled by teardown")]
    Cancelled(String),
    #[error("Session coordinator is no longer running")]
    CoordinatorClosed,
    #[error("Not supported: {0}")]
    NotSupported(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PreviewError {
    /// Short text the host can show in its error view.
    pub fn user_message(&self) -> &'static str {
        match self {
            PreviewError::PermissionDenied => "Camera permission is required",
            PreviewError::NotFound(_) | PreviewError::CatalogError(_) => "No camera available",
            PreviewError::DeviceOpenFailed {
                cause: OpenFailureCause::Busy | OpenFailureCause::TooManyOpen,
                ..
            } => "Camera is in use by another application",
            PreviewError::DeviceOpenFailed {
                cause: OpenFailureCause::Disabled,
                ..
            } => "Camera is disabled by device policy",
            _ => "Camera unavailable",
        }
    }
}
