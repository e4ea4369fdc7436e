//! Platform detection and camera backend selection.
//!
//! The backend is chosen once, at startup; everything downstream depends only
//! on [`CameraBackend`].

#[cfg(feature = "native")]
pub mod native;

use crate::backend::CameraBackend;
use crate::errors::PreviewError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Android,
    Ios,
    Linux,
    MacOS,
    Windows,
    Unknown,
}

impl Platform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "android" => Platform::Android,
            "ios" => Platform::Ios,
            "linux" => Platform::Linux,
            "macos" => Platform::MacOS,
            "windows" => Platform::Windows,
            _ => Platform::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Linux => "linux",
            Platform::MacOS => "macos",
            Platform::Windows => "windows",
            Platform::Unknown => "unknown",
        }
    }

    /// Whether a built-in backend exists for this platform in this build.
    pub fn has_builtin_backend(&self) -> bool {
        cfg!(feature = "native")
            && matches!(self, Platform::Linux | Platform::MacOS | Platform::Windows)
    }
}

/// The camera backend for the current platform.
///
/// Mobile hosts supply their own [`CameraBackend`] over the platform camera
/// service; desktop builds with the `native` feature get a webcam backend.
pub fn default_backend() -> Result<Arc<dyn CameraBackend>, PreviewError> {
    let platform = Platform::current();

    #[cfg(all(
        feature = "native",
        any(target_os = "linux", target_os = "macos", target_os = "windows")
    ))]
    {
        log::info!("Using native webcam backend on {}", platform.as_str());
        Ok(Arc::new(native::NativeBackend::new()))
    }

    #[cfg(not(all(
        feature = "native",
        any(target_os = "linux", target_os = "macos", target_os = "windows")
    )))]
    {
        log::warn!("No built-in camera backend for {}", platform.as_str());
        Err(PreviewError::NotSupported(format!(
            "no built-in camera backend for {}",
            platform.as_str()
        )))
    }
}
