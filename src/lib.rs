//! camera-preview: the camera-preview core of a mobile camera application.
//!
//! This crate resolves a camera by facing direction, negotiates an output
//! size against the host surface, and drives the device/session lifecycle
//! behind a single serialized coordinator.
//!
//! # Features
//! - Output size selection by exact aspect ratio and size bounds
//! - Camera lookup by facing direction over a pluggable backend
//! - Asynchronous, cancellable open/configure/teardown state machine
//! - Surface lifecycle binding with facing toggle and aspect ratio cycling
//! - Scriptable simulated backend for offline testing
//!
//! # Usage
//! ```rust,ignore
//! use camera_preview::{BindingOptions, PermissionGate, PreviewSurfaceBinding};
//!
//! let backend = camera_preview::platform::default_backend()?;
//! let binding = PreviewSurfaceBinding::new(backend, PermissionGate::granted(), BindingOptions::default())?;
//! let started = binding.on_surface_created(surface).await?;
//! ```
pub mod backend;
pub mod binding;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod invariants;
pub mod permissions;
pub mod platform;
pub mod sizes;
pub mod surface;
pub mod types;

// Testing utilities - simulated camera stack for offline testing
pub mod testing;

// Re-exports for convenience
pub use backend::{CameraBackend, CameraDevice, CaptureSession};
pub use binding::{BindingOptions, PreviewStart, PreviewSurfaceBinding};
pub use catalog::{CameraCatalog, CameraMatch};
pub use config::PreviewConfig;
pub use coordinator::{CameraSessionCoordinator, PreviewState, StateChange, TeardownOutcome};
pub use errors::{OpenFailureCause, PreviewError};
pub use permissions::{PermissionGate, PermissionStatus};
pub use platform::Platform;
pub use sizes::select_optimal;
pub use surface::{AutoFitLayout, PreviewSurface, SurfaceRef};
pub use types::{AspectRatio, CameraIdentity, FacingDirection, OutputFormat, Resolution, SizeConstraints};

/// Detect the current platform
pub fn current_platform() -> Platform {
    Platform::current()
}

/// Initialize logging for the camera preview
pub fn init_logging() {
    init_logging_with(&PreviewConfig::default())
}

/// Initialize logging using the filter from `config` when RUST_LOG is unset
pub fn init_logging_with(config: &PreviewConfig) {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &config.logging.filter);
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        platform: Platform::current(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub platform: Platform,
}
