//! Capability interface over the platform camera stack.
//!
//! Platforms deliver open and configure results through callbacks, often on
//! their own threads. The traits keep that shape; the coordinator turns the
//! callbacks into events on its own serialized queue.

use crate::errors::{OpenFailureCause, PreviewError};
use crate::surface::SurfaceRef;
use crate::types::{CameraIdentity, FacingDirection, OutputFormat, Resolution};

/// An opened camera device, exclusively owned by one coordinator.
pub type CameraDeviceHandle = Box<dyn CameraDevice>;

/// A configured capture pipeline bound to one device and one surface.
pub type CaptureSessionHandle = Box<dyn CaptureSession>;

/// Completion of [`CameraBackend::open_device`]; may run on any thread.
pub type DeviceCallback = Box<dyn FnOnce(Result<CameraDeviceHandle, OpenFailureCause>) + Send>;

/// Completion of [`CameraDevice::create_session`]; may run on any thread.
pub type SessionCallback = Box<dyn FnOnce(Result<CaptureSessionHandle, String>) + Send>;

/// Platform camera registry and device opener.
///
/// One implementation is selected at startup (see [`crate::platform`]); the
/// rest of the crate only sees this trait.
pub trait CameraBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Identifiers of every physical camera, in platform order.
    fn camera_ids(&self) -> Result<Vec<String>, PreviewError>;

    /// Lens facing of a camera; `None` for cameras with no fixed facing
    /// (external cameras).
    fn lens_facing(&self, camera_id: &str) -> Result<Option<FacingDirection>, PreviewError>;

    /// Output sizes the camera supports for `format`, in platform order.
    fn output_sizes(
        &self,
        camera_id: &str,
        format: OutputFormat,
    ) -> Result<Vec<Resolution>, PreviewError>;

    /// Start opening a device. Must not block; `on_result` fires exactly once.
    fn open_device(&self, camera: &CameraIdentity, on_result: DeviceCallback);
}

pub trait CameraDevice: Send {
    fn camera_id(&self) -> &str;

    /// Start configuring a capture session with `surface` as its only output.
    /// Must not block; `on_result` fires exactly once.
    fn create_session(&mut self, surface: SurfaceRef, on_result: SessionCallback);

    /// Release the device. Any session created from it must already be closed.
    fn close(self: Box<Self>);
}

pub trait CaptureSession: Send {
    /// Issue a continuous preview request targeting `target`.
    fn set_repeating_preview(&mut self, target: &SurfaceRef) -> Result<(), PreviewError>;

    /// Stop the repeating request.
    fn stop_repeating(&mut self) -> Result<(), PreviewError>;

    /// Whether the platform needs [`CaptureSession::stop_repeating`] before
    /// [`CaptureSession::close`].
    fn requires_explicit_stop(&self) -> bool {
        true
    }

    fn close(self: Box<Self>);
}
