//! Desktop webcam backend built on nokhwa.
//!
//! Webcams have no session handshake: configuring a session installs the
//! frame callback that feeds the surface, and the repeating request is the
//! open stream. Every webcam is reported as front facing.

use crate::backend::{
    CameraBackend, CameraDevice, CameraDeviceHandle, CaptureSession, DeviceCallback, SessionCallback,
};
use crate::errors::{OpenFailureCause, PreviewError};
use crate::surface::{PreviewFrame, SurfaceRef};
use crate::types::{CameraIdentity, FacingDirection, OutputFormat, Resolution};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    CallbackCamera,
};
use std::sync::{Arc, Mutex};

pub struct NativeBackend {
    api: ApiBackend,
}

impl NativeBackend {
    pub fn new() -> Self {
        Self { api: platform_api() }
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn platform_api() -> ApiBackend {
    #[cfg(target_os = "linux")]
    {
        ApiBackend::Video4Linux
    }
    #[cfg(target_os = "macos")]
    {
        ApiBackend::AVFoundation
    }
    #[cfg(target_os = "windows")]
    {
        ApiBackend::MediaFoundation
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        ApiBackend::Auto
    }
}

impl CameraBackend for NativeBackend {
    fn name(&self) -> &str {
        "nokhwa"
    }

    fn camera_ids(&self) -> Result<Vec<String>, PreviewError> {
        let cameras = query(self.api)
            .map_err(|e| PreviewError::CatalogError(format!("Failed to query cameras: {}", e)))?;
        Ok(cameras
            .iter()
            .map(|camera_info| camera_info.index().to_string())
            .collect())
    }

    // Ids come from `camera_ids`, so only their shape is checked here
    // rather than querying the devices again.
    fn lens_facing(&self, camera_id: &str) -> Result<Option<FacingDirection>, PreviewError> {
        webcam_index(camera_id)?;
        Ok(Some(FacingDirection::Front))
    }

    fn output_sizes(
        &self,
        camera_id: &str,
        format: OutputFormat,
    ) -> Result<Vec<Resolution>, PreviewError> {
        webcam_index(camera_id)?;
        // Common webcam modes; MJPEG streams rarely offer the smallest size.
        let sizes = match format {
            OutputFormat::Jpeg => vec![Resolution::new(1920, 1080), Resolution::new(1280, 720)],
            OutputFormat::Yuv420 | OutputFormat::Private => vec![
                Resolution::new(1920, 1080),
                Resolution::new(1280, 720),
                Resolution::new(640, 480),
            ],
        };
        Ok(sizes)
    }

    fn open_device(&self, camera: &CameraIdentity, on_result: DeviceCallback) {
        let camera_id = camera.id.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(move || on_result(open_camera(&camera_id)));
            }
            Err(_) => on_result(open_camera(&camera_id)),
        }
    }
}

fn webcam_index(camera_id: &str) -> Result<u32, PreviewError> {
    camera_id
        .parse::<u32>()
        .map_err(|_| PreviewError::CatalogError(format!("Unknown camera id {}", camera_id)))
}

fn open_camera(camera_id: &str) -> Result<CameraDeviceHandle, OpenFailureCause> {
    let index = webcam_index(camera_id).map_err(|e| {
        log::error!("{}", e);
        OpenFailureCause::Unknown
    })?;

    let requested_format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
    let camera = CallbackCamera::new(CameraIndex::Index(index), requested_format, |_| {})
        .map_err(|e| {
            let message = e.to_string();
            log::error!("Failed to open webcam {}: {}", camera_id, message);
            classify_open_error(&message)
        })?;

    Ok(Box::new(NativeDevice {
        id: camera_id.to_string(),
        camera: Arc::new(Mutex::new(camera)),
    }))
}

fn classify_open_error(message: &str) -> OpenFailureCause {
    let lower = message.to_lowercase();
    if lower.contains("busy") || lower.contains("in use") {
        OpenFailureCause::Busy
    } else if lower.contains("permission") || lower.contains("denied") {
        OpenFailureCause::Disabled
    } else {
        OpenFailureCause::Unknown
    }
}

struct NativeDevice {
    id: String,
    camera: Arc<Mutex<CallbackCamera>>,
}

// The camera is only touched through the mutex.
unsafe impl Send for NativeDevice {}

impl CameraDevice for NativeDevice {
    fn camera_id(&self) -> &str {
        &self.id
    }

    fn create_session(&mut self, surface: SurfaceRef, on_result: SessionCallback) {
        let target = surface.clone();
        let installed = match self.camera.lock() {
            Ok(mut camera) => camera
                .set_callback(move |buffer: nokhwa::Buffer| {
                    let frame = PreviewFrame {
                        width: buffer.resolution().width_x,
                        height: buffer.resolution().height_y,
                        format: buffer.source_frame_format().to_string(),
                        data: buffer.buffer_bytes().to_vec(),
                    };
                    target.present_frame(&frame);
                })
                .map_err(|e| format!("Failed to set frame callback: {}", e)),
            Err(_) => Err("Failed to lock camera".to_string()),
        };

        match installed {
            Ok(()) => on_result(Ok(Box::new(NativeSession {
                camera_id: self.id.clone(),
                camera: self.camera.clone(),
            }))),
            Err(message) => on_result(Err(message)),
        }
    }

    fn close(self: Box<Self>) {
        if let Ok(mut camera) = self.camera.lock() {
            let _ = camera.stop_stream();
        }
        log::info!("Closed webcam {}", self.id);
    }
}

struct NativeSession {
    camera_id: String,
    camera: Arc<Mutex<CallbackCamera>>,
}

unsafe impl Send for NativeSession {}

impl CaptureSession for NativeSession {
    fn set_repeating_preview(&mut self, _target: &SurfaceRef) -> Result<(), PreviewError> {
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| PreviewError::SessionConfigFailed("Failed to lock camera".to_string()))?;
        camera.open_stream().map_err(|e| {
            PreviewError::SessionConfigFailed(format!(
                "Failed to start stream on {}: {}",
                self.camera_id, e
            ))
        })
    }

    fn stop_repeating(&mut self) -> Result<(), PreviewError> {
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| PreviewError::SessionConfigFailed("Failed to lock camera".to_string()))?;
        camera.stop_stream().map_err(|e| {
            PreviewError::SessionConfigFailed(format!(
                "Failed to stop stream on {}: {}",
                self.camera_id, e
            ))
        })
    }

    fn close(self: Box<Self>) {
        log::debug!("Closed capture session on webcam {}", self.camera_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_open_error() {
        assert_eq!(classify_open_error("Device or resource busy"), OpenFailureCause::Busy);
        assert_eq!(classify_open_error("Permission denied"), OpenFailureCause::Disabled);
        assert_eq!(classify_open_error("no such device"), OpenFailureCause::Unknown);
    }

    #[test]
    fn test_lookups_trust_numeric_ids() {
        let backend = NativeBackend::new();
        assert_eq!(backend.lens_facing("0"), Ok(Some(FacingDirection::Front)));
        assert_eq!(
            backend.output_sizes("2", OutputFormat::Jpeg).map(|sizes| sizes.len()),
            Ok(2)
        );
        assert!(matches!(
            backend.lens_facing("usb-cam"),
            Err(PreviewError::CatalogError(_))
        ));
    }
}
