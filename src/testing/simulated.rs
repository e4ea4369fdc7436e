//! Scriptable in-memory camera stack.
//!
//! `SimulatedBackend` behaves like a callback-driven platform camera service:
//! each camera can succeed, fail, or hold its callback until the test releases
//! it, and every device/session operation is written to an ordered journal.

use crate::backend::{
    CameraBackend, CameraDevice, CameraDeviceHandle, CaptureSession, DeviceCallback, SessionCallback,
};
use crate::errors::{OpenFailureCause, PreviewError};
use crate::surface::{PreviewSurface, SurfaceRef};
use crate::types::{CameraIdentity, FacingDirection, OutputFormat, Resolution};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// How a simulated camera answers an open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenBehavior {
    Succeed,
    Fail(OpenFailureCause),
    /// Hold the callback until [`SimulatedBackend::complete_open`] or
    /// [`SimulatedBackend::fail_open`].
    Defer,
}

/// How a simulated device answers a session configuration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBehavior {
    Succeed,
    Fail,
    /// Hold the callback until [`SimulatedBackend::complete_session`] or
    /// [`SimulatedBackend::fail_session`].
    Defer,
    /// Configure, then reject the repeating request.
    RejectRepeating,
}

/// One device or session operation, in the order the backend saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    OpenRequested(String),
    DeviceOpened(String),
    OpenFailed(String, OpenFailureCause),
    SessionRequested(String),
    SessionConfigured(String),
    SessionFailed(String),
    RepeatingStarted(String),
    RepeatingStopped(String),
    SessionClosed(String),
    DeviceClosed(String),
}

#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    pub id: String,
    pub facing: Option<FacingDirection>,
    pub sizes: Vec<Resolution>,
    pub open: OpenBehavior,
    pub session: SessionBehavior,
}

impl SimulatedCamera {
    pub fn new(id: impl Into<String>, facing: FacingDirection, sizes: Vec<Resolution>) -> Self {
        Self {
            id: id.into(),
            facing: Some(facing),
            sizes,
            open: OpenBehavior::Succeed,
            session: SessionBehavior::Succeed,
        }
    }

    /// A camera with no fixed facing, like an external USB camera.
    pub fn external(id: impl Into<String>, sizes: Vec<Resolution>) -> Self {
        Self {
            facing: None,
            ..Self::new(id, FacingDirection::Back, sizes)
        }
    }
}

#[derive(Default)]
struct Shared {
    cameras: Vec<SimulatedCamera>,
    registry_error: Option<String>,
    journal: Vec<BackendEvent>,
    pending_opens: HashMap<String, DeviceCallback>,
    pending_sessions: HashMap<String, (SessionCallback, SurfaceRef)>,
    open_devices: usize,
    peak_open_devices: usize,
}

type SharedRef = Arc<Mutex<Shared>>;

fn lock(shared: &SharedRef) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|e| e.into_inner())
}

/// In-memory [`CameraBackend`].
#[derive(Clone, Default)]
pub struct SimulatedBackend {
    shared: SharedRef,
}

impl SimulatedBackend {
    pub fn new(cameras: Vec<SimulatedCamera>) -> Self {
        let backend = Self::default();
        lock(&backend.shared).cameras = cameras;
        backend
    }

    /// A typical phone: back camera "0" and front camera "1".
    pub fn phone() -> Self {
        let back = vec![
            Resolution::new(4032, 3024),
            Resolution::new(3840, 2160),
            Resolution::new(1920, 1080),
            Resolution::new(1280, 720),
            Resolution::new(640, 480),
        ];
        let front = vec![
            Resolution::new(2592, 1944),
            Resolution::new(1920, 1080),
            Resolution::new(1280, 720),
            Resolution::new(640, 480),
        ];
        Self::new(vec![
            SimulatedCamera::new("0", FacingDirection::Back, back),
            SimulatedCamera::new("1", FacingDirection::Front, front),
        ])
    }

    /// Make every registry query fail with `message`.
    pub fn fail_registry(&self, message: impl Into<String>) {
        lock(&self.shared).registry_error = Some(message.into());
    }

    pub fn set_open_behavior(&self, camera_id: &str, behavior: OpenBehavior) {
        if let Some(camera) = lock(&self.shared).cameras.iter_mut().find(|c| c.id == camera_id) {
            camera.open = behavior;
        }
    }

    pub fn set_session_behavior(&self, camera_id: &str, behavior: SessionBehavior) {
        if let Some(camera) = lock(&self.shared).cameras.iter_mut().find(|c| c.id == camera_id) {
            camera.session = behavior;
        }
    }

    /// Deliver a deferred open successfully. Returns false if none was pending.
    pub fn complete_open(&self, camera_id: &str) -> bool {
        let Some(callback) = lock(&self.shared).pending_opens.remove(camera_id) else {
            return false;
        };
        let device = SimulatedDevice::open(&self.shared, camera_id);
        callback(Ok(device));
        true
    }

    /// Deliver a deferred open as a failure. Returns false if none was pending.
    pub fn fail_open(&self, camera_id: &str, cause: OpenFailureCause) -> bool {
        let Some(callback) = lock(&self.shared).pending_opens.remove(camera_id) else {
            return false;
        };
        record(&self.shared, BackendEvent::OpenFailed(camera_id.to_string(), cause));
        callback(Err(cause));
        true
    }

    /// Deliver a deferred session configuration successfully.
    pub fn complete_session(&self, camera_id: &str) -> bool {
        let Some((callback, _surface)) = lock(&self.shared).pending_sessions.remove(camera_id) else {
            return false;
        };
        record(&self.shared, BackendEvent::SessionConfigured(camera_id.to_string()));
        callback(Ok(Box::new(SimulatedSession::new(&self.shared, camera_id, false))));
        true
    }

    /// Deliver a deferred session configuration as a failure.
    pub fn fail_session(&self, camera_id: &str) -> bool {
        let Some((callback, _surface)) = lock(&self.shared).pending_sessions.remove(camera_id) else {
            return false;
        };
        record(&self.shared, BackendEvent::SessionFailed(camera_id.to_string()));
        callback(Err("configuration rejected".to_string()));
        true
    }

    pub fn has_pending_open(&self, camera_id: &str) -> bool {
        lock(&self.shared).pending_opens.contains_key(camera_id)
    }

    pub fn has_pending_session(&self, camera_id: &str) -> bool {
        lock(&self.shared).pending_sessions.contains_key(camera_id)
    }

    /// Every operation so far, in order.
    pub fn journal(&self) -> Vec<BackendEvent> {
        lock(&self.shared).journal.clone()
    }

    /// Devices currently open.
    pub fn open_devices(&self) -> usize {
        lock(&self.shared).open_devices
    }

    /// Highest number of devices that were open at the same moment.
    pub fn peak_open_devices(&self) -> usize {
        lock(&self.shared).peak_open_devices
    }

    fn camera(&self, camera_id: &str) -> Result<SimulatedCamera, PreviewError> {
        let shared = lock(&self.shared);
        if let Some(message) = &shared.registry_error {
            return Err(PreviewError::CatalogError(message.clone()));
        }
        shared
            .cameras
            .iter()
            .find(|c| c.id == camera_id)
            .cloned()
            .ok_or_else(|| PreviewError::CatalogError(format!("unknown camera id {}", camera_id)))
    }
}

fn record(shared: &SharedRef, event: BackendEvent) {
    lock(shared).journal.push(event);
}

impl CameraBackend for SimulatedBackend {
    fn name(&self) -> &str {
        "simulated"
    }

    fn camera_ids(&self) -> Result<Vec<String>, PreviewError> {
        let shared = lock(&self.shared);
        if let Some(message) = &shared.registry_error {
            return Err(PreviewError::CatalogError(message.clone()));
        }
        Ok(shared.cameras.iter().map(|c| c.id.clone()).collect())
    }

    fn lens_facing(&self, camera_id: &str) -> Result<Option<FacingDirection>, PreviewError> {
        Ok(self.camera(camera_id)?.facing)
    }

    fn output_sizes(
        &self,
        camera_id: &str,
        _format: OutputFormat,
    ) -> Result<Vec<Resolution>, PreviewError> {
        Ok(self.camera(camera_id)?.sizes)
    }

    fn open_device(&self, camera: &CameraIdentity, on_result: DeviceCallback) {
        record(&self.shared, BackendEvent::OpenRequested(camera.id.clone()));
        let behavior = match self.camera(&camera.id) {
            Ok(found) => found.open,
            Err(_) => OpenBehavior::Fail(OpenFailureCause::Unknown),
        };

        match behavior {
            OpenBehavior::Succeed => {
                let device = SimulatedDevice::open(&self.shared, &camera.id);
                on_result(Ok(device));
            }
            OpenBehavior::Fail(cause) => {
                record(&self.shared, BackendEvent::OpenFailed(camera.id.clone(), cause));
                on_result(Err(cause));
            }
            OpenBehavior::Defer => {
                lock(&self.shared)
                    .pending_opens
                    .insert(camera.id.clone(), on_result);
            }
        }
    }
}

struct SimulatedDevice {
    id: String,
    shared: SharedRef,
}

impl SimulatedDevice {
    fn open(shared: &SharedRef, camera_id: &str) -> CameraDeviceHandle {
        {
            let mut guard = lock(shared);
            guard.open_devices += 1;
            guard.peak_open_devices = guard.peak_open_devices.max(guard.open_devices);
            guard.journal.push(BackendEvent::DeviceOpened(camera_id.to_string()));
        }
        Box::new(Self {
            id: camera_id.to_string(),
            shared: shared.clone(),
        })
    }

    fn session_behavior(&self) -> SessionBehavior {
        lock(&self.shared)
            .cameras
            .iter()
            .find(|c| c.id == self.id)
            .map(|c| c.session)
            .unwrap_or(SessionBehavior::Succeed)
    }
}

impl CameraDevice for SimulatedDevice {
    fn camera_id(&self) -> &str {
        &self.id
    }

    fn create_session(&mut self, surface: SurfaceRef, on_result: SessionCallback) {
        record(&self.shared, BackendEvent::SessionRequested(self.id.clone()));
        match self.session_behavior() {
            SessionBehavior::Succeed | SessionBehavior::RejectRepeating => {
                let reject = self.session_behavior() == SessionBehavior::RejectRepeating;
                record(&self.shared, BackendEvent::SessionConfigured(self.id.clone()));
                on_result(Ok(Box::new(SimulatedSession::new(&self.shared, &self.id, reject))));
            }
            SessionBehavior::Fail => {
                record(&self.shared, BackendEvent::SessionFailed(self.id.clone()));
                on_result(Err("configuration rejected".to_string()));
            }
            SessionBehavior::Defer => {
                lock(&self.shared)
                    .pending_sessions
                    .insert(self.id.clone(), (on_result, surface));
            }
        }
    }

    fn close(self: Box<Self>) {
        let mut guard = lock(&self.shared);
        guard.open_devices = guard.open_devices.saturating_sub(1);
        guard.journal.push(BackendEvent::DeviceClosed(self.id.clone()));
    }
}

struct SimulatedSession {
    camera_id: String,
    shared: SharedRef,
    reject_repeating: bool,
}

impl SimulatedSession {
    fn new(shared: &SharedRef, camera_id: &str, reject_repeating: bool) -> Self {
        Self {
            camera_id: camera_id.to_string(),
            shared: shared.clone(),
            reject_repeating,
        }
    }
}

impl CaptureSession for SimulatedSession {
    fn set_repeating_preview(&mut self, target: &SurfaceRef) -> Result<(), PreviewError> {
        if self.reject_repeating {
            return Err(PreviewError::Surface(format!(
                "surface {:?} is not a configured output",
                target
            )));
        }
        record(&self.shared, BackendEvent::RepeatingStarted(self.camera_id.clone()));
        Ok(())
    }

    fn stop_repeating(&mut self) -> Result<(), PreviewError> {
        record(&self.shared, BackendEvent::RepeatingStopped(self.camera_id.clone()));
        Ok(())
    }

    fn close(self: Box<Self>) {
        record(&self.shared, BackendEvent::SessionClosed(self.camera_id.clone()));
    }
}

/// Host surface double recording the geometry it was given.
#[derive(Debug)]
pub struct SimulatedSurface {
    size: Resolution,
    fixed: Mutex<Option<Resolution>>,
    history: Mutex<Vec<Resolution>>,
    reject_geometry: bool,
}

impl SimulatedSurface {
    pub fn new(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self::build(width, height, false))
    }

    /// A surface whose buffer geometry cannot be changed.
    pub fn rejecting(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self::build(width, height, true))
    }

    fn build(width: u32, height: u32, reject_geometry: bool) -> Self {
        Self {
            size: Resolution::new(width, height),
            fixed: Mutex::new(None),
            history: Mutex::new(Vec::new()),
            reject_geometry,
        }
    }

    /// Every size passed to `set_fixed_size`, in order.
    pub fn fixed_size_history(&self) -> Vec<Resolution> {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl PreviewSurface for SimulatedSurface {
    fn size(&self) -> Resolution {
        self.size
    }

    fn set_fixed_size(&self, size: Resolution) -> Result<(), PreviewError> {
        if self.reject_geometry {
            return Err(PreviewError::Surface(format!(
                "buffer geometry {} rejected",
                size
            )));
        }
        size.validate()?;
        *self.fixed.lock().unwrap_or_else(|e| e.into_inner()) = Some(size);
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(size);
        Ok(())
    }

    fn fixed_size(&self) -> Option<Resolution> {
        *self.fixed.lock().unwrap_or_else(|e| e.into_inner())
    }
}
