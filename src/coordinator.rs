//! Camera device/session lifecycle.
//!
//! A [`CameraSessionCoordinator`] is a cheap, cloneable handle to an actor
//! running on its own tokio task. Commands from the host and completion
//! callbacks from the backend are both funnelled into that task, so every
//! resource operation and state transition for one preview happens in a
//! single total order.
//!
//! ```text
//! Idle -> Opening -> Configuring -> Active -> Closing -> Idle
//!           |            |
//!           +-> Failed <-+
//! ```

use crate::backend::{CameraBackend, CameraDeviceHandle, CaptureSessionHandle};
use crate::errors::{OpenFailureCause, PreviewError};
use crate::permissions::PermissionGate;
use crate::surface::SurfaceRef;
use crate::types::CameraIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

/// Observable lifecycle state of one logical preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreviewState {
    Idle,
    Opening(CameraIdentity),
    Configuring(CameraIdentity),
    Active(CameraIdentity),
    Closing,
    Failed(PreviewError),
}

impl PreviewState {
    pub fn name(&self) -> &'static str {
        match self {
            PreviewState::Idle => "idle",
            PreviewState::Opening(_) => "opening",
            PreviewState::Configuring(_) => "configuring",
            PreviewState::Active(_) => "active",
            PreviewState::Closing => "closing",
            PreviewState::Failed(_) => "failed",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, PreviewState::Active(_))
    }

    /// An open has been issued and has not yet succeeded or failed.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, PreviewState::Opening(_) | PreviewState::Configuring(_))
    }

    /// Camera involved in the current state, if any.
    pub fn camera(&self) -> Option<&CameraIdentity> {
        match self {
            PreviewState::Opening(camera)
            | PreviewState::Configuring(camera)
            | PreviewState::Active(camera) => Some(camera),
            _ => None,
        }
    }
}

/// One state transition as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    /// Starts at 1 and increases by one per transition of this coordinator.
    pub sequence: u64,
    pub state: PreviewState,
    pub at: DateTime<Utc>,
}

/// Result of a teardown request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeardownOutcome {
    /// A device (and its session, if any) was released.
    Released,
    /// An open was in flight and has been cancelled; its handle is closed
    /// when the platform delivers it.
    Cancelled,
    /// Nothing was open.
    NotOpen,
}

/// Ordered stream of [`StateChange`]s for one subscriber.
pub type StateReceiver = mpsc::UnboundedReceiver<StateChange>;

/// Pending reply to a coordinator command.
///
/// The command is already queued when this is returned; awaiting it only
/// waits for the outcome.
#[must_use = "the outcome of the command is only observed by awaiting it"]
pub struct Completion<T> {
    reply: oneshot::Receiver<Result<T, PreviewError>>,
}

impl<T> Future for Completion<T> {
    type Output = Result<T, PreviewError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.reply).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(PreviewError::CoordinatorClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T, PreviewError>>;
type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<StateChange>>>>;

enum Command {
    Open {
        camera: CameraIdentity,
        surface: SurfaceRef,
        reply: Reply<CameraIdentity>,
    },
    Teardown {
        reply: Reply<TeardownOutcome>,
    },
    ReportFailure {
        reason: PreviewError,
        reply: Reply<bool>,
    },
}

enum Event {
    DeviceOpened {
        generation: u64,
        result: Result<CameraDeviceHandle, OpenFailureCause>,
    },
    SessionConfigured {
        generation: u64,
        result: Result<CaptureSessionHandle, String>,
    },
}

/// Owns the open → configure → repeating-capture sequence for one preview.
#[derive(Clone)]
pub struct CameraSessionCoordinator {
    instance: Uuid,
    commands: mpsc::UnboundedSender<Command>,
    current: watch::Receiver<PreviewState>,
    subscribers: Subscribers,
}

impl CameraSessionCoordinator {
    /// Spawn the coordinator task on the current tokio runtime.
    ///
    /// The task lives until the last handle is dropped, at which point it
    /// releases whatever it still holds.
    pub fn new(
        backend: Arc<dyn CameraBackend>,
        permission: PermissionGate,
    ) -> Result<Self, PreviewError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            PreviewError::NotSupported(
                "session coordinator must be created inside a tokio runtime".to_string(),
            )
        })?;

        let instance = Uuid::new_v4();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PreviewState::Idle);
        let subscribers: Subscribers = Arc::new(Mutex::new(Vec::new()));

        log::info!(
            "Starting session coordinator {} on backend {}",
            instance,
            backend.name()
        );

        let actor = SessionActor {
            instance,
            backend,
            permission,
            stage: Stage::Idle,
            next_generation: 0,
            held_devices: 0,
            events: event_tx,
            sequence: 0,
            state: state_tx,
            subscribers: subscribers.clone(),
        };
        runtime.spawn(actor.run(command_rx, event_rx));

        Ok(Self {
            instance,
            commands: command_tx,
            current: state_rx,
            subscribers,
        })
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance
    }

    /// Open `camera` and start a repeating preview onto `surface`.
    ///
    /// Resolves once the preview is `Active`, or with the reason it is not:
    /// `PermissionDenied`, `AlreadyOpening` while another open is in flight,
    /// `DeviceOpenFailed`, `SessionConfigFailed`, or `Cancelled` when a
    /// teardown overtook it. An active preview is torn down first.
    pub fn open(&self, camera: CameraIdentity, surface: SurfaceRef) -> Completion<CameraIdentity> {
        self.send(|reply| Command::Open {
            camera,
            surface,
            reply,
        })
    }

    /// Release everything held and return to `Idle`. Safe from any state.
    pub fn teardown(&self) -> Completion<TeardownOutcome> {
        self.send(|reply| Command::Teardown { reply })
    }

    /// Surface a failure that happened outside the coordinator (catalog,
    /// size negotiation) as `Failed(reason)`.
    ///
    /// Only applied while nothing is open; resolves to whether it was applied.
    pub fn report_failure(&self, reason: PreviewError) -> Completion<bool> {
        self.send(|reply| Command::ReportFailure { reason, reply })
    }

    /// Latest published state.
    pub fn state(&self) -> PreviewState {
        self.current.borrow().clone()
    }

    /// Watch channel carrying only the latest state.
    pub fn watch_state(&self) -> watch::Receiver<PreviewState> {
        self.current.clone()
    }

    /// Every transition published after this call, in order, exactly once.
    pub fn subscribe(&self) -> StateReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    fn send<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Completion<T> {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(command(reply)).is_err() {
            log::warn!("Session coordinator {} is no longer running", self.instance);
        }
        Completion { reply: rx }
    }
}

/// Resource-holding stage; each variant owns exactly what is alive.
enum Stage {
    Idle,
    Opening {
        camera: CameraIdentity,
        surface: SurfaceRef,
        generation: u64,
        reply: Reply<CameraIdentity>,
    },
    Configuring {
        camera: CameraIdentity,
        surface: SurfaceRef,
        generation: u64,
        device: CameraDeviceHandle,
        reply: Reply<CameraIdentity>,
    },
    Active {
        camera: CameraIdentity,
        device: CameraDeviceHandle,
        session: CaptureSessionHandle,
    },
    Failed(PreviewError),
}

impl Stage {
    fn in_flight(&self) -> Option<&CameraIdentity> {
        match self {
            Stage::Opening { camera, .. } | Stage::Configuring { camera, .. } => Some(camera),
            _ => None,
        }
    }
}

struct SessionActor {
    instance: Uuid,
    backend: Arc<dyn CameraBackend>,
    permission: PermissionGate,
    stage: Stage,
    next_generation: u64,
    held_devices: usize,
    events: mpsc::UnboundedSender<Event>,
    sequence: u64,
    state: watch::Sender<PreviewState>,
    subscribers: Subscribers,
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<Event>,
    ) {
        loop {
            // Callbacks already delivered are handled before the next command.
            tokio::select! {
                biased;
                Some(event) = events.recv() => self.handle_event(event),
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
        }

        self.teardown();
        log::info!("Session coordinator {} stopped", self.instance);
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Open {
                camera,
                surface,
                reply,
            } => self.open(camera, surface, reply),
            Command::Teardown { reply } => {
                let outcome = self.teardown();
                let _ = reply.send(Ok(outcome));
            }
            Command::ReportFailure { reason, reply } => {
                let applied = matches!(self.stage, Stage::Idle | Stage::Failed(_));
                if applied {
                    log::error!("[{}] Preview failed: {}", self.instance, reason);
                    self.stage = Stage::Failed(reason.clone());
                    self.publish(PreviewState::Failed(reason));
                } else {
                    log::debug!(
                        "[{}] Ignoring reported failure while a camera is held: {}",
                        self.instance,
                        reason
                    );
                }
                let _ = reply.send(Ok(applied));
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::DeviceOpened { generation, result } => self.on_device_opened(generation, result),
            Event::SessionConfigured { generation, result } => {
                self.on_session_configured(generation, result)
            }
        }
    }

    fn open(&mut self, camera: CameraIdentity, surface: SurfaceRef, reply: Reply<CameraIdentity>) {
        if let Some(pending) = self.stage.in_flight() {
            log::warn!(
                "[{}] Rejecting open of camera {} while camera {} is opening",
                self.instance,
                camera.id,
                pending.id
            );
            let _ = reply.send(Err(PreviewError::AlreadyOpening(pending.id.clone())));
            return;
        }

        if !self.permission.is_granted() {
            log::warn!(
                "[{}] Camera {} not opened: permission not granted",
                self.instance,
                camera.id
            );
            if matches!(self.stage, Stage::Idle | Stage::Failed(_)) {
                self.stage = Stage::Failed(PreviewError::PermissionDenied);
                self.publish(PreviewState::Failed(PreviewError::PermissionDenied));
            }
            let _ = reply.send(Err(PreviewError::PermissionDenied));
            return;
        }

        if matches!(self.stage, Stage::Active { .. }) {
            log::info!(
                "[{}] Releasing active camera before opening {}",
                self.instance,
                camera.id
            );
            self.teardown();
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        log::info!("[{}] Opening camera {}", self.instance, camera);
        self.publish(PreviewState::Opening(camera.clone()));

        let events = self.events.clone();
        self.backend.open_device(
            &camera,
            Box::new(move |result| post_event(&events, Event::DeviceOpened { generation, result })),
        );

        self.stage = Stage::Opening {
            camera,
            surface,
            generation,
            reply,
        };
    }

    fn on_device_opened(
        &mut self,
        generation: u64,
        result: Result<CameraDeviceHandle, OpenFailureCause>,
    ) {
        match std::mem::replace(&mut self.stage, Stage::Idle) {
            Stage::Opening {
                camera,
                surface,
                generation: expected,
                reply,
            } if expected == generation => match result {
                Ok(mut device) => {
                    self.held_devices += 1;
                    crate::assert_invariant!(
                        self.held_devices <= 1,
                        "at most one camera device is held per coordinator",
                        "coordinator::on_device_opened"
                    );
                    log::debug!("[{}] Camera {} opened, configuring session", self.instance, camera.id);
                    self.publish(PreviewState::Configuring(camera.clone()));

                    let events = self.events.clone();
                    device.create_session(
                        surface.clone(),
                        Box::new(move |result| {
                            post_event(&events, Event::SessionConfigured { generation, result })
                        }),
                    );
                    self.stage = Stage::Configuring {
                        camera,
                        surface,
                        generation,
                        device,
                        reply,
                    };
                }
                Err(cause) => {
                    let error = PreviewError::DeviceOpenFailed {
                        camera_id: camera.id.clone(),
                        cause,
                    };
                    self.fail(error.clone());
                    let _ = reply.send(Err(error));
                }
            },
            other => {
                self.stage = other;
                match result {
                    Ok(device) => {
                        log::warn!(
                            "[{}] Camera {} opened after its request was superseded, closing it",
                            self.instance,
                            device.camera_id()
                        );
                        device.close();
                    }
                    Err(cause) => log::debug!(
                        "[{}] Ignoring superseded open failure: {}",
                        self.instance,
                        cause
                    ),
                }
            }
        }
    }

    fn on_session_configured(
        &mut self,
        generation: u64,
        result: Result<CaptureSessionHandle, String>,
    ) {
        match std::mem::replace(&mut self.stage, Stage::Idle) {
            Stage::Configuring {
                camera,
                surface,
                generation: expected,
                device,
                reply,
            } if expected == generation => match result {
                Ok(mut session) => match session.set_repeating_preview(&surface) {
                    Ok(()) => {
                        log::info!("[{}] Preview active on camera {}", self.instance, camera);
                        self.publish(PreviewState::Active(camera.clone()));
                        self.stage = Stage::Active {
                            camera: camera.clone(),
                            device,
                            session,
                        };
                        let _ = reply.send(Ok(camera));
                    }
                    Err(e) => {
                        self.release(Some(session), device, false);
                        let error = PreviewError::SessionConfigFailed(format!(
                            "camera {} rejected the repeating preview request: {}",
                            camera.id, e
                        ));
                        self.fail(error.clone());
                        let _ = reply.send(Err(error));
                    }
                },
                Err(message) => {
                    self.release(None, device, false);
                    let error = PreviewError::SessionConfigFailed(format!(
                        "camera {}: {}",
                        camera.id, message
                    ));
                    self.fail(error.clone());
                    let _ = reply.send(Err(error));
                }
            },
            other => {
                self.stage = other;
                if let Ok(session) = result {
                    log::warn!(
                        "[{}] Session configured after its request was superseded, closing it",
                        self.instance
                    );
                    session.close();
                }
            }
        }
    }

    fn teardown(&mut self) -> TeardownOutcome {
        match std::mem::replace(&mut self.stage, Stage::Idle) {
            Stage::Idle => {
                log::debug!("[{}] Teardown requested with nothing open", self.instance);
                TeardownOutcome::NotOpen
            }
            Stage::Failed(reason) => {
                log::debug!("[{}] Clearing failure: {}", self.instance, reason);
                self.publish(PreviewState::Idle);
                TeardownOutcome::NotOpen
            }
            Stage::Opening { camera, reply, .. } => {
                log::info!("[{}] Cancelling open of camera {}", self.instance, camera.id);
                self.publish(PreviewState::Closing);
                self.publish(PreviewState::Idle);
                let _ = reply.send(Err(PreviewError::Cancelled(camera.id)));
                TeardownOutcome::Cancelled
            }
            Stage::Configuring {
                camera,
                device,
                reply,
                ..
            } => {
                log::info!(
                    "[{}] Cancelling session configuration on camera {}",
                    self.instance,
                    camera.id
                );
                self.publish(PreviewState::Closing);
                self.release(None, device, false);
                self.publish(PreviewState::Idle);
                let _ = reply.send(Err(PreviewError::Cancelled(camera.id)));
                TeardownOutcome::Cancelled
            }
            Stage::Active {
                camera,
                device,
                session,
            } => {
                log::info!("[{}] Closing camera {}", self.instance, camera);
                self.publish(PreviewState::Closing);
                self.release(Some(session), device, true);
                self.publish(PreviewState::Idle);
                TeardownOutcome::Released
            }
        }
    }

    /// Release order: stop repeating, close session, close device.
    fn release(
        &mut self,
        session: Option<CaptureSessionHandle>,
        device: CameraDeviceHandle,
        repeating: bool,
    ) {
        if let Some(mut session) = session {
            if repeating && session.requires_explicit_stop() {
                if let Err(e) = session.stop_repeating() {
                    log::warn!("[{}] Failed to stop repeating request: {}", self.instance, e);
                }
            }
            session.close();
        }

        let camera_id = device.camera_id().to_string();
        device.close();
        self.held_devices = self.held_devices.saturating_sub(1);
        log::debug!("[{}] Released camera {}", self.instance, camera_id);
    }

    fn fail(&mut self, error: PreviewError) {
        log::error!("[{}] {}", self.instance, error);
        self.stage = Stage::Failed(error.clone());
        self.publish(PreviewState::Failed(error));
    }

    fn publish(&mut self, state: PreviewState) {
        self.sequence += 1;
        log::debug!(
            "[{}] State #{} -> {}",
            self.instance,
            self.sequence,
            state.name()
        );

        let change = StateChange {
            sequence: self.sequence,
            state: state.clone(),
            at: Utc::now(),
        };
        self.state.send_replace(state);
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
    }
}

// A callback can fire after the coordinator has stopped; the handle it
// carries must still be released.
fn post_event(events: &mpsc::UnboundedSender<Event>, event: Event) {
    if let Err(mpsc::error::SendError(event)) = events.send(event) {
        match event {
            Event::DeviceOpened {
                result: Ok(device), ..
            } => device.close(),
            Event::SessionConfigured {
                result: Ok(session),
                ..
            } => session.close(),
            _ => {}
        }
    }
}
