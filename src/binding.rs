//! Bridges host surface lifecycle events to the session coordinator.

use crate::backend::CameraBackend;
use crate::catalog::CameraCatalog;
use crate::config::PreviewConfig;
use crate::coordinator::{CameraSessionCoordinator, TeardownOutcome};
use crate::errors::PreviewError;
use crate::permissions::PermissionGate;
use crate::sizes::select_optimal;
use crate::surface::SurfaceRef;
use crate::types::{AspectRatio, CameraIdentity, FacingDirection, OutputFormat, Resolution, SizeConstraints};
use std::sync::{Arc, Mutex};

/// Runtime options for a [`PreviewSurfaceBinding`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingOptions {
    pub facing: FacingDirection,
    pub aspect_ratio: AspectRatio,
    /// Ratios visited by [`PreviewSurfaceBinding::cycle_aspect_ratio`].
    pub aspect_ratio_cycle: Vec<AspectRatio>,
    pub max_size: Resolution,
    pub output_format: OutputFormat,
}

impl BindingOptions {
    pub fn from_config(config: &PreviewConfig) -> Self {
        let preview = &config.preview;
        Self {
            facing: preview.facing,
            aspect_ratio: preview.aspect_ratio.into(),
            aspect_ratio_cycle: preview
                .aspect_ratio_cycle
                .iter()
                .copied()
                .map(AspectRatio::from)
                .collect(),
            max_size: Resolution::new(preview.max_width, preview.max_height),
            output_format: preview.output_format,
        }
    }
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self::from_config(&PreviewConfig::default())
    }
}

/// What a successful surface-created sequence opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewStart {
    pub camera: CameraIdentity,
    pub size: Resolution,
}

#[derive(Debug)]
struct BindingState {
    facing: FacingDirection,
    aspect_ratio: AspectRatio,
    surface: Option<SurfaceRef>,
    /// Surface-created sequences between their catalog lookup and the
    /// coordinator's answer.
    pending_opens: usize,
}

/// Reacts to surface created/changed/destroyed events and camera toggles.
///
/// Shareable across tasks; at most one open is in flight at a time because
/// the coordinator rejects a second one with `AlreadyOpening`.
pub struct PreviewSurfaceBinding {
    catalog: CameraCatalog,
    coordinator: CameraSessionCoordinator,
    max_size: Resolution,
    aspect_ratio_cycle: Vec<AspectRatio>,
    state: Mutex<BindingState>,
}

impl PreviewSurfaceBinding {
    /// Create a binding with its own coordinator on the current tokio runtime.
    pub fn new(
        backend: Arc<dyn CameraBackend>,
        permission: PermissionGate,
        options: BindingOptions,
    ) -> Result<Self, PreviewError> {
        let catalog = CameraCatalog::with_format(backend.clone(), options.output_format);
        let coordinator = CameraSessionCoordinator::new(backend, permission)?;
        Ok(Self::with_parts(catalog, coordinator, options))
    }

    pub fn with_parts(
        catalog: CameraCatalog,
        coordinator: CameraSessionCoordinator,
        options: BindingOptions,
    ) -> Self {
        Self {
            catalog,
            coordinator,
            max_size: options.max_size,
            aspect_ratio_cycle: options.aspect_ratio_cycle,
            state: Mutex::new(BindingState {
                facing: options.facing,
                aspect_ratio: options.aspect_ratio,
                surface: None,
                pending_opens: 0,
            }),
        }
    }

    pub fn coordinator(&self) -> &CameraSessionCoordinator {
        &self.coordinator
    }

    pub fn facing(&self) -> FacingDirection {
        self.lock().facing
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.lock().aspect_ratio
    }

    pub fn surface(&self) -> Option<SurfaceRef> {
        self.lock().surface.clone()
    }

    /// Resolve a camera for the configured facing, fix the surface buffer to
    /// the best matching size and open the camera onto it.
    ///
    /// While another open is in flight the event is rejected with
    /// `AlreadyOpening` and neither the recorded surface nor the new
    /// surface's geometry is touched.
    pub async fn on_surface_created(&self, surface: SurfaceRef) -> Result<PreviewStart, PreviewError> {
        let (facing, ratio, previous) = {
            let mut state = self.lock();
            let in_flight = self.coordinator.state();
            if state.pending_opens > 0 || in_flight.is_in_flight() {
                let pending = in_flight
                    .camera()
                    .map(|camera| camera.id.clone())
                    .unwrap_or_else(|| state.facing.to_string());
                log::warn!("Surface created while camera {} is opening, ignoring it", pending);
                return Err(PreviewError::AlreadyOpening(pending));
            }
            state.pending_opens += 1;
            let previous = state.surface.replace(surface.clone());
            (state.facing, state.aspect_ratio, previous)
        };

        let _pending = PendingOpen { binding: self };
        let result = self.start(surface, facing, ratio).await;
        if let Err(PreviewError::AlreadyOpening(_)) = &result {
            self.lock().surface = previous;
        }
        result
    }

    /// Resizing a running preview is not supported; the event is ignored.
    pub fn on_surface_changed(&self, size: Resolution) {
        log::debug!("Surface changed to {}, preview size unchanged", size);
    }

    pub async fn on_surface_destroyed(&self) -> Result<TeardownOutcome, PreviewError> {
        self.lock().surface = None;
        log::debug!("Surface destroyed, tearing down preview");
        self.coordinator.teardown().await
    }

    /// Close the current camera and, if a surface exists, reopen facing
    /// `direction` on it.
    pub async fn on_facing_toggled(
        &self,
        direction: FacingDirection,
    ) -> Result<Option<PreviewStart>, PreviewError> {
        let surface = {
            let mut state = self.lock();
            state.facing = direction;
            state.surface.clone()
        };
        log::info!("Switching preview to {} camera", direction);
        self.restart(surface).await
    }

    /// Flip between front and back cameras.
    pub async fn toggle_facing(&self) -> Result<Option<PreviewStart>, PreviewError> {
        let next = self.facing().opposite();
        self.on_facing_toggled(next).await
    }

    /// Advance to the next configured aspect ratio, reopening the preview if
    /// a surface exists. Returns the new ratio with the restart outcome.
    pub async fn cycle_aspect_ratio(
        &self,
    ) -> Result<(AspectRatio, Option<PreviewStart>), PreviewError> {
        let (ratio, surface) = {
            let mut state = self.lock();
            let Some(next) = next_in_cycle(&self.aspect_ratio_cycle, state.aspect_ratio) else {
                return Err(PreviewError::InvalidInput(
                    "no aspect ratios configured to cycle through".to_string(),
                ));
            };
            state.aspect_ratio = next;
            (next, state.surface.clone())
        };
        log::info!("Switching preview aspect ratio to {}", ratio);
        let started = self.restart(surface).await?;
        Ok((ratio, started))
    }

    async fn restart(&self, surface: Option<SurfaceRef>) -> Result<Option<PreviewStart>, PreviewError> {
        self.coordinator.teardown().await?;
        let Some(surface) = surface else {
            return Ok(None);
        };
        let (facing, ratio) = {
            let state = self.lock();
            (state.facing, state.aspect_ratio)
        };
        self.start(surface, facing, ratio).await.map(Some)
    }

    async fn start(
        &self,
        surface: SurfaceRef,
        facing: FacingDirection,
        ratio: AspectRatio,
    ) -> Result<PreviewStart, PreviewError> {
        let (camera, size) = match self.negotiate(&surface, facing, ratio) {
            Ok(negotiated) => negotiated,
            Err(e) => {
                log::error!("Cannot start {} preview: {}", facing, e);
                self.coordinator.report_failure(e.clone()).await?;
                return Err(e);
            }
        };

        let camera = self.coordinator.open(camera, surface).await?;
        Ok(PreviewStart { camera, size })
    }

    fn negotiate(
        &self,
        surface: &SurfaceRef,
        facing: FacingDirection,
        ratio: AspectRatio,
    ) -> Result<(CameraIdentity, Resolution), PreviewError> {
        let found = self.catalog.find_camera(facing)?;
        let constraints = SizeConstraints::new(surface.size(), self.max_size);
        let size = select_optimal(&found.sizes, &constraints, &ratio)?;
        surface.set_fixed_size(size)?;
        log::debug!(
            "Fixed surface buffer to {} for camera {}",
            size,
            found.camera.id
        );
        Ok((found.camera, size))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BindingState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// Released on every exit, including a dropped future.
struct PendingOpen<'a> {
    binding: &'a PreviewSurfaceBinding,
}

impl Drop for PendingOpen<'_> {
    fn drop(&mut self) {
        let mut state = self.binding.lock();
        state.pending_opens = state.pending_opens.saturating_sub(1);
    }
}

fn next_in_cycle(cycle: &[AspectRatio], current: AspectRatio) -> Option<AspectRatio> {
    let first = *cycle.first()?;
    let next = cycle
        .iter()
        .position(|ratio| *ratio == current)
        .and_then(|index| cycle.get(index + 1).copied())
        .unwrap_or(first);
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_in_cycle_wraps() {
        let cycle = [AspectRatio::WIDESCREEN, AspectRatio::STANDARD, AspectRatio::SQUARE];
        assert_eq!(next_in_cycle(&cycle, AspectRatio::WIDESCREEN), Some(AspectRatio::STANDARD));
        assert_eq!(next_in_cycle(&cycle, AspectRatio::SQUARE), Some(AspectRatio::WIDESCREEN));
    }

    #[test]
    fn test_next_in_cycle_unknown_current_starts_over() {
        let cycle = [AspectRatio::STANDARD, AspectRatio::SQUARE];
        assert_eq!(next_in_cycle(&cycle, AspectRatio::new(21, 9)), Some(AspectRatio::STANDARD));
        assert_eq!(next_in_cycle(&[], AspectRatio::SQUARE), None);
    }

    #[test]
    fn test_options_from_default_config() {
        let options = BindingOptions::default();
        assert_eq!(options.facing, FacingDirection::Back);
        assert_eq!(options.aspect_ratio, AspectRatio::WIDESCREEN);
        assert_eq!(options.max_size, Resolution::new(3840, 3840));
        assert_eq!(options.aspect_ratio_cycle.len(), 3);
    }
}
