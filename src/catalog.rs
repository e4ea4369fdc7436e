//! Camera discovery by facing direction.

use crate::backend::CameraBackend;
use crate::errors::PreviewError;
use crate::types::{CameraIdentity, FacingDirection, OutputFormat, Resolution};
use std::sync::Arc;

/// A camera matching a facing request, with its supported output sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraMatch {
    pub camera: CameraIdentity,
    pub sizes: Vec<Resolution>,
}

/// Read-only queries against the platform camera registry.
#[derive(Clone)]
pub struct CameraCatalog {
    backend: Arc<dyn CameraBackend>,
    format: OutputFormat,
}

impl CameraCatalog {
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        Self::with_format(backend, OutputFormat::default())
    }

    pub fn with_format(backend: Arc<dyn CameraBackend>, format: OutputFormat) -> Self {
        Self { backend, format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// First camera facing `direction`, with its size catalogue for the
    /// catalog's output format.
    ///
    /// # Errors
    /// [`PreviewError::NotFound`] when no camera faces that way;
    /// [`PreviewError::CatalogError`] when the registry query itself fails.
    pub fn find_camera(&self, direction: FacingDirection) -> Result<CameraMatch, PreviewError> {
        let ids = self.backend.camera_ids().map_err(into_catalog_error)?;
        log::debug!(
            "Searching {} cameras on {} for {} facing",
            ids.len(),
            self.backend.name(),
            direction
        );

        for id in ids {
            let facing = self.backend.lens_facing(&id).map_err(into_catalog_error)?;
            if facing != Some(direction) {
                continue;
            }

            let sizes = self
                .backend
                .output_sizes(&id, self.format)
                .map_err(into_catalog_error)?;
            log::info!(
                "Found {} camera {} with {} {} output sizes",
                direction,
                id,
                sizes.len(),
                self.format
            );
            return Ok(CameraMatch {
                camera: CameraIdentity::new(id, direction),
                sizes,
            });
        }

        Err(PreviewError::NotFound(direction))
    }

    /// Every camera with a known facing direction, in registry order.
    pub fn list_cameras(&self) -> Result<Vec<CameraIdentity>, PreviewError> {
        let mut cameras = Vec::new();
        for id in self.backend.camera_ids().map_err(into_catalog_error)? {
            match self.backend.lens_facing(&id).map_err(into_catalog_error)? {
                Some(facing) => cameras.push(CameraIdentity::new(id, facing)),
                None => log::debug!("Skipping camera {} with no fixed facing", id),
            }
        }
        Ok(cameras)
    }
}

fn into_catalog_error(error: PreviewError) -> PreviewError {
    match error {
        PreviewError::CatalogError(_) => error,
        other => PreviewError::CatalogError(other.to_string()),
    }
}
