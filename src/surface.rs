//! Rendering surface abstraction supplied by the host view layer.

use crate::errors::PreviewError;
use crate::types::Resolution;
use std::fmt;
use std::sync::Arc;

/// A frame pushed to a surface by backends that deliver pixels in software.
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub data: Vec<u8>,
}

/// The host's drawing target for the live preview.
///
/// Implementations wrap whatever the host renders into (a platform surface
/// holder, a texture, a test double).
pub trait PreviewSurface: Send + Sync + fmt::Debug {
    /// Current pixel dimensions of the view backing this surface.
    fn size(&self) -> Resolution;

    /// Fix the surface buffer geometry to the negotiated output size.
    fn set_fixed_size(&self, size: Resolution) -> Result<(), PreviewError>;

    /// Buffer geometry previously fixed with [`PreviewSurface::set_fixed_size`].
    fn fixed_size(&self) -> Option<Resolution>;

    /// Receives frames from software-delivery backends. Hardware backends
    /// render straight into the surface and never call this.
    fn present_frame(&self, _frame: &PreviewFrame) {}
}

/// Shared handle to a host surface.
pub type SurfaceRef = Arc<dyn PreviewSurface>;

/// Display orientation of the host view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Measures a view so it keeps the preview's ratio instead of stretching it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoFitLayout {
    ratio: Option<Resolution>,
}

impl AutoFitLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout for a sensor output size shown in the given orientation.
    ///
    /// Sensor sizes are landscape, so portrait views use the transposed ratio.
    pub fn for_preview(size: Resolution, orientation: Orientation) -> Result<Self, PreviewError> {
        let mut layout = Self::new();
        match orientation {
            Orientation::Portrait => layout.set_aspect_ratio(size.height, size.width)?,
            Orientation::Landscape => layout.set_aspect_ratio(size.width, size.height)?,
        }
        Ok(layout)
    }

    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) -> Result<(), PreviewError> {
        if width == 0 || height == 0 {
            return Err(PreviewError::InvalidInput(
                "aspect ratio size must be positive".to_string(),
            ));
        }
        self.ratio = Some(Resolution::new(width, height));
        Ok(())
    }

    pub fn aspect_ratio(&self) -> Option<Resolution> {
        self.ratio
    }

    /// Measured view size for the space offered by the parent layout.
    pub fn measure(&self, available_width: u32, available_height: u32) -> Resolution {
        let Some(ratio) = self.ratio else {
            return Resolution::new(available_width, available_height);
        };
        let ratio = f64::from(ratio.width) / f64::from(ratio.height);
        let width = f64::from(available_width);
        let height = f64::from(available_height);

        if width < height * ratio {
            Resolution::new((height * ratio).round() as u32, available_height)
        } else {
            Resolution::new(available_width, (width / ratio).round() as u32)
        }
    }
}
