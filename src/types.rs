//! Core value types shared by the catalog, size selection and the coordinator.

use crate::errors::PreviewError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way a camera lens points relative to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingDirection {
    Front,
    Back,
}

impl FacingDirection {
    /// The other direction; used when the host toggles cameras.
    pub fn opposite(self) -> Self {
        match self {
            FacingDirection::Front => FacingDirection::Back,
            FacingDirection::Back => FacingDirection::Front,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacingDirection::Front => "front",
            FacingDirection::Back => "back",
        }
    }
}

impl fmt::Display for FacingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical camera as reported by the platform registry.
///
/// Obtained fresh from each catalog query and handed to a single open attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraIdentity {
    pub id: String,
    pub facing: FacingDirection,
}

impl CameraIdentity {
    pub fn new(id: impl Into<String>, facing: FacingDirection) -> Self {
        Self {
            id: id.into(),
            facing,
        }
    }
}

impl fmt::Display for CameraIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.facing)
    }
}

/// Output buffer size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel count, the ordering key when comparing candidates.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Rejects zero-sized resolutions.
    pub fn validate(&self) -> Result<(), PreviewError> {
        if self.is_empty() {
            return Err(PreviewError::InvalidInput(format!(
                "resolution must be positive, got {}",
                self
            )));
        }
        Ok(())
    }

    /// Width and height exchanged, e.g. a landscape sensor size shown in portrait.
    pub fn transposed(&self) -> Self {
        Self::new(self.height, self.width)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Target width:height ratio, e.g. 16:9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width_units: u32,
    pub height_units: u32,
}

impl AspectRatio {
    pub const WIDESCREEN: Self = Self::new(16, 9);
    pub const STANDARD: Self = Self::new(4, 3);
    pub const SQUARE: Self = Self::new(1, 1);

    pub const fn new(width_units: u32, height_units: u32) -> Self {
        Self {
            width_units,
            height_units,
        }
    }

    pub fn validate(&self) -> Result<(), PreviewError> {
        if self.width_units == 0 || self.height_units == 0 {
            return Err(PreviewError::InvalidInput(format!(
                "aspect ratio units must be positive, got {}",
                self
            )));
        }
        Ok(())
    }

    /// Exact integer match: `height * width_units == width * height_units`.
    pub fn matches(&self, size: &Resolution) -> bool {
        u64::from(size.height) * u64::from(self.width_units)
            == u64::from(size.width) * u64::from(self.height_units)
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::WIDESCREEN
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width_units, self.height_units)
    }
}

impl From<[u32; 2]> for AspectRatio {
    fn from(units: [u32; 2]) -> Self {
        Self::new(units[0], units[1])
    }
}

/// Lower (preview) and upper (max) bounds a chosen size must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeConstraints {
    pub preview_width: u32,
    pub preview_height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl SizeConstraints {
    pub fn new(preview: Resolution, max: Resolution) -> Self {
        Self {
            preview_width: preview.width,
            preview_height: preview.height,
            max_width: max.width,
            max_height: max.height,
        }
    }

    /// Rejects a zero max bound; a zero preview bound is allowed.
    pub fn validate(&self) -> Result<(), PreviewError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(PreviewError::InvalidInput(format!(
                "max size must be positive, got {}x{}",
                self.max_width, self.max_height
            )));
        }
        Ok(())
    }

    pub fn fits_max(&self, size: &Resolution) -> bool {
        size.width <= self.max_width && size.height <= self.max_height
    }

    pub fn covers_preview(&self, size: &Resolution) -> bool {
        size.width >= self.preview_width && size.height >= self.preview_height
    }
}

/// Capture format whose size catalogue is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Yuv420,
    Private,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Yuv420 => "yuv420",
            OutputFormat::Private => "private",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
