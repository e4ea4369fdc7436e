//! Configuration management for the camera preview
//!
//! Provides loading, saving and validation of the preview settings: which
//! camera to start with, the requested aspect ratio and the size bounds used
//! during output size negotiation.

use crate::errors::PreviewError;
use crate::types::{FacingDirection, OutputFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewConfig {
    pub preview: PreviewSettings,
    pub logging: LoggingConfig,
}

/// Preview negotiation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSettings {
    /// Camera facing used when the surface is first created
    pub facing: FacingDirection,
    /// Requested aspect ratio [width units, height units]
    pub aspect_ratio: [u32; 2],
    /// Ratios visited when the host cycles the preview ratio
    pub aspect_ratio_cycle: Vec<[u32; 2]>,
    /// Largest acceptable output width in pixels
    pub max_width: u32,
    /// Largest acceptable output height in pixels
    pub max_height: u32,
    /// Capture format whose size catalogue is used
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// env_logger filter used when RUST_LOG is not set
    pub filter: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            preview: PreviewSettings {
                facing: FacingDirection::Back,
                aspect_ratio: [16, 9],
                aspect_ratio_cycle: vec![[16, 9], [4, 3], [1, 1]],
                max_width: 3840,
                max_height: 3840,
                output_format: OutputFormat::Jpeg,
            },
            logging: LoggingConfig {
                filter: "camera_preview=info".to_string(),
            },
        }
    }
}

impl PreviewConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PreviewError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| PreviewError::Config(format!("Failed to read config file: {}", e)))?;

        let config: PreviewConfig = toml::from_str(&contents)
            .map_err(|e| PreviewError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate().map_err(PreviewError::Config)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PreviewError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PreviewError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| PreviewError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| PreviewError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("camera-preview.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        let preview = &self.preview;
        if preview.aspect_ratio.contains(&0) {
            return Err("Aspect ratio units must be positive".to_string());
        }
        if preview.aspect_ratio_cycle.is_empty() {
            return Err("Aspect ratio cycle must not be empty".to_string());
        }
        if preview.aspect_ratio_cycle.iter().any(|ratio| ratio.contains(&0)) {
            return Err("Aspect ratio cycle entries must be positive".to_string());
        }
        if preview.max_width == 0 || preview.max_height == 0 {
            return Err("Maximum output size must be positive".to_string());
        }
        if self.logging.filter.trim().is_empty() {
            return Err("Logging filter must not be empty".to_string());
        }
        Ok(())
    }
}
