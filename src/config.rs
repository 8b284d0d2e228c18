//! Configuration management for crabshot
//!
//! Loads and saves the camera session settings (quality preset, preferred
//! lens) and the capture output settings used by the native backend.

use crate::errors::CameraError;
use crate::selection::SelectionPolicy;
use crate::types::{LensFacing, QualityPreset};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure. Missing sections and keys take their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrabshotConfig {
    pub camera: CameraConfig,
    pub storage: StorageConfig,
}

/// Session opening preferences
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Resolution preset requested when opening a device
    pub quality_preset: QualityPreset,
    /// Lens to open by default; unset means the first listed device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_facing: Option<LensFacing>,
}

/// Where and how captured photos are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for captured images
    pub output_directory: PathBuf,
    /// Image format (jpeg, png)
    pub image_format: String,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("./captures"),
            image_format: "jpeg".to_string(),
            jpeg_quality: 90,
        }
    }
}

impl StorageConfig {
    /// File extension matching `image_format`
    pub fn extension(&self) -> &'static str {
        match self.image_format.to_lowercase().as_str() {
            "png" => "png",
            _ => "jpg",
        }
    }
}

impl CrabshotConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CameraError::unknown(format!("Failed to read config file: {}", e)))?;

        let config: CrabshotConfig = toml::from_str(&contents).map_err(|e| {
            CameraError::unsupported(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::unknown(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CameraError::unknown(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CameraError::unknown(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabshot.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Device selection policy derived from `camera.preferred_facing`
    pub fn selection_policy(&self) -> SelectionPolicy {
        match self.camera.preferred_facing {
            Some(facing) => SelectionPolicy::PreferFacing(facing),
            None => SelectionPolicy::FirstListed,
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        match self.storage.image_format.to_lowercase().as_str() {
            "jpeg" | "jpg" | "png" => {}
            other => return Err(format!("Unsupported image format: {}", other)),
        }
        if self.storage.jpeg_quality == 0 || self.storage.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }
        if self.storage.output_directory.as_os_str().is_empty() {
            return Err("Output directory must not be empty".to_string());
        }
        Ok(())
    }
}
