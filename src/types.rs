use crate::errors::SessionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which way a camera points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LensFacing {
    Front,
    Back,
    External,
}

impl LensFacing {
    pub fn as_str(&self) -> &'static str {
        match self {
            LensFacing::Front => "front",
            LensFacing::Back => "back",
            LensFacing::External => "external",
        }
    }

    /// Guess the facing from a device name reported by the platform.
    pub fn from_device_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if ["front", "user", "facetime", "selfie"]
            .iter()
            .any(|k| lower.contains(k))
        {
            LensFacing::Front
        } else if ["back", "rear", "environment", "world"]
            .iter()
            .any(|k| lower.contains(k))
        {
            LensFacing::Back
        } else {
            LensFacing::External
        }
    }
}

/// A selectable camera device, as reported at enumeration time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: String,
    pub name: String,
    pub facing: LensFacing,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, facing: LensFacing) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            facing,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Two descriptors refer to the same physical device.
    pub fn same_device(&self, other: &DeviceDescriptor) -> bool {
        self.id == other.id
    }
}

/// Requested capture resolution when opening a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreset {
    Low,
    Medium,
    #[default]
    High,
    VeryHigh,
    UltraHigh,
    Max,
}

impl QualityPreset {
    /// Target resolution (width, height). `None` means the highest the device offers.
    pub fn resolution(&self) -> Option<(u32, u32)> {
        match self {
            QualityPreset::Low => Some((320, 240)),
            QualityPreset::Medium => Some((720, 480)),
            QualityPreset::High => Some((1280, 720)),
            QualityPreset::VeryHigh => Some((1920, 1080)),
            QualityPreset::UltraHigh => Some((3840, 2160)),
            QualityPreset::Max => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
            QualityPreset::VeryHigh => "very_high",
            QualityPreset::UltraHigh => "ultra_high",
            QualityPreset::Max => "max",
        }
    }
}

impl std::str::FromStr for QualityPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(QualityPreset::Low),
            "medium" => Ok(QualityPreset::Medium),
            "high" => Ok(QualityPreset::High),
            "very_high" | "veryhigh" => Ok(QualityPreset::VeryHigh),
            "ultra_high" | "ultrahigh" => Ok(QualityPreset::UltraHigh),
            "max" => Ok(QualityPreset::Max),
            other => Err(format!("Unknown quality preset: {}", other)),
        }
    }
}

/// A still image written by a capture. The path is opaque to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureArtifact {
    pub id: String,
    pub path: PathBuf,
    pub device_id: String,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

impl CaptureArtifact {
    pub fn new(path: impl Into<PathBuf>, device_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            path: path.into(),
            device_id: device_id.into(),
            width: 0,
            height: 0,
            captured_at: Utc::now(),
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Outcome of a capture that was actually attempted
pub type CaptureResult = Result<CaptureArtifact, SessionError>;

/// Lifecycle state of a camera session
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Uninitialized,
    Opening,
    Ready(DeviceDescriptor),
    Failed(SessionError),
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready(_))
    }

    pub fn is_opening(&self) -> bool {
        matches!(self, SessionState::Opening)
    }

    pub fn active_device(&self) -> Option<&DeviceDescriptor> {
        match self {
            SessionState::Ready(device) => Some(device),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SessionError> {
        match self {
            SessionState::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Opening => "opening",
            SessionState::Ready(_) => "ready",
            SessionState::Failed(_) => "failed",
        }
    }
}
