//! The camera subsystem the controller delegates hardware access to.
//!
//! `CameraCapability` enumerates and opens devices; the returned
//! `SessionHandle` owns the device lock until it is released.

use crate::errors::CameraError;
use crate::types::{CaptureArtifact, DeviceDescriptor, QualityPreset};
use async_trait::async_trait;

#[async_trait]
pub trait CameraCapability: Send + Sync + 'static {
    type Handle: SessionHandle;

    /// List devices in platform order. May be empty; never fails.
    async fn enumerate_devices(&self) -> Vec<DeviceDescriptor>;

    async fn open_device(
        &self,
        device: &DeviceDescriptor,
        preset: QualityPreset,
    ) -> Result<Self::Handle, CameraError>;
}

#[async_trait]
pub trait SessionHandle: Send + 'static {
    async fn capture(&mut self) -> Result<CaptureArtifact, CameraError>;

    /// Give the device back. Must be idempotent and must not fail.
    fn release(&mut self);
}
