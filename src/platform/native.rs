//! `CameraCapability` over nokhwa's native backends (V4L2, AVFoundation,
//! MediaFoundation). Device calls block, so they run on the blocking pool.

use crate::capability::{CameraCapability, SessionHandle};
use crate::config::{CrabshotConfig, StorageConfig};
use crate::errors::CameraError;
use crate::types::{CaptureArtifact, DeviceDescriptor, LensFacing, QualityPreset};
use async_trait::async_trait;
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    CallbackCamera,
};
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// List cameras on the current platform. Backend errors yield an empty list.
pub fn list_devices() -> Vec<DeviceDescriptor> {
    match query(ApiBackend::Auto) {
        Ok(cameras) => cameras
            .into_iter()
            .map(|info| {
                let name = info.human_name();
                DeviceDescriptor::new(info.index().to_string(), LensFacing::from_device_name(&name))
                    .with_name(name)
            })
            .collect(),
        Err(e) => {
            log::warn!("Failed to query cameras: {}", e);
            Vec::new()
        }
    }
}

fn requested_format(preset: QualityPreset) -> RequestedFormat<'static> {
    match preset.resolution() {
        Some((width, height)) => RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            nokhwa::utils::CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, 30),
        )),
        None => RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    }
}

/// Camera capability backed by the host's real devices
#[derive(Debug, Clone, Default)]
pub struct NokhwaCapability {
    storage: StorageConfig,
}

impl NokhwaCapability {
    pub fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }

    pub fn from_config(config: &CrabshotConfig) -> Self {
        Self::new(config.storage.clone())
    }
}

#[async_trait]
impl CameraCapability for NokhwaCapability {
    type Handle = NokhwaHandle;

    async fn enumerate_devices(&self) -> Vec<DeviceDescriptor> {
        tokio::task::spawn_blocking(list_devices)
            .await
            .unwrap_or_else(|e| {
                log::error!("Camera enumeration task failed: {}", e);
                Vec::new()
            })
    }

    async fn open_device(
        &self,
        device: &DeviceDescriptor,
        preset: QualityPreset,
    ) -> Result<NokhwaHandle, CameraError> {
        let device_index = device
            .id
            .parse::<u32>()
            .map_err(|_| CameraError::unsupported(format!("Invalid device ID: {}", device.id)))?;
        let requested = requested_format(preset);

        let camera = tokio::task::spawn_blocking(move || -> Result<CallbackCamera, CameraError> {
            let mut camera = CallbackCamera::new(CameraIndex::Index(device_index), requested, |_| {})
                .map_err(|e| CameraError::classify(format!("Failed to initialize camera: {}", e)))?;
            camera
                .open_stream()
                .map_err(|e| CameraError::classify(format!("Failed to start stream: {}", e)))?;
            Ok(camera)
        })
        .await
        .map_err(|e| CameraError::unknown(format!("Task join error: {}", e)))??;

        Ok(NokhwaHandle {
            camera: Arc::new(Mutex::new(camera)),
            device_id: device.id.clone(),
            storage: self.storage.clone(),
            released: false,
        })
    }
}

/// Open stream on one physical device
pub struct NokhwaHandle {
    camera: Arc<Mutex<CallbackCamera>>,
    device_id: String,
    storage: StorageConfig,
    released: bool,
}

#[async_trait]
impl SessionHandle for NokhwaHandle {
    async fn capture(&mut self) -> Result<CaptureArtifact, CameraError> {
        if self.released {
            return Err(CameraError::unavailable("Camera session was released"));
        }

        let camera = self.camera.clone();
        let device_id = self.device_id.clone();
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || capture_to_file(&camera, &device_id, &storage))
            .await
            .map_err(|e| CameraError::unknown(format!("Task join error: {}", e)))?
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match self.camera.lock() {
            Ok(mut camera) => {
                if let Err(e) = camera.stop_stream() {
                    log::warn!("Failed to stop stream on camera {}: {}", self.device_id, e);
                }
            }
            Err(_) => log::warn!("Camera {} lock poisoned during release", self.device_id),
        }
        log::debug!("Released camera {}", self.device_id);
    }
}

fn capture_to_file(
    camera: &Mutex<CallbackCamera>,
    device_id: &str,
    storage: &StorageConfig,
) -> Result<CaptureArtifact, CameraError> {
    let frame = {
        let mut camera = camera
            .lock()
            .map_err(|_| CameraError::hardware_busy("Failed to lock camera"))?;
        camera
            .poll_frame()
            .map_err(|e| CameraError::classify(format!("Failed to capture frame: {}", e)))?
    };

    let resolution = frame.resolution();
    let image = decode_rgb(&frame.buffer_bytes(), resolution.width_x, resolution.height_y)?;
    let (width, height) = image.dimensions();

    let path = write_image(image::DynamicImage::ImageRgb8(image), storage)?;
    Ok(CaptureArtifact::new(path, device_id).with_dimensions(width, height))
}

/// Frames may arrive as MJPEG even when RGB was requested.
fn decode_rgb(raw: &[u8], width: u32, height: u32) -> Result<image::RgbImage, CameraError> {
    if raw.starts_with(&JPEG_MAGIC) {
        log::debug!("Decoding MJPEG frame ({} bytes) to RGB", raw.len());
        let img = image::load_from_memory(raw)
            .map_err(|e| CameraError::unknown(format!("Failed to decode MJPEG: {}", e)))?;
        return Ok(img.to_rgb8());
    }

    image::RgbImage::from_raw(width, height, raw.to_vec()).ok_or_else(|| {
        CameraError::unsupported(format!(
            "Unexpected frame size {} bytes for {}x{} RGB",
            raw.len(),
            width,
            height
        ))
    })
}

fn write_image(image: image::DynamicImage, storage: &StorageConfig) -> Result<PathBuf, CameraError> {
    fs::create_dir_all(&storage.output_directory).map_err(|e| {
        CameraError::classify(format!("Failed to create output directory: {}", e))
    })?;

    let file_name = format!(
        "{}_{}.{}",
        chrono::Utc::now().format("%Y%m%d_%H%M%S"),
        uuid::Uuid::new_v4().simple(),
        storage.extension()
    );
    let path = storage.output_directory.join(file_name);

    let result = if storage.extension() == "png" {
        image.save_with_format(&path, image::ImageFormat::Png)
    } else {
        let mut file = File::create(&path)
            .map_err(|e| CameraError::classify(format!("Failed to create image file: {}", e)))?;
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut file, storage.jpeg_quality);
        image.write_with_encoder(encoder)
    };
    result.map_err(|e| CameraError::unknown(format!("Failed to write image: {}", e)))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_raw_rgb() {
        let raw = vec![128u8; 4 * 2 * 3];
        let img = decode_rgb(&raw, 4, 2).unwrap();
        assert_eq!(img.dimensions(), (4, 2));
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let err = decode_rgb(&[1, 2, 3], 4, 2).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::Unsupported);
    }

    #[test]
    fn test_write_image_jpeg_and_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = StorageConfig {
            output_directory: dir.path().join("shots"),
            ..StorageConfig::default()
        };
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(8, 8));

        let jpeg = write_image(img.clone(), &storage).unwrap();
        assert!(jpeg.exists());
        assert_eq!(jpeg.extension().and_then(|e| e.to_str()), Some("jpg"));

        storage.image_format = "png".to_string();
        let png = write_image(img, &storage).unwrap();
        assert_eq!(png.extension().and_then(|e| e.to_str()), Some("png"));
    }
}
