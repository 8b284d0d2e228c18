use crate::capability::CameraCapability;
use crate::config::CrabshotConfig;
use crate::controller::CameraSessionController;
use crate::platform::NokhwaCapability;
use crate::types::{CaptureArtifact, CaptureResult, DeviceDescriptor, SessionState};
use std::collections::HashMap;
use std::sync::Arc;
use tauri::command;
use tokio::sync::RwLock;

type NativeController = CameraSessionController<NokhwaCapability>;

// One independent controller per session id; controllers share nothing.
lazy_static::lazy_static! {
    static ref SESSION_REGISTRY: RwLock<HashMap<String, Arc<NativeController>>> = RwLock::new(HashMap::new());
}

async fn get_session(session_id: &str) -> Result<Arc<NativeController>, String> {
    SESSION_REGISTRY
        .read()
        .await
        .get(session_id)
        .cloned()
        .ok_or_else(|| format!("Camera session '{}' not found", session_id))
}

/// List cameras without opening any of them
#[command]
pub async fn list_camera_devices() -> Result<Vec<DeviceDescriptor>, String> {
    let devices = NokhwaCapability::default().enumerate_devices().await;
    log::info!("Found {} cameras", devices.len());
    Ok(devices)
}

/// Create a camera session controller and return its id.
///
/// Without an explicit config the session uses `crabshot.toml` from the
/// working directory, or defaults when it is missing. The session starts
/// `uninitialized`; call `initialize_camera_session` to open a device.
#[command]
pub async fn create_camera_session(config: Option<CrabshotConfig>) -> Result<String, String> {
    let config = config.unwrap_or_else(CrabshotConfig::load_or_default);
    config.validate()?;

    let controller =
        CameraSessionController::from_config(NokhwaCapability::from_config(&config), &config);
    let session_id = uuid::Uuid::new_v4().to_string();

    SESSION_REGISTRY
        .write()
        .await
        .insert(session_id.clone(), Arc::new(controller));
    log::info!("Created camera session {}", session_id);
    Ok(session_id)
}

/// Enumerate devices and open the default one
#[command]
pub async fn initialize_camera_session(session_id: String) -> Result<SessionState, String> {
    let controller = get_session(&session_id).await?;
    Ok(controller.initialize().await)
}

#[command]
pub async fn get_camera_session_state(session_id: String) -> Result<SessionState, String> {
    Ok(get_session(&session_id).await?.state())
}

/// Capture a photo. `None` means the call was ignored (not ready, or busy).
#[command]
pub async fn capture_photo(session_id: String) -> Result<Option<CaptureArtifact>, String> {
    let controller = get_session(&session_id).await?;
    match controller.capture().await {
        None => Ok(None),
        Some(Ok(artifact)) => Ok(Some(artifact)),
        Some(Err(e)) => Err(e.to_string()),
    }
}

#[command]
pub async fn get_last_capture(session_id: String) -> Result<Option<CaptureResult>, String> {
    Ok(get_session(&session_id).await?.last_capture())
}

/// Reopen the session on the other camera
#[command]
pub async fn switch_camera(session_id: String) -> Result<SessionState, String> {
    let controller = get_session(&session_id).await?;
    controller.switch_device().await.map_err(|e| e.to_string())
}

/// Release the device and forget the session
#[command]
pub async fn dispose_camera_session(session_id: String) -> Result<(), String> {
    let controller = SESSION_REGISTRY.write().await.remove(&session_id);
    match controller {
        Some(controller) => {
            controller.dispose().await;
            log::info!("Disposed camera session {}", session_id);
            Ok(())
        }
        None => {
            log::debug!("Dispose of unknown session {} ignored", session_id);
            Ok(())
        }
    }
}
