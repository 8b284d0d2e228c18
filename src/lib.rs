//! crabshot: camera session lifecycle for preview-and-capture screens
//!
//! The crate centers on [`CameraSessionController`], a small state machine
//! (`uninitialized → opening → ready | failed`) over a pluggable camera
//! capability. It enumerates devices, opens a default one, captures stills,
//! switches between cameras and releases the hardware, surfacing every
//! failure as state instead of panicking.
//!
//! # Features
//! - `native` (default): camera capability backed by nokhwa
//! - `plugin` (default): Tauri plugin exposing sessions as commands
//!
//! # Usage
//! ```rust,ignore
//! use crabshot::{CameraSessionController, NokhwaCapability, SessionState};
//!
//! let controller = CameraSessionController::new(NokhwaCapability::default());
//! if let SessionState::Ready(device) = controller.initialize().await {
//!     println!("Using {}", device.name);
//!     if let Some(Ok(photo)) = controller.capture().await {
//!         println!("Saved {}", photo.path.display());
//!     }
//! }
//! controller.dispose().await;
//! ```
//!
//! With Tauri:
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(crabshot::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
pub mod capability;
#[cfg(feature = "plugin")]
pub mod commands;
pub mod config;
pub mod controller;
pub mod errors;
pub mod platform;
pub mod selection;
pub mod types;

// Testing utilities - scripted capability for offline testing
pub mod testing;

// Re-exports for convenience
pub use capability::{CameraCapability, SessionHandle};
pub use config::CrabshotConfig;
pub use controller::CameraSessionController;
pub use errors::{CameraError, ErrorKind, SessionError};
#[cfg(feature = "native")]
pub use platform::{NokhwaCapability, NokhwaHandle};
pub use selection::SelectionPolicy;
pub use types::{
    CaptureArtifact, CaptureResult, DeviceDescriptor, LensFacing, QualityPreset, SessionState,
};

#[cfg(feature = "plugin")]
use tauri::{
    plugin::{Builder, TauriPlugin},
    Runtime,
};

/// Initialize the crabshot plugin with all commands
#[cfg(feature = "plugin")]
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("crabshot")
        .invoke_handler(tauri::generate_handler![
            commands::session::list_camera_devices,
            commands::session::create_camera_session,
            commands::session::initialize_camera_session,
            commands::session::get_camera_session_state,
            commands::session::capture_photo,
            commands::session::get_last_capture,
            commands::session::switch_camera,
            commands::session::dispose_camera_session,
        ])
        .build()
}

/// Initialize logging for the camera session system
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabshot=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
