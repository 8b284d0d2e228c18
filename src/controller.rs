//! Camera session lifecycle controller
//!
//! `CameraSessionController` drives a single camera session through
//! `Uninitialized → Opening → Ready | Failed` on top of a [`CameraCapability`].
//! Capability failures never escape as panics: they land in the session state
//! or in the last capture slot, and callers recover with a fresh `initialize()`.
//!
//! Lifecycle operations (`initialize`, `switch_device`, `dispose`) are
//! serialized per controller. `capture` is guarded by a busy flag instead, so
//! an overlapping call returns immediately without touching the device.

use crate::capability::{CameraCapability, SessionHandle};
use crate::config::CrabshotConfig;
use crate::errors::SessionError;
use crate::selection::{next_device, SelectionPolicy};
use crate::types::{CaptureResult, DeviceDescriptor, QualityPreset, SessionState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as SyncMutex;
use tokio::sync::{watch, Mutex};

#[derive(Default)]
struct Lifecycle {
    devices: Vec<DeviceDescriptor>,
    /// Device most recently opened or attempted; the reference point for switching.
    current: Option<DeviceDescriptor>,
}

/// Clears the capture flag when the capture future completes or is dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CameraSessionController<C: CameraCapability> {
    capability: C,
    preset: QualityPreset,
    policy: SelectionPolicy,
    state: watch::Sender<SessionState>,
    lifecycle: Mutex<Lifecycle>,
    handle: Mutex<Option<C::Handle>>,
    capture_busy: AtomicBool,
    last_result: SyncMutex<Option<CaptureResult>>,
}

impl<C: CameraCapability> CameraSessionController<C> {
    pub fn new(capability: C) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            capability,
            preset: QualityPreset::default(),
            policy: SelectionPolicy::default(),
            state,
            lifecycle: Mutex::new(Lifecycle::default()),
            handle: Mutex::new(None),
            capture_busy: AtomicBool::new(false),
            last_result: SyncMutex::new(None),
        }
    }

    /// Build a controller using the preset and selection policy from `config`.
    pub fn from_config(capability: C, config: &CrabshotConfig) -> Self {
        Self::new(capability)
            .with_preset(config.camera.quality_preset)
            .with_policy(config.selection_policy())
    }

    pub fn with_preset(mut self, preset: QualityPreset) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn preset(&self) -> QualityPreset {
        self.preset
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn capability(&self) -> &C {
        &self.capability
    }

    /// Snapshot of the current session state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every state transition, including the intermediate `Opening`.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Result of the most recent capture that reached the device.
    pub fn last_capture(&self) -> Option<CaptureResult> {
        self.last_result
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture_busy.load(Ordering::Acquire)
    }

    /// Devices seen by the last enumeration.
    pub async fn devices(&self) -> Vec<DeviceDescriptor> {
        self.lifecycle.lock().await.devices.clone()
    }

    /// Enumerate devices and open the one chosen by the selection policy.
    ///
    /// Any handle already held is released first, so this doubles as the
    /// retry path after a failure.
    pub async fn initialize(&self) -> SessionState {
        let mut lifecycle = self.lifecycle.lock().await;
        self.set_state(SessionState::Opening);
        self.release_handle().await;

        lifecycle.devices = self.capability.enumerate_devices().await;
        log::info!("Found {} camera devices", lifecycle.devices.len());
        for device in &lifecycle.devices {
            log::debug!(
                "Camera: {} - {} ({})",
                device.id,
                device.name,
                device.facing.as_str()
            );
        }

        let Some(device) = self.policy.select(&lifecycle.devices).cloned() else {
            lifecycle.current = None;
            log::warn!("No camera device available");
            return self.settle(SessionState::Failed(SessionError::NoDeviceAvailable));
        };

        log::debug!("Selected default camera {} via {:?}", device.id, self.policy);
        self.open(&mut lifecycle, device).await
    }

    /// Take a still photo from the ready session.
    ///
    /// Returns `None` without calling the device when the session is not
    /// ready or another capture is still in flight. Capture failures are
    /// returned and remembered but leave the session `Ready`.
    pub async fn capture(&self) -> Option<CaptureResult> {
        let state = self.state();
        if !state.is_ready() {
            log::debug!("Ignoring capture: session is {}", state.as_str());
            return None;
        }

        let Some(_busy) = BusyGuard::acquire(&self.capture_busy) else {
            log::debug!("Ignoring capture: capture already in flight");
            return None;
        };

        let mut slot = self.handle.lock().await;
        // A lifecycle operation may have replaced the session while we waited.
        let device_id = match self.state.borrow().active_device() {
            Some(device) => device.id.clone(),
            None => {
                log::debug!("Ignoring capture: session left ready state");
                return None;
            }
        };
        let handle = slot.as_mut()?;

        let result = handle.capture().await.map_err(|e| {
            log::warn!("Capture failed on camera {}: {}", device_id, e);
            SessionError::capture_failed(e)
        });
        drop(slot);

        if let Ok(artifact) = &result {
            log::info!(
                "Captured photo from camera {}: {}",
                device_id,
                artifact.path.display()
            );
        }

        *self.last_result.lock().unwrap_or_else(|e| e.into_inner()) = Some(result.clone());
        Some(result)
    }

    /// Reopen the session on the first enumerated device that is not the
    /// current one, scanning from the start of the list.
    ///
    /// Returns `SwitchUnavailable` with the state untouched when fewer than
    /// two devices were enumerated.
    pub async fn switch_device(&self) -> Result<SessionState, SessionError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.devices.len() < 2 {
            log::debug!(
                "Camera switch unavailable: {} device(s) enumerated",
                lifecycle.devices.len()
            );
            return Err(SessionError::SwitchUnavailable);
        }

        let Some(next) = next_device(&lifecycle.devices, lifecycle.current.as_ref()).cloned()
        else {
            log::debug!("No alternate camera found, keeping current session");
            return Ok(self.state());
        };

        log::info!(
            "Switching camera {} -> {}",
            lifecycle
                .current
                .as_ref()
                .map(|d| d.id.as_str())
                .unwrap_or("none"),
            next.id
        );
        self.set_state(SessionState::Opening);
        self.release_handle().await;
        Ok(self.open(&mut lifecycle, next).await)
    }

    /// Release the device. Safe to call any number of times.
    ///
    /// The enumerated device list is dropped too, so a disposed controller
    /// only reopens a camera through a fresh `initialize()`.
    pub async fn dispose(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if self.release_handle().await {
            log::info!("Camera session disposed");
        }
        lifecycle.devices.clear();
        lifecycle.current = None;
        self.set_state(SessionState::Uninitialized);
    }

    async fn open(&self, lifecycle: &mut Lifecycle, device: DeviceDescriptor) -> SessionState {
        lifecycle.current = Some(device.clone());

        match self.capability.open_device(&device, self.preset).await {
            Ok(handle) => {
                let mut slot = self.handle.lock().await;
                debug_assert!(slot.is_none(), "previous session handle must be released");
                if let Some(mut stale) = slot.replace(handle) {
                    stale.release();
                }
                drop(slot);
                log::info!(
                    "Camera {} ready ({} preset)",
                    device.id,
                    self.preset.as_str()
                );
                self.settle(SessionState::Ready(device))
            }
            Err(e) => {
                log::error!("Failed to open camera {}: {}", device.id, e);
                self.settle(SessionState::Failed(SessionError::open_failed(e)))
            }
        }
    }

    async fn release_handle(&self) -> bool {
        match self.handle.lock().await.take() {
            Some(mut handle) => {
                handle.release();
                true
            }
            None => false,
        }
    }

    fn settle(&self, state: SessionState) -> SessionState {
        self.set_state(state.clone());
        state
    }

    fn set_state(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            log::debug!("Session state {} -> {}", current.as_str(), next.as_str());
            *current = next;
            true
        });
    }
}

impl<C: CameraCapability> Drop for CameraSessionController<C> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.get_mut().take() {
            log::warn!("Camera session dropped without dispose, releasing device");
            handle.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CameraError, ErrorKind};
    use crate::testing::MockCapability;
    use crate::types::LensFacing;

    fn two_cams() -> MockCapability {
        MockCapability::with_devices(vec![
            DeviceDescriptor::new("camA", LensFacing::Back),
            DeviceDescriptor::new("camB", LensFacing::Front),
        ])
    }

    #[tokio::test]
    async fn test_new_controller_is_uninitialized() {
        let controller = CameraSessionController::new(two_cams());
        assert_eq!(controller.state(), SessionState::Uninitialized);
        assert!(controller.last_capture().is_none());
        assert!(!controller.is_capturing());
    }

    #[tokio::test]
    async fn test_initialize_passes_preset_to_capability() {
        let mock = two_cams();
        let controller =
            CameraSessionController::new(mock.clone()).with_preset(QualityPreset::Low);
        controller.initialize().await;
        assert_eq!(mock.last_open_preset(), Some(QualityPreset::Low));
    }

    #[tokio::test]
    async fn test_prefer_facing_policy() {
        let controller = CameraSessionController::new(two_cams())
            .with_policy(SelectionPolicy::PreferFacing(LensFacing::Front));
        let state = controller.initialize().await;
        assert_eq!(state.active_device().map(|d| d.id.as_str()), Some("camB"));
    }

    #[tokio::test]
    async fn test_reinitialize_releases_previous_handle() {
        let mock = two_cams();
        let controller = CameraSessionController::new(mock.clone());
        controller.initialize().await;
        controller.initialize().await;
        assert_eq!(mock.open_calls(), 2);
        assert_eq!(mock.release_calls(), 1);
        assert_eq!(mock.live_handles(), 1);
        assert_eq!(mock.peak_live_handles(), 1);
    }

    #[tokio::test]
    async fn test_switch_after_failed_open_moves_to_other_device() {
        let mock = two_cams();
        mock.fail_open("camA", CameraError::hardware_busy("in use"));
        let controller = CameraSessionController::new(mock.clone());

        let state = controller.initialize().await;
        assert_eq!(state.error().map(|e| e.kind()), Some(ErrorKind::HardwareBusy));

        let state = controller.switch_device().await.unwrap();
        assert_eq!(state.active_device().map(|d| d.id.as_str()), Some("camB"));
    }

    #[tokio::test]
    async fn test_drop_releases_held_handle() {
        let mock = two_cams();
        {
            let controller = CameraSessionController::new(mock.clone());
            controller.initialize().await;
            assert_eq!(mock.live_handles(), 1);
        }
        assert_eq!(mock.live_handles(), 0);
        assert_eq!(mock.release_calls(), 1);
    }
}
