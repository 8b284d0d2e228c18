//! In-memory `CameraCapability` with scripted failures and call counters.

use crate::capability::{CameraCapability, SessionHandle};
use crate::errors::CameraError;
use crate::types::{CaptureArtifact, DeviceDescriptor, QualityPreset};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

#[derive(Default)]
struct MockInner {
    devices: Mutex<Vec<DeviceDescriptor>>,
    open_failures: Mutex<HashMap<String, CameraError>>,
    capture_failures: Mutex<VecDeque<CameraError>>,
    open_gate: Mutex<Option<Arc<Notify>>>,
    capture_gate: Mutex<Option<Arc<Notify>>>,
    opened: Mutex<Vec<(String, QualityPreset)>>,
    enumerate_calls: AtomicUsize,
    open_calls: AtomicUsize,
    capture_calls: AtomicUsize,
    release_calls: AtomicUsize,
    live_handles: AtomicUsize,
    peak_live_handles: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Scripted camera capability.
///
/// Clones share state, so a test can keep one clone for assertions while the
/// controller owns another.
#[derive(Clone, Default)]
pub struct MockCapability {
    inner: Arc<MockInner>,
}

impl MockCapability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: Vec<DeviceDescriptor>) -> Self {
        let mock = Self::new();
        mock.set_devices(devices);
        mock
    }

    pub fn set_devices(&self, devices: Vec<DeviceDescriptor>) {
        *lock(&self.inner.devices) = devices;
    }

    /// Every open of `device_id` fails with `error` until cleared.
    pub fn fail_open(&self, device_id: &str, error: CameraError) {
        lock(&self.inner.open_failures).insert(device_id.to_string(), error);
    }

    pub fn clear_open_failure(&self, device_id: &str) {
        lock(&self.inner.open_failures).remove(device_id);
    }

    /// The next capture fails with `error`. Queued failures are consumed in order.
    pub fn fail_next_capture(&self, error: CameraError) {
        lock(&self.inner.capture_failures).push_back(error);
    }

    /// Make every subsequent open wait for a notification on the returned gate.
    pub fn gate_open(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.inner.open_gate) = Some(gate.clone());
        gate
    }

    /// Make every subsequent capture wait for a notification on the returned gate.
    pub fn gate_capture(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.inner.capture_gate) = Some(gate.clone());
        gate
    }

    pub fn enumerate_calls(&self) -> usize {
        self.inner.enumerate_calls.load(Ordering::SeqCst)
    }

    pub fn open_calls(&self) -> usize {
        self.inner.open_calls.load(Ordering::SeqCst)
    }

    pub fn capture_calls(&self) -> usize {
        self.inner.capture_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.inner.release_calls.load(Ordering::SeqCst)
    }

    /// Handles opened and not yet released.
    pub fn live_handles(&self) -> usize {
        self.inner.live_handles.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live handles seen.
    pub fn peak_live_handles(&self) -> usize {
        self.inner.peak_live_handles.load(Ordering::SeqCst)
    }

    /// Device ids passed to `open_device`, in call order.
    pub fn opened_devices(&self) -> Vec<String> {
        lock(&self.inner.opened)
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn last_open_preset(&self) -> Option<QualityPreset> {
        lock(&self.inner.opened).last().map(|(_, preset)| *preset)
    }
}

#[async_trait]
impl CameraCapability for MockCapability {
    type Handle = MockHandle;

    async fn enumerate_devices(&self) -> Vec<DeviceDescriptor> {
        self.inner.enumerate_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner.devices).clone()
    }

    async fn open_device(
        &self,
        device: &DeviceDescriptor,
        preset: QualityPreset,
    ) -> Result<MockHandle, CameraError> {
        self.inner.open_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner.opened).push((device.id.clone(), preset));

        let gate = lock(&self.inner.open_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(error) = lock(&self.inner.open_failures).get(&device.id).cloned() {
            return Err(error);
        }

        let live = self.inner.live_handles.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak_live_handles.fetch_max(live, Ordering::SeqCst);

        Ok(MockHandle {
            device_id: device.id.clone(),
            inner: self.inner.clone(),
            sequence: 0,
            released: false,
        })
    }
}

/// Session handle produced by `MockCapability`
pub struct MockHandle {
    device_id: String,
    inner: Arc<MockInner>,
    sequence: u64,
    released: bool,
}

impl MockHandle {
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

#[async_trait]
impl SessionHandle for MockHandle {
    async fn capture(&mut self) -> Result<CaptureArtifact, CameraError> {
        self.inner.capture_calls.fetch_add(1, Ordering::SeqCst);

        let gate = lock(&self.inner.capture_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let failure = lock(&self.inner.capture_failures).pop_front();
        if let Some(error) = failure {
            return Err(error);
        }

        self.sequence += 1;
        let path = std::env::temp_dir().join(format!(
            "crabshot-mock-{}-{}.jpg",
            self.device_id, self.sequence
        ));
        Ok(CaptureArtifact::new(path, self.device_id.clone()).with_dimensions(640, 480))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.inner.release_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.live_handles.fetch_sub(1, Ordering::SeqCst);
    }
}
