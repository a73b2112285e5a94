// SPDX-License-Identifier: GPL-3.0-only

//! The capture lifecycle engine
//!
//! Owns the worker thread, the request table, the info cache, and
//! translates application calls into state transitions. The
//! selected-resolution map deliberately lives outside `Manager`, in
//! [`crate::resolution_registry`], so it survives the manager being torn
//! down and rebuilt.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::capture::Capture;
use crate::device::DeviceId;
use crate::error::CaptureError;
use crate::info::{self, Info};
use crate::platform::{self, PlatformBackend};
use crate::request::{CaptureStatus, Handle, Request};
use crate::resolution::Resolution;
use crate::resolution_registry;

/// How often the worker re-enumerates devices and re-evaluates every
/// request. Kept brief so restart/unplug scenarios settle quickly without
/// busy-looping.
const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Construction options for a [`Manager`], installed through
/// [`crate::library_token::LibraryToken::with_options`].
///
/// Its only knob is which [`PlatformBackend`] to drive, which is how tests
/// substitute [`crate::platform::mock::MockBackend`] for real hardware.
pub struct ManagerOptions {
    backend: Box<dyn PlatformBackend>,
}

impl ManagerOptions {
    pub fn new() -> Self {
        Self {
            backend: platform::default_backend(),
        }
    }

    pub fn with_backend(mut self, backend: Box<dyn PlatformBackend>) -> Self {
        self.backend = backend;
        self
    }
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Manager {
    backend: Box<dyn PlatformBackend>,
    info_cache: Mutex<Vec<Info>>,
    requests: Mutex<HashMap<DeviceId, Weak<Request>>>,
    info_requested: AtomicBool,
    shutdown: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Manager {
    pub(crate) fn new(options: ManagerOptions) -> Arc<Self> {
        Arc::new(Self {
            backend: options.backend,
            info_cache: Mutex::new(Vec::new()),
            requests: Mutex::new(HashMap::new()),
            info_requested: AtomicBool::new(false),
            shutdown: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        })
    }

    /// Look up or create the request for `id` and return a handle to it.
    /// Idempotent from the caller's perspective; never blocks.
    pub fn open_webcam(&self, id: DeviceId) -> Handle {
        let mut requests = self.requests.lock().unwrap();
        if let Some(existing) = requests.get(&id).and_then(Weak::upgrade) {
            return Handle::from_arc(existing);
        }
        let request = Arc::new(Request::new(id.clone()));
        requests.insert(id, Arc::downgrade(&request));
        Handle::from_arc(request)
    }

    /// A snapshot of the info cache; also arms the "info requested" flag
    /// the lazy worker lifecycle rule reads on the next `tick`.
    pub fn all_info(&self) -> Vec<Info> {
        self.info_requested.store(true, Ordering::SeqCst);
        self.info_cache.lock().unwrap().clone()
    }

    pub fn name(&self, id: &DeviceId) -> Option<String> {
        self.info_cache
            .lock()
            .unwrap()
            .iter()
            .find(|info| &info.id == id)
            .map(|info| info.name.clone())
    }

    /// The user's selection, or the device's largest supported resolution,
    /// or `1x1` if the device is unknown.
    pub fn get_selected_resolution(&self, id: &DeviceId) -> Resolution {
        if let Some(selected) = resolution_registry::get(id) {
            return selected;
        }
        self.info_cache
            .lock()
            .unwrap()
            .iter()
            .find(|info| &info.id == id)
            .and_then(|info| info.resolutions.first().copied())
            .unwrap_or_default()
    }

    /// Write the selection; if it actually changed, restart any live
    /// request for `id` so the worker reopens at the new resolution.
    pub fn set_selected_resolution(&self, id: DeviceId, resolution: Resolution) {
        if !resolution_registry::set(id.clone(), resolution) {
            return;
        }
        if let Some(request) = self.requests.lock().unwrap().get(&id).and_then(Weak::upgrade) {
            request.set_status(CaptureStatus::NotInitYet);
        }
    }

    /// Drive the lazy worker lifecycle rule: the worker only runs while
    /// something is actually watching a device or asked for fresh info.
    /// Must be called at most once per application frame.
    pub fn tick(self: &Arc<Self>) {
        let info_requested = self.info_requested.swap(false, Ordering::SeqCst);
        let has_live_request = self
            .requests
            .lock()
            .unwrap()
            .values()
            .any(|weak| weak.strong_count() > 0);

        if has_live_request || info_requested {
            self.ensure_worker_running();
        } else {
            self.stop_worker();
        }
    }

    fn ensure_worker_running(self: &Arc<Self>) {
        let mut worker = self.worker.lock().unwrap();
        if worker.is_some() {
            return;
        }
        self.shutdown.store(false, Ordering::SeqCst);
        let manager = Arc::clone(self);
        *worker = Some(thread::spawn(move || manager.worker_loop()));
        debug!("webcam manager worker started");
    }

    fn stop_worker(&self) {
        let handle = self.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            self.shutdown.store(true, Ordering::SeqCst);
            if handle.join().is_err() {
                warn!("webcam manager worker panicked");
            }
        }
    }

    fn worker_loop(self: Arc<Self>) {
        while !self.shutdown.load(Ordering::SeqCst) {
            self.worker_iteration();
            thread::sleep(WORKER_POLL_INTERVAL);
        }
    }

    fn worker_iteration(&self) {
        let raw = self.backend.list_devices().unwrap_or_else(|err| {
            debug!(error = %err, "device enumeration failed; treating as no devices this pass");
            Vec::new()
        });
        let fresh_info = info::normalize(raw);

        let previous_ids: HashSet<DeviceId> = self
            .info_cache
            .lock()
            .unwrap()
            .iter()
            .map(|info| info.id.clone())
            .collect();
        let current_ids: HashSet<DeviceId> =
            fresh_info.iter().map(|info| info.id.clone()).collect();
        let newly_present: HashSet<&DeviceId> = current_ids.difference(&previous_ids).collect();

        *self.info_cache.lock().unwrap() = fresh_info;

        let snapshot: Vec<(DeviceId, Arc<Request>)> = {
            let mut requests = self.requests.lock().unwrap();
            requests.retain(|_, weak| weak.strong_count() > 0);
            requests
                .iter()
                .filter_map(|(id, weak)| weak.upgrade().map(|request| (id.clone(), request)))
                .collect()
        };

        for (id, request) in snapshot {
            if newly_present.contains(&id) {
                request.set_status(CaptureStatus::NotInitYet);
            }

            if !current_ids.contains(&id) {
                request.set_status(CaptureStatus::Error(CaptureError::Unplugged));
                drop(request.take_capture());
                continue;
            }

            match request.status() {
                CaptureStatus::Live(_) => continue,
                CaptureStatus::Error(CaptureError::AlreadyInUse) => continue,
                _ => self.attempt_open(&id, &request),
            }
        }
    }

    fn attempt_open(&self, id: &DeviceId, request: &Arc<Request>) {
        drop(request.take_capture());
        let resolution = self.get_selected_resolution(id);
        match Capture::open(self.backend.as_ref(), id, resolution, Arc::clone(request)) {
            Ok(capture) => request.install_capture(capture),
            Err(CaptureError::AlreadyInUse) => {
                request.set_status(CaptureStatus::Error(CaptureError::AlreadyInUse));
            }
            Err(CaptureError::Unplugged) => {
                // Stay NotInitYet; will retry once re-enumeration sees it again.
            }
            Err(CaptureError::Unknown(msg)) => {
                request.set_status(CaptureStatus::Error(CaptureError::Unknown(msg)));
            }
        }
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_factory;
    use crate::platform::mock::{MockBackend, OpenBehavior};
    use std::time::Duration;

    fn manager_with(backend: MockBackend) -> Arc<Manager> {
        Manager::new(ManagerOptions::new().with_backend(Box::new(backend)))
    }

    fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
        for _ in 0..100 {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn unknown_device_has_default_selected_resolution() {
        let manager = manager_with(MockBackend::new());
        assert_eq!(
            manager.get_selected_resolution(&DeviceId::new("missing")),
            Resolution::new(1, 1)
        );
    }

    #[test]
    fn open_webcam_is_idempotent_by_handle_equality() {
        let manager = manager_with(MockBackend::new());
        let id = DeviceId::new("dev0");
        let a = manager.open_webcam(id.clone());
        let b = manager.open_webcam(id);
        assert_eq!(a, b);
    }

    #[test]
    fn tick_starts_and_stops_the_worker_lazily() {
        let manager = manager_with(MockBackend::new());
        assert!(manager.worker.lock().unwrap().is_none());
        let handle = manager.open_webcam(DeviceId::new("dev0"));
        manager.tick();
        assert!(manager.worker.lock().unwrap().is_some());

        // Dropping the only handle removes the last live request; the next
        // tick should stop the worker again.
        drop(handle);
        manager.tick();
        assert!(manager.worker.lock().unwrap().is_none());
    }

    #[test]
    fn open_handle_eventually_goes_live() {
        image_factory::ensure_test_image_factory();
        let backend = MockBackend::new();
        let id = DeviceId::new("dev-live");
        backend.add_device(id.clone(), "Cam", vec![Resolution::new(640, 480)]);
        let manager = manager_with(backend);

        let handle = manager.open_webcam(id);
        manager.tick();

        assert!(wait_for(|| matches!(handle.image(), CaptureStatus::Live(_))));
    }

    #[test]
    fn unplugging_transitions_to_error_unplugged() {
        image_factory::ensure_test_image_factory();
        let backend = MockBackend::new();
        let id = DeviceId::new("dev-unplug");
        backend.add_device(id.clone(), "Cam", vec![Resolution::new(640, 480)]);
        let manager = manager_with(backend.clone());

        let handle = manager.open_webcam(id.clone());
        manager.tick();
        assert!(wait_for(|| matches!(handle.image(), CaptureStatus::Live(_))));

        backend.set_plugged(&id, false);
        assert!(wait_for(|| matches!(
            handle.image(),
            CaptureStatus::Error(CaptureError::Unplugged)
        )));
    }

    #[test]
    fn replugging_restarts_to_live() {
        image_factory::ensure_test_image_factory();
        let backend = MockBackend::new();
        let id = DeviceId::new("dev-replug");
        backend.add_device(id.clone(), "Cam", vec![Resolution::new(640, 480)]);
        let manager = manager_with(backend.clone());

        let handle = manager.open_webcam(id.clone());
        manager.tick();
        assert!(wait_for(|| matches!(handle.image(), CaptureStatus::Live(_))));

        backend.set_plugged(&id, false);
        assert!(wait_for(|| matches!(
            handle.image(),
            CaptureStatus::Error(CaptureError::Unplugged)
        )));

        backend.set_plugged(&id, true);
        assert!(wait_for(|| matches!(handle.image(), CaptureStatus::Live(_))));
    }

    #[test]
    fn already_in_use_is_surfaced_and_not_retried_forever() {
        let backend = MockBackend::new();
        let id = DeviceId::new("dev-busy");
        backend.add_device(id.clone(), "Cam", vec![Resolution::new(640, 480)]);
        backend.set_open_behavior(&id, OpenBehavior::Fail(CaptureError::AlreadyInUse));
        let manager = manager_with(backend);

        let handle = manager.open_webcam(id);
        manager.tick();
        assert!(wait_for(|| matches!(
            handle.image(),
            CaptureStatus::Error(CaptureError::AlreadyInUse)
        )));
    }

    #[test]
    fn resolution_change_restarts_a_live_request() {
        image_factory::ensure_test_image_factory();
        let backend = MockBackend::new();
        let id = DeviceId::new("dev-reselect");
        backend.add_device(
            id.clone(),
            "Cam",
            vec![Resolution::new(1280, 720), Resolution::new(640, 480)],
        );
        let manager = manager_with(backend);

        let handle = manager.open_webcam(id.clone());
        manager.tick();
        assert!(wait_for(|| matches!(handle.image(), CaptureStatus::Live(_))));

        manager.set_selected_resolution(id, Resolution::new(640, 480));
        assert!(wait_for(|| matches!(handle.image(), CaptureStatus::Live(_))));
    }
}
