// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end scenarios against the public API surface, using
//! `platform::mock` in place of real hardware.
//!
//! `LibraryToken` is a process-wide singleton, so these tests share one
//! `Manager` instance; `TEST_GUARD` serializes them and each test drops
//! every token/handle it created before returning, so the next test's
//! `LibraryToken::new()` observes a torn-down manager and builds a fresh
//! one against its own mock backend.

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use wcam_core::platform::mock::{MockBackend, OpenBehavior};
use wcam_core::{image_factory, CaptureError, CaptureStatus, DeviceId, LibraryToken, ManagerOptions, Resolution};

static TEST_GUARD: Mutex<()> = Mutex::new(());

fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn enumerate_with_no_devices() {
    let _guard = TEST_GUARD.lock().unwrap();
    let token = LibraryToken::with_options(ManagerOptions::new().with_backend(Box::new(MockBackend::new())));

    assert!(token.all_webcams_info().is_empty());
    assert_eq!(
        token.get_selected_resolution(&DeviceId::new("never-plugged-in")),
        Resolution::new(1, 1)
    );
}

#[test]
fn open_receive_frame_close() {
    let _guard = TEST_GUARD.lock().unwrap();
    image_factory::ensure_test_image_factory();

    let backend = MockBackend::new();
    let id = DeviceId::new("integration-open-close");
    backend.add_device(id.clone(), "Integration Cam", vec![Resolution::new(320, 240)]);

    let token = LibraryToken::with_options(ManagerOptions::new().with_backend(Box::new(backend)));
    let handle = token.open_webcam(id);

    let mut saw_live = false;
    for _ in 0..200 {
        token.tick();
        if let CaptureStatus::Live(image) = handle.image() {
            assert_eq!(
                image.rgb_bytes().len() as u64,
                image.resolution().pixels_count() * 3
            );
            saw_live = true;
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert!(saw_live, "expected the handle to go Live within the polling window");

    drop(handle);
}

#[test]
fn unplug_then_replug_restarts_the_capture() {
    let _guard = TEST_GUARD.lock().unwrap();
    image_factory::ensure_test_image_factory();

    let backend = MockBackend::new();
    let id = DeviceId::new("integration-unplug-replug");
    backend.add_device(id.clone(), "Integration Cam", vec![Resolution::new(320, 240)]);

    let token = LibraryToken::with_options(ManagerOptions::new().with_backend(Box::new(backend.clone())));
    let handle = token.open_webcam(id.clone());

    assert!(wait_for(|| {
        token.tick();
        matches!(handle.image(), CaptureStatus::Live(_))
    }));

    backend.set_plugged(&id, false);
    assert!(wait_for(|| {
        token.tick();
        matches!(handle.image(), CaptureStatus::Error(CaptureError::Unplugged))
    }));

    backend.set_plugged(&id, true);
    assert!(wait_for(|| {
        token.tick();
        matches!(handle.image(), CaptureStatus::Live(_))
    }));

    drop(handle);
}

#[test]
fn already_in_use_surfaces_as_an_error_status() {
    let _guard = TEST_GUARD.lock().unwrap();

    let backend = MockBackend::new();
    let id = DeviceId::new("integration-already-in-use");
    backend.add_device(id.clone(), "Integration Cam", vec![Resolution::new(320, 240)]);
    backend.set_open_behavior(&id, OpenBehavior::Fail(CaptureError::AlreadyInUse));

    let token = LibraryToken::with_options(ManagerOptions::new().with_backend(Box::new(backend)));
    let handle = token.open_webcam(id);

    assert!(wait_for(|| {
        token.tick();
        matches!(handle.image(), CaptureStatus::Error(CaptureError::AlreadyInUse))
    }));

    drop(handle);
}

#[test]
fn opening_the_same_device_twice_shares_one_request() {
    let _guard = TEST_GUARD.lock().unwrap();
    let token = LibraryToken::with_options(ManagerOptions::new().with_backend(Box::new(MockBackend::new())));
    let id = DeviceId::new("integration-shared-handle");

    let a = token.open_webcam(id.clone());
    let b = token.open_webcam(id);
    assert_eq!(a, b);
}

#[test]
fn resolution_change_while_live_eventually_settles_at_the_new_resolution() {
    let _guard = TEST_GUARD.lock().unwrap();
    image_factory::ensure_test_image_factory();

    let backend = MockBackend::new();
    let id = DeviceId::new("integration-resolution-change");
    backend.add_device(
        id.clone(),
        "Integration Cam",
        vec![Resolution::new(1280, 720), Resolution::new(640, 480)],
    );

    let token = LibraryToken::with_options(ManagerOptions::new().with_backend(Box::new(backend)));
    let handle = token.open_webcam(id.clone());

    assert!(wait_for(|| {
        token.tick();
        matches!(handle.image(), CaptureStatus::Live(_))
    }));

    token.set_selected_resolution(id, Resolution::new(640, 480));

    assert!(wait_for(|| {
        token.tick();
        matches!(
            handle.image(),
            CaptureStatus::Live(image) if image.resolution() == Resolution::new(640, 480)
        )
    }));

    drop(handle);
}
