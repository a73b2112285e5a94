// SPDX-License-Identifier: GPL-3.0-only

//! The public "keep the library alive" token
//!
//! The `Manager` singleton's lifetime is bound to the set of outstanding
//! `LibraryToken`s: the first one constructs it, the last one dropping
//! tears down the worker thread. A later `LibraryToken::new()` after every
//! prior one was dropped builds a fresh `Manager`, while the
//! [`crate::resolution_registry`] selections survive untouched.

use std::sync::{Arc, Mutex, Weak};

use crate::device::DeviceId;
use crate::info::Info;
use crate::manager::{Manager, ManagerOptions};
use crate::request::Handle;
use crate::resolution::Resolution;

static MANAGER: Mutex<Weak<Manager>> = Mutex::new(Weak::new());

/// A reference-counted handle keeping the capture lifecycle engine alive.
///
/// Cloning a `LibraryToken` is cheap and shares the same underlying
/// `Manager`; the worker only stops once every clone (and every other
/// outstanding token) is dropped.
#[derive(Clone)]
pub struct LibraryToken {
    manager: Arc<Manager>,
}

impl LibraryToken {
    /// Get or create the process's `Manager`, using the default platform
    /// backend.
    pub fn new() -> Self {
        Self::with_options(ManagerOptions::default())
    }

    /// Get or create the process's `Manager`.
    ///
    /// `options` is only used the moment a fresh `Manager` is actually
    /// constructed; if one is already alive, this returns a token to the
    /// existing instance and `options` is dropped unused.
    pub fn with_options(options: ManagerOptions) -> Self {
        let mut slot = MANAGER.lock().unwrap();
        if let Some(existing) = slot.upgrade() {
            return Self { manager: existing };
        }
        let manager = Manager::new(options);
        *slot = Arc::downgrade(&manager);
        Self { manager }
    }

    pub fn all_webcams_info(&self) -> Vec<Info> {
        self.manager.all_info()
    }

    pub fn open_webcam(&self, id: DeviceId) -> Handle {
        self.manager.open_webcam(id)
    }

    pub fn get_name(&self, id: &DeviceId) -> Option<String> {
        self.manager.name(id)
    }

    pub fn get_selected_resolution(&self, id: &DeviceId) -> Resolution {
        self.manager.get_selected_resolution(id)
    }

    pub fn set_selected_resolution(&self, id: DeviceId, resolution: Resolution) {
        self.manager.set_selected_resolution(id, resolution);
    }

    /// Drive the lazy worker lifecycle; call at most once per application
    /// frame.
    pub fn tick(&self) {
        self.manager.tick();
    }
}

impl Default for LibraryToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both tests below observe the process-global `MANAGER` slot; without
    // serializing them, a manager kept alive by one test's tokens would
    // leak into the other's "fresh manager" assertion.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn two_tokens_share_one_manager() {
        let _guard = TEST_LOCK.lock().unwrap();
        let a = LibraryToken::new();
        let b = LibraryToken::new();
        assert!(Arc::ptr_eq(&a.manager, &b.manager));
    }

    #[test]
    fn manager_is_rebuilt_after_every_token_drops() {
        let _guard = TEST_LOCK.lock().unwrap();
        let first_ptr = {
            let token = LibraryToken::new();
            Arc::as_ptr(&token.manager)
        };
        // `token` is dropped here; if nothing else holds the manager, a
        // later `LibraryToken::new()` must construct a fresh one.
        let token = LibraryToken::new();
        let second_ptr = Arc::as_ptr(&token.manager);
        assert_ne!(first_ptr, second_ptr);
    }
}
