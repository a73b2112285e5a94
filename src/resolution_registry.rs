// SPDX-License-Identifier: GPL-3.0-only

//! The process-global selected-resolution map
//!
//! Unlike every other piece of manager state, this map is **not** owned by
//! [`crate::manager::Manager`]: it is a process-scoped singleton so a user's
//! resolution choice survives a library quiescent period where every
//! [`crate::library_token::LibraryToken`] was dropped and a fresh `Manager`
//! was later constructed. It is the one piece of state that legitimately
//! outlives the manager.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::device::DeviceId;
use crate::resolution::Resolution;

static SELECTIONS: OnceLock<Mutex<HashMap<DeviceId, Resolution>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<DeviceId, Resolution>> {
    SELECTIONS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// The user's chosen resolution for `id`, if one was ever set.
pub fn get(id: &DeviceId) -> Option<Resolution> {
    registry().lock().unwrap().get(id).copied()
}

/// Record `id`'s selection. Returns `true` if this changed the stored value
/// (including setting it for the first time), `false` if it was already
/// exactly `resolution` — setting the same value twice in a row is a no-op.
pub fn set(id: DeviceId, resolution: Resolution) -> bool {
    let mut map = registry().lock().unwrap();
    match map.get(&id) {
        Some(existing) if *existing == resolution => false,
        _ => {
            map.insert(id, resolution);
            true
        }
    }
}
