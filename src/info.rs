// SPDX-License-Identifier: GPL-3.0-only

//! Device info snapshots and enumeration normalization

use crate::device::DeviceId;
use crate::platform::RawInfo;
use crate::resolution::Resolution;

/// Display name, identifier, and supported resolutions for one currently
/// plugged-in device. Rebuilt every enumeration pass by [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    pub name: String,
    pub id: DeviceId,
    /// Deduplicated, sorted descending by (width, height).
    pub resolutions: Vec<Resolution>,
}

/// Turn raw backend enumeration results into the normalized `Info` list the
/// manager publishes:
///
/// 1. Sort each device's resolutions (width descending, then height
///    descending).
/// 2. Remove adjacent duplicates.
/// 3. Discard any device left with zero resolutions.
pub fn normalize(raw: Vec<RawInfo>) -> Vec<Info> {
    raw.into_iter()
        .filter_map(|device| {
            let mut resolutions = device.supported_resolutions;
            resolutions.sort_by(|a, b| {
                b.width()
                    .cmp(&a.width())
                    .then_with(|| b.height().cmp(&a.height()))
            });
            resolutions.dedup();
            if resolutions.is_empty() {
                return None;
            }
            Some(Info {
                name: device.name,
                id: device.device_id,
                resolutions,
            })
        })
        .collect()
}
