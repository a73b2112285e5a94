// SPDX-License-Identifier: GPL-3.0-only

//! Opaque device identifiers

use std::fmt;

/// Opaque, hashable identifier minted by the platform backend.
///
/// Stable across unplug/replug on a given system for the same physical
/// port/device path. The core never interprets the contents of a
/// `DeviceId`; it is a value type used purely as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a backend-minted identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw bytes of the identifier, as given by the backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeviceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_value() {
        assert_eq!(DeviceId::new("/dev/video0"), DeviceId::new("/dev/video0"));
        assert_ne!(DeviceId::new("/dev/video0"), DeviceId::new("/dev/video1"));
    }

    #[test]
    fn hashable_for_map_keys() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(DeviceId::new("a"), 1);
        assert_eq!(map.get(&DeviceId::new("a")), Some(&1));
    }
}
