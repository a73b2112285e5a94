// SPDX-License-Identifier: GPL-3.0-only

//! Error taxonomy for the capture engine

use std::fmt;

/// Everything that can go wrong when a [`crate::capture::Capture`] tries to
/// open or keep open a device.
///
/// This is the single tagged error type the whole crate surfaces to
/// application code: the worker never lets a platform-specific error escape,
/// it is always downgraded into one of these three variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Another application currently holds the device open.
    AlreadyInUse,
    /// The device is not present in the most recent enumeration snapshot.
    Unplugged,
    /// Any other failure, with a human-readable message describing the
    /// failing call.
    Unknown(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::AlreadyInUse => {
                write!(f, "This webcam is already being used by another application")
            }
            CaptureError::Unplugged => write!(f, "This webcam is not plugged in"),
            CaptureError::Unknown(msg) => write!(f, "Unknown webcam error: {msg}"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Suggested user-facing message for a [`CaptureError`].
pub fn to_string(err: &CaptureError) -> String {
    err.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_human_readable_and_non_empty() {
        for err in [
            CaptureError::AlreadyInUse,
            CaptureError::Unplugged,
            CaptureError::Unknown("sensor reset".to_string()),
        ] {
            let msg = to_string(&err);
            assert!(!msg.is_empty());
        }
    }

    #[test]
    fn unknown_message_is_included() {
        let err = CaptureError::Unknown("frobnicator jammed".to_string());
        assert!(to_string(&err).contains("frobnicator jammed"));
    }
}
