// SPDX-License-Identifier: GPL-3.0-only

//! The `PlatformBackend` seam
//!
//! Everything platform-specific — DirectShow on Windows, V4L2 on Linux,
//! AVFoundation on macOS — lives behind this trait. The capture lifecycle
//! engine (`manager`, `capture`, `decoder`, ...) never references an OS API
//! directly; it only ever talks to a `Box<dyn PlatformBackend>`.

#[cfg(any(test, feature = "test-util"))]
pub mod mock;
#[cfg(target_os = "linux")]
pub mod v4l2;

use crate::device::DeviceId;
use crate::error::CaptureError;
use crate::pixel_format::ImageView;
use crate::resolution::Resolution;

/// Raw, unnormalized device info as reported directly by a backend, before
/// `info::normalize` sorts and dedups its resolution list.
#[derive(Debug, Clone)]
pub struct RawInfo {
    pub name: String,
    pub device_id: DeviceId,
    pub supported_resolutions: Vec<Resolution>,
}

/// Callback invoked with one decoded-ready raw frame per delivery. Platform
/// backends call this from whatever thread produces frames (their own
/// delivery thread, or a callback thread owned by the OS capture API).
pub type FrameSink = Box<dyn for<'a> Fn(ImageView<'a>) + Send>;

/// A live platform stream, returned by `open_stream` and closed either
/// explicitly or by being dropped.
///
/// `close` must be idempotent: calling it twice, or dropping after calling
/// it, must not panic or double-free.
pub trait StreamHandle: Send {
    /// The resolution the backend actually negotiated, which may differ
    /// from the one requested.
    fn actual_resolution(&self) -> Resolution;

    /// Stop the stream and release platform resources. Safe to call
    /// multiple times.
    fn close(&mut self);
}

/// What the capture lifecycle engine needs from any platform's camera API.
pub trait PlatformBackend: Send + Sync {
    /// Enumerate currently available devices. Errors here are swallowed by
    /// the manager and treated as "no devices this pass".
    fn list_devices(&self) -> Result<Vec<RawInfo>, CaptureError>;

    /// Open a stream for `id` at (approximately) `requested_resolution`,
    /// delivering every raw frame to `sink` until the returned handle is
    /// closed or dropped.
    fn open_stream(
        &self,
        id: &DeviceId,
        requested_resolution: Resolution,
        sink: FrameSink,
    ) -> Result<Box<dyn StreamHandle>, CaptureError>;
}

/// Pick the real backend for the host platform.
///
/// On Linux this is the V4L2 backend; Windows (DirectShow) and macOS
/// (AVFoundation) have no native backend in this crate. Building a
/// production DirectShow/AVFoundation backend is left to whoever embeds
/// this crate on those platforms. [`UnavailableBackend`] documents the
/// contract such a backend must meet.
pub fn default_backend() -> Box<dyn PlatformBackend> {
    #[cfg(target_os = "linux")]
    {
        Box::new(v4l2::V4l2Backend::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(UnavailableBackend)
    }
}

/// A backend stub for platforms with no native implementation in this
/// crate: enumerates zero devices and every open attempt fails with
/// `CaptureError::Unknown`.
pub struct UnavailableBackend;

impl PlatformBackend for UnavailableBackend {
    fn list_devices(&self) -> Result<Vec<RawInfo>, CaptureError> {
        Ok(Vec::new())
    }

    fn open_stream(
        &self,
        _id: &DeviceId,
        _requested_resolution: Resolution,
        _sink: FrameSink,
    ) -> Result<Box<dyn StreamHandle>, CaptureError> {
        Err(CaptureError::Unknown(
            "no camera backend is implemented for this platform".to_string(),
        ))
    }
}
