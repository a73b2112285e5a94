// SPDX-License-Identifier: GPL-3.0-only

//! Linux V4L2 backend, built directly on the `v4l` crate.
//!
//! A `Device::with_path` + `MmapStream::with_buffers` capture loop running on
//! its own thread, signaled to stop with an `AtomicBool`. This backend tries
//! a short list of fourccs this crate's decoder understands and reports back
//! whichever one the driver actually accepted.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};
use v4l::buffer::Type as BufferType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

use crate::device::DeviceId;
use crate::error::CaptureError;
use crate::pixel_format::{ImageView, PixelFormat, RowOrder};
use crate::platform::{FrameSink, PlatformBackend, RawInfo, StreamHandle};
use crate::resolution::Resolution;

/// Fourccs this backend will negotiate, in preference order, paired with
/// the `PixelFormat` the decoder should treat the resulting bytes as.
/// Uncompressed formats come first so MJPEG is only used as a last resort.
const NEGOTIATION_ORDER: &[(&[u8; 4], PixelFormat)] = &[
    (b"RGB3", PixelFormat::RGB24),
    (b"BGR3", PixelFormat::BGR24),
    (b"YUYV", PixelFormat::YUYV),
    (b"NV12", PixelFormat::NV12),
    (b"MJPG", PixelFormat::MJPEG),
];

pub struct V4l2Backend;

impl V4l2Backend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for V4l2Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBackend for V4l2Backend {
    fn list_devices(&self) -> Result<Vec<RawInfo>, CaptureError> {
        let mut infos = Vec::new();
        for node in v4l::context::enum_devices() {
            let path = node.path().to_path_buf();
            let Ok(dev) = Device::with_path(&path) else {
                continue;
            };
            let resolutions = supported_resolutions(&dev, &path);
            let name = node
                .name()
                .unwrap_or_else(|| path.display().to_string());
            infos.push(RawInfo {
                name,
                device_id: device_id_for(&path),
                supported_resolutions: resolutions,
            });
        }
        Ok(infos)
    }

    fn open_stream(
        &self,
        id: &DeviceId,
        requested_resolution: Resolution,
        sink: FrameSink,
    ) -> Result<Box<dyn StreamHandle>, CaptureError> {
        let path = path_for_device_id(id)?;
        let mut dev = Device::with_path(&path).map_err(map_open_error)?;

        let (format, negotiated) = negotiate_format(&mut dev, requested_resolution)?;
        let actual_resolution = Resolution::new(format.width, format.height);

        let stream = MmapStream::with_buffers(&mut dev, BufferType::VideoCapture, 4)
            .map_err(|e| CaptureError::Unknown(format!("failed to start capture stream: {e}")))?;

        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);
        let thread = thread::spawn(move || {
            run_capture_loop(dev, stream, actual_resolution, negotiated, sink, stop_clone)
        });

        Ok(Box::new(V4l2StreamHandle {
            resolution: actual_resolution,
            stop,
            thread: Some(thread),
        }))
    }
}

fn run_capture_loop(
    _dev: Device,
    mut stream: MmapStream,
    resolution: Resolution,
    format: PixelFormat,
    sink: FrameSink,
    stop: Arc<AtomicBool>,
) {
    while !stop.load(Ordering::SeqCst) {
        match stream.next() {
            Ok((buf, _meta)) => {
                let view = ImageView::new(buf, resolution, format, RowOrder::TopFirst);
                sink(view);
            }
            Err(e) => {
                warn!(error = %e, "V4L2 frame capture failed");
                break;
            }
        }
    }
}

/// Query the current format, then try each fourcc in [`NEGOTIATION_ORDER`]
/// at the requested resolution until the driver accepts one.
fn negotiate_format(
    dev: &mut Device,
    requested: Resolution,
) -> Result<(v4l::Format, PixelFormat), CaptureError> {
    let mut last_error = None;
    for (fourcc, pixel_format) in NEGOTIATION_ORDER {
        let mut format = match dev.format() {
            Ok(f) => f,
            Err(e) => {
                last_error = Some(e.to_string());
                continue;
            }
        };
        format.width = requested.width();
        format.height = requested.height();
        format.fourcc = v4l::FourCC::new(*fourcc);

        match dev.set_format(&format) {
            Ok(negotiated) if negotiated.fourcc == v4l::FourCC::new(*fourcc) => {
                debug!(
                    fourcc = %String::from_utf8_lossy(fourcc),
                    width = negotiated.width,
                    height = negotiated.height,
                    "V4L2 negotiated pixel format"
                );
                return Ok((negotiated, *pixel_format));
            }
            Ok(_) => continue,
            Err(e) => {
                last_error = Some(e.to_string());
                continue;
            }
        }
    }
    Err(CaptureError::Unknown(format!(
        "no supported pixel format could be negotiated: {}",
        last_error.unwrap_or_else(|| "unknown error".to_string())
    )))
}

fn supported_resolutions(dev: &Device, path: &std::path::Path) -> Vec<Resolution> {
    let Ok(formats) = dev.enum_formats() else {
        debug!(path = %path.display(), "V4L2 device reported no formats");
        return Vec::new();
    };
    let mut resolutions = Vec::new();
    for fmt_desc in formats {
        let Ok(sizes) = dev.enum_framesizes(fmt_desc.fourcc) else {
            continue;
        };
        for size in sizes {
            match size.size {
                v4l::framesize::FrameSizeEnum::Discrete(discrete) => {
                    resolutions.push(Resolution::new(discrete.width, discrete.height));
                }
                v4l::framesize::FrameSizeEnum::Stepwise(step) => {
                    resolutions.push(Resolution::new(step.max_width, step.max_height));
                }
            }
        }
    }
    resolutions
}

fn device_id_for(path: &std::path::Path) -> DeviceId {
    DeviceId::new(path.display().to_string())
}

fn path_for_device_id(id: &DeviceId) -> Result<PathBuf, CaptureError> {
    let path = PathBuf::from(id.as_str());
    if path.exists() {
        Ok(path)
    } else {
        Err(CaptureError::Unplugged)
    }
}

fn map_open_error(err: std::io::Error) -> CaptureError {
    match err.kind() {
        std::io::ErrorKind::NotFound => CaptureError::Unplugged,
        std::io::ErrorKind::PermissionDenied => CaptureError::AlreadyInUse,
        _ => CaptureError::Unknown(err.to_string()),
    }
}

struct V4l2StreamHandle {
    resolution: Resolution,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl StreamHandle for V4l2StreamHandle {
    fn actual_resolution(&self) -> Resolution {
        self.resolution
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for V4l2StreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}
