// SPDX-License-Identifier: GPL-3.0-only

//! An in-memory [`PlatformBackend`] for tests.
//!
//! Stands in for DirectShow/V4L2/AVFoundation so `Manager`, `Capture`, and
//! restart-on-failure behavior can be exercised without real hardware.
//! Devices are added and manipulated through [`MockBackend`]'s own methods;
//! `Manager` only ever sees it through the `PlatformBackend` trait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::device::DeviceId;
use crate::error::CaptureError;
use crate::pixel_format::{ImageView, PixelFormat, RowOrder};
use crate::platform::{FrameSink, PlatformBackend, RawInfo, StreamHandle};
use crate::resolution::Resolution;

/// What happens when `Manager`'s worker asks this mock device to open.
#[derive(Debug, Clone)]
pub enum OpenBehavior {
    /// Open succeeds and a delivery thread starts pushing solid-color
    /// frames of `format` at the negotiated resolution.
    Succeed { format: PixelFormat },
    /// Open fails with the given error every time.
    Fail(CaptureError),
}

struct MockDevice {
    name: String,
    resolutions: Vec<Resolution>,
    plugged: bool,
    open_behavior: OpenBehavior,
}

struct MockState {
    devices: HashMap<DeviceId, MockDevice>,
}

/// A shared-state mock camera backend.
///
/// Clone it freely — every clone controls the same set of virtual devices,
/// so a test can hand one clone to the `Manager` and keep another to plug,
/// unplug, or flip open behavior mid-test.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                devices: HashMap::new(),
            })),
        }
    }

    /// Register a plugged-in virtual device that opens successfully as
    /// `PixelFormat::RGB24` by default.
    pub fn add_device(&self, id: DeviceId, name: &str, resolutions: Vec<Resolution>) {
        self.state.lock().unwrap().devices.insert(
            id,
            MockDevice {
                name: name.to_string(),
                resolutions,
                plugged: true,
                open_behavior: OpenBehavior::Succeed {
                    format: PixelFormat::RGB24,
                },
            },
        );
    }

    pub fn set_plugged(&self, id: &DeviceId, plugged: bool) {
        if let Some(device) = self.state.lock().unwrap().devices.get_mut(id) {
            device.plugged = plugged;
        }
    }

    pub fn set_open_behavior(&self, id: &DeviceId, behavior: OpenBehavior) {
        if let Some(device) = self.state.lock().unwrap().devices.get_mut(id) {
            device.open_behavior = behavior;
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBackend for MockBackend {
    fn list_devices(&self) -> Result<Vec<RawInfo>, CaptureError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .devices
            .iter()
            .filter(|(_, device)| device.plugged)
            .map(|(id, device)| RawInfo {
                name: device.name.clone(),
                device_id: id.clone(),
                supported_resolutions: device.resolutions.clone(),
            })
            .collect())
    }

    fn open_stream(
        &self,
        id: &DeviceId,
        requested_resolution: Resolution,
        sink: FrameSink,
    ) -> Result<Box<dyn StreamHandle>, CaptureError> {
        let behavior = {
            let state = self.state.lock().unwrap();
            let device = state.devices.get(id).ok_or(CaptureError::Unplugged)?;
            if !device.plugged {
                return Err(CaptureError::Unplugged);
            }
            device.open_behavior.clone()
        };

        match behavior {
            OpenBehavior::Fail(err) => Err(err),
            OpenBehavior::Succeed { format } => {
                let stop = Arc::new(AtomicBool::new(false));
                let stop_clone = Arc::clone(&stop);
                let resolution = requested_resolution;
                let frame = solid_frame(resolution, format);

                let thread = thread::spawn(move || {
                    while !stop_clone.load(Ordering::SeqCst) {
                        let view = ImageView::new(&frame, resolution, format, RowOrder::TopFirst);
                        sink(view);
                        thread::sleep(Duration::from_millis(5));
                    }
                });

                Ok(Box::new(MockStreamHandle {
                    resolution,
                    stop,
                    thread: Some(thread),
                }))
            }
        }
    }
}

/// A byte buffer of the exact size `format` requires at `resolution`,
/// filled with a mid-gray value so decoded output is a flat, predictable
/// color.
fn solid_frame(resolution: Resolution, format: PixelFormat) -> Vec<u8> {
    let len = format
        .frame_byte_len(resolution)
        .unwrap_or_else(|| resolution.pixels_count() * 3) as usize;
    vec![128u8; len]
}

struct MockStreamHandle {
    resolution: Resolution,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl StreamHandle for MockStreamHandle {
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

impl Drop for MockStreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}
