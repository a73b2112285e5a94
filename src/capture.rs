// SPDX-License-Identifier: GPL-3.0-only

//! The per-device frame producer
//!
//! A `Capture` owns exactly one open platform stream. It never touches the
//! request table or any other device's state; it only ever writes into the
//! single [`Request`] it was opened for, composed with a direct reference
//! rather than a back-pointer through the manager.

use std::sync::Arc;

use crate::decoder;
use crate::device::DeviceId;
use crate::error::CaptureError;
use crate::image_factory;
use crate::platform::{FrameSink, PlatformBackend, StreamHandle};
use crate::request::{CaptureStatus, Request};
use crate::resolution::Resolution;

/// An open platform stream feeding decoded frames into its owning
/// [`Request`]'s status.
///
/// Dropping a `Capture` drops its [`StreamHandle`], which per the platform
/// backend contract stops the stream and joins its delivery thread before
/// returning.
pub struct Capture {
    resolution: Resolution,
    stream: Box<dyn StreamHandle>,
}

impl Capture {
    /// Open a capture for `id` at `requested_resolution`, wiring its frame
    /// sink to decode every raw frame and publish it into `request`.
    ///
    /// If no image factory has been installed yet, decoded frames are
    /// silently dropped rather than written to `request`'s status — the
    /// request stays `NotInitYet` until one is.
    pub fn open(
        backend: &dyn PlatformBackend,
        id: &DeviceId,
        requested_resolution: Resolution,
        request: Arc<Request>,
    ) -> Result<Self, CaptureError> {
        let sink: FrameSink = Box::new(move |view| {
            let resolution = view.resolution;
            let row_order = view.row_order;
            match decoder::decode_to_rgb_bytes(view) {
                Ok(bytes) => {
                    if let Some(image) = image_factory::make_image(bytes, resolution, row_order) {
                        request.set_status(CaptureStatus::Live(image));
                    }
                    // No factory installed yet: leave the request's status
                    // untouched rather than fabricate a frame.
                }
                Err(err) => request.set_status(CaptureStatus::Error(err)),
            }
        });

        let stream = backend.open_stream(id, requested_resolution, sink)?;
        let resolution = stream.actual_resolution();
        Ok(Self { resolution, stream })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }
}
