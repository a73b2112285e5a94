// SPDX-License-Identifier: GPL-3.0-only

//! The decoded, owned frame representation shared by all consumers

use std::sync::Arc;

use crate::pixel_format::RowOrder;
use crate::resolution::Resolution;

/// An owned RGB24 frame, produced by [`crate::decoder::decode`] and shared
/// immutably by every [`crate::request::Handle`] watching the device it
/// came from.
///
/// Cloning an `Image` is cheap: the pixel buffer is reference-counted, not
/// copied. Two `Image` values compare equal by pointer identity of their
/// buffer when you need to detect "is this a new frame" — there is no
/// separate "no new frame yet" status; callers use
/// `Image::is_same_frame_as` instead.
#[derive(Debug, Clone)]
pub struct Image {
    bytes: Arc<[u8]>,
    resolution: Resolution,
    row_order: RowOrder,
}

impl Image {
    /// Build an image from an exact-size RGB24 buffer.
    ///
    /// Panics if `bytes.len() != resolution.pixels_count() * 3`, since that
    /// invariant must hold for every `Image` the decoder produces; callers
    /// outside the decoder (e.g. the image factory seam, tests) must uphold
    /// it themselves.
    pub fn new(bytes: Vec<u8>, resolution: Resolution, row_order: RowOrder) -> Self {
        let expected = resolution.pixels_count() * 3;
        assert_eq!(
            bytes.len() as u64,
            expected,
            "RGB24 buffer length must equal width * height * 3"
        );
        Self {
            bytes: Arc::from(bytes),
            resolution,
            row_order,
        }
    }

    pub fn rgb_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn row_order(&self) -> RowOrder {
        self.row_order
    }

    /// True iff `other` shares this image's backing buffer, i.e. it is
    /// literally the same decoded frame and not merely an equal one.
    pub fn is_same_frame_as(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}
