// SPDX-License-Identifier: GPL-3.0-only

//! Raw frame -> owned RGB24 image decoding
//!
//! `decode` is a pure function: same bytes in, same `Image` out, no shared
//! state. All arithmetic uses the standard BT.601-ish coefficients so the
//! converted colors match what any other `wcam`-compatible implementation
//! produces.

use crate::error::CaptureError;
use crate::image::Image;
use crate::pixel_format::{ImageView, PixelFormat};

/// Decode a raw frame view into an owned RGB24 [`Image`].
///
/// Allocates exactly one contiguous buffer of `width * height * 3` bytes.
/// The only way this can fail is a `MJPEG` frame with corrupt/truncated
/// JPEG data, surfaced as `CaptureError::Unknown`.
pub fn decode(view: ImageView<'_>) -> Result<Image, CaptureError> {
    let resolution = view.resolution;
    let row_order = view.row_order;
    let rgb = decode_to_rgb_bytes(view)?;
    Ok(Image::new(rgb, resolution, row_order))
}

/// Same conversion as [`decode`], but returns the raw RGB24 buffer instead
/// of an [`Image`]. [`crate::capture::Capture`] uses this directly so that
/// image construction itself goes through the installed
/// [`crate::image_factory`] seam rather than always through `Image::new`.
pub fn decode_to_rgb_bytes(view: ImageView<'_>) -> Result<Vec<u8>, CaptureError> {
    let width = view.resolution.width();
    let height = view.resolution.height();

    match view.format {
        PixelFormat::RGB24 => decode_rgb24(view.bytes, width, height),
        PixelFormat::BGR24 => decode_bgr24(view.bytes, width, height),
        PixelFormat::NV12 => decode_nv12(view.bytes, width, height),
        PixelFormat::YUYV => decode_yuyv(view.bytes, width, height),
        PixelFormat::MJPEG => decode_mjpeg(view.bytes, width, height),
    }
}

fn expect_len(bytes: &[u8], expected: usize, what: &str) -> Result<(), CaptureError> {
    if bytes.len() < expected {
        return Err(CaptureError::Unknown(format!(
            "{what}: expected at least {expected} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(())
}

fn decode_rgb24(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CaptureError> {
    let expected = width as usize * height as usize * 3;
    expect_len(bytes, expected, "RGB24 frame")?;
    Ok(bytes[..expected].to_vec())
}

fn decode_bgr24(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CaptureError> {
    let expected = width as usize * height as usize * 3;
    expect_len(bytes, expected, "BGR24 frame")?;
    let mut rgb = Vec::with_capacity(expected);
    for px in bytes[..expected].chunks_exact(3) {
        rgb.push(px[2]);
        rgb.push(px[1]);
        rgb.push(px[0]);
    }
    Ok(rgb)
}

/// NV12: Y plane (W*H) followed by an interleaved UV plane (W*H/2).
fn decode_nv12(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CaptureError> {
    let w = width as usize;
    let h = height as usize;
    let y_size = w * h;
    let uv_size = w * h / 2;
    expect_len(bytes, y_size + uv_size, "NV12 frame")?;

    let y_plane = &bytes[..y_size];
    let uv_plane = &bytes[y_size..y_size + uv_size];

    let mut rgb = Vec::with_capacity(w * h * 3);
    for y in 0..h {
        for x in 0..w {
            let y_val = y_plane[y * w + x] as i32;
            let uv_row = y / 2;
            let uv_col = x / 2;
            let uv_index = uv_row * (w / 2) * 2 + uv_col * 2;
            let u_val = uv_plane[uv_index] as i32;
            let v_val = uv_plane[uv_index + 1] as i32;

            let c = y_val - 16;
            let d = u_val - 128;
            let e = v_val - 128;

            let r = ((298 * c + 409 * e + 128) >> 8).clamp(0, 255);
            let g = ((298 * c - 100 * d - 208 * e + 128) >> 8).clamp(0, 255);
            let b = ((298 * c + 516 * d + 128) >> 8).clamp(0, 255);

            rgb.push(r as u8);
            rgb.push(g as u8);
            rgb.push(b as u8);
        }
    }
    Ok(rgb)
}

/// YUYV 4:2:2 packed: every 4 bytes `{Y0, U, Y1, V}` produce 2 RGB pixels.
///
/// Each macroblock covers two horizontally adjacent pixels, so `width` must
/// be even; an odd width would leave a dangling half-macroblock that no
/// 4-byte group can produce, which is rejected up front rather than silently
/// truncated.
fn decode_yuyv(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CaptureError> {
    if width % 2 != 0 {
        return Err(CaptureError::Unknown(format!(
            "YUYV frame: width must be even, got {width}"
        )));
    }

    let w = width as usize;
    let h = height as usize;
    let expected = w * h * 2;
    expect_len(bytes, expected, "YUYV frame")?;

    let mut rgb = Vec::with_capacity(w * h * 3);
    for chunk in bytes[..expected].chunks_exact(4) {
        let y0 = chunk[0] as i32;
        let u = chunk[1] as i32;
        let y1 = chunk[2] as i32;
        let v = chunk[3] as i32;

        let u = u - 128;
        let v = v - 128;

        for y in [y0, y1] {
            let y_shifted = y << 8;
            let r = (y_shifted + 359 * v) >> 8;
            let g = (y_shifted - 88 * u - 183 * v) >> 8;
            let b = (y_shifted + 454 * u) >> 8;

            rgb.push(r.clamp(0, 255) as u8);
            rgb.push(g.clamp(0, 255) as u8);
            rgb.push(b.clamp(0, 255) as u8);
        }
    }
    Ok(rgb)
}

/// MJPEG: delegate to the `image` crate's JPEG decoder, an opaque
/// dependency. The decoded dimensions must match the reported resolution,
/// since the caller already committed to an exact-size buffer.
fn decode_mjpeg(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CaptureError> {
    let decoded = image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg)
        .map_err(|e| CaptureError::Unknown(format!("MJPEG decode failed: {e}")))?;
    let rgb = decoded.to_rgb8();
    if rgb.width() != width || rgb.height() != height {
        return Err(CaptureError::Unknown(format!(
            "MJPEG frame was {}x{}, expected {}x{}",
            rgb.width(),
            rgb.height(),
            width,
            height
        )));
    }
    Ok(rgb.into_raw())
}
