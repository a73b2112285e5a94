// SPDX-License-Identifier: GPL-3.0-only

//! The image construction policy seam
//!
//! Application code may want its own concrete image representation (for
//! texture upload, buffer pooling, allocation instrumentation, ...) instead
//! of a plain owned buffer; that's out of scope for this crate to provide,
//! so it's modeled as an installable trait object instead. The discipline
//! this seam enforces is *install-once*: nothing can produce an [`Image`]
//! until application code has called [`set_image_factory`], and a second
//! call is a programmer error rather than a silent override.

use std::sync::{Arc, OnceLock};

use crate::image::Image;
use crate::pixel_format::RowOrder;
use crate::resolution::Resolution;

/// Construction policy for decoded frames.
///
/// Implementations are free to pool buffers, instrument allocation counts,
/// or otherwise customize how raw RGB24 bytes become an [`Image`]; the
/// default installed by [`set_default_image_factory`] just calls
/// [`Image::new`].
pub trait ImageFactory: Send + Sync {
    fn make_image(&self, bytes: Vec<u8>, resolution: Resolution, row_order: RowOrder) -> Image;
}

struct DefaultImageFactory;

impl ImageFactory for DefaultImageFactory {
    fn make_image(&self, bytes: Vec<u8>, resolution: Resolution, row_order: RowOrder) -> Image {
        Image::new(bytes, resolution, row_order)
    }
}

static FACTORY: OnceLock<Arc<dyn ImageFactory>> = OnceLock::new();

/// Install the process-wide image factory. Must be called once, before the
/// first `open_webcam`.
///
/// A second call is a programmer error: debug builds assert, release builds
/// silently keep the first factory.
pub fn set_image_factory(factory: Arc<dyn ImageFactory>) {
    let result = FACTORY.set(factory);
    debug_assert!(result.is_ok(), "image factory installed more than once");
}

/// Convenience wrapper installing [`DefaultImageFactory`], useful for
/// examples that don't care about a custom construction policy.
pub fn set_default_image_factory() {
    set_image_factory(Arc::new(DefaultImageFactory));
}

/// Install the default factory if (and only if) none is installed yet,
/// without the "called twice" assertion.
///
/// `cargo test` runs every test in one process, often across threads, so
/// several unrelated test modules racing to install the same default
/// factory is expected rather than a misuse of the API — unlike a real
/// application calling [`set_image_factory`] twice.
#[cfg(any(test, feature = "test-util"))]
pub fn ensure_test_image_factory() {
    FACTORY.get_or_init(|| Arc::new(DefaultImageFactory) as Arc<dyn ImageFactory>);
}

/// Build an `Image` through the installed factory, or `None` if no factory
/// has been installed yet, in which case captures stay `NotInitYet` forever
/// until one is.
pub fn make_image(bytes: Vec<u8>, resolution: Resolution, row_order: RowOrder) -> Option<Image> {
    FACTORY
        .get()
        .map(|factory| factory.make_image(bytes, resolution, row_order))
}

/// Whether a factory has been installed yet.
pub fn is_installed() -> bool {
    FACTORY.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninstalled_factory_yields_no_image() {
        // This test relies on running in its own process/test binary since
        // `FACTORY` is a process-global `OnceLock`; see `tests/` for the
        // cross-module scenario that exercises this against a live capture.
        if !is_installed() {
            assert!(make_image(vec![0u8; 3], Resolution::new(1, 1), RowOrder::TopFirst).is_none());
        }
    }
}
