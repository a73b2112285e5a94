// SPDX-License-Identifier: GPL-3.0-only

//! A cross-platform webcam capture core.
//!
//! Given an opaque [`DeviceId`] and a desired [`Resolution`], this crate
//! produces a continuous stream of decoded RGB24 frames that application
//! code can pull at its own pace, tolerating hot-plug events, resolution
//! changes, contention with other applications, and hardware disappearance
//! without crashing the host process.
//!
//! # Architecture
//!
//! - [`library_token`]: [`LibraryToken`], the reference-counted handle that
//!   keeps the background worker alive and is the entry point for every
//!   other operation.
//! - [`manager`]: the capture lifecycle engine — request table, info
//!   cache, and worker loop.
//! - [`capture`]: the per-device frame producer.
//! - [`decoder`]: raw frame bytes → canonical RGB24 [`Image`].
//! - [`platform`]: the `PlatformBackend` seam; real backends live behind
//!   `cfg(target_os = ...)`, with a `mock` backend for tests.
//! - [`request`]: the [`Handle`] applications hold and the status mailbox
//!   behind it.
//! - [`resolution_registry`]: the process-global selected-resolution map.
//! - [`image_factory`]: the install-once image construction policy.
//!
//! # Example
//!
//! ```no_run
//! use wcam_core::{image_factory, CaptureStatus, LibraryToken};
//!
//! image_factory::set_default_image_factory();
//!
//! let token = LibraryToken::new();
//! let webcams = token.all_webcams_info();
//! if let Some(info) = webcams.first() {
//!     let handle = token.open_webcam(info.id.clone());
//!     loop {
//!         token.tick();
//!         match handle.image() {
//!             CaptureStatus::Live(image) => {
//!                 println!("got a frame: {:?}", image.resolution());
//!                 break;
//!             }
//!             CaptureStatus::Error(err) => {
//!                 eprintln!("{}", wcam_core::error::to_string(&err));
//!                 break;
//!             }
//!             CaptureStatus::NotInitYet => continue,
//!         }
//!     }
//! }
//! ```

pub mod capture;
pub mod decoder;
pub mod device;
pub mod error;
pub mod image;
pub mod image_factory;
pub mod info;
pub mod library_token;
pub mod manager;
pub mod pixel_format;
pub mod platform;
pub mod request;
pub mod resolution;
pub mod resolution_registry;

pub use device::DeviceId;
pub use image::Image;
pub use info::Info;
pub use library_token::LibraryToken;
pub use manager::{Manager, ManagerOptions};
pub use pixel_format::{ImageView, PixelFormat, RowOrder};
pub use request::{CaptureStatus, Handle};
pub use resolution::Resolution;

pub use error::CaptureError;
