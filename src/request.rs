// SPDX-License-Identifier: GPL-3.0-only

//! The request mailbox and the public handle referring to it
//!
//! A `Request` is the shared state between the manager's worker (producer)
//! and every `Handle` pointing at it (consumer). It carries only a
//! `DeviceId` and a status slot plus its owned `Capture` — no back-pointer
//! to the `Manager`, so a capture never needs to reach back through its
//! request to touch manager-wide state.

use std::sync::{Arc, Mutex};

use crate::capture::Capture;
use crate::device::DeviceId;
use crate::error::CaptureError;
use crate::image::Image;

/// The current state of one device's capture session.
#[derive(Debug, Clone)]
pub enum CaptureStatus {
    /// No frame has been produced yet for the current session.
    NotInitYet,
    /// The most recently decoded frame.
    Live(Image),
    /// The current session ended in this error.
    Error(CaptureError),
}

pub struct Request {
    id: DeviceId,
    status: Mutex<CaptureStatus>,
    capture: Mutex<Option<Capture>>,
}

impl Request {
    pub(crate) fn new(id: DeviceId) -> Self {
        Self {
            id,
            status: Mutex::new(CaptureStatus::NotInitYet),
            capture: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub(crate) fn status(&self) -> CaptureStatus {
        self.status.lock().unwrap().clone()
    }

    pub(crate) fn set_status(&self, status: CaptureStatus) {
        *self.status.lock().unwrap() = status;
    }

    /// Install a newly-opened capture, replacing (and dropping) whatever
    /// was there before.
    pub(crate) fn install_capture(&self, capture: Capture) {
        *self.capture.lock().unwrap() = Some(capture);
    }

    /// Remove and return the owned capture, if any, so the caller can drop
    /// it outside the lock.
    pub(crate) fn take_capture(&self) -> Option<Capture> {
        self.capture.lock().unwrap().take()
    }
}

/// The application's strong reference to a [`Request`].
///
/// Cloning a `Handle` is cheap and shares the same request; all clones see
/// the same status transitions.
#[derive(Clone)]
pub struct Handle {
    request: Arc<Request>,
}

impl Handle {
    pub(crate) fn from_arc(request: Arc<Request>) -> Self {
        Self { request }
    }

    /// The device this handle watches.
    pub fn id(&self) -> &DeviceId {
        self.request.id()
    }

    /// A cheap snapshot of the current capture status.
    pub fn image(&self) -> CaptureStatus {
        self.request.status()
    }
}

impl PartialEq for Handle {
    /// Two handles are equal iff they refer to the same underlying
    /// `Request`.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.request, &other.request)
    }
}

impl Eq for Handle {}
