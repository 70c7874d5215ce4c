// SPDX-FileCopyrightText: 2025 Contributors to the GStreamer OpenGL player backend project.
// SPDX-License-Identifier: Apache-2.0

//! Process-wide GStreamer initialization.
//!
//! GStreamer must be initialized once before any element is created and may
//! be torn down once at process exit. Both are tied to the process, not to
//! the lifetime of any backend instance.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use gstreamer as gst;
use tracing::{debug, info};

use crate::{Error, Result};

static INIT: OnceLock<core::result::Result<(), String>> = OnceLock::new();
static DEINITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes GStreamer.
///
/// Only the first call does any work; its outcome is cached and returned to
/// every later caller, so a failed initialization is reported consistently.
pub fn init() -> Result<()> {
    INIT.get_or_init(|| {
        gst::init().map_err(|e| e.to_string())?;
        let (major, minor, micro, nano) = gst::version();
        info!("Initialized GStreamer {major}.{minor}.{micro}.{nano}");
        Ok(())
    })
    .clone()
    .map_err(Error::Init)
}

/// Whether [`init`] has run and succeeded.
pub fn is_initialized() -> bool {
    matches!(INIT.get(), Some(Ok(()))) && !DEINITIALIZED.load(Ordering::Acquire)
}

/// Releases GStreamer's global resources.
///
/// Does nothing if GStreamer was never initialized or was already torn down.
///
/// # Safety
///
/// Must only be called at process shutdown, after every backend, pipeline
/// and other GStreamer object has been dropped. GStreamer cannot be
/// initialized again afterwards.
pub unsafe fn deinit() {
    if !matches!(INIT.get(), Some(Ok(()))) {
        return;
    }
    if DEINITIALIZED.swap(true, Ordering::AcqRel) {
        return;
    }

    debug!("Deinitializing GStreamer");
    unsafe { gst::deinit() };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init().unwrap();
        init().unwrap();
        assert!(is_initialized());
        assert!(gst::ElementFactory::find("fakesink").is_some());
    }
}
