//! GL Player Backend
//!
//! `GlPlayerBackend` adapts a GStreamer `playbin` to the host's
//! [`PlayerBackend`] contract.
//!
//! ## Responsibilities
//! - Builds the pipeline once: `playbin` with a video bin made of `glupload`
//!   and `gtkglsink`, exposed through a ghost `sink` pad
//! - Hands out the sink's widget as the drawable handle
//! - Forwards uri, volume and playing to the pipeline
//! - Pauses playback while the network buffer refills
//! - Forwards pipeline errors through the `error` signal
//!
//! ## Properties
//! - `volume` (f64, 0–1): kept in sync with the pipeline in both directions
//! - `playing` (bool): `true` plays, `false` stops (NULL by default)
//! - `uri` (string): propagated to the pipeline on every write
//! - `buffer-fill` (f64, 0–1, read-only): latest buffering progress
//!
//! ## Example
//! ```no_run
//! use gstplayerbackendgl::GlPlayerBackend;
//!
//! # fn main() -> Result<(), gstplayerbackendgl::Error> {
//! let backend = GlPlayerBackend::new()?;
//! let _widget = backend.widget();
//! backend.set_uri("https://example.com/stream.m3u8");
//! backend.set_volume(0.5);
//! backend.set_playing(true);
//! # Ok(())
//! # }
//! ```

// SPDX-FileCopyrightText: 2025 Contributors to the GStreamer OpenGL player backend project.
// SPDX-License-Identifier: Apache-2.0

use gst::glib;
use gst::prelude::*;
use gst::subclass::prelude::*;
use gstreamer as gst;
use player_backend::PlayerBackend;

use crate::config::BackendConfig;
use crate::{Result, runtime};

/// Core implementation (properties, pipeline lifecycle, bus handling)
mod imp;

/// State structures and pipeline construction
mod state;


pub(crate) use imp::CAT;

glib::wrapper! {
    pub struct GlPlayerBackend(ObjectSubclass<imp::GlPlayerBackend>) @extends gst::Object;
}

impl GlPlayerBackend {
    /// Creates a backend with the stock OpenGL topology.
    pub fn new() -> Result<Self> {
        Self::with_config(&BackendConfig::default())
    }

    /// Creates a backend and builds its pipeline.
    ///
    /// Initializes GStreamer if needed.
    ///
    /// # Errors
    /// Fails if the configuration is invalid, an element factory is missing,
    /// the video bin cannot be assembled, or the sink provides no widget.
    pub fn with_config(config: &BackendConfig) -> Result<Self> {
        config.validate()?;
        runtime::init()?;

        let backend: Self = glib::Object::new();
        backend.imp().start(config)?;
        Ok(backend)
    }

    pub fn uri(&self) -> Option<String> {
        self.property("uri")
    }

    /// Sets the media locator. No validation happens here; unusable URIs
    /// are reported through the `error` signal once the pipeline opens them.
    pub fn set_uri(&self, uri: &str) {
        self.set_property("uri", uri);
    }

    pub fn volume(&self) -> f64 {
        self.property("volume")
    }

    /// Sets the volume, clamped to `0.0..=1.0`. NaN is ignored.
    pub fn set_volume(&self, volume: f64) {
        if volume.is_nan() {
            return;
        }
        self.set_property("volume", volume.clamp(0.0, 1.0));
    }

    pub fn is_playing(&self) -> bool {
        self.property("playing")
    }

    pub fn set_playing(&self, playing: bool) {
        self.set_property("playing", playing);
    }

    pub fn buffer_fill(&self) -> f64 {
        self.property("buffer-fill")
    }

    /// The drawable created at construction, `None` after disposal.
    ///
    /// Read from the sink on every call; the sink hands out the same
    /// instance each time.
    pub fn widget(&self) -> Option<glib::Object> {
        self.imp().widget()
    }

    /// The underlying pipeline element.
    pub fn pipeline(&self) -> Option<gst::Element> {
        self.imp().pipeline()
    }

    /// The state most recently requested from the pipeline.
    ///
    /// This is what was asked for, not what the pipeline reached.
    pub fn requested_state(&self) -> Option<gst::State> {
        self.imp().requested_state()
    }

    /// Whether the buffering throttle currently holds playback.
    pub fn is_buffering(&self) -> bool {
        self.imp().is_buffering()
    }

    /// Handles a message from the pipeline bus.
    ///
    /// The bus watch installed at construction calls this. Hosts that
    /// dispatch bus messages themselves may call it directly.
    pub fn handle_message(&self, msg: &gst::MessageRef) -> glib::ControlFlow {
        self.imp().handle_message(msg)
    }

    /// Connects to pipeline errors: `(backend, message, debug)`.
    pub fn connect_error<F>(&self, f: F) -> glib::SignalHandlerId
    where
        F: Fn(&Self, &str, Option<&str>) + Send + Sync + 'static,
    {
        self.connect("error", false, move |values| {
            let backend = values[0].get::<Self>().ok()?;
            let message = values[1].get::<String>().ok()?;
            let debug = values[2].get::<Option<String>>().ok()?;
            f(&backend, &message, debug.as_deref());
            None
        })
    }
}

impl PlayerBackend for GlPlayerBackend {
    fn widget(&self) -> Option<glib::Object> {
        GlPlayerBackend::widget(self)
    }

    fn uri(&self) -> Option<String> {
        GlPlayerBackend::uri(self)
    }

    fn set_uri(&self, uri: &str) {
        GlPlayerBackend::set_uri(self, uri)
    }

    fn volume(&self) -> f64 {
        GlPlayerBackend::volume(self)
    }

    fn set_volume(&self, volume: f64) {
        GlPlayerBackend::set_volume(self, volume)
    }

    fn is_playing(&self) -> bool {
        GlPlayerBackend::is_playing(self)
    }

    fn set_playing(&self, playing: bool) {
        GlPlayerBackend::set_playing(self, playing)
    }

    fn buffer_fill(&self) -> f64 {
        GlPlayerBackend::buffer_fill(self)
    }
}
