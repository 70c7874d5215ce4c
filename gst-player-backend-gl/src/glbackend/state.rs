//! State Management and Pipeline Construction for the GL Player Backend
//!
//! This module defines the runtime state structures used by the backend and
//! builds the fixed pipeline topology once at construction:
//!
//! ```text
//! playbin ── video-sink ──► video_bin [ ghost sink ─► upload ─► sink ]
//! ```
//!
//! ## Key Types
//! - `Settings`: The host-visible values (uri, volume, playing, buffer-fill)
//! - `State`: The pipeline, the drawable's source, and the handles keeping
//!   the bus watch and volume observer alive
//! - `WidgetSource`: Resolves the drawable from the sink on demand
//! - `Buffering`: Sub-state of the buffering throttle

// SPDX-FileCopyrightText: 2025 Contributors to the GStreamer OpenGL player backend project.
// SPDX-License-Identifier: Apache-2.0

use gst::glib;
use gst::prelude::*;
use gstreamer as gst;
use tracing::trace;

use crate::config::{BackendConfig, BufferingConfig, DEFAULT_VOLUME, StopMode};
use crate::{Error, Result};

/// Name of the bin wrapping upload and sink.
pub(crate) const VIDEO_BIN_NAME: &str = "video_bin";

/// Pipeline properties the backend reads or writes.
const PIPELINE_PROPERTIES: [&str; 3] = ["uri", "volume", "video-sink"];

pub(crate) const DEFAULT_PLAYING: bool = false;
pub(crate) const DEFAULT_BUFFER_FILL: f64 = 0.0;

/// Values exposed to the host as properties.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Settings {
    /// Media locator, propagated to the pipeline on every write
    pub uri: Option<String>,

    /// Linear volume, `0.0..=1.0`
    pub volume: f64,

    /// Desired playback state
    pub playing: bool,

    /// Latest buffering progress, `0.0..=1.0`
    pub buffer_fill: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            uri: None,
            volume: DEFAULT_VOLUME,
            playing: DEFAULT_PLAYING,
            buffer_fill: DEFAULT_BUFFER_FILL,
        }
    }
}

/// Buffering sub-state, orthogonal to the requested playing state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Buffering {
    /// Enough data, playback may run
    #[default]
    Ready,
    /// Pipeline held paused until the buffer refills
    Buffering,
}

impl BufferingConfig {
    /// Next sub-state after a buffering report of `percent`.
    pub(crate) fn next(&self, current: Buffering, percent: i32) -> Buffering {
        match current {
            Buffering::Ready if percent < i32::from(self.pause_below) => Buffering::Buffering,
            Buffering::Buffering if percent >= i32::from(self.resume_at) => Buffering::Ready,
            unchanged => unchanged,
        }
    }
}

/// Runtime state, present between construction and disposal.
pub(crate) struct State {
    /// The playbin (or configured replacement)
    pub pipeline: gst::Element,

    /// Where the drawable handed to the host comes from
    pub widget: WidgetSource,

    /// Keeps the bus watch installed; dropping it removes the watch
    pub bus_watch: Option<gst::bus::BusWatchGuard>,

    /// `notify::volume` observer on the pipeline
    pub volume_handler: Option<glib::SignalHandlerId>,

    pub buffering: Buffering,

    pub thresholds: BufferingConfig,

    pub stop_mode: StopMode,

    /// Last state requested from the pipeline
    pub requested: gst::State,
}

/// Context wrapper so the state can be created at construction and taken
/// out again at disposal.
#[derive(Default)]
pub(crate) struct Context {
    pub state: Option<State>,
}

/// The elements produced by [`build_pipeline`].
pub(crate) struct Pipeline {
    pub pipeline: gst::Element,
    pub widget: WidgetSource,
}

/// The sink and the property holding its drawable.
///
/// GTK widgets are bound to the UI thread, so only the sink (which is
/// thread-safe) is kept. The sink owns its widget and returns the same
/// instance on every read.
#[derive(Debug, Clone)]
pub(crate) struct WidgetSource {
    pub sink: gst::Element,

    /// `None` makes the sink itself the drawable
    pub property: Option<String>,
}

impl WidgetSource {
    pub(crate) fn resolve(&self) -> Result<glib::Object> {
        match self.property.as_deref() {
            Some(property) => widget_from_sink(&self.sink, property),
            None => Ok(self.sink.clone().upcast()),
        }
    }
}

fn make_element(factory: &str) -> Result<gst::Element> {
    gst::ElementFactory::make(factory)
        .build()
        .map_err(|e| Error::missing_element(factory, e))
}

/// Builds the pipeline and its video bin.
///
/// Element-construction failures are reported here instead of surfacing
/// later as unusable null elements.
pub(crate) fn build_pipeline(config: &BackendConfig) -> Result<Pipeline> {
    let pipeline = make_element(&config.pipeline)?;
    for property in PIPELINE_PROPERTIES {
        if pipeline.find_property(property).is_none() {
            return Err(Error::UnsupportedPipeline {
                element: pipeline.name().to_string(),
                property,
            });
        }
    }

    let sink = make_element(&config.video_sink)?;
    let upload = config.upload.as_deref().map(make_element).transpose()?;

    let video_bin = gst::Bin::with_name(VIDEO_BIN_NAME);

    // First element of the bin, whose sink pad gets ghosted
    let entry = match upload {
        Some(upload) => {
            video_bin
                .add_many([&upload, &sink])
                .map_err(Error::VideoBin)?;
            gst::Element::link_many([&upload, &sink]).map_err(Error::VideoBin)?;
            upload
        }
        None => {
            video_bin.add(&sink).map_err(Error::VideoBin)?;
            sink.clone()
        }
    };

    let pad = entry
        .static_pad("sink")
        .ok_or_else(|| Error::missing_pad(&entry, "sink"))?;
    let ghost_pad = gst::GhostPad::builder_with_target(&pad)
        .map_err(Error::VideoBin)?
        .name("sink")
        .build();
    ghost_pad.set_active(true).map_err(Error::VideoBin)?;
    video_bin.add_pad(&ghost_pad).map_err(Error::VideoBin)?;

    // Read once so a sink without a drawable fails construction
    let widget = WidgetSource {
        sink,
        property: config.widget_property.clone(),
    };
    let drawable = widget.resolve()?;

    pipeline.set_property("video-sink", &video_bin);

    trace!(
        pipeline = %pipeline.name(),
        sink = %widget.sink.name(),
        widget = %drawable.type_(),
        "Built pipeline"
    );

    Ok(Pipeline { pipeline, widget })
}

/// Reads the drawable out of the sink's object property.
fn widget_from_sink(sink: &gst::Element, property: &str) -> Result<glib::Object> {
    let missing = || Error::MissingWidgetProperty {
        sink: sink.name().to_string(),
        property: property.to_owned(),
    };

    let pspec = sink.find_property(property).ok_or_else(missing)?;
    if !pspec.value_type().is_a(glib::Object::static_type()) {
        return Err(missing());
    }

    sink.property_value(property)
        .get::<Option<glib::Object>>()
        .ok()
        .flatten()
        .ok_or_else(|| Error::NoWidget(sink.name().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_follow_latest_sample() {
        let thresholds = BufferingConfig::default();

        assert_eq!(thresholds.next(Buffering::Ready, 99), Buffering::Buffering);
        assert_eq!(thresholds.next(Buffering::Ready, 100), Buffering::Ready);
        assert_eq!(thresholds.next(Buffering::Buffering, 99), Buffering::Buffering);
        assert_eq!(thresholds.next(Buffering::Buffering, 100), Buffering::Ready);
        assert_eq!(thresholds.next(Buffering::Ready, 0), Buffering::Buffering);
    }

    #[test]
    fn hysteresis_holds_between_thresholds() {
        let thresholds = BufferingConfig {
            pause_below: 50,
            resume_at: 90,
        };

        // Ready stays Ready until the fill drops below 50
        assert_eq!(thresholds.next(Buffering::Ready, 70), Buffering::Ready);
        assert_eq!(thresholds.next(Buffering::Ready, 49), Buffering::Buffering);

        // Buffering stays Buffering until the fill reaches 90
        assert_eq!(thresholds.next(Buffering::Buffering, 70), Buffering::Buffering);
        assert_eq!(thresholds.next(Buffering::Buffering, 90), Buffering::Ready);
    }

    #[test]
    fn default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.uri, None);
        assert_eq!(settings.volume, DEFAULT_VOLUME);
        assert!(!settings.playing);
        assert_eq!(settings.buffer_fill, 0.0);
    }
}
