// SPDX-FileCopyrightText: 2025 Contributors to the GStreamer OpenGL player backend project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for backend construction and configuration.
//!
//! Only construction can fail. Once a backend is built, pipeline failures
//! (bad URI, missing codec, decode errors) arrive asynchronously on the bus
//! and are forwarded through the backend's `error` signal instead.

use std::path::PathBuf;

use gst::glib;
use gst::prelude::*;
use gstreamer as gst;

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `gst::init()` failed. Cached and returned to every later caller.
    #[error("Failed to initialize GStreamer: {0}")]
    Init(String),

    /// No element factory with this name, usually a missing plugin package.
    #[error("Failed to create element '{factory}': {source}")]
    MissingElement {
        factory: String,
        #[source]
        source: glib::BoolError,
    },

    /// Adding, linking or ghosting inside the video bin failed.
    #[error("Failed to assemble video bin: {0}")]
    VideoBin(#[source] glib::BoolError),

    /// The configured pipeline element lacks a property the backend drives.
    #[error("Pipeline '{element}' has no '{property}' property")]
    UnsupportedPipeline {
        element: String,
        property: &'static str,
    },

    #[error("Element '{element}' has no '{pad}' pad")]
    MissingPad { element: String, pad: &'static str },

    #[error("Video sink '{sink}' has no object property '{property}'")]
    MissingWidgetProperty { sink: String, property: String },

    /// The sink has the widget property but left it unset.
    #[error("Video sink '{0}' did not provide a widget")]
    NoWidget(String),

    #[error("Pipeline has no bus")]
    MissingBus,

    #[error("Failed to watch pipeline bus: {0}")]
    BusWatch(#[source] glib::BoolError),

    /// The pipeline of this backend was already built.
    #[error("Backend already started")]
    AlreadyStarted,

    #[error("Failed to read config '{path}': {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn missing_element(factory: &str, source: glib::BoolError) -> Self {
        Error::MissingElement {
            factory: factory.to_owned(),
            source,
        }
    }

    pub(crate) fn missing_pad(element: &gst::Element, pad: &'static str) -> Self {
        Error::MissingPad {
            element: element.name().to_string(),
            pad,
        }
    }
}
