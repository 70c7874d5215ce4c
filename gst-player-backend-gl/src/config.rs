// SPDX-FileCopyrightText: 2025 Contributors to the GStreamer OpenGL player backend project.
// SPDX-License-Identifier: Apache-2.0

//! Backend configuration.
//!
//! Every field has a default matching the stock OpenGL topology
//! (`playbin` → `glupload` → `gtkglsink`), so an empty JSON object is a valid
//! configuration. Keys are kebab-case:
//!
//! ```json
//! {
//!     "video-sink": "gtkglsink",
//!     "upload": "glupload",
//!     "widget-property": "widget",
//!     "volume": 0.5,
//!     "stop-mode": "null",
//!     "buffering": { "pause-below": 100, "resume-at": 100 }
//! }
//! ```

use std::path::Path;

use gstreamer as gst;
use serde::Deserialize;

use crate::{Error, Result};

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "GL_PLAYER_BACKEND_CONFIG";

pub const DEFAULT_PIPELINE: &str = "playbin";
pub const DEFAULT_VIDEO_SINK: &str = "gtkglsink";
pub const DEFAULT_UPLOAD: &str = "glupload";
pub const DEFAULT_WIDGET_PROPERTY: &str = "widget";
pub const DEFAULT_VOLUME: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BackendConfig {
    /// Factory name of the pipeline element
    pub pipeline: String,

    /// Factory name of the video sink
    pub video_sink: String,

    /// Element placed in front of the sink inside the video bin
    pub upload: Option<String>,

    /// Object property of the sink holding the drawable.
    ///
    /// `None` makes the sink element itself the drawable handle.
    pub widget_property: Option<String>,

    /// Initial volume, `0.0..=1.0`
    pub volume: f64,

    pub stop_mode: StopMode,

    pub buffering: BufferingConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            pipeline: DEFAULT_PIPELINE.to_owned(),
            video_sink: DEFAULT_VIDEO_SINK.to_owned(),
            upload: Some(DEFAULT_UPLOAD.to_owned()),
            widget_property: Some(DEFAULT_WIDGET_PROPERTY.to_owned()),
            volume: DEFAULT_VOLUME,
            stop_mode: StopMode::default(),
            buffering: BufferingConfig::default(),
        }
    }
}

impl BackendConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BackendConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Loads the file named by [`CONFIG_ENV`], or the defaults if it is unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(Error::InvalidConfig(format!(
                "volume {} is outside 0.0..=1.0",
                self.volume
            )));
        }
        if self.pipeline.is_empty() || self.video_sink.is_empty() {
            return Err(Error::InvalidConfig(
                "pipeline and video-sink must name element factories".into(),
            ));
        }
        self.buffering.validate()
    }
}

/// Pipeline state requested when playback is stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopMode {
    /// Tear the pipeline down and release every resource
    #[default]
    Null,
    /// Keep devices closed but the element graph allocated
    Ready,
    /// Keep the stream open for instant resume
    Paused,
}

impl StopMode {
    pub fn target_state(self) -> gst::State {
        match self {
            StopMode::Null => gst::State::Null,
            StopMode::Ready => gst::State::Ready,
            StopMode::Paused => gst::State::Paused,
        }
    }
}

/// Thresholds of the buffering throttle, in percent.
///
/// Playback pauses when progress drops below `pause_below` and resumes once
/// it reaches `resume_at`. Equal values give the plain two-state throttle,
/// a lower `pause_below` adds hysteresis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BufferingConfig {
    pub pause_below: u8,
    pub resume_at: u8,
}

impl Default for BufferingConfig {
    fn default() -> Self {
        BufferingConfig {
            pause_below: 100,
            resume_at: 100,
        }
    }
}

impl BufferingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.resume_at > 100 {
            return Err(Error::InvalidConfig(format!(
                "buffering resume-at {} exceeds 100",
                self.resume_at
            )));
        }
        if self.pause_below > self.resume_at {
            return Err(Error::InvalidConfig(format!(
                "buffering pause-below {} is above resume-at {}",
                self.pause_below, self.resume_at
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = BackendConfig::from_json("{}").unwrap();
        assert_eq!(config, BackendConfig::default());
        assert_eq!(config.pipeline, "playbin");
        assert_eq!(config.upload.as_deref(), Some("glupload"));
        assert_eq!(config.stop_mode, StopMode::Null);
    }

    #[test]
    fn parses_kebab_case_keys() {
        let config = BackendConfig::from_json(
            r#"{
                "video-sink": "fakesink",
                "upload": null,
                "widget-property": null,
                "volume": 1.0,
                "stop-mode": "paused",
                "buffering": { "pause-below": 20 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.video_sink, "fakesink");
        assert_eq!(config.upload, None);
        assert_eq!(config.widget_property, None);
        assert_eq!(config.volume, 1.0);
        assert_eq!(config.stop_mode.target_state(), gst::State::Paused);
        assert_eq!(
            config.buffering,
            BufferingConfig {
                pause_below: 20,
                resume_at: 100
            }
        );
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let err = BackendConfig::from_json(r#"{ "volume": 1.5 }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let err =
            BackendConfig::from_json(r#"{ "buffering": { "pause-below": 90, "resume-at": 50 } }"#)
                .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = BackendConfig::from_json(r#"{ "buffering": { "resume-at": 120 } }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = BackendConfig::from_json(r#"{ "sink": "fakesink" }"#).unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn missing_file() {
        let err = BackendConfig::load("/nonexistent/backend.json").unwrap_err();
        assert!(matches!(err, Error::ConfigIo { .. }));
    }
}
