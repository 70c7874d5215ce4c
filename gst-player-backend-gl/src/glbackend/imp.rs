//! GL Player Backend Implementation
//!
//! This module contains the GObject implementation behind `GlPlayerBackend`.
//! It handles:
//! - Property management (volume, playing, uri, buffer-fill)
//! - Pipeline lifecycle (built once in `start()`, torn down in `dispose()`)
//! - Bus messages (buffering throttle, error forwarding)
//! - Reflecting pipeline-side volume changes back into the `volume` property
//!
//! ## Threading
//! Property setters run on the host's UI thread. Bus messages are dispatched
//! by a bus watch on the thread-default main context, and `notify::volume`
//! can fire on GStreamer streaming threads. All shared values live behind
//! two mutexes:
//! - `context`: the pipeline and everything needed to drive it
//! - `settings`: the values exposed as properties
//!
//! Lock order is always `context` before `settings`. The volume observer only
//! takes `settings`, so pipeline calls made while `context` is held cannot
//! deadlock against it. Property notifications are emitted with no lock held
//! by this object. A pipeline volume change raised while `context` is locked
//! (for instance during a state change) is notified from an idle callback on
//! the default main context instead.
//!
//! The object derives from `gst::Object` so it can be shared across threads.
//! It never stores the widget itself, only the sink providing it.

// SPDX-FileCopyrightText: 2025 Contributors to the GStreamer OpenGL player backend project.
// SPDX-License-Identifier: Apache-2.0

use gst::glib;
use gst::prelude::*;
use gst::subclass::prelude::*;
use gstreamer as gst;
use tracing::trace;

use std::sync::LazyLock;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::TryLockError;

use crate::Error;
use crate::Result;
use crate::config::BackendConfig;
use crate::config::DEFAULT_VOLUME;
use crate::glbackend;
use crate::glbackend::state::Buffering;
use crate::glbackend::state::Context;
use crate::glbackend::state::DEFAULT_BUFFER_FILL;
use crate::glbackend::state::DEFAULT_PLAYING;
use crate::glbackend::state::Settings;
use crate::glbackend::state::State;
use crate::glbackend::state::build_pipeline;

/// GStreamer debug category for backend messages.
///
/// Set GST_DEBUG=glplayerbackend:5 to see DEBUG-level logs.
pub(crate) static CAT: LazyLock<gst::DebugCategory> = LazyLock::new(|| {
    gst::DebugCategory::new(
        "glplayerbackend",
        gst::DebugColorFlags::empty(),
        Some("GStreamer OpenGL Player Backend"),
    )
});

#[derive(Default)]
pub struct GlPlayerBackend {
    /// Host-visible values (uri, volume, playing, buffer-fill)
    settings: Mutex<Settings>,

    /// Pipeline state (None before start and after dispose)
    context: Mutex<Context>,
}

#[glib::object_subclass]
impl ObjectSubclass for GlPlayerBackend {
    const NAME: &'static str = "GstRsGlPlayerBackend";

    type Type = glbackend::GlPlayerBackend;

    type ParentType = gst::Object;
}

impl ObjectImpl for GlPlayerBackend {
    fn properties() -> &'static [glib::ParamSpec] {
        static PROPERTIES: LazyLock<Vec<glib::ParamSpec>> = LazyLock::new(|| {
            vec![
                glib::ParamSpecDouble::builder("volume")
                    .nick("Volume")
                    .blurb("Volume of player")
                    .minimum(0.0)
                    .maximum(1.0)
                    .default_value(DEFAULT_VOLUME)
                    .build(),
                glib::ParamSpecBoolean::builder("playing")
                    .nick("Playing")
                    .blurb("Whether playing")
                    .default_value(DEFAULT_PLAYING)
                    .build(),
                glib::ParamSpecString::builder("uri")
                    .nick("Uri")
                    .blurb("Current uri")
                    .build(),
                // Written by the bus handler only
                glib::ParamSpecDouble::builder("buffer-fill")
                    .nick("Buffer Fill")
                    .blurb("Current buffer fill")
                    .minimum(0.0)
                    .maximum(1.0)
                    .default_value(DEFAULT_BUFFER_FILL)
                    .read_only()
                    .build(),
            ]
        });

        PROPERTIES.as_ref()
    }

    /// `error(message, debug)`: a pipeline error message, forwarded as is.
    fn signals() -> &'static [glib::subclass::Signal] {
        static SIGNALS: LazyLock<Vec<glib::subclass::Signal>> = LazyLock::new(|| {
            vec![
                glib::subclass::Signal::builder("error")
                    .param_types([String::static_type(), String::static_type()])
                    .build(),
            ]
        });

        SIGNALS.as_ref()
    }

    fn constructed(&self) {
        #[cfg(feature = "tracing")]
        {
            use tracing_subscriber::filter::LevelFilter;
            use tracing_subscriber::util::SubscriberInitExt;

            let _ = tracing_subscriber::fmt()
                .compact()
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_target(false)
                .with_max_level(LevelFilter::TRACE)
                .with_ansi(true)
                .finish()
                .try_init();
        }

        self.parent_constructed();
    }

    fn set_property(&self, _id: usize, value: &glib::Value, pspec: &glib::ParamSpec) {
        match pspec.name() {
            "volume" => match value.get::<f64>() {
                Ok(volume) => self.set_volume(volume),
                Err(_) => gst::error!(CAT, imp = self, "Invalid type for volume property"),
            },
            "playing" => match value.get::<bool>() {
                Ok(playing) => self.set_playing(playing),
                Err(_) => gst::error!(CAT, imp = self, "Invalid type for playing property"),
            },
            "uri" => match value.get::<Option<String>>() {
                Ok(uri) => self.set_uri(uri),
                Err(_) => gst::error!(CAT, imp = self, "Invalid type for uri property"),
            },
            other => {
                gst::error!(CAT, imp = self, "Unknown property '{}'", other);
            }
        }
    }

    fn property(&self, _id: usize, pspec: &glib::ParamSpec) -> glib::Value {
        let settings = self.settings();
        match pspec.name() {
            "volume" => settings.volume.to_value(),
            "playing" => settings.playing.to_value(),
            "uri" => settings.uri.to_value(),
            "buffer-fill" => settings.buffer_fill.to_value(),
            other => {
                gst::error!(CAT, imp = self, "Unknown property {}", other);
                pspec.default_value().clone()
            }
        }
    }

    /// Stops the pipeline and releases it.
    ///
    /// The state is taken out of the context, so a second dispose finds
    /// nothing left to release.
    fn dispose(&self) {
        let Some(mut state) = self.context().state.take() else {
            return;
        };

        drop(state.bus_watch.take());
        if let Some(handler) = state.volume_handler.take() {
            state.pipeline.disconnect(handler);
        }
        self.request_state(&mut state, gst::State::Null);

        gst::info!(
            CAT,
            imp = self,
            "Disposed (buffering: {:?})",
            state.buffering
        );
    }
}

impl GstObjectImpl for GlPlayerBackend {}

impl GlPlayerBackend {
    fn settings(&self) -> MutexGuard<'_, Settings> {
        self.settings.lock().unwrap_or_else(|poisoned| {
            gst::warning!(CAT, imp = self, "Settings mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub(super) fn context(&self) -> MutexGuard<'_, Context> {
        self.context.lock().unwrap_or_else(|poisoned| {
            gst::warning!(CAT, imp = self, "Context mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Builds the pipeline and wires it to this object.
    ///
    /// Pushes the stored uri and the configured volume to the pipeline, then
    /// installs the volume observer and the bus watch. Both only hold weak
    /// references, so the backend can be dropped while they are installed.
    pub(super) fn start(&self, config: &BackendConfig) -> Result<()> {
        let mut context = self.context();
        if context.state.is_some() {
            return Err(Error::AlreadyStarted);
        }

        let built = build_pipeline(config)?;
        let pipeline = built.pipeline;

        let uri = {
            let mut settings = self.settings();
            settings.volume = config.volume;
            settings.uri.clone()
        };
        pipeline.set_property("volume", config.volume);
        pipeline.set_property("uri", uri.as_deref());

        let obj = self.obj();

        let weak = obj.downgrade();
        let volume_handler = pipeline.connect_notify(Some("volume"), move |pipeline, _| {
            let Some(obj) = weak.upgrade() else {
                return;
            };
            match pipeline.property_value("volume").get::<f64>() {
                Ok(volume) => obj.imp().pipeline_volume_changed(volume),
                Err(err) => trace!("Ignoring pipeline volume notification: {}", err),
            }
        });

        let bus = pipeline.bus().ok_or(Error::MissingBus)?;
        let weak = obj.downgrade();
        let bus_watch = bus
            .add_watch(move |_, msg| match weak.upgrade() {
                Some(obj) => obj.imp().handle_message(msg),
                None => glib::ControlFlow::Break,
            })
            .map_err(Error::BusWatch)?;

        context.state = Some(State {
            pipeline,
            widget: built.widget,
            bus_watch: Some(bus_watch),
            volume_handler: Some(volume_handler),
            buffering: Buffering::Ready,
            thresholds: config.buffering,
            stop_mode: config.stop_mode,
            requested: gst::State::Null,
        });

        gst::info!(CAT, imp = self, "Started with {:?}", config);
        Ok(())
    }

    fn request_state(&self, state: &mut State, target: gst::State) {
        state.requested = target;
        match state.pipeline.set_state(target) {
            Ok(success) => {
                gst::debug!(CAT, imp = self, "Requested {:?}: {:?}", target, success);
            }
            Err(err) => {
                // The reason is posted on the bus and forwarded from there
                gst::warning!(CAT, imp = self, "Failed to request {:?}: {:?}", target, err);
            }
        }
    }

    fn set_uri(&self, uri: Option<String>) {
        let mut context = self.context();
        let playing = {
            let mut settings = self.settings();
            gst::info!(
                CAT,
                imp = self,
                "Changing uri from {:?} to {:?}",
                settings.uri,
                uri
            );
            settings.uri = uri.clone();
            settings.playing
        };

        let Some(state) = context.state.as_mut() else {
            return;
        };

        state.buffering = Buffering::Ready;
        if playing {
            // playbin only opens a new uri on a fresh start
            self.request_state(state, gst::State::Ready);
            state.pipeline.set_property("uri", uri.as_deref());
            self.request_state(state, gst::State::Playing);
        } else {
            state.pipeline.set_property("uri", uri.as_deref());
        }
    }

    pub(super) fn set_volume(&self, volume: f64) {
        if volume.is_nan() {
            gst::warning!(CAT, imp = self, "Ignoring NaN volume");
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        {
            let mut settings = self.settings();
            gst::debug!(
                CAT,
                imp = self,
                "Changing volume from {} to {}",
                settings.volume,
                volume
            );
            settings.volume = volume;
        }

        let pipeline = self.context().state.as_ref().map(|s| s.pipeline.clone());
        if let Some(pipeline) = pipeline {
            pipeline.set_property("volume", volume);
        }
    }

    /// Reflects a volume change made on the pipeline itself.
    pub(super) fn pipeline_volume_changed(&self, volume: f64) {
        if volume.is_nan() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        {
            let mut settings = self.settings();
            if settings.volume == volume {
                return;
            }
            settings.volume = volume;
        }

        gst::debug!(CAT, imp = self, "Pipeline volume changed to {}", volume);

        // Handlers may call back into a setter, which takes `context`
        let context_busy = matches!(self.context.try_lock(), Err(TryLockError::WouldBlock));
        if !context_busy {
            self.obj().notify("volume");
            return;
        }

        gst::debug!(CAT, imp = self, "Deferring volume notification");
        let weak = self.obj().downgrade();
        glib::idle_add_once(move || {
            if let Some(obj) = weak.upgrade() {
                obj.notify("volume");
            }
        });
    }

    fn set_playing(&self, playing: bool) {
        let mut context = self.context();
        self.settings().playing = playing;

        let Some(state) = context.state.as_mut() else {
            return;
        };

        state.buffering = Buffering::Ready;
        let target = if playing {
            gst::State::Playing
        } else {
            state.stop_mode.target_state()
        };

        gst::info!(
            CAT,
            imp = self,
            "{}",
            if playing { "Play" } else { "Stop" }
        );
        self.request_state(state, target);
    }

    /// Handles one bus message.
    ///
    /// Always keeps the watch installed.
    pub(super) fn handle_message(&self, msg: &gst::MessageRef) -> glib::ControlFlow {
        use gst::MessageView;

        match msg.view() {
            MessageView::Buffering(buffering) => self.on_buffering(buffering.percent()),
            MessageView::Error(err) => {
                gst::error!(
                    CAT,
                    imp = self,
                    "Error from {:?}: {} ({:?})",
                    err.src().map(|s| s.path_string()),
                    err.error(),
                    err.debug()
                );

                let message = err.error().to_string();
                let debug = err.debug().map(|d| d.to_string());
                self.obj().emit_by_name::<()>("error", &[&message, &debug]);
            }
            MessageView::Warning(warning) => {
                gst::warning!(
                    CAT,
                    imp = self,
                    "Warning from {:?}: {} ({:?})",
                    warning.src().map(|s| s.path_string()),
                    warning.error(),
                    warning.debug()
                );
            }
            MessageView::Eos(..) => gst::info!(CAT, imp = self, "End of stream"),
            _ => (),
        }

        glib::ControlFlow::Continue
    }

    /// Publishes the buffer fill and runs the pause/resume throttle.
    ///
    /// The pipeline is only touched when the buffering sub-state changes and
    /// playback is requested; the visible `playing` flag never changes here.
    pub(super) fn on_buffering(&self, percent: i32) {
        let fill = f64::from(percent.clamp(0, 100)) / 100.0;
        {
            let mut context = self.context();
            let playing = {
                let mut settings = self.settings();
                settings.buffer_fill = fill;
                settings.playing
            };

            if let Some(state) = context.state.as_mut() {
                let previous = state.buffering;
                let next = state.thresholds.next(previous, percent);
                state.buffering = next;
                trace!(percent, ?previous, ?next, playing, "Buffering");

                if playing && previous != next {
                    let target = match next {
                        Buffering::Buffering => gst::State::Paused,
                        Buffering::Ready => gst::State::Playing,
                    };
                    gst::debug!(
                        CAT,
                        imp = self,
                        "Buffering at {}%, requesting {:?}",
                        percent,
                        target
                    );
                    self.request_state(state, target);
                }
            }
        }

        self.obj().notify("buffer-fill");
    }

    /// Resolved outside the lock, the sink may dispatch to the UI thread.
    pub(super) fn widget(&self) -> Option<glib::Object> {
        let source = self.context().state.as_ref().map(|s| s.widget.clone())?;
        match source.resolve() {
            Ok(widget) => Some(widget),
            Err(err) => {
                gst::warning!(CAT, imp = self, "No widget: {}", err);
                None
            }
        }
    }

    pub(super) fn pipeline(&self) -> Option<gst::Element> {
        self.context().state.as_ref().map(|s| s.pipeline.clone())
    }

    pub(super) fn requested_state(&self) -> Option<gst::State> {
        self.context().state.as_ref().map(|s| s.requested)
    }

    pub(super) fn is_buffering(&self) -> bool {
        self.context()
            .state
            .as_ref()
            .is_some_and(|s| s.buffering == Buffering::Buffering)
    }
}
