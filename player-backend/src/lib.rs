// SPDX-FileCopyrightText: 2025 Contributors to the GStreamer OpenGL player backend project.
// SPDX-License-Identifier: Apache-2.0

//! # Player backend contract
//!
//! The interface a host application uses to drive interchangeable playback
//! implementations, and the registry through which those implementations are
//! discovered.
//!
//! ## Overview
//!
//! A backend is any type implementing [`PlayerBackend`]. It hands out a
//! drawable handle for the host to embed and exposes four pieces of state:
//! the media URI, the volume, whether playback is requested, and how full
//! the network buffer currently is.
//!
//! Backends are contributed by plugins. A plugin's registration entry point
//! adds a [`PluginInfo`] and a [`BackendFactory`] to a [`BackendRegistry`];
//! the host later picks a module by name and calls
//! [`BackendRegistry::create`].
//!
//! ```text
//! ┌──────────────┐  register()   ┌─────────────────┐  create()   ┌────────────────────────┐
//! │ plugin crate │ ────────────► │ BackendRegistry │ ──────────► │ Box<dyn PlayerBackend> │
//! └──────────────┘               └─────────────────┘             └────────────────────────┘
//! ```
//!
//! ## Thread Safety
//!
//! Backends are `Send + Sync`: the host may keep them on its UI thread while
//! the backend itself receives pipeline events from worker threads.

mod error;
mod registry;

pub use error::{Error, Result};
pub use registry::{BackendFactory, BackendRegistry, PluginInfo};

/// Playback capability set the host relies on.
///
/// Setters never fail: invalid input (a malformed URI, a file that cannot be
/// decoded) is reported asynchronously by the implementation.
pub trait PlayerBackend: Send + Sync {
    /// Drawable surface rendering the video.
    ///
    /// The same handle is returned on every call. `None` once the backend has
    /// released its resources.
    fn widget(&self) -> Option<glib::Object>;

    /// Current media locator.
    fn uri(&self) -> Option<String>;

    /// Replaces the media locator.
    fn set_uri(&self, uri: &str);

    /// Volume in the range `0.0..=1.0`.
    fn volume(&self) -> f64;

    /// Sets the volume; values outside `0.0..=1.0` are clamped.
    fn set_volume(&self, volume: f64);

    /// Whether playback has been requested.
    ///
    /// This reflects the desired state. Buffering may hold the underlying
    /// pipeline paused while this stays `true`.
    fn is_playing(&self) -> bool;

    /// Starts or stops playback.
    fn set_playing(&self, playing: bool);

    /// Latest buffering progress in the range `0.0..=1.0`.
    fn buffer_fill(&self) -> f64;
}
