//! GStreamer OpenGL Player Backend
//!
//! This crate implements a player backend that renders video through
//! GStreamer's OpenGL elements and plugs into a host application through the
//! [`player_backend`] contract.
//!
//! - **GlPlayerBackend**: the backend object. It wraps a `playbin` whose
//!   video sink is a bin of `glupload` and `gtkglsink`, and exposes volume,
//!   playing, uri and buffer-fill as GObject properties
//! - **register**: the plugin entry point the host calls at discovery time
//! - **runtime**: process-wide GStreamer initialization and teardown
//! - **BackendConfig**: element choices, initial volume, stop behaviour and
//!   buffering thresholds
//!
//! ## GStreamer Concepts (for non-GStreamer developers)
//! - **Pipeline**: A graph of elements turning a URI into rendered media
//! - **Bus**: The channel on which a pipeline posts asynchronous messages
//!   (buffering progress, errors, end of stream)
//! - **Ghost pad**: A bin pad proxying a pad of an element inside the bin

// SPDX-FileCopyrightText: 2025 Contributors to the GStreamer OpenGL player backend project.
// SPDX-License-Identifier: Apache-2.0

use gst::prelude::*;
use gstreamer as gst;
use player_backend::{BackendRegistry, PlayerBackend, PluginInfo};

pub mod config;
mod error;
mod glbackend;
pub mod runtime;

pub use config::{BackendConfig, BufferingConfig, StopMode};
pub use error::{Error, Result};
pub use glbackend::GlPlayerBackend;

/// Module name the host selects this backend by.
pub const MODULE_NAME: &str = "player-backend-gstreamer-opengl";

/// Metadata registered with the host.
pub fn plugin_info() -> PluginInfo {
    PluginInfo {
        module: MODULE_NAME,
        name: "GStreamer OpenGL",
        description: env!("CARGO_PKG_DESCRIPTION"),
        version: concat!(env!("CARGO_PKG_VERSION"), "-", env!("COMMIT_ID")),
        license: "Apache-2.0",
        authors: "Contributors to the GStreamer OpenGL player backend project",
    }
}

/// Registers the backend with the host.
///
/// Called once by the host when it discovers the plugin. Registers the
/// `GlPlayerBackend` type with the GObject type system and adds a factory
/// that builds backends from [`BackendConfig::from_env`].
pub fn register(registry: &mut BackendRegistry) -> player_backend::Result<()> {
    let type_ = GlPlayerBackend::static_type();
    tracing::debug!(
        "Registering {} ({}, built {})",
        type_,
        plugin_info().version,
        env!("BUILD_REL_DATE")
    );

    registry.register(plugin_info(), create_backend)
}

fn create_backend() -> player_backend::Result<Box<dyn PlayerBackend>> {
    let construction = |e: Error| player_backend::Error::construction(MODULE_NAME, e);

    let config = BackendConfig::from_env().map_err(construction)?;
    let backend = GlPlayerBackend::with_config(&config).map_err(construction)?;

    gst::info!(
        glbackend::CAT,
        obj = &backend,
        "Created backend from {}",
        MODULE_NAME
    );
    Ok(Box::new(backend))
}

/// Convenience for hosts that only need this one backend.
pub fn default_registry() -> player_backend::Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    register(&mut registry)?;
    Ok(registry)
}
