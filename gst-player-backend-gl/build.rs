//! Build Script for gst-player-backend-gl
//!
//! Generates version information for the plugin metadata using
//! `gst_plugin_version_helper`.
//!
//! ## Generated Environment Variables
//! - `COMMIT_ID`: Git commit hash (for the version string)
//! - `BUILD_REL_DATE`: Build or release date
//!
//! Both are read in lib.rs via `env!` when building the plugin info.

// SPDX-FileCopyrightText: 2025 Contributors to the GStreamer OpenGL player backend project.
// SPDX-License-Identifier: Apache-2.0

fn main() {
    gst_plugin_version_helper::info()
}
