// SPDX-FileCopyrightText: 2025 Contributors to the GStreamer OpenGL player backend project.
// SPDX-License-Identifier: Apache-2.0

//! Plugin discovery and backend construction.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::{Error, PlayerBackend, Result};

/// Builds a fresh backend instance.
pub type BackendFactory = fn() -> Result<Box<dyn PlayerBackend>>;

/// Metadata a plugin declares when it registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    /// Unique module name the host selects the backend by
    pub module: &'static str,

    /// Human readable name
    pub name: &'static str,

    pub description: &'static str,

    /// Version string, usually including the commit id
    pub version: &'static str,

    pub license: &'static str,

    pub authors: &'static str,
}

struct Entry {
    info: PluginInfo,
    factory: BackendFactory,
}

/// Registered backend plugins, keyed by module name.
#[derive(Default)]
pub struct BackendRegistry {
    entries: BTreeMap<&'static str, Entry>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plugin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRegistered`] if the module name is taken; the
    /// existing registration is kept.
    pub fn register(&mut self, info: PluginInfo, factory: BackendFactory) -> Result<()> {
        if self.entries.contains_key(info.module) {
            return Err(Error::AlreadyRegistered(info.module.to_owned()));
        }

        info!(
            module = info.module,
            version = info.version,
            "Registered player backend"
        );
        self.entries.insert(info.module, Entry { info, factory });
        Ok(())
    }

    /// Metadata of all registered plugins, ordered by module name.
    pub fn plugins(&self) -> impl Iterator<Item = &PluginInfo> {
        self.entries.values().map(|entry| &entry.info)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.entries.contains_key(module)
    }

    /// Constructs a backend from the named module.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no such module is registered
    /// - [`Error::Construction`] if the plugin's factory fails. Errors the
    ///   factory already wrapped are returned as they are.
    pub fn create(&self, module: &str) -> Result<Box<dyn PlayerBackend>> {
        let entry = self
            .entries
            .get(module)
            .ok_or_else(|| Error::NotFound(module.to_owned()))?;

        debug!(module, "Constructing player backend");
        (entry.factory)().map_err(|err| match err {
            Error::Construction { .. } => err,
            other => Error::construction(module, other),
        })
    }
}
