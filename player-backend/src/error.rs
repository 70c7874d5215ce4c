// SPDX-FileCopyrightText: 2025 Contributors to the GStreamer OpenGL player backend project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for backend registration and construction.

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by the [`crate::BackendRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A plugin with the same module name was registered before.
    #[error("Backend module '{0}' is already registered")]
    AlreadyRegistered(String),

    /// No plugin with the requested module name is registered.
    #[error("Backend module '{0}' not found")]
    NotFound(String),

    /// The plugin's factory failed to build a backend.
    #[error("Failed to construct backend '{module}': {source}")]
    Construction {
        module: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Wraps a plugin-specific failure for the given module.
    pub fn construction<E>(module: &str, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Construction {
            module: module.to_owned(),
            source: source.into(),
        }
    }
}
