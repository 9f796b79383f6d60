// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Server error type.

use crate::config::ConfigError;

/// Errors from starting, driving or stopping the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The event loop has stopped; the command was not applied.
    #[error("server event loop is closed")]
    Closed,
    /// Spawning the thread or building the runtime failed.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The event-loop thread panicked.
    #[error("server event loop panicked")]
    Panicked,
}
