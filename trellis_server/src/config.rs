// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Server configuration.

use std::time::Duration;

use serde::Deserialize;

/// Errors from loading or checking a [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration text is not valid JSON for [`ServerConfig`].
    #[error("failed to parse server config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field has an unusable value.
    #[error("invalid server config: {0}")]
    Invalid(&'static str),
}

/// Settings for [`ServerThread::start`](crate::ServerThread::start).
///
/// Every field has a default, so `{}` is a complete configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Period of the built-in frame tick, in milliseconds.
    ///
    /// `0` disables periodic ticks; frames are then built only on
    /// [`ServerHandle::tick`](crate::ServerHandle::tick).
    pub frame_interval_ms: u64,
    /// Capacity of the command queue feeding the event loop.
    pub command_capacity: usize,
    /// Name given to the event-loop thread.
    pub thread_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 11,
            command_capacity: 256,
            thread_name: "trellis-server".into(),
        }
    }
}

impl ServerConfig {
    /// Parses and checks a JSON configuration.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_capacity == 0 {
            return Err(ConfigError::Invalid("command_capacity must be at least 1"));
        }
        if self.thread_name.contains('\0') {
            return Err(ConfigError::Invalid("thread_name must not contain NUL"));
        }
        Ok(())
    }

    /// The periodic tick interval, or `None` when periodic ticks are off.
    #[must_use]
    pub fn frame_interval(&self) -> Option<Duration> {
        (self.frame_interval_ms > 0).then(|| Duration::from_millis(self.frame_interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ServerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.frame_interval(), Some(Duration::from_millis(11)));
    }

    #[test]
    fn fields_override_defaults() {
        let config = ServerConfig::from_json_str(
            r#"{ "frame_interval_ms": 0, "command_capacity": 8, "thread_name": "scene" }"#,
        )
        .unwrap();
        assert_eq!(config.frame_interval(), None);
        assert_eq!(config.command_capacity, 8);
        assert_eq!(config.thread_name, "scene");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = ServerConfig::from_json_str(r#"{ "frame_rate": 90 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let err = ServerConfig::from_json_str(r#"{ "command_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
    }

    #[test]
    fn nul_in_thread_name_is_invalid() {
        let err = ServerConfig::from_json_str(r#"{ "thread_name": "a\u0000b" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
    }
}
