// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis server: runs [`trellis_core`]'s server state on a dedicated
//! event-loop thread.
//!
//! [`ServerThread::start`] spawns the loop; [`ServerHandle`] is the
//! cloneable, `Send` way in from any other thread. Remote capabilities are
//! modelled by the traits in [`processors`] and are only ever called from the
//! loop, which spawns each call as a local task and logs failures through
//! `tracing`.
//!
//! ```no_run
//! use trellis_server::{ServerConfig, ServerThread};
//!
//! # async fn demo() -> Result<(), trellis_server::ServerError> {
//! let server = ServerThread::start(ServerConfig::default())?;
//! let handle = server.handle();
//! if let Some(number) = handle.tick().await? {
//!     println!("built frame {number}");
//! }
//! server.join()?;
//! # Ok(())
//! # }
//! ```

mod client;
mod command;
mod config;
mod dispatch;
mod error;
mod event_loop;
mod log;
pub mod processors;

pub use client::GadgetClient;
pub use config::{ConfigError, ServerConfig};
pub use error::ServerError;
pub use event_loop::{ServerHandle, ServerThread};
pub use log::TracingSink;
