// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The [`FrameScheduler`](crate::scheduler::FrameScheduler) tracks pending
//! work with [`understory_dirty`]. Both channels are local-only: no
//! dependency edges are added, so only explicitly marked keys drain.
//!
//! - [`SUBTREE`] is keyed by gadget id and records which gadgets published
//!   since the last frame. Drained into
//!   [`Frame::changed`](crate::scheduler::Frame::changed).
//! - [`TOPOLOGY`] is keyed by [`FRAME_KEY`] and records that the gadget set
//!   itself changed (a gadget was added or removed, or a caller forced a
//!   frame).

use understory_dirty::Channel;

/// A gadget's subtree was replaced.
pub const SUBTREE: Channel = Channel::new(0);

/// The set of gadgets changed, or a frame was requested.
pub const TOPOLOGY: Channel = Channel::new(1);

/// Key used for marks that are not about one gadget.
///
/// Gadget id 0 is never allocated, so this never collides with a
/// [`SUBTREE`] key.
pub const FRAME_KEY: u32 = 0;
