// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-graph construction, gadget registry and frame scheduling for
//! shared scene compositing.
//!
//! `trellis_core` lets independent client processes ("gadgets") each
//! contribute a subtree to one shared scene graph, and lets a renderer
//! consume the merged graph as a sequence of immutable frames. It is
//! `no_std` compatible (with `alloc`) and does no I/O: transports plug in
//! through small traits.
//!
//! # Architecture
//!
//! ```text
//!   gadget process                         server event loop
//!   ──────────────                         ─────────────────
//!   Session::start()
//!     start_node / set_* / finish_node
//!       │
//!       ▼
//!   Session::finish() ──► SceneGraphSubmitter ──► ServerState::update_scene_graph()
//!                                                      │
//!                                     GadgetRegistry ◄─┤
//!                                     FrameScheduler ◄─┘ (mark dirty)
//!                                          │
//!                     tick ──► ServerState::run_frame() ──► FrameSink
//!
//!   interaction events ──► ServerState::push_* ──► EventRouter ──► EventSink
//! ```
//!
//! **[`context`]**: Stack-based builder that produces a validated node tree.
//!
//! **[`session`]**: Handle layer over a context plus the submission seam.
//!
//! **[`node`]** and **[`message`]**: The typed node model and its flat,
//! parent-before-children wire form with a binary codec.
//!
//! **[`id`]**: Client, gadget and packed [`GlobalNodeId`](id::GlobalNodeId)
//! identity types.
//!
//! **[`registry`]**: The gadget table: published subtrees and processor
//! handles.
//!
//! **[`dirty`]** and **[`scheduler`]**: Dirty tracking via
//! `understory_dirty`, frame numbering, listeners and frame assembly.
//!
//! **[`event`]** and **[`router`]**: Interaction events and their
//! addressed or broadcast delivery.
//!
//! **[`state`]**: The loop-owned aggregate every server command runs
//! against.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types,
//! with a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod context;
pub mod dirty;
pub mod event;
pub mod id;
pub mod message;
pub mod node;
pub mod registry;
pub mod router;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod trace;
