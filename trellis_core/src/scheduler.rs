// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame assembly and broadcast.
//!
//! The [`FrameScheduler`] records pending changes on the [dirty
//! channels](crate::dirty) and, when anything is pending, assembles a
//! [`Frame`] from the registry and hands it to every subscribed listener
//! through a [`FrameSink`].
//!
//! Frame numbers start at 1 and increase by exactly one per built frame, no
//! matter how many marks were made in between.
//!
//! # Frame loop
//!
//! ```rust,ignore
//! fn on_tick() {
//!     // Commands mark the scheduler dirty as they mutate the registry.
//!     registry.publish_subtree(gadget, message)?;
//!     scheduler.mark_gadget_dirty(gadget);
//!
//!     // Once per tick: build and broadcast if anything changed.
//!     if let Some(report) = scheduler.run_frame(&registry, &mut sink) {
//!         log_failures(&report.failures);
//!     }
//! }
//! ```

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use understory_dirty::DirtyTracker;

use crate::dirty;
use crate::id::{ClientId, GadgetId, GlobalNodeId};
use crate::message::SceneGraphMessage;
use crate::node::Node;
use crate::registry::{GadgetRegistry, Processors};

/// Errors reported when handing a message to a remote recipient.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The recipient's connection is gone.
    #[error("recipient disconnected")]
    Disconnected,
    /// The recipient refused the message.
    #[error("recipient rejected the message")]
    Rejected,
    /// The transport failed.
    #[error("transport error: {0}")]
    Transport(String),
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One gadget's contribution to a [`Frame`].
#[derive(Clone, Debug, PartialEq)]
pub struct FrameGadget {
    /// The gadget.
    pub id: GadgetId,
    /// The gadget's name at build time.
    pub name: String,
    /// The gadget's subtree at build time.
    pub subtree: Arc<SceneGraphMessage>,
}

/// A merged, immutable view of every published subtree.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    number: u64,
    gadgets: Vec<FrameGadget>,
    changed: Vec<GadgetId>,
}

impl Frame {
    /// The frame number.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Gadgets with a published subtree, in registration order.
    #[must_use]
    pub fn gadgets(&self) -> &[FrameGadget] {
        &self.gadgets
    }

    /// Gadgets that published since the previous frame, in ascending id
    /// order.
    #[must_use]
    pub fn changed(&self) -> &[GadgetId] {
        &self.changed
    }

    /// Iterates every node of every gadget.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.gadgets.iter().flat_map(|g| g.subtree.nodes())
    }

    /// Iterates every node paired with its global id.
    pub fn global_nodes(&self) -> impl Iterator<Item = (GlobalNodeId, &Node)> + '_ {
        self.gadgets.iter().flat_map(|g| {
            g.subtree
                .nodes()
                .iter()
                .map(move |n| (GlobalNodeId::new(g.id, n.id), n))
        })
    }

    /// Total node count across all gadgets.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.gadgets.iter().map(|g| g.subtree.node_count()).sum()
    }
}

// ---------------------------------------------------------------------------
// Listeners and sinks
// ---------------------------------------------------------------------------

/// A subscribed frame listener.
#[derive(Clone, Debug)]
pub struct Listener<L> {
    /// The subscribing client.
    pub client: ClientId,
    /// The listener handle.
    pub handle: L,
}

/// Hands built frames to listeners.
///
/// The server implements this by spawning one delivery task per listener;
/// tests use recorders.
pub trait FrameSink<L> {
    /// Delivers `frame` to one listener.
    ///
    /// An error only affects this listener; the scheduler keeps going.
    fn deliver_frame(&mut self, listener: &L, frame: &Arc<Frame>) -> Result<(), DeliveryError>;
}

/// Outcome of one [`FrameScheduler::run_frame`] call that built a frame.
#[derive(Clone, Debug)]
pub struct FrameReport {
    /// The frame that was built.
    pub frame: Arc<Frame>,
    /// Number of listeners that accepted the frame.
    pub delivered: usize,
    /// Listeners that refused it.
    pub failures: Vec<(ClientId, DeliveryError)>,
}

// ---------------------------------------------------------------------------
// FrameScheduler
// ---------------------------------------------------------------------------

/// Tracks pending changes and builds frames.
pub struct FrameScheduler<L> {
    dirty: DirtyTracker<u32>,
    frame_pending: bool,
    last_frame: u64,
    listeners: Vec<Listener<L>>,
}

impl<L> fmt::Debug for FrameScheduler<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("frame_pending", &self.frame_pending)
            .field("last_frame", &self.last_frame)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<L> Default for FrameScheduler<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> FrameScheduler<L> {
    /// Creates a clean scheduler with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dirty: DirtyTracker::new(),
            frame_pending: false,
            last_frame: 0,
            listeners: Vec::new(),
        }
    }

    /// Returns whether the next [`run_frame`](Self::run_frame) will build a
    /// frame.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.frame_pending
    }

    /// Number of the most recently built frame, or 0 before the first.
    #[must_use]
    pub fn last_frame_number(&self) -> u64 {
        self.last_frame
    }

    /// Requests a frame without attributing the change to a gadget.
    pub fn mark_dirty(&mut self) {
        self.frame_pending = true;
        self.dirty.mark(dirty::FRAME_KEY, dirty::TOPOLOGY);
    }

    /// Records that `gadget` published a new subtree.
    pub fn mark_gadget_dirty(&mut self, gadget: GadgetId) {
        self.frame_pending = true;
        self.dirty.mark(gadget.0, dirty::SUBTREE);
    }

    /// Drops tracking state for a removed gadget and requests a frame.
    pub fn forget_gadget(&mut self, gadget: GadgetId) {
        self.dirty.remove_key(gadget.0);
        self.mark_dirty();
    }

    /// Subscribes a listener for `client`.
    pub fn add_listener(&mut self, client: ClientId, handle: L) {
        self.listeners.push(Listener { client, handle });
    }

    /// Removes every listener owned by `client`, returning how many were
    /// removed.
    pub fn remove_client(&mut self, client: ClientId) -> usize {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.client != client);
        before - self.listeners.len()
    }

    /// Current listeners, in subscription order.
    #[must_use]
    pub fn listeners(&self) -> &[Listener<L>] {
        &self.listeners
    }

    /// Builds and broadcasts a frame if anything is pending.
    ///
    /// Returns `None`, with no side effects, when the scheduler is clean.
    /// Otherwise drains the dirty channels, advances the frame number, and
    /// offers the frame to every listener. A listener that fails does not
    /// stop delivery to the rest.
    pub fn run_frame<P, S>(
        &mut self,
        registry: &GadgetRegistry<P>,
        sink: &mut S,
    ) -> Option<FrameReport>
    where
        P: Processors<FrameListener = L>,
        S: FrameSink<L> + ?Sized,
    {
        if !self.frame_pending {
            return None;
        }
        self.frame_pending = false;

        let changed: Vec<GadgetId> = self
            .dirty
            .drain(dirty::SUBTREE)
            .deterministic()
            .run()
            .map(GadgetId)
            .filter(|&id| registry.find_gadget(id).is_some())
            .collect();
        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        self.last_frame += 1;
        let gadgets = registry
            .gadgets()
            .filter_map(|g| {
                g.shared_subtree().map(|subtree| FrameGadget {
                    id: g.id(),
                    name: g.name().into(),
                    subtree: Arc::clone(subtree),
                })
            })
            .collect();
        let frame = Arc::new(Frame {
            number: self.last_frame,
            gadgets,
            changed,
        });

        let mut delivered = 0;
        let mut failures = Vec::new();
        for listener in &self.listeners {
            match sink.deliver_frame(&listener.handle, &frame) {
                Ok(()) => delivered += 1,
                Err(e) => failures.push((listener.client, e)),
            }
        }

        Some(FrameReport {
            frame,
            delivered,
            failures,
        })
    }
}
