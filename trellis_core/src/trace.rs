// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the server.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! [`ServerState`](crate::state::ServerState) calls as gadgets come and go,
//! subtrees are published, frames are built and deliveries fail. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! All events are small `Copy` structs so sinks can buffer or encode them
//! without allocating.

use crate::id::{ClientId, GadgetId, GlobalNodeId};
use crate::router::RouteKind;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What a failed broadcast was carrying.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BroadcastKind {
    /// A merged frame.
    Frame,
    /// A grab event sent to every listener.
    GrabEvent,
    /// A haptic pulse.
    Haptic,
    /// A shared texture notification.
    SharedTexture,
}

/// Why an addressed event could not be delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteFailure {
    /// The target's gadget is not registered.
    GadgetNotFound,
    /// The gadget has no processor of the needed kind.
    ProcessorNotFound,
    /// The processor was found but delivery failed.
    Delivery,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a gadget is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GadgetRegisteredEvent {
    /// The new gadget.
    pub gadget: GadgetId,
    /// Its owning client.
    pub client: ClientId,
}

/// Emitted when a gadget is destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GadgetRemovedEvent {
    /// The removed gadget.
    pub gadget: GadgetId,
    /// Its owning client.
    pub client: ClientId,
}

/// Emitted for every scene-graph publish attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubtreePublishedEvent {
    /// The publishing gadget.
    pub gadget: GadgetId,
    /// Number of nodes in the submitted subtree.
    pub node_count: u32,
    /// Whether the subtree was stored.
    pub accepted: bool,
}

/// Emitted after a frame is assembled and broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameBuiltEvent {
    /// Frame number.
    pub frame_number: u64,
    /// Gadgets with a published subtree.
    pub gadget_count: u32,
    /// Total nodes across all subtrees.
    pub node_count: u32,
    /// Gadgets that published since the previous frame.
    pub changed_count: u32,
    /// Listeners the frame was handed to.
    pub delivered: u32,
    /// Listeners that refused the frame.
    pub failed: u32,
}

/// Emitted once per listener that refused a broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryFailedEvent {
    /// What was being broadcast.
    pub kind: BroadcastKind,
    /// The frame number, for [`BroadcastKind::Frame`]; 0 otherwise.
    pub frame_number: u64,
    /// The listener's client.
    pub client: ClientId,
}

/// Emitted when an addressed event could not be routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteFailedEvent {
    /// What was being routed.
    pub kind: RouteKind,
    /// The node the event was addressed to.
    pub target: GlobalNodeId,
    /// Why it failed.
    pub failure: RouteFailure,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the server.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a gadget is created.
    fn on_gadget_registered(&mut self, e: &GadgetRegisteredEvent) {
        _ = e;
    }

    /// Called when a gadget is destroyed.
    fn on_gadget_removed(&mut self, e: &GadgetRemovedEvent) {
        _ = e;
    }

    /// Called for every publish attempt.
    fn on_subtree_published(&mut self, e: &SubtreePublishedEvent) {
        _ = e;
    }

    /// Called after a frame is built.
    fn on_frame_built(&mut self, e: &FrameBuiltEvent) {
        _ = e;
    }

    /// Called when a listener refuses a broadcast.
    fn on_delivery_failed(&mut self, e: &DeliveryFailedEvent) {
        _ = e;
    }

    /// Called when an addressed event cannot be routed.
    fn on_route_failed(&mut self, e: &RouteFailedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`GadgetRegisteredEvent`].
    #[inline]
    pub fn gadget_registered(&mut self, e: &GadgetRegisteredEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_gadget_registered(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`GadgetRemovedEvent`].
    #[inline]
    pub fn gadget_removed(&mut self, e: &GadgetRemovedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_gadget_removed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SubtreePublishedEvent`].
    #[inline]
    pub fn subtree_published(&mut self, e: &SubtreePublishedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_subtree_published(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameBuiltEvent`].
    #[inline]
    pub fn frame_built(&mut self, e: &FrameBuiltEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_built(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DeliveryFailedEvent`].
    #[inline]
    pub fn delivery_failed(&mut self, e: &DeliveryFailedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_delivery_failed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RouteFailedEvent`].
    #[inline]
    pub fn route_failed(&mut self, e: &RouteFailedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_route_failed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> FrameBuiltEvent {
        FrameBuiltEvent {
            frame_number: 42,
            gadget_count: 2,
            node_count: 9,
            changed_count: 1,
            delivered: 3,
            failed: 0,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_frame_built(&sample_frame());
        sink.on_route_failed(&RouteFailedEvent {
            kind: RouteKind::GrabEvent,
            target: GlobalNodeId::NONE,
            failure: RouteFailure::GadgetNotFound,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.frame_built(&sample_frame());
        tracer.gadget_registered(&GadgetRegisteredEvent {
            gadget: GadgetId(1),
            client: ClientId(1),
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            frames: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_frame_built(&mut self, e: &FrameBuiltEvent) {
                self.frames.push(e.frame_number);
            }
        }

        let mut sink = RecordingSink { frames: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.frame_built(&sample_frame());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.frames, &[42]);
    }
}
