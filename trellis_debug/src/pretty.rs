// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use trellis_core::trace::{
    BroadcastKind, DeliveryFailedEvent, FrameBuiltEvent, GadgetRegisteredEvent,
    GadgetRemovedEvent, RouteFailedEvent, RouteFailure, SubtreePublishedEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn broadcast_name(kind: BroadcastKind) -> &'static str {
    match kind {
        BroadcastKind::Frame => "frame",
        BroadcastKind::GrabEvent => "grab",
        BroadcastKind::Haptic => "haptic",
        BroadcastKind::SharedTexture => "texture",
    }
}

fn failure_name(failure: RouteFailure) -> &'static str {
    match failure {
        RouteFailure::GadgetNotFound => "gadget-not-found",
        RouteFailure::ProcessorNotFound => "processor-not-found",
        RouteFailure::Delivery => "delivery",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_gadget_registered(&mut self, e: &GadgetRegisteredEvent) {
        let _ = writeln!(
            self.writer,
            "[gadget:add] gadget={} client={}",
            e.gadget.0, e.client.0,
        );
    }

    fn on_gadget_removed(&mut self, e: &GadgetRemovedEvent) {
        let _ = writeln!(
            self.writer,
            "[gadget:remove] gadget={} client={}",
            e.gadget.0, e.client.0,
        );
    }

    fn on_subtree_published(&mut self, e: &SubtreePublishedEvent) {
        let verdict = if e.accepted { "ok" } else { "REFUSED" };
        let _ = writeln!(
            self.writer,
            "[publish] gadget={} nodes={} {verdict}",
            e.gadget.0, e.node_count,
        );
    }

    fn on_frame_built(&mut self, e: &FrameBuiltEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] frame={} gadgets={} nodes={} changed={} delivered={} failed={}",
            e.frame_number, e.gadget_count, e.node_count, e.changed_count, e.delivered, e.failed,
        );
    }

    fn on_delivery_failed(&mut self, e: &DeliveryFailedEvent) {
        let _ = writeln!(
            self.writer,
            "[delivery:fail] {} frame={} client={}",
            broadcast_name(e.kind),
            e.frame_number,
            e.client.0,
        );
    }

    fn on_route_failed(&mut self, e: &RouteFailedEvent) {
        let (gadget, node) = e.target.unpack();
        let _ = writeln!(
            self.writer,
            "[route:fail] {:?} target={}:{node} reason={}",
            e.kind,
            gadget.0,
            failure_name(e.failure),
        );
    }
}
