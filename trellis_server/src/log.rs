// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bridges core trace events into `tracing`.

use trellis_core::trace::{
    DeliveryFailedEvent, FrameBuiltEvent, GadgetRegisteredEvent, GadgetRemovedEvent,
    RouteFailedEvent, SubtreePublishedEvent, TraceSink,
};

/// Forwards every core trace event to the `tracing` subscriber.
///
/// Lifecycle and failures log at `info`/`warn`; per-frame events log at
/// `trace` so a normal subscriber is not flooded.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn on_gadget_registered(&mut self, e: &GadgetRegisteredEvent) {
        tracing::info!(gadget = e.gadget.0, client = e.client.0, "gadget registered");
    }

    fn on_gadget_removed(&mut self, e: &GadgetRemovedEvent) {
        tracing::info!(gadget = e.gadget.0, client = e.client.0, "gadget removed");
    }

    fn on_subtree_published(&mut self, e: &SubtreePublishedEvent) {
        if e.accepted {
            tracing::debug!(gadget = e.gadget.0, nodes = e.node_count, "subtree published");
        } else {
            tracing::warn!(gadget = e.gadget.0, nodes = e.node_count, "subtree refused");
        }
    }

    fn on_frame_built(&mut self, e: &FrameBuiltEvent) {
        tracing::trace!(
            frame = e.frame_number,
            gadgets = e.gadget_count,
            nodes = e.node_count,
            changed = e.changed_count,
            delivered = e.delivered,
            failed = e.failed,
            "frame built"
        );
    }

    fn on_delivery_failed(&mut self, e: &DeliveryFailedEvent) {
        tracing::warn!(
            kind = ?e.kind,
            frame = e.frame_number,
            client = e.client.0,
            "delivery to listener failed"
        );
    }

    fn on_route_failed(&mut self, e: &RouteFailedEvent) {
        let (gadget, node) = e.target.unpack();
        tracing::warn!(
            kind = ?e.kind,
            gadget = gadget.0,
            node,
            failure = ?e.failure,
            "event could not be routed"
        );
    }
}
