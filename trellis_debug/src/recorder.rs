// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records, each led by a one-byte tag.
//! [`decode`] reads them back as an iterator of [`RecordedEvent`]. Decoding
//! stops at the first unknown tag, unknown enum code or truncated record.

use trellis_core::id::{ClientId, GadgetId, GlobalNodeId};
use trellis_core::router::RouteKind;
use trellis_core::trace::{
    BroadcastKind, DeliveryFailedEvent, FrameBuiltEvent, GadgetRegisteredEvent,
    GadgetRemovedEvent, RouteFailedEvent, RouteFailure, SubtreePublishedEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_GADGET_REGISTERED: u8 = 1;
const TAG_GADGET_REMOVED: u8 = 2;
const TAG_SUBTREE_PUBLISHED: u8 = 3;
const TAG_FRAME_BUILT: u8 = 4;
const TAG_DELIVERY_FAILED: u8 = 5;
const TAG_ROUTE_FAILED: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_gadget_and_client(&mut self, gadget: GadgetId, client: ClientId) {
        self.write_u32(gadget.0);
        self.write_u32(client.0);
    }
}

fn broadcast_code(kind: BroadcastKind) -> u8 {
    match kind {
        BroadcastKind::Frame => 0,
        BroadcastKind::GrabEvent => 1,
        BroadcastKind::Haptic => 2,
        BroadcastKind::SharedTexture => 3,
    }
}

fn route_kind_code(kind: RouteKind) -> u8 {
    match kind {
        RouteKind::GrabEvent => 0,
        RouteKind::PokerProximity => 1,
        RouteKind::GrabIntersections => 2,
        RouteKind::PanelEvent => 3,
    }
}

fn failure_code(failure: RouteFailure) -> u8 {
    match failure {
        RouteFailure::GadgetNotFound => 0,
        RouteFailure::ProcessorNotFound => 1,
        RouteFailure::Delivery => 2,
    }
}

impl TraceSink for RecorderSink {
    fn on_gadget_registered(&mut self, e: &GadgetRegisteredEvent) {
        self.write_u8(TAG_GADGET_REGISTERED);
        self.write_gadget_and_client(e.gadget, e.client);
    }

    fn on_gadget_removed(&mut self, e: &GadgetRemovedEvent) {
        self.write_u8(TAG_GADGET_REMOVED);
        self.write_gadget_and_client(e.gadget, e.client);
    }

    fn on_subtree_published(&mut self, e: &SubtreePublishedEvent) {
        self.write_u8(TAG_SUBTREE_PUBLISHED);
        self.write_u32(e.gadget.0);
        self.write_u32(e.node_count);
        self.write_u8(u8::from(e.accepted));
    }

    fn on_frame_built(&mut self, e: &FrameBuiltEvent) {
        self.write_u8(TAG_FRAME_BUILT);
        self.write_u64(e.frame_number);
        self.write_u32(e.gadget_count);
        self.write_u32(e.node_count);
        self.write_u32(e.changed_count);
        self.write_u32(e.delivered);
        self.write_u32(e.failed);
    }

    fn on_delivery_failed(&mut self, e: &DeliveryFailedEvent) {
        self.write_u8(TAG_DELIVERY_FAILED);
        self.write_u8(broadcast_code(e.kind));
        self.write_u64(e.frame_number);
        self.write_u32(e.client.0);
    }

    fn on_route_failed(&mut self, e: &RouteFailedEvent) {
        self.write_u8(TAG_ROUTE_FAILED);
        self.write_u8(route_kind_code(e.kind));
        self.write_u64(e.target.0);
        self.write_u8(failure_code(e.failure));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`GadgetRegisteredEvent`].
    GadgetRegistered(GadgetRegisteredEvent),
    /// A [`GadgetRemovedEvent`].
    GadgetRemoved(GadgetRemovedEvent),
    /// A [`SubtreePublishedEvent`].
    SubtreePublished(SubtreePublishedEvent),
    /// A [`FrameBuiltEvent`].
    FrameBuilt(FrameBuiltEvent),
    /// A [`DeliveryFailedEvent`].
    DeliveryFailed(DeliveryFailedEvent),
    /// A [`RouteFailedEvent`].
    RouteFailed(RouteFailedEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_broadcast(&mut self) -> Option<BroadcastKind> {
        Some(match self.read_u8()? {
            0 => BroadcastKind::Frame,
            1 => BroadcastKind::GrabEvent,
            2 => BroadcastKind::Haptic,
            3 => BroadcastKind::SharedTexture,
            _ => return None,
        })
    }

    fn read_route_kind(&mut self) -> Option<RouteKind> {
        Some(match self.read_u8()? {
            0 => RouteKind::GrabEvent,
            1 => RouteKind::PokerProximity,
            2 => RouteKind::GrabIntersections,
            3 => RouteKind::PanelEvent,
            _ => return None,
        })
    }

    fn read_failure(&mut self) -> Option<RouteFailure> {
        Some(match self.read_u8()? {
            0 => RouteFailure::GadgetNotFound,
            1 => RouteFailure::ProcessorNotFound,
            2 => RouteFailure::Delivery,
            _ => return None,
        })
    }

    fn decode_gadget_registered(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::GadgetRegistered(GadgetRegisteredEvent {
            gadget: GadgetId(self.read_u32()?),
            client: ClientId(self.read_u32()?),
        }))
    }

    fn decode_gadget_removed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::GadgetRemoved(GadgetRemovedEvent {
            gadget: GadgetId(self.read_u32()?),
            client: ClientId(self.read_u32()?),
        }))
    }

    fn decode_subtree_published(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SubtreePublished(SubtreePublishedEvent {
            gadget: GadgetId(self.read_u32()?),
            node_count: self.read_u32()?,
            accepted: self.read_u8()? != 0,
        }))
    }

    fn decode_frame_built(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameBuilt(FrameBuiltEvent {
            frame_number: self.read_u64()?,
            gadget_count: self.read_u32()?,
            node_count: self.read_u32()?,
            changed_count: self.read_u32()?,
            delivered: self.read_u32()?,
            failed: self.read_u32()?,
        }))
    }

    fn decode_delivery_failed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DeliveryFailed(DeliveryFailedEvent {
            kind: self.read_broadcast()?,
            frame_number: self.read_u64()?,
            client: ClientId(self.read_u32()?),
        }))
    }

    fn decode_route_failed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RouteFailed(RouteFailedEvent {
            kind: self.read_route_kind()?,
            target: GlobalNodeId(self.read_u64()?),
            failure: self.read_failure()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_GADGET_REGISTERED => self.decode_gadget_registered(),
            TAG_GADGET_REMOVED => self.decode_gadget_removed(),
            TAG_SUBTREE_PUBLISHED => self.decode_subtree_published(),
            TAG_FRAME_BUILT => self.decode_frame_built(),
            TAG_DELIVERY_FAILED => self.decode_delivery_failed(),
            TAG_ROUTE_FAILED => self.decode_route_failed(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
