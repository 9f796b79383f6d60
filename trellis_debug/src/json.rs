// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON exporter for recorded events.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes a JSON array with one object per event. Each object carries an
//! `"event"` name plus the event's fields; global node ids are split into
//! `gadget` and `node`.

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as a JSON array.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).map(|e| to_json(&e)).collect();
    serde_json::to_writer(&mut *writer, &events).map_err(io::Error::other)?;
    writer.flush()
}

fn to_json(recorded: &RecordedEvent) -> Value {
    match recorded {
        RecordedEvent::GadgetRegistered(e) => json!({
            "event": "GadgetRegistered",
            "gadget": e.gadget.0,
            "client": e.client.0,
        }),
        RecordedEvent::GadgetRemoved(e) => json!({
            "event": "GadgetRemoved",
            "gadget": e.gadget.0,
            "client": e.client.0,
        }),
        RecordedEvent::SubtreePublished(e) => json!({
            "event": "SubtreePublished",
            "gadget": e.gadget.0,
            "node_count": e.node_count,
            "accepted": e.accepted,
        }),
        RecordedEvent::FrameBuilt(e) => json!({
            "event": "FrameBuilt",
            "frame": e.frame_number,
            "gadgets": e.gadget_count,
            "nodes": e.node_count,
            "changed": e.changed_count,
            "delivered": e.delivered,
            "failed": e.failed,
        }),
        RecordedEvent::DeliveryFailed(e) => json!({
            "event": "DeliveryFailed",
            "kind": format!("{:?}", e.kind),
            "frame": e.frame_number,
            "client": e.client.0,
        }),
        RecordedEvent::RouteFailed(e) => json!({
            "event": "RouteFailed",
            "kind": format!("{:?}", e.kind),
            "target": {
                "gadget": e.target.gadget().0,
                "node": e.target.node(),
            },
            "failure": format!("{:?}", e.failure),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use trellis_core::id::{ClientId, GadgetId, GlobalNodeId};
    use trellis_core::router::RouteKind;
    use trellis_core::trace::{
        FrameBuiltEvent, GadgetRegisteredEvent, RouteFailedEvent, RouteFailure, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_gadget_registered(&GadgetRegisteredEvent {
            gadget: GadgetId(1),
            client: ClientId(4),
        });
        rec.on_frame_built(&FrameBuiltEvent {
            frame_number: 3,
            gadget_count: 1,
            node_count: 2,
            changed_count: 1,
            delivered: 1,
            failed: 0,
        });
        rec.on_route_failed(&RouteFailedEvent {
            kind: RouteKind::GrabEvent,
            target: GlobalNodeId::new(GadgetId(7), 5),
            failure: RouteFailure::GadgetNotFound,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        let arr = parsed.as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr[0]["event"], "GadgetRegistered");
        assert_eq!(arr[1]["frame"], 3);
        assert_eq!(arr[2]["target"]["gadget"], 7);
        assert_eq!(arr[2]["target"]["node"], 5);
        assert_eq!(arr[2]["failure"], "GadgetNotFound");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        assert_eq!(out, b"[]");
    }
}
