// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Messages from [`ServerHandle`](crate::ServerHandle) to the event loop.

use tokio::sync::oneshot;
use trellis_core::event::{
    GrabEvent, GrabIntersections, HapticEvent, PanelMouseEvent, PokerProximity,
    SharedTextureUpdate,
};
use trellis_core::id::{ClientId, GadgetId, GlobalNodeId};
use trellis_core::router::{BroadcastReport, RouteError};

use crate::processors::{FrameListener, RemoteGadgetProcessors};

type Reply<T> = oneshot::Sender<T>;

pub(crate) enum Command {
    CreateGadget {
        client: ClientId,
        name: String,
        processors: RemoteGadgetProcessors,
        reply: Reply<GadgetId>,
    },
    /// `bytes` is an encoded scene graph; decoding happens on the loop.
    UpdateSceneGraph {
        gadget: GadgetId,
        bytes: Vec<u8>,
        reply: Reply<bool>,
    },
    ListenForFrames {
        client: ClientId,
        listener: std::sync::Arc<dyn FrameListener>,
        reply: Reply<()>,
    },
    UpdateSharedTexture {
        update: SharedTextureUpdate,
        reply: Reply<BroadcastReport>,
    },
    PushPokerProximity {
        poker: GlobalNodeId,
        proximities: Vec<PokerProximity>,
        reply: Reply<Result<(), RouteError>>,
    },
    PushGrabIntersections {
        grabber: GlobalNodeId,
        intersections: GrabIntersections,
        reply: Reply<Result<(), RouteError>>,
    },
    PushGrabEvent {
        sender: GlobalNodeId,
        event: GrabEvent,
        reply: Reply<Result<(), RouteError>>,
    },
    SendGrabEventToGlobalId {
        sender: GlobalNodeId,
        target: GlobalNodeId,
        event: GrabEvent,
        reply: Reply<Result<(), RouteError>>,
    },
    BroadcastGrabEvent {
        grabber: GlobalNodeId,
        event: GrabEvent,
        reply: Reply<BroadcastReport>,
    },
    PushPanelEvent {
        event: PanelMouseEvent,
        reply: Reply<Result<(), RouteError>>,
    },
    SendHapticEvent {
        event: HapticEvent,
        reply: Reply<BroadcastReport>,
    },
    ClientDisconnected {
        client: ClientId,
        reply: Reply<Vec<GadgetId>>,
    },
    /// Runs a frame now. Replies with the frame number if one was built.
    Tick {
        reply: Reply<Option<u64>>,
    },
    Shutdown,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CreateGadget { .. } => "CreateGadget",
            Self::UpdateSceneGraph { .. } => "UpdateSceneGraph",
            Self::ListenForFrames { .. } => "ListenForFrames",
            Self::UpdateSharedTexture { .. } => "UpdateSharedTexture",
            Self::PushPokerProximity { .. } => "PushPokerProximity",
            Self::PushGrabIntersections { .. } => "PushGrabIntersections",
            Self::PushGrabEvent { .. } => "PushGrabEvent",
            Self::SendGrabEventToGlobalId { .. } => "SendGrabEventToGlobalId",
            Self::BroadcastGrabEvent { .. } => "BroadcastGrabEvent",
            Self::PushPanelEvent { .. } => "PushPanelEvent",
            Self::SendHapticEvent { .. } => "SendHapticEvent",
            Self::ClientDisconnected { .. } => "ClientDisconnected",
            Self::Tick { .. } => "Tick",
            Self::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}
