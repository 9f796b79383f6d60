// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Remote processor interfaces.
//!
//! Each trait is the server's view of a capability living in another
//! process. Methods return a boxed future that resolves once the remote end
//! has taken the message; the event loop spawns it as a local task and logs
//! a failure instead of waiting on it.
//!
//! Handles are shared as `Arc<dyn Trait>` so they can be created on any
//! thread and moved into the loop with a command.

use std::sync::Arc;

use futures::future::BoxFuture;
use trellis_core::event::{
    GrabEvent, GrabIntersections, HapticEvent, PanelMouseEvent, PokerProximity,
    SharedTextureUpdate,
};
use trellis_core::id::GlobalNodeId;
use trellis_core::registry::{GadgetProcessors, Processors};
use trellis_core::scheduler::{DeliveryError, Frame};

/// Result future returned by every processor method.
pub type Delivery = BoxFuture<'static, Result<(), DeliveryError>>;

/// Receives proximity updates for a gadget's pokers.
pub trait PokerProcessor: Send + Sync {
    /// Panels near `poker` changed.
    fn update_panel_proximity(&self, poker: GlobalNodeId, proximities: Vec<PokerProximity>)
    -> Delivery;
}

/// Receives pointer events for a gadget's panels.
pub trait PanelProcessor: Send + Sync {
    /// A poker interacted with one of the gadget's panels.
    fn mouse_event(&self, event: PanelMouseEvent) -> Delivery;
}

/// Receives events for a gadget's grabbers.
pub trait GrabberProcessor: Send + Sync {
    /// Grabbables intersecting `grabber` changed.
    fn update_grab_intersections(
        &self,
        grabber: GlobalNodeId,
        intersections: GrabIntersections,
    ) -> Delivery;

    /// A grab event addressed to the grabber side.
    fn grab_event(&self, sender: GlobalNodeId, event: GrabEvent) -> Delivery;
}

/// Receives events for a gadget's grabbables.
pub trait GrabbableProcessor: Send + Sync {
    /// A grab event addressed to the grabbable side.
    fn grab_event(&self, sender: GlobalNodeId, event: GrabEvent) -> Delivery;
}

/// A renderer subscribed to merged frames and broadcasts.
pub trait FrameListener: Send + Sync {
    /// A new frame was built.
    fn new_frame(&self, frame: Arc<Frame>) -> Delivery;

    /// A grab event was broadcast.
    fn grab_event(&self, grabber: GlobalNodeId, event: GrabEvent) -> Delivery;

    /// A haptic pulse should be played.
    fn haptic_event(&self, event: HapticEvent) -> Delivery;

    /// Gadgets received a new shared texture.
    fn shared_texture_updated(&self, update: SharedTextureUpdate) -> Delivery;
}

/// Binds the core registry to the remote processor traits.
#[derive(Debug)]
pub enum RemoteProcessors {}

impl Processors for RemoteProcessors {
    type Poker = Arc<dyn PokerProcessor>;
    type Panel = Arc<dyn PanelProcessor>;
    type Grabber = Arc<dyn GrabberProcessor>;
    type Grabbable = Arc<dyn GrabbableProcessor>;
    type FrameListener = Arc<dyn FrameListener>;
}

/// Processor handles for one gadget, as passed to
/// [`ServerHandle::create_gadget`](crate::ServerHandle::create_gadget).
pub type RemoteGadgetProcessors = GadgetProcessors<RemoteProcessors>;
