// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interaction events routed between gadgets.
//!
//! Every address in these types is a [`GlobalNodeId`], so an event can name
//! nodes in any gadget's subtree. The [router](crate::router) decodes the
//! gadget component and hands the event to that gadget's processor.

use alloc::string::String;
use alloc::vec::Vec;

use crate::id::GlobalNodeId;

/// Which side of a grab an event is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrabRecipient {
    /// The node doing the grabbing (a hand or controller).
    Grabber,
    /// The node being grabbed.
    Grabbable,
}

/// The kind of a [`GrabEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrabEventType {
    /// A grabber came within range of a grabbable.
    EnterRange,
    /// A grabber left the range of a grabbable.
    LeaveRange,
    /// A grabber asks a grabbable for permission to grab it.
    RequestGrab,
    /// A grabbable answers a [`RequestGrab`](Self::RequestGrab).
    RequestGrabResponse,
    /// The grab is in progress.
    GrabStarted,
    /// The grab ended.
    EndGrab,
    /// A grabbable withdraws from an in-progress grab.
    CancelGrab,
}

impl GrabEventType {
    /// Returns which side the event is delivered to.
    #[must_use]
    pub const fn recipient(self) -> GrabRecipient {
        match self {
            Self::EnterRange
            | Self::LeaveRange
            | Self::RequestGrab
            | Self::GrabStarted
            | Self::EndGrab => GrabRecipient::Grabbable,
            Self::RequestGrabResponse | Self::CancelGrab => GrabRecipient::Grabber,
        }
    }
}

/// A grab interaction between a grabber node and a grabbable node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrabEvent {
    /// What happened.
    pub kind: GrabEventType,
    /// The grabbing node.
    pub grabber: GlobalNodeId,
    /// The grabbed node.
    pub grabbable: GlobalNodeId,
    /// For [`RequestGrabResponse`](GrabEventType::RequestGrabResponse):
    /// whether the grab was allowed. Ignored otherwise.
    pub allowed: bool,
}

impl GrabEvent {
    /// Creates an event with `allowed` cleared.
    #[must_use]
    pub const fn new(kind: GrabEventType, grabber: GlobalNodeId, grabbable: GlobalNodeId) -> Self {
        Self {
            kind,
            grabber,
            grabbable,
            allowed: false,
        }
    }

    /// Returns the node the event is addressed to.
    #[must_use]
    pub const fn target(&self) -> GlobalNodeId {
        match self.kind.recipient() {
            GrabRecipient::Grabber => self.grabber,
            GrabRecipient::Grabbable => self.grabbable,
        }
    }
}

/// One panel near a poker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PokerProximity {
    /// The nearby panel.
    pub panel: GlobalNodeId,
    /// Horizontal position on the panel, in panel UV space.
    pub x: f32,
    /// Vertical position on the panel, in panel UV space.
    pub y: f32,
    /// Distance from the poker to the panel plane, in meters.
    pub distance: f32,
}

/// Grabbables currently intersecting a grabber.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GrabIntersections {
    /// Whether the grab button is held.
    pub grab_pressed: bool,
    /// Intersecting grabbable nodes.
    pub intersections: Vec<GlobalNodeId>,
}

/// The kind of a [`PanelMouseEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PanelEventType {
    /// A poker started hovering the panel.
    Enter,
    /// A poker stopped hovering the panel.
    Leave,
    /// A poker pressed on the panel.
    Down,
    /// A poker released the panel.
    Up,
    /// A hovering poker moved.
    Move,
}

/// Pointer activity on a panel, delivered to the panel's gadget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelMouseEvent {
    /// What happened.
    pub kind: PanelEventType,
    /// The panel node.
    pub panel: GlobalNodeId,
    /// The poker node causing the event.
    pub poker: GlobalNodeId,
    /// Horizontal position in panel UV space.
    pub x: f32,
    /// Vertical position in panel UV space.
    pub y: f32,
}

/// A haptic pulse for the renderer to play on a device node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HapticEvent {
    /// The node whose device should vibrate.
    pub target: GlobalNodeId,
    /// Pulse amplitude, 0 to 1.
    pub amplitude: f32,
    /// Pulse frequency in hertz.
    pub frequency: f32,
    /// Pulse duration in seconds.
    pub duration: f32,
}

/// A new shared texture for one or more gadgets.
///
/// The handle is passed through to frame listeners uninterpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedTextureUpdate {
    /// Names of the gadgets that should display the texture.
    pub gadget_names: Vec<String>,
    /// Opaque platform texture handle.
    pub handle: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::GadgetId;

    #[test]
    fn target_follows_recipient() {
        let grabber = GlobalNodeId::new(GadgetId(1), 4);
        let grabbable = GlobalNodeId::new(GadgetId(2), 9);

        let event = GrabEvent::new(GrabEventType::RequestGrab, grabber, grabbable);
        assert_eq!(event.target(), grabbable);

        let event = GrabEvent::new(GrabEventType::RequestGrabResponse, grabber, grabbable);
        assert_eq!(event.target(), grabber);

        let event = GrabEvent::new(GrabEventType::CancelGrab, grabber, grabbable);
        assert_eq!(event.kind.recipient(), GrabRecipient::Grabber);
    }
}
