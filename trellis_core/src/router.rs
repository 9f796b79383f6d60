// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event routing between gadgets.
//!
//! An [`EventRouter`] borrows the registry and the listener list for the
//! duration of one command. Addressed events decode the target
//! [`GlobalNodeId`], find the owning gadget's processor of the right kind
//! and hand the event to an [`EventSink`]. Broadcasts go to every frame
//! listener regardless of gadget boundaries.
//!
//! Routing failures are returned to the caller as [`RouteError`]; broadcast
//! failures are collected per listener in a [`BroadcastReport`]. Nothing is
//! retried.

use alloc::vec::Vec;

use crate::event::{
    GrabEvent, GrabIntersections, GrabRecipient, HapticEvent, PanelMouseEvent, PokerProximity,
    SharedTextureUpdate,
};
use crate::id::{ClientId, GadgetId, GlobalNodeId};
use crate::registry::{Gadget, GadgetRegistry, Processors};
use crate::scheduler::{DeliveryError, Listener};
use crate::trace::RouteFailure;

/// Which kind of addressed event was being routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteKind {
    /// A [`GrabEvent`].
    GrabEvent,
    /// A poker proximity update.
    PokerProximity,
    /// A grab intersection update.
    GrabIntersections,
    /// A [`PanelMouseEvent`].
    PanelEvent,
}

/// Errors from addressed routing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The target's gadget is not registered.
    #[error("gadget {0:?} is not registered")]
    GadgetNotFound(GadgetId),
    /// The gadget has not registered a processor of the needed kind.
    #[error("gadget {0:?} has no processor for this event")]
    ProcessorNotFound(GadgetId),
    /// The processor refused the event.
    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

impl RouteError {
    /// Returns the compact failure class used in trace events.
    #[must_use]
    pub fn failure(&self) -> RouteFailure {
        match self {
            Self::GadgetNotFound(_) => RouteFailure::GadgetNotFound,
            Self::ProcessorNotFound(_) => RouteFailure::ProcessorNotFound,
            Self::Delivery(_) => RouteFailure::Delivery,
        }
    }
}

/// Outcome of a broadcast to frame listeners.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Listeners that accepted the message.
    pub delivered: usize,
    /// Listeners that refused it.
    pub failures: Vec<(ClientId, DeliveryError)>,
}

/// Hands routed events to processors and listeners.
pub trait EventSink<P: Processors> {
    /// Delivers a grab event to a grabber processor.
    fn grab_event_to_grabber(
        &mut self,
        processor: &P::Grabber,
        sender: GlobalNodeId,
        event: &GrabEvent,
    ) -> Result<(), DeliveryError>;

    /// Delivers a grab event to a grabbable processor.
    fn grab_event_to_grabbable(
        &mut self,
        processor: &P::Grabbable,
        sender: GlobalNodeId,
        event: &GrabEvent,
    ) -> Result<(), DeliveryError>;

    /// Delivers a grab event to a frame listener.
    fn grab_event_to_listener(
        &mut self,
        listener: &P::FrameListener,
        grabber: GlobalNodeId,
        event: &GrabEvent,
    ) -> Result<(), DeliveryError>;

    /// Delivers proximity updates to a poker processor.
    fn poker_proximity(
        &mut self,
        processor: &P::Poker,
        poker: GlobalNodeId,
        proximities: &[PokerProximity],
    ) -> Result<(), DeliveryError>;

    /// Delivers intersection updates to a grabber processor.
    fn grab_intersections(
        &mut self,
        processor: &P::Grabber,
        grabber: GlobalNodeId,
        intersections: &GrabIntersections,
    ) -> Result<(), DeliveryError>;

    /// Delivers a pointer event to a panel processor.
    fn panel_event(
        &mut self,
        processor: &P::Panel,
        event: &PanelMouseEvent,
    ) -> Result<(), DeliveryError>;

    /// Delivers a haptic pulse to a frame listener.
    fn haptic_event(
        &mut self,
        listener: &P::FrameListener,
        event: &HapticEvent,
    ) -> Result<(), DeliveryError>;

    /// Delivers a shared texture notification to a frame listener.
    fn shared_texture(
        &mut self,
        listener: &P::FrameListener,
        update: &SharedTextureUpdate,
    ) -> Result<(), DeliveryError>;
}

/// Routes events using a borrowed registry and listener list.
pub struct EventRouter<'a, P: Processors> {
    registry: &'a GadgetRegistry<P>,
    listeners: &'a [Listener<P::FrameListener>],
}

impl<P: Processors> core::fmt::Debug for EventRouter<'_, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventRouter")
            .field("gadgets", &self.registry.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<'a, P: Processors> EventRouter<'a, P> {
    /// Creates a router over the given registry and listeners.
    #[must_use]
    pub fn new(
        registry: &'a GadgetRegistry<P>,
        listeners: &'a [Listener<P::FrameListener>],
    ) -> Self {
        Self {
            registry,
            listeners,
        }
    }

    fn gadget_of(&self, id: GlobalNodeId) -> Result<&'a Gadget<P>, RouteError> {
        let gadget = id.gadget();
        self.registry
            .find_gadget(gadget)
            .ok_or(RouteError::GadgetNotFound(gadget))
    }

    /// Sends a grab event to the gadget that owns `target`.
    ///
    /// The grabber or grabbable processor is chosen by the event kind's
    /// [recipient](crate::event::GrabEventType::recipient). `sender` is passed
    /// through unchanged.
    pub fn send_grab_event_to_global_id<S: EventSink<P> + ?Sized>(
        &self,
        sink: &mut S,
        sender: GlobalNodeId,
        target: GlobalNodeId,
        event: &GrabEvent,
    ) -> Result<(), RouteError> {
        let gadget = self.gadget_of(target)?;
        let missing = RouteError::ProcessorNotFound(gadget.id());
        let processors = gadget.processors();
        match event.kind.recipient() {
            GrabRecipient::Grabber => {
                let processor = processors.grabber.as_ref().ok_or(missing)?;
                sink.grab_event_to_grabber(processor, sender, event)?;
            }
            GrabRecipient::Grabbable => {
                let processor = processors.grabbable.as_ref().ok_or(missing)?;
                sink.grab_event_to_grabbable(processor, sender, event)?;
            }
        }
        Ok(())
    }

    /// Sends a grab event to whichever side its kind addresses.
    pub fn proxy_grab_event<S: EventSink<P> + ?Sized>(
        &self,
        sink: &mut S,
        sender: GlobalNodeId,
        event: &GrabEvent,
    ) -> Result<(), RouteError> {
        self.send_grab_event_to_global_id(sink, sender, event.target(), event)
    }

    /// Broadcasts a grab event to every frame listener.
    pub fn send_grab_event_to_frame_listeners<S: EventSink<P> + ?Sized>(
        &self,
        sink: &mut S,
        event: &GrabEvent,
        grabber: GlobalNodeId,
    ) -> BroadcastReport {
        self.broadcast(|l| sink.grab_event_to_listener(l, grabber, event))
    }

    /// Forwards proximity updates to the poker's gadget.
    pub fn push_poker_proximity<S: EventSink<P> + ?Sized>(
        &self,
        sink: &mut S,
        poker: GlobalNodeId,
        proximities: &[PokerProximity],
    ) -> Result<(), RouteError> {
        let gadget = self.gadget_of(poker)?;
        let processor = gadget
            .processors()
            .poker
            .as_ref()
            .ok_or(RouteError::ProcessorNotFound(gadget.id()))?;
        sink.poker_proximity(processor, poker, proximities)?;
        Ok(())
    }

    /// Forwards intersection updates to the grabber's gadget.
    pub fn push_grab_intersections<S: EventSink<P> + ?Sized>(
        &self,
        sink: &mut S,
        grabber: GlobalNodeId,
        intersections: &GrabIntersections,
    ) -> Result<(), RouteError> {
        let gadget = self.gadget_of(grabber)?;
        let processor = gadget
            .processors()
            .grabber
            .as_ref()
            .ok_or(RouteError::ProcessorNotFound(gadget.id()))?;
        sink.grab_intersections(processor, grabber, intersections)?;
        Ok(())
    }

    /// Forwards a pointer event to the panel's gadget.
    pub fn push_panel_event<S: EventSink<P> + ?Sized>(
        &self,
        sink: &mut S,
        event: &PanelMouseEvent,
    ) -> Result<(), RouteError> {
        let gadget = self.gadget_of(event.panel)?;
        let processor = gadget
            .processors()
            .panel
            .as_ref()
            .ok_or(RouteError::ProcessorNotFound(gadget.id()))?;
        sink.panel_event(processor, event)?;
        Ok(())
    }

    /// Broadcasts a haptic pulse to every frame listener.
    pub fn send_haptic_event<S: EventSink<P> + ?Sized>(
        &self,
        sink: &mut S,
        event: &HapticEvent,
    ) -> BroadcastReport {
        self.broadcast(|l| sink.haptic_event(l, event))
    }

    /// Broadcasts a shared texture notification to every frame listener.
    pub fn update_shared_texture<S: EventSink<P> + ?Sized>(
        &self,
        sink: &mut S,
        update: &SharedTextureUpdate,
    ) -> BroadcastReport {
        self.broadcast(|l| sink.shared_texture(l, update))
    }

    fn broadcast(
        &self,
        mut deliver: impl FnMut(&P::FrameListener) -> Result<(), DeliveryError>,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for listener in self.listeners {
            match deliver(&listener.handle) {
                Ok(()) => report.delivered += 1,
                Err(e) => report.failures.push((listener.client, e)),
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::*;
    use crate::event::{GrabEventType, PanelEventType};
    use crate::id::ClientId;
    use crate::registry::GadgetProcessors;
    use crate::registry::tests::Labels;

    /// Records `"<processor>:<what>"` for every delivery. Processors and
    /// listeners labelled `"broken"` fail.
    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl Recorder {
        fn record(&mut self, to: &str, what: &str) -> Result<(), DeliveryError> {
            if to == "broken" {
                return Err(DeliveryError::Rejected);
            }
            self.log.push(alloc::format!("{to}:{what}"));
            Ok(())
        }
    }

    impl EventSink<Labels> for Recorder {
        fn grab_event_to_grabber(
            &mut self,
            processor: &&'static str,
            _sender: GlobalNodeId,
            event: &GrabEvent,
        ) -> Result<(), DeliveryError> {
            self.record(processor, &alloc::format!("{:?}", event.kind))
        }

        fn grab_event_to_grabbable(
            &mut self,
            processor: &&'static str,
            _sender: GlobalNodeId,
            event: &GrabEvent,
        ) -> Result<(), DeliveryError> {
            self.record(processor, &alloc::format!("{:?}", event.kind))
        }

        fn grab_event_to_listener(
            &mut self,
            listener: &&'static str,
            _grabber: GlobalNodeId,
            event: &GrabEvent,
        ) -> Result<(), DeliveryError> {
            self.record(listener, &alloc::format!("{:?}", event.kind))
        }

        fn poker_proximity(
            &mut self,
            processor: &&'static str,
            _poker: GlobalNodeId,
            proximities: &[PokerProximity],
        ) -> Result<(), DeliveryError> {
            self.record(processor, &alloc::format!("proximity x{}", proximities.len()))
        }

        fn grab_intersections(
            &mut self,
            processor: &&'static str,
            _grabber: GlobalNodeId,
            intersections: &GrabIntersections,
        ) -> Result<(), DeliveryError> {
            let what = alloc::format!("intersections x{}", intersections.intersections.len());
            self.record(processor, &what)
        }

        fn panel_event(
            &mut self,
            processor: &&'static str,
            event: &PanelMouseEvent,
        ) -> Result<(), DeliveryError> {
            self.record(processor, &alloc::format!("{:?}", event.kind))
        }

        fn haptic_event(
            &mut self,
            listener: &&'static str,
            _event: &HapticEvent,
        ) -> Result<(), DeliveryError> {
            self.record(listener, "haptic")
        }

        fn shared_texture(
            &mut self,
            listener: &&'static str,
            update: &SharedTextureUpdate,
        ) -> Result<(), DeliveryError> {
            self.record(listener, &alloc::format!("texture {}", update.handle))
        }
    }

    struct World {
        registry: GadgetRegistry<Labels>,
        listeners: Vec<Listener<&'static str>>,
        hand: GadgetId,
        cube: GadgetId,
    }

    fn world() -> World {
        let mut registry = GadgetRegistry::new();
        let hand = registry.register(
            ClientId(1),
            "hand",
            GadgetProcessors {
                grabber: Some("hand-grabber"),
                poker: Some("hand-poker"),
                ..GadgetProcessors::default()
            },
        );
        let cube = registry.register(
            ClientId(2),
            "cube",
            GadgetProcessors {
                grabbable: Some("cube-grabbable"),
                panel: Some("cube-panel"),
                ..GadgetProcessors::default()
            },
        );
        let listeners = vec![
            Listener {
                client: ClientId(7),
                handle: "renderer",
            },
            Listener {
                client: ClientId(8),
                handle: "broken",
            },
            Listener {
                client: ClientId(9),
                handle: "mirror",
            },
        ];
        World {
            registry,
            listeners,
            hand,
            cube,
        }
    }

    #[test]
    fn proxy_picks_side_by_kind() {
        let w = world();
        let router = EventRouter::new(&w.registry, &w.listeners);
        let mut sink = Recorder::default();
        let grabber = GlobalNodeId::new(w.hand, 3);
        let grabbable = GlobalNodeId::new(w.cube, 5);

        let request = GrabEvent::new(GrabEventType::RequestGrab, grabber, grabbable);
        router.proxy_grab_event(&mut sink, grabber, &request).unwrap();

        let mut response = GrabEvent::new(GrabEventType::RequestGrabResponse, grabber, grabbable);
        response.allowed = true;
        router.proxy_grab_event(&mut sink, grabbable, &response).unwrap();

        assert_eq!(
            sink.log,
            [
                "cube-grabbable:RequestGrab",
                "hand-grabber:RequestGrabResponse"
            ]
        );
    }

    #[test]
    fn missing_processor_is_reported() {
        let w = world();
        let router = EventRouter::new(&w.registry, &w.listeners);
        let mut sink = Recorder::default();
        // The hand has no grabbable processor.
        let event = GrabEvent::new(
            GrabEventType::EnterRange,
            GlobalNodeId::new(w.cube, 1),
            GlobalNodeId::new(w.hand, 1),
        );
        let err = router
            .proxy_grab_event(&mut sink, GlobalNodeId::NONE, &event)
            .unwrap_err();
        assert_eq!(err, RouteError::ProcessorNotFound(w.hand));
        assert_eq!(err.failure(), RouteFailure::ProcessorNotFound);
        assert!(sink.log.is_empty());
    }

    #[test]
    fn disconnected_gadget_is_not_found() {
        let mut w = world();
        w.registry.unregister_client(ClientId(2));
        let router = EventRouter::new(&w.registry, &w.listeners);
        let mut sink = Recorder::default();

        for node in [0, 1, 5, u32::MAX] {
            let target = GlobalNodeId::new(w.cube, node);
            let event = GrabEvent::new(GrabEventType::EnterRange, GlobalNodeId::NONE, target);
            assert_eq!(
                router.proxy_grab_event(&mut sink, GlobalNodeId::NONE, &event),
                Err(RouteError::GadgetNotFound(w.cube))
            );
            let panel_event = PanelMouseEvent {
                kind: PanelEventType::Down,
                panel: target,
                poker: GlobalNodeId::new(w.hand, 1),
                x: 0.5,
                y: 0.5,
            };
            assert_eq!(
                router.push_panel_event(&mut sink, &panel_event),
                Err(RouteError::GadgetNotFound(w.cube))
            );
            assert!(w.registry.resolve_node(target).is_none());
        }
        assert!(sink.log.is_empty());
    }

    #[test]
    fn addressed_updates_reach_their_processors() {
        let w = world();
        let router = EventRouter::new(&w.registry, &w.listeners);
        let mut sink = Recorder::default();
        let finger = GlobalNodeId::new(w.hand, 2);
        let panel = GlobalNodeId::new(w.cube, 4);

        router
            .push_poker_proximity(
                &mut sink,
                finger,
                &[PokerProximity {
                    panel,
                    x: 0.1,
                    y: 0.2,
                    distance: 0.01,
                }],
            )
            .unwrap();
        router
            .push_grab_intersections(
                &mut sink,
                finger,
                &GrabIntersections {
                    grab_pressed: true,
                    intersections: vec![panel],
                },
            )
            .unwrap();
        router
            .push_panel_event(
                &mut sink,
                &PanelMouseEvent {
                    kind: PanelEventType::Enter,
                    panel,
                    poker: finger,
                    x: 0.1,
                    y: 0.2,
                },
            )
            .unwrap();

        assert_eq!(
            sink.log,
            [
                "hand-poker:proximity x1",
                "hand-grabber:intersections x1",
                "cube-panel:Enter"
            ]
        );
    }

    #[test]
    fn broadcasts_reach_every_listener_best_effort() {
        let w = world();
        let router = EventRouter::new(&w.registry, &w.listeners);
        let mut sink = Recorder::default();

        let report = router.send_haptic_event(
            &mut sink,
            &HapticEvent {
                target: GlobalNodeId::new(w.hand, 1),
                amplitude: 1.0,
                frequency: 200.0,
                duration: 0.05,
            },
        );
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failures, [(ClientId(8), DeliveryError::Rejected)]);

        let report = router.update_shared_texture(
            &mut sink,
            &SharedTextureUpdate {
                gadget_names: vec!["cube".into()],
                handle: 77,
            },
        );
        assert_eq!(report.delivered, 2);

        let event = GrabEvent::new(
            GrabEventType::EndGrab,
            GlobalNodeId::new(w.hand, 1),
            GlobalNodeId::new(w.cube, 1),
        );
        router.send_grab_event_to_frame_listeners(&mut sink, &event, event.grabber);

        assert_eq!(
            sink.log,
            [
                "renderer:haptic",
                "mirror:haptic",
                "renderer:texture 77",
                "mirror:texture 77",
                "renderer:EndGrab",
                "mirror:EndGrab"
            ]
        );
    }

    #[test]
    fn delivery_failure_maps_to_route_error() {
        let mut registry = GadgetRegistry::<Labels>::new();
        let g = registry.register(
            ClientId(1),
            "g",
            GadgetProcessors {
                panel: Some("broken"),
                ..GadgetProcessors::default()
            },
        );
        let router = EventRouter::new(&registry, &[]);
        let mut sink = Recorder::default();
        let err = router
            .push_panel_event(
                &mut sink,
                &PanelMouseEvent {
                    kind: PanelEventType::Move,
                    panel: GlobalNodeId::new(g, 1),
                    poker: GlobalNodeId::NONE,
                    x: 0.0,
                    y: 0.0,
                },
            )
            .unwrap_err();
        assert_eq!(err, RouteError::Delivery(DeliveryError::Rejected));
        assert_eq!(err.failure(), RouteFailure::Delivery);
    }
}
