// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The loop-owned server aggregate.
//!
//! [`ServerState`] bundles the [`GadgetRegistry`], the [`FrameScheduler`]
//! and an optional [`TraceSink`]. Every server command maps to one method;
//! the event loop owns the state and applies commands one at a time.
//!
//! Methods that deliver to remote processors take a sink. The state itself
//! never blocks or retries; failures are traced and returned.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::event::{
    GrabEvent, GrabIntersections, HapticEvent, PanelMouseEvent, PokerProximity,
    SharedTextureUpdate,
};
use crate::id::{ClientId, GadgetId, GlobalNodeId};
use crate::message::SceneGraphMessage;
use crate::registry::{GadgetProcessors, GadgetRegistry, Processors};
use crate::router::{BroadcastReport, EventRouter, EventSink, RouteError, RouteKind};
use crate::scheduler::{FrameReport, FrameScheduler, FrameSink};
use crate::trace::{
    BroadcastKind, DeliveryFailedEvent, FrameBuiltEvent, GadgetRegisteredEvent,
    GadgetRemovedEvent, RouteFailedEvent, SubtreePublishedEvent, TraceSink, Tracer,
};

/// Registry, scheduler and trace hook owned by the event loop.
pub struct ServerState<P: Processors> {
    registry: GadgetRegistry<P>,
    scheduler: FrameScheduler<P::FrameListener>,
    trace: Option<Box<dyn TraceSink>>,
}

impl<P: Processors> fmt::Debug for ServerState<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerState")
            .field("registry", &self.registry)
            .field("scheduler", &self.scheduler)
            .field("traced", &self.trace.is_some())
            .finish()
    }
}

impl<P: Processors> Default for ServerState<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn tracer(trace: &mut Option<Box<dyn TraceSink>>) -> Tracer<'_> {
    match trace {
        Some(sink) => Tracer::new(sink.as_mut()),
        None => Tracer::none(),
    }
}

/// Trace counts saturate at `u32::MAX`.
fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl<P: Processors> ServerState<P> {
    /// Creates an empty state with no trace sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: GadgetRegistry::new(),
            scheduler: FrameScheduler::new(),
            trace: None,
        }
    }

    /// Installs a trace sink, replacing any previous one.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace = Some(sink);
    }

    /// The gadget table.
    #[must_use]
    pub fn registry(&self) -> &GadgetRegistry<P> {
        &self.registry
    }

    /// The frame scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &FrameScheduler<P::FrameListener> {
        &self.scheduler
    }

    fn router(&self) -> EventRouter<'_, P> {
        EventRouter::new(&self.registry, self.scheduler.listeners())
    }

    // -- Gadget lifecycle --

    /// Registers a gadget for `client` and requests a frame.
    pub fn create_gadget(
        &mut self,
        client: ClientId,
        name: impl Into<String>,
        processors: GadgetProcessors<P>,
    ) -> GadgetId {
        let gadget = self.registry.register(client, name, processors);
        self.scheduler.mark_dirty();
        tracer(&mut self.trace).gadget_registered(&GadgetRegisteredEvent { gadget, client });
        gadget
    }

    /// Replaces a gadget's subtree.
    ///
    /// Returns whether the subtree was accepted. Unknown gadgets and
    /// structurally invalid messages are refused; nothing changes and no
    /// frame is requested.
    pub fn update_scene_graph(&mut self, gadget: GadgetId, message: SceneGraphMessage) -> bool {
        let node_count = count(message.node_count());
        let accepted = message.validate().is_ok()
            && self.registry.publish_subtree(gadget, message).is_ok();
        if accepted {
            self.scheduler.mark_gadget_dirty(gadget);
        }
        tracer(&mut self.trace).subtree_published(&SubtreePublishedEvent {
            gadget,
            node_count,
            accepted,
        });
        accepted
    }

    /// Subscribes a frame listener for `client` and requests a frame so the
    /// listener sees the current scene.
    pub fn listen_for_frames(&mut self, client: ClientId, listener: P::FrameListener) {
        self.scheduler.add_listener(client, listener);
        self.scheduler.mark_dirty();
    }

    /// Removes every gadget and listener owned by `client`.
    ///
    /// Returns the removed gadget ids. Global ids naming those gadgets
    /// resolve to not-found from here on.
    pub fn client_disconnected(&mut self, client: ClientId) -> Vec<GadgetId> {
        let removed = self.registry.unregister_client(client);
        for &gadget in &removed {
            self.scheduler.forget_gadget(gadget);
        }
        self.scheduler.remove_client(client);
        self.scheduler.mark_dirty();

        let mut tracer = tracer(&mut self.trace);
        for &gadget in &removed {
            tracer.gadget_removed(&GadgetRemovedEvent { gadget, client });
        }
        removed
    }

    // -- Frames --

    /// Builds and broadcasts a frame if anything changed since the last one.
    pub fn run_frame<S>(&mut self, sink: &mut S) -> Option<FrameReport>
    where
        S: FrameSink<P::FrameListener> + ?Sized,
    {
        let report = self.scheduler.run_frame(&self.registry, sink)?;
        let frame_number = report.frame.number();
        let mut tracer = tracer(&mut self.trace);
        for (client, _) in &report.failures {
            tracer.delivery_failed(&DeliveryFailedEvent {
                kind: BroadcastKind::Frame,
                frame_number,
                client: *client,
            });
        }
        tracer.frame_built(&FrameBuiltEvent {
            frame_number,
            gadget_count: count(report.frame.gadgets().len()),
            node_count: count(report.frame.node_count()),
            changed_count: count(report.frame.changed().len()),
            delivered: count(report.delivered),
            failed: count(report.failures.len()),
        });
        Some(report)
    }

    // -- Addressed events --

    /// Forwards a grab event to the side its kind addresses.
    pub fn push_grab_event<S>(
        &mut self,
        sink: &mut S,
        sender: GlobalNodeId,
        event: &GrabEvent,
    ) -> Result<(), RouteError>
    where
        S: EventSink<P> + ?Sized,
    {
        let result = self.router().proxy_grab_event(sink, sender, event);
        self.trace_route(RouteKind::GrabEvent, event.target(), result)
    }

    /// Forwards a grab event to an explicit target node.
    pub fn send_grab_event_to_global_id<S>(
        &mut self,
        sink: &mut S,
        sender: GlobalNodeId,
        target: GlobalNodeId,
        event: &GrabEvent,
    ) -> Result<(), RouteError>
    where
        S: EventSink<P> + ?Sized,
    {
        let result = self
            .router()
            .send_grab_event_to_global_id(sink, sender, target, event);
        self.trace_route(RouteKind::GrabEvent, target, result)
    }

    /// Forwards proximity updates to the poker's gadget.
    pub fn push_poker_proximity<S>(
        &mut self,
        sink: &mut S,
        poker: GlobalNodeId,
        proximities: &[PokerProximity],
    ) -> Result<(), RouteError>
    where
        S: EventSink<P> + ?Sized,
    {
        let result = self.router().push_poker_proximity(sink, poker, proximities);
        self.trace_route(RouteKind::PokerProximity, poker, result)
    }

    /// Forwards intersection updates to the grabber's gadget.
    pub fn push_grab_intersections<S>(
        &mut self,
        sink: &mut S,
        grabber: GlobalNodeId,
        intersections: &GrabIntersections,
    ) -> Result<(), RouteError>
    where
        S: EventSink<P> + ?Sized,
    {
        let result = self
            .router()
            .push_grab_intersections(sink, grabber, intersections);
        self.trace_route(RouteKind::GrabIntersections, grabber, result)
    }

    /// Forwards a pointer event to the panel's gadget.
    pub fn push_panel_event<S>(
        &mut self,
        sink: &mut S,
        event: &PanelMouseEvent,
    ) -> Result<(), RouteError>
    where
        S: EventSink<P> + ?Sized,
    {
        let result = self.router().push_panel_event(sink, event);
        self.trace_route(RouteKind::PanelEvent, event.panel, result)
    }

    fn trace_route(
        &mut self,
        kind: RouteKind,
        target: GlobalNodeId,
        result: Result<(), RouteError>,
    ) -> Result<(), RouteError> {
        if let Err(e) = &result {
            tracer(&mut self.trace).route_failed(&RouteFailedEvent {
                kind,
                target,
                failure: e.failure(),
            });
        }
        result
    }

    // -- Broadcasts --

    /// Broadcasts a grab event to every frame listener.
    pub fn send_grab_event_to_frame_listeners<S>(
        &mut self,
        sink: &mut S,
        event: &GrabEvent,
        grabber: GlobalNodeId,
    ) -> BroadcastReport
    where
        S: EventSink<P> + ?Sized,
    {
        let report = self
            .router()
            .send_grab_event_to_frame_listeners(sink, event, grabber);
        self.trace_broadcast(BroadcastKind::GrabEvent, report)
    }

    /// Broadcasts a haptic pulse to every frame listener.
    pub fn send_haptic_event<S>(&mut self, sink: &mut S, event: &HapticEvent) -> BroadcastReport
    where
        S: EventSink<P> + ?Sized,
    {
        let report = self.router().send_haptic_event(sink, event);
        self.trace_broadcast(BroadcastKind::Haptic, report)
    }

    /// Broadcasts a shared texture notification to every frame listener.
    pub fn update_shared_texture<S>(
        &mut self,
        sink: &mut S,
        update: &SharedTextureUpdate,
    ) -> BroadcastReport
    where
        S: EventSink<P> + ?Sized,
    {
        let report = self.router().update_shared_texture(sink, update);
        self.trace_broadcast(BroadcastKind::SharedTexture, report)
    }

    fn trace_broadcast(&mut self, kind: BroadcastKind, report: BroadcastReport) -> BroadcastReport {
        let mut tracer = tracer(&mut self.trace);
        for (client, _) in &report.failures {
            tracer.delivery_failed(&DeliveryFailedEvent {
                kind,
                frame_number: 0,
                client: *client,
            });
        }
        report
    }
}
