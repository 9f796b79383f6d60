// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fire-and-forget delivery on the event-loop thread.
//!
//! [`LocalDispatch`] implements the core delivery seams by spawning each
//! remote call as a task on the loop's `LocalSet`. Handing off never fails
//! synchronously; a remote failure is logged when the task completes and is
//! never retried.

use std::sync::Arc;

use trellis_core::event::{
    GrabEvent, GrabIntersections, HapticEvent, PanelMouseEvent, PokerProximity,
    SharedTextureUpdate,
};
use trellis_core::id::GlobalNodeId;
use trellis_core::router::EventSink;
use trellis_core::scheduler::{DeliveryError, Frame, FrameSink};

use crate::processors::{
    Delivery, FrameListener, GrabbableProcessor, GrabberProcessor, PanelProcessor,
    PokerProcessor, RemoteProcessors,
};

/// Spawns deliveries on the current `LocalSet`.
///
/// Must only be used from inside the event loop.
#[derive(Debug, Default)]
pub(crate) struct LocalDispatch;

impl LocalDispatch {
    fn spawn(what: &'static str, delivery: Delivery) -> Result<(), DeliveryError> {
        tokio::task::spawn_local(async move {
            if let Err(error) = delivery.await {
                tracing::warn!(what, %error, "remote delivery failed");
            }
        });
        Ok(())
    }
}

impl FrameSink<Arc<dyn FrameListener>> for LocalDispatch {
    fn deliver_frame(
        &mut self,
        listener: &Arc<dyn FrameListener>,
        frame: &Arc<Frame>,
    ) -> Result<(), DeliveryError> {
        Self::spawn("frame", listener.new_frame(Arc::clone(frame)))
    }
}

impl EventSink<RemoteProcessors> for LocalDispatch {
    fn grab_event_to_grabber(
        &mut self,
        processor: &Arc<dyn GrabberProcessor>,
        sender: GlobalNodeId,
        event: &GrabEvent,
    ) -> Result<(), DeliveryError> {
        Self::spawn("grab event", processor.grab_event(sender, *event))
    }

    fn grab_event_to_grabbable(
        &mut self,
        processor: &Arc<dyn GrabbableProcessor>,
        sender: GlobalNodeId,
        event: &GrabEvent,
    ) -> Result<(), DeliveryError> {
        Self::spawn("grab event", processor.grab_event(sender, *event))
    }

    fn grab_event_to_listener(
        &mut self,
        listener: &Arc<dyn FrameListener>,
        grabber: GlobalNodeId,
        event: &GrabEvent,
    ) -> Result<(), DeliveryError> {
        Self::spawn("grab broadcast", listener.grab_event(grabber, *event))
    }

    fn poker_proximity(
        &mut self,
        processor: &Arc<dyn PokerProcessor>,
        poker: GlobalNodeId,
        proximities: &[PokerProximity],
    ) -> Result<(), DeliveryError> {
        Self::spawn(
            "poker proximity",
            processor.update_panel_proximity(poker, proximities.to_vec()),
        )
    }

    fn grab_intersections(
        &mut self,
        processor: &Arc<dyn GrabberProcessor>,
        grabber: GlobalNodeId,
        intersections: &GrabIntersections,
    ) -> Result<(), DeliveryError> {
        Self::spawn(
            "grab intersections",
            processor.update_grab_intersections(grabber, intersections.clone()),
        )
    }

    fn panel_event(
        &mut self,
        processor: &Arc<dyn PanelProcessor>,
        event: &PanelMouseEvent,
    ) -> Result<(), DeliveryError> {
        Self::spawn("panel event", processor.mouse_event(*event))
    }

    fn haptic_event(
        &mut self,
        listener: &Arc<dyn FrameListener>,
        event: &HapticEvent,
    ) -> Result<(), DeliveryError> {
        Self::spawn("haptic", listener.haptic_event(*event))
    }

    fn shared_texture(
        &mut self,
        listener: &Arc<dyn FrameListener>,
        update: &SharedTextureUpdate,
    ) -> Result<(), DeliveryError> {
        Self::spawn(
            "shared texture",
            listener.shared_texture_updated(update.clone()),
        )
    }
}
