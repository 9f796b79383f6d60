// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end tests driving a real server thread.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use trellis_core::event::{
    GrabEvent, HapticEvent, PanelEventType, PanelMouseEvent, SharedTextureUpdate,
};
use trellis_core::id::{ClientId, GadgetId, GlobalNodeId};
use trellis_core::node::NodeType;
use trellis_core::router::RouteError;
use trellis_core::scheduler::{DeliveryError, Frame};
use trellis_core::session::Session;
use trellis_server::processors::{
    Delivery, FrameListener, PanelProcessor, RemoteGadgetProcessors,
};
use trellis_server::{GadgetClient, ServerConfig, ServerError, ServerHandle, ServerThread};

const WAIT: Duration = Duration::from_secs(5);

fn manual_ticks() -> ServerConfig {
    ServerConfig {
        frame_interval_ms: 0,
        ..ServerConfig::default()
    }
}

/// Starts a server with loop logs routed to the test harness (`RUST_LOG`).
fn start(config: ServerConfig) -> ServerThread {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    ServerThread::start(config).unwrap()
}

fn done(result: Result<(), DeliveryError>) -> Delivery {
    futures::future::ready(result).boxed()
}

/// Forwards frames and haptics into channels; everything else is accepted.
struct ChannelListener {
    frames: mpsc::UnboundedSender<Arc<Frame>>,
    haptics: mpsc::UnboundedSender<HapticEvent>,
}

impl FrameListener for ChannelListener {
    fn new_frame(&self, frame: Arc<Frame>) -> Delivery {
        done(self.frames.send(frame).map_err(|_| DeliveryError::Disconnected))
    }

    fn grab_event(&self, _: GlobalNodeId, _: GrabEvent) -> Delivery {
        done(Ok(()))
    }

    fn haptic_event(&self, event: HapticEvent) -> Delivery {
        done(self.haptics.send(event).map_err(|_| DeliveryError::Disconnected))
    }

    fn shared_texture_updated(&self, _: SharedTextureUpdate) -> Delivery {
        done(Ok(()))
    }
}

/// Refuses everything.
struct BrokenListener;

impl FrameListener for BrokenListener {
    fn new_frame(&self, _: Arc<Frame>) -> Delivery {
        done(Err(DeliveryError::Transport("socket closed".into())))
    }

    fn grab_event(&self, _: GlobalNodeId, _: GrabEvent) -> Delivery {
        done(Err(DeliveryError::Disconnected))
    }

    fn haptic_event(&self, _: HapticEvent) -> Delivery {
        done(Err(DeliveryError::Disconnected))
    }

    fn shared_texture_updated(&self, _: SharedTextureUpdate) -> Delivery {
        done(Err(DeliveryError::Disconnected))
    }
}

struct PanelRecorder(mpsc::UnboundedSender<PanelMouseEvent>);

impl PanelProcessor for PanelRecorder {
    fn mouse_event(&self, event: PanelMouseEvent) -> Delivery {
        done(self.0.send(event).map_err(|_| DeliveryError::Disconnected))
    }
}

struct Listener {
    frames: mpsc::UnboundedReceiver<Arc<Frame>>,
    haptics: mpsc::UnboundedReceiver<HapticEvent>,
}

async fn listen(handle: &ServerHandle, client: ClientId) -> Listener {
    let (frames_tx, frames) = mpsc::unbounded_channel();
    let (haptics_tx, haptics) = mpsc::unbounded_channel();
    handle
        .listen_for_frames(
            client,
            Arc::new(ChannelListener {
                frames: frames_tx,
                haptics: haptics_tx,
            }),
        )
        .await
        .unwrap();
    Listener { frames, haptics }
}

async fn next_frame(listener: &mut Listener) -> Arc<Frame> {
    tokio::time::timeout(WAIT, listener.frames.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("listener channel closed")
}

/// Publishes `root -> panel(2)` for `gadget` from a plain thread, the way a
/// gadget process would.
fn publish_panel(handle: &ServerHandle, gadget: GadgetId) -> bool {
    let handle = handle.clone();
    std::thread::spawn(move || {
        let mut client = GadgetClient::new(handle, gadget);
        let mut session = Session::start();
        session.start_node(2, Some("face"), NodeType::Panel).unwrap();
        session.set_panel_texture_source("shm://face").unwrap();
        session.finish_node().unwrap();
        session.finish(&mut client).is_ok()
    })
    .join()
    .unwrap()
}

#[tokio::test]
async fn published_subtree_reaches_frame_listener() {
    let server = start(manual_ticks());
    let handle = server.handle();
    let mut listener = listen(&handle, ClientId(1)).await;

    let gadget = handle
        .create_gadget(ClientId(2), "clock", RemoteGadgetProcessors::default())
        .await
        .unwrap();
    assert!(publish_panel(&handle, gadget));

    assert_eq!(handle.tick().await.unwrap(), Some(1));
    let frame = next_frame(&mut listener).await;
    assert_eq!(frame.number(), 1);
    assert_eq!(frame.changed(), &[gadget]);
    assert_eq!(frame.gadgets().len(), 1);
    assert_eq!(frame.gadgets()[0].name, "clock");
    assert!(
        frame
            .global_nodes()
            .any(|(id, _)| id == GlobalNodeId::new(gadget, 2))
    );

    // Nothing changed since.
    assert_eq!(handle.tick().await.unwrap(), None);
    server.join().unwrap();
}

#[tokio::test]
async fn undecodable_bytes_are_refused() {
    let server = start(manual_ticks());
    let handle = server.handle();
    let gadget = handle
        .create_gadget(ClientId(1), "g", RemoteGadgetProcessors::default())
        .await
        .unwrap();

    let refused = {
        let handle = handle.clone();
        std::thread::spawn(move || handle.blocking_update_scene_graph(gadget, vec![1, 2, 3]))
            .join()
            .unwrap()
    };
    assert!(!refused.unwrap());
    server.join().unwrap();
}

#[tokio::test]
async fn failing_listener_does_not_block_others() {
    let server = start(manual_ticks());
    let handle = server.handle();
    handle
        .listen_for_frames(ClientId(9), Arc::new(BrokenListener))
        .await
        .unwrap();
    let mut listener = listen(&handle, ClientId(1)).await;

    assert_eq!(handle.tick().await.unwrap(), Some(1));
    assert_eq!(next_frame(&mut listener).await.number(), 1);

    let haptic = HapticEvent {
        target: GlobalNodeId::new(GadgetId(1), 1),
        amplitude: 0.5,
        frequency: 160.0,
        duration: 0.02,
    };
    let report = handle.send_haptic_event(haptic).await.unwrap();
    // Handing off succeeds for both; the broken one fails asynchronously.
    assert_eq!(report.delivered, 2);
    let received = tokio::time::timeout(WAIT, listener.haptics.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received, haptic);
    server.join().unwrap();
}

#[tokio::test]
async fn panel_events_route_to_owning_gadget() {
    let server = start(manual_ticks());
    let handle = server.handle();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let processors = RemoteGadgetProcessors {
        panel: Some(Arc::new(PanelRecorder(tx))),
        ..RemoteGadgetProcessors::default()
    };
    let gadget = handle
        .create_gadget(ClientId(3), "browser", processors)
        .await
        .unwrap();
    assert!(publish_panel(&handle, gadget));

    let event = PanelMouseEvent {
        kind: PanelEventType::Enter,
        panel: GlobalNodeId::new(gadget, 2),
        poker: GlobalNodeId::new(GadgetId(77), 1),
        x: 0.25,
        y: 0.75,
    };
    handle.push_panel_event(event).await.unwrap().unwrap();
    let received = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(received, event);

    let removed = handle.client_disconnected(ClientId(3)).await.unwrap();
    assert_eq!(removed, vec![gadget]);
    assert_eq!(
        handle.push_panel_event(event).await.unwrap(),
        Err(RouteError::GadgetNotFound(gadget))
    );
    server.join().unwrap();
}

#[tokio::test]
async fn frame_built_right_before_shutdown_is_delivered() {
    let server = start(manual_ticks());
    let handle = server.handle();
    let mut listener = listen(&handle, ClientId(1)).await;

    // Queue the shutdown right behind the tick so the loop exits straight
    // after building the frame.
    let (built, stopped) = tokio::join!(handle.tick(), handle.shutdown());
    assert_eq!(built.unwrap(), Some(1));
    stopped.unwrap();
    server.join().unwrap();

    assert_eq!(next_frame(&mut listener).await.number(), 1);
}

#[tokio::test]
async fn handles_report_closed_after_join() {
    let server = start(manual_ticks());
    let handle = server.handle();
    server.join().unwrap();

    assert!(matches!(handle.tick().await, Err(ServerError::Closed)));
    assert!(matches!(
        handle
            .create_gadget(ClientId(1), "late", RemoteGadgetProcessors::default())
            .await,
        Err(ServerError::Closed)
    ));
}

#[tokio::test]
async fn periodic_ticks_build_frames() {
    let config = ServerConfig {
        frame_interval_ms: 5,
        ..ServerConfig::default()
    };
    let server = start(config);
    let handle = server.handle();
    let mut listener = listen(&handle, ClientId(1)).await;

    // The listener subscription alone requests a frame.
    assert_eq!(next_frame(&mut listener).await.number(), 1);
    server.join().unwrap();
}

#[test]
fn invalid_config_is_rejected_before_spawning() {
    let config = ServerConfig {
        command_capacity: 0,
        ..ServerConfig::default()
    };
    assert!(matches!(
        ServerThread::start(config),
        Err(ServerError::Config(_))
    ));
}
