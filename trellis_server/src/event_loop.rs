// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The server thread and its command handle.
//!
//! ```text
//!  any thread                         server thread (current_thread + LocalSet)
//!  ----------                         ------------------------------------------
//!  ServerHandle ── mpsc<Command> ──▶  select! { command | frame tick }
//!      ▲                                   │
//!      └──────── oneshot reply ◀───────────┤ ServerState<RemoteProcessors>
//!                                          │
//!                                          └─▶ LocalDispatch ─ spawn_local ─▶ processors
//! ```
//!
//! All state lives on the server thread; commands are applied one at a time
//! in arrival order. Deliveries to remote processors are spawned as local
//! tasks, so a slow processor never stalls the loop.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior};
use trellis_core::event::{
    GrabEvent, GrabIntersections, HapticEvent, PanelMouseEvent, PokerProximity,
    SharedTextureUpdate,
};
use trellis_core::id::{ClientId, GadgetId, GlobalNodeId};
use trellis_core::message::SceneGraphMessage;
use trellis_core::router::{BroadcastReport, RouteError};
use trellis_core::state::ServerState;

use crate::command::Command;
use crate::config::ServerConfig;
use crate::dispatch::LocalDispatch;
use crate::error::ServerError;
use crate::log::TracingSink;
use crate::processors::{FrameListener, RemoteGadgetProcessors, RemoteProcessors};

/// How long shutdown waits for in-flight deliveries.
const DELIVERY_GRACE: Duration = Duration::from_secs(1);

/// A running server event loop on its own OS thread.
#[derive(Debug)]
pub struct ServerThread {
    handle: ServerHandle,
    stop: oneshot::Sender<()>,
    thread: JoinHandle<()>,
}

impl ServerThread {
    /// Validates `config` and starts the event loop.
    ///
    /// Returns once the loop's runtime is up.
    pub fn start(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let (tx, rx) = mpsc::channel(config.command_capacity);
        let (stop, stop_rx) = oneshot::channel();
        // Not a tokio oneshot: `start` may run inside an async runtime, where
        // `blocking_recv` panics.
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel(1);
        let interval = config.frame_interval();

        let thread = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                let local = tokio::task::LocalSet::new();
                local.block_on(&runtime, run(rx, stop_rx, interval));
                // Finish deliveries spawned by the last commands before dropping them.
                let drained =
                    runtime.block_on(async { tokio::time::timeout(DELIVERY_GRACE, local).await });
                if drained.is_err() {
                    tracing::warn!(grace = ?DELIVERY_GRACE, "pending deliveries dropped at shutdown");
                }
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(ServerError::Io(e));
            }
            Err(_) => {
                return Err(match thread.join() {
                    Ok(()) => ServerError::Closed,
                    Err(_) => ServerError::Panicked,
                });
            }
        }

        tracing::info!(
            thread = %config.thread_name,
            frame_interval_ms = config.frame_interval_ms,
            "server started"
        );
        Ok(Self {
            handle: ServerHandle { tx },
            stop,
            thread,
        })
    }

    /// Returns a handle for sending commands.
    #[must_use]
    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    /// Asks the loop to stop and waits for the thread to exit.
    ///
    /// Commands already queued are still applied, and deliveries they
    /// started get a short grace period to complete. Handles held elsewhere
    /// report [`ServerError::Closed`] afterwards.
    pub fn join(self) -> Result<(), ServerError> {
        // The loop may already have exited through `ServerHandle::shutdown`.
        let _ = self.stop.send(());
        drop(self.handle);
        self.thread.join().map_err(|_| ServerError::Panicked)?;
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn run(
    mut rx: mpsc::Receiver<Command>,
    mut stop: oneshot::Receiver<()>,
    interval: Option<Duration>,
) {
    let mut state = ServerState::<RemoteProcessors>::new();
    state.set_trace_sink(Box::new(TracingSink));
    let mut dispatch = LocalDispatch;
    let mut ticker = interval.map(|period| {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    });

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                None | Some(Command::Shutdown) => break,
                Some(command) => apply(&mut state, &mut dispatch, command),
            },
            () = next_tick(&mut ticker) => {
                state.run_frame(&mut dispatch);
            }
            _ = &mut stop => {
                rx.close();
                while let Ok(command) = rx.try_recv() {
                    apply(&mut state, &mut dispatch, command);
                }
                break;
            }
        }
    }
    tracing::debug!("event loop exiting");
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn apply(state: &mut ServerState<RemoteProcessors>, dispatch: &mut LocalDispatch, command: Command) {
    tracing::trace!(?command, "applying command");
    // A dropped reply receiver means the caller stopped waiting; the command still applies.
    match command {
        Command::CreateGadget {
            client,
            name,
            processors,
            reply,
        } => {
            let _ = reply.send(state.create_gadget(client, name, processors));
        }
        Command::UpdateSceneGraph {
            gadget,
            bytes,
            reply,
        } => {
            let accepted = match SceneGraphMessage::decode(&bytes) {
                Ok(message) => state.update_scene_graph(gadget, message),
                Err(error) => {
                    tracing::warn!(gadget = gadget.0, %error, "undecodable scene graph");
                    false
                }
            };
            let _ = reply.send(accepted);
        }
        Command::ListenForFrames {
            client,
            listener,
            reply,
        } => {
            state.listen_for_frames(client, listener);
            let _ = reply.send(());
        }
        Command::UpdateSharedTexture { update, reply } => {
            let _ = reply.send(state.update_shared_texture(dispatch, &update));
        }
        Command::PushPokerProximity {
            poker,
            proximities,
            reply,
        } => {
            let _ = reply.send(state.push_poker_proximity(dispatch, poker, &proximities));
        }
        Command::PushGrabIntersections {
            grabber,
            intersections,
            reply,
        } => {
            let _ = reply.send(state.push_grab_intersections(dispatch, grabber, &intersections));
        }
        Command::PushGrabEvent {
            sender,
            event,
            reply,
        } => {
            let _ = reply.send(state.push_grab_event(dispatch, sender, &event));
        }
        Command::SendGrabEventToGlobalId {
            sender,
            target,
            event,
            reply,
        } => {
            let _ = reply.send(state.send_grab_event_to_global_id(dispatch, sender, target, &event));
        }
        Command::BroadcastGrabEvent {
            grabber,
            event,
            reply,
        } => {
            let _ = reply.send(state.send_grab_event_to_frame_listeners(dispatch, &event, grabber));
        }
        Command::PushPanelEvent { event, reply } => {
            let _ = reply.send(state.push_panel_event(dispatch, &event));
        }
        Command::SendHapticEvent { event, reply } => {
            let _ = reply.send(state.send_haptic_event(dispatch, &event));
        }
        Command::ClientDisconnected { client, reply } => {
            let _ = reply.send(state.client_disconnected(client));
        }
        Command::Tick { reply } => {
            let number = state.run_frame(dispatch).map(|report| report.frame.number());
            let _ = reply.send(number);
        }
        Command::Shutdown => {}
    }
}

/// Cloneable sender of commands to a [`ServerThread`].
///
/// Every method fails with [`ServerError::Closed`] once the loop has
/// stopped.
#[derive(Clone, Debug)]
pub struct ServerHandle {
    tx: mpsc::Sender<Command>,
}

impl ServerHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ServerError::Closed)?;
        rx.await.map_err(|_| ServerError::Closed)
    }

    fn blocking_request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .blocking_send(make(reply))
            .map_err(|_| ServerError::Closed)?;
        rx.blocking_recv().map_err(|_| ServerError::Closed)
    }

    /// Registers a gadget owned by `client`.
    pub async fn create_gadget(
        &self,
        client: ClientId,
        name: impl Into<String>,
        processors: RemoteGadgetProcessors,
    ) -> Result<GadgetId, ServerError> {
        let name = name.into();
        self.request(|reply| Command::CreateGadget {
            client,
            name,
            processors,
            reply,
        })
        .await
    }

    /// Replaces a gadget's subtree. Returns whether it was accepted.
    pub async fn update_scene_graph(
        &self,
        gadget: GadgetId,
        message: &SceneGraphMessage,
    ) -> Result<bool, ServerError> {
        let bytes = message.encode();
        self.request(|reply| Command::UpdateSceneGraph {
            gadget,
            bytes,
            reply,
        })
        .await
    }

    /// Blocking form of [`update_scene_graph`](Self::update_scene_graph)
    /// taking already-encoded bytes.
    ///
    /// Must not be called from inside an async runtime.
    pub fn blocking_update_scene_graph(
        &self,
        gadget: GadgetId,
        bytes: Vec<u8>,
    ) -> Result<bool, ServerError> {
        self.blocking_request(|reply| Command::UpdateSceneGraph {
            gadget,
            bytes,
            reply,
        })
    }

    /// Subscribes `listener` to frames and broadcasts on behalf of `client`.
    pub async fn listen_for_frames(
        &self,
        client: ClientId,
        listener: Arc<dyn FrameListener>,
    ) -> Result<(), ServerError> {
        self.request(|reply| Command::ListenForFrames {
            client,
            listener,
            reply,
        })
        .await
    }

    /// Tells every frame listener about a new shared texture.
    pub async fn update_shared_texture(
        &self,
        update: SharedTextureUpdate,
    ) -> Result<BroadcastReport, ServerError> {
        self.request(|reply| Command::UpdateSharedTexture { update, reply })
            .await
    }

    /// Forwards proximity updates to the poker's gadget.
    pub async fn push_poker_proximity(
        &self,
        poker: GlobalNodeId,
        proximities: Vec<PokerProximity>,
    ) -> Result<Result<(), RouteError>, ServerError> {
        self.request(|reply| Command::PushPokerProximity {
            poker,
            proximities,
            reply,
        })
        .await
    }

    /// Forwards intersection updates to the grabber's gadget.
    pub async fn push_grab_intersections(
        &self,
        grabber: GlobalNodeId,
        intersections: GrabIntersections,
    ) -> Result<Result<(), RouteError>, ServerError> {
        self.request(|reply| Command::PushGrabIntersections {
            grabber,
            intersections,
            reply,
        })
        .await
    }

    /// Forwards a grab event to the side its kind addresses.
    pub async fn push_grab_event(
        &self,
        sender: GlobalNodeId,
        event: GrabEvent,
    ) -> Result<Result<(), RouteError>, ServerError> {
        self.request(|reply| Command::PushGrabEvent {
            sender,
            event,
            reply,
        })
        .await
    }

    /// Forwards a grab event to an explicit target node.
    pub async fn send_grab_event_to_global_id(
        &self,
        sender: GlobalNodeId,
        target: GlobalNodeId,
        event: GrabEvent,
    ) -> Result<Result<(), RouteError>, ServerError> {
        self.request(|reply| Command::SendGrabEventToGlobalId {
            sender,
            target,
            event,
            reply,
        })
        .await
    }

    /// Broadcasts a grab event to every frame listener.
    pub async fn send_grab_event_to_frame_listeners(
        &self,
        grabber: GlobalNodeId,
        event: GrabEvent,
    ) -> Result<BroadcastReport, ServerError> {
        self.request(|reply| Command::BroadcastGrabEvent {
            grabber,
            event,
            reply,
        })
        .await
    }

    /// Forwards a pointer event to the panel's gadget.
    pub async fn push_panel_event(
        &self,
        event: PanelMouseEvent,
    ) -> Result<Result<(), RouteError>, ServerError> {
        self.request(|reply| Command::PushPanelEvent { event, reply })
            .await
    }

    /// Broadcasts a haptic pulse to every frame listener.
    pub async fn send_haptic_event(
        &self,
        event: HapticEvent,
    ) -> Result<BroadcastReport, ServerError> {
        self.request(|reply| Command::SendHapticEvent { event, reply })
            .await
    }

    /// Drops every gadget and listener owned by `client`.
    pub async fn client_disconnected(&self, client: ClientId) -> Result<Vec<GadgetId>, ServerError> {
        self.request(|reply| Command::ClientDisconnected { client, reply })
            .await
    }

    /// Runs a frame immediately.
    ///
    /// Returns the new frame number, or `None` if nothing changed since the
    /// last frame.
    pub async fn tick(&self) -> Result<Option<u64>, ServerError> {
        self.request(|reply| Command::Tick { reply }).await
    }

    /// Asks the loop to stop after the commands already queued.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| ServerError::Closed)
    }
}
