// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gadget-side submitter for a running server.

use trellis_core::id::GadgetId;
use trellis_core::message::SceneGraphMessage;
use trellis_core::session::{SceneGraphSubmitter, SubmitError};

use crate::event_loop::ServerHandle;

/// Submits a gadget's finished sessions to the server.
///
/// Each submission is encoded to wire bytes and blocks until the server
/// answers, so a `GadgetClient` belongs on a plain thread, not inside an
/// async runtime.
///
/// ```no_run
/// # use trellis_core::id::GadgetId;
/// # use trellis_core::node::NodeType;
/// # use trellis_core::session::Session;
/// # fn demo(handle: trellis_server::ServerHandle, gadget: GadgetId) {
/// let mut client = trellis_server::GadgetClient::new(handle, gadget);
/// let mut session = Session::start();
/// session.start_node(1, Some("body"), NodeType::Model).unwrap();
/// session.set_model_uri("file:///body.glb").unwrap();
/// session.finish_node().unwrap();
/// session.finish(&mut client).unwrap();
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct GadgetClient {
    handle: ServerHandle,
    gadget: GadgetId,
}

impl GadgetClient {
    /// Creates a submitter for `gadget`.
    #[must_use]
    pub fn new(handle: ServerHandle, gadget: GadgetId) -> Self {
        Self { handle, gadget }
    }

    /// The gadget this client publishes for.
    #[must_use]
    pub fn gadget(&self) -> GadgetId {
        self.gadget
    }
}

impl SceneGraphSubmitter for GadgetClient {
    fn submit_scene_graph(&mut self, message: &SceneGraphMessage) -> Result<bool, SubmitError> {
        self.handle
            .blocking_update_scene_graph(self.gadget, message.encode())
            .map_err(|_| SubmitError::Disconnected)
    }
}
