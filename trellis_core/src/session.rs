// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session handles over [`SceneGraphContext`].
//!
//! A [`Session`] is what a gadget process holds while it describes its
//! subtree. It either owns a live context or is dead (never started, or
//! already finished). Every operation on a dead session returns
//! [`InvalidContext`](SceneGraphError::InvalidContext) before touching the
//! state machine.

use alloc::string::String;

use crate::context::{SceneGraphContext, SceneGraphError};
use crate::message::SceneGraphMessage;
use crate::node::RawNodeType;

/// Why a submission did not reach the server.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The connection to the server is gone.
    #[error("server connection closed")]
    Disconnected,
    /// The transport reported a failure.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Receives finished scene graphs on behalf of the server.
///
/// Returns `Ok(true)` when the server accepted the subtree and `Ok(false)`
/// when it refused it.
pub trait SceneGraphSubmitter {
    /// Submits a finished subtree.
    fn submit_scene_graph(&mut self, message: &SceneGraphMessage) -> Result<bool, SubmitError>;
}

/// Gadget-side handle to one scene-graph update.
#[derive(Debug, Default)]
pub struct Session {
    context: Option<SceneGraphContext>,
}

impl Session {
    /// Starts a new session with the implicit root open.
    #[must_use]
    pub fn start() -> Self {
        Self {
            context: Some(SceneGraphContext::new()),
        }
    }

    /// Returns whether the session can still accept calls.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.context.is_some()
    }

    /// See [`SceneGraphContext::start_node`].
    pub fn start_node(
        &mut self,
        id: u32,
        name: Option<&str>,
        node_type: impl Into<RawNodeType>,
    ) -> Result<(), SceneGraphError> {
        self.context()?.start_node(id, name, node_type)
    }

    /// See [`SceneGraphContext::finish_node`].
    ///
    /// # Panics
    ///
    /// Panics if the session is live but has no open node.
    pub fn finish_node(&mut self) -> Result<(), SceneGraphError> {
        self.context()?.finish_node();
        Ok(())
    }

    /// See [`SceneGraphContext::set_origin_path`].
    pub fn set_origin_path(&mut self, path: &str) -> Result<(), SceneGraphError> {
        self.context()?.set_origin_path(path)
    }

    /// See [`SceneGraphContext::set_translation`].
    pub fn set_translation(&mut self, x: f32, y: f32, z: f32) -> Result<(), SceneGraphError> {
        self.context()?.set_translation(x, y, z)
    }

    /// See [`SceneGraphContext::set_scale`].
    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) -> Result<(), SceneGraphError> {
        self.context()?.set_scale(x, y, z)
    }

    /// See [`SceneGraphContext::set_rotation`].
    pub fn set_rotation(&mut self, x: f32, y: f32, z: f32, w: f32) -> Result<(), SceneGraphError> {
        self.context()?.set_rotation(x, y, z, w)
    }

    /// See [`SceneGraphContext::set_model_uri`].
    pub fn set_model_uri(&mut self, uri: &str) -> Result<(), SceneGraphError> {
        self.context()?.set_model_uri(uri)
    }

    /// See [`SceneGraphContext::set_panel_texture_source`].
    pub fn set_panel_texture_source(&mut self, source: &str) -> Result<(), SceneGraphError> {
        self.context()?.set_panel_texture_source(source)
    }

    /// Finishes the session and submits the subtree.
    ///
    /// The session is dead afterwards whatever the outcome, including
    /// [`NodeMismatch`](SceneGraphError::NodeMismatch).
    pub fn finish<S>(&mut self, submitter: &mut S) -> Result<(), SceneGraphError>
    where
        S: SceneGraphSubmitter + ?Sized,
    {
        self.context
            .take()
            .ok_or(SceneGraphError::InvalidContext)?
            .finish_context(submitter)
    }

    fn context(&mut self) -> Result<&mut SceneGraphContext, SceneGraphError> {
        self.context.as_mut().ok_or(SceneGraphError::InvalidContext)
    }
}
