// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stack-based scene-graph construction.
//!
//! A [`SceneGraphContext`] builds one gadget's subtree from a flat sequence of
//! calls:
//!
//! ```text
//! start_node(0, "root", Container)     <- implicit, done by new()
//!   start_node(5, "hand", Transform)
//!     set_translation(1.0, 2.0, 3.0)
//!     start_node(6, "gear", Model)
//!       set_model_uri("model:gear")
//!     finish_node()                     <- 6 finishes first
//!   finish_node()                       <- then 5
//! finish()                              <- root closes last
//! ```
//!
//! Builders live in an arena and the construction stack holds arena indices.
//! Starting a node appends its id to the pending children of whatever is on
//! top of the stack, so callers never declare children up front. The pending
//! list is frozen into [`Node::children`] when the node finishes.
//!
//! Nodes finish in depth-first completion order (children before parents).
//! [`finish`](SceneGraphContext::finish) reverses that list so the
//! resulting [`SceneGraphMessage`] has every parent ahead of its children.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::mem;

use hashbrown::HashSet;

use crate::message::SceneGraphMessage;
use crate::node::{Node, NodePayload, NodeTransform, NodeType, Quat, RawNodeType, Vec3};
use crate::session::SceneGraphSubmitter;

/// Id of the implicit root node.
pub const ROOT_ID: u32 = 0;

/// Name of the implicit root node.
pub const ROOT_NAME: &str = "root";

/// Errors reported by scene-graph construction.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneGraphError {
    /// The session handle is dead or already finished.
    #[error("scene graph session is not valid")]
    InvalidContext,
    /// The open-node stack is not in the shape the operation requires.
    #[error("open node stack does not match the requested operation")]
    NodeMismatch,
    /// The id was already started in this session.
    #[error("node id {0} is already in use in this session")]
    IdInUse(u32),
    /// The node type code is not recognized.
    #[error("unrecognized node type code {0}")]
    InvalidParameter(u32),
    /// The property does not belong to the current node's type.
    #[error("property belongs to {expected} nodes, current node is {actual}")]
    InvalidNodeType {
        /// Type that owns the property.
        expected: NodeType,
        /// Type of the current node.
        actual: NodeType,
    },
    /// The server did not accept the finished scene graph.
    #[error("scene graph submission failed")]
    RequestFailed,
}

/// One in-progress node.
#[derive(Debug)]
struct NodeBuilder {
    node: Node,
    pending_children: Vec<u32>,
}

/// Per-session scene-graph builder.
///
/// See the [module docs](self) for the call protocol.
#[derive(Debug)]
pub struct SceneGraphContext {
    arena: Vec<NodeBuilder>,
    stack: Vec<usize>,
    used_ids: HashSet<u32>,
    finished: Vec<usize>,
}

impl Default for SceneGraphContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraphContext {
    /// Creates a context with the root container (id `0`, name `"root"`)
    /// already open.
    #[must_use]
    pub fn new() -> Self {
        let mut ctx = Self {
            arena: Vec::new(),
            stack: Vec::new(),
            used_ids: HashSet::new(),
            finished: Vec::new(),
        };
        ctx.push_builder(ROOT_ID, Some(ROOT_NAME.to_string()), NodeType::Container);
        ctx
    }

    /// Number of currently open nodes, including the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns whether `id` has been started in this session.
    #[must_use]
    pub fn is_id_used(&self, id: u32) -> bool {
        self.used_ids.contains(&id)
    }

    /// Returns the node currently on top of the stack.
    #[must_use]
    pub fn current_node(&self) -> Option<&Node> {
        self.stack.last().map(|&idx| &self.arena[idx].node)
    }

    /// Starts a node as a child of the current node and makes it current.
    ///
    /// Fails with [`IdInUse`](SceneGraphError::IdInUse) if `id` was already
    /// started in this session, or with
    /// [`InvalidParameter`](SceneGraphError::InvalidParameter) if the type
    /// code is not recognized. Failures leave the context untouched.
    pub fn start_node(
        &mut self,
        id: u32,
        name: Option<&str>,
        node_type: impl Into<RawNodeType>,
    ) -> Result<(), SceneGraphError> {
        if self.used_ids.contains(&id) {
            return Err(SceneGraphError::IdInUse(id));
        }
        let RawNodeType(code) = node_type.into();
        let ty = NodeType::from_code(code).ok_or(SceneGraphError::InvalidParameter(code))?;

        if let Some(&parent) = self.stack.last() {
            self.arena[parent].pending_children.push(id);
        }
        self.push_builder(id, name.map(String::from), ty);
        Ok(())
    }

    /// Finishes the current node, freezing its child list.
    ///
    /// # Panics
    ///
    /// Panics if no node is open. Finishing past the root is a caller bug,
    /// not a recoverable condition.
    pub fn finish_node(&mut self) {
        let Some(idx) = self.stack.pop() else {
            panic!("finish_node called with no open node");
        };
        let builder = &mut self.arena[idx];
        builder.node.children = mem::take(&mut builder.pending_children);
        self.finished.push(idx);
    }

    /// Sets the origin path of the current Origin node.
    pub fn set_origin_path(&mut self, origin_path: &str) -> Result<(), SceneGraphError> {
        match self.current_payload_mut()? {
            NodePayload::Origin { path } => {
                origin_path.clone_into(path);
                Ok(())
            }
            other => Err(mismatch(NodeType::Origin, other)),
        }
    }

    /// Sets the position of the current Transform node.
    pub fn set_translation(&mut self, x: f32, y: f32, z: f32) -> Result<(), SceneGraphError> {
        self.current_transform_mut()?.position = Vec3::new(x, y, z);
        Ok(())
    }

    /// Sets the scale of the current Transform node.
    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) -> Result<(), SceneGraphError> {
        self.current_transform_mut()?.scale = Vec3::new(x, y, z);
        Ok(())
    }

    /// Sets the rotation of the current Transform node.
    pub fn set_rotation(&mut self, x: f32, y: f32, z: f32, w: f32) -> Result<(), SceneGraphError> {
        self.current_transform_mut()?.rotation = Quat::new(x, y, z, w);
        Ok(())
    }

    /// Sets the model URI of the current Model node.
    pub fn set_model_uri(&mut self, model_uri: &str) -> Result<(), SceneGraphError> {
        match self.current_payload_mut()? {
            NodePayload::Model { uri } => {
                model_uri.clone_into(uri);
                Ok(())
            }
            other => Err(mismatch(NodeType::Model, other)),
        }
    }

    /// Sets the texture source of the current Panel node.
    pub fn set_panel_texture_source(&mut self, source: &str) -> Result<(), SceneGraphError> {
        match self.current_payload_mut()? {
            NodePayload::Panel { texture_source } => {
                source.clone_into(texture_source);
                Ok(())
            }
            other => Err(mismatch(NodeType::Panel, other)),
        }
    }

    /// Closes the root and returns the subtree in wire order.
    ///
    /// Fails with [`NodeMismatch`](SceneGraphError::NodeMismatch) unless the
    /// root is the only open node.
    pub fn finish(mut self) -> Result<SceneGraphMessage, SceneGraphError> {
        // The root is always arena slot 0.
        if self.stack.as_slice() != [0] {
            return Err(SceneGraphError::NodeMismatch);
        }
        self.finish_node();

        let mut slots: Vec<Option<Node>> = self.arena.into_iter().map(|b| Some(b.node)).collect();
        let nodes = self
            .finished
            .iter()
            .rev()
            .filter_map(|&idx| slots[idx].take())
            .collect();
        Ok(SceneGraphMessage::from_wire_order(nodes))
    }

    /// Closes the root and submits the subtree.
    ///
    /// Rejection or a transport failure is reported as
    /// [`RequestFailed`](SceneGraphError::RequestFailed). The context is
    /// consumed regardless of the outcome.
    pub fn finish_context<S>(self, submitter: &mut S) -> Result<(), SceneGraphError>
    where
        S: SceneGraphSubmitter + ?Sized,
    {
        let message = self.finish()?;
        match submitter.submit_scene_graph(&message) {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => Err(SceneGraphError::RequestFailed),
        }
    }

    fn push_builder(&mut self, id: u32, name: Option<String>, ty: NodeType) {
        let idx = self.arena.len();
        self.arena.push(NodeBuilder {
            node: Node::new(id, name, ty),
            pending_children: Vec::new(),
        });
        self.stack.push(idx);
        self.used_ids.insert(id);
    }

    fn current_payload_mut(&mut self) -> Result<&mut NodePayload, SceneGraphError> {
        let &idx = self.stack.last().ok_or(SceneGraphError::NodeMismatch)?;
        Ok(&mut self.arena[idx].node.payload)
    }

    fn current_transform_mut(&mut self) -> Result<&mut NodeTransform, SceneGraphError> {
        match self.current_payload_mut()? {
            NodePayload::Transform(t) => Ok(t),
            other => Err(mismatch(NodeType::Transform, other)),
        }
    }
}

fn mismatch(expected: NodeType, actual: &NodePayload) -> SceneGraphError {
    SceneGraphError::InvalidNodeType {
        expected,
        actual: actual.node_type(),
    }
}
