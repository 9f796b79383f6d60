// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat wire form of a gadget subtree.
//!
//! A [`SceneGraphMessage`] is an ordered list of [`Node`]s in which every
//! parent precedes all of its descendants. The root (id `0`) is always first.
//! Child references in [`Node::children`] are local ids, resolved by
//! searching strictly *after* the parent's index.
//!
//! Messages produced by
//! [`SceneGraphContext::finish`](crate::context::SceneGraphContext::finish)
//! satisfy the ordering by construction. Messages read off the wire go
//! through [`SceneGraphMessage::decode`], which runs
//! [`validate`](SceneGraphMessage::validate).

mod codec;

use alloc::vec::Vec;

use hashbrown::HashMap;

pub use codec::{WIRE_MAGIC, WIRE_VERSION, WireError};

use crate::context::ROOT_ID;
use crate::node::{Node, NodeType};

/// Structural problems found by [`SceneGraphMessage::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    /// The message has no nodes.
    #[error("message contains no nodes")]
    Empty,
    /// The first node is not a container with the root id.
    #[error("first node is not the root container")]
    MissingRoot,
    /// Two nodes share an id.
    #[error("node id {0} appears more than once")]
    DuplicateId(u32),
    /// A child id does not name any node in the message.
    #[error("node {parent} lists unknown child {child}")]
    UnknownChild {
        /// The referencing node.
        parent: u32,
        /// The missing id.
        child: u32,
    },
    /// A child appears at or before its parent's position.
    #[error("child {child} precedes its parent {parent}")]
    ChildBeforeParent {
        /// The referencing node.
        parent: u32,
        /// The misplaced child.
        child: u32,
    },
    /// A node is listed as a child more than once.
    #[error("node {0} has more than one parent")]
    MultipleParents(u32),
    /// A non-root node is not listed as anyone's child.
    #[error("node {0} is not reachable from the root")]
    Orphan(u32),
}

/// A finished gadget subtree in parent-before-children order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneGraphMessage {
    nodes: Vec<Node>,
}

impl SceneGraphMessage {
    /// Wraps nodes that are already in wire order.
    ///
    /// No validation is performed; use [`validate`](Self::validate) when the
    /// ordering is not guaranteed by the producer.
    #[must_use]
    pub fn from_wire_order(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Returns the nodes in wire order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Consumes the message and returns its nodes.
    #[must_use]
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Number of nodes in the message.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the root node, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Returns the index of the node with the given id.
    #[must_use]
    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Returns the node with the given id.
    #[must_use]
    pub fn find(&self, id: u32) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Iterates the resolved children of the node at `index`.
    ///
    /// Each child id is searched for only after `index`; ids that cannot be
    /// resolved that way are skipped.
    pub fn children_of(&self, index: usize) -> impl Iterator<Item = &Node> + '_ {
        let ids: &[u32] = self.nodes.get(index).map_or(&[], |n| n.children.as_slice());
        let tail = self.nodes.get(index..).and_then(|s| s.get(1..)).unwrap_or(&[]);
        ids.iter()
            .filter_map(move |&child| tail.iter().find(|n| n.id == child))
    }

    /// Checks the ordering and reference invariants.
    pub fn validate(&self) -> Result<(), StructureError> {
        let root = self.nodes.first().ok_or(StructureError::Empty)?;
        if root.id != ROOT_ID || root.node_type() != NodeType::Container {
            return Err(StructureError::MissingRoot);
        }

        let mut index: HashMap<u32, usize> = HashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if index.insert(node.id, i).is_some() {
                return Err(StructureError::DuplicateId(node.id));
            }
        }

        let mut has_parent = alloc::vec![false; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            for &child in &node.children {
                let &at = index.get(&child).ok_or(StructureError::UnknownChild {
                    parent: node.id,
                    child,
                })?;
                if at <= i {
                    return Err(StructureError::ChildBeforeParent {
                        parent: node.id,
                        child,
                    });
                }
                if has_parent[at] {
                    return Err(StructureError::MultipleParents(child));
                }
                has_parent[at] = true;
            }
        }

        match has_parent.iter().skip(1).position(|&p| !p) {
            Some(i) => Err(StructureError::Orphan(self.nodes[i + 1].id)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn node(id: u32, ty: NodeType, children: &[u32]) -> Node {
        let mut n = Node::new(id, None, ty);
        n.children = children.to_vec();
        n
    }

    fn sample() -> SceneGraphMessage {
        SceneGraphMessage::from_wire_order(vec![
            node(0, NodeType::Container, &[1, 2]),
            node(2, NodeType::Panel, &[]),
            node(1, NodeType::Transform, &[3]),
            node(3, NodeType::Model, &[]),
        ])
    }

    #[test]
    fn well_formed_message_validates() {
        let msg = sample();
        assert_eq!(msg.validate(), Ok(()));
        assert_eq!(msg.node_count(), 4);
        assert_eq!(msg.root().unwrap().id, 0);
        assert_eq!(msg.index_of(3), Some(3));
    }

    #[test]
    fn children_resolve_after_parent() {
        let msg = sample();
        let ids: Vec<u32> = msg.children_of(0).map(|n| n.id).collect();
        assert_eq!(ids, [1, 2]);
        let ids: Vec<u32> = msg.children_of(2).map(|n| n.id).collect();
        assert_eq!(ids, [3]);
        assert_eq!(msg.children_of(9).count(), 0);
        assert_eq!(msg.children_of(usize::MAX).count(), 0);
    }

    #[test]
    fn child_before_parent_is_rejected() {
        let msg = SceneGraphMessage::from_wire_order(vec![
            node(0, NodeType::Container, &[1]),
            node(2, NodeType::Model, &[]),
            node(1, NodeType::Container, &[2]),
        ]);
        assert_eq!(
            msg.validate(),
            Err(StructureError::ChildBeforeParent { parent: 1, child: 2 })
        );
    }

    #[test]
    fn structural_errors_are_reported() {
        assert_eq!(
            SceneGraphMessage::default().validate(),
            Err(StructureError::Empty)
        );
        let msg = SceneGraphMessage::from_wire_order(vec![node(1, NodeType::Container, &[])]);
        assert_eq!(msg.validate(), Err(StructureError::MissingRoot));

        let msg = SceneGraphMessage::from_wire_order(vec![
            node(0, NodeType::Container, &[1]),
            node(1, NodeType::Model, &[]),
            node(1, NodeType::Model, &[]),
        ]);
        assert_eq!(msg.validate(), Err(StructureError::DuplicateId(1)));

        let msg = SceneGraphMessage::from_wire_order(vec![node(0, NodeType::Container, &[8])]);
        assert_eq!(
            msg.validate(),
            Err(StructureError::UnknownChild { parent: 0, child: 8 })
        );

        let msg = SceneGraphMessage::from_wire_order(vec![
            node(0, NodeType::Container, &[1, 2]),
            node(1, NodeType::Container, &[2]),
            node(2, NodeType::Model, &[]),
        ]);
        assert_eq!(msg.validate(), Err(StructureError::MultipleParents(2)));

        let msg = SceneGraphMessage::from_wire_order(vec![
            node(0, NodeType::Container, &[]),
            node(4, NodeType::Model, &[]),
        ]);
        assert_eq!(msg.validate(), Err(StructureError::Orphan(4)));
    }
}
