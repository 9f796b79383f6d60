// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-graph node model.
//!
//! A [`Node`] is one element of a gadget's subtree. Every node carries a
//! [`NodeType`] fixed at creation, and a [`NodePayload`] whose variant always
//! matches that type. Property setters on
//! [`SceneGraphContext`](crate::context::SceneGraphContext) match on the
//! active payload, so a mismatched write can never land.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// The kind of a scene-graph node.
///
/// The discriminants are the wire codes used by the
/// [codec](crate::message::SceneGraphMessage::encode).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    /// Groups children without contributing anything itself.
    Container = 1,
    /// Anchors its subtree to a named tracking origin.
    Origin = 2,
    /// Positions, scales and rotates its subtree.
    Transform = 3,
    /// Draws a model loaded from a URI.
    Model = 4,
    /// Displays a shared texture.
    Panel = 5,
}

impl NodeType {
    /// All recognized node types, in wire-code order.
    pub const ALL: [Self; 5] = [
        Self::Container,
        Self::Origin,
        Self::Transform,
        Self::Model,
        Self::Panel,
    ];

    /// Returns the node type for a raw wire code, if it is recognized.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Container),
            2 => Some(Self::Origin),
            3 => Some(Self::Transform),
            4 => Some(Self::Model),
            5 => Some(Self::Panel),
            _ => None,
        }
    }

    /// Returns the wire code for this type.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Container => "container",
            Self::Origin => "origin",
            Self::Transform => "transform",
            Self::Model => "model",
            Self::Panel => "panel",
        })
    }
}

/// A node type as supplied by a caller, before it has been validated.
///
/// Session callers may pass any code; only the five [`NodeType`] codes are
/// accepted by [`start_node`](crate::context::SceneGraphContext::start_node).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawNodeType(pub u32);

impl From<NodeType> for RawNodeType {
    fn from(ty: NodeType) -> Self {
        Self(u32::from(ty.code()))
    }
}

/// An opaque three-component vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// The all-ones vector.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Creates a vector from its components.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// An opaque quaternion, stored `x, y, z, w`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
    /// W (scalar) component.
    pub w: f32,
}

impl Quat {
    /// The identity rotation.
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a quaternion from its components.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Transform node properties.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeTransform {
    /// Translation relative to the parent.
    pub position: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
    /// Rotation relative to the parent.
    pub rotation: Quat,
}

impl NodeTransform {
    /// No translation, unit scale, identity rotation.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        scale: Vec3::ONE,
        rotation: Quat::IDENTITY,
    };
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Type-specific node properties.
#[derive(Clone, Debug, PartialEq)]
pub enum NodePayload {
    /// No properties.
    Container,
    /// Tracking origin path, e.g. `/user/hand/left`.
    Origin {
        /// The origin path.
        path: String,
    },
    /// Local transform.
    Transform(NodeTransform),
    /// Model source.
    Model {
        /// URI of the model to draw.
        uri: String,
    },
    /// Panel texture source.
    Panel {
        /// Name of the shared texture source.
        texture_source: String,
    },
}

impl NodePayload {
    /// Returns the default payload for a node type.
    #[must_use]
    pub fn for_type(ty: NodeType) -> Self {
        match ty {
            NodeType::Container => Self::Container,
            NodeType::Origin => Self::Origin {
                path: String::new(),
            },
            NodeType::Transform => Self::Transform(NodeTransform::IDENTITY),
            NodeType::Model => Self::Model { uri: String::new() },
            NodeType::Panel => Self::Panel {
                texture_source: String::new(),
            },
        }
    }

    /// Returns the node type this payload belongs to.
    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        match self {
            Self::Container => NodeType::Container,
            Self::Origin { .. } => NodeType::Origin,
            Self::Transform(_) => NodeType::Transform,
            Self::Model { .. } => NodeType::Model,
            Self::Panel { .. } => NodeType::Panel,
        }
    }
}

/// A finished scene-graph node.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Identifier, unique within the owning gadget's subtree.
    pub id: u32,
    /// Optional human-readable name.
    pub name: Option<String>,
    /// Child node ids, in the order they were started.
    pub children: Vec<u32>,
    /// Type-specific properties.
    pub payload: NodePayload,
}

impl Node {
    /// Creates a childless node with the default payload for `ty`.
    #[must_use]
    pub fn new(id: u32, name: Option<String>, ty: NodeType) -> Self {
        Self {
            id,
            name,
            children: Vec::new(),
            payload: NodePayload::for_type(ty),
        }
    }

    /// Returns the node's type.
    #[inline]
    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        self.payload.node_type()
    }

    /// Returns the transform properties if this is a transform node.
    #[must_use]
    pub fn transform(&self) -> Option<&NodeTransform> {
        match &self.payload {
            NodePayload::Transform(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the origin path if this is an origin node.
    #[must_use]
    pub fn origin_path(&self) -> Option<&str> {
        match &self.payload {
            NodePayload::Origin { path } => Some(path),
            _ => None,
        }
    }

    /// Returns the model URI if this is a model node.
    #[must_use]
    pub fn model_uri(&self) -> Option<&str> {
        match &self.payload {
            NodePayload::Model { uri } => Some(uri),
            _ => None,
        }
    }

    /// Returns the texture source if this is a panel node.
    #[must_use]
    pub fn texture_source(&self) -> Option<&str> {
        match &self.payload {
            NodePayload::Panel { texture_source } => Some(texture_source),
            _ => None,
        }
    }
}
