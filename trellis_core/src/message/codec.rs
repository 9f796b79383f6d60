// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binary encoding of [`SceneGraphMessage`].
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! magic "TRSG" | u16 version | u32 node_count | node*
//!
//! node := u32 id | u8 type | name | u32 child_count | u32 child* | payload
//! name := u8 0 | u8 1 str
//! str  := u32 len | len bytes of UTF-8
//!
//! payload by type:
//!   Container -> (nothing)
//!   Origin    -> str path
//!   Transform -> f32 px py pz | f32 sx sy sz | f32 rx ry rz rw
//!   Model     -> str uri
//!   Panel     -> str texture_source
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use super::{SceneGraphMessage, StructureError};
use crate::node::{Node, NodePayload, NodeTransform, NodeType, Quat, Vec3};

/// Leading bytes of every encoded message.
pub const WIRE_MAGIC: [u8; 4] = *b"TRSG";

/// Current encoding version.
pub const WIRE_VERSION: u16 = 1;

/// Errors from [`SceneGraphMessage::decode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The buffer ended in the middle of a field.
    #[error("message truncated")]
    Truncated,
    /// The buffer does not start with [`WIRE_MAGIC`].
    #[error("bad magic")]
    BadMagic,
    /// The version field is not [`WIRE_VERSION`].
    #[error("unsupported wire version {0}")]
    UnsupportedVersion(u16),
    /// A node carries an unknown type code.
    #[error("unknown node type code {0}")]
    UnknownNodeType(u8),
    /// A string field is not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
    /// Bytes remain after the last node.
    #[error("{0} trailing bytes after last node")]
    TrailingBytes(usize),
    /// The decoded nodes violate ordering or reference rules.
    #[error("invalid structure: {0}")]
    Structure(#[from] StructureError),
}

impl SceneGraphMessage {
    /// Encodes the message into a new buffer.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::default();
        w.buf.extend_from_slice(&WIRE_MAGIC);
        w.write_u16(WIRE_VERSION);
        w.write_len(self.nodes.len());
        for node in &self.nodes {
            w.write_node(node);
        }
        w.buf
    }

    /// Decodes and validates a message produced by [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut r = Reader { data: bytes, pos: 0 };
        if r.take(4)? != WIRE_MAGIC {
            return Err(WireError::BadMagic);
        }
        let version = r.read_u16()?;
        if version != WIRE_VERSION {
            return Err(WireError::UnsupportedVersion(version));
        }
        let count = r.read_u32()? as usize;
        // Every node needs at least 10 bytes; don't trust the count for allocation.
        let mut nodes = Vec::with_capacity(count.min(r.remaining() / 10));
        for _ in 0..count {
            nodes.push(r.read_node()?);
        }
        if r.remaining() != 0 {
            return Err(WireError::TrailingBytes(r.remaining()));
        }

        let message = Self::from_wire_order(nodes);
        message.validate()?;
        Ok(message)
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_len(&mut self, len: usize) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "scene graphs are far below u32::MAX entries"
        )]
        self.write_u32(len as u32);
    }

    fn write_str(&mut self, s: &str) {
        self.write_len(s.len());
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn write_vec3(&mut self, v: Vec3) {
        self.write_f32(v.x);
        self.write_f32(v.y);
        self.write_f32(v.z);
    }

    fn write_node(&mut self, node: &Node) {
        self.write_u32(node.id);
        self.write_u8(node.node_type().code());
        match &node.name {
            Some(name) => {
                self.write_u8(1);
                self.write_str(name);
            }
            None => self.write_u8(0),
        }
        self.write_len(node.children.len());
        for &child in &node.children {
            self.write_u32(child);
        }
        match &node.payload {
            NodePayload::Container => {}
            NodePayload::Origin { path } => self.write_str(path),
            NodePayload::Transform(t) => {
                self.write_vec3(t.position);
                self.write_vec3(t.scale);
                self.write_f32(t.rotation.x);
                self.write_f32(t.rotation.y);
                self.write_f32(t.rotation.z);
                self.write_f32(t.rotation.w);
            }
            NodePayload::Model { uri } => self.write_str(uri),
            NodePayload::Panel { texture_source } => self.write_str(texture_source),
        }
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::Truncated);
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        self.take(N)?.try_into().map_err(|_| WireError::Truncated)
    }

    fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_u16(&mut self) -> Result<u16, WireError> {
        self.read_array().map(u16::from_le_bytes)
    }

    fn read_u32(&mut self) -> Result<u32, WireError> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_f32(&mut self) -> Result<f32, WireError> {
        self.read_array().map(f32::from_le_bytes)
    }

    fn read_str(&mut self) -> Result<String, WireError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        core::str::from_utf8(bytes)
            .map(String::from)
            .map_err(|_| WireError::InvalidUtf8)
    }

    fn read_vec3(&mut self) -> Result<Vec3, WireError> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    fn read_node(&mut self) -> Result<Node, WireError> {
        let id = self.read_u32()?;
        let code = self.read_u8()?;
        let ty = NodeType::from_code(u32::from(code)).ok_or(WireError::UnknownNodeType(code))?;
        let name = match self.read_u8()? {
            0 => None,
            _ => Some(self.read_str()?),
        };
        let child_count = self.read_u32()? as usize;
        let mut children = Vec::with_capacity(child_count.min(self.remaining() / 4));
        for _ in 0..child_count {
            children.push(self.read_u32()?);
        }
        let payload = match ty {
            NodeType::Container => NodePayload::Container,
            NodeType::Origin => NodePayload::Origin {
                path: self.read_str()?,
            },
            NodeType::Transform => NodePayload::Transform(NodeTransform {
                position: self.read_vec3()?,
                scale: self.read_vec3()?,
                rotation: Quat::new(
                    self.read_f32()?,
                    self.read_f32()?,
                    self.read_f32()?,
                    self.read_f32()?,
                ),
            }),
            NodeType::Model => NodePayload::Model {
                uri: self.read_str()?,
            },
            NodeType::Panel => NodePayload::Panel {
                texture_source: self.read_str()?,
            },
        };
        Ok(Node {
            id,
            name,
            children,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SceneGraphContext;

    fn sample() -> SceneGraphMessage {
        let mut ctx = SceneGraphContext::new();
        ctx.start_node(1, Some("origin"), NodeType::Origin).unwrap();
        ctx.set_origin_path("/user/hand/right").unwrap();
        ctx.start_node(2, None, NodeType::Transform).unwrap();
        ctx.set_translation(0.5, -1.0, 2.0).unwrap();
        ctx.set_rotation(0.0, 0.707, 0.0, 0.707).unwrap();
        ctx.start_node(3, Some("gear"), NodeType::Model).unwrap();
        ctx.set_model_uri("model:gear").unwrap();
        ctx.finish_node();
        ctx.finish_node();
        ctx.finish_node();
        ctx.start_node(4, Some("menu"), NodeType::Panel).unwrap();
        ctx.set_panel_texture_source("menu-texture").unwrap();
        ctx.finish_node();
        ctx.finish().unwrap()
    }

    #[test]
    fn nested_tree_survives_encoding() {
        let msg = sample();
        let bytes = msg.encode();
        assert_eq!(&bytes[..4], &WIRE_MAGIC);
        assert_eq!(SceneGraphMessage::decode(&bytes), Ok(msg));
    }

    #[test]
    fn truncated_buffers_are_rejected() {
        let bytes = sample().encode();
        for len in [0, 3, 6, 10, bytes.len() - 1] {
            assert_eq!(
                SceneGraphMessage::decode(&bytes[..len]),
                Err(WireError::Truncated),
                "prefix of {len} bytes"
            );
        }
    }

    #[test]
    fn header_errors_are_reported() {
        let mut bytes = sample().encode();
        bytes[0] = b'X';
        assert_eq!(SceneGraphMessage::decode(&bytes), Err(WireError::BadMagic));

        let mut bytes = sample().encode();
        bytes[4] = 9;
        assert_eq!(
            SceneGraphMessage::decode(&bytes),
            Err(WireError::UnsupportedVersion(9))
        );

        let mut bytes = sample().encode();
        bytes.push(0);
        assert_eq!(
            SceneGraphMessage::decode(&bytes),
            Err(WireError::TrailingBytes(1))
        );
    }

    #[test]
    fn unknown_type_code_is_rejected() {
        let mut bytes = sample().encode();
        // Root type byte follows magic (4), version (2), count (4), id (4).
        bytes[14] = 0;
        assert_eq!(
            SceneGraphMessage::decode(&bytes),
            Err(WireError::UnknownNodeType(0))
        );
    }

    #[test]
    fn decode_rejects_child_before_parent() {
        let mut nodes = sample().into_nodes();
        nodes.swap(2, 3);
        let bytes = SceneGraphMessage::from_wire_order(nodes).encode();
        assert!(matches!(
            SceneGraphMessage::decode(&bytes),
            Err(WireError::Structure(StructureError::ChildBeforeParent { .. }))
        ));
    }

    #[test]
    fn non_utf8_name_is_rejected() {
        let mut bytes = sample().encode();
        let at = bytes
            .windows(4)
            .position(|w| w == b"gear")
            .unwrap();
        bytes[at] = 0xFF;
        assert_eq!(
            SceneGraphMessage::decode(&bytes),
            Err(WireError::InvalidUtf8)
        );
    }
}
