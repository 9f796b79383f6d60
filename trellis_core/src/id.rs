// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client, gadget and cross-process node identity types.

use core::fmt;

/// Identifies a connected client process.
///
/// Assigned by the connection layer; core treats it as opaque.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClientId(pub u32);

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientId({})", self.0)
    }
}

/// Identifies a registered gadget.
///
/// Allocated by the [`GadgetRegistry`](crate::registry::GadgetRegistry)
/// starting at 1 and never reused, so an id outlives its gadget only as a
/// lookup miss.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GadgetId(pub u32);

impl fmt::Debug for GadgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GadgetId({})", self.0)
    }
}

/// A node address that is unique across all gadgets.
///
/// Packs `(gadget, local node)` into one `u64`: the gadget id occupies the
/// high 32 bits and the local node id the low 32 bits. Gadget id 0 is never
/// allocated, so [`GlobalNodeId::NONE`] never names a live node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GlobalNodeId(pub u64);

impl GlobalNodeId {
    /// The "no node" value.
    pub const NONE: Self = Self(0);

    /// Packs a gadget id and a local node id.
    #[inline]
    #[must_use]
    pub const fn new(gadget: GadgetId, node: u32) -> Self {
        Self(((gadget.0 as u64) << 32) | node as u64)
    }

    /// Returns the gadget component.
    #[inline]
    #[must_use]
    pub const fn gadget(self) -> GadgetId {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "a u64 shifted right by 32 fits in u32"
        )]
        let gadget = (self.0 >> 32) as u32;
        GadgetId(gadget)
    }

    /// Returns the local node component.
    #[inline]
    #[must_use]
    pub const fn node(self) -> u32 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "low 32 bits hold the local node id"
        )]
        let node = self.0 as u32;
        node
    }

    /// Splits into `(gadget, local node)`.
    #[inline]
    #[must_use]
    pub const fn unpack(self) -> (GadgetId, u32) {
        (self.gadget(), self.node())
    }

    /// Returns whether this is [`GlobalNodeId::NONE`].
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for GlobalNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlobalNodeId({}:{})", self.gadget().0, self.node())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_puts_gadget_in_high_bits() {
        let id = GlobalNodeId::new(GadgetId(3), 7);
        assert_eq!(id.0, (3_u64 << 32) | 7);
        assert_eq!(id.unpack(), (GadgetId(3), 7));
    }

    #[test]
    fn extreme_components_survive() {
        let id = GlobalNodeId::new(GadgetId(u32::MAX), u32::MAX);
        assert_eq!(id.0, u64::MAX);
        assert_eq!(id.gadget(), GadgetId(u32::MAX));
        assert_eq!(id.node(), u32::MAX);
        assert!(GlobalNodeId::NONE.is_none());
        assert!(!GlobalNodeId::new(GadgetId(1), 0).is_none());
    }
}
