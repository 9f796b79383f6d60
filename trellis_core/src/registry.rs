// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Table of connected gadgets.
//!
//! Each [`Gadget`] owns at most one published subtree and up to four
//! processor handles. Subtrees are replaced wholesale on every publish; there
//! is no incremental patching.
//!
//! Processor handle types are supplied by the embedding layer through the
//! [`Processors`] trait. The server plugs in async RPC clients; tests plug in
//! plain values.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::id::{ClientId, GadgetId, GlobalNodeId};
use crate::message::SceneGraphMessage;
use crate::node::Node;

/// Handle types for the processors a gadget may register, and for frame
/// listeners.
pub trait Processors {
    /// Receives poker proximity updates.
    type Poker;
    /// Receives panel pointer events.
    type Panel;
    /// Receives grab events addressed to grabbers, and intersection updates.
    type Grabber;
    /// Receives grab events addressed to grabbables.
    type Grabbable;
    /// Receives frames and broadcast events.
    type FrameListener;
}

/// Errors from registry mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No gadget with this id is registered.
    #[error("gadget {0:?} is not registered")]
    GadgetNotFound(GadgetId),
}

/// The optional processor handles of one gadget.
pub struct GadgetProcessors<P: Processors> {
    /// Poker processor.
    pub poker: Option<P::Poker>,
    /// Panel processor.
    pub panel: Option<P::Panel>,
    /// Grabber processor.
    pub grabber: Option<P::Grabber>,
    /// Grabbable processor.
    pub grabbable: Option<P::Grabbable>,
}

impl<P: Processors> Default for GadgetProcessors<P> {
    fn default() -> Self {
        Self {
            poker: None,
            panel: None,
            grabber: None,
            grabbable: None,
        }
    }
}

impl<P: Processors> fmt::Debug for GadgetProcessors<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GadgetProcessors")
            .field("poker", &self.poker.is_some())
            .field("panel", &self.panel.is_some())
            .field("grabber", &self.grabber.is_some())
            .field("grabbable", &self.grabbable.is_some())
            .finish()
    }
}

/// One registered gadget.
pub struct Gadget<P: Processors> {
    id: GadgetId,
    client_id: ClientId,
    name: String,
    subtree: Option<Arc<SceneGraphMessage>>,
    processors: GadgetProcessors<P>,
}

impl<P: Processors> fmt::Debug for Gadget<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gadget")
            .field("id", &self.id)
            .field("client_id", &self.client_id)
            .field("name", &self.name)
            .field("nodes", &self.subtree.as_deref().map(SceneGraphMessage::node_count))
            .field("processors", &self.processors)
            .finish()
    }
}

impl<P: Processors> Gadget<P> {
    /// The gadget's id.
    #[must_use]
    pub fn id(&self) -> GadgetId {
        self.id
    }

    /// The owning client.
    #[must_use]
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// The gadget's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The last published subtree, if any.
    #[must_use]
    pub fn subtree(&self) -> Option<&SceneGraphMessage> {
        self.subtree.as_deref()
    }

    /// A shared handle to the last published subtree, if any.
    #[must_use]
    pub fn shared_subtree(&self) -> Option<&Arc<SceneGraphMessage>> {
        self.subtree.as_ref()
    }

    /// The gadget's processor handles.
    #[must_use]
    pub fn processors(&self) -> &GadgetProcessors<P> {
        &self.processors
    }

    /// Returns the global id of one of this gadget's nodes.
    #[must_use]
    pub fn global_id(&self, node: u32) -> GlobalNodeId {
        GlobalNodeId::new(self.id, node)
    }
}

/// Server-side table of gadgets, in registration order.
pub struct GadgetRegistry<P: Processors> {
    gadgets: Vec<Gadget<P>>,
    next_id: u32,
}

impl<P: Processors> fmt::Debug for GadgetRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GadgetRegistry")
            .field("gadgets", &self.gadgets)
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<P: Processors> Default for GadgetRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Processors> GadgetRegistry<P> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gadgets: Vec::new(),
            next_id: 1,
        }
    }

    /// Number of registered gadgets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gadgets.len()
    }

    /// Returns whether no gadgets are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gadgets.is_empty()
    }

    /// Iterates gadgets in registration order.
    pub fn gadgets(&self) -> impl Iterator<Item = &Gadget<P>> + '_ {
        self.gadgets.iter()
    }

    /// Registers a gadget for `client_id` and returns its new id.
    pub fn register(
        &mut self,
        client_id: ClientId,
        name: impl Into<String>,
        processors: GadgetProcessors<P>,
    ) -> GadgetId {
        let id = GadgetId(self.next_id);
        self.next_id += 1;
        self.gadgets.push(Gadget {
            id,
            client_id,
            name: name.into(),
            subtree: None,
            processors,
        });
        id
    }

    /// Replaces the gadget's processor handles.
    pub fn set_processors(
        &mut self,
        id: GadgetId,
        processors: GadgetProcessors<P>,
    ) -> Result<(), RegistryError> {
        self.find_gadget_mut(id)?.processors = processors;
        Ok(())
    }

    /// Replaces the gadget's subtree.
    pub fn publish_subtree(
        &mut self,
        id: GadgetId,
        subtree: SceneGraphMessage,
    ) -> Result<(), RegistryError> {
        self.find_gadget_mut(id)?.subtree = Some(Arc::new(subtree));
        Ok(())
    }

    /// Returns the gadget with the given id.
    #[must_use]
    pub fn find_gadget(&self, id: GadgetId) -> Option<&Gadget<P>> {
        self.gadgets.iter().find(|g| g.id == id)
    }

    /// Returns the first gadget with the given name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Gadget<P>> {
        self.gadgets.iter().find(|g| g.name == name)
    }

    /// Removes one gadget.
    pub fn remove_gadget(&mut self, id: GadgetId) -> Option<Gadget<P>> {
        let idx = self.gadgets.iter().position(|g| g.id == id)?;
        Some(self.gadgets.remove(idx))
    }

    /// Removes every gadget owned by `client_id`, returning their ids.
    pub fn unregister_client(&mut self, client_id: ClientId) -> Vec<GadgetId> {
        let mut removed = Vec::new();
        self.gadgets.retain(|g| {
            if g.client_id == client_id {
                removed.push(g.id);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Returns the poker processor of the gadget that owns `id`.
    #[must_use]
    pub fn find_poker_processor(&self, id: GlobalNodeId) -> Option<&P::Poker> {
        self.find_gadget(id.gadget())?.processors.poker.as_ref()
    }

    /// Returns the panel processor of the gadget that owns `id`.
    #[must_use]
    pub fn find_panel_processor(&self, id: GlobalNodeId) -> Option<&P::Panel> {
        self.find_gadget(id.gadget())?.processors.panel.as_ref()
    }

    /// Returns the grabber processor of the gadget that owns `id`.
    #[must_use]
    pub fn find_grabber_processor(&self, id: GlobalNodeId) -> Option<&P::Grabber> {
        self.find_gadget(id.gadget())?.processors.grabber.as_ref()
    }

    /// Returns the grabbable processor of the gadget that owns `id`.
    #[must_use]
    pub fn find_grabbable_processor(&self, id: GlobalNodeId) -> Option<&P::Grabbable> {
        self.find_gadget(id.gadget())?.processors.grabbable.as_ref()
    }

    /// Resolves a global id to a node in its gadget's current subtree.
    #[must_use]
    pub fn resolve_node(&self, id: GlobalNodeId) -> Option<&Node> {
        let (gadget, node) = id.unpack();
        self.find_gadget(gadget)?.subtree.as_ref()?.find(node)
    }

    fn find_gadget_mut(&mut self, id: GadgetId) -> Result<&mut Gadget<P>, RegistryError> {
        self.gadgets
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(RegistryError::GadgetNotFound(id))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::context::SceneGraphContext;
    use crate::node::NodeType;

    /// Processor handles that are just labels.
    #[derive(Debug)]
    pub(crate) struct Labels;

    impl Processors for Labels {
        type Poker = &'static str;
        type Panel = &'static str;
        type Grabber = &'static str;
        type Grabbable = &'static str;
        type FrameListener = &'static str;
    }

    pub(crate) fn subtree(ids: &[u32]) -> SceneGraphMessage {
        let mut ctx = SceneGraphContext::new();
        for &id in ids {
            ctx.start_node(id, None, NodeType::Model).unwrap();
            ctx.finish_node();
        }
        ctx.finish().unwrap()
    }

    #[test]
    fn ids_start_at_one_and_are_not_reused() {
        let mut reg = GadgetRegistry::<Labels>::new();
        let a = reg.register(ClientId(1), "a", GadgetProcessors::default());
        assert_eq!(a, GadgetId(1));
        reg.remove_gadget(a).unwrap();
        let b = reg.register(ClientId(1), "b", GadgetProcessors::default());
        assert_eq!(b, GadgetId(2));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn publish_replaces_subtree() {
        let mut reg = GadgetRegistry::<Labels>::new();
        let g = reg.register(ClientId(1), "g", GadgetProcessors::default());
        assert!(reg.find_gadget(g).unwrap().subtree().is_none());

        reg.publish_subtree(g, subtree(&[1, 2])).unwrap();
        reg.publish_subtree(g, subtree(&[7])).unwrap();
        let published = reg.find_gadget(g).unwrap().subtree().unwrap();
        assert_eq!(published.node_count(), 2);
        assert!(published.find(7).is_some());
        assert!(published.find(1).is_none());

        assert_eq!(
            reg.publish_subtree(GadgetId(99), subtree(&[])),
            Err(RegistryError::GadgetNotFound(GadgetId(99)))
        );
    }

    #[test]
    fn find_by_name_returns_first_match() {
        let mut reg = GadgetRegistry::<Labels>::new();
        let first = reg.register(ClientId(1), "menu", GadgetProcessors::default());
        reg.register(ClientId(2), "menu", GadgetProcessors::default());
        assert_eq!(reg.find_by_name("menu").unwrap().id(), first);
        assert!(reg.find_by_name("missing").is_none());
    }

    #[test]
    fn processor_lookup_uses_gadget_component() {
        let mut reg = GadgetRegistry::<Labels>::new();
        let g = reg.register(
            ClientId(1),
            "hand",
            GadgetProcessors {
                grabber: Some("grabber"),
                poker: Some("poker"),
                ..GadgetProcessors::default()
            },
        );
        let id = GlobalNodeId::new(g, 12);
        assert_eq!(reg.find_grabber_processor(id), Some(&"grabber"));
        assert_eq!(reg.find_poker_processor(id), Some(&"poker"));
        assert_eq!(reg.find_grabbable_processor(id), None);
        assert_eq!(reg.find_panel_processor(id), None);

        reg.set_processors(
            g,
            GadgetProcessors {
                panel: Some("panel"),
                ..GadgetProcessors::default()
            },
        )
        .unwrap();
        assert_eq!(reg.find_panel_processor(id), Some(&"panel"));
        assert_eq!(reg.find_grabber_processor(id), None);
    }

    #[test]
    fn unregister_removes_every_gadget_of_client() {
        let mut reg = GadgetRegistry::<Labels>::new();
        let a = reg.register(
            ClientId(4),
            "a",
            GadgetProcessors {
                grabbable: Some("a"),
                ..GadgetProcessors::default()
            },
        );
        let b = reg.register(ClientId(4), "b", GadgetProcessors::default());
        let c = reg.register(ClientId(5), "c", GadgetProcessors::default());
        reg.publish_subtree(a, subtree(&[3])).unwrap();
        let node = GlobalNodeId::new(a, 3);
        assert!(reg.resolve_node(node).is_some());

        assert_eq!(reg.unregister_client(ClientId(4)), [a, b]);
        assert!(reg.resolve_node(node).is_none());
        assert!(reg.find_grabbable_processor(node).is_none());
        assert!(reg.find_gadget(c).is_some());
    }
}
