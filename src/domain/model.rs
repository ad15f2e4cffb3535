use crate::core::node::NodeRef;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Opaque identity of one namespace instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespaceId(pub u64);

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns:{}", self.0)
    }
}

/// Identifier handed out by the namespace manager when a set of hooks is
/// registered; used to locate that subsystem's slot in every namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubsysId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessClass {
    Owner,
    Group,
    Other,
}

/// Whoever is looking at the tree: the namespace it lives in decides which
/// per-namespace nodes it sees, the access class decides what it may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub namespace: NamespaceId,
    pub access: AccessClass,
}

impl Viewer {
    pub fn new(namespace: NamespaceId, access: AccessClass) -> Self {
        Self { namespace, access }
    }

    pub fn owner(namespace: NamespaceId) -> Self {
        Self::new(namespace, AccessClass::Owner)
    }

    pub fn other(namespace: NamespaceId) -> Self {
        Self::new(namespace, AccessClass::Other)
    }
}

/// Per-namespace storage cell holding the namespace's node reference.
#[derive(Debug, Default)]
pub struct ExtensionSlot {
    node: Option<NodeRef>,
}

impl ExtensionSlot {
    /// Stores the node. Returns it back if the slot is already populated.
    pub fn install(&mut self, node: NodeRef) -> std::result::Result<(), NodeRef> {
        if self.node.is_some() {
            return Err(node);
        }
        self.node = Some(node);
        Ok(())
    }

    pub fn node(&self) -> Option<&NodeRef> {
        self.node.as_ref()
    }

    pub fn take(&mut self) -> Option<NodeRef> {
        self.node.take()
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_none()
    }
}

pub type SlotHandle = Arc<Mutex<ExtensionSlot>>;

/// A namespace instance as owned by the namespace manager, including the
/// extension storage it allocates for every registered subsystem.
#[derive(Debug)]
pub struct Net {
    id: NamespaceId,
    name: String,
    generic: Mutex<HashMap<SubsysId, SlotHandle>>,
}

impl Net {
    pub fn new(id: NamespaceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            generic: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> NamespaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up the extension slot for a registered subsystem.
    pub fn generic(&self, id: SubsysId) -> Option<SlotHandle> {
        self.generic.lock().get(&id).cloned()
    }

    /// Allocates an empty slot for `id`. Called by the manager only.
    pub fn allocate_slot(&self, id: SubsysId) -> SlotHandle {
        let slot = SlotHandle::default();
        self.generic.lock().insert(id, Arc::clone(&slot));
        slot
    }

    /// Frees the slot for `id`. Called by the manager only.
    pub fn free_slot(&self, id: SubsysId) -> Option<SlotHandle> {
        self.generic.lock().remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_generic_lookup() {
        let net = Net::new(NamespaceId(3), "blue");
        assert!(net.generic(SubsysId(0)).is_none());

        let slot = net.allocate_slot(SubsysId(0));
        let found = net.generic(SubsysId(0)).unwrap();
        assert!(Arc::ptr_eq(&slot, &found));
        assert!(found.lock().is_empty());

        assert!(net.free_slot(SubsysId(0)).is_some());
        assert!(net.generic(SubsysId(0)).is_none());
    }

    #[test]
    fn test_namespace_id_display() {
        assert_eq!(NamespaceId(7).to_string(), "ns:7");
    }
}
