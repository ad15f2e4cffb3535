//! Namespace lifecycle hooks: one node per namespace, created when the
//! namespace comes up and detached and released when it goes away.

use crate::core::attribute::AttributeDef;
use crate::core::node::{NamespaceNode, NodeRef};
use crate::core::tree::Directory;
use crate::domain::model::{ExtensionSlot, Net, SlotHandle, SubsysId};
use crate::domain::ports::PernetOperations;
use crate::utils::error::{NetnsError, Result};
use std::sync::{Arc, OnceLock};

#[derive(Debug)]
pub struct NetnsHooks {
    top: Arc<Directory>,
    node_name: String,
    attribute: AttributeDef,
    id: OnceLock<SubsysId>,
}

impl NetnsHooks {
    pub fn new(top: Arc<Directory>, node_name: impl Into<String>, attribute: AttributeDef) -> Self {
        Self {
            top,
            node_name: node_name.into(),
            attribute,
            id: OnceLock::new(),
        }
    }

    pub fn id(&self) -> Option<SubsysId> {
        self.id.get().copied()
    }

    fn slot(&self, net: &Net) -> Option<SlotHandle> {
        net.generic(self.id()?)
    }

    /// The node currently stored for `net`, if any.
    pub fn node_for(&self, net: &Net) -> Option<NodeRef> {
        self.slot(net)?.lock().node().cloned()
    }
}

impl PernetOperations for NetnsHooks {
    fn storage_size(&self) -> usize {
        std::mem::size_of::<ExtensionSlot>()
    }

    fn bind_id(&self, id: SubsysId) {
        if self.id.set(id).is_err() {
            tracing::warn!("hooks already bound to {:?}, ignoring {:?}", self.id(), id);
        }
    }

    fn init(&self, net: &Net) -> Result<()> {
        tracing::debug!("namespace setup for {} ('{}')", net.id(), net.name());

        let slot = self.slot(net).ok_or_else(|| NetnsError::RegistrationError {
            message: format!("no extension slot for {} (hooks not registered?)", net.id()),
        })?;

        let node =
            NamespaceNode::create(&self.top, &self.node_name, net.id(), self.attribute.clone())?;

        let installed = slot.lock().install(node);
        if let Err(node) = installed {
            node.detach();
            NamespaceNode::release(node);
            return Err(NetnsError::AllocationError {
                what: format!("node for {}", net.id()),
                reason: "extension slot already populated".to_string(),
            });
        }

        Ok(())
    }

    fn exit(&self, net: &Net) {
        tracing::debug!("namespace destroy for {} ('{}')", net.id(), net.name());

        let slot = self.slot(net);
        match slot.as_ref().and_then(|slot| slot.lock().take()) {
            Some(node) => {
                node.detach();
                NamespaceNode::release(node);
            }
            None => {
                tracing::error!("no node stored for {} at namespace exit", net.id());
                if cfg!(debug_assertions) {
                    panic!("namespace exit for {} without a stored node", net.id());
                }
            }
        }
    }
}
