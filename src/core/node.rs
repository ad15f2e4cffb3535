use crate::core::attribute::{AttributeDef, IntProperty};
use crate::core::tree::{check_name, AttributeSnapshot, Directory, Entry, TreeSnapshot};
use crate::domain::model::{NamespaceId, Viewer};
use crate::utils::error::{NetnsError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Shared ownership of a node. The node's storage goes away with the last
/// `NodeRef`, independently of whether it is still in the tree.
pub type NodeRef = Arc<NamespaceNode>;

/// A tree node private to one namespace, carrying one integer attribute.
#[derive(Debug)]
pub struct NamespaceNode {
    name: String,
    owning_namespace: NamespaceId,
    attribute: AttributeDef,
    property: IntProperty,
    parent: Weak<Directory>,
    attached: AtomicBool,
}

impl NamespaceNode {
    /// Allocates a node with property 0 and attaches it under `parent`.
    ///
    /// If the node cannot be attached it is dropped before returning, so a
    /// failed create never leaves storage behind.
    pub fn create(
        parent: &Arc<Directory>,
        name: &str,
        namespace: NamespaceId,
        attribute: AttributeDef,
    ) -> Result<NodeRef> {
        let allocation_error = |reason: String| NetnsError::AllocationError {
            what: format!("node '{}' for {}", name, namespace),
            reason,
        };
        check_name(name).map_err(|e| allocation_error(e.to_string()))?;

        let node = Arc::new(Self {
            name: name.to_string(),
            owning_namespace: namespace,
            attribute,
            property: IntProperty::default(),
            parent: Arc::downgrade(parent),
            attached: AtomicBool::new(false),
        });

        if let Err(e) = parent.attach(Entry::Node(Arc::clone(&node))) {
            tracing::debug!("attach of '{}' for {} failed, releasing", name, namespace);
            drop(node);
            return Err(allocation_error(e.to_string()));
        }
        node.attached.store(true, Ordering::Release);
        tracing::debug!("attached node '{}' for {} under '{}'", name, namespace, parent.name());

        Ok(node)
    }

    /// Removes the node from its parent so no viewer can find it anymore.
    /// Storage stays alive while references exist. Repeated calls are no-ops.
    pub fn detach(&self) {
        if !self.attached.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(parent) = self.parent.upgrade() {
            parent.remove_node(self);
        }
        tracing::debug!("detached node '{}' for {}", self.name, self.owning_namespace);
    }

    /// Drops one reference; storage is freed when it was the last one.
    pub fn release(node: NodeRef) {
        let remaining = Arc::strong_count(&node) - 1;
        tracing::debug!(
            "releasing node '{}' for {} ({} references left)",
            node.name,
            node.owning_namespace,
            remaining
        );
        drop(node);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owning_namespace(&self) -> NamespaceId {
        self.owning_namespace
    }

    pub fn attribute(&self) -> &AttributeDef {
        &self.attribute
    }

    pub fn property(&self) -> &IntProperty {
        &self.property
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    fn attribute_path(&self) -> String {
        format!("{}/{}", self.name, self.attribute.name)
    }

    /// Reads the attribute on behalf of `viewer`.
    pub fn show(&self, viewer: &Viewer) -> Result<String> {
        if !self.attribute.mode.readable_by(viewer.access) {
            return Err(NetnsError::PermissionDenied {
                path: self.attribute_path(),
            });
        }
        Ok(self.property.show())
    }

    /// Writes the attribute on behalf of `viewer`, returning bytes consumed.
    pub fn store(&self, viewer: &Viewer, text: &str) -> Result<usize> {
        if !self.attribute.mode.writable_by(viewer.access) {
            return Err(NetnsError::PermissionDenied {
                path: self.attribute_path(),
            });
        }
        self.property.store(&self.attribute.name, text)
    }

    pub(crate) fn snapshot(&self, viewer: &Viewer) -> TreeSnapshot {
        let readable = self.attribute.mode.readable_by(viewer.access);
        TreeSnapshot {
            name: self.name.clone(),
            namespace: Some(self.owning_namespace),
            attributes: vec![AttributeSnapshot {
                name: self.attribute.name.clone(),
                mode: self.attribute.mode.to_string(),
                value: readable.then(|| self.property.get()),
            }],
            children: Vec::new(),
        }
    }
}

impl Drop for NamespaceNode {
    fn drop(&mut self) {
        tracing::debug!("freeing node '{}' for {}", self.name, self.owning_namespace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attribute::AttributeMode;
    use crate::domain::model::AccessClass;

    fn attribute() -> AttributeDef {
        AttributeDef::new("property", AttributeMode::DEFAULT)
    }

    #[test]
    fn test_create_starts_at_zero_and_attached() {
        let net = Directory::root("net");
        let node = NamespaceNode::create(&net, "data", NamespaceId(1), attribute()).unwrap();
        assert_eq!(node.property().get(), 0);
        assert_eq!(node.owning_namespace(), NamespaceId(1));
        assert!(node.is_attached());
        assert_eq!(net.child_count(), 1);
    }

    #[test]
    fn test_failed_attach_releases_node() {
        let net = Directory::root("plain");
        let _first = NamespaceNode::create(&net, "data", NamespaceId(1), attribute()).unwrap();
        let err = NamespaceNode::create(&net, "data", NamespaceId(2), attribute()).unwrap_err();
        assert!(matches!(err, NetnsError::AllocationError { .. }));
        assert_eq!(net.child_count(), 1);
    }

    #[test]
    fn test_detach_then_release_frees_storage() {
        let net = Directory::root("net");
        let node = NamespaceNode::create(&net, "data", NamespaceId(1), attribute()).unwrap();
        let weak = Arc::downgrade(&node);

        node.detach();
        assert!(!node.is_attached());
        assert_eq!(net.child_count(), 0);
        assert!(weak.upgrade().is_some());

        NamespaceNode::release(node);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_release_deferred_while_other_holder_exists() {
        let net = Directory::root("net");
        let node = NamespaceNode::create(&net, "data", NamespaceId(1), attribute()).unwrap();
        let holder = Arc::clone(&node);

        node.detach();
        NamespaceNode::release(node);
        assert_eq!(holder.property().show(), "0\n");
        assert!(!holder.is_attached());

        holder.detach();
        assert_eq!(net.child_count(), 0);
    }

    #[test]
    fn test_permissions_follow_mode() {
        let net = Directory::root("net");
        let node = NamespaceNode::create(&net, "data", NamespaceId(1), attribute()).unwrap();

        let other = Viewer::new(NamespaceId(1), AccessClass::Other);
        assert_eq!(node.show(&other).unwrap(), "0\n");
        assert!(matches!(
            node.store(&other, "3"),
            Err(NetnsError::PermissionDenied { .. })
        ));

        let group = Viewer::new(NamespaceId(1), AccessClass::Group);
        assert_eq!(node.store(&group, "3\n").unwrap(), 2);
        assert_eq!(node.show(&other).unwrap(), "3\n");
    }

    #[test]
    fn test_snapshot_hides_unreadable_value() {
        let net = Directory::root("net");
        let node = NamespaceNode::create(
            &net,
            "data",
            NamespaceId(1),
            AttributeDef::new("property", AttributeMode(0o660)),
        )
        .unwrap();

        let snap = node.snapshot(&Viewer::other(NamespaceId(1)));
        assert_eq!(snap.attributes[0].value, None);
        let snap = node.snapshot(&Viewer::owner(NamespaceId(1)));
        assert_eq!(snap.attributes[0].value, Some(0));
    }
}
