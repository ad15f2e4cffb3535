//! Minimal attribute tree: named directories holding either further
//! directories or namespace-scoped nodes.
//!
//! A directory can declare itself a namespace boundary, in which case its
//! children are filtered per viewer: a child is listed, looked up or
//! resolved only when its owning namespace equals the viewer's namespace.
//! Child lists sit behind an `RwLock` so distinct children can be attached
//! and detached from any thread.

use crate::core::node::{NamespaceNode, NodeRef};
use crate::domain::model::{NamespaceId, Viewer};
use crate::utils::error::{NetnsError, Result};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Entry {
    Dir(Arc<Directory>),
    Node(NodeRef),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Dir(dir) => dir.name(),
            Entry::Node(node) => node.name(),
        }
    }

    pub fn namespace(&self) -> Option<NamespaceId> {
        match self {
            Entry::Dir(_) => None,
            Entry::Node(node) => Some(node.owning_namespace()),
        }
    }
}

/// Result of walking a path from a directory.
#[derive(Debug, Clone)]
pub enum Resolved {
    Dir(Arc<Directory>),
    Node(NodeRef),
    /// The node's attribute file.
    Attribute(NodeRef),
}

pub(crate) fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0')
    {
        return Err(NetnsError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[derive(Debug)]
pub struct Directory {
    name: String,
    child_ns_boundary: bool,
    children: RwLock<Vec<Entry>>,
}

impl Directory {
    /// A directory that is not attached anywhere, such as the well-known
    /// parent container the hierarchy hangs off.
    pub fn root(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            child_ns_boundary: false,
            children: RwLock::new(Vec::new()),
        })
    }

    /// Allocates a directory and attaches it under `parent`.
    pub fn create(
        parent: &Arc<Directory>,
        name: &str,
        child_ns_boundary: bool,
    ) -> Result<Arc<Directory>> {
        check_name(name)?;
        let dir = Arc::new(Self {
            name: name.to_string(),
            child_ns_boundary,
            children: RwLock::new(Vec::new()),
        });
        parent.attach(Entry::Dir(Arc::clone(&dir)))?;
        tracing::debug!("attached directory '{}' under '{}'", name, parent.name());
        Ok(dir)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_namespace_boundary(&self) -> bool {
        self.child_ns_boundary
    }

    /// Number of children regardless of viewer.
    pub fn child_count(&self) -> usize {
        self.children.read().len()
    }

    fn conflicts(&self, existing: &Entry, candidate: &Entry) -> bool {
        if existing.name() != candidate.name() {
            return false;
        }
        !self.child_ns_boundary || existing.namespace() == candidate.namespace()
    }

    pub(crate) fn attach(&self, entry: Entry) -> Result<()> {
        let mut children = self.children.write();
        if children.iter().any(|existing| self.conflicts(existing, &entry)) {
            return Err(NetnsError::AlreadyExists {
                parent: self.name.clone(),
                name: entry.name().to_string(),
            });
        }
        children.push(entry);
        Ok(())
    }

    pub(crate) fn remove_node(&self, node: &NamespaceNode) -> bool {
        self.remove_where(|entry| matches!(entry, Entry::Node(n) if std::ptr::eq(n.as_ref(), node)))
    }

    pub(crate) fn remove_dir(&self, dir: &Directory) -> bool {
        self.remove_where(|entry| matches!(entry, Entry::Dir(d) if std::ptr::eq(d.as_ref(), dir)))
    }

    fn remove_where(&self, predicate: impl Fn(&Entry) -> bool) -> bool {
        let mut children = self.children.write();
        match children.iter().position(predicate) {
            Some(index) => {
                children.remove(index);
                true
            }
            None => false,
        }
    }

    /// The visibility predicate: outside a boundary everything is visible,
    /// inside one only entries owned by the viewer's namespace are.
    pub fn visible_to(&self, entry: &Entry, viewer: &Viewer) -> bool {
        !self.child_ns_boundary || entry.namespace() == Some(viewer.namespace)
    }

    pub fn list(&self, viewer: &Viewer) -> Vec<Entry> {
        self.children
            .read()
            .iter()
            .filter(|entry| self.visible_to(entry, viewer))
            .cloned()
            .collect()
    }

    pub fn lookup(&self, viewer: &Viewer, name: &str) -> Option<Entry> {
        self.children
            .read()
            .iter()
            .find(|entry| entry.name() == name && self.visible_to(entry, viewer))
            .cloned()
    }

    /// Walks a `/`-separated path as seen by `viewer`. The last component
    /// may name the attribute of a node.
    pub fn resolve(self: &Arc<Self>, viewer: &Viewer, path: &str) -> Result<Resolved> {
        let not_found = || NetnsError::NotFound {
            path: path.to_string(),
        };
        let mut current = Resolved::Dir(Arc::clone(self));

        for component in path.split('/').filter(|c| !c.is_empty()) {
            current = match current {
                Resolved::Dir(dir) => match dir.lookup(viewer, component).ok_or_else(not_found)? {
                    Entry::Dir(child) => Resolved::Dir(child),
                    Entry::Node(node) => Resolved::Node(node),
                },
                Resolved::Node(node) if node.attribute().name == component => {
                    Resolved::Attribute(node)
                }
                _ => return Err(not_found()),
            };
        }

        Ok(current)
    }

    pub fn snapshot(&self, viewer: &Viewer) -> TreeSnapshot {
        TreeSnapshot {
            name: self.name.clone(),
            namespace: None,
            attributes: Vec::new(),
            children: self
                .list(viewer)
                .iter()
                .map(|entry| match entry {
                    Entry::Dir(dir) => dir.snapshot(viewer),
                    Entry::Node(node) => node.snapshot(viewer),
                })
                .collect(),
        }
    }
}

impl Drop for Directory {
    fn drop(&mut self) {
        tracing::debug!("releasing directory '{}'", self.name);
    }
}

/// Serializable picture of the tree as one viewer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct TreeSnapshot {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<NamespaceId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeSnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeSnapshot {
    pub name: String,
    pub mode: String,
    /// Absent when the viewer may not read it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
}
