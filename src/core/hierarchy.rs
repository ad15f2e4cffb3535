//! The process-wide part of the tree: a named collection under a well-known
//! parent container, and inside it the top-level node that filters its
//! children by namespace.

use crate::config::toml_config::HierarchyConfig;
use crate::core::node::NodeRef;
use crate::core::tree::{Directory, Entry, Resolved, TreeSnapshot};
use crate::domain::model::Viewer;
use crate::utils::error::{NetnsError, Result};
use std::sync::{Arc, Weak};

#[derive(Debug)]
pub struct RootHierarchy {
    parent: Arc<Directory>,
    collection: Arc<Directory>,
    top: Arc<Directory>,
}

/// Weak handles to the global structures, for checking they were freed.
#[derive(Debug, Clone)]
pub struct HierarchyProbe {
    collection: Weak<Directory>,
    top: Weak<Directory>,
}

impl HierarchyProbe {
    pub fn collection_alive(&self) -> bool {
        self.collection.strong_count() > 0
    }

    pub fn top_alive(&self) -> bool {
        self.top.strong_count() > 0
    }

    pub fn is_released(&self) -> bool {
        !self.collection_alive() && !self.top_alive()
    }
}

impl RootHierarchy {
    /// Creates the collection and the top-level node. Nothing survives a
    /// failure.
    pub fn initialize(config: &HierarchyConfig, parent: &Arc<Directory>) -> Result<Self> {
        let collection = match Directory::create(parent, &config.collection, false) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("can't create collection '{}': {}", config.collection, e);
                return Err(NetnsError::AllocationError {
                    what: format!("collection '{}'", config.collection),
                    reason: e.to_string(),
                });
            }
        };

        let top = match Directory::create(&collection, &config.top, true) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("can't create top-level node '{}': {}", config.top, e);
                parent.remove_dir(&collection);
                return Err(NetnsError::AllocationError {
                    what: format!("top-level node '{}'", config.top),
                    reason: e.to_string(),
                });
            }
        };

        tracing::debug!(
            "initialized hierarchy {}/{}/{}",
            parent.name(),
            collection.name(),
            top.name()
        );

        Ok(Self {
            parent: Arc::clone(parent),
            collection,
            top,
        })
    }

    /// Releases the top-level node and the collection. Consuming the handle
    /// rules out a second teardown.
    pub fn teardown(self) {
        tracing::debug!("tearing down hierarchy '{}'", self.collection.name());
        drop(self);
    }

    pub fn collection(&self) -> &Arc<Directory> {
        &self.collection
    }

    pub fn top(&self) -> &Arc<Directory> {
        &self.top
    }

    pub fn probe(&self) -> HierarchyProbe {
        HierarchyProbe {
            collection: Arc::downgrade(&self.collection),
            top: Arc::downgrade(&self.top),
        }
    }

    /// The per-namespace nodes under the top-level node that `viewer` can see.
    pub fn enumerate(&self, viewer: &Viewer) -> Vec<NodeRef> {
        self.top
            .list(viewer)
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Node(node) => Some(node),
                Entry::Dir(_) => None,
            })
            .collect()
    }

    /// Names under `path` (relative to the collection) as seen by `viewer`.
    pub fn list(&self, viewer: &Viewer, path: &str) -> Result<Vec<String>> {
        match self.collection.resolve(viewer, path)? {
            Resolved::Dir(dir) => Ok(dir
                .list(viewer)
                .iter()
                .map(|entry| entry.name().to_string())
                .collect()),
            Resolved::Node(node) => Ok(vec![node.attribute().name.clone()]),
            Resolved::Attribute(_) => Err(NetnsError::NotFound {
                path: format!("{} is not a directory", path),
            }),
        }
    }

    pub fn read_attribute(&self, viewer: &Viewer, path: &str) -> Result<String> {
        match self.collection.resolve(viewer, path)? {
            Resolved::Attribute(node) => node.show(viewer),
            _ => Err(NetnsError::NotFound {
                path: format!("{} is not an attribute", path),
            }),
        }
    }

    pub fn write_attribute(&self, viewer: &Viewer, path: &str, text: &str) -> Result<usize> {
        match self.collection.resolve(viewer, path)? {
            Resolved::Attribute(node) => node.store(viewer, text),
            _ => Err(NetnsError::NotFound {
                path: format!("{} is not an attribute", path),
            }),
        }
    }

    pub fn snapshot(&self, viewer: &Viewer) -> TreeSnapshot {
        self.collection.snapshot(viewer)
    }
}

impl Drop for RootHierarchy {
    fn drop(&mut self) {
        let leftover = self.top.child_count();
        if leftover > 0 {
            tracing::warn!(
                "top-level node '{}' still has {} children at teardown",
                self.top.name(),
                leftover
            );
        }
        self.collection.remove_dir(&self.top);
        self.parent.remove_dir(&self.collection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attribute::AttributeDef;
    use crate::core::node::NamespaceNode;
    use crate::domain::model::NamespaceId;

    #[test]
    fn test_initialize_builds_collection_and_top() {
        let kernel = Directory::root("kernel");
        let hierarchy = RootHierarchy::initialize(&HierarchyConfig::default(), &kernel).unwrap();

        let viewer = Viewer::owner(NamespaceId(1));
        assert_eq!(kernel.list(&viewer).len(), 1);
        assert_eq!(hierarchy.collection().name(), "kset_sysfs_netns");
        assert_eq!(hierarchy.list(&viewer, "").unwrap(), vec!["net"]);
        assert!(hierarchy.top().is_namespace_boundary());
        assert!(hierarchy.list(&viewer, "net").unwrap().is_empty());
    }

    #[test]
    fn test_teardown_releases_everything() {
        let kernel = Directory::root("kernel");
        let hierarchy = RootHierarchy::initialize(&HierarchyConfig::default(), &kernel).unwrap();
        let probe = hierarchy.probe();
        assert!(!probe.is_released());

        hierarchy.teardown();
        assert!(probe.is_released());
        assert_eq!(kernel.child_count(), 0);
    }

    #[test]
    fn test_collection_name_clash_fails_cleanly() {
        let kernel = Directory::root("kernel");
        let _existing = Directory::create(&kernel, "kset_sysfs_netns", false).unwrap();

        let err = RootHierarchy::initialize(&HierarchyConfig::default(), &kernel).unwrap_err();
        assert!(matches!(err, NetnsError::AllocationError { .. }));
        assert_eq!(kernel.child_count(), 1);
    }

    #[test]
    fn test_top_failure_removes_collection() {
        let kernel = Directory::root("kernel");
        let config = HierarchyConfig {
            top: "bad/name".to_string(),
            ..HierarchyConfig::default()
        };

        let err = RootHierarchy::initialize(&config, &kernel).unwrap_err();
        assert!(matches!(err, NetnsError::AllocationError { .. }));
        assert_eq!(kernel.child_count(), 0);
    }

    #[test]
    fn test_attribute_io_through_paths() {
        let kernel = Directory::root("kernel");
        let hierarchy = RootHierarchy::initialize(&HierarchyConfig::default(), &kernel).unwrap();
        let node = NamespaceNode::create(
            hierarchy.top(),
            "data",
            NamespaceId(4),
            AttributeDef::new("property", Default::default()),
        )
        .unwrap();

        let viewer = Viewer::owner(NamespaceId(4));
        assert_eq!(hierarchy.list(&viewer, "net").unwrap(), vec!["data"]);
        assert_eq!(hierarchy.list(&viewer, "net/data").unwrap(), vec!["property"]);
        assert_eq!(hierarchy.write_attribute(&viewer, "net/data/property", "42").unwrap(), 2);
        assert_eq!(hierarchy.read_attribute(&viewer, "net/data/property").unwrap(), "42\n");
        assert!(hierarchy.read_attribute(&viewer, "net/data").is_err());
        assert_eq!(hierarchy.enumerate(&viewer).len(), 1);

        node.detach();
        assert!(hierarchy.enumerate(&viewer).is_empty());
    }
}
