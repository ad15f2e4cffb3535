use crate::config::toml_config::HierarchyConfig;
use crate::core::hierarchy::RootHierarchy;
use crate::core::hooks::NetnsHooks;
use crate::core::node::NodeRef;
use crate::core::tree::Directory;
use crate::domain::model::{Net, SubsysId};
use crate::domain::ports::{NamespaceManager, PernetOperations};
use crate::utils::error::{NetnsError, Result};
use std::sync::Arc;

/// A started module: the hierarchy exists and the hooks are registered.
///
/// Holding the value is the proof of both; `stop` (or dropping it) undoes
/// them exactly once, hooks first.
pub struct NetnsModule {
    manager: Arc<dyn NamespaceManager>,
    subsys: SubsysId,
    // Field order matters: hooks drop before the hierarchy they point into.
    hooks: Arc<NetnsHooks>,
    hierarchy: RootHierarchy,
}

impl NetnsModule {
    pub fn start(
        config: &HierarchyConfig,
        parent: &Arc<Directory>,
        manager: Arc<dyn NamespaceManager>,
    ) -> Result<Self> {
        let hierarchy = RootHierarchy::initialize(config, parent)?;

        let hooks = Arc::new(NetnsHooks::new(
            Arc::clone(hierarchy.top()),
            config.node.clone(),
            config.attribute_def(),
        ));
        let ops: Arc<dyn PernetOperations> = Arc::clone(&hooks) as Arc<dyn PernetOperations>;

        let subsys = match manager.register(ops) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("namespace hook registration failed: {}", e);
                drop(hooks);
                hierarchy.teardown();
                return Err(match e {
                    NetnsError::RegistrationError { .. } => e,
                    other => NetnsError::RegistrationError {
                        message: other.to_string(),
                    },
                });
            }
        };

        tracing::info!(
            "module started: {}/{}/{} registered as {:?}",
            parent.name(),
            config.collection,
            config.top,
            subsys
        );

        Ok(Self {
            manager,
            subsys,
            hooks,
            hierarchy,
        })
    }

    /// Unregisters the hooks, which destroys every remaining per-namespace
    /// node, then tears the hierarchy down.
    pub fn stop(self) {
        tracing::info!("stopping module {:?}", self.subsys);
        drop(self);
    }

    pub fn hierarchy(&self) -> &RootHierarchy {
        &self.hierarchy
    }

    pub fn subsys_id(&self) -> SubsysId {
        self.subsys
    }

    /// The node the hooks stored for `net`.
    pub fn node_for(&self, net: &Net) -> Option<NodeRef> {
        self.hooks.node_for(net)
    }
}

impl Drop for NetnsModule {
    fn drop(&mut self) {
        self.manager.unregister(self.subsys);
        tracing::debug!("hooks {:?} unregistered", self.subsys);
    }
}

impl std::fmt::Debug for NetnsModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetnsModule")
            .field("subsys", &self.subsys)
            .field("hierarchy", &self.hierarchy)
            .finish_non_exhaustive()
    }
}
