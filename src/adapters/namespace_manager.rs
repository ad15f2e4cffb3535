use crate::domain::model::{ExtensionSlot, NamespaceId, Net, SubsysId};
use crate::domain::ports::{NamespaceManager, PernetOperations};
use crate::utils::error::{NetnsError, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

struct Registered {
    id: SubsysId,
    ops: Arc<dyn PernetOperations>,
}

#[derive(Default)]
struct Registry {
    subsystems: Vec<Registered>,
    next_id: usize,
}

/// In-process namespace manager.
///
/// Namespace creation and destruction hold the registry lock shared, so
/// they run concurrently with each other but never with (un)registration.
#[derive(Default)]
pub struct LocalNamespaceManager {
    registry: RwLock<Registry>,
    namespaces: Mutex<BTreeMap<NamespaceId, Arc<Net>>>,
    next_namespace: AtomicU64,
    fail_next_registration: AtomicBool,
}

impl LocalNamespaceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `register` call fail before running any hook.
    pub fn fail_next_registration(&self) {
        self.fail_next_registration.store(true, Ordering::SeqCst);
    }

    /// Creates a namespace, running every registered `init` in registration
    /// order. If one fails, the ones that already ran are undone and the
    /// namespace never becomes visible.
    pub fn create_namespace(&self, name: &str) -> Result<Arc<Net>> {
        let registry = self.registry.read();
        let id = NamespaceId(self.next_namespace.fetch_add(1, Ordering::Relaxed));
        let net = Arc::new(Net::new(id, name));

        for (index, subsys) in registry.subsystems.iter().enumerate() {
            net.allocate_slot(subsys.id);
            if let Err(e) = subsys.ops.init(&net) {
                tracing::warn!("init of {:?} failed for {} ('{}'): {}", subsys.id, id, name, e);
                net.free_slot(subsys.id);
                for done in registry.subsystems[..index].iter().rev() {
                    done.ops.exit(&net);
                    net.free_slot(done.id);
                }
                return Err(e);
            }
        }

        self.namespaces.lock().insert(id, Arc::clone(&net));
        tracing::debug!("namespace {} ('{}') created", id, name);
        Ok(net)
    }

    /// Runs every registered `exit` in reverse registration order, then
    /// frees the namespace's extension storage.
    pub fn destroy_namespace(&self, id: NamespaceId) -> Result<()> {
        let registry = self.registry.read();
        let net = self
            .namespaces
            .lock()
            .remove(&id)
            .ok_or_else(|| NetnsError::NotFound {
                path: id.to_string(),
            })?;

        for subsys in registry.subsystems.iter().rev() {
            subsys.ops.exit(&net);
            net.free_slot(subsys.id);
        }

        tracing::debug!("namespace {} ('{}') destroyed", id, net.name());
        Ok(())
    }

    pub fn namespace(&self, id: NamespaceId) -> Option<Arc<Net>> {
        self.namespaces.lock().get(&id).cloned()
    }

    pub fn find(&self, name: &str) -> Option<Arc<Net>> {
        self.namespaces
            .lock()
            .values()
            .find(|net| net.name() == name)
            .cloned()
    }

    pub fn namespaces(&self) -> Vec<Arc<Net>> {
        self.namespaces.lock().values().cloned().collect()
    }

    pub fn registered_count(&self) -> usize {
        self.registry.read().subsystems.len()
    }
}

impl NamespaceManager for LocalNamespaceManager {
    fn register(&self, ops: Arc<dyn PernetOperations>) -> Result<SubsysId> {
        let size = ops.storage_size();
        if size == 0 || size > std::mem::size_of::<ExtensionSlot>() {
            return Err(NetnsError::RegistrationError {
                message: format!("unsupported per-namespace storage size {}", size),
            });
        }
        if self.fail_next_registration.swap(false, Ordering::SeqCst) {
            return Err(NetnsError::RegistrationError {
                message: "simulated registration failure".to_string(),
            });
        }

        let mut registry = self.registry.write();
        let id = SubsysId(registry.next_id);
        registry.next_id += 1;
        ops.bind_id(id);

        let live = self.namespaces();
        for (index, net) in live.iter().enumerate() {
            net.allocate_slot(id);
            if let Err(e) = ops.init(net) {
                net.free_slot(id);
                for done in live[..index].iter().rev() {
                    ops.exit(done);
                    done.free_slot(id);
                }
                return Err(NetnsError::RegistrationError {
                    message: format!("init failed for {}: {}", net.id(), e),
                });
            }
        }

        registry.subsystems.push(Registered { id, ops });
        tracing::debug!("registered {:?} ({} live namespaces)", id, live.len());
        Ok(id)
    }

    fn unregister(&self, id: SubsysId) {
        let mut registry = self.registry.write();
        let Some(position) = registry.subsystems.iter().position(|s| s.id == id) else {
            tracing::warn!("unregister of unknown {:?}", id);
            return;
        };
        let subsys = registry.subsystems.remove(position);

        for net in self.namespaces() {
            subsys.ops.exit(&net);
            net.free_slot(id);
        }
        tracing::debug!("unregistered {:?}", id);
    }
}
