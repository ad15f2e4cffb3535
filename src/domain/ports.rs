use crate::domain::model::{Net, SubsysId};
use crate::utils::error::Result;
use std::sync::Arc;

/// Callbacks the namespace manager runs for every namespace while the
/// operations are registered.
pub trait PernetOperations: Send + Sync {
    /// Bytes of per-namespace storage the manager must provide.
    fn storage_size(&self) -> usize;

    /// Receives the subsystem id before any `init` runs.
    fn bind_id(&self, id: SubsysId);

    fn init(&self, net: &Net) -> Result<()>;

    /// Must not leave anything reachable for `net` once it returns.
    fn exit(&self, net: &Net);
}

/// The external namespace subsystem.
pub trait NamespaceManager: Send + Sync {
    /// Registers `ops`, running `init` for every live namespace. On failure
    /// nothing stays registered.
    fn register(&self, ops: Arc<dyn PernetOperations>) -> Result<SubsysId>;

    /// Runs `exit` for every live namespace, then forgets the operations.
    fn unregister(&self, id: SubsysId);
}
