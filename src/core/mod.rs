pub mod attribute;
pub mod hierarchy;
pub mod hooks;
pub mod module;
pub mod node;
pub mod tree;

pub use crate::domain::model::{Net, NamespaceId, Viewer};
pub use crate::domain::ports::{NamespaceManager, PernetOperations};
pub use crate::utils::error::Result;
