pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::LocalNamespaceManager;
pub use config::toml_config::{HierarchyConfig, TomlConfig};
pub use crate::core::{
    hierarchy::RootHierarchy, hooks::NetnsHooks, module::NetnsModule, node::NamespaceNode,
    tree::Directory,
};
pub use domain::model::{AccessClass, NamespaceId, Net, Viewer};
pub use utils::error::{NetnsError, Result};
