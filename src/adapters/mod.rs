// Adapters layer: concrete implementations of the domain ports.

pub mod namespace_manager;

pub use namespace_manager::LocalNamespaceManager;
