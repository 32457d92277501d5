//! Remote module loading
//!
//! Resolution adapter between the lifecycle engine and the remote transport.

pub mod loader;

pub use loader::{FnRemoteModuleLoader, RemoteModuleLoader, StaticRemoteModuleLoader};
