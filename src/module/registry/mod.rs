//! Module registries
//!
//! A `ModuleSource` tells the lifecycle engine how to obtain the registration
//! callback of one module. The local and remote populations differ only here.

pub mod local;
pub mod remote;

use async_trait::async_trait;

use crate::module::traits::{ModuleError, ModulePopulation, ModuleRegistration, RemoteModuleContext};

pub use local::LocalModules;
pub use remote::{RemoteModules, DEFAULT_REMOTE_MODULE_NAME};

/// How a population's modules are turned into registration callbacks
#[async_trait]
pub trait ModuleSource: Send + Sync + 'static {
    /// What the caller hands to `register_modules`
    type Module: Send + Sync + 'static;
    /// Opaque runtime forwarded to every registration callback
    type Runtime: Send + Sync + 'static;
    /// Population-scoped context forwarded to first-pass callbacks
    type Context: Clone + Send + Sync + 'static;
    /// Payload forwarded to deferred registrations
    type Data: Clone + Send + Sync + 'static;

    fn population(&self) -> ModulePopulation;

    /// Identity attached to errors produced by this module, if any
    fn module_context(&self, module: &Self::Module) -> Option<RemoteModuleContext>;

    /// Obtain the module's registration callback
    async fn resolve(&self, module: &Self::Module) -> Result<SourceRegistration<Self>, ModuleError>;
}

/// Registration callback type of a given source
pub type SourceRegistration<S> = ModuleRegistration<
    <S as ModuleSource>::Runtime,
    <S as ModuleSource>::Context,
    <S as ModuleSource>::Data,
>;
