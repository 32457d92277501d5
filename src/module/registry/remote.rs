//! Remote module population
//!
//! Remote modules are described by a `RemoteDefinition`; their registration
//! callback is obtained through the injected `RemoteModuleLoader`.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::ModuleSource;
use crate::module::loader::RemoteModuleLoader;
use crate::module::traits::{
    ModuleError, ModulePopulation, ModuleRegistration, RemoteDefinition, RemoteModuleContext,
};

/// Name of the module every remote is expected to expose
pub const DEFAULT_REMOTE_MODULE_NAME: &str = "register";

/// Source for modules loaded from remote bundles
pub struct RemoteModules<R, C, D> {
    loader: Arc<dyn RemoteModuleLoader<R, C, D>>,
    module_name: String,
}

impl<R, C, D> RemoteModules<R, C, D> {
    pub fn new(loader: Arc<dyn RemoteModuleLoader<R, C, D>>) -> Self {
        Self::with_module_name(loader, DEFAULT_REMOTE_MODULE_NAME)
    }

    /// Use a different exposed module name than "register"
    pub fn with_module_name(loader: Arc<dyn RemoteModuleLoader<R, C, D>>, module_name: impl Into<String>) -> Self {
        Self {
            loader,
            module_name: module_name.into(),
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }
}

#[async_trait]
impl<R, C, D> ModuleSource for RemoteModules<R, C, D>
where
    R: Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    D: Clone + Send + Sync + 'static,
{
    type Module = RemoteDefinition;
    type Runtime = R;
    type Context = C;
    type Data = D;

    fn population(&self) -> ModulePopulation {
        ModulePopulation::Remote
    }

    fn module_context(&self, module: &RemoteDefinition) -> Option<RemoteModuleContext> {
        Some(RemoteModuleContext {
            remote_name: module.name.clone(),
            module_name: self.module_name.clone(),
        })
    }

    async fn resolve(&self, module: &RemoteDefinition) -> Result<ModuleRegistration<R, C, D>, ModuleError> {
        debug!("Resolving remote module {}/{}", module.name, self.module_name);

        self.loader
            .load_register_function(&module.name, &self.module_name)
            .await?
            .ok_or_else(|| ModuleError::MissingRegisterFunction {
                remote_name: module.name.clone(),
                module_name: self.module_name.clone(),
            })
    }
}
