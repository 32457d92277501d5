//! Local module population
//!
//! Local modules are registration callbacks linked into the application.

use async_trait::async_trait;
use std::marker::PhantomData;

use super::ModuleSource;
use crate::module::traits::{ModuleError, ModulePopulation, ModuleRegistration, RemoteModuleContext};

/// Source for modules bundled with the application
pub struct LocalModules<R, C, D> {
    _marker: PhantomData<fn() -> (R, C, D)>,
}

impl<R, C, D> LocalModules<R, C, D> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<R, C, D> Default for LocalModules<R, C, D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R, C, D> ModuleSource for LocalModules<R, C, D>
where
    R: Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    D: Clone + Send + Sync + 'static,
{
    type Module = ModuleRegistration<R, C, D>;
    type Runtime = R;
    type Context = C;
    type Data = D;

    fn population(&self) -> ModulePopulation {
        ModulePopulation::Local
    }

    fn module_context(&self, _module: &Self::Module) -> Option<RemoteModuleContext> {
        None
    }

    async fn resolve(&self, module: &Self::Module) -> Result<ModuleRegistration<R, C, D>, ModuleError> {
        Ok(module.clone())
    }
}
