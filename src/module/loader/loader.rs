//! Remote module loader implementation
//!
//! Resolves a remote's registration function through an injected transport.
//! The lifecycle engine only ever sees the `RemoteModuleLoader` trait, so the
//! transport can be swapped for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use tracing::debug;

use crate::module::traits::{ModuleError, ModuleRegistration};

/// Resolves the registration function exposed by a remote bundle
///
/// `Ok(None)` means the remote was loaded but does not export a registration
/// function; the engine reports that as a registration error for the remote.
#[async_trait]
pub trait RemoteModuleLoader<R, C, D>: Send + Sync {
    async fn load_register_function(
        &self,
        remote_name: &str,
        module_name: &str,
    ) -> Result<Option<ModuleRegistration<R, C, D>>, ModuleError>;
}

/// Loader backed by an injected async function
///
/// The function receives `(remote_name, module_name)` and performs the actual
/// fetch of the remote's code.
pub struct FnRemoteModuleLoader<F> {
    load: F,
}

impl<F> FnRemoteModuleLoader<F> {
    pub fn new(load: F) -> Self {
        Self { load }
    }
}

#[async_trait]
impl<R, C, D, F, Fut> RemoteModuleLoader<R, C, D> for FnRemoteModuleLoader<F>
where
    R: 'static,
    C: 'static,
    D: 'static,
    F: Fn(String, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<ModuleRegistration<R, C, D>>, ModuleError>> + Send,
{
    async fn load_register_function(
        &self,
        remote_name: &str,
        module_name: &str,
    ) -> Result<Option<ModuleRegistration<R, C, D>>, ModuleError> {
        debug!("Loading remote module {}/{}", remote_name, module_name);
        (self.load)(remote_name.to_string(), module_name.to_string()).await
    }
}

/// In-memory loader mapping remote names to registration functions
///
/// Useful when remotes are linked into the binary, and in tests.
pub struct StaticRemoteModuleLoader<R, C, D> {
    remotes: HashMap<String, Option<ModuleRegistration<R, C, D>>>,
    _marker: PhantomData<fn() -> (R, C, D)>,
}

impl<R, C, D> StaticRemoteModuleLoader<R, C, D> {
    pub fn new() -> Self {
        Self {
            remotes: HashMap::new(),
            _marker: PhantomData,
        }
    }

    /// Register a remote exporting the given registration function
    pub fn with_remote(mut self, remote_name: impl Into<String>, registration: ModuleRegistration<R, C, D>) -> Self {
        self.remotes.insert(remote_name.into(), Some(registration));
        self
    }

    /// Register a remote that loads but exports no registration function
    pub fn with_empty_remote(mut self, remote_name: impl Into<String>) -> Self {
        self.remotes.insert(remote_name.into(), None);
        self
    }
}

impl<R, C, D> Default for StaticRemoteModuleLoader<R, C, D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R, C, D> RemoteModuleLoader<R, C, D> for StaticRemoteModuleLoader<R, C, D>
where
    R: 'static,
    C: 'static,
    D: 'static,
{
    async fn load_register_function(
        &self,
        remote_name: &str,
        module_name: &str,
    ) -> Result<Option<ModuleRegistration<R, C, D>>, ModuleError> {
        match self.remotes.get(remote_name) {
            Some(registration) => Ok(registration.clone()),
            None => Err(ModuleError::RemoteLoadFailed(format!(
                "Remote {} is not available (requested module {})",
                remote_name, module_name
            ))),
        }
    }
}
