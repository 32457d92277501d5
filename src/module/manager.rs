//! Module manager for orchestrating module registration
//!
//! Owns one lifecycle engine per module population (local and remote), shares
//! the runtime and event manager between them, and exposes the registration
//! facade the rest of the application calls.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::BootstrapConfig;
use crate::module::api::events::{RegistrationEvent, RegistrationEventManager};
use crate::module::lifecycle::{
    LifecycleError, RegistrationError, RegistrationLifecycle, RegistrationStatus, StatusChangedListener,
};
use crate::module::loader::RemoteModuleLoader;
use crate::module::readiness::{are_modules_ready, are_modules_registered};
use crate::module::registry::{LocalModules, RemoteModules, DEFAULT_REMOTE_MODULE_NAME};
use crate::module::traits::{ModuleRegistration, RemoteDefinition};

/// Errors collected across both populations by one facade call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationErrors {
    pub local: Vec<RegistrationError>,
    pub remote: Vec<RegistrationError>,
}

impl RegistrationErrors {
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.remote.is_empty()
    }

    pub fn len(&self) -> usize {
        self.local.len() + self.remote.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistrationError> {
        self.local.iter().chain(self.remote.iter())
    }
}

/// Module manager coordinating the local and remote populations
pub struct ModuleManager<R, C, D>
where
    R: Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    D: Clone + Send + Sync + 'static,
{
    local: RegistrationLifecycle<LocalModules<R, C, D>>,
    remote: RegistrationLifecycle<RemoteModules<R, C, D>>,
    events: Arc<RegistrationEventManager>,
    /// Remotes declared in configuration
    configured_remotes: Vec<RemoteDefinition>,
}

impl<R, C, D> ModuleManager<R, C, D>
where
    R: Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    D: Clone + Send + Sync + 'static,
{
    /// Create a new module manager
    pub fn new(runtime: Arc<R>, loader: Arc<dyn RemoteModuleLoader<R, C, D>>) -> Self {
        Self::with_remote_module_name(runtime, loader, DEFAULT_REMOTE_MODULE_NAME)
    }

    /// Create a module manager whose remotes expose `module_name`
    pub fn with_remote_module_name(
        runtime: Arc<R>,
        loader: Arc<dyn RemoteModuleLoader<R, C, D>>,
        module_name: &str,
    ) -> Self {
        let events = Arc::new(RegistrationEventManager::new());

        Self {
            local: RegistrationLifecycle::with_event_manager(
                LocalModules::new(),
                Arc::clone(&runtime),
                Arc::clone(&events),
            ),
            remote: RegistrationLifecycle::with_event_manager(
                RemoteModules::with_module_name(loader, module_name),
                runtime,
                Arc::clone(&events),
            ),
            events,
            configured_remotes: Vec::new(),
        }
    }

    /// Create a module manager from configuration
    pub fn from_config(
        runtime: Arc<R>,
        loader: Arc<dyn RemoteModuleLoader<R, C, D>>,
        config: &BootstrapConfig,
    ) -> Self {
        let mut manager = Self::with_remote_module_name(runtime, loader, &config.remotes.exposed_module);
        manager.configured_remotes = config.remotes.definitions.clone();
        manager
    }

    pub fn local(&self) -> &RegistrationLifecycle<LocalModules<R, C, D>> {
        &self.local
    }

    pub fn remote(&self) -> &RegistrationLifecycle<RemoteModules<R, C, D>> {
        &self.remote
    }

    pub fn runtime(&self) -> &Arc<R> {
        self.local.runtime()
    }

    pub fn configured_remotes(&self) -> &[RemoteDefinition] {
        &self.configured_remotes
    }

    /// Get event manager for registration telemetry
    pub fn event_manager(&self) -> &Arc<RegistrationEventManager> {
        &self.events
    }

    pub fn subscribe_events(&self) -> mpsc::UnboundedReceiver<RegistrationEvent> {
        self.events.subscribe()
    }

    pub fn local_status(&self) -> RegistrationStatus {
        self.local.status()
    }

    pub fn remote_status(&self) -> RegistrationStatus {
        self.remote.status()
    }

    pub fn are_modules_registered(&self) -> bool {
        are_modules_registered(self.local_status(), self.remote_status())
    }

    pub fn are_modules_ready(&self) -> bool {
        are_modules_ready(self.local_status(), self.remote_status())
    }

    /// Listen to status changes of both populations
    pub fn register_status_changed_listener(&self, listener: &StatusChangedListener) {
        self.local.register_status_changed_listener(listener);
        self.remote.register_status_changed_listener(listener);
    }

    pub fn remove_status_changed_listener(&self, listener: &StatusChangedListener) {
        self.local.remove_status_changed_listener(listener);
        self.remote.remove_status_changed_listener(listener);
    }

    /// Register the modules bundled with the application
    pub async fn register_local_modules(
        &self,
        modules: Vec<ModuleRegistration<R, C, D>>,
        context: Option<C>,
    ) -> Result<Vec<RegistrationError>, LifecycleError> {
        info!("Registering {} local module(s)", modules.len());
        self.local.register_modules(modules, context).await
    }

    /// Register modules from remote bundles
    pub async fn register_remote_modules(
        &self,
        remotes: Vec<RemoteDefinition>,
        context: Option<C>,
    ) -> Result<Vec<RegistrationError>, LifecycleError> {
        info!("Registering {} remote module(s)", remotes.len());
        self.remote.register_modules(remotes, context).await
    }

    /// Register the remotes declared in configuration
    pub async fn register_configured_remote_modules(
        &self,
        context: Option<C>,
    ) -> Result<Vec<RegistrationError>, LifecycleError> {
        self.register_remote_modules(self.configured_remotes.clone(), context)
            .await
    }

    /// Register both populations concurrently
    ///
    /// Both populations are checked first: if either one would reject the
    /// call, neither runs.
    pub async fn register_modules(
        &self,
        modules: Vec<ModuleRegistration<R, C, D>>,
        remotes: Vec<RemoteDefinition>,
        context: Option<C>,
    ) -> Result<RegistrationErrors, LifecycleError> {
        // A rejected call leaves both populations untouched
        self.local.check_register_modules()?;
        self.remote.check_register_modules()?;

        let (local, remote) = futures::join!(
            self.register_local_modules(modules, context.clone()),
            self.register_remote_modules(remotes, context)
        );

        Ok(RegistrationErrors {
            local: local?,
            remote: remote?,
        })
    }

    /// Run the deferred registrations of every population in use
    ///
    /// A population still at `None` was never used and is skipped. Every
    /// population in use is checked first: if one would reject the call,
    /// none runs.
    pub async fn register_deferred_registrations(&self, data: D) -> Result<RegistrationErrors, LifecycleError> {
        if self.local.status() != RegistrationStatus::None {
            self.local.check_register_deferred_registrations()?;
        }
        if self.remote.status() != RegistrationStatus::None {
            self.remote.check_register_deferred_registrations()?;
        }

        let (local, remote) = futures::join!(
            async {
                if self.local.status() == RegistrationStatus::None {
                    debug!("Skipping local deferred registrations: no local modules registered");
                    return Ok(Vec::new());
                }
                self.local.register_deferred_registrations(data.clone()).await
            },
            async {
                if self.remote.status() == RegistrationStatus::None {
                    debug!("Skipping remote deferred registrations: no remote modules registered");
                    return Ok(Vec::new());
                }
                self.remote.register_deferred_registrations(data.clone()).await
            }
        );

        let errors = RegistrationErrors {
            local: local?,
            remote: remote?,
        };
        if !errors.is_empty() {
            warn!("{} deferred registration(s) failed", errors.len());
        }
        Ok(errors)
    }

    /// Re-run the deferred registrations of every population in use
    pub async fn update_deferred_registrations(&self, data: D) -> Result<RegistrationErrors, LifecycleError> {
        if self.local.status() != RegistrationStatus::None {
            self.local.check_update_deferred_registrations()?;
        }
        if self.remote.status() != RegistrationStatus::None {
            self.remote.check_update_deferred_registrations()?;
        }

        let (local, remote) = futures::join!(
            async {
                if self.local.status() == RegistrationStatus::None {
                    return Ok(Vec::new());
                }
                self.local.update_deferred_registrations(data.clone()).await
            },
            async {
                if self.remote.status() == RegistrationStatus::None {
                    return Ok(Vec::new());
                }
                self.remote.update_deferred_registrations(data.clone()).await
            }
        );

        let errors = RegistrationErrors {
            local: local?,
            remote: remote?,
        };
        if !errors.is_empty() {
            warn!("{} deferred registration update(s) failed", errors.len());
        }
        Ok(errors)
    }

    /// Wait until the first pass has completed for every population in use
    ///
    /// Never resolves while both populations stay at `None`.
    pub async fn wait_until_modules_registered(&self) {
        self.wait_until(are_modules_registered).await
    }

    /// Wait until every population in use is ready
    ///
    /// Never resolves while both populations stay at `None`.
    pub async fn wait_until_modules_ready(&self) {
        self.wait_until(are_modules_ready).await
    }

    async fn wait_until(&self, predicate: fn(RegistrationStatus, RegistrationStatus) -> bool) {
        let mut local = self.local.subscribe_status();
        let mut remote = self.remote.subscribe_status();

        loop {
            let local_status = *local.borrow_and_update();
            let remote_status = *remote.borrow_and_update();
            if predicate(local_status, remote_status) {
                return;
            }

            if !Self::changed(&mut local, &mut remote).await {
                return;
            }
        }
    }

    /// Wait for either status to change; false once both senders are gone
    async fn changed(
        local: &mut watch::Receiver<RegistrationStatus>,
        remote: &mut watch::Receiver<RegistrationStatus>,
    ) -> bool {
        tokio::select! {
            changed = local.changed() => changed.is_ok(),
            changed = remote.changed() => changed.is_ok(),
        }
    }
}
