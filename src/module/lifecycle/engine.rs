//! Registration lifecycle engine
//!
//! Drives one module population (local or remote) through its registration
//! states. Module failures are collected and returned; calling a phase out of
//! order fails the call with a `LifecycleError`.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::errors::{LifecycleError, RegistrationError};
use super::status::RegistrationStatus;
use crate::module::api::events::{RegistrationEvent, RegistrationEventManager};
use crate::module::registry::ModuleSource;
use crate::module::traits::{
    DeferredRegistration, DeferredRegistrationPhase, ModuleError, ModulePopulation,
    RegistrationOutcome, RemoteModuleContext,
};
use crate::utils::async_helpers::settle_all;

/// Callback fired on every status write
///
/// Carries no payload: listeners re-read `status()` when notified.
pub type StatusChangedListener = Arc<dyn Fn() + Send + Sync>;

/// A deferred registration retained from the first pass
#[derive(Debug, Clone)]
pub struct DeferredRegistrationEntry<D> {
    /// Ordinal of the module that produced it ("2/5"), for diagnostics only
    pub identifier: String,
    /// Remote identity, for remote modules only
    pub module_context: Option<RemoteModuleContext>,
    pub registration: DeferredRegistration<D>,
}

/// Lifecycle engine for one module population
pub struct RegistrationLifecycle<S: ModuleSource> {
    source: S,
    runtime: Arc<S::Runtime>,
    events: Arc<RegistrationEventManager>,
    status: watch::Sender<RegistrationStatus>,
    /// Set exactly once, when the first pass settles
    deferred_registrations: OnceLock<Vec<DeferredRegistrationEntry<S::Data>>>,
    listeners: Mutex<Vec<StatusChangedListener>>,
}

impl<S: ModuleSource> RegistrationLifecycle<S> {
    /// Create an engine with its own event manager
    pub fn new(source: S, runtime: Arc<S::Runtime>) -> Self {
        Self::with_event_manager(source, runtime, Arc::new(RegistrationEventManager::new()))
    }

    /// Create an engine publishing to a shared event manager
    pub fn with_event_manager(source: S, runtime: Arc<S::Runtime>, events: Arc<RegistrationEventManager>) -> Self {
        let (status, _) = watch::channel(RegistrationStatus::None);

        Self {
            source,
            runtime,
            events,
            status,
            deferred_registrations: OnceLock::new(),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn population(&self) -> ModulePopulation {
        self.source.population()
    }

    pub fn status(&self) -> RegistrationStatus {
        *self.status.borrow()
    }

    pub fn runtime(&self) -> &Arc<S::Runtime> {
        &self.runtime
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn event_manager(&self) -> &Arc<RegistrationEventManager> {
        &self.events
    }

    /// Deferred registrations collected by the first pass
    ///
    /// Empty until `register_modules` has settled, read-only afterwards.
    pub fn deferred_registrations(&self) -> &[DeferredRegistrationEntry<S::Data>] {
        self.deferred_registrations
            .get()
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Watch receiver over the status, for callers that await readiness
    pub fn subscribe_status(&self) -> watch::Receiver<RegistrationStatus> {
        self.status.subscribe()
    }

    /// Add a status-changed listener (no-op if already registered)
    pub fn register_status_changed_listener(&self, listener: &StatusChangedListener) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        if !listeners.iter().any(|l| Arc::ptr_eq(l, listener)) {
            listeners.push(Arc::clone(listener));
        }
    }

    pub fn remove_status_changed_listener(&self, listener: &StatusChangedListener) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Run the first registration pass over every module
    ///
    /// All registrations are started concurrently and all of them settle before
    /// this returns. Fails only if the engine was already used.
    pub async fn register_modules(
        &self,
        modules: Vec<S::Module>,
        context: Option<S::Context>,
    ) -> Result<Vec<RegistrationError>, LifecycleError> {
        let population = self.population();

        self.check_register_modules()?;

        if modules.is_empty() {
            debug!("No {} modules to register", population);
            return Ok(Vec::new());
        }

        self.try_transition(|status| self.plan_register_modules(status))?;

        let total = modules.len();
        let identifiers: Vec<String> = (1..=total).map(|i| format!("{}/{}", i, total)).collect();

        info!("Found {} {} module(s) to register", total, population);
        self.events.publish(RegistrationEvent::ModulesRegistrationStarted {
            population,
            module_count: total,
        });

        let results = settle_all(modules.iter().zip(&identifiers).map(|(module, identifier)| {
            let runtime = Arc::clone(&self.runtime);
            let context = context.clone();
            async move {
                info!("{} Registering {} module{}", identifier, population, self.describe(module));
                let registration = self.source.resolve(module).await?;
                let outcome = registration.invoke(runtime, context).await?;
                info!("{} {} module registered", identifier, population);
                Ok::<_, ModuleError>(outcome)
            }
        }))
        .await;

        let mut errors = Vec::new();
        let mut deferred = Vec::new();

        for ((module, identifier), result) in modules.iter().zip(identifiers).zip(results) {
            match result {
                Ok(RegistrationOutcome::Deferred(registration)) => {
                    debug!("{} {} module returned a deferred registration", identifier, population);
                    deferred.push(DeferredRegistrationEntry {
                        identifier,
                        module_context: self.source.module_context(module),
                        registration,
                    });
                }
                Ok(RegistrationOutcome::NoDeferred) => {}
                Err(e) => {
                    error!(
                        "{} An error occurred while registering {} module{}: {}",
                        identifier,
                        population,
                        self.describe(module),
                        e
                    );
                    let failure = RegistrationError::new(e, identifier, self.source.module_context(module));
                    self.publish_failure(&failure);
                    errors.push(failure);
                }
            }
        }

        let deferred_count = deferred.len();
        if self.deferred_registrations.set(deferred).is_err() {
            warn!("{} deferred registrations were already collected", population);
        }

        info!(
            "{}/{} {} module(s) registered, {} deferred registration(s) pending",
            total - errors.len(),
            total,
            population,
            deferred_count
        );
        self.events.publish(RegistrationEvent::ModulesRegistrationCompleted {
            population,
            module_count: total,
            registered_count: total - errors.len(),
            error_count: errors.len(),
        });

        self.set_status(if deferred_count > 0 {
            RegistrationStatus::ModulesRegistered
        } else {
            RegistrationStatus::Ready
        });

        Ok(errors)
    }

    /// Run every retained deferred registration once with the `Register` phase
    ///
    /// Returns immediately with no errors when the first pass produced no
    /// deferred registrations.
    pub async fn register_deferred_registrations(
        &self,
        data: S::Data,
    ) -> Result<Vec<RegistrationError>, LifecycleError> {
        let population = self.population();

        let transitioned = self.try_transition(|status| self.plan_register_deferred_registrations(status))?;

        if !transitioned {
            debug!("No {} deferred registrations to register", population);
            return Ok(Vec::new());
        }

        let errors = self
            .invoke_deferred_registrations(data, DeferredRegistrationPhase::Register)
            .await;

        self.set_status(RegistrationStatus::Ready);

        Ok(errors)
    }

    /// Re-run every retained deferred registration with the `Update` phase
    ///
    /// Only allowed once the population is ready; may be called any number of
    /// times and never changes the status.
    pub async fn update_deferred_registrations(
        &self,
        data: S::Data,
    ) -> Result<Vec<RegistrationError>, LifecycleError> {
        self.check_update_deferred_registrations()?;

        if self.deferred_registrations().is_empty() {
            debug!("No {} deferred registrations to update", self.population());
            return Ok(Vec::new());
        }

        Ok(self
            .invoke_deferred_registrations(data, DeferredRegistrationPhase::Update)
            .await)
    }

    /// Whether `register_modules` would be accepted right now
    ///
    /// Touches nothing; lets a caller driving several engines reject a call
    /// before any of them starts.
    pub fn check_register_modules(&self) -> Result<(), LifecycleError> {
        self.plan_register_modules(self.status()).map(|_| ())
    }

    /// Whether `register_deferred_registrations` would be accepted right now
    pub fn check_register_deferred_registrations(&self) -> Result<(), LifecycleError> {
        self.plan_register_deferred_registrations(self.status()).map(|_| ())
    }

    /// Whether `update_deferred_registrations` would be accepted right now
    pub fn check_update_deferred_registrations(&self) -> Result<(), LifecycleError> {
        match self.status() {
            RegistrationStatus::Ready => Ok(()),
            status => Err(LifecycleError::NotReady {
                population: self.population(),
                status,
            }),
        }
    }

    fn plan_register_modules(&self, status: RegistrationStatus) -> Result<Option<RegistrationStatus>, LifecycleError> {
        match status {
            RegistrationStatus::None => Ok(Some(RegistrationStatus::RegisteringModules)),
            status => Err(LifecycleError::ModulesAlreadyRegistered {
                population: self.population(),
                status,
            }),
        }
    }

    /// `Ok(None)` when ready with nothing deferred: an accepted no-op
    fn plan_register_deferred_registrations(
        &self,
        status: RegistrationStatus,
    ) -> Result<Option<RegistrationStatus>, LifecycleError> {
        let population = self.population();
        let has_deferred = !self.deferred_registrations().is_empty();

        match status {
            RegistrationStatus::None | RegistrationStatus::RegisteringModules => {
                Err(LifecycleError::ModulesNotRegistered { population, status })
            }
            RegistrationStatus::Ready if !has_deferred => Ok(None),
            RegistrationStatus::ModulesRegistered => Ok(Some(RegistrationStatus::RegisteringDeferredRegistration)),
            status => Err(LifecycleError::DeferredRegistrationsAlreadyRegistered { population, status }),
        }
    }

    async fn invoke_deferred_registrations(
        &self,
        data: S::Data,
        phase: DeferredRegistrationPhase,
    ) -> Vec<RegistrationError> {
        let population = self.population();
        let entries = self.deferred_registrations();
        let total = entries.len();

        info!("Found {} {} deferred registration(s) to {}", total, population, phase);
        self.events.publish(RegistrationEvent::DeferredRegistrationsStarted {
            population,
            registration_count: total,
            phase,
        });

        let results = settle_all(entries.iter().map(|entry| {
            let data = data.clone();
            async move {
                info!("{} Running {} deferred registration ({})", entry.identifier, population, phase);
                entry.registration.invoke(data, phase).await
            }
        }))
        .await;

        let mut errors = Vec::new();
        for (entry, result) in entries.iter().zip(results) {
            if let Err(e) = result {
                error!(
                    "{} An error occurred while running {} deferred registration ({}): {}",
                    entry.identifier, population, phase, e
                );
                let failure = RegistrationError::new(e, entry.identifier.clone(), entry.module_context.clone());
                self.publish_failure(&failure);
                errors.push(failure);
            }
        }

        info!(
            "{}/{} {} deferred registration(s) completed ({})",
            total - errors.len(),
            total,
            population,
            phase
        );
        self.events.publish(RegistrationEvent::DeferredRegistrationsCompleted {
            population,
            registration_count: total,
            error_count: errors.len(),
            phase,
        });

        errors
    }

    /// Atomically check the current status and move to the decided one
    ///
    /// `decide` returns `Ok(None)` to leave the status untouched. Returns
    /// whether a transition happened.
    fn try_transition<F>(&self, decide: F) -> Result<bool, LifecycleError>
    where
        F: FnOnce(RegistrationStatus) -> Result<Option<RegistrationStatus>, LifecycleError>,
    {
        let mut outcome = Ok(false);

        self.status.send_if_modified(|status| match decide(*status) {
            Ok(Some(next)) => {
                debug_assert!(status.can_transition_to(next));
                *status = next;
                outcome = Ok(true);
                true
            }
            Ok(None) => false,
            Err(e) => {
                outcome = Err(e);
                false
            }
        });

        if let Ok(true) = outcome {
            self.notify_listeners();
        }
        outcome
    }

    fn set_status(&self, next: RegistrationStatus) {
        let previous = self.status.send_replace(next);
        debug_assert!(previous.can_transition_to(next));
        debug!("{} registration status: {} -> {}", self.population(), previous, next);
        self.notify_listeners();
    }

    fn notify_listeners(&self) {
        // Snapshot so listeners may re-enter the engine
        let listeners: Vec<StatusChangedListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for listener in listeners {
            listener();
        }
    }

    fn publish_failure(&self, failure: &RegistrationError) {
        self.events.publish(RegistrationEvent::RegistrationFailed {
            population: self.population(),
            identifier: failure.identifier.clone(),
            remote: failure.remote_name().map(str::to_string),
            message: failure.error.to_string(),
        });
    }

    fn describe(&self, module: &S::Module) -> String {
        match self.source.module_context(module) {
            Some(context) => format!(" \"{}\"", context),
            None => String::new(),
        }
    }
}
