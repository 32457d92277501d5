//! Module system traits and interfaces
//!
//! Defines the callback types modules hand to the registration engine and the
//! errors a single module registration can produce.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Which module population a lifecycle engine drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModulePopulation {
    /// Modules bundled with the application
    Local,
    /// Modules loaded from a remote bundle at runtime
    Remote,
}

impl fmt::Display for ModulePopulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModulePopulation::Local => write!(f, "local"),
            ModulePopulation::Remote => write!(f, "remote"),
        }
    }
}

/// Phase tag handed to every deferred registration
///
/// `Register` is used on the first deferred pass, `Update` on every later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeferredRegistrationPhase {
    Register,
    Update,
}

impl fmt::Display for DeferredRegistrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferredRegistrationPhase::Register => write!(f, "register"),
            DeferredRegistrationPhase::Update => write!(f, "update"),
        }
    }
}

/// Remote module definition (one entry per remote bundle)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDefinition {
    /// Remote name, as known to the remote loading transport
    pub name: String,
}

impl RemoteDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Identity of a remote module, attached to errors for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteModuleContext {
    /// Name of the remote bundle
    pub remote_name: String,
    /// Name of the module exposed by the remote (usually "register")
    pub module_name: String,
}

impl fmt::Display for RemoteModuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.remote_name, self.module_name)
    }
}

/// Errors produced by a single module or deferred registration
///
/// These are collected into the error list of a registration phase and never
/// abort sibling registrations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    #[error("Module registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Deferred registration failed: {0}")]
    DeferredRegistrationFailed(String),

    #[error("Failed to load remote module: {0}")]
    RemoteLoadFailed(String),

    #[error("Remote module \"{remote_name}/{module_name}\" does not export a registration function")]
    MissingRegisterFunction {
        remote_name: String,
        module_name: String,
    },

    #[error("Module panicked: {0}")]
    Panicked(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Module operation failed: {0}")]
    OperationError(String),
}

impl From<serde_json::Error> for ModuleError {
    fn from(e: serde_json::Error) -> Self {
        ModuleError::SerializationError(e.to_string())
    }
}

impl From<anyhow::Error> for ModuleError {
    fn from(e: anyhow::Error) -> Self {
        ModuleError::OperationError(e.to_string())
    }
}

type DeferredFn<D> =
    dyn Fn(D, DeferredRegistrationPhase) -> BoxFuture<'static, Result<(), ModuleError>> + Send + Sync;

type RegisterFn<R, C, D> = dyn Fn(Arc<R>, Option<C>) -> BoxFuture<'static, Result<RegistrationOutcome<D>, ModuleError>>
    + Send
    + Sync;

/// Second-phase callback a module may return from its first registration pass
///
/// Invoked with the deferred data and the phase tag once the data is available,
/// and again with `Update` on every refresh.
pub struct DeferredRegistration<D> {
    inner: Arc<DeferredFn<D>>,
}

impl<D> DeferredRegistration<D> {
    /// Wrap an async closure as a deferred registration
    pub fn new<F, Fut>(f: F) -> Self
    where
        D: 'static,
        F: Fn(D, DeferredRegistrationPhase) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ModuleError>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |data: D, phase: DeferredRegistrationPhase| -> BoxFuture<'static, Result<(), ModuleError>> {
                Box::pin(f(data, phase))
            }),
        }
    }

    /// Invoke the deferred registration
    pub fn invoke(&self, data: D, phase: DeferredRegistrationPhase) -> BoxFuture<'static, Result<(), ModuleError>> {
        (self.inner)(data, phase)
    }

    /// Whether both handles point at the same callback
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<D> Clone for DeferredRegistration<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D> fmt::Debug for DeferredRegistration<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredRegistration")
            .field("callback", &Arc::as_ptr(&self.inner))
            .finish()
    }
}

/// Result of a module's first registration pass
#[derive(Debug, Clone)]
pub enum RegistrationOutcome<D> {
    /// The module has nothing left to register
    NoDeferred,
    /// The module needs a second pass once deferred data is available
    Deferred(DeferredRegistration<D>),
}

impl<D> RegistrationOutcome<D> {
    /// Shorthand for `RegistrationOutcome::Deferred(DeferredRegistration::new(f))`
    pub fn deferred<F, Fut>(f: F) -> Self
    where
        D: 'static,
        F: Fn(D, DeferredRegistrationPhase) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ModuleError>> + Send + 'static,
    {
        RegistrationOutcome::Deferred(DeferredRegistration::new(f))
    }

    pub fn into_deferred(self) -> Option<DeferredRegistration<D>> {
        match self {
            RegistrationOutcome::NoDeferred => None,
            RegistrationOutcome::Deferred(registration) => Some(registration),
        }
    }
}

impl<D> From<Option<DeferredRegistration<D>>> for RegistrationOutcome<D> {
    fn from(registration: Option<DeferredRegistration<D>>) -> Self {
        match registration {
            Some(registration) => RegistrationOutcome::Deferred(registration),
            None => RegistrationOutcome::NoDeferred,
        }
    }
}

/// A module's first-pass registration callback
///
/// Receives the shared runtime and the population-scoped context. It is invoked
/// exactly once per registration run.
pub struct ModuleRegistration<R, C, D> {
    inner: Arc<RegisterFn<R, C, D>>,
}

impl<R, C, D> ModuleRegistration<R, C, D> {
    /// Wrap an async closure as a module registration
    pub fn new<F, Fut>(f: F) -> Self
    where
        R: 'static,
        C: 'static,
        D: 'static,
        F: Fn(Arc<R>, Option<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RegistrationOutcome<D>, ModuleError>> + Send + 'static,
    {
        Self {
            inner: Arc::new(
                move |runtime: Arc<R>, context: Option<C>| -> BoxFuture<'static, Result<RegistrationOutcome<D>, ModuleError>> {
                    Box::pin(f(runtime, context))
                },
            ),
        }
    }

    /// Invoke the registration callback
    pub fn invoke(
        &self,
        runtime: Arc<R>,
        context: Option<C>,
    ) -> BoxFuture<'static, Result<RegistrationOutcome<D>, ModuleError>> {
        (self.inner)(runtime, context)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<R, C, D> Clone for ModuleRegistration<R, C, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, C, D> fmt::Debug for ModuleRegistration<R, C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistration")
            .field("callback", &Arc::as_ptr(&self.inner))
            .finish()
    }
}
