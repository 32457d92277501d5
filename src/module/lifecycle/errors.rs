//! Registration error types
//!
//! `RegistrationError` is a value collected per failed module and returned to
//! the caller. `LifecycleError` is a misuse of the engine's calling contract and
//! fails the offending call immediately.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::status::RegistrationStatus;
use crate::module::traits::{ModuleError, ModulePopulation, RemoteModuleContext};

/// A single failed module or deferred registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationError {
    /// The underlying failure
    #[serde(serialize_with = "serialize_module_error")]
    pub error: ModuleError,
    /// Diagnostic ordinal of the failing module ("2/5")
    pub identifier: String,
    /// Remote identity, for remote modules only
    pub module_context: Option<RemoteModuleContext>,
}

fn serialize_module_error<S: serde::Serializer>(error: &ModuleError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}

impl RegistrationError {
    pub fn new(error: ModuleError, identifier: impl Into<String>, module_context: Option<RemoteModuleContext>) -> Self {
        Self {
            error,
            identifier: identifier.into(),
            module_context,
        }
    }

    /// Name of the remote this error is attributable to, if any
    pub fn remote_name(&self) -> Option<&str> {
        self.module_context.as_ref().map(|c| c.remote_name.as_str())
    }
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module_context {
            Some(context) => write!(f, "[{}] {} ({})", self.identifier, self.error, context),
            None => write!(f, "[{}] {}", self.identifier, self.error),
        }
    }
}

impl std::error::Error for RegistrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Protocol violations: a phase method called out of order or more than once
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("The {population} modules registration can only be called once (current status: {status})")]
    ModulesAlreadyRegistered {
        population: ModulePopulation,
        status: RegistrationStatus,
    },

    #[error("The {population} deferred registrations can only be registered once the modules are registered (current status: {status})")]
    ModulesNotRegistered {
        population: ModulePopulation,
        status: RegistrationStatus,
    },

    #[error("The {population} deferred registrations can only be registered once (current status: {status})")]
    DeferredRegistrationsAlreadyRegistered {
        population: ModulePopulation,
        status: RegistrationStatus,
    },

    #[error("The {population} deferred registrations can only be updated once the modules are ready (current status: {status})")]
    NotReady {
        population: ModulePopulation,
        status: RegistrationStatus,
    },
}

impl LifecycleError {
    /// Status the engine was in when the call was rejected
    pub fn status(&self) -> RegistrationStatus {
        match self {
            LifecycleError::ModulesAlreadyRegistered { status, .. }
            | LifecycleError::ModulesNotRegistered { status, .. }
            | LifecycleError::DeferredRegistrationsAlreadyRegistered { status, .. }
            | LifecycleError::NotReady { status, .. } => *status,
        }
    }
}
