//! Event notification system for module registration
//!
//! Publishes advisory telemetry events around every registration phase.
//! Events are dispatched synchronously so they reach subscribers before the
//! status write they describe.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

use crate::module::traits::{DeferredRegistrationPhase, ModulePopulation};

/// Registration telemetry event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RegistrationEvent {
    ModulesRegistrationStarted {
        population: ModulePopulation,
        module_count: usize,
    },
    ModulesRegistrationCompleted {
        population: ModulePopulation,
        module_count: usize,
        registered_count: usize,
        error_count: usize,
    },
    DeferredRegistrationsStarted {
        population: ModulePopulation,
        registration_count: usize,
        phase: DeferredRegistrationPhase,
    },
    DeferredRegistrationsCompleted {
        population: ModulePopulation,
        registration_count: usize,
        error_count: usize,
        phase: DeferredRegistrationPhase,
    },
    RegistrationFailed {
        population: ModulePopulation,
        identifier: String,
        remote: Option<String>,
        message: String,
    },
}

impl RegistrationEvent {
    /// Population the event belongs to
    pub fn population(&self) -> ModulePopulation {
        match self {
            RegistrationEvent::ModulesRegistrationStarted { population, .. }
            | RegistrationEvent::ModulesRegistrationCompleted { population, .. }
            | RegistrationEvent::DeferredRegistrationsStarted { population, .. }
            | RegistrationEvent::DeferredRegistrationsCompleted { population, .. }
            | RegistrationEvent::RegistrationFailed { population, .. } => *population,
        }
    }
}

/// Event subscription manager
///
/// Shared by the local and remote lifecycle engines of one application.
pub struct RegistrationEventManager {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<RegistrationEvent>>>,
}

impl RegistrationEventManager {
    /// Create a new event manager
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to every future registration event
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<RegistrationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Publish an event to all subscribers
    ///
    /// Subscribers whose receiver was dropped are removed.
    pub fn publish(&self, event: RegistrationEvent) {
        debug!("Publishing registration event: {:?}", event);

        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|sender| !sender.is_closed());
        subscribers.len()
    }
}

impl Default for RegistrationEventManager {
    fn default() -> Self {
        Self::new()
    }
}
