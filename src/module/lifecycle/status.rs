//! Registration status of a module population

use serde::{Deserialize, Serialize};
use std::fmt;

/// Registration lifecycle state
///
/// The only forward path is
/// `None -> RegisteringModules -> {ModulesRegistered | Ready} -> RegisteringDeferredRegistration -> Ready`.
/// `None` doubles as the sentinel for a population that was never used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistrationStatus {
    #[default]
    None,
    RegisteringModules,
    ModulesRegistered,
    RegisteringDeferredRegistration,
    Ready,
}

impl RegistrationStatus {
    /// Stable string form, matching the serialized representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::None => "none",
            RegistrationStatus::RegisteringModules => "registering-modules",
            RegistrationStatus::ModulesRegistered => "modules-registered",
            RegistrationStatus::RegisteringDeferredRegistration => "registering-deferred-registration",
            RegistrationStatus::Ready => "ready",
        }
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(&self, next: RegistrationStatus) -> bool {
        use RegistrationStatus::*;
        matches!(
            (self, next),
            (None, RegisteringModules)
                | (RegisteringModules, ModulesRegistered)
                | (RegisteringModules, Ready)
                | (ModulesRegistered, RegisteringDeferredRegistration)
                | (RegisteringDeferredRegistration, Ready)
        )
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
