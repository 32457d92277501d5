//! Readiness combinators
//!
//! Fold the statuses of the local and remote populations into the booleans
//! used to gate rendering. A population still at `None` was never used and
//! never blocks the other one, but both at `None` is never ready.

use crate::module::lifecycle::RegistrationStatus;

/// Whether the first pass has completed for every population in use
pub fn are_modules_registered(local: RegistrationStatus, remote: RegistrationStatus) -> bool {
    if local == RegistrationStatus::None && remote == RegistrationStatus::None {
        return false;
    }

    is_registered(local) && is_registered(remote)
}

/// Whether every population in use has also completed its deferred registrations
pub fn are_modules_ready(local: RegistrationStatus, remote: RegistrationStatus) -> bool {
    if local == RegistrationStatus::None && remote == RegistrationStatus::None {
        return false;
    }

    is_ready(local) && is_ready(remote)
}

fn is_registered(status: RegistrationStatus) -> bool {
    matches!(
        status,
        RegistrationStatus::None
            | RegistrationStatus::ModulesRegistered
            | RegistrationStatus::RegisteringDeferredRegistration
            | RegistrationStatus::Ready
    )
}

fn is_ready(status: RegistrationStatus) -> bool {
    matches!(status, RegistrationStatus::None | RegistrationStatus::Ready)
}
