//! Registration lifecycle
//!
//! State machine driving one module population through its first pass and its
//! deferred registrations.

pub mod engine;
pub mod errors;
pub mod status;

pub use engine::{DeferredRegistrationEntry, RegistrationLifecycle, StatusChangedListener};
pub use errors::{LifecycleError, RegistrationError};
pub use status::RegistrationStatus;
