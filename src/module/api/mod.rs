//! Module registration API surface
//!
//! Telemetry events exposed to collaborators observing the registration.

pub mod events;

pub use events::{RegistrationEvent, RegistrationEventManager};
