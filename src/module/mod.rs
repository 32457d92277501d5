//! Module registration system
//!
//! Coordinates the bootstrapping of an application assembled from modules.
//!
//! ## Architecture
//!
//! - **Populations**: local modules and remote modules are tracked by separate
//!   lifecycle engines and combined into one readiness signal
//! - **Settle-all**: every registration in a batch runs to completion; one
//!   module's failure never aborts its siblings
//! - **Deferred registrations**: a module may return a second-phase callback,
//!   run once deferred data is available and again on every update
//! - **Protocol checks**: calling a phase out of order fails the call; module
//!   failures are returned as a list instead

pub mod api;
pub mod deferred;
pub mod lifecycle;
pub mod loader;
pub mod manager;
pub mod readiness;
pub mod registry;
pub mod traits;

pub use api::{RegistrationEvent, RegistrationEventManager};
pub use deferred::merge_deferred_registrations;
pub use lifecycle::{
    DeferredRegistrationEntry, LifecycleError, RegistrationError, RegistrationLifecycle,
    RegistrationStatus, StatusChangedListener,
};
pub use loader::{FnRemoteModuleLoader, RemoteModuleLoader, StaticRemoteModuleLoader};
pub use manager::{ModuleManager, RegistrationErrors};
pub use readiness::{are_modules_ready, are_modules_registered};
pub use registry::{LocalModules, ModuleSource, RemoteModules};
pub use traits::{
    DeferredRegistration, DeferredRegistrationPhase, ModuleError, ModulePopulation,
    ModuleRegistration, RegistrationOutcome, RemoteDefinition, RemoteModuleContext,
};
