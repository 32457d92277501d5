//! Module Bootstrap - registration lifecycle for modular applications
//!
//! An application is assembled from independently built modules: local code
//! bundles and remotely loaded bundles. Each module registers routes,
//! navigation entries and handlers against a shared runtime, and may need a
//! second registration pass once external data (e.g. a user session) is
//! available.
//!
//! This crate provides the engine coordinating that bootstrap:
//!
//! 1. **Lifecycle engine**: drives one module population through its states,
//!    running registrations concurrently and collecting partial failures
//! 2. **Deferred registrations**: second-phase callbacks, merged and re-run on
//!    every update
//! 3. **Remote loading**: pluggable resolution of a remote's registration
//!    function
//! 4. **Readiness**: the local and remote populations folded into one signal
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use module_bootstrap::module::{
//!     ModuleManager, ModuleRegistration, RegistrationOutcome, StaticRemoteModuleLoader,
//! };
//!
//! # async fn run() {
//! let manager: ModuleManager<(), (), String> =
//!     ModuleManager::new(Arc::new(()), Arc::new(StaticRemoteModuleLoader::<(), (), String>::new()));
//!
//! let module = ModuleRegistration::new(|_runtime, _context| async {
//!     Ok(RegistrationOutcome::deferred(|session: String, _phase| async move {
//!         println!("registering items for {}", session);
//!         Ok(())
//!     }))
//! });
//!
//! manager.register_local_modules(vec![module], None).await.unwrap();
//! manager.register_deferred_registrations("alice".to_string()).await.unwrap();
//! assert!(manager.are_modules_ready());
//! # }
//! ```

pub mod config;
pub mod module;
pub mod utils;

// Re-export config module
pub use config::*;

pub use module::{
    are_modules_ready, are_modules_registered, merge_deferred_registrations, DeferredRegistration,
    DeferredRegistrationPhase, LifecycleError, ModuleError, ModuleManager, ModuleRegistration,
    RegistrationError, RegistrationErrors, RegistrationLifecycle, RegistrationOutcome,
    RegistrationStatus, RemoteDefinition,
};
