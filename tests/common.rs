//! Shared helpers for module registration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use module_bootstrap::module::{
    DeferredRegistrationPhase, ModuleError, ModuleRegistration, RegistrationOutcome,
};

/// Runtime stand-in recording what modules registered against it
#[derive(Debug, Default)]
pub struct TestRuntime {
    routes: Mutex<Vec<String>>,
}

impl TestRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register_route(&self, route: impl Into<String>) {
        self.routes.lock().unwrap().push(route.into());
    }

    pub fn routes(&self) -> Vec<String> {
        let mut routes = self.routes.lock().unwrap().clone();
        routes.sort();
        routes
    }
}

/// Context handed to first-pass registrations
pub type TestContext = String;

/// Deferred data (e.g. the user session)
pub type TestData = String;

pub type TestRegistration = ModuleRegistration<TestRuntime, TestContext, TestData>;

/// Counts calls and records the arguments it was given
#[derive(Debug, Default)]
pub struct Spy<T> {
    calls: Mutex<Vec<T>>,
}

impl<T: Clone> Spy<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn record(&self, value: T) {
        self.calls.lock().unwrap().push(value);
    }

    pub fn calls(&self) -> Vec<T> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }
}

/// Module registering a route and returning nothing
pub fn route_module(route: &'static str) -> TestRegistration {
    ModuleRegistration::new(move |runtime: Arc<TestRuntime>, _context| async move {
        runtime.register_route(route);
        Ok(RegistrationOutcome::NoDeferred)
    })
}

/// Module recording its first-pass call and returning nothing
pub fn spy_module(spy: &Arc<Spy<Option<TestContext>>>) -> TestRegistration {
    let spy = Arc::clone(spy);
    ModuleRegistration::new(move |_runtime, context: Option<TestContext>| {
        let spy = Arc::clone(&spy);
        async move {
            spy.record(context);
            Ok(RegistrationOutcome::NoDeferred)
        }
    })
}

/// Module failing its first pass
pub fn failing_module(message: &'static str) -> TestRegistration {
    ModuleRegistration::new(move |_runtime, _context| async move {
        Err(ModuleError::RegistrationFailed(message.to_string()))
    })
}

/// Module returning a deferred registration that records its calls
pub fn deferred_module(spy: &Arc<Spy<(TestData, DeferredRegistrationPhase)>>) -> TestRegistration {
    let spy = Arc::clone(spy);
    ModuleRegistration::new(move |_runtime, _context| {
        let spy = Arc::clone(&spy);
        async move {
            Ok(RegistrationOutcome::deferred(move |data: TestData, phase| {
                let spy = Arc::clone(&spy);
                async move {
                    spy.record((data, phase));
                    Ok(())
                }
            }))
        }
    })
}

/// Module returning a deferred registration that always fails
pub fn failing_deferred_module(message: &'static str) -> TestRegistration {
    ModuleRegistration::new(move |_runtime, _context| async move {
        Ok(RegistrationOutcome::deferred(move |_data: TestData, _phase| async move {
            Err(ModuleError::DeferredRegistrationFailed(message.to_string()))
        }))
    })
}

/// Module panicking inside its first pass
pub fn panicking_module(message: &'static str) -> TestRegistration {
    ModuleRegistration::new(move |_runtime, _context| async move {
        if !message.is_empty() {
            panic!("{}", message);
        }
        Ok(RegistrationOutcome::NoDeferred)
    })
}

/// Module whose deferred registration panics before returning a future
pub fn panicking_deferred_module(message: &'static str) -> TestRegistration {
    ModuleRegistration::new(move |_runtime, _context| async move {
        Ok(RegistrationOutcome::deferred(move |_data: TestData, _phase| {
            if !message.is_empty() {
                panic!("{}", message);
            }
            async { Ok(()) }
        }))
    })
}

/// Shared call counter
pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
