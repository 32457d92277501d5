//! Lifecycle engine tests for the local module population

mod common;

use common::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use module_bootstrap::module::{
    DeferredRegistrationPhase, LifecycleError, LocalModules, ModuleError, ModulePopulation, ModuleRegistration,
    RegistrationEvent, RegistrationLifecycle, RegistrationOutcome, RegistrationStatus, StatusChangedListener,
};
use tokio::sync::Barrier;

type Engine = RegistrationLifecycle<LocalModules<TestRuntime, TestContext, TestData>>;

fn engine() -> Engine {
    RegistrationLifecycle::new(LocalModules::new(), TestRuntime::new())
}

#[tokio::test]
async fn test_modules_without_deferred_become_ready() {
    let engine = engine();
    let errors = engine
        .register_modules(vec![route_module("/home"), route_module("/settings")], None)
        .await
        .unwrap();

    assert!(errors.is_empty());
    assert_eq!(engine.status(), RegistrationStatus::Ready);
    assert_eq!(engine.runtime().routes(), vec!["/home", "/settings"]);
}

#[tokio::test]
async fn test_deferred_registration_gates_readiness() {
    let engine = engine();
    let spy = Spy::new();

    engine
        .register_modules(vec![route_module("/home"), deferred_module(&spy)], None)
        .await
        .unwrap();
    assert_eq!(engine.status(), RegistrationStatus::ModulesRegistered);
    assert_eq!(spy.call_count(), 0);

    let errors = engine
        .register_deferred_registrations("session".to_string())
        .await
        .unwrap();
    assert!(errors.is_empty());
    assert_eq!(engine.status(), RegistrationStatus::Ready);
    assert_eq!(
        spy.calls(),
        vec![("session".to_string(), DeferredRegistrationPhase::Register)]
    );
}

#[tokio::test]
async fn test_register_modules_twice_fails_without_affecting_first() {
    let engine = engine();
    let spy = Spy::new();

    let first = engine
        .register_modules(vec![spy_module(&spy), failing_module("broken")], None)
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    let second = engine
        .register_modules(vec![spy_module(&spy)], None)
        .await
        .unwrap_err();
    assert_eq!(
        second,
        LifecycleError::ModulesAlreadyRegistered {
            population: ModulePopulation::Local,
            status: RegistrationStatus::Ready,
        }
    );

    // Second call ran nothing and left the first result intact
    assert_eq!(spy.call_count(), 1);
    assert_eq!(engine.status(), RegistrationStatus::Ready);
    assert_eq!(first[0].identifier, "2/2");
}

#[tokio::test]
async fn test_failing_module_does_not_stop_siblings() {
    let engine = engine();
    let spy = Spy::new();

    let errors = engine
        .register_modules(
            vec![
                spy_module(&spy),
                spy_module(&spy),
                failing_module("module three failed"),
                spy_module(&spy),
            ],
            Some("context".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].identifier, "3/4");
    assert_eq!(
        errors[0].error,
        ModuleError::RegistrationFailed("module three failed".to_string())
    );
    assert!(errors[0].module_context.is_none());
    assert_eq!(spy.call_count(), 3);
}

#[tokio::test]
async fn test_context_and_runtime_are_forwarded() {
    let engine = engine();
    let spy = Spy::new();

    engine
        .register_modules(
            vec![spy_module(&spy), spy_module(&spy), route_module("/a")],
            Some("tenant-1".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(
        spy.calls(),
        vec![Some("tenant-1".to_string()), Some("tenant-1".to_string())]
    );
    assert_eq!(engine.runtime().routes(), vec!["/a"]);
}

#[tokio::test]
async fn test_registrations_start_before_any_settles() {
    let engine = engine();
    let barrier = Arc::new(Barrier::new(3));

    let modules: Vec<TestRegistration> = (0..3)
        .map(|_| -> TestRegistration {
            let barrier = Arc::clone(&barrier);
            ModuleRegistration::new(move |_runtime, _context| {
                let barrier = Arc::clone(&barrier);
                async move {
                    // Only passes once all three registrations are in flight
                    barrier.wait().await;
                    Ok(RegistrationOutcome::NoDeferred)
                }
            })
        })
        .collect();

    let errors = tokio::time::timeout(Duration::from_secs(5), engine.register_modules(modules, None))
        .await
        .expect("registrations were not started concurrently")
        .unwrap();
    assert!(errors.is_empty());
    assert_eq!(engine.status(), RegistrationStatus::Ready);
}

#[tokio::test]
async fn test_panicking_module_is_reported() {
    let engine = engine();
    let spy = Spy::new();
    let errors = engine
        .register_modules(vec![panicking_module("module exploded"), spy_module(&spy)], None)
        .await
        .unwrap();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].identifier, "1/2");
    assert_eq!(errors[0].error, ModuleError::Panicked("module exploded".to_string()));
    assert_eq!(spy.call_count(), 1);
}

#[tokio::test]
async fn test_update_uses_latest_data() {
    let engine = engine();
    let first = Spy::new();
    let second = Spy::new();

    engine
        .register_modules(vec![deferred_module(&first), deferred_module(&second)], None)
        .await
        .unwrap();
    engine
        .register_deferred_registrations("data".to_string())
        .await
        .unwrap();

    first.reset();
    second.reset();

    let errors = engine
        .update_deferred_registrations("data2".to_string())
        .await
        .unwrap();
    assert!(errors.is_empty());

    for spy in [&first, &second] {
        assert_eq!(
            spy.calls(),
            vec![("data2".to_string(), DeferredRegistrationPhase::Update)]
        );
    }
    assert_eq!(engine.status(), RegistrationStatus::Ready);
}

#[tokio::test]
async fn test_update_may_repeat_and_retries_failures() {
    let engine = engine();
    let spy = Spy::new();

    engine
        .register_modules(vec![deferred_module(&spy), failing_deferred_module("no session")], None)
        .await
        .unwrap();
    let errors = engine
        .register_deferred_registrations("a".to_string())
        .await
        .unwrap();
    assert_eq!(errors.len(), 1);

    for data in ["b", "c"] {
        let errors = engine.update_deferred_registrations(data.to_string()).await.unwrap();
        // The failing entry is retained and invoked again on every update
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].identifier, "2/2");
    }

    assert_eq!(spy.call_count(), 3);
    assert_eq!(engine.status(), RegistrationStatus::Ready);
}

#[tokio::test]
async fn test_deferred_phase_protocol_violations() {
    let engine = engine();
    let spy = Spy::new();

    let err = engine
        .register_deferred_registrations("data".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::ModulesNotRegistered { .. }));
    assert_eq!(err.status(), RegistrationStatus::None);

    engine
        .register_modules(vec![deferred_module(&spy)], None)
        .await
        .unwrap();

    let err = engine
        .update_deferred_registrations("data".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotReady { .. }));

    engine
        .register_deferred_registrations("data".to_string())
        .await
        .unwrap();

    let err = engine
        .register_deferred_registrations("again".to_string())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::DeferredRegistrationsAlreadyRegistered {
            status: RegistrationStatus::Ready,
            ..
        }
    ));
    assert_eq!(spy.call_count(), 1);
}

#[tokio::test]
async fn test_end_to_end_with_throwing_deferred() {
    let engine = engine();
    let a = Spy::new();
    let c = Spy::new();
    // Fails before producing a future
    let b = panicking_deferred_module("B cannot register");

    let errors = engine
        .register_modules(vec![deferred_module(&a), b, deferred_module(&c)], None)
        .await
        .unwrap();
    assert!(errors.is_empty());
    assert_eq!(engine.status(), RegistrationStatus::ModulesRegistered);

    let data = r#"{"foo":"bar"}"#.to_string();
    let errors = engine.register_deferred_registrations(data.clone()).await.unwrap();

    assert_eq!(engine.status(), RegistrationStatus::Ready);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].identifier, "2/3");
    assert_eq!(errors[0].error, ModuleError::Panicked("B cannot register".to_string()));
    for spy in [&a, &c] {
        assert_eq!(spy.calls(), vec![(data.clone(), DeferredRegistrationPhase::Register)]);
    }
}

#[tokio::test]
async fn test_deferred_entries_keep_input_order() {
    let engine = engine();
    let spy = Spy::new();

    engine
        .register_modules(
            vec![
                deferred_module(&spy),
                route_module("/x"),
                deferred_module(&spy),
                failing_module("x"),
                deferred_module(&spy),
            ],
            None,
        )
        .await
        .unwrap();

    let identifiers: Vec<&str> = engine
        .deferred_registrations()
        .iter()
        .map(|entry| entry.identifier.as_str())
        .collect();
    assert_eq!(identifiers, vec!["1/5", "3/5", "5/5"]);
}

#[tokio::test]
async fn test_listeners_notified_in_order_on_every_write() {
    let engine = engine();
    let log = Arc::new(Mutex::new(Vec::new()));

    let listener = |name: &'static str| -> StatusChangedListener {
        let log = Arc::clone(&log);
        Arc::new(move || log.lock().unwrap().push(name))
    };
    let first = listener("first");
    let second = listener("second");

    engine.register_status_changed_listener(&first);
    engine.register_status_changed_listener(&second);

    let spy = Spy::new();
    engine.register_modules(vec![deferred_module(&spy)], None).await.unwrap();
    engine.register_deferred_registrations("d".to_string()).await.unwrap();

    // Four writes: registering-modules, modules-registered,
    // registering-deferred-registration, ready
    assert_eq!(
        *log.lock().unwrap(),
        vec!["first", "second", "first", "second", "first", "second", "first", "second"]
    );

    engine.remove_status_changed_listener(&first);
    log.lock().unwrap().clear();

    // Updates never write the status
    engine.update_deferred_registrations("d2".to_string()).await.unwrap();
    assert!(log.lock().unwrap().is_empty());
}

fn event_name(event: &RegistrationEvent) -> &'static str {
    match event {
        RegistrationEvent::ModulesRegistrationStarted { .. } => "modules-started",
        RegistrationEvent::ModulesRegistrationCompleted { .. } => "modules-completed",
        RegistrationEvent::DeferredRegistrationsStarted { .. } => "deferred-started",
        RegistrationEvent::DeferredRegistrationsCompleted { .. } => "deferred-completed",
        RegistrationEvent::RegistrationFailed { .. } => "failed",
    }
}

#[tokio::test]
async fn test_events_dispatched_before_status_write() {
    let engine = engine();
    let events = Arc::new(Mutex::new(engine.event_manager().subscribe()));
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    // Drains pending events, then records the status it observes
    let listener: StatusChangedListener = {
        let events = Arc::clone(&events);
        let log = Arc::clone(&log);
        Arc::new(move || {
            let mut receiver = events.lock().unwrap();
            let mut log = log.lock().unwrap();
            while let Ok(event) = receiver.try_recv() {
                log.push(event_name(&event).to_string());
            }
            log.push("status".to_string());
        })
    };
    engine.register_status_changed_listener(&listener);

    let spy = Spy::new();
    engine
        .register_modules(vec![deferred_module(&spy), failing_module("boom")], None)
        .await
        .unwrap();
    engine.register_deferred_registrations("d".to_string()).await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "status",
            "modules-started",
            "failed",
            "modules-completed",
            "status",
            "status",
            "deferred-started",
            "deferred-completed",
            "status",
        ]
    );
}

#[tokio::test]
async fn test_completed_event_counts() {
    let engine = engine();
    let mut events = engine.event_manager().subscribe();

    engine
        .register_modules(vec![route_module("/a"), failing_module("b"), route_module("/c")], None)
        .await
        .unwrap();

    let mut completed = None;
    while let Ok(event) = events.try_recv() {
        if let RegistrationEvent::ModulesRegistrationCompleted { .. } = event {
            completed = Some(event);
        }
    }

    assert_eq!(
        completed,
        Some(RegistrationEvent::ModulesRegistrationCompleted {
            population: ModulePopulation::Local,
            module_count: 3,
            registered_count: 2,
            error_count: 1,
        })
    );
}

#[tokio::test]
async fn test_status_watch_observes_final_state() {
    let engine = engine();
    let mut status = engine.subscribe_status();
    let spy = Spy::new();

    engine.register_modules(vec![deferred_module(&spy)], None).await.unwrap();
    status.changed().await.unwrap();
    assert_eq!(*status.borrow_and_update(), RegistrationStatus::ModulesRegistered);

    engine.register_deferred_registrations("d".to_string()).await.unwrap();
    status.changed().await.unwrap();
    assert_eq!(*status.borrow(), RegistrationStatus::Ready);
}
