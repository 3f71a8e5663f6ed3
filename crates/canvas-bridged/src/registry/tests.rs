//! Unit tests for the object registry.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use rstest::{fixture, rstest};

use super::*;

#[fixture]
fn registry() -> ObjectRegistry {
    ObjectRegistry::new()
}

#[rstest]
fn new_registry_is_empty(registry: ObjectRegistry) {
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
}

#[rstest]
fn insert_then_lookup(registry: ObjectRegistry) {
    let id = registry.insert(HostHandle::new(7));
    let handle = registry.lookup(&id.to_string()).expect("lookup");
    assert_eq!(handle, HostHandle::new(7));
    assert!(registry.contains(&id.to_string()));
}

#[rstest]
fn identifiers_are_hyphenated_uuids(registry: ObjectRegistry) {
    let id = registry.insert(HostHandle::new(1)).to_string();
    assert_eq!(id.len(), 36);
    assert!(Uuid::parse_str(&id).is_ok());
}

#[rstest]
fn lookup_accepts_uppercase_identifiers(registry: ObjectRegistry) {
    let id = registry.insert(HostHandle::new(3));
    let upper = id.to_string().to_uppercase();
    assert_eq!(registry.lookup(&upper), Ok(HostHandle::new(3)));
}

#[rstest]
#[case::unknown_uuid("6f1c1f1e-0000-4000-8000-000000000000")]
#[case::not_a_uuid("component-1")]
#[case::empty("")]
fn lookup_reports_missing_entries(registry: ObjectRegistry, #[case] identifier: &str) {
    registry.insert(HostHandle::new(1));
    let error = registry.lookup(identifier).expect_err("should be missing");
    assert!(matches!(error, RegistryError::NotFound { .. }));
}

#[rstest]
fn remove_all_drains_every_handle(registry: ObjectRegistry) {
    let first = registry.insert(HostHandle::new(1));
    registry.insert(HostHandle::new(2));

    let mut drained = registry.remove_all();
    drained.sort();
    assert_eq!(drained, vec![HostHandle::new(1), HostHandle::new(2)]);
    assert!(registry.is_empty());
    assert!(!registry.contains(&first.to_string()));
}

#[rstest]
fn remove_all_on_empty_registry_is_a_no_op(registry: ObjectRegistry) {
    assert!(registry.remove_all().is_empty());
    assert!(registry.remove_all().is_empty());
}

#[test]
fn concurrent_inserts_are_neither_lost_nor_duplicated() {
    const THREADS: u64 = 4;
    const PER_THREAD: u64 = 250;

    let registry = Arc::new(ObjectRegistry::new());
    let barrier = Arc::new(Barrier::new(4));
    let workers: Vec<_> = (0..THREADS)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..PER_THREAD)
                    .map(|n| registry.insert(HostHandle::new(worker * PER_THREAD + n)))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let ids: HashSet<ComponentId> = workers
        .into_iter()
        .flat_map(|worker| worker.join().expect("join worker"))
        .collect();
    assert_eq!(ids.len(), 1000);
    assert_eq!(registry.len(), 1000);
}

#[test]
fn drains_racing_inserts_account_for_every_handle() {
    let registry = Arc::new(ObjectRegistry::new());
    let inserter = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for n in 0..500 {
                registry.insert(HostHandle::new(n));
            }
        })
    };

    let mut drained = Vec::new();
    while !inserter.is_finished() {
        drained.extend(registry.remove_all());
    }
    inserter.join().expect("join inserter");
    drained.extend(registry.remove_all());

    let unique: HashSet<_> = drained.iter().copied().collect();
    assert_eq!(drained.len(), 500, "every handle drained exactly once");
    assert_eq!(unique.len(), 500);
}
