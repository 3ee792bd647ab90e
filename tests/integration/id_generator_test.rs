// Identifier generator stress tests
//
// The generator runs once per transaction, so it must hold up under
// thousands of simultaneous callers without sharing state between them.

use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::RwLock;
use std::thread;
use waf_auditlog::constants::ID_ALPHABET;
use waf_auditlog::id::{new_transaction_id, random_string};

#[test]
fn test_random_string_under_massive_parallel_invocation() {
    const CALLS: usize = 5_000;
    const LEN: usize = 10_000;

    let results: Vec<String> = (0..CALLS)
        .into_par_iter()
        .map(|_| random_string(LEN))
        .collect();

    assert_eq!(results.len(), CALLS);
    for s in &results {
        assert_eq!(s.len(), LEN);
        assert!(s.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }
}

#[test]
fn test_random_string_with_thousands_of_simultaneous_threads() {
    const THREADS: usize = 5_000;
    const LEN: usize = 10_000;

    // Callers block on the gate until every thread exists; the guard is
    // released on unwind too, so a failed spawn cannot strand them
    let gate = RwLock::new(());
    let lengths: Vec<usize> = thread::scope(|s| {
        let held = gate.write().unwrap();
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                thread::Builder::new()
                    .stack_size(64 * 1024)
                    .spawn_scoped(s, || {
                        drop(gate.read().unwrap());
                        let id = random_string(LEN);
                        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
                        id.len()
                    })
                    .expect("Failed to spawn generator thread")
            })
            .collect();
        drop(held);
        handles
            .into_iter()
            .map(|h| h.join().expect("generator thread panicked"))
            .collect()
    });

    assert_eq!(lengths.len(), THREADS);
    assert!(lengths.iter().all(|&len| len == LEN));
}

#[test]
fn test_random_string_from_many_os_threads() {
    const THREADS: usize = 256;
    const PER_THREAD: usize = 20;

    let lengths: Vec<usize> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    (0..PER_THREAD)
                        .map(|_| random_string(1_000).len())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().expect("generator thread panicked"))
            .collect()
    });

    assert_eq!(lengths.len(), THREADS * PER_THREAD);
    assert!(lengths.iter().all(|&len| len == 1_000));
}

#[test]
fn test_transaction_ids_do_not_collide_in_practice() {
    const IDS: usize = 100_000;

    let ids: HashSet<String> = (0..IDS)
        .into_par_iter()
        .map(|_| new_transaction_id())
        .collect();

    assert_eq!(ids.len(), IDS);
}
