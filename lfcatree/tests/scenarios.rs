/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! End-to-end scenarios from `spec.md` §8, run as integration tests against
//! the crate's public surface only (no access to `tree`'s internals) —
//! mirrors the split the teacher keeps between inline `#[cfg(test)]`
//! structural checks and a top-level `tests/` suite for multi-threaded,
//! whole-crate scenarios (e.g. `idx::mtchm::tests::multispam_insert`).

use lfcatree::OrderedIntSet;
use std::collections::HashSet;
use std::thread;

#[test]
fn full_insert_then_full_remove_in_order() {
    let s = OrderedIntSet::new();
    for k in 0..1024 {
        s.insert(k);
    }
    for k in 0..1024 {
        assert!(s.lookup(k));
    }
    for k in 0..1024 {
        s.remove(k);
        for j in (k + 1)..1024 {
            assert!(s.lookup(j), "key {j} vanished after removing {k}");
        }
    }
    for k in 0..1024 {
        assert!(!s.lookup(k));
    }
}

#[test]
fn concurrent_disjoint_inserts_cover_the_whole_key_space() {
    const THREADS: i64 = 8;
    const N: i64 = 20_000;
    let s = OrderedIntSet::new();
    thread::scope(|scope| {
        for t in 0..THREADS {
            let s = &s;
            scope.spawn(move || {
                let mut k = t;
                while k < N {
                    s.insert(k);
                    k += THREADS;
                }
            });
        }
    });
    for k in 0..N {
        assert!(s.lookup(k), "key {k} missing after concurrent disjoint inserts");
    }
    assert_eq!(s.approx_len(), N as usize);
}

#[test]
fn concurrent_partial_remove_leaves_exactly_the_outer_quarters() {
    const N: i64 = 20_000;
    const THREADS: i64 = 8;
    let s = OrderedIntSet::new();
    for k in 0..N {
        s.insert(k);
    }
    let lo = N / 4;
    let hi = N - N / 4;
    thread::scope(|scope| {
        for t in 0..THREADS {
            let s = &s;
            scope.spawn(move || {
                let mut k = lo + t;
                while k < hi {
                    s.remove(k);
                    k += THREADS;
                }
            });
        }
    });
    for k in 0..lo {
        assert!(s.lookup(k));
    }
    for k in lo..hi {
        assert!(!s.lookup(k));
    }
    for k in hi..N {
        assert!(s.lookup(k));
    }
}

#[test]
fn concurrent_mixed_workload_matches_a_sequential_reference() {
    // Every (key, op) pair is driven by exactly one thread, so there's a
    // well-defined sequential answer to compare the final set against even
    // though the operations interleave arbitrarily at runtime.
    const THREADS: usize = 6;
    const N: i64 = 6000;

    let s = OrderedIntSet::new();
    let mut expected = HashSet::new();
    for k in 0..N {
        if k % 5 != 0 {
            s.insert(k);
            expected.insert(k);
        }
    }
    // Threads each own a disjoint residue class and toggle membership by
    // inserting the keys not yet present and removing the ones that are,
    // which is deterministic given the setup above.
    thread::scope(|scope| {
        for t in 0..THREADS {
            let s = &s;
            scope.spawn(move || {
                let mut k = t as i64;
                while k < N {
                    if k % 5 == 0 {
                        s.insert(k);
                    } else {
                        s.remove(k);
                    }
                    k += THREADS as i64;
                }
            });
        }
    });
    for k in 0..N {
        let should_be_present = k % 5 == 0;
        assert_eq!(s.lookup(k), should_be_present, "key {k} diverged from the reference");
    }
}

#[test]
fn concurrent_range_queries_during_mutation_stay_consistent() {
    const N: i64 = 5000;
    let s = OrderedIntSet::new();
    for k in 0..N {
        s.insert(k);
    }
    thread::scope(|scope| {
        let writer = &s;
        scope.spawn(move || {
            for k in (N / 2)..N {
                writer.remove(k);
            }
        });
        for _ in 0..200 {
            let got = s.range_query(0, N / 2 - 1);
            let mut seen = HashSet::new();
            for k in got {
                assert!(seen.insert(k), "range query returned a duplicate key {k}");
                assert!((0..N / 2).contains(&k));
            }
        }
    });
    for k in 0..(N / 2) {
        assert!(s.lookup(k));
    }
}

#[test]
fn adaptation_converges_after_bulk_insert_then_bulk_remove() {
    const N: i64 = 5000;
    let s = OrderedIntSet::new();
    for k in 0..N {
        s.insert(k);
    }
    assert!(
        s.route_count() >= 1,
        "a key count far past one bucket's capacity must have split at least once"
    );
    for k in 0..N {
        s.remove(k);
    }
    assert_eq!(s.approx_len(), 0);
}
