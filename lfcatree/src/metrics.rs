/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! Debug-only adaptation counters.
//!
//! Grounded on the teacher's `idx::mtchm::mod::CHTRuntimeLog`: a counters
//! struct that's a real `AtomicUsize` group under `cfg(debug_assertions)`
//! and a zero-sized no-op under release, so release builds pay nothing for
//! bookkeeping nobody asked for. Exposed on [`crate::OrderedIntSet`] for
//! tests and the harness's verbose report mode (`spec.md` §8's "adaptation
//! convergence" property is easiest to check by reading these counters
//! rather than re-walking the tree).

use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(debug_assertions)]
struct Counters {
    splits: AtomicUsize,
    joins: AtomicUsize,
    join_aborts: AtomicUsize,
    helps: AtomicUsize,
}

pub struct TreeRuntimeLog {
    #[cfg(debug_assertions)]
    data: Counters,
    #[cfg(not(debug_assertions))]
    data: (),
}

impl TreeRuntimeLog {
    #[cfg(debug_assertions)]
    pub const fn new() -> Self {
        Self {
            data: Counters {
                splits: AtomicUsize::new(0),
                joins: AtomicUsize::new(0),
                join_aborts: AtomicUsize::new(0),
                helps: AtomicUsize::new(0),
            },
        }
    }
    #[cfg(not(debug_assertions))]
    pub const fn new() -> Self {
        Self { data: () }
    }

    #[cfg(debug_assertions)]
    pub(crate) fn on_split(&self) {
        self.data.splits.fetch_add(1, Ordering::Relaxed);
    }
    #[cfg(not(debug_assertions))]
    pub(crate) fn on_split(&self) {}

    #[cfg(debug_assertions)]
    pub(crate) fn on_join(&self) {
        self.data.joins.fetch_add(1, Ordering::Relaxed);
    }
    #[cfg(not(debug_assertions))]
    pub(crate) fn on_join(&self) {}

    #[cfg(debug_assertions)]
    pub(crate) fn on_join_abort(&self) {
        self.data.join_aborts.fetch_add(1, Ordering::Relaxed);
    }
    #[cfg(not(debug_assertions))]
    pub(crate) fn on_join_abort(&self) {}

    #[cfg(debug_assertions)]
    pub(crate) fn on_help(&self) {
        self.data.helps.fetch_add(1, Ordering::Relaxed);
    }
    #[cfg(not(debug_assertions))]
    pub(crate) fn on_help(&self) {}

    #[cfg(debug_assertions)]
    pub fn splits(&self) -> usize {
        self.data.splits.load(Ordering::Relaxed)
    }
    #[cfg(not(debug_assertions))]
    pub fn splits(&self) -> usize {
        0
    }

    #[cfg(debug_assertions)]
    pub fn joins(&self) -> usize {
        self.data.joins.load(Ordering::Relaxed)
    }
    #[cfg(not(debug_assertions))]
    pub fn joins(&self) -> usize {
        0
    }

    #[cfg(debug_assertions)]
    pub fn join_aborts(&self) -> usize {
        self.data.join_aborts.load(Ordering::Relaxed)
    }
    #[cfg(not(debug_assertions))]
    pub fn join_aborts(&self) -> usize {
        0
    }

    #[cfg(debug_assertions)]
    pub fn helps(&self) -> usize {
        self.data.helps.load(Ordering::Relaxed)
    }
    #[cfg(not(debug_assertions))]
    pub fn helps(&self) -> usize {
        0
    }
}

impl Default for TreeRuntimeLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, debug_assertions))]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_increment() {
        let log = TreeRuntimeLog::new();
        assert_eq!(log.splits(), 0);
        log.on_split();
        log.on_split();
        assert_eq!(log.splits(), 2);
        log.on_join();
        assert_eq!(log.joins(), 1);
        log.on_join_abort();
        assert_eq!(log.join_aborts(), 1);
        log.on_help();
        assert_eq!(log.helps(), 1);
    }
}
