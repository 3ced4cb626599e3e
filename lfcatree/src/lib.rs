/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! `lfcatree` is a concurrent ordered set of `i64` keys backed by the
//! Lock-Free Contention-Adapting (LFCA) search tree (`spec.md` §1–§4): a
//! coarse external index of *route nodes* over small, immutable *bucket*
//! leaves, where every structural mutation is a compare-and-swap and hot
//! buckets split while cold sibling buckets join back together.
//!
//! The only type most callers need is [`OrderedIntSet`]. Everything under
//! [`tree`](crate::tree) is the mechanism; it's `pub(crate)` because the
//! tagged-sum node types and the help/adapt protocol are not something a
//! caller should ever poke at directly — the four methods on
//! `OrderedIntSet` are the whole linearizable surface (`spec.md` §6).
//!
//! # Memory reclamation
//!
//! The tree itself never frees a node it unlinks (`spec.md` §5, §9): it
//! hands every CAS'd-out node to [`crossbeam_epoch`]'s epoch-based
//! reclamation via `Guard::defer_destroy`, so a thread that's still holding
//! a pinned guard over a stale node never has it freed out from under it.
//! `OrderedIntSet`'s own `Drop` walks what's left of the tree and frees it
//! directly under an unprotected guard, since by that point there are no
//! other owners left to race.

mod bucket;
pub(crate) mod config;
mod error;
pub(crate) mod macros;
pub mod metrics;
pub(crate) mod sync;
pub(crate) mod tree;

pub use error::ConfigError;
pub use metrics::TreeRuntimeLog;

use sync::atm::{upin, Guard};
use tree::node::Node;
use tree::RawTree;

/// A concurrent, linearizable set of `i64` keys (`spec.md` §6).
///
/// Cloning an `OrderedIntSet` is cheap and gives you another handle onto
/// the *same* underlying tree (compare to `Arc<Mutex<_>>`, except there's
/// no mutex): all operations on either handle observe and contribute to one
/// shared structure.
pub struct OrderedIntSet {
    tree: std::sync::Arc<RawTree>,
}

impl OrderedIntSet {
    /// A new, empty set.
    pub fn new() -> Self {
        Self {
            tree: std::sync::Arc::new(RawTree::new()),
        }
    }

    /// Inserts `key`. Returns `true` if the set did not already contain it.
    ///
    /// Linearizable; idempotent on membership (re-inserting an already
    /// present key is a no-op that still returns `false`).
    pub fn insert(&self, key: i64) -> bool {
        let guard = self.pin();
        tree::update::insert(&self.tree, key, &guard)
    }

    /// Removes `key`. Returns `true` if it was present.
    ///
    /// Linearizable.
    pub fn remove(&self, key: i64) -> bool {
        let guard = self.pin();
        tree::update::remove(&self.tree, key, &guard)
    }

    /// Tests whether `key` is a member. Linearizable.
    pub fn lookup(&self, key: i64) -> bool {
        let guard = self.pin();
        tree::update::lookup(&self.tree, key, &guard)
    }

    /// All keys `k` with `lo <= k <= hi`, at some instant between
    /// invocation and return, as an unordered sequence with no duplicates
    /// (`spec.md` §6, §4.5). Panics if `lo > hi`.
    pub fn range_query(&self, lo: i64, hi: i64) -> Vec<i64> {
        assert!(lo <= hi, "range_query requires lo <= hi, got lo={lo} hi={hi}");
        let guard = self.pin();
        tree::update::range_query(&self.tree, lo, hi, &guard)
    }

    /// Approximate number of keys currently in the set.
    ///
    /// Not linearizable: it sums live bucket sizes observed one base at a
    /// time and a concurrent mutation can be counted once, twice, or not at
    /// all. Useful for tests, metrics, and the harness's reporting, not for
    /// anything that needs an exact snapshot.
    pub fn approx_len(&self) -> usize {
        let guard = self.pin();
        let mut total = 0usize;
        walk_bases(&self.tree, &guard, |b| total += b.bucket.len());
        total
    }

    /// How many route nodes the tree currently has. Exposed for tests and
    /// the harness's adaptation-convergence reporting (`spec.md` §8).
    pub fn route_count(&self) -> usize {
        let guard = self.pin();
        let mut total = 0usize;
        walk_routes(&self.tree, &guard, |_| total += 1);
        total
    }

    /// The debug-only split/join/help counters for this set's tree
    /// (`spec.md` §8's adaptation-convergence property, observed directly
    /// rather than by re-walking the structure). Always reads zero in
    /// release builds.
    pub fn runtime_log(&self) -> &TreeRuntimeLog {
        &self.tree.metrics
    }

    fn pin(&self) -> Guard {
        self.tree.pin()
    }
}

impl Default for OrderedIntSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for OrderedIntSet {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

/// Walks every live base reachable from the root and calls `f` on each.
/// Used only by the approximate diagnostics above and by tests; the tree's
/// own algorithms never need a full walk.
fn walk_bases(tree: &RawTree, guard: &Guard, mut f: impl FnMut(&tree::node::Base)) {
    fn go(n: sync::atm::Shared<Node>, guard: &Guard, f: &mut impl FnMut(&tree::node::Base)) {
        if n.is_null() {
            return;
        }
        match unsafe { n.deref() } {
            Node::Route(r) => {
                go(r.left.ld_acq(guard), guard, f);
                go(r.right.ld_acq(guard), guard, f);
            }
            Node::Base(b) => f(b),
        }
    }
    go(tree.root_slot().ld_acq(guard), guard, &mut f);
}

fn walk_routes(tree: &RawTree, guard: &Guard, mut f: impl FnMut(&tree::node::Route)) {
    fn go(n: sync::atm::Shared<Node>, guard: &Guard, f: &mut impl FnMut(&tree::node::Route)) {
        if n.is_null() {
            return;
        }
        match unsafe { n.deref() } {
            Node::Route(r) => {
                f(r);
                go(r.left.ld_acq(guard), guard, f);
                go(r.right.ld_acq(guard), guard, f);
            }
            Node::Base(_) => {}
        }
    }
    go(tree.root_slot().ld_acq(guard), guard, &mut f);
}

/// Recursively frees whatever is left of the tree once its last `Arc`
/// handle is dropped. Mirrors the teacher's `RawTree::drop` /
/// `_rdrop`/`rdrop` shape (`idx::mtchm::mod.rs`): at this point there are
/// no other pinned readers racing us, so an unprotected guard is sound.
impl Drop for RawTree {
    fn drop(&mut self) {
        unsafe {
            let guard = upin();
            rdrop(self.root_slot().ld_acq(&guard));
        }
    }
}

unsafe fn rdrop(n: sync::atm::Shared<Node>) {
    if n.is_null() {
        return;
    }
    let owned = n.into_owned();
    if let Node::Route(r) = &*owned {
        let guard = upin();
        rdrop(r.left.ld_acq(&guard));
        rdrop(r.right.ld_acq(&guard));
    }
    drop(owned);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_reports_nothing() {
        let s = OrderedIntSet::new();
        assert!(!s.lookup(0));
        assert_eq!(s.range_query(-100, 100), Vec::<i64>::new());
    }

    #[test]
    fn small_insert_lookup() {
        let s = OrderedIntSet::new();
        for k in 1..=5 {
            assert!(s.insert(k));
        }
        for k in 1..=5 {
            assert!(s.lookup(k));
        }
        assert!(!s.lookup(0));
        assert!(!s.lookup(6));
    }

    #[test]
    fn reinsert_is_a_membership_noop() {
        let s = OrderedIntSet::new();
        assert!(s.insert(7));
        assert!(!s.insert(7));
        assert!(s.lookup(7));
    }

    #[test]
    fn remove_reports_presence() {
        let s = OrderedIntSet::new();
        assert!(!s.remove(1));
        s.insert(1);
        assert!(s.remove(1));
        assert!(!s.lookup(1));
        assert!(!s.remove(1));
    }

    #[test]
    fn range_across_split() {
        let s = OrderedIntSet::new();
        for k in 0..1024 {
            s.insert(k);
        }
        let mut got = s.range_query(100, 200);
        got.sort_unstable();
        let want: Vec<i64> = (100..=200).collect();
        assert_eq!(got, want);
        assert!(s.route_count() >= 1, "1024 keys must have triggered at least one split");
    }

    #[test]
    fn range_small_subset() {
        let s = OrderedIntSet::new();
        for k in 1..=9 {
            s.insert(k);
        }
        let mut got = s.range_query(3, 100);
        got.sort_unstable();
        assert_eq!(got, vec![3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn clone_shares_the_same_tree() {
        let s = OrderedIntSet::new();
        let s2 = s.clone();
        s.insert(1);
        assert!(s2.lookup(1));
        s2.insert(2);
        assert!(s.lookup(2));
    }
}
