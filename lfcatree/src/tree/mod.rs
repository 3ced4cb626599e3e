/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! The LFCA tree: traversal, the replaceability predicate, and the
//! single-slot CAS replacement primitive every mutation is built from.

pub(crate) mod adapt;
pub(crate) mod node;
pub(crate) mod range;
pub(crate) mod stats;
pub(crate) mod update;

use crate::metrics::TreeRuntimeLog;
use crate::sync::atm::{cpin, Atomic, Guard, Owned, Shared, ORD_ACQ};
use node::{Base, BaseKind, JoinSlot, Node};

/// The tree's atomic root slot plus the operations that only need to know
/// "find a base, maybe replace it" — everything role-specific (point
/// update, adaptation, range query) lives in the sibling modules and takes
/// a `&RawTree` to get at these primitives.
pub struct RawTree {
    root: Atomic<Node>,
    pub(crate) metrics: TreeRuntimeLog,
}

impl RawTree {
    pub fn new() -> Self {
        Self {
            root: Atomic::from(Node::new_root_base()),
            metrics: TreeRuntimeLog::new(),
        }
    }

    pub fn pin(&self) -> Guard {
        cpin()
    }

    pub(crate) fn root_slot(&self) -> &Atomic<Node> {
        &self.root
    }

    /// Descends to the base owning `key`. Read-only, lock-free, may observe
    /// a node that's about to be replaced — callers re-verify via
    /// `replaceable`/`try_replace` or the help protocol.
    pub fn find_base<'g>(&self, key: i64, guard: &'g Guard) -> Shared<'g, Node> {
        let mut cur = self.root.ld_acq(guard);
        loop {
            match unsafe { cur.deref() } {
                Node::Route(r) => cur = r.child(side_for(key, r.key)).ld_acq(guard),
                Node::Base(_) => return cur,
            }
        }
    }

    /// As [`Self::find_base`], but also records, for each route visited,
    /// the route itself and which side was descended. Used by the
    /// range-query cursor to re-ascend and find the next base to the right.
    pub fn find_base_with_stack<'g>(
        &self,
        key: i64,
        guard: &'g Guard,
    ) -> (Shared<'g, Node>, Vec<(Shared<'g, Node>, node::Side)>) {
        let mut stack = Vec::new();
        let mut cur = self.root.ld_acq(guard);
        loop {
            match unsafe { cur.deref() } {
                Node::Route(r) => {
                    let side = side_for(key, r.key);
                    stack.push((cur, side));
                    cur = r.child(side).ld_acq(guard);
                }
                Node::Base(_) => return (cur, stack),
            }
        }
    }

    /// Finds the route whose left or right child is `target` (assumed to
    /// be reachable via `nav_key`, e.g. a route's own split key), or
    /// reports that the search diverged because the tree changed underneath
    /// it.
    pub(crate) fn parent_of<'g>(
        &self,
        target: Shared<'g, Node>,
        nav_key: i64,
        guard: &'g Guard,
    ) -> ParentLookup<'g> {
        let mut cur = self.root.ld_acq(guard);
        let mut last_route = None;
        loop {
            if cur == target {
                return match last_route {
                    None => ParentLookup::Root,
                    Some(r) => ParentLookup::Found(r),
                };
            }
            match unsafe { cur.deref() } {
                Node::Route(r) => {
                    last_route = Some(cur);
                    cur = r.child(side_for(nav_key, r.key)).ld_acq(guard);
                }
                Node::Base(_) => return ParentLookup::Diverged,
            }
        }
    }

    /// CAS-replaces `old` (a base) with `new` through whichever slot
    /// currently reaches it: the root slot if `old` has no parent, else the
    /// parent route's left or right child, chosen by observing which one
    /// currently equals `old`.
    pub(crate) fn try_replace<'g>(
        &self,
        old: Shared<'g, Node>,
        new: Owned<Node>,
        guard: &'g Guard,
    ) -> Result<Shared<'g, Node>, Owned<Node>> {
        let base = unsafe { old.deref() }
            .as_base()
            .expect("logic,try_replace target must be a base");
        let parent = base.parent.ld_acq(guard);
        let slot = if parent.is_null() {
            &self.root
        } else {
            let route = unsafe { parent.deref() }
                .as_route()
                .expect("logic,base parent reference must be a route");
            if route.left.ld_acq(guard) == old {
                &route.left
            } else {
                &route.right
            }
        };
        match slot.cx_rel(old, new, guard) {
            Ok(installed) => {
                log::trace!("try_replace: installed a fresh base");
                unsafe { guard.defer_destroy(old) };
                Ok(installed)
            }
            Err(e) => {
                log::trace!("try_replace: lost the CAS race, caller will retry");
                Err(e.new)
            }
        }
    }
}

impl Default for RawTree {
    fn default() -> Self {
        Self::new()
    }
}

/// A `parent_of` result: `spec.md` §9's redesign of the `NOT_FOUND`
/// sentinel into a proper sum type.
pub(crate) enum ParentLookup<'g> {
    Root,
    Found(Shared<'g, Node>),
    Diverged,
}

/// Whether `key` routes left or right at a split key `k`.
pub(crate) fn side_for(key: i64, k: i64) -> node::Side {
    if key < k {
        node::Side::Left
    } else {
        node::Side::Right
    }
}

/// `spec.md` §4.2's replaceability predicate.
pub(crate) fn replaceable(base: &Base, guard: &Guard) -> bool {
    match &base.kind {
        BaseKind::Normal => true,
        BaseKind::JoinMain(jm) => matches!(jm.read_n2(guard), JoinSlot::Aborted),
        BaseKind::JoinNeighbor(jn) => {
            let main = unsafe { jn.main.ld_acq(guard).deref() }
                .as_base()
                .expect("logic,join-neighbor main reference must be a base");
            match &main.kind {
                BaseKind::JoinMain(jm) => {
                    matches!(jm.read_n2(guard), JoinSlot::Aborted | JoinSlot::Done)
                }
                _ => unreachable!("logic,join-neighbor main reference must be a join-main base"),
            }
        }
        BaseKind::Range(r) => r.descriptor.is_finalized(guard),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::Bucket;

    #[test]
    fn fresh_tree_root_is_an_empty_replaceable_base() {
        let tree = RawTree::new();
        let guard = tree.pin();
        let b = tree.find_base(42, &guard);
        let base = unsafe { b.deref() }.as_base().unwrap();
        assert!(base.bucket.is_empty());
        assert!(replaceable(base, &guard));
    }

    #[test]
    fn find_base_is_stable_across_arbitrary_keys_on_singleton_tree() {
        let tree = RawTree::new();
        let guard = tree.pin();
        let a = tree.find_base(i64::MIN, &guard);
        let b = tree.find_base(i64::MAX, &guard);
        assert_eq!(a, b);
        let _ = Bucket::empty();
    }
}
