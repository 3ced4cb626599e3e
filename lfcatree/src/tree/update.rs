/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! Point update protocol (`spec.md` §4.3): `insert`, `remove`, `lookup`, and
//! the `help_if_needed` dispatcher every retry loop calls on contention.

use crate::bucket::Bucket;
use crate::sync::atm::{Guard, Shared};
use crate::tree::adapt::maybe_adapt;
use crate::tree::node::{BaseKind, Node};
use crate::tree::stats::{updated, Observation};
use crate::tree::{range, replaceable, RawTree};

/// `insert`/`remove`'s shared retry loop. `bucket_op` performs the
/// immutable bucket mutation and reports whether it actually changed
/// membership; the returned `bool` is that same membership change.
fn point_update(
    tree: &RawTree,
    key: i64,
    guard: &Guard,
    bucket_op: impl Fn(&Bucket, i64) -> (Bucket, bool),
) -> bool {
    let mut observation = Observation::Uncontended;
    loop {
        let b = tree.find_base(key, guard);
        let base = unsafe { b.deref() }.as_base().expect("logic,find_base must return a base");
        if replaceable(base, guard) {
            let (next_bucket, changed) = bucket_op(&base.bucket, key);
            let next_stat = updated(base.stat.load(std::sync::atomic::Ordering::Relaxed), observation);
            let next = Node::new_normal_base(base.parent.ld_acq(guard), next_bucket, next_stat);
            match tree.try_replace(b, next, guard) {
                Ok(installed) => {
                    maybe_adapt(tree, installed, guard);
                    return changed;
                }
                Err(_) => {
                    observation = Observation::Contended;
                    continue;
                }
            }
        }
        observation = Observation::Contended;
        help_if_needed(tree, b, guard);
    }
}

pub(crate) fn insert(tree: &RawTree, key: i64, guard: &Guard) -> bool {
    point_update(tree, key, guard, |bucket, k| bucket.insert_immutable(k))
}

pub(crate) fn remove(tree: &RawTree, key: i64, guard: &Guard) -> bool {
    point_update(tree, key, guard, |bucket, k| bucket.remove_immutable(k))
}

pub(crate) fn lookup(tree: &RawTree, key: i64, guard: &Guard) -> bool {
    loop {
        let b = tree.find_base(key, guard);
        let base = unsafe { b.deref() }.as_base().expect("logic,find_base must return a base");
        if replaceable(base, guard) {
            return base.bucket.contains(key);
        }
        help_if_needed(tree, b, guard);
    }
}

pub(crate) fn range_query(tree: &RawTree, lo: i64, hi: i64, guard: &Guard) -> Vec<i64> {
    range::range_query(tree, lo, hi, guard)
}

/// The single mechanism that keeps a stalled join or range query from
/// blocking anyone else: any thread that runs into an in-progress
/// descriptor finishes (or aborts) it before retrying its own operation.
pub(crate) fn help_if_needed<'g>(tree: &RawTree, n: Shared<'g, Node>, guard: &'g Guard) {
    let base = match unsafe { n.deref() }.as_base() {
        Some(b) => b,
        None => return,
    };
    match &base.kind {
        BaseKind::Normal => {}
        BaseKind::JoinNeighbor(jn) => {
            let main = jn.main.ld_acq(guard);
            help_if_needed(tree, main, guard);
        }
        BaseKind::JoinMain(jm) => match jm.read_n2(guard) {
            crate::tree::node::JoinSlot::Preparing => {
                log::trace!("help_if_needed: aborting a stalled join-main");
                tree.metrics.on_help();
                jm.abort();
            }
            crate::tree::node::JoinSlot::Published(_) => {
                log::trace!("help_if_needed: completing a published join");
                tree.metrics.on_help();
                crate::tree::adapt::complete_join(tree, n, guard);
            }
            crate::tree::node::JoinSlot::Aborted | crate::tree::node::JoinSlot::Done => {}
        },
        BaseKind::Range(r) => {
            if !r.descriptor.is_finalized(guard) {
                log::trace!("help_if_needed: driving an in-flight range query");
                tree.metrics.on_help();
                range::help_drive(tree, r, guard);
            }
        }
    }
}
