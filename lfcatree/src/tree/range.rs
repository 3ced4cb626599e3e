/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! Linearizable multi-bucket range queries (`spec.md` §4.5).
//!
//! A range query converts every base it touches into a `RANGE` base quoting
//! one shared descriptor, snapshotting each bucket as it goes, then
//! finalizes the descriptor with a single CAS — that CAS is the query's
//! linearization point. Any other thread that runs into one of these
//! `RANGE` bases before the descriptor is finalized helps drive it to
//! completion rather than blocking on it (`tree::update::help_if_needed`).

use crate::sync::atm::{upin, Atomic, Guard, Owned, Shared, ORD_ACQ, ORD_REL};
use crate::tree::node::{BaseKind, Node, RangeRole, Side};
use crate::tree::{replaceable, RawTree};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Published once per range query; every `RANGE` base created for that
/// query holds an `Arc` clone of this.
pub struct RangeDescriptor {
    result: Atomic<RangeResult>,
    more_than_one_base: AtomicBool,
}

struct RangeResult(Vec<i64>);

impl RangeDescriptor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            result: Atomic::null(),
            more_than_one_base: AtomicBool::new(false),
        })
    }

    pub fn is_finalized(&self, guard: &Guard) -> bool {
        !self.result.ld_acq(guard).is_null()
    }

    pub fn more_than_one_base(&self) -> bool {
        self.more_than_one_base.load(Ordering::Acquire)
    }

    /// `UNSET -> result`. Returns the result that ended up published: ours
    /// if we won the CAS, or whoever got there first's if we lost it.
    fn finalize(&self, result: Vec<i64>, more_than_one: bool, guard: &Guard) -> Vec<i64> {
        let owned = Owned::new(RangeResult(result));
        match self
            .result
            .cx(Shared::null(), owned, ORD_REL, ORD_ACQ, guard)
        {
            Ok(installed) => {
                if more_than_one {
                    self.more_than_one_base.store(true, Ordering::Release);
                }
                unsafe { installed.deref() }.0.clone()
            }
            Err(e) => {
                drop(e.new);
                self.result(guard)
                    .expect("logic,lost finalize race but result still unset")
            }
        }
    }

    pub fn result(&self, guard: &Guard) -> Option<Vec<i64>> {
        let r = self.result.ld_acq(guard);
        if r.is_null() {
            None
        } else {
            Some(unsafe { r.deref() }.0.clone())
        }
    }
}

impl Drop for RangeDescriptor {
    fn drop(&mut self) {
        let guard = unsafe { upin() };
        let r = self.result.ld_acq(&guard);
        if !r.is_null() {
            drop(unsafe { r.into_owned() });
        }
    }
}

pub(crate) fn range_query(tree: &RawTree, lo: i64, hi: i64, guard: &Guard) -> Vec<i64> {
    drive(tree, lo, hi, None, guard)
}

/// Re-drives an in-flight range query on behalf of its owner; called from
/// `help_if_needed` when a thread runs into a `RANGE` base whose descriptor
/// is still unset.
pub(crate) fn help_drive(tree: &RawTree, owner: &RangeRole, guard: &Guard) {
    drive(tree, owner.lo, owner.hi, Some(owner.descriptor.clone()), guard);
}

fn drive(
    tree: &RawTree,
    lo: i64,
    hi: i64,
    help: Option<Arc<RangeDescriptor>>,
    guard: &Guard,
) -> Vec<i64> {
    loop {
        let (b, mut stack) = tree.find_base_with_stack(lo, guard);

        let (descriptor, first) = match phase_a(tree, lo, hi, b, &help, guard) {
            PhaseA::Started(d, installed) => (d, installed),
            PhaseA::Adopt(o_lo, o_hi, o_descriptor) => {
                return drive(tree, o_lo, o_hi, Some(o_descriptor), guard)
            }
            PhaseA::Retry => continue,
        };

        let mut done = vec![first];
        loop {
            let last = *done.last().unwrap();
            let last_base = unsafe { last.deref() }.as_base().unwrap();
            if !last_base.bucket.is_empty() && last_base.bucket.max().unwrap() >= hi {
                break;
            }
            let backup_stack = stack.clone();
            let next = match find_next_base(&mut stack, guard) {
                Some(n) => n,
                None => break,
            };
            if descriptor.is_finalized(guard) {
                return descriptor
                    .result(guard)
                    .expect("logic,descriptor reported finalized with no result");
            }
            let next_base = unsafe { next.deref() }.as_base().unwrap();
            if quotes(next_base, &descriptor) {
                done.push(next);
                continue;
            }
            if replaceable(next_base, guard) {
                let n = Node::new_range_base(next, lo, hi, descriptor.clone(), guard);
                match tree.try_replace(next, n, guard) {
                    Ok(installed) => {
                        done.push(installed);
                        continue;
                    }
                    Err(_) => {
                        stack = backup_stack;
                        continue;
                    }
                }
            }
            crate::tree::update::help_if_needed(tree, next, guard);
            stack = backup_stack;
        }

        let mut result = Vec::new();
        for &d in &done {
            let db = unsafe { d.deref() }.as_base().unwrap();
            result.extend(db.bucket.range_query(lo, hi));
        }
        let more_than_one = done.len() > 1;
        let finalized = descriptor.finalize(result, more_than_one, guard);
        log::trace!("range_query finalized across {} base(s)", done.len());
        if more_than_one {
            for &d in &done {
                crate::tree::adapt::apply_range_touch(tree, d, guard);
            }
        }
        return finalized;
    }
}

enum PhaseA<'g> {
    Started(Arc<RangeDescriptor>, Shared<'g, Node>),
    /// `b` already quotes a different, still in-flight range query that
    /// covers ours. Rather than answering from `b`'s single bucket (which
    /// would silently drop any of our keys living in that query's other
    /// bases), adopt its descriptor and bounds and drive *that* query to
    /// completion, returning its full multi-base result.
    Adopt(i64, i64, Arc<RangeDescriptor>),
    Retry,
}

fn phase_a<'g>(
    tree: &RawTree,
    lo: i64,
    hi: i64,
    b: Shared<'g, Node>,
    help: &Option<Arc<RangeDescriptor>>,
    guard: &'g Guard,
) -> PhaseA<'g> {
    let base = unsafe { b.deref() }.as_base().expect("logic,find_base must return a base");
    if let (BaseKind::Range(r), Some(owner)) = (&base.kind, help) {
        if Arc::ptr_eq(&r.descriptor, owner) {
            return PhaseA::Started(owner.clone(), b);
        }
    }
    if replaceable(base, guard) {
        let descriptor = help.clone().unwrap_or_else(RangeDescriptor::new);
        let n = Node::new_range_base(b, lo, hi, descriptor.clone(), guard);
        return match tree.try_replace(b, n, guard) {
            Ok(installed) => PhaseA::Started(descriptor, installed),
            Err(_) => PhaseA::Retry,
        };
    }
    if let BaseKind::Range(r) = &base.kind {
        if r.hi >= hi {
            return PhaseA::Adopt(r.lo, r.hi, r.descriptor.clone());
        }
    }
    crate::tree::update::help_if_needed(tree, b, guard);
    PhaseA::Retry
}

fn quotes(base: &crate::tree::node::Base, descriptor: &Arc<RangeDescriptor>) -> bool {
    matches!(&base.kind, BaseKind::Range(r) if Arc::ptr_eq(&r.descriptor, descriptor))
}

/// Ascends `stack` (route, side-descended pairs, root-to-leaf) past any
/// route we arrived at via its right child (nothing further right to find
/// there) or that's been invalidated, until it finds one descended via the
/// left child; then walks the leftmost path of that route's right subtree
/// down to the next base. Returns `None` once the stack is exhausted.
fn find_next_base<'g>(
    stack: &mut Vec<(Shared<'g, Node>, Side)>,
    guard: &'g Guard,
) -> Option<Shared<'g, Node>> {
    while let Some((route_ptr, side)) = stack.pop() {
        let route = unsafe { route_ptr.deref() }
            .as_route()
            .expect("logic,range stack must only contain routes");
        if !route.valid.load(Ordering::Acquire) {
            continue;
        }
        if side == Side::Right {
            continue;
        }
        let mut cur = route.right.ld_acq(guard);
        loop {
            match unsafe { cur.deref() } {
                Node::Route(r) => {
                    stack.push((cur, Side::Left));
                    cur = r.left.ld_acq(guard);
                }
                Node::Base(_) => return Some(cur),
            }
        }
    }
    None
}
