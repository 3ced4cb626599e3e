/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! Contention adaptation (`spec.md` §4.4): splitting hot or oversized
//! bases, and joining cold sibling bases back together via the two-phase
//! secure-join / complete-join protocol.
//!
//! The source carries a second, unreachable copy of `secure_join` for the
//! mirror-image (right-joining-left) case. Here both directions are one
//! routine parameterized by [`Side`].

use crate::bucket::Bucket;
use crate::config::Tunables;
use crate::sync::atm::{Guard, Shared};
use crate::tree::node::{BaseKind, JoinMain, JoinNeighbor, JoinSlot, Node, Side};
use crate::tree::stats::{updated, Observation};
use crate::tree::{replaceable, ParentLookup, RawTree};
use std::sync::atomic::Ordering;

/// `spec.md` §4.4: inspects `b`'s contention/size and triggers a split or
/// join if warranted. Called by the writer that just installed `b`, and
/// (per the `[SUPPLEMENT]` resolution of §9's open question) by a range
/// query on one of the bases it touched.
pub(crate) fn maybe_adapt(tree: &RawTree, b: Shared<Node>, guard: &Guard) {
    let base = match unsafe { b.deref() }.as_base() {
        Some(base) => base,
        None => return,
    };
    if !replaceable(base, guard) {
        return;
    }
    let stat = updated(base.stat.load(Ordering::Relaxed), Observation::Quiescent);
    let oversized =
        matches!(base.kind, BaseKind::Normal) && base.bucket.len() >= Tunables::SPLIT_THRESHOLD;
    if stat > Tunables::HIGH_CONT || oversized {
        log::trace!(
            "maybe_adapt: splitting a base (stat={stat}, oversized={oversized})"
        );
        high_contention_split(tree, b, guard);
    } else if stat < Tunables::LOW_CONT {
        log::trace!("maybe_adapt: attempting a join (stat={stat})");
        low_contention_join(tree, b, guard);
    }
}

/// §4.4.1: replace `b` with a fresh route over two fresh halves. A lost
/// race is silently abandoned — the next operation retries on fresh stats.
fn high_contention_split(tree: &RawTree, b: Shared<Node>, guard: &Guard) {
    let base = unsafe { b.deref() }.as_base().expect("logic,split target must be a base");
    if base.bucket.len() < 2 {
        return;
    }
    let (left_bucket, right_bucket, split_key) = base.bucket.split();

    let left_owned = Node::new_base(Shared::null(), left_bucket, 0, BaseKind::Normal);
    let right_owned = Node::new_base(Shared::null(), right_bucket, 0, BaseKind::Normal);
    let left_preview = unsafe { Node::preview(&left_owned, guard) };
    let right_preview = unsafe { Node::preview(&right_owned, guard) };

    let route_owned = Node::new_route(split_key, left_owned, right_owned);
    let route_preview = unsafe { Node::preview(&route_owned, guard) };
    Node::link_parent(left_preview, route_preview);
    Node::link_parent(right_preview, route_preview);

    if let Err(abandoned) = tree.try_replace(b, route_owned, guard) {
        log::trace!("high_contention_split: lost the race, abandoning silently");
        // Nobody ever observed these; reclaim them immediately instead of
        // leaving them to a future epoch that will never publish them.
        drop(unsafe { left_preview.into_owned() });
        drop(unsafe { right_preview.into_owned() });
        drop(abandoned);
    } else {
        tree.metrics.on_split();
    }
}

/// §4.4.2: attempts to merge `b` into a cold sibling. `b` must already be
/// known replaceable (checked by `maybe_adapt`) and `Normal`.
fn low_contention_join(tree: &RawTree, b: Shared<Node>, guard: &Guard) {
    let base = unsafe { b.deref() }.as_base().expect("logic,join target must be a base");
    let parent = base.parent.ld_acq(guard);
    if parent.is_null() {
        return;
    }
    let parent_route = unsafe { parent.deref() }
        .as_route()
        .expect("logic,base parent must be a route");
    let side = if parent_route.left.ld_acq(guard) == b {
        Side::Left
    } else {
        Side::Right
    };
    if let Some(m) = secure_join(tree, b, side, guard) {
        complete_join(tree, m, guard);
    }
}

/// §4.4.3. Returns the installed `JOIN_MAIN` base `m` on success, `None` if
/// the protocol was abandoned at any step (already-cleaned-up).
fn secure_join<'g>(tree: &RawTree, b: Shared<'g, Node>, side: Side, guard: &'g Guard) -> Option<Shared<'g, Node>> {
    let b_base = unsafe { b.deref() }.as_base().expect("logic,secure_join target must be a base");
    let p = b_base.parent.ld_acq(guard);
    if p.is_null() {
        return None;
    }
    let p_route = unsafe { p.deref() }.as_route().expect("logic,base parent must be a route");

    let other_branch = p_route.child(side.flip()).ld_acq(guard);
    let n0 = match side {
        Side::Left => leftmost_base(other_branch, guard),
        Side::Right => rightmost_base(other_branch, guard),
    };
    let n0_base = unsafe { n0.deref() }.as_base().expect("logic,cousin lookup must land on a base");
    if !replaceable(n0_base, guard) {
        return None;
    }

    // Step 2: publish m in b's place.
    let m_owned = Node::new_base(
        p,
        b_base.bucket.clone(),
        b_base.stat.load(Ordering::Relaxed),
        BaseKind::JoinMain(JoinMain::preparing()),
    );
    let m = match tree.try_replace(b, m_owned, guard) {
        Ok(installed) => installed,
        Err(_) => return None,
    };
    let jm = match &unsafe { m.deref() }.as_base().expect("logic,m must be a base").kind {
        BaseKind::JoinMain(jm) => jm as *const JoinMain,
        _ => unreachable!("logic,m must be join-main"),
    };
    // SAFETY: `m` is reachable for at least the lifetime of `guard`, and
    // `jm` borrows out of the same allocation.
    let jm: &'g JoinMain = unsafe { &*jm };

    // Step 3: publish n1 (the retagged cousin).
    let n1_owned = Node::new_base(
        n0_base.parent.ld_acq(guard),
        n0_base.bucket.clone(),
        n0_base.stat.load(Ordering::Relaxed),
        BaseKind::JoinNeighbor(JoinNeighbor { main: crate::sync::atm::Atomic::null() }),
    );
    if let crate::tree::node::Node::Base(nb) = &*n1_owned {
        if let BaseKind::JoinNeighbor(jn) = &nb.kind {
            jn.main.store(m, crate::sync::atm::ORD_RLX);
        }
    }
    let n1 = match tree.try_replace(n0, n1_owned, guard) {
        Ok(installed) => installed,
        Err(_) => {
            jm.abort();
            tree.metrics.on_join_abort();
            return None;
        }
    };

    // Step 4: claim P.
    if p_route.join_id.cx_rel(Shared::null(), m, guard).is_err() {
        jm.abort();
        tree.metrics.on_join_abort();
        return None;
    }

    // Step 5: locate and claim the grandparent.
    let other_branch_now = p_route.child(side.flip()).ld_acq(guard);
    let n1_is_direct_child = other_branch_now == n1;
    let grandparent = match tree.parent_of(p, p_route.key, guard) {
        ParentLookup::Root => Shared::null(),
        ParentLookup::Found(g) => g,
        ParentLookup::Diverged => {
            jm.abort();
            tree.metrics.on_join_abort();
            let _ = p_route.join_id.cx_rel(m, Shared::null(), guard);
            return None;
        }
    };
    if !grandparent.is_null() {
        let g_route = unsafe { grandparent.deref() }
            .as_route()
            .expect("logic,grandparent must be a route");
        if g_route.join_id.cx_rel(Shared::null(), m, guard).is_err() {
            jm.abort();
            tree.metrics.on_join_abort();
            let _ = p_route.join_id.cx_rel(m, Shared::null(), guard);
            return None;
        }
    }

    // Step 6: bookkeeping.
    jm.grandparent.store(grandparent, crate::sync::atm::ORD_RLX);
    jm.other_branch.store(other_branch_now, crate::sync::atm::ORD_RLX);
    jm.n1.store(n1, crate::sync::atm::ORD_RLX);

    // Step 7: compute and publish the merged replacement.
    let m_base = unsafe { m.deref() }.as_base().expect("logic,m must be a base");
    let n1_base = unsafe { n1.deref() }.as_base().expect("logic,n1 must be a base");
    let (left_bucket, right_bucket) = match side {
        Side::Left => (&m_base.bucket, &n1_base.bucket),
        Side::Right => (&n1_base.bucket, &m_base.bucket),
    };
    let merged_bucket = Bucket::merge(left_bucket, right_bucket);
    let merged_parent = if n1_is_direct_child {
        grandparent
    } else {
        n1_base.parent.ld_acq(guard)
    };
    let merged_owned = Node::new_base(
        merged_parent,
        merged_bucket,
        0,
        BaseKind::JoinNeighbor(JoinNeighbor { main: crate::sync::atm::Atomic::null() }),
    );
    if let crate::tree::node::Node::Base(nb) = &*merged_owned {
        if let BaseKind::JoinNeighbor(jn) = &nb.kind {
            jn.main.store(m, crate::sync::atm::ORD_RLX);
        }
    }
    let merged_preview = unsafe { Node::preview(&merged_owned, guard) };

    if jm.publish(merged_preview) {
        let _ = merged_owned.into_shared(guard);
        log::trace!("secure_join: published a merged replacement");
        tree.metrics.on_join();
        Some(m)
    } else {
        if !grandparent.is_null() {
            let g_route = unsafe { grandparent.deref() }.as_route().expect("logic,grandparent must be a route");
            let _ = g_route.join_id.cx_rel(m, Shared::null(), guard);
        }
        let _ = p_route.join_id.cx_rel(m, Shared::null(), guard);
        drop(merged_owned);
        None
    }
}

/// §4.4.4. `m` must be a published (or already-done) `JOIN_MAIN`.
pub(crate) fn complete_join(tree: &RawTree, m: Shared<Node>, guard: &Guard) {
    let m_base = unsafe { m.deref() }.as_base().expect("logic,complete_join target must be a base");
    let jm = match &m_base.kind {
        BaseKind::JoinMain(jm) => jm,
        _ => unreachable!("logic,complete_join target must be join-main"),
    };
    let merged = match jm.read_n2(guard) {
        JoinSlot::Published(ptr) => ptr,
        JoinSlot::Done | JoinSlot::Preparing | JoinSlot::Aborted => return,
    };

    // Step 2: install the merged base where the cousin used to be. The
    // owner and any number of helpers can all land here concurrently for
    // the same join, but `merged` is a single weak pointer shared by all
    // of them — only the thread that wins `claim_install` may reconstruct
    // an owning handle from it and attempt the install; everyone else
    // leaves it alone so it's reclaimed exactly once.
    if jm.claim_install() {
        let owned = unsafe { unpublish(merged, guard) };
        if let Err(owned) = tree.try_replace(jm.n1.ld_acq(guard), owned, guard) {
            // Nothing else can be racing us for this slot once the claim
            // is ours, so this shouldn't happen in practice; if it does,
            // we're still the sole owner and a plain drop is correct.
            drop(owned);
        }
    }

    // Step 3: P is now known-stale.
    let p = m_base.parent.ld_acq(guard);
    if let Some(p_route) = unsafe { p.as_ref() }.and_then(crate::tree::node::Node::as_route) {
        p_route.valid.store(false, Ordering::Release);

        // Step 4/5: collapse P out of the grandparent (or root) slot.
        let other_branch = jm.other_branch.ld_acq(guard);
        let replacement = if other_branch == jm.n1.ld_acq(guard) { merged } else { other_branch };
        let grandparent = jm.grandparent.ld_acq(guard);
        if grandparent.is_null() {
            let _ = tree.root_slot().cx_rel(p, replacement, guard);
        } else if let Some(g_route) = unsafe { grandparent.as_ref() }.and_then(crate::tree::node::Node::as_route) {
            let slot = if g_route.left.ld_acq(guard) == p { &g_route.left } else { &g_route.right };
            let _ = slot.cx_rel(p, replacement, guard);
            let _ = g_route.join_id.cx_rel(m, Shared::null(), guard);
        }
    }

    // Step 6: idempotent completion marker.
    jm.mark_done();
}

/// §3 / `[SUPPLEMENT]`: folds an [`Observation::RangeTouch`] into `b`'s
/// stat and installs the result as a fresh `Normal` base, then runs the
/// usual adaptation check on it. Called once per base a multi-base range
/// query touched, so a cold span of bases actually counts down towards
/// `LOW_CONT` instead of sitting untouched forever. A lost race here is
/// just a missed nudge, not a correctness problem — the next point op or
/// range query through `b` folds its own observation in regardless.
pub(crate) fn apply_range_touch(tree: &RawTree, b: Shared<Node>, guard: &Guard) {
    let base = match unsafe { b.deref() }.as_base() {
        Some(base) => base,
        None => return,
    };
    if !replaceable(base, guard) {
        return;
    }
    let next_stat = updated(base.stat.load(Ordering::Relaxed), Observation::RangeTouch);
    let next = Node::new_normal_base(base.parent.ld_acq(guard), base.bucket.clone(), next_stat);
    if let Ok(installed) = tree.try_replace(b, next, guard) {
        maybe_adapt(tree, installed, guard);
    }
}

/// Turns the weak `n2_ptr` copy back into an owning handle so `try_replace`
/// has something it can install (and, if it loses that CAS, properly
/// free). `merged` was forgotten (not dropped) when `secure_join` published
/// it, so reclaiming it here as a fresh `Owned` is exactly balanced — but
/// only as long as it happens exactly once; callers must gate this behind
/// `JoinMain::claim_install` first, since every concurrent completer reads
/// the same pointer.
///
/// # Safety
/// The caller must have exclusive license to reclaim this allocation
/// (i.e. must hold the `claim_install` win for this join).
unsafe fn unpublish<'g>(shared: Shared<'g, Node>, _guard: &'g Guard) -> crate::sync::atm::Owned<Node> {
    shared.into_owned()
}

fn leftmost_base<'g>(mut cur: Shared<'g, Node>, guard: &'g Guard) -> Shared<'g, Node> {
    loop {
        match unsafe { cur.deref() } {
            crate::tree::node::Node::Route(r) => cur = r.left.ld_acq(guard),
            crate::tree::node::Node::Base(_) => return cur,
        }
    }
}

fn rightmost_base<'g>(mut cur: Shared<'g, Node>, guard: &'g Guard) -> Shared<'g, Node> {
    loop {
        match unsafe { cur.deref() } {
            crate::tree::node::Node::Route(r) => cur = r.right.ld_acq(guard),
            crate::tree::node::Node::Base(_) => return cur,
        }
    }
}
