/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! The tree's node types.
//!
//! The source this tree is modeled on gives every node the fields of every
//! role at once (route, normal base, join-main, join-neighbor, range) and
//! dispatches on a runtime tag. Here the tag *is* the type: [`Node`] is a
//! two-variant sum, and a base's role-specific fields live behind
//! [`BaseKind`] so a `Normal` base carries nothing it doesn't need.
//!
//! Every [`Atomic`] field on these types is either a genuine tree edge (the
//! root slot, a route's `left`/`right`) that owns the node it points to, or
//! a weak bookkeeping reference (`parent`, `main`, `grandparent`,
//! `other_branch`, `join_id`, a published `n2`) that merely copies a pointer
//! someone else owns, for identity comparisons and navigation. Only the
//! owning edges are ever passed to `Guard::defer_destroy`.

use crate::bucket::Bucket;
use crate::sync::atm::{Atomic, Guard, Owned, Shared, ORD_ACQ, ORD_RLX};
use crate::tree::range::RangeDescriptor;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};
use std::sync::Arc;

/// A node of the LFCA tree: either an internal route or a leaf base.
pub enum Node {
    Route(Route),
    Base(Base),
}

impl Node {
    pub fn as_route(&self) -> Option<&Route> {
        match self {
            Self::Route(r) => Some(r),
            Self::Base(_) => None,
        }
    }

    pub fn as_base(&self) -> Option<&Base> {
        match self {
            Self::Base(b) => Some(b),
            Self::Route(_) => None,
        }
    }

    pub fn is_route(&self) -> bool {
        matches!(self, Self::Route(_))
    }

    pub fn new_route(key: i64, left: Owned<Node>, right: Owned<Node>) -> Owned<Node> {
        Owned::new(Self::Route(Route {
            key,
            left: Atomic::from(left),
            right: Atomic::from(right),
            valid: AtomicBool::new(true),
            join_id: Atomic::null(),
        }))
    }

    pub fn new_normal_base(parent: Shared<'_, Node>, bucket: Bucket, stat: i64) -> Owned<Node> {
        Self::new_base(parent, bucket, stat, BaseKind::Normal)
    }

    pub fn new_root_base() -> Owned<Node> {
        Self::new_base(Shared::null(), Bucket::empty(), 0, BaseKind::Normal)
    }

    /// Reads the address an as-yet-unpublished `owned` will have, so a
    /// sibling being assembled in the same batch (e.g. a split's two fresh
    /// children) can record a back-reference to it before the whole
    /// subtree is CAS-published.
    ///
    /// # Safety
    /// `owned` must still be alive (not moved or dropped) for as long as
    /// the returned `Shared` is used; callers only reach for this while
    /// assembling a subtree no other thread can yet observe.
    pub unsafe fn preview<'g>(owned: &Owned<Node>, _guard: &'g Guard) -> Shared<'g, Node> {
        let raw: *const Node = &**owned;
        Shared::from(raw)
    }

    /// Stores `parent` into `child`'s weak back-reference. Only sound while
    /// `child` hasn't been published into the tree yet — a plain store
    /// (not a CAS) is enough because nothing else can be racing to read or
    /// write this slot.
    pub fn link_parent(child: Shared<'_, Node>, parent: Shared<'_, Node>) {
        let base = unsafe { child.deref() }
            .as_base()
            .expect("logic,link_parent target must be a base");
        base.parent.store(parent, ORD_RLX);
    }

    /// Builds a fresh base carrying `kind`, with `parent` stored as a weak
    /// back-reference.
    pub fn new_base(parent: Shared<'_, Node>, bucket: Bucket, stat: i64, kind: BaseKind) -> Owned<Node> {
        let base = Base {
            parent: Atomic::null(),
            bucket,
            stat: AtomicI64::new(stat),
            kind,
        };
        base.parent.store(parent, ORD_RLX);
        Owned::new(Self::Base(base))
    }

    /// Snapshots `old` (a base) into a fresh `RANGE` base quoting
    /// `descriptor`, keeping its parent and bucket/stat as they stood at the
    /// moment of the snapshot.
    pub fn new_range_base<'g>(
        old: Shared<'g, Node>,
        lo: i64,
        hi: i64,
        descriptor: Arc<RangeDescriptor>,
        guard: &'g Guard,
    ) -> Owned<Node> {
        let old_base = unsafe { old.deref() }
            .as_base()
            .expect("logic,range snapshot source must be a base");
        let parent = old_base.parent.ld_acq(guard);
        Self::new_base(
            parent,
            old_base.bucket.clone(),
            old_base.stat.load(Ordering::Relaxed),
            BaseKind::Range(RangeRole { lo, hi, descriptor }),
        )
    }
}

/// An internal split-key node. `left` holds keys `< key`, `right` holds
/// keys `>= key`.
pub struct Route {
    pub key: i64,
    pub left: Atomic<Node>,
    pub right: Atomic<Node>,
    /// Once false, this route is unlinked; no traversal may trust it again.
    pub valid: AtomicBool,
    /// Weak reference to the `JOIN_MAIN` base currently serializing a join
    /// that touches this route's children, or null if none is in flight.
    pub join_id: Atomic<Node>,
}

impl Route {
    pub fn child(&self, side: Side) -> &Atomic<Node> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// A leaf: an immutable bucket, a contention estimate, and a role-specific
/// payload.
pub struct Base {
    /// Weak back-reference to the parent route, or null if this base is
    /// currently the root.
    pub parent: Atomic<Node>,
    pub bucket: Bucket,
    pub stat: AtomicI64,
    pub kind: BaseKind,
}

/// The role a base plays. `Normal` is the steady state; the other three
/// exist only while a join or range query is in flight.
pub enum BaseKind {
    Normal,
    JoinMain(JoinMain),
    JoinNeighbor(JoinNeighbor),
    Range(RangeRole),
}

/// The states of a join-main's second-neighbor slot, named after the
/// source's `PREPARING` / `DONE` / `ABORTED` pointer sentinels plus the
/// real (non-sentinel) replacement pointer the source casts into the same
/// field. Encoded as an explicit tag (`n2_state`) next to the slot
/// (`n2_ptr`) rather than by casting small integers to pointers.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JoinSlotTag {
    Preparing = 0,
    Aborted = 1,
    /// A merged replacement has been computed and published, but
    /// `complete_join` hasn't finished installing it yet.
    Published = 2,
    /// `complete_join` has finished; any further helper just returns.
    Done = 3,
}

impl JoinSlotTag {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Preparing,
            1 => Self::Aborted,
            2 => Self::Published,
            3 => Self::Done,
            _ => unreachable!("logic,invalid join slot tag"),
        }
    }
}

/// A read of a join-main's `n2` slot, with the published replacement
/// attached when present.
pub enum JoinSlot<'g> {
    Preparing,
    Aborted,
    Published(Shared<'g, Node>),
    Done,
}

pub struct JoinMain {
    /// The first neighbor (a `JOIN_NEIGHBOR` base), recorded once the
    /// secure-join protocol has claimed it. Weak reference.
    pub n1: Atomic<Node>,
    n2_state: AtomicU8,
    n2_ptr: Atomic<Node>,
    /// Weak reference to the grandparent route, or null if the joining
    /// base's parent was itself the root.
    pub grandparent: Atomic<Node>,
    /// Weak reference to the sibling subtree of the joining base's parent
    /// that isn't on the joining base's side.
    pub other_branch: Atomic<Node>,
    /// Guards the one-time reclamation of the published `n2_ptr`: the
    /// owner and any number of helpers can all reach `complete_join`
    /// concurrently, but only one of them may ever turn that weak pointer
    /// back into an owning handle, or it gets freed twice.
    install_claimed: AtomicBool,
}

impl JoinMain {
    pub fn preparing() -> Self {
        Self {
            n1: Atomic::null(),
            n2_state: AtomicU8::new(JoinSlotTag::Preparing as u8),
            n2_ptr: Atomic::null(),
            grandparent: Atomic::null(),
            other_branch: Atomic::null(),
            install_claimed: AtomicBool::new(false),
        }
    }

    /// `false -> true`, once. Returns whether this call won the claim; the
    /// winner is the only thread permitted to reconstruct ownership of the
    /// published replacement and install it at `n1`.
    pub fn claim_install(&self) -> bool {
        self.install_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn read_n2<'g>(&self, guard: &'g Guard) -> JoinSlot<'g> {
        match JoinSlotTag::from_u8(self.n2_state.load(Ordering::Acquire)) {
            JoinSlotTag::Preparing => JoinSlot::Preparing,
            JoinSlotTag::Aborted => JoinSlot::Aborted,
            JoinSlotTag::Done => JoinSlot::Done,
            JoinSlotTag::Published => JoinSlot::Published(self.n2_ptr.ld(ORD_ACQ, guard)),
        }
    }

    /// `PREPARING -> ABORTED`. Returns whether this call performed the
    /// transition (false if someone already moved the slot on).
    pub fn abort(&self) -> bool {
        self.n2_state
            .compare_exchange(
                JoinSlotTag::Preparing as u8,
                JoinSlotTag::Aborted as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// `PREPARING -> PUBLISHED(replacement)`. Returns whether this call won
    /// the race to publish.
    pub fn publish(&self, replacement: Shared<'_, Node>) -> bool {
        self.n2_ptr.store(replacement, ORD_RLX);
        self.n2_state
            .compare_exchange(
                JoinSlotTag::Preparing as u8,
                JoinSlotTag::Published as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// `PUBLISHED -> DONE`. Idempotent: a second caller sees it already
    /// done and this simply fails silently (the state stays `Done`).
    pub fn mark_done(&self) {
        let _ = self.n2_state.compare_exchange(
            JoinSlotTag::Published as u8,
            JoinSlotTag::Done as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

pub struct JoinNeighbor {
    /// Weak back-reference to the owning `JOIN_MAIN` base.
    pub main: Atomic<Node>,
}

pub struct RangeRole {
    pub lo: i64,
    pub hi: i64,
    pub descriptor: Arc<RangeDescriptor>,
}

/// Which child slot of a route a base (or subtree) occupies.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn flip(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}
