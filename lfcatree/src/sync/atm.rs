/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! A thin, explicitly-ordered wrapper around [`crossbeam_epoch::Atomic`].
//!
//! Every slot the tree mutates through CAS (route children, the root, the
//! join/range descriptor cells) goes through this type instead of the raw
//! `crossbeam_epoch` API so that call sites read as `ld_acq`/`cx_rel` rather
//! than bare `Ordering::Acquire` literals scattered through the tree code.

use core::{fmt, ops::Deref, sync::atomic::Ordering};
use crossbeam_epoch::{Atomic as CBAtomic, CompareExchangeError, Pointer};
// re-exported for the rest of the crate: these are the vocabulary every
// module that touches the tree's atomics is written against.
pub use crossbeam_epoch::{pin as cpin, unprotected as upin, Guard, Owned, Shared};

pub(crate) const ORD_RLX: Ordering = Ordering::Relaxed;
pub(crate) const ORD_ACQ: Ordering = Ordering::Acquire;
pub(crate) const ORD_REL: Ordering = Ordering::Release;
pub(crate) const ORD_ACR: Ordering = Ordering::AcqRel;

type CxResult<'g, T, P> = Result<Shared<'g, T>, CompareExchangeError<'g, T, P>>;

pub struct Atomic<T> {
    a: CBAtomic<T>,
}

// the derive would force a spurious `T: Debug` bound
impl<T> fmt::Debug for Atomic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.a)
    }
}

impl<T> Atomic<T> {
    #[inline(always)]
    pub fn null() -> Self {
        Self { a: CBAtomic::null() }
    }
    /// Allocates and publishes `t` behind a fresh atomic slot.
    pub fn new_alloc(t: T) -> Self {
        Self { a: CBAtomic::new(t) }
    }
    #[inline(always)]
    pub(crate) fn cx<'g, P>(
        &self,
        o: Shared<'g, T>,
        n: P,
        s: Ordering,
        f: Ordering,
        g: &'g Guard,
    ) -> CxResult<'g, T, P>
    where
        P: Pointer<T>,
    {
        self.a.compare_exchange(o, n, s, f, g)
    }
    /// CAS with release-on-success / relaxed-on-failure ordering: the shape
    /// every structural mutation in the tree uses.
    #[inline(always)]
    pub(crate) fn cx_rel<'g, P>(&self, o: Shared<'g, T>, n: P, g: &'g Guard) -> CxResult<'g, T, P>
    where
        P: Pointer<T>,
    {
        self.cx(o, n, ORD_REL, ORD_RLX, g)
    }
    #[inline(always)]
    pub(crate) fn ld<'g>(&self, o: Ordering, g: &'g Guard) -> Shared<'g, T> {
        self.a.load(o, g)
    }
    #[inline(always)]
    pub(crate) fn ld_acq<'g>(&self, g: &'g Guard) -> Shared<'g, T> {
        self.ld(ORD_ACQ, g)
    }
    #[inline(always)]
    pub(crate) fn ld_rlx<'g>(&self, g: &'g Guard) -> Shared<'g, T> {
        self.ld(ORD_RLX, g)
    }
    /// Stores either a freshly allocated `Owned<T>` or a borrowed `Shared<T>`
    /// (a weak copy of a pointer owned by some other slot) into this slot.
    #[inline(always)]
    pub(crate) fn store<P>(&self, n: P, o: Ordering)
    where
        P: Pointer<T>,
    {
        self.a.store(n, o);
    }
}

impl<T, A> From<A> for Atomic<T>
where
    A: Into<CBAtomic<T>>,
{
    fn from(t: A) -> Self {
        Self { a: Into::into(t) }
    }
}

impl<T> Deref for Atomic<T> {
    type Target = CBAtomic<T>;
    fn deref(&self) -> &Self::Target {
        &self.a
    }
}
