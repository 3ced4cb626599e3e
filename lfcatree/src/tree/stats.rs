/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! Contention counter arithmetic (`spec.md` §3, §4.3, §4.4).
//!
//! The counter on every base is a running, saturating estimate of how
//! contended that base has been recently, not an exact measurement. Every
//! point operation folds one [`Observation`] into the counter it read;
//! `maybe_adapt` peeks at the same function with [`Observation::Quiescent`]
//! (a zero-delta observation) to read the clamped value without mutating
//! anything.

use crate::config::Tunables;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Observation {
    /// The operation's CAS succeeded on the first try.
    Uncontended,
    /// The operation's CAS lost a race, or it had to help another thread.
    Contended,
    /// A range query touched this base alongside at least one other.
    RangeTouch,
    /// No new information; used to re-read the clamped counter.
    Quiescent,
}

/// Folds `obs` into `stat` and clamps the result into the tuning band.
pub fn updated(stat: i64, obs: Observation) -> i64 {
    let delta = match obs {
        Observation::Uncontended => -Tunables::LOW_CONT_CONTRIB,
        Observation::Contended => Tunables::CONT_CONTRIB,
        Observation::RangeTouch => -Tunables::RANGE_CONTRIB,
        Observation::Quiescent => 0,
    };
    Tunables::clamp(stat + delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contended_raises_and_uncontended_lowers() {
        assert!(updated(0, Observation::Contended) > 0);
        assert!(updated(0, Observation::Uncontended) < 0);
    }

    #[test]
    fn quiescent_is_a_pure_clamp() {
        assert_eq!(updated(10, Observation::Quiescent), 10);
        assert_eq!(updated(Tunables::HIGH_CONT + 10, Observation::Quiescent), Tunables::HIGH_CONT);
    }

    #[test]
    fn range_touch_lowers_towards_join() {
        assert!(updated(0, Observation::RangeTouch) < 0);
    }
}
