/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! `spec.md` §7: the tree itself never returns an error (CAS failure is
//! retried transparently, and a structural invariant violation is a bug —
//! `debug_assert!`/`unreachable!` in the tree modules, not a `Result`). The
//! one place a real error type belongs is configuration parsing for
//! whatever embeds this crate (the harness, namely).

use thiserror::Error;

/// Failures parsing harness-facing configuration. The library's own
/// `insert`/`remove`/`lookup`/`range_query` never return this.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("key-space bound must be positive, got {0}")]
    InvalidKeySpace(i64),
    #[error("thread count must be at least 1, got {0}")]
    InvalidThreadCount(usize),
    #[error("operation mix weights must sum to a positive total")]
    EmptyOperationMix,
    #[error("invalid seed value: {0}")]
    InvalidSeed(String),
}
