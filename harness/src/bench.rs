/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! Runs the configured operation mix against a shared [`OrderedIntSet`]
//! using [`libstress::Workpool`], the way `sky-bench`'s older benchtool
//! drove its network clients, but here each worker's "client" is just a
//! cloned handle onto the same in-process tree.
//!
//! Every worker thread gets its own PRNG stream, deterministically derived
//! from the run's seed so a `--seed` makes a whole multi-threaded run
//! reproducible even though the interleaving of operations against the
//! tree itself is not.

use crate::cli::Cli;
use crate::error::HResult;
use crate::report::{AggregateReport, SingleReport};
use crate::util::OpMix;
use lfcatree::{ConfigError, OrderedIntSet};
use libstress::Workpool;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

type WorkerState = (OrderedIntSet, StdRng, OpMix, i64, i64);

fn one_op(state: &mut WorkerState, _: ()) {
    let (tree, rng, mix, keyspace, range_span) = state;
    let draw: u32 = rng.gen();
    let key: i64 = rng.gen_range(0..*keyspace);
    match mix.pick(draw) {
        crate::util::Op::Insert => {
            tree.insert(key);
        }
        crate::util::Op::Remove => {
            tree.remove(key);
        }
        crate::util::Op::Lookup => {
            tree.lookup(key);
        }
        crate::util::Op::Range => {
            let hi = (key + *range_span).min(*keyspace - 1);
            let lo = key.min(hi);
            let hi = key.max(hi);
            tree.range_query(lo, hi);
        }
    }
}

/// Runs `cli.runs` timed passes of `cli.threads` workers each performing
/// `cli.ops_per_thread` operations against one shared, pre-seeded tree, and
/// returns the resulting report.
pub fn run(cli: &Cli) -> HResult<AggregateReport> {
    let op_mix = OpMix::new(cli.mix_insert, cli.mix_remove, cli.mix_lookup, cli.mix_range)
        .ok_or(ConfigError::EmptyOperationMix)?;
    if cli.threads == 0 {
        return Err(ConfigError::InvalidThreadCount(cli.threads).into());
    }
    if cli.keyspace <= 0 {
        return Err(ConfigError::InvalidKeySpace(cli.keyspace).into());
    }

    let base_seed = cli.seed.unwrap_or_else(|| rand::thread_rng().gen());
    log::info!(
        "starting benchmark: keyspace={} threads={} ops/thread={} runs={} seed={base_seed}",
        cli.keyspace,
        cli.threads,
        cli.ops_per_thread,
        cli.runs
    );

    // Warm the tree with half the key space so a run isn't dominated by an
    // empty-tree fast path; every run shares this same starting tree.
    let seed_tree = OrderedIntSet::new();
    for k in (0..cli.keyspace).step_by(2) {
        seed_tree.insert(k);
    }

    let query_count = cli.threads * cli.ops_per_thread;
    let mut report = AggregateReport::new(query_count);

    for run_idx in 0..cli.runs {
        let tree = seed_tree.clone();
        let seed_counter = Arc::new(AtomicU64::new(0));
        let keyspace = cli.keyspace;
        let range_span = cli.range_span.max(0);

        let init_pre_loop_var = move || -> WorkerState {
            let worker_idx = seed_counter.fetch_add(1, Ordering::Relaxed);
            let worker_seed = base_seed
                .wrapping_add(worker_idx.wrapping_mul(0x9E37_79B9_7F4A_7C15))
                .wrapping_add(run_idx as u64);
            (
                tree.clone(),
                StdRng::seed_from_u64(worker_seed),
                op_mix,
                keyspace,
                range_span,
            )
        };

        let pool: Workpool<WorkerState, (), _, _, _> =
            Workpool::new(cli.threads, init_pre_loop_var, one_op, |_: &mut WorkerState| {}, false);

        let start = Instant::now();
        for _ in 0..query_count {
            pool.execute(());
        }
        drop(pool);
        let elapsed = start.elapsed();

        log::debug!("run {run_idx} finished in {:?}", elapsed);
        report.push(SingleReport::new("lfcatree", elapsed.as_nanos() as f64));
    }

    Ok(report)
}
