/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! Command-line surface for the driver harness.
//!
//! Grounded on `sky-bench/src/cli.rs`'s `clap`-derive shape (custom help
//! template, short/long flags with defaults) adapted from "host/port/kvsize"
//! (a network benchmark against a running server) to "key-space/thread
//! count/operation mix" (an in-process benchmark against an
//! [`lfcatree::OrderedIntSet`]).

use clap::Parser;

const HELP_TEMPLATE: &str = r#"
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
"#;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, help_template = HELP_TEMPLATE)]
pub struct Cli {
    #[arg(
        short = 'k',
        long = "keyspace",
        help = "Sets the size of the key space (keys are drawn from 0..keyspace)",
        value_name = "N",
        default_value_t = 1_000_000
    )]
    pub keyspace: i64,

    #[arg(
        short = 't',
        long = "threads",
        help = "Sets the number of worker threads",
        value_name = "COUNT",
        default_value_t = 8
    )]
    pub threads: usize,

    #[arg(
        short = 'q',
        long = "ops",
        help = "Sets the number of operations each worker thread runs",
        value_name = "OPS",
        default_value_t = 200_000
    )]
    pub ops_per_thread: usize,

    #[arg(
        short = 'r',
        long = "runs",
        help = "Sets the number of times the benchmark is repeated",
        value_name = "RUNS",
        default_value_t = 5
    )]
    pub runs: usize,

    #[arg(
        long = "mix-insert",
        help = "Relative weight of insert operations in the mix",
        value_name = "WEIGHT",
        default_value_t = 4
    )]
    pub mix_insert: u32,

    #[arg(
        long = "mix-remove",
        help = "Relative weight of remove operations in the mix",
        value_name = "WEIGHT",
        default_value_t = 2
    )]
    pub mix_remove: u32,

    #[arg(
        long = "mix-lookup",
        help = "Relative weight of lookup operations in the mix",
        value_name = "WEIGHT",
        default_value_t = 8
    )]
    pub mix_lookup: u32,

    #[arg(
        long = "mix-range",
        help = "Relative weight of range-query operations in the mix",
        value_name = "WEIGHT",
        default_value_t = 1
    )]
    pub mix_range: u32,

    #[arg(
        long = "range-span",
        help = "Width of the [lo, lo+span] window a range query draws",
        value_name = "SPAN",
        default_value_t = 256
    )]
    pub range_span: i64,

    #[arg(
        long = "seed",
        help = "RNG seed (defaults to a value drawn from the OS RNG)",
        value_name = "SEED"
    )]
    pub seed: Option<u64>,

    #[arg(
        short = 'j',
        long = "json",
        help = "Sets output type to JSON",
        default_value_t = false
    )]
    pub json: bool,
}
