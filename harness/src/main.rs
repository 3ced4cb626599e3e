/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! Driver binary for `lfcatree`: parses the CLI, runs the configured
//! workload across worker threads, and prints a throughput report.
//!
//! Shaped after `sky-bench/src/main.rs`'s `Builder`-then-`run()` skeleton.

#[macro_use]
extern crate log;

mod bench;
mod cli;
mod error;
mod report;
mod util;

use clap::Parser;
use cli::Cli;
use env_logger::Builder;
use error::HResult;
use std::{env, process};

fn main() {
    Builder::new()
        .parse_filters(&env::var("LFCATREE_BENCH_LOG").unwrap_or_else(|_| "info".to_owned()))
        .init();
    if let Err(e) = run() {
        error!("harness exited with error: {e}");
        process::exit(0x01);
    }
}

fn run() -> HResult<()> {
    let cli = Cli::parse();
    let aggregate = bench::run(&cli)?;
    if cli.json {
        println!("{}", aggregate.into_json());
    } else {
        report::print_text(cli.threads * cli.ops_per_thread, aggregate);
    }
    info!("harness finished");
    Ok(())
}
