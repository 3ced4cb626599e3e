/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! Grounded directly on `sky-bench/src/bench/report.rs`'s
//! `SingleReport`/`AggregateReport` pair: each run contributes one
//! `SingleReport` carrying its elapsed time in nanoseconds, and
//! `AggregateReport::finish` turns those into queries-per-second once every
//! run is in.

use serde::Serialize;

#[derive(Serialize)]
pub struct SingleReport {
    name: &'static str,
    /// Elapsed wall-clock time for this run, in nanoseconds.
    stat: f64,
}

impl SingleReport {
    pub fn new(name: &'static str, elapsed_nanos: f64) -> Self {
        Self {
            name,
            stat: elapsed_nanos,
        }
    }
}

pub struct AggregateReport {
    runs: Vec<SingleReport>,
    query_count: usize,
}

impl AggregateReport {
    pub fn new(query_count: usize) -> Self {
        Self {
            runs: Vec::new(),
            query_count,
        }
    }

    pub fn push(&mut self, report: SingleReport) {
        self.runs.push(report)
    }

    pub fn into_json(self) -> String {
        let (_, reps) = self.finish();
        serde_json::to_string(&reps).unwrap()
    }

    /// Converts every run's elapsed time into queries-per-second, returning
    /// the width of the longest run name alongside (for the text renderer's
    /// column alignment) and the converted reports.
    pub fn finish(self) -> (usize, Vec<SingleReport>) {
        let mut maxpad = self.runs[0].name.len();
        let mut reps = self.runs;
        for rep in reps.iter_mut() {
            let total_time = rep.stat;
            let qps = (self.query_count as f64 / total_time) * 1_000_000_000_f64;
            rep.stat = qps;
            if rep.name.len() > maxpad {
                maxpad = rep.name.len();
            }
        }
        (maxpad, reps)
    }
}

pub fn print_text(query_count: usize, report: AggregateReport) {
    let (maxpad, reps) = report.finish();
    println!("ran {query_count} operations per run");
    for rep in reps {
        println!("{:<width$} {:>12.2} ops/sec", rep.name, rep.stat, width = maxpad);
    }
}
