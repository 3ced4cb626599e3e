/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

//! Grounded on `sky-bench/src/error.rs`'s `Error`/`BResult` shape. The
//! harness has only one failure mode worth naming: the CLI invocation
//! described a configuration the tree itself considers invalid.

use std::fmt;

pub type HResult<T> = Result<T, Error>;

#[derive(Debug)]
pub struct Error(lfcatree::ConfigError);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bad configuration: {}", self.0)
    }
}

impl std::error::Error for Error {}

impl From<lfcatree::ConfigError> for Error {
    fn from(e: lfcatree::ConfigError) -> Self {
        Error(e)
    }
}
