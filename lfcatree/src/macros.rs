/*
 * Created on Tue Feb 03 2026
 *
 * This file is part of lfcatree, a lock-free contention-adapting ordered
 * integer set.
 *
 * Licensed under the MIT License or Apache License, Version 2.0, at your
 * option. See the LICENSE-MIT and LICENSE-APACHE files for details.
*/

/// Declares a list of expressions as compile-time assertions.
macro_rules! assertions {
    ($($assert:expr),*$(,)?) => {$(const _: () = ::core::assert!($assert);)*}
}

pub(crate) use assertions;
