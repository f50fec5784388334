/*****************************************************************************************[lib.rs]
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

//! SAT-based weighted frequent/closed itemset mining.
//!
//! The mining problem is reduced to model enumeration over a CDCL solver:
//! item variables describe the candidate itemset, transaction variables
//! track which transactions still cover it, and reifier variables carry
//! per-occurrence weights so that a weight deficit can be detected during
//! unit propagation. The search space is split over a pool of workers by
//! guiding-path index striding (see [`coop`]).

//======== LOG ============

// stubs when logging is not enabled
#[cfg(not(feature = "logging"))]
#[macro_use]
pub(crate) mod log {
    macro_rules! trace {
        ($( $x:expr ),*) => {};
    }
    macro_rules! debug {
        ($( $x:expr ),*) => {};
    }
    macro_rules! info {
        ($( $x:expr ),*) => {};
    }
}

#[cfg(feature = "logging")]
#[macro_use]
pub extern crate log;

//======== PUBLIC INTERFACE ============

pub mod callbacks;
pub mod clause;
pub mod coop;
pub mod core;
pub mod db;
pub mod intmap;

pub use crate::{
    callbacks::{Basic as BasicCallbacks, Callbacks, Stats as StatsCallbacks},
    clause::{display::Print, lbool, LMap, Lit, VMap, Var},
    coop::{solve_parallel, Cooperation, MiningResult},
    core::{Solver, SolverOpts},
    db::{parse_db, TransactionDb},
};

/// Basic miner, with basic callbacks
pub type BasicSolver = Solver<BasicCallbacks>;
