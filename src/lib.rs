//! Branch-and-price solver for the two-stage guillotine two-dimensional
//! cutting-stock problem.
//!
//! A stock plate of width `W` and length `L` is first cut into full-length
//! strips (stage 1, width direction), and each strip is then cut into items
//! of the strip's width (stage 2, length direction). The solver minimizes
//! the number of stock plates needed to satisfy all item demands.
//!
//! The restricted master LP is grown by column generation from two coupled
//! knapsack subproblems, solved through SCIP via `russcip`. Fractional LP
//! solutions are resolved by branching on the flows of a position-indexed
//! arc network rather than on original variables, which keeps every column
//! enumerable in both children and so keeps pricing valid throughout the
//! tree.
//!
//! ```no_run
//! use cutstock2d::{Instance, ItemType, Solver, SolverConfig};
//!
//! let instance = Instance::new(
//!     20,
//!     20,
//!     vec![
//!         ItemType { id: 0, width: 10, length: 10, demand: 4 },
//!         ItemType { id: 1, width: 5, length: 20, demand: 2 },
//!     ],
//! )
//! .unwrap();
//! let outcome = Solver::new(instance, SolverConfig::default()).solve().unwrap();
//! println!("{} plates", outcome.incumbent.plates());
//! ```

pub mod branching;
mod colgen;
pub mod column;
pub mod config;
pub mod error;
pub mod heuristic;
pub mod instance;
pub mod io;
mod master;
pub mod network;
pub mod node;
mod pricing;
pub mod report;
pub mod solution;
pub mod solver;

pub use config::{SolverConfig, SpMethod};
pub use error::{Error, Result};
pub use instance::{Instance, ItemType, StripType};
pub use solution::{CuttingPlan, Incumbent, build_plan};
pub use solver::{SolveOutcome, SolveStats, Solver};
