use std::time::Duration;

use clap::ValueEnum;

/// Pricing subproblem backend.
///
/// `Knapsack` and `Dp` solve the bare knapsack relaxation and are only valid
/// while the subproblem carries no arc branching constraints; `ArcFlow` prices
/// on the position-indexed network and honors inherited arc bounds, so it is
/// the only backend usable below a branched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SpMethod {
    /// Integer-knapsack MIP.
    Knapsack,
    /// Arc-flow network IP (binary arc variables, path from source to sink).
    ArcFlow,
    /// Unbounded-knapsack dynamic program.
    Dp,
}

/// Solver configuration and the three named tolerances.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Backend for the stage-1 (width direction) pricing subproblem.
    pub sp1_method: SpMethod,
    /// Backend for the stage-2 (length direction) pricing subproblems.
    pub sp2_method: SpMethod,
    /// Wall-clock budget for the whole search. `None` means unlimited.
    pub time_limit: Option<Duration>,
    /// Cap on the number of branch-and-price nodes. `None` means unlimited.
    pub max_bp_nodes: Option<usize>,
    /// Sanity cap on column-generation iterations per node. Hitting it is a
    /// bug indicator, not a tuning knob.
    pub max_cg_iters: usize,
    /// Threshold below which an LP value is treated as zero.
    pub zero_tol: f64,
    /// Strict margin a priced column must beat to count as improving.
    pub rc_tol: f64,
    /// Distance from an integer below which an arc flow counts as integral.
    pub arc_int_tol: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            sp1_method: SpMethod::ArcFlow,
            sp2_method: SpMethod::ArcFlow,
            time_limit: None,
            max_bp_nodes: None,
            max_cg_iters: 10_000,
            zero_tol: 1e-6,
            rc_tol: 1e-6,
            arc_int_tol: 1e-4,
        }
    }
}

/// Snap tolerance for reading integer counts out of a floating-point backend
/// solution.
pub(crate) const COUNT_SNAP_TOL: f64 = 1e-5;

/// Reads an integer count from a backend solution value, absorbing
/// floating-point noise on either side of the integer.
pub(crate) fn snap_count(value: f64) -> u32 {
    let rounded = value.round();
    if (value - rounded).abs() <= COUNT_SNAP_TOL {
        rounded.max(0.0) as u32
    } else {
        value.max(0.0).floor() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_absorbs_solver_noise() {
        assert_eq!(snap_count(2.0000001), 2);
        assert_eq!(snap_count(1.9999999), 2);
        assert_eq!(snap_count(2.4), 2);
        assert_eq!(snap_count(0.0), 0);
        assert_eq!(snap_count(-0.0000001), 0);
    }

    #[test]
    fn defaults_are_the_documented_tolerances() {
        let config = SolverConfig::default();
        assert_eq!(config.zero_tol, 1e-6);
        assert_eq!(config.rc_tol, 1e-6);
        assert_eq!(config.arc_int_tol, 1e-4);
        assert_eq!(config.max_cg_iters, 10_000);
    }
}
