//! The branch-and-price driver.
//!
//! Best-first search over an arena of nodes: the unpruned, unbranched node
//! with the smallest lower bound is expanded next (ties by insertion order,
//! so traces are reproducible). Expansion prices both children to
//! convergence, accepts arc-integral children as integer solutions, then
//! sweeps the frontier pruning every node whose bound cannot beat the
//! incumbent. The search is anytime: when the clock or the node cap stops
//! it before an integer solution exists, the root LP rounded up is returned
//! and the reported gap is positive.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::branching::{self, BranchArc};
use crate::config::SolverConfig;
use crate::error::{Error, Result};
use crate::heuristic;
use crate::instance::Instance;
use crate::master::{self, NodeLp};
use crate::network::Networks;
use crate::node::{Node, NodeConstraints, NodeId};
use crate::solution::Incumbent;

/// A configured solver for one instance.
pub struct Solver {
    instance: Rc<Instance>,
    networks: Rc<Networks>,
    config: SolverConfig,
}

/// Search statistics of one run.
#[derive(Debug, Clone)]
pub struct SolveStats {
    /// Nodes created, the root included.
    pub nodes_created: usize,
    /// Nodes that were expanded into children.
    pub nodes_branched: usize,
    /// LP bound of the root node.
    pub root_lower_bound: f64,
    /// `(UB − LB*) / UB` over the surviving frontier; 0 when the tree was
    /// fully explored.
    pub gap: f64,
    /// Whether the search finished without hitting a budget.
    pub proved_optimal: bool,
    /// Whether the wall-clock budget expired.
    pub timed_out: bool,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

/// The incumbent plan and the statistics that qualify it.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Best integer solution found.
    pub incumbent: Incumbent,
    /// Search statistics.
    pub stats: SolveStats,
}

enum NodePricing {
    Solved { time_up: bool },
    Infeasible,
}

impl Solver {
    /// Builds the solver: networks are constructed once here and shared by
    /// every node.
    pub fn new(instance: Instance, config: SolverConfig) -> Solver {
        let networks = Networks::build(&instance);
        tracing::debug!(
            sp1_arcs = networks.sp1.arcs.len(),
            sp2_networks = networks.sp2.len(),
            "built arc-flow networks"
        );
        Solver {
            instance: Rc::new(instance),
            networks: Rc::new(networks),
            config,
        }
    }

    /// The instance being solved.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Runs branch and price and returns the best integer plan found.
    pub fn solve(&self) -> Result<SolveOutcome> {
        let start = Instant::now();
        let deadline = self.config.time_limit.map(|limit| start + limit);

        let mut arena: Vec<Node> = Vec::new();
        let mut incumbent: Option<Incumbent> = None;
        let mut upper_bound = f64::INFINITY;
        let mut timed_out = false;
        let mut cap_hit = false;
        let mut nodes_branched = 0usize;

        let mut root = Node::new(
            0,
            None,
            NodeConstraints::default(),
            heuristic::initial_basis(&self.instance),
        );
        match self.price_node(&mut root, deadline)? {
            NodePricing::Infeasible => {
                return Err(Error::Backend(
                    "root master LP is infeasible despite the diagonal basis".into(),
                ));
            }
            NodePricing::Solved { time_up } => {
                timed_out |= time_up;
            }
        }
        let root_lower_bound = root.lower_bound;
        tracing::info!(root_lb = root_lower_bound, "root column generation done");

        if !timed_out {
            if self.branch_of(&root).is_none() {
                let best = Incumbent::from_arc_integral(
                    &root.columns,
                    self.config.arc_int_tol,
                    self.config.zero_tol,
                );
                upper_bound = best.objective;
                tracing::info!(objective = upper_bound, "root LP is arc-integral");
                incumbent = Some(best);
                root.branched = true;
            }
        }
        arena.push(root);

        while !timed_out {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    timed_out = true;
                    break;
                }
            }
            let Some(parent_id) = select_node(&arena) else {
                break;
            };
            if let Some(cap) = self.config.max_bp_nodes {
                if arena.len() >= cap {
                    tracing::info!(cap, "node cap reached, stopping the search");
                    cap_hit = true;
                    break;
                }
            }

            let Some(branch) = self.branch_of(&arena[parent_id]) else {
                // Arc-integral nodes are closed at creation; nothing to do.
                arena[parent_id].branched = true;
                continue;
            };

            let lb = arena[parent_id].lower_bound;
            tracing::info!(
                node = parent_id,
                nodes = arena.len(),
                lb,
                ub = upper_bound,
                gap = if upper_bound.is_finite() && upper_bound > 0.0 {
                    (upper_bound - lb) / upper_bound
                } else {
                    f64::NAN
                },
                "expanding node"
            );

            let parent_constraints = arena[parent_id].constraints.clone();
            let parent_columns = arena[parent_id].columns.clone();
            let (left, right) = branching::branch_children(&parent_constraints, &branch);

            for constraints in [left, right] {
                let id = arena.len();
                let mut child = Node::new(id, Some(parent_id), constraints, parent_columns.clone());
                match self.price_node(&mut child, deadline)? {
                    NodePricing::Infeasible => {
                        tracing::debug!(node = id, "child master LP infeasible, pruned");
                    }
                    NodePricing::Solved { time_up } => {
                        if time_up {
                            // Generation was cut short; the LP value is not a
                            // certified bound, so the node cannot survive.
                            child.pruned = true;
                            timed_out = true;
                        } else {
                            // A child LP only adds constraints, so its bound
                            // never drops below the parent's.
                            debug_assert!(child.lower_bound >= lb - 1e-6);
                            if self.branch_of(&child).is_none() {
                                let candidate = Incumbent::from_arc_integral(
                                    &child.columns,
                                    self.config.arc_int_tol,
                                    self.config.zero_tol,
                                );
                                if candidate.objective < upper_bound - self.config.zero_tol {
                                    tracing::info!(
                                        node = id,
                                        objective = candidate.objective,
                                        "new incumbent"
                                    );
                                    upper_bound = candidate.objective;
                                    incumbent = Some(candidate);
                                }
                                child.branched = true;
                            }
                        }
                    }
                }
                arena.push(child);

                if let Some(deadline) = deadline {
                    if Instant::now() >= deadline {
                        timed_out = true;
                    }
                }
                if timed_out {
                    break;
                }
            }

            arena[parent_id].branched = true;
            nodes_branched += 1;

            if upper_bound.is_finite() {
                for node in arena.iter_mut() {
                    if node.is_frontier() && node.lower_bound >= upper_bound - self.config.zero_tol
                    {
                        tracing::debug!(
                            node = node.id,
                            lb = node.lower_bound,
                            ub = upper_bound,
                            "pruned by bound"
                        );
                        node.pruned = true;
                    }
                }
            }
        }

        let incumbent = match incumbent {
            Some(best) => best,
            None => {
                tracing::info!("no integer solution found, rounding the root LP up");
                Incumbent::from_rounded_lp(&arena[0].columns, self.config.zero_tol)
            }
        };
        let upper_bound = incumbent.objective;

        let frontier_lb = arena
            .iter()
            .filter(|node| node.is_frontier())
            .map(|node| node.lower_bound)
            .fold(f64::INFINITY, f64::min);
        let gap = if upper_bound <= self.config.zero_tol {
            0.0
        } else if frontier_lb.is_finite() {
            ((upper_bound - frontier_lb) / upper_bound).max(0.0)
        } else {
            0.0
        };

        let stats = SolveStats {
            nodes_created: arena.len(),
            nodes_branched,
            root_lower_bound,
            gap,
            proved_optimal: !timed_out && !cap_hit && frontier_lb.is_infinite(),
            timed_out,
            elapsed: start.elapsed(),
        };

        tracing::info!(
            objective = upper_bound,
            root_lb = stats.root_lower_bound,
            gap = stats.gap,
            nodes = stats.nodes_created,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            optimal = stats.proved_optimal,
            "search finished"
        );

        Ok(SolveOutcome { incumbent, stats })
    }

    /// Prices a node to convergence and stores the LP values on its columns.
    fn price_node(&self, node: &mut Node, deadline: Option<Instant>) -> Result<NodePricing> {
        let pool = Rc::new(RefCell::new(std::mem::take(&mut node.columns)));
        let lp = master::solve_node(
            &self.instance,
            &self.networks,
            &self.config,
            node.id,
            &node.constraints,
            &pool,
            deadline,
        );

        let mut columns = match Rc::try_unwrap(pool) {
            Ok(cell) => cell.into_inner(),
            Err(shared) => shared.borrow().clone(),
        };

        match lp? {
            NodeLp::Infeasible => {
                node.columns = columns;
                node.pruned = true;
                Ok(NodePricing::Infeasible)
            }
            NodeLp::Optimal {
                objective,
                y_values,
                x_values,
                cg,
            } => {
                for (column, value) in columns.y.iter_mut().zip(&y_values) {
                    column.value = *value;
                }
                for (column, value) in columns.x.iter_mut().zip(&x_values) {
                    column.value = *value;
                }
                node.columns = columns;
                node.lower_bound = objective;
                tracing::debug!(
                    node = node.id,
                    lb = objective,
                    iterations = cg.iterations,
                    capped = cg.cap_hit,
                    "node priced to convergence"
                );
                Ok(NodePricing::Solved { time_up: cg.time_up })
            }
        }
    }

    fn branch_of(&self, node: &Node) -> Option<BranchArc> {
        branching::select_branch_arc(
            &self.instance,
            &self.networks,
            &node.columns.y,
            &node.columns.x,
            self.config.zero_tol,
            self.config.arc_int_tol,
        )
    }
}

/// Best-first selection: smallest lower bound, first-created on ties.
fn select_node(arena: &[Node]) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;
    for node in arena {
        if !node.is_frontier() {
            continue;
        }
        match best {
            Some((_, lb)) if node.lower_bound >= lb => {}
            _ => best = Some((node.id, node.lower_bound)),
        }
    }
    best.map(|(id, _)| id)
}
