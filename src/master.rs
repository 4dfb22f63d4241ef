//! Restricted master problem.
//!
//! The master LP of a node minimizes the number of stock plates:
//!
//! ```text
//!   min  Σ_k Y_k
//!   s.t. Σ_k C_jk Y_k − Σ_{p: τ(p)=j} X_p       >= 0      (strip balance, dual v_j)
//!        Σ_p B_ip X_p                           >= d_i    (demand, dual π_i)
//!        Σ_{k: a ∈ arcs(Y_k)} Y_k      <=/>= bound        (stage-1 arc rows, dual μ¹_a)
//!        Σ_{p: τ(p)=τ ∧ a ∈ arcs(X_p)} X_p <=/>= bound    (stage-2 arc rows, dual μ²_τa)
//! ```
//!
//! The arc rows materialize the node's inherited branching constraints. Every
//! row is tagged in a [`RowCatalog`] built at node creation, so a newly priced
//! column finds the rows it must enter by structure (stage, arc, strip type),
//! never by parsing row names. Rows are `modifiable` so the pricer may append
//! coefficients while SCIP is solving.
//!
//! Each node gets a fresh SCIP model: the column pool is owned on the Rust
//! side and the model is a disposable view of it, solved once to
//! column-generation convergence by the attached [`CgPricer`].

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use russcip::prelude::*;
use russcip::*;

use crate::colgen::{CgOutcome, CgPricer, CgShared, ColumnVars};
use crate::column::{ColumnPool, XColumn, YColumn};
use crate::config::{SolverConfig, SpMethod};
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::network::{Arc, Networks};
use crate::node::{NodeConstraints, NodeId};

/// Bound carried by an arc-flow branching row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArcRowBound {
    /// Aggregate flow fixed to zero (`<= 0`).
    Zero,
    /// Aggregate flow capped (`<= bound`).
    Upper(u32),
    /// Aggregate flow forced (`>= bound`).
    Lower(u32),
}

/// Structural identity of one master row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RowKind {
    /// Strip-balance row of strip type `j`.
    StripBalance(usize),
    /// Demand row of item type `i`.
    Demand(usize),
    /// Stage-1 arc branching row.
    Sp1Arc { arc: Arc, bound: ArcRowBound },
    /// Stage-2 arc branching row of one strip type.
    Sp2Arc { strip: usize, arc: Arc, bound: ArcRowBound },
}

/// The rows of one node's master LP, in model order.
#[derive(Debug, Clone)]
pub(crate) struct RowCatalog {
    pub rows: Vec<RowKind>,
}

impl RowCatalog {
    /// Base rows first, then the node's stage-1 arc rows (zero, upper, lower)
    /// and per-strip stage-2 arc rows in ascending strip order.
    pub fn for_node(instance: &Instance, constraints: &NodeConstraints) -> RowCatalog {
        let mut rows = Vec::new();
        for j in 0..instance.num_strips() {
            rows.push(RowKind::StripBalance(j));
        }
        for i in 0..instance.num_items() {
            rows.push(RowKind::Demand(i));
        }

        for &arc in &constraints.sp1.zero {
            rows.push(RowKind::Sp1Arc { arc, bound: ArcRowBound::Zero });
        }
        for (&arc, &bound) in &constraints.sp1.upper {
            rows.push(RowKind::Sp1Arc { arc, bound: ArcRowBound::Upper(bound) });
        }
        for (&arc, &bound) in &constraints.sp1.lower {
            rows.push(RowKind::Sp1Arc { arc, bound: ArcRowBound::Lower(bound) });
        }

        for (&strip, bounds) in &constraints.sp2 {
            for &arc in &bounds.zero {
                rows.push(RowKind::Sp2Arc { strip, arc, bound: ArcRowBound::Zero });
            }
            for (&arc, &bound) in &bounds.upper {
                rows.push(RowKind::Sp2Arc { strip, arc, bound: ArcRowBound::Upper(bound) });
            }
            for (&arc, &bound) in &bounds.lower {
                rows.push(RowKind::Sp2Arc { strip, arc, bound: ArcRowBound::Lower(bound) });
            }
        }

        RowCatalog { rows }
    }
}

/// Coefficient of a Y-column in a row.
pub(crate) fn y_coef(kind: &RowKind, column: &YColumn) -> f64 {
    match kind {
        RowKind::StripBalance(j) => column.pattern[*j] as f64,
        RowKind::Demand(_) => 0.0,
        RowKind::Sp1Arc { arc, .. } => {
            if column.arcs.contains(arc) {
                1.0
            } else {
                0.0
            }
        }
        RowKind::Sp2Arc { .. } => 0.0,
    }
}

/// Coefficient of an X-column in a row.
pub(crate) fn x_coef(kind: &RowKind, column: &XColumn) -> f64 {
    match kind {
        RowKind::StripBalance(j) => {
            if column.strip == *j {
                -1.0
            } else {
                0.0
            }
        }
        RowKind::Demand(i) => column.pattern[*i] as f64,
        RowKind::Sp1Arc { .. } => 0.0,
        RowKind::Sp2Arc { strip, arc, .. } => {
            if column.strip == *strip && column.arcs.contains(arc) {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Result of pricing one node to convergence.
#[derive(Debug)]
pub(crate) enum NodeLp {
    /// Column generation converged (or was cut short by the clock); the LP
    /// optimum over the final pool, with per-column primal values.
    Optimal {
        objective: f64,
        y_values: Vec<f64>,
        x_values: Vec<f64>,
        cg: CgOutcome,
    },
    /// The inherited branching rows are incompatible with demand.
    Infeasible,
}

/// Builds the node's master LP, attaches the column-generation pricer and
/// solves to convergence. The pool behind `pool` grows as columns are priced
/// in; primal values are read back through the kept variable handles after
/// the solve.
pub(crate) fn solve_node(
    instance: &Rc<Instance>,
    networks: &Rc<Networks>,
    config: &SolverConfig,
    node_id: NodeId,
    constraints: &NodeConstraints,
    pool: &Rc<RefCell<ColumnPool>>,
    deadline: Option<Instant>,
) -> Result<NodeLp> {
    validate_backends(config, constraints, node_id)?;

    let catalog = RowCatalog::for_node(instance, constraints);

    let mut model = Model::default()
        .hide_output()
        .set_presolving(ParamSetting::Off)
        .set_separating(ParamSetting::Off)
        .set_heuristics(ParamSetting::Off)
        .minimize();

    let (n_y, n_x) = {
        let pool = pool.borrow();
        (pool.y.len(), pool.x.len())
    };

    // Variable handles are kept for the whole solve: primal values are read
    // back through them, which survives SCIP's renaming of transformed
    // variables. The pricer appends its own handles to the same registry.
    let column_vars = Rc::new(RefCell::new(ColumnVars::default()));
    {
        let mut registry = column_vars.borrow_mut();
        for idx in 0..n_y {
            registry.y.push(model.add(var().obj(1.0).name(&format!("y{idx}"))));
        }
        for idx in 0..n_x {
            registry.x.push(model.add(var().name(&format!("x{idx}"))));
        }
    }

    let row_names: Vec<String> = (0..catalog.rows.len()).map(|k| format!("r{k}")).collect();
    let mut rows: Vec<(RowKind, Constraint)> = Vec::with_capacity(catalog.rows.len());
    {
        let pool = pool.borrow();
        let registry = column_vars.borrow();
        for (k, kind) in catalog.rows.iter().enumerate() {
            let mut builder = cons().name(&row_names[k]).modifiable(true);
            builder = match kind {
                RowKind::StripBalance(_) => builder.ge(0.0),
                RowKind::Demand(i) => builder.ge(instance.items[*i].demand as f64),
                RowKind::Sp1Arc { bound, .. } | RowKind::Sp2Arc { bound, .. } => match bound {
                    ArcRowBound::Zero => builder.le(0.0),
                    ArcRowBound::Upper(b) => builder.le(*b as f64),
                    ArcRowBound::Lower(b) => builder.ge(*b as f64),
                },
            };
            for (i, column) in pool.y.iter().enumerate() {
                let coef = y_coef(kind, column);
                if coef != 0.0 {
                    builder = builder.coef(&registry.y[i], coef);
                }
            }
            for (i, column) in pool.x.iter().enumerate() {
                let coef = x_coef(kind, column);
                if coef != 0.0 {
                    builder = builder.coef(&registry.x[i], coef);
                }
            }
            let handle = model.add(builder);
            rows.push((kind.clone(), handle));
        }
    }

    let shared = Rc::new(CgShared::new(deadline, config.max_cg_iters));
    let cg = CgPricer::new(
        Rc::clone(instance),
        Rc::clone(networks),
        config.clone(),
        node_id,
        constraints.clone(),
        rows,
        Rc::clone(pool),
        Rc::clone(&column_vars),
        Rc::clone(&shared),
    );
    model.add(pricer(cg).name("colgen"));

    let solved = model.solve();

    if let Some(err) = shared.take_error() {
        return Err(err);
    }

    match solved.status() {
        Status::Optimal => {}
        Status::Infeasible => return Ok(NodeLp::Infeasible),
        other => {
            return Err(Error::Backend(format!(
                "master LP of node {node_id} finished with status {other:?}"
            )));
        }
    }

    let sol = solved.best_sol().ok_or_else(|| {
        Error::Backend(format!("master LP of node {node_id} is optimal but has no solution"))
    })?;

    let snap = |value: f64| if value.abs() < config.zero_tol { 0.0 } else { value };
    let registry = column_vars.borrow();
    let y_values: Vec<f64> = registry.y.iter().map(|v| snap(sol.val(v))).collect();
    let x_values: Vec<f64> = registry.x.iter().map(|v| snap(sol.val(v))).collect();

    Ok(NodeLp::Optimal {
        objective: sol.obj_val(),
        y_values,
        x_values,
        cg: shared.outcome(),
    })
}

/// The knapsack-style backends ignore arc duals and bounds, so they are only
/// sound while the corresponding stage carries no branching constraints.
fn validate_backends(
    config: &SolverConfig,
    constraints: &NodeConstraints,
    node: NodeId,
) -> Result<()> {
    if !constraints.sp1.is_empty() && config.sp1_method != SpMethod::ArcFlow {
        return Err(Error::InvalidBackend {
            method: config.sp1_method,
            node,
        });
    }
    let sp2_constrained = constraints.sp2.values().any(|bounds| !bounds.is_empty());
    if sp2_constrained && config.sp2_method != SpMethod::ArcFlow {
        return Err(Error::InvalidBackend {
            method: config.sp2_method,
            node,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic;
    use crate::instance::ItemType;
    use crate::network::Networks;
    use crate::node::ArcBounds;

    fn instance() -> Rc<Instance> {
        Rc::new(
            Instance::new(
                20,
                20,
                vec![
                    ItemType { id: 0, width: 10, length: 10, demand: 4 },
                    ItemType { id: 1, width: 5, length: 20, demand: 2 },
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn catalog_orders_base_rows_before_arc_rows() {
        let instance = instance();
        let mut constraints = NodeConstraints::default();
        constraints.sp1.zero.insert(Arc::new(0, 10));
        constraints
            .sp2
            .entry(1)
            .or_insert_with(ArcBounds::default)
            .lower
            .insert(Arc::new(0, 20), 1);

        let catalog = RowCatalog::for_node(&instance, &constraints);
        assert_eq!(catalog.rows.len(), 2 + 2 + 1 + 1);
        assert_eq!(catalog.rows[0], RowKind::StripBalance(0));
        assert_eq!(catalog.rows[2], RowKind::Demand(0));
        assert_eq!(
            catalog.rows[4],
            RowKind::Sp1Arc { arc: Arc::new(0, 10), bound: ArcRowBound::Zero }
        );
        assert_eq!(
            catalog.rows[5],
            RowKind::Sp2Arc {
                strip: 1,
                arc: Arc::new(0, 20),
                bound: ArcRowBound::Lower(1)
            }
        );
    }

    #[test]
    fn coefficients_follow_pattern_and_arc_membership() {
        let instance = instance();
        let y = YColumn::new(&instance, vec![1, 2]);
        let x = XColumn::new(&instance, 0, vec![2, 0]);

        assert_eq!(y_coef(&RowKind::StripBalance(1), &y), 2.0);
        assert_eq!(y_coef(&RowKind::Demand(0), &y), 0.0);
        assert_eq!(
            y_coef(&RowKind::Sp1Arc { arc: Arc::new(0, 10), bound: ArcRowBound::Zero }, &y),
            1.0
        );
        assert_eq!(
            y_coef(&RowKind::Sp1Arc { arc: Arc::new(5, 10), bound: ArcRowBound::Zero }, &y),
            0.0
        );

        assert_eq!(x_coef(&RowKind::StripBalance(0), &x), -1.0);
        assert_eq!(x_coef(&RowKind::StripBalance(1), &x), 0.0);
        assert_eq!(x_coef(&RowKind::Demand(0), &x), 2.0);
        assert_eq!(
            x_coef(
                &RowKind::Sp2Arc {
                    strip: 0,
                    arc: Arc::new(0, 10),
                    bound: ArcRowBound::Zero
                },
                &x
            ),
            1.0
        );
        assert_eq!(
            x_coef(
                &RowKind::Sp2Arc {
                    strip: 1,
                    arc: Arc::new(0, 10),
                    bound: ArcRowBound::Zero
                },
                &x
            ),
            0.0
        );
    }

    #[test]
    fn knapsack_backend_is_refused_under_arc_constraints() {
        let config = SolverConfig {
            sp1_method: SpMethod::Knapsack,
            sp2_method: SpMethod::Knapsack,
            ..SolverConfig::default()
        };
        let mut constraints = NodeConstraints::default();
        assert!(validate_backends(&config, &constraints, 1).is_ok());

        constraints.sp1.zero.insert(Arc::new(0, 10));
        assert!(matches!(
            validate_backends(&config, &constraints, 1),
            Err(Error::InvalidBackend { .. })
        ));
    }

    #[test]
    fn converged_pricing_is_idempotent() {
        let instance = instance();
        let networks = Rc::new(Networks::build(&instance));
        let config = SolverConfig::default();
        let pool = Rc::new(RefCell::new(heuristic::initial_basis(&instance)));

        solve_node(&instance, &networks, &config, 0, &NodeConstraints::default(), &pool, None)
            .unwrap();
        let y_count = pool.borrow().y.len();
        let x_count = pool.borrow().x.len();

        // Re-pricing from the converged pool must add nothing.
        solve_node(&instance, &networks, &config, 0, &NodeConstraints::default(), &pool, None)
            .unwrap();
        assert_eq!(pool.borrow().y.len(), y_count);
        assert_eq!(pool.borrow().x.len(), x_count);
    }

    #[test]
    fn root_lp_of_a_single_perfect_item_is_one_plate() {
        let instance = Rc::new(
            Instance::new(
                10,
                10,
                vec![ItemType { id: 0, width: 10, length: 10, demand: 1 }],
            )
            .unwrap(),
        );
        let networks = Rc::new(Networks::build(&instance));
        let config = SolverConfig::default();
        let pool = Rc::new(RefCell::new(heuristic::initial_basis(&instance)));

        let lp = solve_node(
            &instance,
            &networks,
            &config,
            0,
            &NodeConstraints::default(),
            &pool,
            None,
        )
        .unwrap();

        match lp {
            NodeLp::Optimal { objective, y_values, .. } => {
                assert!((objective - 1.0).abs() < 1e-6);
                assert!((y_values.iter().sum::<f64>() - 1.0).abs() < 1e-6);
            }
            NodeLp::Infeasible => panic!("root LP must be feasible"),
        }
    }
}
