//! The column-generation loop, packaged as a SCIP pricer.
//!
//! SCIP's pricing loop already alternates "solve LP, ask the pricer, add
//! columns, resolve", which is precisely the restricted-master cycle: each
//! `generate_columns` callback is one pricing round working on freshly
//! re-extracted duals. A round runs SP1 first; only if SP1 yields nothing
//! improving does it sweep the SP2 subproblems in ascending strip order. At
//! most one column is added per round, so every append is followed by an LP
//! resolve before the next pricing call. Returning `NoColumns` certifies
//! convergence and SCIP finishes the node LP.
//!
//! Farkas pricing (SCIP asking for columns to repair an infeasible LP) is
//! answered with `NoColumns`: an RMP made infeasible by inherited branching
//! rows is pruned by the driver, not repaired.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;

use russcip::*;

use crate::column::{ColumnPool, XColumn, YColumn};
use crate::config::SolverConfig;
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::master::{self, RowKind};
use crate::network::{Arc, Networks};
use crate::node::{NodeConstraints, NodeId};
use crate::pricing;

/// Dual values of the current master LP, keyed structurally.
#[derive(Debug, Default)]
pub(crate) struct Duals {
    /// Strip-balance duals `v_j`, by strip type.
    pub strip: Vec<f64>,
    /// Demand duals `π_i`, by item type.
    pub item: Vec<f64>,
    /// Stage-1 arc-row duals `μ¹_a`.
    pub sp1_arc: BTreeMap<Arc, f64>,
    /// Stage-2 arc-row duals `μ²_{τ,a}`.
    pub sp2_arc: BTreeMap<(usize, Arc), f64>,
}

/// What happened inside the pricer during one node solve.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CgOutcome {
    /// The wall clock ran out mid-generation; the LP value may not be a
    /// converged bound.
    pub time_up: bool,
    /// The iteration sanity cap fired.
    pub cap_hit: bool,
    /// Pricing rounds performed.
    pub iterations: usize,
}

/// SCIP variable handles of every column in the master, in pool order.
/// Primal values are read back through these handles after the solve.
#[derive(Default)]
pub(crate) struct ColumnVars {
    /// Handles of the Y-columns.
    pub y: Vec<Variable>,
    /// Handles of the X-columns.
    pub x: Vec<Variable>,
}

/// State shared between the driver and the pricer across the solve.
pub(crate) struct CgShared {
    deadline: Option<Instant>,
    max_iters: usize,
    iterations: Cell<usize>,
    time_up: Cell<bool>,
    cap_hit: Cell<bool>,
    error: RefCell<Option<Error>>,
}

impl CgShared {
    pub fn new(deadline: Option<Instant>, max_iters: usize) -> CgShared {
        CgShared {
            deadline,
            max_iters,
            iterations: Cell::new(0),
            time_up: Cell::new(false),
            cap_hit: Cell::new(false),
            error: RefCell::new(None),
        }
    }

    /// Takes a fatal error raised inside a callback, if any.
    pub fn take_error(&self) -> Option<Error> {
        self.error.borrow_mut().take()
    }

    pub fn outcome(&self) -> CgOutcome {
        CgOutcome {
            time_up: self.time_up.get(),
            cap_hit: self.cap_hit.get(),
            iterations: self.iterations.get(),
        }
    }
}

/// The pricer plugin driving one node's column generation.
pub(crate) struct CgPricer {
    instance: Rc<Instance>,
    networks: Rc<Networks>,
    config: SolverConfig,
    node_id: NodeId,
    constraints: NodeConstraints,
    rows: Vec<(RowKind, Constraint)>,
    pool: Rc<RefCell<ColumnPool>>,
    vars: Rc<RefCell<ColumnVars>>,
    shared: Rc<CgShared>,
}

impl CgPricer {
    pub fn new(
        instance: Rc<Instance>,
        networks: Rc<Networks>,
        config: SolverConfig,
        node_id: NodeId,
        constraints: NodeConstraints,
        rows: Vec<(RowKind, Constraint)>,
        pool: Rc<RefCell<ColumnPool>>,
        vars: Rc<RefCell<ColumnVars>>,
        shared: Rc<CgShared>,
    ) -> CgPricer {
        CgPricer {
            instance,
            networks,
            config,
            node_id,
            constraints,
            rows,
            pool,
            vars,
            shared,
        }
    }

    /// Reads every row's dual from the transformed constraint.
    fn extract_duals(&self) -> Duals {
        let mut duals = Duals {
            strip: vec![0.0; self.instance.num_strips()],
            item: vec![0.0; self.instance.num_items()],
            ..Duals::default()
        };

        for (kind, row) in &self.rows {
            let value = row_dual(row);
            match kind {
                RowKind::StripBalance(j) => duals.strip[*j] = value,
                RowKind::Demand(i) => duals.item[*i] = value,
                RowKind::Sp1Arc { arc, .. } => {
                    duals.sp1_arc.insert(*arc, value);
                }
                RowKind::Sp2Arc { strip, arc, .. } => {
                    duals.sp2_arc.insert((*strip, *arc), value);
                }
            }
        }
        duals
    }

    /// One pricing round: SP1, then SP2 by strip. Returns whether a column
    /// was added.
    fn price_round(&mut self, model: &mut Model<Solving>) -> Result<bool> {
        let duals = self.extract_duals();

        if let Some(candidate) = pricing::price_sp1(
            self.config.sp1_method,
            &self.instance,
            &self.networks.sp1,
            &self.constraints.sp1,
            &duals,
        )? {
            // A Y-column improves iff its dual value exceeds its unit cost.
            if candidate.objective > 1.0 + self.config.rc_tol
                && !self.pool.borrow().contains_y(&candidate.pattern)
            {
                self.insert_y_column(model, candidate.pattern);
                return Ok(true);
            }
        }

        for strip in 0..self.instance.num_strips() {
            if let Some(candidate) = pricing::price_sp2(
                self.config.sp2_method,
                &self.instance,
                &self.networks.sp2[strip],
                strip,
                self.constraints.sp2_bounds(strip),
                &duals,
            )? {
                // An X-column improves iff it beats the price of the strip
                // it consumes.
                if candidate.objective > duals.strip[strip] + self.config.rc_tol
                    && !self.pool.borrow().contains_x(strip, &candidate.pattern)
                {
                    self.insert_x_column(model, strip, candidate.pattern);
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    fn insert_y_column(&self, model: &mut Model<Solving>, pattern: Vec<u32>) {
        let column = YColumn::new(&self.instance, pattern);
        let mut pool = self.pool.borrow_mut();
        let name = format!("y{}", pool.y.len());
        let variable = model.add_priced_var(0.0, f64::INFINITY, 1.0, &name, VarType::Continuous);
        for (kind, row) in &self.rows {
            let coef = master::y_coef(kind, &column);
            if coef != 0.0 {
                model.add_cons_coef(row, &variable, coef);
            }
        }
        tracing::debug!(
            node = self.node_id,
            column = %name,
            pattern = ?column.pattern,
            "priced in stage-1 column"
        );
        pool.y.push(column);
        self.vars.borrow_mut().y.push(variable);
    }

    fn insert_x_column(&self, model: &mut Model<Solving>, strip: usize, pattern: Vec<u32>) {
        let column = XColumn::new(&self.instance, strip, pattern);
        let mut pool = self.pool.borrow_mut();
        let name = format!("x{}", pool.x.len());
        let variable = model.add_priced_var(0.0, f64::INFINITY, 0.0, &name, VarType::Continuous);
        for (kind, row) in &self.rows {
            let coef = master::x_coef(kind, &column);
            if coef != 0.0 {
                model.add_cons_coef(row, &variable, coef);
            }
        }
        tracing::debug!(
            node = self.node_id,
            column = %name,
            strip,
            pattern = ?column.pattern,
            "priced in stage-2 column"
        );
        pool.x.push(column);
        self.vars.borrow_mut().x.push(variable);
    }
}

impl Pricer for CgPricer {
    fn generate_columns(
        &mut self,
        mut model: Model<Solving>,
        _pricer: SCIPPricer,
        farkas: bool,
    ) -> PricerResult {
        if farkas {
            return no_columns();
        }
        if self.shared.time_up.get() {
            return no_columns();
        }
        if let Some(deadline) = self.shared.deadline {
            if Instant::now() >= deadline {
                self.shared.time_up.set(true);
                tracing::debug!(node = self.node_id, "time budget hit during column generation");
                return no_columns();
            }
        }

        let iteration = self.shared.iterations.get() + 1;
        self.shared.iterations.set(iteration);
        if iteration > self.shared.max_iters {
            if !self.shared.cap_hit.get() {
                self.shared.cap_hit.set(true);
                tracing::warn!(
                    node = self.node_id,
                    cap = self.shared.max_iters,
                    "column generation exceeded its iteration cap; keeping the latest LP value"
                );
            }
            return no_columns();
        }

        match self.price_round(&mut model) {
            Ok(true) => PricerResult {
                state: PricerResultState::FoundColumns,
                lower_bound: None,
            },
            Ok(false) => no_columns(),
            Err(err) => {
                *self.shared.error.borrow_mut() = Some(err);
                no_columns()
            }
        }
    }
}

fn no_columns() -> PricerResult {
    PricerResult {
        state: PricerResultState::NoColumns,
        lower_bound: None,
    }
}

/// Dual of a master row in the current LP. Normalizes the negative zero that
/// solvers like to produce.
fn row_dual(row: &Constraint) -> f64 {
    let transformed = row
        .transformed()
        .expect("master row lost its transformed counterpart");
    let dual = transformed
        .dual_sol()
        .expect("master row has no dual value in the current LP");
    if dual == 0.0 { 0.0 } else { dual }
}
