//! Integer-knapsack pricing backend.
//!
//! One integer count variable per type, a single capacity row, dual rewards
//! in the objective. Arc duals and arc bounds are ignored, which is exactly
//! why this backend is restricted to nodes without branching constraints.

use russcip::prelude::*;
use russcip::*;

use crate::colgen::Duals;
use crate::config::snap_count;
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::pricing::Candidate;

/// `max Σ_j v_j G_j  s.t.  Σ_j w_j G_j <= W`, `G_j` integer.
pub(super) fn price_sp1(instance: &Instance, duals: &Duals) -> Result<Option<Candidate>> {
    let mut model = Model::default().hide_output().maximize();

    let vars: Vec<Variable> = (0..instance.num_strips())
        .map(|j| model.add(var().int(0..).obj(duals.strip[j]).name(&format!("g{j}"))))
        .collect();

    let mut capacity = cons().le(instance.stock_width as f64);
    for (j, strip) in instance.strips.iter().enumerate() {
        capacity = capacity.coef(&vars[j], strip.width as f64);
    }
    model.add(capacity);

    let solved = model.solve();
    match solved.status() {
        Status::Optimal => {}
        Status::Infeasible => return Ok(None),
        other => {
            return Err(Error::Backend(format!(
                "stage-1 knapsack pricing finished with status {other:?}"
            )));
        }
    }

    let sol = solved
        .best_sol()
        .ok_or_else(|| Error::Backend("stage-1 knapsack pricing returned no solution".into()))?;
    let pattern: Vec<u32> = vars.iter().map(|v| snap_count(sol.val(v))).collect();

    Ok(Some(Candidate {
        pattern,
        objective: sol.obj_val(),
    }))
}

/// `max Σ_i π_i D_i  s.t.  Σ_i l_i D_i <= L`, `D_i` integer, over the items
/// whose width matches the strip.
pub(super) fn price_sp2(
    instance: &Instance,
    strip: usize,
    duals: &Duals,
) -> Result<Option<Candidate>> {
    let width = instance.strips[strip].width;
    let eligible: Vec<usize> = instance.items_of_width(width).to_vec();

    // Nothing priced above zero can enter; skip the solve.
    if eligible.iter().all(|&i| duals.item[i] <= 0.0) {
        return Ok(None);
    }

    let mut model = Model::default().hide_output().maximize();

    let vars: Vec<Variable> = eligible
        .iter()
        .map(|&i| model.add(var().int(0..).obj(duals.item[i]).name(&format!("d{i}"))))
        .collect();

    let mut capacity = cons().le(instance.stock_length as f64);
    for (k, &i) in eligible.iter().enumerate() {
        capacity = capacity.coef(&vars[k], instance.items[i].length as f64);
    }
    model.add(capacity);

    let solved = model.solve();
    match solved.status() {
        Status::Optimal => {}
        Status::Infeasible => return Ok(None),
        other => {
            return Err(Error::Backend(format!(
                "stage-2 knapsack pricing finished with status {other:?}"
            )));
        }
    }

    let sol = solved
        .best_sol()
        .ok_or_else(|| Error::Backend("stage-2 knapsack pricing returned no solution".into()))?;

    let mut pattern = vec![0u32; instance.num_items()];
    for (k, &i) in eligible.iter().enumerate() {
        pattern[i] = snap_count(sol.val(&vars[k]));
    }

    Ok(Some(Candidate {
        pattern,
        objective: sol.obj_val(),
    }))
}
