//! Arc-flow pricing backend.
//!
//! One 0/1 variable per arc, flow conservation at interior nodes, exactly
//! one unit leaving the source and one entering the sink: a solution is a
//! path from position 0 to the capacity, i.e. a loading pattern. Each arc
//! earns the dual of the type its length decodes to, minus the μ dual of any
//! branching row it matches, and inherited branching bounds clamp the arc
//! variables directly — which is what makes this the only backend that stays
//! valid below a branched node.

use russcip::prelude::*;
use russcip::*;

use crate::colgen::Duals;
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::network::{Arc, Network};
use crate::node::ArcBounds;
use crate::pricing::Candidate;

pub(super) fn price_sp1(
    instance: &Instance,
    network: &Network,
    bounds: &ArcBounds,
    duals: &Duals,
) -> Result<Option<Candidate>> {
    let reward = |arc: Arc| {
        let base = instance
            .strip_index(arc.len())
            .map(|j| duals.strip[j])
            .unwrap_or(0.0);
        base - duals.sp1_arc.get(&arc).copied().unwrap_or(0.0)
    };

    let Some((chosen, objective)) = solve_path(network, bounds, reward, "stage-1")? else {
        return Ok(None);
    };

    let mut pattern = vec![0u32; instance.num_strips()];
    for arc in chosen {
        if let Some(j) = instance.strip_index(arc.len()) {
            pattern[j] += 1;
        }
    }
    Ok(Some(Candidate { pattern, objective }))
}

pub(super) fn price_sp2(
    instance: &Instance,
    network: &Network,
    strip: usize,
    bounds: Option<&ArcBounds>,
    duals: &Duals,
) -> Result<Option<Candidate>> {
    let width = instance.strips[strip].width;
    let no_bounds = ArcBounds::default();
    let bounds = bounds.unwrap_or(&no_bounds);

    // Arcs of narrower items exist in the network but earn nothing: only an
    // exact-width item may be cut from the strip.
    let reward = |arc: Arc| {
        let base = match instance.item_by_length(arc.len()) {
            Some(i) if instance.items[i].width == width => duals.item[i],
            _ => 0.0,
        };
        base - duals.sp2_arc.get(&(strip, arc)).copied().unwrap_or(0.0)
    };

    let Some((chosen, objective)) = solve_path(network, bounds, reward, "stage-2")? else {
        return Ok(None);
    };

    let mut pattern = vec![0u32; instance.num_items()];
    for arc in chosen {
        if let Some(i) = instance.item_by_length(arc.len()) {
            if instance.items[i].width == width {
                pattern[i] += 1;
            }
        }
    }
    Ok(Some(Candidate { pattern, objective }))
}

/// Solves the path IP over the network. Returns the chosen arcs and the
/// objective value, or `None` when no path satisfies the bounds.
fn solve_path(
    network: &Network,
    bounds: &ArcBounds,
    reward: impl Fn(Arc) -> f64,
    stage: &str,
) -> Result<Option<(Vec<Arc>, f64)>> {
    if network.arcs.is_empty() || network.sink_in.is_empty() {
        return Ok(None);
    }

    let mut model = Model::default().hide_output().maximize();

    let mut vars: Vec<Variable> = Vec::with_capacity(network.arcs.len());
    for (idx, &arc) in network.arcs.iter().enumerate() {
        let mut lb: isize = 0;
        let mut ub: isize = 1;
        if bounds.zero.contains(&arc) {
            ub = 0;
        }
        if let Some(&cap) = bounds.upper.get(&arc) {
            ub = ub.min(cap as isize);
        }
        if let Some(&floor) = bounds.lower.get(&arc) {
            lb = floor as isize;
        }
        if lb > ub {
            // A forced flow the 0/1 path cannot carry; no column exists.
            return Ok(None);
        }
        vars.push(model.add(var().int(lb..=ub).obj(reward(arc)).name(&format!("a{idx}"))));
    }

    // Redundant knapsack row over the arc lengths; the path structure already
    // implies it but it tightens the IP.
    let mut capacity = cons().le(network.capacity as f64);
    for (idx, &arc) in network.arcs.iter().enumerate() {
        capacity = capacity.coef(&vars[idx], arc.len() as f64);
    }
    model.add(capacity);

    let mut source = cons().eq(1.0);
    for &idx in &network.source_out {
        source = source.coef(&vars[idx], 1.0);
    }
    model.add(source);

    let mut sink = cons().eq(1.0);
    for &idx in &network.sink_in {
        sink = sink.coef(&vars[idx], 1.0);
    }
    model.add(sink);

    for mid in 0..network.mid_nodes.len() {
        let mut balance = cons().eq(0.0);
        for &idx in &network.mid_in[mid] {
            balance = balance.coef(&vars[idx], 1.0);
        }
        for &idx in &network.mid_out[mid] {
            balance = balance.coef(&vars[idx], -1.0);
        }
        model.add(balance);
    }

    let solved = model.solve();
    match solved.status() {
        Status::Optimal => {}
        Status::Infeasible => return Ok(None),
        other => {
            return Err(Error::Backend(format!(
                "{stage} arc-flow pricing finished with status {other:?}"
            )));
        }
    }

    let sol = solved.best_sol().ok_or_else(|| {
        Error::Backend(format!("{stage} arc-flow pricing returned no solution"))
    })?;

    let chosen: Vec<Arc> = network
        .arcs
        .iter()
        .enumerate()
        .filter(|(idx, _)| sol.val(&vars[*idx]) > 0.5)
        .map(|(_, &arc)| arc)
        .collect();

    Ok(Some((chosen, sol.obj_val())))
}
