//! Arc-flow branching.
//!
//! The node LP is projected onto arc flows: every column with positive value
//! sends that value along each arc of its arc set. Branching picks a
//! fractional aggregate flow — stage-1 arcs first, then stage-2 arcs by
//! ascending strip type — preferring the flow whose fractional part is
//! closest to 0.5. The left child caps the arc at `floor(flow)` (a zero
//! constraint when the floor is 0), the right child forces it to at least
//! `ceil(flow)`. No column is ever forbidden outright, so pricing stays
//! valid in both children.

use std::collections::BTreeMap;

use crate::column::{XColumn, YColumn};
use crate::instance::Instance;
use crate::network::{Arc, Network, Networks};
use crate::node::NodeConstraints;

/// Which network a branching decision lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStage {
    /// Stage-1 arc (width direction, Y-columns).
    Sp1,
    /// Stage-2 arc of one strip type (length direction, X-columns).
    Sp2 {
        /// The strip type whose network the arc belongs to.
        strip: usize,
    },
}

/// A fractional arc selected for branching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchArc {
    /// The network the arc belongs to.
    pub stage: BranchStage,
    /// The arc itself.
    pub arc: Arc,
    /// Its aggregate LP flow.
    pub flow: f64,
}

/// Aggregates Y-column LP values into stage-1 arc flows.
pub fn aggregate_sp1_flows(
    columns: &[YColumn],
    network: &Network,
    zero_tol: f64,
) -> BTreeMap<Arc, f64> {
    let mut flows = BTreeMap::new();
    for col in columns {
        if col.value < zero_tol {
            continue;
        }
        for &arc in &col.arcs {
            if network.contains(arc) {
                *flows.entry(arc).or_insert(0.0) += col.value;
            }
        }
    }
    flows
}

/// Aggregates X-column LP values of one strip type into stage-2 arc flows.
pub fn aggregate_sp2_flows(
    columns: &[XColumn],
    strip: usize,
    network: &Network,
    zero_tol: f64,
) -> BTreeMap<Arc, f64> {
    let mut flows = BTreeMap::new();
    for col in columns {
        if col.strip != strip || col.value < zero_tol {
            continue;
        }
        for &arc in &col.arcs {
            if network.contains(arc) {
                *flows.entry(arc).or_insert(0.0) += col.value;
            }
        }
    }
    flows
}

/// Picks the fractional arc whose fractional part is closest to 0.5, or
/// `None` when every flow is integral within `arc_int_tol`.
fn fractional_arc(flows: &BTreeMap<Arc, f64>, arc_int_tol: f64) -> Option<(Arc, f64)> {
    let mut best: Option<(Arc, f64, f64)> = None;
    for (&arc, &flow) in flows {
        let frac = flow - flow.floor();
        if frac < arc_int_tol || frac > 1.0 - arc_int_tol {
            continue;
        }
        let score = 0.5 - (frac - 0.5).abs();
        match best {
            Some((_, _, best_score)) if score <= best_score => {}
            _ => best = Some((arc, flow, score)),
        }
    }
    best.map(|(arc, flow, _)| (arc, flow))
}

/// Selects the branching arc for a node's LP solution, or `None` when the
/// solution is arc-integer and the node is an integer candidate.
pub fn select_branch_arc(
    instance: &Instance,
    networks: &Networks,
    y_columns: &[YColumn],
    x_columns: &[XColumn],
    zero_tol: f64,
    arc_int_tol: f64,
) -> Option<BranchArc> {
    let sp1_flows = aggregate_sp1_flows(y_columns, &networks.sp1, zero_tol);
    if let Some((arc, flow)) = fractional_arc(&sp1_flows, arc_int_tol) {
        return Some(BranchArc {
            stage: BranchStage::Sp1,
            arc,
            flow,
        });
    }

    for strip in 0..instance.num_strips() {
        let flows = aggregate_sp2_flows(x_columns, strip, &networks.sp2[strip], zero_tol);
        if let Some((arc, flow)) = fractional_arc(&flows, arc_int_tol) {
            return Some(BranchArc {
                stage: BranchStage::Sp2 { strip },
                arc,
                flow,
            });
        }
    }

    None
}

/// Emits the constraint sets of the two children: the parent's constraints
/// plus the upper bound (left) or lower bound (right) on the branched arc.
pub fn branch_children(
    parent: &NodeConstraints,
    branch: &BranchArc,
) -> (NodeConstraints, NodeConstraints) {
    let floor = branch.flow.floor() as u32;
    let ceil = branch.flow.ceil() as u32;

    let mut left = parent.clone();
    let mut right = parent.clone();

    match branch.stage {
        BranchStage::Sp1 => {
            if floor == 0 {
                left.sp1.zero.insert(branch.arc);
            } else {
                left.sp1.upper.insert(branch.arc, floor);
            }
            right.sp1.lower.insert(branch.arc, ceil);
        }
        BranchStage::Sp2 { strip } => {
            let left_bounds = left.sp2.entry(strip).or_default();
            if floor == 0 {
                left_bounds.zero.insert(branch.arc);
            } else {
                left_bounds.upper.insert(branch.arc, floor);
            }
            right
                .sp2
                .entry(strip)
                .or_default()
                .lower
                .insert(branch.arc, ceil);
        }
    }

    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::ItemType;

    fn setup() -> (Instance, Networks) {
        let instance = Instance::new(
            20,
            20,
            vec![
                ItemType { id: 0, width: 10, length: 10, demand: 4 },
                ItemType { id: 1, width: 5, length: 20, demand: 2 },
            ],
        )
        .unwrap();
        let networks = Networks::build(&instance);
        (instance, networks)
    }

    #[test]
    fn flows_accumulate_over_columns() {
        let (instance, networks) = setup();
        let mut a = YColumn::new(&instance, vec![2, 0]);
        a.value = 1.5;
        let mut b = YColumn::new(&instance, vec![1, 2]);
        b.value = 0.25;

        let flows = aggregate_sp1_flows(&[a, b], &networks.sp1, 1e-6);
        // Arc (0,10) is shared by both placements.
        assert!((flows[&Arc::new(0, 10)] - 1.75).abs() < 1e-9);
        assert!((flows[&Arc::new(10, 20)] - 1.5).abs() < 1e-9);
        assert!((flows[&Arc::new(10, 15)] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn selection_prefers_flows_nearest_one_half() {
        let (instance, networks) = setup();
        let mut a = YColumn::new(&instance, vec![2, 0]);
        a.value = 1.25;
        let mut b = YColumn::new(&instance, vec![0, 4]);
        b.value = 0.5;

        let branch = select_branch_arc(&instance, &networks, &[a, b], &[], 1e-6, 1e-4).unwrap();
        // The width-5 strips carry flow 0.5, the width-10 strips 1.25.
        assert_eq!(branch.stage, BranchStage::Sp1);
        assert_eq!(branch.arc.len(), 5);
        assert!((branch.flow - 0.5).abs() < 1e-9);
    }

    #[test]
    fn integral_flows_mean_no_branch() {
        let (instance, networks) = setup();
        let mut y = YColumn::new(&instance, vec![2, 0]);
        y.value = 2.0;
        let mut x = XColumn::new(&instance, 0, vec![2, 0]);
        x.value = 2.00001;

        // Both are within the 1e-4 integrality tolerance.
        assert!(select_branch_arc(&instance, &networks, &[y], &[x], 1e-6, 1e-4).is_none());
    }

    #[test]
    fn sp2_branch_names_the_strip() {
        let (instance, networks) = setup();
        let mut x = XColumn::new(&instance, 0, vec![2, 0]);
        x.value = 2.5;

        let branch = select_branch_arc(&instance, &networks, &[], &[x], 1e-6, 1e-4).unwrap();
        assert_eq!(branch.stage, BranchStage::Sp2 { strip: 0 });
    }

    #[test]
    fn children_get_floor_and_ceil_bounds() {
        let parent = NodeConstraints::default();
        let branch = BranchArc {
            stage: BranchStage::Sp1,
            arc: Arc::new(0, 10),
            flow: 1.5,
        };
        let (left, right) = branch_children(&parent, &branch);
        assert_eq!(left.sp1.upper[&Arc::new(0, 10)], 1);
        assert_eq!(right.sp1.lower[&Arc::new(0, 10)], 2);

        let branch = BranchArc {
            stage: BranchStage::Sp2 { strip: 1 },
            arc: Arc::new(0, 20),
            flow: 0.5,
        };
        let (left, right) = branch_children(&parent, &branch);
        assert!(left.sp2_bounds(1).unwrap().zero.contains(&Arc::new(0, 20)));
        assert_eq!(right.sp2_bounds(1).unwrap().lower[&Arc::new(0, 20)], 1);
    }

    #[test]
    fn children_inherit_ancestor_constraints() {
        let mut parent = NodeConstraints::default();
        parent.sp1.zero.insert(Arc::new(5, 10));

        let branch = BranchArc {
            stage: BranchStage::Sp1,
            arc: Arc::new(0, 10),
            flow: 2.5,
        };
        let (left, right) = branch_children(&parent, &branch);
        assert!(left.sp1.zero.contains(&Arc::new(5, 10)));
        assert!(right.sp1.zero.contains(&Arc::new(5, 10)));
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 2);
    }
}
