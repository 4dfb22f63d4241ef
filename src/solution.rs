//! Integer solutions and their physical cutting plans.
//!
//! An [`Incumbent`] holds the integer column counts of the best solution
//! found so far. A [`CuttingPlan`] expands those counts into physical plates
//! with item coordinates: strips stack in descending strip-type order along
//! the width axis (the `y` coordinate), items run left to right along the
//! length axis (the `x` coordinate). The placement is a representation
//! choice of the exporter, not a solver invariant.

use crate::column::{ColumnPool, XColumn, YColumn};
use crate::instance::Instance;

/// The best integer solution found so far. Column `value`s are integer
/// counts.
#[derive(Debug, Clone)]
pub struct Incumbent {
    /// Number of stock plates used.
    pub objective: f64,
    /// Stage-1 columns with positive count.
    pub y: Vec<YColumn>,
    /// Stage-2 columns with positive count.
    pub x: Vec<XColumn>,
}

impl Incumbent {
    /// Builds an incumbent from an arc-integral node LP. Values within
    /// `arc_int_tol` of an integer snap to it; anything else rounds up, so
    /// the plan can only over-produce, never violate demand.
    pub(crate) fn from_arc_integral(
        columns: &ColumnPool,
        arc_int_tol: f64,
        zero_tol: f64,
    ) -> Incumbent {
        let snap = |value: f64| {
            let rounded = value.round();
            if (value - rounded).abs() <= arc_int_tol {
                rounded
            } else {
                value.ceil()
            }
        };
        Incumbent::collect(columns, zero_tol, snap)
    }

    /// The anytime fallback: every positive value of the (fractional) root
    /// LP rounds up. Always feasible, rarely tight.
    pub(crate) fn from_rounded_lp(columns: &ColumnPool, zero_tol: f64) -> Incumbent {
        Incumbent::collect(columns, zero_tol, f64::ceil)
    }

    fn collect(columns: &ColumnPool, zero_tol: f64, round: impl Fn(f64) -> f64) -> Incumbent {
        let y: Vec<YColumn> = columns
            .y
            .iter()
            .filter(|col| col.value > zero_tol)
            .map(|col| {
                let mut col = col.clone();
                col.value = round(col.value);
                col
            })
            .collect();
        let x: Vec<XColumn> = columns
            .x
            .iter()
            .filter(|col| col.value > zero_tol)
            .map(|col| {
                let mut col = col.clone();
                col.value = round(col.value);
                col
            })
            .collect();
        let objective = y.iter().map(|col| col.value).sum();
        Incumbent { objective, y, x }
    }

    /// Total number of plates in the plan.
    pub fn plates(&self) -> u64 {
        self.y.iter().map(|col| col.value.round() as u64).sum()
    }
}

/// One item placed on a plate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedItem {
    /// Item-type index.
    pub item_type: usize,
    /// Offset along the length axis.
    pub x: u32,
    /// Offset along the width axis.
    pub y: u32,
    /// Item width.
    pub width: u32,
    /// Item length.
    pub length: u32,
}

/// One physical stock plate of the plan.
#[derive(Debug, Clone)]
pub struct Plate {
    /// 1-based plate number.
    pub plate_id: usize,
    /// Item area over plate area.
    pub utilization: f64,
    /// Placed items.
    pub items: Vec<PlacedItem>,
}

/// The full cutting plan of an incumbent.
#[derive(Debug, Clone)]
pub struct CuttingPlan {
    /// Plates in emission order.
    pub plates: Vec<Plate>,
    /// Demanded item area over the area of all used plates.
    pub total_utilization: f64,
}

/// Expands an incumbent into plates with item coordinates. Each strip of a
/// plate consumes one X-column use of its strip type from the incumbent's
/// budget; strips left without an X-column stay empty (over-produced
/// strips).
pub fn build_plan(instance: &Instance, incumbent: &Incumbent) -> CuttingPlan {
    let mut budgets: Vec<Vec<(usize, u32)>> = vec![Vec::new(); instance.num_strips()];
    for (idx, col) in incumbent.x.iter().enumerate() {
        let count = col.value.round() as u32;
        if count > 0 {
            budgets[col.strip].push((idx, count));
        }
    }

    let plate_area = instance.stock_width as u64 * instance.stock_length as u64;
    let mut plates = Vec::new();

    for y_col in &incumbent.y {
        let copies = y_col.value.round() as u32;
        for _ in 0..copies {
            let mut items = Vec::new();
            let mut strip_y = 0u32;

            for (j, strip) in instance.strips.iter().enumerate() {
                for _ in 0..y_col.pattern[j] {
                    if let Some(slot) = budgets[j].iter_mut().find(|(_, left)| *left > 0) {
                        slot.1 -= 1;
                        let x_col = &incumbent.x[slot.0];
                        let mut item_x = 0u32;
                        for (i, &count) in x_col.pattern.iter().enumerate() {
                            let item = &instance.items[i];
                            if count == 0 || item.width != strip.width {
                                continue;
                            }
                            for _ in 0..count {
                                items.push(PlacedItem {
                                    item_type: i,
                                    x: item_x,
                                    y: strip_y,
                                    width: item.width,
                                    length: item.length,
                                });
                                item_x += item.length;
                            }
                        }
                    }
                    strip_y += strip.width;
                }
            }

            let item_area: u64 = items
                .iter()
                .map(|item| item.width as u64 * item.length as u64)
                .sum();
            plates.push(Plate {
                plate_id: plates.len() + 1,
                utilization: if plate_area > 0 {
                    item_area as f64 / plate_area as f64
                } else {
                    0.0
                },
                items,
            });
        }
    }

    let used_area = plates.len() as u64 * plate_area;
    let total_utilization = if used_area > 0 {
        instance.demand_area() as f64 / used_area as f64
    } else {
        0.0
    };

    CuttingPlan {
        plates,
        total_utilization,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::ItemType;

    fn instance() -> Instance {
        Instance::new(
            20,
            20,
            vec![
                ItemType { id: 0, width: 10, length: 10, demand: 4 },
                ItemType { id: 1, width: 5, length: 20, demand: 2 },
            ],
        )
        .unwrap()
    }

    fn incumbent(instance: &Instance) -> Incumbent {
        let mut pool = ColumnPool::default();
        let mut y1 = YColumn::new(instance, vec![2, 0]);
        y1.value = 1.0;
        let mut y2 = YColumn::new(instance, vec![0, 2]);
        y2.value = 1.0;
        pool.y.push(y1);
        pool.y.push(y2);

        let mut x1 = XColumn::new(instance, 0, vec![2, 0]);
        x1.value = 2.0;
        let mut x2 = XColumn::new(instance, 1, vec![0, 1]);
        x2.value = 2.0;
        pool.x.push(x1);
        pool.x.push(x2);

        Incumbent::from_arc_integral(&pool, 1e-4, 1e-6)
    }

    #[test]
    fn snapping_rounds_near_integers_and_ceils_the_rest() {
        let instance = instance();
        let mut pool = ColumnPool::default();
        let mut a = YColumn::new(&instance, vec![2, 0]);
        a.value = 1.99997;
        let mut b = YColumn::new(&instance, vec![0, 2]);
        b.value = 0.5;
        let mut c = YColumn::new(&instance, vec![0, 4]);
        c.value = 0.0;
        pool.y.extend([a, b, c]);

        let incumbent = Incumbent::from_arc_integral(&pool, 1e-4, 1e-6);
        assert_eq!(incumbent.y.len(), 2);
        assert_eq!(incumbent.y[0].value, 2.0);
        assert_eq!(incumbent.y[1].value, 1.0);
        assert_eq!(incumbent.objective, 3.0);
        assert_eq!(incumbent.plates(), 3);
    }

    #[test]
    fn plan_stacks_strips_descending_and_items_left_to_right() {
        let instance = instance();
        let plan = build_plan(&instance, &incumbent(&instance));

        assert_eq!(plan.plates.len(), 2);

        // Plate 1: two width-10 strips, each with two 10x10 items.
        let first = &plan.plates[0];
        assert_eq!(first.items.len(), 4);
        assert_eq!(
            first.items[0],
            PlacedItem { item_type: 0, x: 0, y: 0, width: 10, length: 10 }
        );
        assert_eq!(
            first.items[1],
            PlacedItem { item_type: 0, x: 10, y: 0, width: 10, length: 10 }
        );
        assert_eq!(first.items[2].y, 10);
        assert!((first.utilization - 1.0).abs() < 1e-9);

        // Plate 2: two width-5 strips, one 5x20 item each, half the plate
        // wasted.
        let second = &plan.plates[1];
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.items[0].y, 0);
        assert_eq!(second.items[1].y, 5);
        assert!((second.utilization - 0.5).abs() < 1e-9);

        // 600 demanded area over 2 plates of 400.
        assert!((plan.total_utilization - 0.75).abs() < 1e-9);
    }

    #[test]
    fn zero_demand_plan_is_empty() {
        let instance = Instance::new(
            10,
            10,
            vec![ItemType { id: 0, width: 5, length: 5, demand: 0 }],
        )
        .unwrap();
        let pool = ColumnPool::default();
        let incumbent = Incumbent::from_arc_integral(&pool, 1e-4, 1e-6);
        assert_eq!(incumbent.plates(), 0);
        let plan = build_plan(&instance, &incumbent);
        assert!(plan.plates.is_empty());
        assert_eq!(plan.total_utilization, 0.0);
    }
}
