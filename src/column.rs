//! Master-problem columns.
//!
//! A Y-column is a stage-1 cutting pattern for one stock plate (strips per
//! strip type); an X-column is a stage-2 cutting pattern for one strip of a
//! fixed strip type (items per item type, nonzero only for items of the
//! strip's width). Both carry the arc set their canonical placement induces,
//! which is the vocabulary the arc-flow branching rows speak.

use std::collections::BTreeSet;

use crate::instance::Instance;
use crate::network::{self, Arc};

/// A stage-1 column: strips cut from one stock plate. Objective coefficient 1.
#[derive(Debug, Clone, PartialEq)]
pub struct YColumn {
    /// Strip count per strip type.
    pub pattern: Vec<u32>,
    /// Arcs of the canonical placement in the stage-1 network.
    pub arcs: BTreeSet<Arc>,
    /// Most recent LP value; meaningful only for the node that solved it.
    pub value: f64,
}

impl YColumn {
    /// Builds a column from a width-feasible pattern.
    pub fn new(instance: &Instance, pattern: Vec<u32>) -> YColumn {
        debug_assert_eq!(pattern.len(), instance.num_strips());
        debug_assert!(width_used(instance, &pattern) <= instance.stock_width);
        let arcs = network::pattern_arcs(&pattern, &instance.strip_widths());
        YColumn {
            pattern,
            arcs,
            value: 0.0,
        }
    }
}

/// A stage-2 column bound to one strip type. Objective coefficient 0.
#[derive(Debug, Clone, PartialEq)]
pub struct XColumn {
    /// The strip type this pattern cuts.
    pub strip: usize,
    /// Item count per item type; nonzero only for items of the strip's width.
    pub pattern: Vec<u32>,
    /// Arcs of the canonical placement in the strip's stage-2 network.
    pub arcs: BTreeSet<Arc>,
    /// Most recent LP value; meaningful only for the node that solved it.
    pub value: f64,
}

impl XColumn {
    /// Builds a column from a length-feasible pattern for `strip`.
    pub fn new(instance: &Instance, strip: usize, pattern: Vec<u32>) -> XColumn {
        debug_assert_eq!(pattern.len(), instance.num_items());
        debug_assert!(length_used(instance, &pattern) <= instance.stock_length);
        debug_assert!(pattern.iter().enumerate().all(|(i, &count)| {
            count == 0 || instance.items[i].width == instance.strips[strip].width
        }));
        let arcs = network::pattern_arcs(&pattern, &instance.item_lengths());
        XColumn {
            strip,
            pattern,
            arcs,
            value: 0.0,
        }
    }
}

/// Total width a stage-1 pattern consumes.
pub fn width_used(instance: &Instance, pattern: &[u32]) -> u32 {
    pattern
        .iter()
        .zip(&instance.strips)
        .map(|(count, strip)| count * strip.width)
        .sum()
}

/// Total length a stage-2 pattern consumes.
pub fn length_used(instance: &Instance, pattern: &[u32]) -> u32 {
    pattern
        .iter()
        .zip(&instance.items)
        .map(|(count, item)| count * item.length)
        .sum()
}

/// The append-only column pools of one branch-and-price node.
#[derive(Debug, Clone, Default)]
pub struct ColumnPool {
    /// Stage-1 columns.
    pub y: Vec<YColumn>,
    /// Stage-2 columns.
    pub x: Vec<XColumn>,
}

impl ColumnPool {
    /// Whether an identical stage-1 pattern is already pooled.
    pub fn contains_y(&self, pattern: &[u32]) -> bool {
        self.y.iter().any(|col| col.pattern == pattern)
    }

    /// Whether an identical stage-2 pattern for the same strip is pooled.
    pub fn contains_x(&self, strip: usize, pattern: &[u32]) -> bool {
        self.x
            .iter()
            .any(|col| col.strip == strip && col.pattern == pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::ItemType;
    use crate::network::Arc;

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

    #[test]
    fn y_column_arcs_follow_the_canonical_placement() {
        let instance = instance();
        // One strip of width 10, two strips of width 5.
        let col = YColumn::new(&instance, vec![1, 2]);
        let arcs: Vec<Arc> = col.arcs.iter().copied().collect();
        assert_eq!(arcs, vec![Arc::new(0, 10), Arc::new(10, 15), Arc::new(15, 20)]);
    }

    #[test]
    fn x_column_arcs_follow_the_canonical_placement() {
        let instance = instance();
        let col = XColumn::new(&instance, 0, vec![2, 0]);
        let arcs: Vec<Arc> = col.arcs.iter().copied().collect();
        assert_eq!(arcs, vec![Arc::new(0, 10), Arc::new(10, 20)]);
    }

    #[test]
    fn pool_detects_duplicates() {
        let instance = instance();
        let mut pool = ColumnPool::default();
        pool.y.push(YColumn::new(&instance, vec![2, 0]));
        pool.x.push(XColumn::new(&instance, 1, vec![0, 1]));

        assert!(pool.contains_y(&[2, 0]));
        assert!(!pool.contains_y(&[1, 2]));
        assert!(pool.contains_x(1, &[0, 1]));
        assert!(!pool.contains_x(0, &[0, 1]));
    }
}
