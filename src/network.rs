//! Position-indexed arc-flow networks.
//!
//! A network reformulates a one-dimensional loading problem on a capacity
//! `C` as paths in a line graph: nodes are positions `0..=C`, and an arc
//! `(s, s + size)` places one piece of that size at position `s`. A path from
//! the source `0` to the sink `C` is a feasible loading (trailing waste is an
//! arc into the sink only when some piece ends exactly at `C`; paths may also
//! end early, which the pricing models allow by treating every piece-end at
//! `C` — see the sink arc list).
//!
//! The same construction serves stage 1 (capacity = stock width, arc sizes =
//! strip widths) and stage 2 (capacity = stock length, one network per strip
//! type, arc sizes = lengths of the items narrow enough for the strip). Arcs
//! of equal size collapse: an arc is identified by its endpoints only.

use std::collections::{BTreeMap, BTreeSet};

use crate::instance::Instance;

/// An arc `(start, end)` with `0 <= start < end <= capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Arc {
    /// Position where the piece begins.
    pub start: u32,
    /// Position where the piece ends.
    pub end: u32,
}

impl Arc {
    /// Creates an arc. `end` must be strictly greater than `start`.
    pub fn new(start: u32, end: u32) -> Arc {
        debug_assert!(start < end);
        Arc { start, end }
    }

    /// The piece size this arc places.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }
}

/// A full-position arc-flow network over one capacity axis.
#[derive(Debug, Clone)]
pub struct Network {
    /// Axis capacity; also the sink node.
    pub capacity: u32,
    /// All arcs, in construction order.
    pub arcs: Vec<Arc>,
    index: BTreeMap<Arc, usize>,
    /// Indices of arcs leaving the source node 0.
    pub source_out: Vec<usize>,
    /// Indices of arcs entering the sink node `capacity`.
    pub sink_in: Vec<usize>,
    /// Interior node positions, ascending.
    pub mid_nodes: Vec<u32>,
    /// Per interior node, indices of incoming arcs.
    pub mid_in: Vec<Vec<usize>>,
    /// Per interior node, indices of outgoing arcs.
    pub mid_out: Vec<Vec<usize>>,
}

impl Network {
    /// Enumerates every arc `(s, s + size)` for all start positions and all
    /// usable sizes, then classifies nodes and precomputes the in/out arc
    /// lists used by the flow-conservation rows.
    pub fn build(capacity: u32, sizes: &[u32]) -> Network {
        let mut arcs = Vec::new();
        let mut index = BTreeMap::new();
        let mut nodes = BTreeSet::new();
        nodes.insert(0);
        nodes.insert(capacity);

        for start in 0..=capacity {
            for &size in sizes {
                if size == 0 {
                    continue;
                }
                let end = start + size;
                if end > capacity {
                    continue;
                }
                let arc = Arc::new(start, end);
                if !index.contains_key(&arc) {
                    index.insert(arc, arcs.len());
                    arcs.push(arc);
                    nodes.insert(start);
                    nodes.insert(end);
                }
            }
        }

        let mid_nodes: Vec<u32> = nodes
            .iter()
            .copied()
            .filter(|&node| node != 0 && node != capacity)
            .collect();

        let mut source_out = Vec::new();
        let mut sink_in = Vec::new();
        let mut mid_in = vec![Vec::new(); mid_nodes.len()];
        let mut mid_out = vec![Vec::new(); mid_nodes.len()];
        let mid_index: BTreeMap<u32, usize> = mid_nodes
            .iter()
            .enumerate()
            .map(|(i, &node)| (node, i))
            .collect();

        for (idx, arc) in arcs.iter().enumerate() {
            if arc.start == 0 {
                source_out.push(idx);
            }
            if arc.end == capacity {
                sink_in.push(idx);
            }
            if let Some(&i) = mid_index.get(&arc.end) {
                mid_in[i].push(idx);
            }
            if let Some(&i) = mid_index.get(&arc.start) {
                mid_out[i].push(idx);
            }
        }

        Network {
            capacity,
            arcs,
            index,
            source_out,
            sink_in,
            mid_nodes,
            mid_in,
            mid_out,
        }
    }

    /// Index of an arc in this network, if present.
    pub fn arc_index(&self, arc: Arc) -> Option<usize> {
        self.index.get(&arc).copied()
    }

    /// Whether the arc belongs to this network.
    pub fn contains(&self, arc: Arc) -> bool {
        self.index.contains_key(&arc)
    }
}

/// The stage-1 network plus one stage-2 network per strip type.
#[derive(Debug, Clone)]
pub struct Networks {
    /// Width-direction network over the stock width.
    pub sp1: Network,
    /// Length-direction networks, indexed by strip type.
    pub sp2: Vec<Network>,
}

impl Networks {
    /// Builds all networks for an instance. The stage-2 network of a strip
    /// admits arcs for every item no wider than the strip; the exact-width
    /// placement rule is enforced later, by pricing rewards and pattern
    /// decoding, not by the arc vocabulary.
    pub fn build(instance: &Instance) -> Networks {
        let sp1 = Network::build(instance.stock_width, &instance.strip_widths());

        let sp2 = instance
            .strips
            .iter()
            .map(|strip| {
                let sizes: Vec<u32> = instance
                    .items
                    .iter()
                    .filter(|item| item.width <= strip.width)
                    .map(|item| item.length)
                    .collect();
                Network::build(instance.stock_length, &sizes)
            })
            .collect();

        Networks { sp1, sp2 }
    }
}

/// Converts a pattern (count per type) into the arc set induced by placing
/// the pieces in type-index order from position 0. This ordering is the
/// canonical placement; every column stores the arc set it produces.
pub fn pattern_arcs(pattern: &[u32], sizes: &[u32]) -> BTreeSet<Arc> {
    debug_assert_eq!(pattern.len(), sizes.len());
    let mut arcs = BTreeSet::new();
    let mut pos = 0;
    for (count, &size) in pattern.iter().zip(sizes) {
        for _ in 0..*count {
            let end = pos + size;
            arcs.insert(Arc::new(pos, end));
            pos = end;
        }
    }
    arcs
}

/// Recovers the pattern from an arc set by decoding each arc length back to
/// its type. Inverse of [`pattern_arcs`] under the canonical placement.
pub fn arcs_to_pattern(
    arcs: &BTreeSet<Arc>,
    sizes: &[u32],
    type_of_size: impl Fn(u32) -> Option<usize>,
) -> Vec<u32> {
    let mut pattern = vec![0u32; sizes.len()];
    for arc in arcs {
        if let Some(idx) = type_of_size(arc.len()) {
            pattern[idx] += 1;
        }
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::ItemType;

    #[test]
    fn builds_the_full_position_network() {
        // Capacity 4, sizes {2, 3}: arcs (0,2) (1,3) (2,4) (0,3) (1,4).
        let network = Network::build(4, &[2, 3]);
        assert_eq!(network.arcs.len(), 5);
        assert_eq!(network.mid_nodes, vec![1, 2, 3]);
        assert_eq!(network.source_out.len(), 2);
        assert_eq!(network.sink_in.len(), 2);

        // Node 2: in (0,2), out (2,4).
        let i = network.mid_nodes.iter().position(|&n| n == 2).unwrap();
        assert_eq!(network.mid_in[i].len(), 1);
        assert_eq!(network.mid_out[i].len(), 1);
        assert_eq!(network.arcs[network.mid_in[i][0]], Arc::new(0, 2));
        assert_eq!(network.arcs[network.mid_out[i][0]], Arc::new(2, 4));
    }

    #[test]
    fn duplicate_sizes_collapse_into_one_arc() {
        let a = Network::build(6, &[3, 3]);
        let b = Network::build(6, &[3]);
        assert_eq!(a.arcs.len(), b.arcs.len());
    }

    #[test]
    fn sp2_networks_admit_narrower_items() {
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

        // Strip 0 (width 10) takes both item lengths, strip 1 (width 5) only
        // the narrow item's.
        assert!(networks.sp2[0].contains(Arc::new(0, 10)));
        assert!(networks.sp2[0].contains(Arc::new(0, 20)));
        assert!(networks.sp2[1].contains(Arc::new(0, 20)));
        assert!(!networks.sp2[1].contains(Arc::new(0, 10)));
    }

    #[test]
    fn pattern_round_trips_through_its_arc_set() {
        let sizes = vec![7, 5, 3];
        let pattern = vec![1, 2, 0];
        let arcs = pattern_arcs(&pattern, &sizes);
        assert_eq!(
            arcs.iter().copied().collect::<Vec<_>>(),
            vec![Arc::new(0, 7), Arc::new(7, 12), Arc::new(12, 17)]
        );

        let type_of = |size: u32| sizes.iter().position(|&s| s == size);
        assert_eq!(arcs_to_pattern(&arcs, &sizes, type_of), pattern);
    }

    #[test]
    fn repeated_pieces_produce_distinct_arcs() {
        let arcs = pattern_arcs(&[3], &[5]);
        assert_eq!(arcs.len(), 3);
    }
}
