use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A demanded rectangular item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemType {
    /// Identifier from the input file. Not interpreted by the solver.
    pub id: u32,
    /// Extent along the stage-1 (width) axis.
    pub width: u32,
    /// Extent along the stage-2 (length) axis.
    pub length: u32,
    /// Number of copies that must be produced.
    pub demand: u32,
}

/// A stage-1 strip type: one per distinct item width, full stock length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripType {
    /// Strip width; equals the width of the items it can carry.
    pub width: u32,
    /// Strip length; always the stock length.
    pub length: u32,
}

/// A validated problem instance with its index maps.
///
/// Strip types are the distinct item widths in descending order. Items are
/// placeable in a strip iff their width equals the strip width, so
/// `strip_of_item` is total. Item lengths must be pairwise distinct because
/// the length of an arc is the only key available when decoding a stage-2
/// network path back into items.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Stock plate width (stage-1 capacity).
    pub stock_width: u32,
    /// Stock plate length (stage-2 capacity).
    pub stock_length: u32,
    /// Item types in input order.
    pub items: Vec<ItemType>,
    /// Strip types in descending width order.
    pub strips: Vec<StripType>,
    width_to_strip: BTreeMap<u32, usize>,
    length_to_item: BTreeMap<u32, usize>,
    width_to_items: BTreeMap<u32, Vec<usize>>,
}

impl Instance {
    /// Validates the raw data and derives strip types and index maps.
    pub fn new(stock_width: u32, stock_length: u32, items: Vec<ItemType>) -> Result<Instance> {
        if stock_width == 0 || stock_length == 0 {
            return Err(Error::BadInstance(format!(
                "stock plate must have positive dimensions, got {stock_width}x{stock_length}"
            )));
        }
        if items.is_empty() {
            return Err(Error::BadInstance("no item types given".into()));
        }

        let mut length_to_item: BTreeMap<u32, usize> = BTreeMap::new();
        for (idx, item) in items.iter().enumerate() {
            if item.width == 0 || item.length == 0 {
                return Err(Error::BadInstance(format!(
                    "item {} has a zero dimension ({}x{})",
                    item.id, item.width, item.length
                )));
            }
            if item.width > stock_width || item.length > stock_length {
                return Err(Error::BadInstance(format!(
                    "item {} ({}x{}) does not fit the {stock_width}x{stock_length} stock plate",
                    item.id, item.width, item.length
                )));
            }
            if let Some(&other) = length_to_item.get(&item.length) {
                return Err(Error::BadInstance(format!(
                    "items {} and {} share length {}; lengths must be distinct",
                    items[other].id, item.id, item.length
                )));
            }
            length_to_item.insert(item.length, idx);
        }

        let mut widths: Vec<u32> = items.iter().map(|item| item.width).collect();
        widths.sort_unstable_by(|a, b| b.cmp(a));
        widths.dedup();

        let strips: Vec<StripType> = widths
            .iter()
            .map(|&width| StripType {
                width,
                length: stock_length,
            })
            .collect();

        let width_to_strip: BTreeMap<u32, usize> = widths
            .iter()
            .enumerate()
            .map(|(j, &width)| (width, j))
            .collect();

        let mut width_to_items: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (idx, item) in items.iter().enumerate() {
            width_to_items.entry(item.width).or_default().push(idx);
        }

        Ok(Instance {
            stock_width,
            stock_length,
            items,
            strips,
            width_to_strip,
            length_to_item,
            width_to_items,
        })
    }

    /// Number of item types.
    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    /// Number of strip types.
    pub fn num_strips(&self) -> usize {
        self.strips.len()
    }

    /// Strip-type index for a width, if that width occurs in the instance.
    pub fn strip_index(&self, width: u32) -> Option<usize> {
        self.width_to_strip.get(&width).copied()
    }

    /// Item-type index for a length, if that length occurs in the instance.
    pub fn item_by_length(&self, length: u32) -> Option<usize> {
        self.length_to_item.get(&length).copied()
    }

    /// The strip type an item is cut from (its exact-width match).
    pub fn strip_of_item(&self, item: usize) -> usize {
        self.width_to_strip[&self.items[item].width]
    }

    /// Item-type indices sharing a width.
    pub fn items_of_width(&self, width: u32) -> &[usize] {
        self.width_to_items
            .get(&width)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Strip widths in strip-type index order (descending).
    pub fn strip_widths(&self) -> Vec<u32> {
        self.strips.iter().map(|strip| strip.width).collect()
    }

    /// Item lengths in item-type index order.
    pub fn item_lengths(&self) -> Vec<u32> {
        self.items.iter().map(|item| item.length).collect()
    }

    /// Sum of all demands.
    pub fn total_demand(&self) -> u64 {
        self.items.iter().map(|item| item.demand as u64).sum()
    }

    /// Total demanded item area, used for utilization reporting.
    pub fn demand_area(&self) -> u64 {
        self.items
            .iter()
            .map(|item| item.width as u64 * item.length as u64 * item.demand as u64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u32, width: u32, length: u32, demand: u32) -> ItemType {
        ItemType {
            id,
            width,
            length,
            demand,
        }
    }

    #[test]
    fn strips_are_distinct_widths_descending() {
        let instance = Instance::new(
            20,
            20,
            vec![item(0, 10, 10, 4), item(1, 5, 20, 2), item(2, 10, 7, 1)],
        )
        .unwrap();

        assert_eq!(instance.strip_widths(), vec![10, 5]);
        assert_eq!(instance.strip_index(10), Some(0));
        assert_eq!(instance.strip_index(5), Some(1));
        assert_eq!(instance.strip_index(7), None);
        assert_eq!(instance.strip_of_item(0), 0);
        assert_eq!(instance.strip_of_item(1), 1);
        assert_eq!(instance.items_of_width(10), &[0, 2]);
        assert_eq!(instance.strips[1].length, 20);
    }

    #[test]
    fn length_map_is_exact() {
        let instance = Instance::new(10, 10, vec![item(0, 5, 7, 1), item(1, 5, 3, 1)]).unwrap();
        assert_eq!(instance.item_by_length(7), Some(0));
        assert_eq!(instance.item_by_length(3), Some(1));
        assert_eq!(instance.item_by_length(4), None);
    }

    #[test]
    fn oversized_item_is_rejected() {
        let err = Instance::new(10, 10, vec![item(0, 11, 5, 1)]).unwrap_err();
        assert!(matches!(err, Error::BadInstance(_)));

        let err = Instance::new(10, 10, vec![item(0, 5, 11, 1)]).unwrap_err();
        assert!(matches!(err, Error::BadInstance(_)));
    }

    #[test]
    fn duplicate_lengths_are_refused() {
        let err = Instance::new(10, 10, vec![item(0, 5, 5, 1), item(1, 10, 5, 1)]).unwrap_err();
        assert!(matches!(err, Error::BadInstance(_)));
    }

    #[test]
    fn zero_demand_is_allowed() {
        let instance = Instance::new(10, 10, vec![item(0, 5, 5, 0)]).unwrap();
        assert_eq!(instance.total_demand(), 0);
    }

    #[test]
    fn empty_instance_is_rejected() {
        assert!(Instance::new(10, 10, Vec::new()).is_err());
        assert!(Instance::new(0, 10, vec![item(0, 1, 1, 1)]).is_err());
    }
}
