//! Diagonal initial basis.
//!
//! One Y-column per strip type cutting a single strip, and one X-column per
//! item type cutting a single item on its width-matching strip. Any demand
//! vector can then be met by scaling these columns, so the first restricted
//! master LP is feasible and the initial upper bound is finite.

use crate::column::{ColumnPool, XColumn, YColumn};
use crate::instance::Instance;

/// Seeds the root node's column pool.
pub fn initial_basis(instance: &Instance) -> ColumnPool {
    let mut pool = ColumnPool::default();

    for j in 0..instance.num_strips() {
        let mut pattern = vec![0u32; instance.num_strips()];
        pattern[j] = 1;
        pool.y.push(YColumn::new(instance, pattern));
    }

    for i in 0..instance.num_items() {
        let mut pattern = vec![0u32; instance.num_items()];
        pattern[i] = 1;
        let strip = instance.strip_of_item(i);
        pool.x.push(XColumn::new(instance, strip, pattern));
    }

    tracing::debug!(
        y_columns = pool.y.len(),
        x_columns = pool.x.len(),
        "seeded diagonal initial basis"
    );
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::ItemType;

    #[test]
    fn basis_is_diagonal() {
        let instance = Instance::new(
            20,
            20,
            vec![
                ItemType { id: 0, width: 10, length: 10, demand: 4 },
                ItemType { id: 1, width: 5, length: 20, demand: 2 },
            ],
        )
        .unwrap();
        let pool = initial_basis(&instance);

        assert_eq!(pool.y.len(), 2);
        assert_eq!(pool.y[0].pattern, vec![1, 0]);
        assert_eq!(pool.y[1].pattern, vec![0, 1]);

        assert_eq!(pool.x.len(), 2);
        assert_eq!(pool.x[0].pattern, vec![1, 0]);
        assert_eq!(pool.x[0].strip, 0);
        assert_eq!(pool.x[1].pattern, vec![0, 1]);
        assert_eq!(pool.x[1].strip, 1);
    }
}
