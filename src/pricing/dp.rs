//! Unbounded-knapsack pricing backend.
//!
//! Classic O(types × capacity) table over the discrete capacity axis. Types
//! with non-positive duals never help and are skipped. Like the knapsack
//! MIP, this backend knows nothing about arc constraints and is restricted
//! to unconstrained nodes.

use crate::colgen::Duals;
use crate::error::Result;
use crate::instance::Instance;
use crate::pricing::Candidate;

pub(super) fn price_sp1(instance: &Instance, duals: &Duals) -> Result<Option<Candidate>> {
    let sizes: Vec<u32> = instance.strip_widths();
    Ok(Some(solve(
        instance.stock_width,
        &sizes,
        &duals.strip,
        instance.num_strips(),
    )))
}

pub(super) fn price_sp2(
    instance: &Instance,
    strip: usize,
    duals: &Duals,
) -> Result<Option<Candidate>> {
    let width = instance.strips[strip].width;
    // Rewards for exact-width items only; every other item keeps reward 0
    // and can never enter the table.
    let mut rewards = vec![0.0; instance.num_items()];
    for &i in instance.items_of_width(width) {
        rewards[i] = duals.item[i];
    }
    let sizes = instance.item_lengths();
    Ok(Some(solve(
        instance.stock_length,
        &sizes,
        &rewards,
        instance.num_items(),
    )))
}

fn solve(capacity: u32, sizes: &[u32], rewards: &[f64], num_types: usize) -> Candidate {
    let capacity = capacity as usize;
    let mut value = vec![0.0f64; capacity + 1];
    let mut choice = vec![vec![0u32; num_types]; capacity + 1];

    for (t, &size) in sizes.iter().enumerate() {
        let size = size as usize;
        let reward = rewards[t];
        if reward <= 0.0 || size == 0 {
            continue;
        }
        for used in size..=capacity {
            if value[used - size] + reward > value[used] {
                value[used] = value[used - size] + reward;
                choice[used] = choice[used - size].clone();
                choice[used][t] += 1;
            }
        }
    }

    Candidate {
        pattern: choice[capacity].clone(),
        objective: value[capacity],
    }
}
