//! JSON export of a finished run.
//!
//! The shape is fixed: `metadata` (provenance), `summary` (objective and
//! bound quality), `stock` (plate dimensions) and `plates` (the physical
//! plan with item coordinates).

use serde::Serialize;

use crate::instance::Instance;
use crate::solution::CuttingPlan;
use crate::solver::SolveOutcome;

/// Top-level JSON document.
#[derive(Debug, Serialize)]
pub struct Report {
    pub metadata: Metadata,
    pub summary: Summary,
    pub stock: Stock,
    pub plates: Vec<PlateReport>,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    pub instance_file: String,
    pub timestamp: String,
    pub solver: String,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub num_plates: u64,
    pub objective_value: f64,
    pub root_lb: f64,
    pub gap: f64,
    pub total_utilization: f64,
}

#[derive(Debug, Serialize)]
pub struct Stock {
    pub width: u32,
    pub length: u32,
}

#[derive(Debug, Serialize)]
pub struct PlateReport {
    pub plate_id: usize,
    pub utilization: f64,
    pub num_items: usize,
    pub items: Vec<ItemReport>,
}

#[derive(Debug, Serialize)]
pub struct ItemReport {
    pub item_type: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub length: u32,
}

/// Assembles the report for one solved instance.
pub fn build_report(
    instance: &Instance,
    instance_file: &str,
    outcome: &SolveOutcome,
    plan: &CuttingPlan,
) -> Report {
    Report {
        metadata: Metadata {
            instance_file: instance_file.to_string(),
            timestamp: chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
            solver: "cutstock2d".to_string(),
        },
        summary: Summary {
            num_plates: outcome.incumbent.plates(),
            objective_value: outcome.incumbent.objective,
            root_lb: outcome.stats.root_lower_bound,
            gap: outcome.stats.gap,
            total_utilization: plan.total_utilization,
        },
        stock: Stock {
            width: instance.stock_width,
            length: instance.stock_length,
        },
        plates: plan
            .plates
            .iter()
            .map(|plate| PlateReport {
                plate_id: plate.plate_id,
                utilization: plate.utilization,
                num_items: plate.items.len(),
                items: plate
                    .items
                    .iter()
                    .map(|item| ItemReport {
                        item_type: item.item_type,
                        x: item.x,
                        y: item.y,
                        width: item.width,
                        length: item.length,
                    })
                    .collect(),
            })
            .collect(),
    }
}
