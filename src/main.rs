//! Command-line entry point.
//!
//! Loads a CSV instance, runs branch and price and writes the cutting plan
//! as JSON. Exit codes: 0 on normal termination (with or without proven
//! optimality), 2 on input errors, 3 on backend failures, 1 otherwise.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cutstock2d::{Error, SolverConfig, Solver, SpMethod, build_plan, io, report};

#[derive(Debug, Parser)]
#[command(
    name = "cutstock2d",
    about = "Branch-and-price solver for the two-stage guillotine 2D cutting-stock problem"
)]
struct Args {
    /// Instance file (CSV: comments with `#`, header lines, `W,L`, then
    /// `id,w,l,d` rows).
    instance: PathBuf,

    /// Stage-1 pricing backend.
    #[arg(long, value_enum, default_value_t = SpMethod::ArcFlow)]
    sp1_method: SpMethod,

    /// Stage-2 pricing backend.
    #[arg(long, value_enum, default_value_t = SpMethod::ArcFlow)]
    sp2_method: SpMethod,

    /// Wall-clock budget in seconds.
    #[arg(long)]
    time_limit_sec: Option<u64>,

    /// Cap on branch-and-price nodes.
    #[arg(long)]
    max_bp_nodes: Option<usize>,

    /// Write the JSON cutting plan here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            match err.downcast_ref::<Error>() {
                Some(Error::BadInstance(_)) => ExitCode::from(2),
                Some(_) => ExitCode::from(3),
                None => ExitCode::FAILURE,
            }
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let instance = io::load_instance(&args.instance)?;
    tracing::info!(
        stock = %format!("{}x{}", instance.stock_width, instance.stock_length),
        items = instance.num_items(),
        strips = instance.num_strips(),
        demand = instance.total_demand(),
        "loaded instance"
    );
    for item in &instance.items {
        tracing::debug!(
            id = item.id,
            size = %format!("{}x{}", item.width, item.length),
            demand = item.demand,
            "item type"
        );
    }

    let config = SolverConfig {
        sp1_method: args.sp1_method,
        sp2_method: args.sp2_method,
        time_limit: args.time_limit_sec.map(Duration::from_secs),
        max_bp_nodes: args.max_bp_nodes,
        ..SolverConfig::default()
    };

    let solver = Solver::new(instance, config);
    let outcome = solver.solve()?;
    let plan = build_plan(solver.instance(), &outcome.incumbent);
    let report = report::build_report(
        solver.instance(),
        &args.instance.display().to_string(),
        &outcome,
        &plan,
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &report)?;
            writer.write_all(b"\n")?;
            tracing::info!(output = %path.display(), "wrote cutting plan");
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &report)?;
            writer.write_all(b"\n")?;
        }
    }

    Ok(())
}
