//! `converge apply` - check every resource, then change what differs

use anyhow::{Context as AnyhowContext, Result};
use declarative::{ExecuteOptions, Graph, NodeResult, RunSummary};
use std::path::Path;

use crate::Context;
use crate::cli::RunArgs;
use crate::progress::ApplyProgress;
use crate::ui;

/// Apply every module; returns true when nothing failed
pub fn run(ctx: &Context, args: &RunArgs) -> Result<bool> {
    super::for_each_module(ctx, args, |path, graph, opts| {
        let summary = apply_module(ctx, path, graph, opts)?;
        Ok(summary.is_success())
    })
}

fn apply_module(
    ctx: &Context,
    path: &Path,
    graph: &Graph,
    opts: &ExecuteOptions,
) -> Result<RunSummary> {
    log::info!("Applying {}", path.display());

    let results = execute(ctx, graph, opts)
        .with_context(|| format!("{}: applying failed", path.display()))?;

    for result in &results {
        println!("{}", ui::result(result, ctx.color));
    }

    let summary = RunSummary::from_results(&results);
    println!();
    println!("{}", ui::apply_summary(&summary, ctx.color));
    if summary.cancelled > 0 {
        ui::warn(&format!(
            "{} resources were cancelled before they could converge",
            summary.cancelled
        ));
    }

    Ok(summary)
}

fn execute(ctx: &Context, graph: &Graph, opts: &ExecuteOptions) -> Result<Vec<NodeResult>> {
    let plan = declarative::plan(graph, &ctx.cancel, opts).context("planning failed")?;
    log::debug!(
        "Plan: {} of {} resources will change",
        plan.changes(),
        plan.len()
    );

    let mut progress = ApplyProgress::new(graph.len(), ctx.show_progress());
    let results = declarative::apply_with_progress(graph, &plan, &ctx.cancel, opts, &mut progress);
    progress.finish();
    Ok(results?)
}
