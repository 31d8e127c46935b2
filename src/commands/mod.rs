//! Subcommand implementations
//!
//! `apply` and `plan` share the same per-module loop: every module is
//! loaded into its own graph and processed independently, in the order
//! given on the command line.

pub mod apply;
pub mod plan;

use anyhow::{Context as AnyhowContext, Result};
use declarative::{ExecuteOptions, Graph};
use std::path::Path;

use crate::Context;
use crate::cli::RunArgs;
use crate::ui;

/// Load each module and hand its graph to `process`
///
/// `process` returns whether the module converged. A module error ends the
/// invocation unless `--keep-going` is set, in which case it is reported
/// and counted as a failure. Returns true when every module succeeded.
fn for_each_module<F>(ctx: &Context, args: &RunArgs, mut process: F) -> Result<bool>
where
    F: FnMut(&Path, &Graph, &ExecuteOptions) -> Result<bool>,
{
    let opts = ExecuteOptions {
        jobs: ctx.settings.jobs(args.jobs),
    };
    log::debug!("Running with {} jobs per level", opts.jobs);

    let mut all_ok = true;
    for module in &args.modules {
        if ctx.cancel.is_cancelled() {
            log::warn!("Cancelled, skipping {}", module.display());
            all_ok = false;
            break;
        }

        let outcome = crate::load::load(module, &args.params)
            .with_context(|| format!("{}: could not load module", module.display()))
            .and_then(|graph| process(module, &graph, &opts));

        match outcome {
            Ok(ok) => all_ok &= ok,
            Err(e) if args.keep_going => {
                ui::error(&format!("{:#}", e));
                all_ok = false;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(all_ok)
}
