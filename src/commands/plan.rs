//! `converge plan` - report what apply would change

use anyhow::{Context as AnyhowContext, Result};
use declarative::{DiffEntry, Plan};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::cli::RunArgs;
use crate::ui;

/// One module's plan as emitted by `plan --json`
#[derive(Serialize)]
struct ModulePlan {
    module: PathBuf,
    checks: usize,
    changes: usize,
    errors: usize,
    entries: Vec<DiffEntry>,
}

impl ModulePlan {
    fn new(module: &Path, plan: Plan) -> Self {
        Self {
            module: module.to_path_buf(),
            checks: plan.len(),
            changes: plan.changes(),
            errors: plan.errors(),
            entries: plan.into_iter().collect(),
        }
    }
}

/// Plan every module; returns true when every check succeeded
///
/// With `json`, a single array holding one object per module is printed
/// once every module has been planned.
pub fn run(ctx: &Context, args: &RunArgs, json: bool) -> Result<bool> {
    let mut documents = Vec::new();

    let ok = super::for_each_module(ctx, args, |path, graph, opts| {
        log::info!("Planning {}", path.display());
        let plan = declarative::plan(graph, &ctx.cancel, opts)
            .with_context(|| format!("{}: planning failed", path.display()))?;
        let ok = plan.errors() == 0;

        if json {
            documents.push(ModulePlan::new(path, plan));
        } else {
            for entry in plan.entries() {
                println!("{}", ui::plan_entry(entry, ctx.color));
            }
            println!();
            println!("{}", ui::plan_summary(&plan, ctx.color));
        }

        Ok(ok)
    })?;

    if json {
        println!("{}", to_json(&documents)?);
    }
    Ok(ok)
}

fn to_json(documents: &[ModulePlan]) -> Result<String> {
    serde_json::to_string_pretty(documents).context("Failed to serialize plan")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use declarative::{CancelToken, ExecuteOptions};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_plan_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("module.toml");
        let target = dir.path().join("out.txt");
        fs::write(
            &path,
            format!(
                r#"
                [[task]]
                id = "out"
                kind = "template"
                destination = "{}"
                content = "x"

                [[task]]
                id = "ok"
                kind = "command"
                check = "echo fine"
                apply = "true"
                "#,
                target.display()
            ),
        )
        .unwrap();

        let graph = crate::load::load(&path, &[]).unwrap();
        let plan =
            declarative::plan(&graph, &CancelToken::new(), &ExecuteOptions::default()).unwrap();

        let other = dir.path().join("other.toml");
        let documents = vec![
            ModulePlan::new(&path, plan),
            ModulePlan::new(&other, declarative::Plan::default()),
        ];

        let parsed: serde_json::Value = serde_json::from_str(&to_json(&documents).unwrap()).unwrap();
        let modules = parsed.as_array().unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[1]["checks"], 0);

        let value = &modules[0];
        assert_eq!(value["module"], path.display().to_string());
        assert_eq!(value["checks"], 2);
        assert_eq!(value["changes"], 1);
        assert_eq!(value["errors"], 0);
        assert_eq!(value["entries"][0]["id"], "out");
        assert_eq!(value["entries"][0]["will_change"], true);
        assert_eq!(value["entries"][1]["current"], "fine");
        assert!(!target.exists());
    }

    #[test]
    fn test_plan_summary_counts_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("module.toml");
        fs::write(
            &path,
            format!(
                r#"
                [[task]]
                id = "dir"
                kind = "template"
                destination = "{}"
                content = "x"
                "#,
                dir.path().display()
            ),
        )
        .unwrap();

        let graph = crate::load::load(&path, &[]).unwrap();
        let plan =
            declarative::plan(&graph, &CancelToken::new(), &ExecuteOptions::default()).unwrap();

        assert_eq!(
            ui::plan_summary(&plan, false),
            "Plan complete. 1 checks, 1 will change, 1 errors"
        );
    }
}
