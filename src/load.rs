//! Module loading - turns a module file into a validated graph
//!
//! A module is a TOML file:
//!
//! ```toml
//! [params]
//! greeting = "hello"
//!
//! [[task]]
//! id = "motd"
//! kind = "template"
//! destination = "/etc/motd"
//! content = '{{ param "greeting" }} from converge'
//!
//! [[task]]
//! id = "reload"
//! kind = "command"
//! depends = ["motd"]
//! check = "test -f /run/motd.stamp"
//! apply = "touch /run/motd.stamp"
//! ```
//!
//! `[params]` holds defaults; invocation parameters override them.

use declarative::{Graph, GraphBuilder, GraphError};
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

use crate::resource::ResourceDef;

static PARAM_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*param\s+"([^"]+)"\s*\}\}"#).expect("param reference pattern is valid")
});

/// Errors that prevent a module from becoming a graph
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown parameter {name:?}")]
    UnknownParam { name: String },

    #[error("invalid mode {mode:?}, expected octal permission bits")]
    InvalidMode { mode: String },

    #[error("task {id}: {source}")]
    Task {
        id: String,
        #[source]
        source: Box<LoadError>,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleFile {
    #[serde(default)]
    params: BTreeMap<String, String>,

    #[serde(default, rename = "task")]
    tasks: Vec<TaskDef>,
}

#[derive(Debug, Deserialize)]
struct TaskDef {
    id: String,
    #[serde(default)]
    depends: Vec<String>,
    #[serde(flatten)]
    resource: ResourceDef,
}

/// Load the module at `path` into a graph
pub fn load(path: &Path, params: &[(String, String)]) -> Result<Graph, LoadError> {
    let source = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&source, path, params)
}

/// Parse module source; `path` is only used in error messages
pub fn parse(source: &str, path: &Path, params: &[(String, String)]) -> Result<Graph, LoadError> {
    let module: ModuleFile = toml::from_str(source).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut values = module.params;
    for (name, value) in params {
        values.insert(name.clone(), value.clone());
    }

    let substitute = |text: &str| render(text, &values);

    let mut builder = GraphBuilder::new();
    for task in &module.tasks {
        let built = task
            .resource
            .build(substitute)
            .map_err(|e| LoadError::Task {
                id: task.id.clone(),
                source: Box::new(e),
            })?;
        log::trace!("Loaded {} task {}", task.resource.kind(), task.id);
        builder.add(task.id.clone(), built, task.depends.iter().cloned());
    }

    log::debug!("Loaded {} tasks from {}", builder.len(), path.display());
    Ok(builder.build()?)
}

/// Substitute every `{{ param "name" }}` in `text`
pub fn render(text: &str, params: &BTreeMap<String, String>) -> Result<String, LoadError> {
    let mut missing = None;
    let rendered = PARAM_REF.replace_all(text, |caps: &Captures| {
        let name = &caps[1];
        match params.get(name) {
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(LoadError::UnknownParam { name }),
        None => Ok(rendered.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{CancelToken, ExecuteOptions, RunSummary};
    use tempfile::TempDir;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_params() {
        let mut values = BTreeMap::new();
        values.insert("name".to_string(), "world".to_string());

        assert_eq!(
            render(r#"hello {{ param "name" }}, {{param "name"}}!"#, &values).unwrap(),
            "hello world, world!"
        );
        assert_eq!(render("no refs {{ here }}", &values).unwrap(), "no refs {{ here }}");
        assert!(matches!(
            render(r#"{{ param "missing" }}"#, &values),
            Err(LoadError::UnknownParam { name }) if name == "missing"
        ));
    }

    #[test]
    fn test_parse_builds_levels() {
        let source = r#"
            [[task]]
            id = "config"
            kind = "template"
            depends = ["dir"]
            destination = "/tmp/app/config"
            content = "x"

            [[task]]
            id = "dir"
            kind = "command"
            check = "test -d /tmp/app"
            apply = "mkdir -p /tmp/app"
        "#;

        let graph = parse(source, Path::new("module.toml"), &[]).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.level_of("dir"), Some(0));
        assert_eq!(graph.level_of("config"), Some(1));
    }

    #[test]
    fn test_parse_rejects_cycles() {
        let source = r#"
            [[task]]
            id = "a"
            kind = "command"
            depends = ["b"]
            check = "true"
            apply = "true"

            [[task]]
            id = "b"
            kind = "command"
            depends = ["a"]
            check = "true"
            apply = "true"
        "#;

        let err = parse(source, Path::new("module.toml"), &[]).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Graph(GraphError::CyclicDependency { ref nodes }) if nodes == &["a", "b"]
        ));
    }

    #[test]
    fn test_parse_reports_task_errors() {
        let source = r#"
            [[task]]
            id = "motd"
            kind = "template"
            destination = "/etc/motd"
            content = '{{ param "who" }}'
            mode = "rwx"
        "#;

        let err = parse(source, Path::new("module.toml"), &params(&[("who", "me")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "task motd: invalid mode \"rwx\", expected octal permission bits"
        );

        let err = parse(source, Path::new("module.toml"), &[]).unwrap_err();
        assert_eq!(err.to_string(), "task motd: unknown parameter \"who\"");
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = parse("[[task]]\nid = 3\n", Path::new("broken.toml"), &[]).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().starts_with("could not parse broken.toml"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("absent.toml"), &[]).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[test]
    fn test_loaded_module_converges() {
        let dir = TempDir::new().unwrap();
        let module = dir.path().join("module.toml");
        let target = dir.path().join("greeting.txt");
        fs::write(
            &module,
            format!(
                r#"
                [params]
                name = "default"

                [[task]]
                id = "greeting"
                kind = "template"
                destination = "{}"
                content = 'hello {{{{ param "name" }}}}'
                "#,
                target.display()
            ),
        )
        .unwrap();

        let graph = load(&module, &params(&[("name", "world")])).unwrap();
        let cancel = CancelToken::new();
        let opts = ExecuteOptions::default();

        let plan = declarative::plan(&graph, &cancel, &opts).unwrap();
        assert_eq!(plan.changes(), 1);

        let results = declarative::apply(&graph, &plan, &cancel, &opts).unwrap();
        assert!(RunSummary::from_results(&results).is_success());
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello world");

        let again = declarative::plan(&graph, &cancel, &opts).unwrap();
        assert!(again.is_converged());
    }
}
