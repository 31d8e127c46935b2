//! Resource kinds that can appear in a module
//!
//! Each kind implements [`declarative::Task`]. Modules name the kind with
//! a `kind` key; the remaining keys are kind-specific.

pub mod command;
pub mod template;

pub use command::Command;
pub use template::Template;

use declarative::BoxedTask;
use serde::Deserialize;

use crate::load::LoadError;

/// A resource as written in a module file, before parameters are rendered
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceDef {
    /// File content
    Template {
        destination: String,
        content: String,
        #[serde(default)]
        mode: Option<String>,
    },
    /// Shell check/apply pair
    Command {
        check: String,
        apply: String,
        #[serde(default)]
        dir: Option<String>,
    },
}

impl ResourceDef {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Template { .. } => "template",
            Self::Command { .. } => "command",
        }
    }

    /// Render parameters into every string field and build the task
    pub fn build<F>(&self, render: F) -> Result<BoxedTask, LoadError>
    where
        F: Fn(&str) -> Result<String, LoadError>,
    {
        match self {
            Self::Template {
                destination,
                content,
                mode,
            } => {
                let destination = crate::paths::expand(&render(destination)?);
                let mut tmpl = Template::new(destination, render(content)?);
                if let Some(mode) = mode {
                    tmpl = tmpl.with_mode(parse_mode(&render(mode)?)?);
                }
                Ok(Box::new(tmpl))
            }
            Self::Command { check, apply, dir } => {
                let mut cmd = Command::new(render(check)?, render(apply)?);
                if let Some(dir) = dir {
                    cmd = cmd.in_dir(crate::paths::expand(&render(dir)?));
                }
                Ok(Box::new(cmd))
            }
        }
    }
}

/// Parse octal permission bits such as "0644", "644" or "0o644"
pub fn parse_mode(mode: &str) -> Result<u32, LoadError> {
    let trimmed = mode.trim();
    let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
    match u32::from_str_radix(digits, 8) {
        Ok(bits) if !digits.is_empty() && bits <= 0o7777 => Ok(bits),
        _ => Err(LoadError::InvalidMode {
            mode: mode.to_string(),
        }),
    }
}
