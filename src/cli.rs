use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "converge")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Converge a machine to the state described by resource modules", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply what needs to change in the system
    ///
    /// Application is where the actual work of making the execution graph
    /// real happens: every module is checked, then only the resources that
    /// differ are changed.
    Apply(RunArgs),

    /// Show what apply would change, without changing anything
    Plan {
        #[command(flatten)]
        run: RunArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// Module files to process, in order
    #[arg(required = true, value_name = "MODULE")]
    pub modules: Vec<PathBuf>,

    /// Module parameter as name=value (repeatable)
    #[arg(short, long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Number of resources to run in parallel within a level
    #[arg(short, long, env = "CONVERGE_JOBS")]
    pub jobs: Option<usize>,

    /// Report a failing module and continue with the next one
    #[arg(long)]
    pub keep_going: bool,
}

/// Parse a `name=value` parameter
fn parse_param(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{}'", s));
    }
    Ok((name.to_string(), value.to_string()))
}
