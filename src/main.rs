mod cli;
mod commands;
mod config;
mod load;
mod paths;
mod progress;
mod resource;
mod runner;
mod signal;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Settings;
use declarative::CancelToken;
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    /// Whether output is decorated with color
    pub color: bool,
    pub settings: Settings,
    /// Cancelled by SIGINT/SIGTERM
    pub cancel: CancelToken,
}

impl Context {
    /// Progress bars only make sense on an interactive stderr
    pub fn show_progress(&self) -> bool {
        !self.quiet && console::Term::stderr().is_term()
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            ui::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "converge", &mut io::stdout());
        return Ok(true);
    }

    let settings = Settings::load()?;
    let color = settings.use_color(cli.no_color);
    colored::control::set_override(color);

    let cancel = CancelToken::new();
    signal::install(&cancel);

    let ctx = Context {
        quiet: cli.quiet,
        color,
        settings,
        cancel,
    };

    match cli.command {
        Command::Apply(args) => commands::apply::run(&ctx, &args),
        Command::Plan { run, json } => commands::plan::run(&ctx, &run, json),
        Command::Completions { .. } => Ok(true),
    }
}
