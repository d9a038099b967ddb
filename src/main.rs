mod app;
mod checks;
mod cli;
mod commands;
mod config;
mod deploy;
mod progress;
mod runner;
mod ssh;
mod ui;
mod workflow;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub settings_path: Option<PathBuf>,
    pub ha_dir: Option<String>,
}

fn main() -> Result<()> {
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

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        settings_path: cli.settings,
        ha_dir: cli.ha_dir,
    };
    log::trace!("verbosity {}", ctx.verbose);

    match cli.command {
        Command::Verify(args) => commands::verify::run(&ctx, args),
        Command::Node(cmd) => commands::node::run(&ctx, cmd),
        Command::Show(args) => commands::show::run(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "nodeops", &mut io::stdout());
            Ok(())
        }
    }
}
