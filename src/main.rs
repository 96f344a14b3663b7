mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod progress;
mod resource;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
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
    };
    let manifest = cli.manifest.as_deref();

    match cli.command {
        Command::Validate => commands::validate::run(&ctx, manifest),
        Command::Render(args) => commands::render::run(
            &ctx,
            manifest,
            args.user.as_deref(),
            args.json,
            args.show_secrets,
        ),
        Command::Diff(args) => commands::diff::run(
            &ctx,
            manifest,
            args.conf.conf_dir.as_deref(),
            args.target.as_deref(),
        ),
        Command::Apply(args) => commands::apply::run(
            &ctx,
            &commands::apply::ApplyArgs {
                manifest,
                conf_dir: args.conf.conf_dir.as_deref(),
                target: args.target.as_deref(),
                dry_run: args.dry_run,
                yes: args.yes,
                jobs: args.jobs as usize,
            },
        ),
        Command::Status(args) => commands::status::run(&ctx, manifest, args.conf_dir.as_deref()),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "icinga-users", &mut io::stdout());
            Ok(())
        }
    }
}
