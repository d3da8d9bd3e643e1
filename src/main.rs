mod cli;
mod commands;
mod config;
mod paths;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, GroupCommand, VmCommand};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: Option<PathBuf>,
    pub project: Option<String>,
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
        config: cli.config,
        project: cli.project,
    };
    log::debug!("verbosity {}", ctx.verbose);

    let Some(command) = cli.command else {
        return run_default(&ctx);
    };

    match command {
        Command::Group(cmd) => {
            let config = commands::load_config(&ctx)?;
            match cmd {
                GroupCommand::Create => commands::group::create(&config),
                GroupCommand::Delete(args) => commands::group::delete(&config, args),
            }
        }
        Command::Vm(cmd) => {
            let config = commands::load_config(&ctx)?;
            match cmd {
                VmCommand::Create(output) => commands::vm::create(&ctx, &config, output),
                VmCommand::Delete { confirm, output } => {
                    commands::vm::delete(&ctx, &config, confirm, output)
                }
                VmCommand::Stop => commands::vm::stop(&config),
                VmCommand::Deallocate(args) => commands::vm::deallocate(&config, args),
                VmCommand::Plan(output) => commands::vm::plan(&config, output),
            }
        }
        Command::Menu => commands::menu::run(&ctx),
        Command::Projects => commands::projects::list(),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "azprov", &mut io::stdout());
            Ok(())
        }
    }
}

/// No subcommand: open the menu if the project asks for it, else show usage
fn run_default(ctx: &Context) -> Result<()> {
    let interactive = match commands::load_config(ctx) {
        Ok(config) => config.interactive,
        Err(e) => {
            log::debug!("No usable config: {e:#}");
            false
        }
    };

    if interactive {
        return commands::menu::run(ctx);
    }

    Cli::command().print_help()?;
    println!();
    Ok(())
}
