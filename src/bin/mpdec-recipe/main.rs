//! mpdec-recipe CLI - builds and packages mpdecimal

use anyhow::Result;
use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

use mpdec_recipe::core::RecipeError;
use mpdec_recipe::util::Shell;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("mpdec_recipe=debug")
    } else if cli.quiet {
        EnvFilter::new("mpdec_recipe=error")
    } else {
        EnvFilter::new("mpdec_recipe=info")
    };

    // stdout is reserved for command output such as `plan` JSON
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == MessageFormat::Json,
    );

    if let Err(e) = run(cli.command, &shell) {
        let help = e
            .downcast_ref::<RecipeError>()
            .and_then(|err| err.help())
            .map(|help| help.to_string());

        if shell.is_json() {
            shell.error(format!("{:#}", e));
        } else {
            eprintln!("error: {:#}", e);
            if let Some(help) = help {
                eprintln!("help: {}", help);
            }
        }
        std::process::exit(1);
    }
}

fn run(command: Commands, shell: &Shell) -> Result<()> {
    match command {
        Commands::Run(args) => commands::run::execute(args, shell),
        Commands::Fetch(args) => commands::fetch::execute(args, shell),
        Commands::Patch(args) => commands::patch::execute(args, shell),
        Commands::Plan(args) => commands::plan::execute(args),
        Commands::PackageInfo(args) => commands::package_info::execute(args),
        Commands::Info => commands::info::execute(shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
