//! Setaudit CLI - selection-set audit, curation and cleanup.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Audit {
            model,
            sets,
            config,
            output,
            json,
        } => commands::audit::run(model, sets, config, output, json, cli.verbose),

        Commands::Apply {
            model,
            plan,
            skip_ambiguous,
            reconcile,
            output,
        } => commands::apply::run(model, plan, skip_ambiguous, reconcile, output, cli.verbose),

        Commands::PlanDelete { model, config, json } => {
            commands::plan_delete::run(model, config, json, cli.verbose)
        }

        Commands::Cleanup {
            model,
            sets,
            config,
            out_dir,
            keep_warnings,
        } => commands::cleanup::run(model, sets, config, out_dir, keep_warnings, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "setaudit=debug" } else { "setaudit=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
