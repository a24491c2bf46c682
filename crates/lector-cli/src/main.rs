//! CLI entry point.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use lector_cli::{Cli, Commands, handlers};
use lector_core::{ReaderSettings, ResolvedPaths};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let data_dir = cli.data_dir.as_deref();
    let library_dir = cli.library_dir.as_deref();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Serve {
            port,
            tts_command,
            dry_run,
        } => {
            let paths = ResolvedPaths::resolve_with(data_dir, library_dir)
                .context("Failed to resolve data paths")?;
            handlers::serve::execute(paths, port, tts_command.as_deref(), dry_run).await?;
        }
        Commands::Status { session_id, chunks } => {
            let paths = ResolvedPaths::resolve_with(data_dir, library_dir)
                .context("Failed to resolve data paths")?;
            let settings = ReaderSettings::from_env().context("Invalid reader settings")?;
            handlers::status::execute(&paths, &settings, &session_id, chunks)?;
        }
        Commands::Paths => handlers::paths::execute(data_dir, library_dir)?,
    }

    Ok(())
}
