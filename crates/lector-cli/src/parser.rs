//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Reader-mode session service.
#[derive(Debug, Parser)]
#[command(name = "lector")]
#[command(about = "Read books aloud with durable, resumable sessions")]
#[command(version)]
pub struct Cli {
    /// Override the data directory (state, lock and index files)
    #[arg(long = "data-dir", env = "LECTOR_DATA_DIR", global = true)]
    pub data_dir: Option<String>,

    /// Override the library directory scanned for books
    #[arg(long = "library-dir", env = "LECTOR_LIBRARY_DIR", global = true)]
    pub library_dir: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["lector", "--verbose", "--data-dir", "/tmp/lector", "paths"]);
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some("/tmp/lector".to_string()));
        assert!(matches!(cli.command, Some(Commands::Paths)));
    }

    #[test]
    fn test_serve_args() {
        let cli = Cli::parse_from([
            "lector",
            "serve",
            "--port",
            "8080",
            "--tts-command",
            "espeak-ng -v es",
        ]);
        match cli.command {
            Some(Commands::Serve {
                port,
                tts_command,
                dry_run,
            }) => {
                assert_eq!(port, 8080);
                assert_eq!(tts_command.as_deref(), Some("espeak-ng -v es"));
                assert!(!dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_status_args() {
        let cli = Cli::parse_from(["lector", "status", "mi_libro", "--chunks"]);
        match cli.command {
            Some(Commands::Status { session_id, chunks }) => {
                assert_eq!(session_id, "mi_libro");
                assert!(chunks);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
