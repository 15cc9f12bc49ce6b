//! tesouro CLI - Brazilian Treasury (Tesouro Direto) bond history downloader.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

use commands::download::DownloadArgs;
use display::Format;

#[derive(Parser)]
#[command(name = "tesouro")]
#[command(about = "Brazilian Treasury (Tesouro Direto) price and yield downloader", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output and non-error logs)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download price and yield history
    Download {
        /// Bond types (e.g., LTN, NTN-B, "NTN-B Principal"). Prompts when omitted.
        bonds: Vec<String>,

        /// First year. Defaults to the end year.
        #[arg(short, long)]
        start: Option<i32>,

        /// Last year. Defaults to the current year.
        #[arg(short, long)]
        end: Option<i32>,

        /// Download every bond type
        #[arg(long, conflicts_with = "bonds")]
        all: bool,

        /// Output file path. Defaults to <bond>.<format>
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,

        /// Maximum concurrent year downloads
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Retries per year after the first attempt
        #[arg(long)]
        max_retries: Option<u32>,

        /// Base URL of the source (or a mirror)
        #[arg(long, env = "TESOURO_BASE_URL")]
        base_url: Option<String>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List available bond types
    List {
        /// Filter by indexer (prefixado, selic, ipca, igpm)
        #[arg(short, long)]
        indexer: Option<String>,

        /// Search pattern
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show bond type details
    Info {
        /// Bond type code
        bond: String,
    },
}

/// Default log filter for the verbosity flags.
const fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(verbose, quiet)));

    // Logs go to stderr so tables on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Download {
            bonds,
            start,
            end,
            all,
            output,
            format,
            concurrency,
            timeout,
            max_retries,
            base_url,
            config,
        } => {
            let args = DownloadArgs {
                bonds,
                start,
                end,
                all,
                output,
                format,
                concurrency,
                timeout,
                max_retries,
                base_url,
                config,
            };
            commands::download::download(args, cli.quiet).await
        }
        Commands::List { indexer, search } => {
            commands::list::list_bonds(indexer.as_deref(), search.as_deref())
        }
        Commands::Info { bond } => commands::info::show_info(&bond),
    }
}
