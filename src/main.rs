//! # Recall Tutor CLI (`tutor`)
//!
//! ## Usage
//!
//! ```bash
//! tutor --config ./config/tutor.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tutor parse` | Extract knowledge items from the notes directory |
//! | `tutor status` | Show credentials, notes directory and knowledge base |
//! | `tutor list` | List the items in the knowledge base |
//! | `tutor quiz` | Start an interactive quiz session |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::BufReader;

use recall_tutor::config::{self, Credentials};
use recall_tutor::traits::Capabilities;
use recall_tutor::{ingest, quiz_cmd, status};

/// Recall Tutor: turn study notes into a knowledge base and get quizzed on it.
///
/// Provider keys are read from `OPENAI_API_KEY` and `ELEVENLABS_API_KEY`.
/// Either may be missing; the features that need it are then disabled.
#[derive(Parser)]
#[command(name = "tutor", version)]
struct Cli {
    /// Path to configuration file (TOML). A missing file means defaults.
    #[arg(long, global = true, default_value = "./config/tutor.toml")]
    config: PathBuf,

    /// Log at debug level (`RUST_LOG` overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the notes directory into the knowledge base.
    ///
    /// Reads every .txt, .md and .docx file, splits it into chunks, asks
    /// the language model for the cases and principles in each chunk, and
    /// overwrites the knowledge base with the deduplicated result.
    Parse {
        /// Read and chunk only; no model calls, nothing written.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show which capabilities are enabled and what has been parsed.
    Status,

    /// List knowledge-base item names.
    List,

    /// Start an interactive quiz.
    Quiz {
        /// Write the session transcript as JSON on exit.
        #[arg(long)]
        transcript: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;
    let credentials = Credentials::from_env();

    match cli.command {
        Commands::Parse { dry_run } => {
            let caps = Capabilities::from_config(&cfg, &credentials)?;
            ingest::run_parse(&cfg, caps.llm, dry_run).await?;
        }
        Commands::Status => {
            status::run_status(&cfg, &credentials)?;
        }
        Commands::List => {
            status::run_list(&cfg)?;
        }
        Commands::Quiz { transcript } => {
            let caps = Capabilities::from_config(&cfg, &credentials)?;
            let stdin = BufReader::new(tokio::io::stdin());
            quiz_cmd::run_quiz(&cfg, &caps, stdin, transcript.as_deref()).await?;
        }
    }

    Ok(())
}
