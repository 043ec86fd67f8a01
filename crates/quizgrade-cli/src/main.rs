//! quizgrade CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "quizgrade",
    version,
    about = "Grade quiz tasks against an answer key and post feedback"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade the open tasks of a section and apply the verdicts
    Grade {
        /// Path to the .toml answer key
        #[arg(long)]
        answer_key: PathBuf,

        /// Tracker project gid (defaults to the configured project)
        #[arg(long)]
        project: Option<String>,

        /// Section name to review (defaults to the configured section)
        #[arg(long)]
        section: Option<String>,

        /// Grade tasks from a JSON file instead of the tracker (no tracker actions)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Only review tasks assigned to these people (comma-separated)
        #[arg(long)]
        assignee: Option<String>,

        /// Approval threshold in [0, 1]
        #[arg(long)]
        threshold: Option<f64>,

        /// Grade and report without touching the tracker
        #[arg(long)]
        dry_run: bool,

        /// Output directory (defaults to the configured directory)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the sections of a tracker project
    Sections {
        /// Tracker project gid (defaults to the configured project)
        #[arg(long)]
        project: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate answer key TOML files
    Validate {
        /// Path to answer key file or directory
        #[arg(long)]
        answer_key: PathBuf,
    },

    /// Create starter config and the induction answer key
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quizgrade=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            answer_key,
            project,
            section,
            input,
            assignee,
            threshold,
            dry_run,
            output,
            format,
            config,
        } => {
            commands::grade::execute(
                answer_key, project, section, input, assignee, threshold, dry_run, output, format,
                config,
            )
            .await
        }
        Commands::Sections { project, config } => {
            commands::sections::execute(project, config).await
        }
        Commands::Validate { answer_key } => commands::validate::execute(answer_key),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
