mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(version, about = "Static blog generator backed by a headless CMS", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Initialize new blog directory
    Init {
        /// Path to create blog directory
        path: PathBuf,

        /// CMS repository API endpoint
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Validate blog configuration
    Validate {
        /// Path to blog directory
        path: PathBuf,

        /// Also check that the CMS answers with posts
        #[arg(long)]
        online: bool,
    },

    /// Preview site locally with revalidation and hot reload
    Preview {
        /// Path to blog directory
        path: PathBuf,

        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Build the static home page
    Build {
        /// Path to blog directory
        path: PathBuf,

        /// Output directory for generated site
        #[arg(short, long)]
        output: PathBuf,

        /// Render draft content at this CMS ref (enables preview mode)
        #[arg(long)]
        preview_ref: Option<String>,
    },

    /// List posts in the terminal, loading more pages on demand
    Browse {
        /// Path to blog directory
        path: PathBuf,

        /// Load every page without prompting
        #[arg(long)]
        all: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,spacetraveling={level},spacetraveling_core={level},spacetraveling_cms={level},spacetraveling_generator={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Init { path, endpoint } => commands::init::run(path, endpoint).await,
        Command::Validate { path, online } => commands::validate::run(path, online).await,
        Command::Preview { path, port } => commands::preview::run(path, port).await,
        Command::Build {
            path,
            output,
            preview_ref,
        } => commands::build::run(path, output, preview_ref).await,
        Command::Browse { path, all } => commands::browse::run(path, all).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "spacetraveling", &mut io::stdout());
            Ok(())
        }
    }
}
