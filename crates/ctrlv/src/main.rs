//! ctrlv - share code snippets from the terminal.
//!
//! This is the main entry point for the ctrlv CLI.

mod commands;
mod context;
mod language;
mod notify;
mod prompt;
mod render;

use clap::{Parser, Subcommand};
use commands::{ShareArgs, VersionsArgs, ViewArgs};
use context::{AppContext, Overrides};

#[derive(Parser)]
#[command(name = "ctrlv")]
#[command(author, version, about = "Share code snippets from the terminal", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Snippet service address
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Base address used in share links
    #[arg(long, global = true)]
    origin: Option<String>,

    /// Write logs to the log file instead of stderr
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Share a file or stdin as a new snippet
    Share(ShareArgs),

    /// Share a new version of an existing snippet
    Version {
        /// Id of the snippet this version follows
        parent_id: String,

        #[command(flatten)]
        share: ShareArgs,
    },

    /// Show a snippet, asking for passwords as needed
    View(ViewArgs),

    /// List, open or diff the versions of a snippet
    Versions(VersionsArgs),

    /// Show the diff between two snippets
    Diff {
        /// Older snippet id
        source: String,
        /// Newer snippet id
        target: String,
    },

    /// Show service statistics
    Stats,

    /// List supported languages
    Languages,

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir()?;
    let ctx = AppContext::load(
        &cwd,
        Overrides {
            api_url: cli.api_url,
            origin: cli.origin,
        },
    )
    .await?;

    let log_file = commands::init_logging(cli.verbose, cli.log_file, ctx.config.log_level);
    if let Some(path) = &log_file {
        tracing::debug!(path = %path.display(), "logging to file");
    }
    for source in &ctx.sources {
        tracing::debug!(path = %source.display(), "loaded config");
    }

    let result = match cli.command {
        Commands::Share(args) => commands::handle_share(&ctx, args, None).await,
        Commands::Version { parent_id, share } => {
            commands::handle_share(&ctx, share, Some(parent_id)).await
        }
        Commands::View(args) => commands::handle_view(&ctx, args).await,
        Commands::Versions(args) => commands::handle_versions(&ctx, args).await,
        Commands::Diff { source, target } => commands::handle_diff(&ctx, &source, &target).await,
        Commands::Stats => commands::handle_stats(&ctx).await,
        Commands::Languages => {
            commands::list_languages();
            Ok(())
        }
        Commands::Config => commands::show_config(&ctx),
    };

    if let Err(e) = &result {
        tracing::debug!("command failed: {:?}", e);
    }
    result
}
