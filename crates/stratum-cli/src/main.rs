use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stratum_core::MigrationMode;

mod commands;

#[derive(Parser)]
#[command(name = "stratum")]
#[command(about = "Stratum - ordered, resumable schema migrations for workspace data", long_about = None)]
struct Cli {
    /// Config file (default: platform config dir, e.g. ~/.config/stratum/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory holding workspace data (overrides config and STRATUM_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all module migrations and upgrade hooks for a workspace
    Migrate {
        /// Workspace id
        #[arg(long)]
        workspace: String,

        /// `create` for a brand-new workspace, `upgrade` for existing data
        #[arg(long, default_value = "upgrade")]
        mode: MigrationMode,
    },
    /// Show completed migration steps of a workspace
    Status {
        /// Workspace id
        #[arg(long)]
        workspace: String,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let context = {
        let _bootstrap = tracing::subscriber::set_default(commands::logging::bootstrap());
        commands::Context::load(cli.config.as_deref(), cli.data_dir.as_deref()).await?
    };
    commands::logging::init(&context.config)?;

    match cli.command {
        Commands::Migrate { workspace, mode } => commands::migrate::run(&context, &workspace, mode).await?,
        Commands::Status { workspace } => commands::status::run(&context, &workspace).await?,
        Commands::Config => commands::config::run(&context)?,
    }

    Ok(())
}
