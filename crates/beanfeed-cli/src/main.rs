mod collect;
mod extract;
mod sources;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "beanfeed-cli")]
#[command(about = "Coffee catalog ingestion command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one aggregation across the configured sources
    Collect {
        /// Restrict the run to a single source (by name, case-insensitive)
        #[arg(long)]
        source: Option<String>,

        /// Print the catalog as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Validate and list the configured sources
    Sources,
    /// Run the attribute extractor on crafted product text
    Extract {
        /// Product title
        #[arg(long)]
        title: String,

        /// Product tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Product description HTML
        #[arg(long)]
        body: Option<String>,

        /// Variant title used for weight parsing
        #[arg(long)]
        variant: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = beanfeed_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // Logs go to stderr so `collect --json` output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Collect { source, json } => {
            collect::run_collect(&config, source.as_deref(), json).await?;
        }
        Commands::Sources => sources::run_sources(&config)?,
        Commands::Extract {
            title,
            tags,
            body,
            variant,
        } => extract::run_extract(
            &config,
            &extract::ExtractArgs {
                title,
                tags,
                body,
                variant,
            },
        )?,
    }

    Ok(())
}
