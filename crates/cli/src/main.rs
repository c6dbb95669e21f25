//! Emporium CLI - migrations, content seeding and post export.
//!
//! # Usage
//!
//! ```bash
//! # Run content backend migrations
//! emporium-cli migrate backend
//!
//! # Run storefront (session store) migrations
//! emporium-cli migrate storefront
//!
//! # Run all database migrations
//! emporium-cli migrate all
//!
//! # Load pages, posts, products and configuration from YAML
//! emporium-cli seed crates/cli/seed/demo.yaml
//!
//! # Dump all posts of a topic as JSON lines
//! emporium-cli export-posts --topic news -o posts.jsonl
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "emporium-cli")]
#[command(author, version, about = "Emporium CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Seed the content database from a YAML file
    Seed {
        /// Path to the seed file
        file: PathBuf,

        /// Validate the file without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Export posts from a running content backend as JSON lines
    ExportPosts {
        /// Content backend base URL
        #[arg(long, env = "STOREFRONT_API_URL", default_value = "http://localhost:1337")]
        api_url: String,

        /// Only posts matching this search text
        #[arg(short, long)]
        search: Option<String>,

        /// Only posts of this topic
        #[arg(short, long)]
        topic: Option<String>,

        /// Posts fetched per request
        #[arg(long, default_value_t = 30)]
        page_size: u32,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run content backend migrations
    Backend,
    /// Run storefront session-store migrations
    Storefront,
    /// Run all database migrations
    All,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emporium_cli=info,emporium_backend=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Backend => commands::migrate::backend().await?,
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::All => {
                commands::migrate::backend().await?;
                commands::migrate::storefront().await?;
            }
        },
        Commands::Seed { file, dry_run } => commands::seed::run(&file, dry_run).await?,
        Commands::ExportPosts {
            api_url,
            search,
            topic,
            page_size,
            output,
        } => {
            let options = commands::export::ExportOptions {
                search,
                topic,
                page_size,
            };
            commands::export::posts(&api_url, options, output.as_deref()).await?;
        }
    }
    Ok(())
}
