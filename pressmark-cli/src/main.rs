//! # pressmark CLI
//!
//! Command-line interface for publishing Markdown documents to WordPress.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pressmark")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "pressmark.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a Markdown document as a post (create or update by slug)
    Post {
        /// Markdown document to publish
        file: PathBuf,

        /// Application password (overrides auth.password from the config)
        #[arg(long, env = "PRESSMARK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Render a document locally and print the HTML
    Render {
        /// Markdown document to render
        file: PathBuf,
    },

    /// Report referenced and unreferenced local images
    Check {
        /// Markdown document to check
        file: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Join stdin into a single line with escaped newlines
    Liner {
        /// Also escape double quotes for pasting into HTML attributes
        #[arg(long)]
        html: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays pipeable
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Post { file, password } => {
            commands::post_document(&cli.config, &file, password).await
        }
        Commands::Render { file } => commands::render_document(&file),
        Commands::Check { file, json } => commands::check_document(&file, json),
        Commands::Liner { html } => commands::liner(html),
    }
}
