//! CLI module for the knowledge-base CLI.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Personal knowledge-base CLI: chunk files, run background embedding
/// tasks, and search collections.
#[derive(Debug, Parser)]
#[command(name = "recall")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(long, short = 'f', global = true, help = "Output format: text or json")]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check infrastructure status (embedding provider, stores)
    Status,

    /// Split a file into chunks without embedding it
    Chunk(commands::ChunkArgs),

    /// Chunk a file and embed it into a collection as a background task
    Embed(commands::EmbedArgs),

    /// Inspect embedding tasks
    #[command(subcommand)]
    Task(commands::TaskCommand),

    /// Search a collection
    Search(commands::SearchArgs),

    /// List collections that exist
    Collections,

    /// Manage source tags within a collection
    #[command(subcommand)]
    Tags(commands::TagsCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),

    /// Run the daemon serving chunk/embed/search requests
    Serve,
}
