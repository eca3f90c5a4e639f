use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use crate::chunking::{Chunker, ChunkerOptions, SplitterMode};
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat, TaskState};
use crate::services::TaskManager;

#[derive(Debug, Args)]
pub struct EmbedArgs {
    #[arg(required = true, help = "File to chunk and embed")]
    pub file: PathBuf,

    #[arg(long, short = 'n', required = true, help = "Target collection name")]
    pub name: String,

    #[arg(long, short = 't', help = "Tags to attach to the content (comma-separated)")]
    pub tags: Option<String>,

    #[arg(long, help = "Maximum chunk size in characters")]
    pub chunk_size: Option<usize>,

    #[arg(long, help = "Overlap between adjacent chunks in characters")]
    pub chunk_overlap: Option<usize>,

    #[arg(long, default_value = "text", help = "Splitter mode: text or semantic")]
    pub splitter: String,
}

/// Chunk a file, submit the embedding task, and poll it to completion.
///
/// The submitting call returns immediately; only the progress display
/// below blocks. Detached jobs that outlive the client belong to the
/// daemon (`recall serve`).
pub async fn handle_embed(args: EmbedArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let splitter: SplitterMode = args.splitter.parse()?;
    let options = ChunkerOptions {
        chunk_size: args.chunk_size.unwrap_or(config.chunking.chunk_size),
        chunk_overlap: args.chunk_overlap.unwrap_or(config.chunking.chunk_overlap),
        splitter,
        ..Default::default()
    };

    let store = super::open_store(&config)?;
    let provider = std::sync::Arc::clone(store.provider());

    let chunker = Chunker::for_path(&args.file, options, Some(provider))?;
    let chunks = chunker
        .split(&args.file)
        .await
        .context("failed to chunk file")?;
    if chunks.is_empty() {
        anyhow::bail!("no chunks produced from {}", args.file.display());
    }
    if verbose {
        eprintln!(
            "Produced {} chunks from {}",
            chunks.len(),
            args.file.display()
        );
    }

    let tags: Vec<String> = args
        .tags
        .as_deref()
        .map(|s| {
            s.split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let texts: Vec<String> = chunks.into_iter().map(|c| c.content).collect();

    let manager = super::open_manager(&config, store)?;
    let task_id = manager.submit(&args.name, tags, texts)?;

    let progress_bar = ProgressBar::new(100);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .expect("valid progress template")
            .progress_chars("#>-"),
    );

    let status = wait_for_terminal(&manager, &task_id, &progress_bar).await?;
    match status {
        TaskState::Completed => {
            progress_bar.finish_with_message("done");
            print!(
                "{}",
                formatter.format_message(&format!(
                    "Embedded into collection '{}' (task {})",
                    args.name, task_id
                ))
            );
            Ok(())
        }
        _ => {
            progress_bar.abandon_with_message("failed");
            anyhow::bail!("embedding task {} failed", task_id)
        }
    }
}

async fn wait_for_terminal(
    manager: &TaskManager,
    task_id: &str,
    progress_bar: &ProgressBar,
) -> Result<TaskState> {
    loop {
        let status = manager.get_status(task_id)?;
        progress_bar.set_position((status.progress * 100.0) as u64);
        if status.estimated_time_left > 0.0 {
            progress_bar.set_message(format!("eta {:.0}s", status.estimated_time_left));
        }
        if status.status.is_terminal() {
            return Ok(status.status);
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
