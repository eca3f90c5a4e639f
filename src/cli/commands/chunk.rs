use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::chunking::{Chunker, ChunkerOptions, CsvOptions, SplitterMode};
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{EmbeddingProvider, create_provider};

#[derive(Debug, Args)]
pub struct ChunkArgs {
    #[arg(required = true, help = "File to split")]
    pub file: PathBuf,

    #[arg(long, help = "Maximum chunk size in characters")]
    pub chunk_size: Option<usize>,

    #[arg(long, help = "Overlap between adjacent chunks in characters")]
    pub chunk_overlap: Option<usize>,

    #[arg(long, default_value = "text", help = "Splitter mode: text or semantic")]
    pub splitter: String,

    #[arg(long, help = "Print only chunk contents, one per line")]
    pub content_only: bool,

    #[arg(long, help = "CSV delimiter character")]
    pub delimiter: Option<char>,

    #[arg(long, help = "CSV quote character")]
    pub quote: Option<char>,

    #[arg(long, help = "CSV field names (comma-separated; file has no header)")]
    pub fieldnames: Option<String>,
}

pub async fn handle_chunk(args: ChunkArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    // Splitter mode is validated before the file is touched.
    let splitter: SplitterMode = args.splitter.parse()?;

    let options = ChunkerOptions {
        chunk_size: args.chunk_size.unwrap_or(config.chunking.chunk_size),
        chunk_overlap: args.chunk_overlap.unwrap_or(config.chunking.chunk_overlap),
        splitter,
        csv: CsvOptions {
            delimiter: args.delimiter.map(|c| c as u8).unwrap_or(b','),
            quote: args.quote.map(|c| c as u8).unwrap_or(b'"'),
            fieldnames: args.fieldnames.as_ref().map(|names| {
                names
                    .split(',')
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .collect()
            }),
        },
    };

    // The provider is only contacted in semantic mode.
    let provider: Option<Arc<dyn EmbeddingProvider>> = if splitter == SplitterMode::Semantic {
        Some(create_provider(&config.embedding).context("failed to initialize provider")?)
    } else {
        None
    };

    let chunker = Chunker::for_path(&args.file, options, provider)?;
    if verbose {
        eprintln!("Splitting {} via {:?}", args.file.display(), chunker.kind());
    }

    let chunks = chunker.split(&args.file).await?;
    print!("{}", formatter.format_chunks(&chunks, args.content_only));

    Ok(())
}
