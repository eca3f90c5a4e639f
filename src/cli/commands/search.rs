use anyhow::Result;
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat, SearchMode, SearchOptions};
use crate::services::SearchExecutor;

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[arg(long, short = 'n', required = true, help = "Collection to search")]
    pub name: String,

    #[arg(long, short = 't', help = "Restrict to these source tags (comma-separated)")]
    pub tags: Option<String>,

    #[arg(long, short = 'k', help = "Maximum number of results to return")]
    pub top_k: Option<usize>,

    #[arg(
        long,
        default_value = "similarity",
        help = "Search type: similarity or mmr"
    )]
    pub search_type: String,

    #[arg(long, help = "Candidate pool size for MMR (defaults to 5x top_k)")]
    pub fetch_k: Option<usize>,

    #[arg(long, help = "MMR relevance/diversity balance in [0, 1]")]
    pub lambda: Option<f32>,

    #[arg(long, help = "Print only chunk contents, one per line")]
    pub content_only: bool,
}

pub async fn handle_search(args: SearchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let mode: SearchMode = args
        .search_type
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let top_k = args.top_k.unwrap_or(config.search.default_top_k);
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

    if verbose {
        eprintln!("Query: \"{}\"", args.query);
        eprintln!("  Collection: {}", args.name);
        eprintln!("  Mode: {}", mode);
        eprintln!("  Top-k: {}", top_k);
        if !tags.is_empty() {
            eprintln!("  Tags: {}", tags.join(", "));
        }
    }

    let store = super::open_store(&config)?;
    let executor = SearchExecutor::new(store, config.search.clone());

    let opts = SearchOptions {
        fetch_k: args.fetch_k,
        lambda: args.lambda,
    };

    let results = executor
        .search(&args.name, &tags, &args.query, top_k, mode, &opts)
        .await?;

    print!(
        "{}",
        formatter.format_search_results(&args.query, &results, args.content_only)
    );

    Ok(())
}
