use anyhow::Result;
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum TagsCommand {
    /// List distinct source tags stored in a collection
    List {
        #[arg(required = true, help = "Collection name")]
        name: String,
    },

    /// Delete every chunk carrying the given tags
    Delete {
        #[arg(required = true, help = "Collection name")]
        name: String,

        #[arg(required = true, help = "Tags to delete (comma-separated)")]
        tags: String,
    },
}

pub async fn handle_tags(cmd: TagsCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let store = super::open_store(&config)?;

    match cmd {
        TagsCommand::List { name } => {
            let tags: Vec<String> = store.collection_tags(&name)?.into_iter().collect();
            print!("{}", formatter.format_tags(&tags));
        }
        TagsCommand::Delete { name, tags } => {
            let mut removed = 0;
            for tag in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                removed += store.delete_tag(&name, tag)?;
            }
            print!(
                "{}",
                formatter.format_message(&format!("Deleted {} chunks from '{}'", removed, name))
            );
        }
    }

    Ok(())
}
