use anyhow::Result;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

pub async fn handle_collections(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let store = super::open_store(&config)?;
    let names = store.collection_names()?;
    print!("{}", formatter.format_names(&names));

    Ok(())
}
