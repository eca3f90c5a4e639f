//! Row-oriented CSV chunking.

use std::path::Path;

use crate::error::ChunkError;
use crate::models::Chunk;

/// CSV parsing options. When `fieldnames` is set, the file is read
/// headerless and every row (including the first) becomes a chunk.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub quote: u8,
    pub fieldnames: Option<Vec<String>>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            fieldnames: None,
        }
    }
}

/// Split a CSV file into one chunk per row, rendered as `field: value`
/// lines. A row is an atomic unit: it is emitted whole even when it
/// exceeds the configured chunk size.
pub fn split_rows(path: &Path, options: &CsvOptions) -> Result<Vec<Chunk>, ChunkError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .quote(options.quote)
        .has_headers(options.fieldnames.is_none())
        .flexible(true)
        .from_path(path)?;

    let fieldnames: Vec<String> = match &options.fieldnames {
        Some(names) => names.clone(),
        None => reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect(),
    };

    let mut chunks = Vec::new();
    for (row_index, record) in reader.records().enumerate() {
        let record = record?;
        let content = render_row(&fieldnames, &record);
        if content.is_empty() {
            continue;
        }
        chunks.push(
            Chunk::new(content)
                .with_metadata("row", (row_index + 1).to_string())
                .with_metadata("source", path.display().to_string()),
        );
    }

    Ok(chunks)
}

fn render_row(fieldnames: &[String], record: &csv::StringRecord) -> String {
    let mut lines = Vec::new();
    for (i, value) in record.iter().enumerate() {
        let name = fieldnames
            .get(i)
            .map(String::as_str)
            .unwrap_or("")
            .to_string();
        if name.is_empty() && value.trim().is_empty() {
            continue;
        }
        lines.push(format!("{}: {}", name, value.trim()));
    }
    lines.join("\n")
}
