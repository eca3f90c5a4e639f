//! PDF text extraction: one text blob per page, split downstream.

use std::path::Path;

use crate::error::ChunkError;

/// Extract text per page. Pages with no extractable text are skipped.
pub fn extract_pages(path: &Path) -> Result<Vec<String>, ChunkError> {
    let pages = pdf_extract::extract_text_by_pages(path)
        .map_err(|e| ChunkError::Pdf(format!("{}: {}", path.display(), e)))?;

    Ok(pages
        .into_iter()
        .filter(|page| !page.trim().is_empty())
        .collect())
}
