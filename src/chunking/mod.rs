//! Chunking strategy selection and dispatch.
//!
//! [`ChunkerKind`] is the closed registry of supported strategies; a kind
//! plus [`ChunkerOptions`] yields a [`Chunker`] ready to split a file into
//! an ordered sequence of [`Chunk`]s.

pub mod code;
pub mod csv;
pub mod markdown;
pub mod pdf;
pub mod splitter;

use std::path::Path;
use std::sync::Arc;

use crate::error::ChunkError;
use crate::models::Chunk;
use crate::services::provider::EmbeddingProvider;

pub use code::Language;
pub use csv::CsvOptions;
pub use splitter::{SemanticSplitter, SlidingWindowSplitter};

/// Splitting strategy applied within every chunker kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitterMode {
    /// Fixed-size sliding window with overlap
    #[default]
    Text,
    /// Boundaries at embedding-distance discontinuities; size and overlap
    /// are ignored
    Semantic,
}

impl std::str::FromStr for SplitterMode {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(SplitterMode::Text),
            "semantic" => Ok(SplitterMode::Semantic),
            _ => Err(ChunkError::InvalidSplitter(s.to_string())),
        }
    }
}

/// The closed set of chunking strategies, resolved from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkerKind {
    /// Per-page text extraction before splitting
    Pdf,
    /// Recursive-character splitting (also the fallback)
    Text,
    /// Split at language-specific syntactic boundaries first
    Code(Language),
    /// Header-hierarchy split, oversized sections re-split by size
    Markdown,
    /// One chunk per row
    Csv,
}

impl ChunkerKind {
    /// Resolve a strategy from a lower-cased file extension. Unrecognized
    /// extensions fall back to plain text splitting.
    pub fn from_extension(extension: &str) -> Self {
        let extension = extension.to_lowercase();
        match extension.as_str() {
            "pdf" => ChunkerKind::Pdf,
            "txt" => ChunkerKind::Text,
            "md" => ChunkerKind::Markdown,
            "csv" => ChunkerKind::Csv,
            other => match Language::from_extension(other) {
                Some(language) => ChunkerKind::Code(language),
                None => ChunkerKind::Text,
            },
        }
    }
}

/// Options shared by all chunker kinds.
#[derive(Debug, Clone)]
pub struct ChunkerOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub splitter: SplitterMode,
    pub csv: CsvOptions,
}

impl Default for ChunkerOptions {
    fn default() -> Self {
        Self {
            chunk_size: 400,
            chunk_overlap: 20,
            splitter: SplitterMode::Text,
            csv: CsvOptions::default(),
        }
    }
}

enum SplitEngine {
    Window(SlidingWindowSplitter),
    Semantic(SemanticSplitter),
}

/// A ready-to-run chunker: a resolved strategy plus a configured split
/// engine. Configuration errors surface here, before any file I/O.
pub struct Chunker {
    kind: ChunkerKind,
    options: ChunkerOptions,
    engine: SplitEngine,
}

impl Chunker {
    /// Build a chunker for a file-type tag (usually the file extension).
    ///
    /// `provider` is only consulted in semantic mode; passing `None` there
    /// is a configuration error.
    pub fn of(
        file_type: &str,
        options: ChunkerOptions,
        provider: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Result<Self, ChunkError> {
        if file_type.trim().is_empty() {
            return Err(ChunkError::UnsupportedFormat(
                "empty file type".to_string(),
            ));
        }
        let kind = ChunkerKind::from_extension(file_type);
        Self::with_kind(kind, options, provider)
    }

    /// Build a chunker for a path, dispatching on its extension.
    pub fn for_path(
        path: &Path,
        options: ChunkerOptions,
        provider: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Result<Self, ChunkError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        if extension.is_empty() {
            // No extension to dispatch on; fall back to plain text.
            return Self::with_kind(ChunkerKind::Text, options, provider);
        }
        Self::of(&extension, options, provider)
    }

    fn with_kind(
        kind: ChunkerKind,
        options: ChunkerOptions,
        provider: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Result<Self, ChunkError> {
        let engine = match options.splitter {
            SplitterMode::Text => SplitEngine::Window(SlidingWindowSplitter::new(
                options.chunk_size,
                options.chunk_overlap,
            )?),
            SplitterMode::Semantic => {
                let provider = provider.ok_or_else(|| {
                    ChunkError::InvalidConfig(
                        "semantic splitting requires an embedding provider".to_string(),
                    )
                })?;
                SplitEngine::Semantic(SemanticSplitter::new(provider))
            }
        };
        Ok(Self {
            kind,
            options,
            engine,
        })
    }

    pub fn kind(&self) -> ChunkerKind {
        self.kind
    }

    /// Read the file and split it into ordered chunks. Deterministic for
    /// the same inputs, except semantic mode which depends on the
    /// embedding model.
    pub async fn split(&self, path: &Path) -> Result<Vec<Chunk>, ChunkError> {
        let source = path.display().to_string();
        match self.kind {
            ChunkerKind::Csv => csv::split_rows(path, &self.options.csv),
            ChunkerKind::Pdf => {
                let pages = pdf::extract_pages(path)?;
                let mut chunks = Vec::new();
                for (page_index, page) in pages.iter().enumerate() {
                    for piece in self.split_text(page).await? {
                        chunks.push(
                            Chunk::new(piece)
                                .with_metadata("source", source.clone())
                                .with_metadata("page", (page_index + 1).to_string()),
                        );
                    }
                }
                Ok(chunks)
            }
            ChunkerKind::Markdown => {
                let text = std::fs::read_to_string(path)?;
                let mut chunks = Vec::new();
                for section in markdown::split_by_headers(&text) {
                    let pieces = match &self.engine {
                        // Sections within the size budget stay whole.
                        SplitEngine::Window(_)
                            if section.content.chars().count() <= self.options.chunk_size =>
                        {
                            vec![section.content.clone()]
                        }
                        _ => self.split_text(&section.content).await?,
                    };
                    for piece in pieces {
                        let mut chunk = Chunk::new(piece).with_metadata("source", source.clone());
                        for (level, title) in &section.headers {
                            chunk = chunk.with_metadata(format!("h{}", level), title.clone());
                        }
                        chunks.push(chunk);
                    }
                }
                Ok(chunks)
            }
            ChunkerKind::Code(language) => {
                let text = std::fs::read_to_string(path)?;
                let pieces = match &self.engine {
                    SplitEngine::Window(window) => code::split_code(&text, language, window),
                    SplitEngine::Semantic(semantic) => semantic.split(&text).await?,
                };
                Ok(Self::collect(pieces, &source))
            }
            ChunkerKind::Text => {
                let text = std::fs::read_to_string(path)?;
                let pieces = self.split_text(&text).await?;
                Ok(Self::collect(pieces, &source))
            }
        }
    }

    async fn split_text(&self, text: &str) -> Result<Vec<String>, ChunkError> {
        match &self.engine {
            SplitEngine::Window(window) => Ok(window.split(text)),
            SplitEngine::Semantic(semantic) => semantic.split(text).await,
        }
    }

    fn collect(pieces: Vec<String>, source: &str) -> Vec<Chunk> {
        pieces
            .into_iter()
            .filter(|piece| !piece.trim().is_empty())
            .map(|piece| Chunk::new(piece).with_metadata("source", source.to_string()))
            .collect()
    }
}
