//! Size-based and semantic text splitting.

use std::sync::Arc;

use crate::error::ChunkError;
use crate::services::provider::{EmbeddingProvider, cosine_similarity};

/// Fixed-size sliding-window splitter with overlap.
///
/// Chunks are at most `chunk_size` characters. The window breaks
/// preferentially at a paragraph boundary, then a line boundary, then a
/// space, searched within the trailing fifth of the window. The trailing
/// `chunk_overlap` characters of each chunk reappear as the leading
/// characters of the next one.
#[derive(Debug, Clone)]
pub struct SlidingWindowSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SlidingWindowSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkError> {
        if chunk_size == 0 {
            return Err(ChunkError::InvalidConfig(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split `text` into overlapping windows.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();

        if total == 0 {
            return Vec::new();
        }
        if total <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let target_end = (start + self.chunk_size).min(total);
            let end = if target_end < total {
                self.find_break_point(&chars, start, target_end)
            } else {
                total
            };

            chunks.push(chars[start..end].iter().collect());

            if end >= total {
                break;
            }
            // The next window re-reads the trailing overlap of this one.
            start = end - self.chunk_overlap;
        }

        chunks
    }

    /// Find a natural break point near the target end position.
    ///
    /// Priority: paragraph break > newline > space. A candidate must leave
    /// the window longer than the overlap so the next start always advances.
    fn find_break_point(&self, chars: &[char], start: usize, target_end: usize) -> usize {
        let min_end = start + self.chunk_overlap + 1;
        let search_start = target_end
            .saturating_sub(self.chunk_size / 5)
            .max(min_end.min(target_end));

        let mut paragraph = None;
        let mut newline = None;
        let mut space = None;

        for pos in search_start..target_end {
            match chars[pos] {
                '\n' => {
                    if pos > 0 && chars[pos - 1] == '\n' {
                        paragraph = Some(pos + 1);
                    }
                    newline = Some(pos + 1);
                }
                ' ' | '\t' => {
                    space = Some(pos + 1);
                }
                _ => {}
            }
        }

        paragraph
            .or(newline)
            .or(space)
            .filter(|&pos| pos >= min_end && pos <= target_end)
            .unwrap_or(target_end)
    }
}

pub const DEFAULT_BREAKPOINT_PERCENTILE: f64 = 95.0;

/// Splitter that places chunk boundaries where consecutive
/// sentence-embeddings diverge beyond a threshold. Chunk size and overlap
/// are ignored in this mode.
pub struct SemanticSplitter {
    provider: Arc<dyn EmbeddingProvider>,
    breakpoint_percentile: f64,
}

impl SemanticSplitter {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            breakpoint_percentile: DEFAULT_BREAKPOINT_PERCENTILE,
        }
    }

    pub async fn split(&self, text: &str) -> Result<Vec<String>, ChunkError> {
        let sentences = split_sentences(text);
        if sentences.len() <= 1 {
            return Ok(sentences);
        }

        let embeddings = self.provider.embed_batch(&sentences).await?;
        if embeddings.len() != sentences.len() {
            return Err(ChunkError::Provider(
                crate::error::ProviderError::InvalidResponse(format!(
                    "got {} embeddings for {} sentences",
                    embeddings.len(),
                    sentences.len()
                )),
            ));
        }

        let distances: Vec<f32> = embeddings
            .windows(2)
            .map(|pair| 1.0 - cosine_similarity(&pair[0], &pair[1]))
            .collect();
        let threshold = percentile(&distances, self.breakpoint_percentile);

        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        for (i, sentence) in sentences.into_iter().enumerate() {
            current.push(sentence);
            let boundary = i < distances.len() && distances[i] > threshold;
            if boundary {
                chunks.push(current.join(" "));
                current = Vec::new();
            }
        }
        if !current.is_empty() {
            chunks.push(current.join(" "));
        }

        Ok(chunks)
    }
}

/// Split text into sentences at terminal punctuation or line breaks.
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            flush_sentence(&mut sentences, &mut current);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().is_none_or(|next| next.is_whitespace());
            if at_boundary {
                flush_sentence(&mut sentences, &mut current);
            }
        }
    }
    flush_sentence(&mut sentences, &mut current);

    sentences
}

fn flush_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

fn percentile(values: &[f32], p: f64) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    sorted[rank.round() as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(SlidingWindowSplitter::new(10, 10).is_err());
        assert!(SlidingWindowSplitter::new(0, 0).is_err());
        assert!(SlidingWindowSplitter::new(10, 9).is_ok());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let splitter = SlidingWindowSplitter::new(100, 10).unwrap();
        assert_eq!(splitter.split("short text"), vec!["short text"]);
    }

    #[test]
    fn test_empty_text() {
        let splitter = SlidingWindowSplitter::new(100, 10).unwrap();
        assert!(splitter.split("").is_empty());
    }

    #[test]
    fn test_chunk_length_bound() {
        let splitter = SlidingWindowSplitter::new(50, 10).unwrap();
        let text = "word ".repeat(100);
        for chunk in splitter.split(&text) {
            assert!(chunk.chars().count() <= 50);
        }
    }

    #[test]
    fn test_exact_overlap_between_neighbors() {
        for (size, overlap) in [(50usize, 10usize), (64, 16), (37, 5)] {
            let splitter = SlidingWindowSplitter::new(size, overlap).unwrap();
            let text = "the quick brown fox jumps over the lazy dog. ".repeat(30);
            let chunks = splitter.split(&text);
            assert!(chunks.len() > 1);
            for pair in chunks.windows(2) {
                let tail: Vec<char> = pair[0].chars().collect();
                let tail: String = tail[tail.len() - overlap..].iter().collect();
                let head: String = pair[1].chars().take(overlap).collect();
                assert_eq!(tail, head);
            }
        }
    }

    #[test]
    fn test_prefers_paragraph_break() {
        // The paragraph break sits inside the trailing fifth of the window.
        let splitter = SlidingWindowSplitter::new(40, 5).unwrap();
        let text = format!("{}\n\n{}", "a".repeat(35), "b".repeat(60));
        let chunks = splitter.split(&text);
        assert!(chunks[0].ends_with("\n\n"));
        assert_eq!(chunks[0].chars().count(), 37);
    }

    #[test]
    fn test_covers_full_text() {
        let splitter = SlidingWindowSplitter::new(30, 6).unwrap();
        let text = "x".repeat(200);
        let chunks = splitter.split(&text);
        // Windows advance by size - overlap over an unbreakable run.
        let mut covered = chunks[0].chars().count();
        for chunk in &chunks[1..] {
            covered += chunk.chars().count() - 6;
        }
        assert_eq!(covered, 200);
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("One sentence. Another one! A third?\nFourth line");
        assert_eq!(
            sentences,
            vec!["One sentence.", "Another one!", "A third?", "Fourth line"]
        );
    }

    #[test]
    fn test_split_sentences_no_false_break_on_decimal() {
        let sentences = split_sentences("Version 1.5 shipped. Done.");
        assert_eq!(sentences, vec!["Version 1.5 shipped.", "Done."]);
    }

    #[test]
    fn test_percentile() {
        let values = vec![0.1, 0.2, 0.3, 0.9];
        assert!(percentile(&values, 95.0) >= 0.3);
        assert_eq!(percentile(&[], 95.0), 0.0);
    }
}
