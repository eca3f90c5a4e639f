//! Language-aware code splitting.
//!
//! Code files are first cut at language-specific syntactic boundaries
//! (top-level declarations), then packed into size-bounded chunks; a single
//! boundary segment larger than the chunk size falls back to the
//! sliding-window splitter.

use super::splitter::SlidingWindowSplitter;

/// Programming languages with known syntactic split boundaries, keyed by
/// file extension. Markdown is handled by its own chunker, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    C,
    Cpp,
    CSharp,
    Cobol,
    Go,
    Haskell,
    Html,
    Java,
    Js,
    Kotlin,
    Latex,
    Lua,
    Perl,
    Php,
    Proto,
    Python,
    Rst,
    Ruby,
    Rust,
    Scala,
    Solidity,
    Swift,
    Ts,
}

impl Language {
    /// Look up a language by lower-cased file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let language = match ext {
            "c" => Language::C,
            "cpp" => Language::Cpp,
            "cs" => Language::CSharp,
            "cob" => Language::Cobol,
            "go" => Language::Go,
            "hs" => Language::Haskell,
            "html" => Language::Html,
            "java" => Language::Java,
            "js" => Language::Js,
            "kt" => Language::Kotlin,
            "tex" => Language::Latex,
            "lua" => Language::Lua,
            "pl" => Language::Perl,
            "php" => Language::Php,
            "proto" => Language::Proto,
            "py" => Language::Python,
            "rst" => Language::Rst,
            "rb" => Language::Ruby,
            "rs" => Language::Rust,
            "scala" => Language::Scala,
            "sol" => Language::Solidity,
            "swift" => Language::Swift,
            "ts" => Language::Ts,
            _ => return None,
        };
        Some(language)
    }

    /// Syntactic boundary markers, most significant first. A split before
    /// any of these keeps a declaration together with its body.
    pub fn separators(self) -> &'static [&'static str] {
        match self {
            Language::C | Language::Cpp => &[
                "\nclass ", "\nstruct ", "\nunion ", "\nenum ", "\nvoid ", "\nint ", "\nchar ",
                "\nstatic ", "\nif ", "\nfor ", "\nwhile ", "\nswitch ",
            ],
            Language::CSharp => &[
                "\nnamespace ", "\nclass ", "\ninterface ", "\nenum ", "\npublic ", "\nprivate ",
                "\nprotected ", "\ninternal ", "\nstatic ", "\nvoid ",
            ],
            Language::Cobol => &[
                "\nIDENTIFICATION DIVISION",
                "\nENVIRONMENT DIVISION",
                "\nDATA DIVISION",
                "\nPROCEDURE DIVISION",
                "\nSECTION",
                "\nPARAGRAPH",
            ],
            Language::Go => &[
                "\nfunc ", "\ntype ", "\nvar ", "\nconst ", "\nif ", "\nfor ", "\nswitch ",
            ],
            Language::Haskell => &[
                "\nmodule ", "\ndata ", "\nnewtype ", "\ntype ", "\nclass ", "\ninstance ",
                "\nwhere",
            ],
            Language::Html => &[
                "<article", "<section", "<div", "<table", "<ul", "<ol", "<p", "<h1", "<h2", "<h3",
            ],
            Language::Java | Language::Kotlin => &[
                "\nclass ", "\ninterface ", "\nobject ", "\nenum ", "\npublic ", "\nprotected ",
                "\nprivate ", "\nfun ", "\nstatic ", "\nvoid ",
            ],
            Language::Js | Language::Ts => &[
                "\nfunction ", "\nclass ", "\ninterface ", "\ntype ", "\nconst ", "\nlet ",
                "\nvar ", "\nexport ", "\nif ", "\nfor ", "\nwhile ",
            ],
            Language::Latex => &[
                "\n\\chapter{", "\n\\section{", "\n\\subsection{", "\n\\subsubsection{",
                "\n\\begin{",
            ],
            Language::Lua => &["\nlocal ", "\nfunction ", "\nif ", "\nfor ", "\nwhile ", "\nrepeat "],
            Language::Perl => &["\nsub ", "\npackage ", "\nif ", "\nunless ", "\nfor ", "\nwhile "],
            Language::Php => &[
                "\nfunction ", "\nclass ", "\ninterface ", "\ntrait ", "\nif ", "\nforeach ",
                "\nwhile ",
            ],
            Language::Proto => &["\nmessage ", "\nservice ", "\nenum ", "\noneof ", "\nrpc "],
            Language::Python => &["\nclass ", "\ndef ", "\n\tdef ", "\n    def "],
            Language::Rst => &["\n===", "\n---", "\n***", "\n.. ", "\n::"],
            Language::Ruby => &["\nclass ", "\nmodule ", "\ndef ", "\nif ", "\nunless ", "\nwhile "],
            Language::Rust => &[
                "\nfn ", "\npub fn ", "\nstruct ", "\nenum ", "\ntrait ", "\nimpl ", "\nmod ",
                "\nconst ", "\nstatic ",
            ],
            Language::Scala => &[
                "\nclass ", "\nobject ", "\ntrait ", "\ndef ", "\nval ", "\nvar ", "\nmatch ",
            ],
            Language::Solidity => &[
                "\ncontract ", "\nlibrary ", "\ninterface ", "\nfunction ", "\nmodifier ",
                "\nevent ", "\nstruct ", "\nenum ",
            ],
            Language::Swift => &[
                "\nfunc ", "\nclass ", "\nstruct ", "\nenum ", "\nprotocol ", "\nextension ",
                "\nif ", "\nfor ",
            ],
        }
    }
}

/// Split `text` at the language's syntactic boundaries, then pack the
/// resulting segments into chunks no larger than the splitter's window.
pub fn split_code(text: &str, language: Language, fallback: &SlidingWindowSplitter) -> Vec<String> {
    let segments = split_at_boundaries(text, language.separators());
    pack_segments(segments, fallback)
}

/// Cut `text` before every occurrence of a separator, keeping the
/// separator with the segment it starts.
fn split_at_boundaries(text: &str, separators: &[&str]) -> Vec<String> {
    let mut cut_points: Vec<usize> = separators
        .iter()
        .flat_map(|sep| text.match_indices(sep).map(|(i, _)| i))
        .collect();
    cut_points.sort_unstable();
    cut_points.dedup();

    let mut segments = Vec::new();
    let mut start = 0;
    for cut in cut_points {
        if cut > start {
            segments.push(text[start..cut].to_string());
            start = cut;
        }
    }
    if start < text.len() {
        segments.push(text[start..].to_string());
    }
    segments
}

fn pack_segments(segments: Vec<String>, fallback: &SlidingWindowSplitter) -> Vec<String> {
    let chunk_size = fallback.chunk_size();
    let mut chunks = Vec::new();
    let mut current = String::new();

    for segment in segments {
        let segment_len = segment.chars().count();
        let current_len = current.chars().count();

        if current_len + segment_len <= chunk_size {
            current.push_str(&segment);
            continue;
        }
        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if segment_len <= chunk_size {
            current = segment;
        } else {
            chunks.extend(fallback.split(&segment));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("rs"), Some(Language::Rust));
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("cob"), Some(Language::Cobol));
        // Markdown is deliberately not a code language here.
        assert_eq!(Language::from_extension("md"), None);
        assert_eq!(Language::from_extension("xyz"), None);
    }

    #[test]
    fn test_splits_at_function_boundaries() {
        let source = "fn one() {\n    1\n}\n\nfn two() {\n    2\n}\n";
        let segments = split_at_boundaries(source, Language::Rust.separators());
        assert_eq!(segments.len(), 2);
        assert!(segments[1].starts_with("\nfn two"));
    }

    #[test]
    fn test_packs_small_segments_together() {
        let source = "fn a() {}\nfn b() {}\nfn c() {}\n";
        let fallback = SlidingWindowSplitter::new(400, 20).unwrap();
        let chunks = split_code(source, Language::Rust, &fallback);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], source);
    }

    #[test]
    fn test_respects_chunk_size() {
        let body = "    let x = 1;\n".repeat(10);
        let source = format!("fn a() {{\n{body}}}\n\nfn b() {{\n{body}}}\n");
        let fallback = SlidingWindowSplitter::new(200, 20).unwrap();
        let chunks = split_code(&source, Language::Rust, &fallback);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 200);
        }
    }

    #[test]
    fn test_oversized_segment_falls_back_to_window() {
        let source = format!("fn big() {{\n{}}}\n", "    call();\n".repeat(50));
        let fallback = SlidingWindowSplitter::new(100, 10).unwrap();
        let chunks = split_code(&source, Language::Rust, &fallback);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
    }
}
