//! Markdown chunking: split by header hierarchy, then re-split oversized
//! sections by size.

/// A header-delimited section of a Markdown document.
///
/// `content` keeps the header line itself; `headers` records the active
/// H1/H2/H3 titles the section sits under.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub content: String,
    pub headers: Vec<(u8, String)>,
}

const MAX_HEADER_LEVEL: u8 = 3;

/// Split a Markdown document at H1/H2/H3 headers, preserving header text
/// in each section. Deeper headers (H4+) stay inside their parent section.
pub fn split_by_headers(text: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut active: Vec<(u8, String)> = Vec::new();
    let mut current = String::new();
    let mut current_headers: Vec<(u8, String)> = Vec::new();

    for line in text.lines() {
        if let Some((level, title)) = parse_header(line) {
            if !current.trim().is_empty() {
                sections.push(Section {
                    content: current.trim_end().to_string(),
                    headers: current_headers.clone(),
                });
            }
            current.clear();

            // A new header closes every sibling at the same or deeper level.
            active.retain(|(l, _)| *l < level);
            active.push((level, title));
            current_headers = active.clone();

            current.push_str(line);
            current.push('\n');
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }

    if !current.trim().is_empty() {
        sections.push(Section {
            content: current.trim_end().to_string(),
            headers: current_headers,
        });
    }

    sections
}

fn parse_header(line: &str) -> Option<(u8, String)> {
    let hashes = line.chars().take_while(|c| *c == '#').count() as u8;
    if hashes == 0 || hashes > MAX_HEADER_LEVEL {
        return None;
    }
    let rest = &line[hashes as usize..];
    if !rest.starts_with(' ') {
        return None;
    }
    Some((hashes, rest.trim().to_string()))
}
