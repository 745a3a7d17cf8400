//! Renders primer rows into a single budgeted text block with a stable
//! digest, truncating cleanly at a section/paragraph/sentence/word boundary
//! when the joined text exceeds the character budget.

use sha1::{Digest, Sha1};

use shadowdb_core::constants::{
    PRIMER_PARAGRAPH_BOUNDARY_WINDOW, PRIMER_SECTION_BOUNDARY_WINDOW, PRIMER_SENTENCE_BOUNDARY_WINDOW,
    PRIMER_TRUNCATION_SUFFIX, PRIMER_WORD_BOUNDARY_WINDOW,
};
use shadowdb_core::primer::PrimerRow;

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPrimer {
    pub text: String,
    pub digest: String,
    pub total_chars: usize,
    pub row_count: usize,
    pub truncated: bool,
}

/// Rows are expected pre-ordered `(priority asc nulls-last, key asc)` with
/// disabled rows already excluded (the backend's job, per `get_primer_rows`).
/// Returns `None` if there is nothing to render.
pub fn assemble(rows: &[PrimerRow], max_chars: usize) -> Option<AssembledPrimer> {
    let rendered: Vec<String> = rows
        .iter()
        .filter_map(|row| {
            let content = row.content.trim();
            if content.is_empty() {
                None
            } else {
                Some(format!("## {}\n{}", row.key, content))
            }
        })
        .collect();

    if rendered.is_empty() {
        return None;
    }

    let joined = rendered.join("\n\n");
    let digest = sha1_digest_16(&joined);
    let row_count = rendered.len();

    let chars: Vec<char> = joined.chars().collect();
    if chars.len() <= max_chars || max_chars == 0 {
        return Some(AssembledPrimer {
            total_chars: chars.len(),
            text: joined,
            digest,
            row_count,
            truncated: false,
        });
    }

    let cut = find_cut_point(&chars, max_chars);
    let mut text: String = chars[..cut].iter().collect();
    text.push_str(PRIMER_TRUNCATION_SUFFIX);

    Some(AssembledPrimer {
        total_chars: chars.len(),
        text,
        digest,
        row_count,
        truncated: true,
    })
}

fn sha1_digest_16(text: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    let result = hasher.finalize();
    let mut hex = String::with_capacity(40);
    for byte in result {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex.truncate(16);
    hex
}

/// Walk backward from `max_chars`, preferring in order: section boundary
/// (`\n## `, within 500 chars), paragraph boundary (`\n\n`, within 300),
/// sentence boundary (`. `/`.\n`/`\n`, within 200), word boundary (space,
/// within 100). Falls back to a hard cut at `max_chars`.
fn find_cut_point(chars: &[char], max_chars: usize) -> usize {
    let section: &[char] = &['\n', '#', '#', ' '];
    if let Some(p) = find_boundary_before(chars, max_chars, section, PRIMER_SECTION_BOUNDARY_WINDOW) {
        return p;
    }

    let paragraph: &[char] = &['\n', '\n'];
    if let Some(p) = find_boundary_before(chars, max_chars, paragraph, PRIMER_PARAGRAPH_BOUNDARY_WINDOW) {
        return p;
    }

    for pattern in [&['.', ' '][..], &['.', '\n'][..], &['\n'][..]] {
        if let Some(p) = find_boundary_after(chars, max_chars, pattern, PRIMER_SENTENCE_BOUNDARY_WINDOW) {
            return p;
        }
    }

    let word: &[char] = &[' '];
    if let Some(p) = find_boundary_before(chars, max_chars, word, PRIMER_WORD_BOUNDARY_WINDOW) {
        return p;
    }

    max_chars
}

/// Cut right before the start of `pattern`'s nearest occurrence within
/// `window` chars of `max_chars`.
fn find_boundary_before(chars: &[char], max_chars: usize, pattern: &[char], window: usize) -> Option<usize> {
    let floor = max_chars.saturating_sub(window);
    let ceiling = max_chars.min(chars.len());
    let mut i = ceiling;
    loop {
        if matches_at(chars, i, pattern) {
            return Some(i);
        }
        if i == floor || i == 0 {
            break;
        }
        i -= 1;
    }
    None
}

/// Cut right after the end of `pattern`'s nearest occurrence within
/// `window` chars of `max_chars`.
fn find_boundary_after(chars: &[char], max_chars: usize, pattern: &[char], window: usize) -> Option<usize> {
    let floor = max_chars.saturating_sub(window);
    let ceiling = max_chars.min(chars.len());
    let mut i = ceiling;
    loop {
        if matches_at(chars, i, pattern) {
            return Some(i + pattern.len());
        }
        if i == floor || i == 0 {
            break;
        }
        i -= 1;
    }
    None
}

fn matches_at(chars: &[char], i: usize, pattern: &[char]) -> bool {
    i + pattern.len() <= chars.len() && chars[i..i + pattern.len()] == *pattern
}
