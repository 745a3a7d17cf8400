//! Input validation and sanitization shared by `write` and `update`.

use shadowdb_core::constants::{
    DEFAULT_CATEGORY, MAX_CATEGORY_CHARS, MAX_CONTENT_CHARS, MAX_TAGS, MAX_TAG_CHARS, MAX_TITLE_CHARS,
};
use shadowdb_core::errors::WriteError;

/// `content` required, non-empty after trim, ≤100,000 chars.
pub fn validate_content(content: &str) -> Result<String, WriteError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(WriteError::InvalidInput {
            field: "content".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if trimmed.chars().count() > MAX_CONTENT_CHARS {
        return Err(WriteError::InvalidInput {
            field: "content".to_string(),
            reason: format!("must be at most {MAX_CONTENT_CHARS} characters"),
        });
    }
    Ok(trimmed.to_string())
}

/// Default `"general"`, truncated to 100 chars.
pub fn sanitize_category(category: Option<&str>) -> String {
    let category = category.map(str::trim).filter(|c| !c.is_empty());
    truncate_chars(category.unwrap_or(DEFAULT_CATEGORY), MAX_CATEGORY_CHARS)
}

/// `None` if empty after trim, otherwise truncated to 500 chars.
pub fn sanitize_title(title: Option<&str>) -> Option<String> {
    let trimmed = title.map(str::trim).filter(|t| !t.is_empty())?;
    Some(truncate_chars(trimmed, MAX_TITLE_CHARS))
}

/// Dedupe (preserving first-appearance order), per-tag trim + truncate to
/// 200 chars, capped at 50 total.
pub fn sanitize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tag in tags {
        let trimmed = truncate_chars(tag.trim(), MAX_TAG_CHARS);
        if trimmed.is_empty() || !seen.insert(trimmed.clone()) {
            continue;
        }
        result.push(trimmed);
        if result.len() >= MAX_TAGS {
            break;
        }
    }
    result
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_rejects_empty_and_oversized() {
        assert!(validate_content("   ").is_err());
        let too_long = "a".repeat(MAX_CONTENT_CHARS + 1);
        assert!(validate_content(&too_long).is_err());
        let exactly_max = "a".repeat(MAX_CONTENT_CHARS);
        assert!(validate_content(&exactly_max).is_ok());
    }

    #[test]
    fn category_defaults_when_absent() {
        assert_eq!(sanitize_category(None), "general");
        assert_eq!(sanitize_category(Some("  ")), "general");
        assert_eq!(sanitize_category(Some("people")), "people");
    }

    #[test]
    fn title_is_none_when_empty() {
        assert_eq!(sanitize_title(None), None);
        assert_eq!(sanitize_title(Some("  ")), None);
        assert_eq!(sanitize_title(Some("Hello")), Some("Hello".to_string()));
    }

    #[test]
    fn sanitize_tags_law_dedupes_caps_and_preserves_order() {
        let tags: Vec<String> = vec!["b", "a", "b", "c", "a"]
            .into_iter()
            .map(String::from)
            .collect();
        let result = sanitize_tags(&tags);
        assert_eq!(result, vec!["b", "a", "c"]);

        let many: Vec<String> = (0..60).map(|i| format!("tag{i}")).collect();
        let result = sanitize_tags(&many);
        assert_eq!(result.len(), MAX_TAGS);

        let long_tag = vec!["x".repeat(MAX_TAG_CHARS + 50)];
        let result = sanitize_tags(&long_tag);
        assert_eq!(result[0].chars().count(), MAX_TAG_CHARS);
    }
}
