//! Snippet formatting for a fused hit: a one-line header followed by a
//! capped slice of content.

use chrono::{DateTime, Utc};
use shadowdb_core::constants::SNIPPET_CONTENT_CHARS;

/// "just now" / "{n}m ago" / "{n}h ago" / "{n}d ago" / "{n}w ago" /
/// "{n}mo ago" / "{n}y ago", per the boundaries in §4.3.
pub fn relative_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - created_at).num_minutes().max(0);
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    if days < 14 {
        return format!("{days}d ago");
    }
    let weeks = days / 7;
    if weeks < 9 {
        return format!("{weeks}w ago");
    }
    let months = days / 30;
    if months < 12 {
        return format!("{months}mo ago");
    }
    let years = days / 365;
    format!("{years}y ago")
}

/// `[{category}] | {relative_age}` header, then up to `SNIPPET_CONTENT_CHARS`
/// characters of content (char-boundary safe).
pub fn format_snippet(category: &str, created_at: Option<DateTime<Utc>>, content: &str, now: DateTime<Utc>) -> String {
    let age = created_at
        .map(|t| relative_age(t, now))
        .unwrap_or_else(|| "unknown".to_string());
    let header = format!("[{category}] | {age}");

    let truncated = match content.char_indices().nth(SNIPPET_CONTENT_CHARS) {
        Some((byte_idx, _)) => &content[..byte_idx],
        None => content,
    };

    format!("{header}\n{truncated}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_match_spec() {
        let now = Utc::now();
        assert_eq!(relative_age(now, now), "just now");
        assert_eq!(relative_age(now - chrono::Duration::minutes(5), now), "5m ago");
        assert_eq!(relative_age(now - chrono::Duration::hours(3), now), "3h ago");
        assert_eq!(relative_age(now - chrono::Duration::days(2), now), "2d ago");
        assert_eq!(relative_age(now - chrono::Duration::weeks(3), now), "3w ago");
        assert_eq!(relative_age(now - chrono::Duration::days(60), now), "8w ago");
        assert_eq!(relative_age(now - chrono::Duration::days(270), now), "9mo ago");
        assert_eq!(relative_age(now - chrono::Duration::days(400), now), "1y ago");
    }

    #[test]
    fn content_is_capped_at_snippet_limit() {
        let now = Utc::now();
        let long = "x".repeat(SNIPPET_CONTENT_CHARS + 200);
        let snippet = format_snippet("people", Some(now), &long, now);
        let body = snippet.split_once('\n').unwrap().1;
        assert_eq!(body.chars().count(), SNIPPET_CONTENT_CHARS);
    }
}
