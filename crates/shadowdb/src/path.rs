//! Virtual path grammar: `shadowdb/{category}/{id}` for a specific record,
//! `shadowdb/{category}` for a recent-20 listing in that category,
//! `shadowdb` for a recent-20 listing overall. A final all-digit segment is
//! always interpreted as an id.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPath {
    ById(i64),
    RecentInCategory(String),
    RecentAll,
    Invalid,
}

pub fn parse(path: &str) -> ParsedPath {
    let trimmed = path.trim_matches('/');
    let parts: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

    match parts.as_slice() {
        ["shadowdb"] => ParsedPath::RecentAll,
        ["shadowdb", last] => {
            if let Ok(id) = last.parse::<i64>() {
                ParsedPath::ById(id)
            } else {
                ParsedPath::RecentInCategory(last.to_string())
            }
        }
        ["shadowdb", _category, last] => match last.parse::<i64>() {
            Ok(id) => ParsedPath::ById(id),
            Err(_) => ParsedPath::Invalid,
        },
        _ => ParsedPath::Invalid,
    }
}
