//! Category detection over raw message text.

use super::types::CategoryDefinition;

/// Result of a successful detection: the owning category plus the message
/// text with the tag stripped off.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub category_name: String,
    pub content: String,
}

/// Match `text` against the configured categories.
///
/// A message belongs to a category when it starts with exactly the
/// category's separator and the first token after it names the category
/// (case-insensitive). Whatever follows that token is the content, which
/// may be empty.
///
/// Candidates are tried longest-separator-first so a one-character
/// separator can never shadow a longer one sharing its prefix; ties keep
/// registration order.
pub fn detect(text: &str, categories: &[CategoryDefinition]) -> Option<Detection> {
    let mut candidates: Vec<&CategoryDefinition> = categories.iter().collect();
    candidates.sort_by_key(|c| std::cmp::Reverse(c.separator.chars().count()));

    for category in candidates {
        let Some(rest) = text.strip_prefix(category.separator.as_str()) else {
            continue;
        };
        let rest = rest.trim_start();
        let (claimed, content) = match rest.find(char::is_whitespace) {
            Some(idx) => (&rest[..idx], rest[idx..].trim()),
            None => (rest, ""),
        };
        if claimed.to_lowercase() == category.normalized_key() {
            return Some(Detection {
                category_name: category.name.clone(),
                content: content.to_string(),
            });
        }
    }

    None
}
