//! Markdown document codec for category archives.
//!
//! A document is a free-text header followed by `---`-separated message
//! blocks. Each block carries a `## Mensaje #N` heading, an optional field
//! list (`- **FECHA:** …`, `- **HORA:** …`, `- **AUTOR:** …`) and a
//! mandatory `**CONTENIDO:**` region fenced with triple backticks.
//!
//! Decoding is best-effort: malformed blocks are skipped and reported as
//! warnings, never as a wholesale failure.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{CategorizedMessage, CategoryDefinition, CategoryField};

/// Line marking the end of the header in the current format.
const SECTION_MARKER: &str = "MENSAJES";

/// Sender recorded for blocks whose author line is absent.
const UNKNOWN_AUTHOR: &str = "Desconocido";

const EMPTY_PLACEHOLDER: &str = "_No hay mensajes en esta categoría aún._";

static BLOCK_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n---\n").unwrap());

/// A decoded document: the preserved header, the blocks that parsed, and
/// one warning per anomaly encountered on the way.
#[derive(Debug, Clone, Default)]
pub struct Decoded {
    pub header: String,
    pub messages: Vec<CategorizedMessage>,
    pub warnings: Vec<String>,
}

/// Parse a raw document into header + messages.
pub fn decode(raw: &str) -> Decoded {
    let lines: Vec<&str> = raw.split('\n').collect();

    if let Some(idx) = lines.iter().position(|l| l.contains(SECTION_MARKER)) {
        let header = format!("{}\n\n", lines[..=idx].join("\n"));
        let (messages, warnings) = parse_blocks(&lines[idx + 1..].join("\n"));
        return Decoded {
            header,
            messages,
            warnings,
        };
    }

    // Legacy format: the header runs up to the first lone `---` line.
    if let Some(idx) = lines.iter().position(|l| l.trim() == "---") {
        let header = format!("{}\n\n", lines[..=idx].join("\n"));
        let body = if idx + 2 <= lines.len() {
            lines[idx + 2..].join("\n")
        } else {
            String::new()
        };
        let (messages, warnings) = parse_blocks(&body);
        return Decoded {
            header,
            messages,
            warnings,
        };
    }

    // No recognizable boundary: keep the whole document as header rather
    // than guessing at blocks.
    Decoded {
        header: raw.to_string(),
        messages: Vec::new(),
        warnings: Vec::new(),
    }
}

/// Render a document. `messages` must already be newest-first; the newest
/// entry receives the highest number.
pub fn encode(header: &str, category: &CategoryDefinition, messages: &[CategorizedMessage]) -> String {
    let mut out = String::from(header);

    if messages.is_empty() {
        out.push_str("---\n\n");
        out.push_str(EMPTY_PLACEHOLDER);
        out.push('\n');
        return out;
    }

    let total = messages.len();
    for (index, message) in messages.iter().enumerate() {
        out.push_str("---\n\n");
        out.push_str(&format_message(message, category, total - index));
        out.push_str("\n\n");
    }

    format!("{}\n", out.trim())
}

/// Header for a freshly created category document. Generated once; later
/// writes preserve whatever header the document already has.
pub fn generate_header(category: &CategoryDefinition) -> String {
    let mut header = format!("**CATEGORIA:** {}\n\n", category.name);
    if let Some(description) = &category.description {
        header.push_str(&format!("**Descripcion:** {description}\n\n"));
    }
    header.push_str("**MENSAJES** (ordenados de más a menos reciente):\n\n");
    header
}

/// Epoch milliseconds from `DD/MM/YYYY` + `HH:MM:SS`. Missing time
/// components default to zero; a malformed or impossible date yields
/// `None` and the caller decides the fallback.
pub(crate) fn parse_timestamp(time: &str, date: &str) -> Option<i64> {
    let mut date_parts = date.split('/');
    let day: u32 = date_parts.next()?.trim().parse().ok()?;
    let month: u32 = date_parts.next()?.trim().parse().ok()?;
    let year: i32 = date_parts.next()?.trim().parse().ok()?;

    let mut time_parts = time.split(':');
    let hour: u32 = time_parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
    let minute: u32 = time_parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
    let second: u32 = time_parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);

    let timestamp = NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(hour, minute, second)?
        .and_utc()
        .timestamp_millis();
    Some(timestamp)
}

fn parse_blocks(body: &str) -> (Vec<CategorizedMessage>, Vec<String>) {
    let mut messages = Vec::new();
    let mut warnings = Vec::new();

    for block in BLOCK_SPLIT.split(body) {
        if block.trim().is_empty() {
            continue;
        }
        if let Some(message) = parse_block(block, &mut warnings) {
            messages.push(message);
        }
    }

    (messages, warnings)
}

/// `- **<LABEL>:** value` → `(field, value)`.
fn parse_field_line(trimmed: &str) -> Option<(CategoryField, &str)> {
    let rest = trimmed.strip_prefix("- **")?;
    let (label, value) = rest.split_once(":**")?;
    let field = label.parse::<CategoryField>().ok()?;
    Some((field, value.trim()))
}

fn parse_block(block: &str, warnings: &mut Vec<String>) -> Option<CategorizedMessage> {
    let mut date = String::new();
    let mut time = String::new();
    let mut author = UNKNOWN_AUTHOR.to_string();
    let mut in_fence = false;
    let mut content_lines: Vec<&str> = Vec::new();

    for line in block.split('\n') {
        let trimmed = line.trim();
        if trimmed == "```" {
            in_fence = !in_fence;
        } else if in_fence {
            // Inside the fence the original formatting is preserved.
            content_lines.push(line);
        } else if let Some((field, value)) = parse_field_line(trimmed) {
            match field {
                CategoryField::Date => date = value.to_string(),
                CategoryField::Time => time = value.to_string(),
                CategoryField::Author => author = value.to_string(),
                CategoryField::Content => {}
            }
        }
    }

    let content = content_lines.join("\n").trim().to_string();
    if date.is_empty() || time.is_empty() || content.is_empty() {
        let heading = block.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
        warnings.push(format!(
            "skipped block missing date, time or content (starts with {heading:?})"
        ));
        return None;
    }

    let timestamp = parse_timestamp(&time, &date).unwrap_or_else(|| {
        warnings.push(format!(
            "unparsable date/time {date:?} {time:?}, ordering by current time"
        ));
        Utc::now().timestamp_millis()
    });

    Some(CategorizedMessage {
        content,
        sender: author,
        time,
        date,
        timestamp,
    })
}

fn format_message(message: &CategorizedMessage, category: &CategoryDefinition, number: usize) -> String {
    let mut parts = vec![format!("## Mensaje #{number}")];

    let mut fields = Vec::new();
    if category.enabled_fields.date {
        fields.push(format!("- **{}:** {}", CategoryField::Date, message.date));
    }
    if category.enabled_fields.time {
        fields.push(format!("- **{}:** {}", CategoryField::Time, message.time));
    }
    if category.enabled_fields.author {
        fields.push(format!("- **{}:** {}", CategoryField::Author, message.sender));
    }
    if !fields.is_empty() {
        parts.push(fields.join("\n"));
    }

    parts.push(format!(
        "\n**{}:**\n\n```\n{}\n```",
        CategoryField::Content,
        message.content
    ));

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::types::{DEFAULT_SEPARATOR, FieldSet};
    use chrono::Utc;

    fn category(name: &str, fields: FieldSet) -> CategoryDefinition {
        CategoryDefinition {
            name: name.to_string(),
            description: Some("pruebas".to_string()),
            enabled_fields: fields,
            separator: DEFAULT_SEPARATOR.to_string(),
            created_at: Utc::now(),
        }
    }

    fn message(content: &str, sender: &str, time: &str, date: &str) -> CategorizedMessage {
        CategorizedMessage {
            content: content.to_string(),
            sender: sender.to_string(),
            time: time.to_string(),
            date: date.to_string(),
            timestamp: parse_timestamp(time, date).unwrap(),
        }
    }

    #[test]
    fn round_trip_preserves_messages_and_header() {
        let category = category("Code", FieldSet::default());
        let header = generate_header(&category);
        let messages = vec![
            message("let x = 2;", "Ana", "11:30:00", "02/01/2024"),
            message("print('hi')", "Luis", "10:00:00", "01/01/2024"),
        ];

        let text = encode(&header, &category, &messages);
        let decoded = decode(&text);

        assert!(decoded.warnings.is_empty());
        assert_eq!(decoded.header, header);
        assert_eq!(decoded.messages, messages);
    }

    #[test]
    fn encode_restricts_to_enabled_fields() {
        let category = category(
            "CODE",
            FieldSet {
                date: false,
                time: false,
                author: true,
            },
        );
        let header = generate_header(&category);
        let messages = vec![message("print('hi')", "Ana", "10:00:00", "01/01/2024")];

        let text = encode(&header, &category, &messages);

        assert!(text.contains("- **AUTOR:** Ana"));
        assert!(text.contains("```\nprint('hi')\n```"));
        assert!(!text.contains("- **FECHA:**"));
        assert!(!text.contains("- **HORA:**"));
    }

    #[test]
    fn empty_document_gets_placeholder() {
        let category = category("Code", FieldSet::default());
        let header = generate_header(&category);

        let text = encode(&header, &category, &[]);

        assert!(text.contains(EMPTY_PLACEHOLDER));
        let decoded = decode(&text);
        assert!(decoded.messages.is_empty());
    }

    #[test]
    fn newest_message_gets_highest_number() {
        let category = category("Code", FieldSet::default());
        let messages = vec![
            message("tercero", "Ana", "12:00:00", "01/01/2024"),
            message("segundo", "Ana", "11:00:00", "01/01/2024"),
            message("primero", "Ana", "10:00:00", "01/01/2024"),
        ];

        let text = encode(&generate_header(&category), &category, &messages);

        let pos3 = text.find("## Mensaje #3").unwrap();
        let pos2 = text.find("## Mensaje #2").unwrap();
        let pos1 = text.find("## Mensaje #1").unwrap();
        assert!(pos3 < pos2 && pos2 < pos1);
    }

    #[test]
    fn malformed_block_is_skipped_with_warning() {
        let raw = "**CATEGORIA:** Code\n\n**MENSAJES** (ordenados de más a menos reciente):\n\n\
                   ---\n\n## Mensaje #2\n- **FECHA:** 01/01/2024\n- **HORA:** 10:00:00\n\n\
                   **CONTENIDO:**\n\n```\nok\n```\n\n\
                   ---\n\n## Mensaje #1\nsin campos ni contenido\n";

        let decoded = decode(raw);

        assert_eq!(decoded.messages.len(), 1);
        assert_eq!(decoded.messages[0].content, "ok");
        assert_eq!(decoded.messages[0].sender, UNKNOWN_AUTHOR);
        assert_eq!(decoded.warnings.len(), 1);
    }

    #[test]
    fn impossible_date_falls_back_to_now_with_warning() {
        let raw = "**MENSAJES**\n\n---\n\n## Mensaje #1\n- **FECHA:** 99/99/9999\n- **HORA:** 10:00:00\n\n\
                   **CONTENIDO:**\n\n```\nhola\n```\n";

        let before = Utc::now().timestamp_millis();
        let decoded = decode(raw);

        assert_eq!(decoded.messages.len(), 1);
        assert!(decoded.messages[0].timestamp >= before);
        assert_eq!(decoded.warnings.len(), 1);
    }

    #[test]
    fn legacy_separator_boundary_still_decodes() {
        let raw = "# Code\n---\n\n## Mensaje #1\n- **FECHA:** 01/01/2024\n- **HORA:** 10:00:00\n- **AUTOR:** Ana\n\n\
                   **CONTENIDO:**\n\n```\nhola\n```\n";

        let decoded = decode(raw);

        assert_eq!(decoded.header, "# Code\n---\n\n");
        assert_eq!(decoded.messages.len(), 1);
        assert_eq!(decoded.messages[0].sender, "Ana");
    }

    #[test]
    fn document_without_boundary_is_all_header() {
        let decoded = decode("solo texto libre\nsin marcador\n");
        assert_eq!(decoded.header, "solo texto libre\nsin marcador\n");
        assert!(decoded.messages.is_empty());
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn timestamp_components_default_to_zero() {
        let with_seconds = parse_timestamp("10:30:15", "01/01/2024").unwrap();
        let hour_only = parse_timestamp("10", "01/01/2024").unwrap();
        assert!(with_seconds > hour_only);
        assert!(parse_timestamp("10:00:00", "01/2024").is_none());
        assert!(parse_timestamp("10:00:00", "aa/bb/cccc").is_none());
    }

    #[test]
    fn multiline_content_preserves_inner_formatting() {
        let category = category("Code", FieldSet::default());
        let body = "fn main() {\n    println!(\"hi\");\n}";
        let messages = vec![message(body, "Ana", "10:00:00", "01/01/2024")];

        let decoded = decode(&encode(&generate_header(&category), &category, &messages));

        assert_eq!(decoded.messages[0].content, body);
    }
}
