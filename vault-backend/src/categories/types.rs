use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Separator used when a category is created without one (or with an
/// invalid one).
pub const DEFAULT_SEPARATOR: &str = ",,";

/// A display field that can be rendered into a category's markdown
/// document. Serialized with the labels used by the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum CategoryField {
    #[serde(rename = "FECHA")]
    #[strum(serialize = "FECHA")]
    Date,
    #[serde(rename = "HORA")]
    #[strum(serialize = "HORA")]
    Time,
    #[serde(rename = "AUTOR")]
    #[strum(serialize = "AUTOR")]
    Author,
    #[serde(rename = "CONTENIDO")]
    #[strum(serialize = "CONTENIDO")]
    Content,
}

/// Set of fields enabled for a category.
///
/// Content is not carried here: it is structurally always enabled, so a
/// definition can never be persisted without it. On the wire the set is a
/// JSON array of field labels (always including `CONTENIDO`), matching the
/// registry file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CategoryField>", into = "Vec<CategoryField>")]
pub struct FieldSet {
    pub date: bool,
    pub time: bool,
    pub author: bool,
}

impl FieldSet {
    pub fn contains(&self, field: CategoryField) -> bool {
        match field {
            CategoryField::Date => self.date,
            CategoryField::Time => self.time,
            CategoryField::Author => self.author,
            CategoryField::Content => true,
        }
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self {
            date: true,
            time: true,
            author: true,
        }
    }
}

impl From<Vec<CategoryField>> for FieldSet {
    fn from(fields: Vec<CategoryField>) -> Self {
        Self {
            date: fields.contains(&CategoryField::Date),
            time: fields.contains(&CategoryField::Time),
            author: fields.contains(&CategoryField::Author),
        }
    }
}

impl From<FieldSet> for Vec<CategoryField> {
    fn from(set: FieldSet) -> Self {
        let mut fields = Vec::new();
        if set.date {
            fields.push(CategoryField::Date);
        }
        if set.time {
            fields.push(CategoryField::Time);
        }
        if set.author {
            fields.push(CategoryField::Author);
        }
        fields.push(CategoryField::Content);
        fields
    }
}

/// A user-defined category: a detection separator plus the fields rendered
/// into its markdown document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDefinition {
    /// Display name, case-preserved.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled_fields: FieldSet,
    #[serde(default = "default_separator")]
    pub separator: String,
    pub created_at: DateTime<Utc>,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

impl CategoryDefinition {
    /// Lowercased name; unique within the registry.
    pub fn normalized_key(&self) -> String {
        self.name.to_lowercase()
    }

    /// Relative path of this category's markdown document in the vault.
    pub fn markdown_path(&self) -> String {
        format!("categories/{}.md", self.normalized_key())
    }
}

/// A message matched to a category, ready to be merged into its document.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizedMessage {
    pub content: String,
    pub sender: String,
    /// `HH:MM:SS`
    pub time: String,
    /// `DD/MM/YYYY`
    pub date: String,
    /// Epoch milliseconds derived from `date` + `time`; ordering only, not
    /// round-tripped through the document.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_set_serializes_to_labels_with_content() {
        let set = FieldSet {
            date: false,
            time: false,
            author: true,
        };
        let value = serde_json::to_value(set).unwrap();
        assert_eq!(value, json!(["AUTOR", "CONTENIDO"]));
    }

    #[test]
    fn field_set_deserializes_without_content_label() {
        let set: FieldSet = serde_json::from_value(json!(["FECHA"])).unwrap();
        assert!(set.date);
        assert!(!set.time);
        assert!(!set.author);
        assert!(set.contains(CategoryField::Content));
    }

    #[test]
    fn markdown_path_uses_normalized_key() {
        let category = CategoryDefinition {
            name: "Code".to_string(),
            description: None,
            enabled_fields: FieldSet::default(),
            separator: DEFAULT_SEPARATOR.to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(category.markdown_path(), "categories/code.md");
    }

    #[test]
    fn definition_without_separator_gets_default_on_load() {
        let value = json!({
            "name": "Notas",
            "enabledFields": ["AUTOR", "CONTENIDO"],
            "createdAt": "2024-01-01T00:00:00Z"
        });
        let category: CategoryDefinition = serde_json::from_value(value).unwrap();
        assert_eq!(category.separator, DEFAULT_SEPARATOR);
    }
}
