//! Paragraph and font style definitions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Classification attached to a paragraph style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Body text (`text`)
    #[default]
    Text,
    /// Heading (`heading`); the level comes from `roleLevel`
    Heading,
    /// Footnote (`footnote`)
    Footnote,
    /// Running header or footer marked up by the OCR engine (`rt`)
    RunningTitle,
    /// Table caption (`tableCaption`)
    TableCaption,
    /// Table of contents entry (`contents`)
    Contents,
    /// Any other role (`other`, or a value we do not know)
    Other,
    /// FineReader 6 documents carry no roles at all
    Unstructured,
}

impl Role {
    /// Parse an ABBYY `role` attribute value.
    pub fn from_abbyy(value: &str) -> Self {
        match value {
            "text" => Role::Text,
            "heading" => Role::Heading,
            "footnote" => Role::Footnote,
            "rt" => Role::RunningTitle,
            "tableCaption" => Role::TableCaption,
            "contents" => Role::Contents,
            _ => Role::Other,
        }
    }

    /// Check if the role is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, Role::Heading)
    }
}

/// A font style, referenced from a paragraph style by `mainFontStyleId`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FontStyleRecord {
    /// Style identifier
    pub id: String,
    /// Raw attributes
    pub attributes: BTreeMap<String, String>,
}

impl FontStyleRecord {
    /// Create a font style from its attributes.
    pub fn new(id: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// Font size in points (`fs`).
    pub fn size(&self) -> Option<f32> {
        self.attributes.get("fs").and_then(|v| v.parse().ok())
    }

    /// Font family (`ff`).
    pub fn family(&self) -> Option<&str> {
        self.attributes.get("ff").map(String::as_str)
    }

    /// Bold flag. ABBYY writes the attribute only when set.
    pub fn is_bold(&self) -> bool {
        flag(&self.attributes, "bold")
    }

    /// Italic flag.
    pub fn is_italic(&self) -> bool {
        flag(&self.attributes, "italic")
    }

    /// Whether the family looks like a serif face.
    pub fn is_serif(&self) -> bool {
        self.family()
            .map(|f| f.contains("Serif") || f.contains("Times"))
            .unwrap_or(false)
    }
}

fn flag(attributes: &BTreeMap<String, String>, name: &str) -> bool {
    match attributes.get(name).map(String::as_str) {
        Some("0") | Some("false") => false,
        Some(_) => true,
        None => false,
    }
}

/// A resolved paragraph style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleRecord {
    /// Style identifier (empty for the substitute style)
    pub id: String,
    /// Raw attributes (`name`, `role`, `roleLevel`, `align`, `lineSpacing`, ...)
    pub attributes: BTreeMap<String, String>,
    /// Main font style, linked via `mainFontStyleId`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<FontStyleRecord>,
}

impl StyleRecord {
    /// Create a style from its attributes.
    pub fn new(id: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        Self {
            id: id.into(),
            attributes,
            font: None,
        }
    }

    /// Get a raw attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Display name of the style.
    pub fn name(&self) -> Option<&str> {
        self.get("name")
    }

    /// Paragraph role; body text when unset.
    pub fn role(&self) -> Role {
        self.get("role").map(Role::from_abbyy).unwrap_or_default()
    }

    /// Role level (heading depth).
    pub fn role_level(&self) -> Option<u8> {
        self.get("roleLevel").and_then(|v| v.trim().parse().ok())
    }

    /// Paragraph alignment.
    pub fn alignment(&self) -> Option<&str> {
        self.get("align")
    }

    /// Referenced font style id.
    pub fn main_font_style_id(&self) -> Option<&str> {
        self.get("mainFontStyleId")
    }

    /// Check whether this is the empty substitute style.
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.attributes.is_empty() && self.font.is_none()
    }
}

/// Paragraph styles keyed by id. Immutable once resolved.
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    styles: HashMap<String, Arc<StyleRecord>>,
    empty: Arc<StyleRecord>,
}

impl StyleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from resolved records.
    pub fn from_records(records: impl IntoIterator<Item = StyleRecord>) -> Self {
        let styles = records
            .into_iter()
            .map(|r| (r.id.clone(), Arc::new(r)))
            .collect();
        Self {
            styles,
            empty: Arc::new(StyleRecord::default()),
        }
    }

    /// Get a style by id.
    pub fn get(&self, id: &str) -> Option<&Arc<StyleRecord>> {
        self.styles.get(id)
    }

    /// Get a style by id, substituting the shared empty style on a miss.
    pub fn lookup(&self, id: &str) -> Arc<StyleRecord> {
        self.styles
            .get(id)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.empty))
    }

    /// The shared empty style.
    pub fn empty_style(&self) -> Arc<StyleRecord> {
        Arc::clone(&self.empty)
    }

    /// Number of paragraph styles.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if no styles were found.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Snapshot of all records ordered by id.
    pub fn records(&self) -> BTreeMap<&str, &StyleRecord> {
        self.styles
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from_abbyy("heading"), Role::Heading);
        assert_eq!(Role::from_abbyy("rt"), Role::RunningTitle);
        assert_eq!(Role::from_abbyy("tableCaption"), Role::TableCaption);
        assert_eq!(Role::from_abbyy("mystery"), Role::Other);
    }

    #[test]
    fn test_style_accessors() {
        let style = StyleRecord::new(
            "{A}",
            attrs(&[("role", "heading"), ("roleLevel", "2"), ("align", "Center")]),
        );
        assert_eq!(style.role(), Role::Heading);
        assert_eq!(style.role_level(), Some(2));
        assert_eq!(style.alignment(), Some("Center"));
    }

    #[test]
    fn test_empty_style_defaults() {
        let style = StyleRecord::default();
        assert!(style.is_empty());
        assert_eq!(style.role(), Role::Text);
        assert_eq!(style.role_level(), None);
    }

    #[test]
    fn test_font_flags() {
        let font = FontStyleRecord::new(
            "{F}",
            attrs(&[("ff", "Times New Roman"), ("fs", "12."), ("bold", "1")]),
        );
        assert!(font.is_bold());
        assert!(!font.is_italic());
        assert!(font.is_serif());
        assert_eq!(font.size(), Some(12.0));
    }

    #[test]
    fn test_lookup_miss_returns_shared_empty() {
        let table = StyleTable::from_records(vec![StyleRecord::new("{A}", attrs(&[]))]);
        assert!(table.get("{A}").is_some());

        let missing = table.lookup("{Z}");
        assert!(missing.is_empty());
        assert!(Arc::ptr_eq(&missing, &table.empty_style()));
    }
}
