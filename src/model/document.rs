//! Document-level types.

use super::{ContentBlock, PictureBlock};
use crate::detect::SchemaVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The finished output of a parse: the flat block sequence plus the
/// side tables handed to renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatDocument {
    /// Detected FineReader dialect
    pub schema: SchemaVersion,

    /// Content blocks in reading order
    pub blocks: Vec<ContentBlock>,

    /// Metadata from the auxiliary metadata document
    pub metadata: Metadata,

    /// Pictures kept in the flat stream, by page
    pub pictures_by_page: PicturesByPage,

    /// Number of `<page>` elements seen, calibration page included
    pub page_count: u32,

    /// Number of paragraph styles resolved
    pub style_count: usize,
}

impl FlatDocument {
    /// Create an empty document for a schema.
    pub fn new(schema: SchemaVersion) -> Self {
        Self {
            schema,
            blocks: Vec::new(),
            metadata: Metadata::default(),
            pictures_by_page: PicturesByPage::default(),
            page_count: 0,
            style_count: 0,
        }
    }

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Check if the document produced no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate text blocks.
    pub fn text_blocks(&self) -> impl Iterator<Item = &super::TextBlock> {
        self.blocks.iter().filter_map(ContentBlock::as_text)
    }

    /// Blocks belonging to one page, anchors excluded.
    pub fn page_blocks(&self, page_no: u32) -> impl Iterator<Item = &ContentBlock> {
        self.blocks
            .iter()
            .filter(move |b| b.content_page() == Some(page_no))
    }

    /// Plain text of all text blocks that are not suppressed.
    pub fn plain_text(&self) -> String {
        self.text_blocks()
            .filter(|t| !t.suppressed)
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Count blocks by variant name.
    pub fn block_stats(&self) -> BTreeMap<&'static str, usize> {
        let mut stats = BTreeMap::new();
        for block in &self.blocks {
            *stats.entry(block.kind()).or_insert(0) += 1;
        }
        stats
    }
}

/// Multi-valued, string-keyed document metadata.
///
/// Keys and values are taken verbatim from the metadata document; repeated
/// keys accumulate values in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: BTreeMap<String, Vec<String>>,
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under a key.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .entry(key.into())
            .or_default()
            .push(value.into());
    }

    /// Replace all values of a key.
    pub fn set(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.entries.insert(key.into(), values);
    }

    /// All values of a key.
    pub fn get(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value of a key.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).first().map(String::as_str)
    }

    /// Check whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Document title.
    pub fn title(&self) -> Option<&str> {
        self.first("title")
    }

    /// Primary language code.
    pub fn language(&self) -> Option<&str> {
        self.first("language")
    }

    /// Iterate all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no metadata was read.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Generate YAML frontmatter.
    pub fn to_yaml_frontmatter(&self) -> String {
        let mut yaml = String::from("---\n");
        for (key, values) in self.iter() {
            match values {
                [] => {}
                [single] => {
                    yaml.push_str(&format!("{}: \"{}\"\n", key, escape_yaml(single)));
                }
                many => {
                    yaml.push_str(&format!("{}:\n", key));
                    for value in many {
                        yaml.push_str(&format!("  - \"{}\"\n", escape_yaml(value)));
                    }
                }
            }
        }
        yaml.push_str("---\n");
        yaml
    }
}

fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Pictures kept in the flat stream, indexed by page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PicturesByPage {
    pages: BTreeMap<u32, Vec<PictureBlock>>,
}

impl PicturesByPage {
    /// Record a picture.
    pub fn insert(&mut self, picture: PictureBlock) {
        self.pages.entry(picture.page_no).or_default().push(picture);
    }

    /// Pictures on a page.
    pub fn on_page(&self, page_no: u32) -> &[PictureBlock] {
        self.pages.get(&page_no).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of pictures.
    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    /// Check if no pictures were kept.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Page numbers that have pictures.
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }
}
