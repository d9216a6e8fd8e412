//! Scanner page classifications.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classification of a scanned leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageType {
    /// Ordinary content page
    Normal,
    /// Book cover
    Cover,
    /// Title page
    Title,
    /// Copyright page
    Copyright,
    /// Table of contents
    Contents,
    /// Colour calibration card
    ColorCard,
    /// White balance card
    WhiteCard,
    /// Leaf marked for deletion
    Delete,
    /// Any other label, verbatim
    Other(String),
}

impl PageType {
    /// Parse a scandata `pageType` label.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Normal" => PageType::Normal,
            "Cover" => PageType::Cover,
            "Title" | "Title Page" => PageType::Title,
            "Copyright" => PageType::Copyright,
            "Contents" => PageType::Contents,
            "Color Card" => PageType::ColorCard,
            "White Card" => PageType::WhiteCard,
            "Delete" => PageType::Delete,
            other => PageType::Other(other.to_string()),
        }
    }

    /// Pages that carry no book content at all.
    pub fn is_non_content(&self) -> bool {
        matches!(
            self,
            PageType::ColorCard | PageType::WhiteCard | PageType::Delete
        )
    }

    /// Front matter that precedes the body.
    pub fn is_front_matter(&self) -> bool {
        matches!(
            self,
            PageType::Cover | PageType::Title | PageType::Copyright | PageType::Contents
        )
    }

    /// Check for the cover.
    pub fn is_cover(&self) -> bool {
        matches!(self, PageType::Cover)
    }
}

/// Page number to page type lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageTypeIndex {
    pages: BTreeMap<u32, PageType>,
}

impl PageTypeIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a page type.
    pub fn insert(&mut self, page_no: u32, page_type: PageType) {
        self.pages.insert(page_no, page_type);
    }

    /// Look up a page.
    pub fn get(&self, page_no: u32) -> Option<&PageType> {
        self.pages.get(&page_no)
    }

    /// Number of classified pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromIterator<(u32, PageType)> for PageTypeIndex {
    fn from_iter<I: IntoIterator<Item = (u32, PageType)>>(iter: I) -> Self {
        Self {
            pages: iter.into_iter().collect(),
        }
    }
}
