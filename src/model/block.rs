//! Flattened content blocks.

use super::{Role, StyleRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Raw attributes of a table `<block>`, shared by every part of the table.
pub type BlockAttributes = BTreeMap<String, String>;

/// One unit of the flat, reading-ordered output sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A paragraph of text
    Text(TextBlock),

    /// A picture region
    Picture(PictureBlock),

    /// Opens a table
    Table {
        /// Page number
        page_no: u32,
        /// Table block attributes
        style: Arc<BlockAttributes>,
        /// Last block on its page
        is_last_in_parent: bool,
    },

    /// Opens a table row
    TableRow {
        /// Page number
        page_no: u32,
        /// Table block attributes
        style: Arc<BlockAttributes>,
        /// Last row of its table
        is_last_in_parent: bool,
    },

    /// Opens a table cell
    TableCell {
        /// Page number
        page_no: u32,
        /// Table block attributes
        style: Arc<BlockAttributes>,
        /// Last cell of its row
        is_last_in_parent: bool,
    },

    /// A paragraph inside a table cell
    TableText {
        /// Page number
        page_no: u32,
        /// Table block attributes
        style: Arc<BlockAttributes>,
        /// Paragraph text (empty for a placeholder)
        text: String,
        /// Last paragraph of its cell
        is_last_in_parent: bool,
    },

    /// Emitted once at the end of every page with blocks
    PageMarker {
        /// Page number
        page_no: u32,
    },

    /// Chapter-boundary signal derived from the page-type index
    SectionBreak {
        /// First page of the new section
        page_no: u32,
    },

    /// Separator block; never rendered
    Separator {
        /// Page number
        page_no: u32,
    },

    /// Block of a type this crate does not interpret
    Unrecognized {
        /// Page number
        page_no: u32,
        /// The declared `blockType`, if any
        block_type: Option<String>,
    },
}

impl ContentBlock {
    /// Page this block's content belongs to.
    ///
    /// Page markers and section breaks are anchors between pages and report
    /// `None`; the last-text backtracking stops on them.
    pub fn content_page(&self) -> Option<u32> {
        match self {
            ContentBlock::Text(t) => Some(t.page_no),
            ContentBlock::Picture(p) => Some(p.page_no),
            ContentBlock::Table { page_no, .. }
            | ContentBlock::TableRow { page_no, .. }
            | ContentBlock::TableCell { page_no, .. }
            | ContentBlock::TableText { page_no, .. }
            | ContentBlock::Separator { page_no }
            | ContentBlock::Unrecognized { page_no, .. } => Some(*page_no),
            ContentBlock::PageMarker { .. } | ContentBlock::SectionBreak { .. } => None,
        }
    }

    /// Page number of any block, anchors included.
    pub fn page_no(&self) -> u32 {
        match self {
            ContentBlock::PageMarker { page_no } | ContentBlock::SectionBreak { page_no } => {
                *page_no
            }
            other => other.content_page().unwrap_or_default(),
        }
    }

    /// Get the text block, if this is one.
    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            ContentBlock::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Check if this block is part of a table.
    pub fn is_table_part(&self) -> bool {
        matches!(
            self,
            ContentBlock::Table { .. }
                | ContentBlock::TableRow { .. }
                | ContentBlock::TableCell { .. }
                | ContentBlock::TableText { .. }
        )
    }

    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentBlock::Text(_) => "text",
            ContentBlock::Picture(_) => "picture",
            ContentBlock::Table { .. } => "table",
            ContentBlock::TableRow { .. } => "table_row",
            ContentBlock::TableCell { .. } => "table_cell",
            ContentBlock::TableText { .. } => "table_text",
            ContentBlock::PageMarker { .. } => "page_marker",
            ContentBlock::SectionBreak { .. } => "section_break",
            ContentBlock::Separator { .. } => "separator",
            ContentBlock::Unrecognized { .. } => "unrecognized",
        }
    }
}

/// A paragraph of body text, heading, footnote, caption or contents entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Page number
    pub page_no: u32,
    /// Joined paragraph text
    pub text: String,
    /// Role from the paragraph style
    pub role: Role,
    /// Resolved paragraph style
    pub style: Arc<StyleRecord>,
    /// First text on its page
    pub is_first_on_page: bool,
    /// Last text on its page
    pub is_last_on_page: bool,
    /// Heading level, for headings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,
    /// Set by the running-element detector
    #[serde(default)]
    pub suppressed: bool,
}

impl TextBlock {
    /// Create a body-text block with the empty style.
    pub fn new(page_no: u32, text: impl Into<String>) -> Self {
        Self {
            page_no,
            text: text.into(),
            role: Role::Text,
            style: Arc::new(StyleRecord::default()),
            is_first_on_page: false,
            is_last_on_page: false,
            heading_level: None,
            suppressed: false,
        }
    }

    /// Level-1 headings start a new chapter.
    pub fn starts_chapter(&self) -> bool {
        self.role.is_heading() && self.heading_level.unwrap_or(1) <= 1
    }
}

/// Pixel bounding box on the scanned page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge
    pub left: i64,
    /// Top edge
    pub top: i64,
    /// Right edge
    pub right: i64,
    /// Bottom edge
    pub bottom: i64,
}

impl Bounds {
    /// Create a bounding box.
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Box width.
    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    /// Box height.
    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }

    /// Check whether `self` lies within `other` (edges may touch).
    pub fn is_within(&self, other: &Bounds) -> bool {
        self.left >= other.left
            && self.top >= other.top
            && self.right <= other.right
            && self.bottom <= other.bottom
    }
}

/// A picture region with the physical page size needed for scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PictureBlock {
    /// Page number
    pub page_no: u32,
    /// Pixel bounding box
    pub bounds: Bounds,
    /// Declared page width
    pub page_width: u32,
    /// Declared page height
    pub page_height: u32,
}

impl PictureBlock {
    /// Width as a percentage of the page width.
    pub fn width_percent(&self) -> f64 {
        if self.page_width == 0 {
            return 100.0;
        }
        self.bounds.width() as f64 / self.page_width as f64 * 100.0
    }
}
