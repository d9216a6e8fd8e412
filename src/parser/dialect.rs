//! Tag-name tables for the two FineReader dialects.
//!
//! The dialect is resolved once by [`crate::detect`] and threaded through the
//! style resolver, page decomposer and flattener, so no stage compares
//! namespace URIs per element.

/// Element and attribute names for one FineReader schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    /// Page element
    pub page: &'static [u8],
    /// Block element (child of page)
    pub block: &'static [u8],
    /// Paragraph element
    pub par: &'static [u8],
    /// Line element (child of par)
    pub line: &'static [u8],
    /// Table row element
    pub row: &'static [u8],
    /// Table cell element
    pub cell: &'static [u8],
    /// Per-character element; its attributes are never needed
    pub char_params: &'static [u8],
    /// Paragraph style definition
    pub paragraph_style: &'static [u8],
    /// Font style definition
    pub font_style: &'static [u8],
    /// Attribute naming the block type
    pub block_type_attr: &'static str,
    /// Attribute on `par` referencing its paragraph style
    pub style_attr: &'static str,
    /// Whether paragraph styles and roles exist in this dialect
    pub has_paragraph_styles: bool,
    /// Block types that are separators
    pub separator_types: &'static [&'static str],
}

impl Dialect {
    /// FineReader 10.
    pub const FINEREADER10: Dialect = Dialect {
        page: b"page",
        block: b"block",
        par: b"par",
        line: b"line",
        row: b"row",
        cell: b"cell",
        char_params: b"charParams",
        paragraph_style: b"paragraphStyle",
        font_style: b"fontStyle",
        block_type_attr: "blockType",
        style_attr: "style",
        has_paragraph_styles: true,
        separator_types: &["Separator", "SeparatorsBox"],
    };

    /// FineReader 6. Structurally the same tree, but paragraphs carry no
    /// style references.
    pub const FINEREADER6: Dialect = Dialect {
        page: b"page",
        block: b"block",
        par: b"par",
        line: b"line",
        row: b"row",
        cell: b"cell",
        char_params: b"charParams",
        paragraph_style: b"paragraphStyle",
        font_style: b"fontStyle",
        block_type_attr: "blockType",
        style_attr: "style",
        has_paragraph_styles: false,
        separator_types: &["Separator", "SeparatorsBox"],
    };

    /// Classify a `blockType` attribute value.
    pub fn block_kind(&self, block_type: Option<&str>) -> BlockKind {
        match block_type {
            Some("Text") => BlockKind::Text,
            Some("Table") => BlockKind::Table,
            Some("Picture") => BlockKind::Picture,
            Some(t) if self.separator_types.contains(&t) => BlockKind::Separator,
            _ => BlockKind::Unrecognized,
        }
    }
}

/// Declared type of a `<block>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Text block holding paragraphs
    Text,
    /// Table block holding rows and cells
    Table,
    /// Picture block
    Picture,
    /// Separator line or box
    Separator,
    /// Anything else (barcodes, checkmarks, undocumented types)
    Unrecognized,
}
