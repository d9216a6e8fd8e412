//! Parsing options and configuration.

use std::path::PathBuf;
use std::sync::Arc;

use super::NodeLedger;
use crate::model::PageTypeIndex;

/// Options for parsing ABBYY documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Metadata document on disk; missing file is fatal
    pub metadata_file: Option<PathBuf>,

    /// In-memory metadata document (takes precedence over `metadata_file`)
    pub metadata_bytes: Option<Arc<[u8]>>,

    /// Page classifications from the scan description
    pub page_types: Option<PageTypeIndex>,

    /// Append a page marker after every page with content
    pub emit_page_markers: bool,

    /// NFC-normalize text and expand ligatures
    pub normalize_unicode: bool,

    /// Drop the picture of the first content page and of cover pages
    pub suppress_cover_picture: bool,

    /// Count materialized page nodes (diagnostics and tests)
    pub node_ledger: Option<NodeLedger>,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read metadata from a file.
    pub fn with_metadata_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_file = Some(path.into());
        self
    }

    /// Read metadata from memory.
    pub fn with_metadata_bytes(mut self, data: impl Into<Arc<[u8]>>) -> Self {
        self.metadata_bytes = Some(data.into());
        self
    }

    /// Set the page-type index.
    pub fn with_page_types(mut self, page_types: PageTypeIndex) -> Self {
        self.page_types = Some(page_types);
        self
    }

    /// Enable or disable page markers.
    pub fn with_page_markers(mut self, emit: bool) -> Self {
        self.emit_page_markers = emit;
        self
    }

    /// Enable or disable Unicode cleanup.
    pub fn with_unicode_normalization(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }

    /// Keep cover pictures in the flat stream.
    pub fn keep_cover_picture(mut self) -> Self {
        self.suppress_cover_picture = false;
        self
    }

    /// Attach a node ledger.
    pub fn with_node_ledger(mut self, ledger: NodeLedger) -> Self {
        self.node_ledger = Some(ledger);
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            metadata_file: None,
            metadata_bytes: None,
            page_types: None,
            emit_page_markers: true,
            normalize_unicode: true,
            suppress_cover_picture: true,
            node_ledger: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .with_metadata_file("book_meta.xml")
            .with_page_markers(false)
            .with_unicode_normalization(false)
            .keep_cover_picture();

        assert_eq!(options.metadata_file, Some(PathBuf::from("book_meta.xml")));
        assert!(!options.emit_page_markers);
        assert!(!options.normalize_unicode);
        assert!(!options.suppress_cover_picture);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert!(options.emit_page_markers);
        assert!(options.normalize_unicode);
        assert!(options.suppress_cover_picture);
        assert!(options.page_types.is_none());
        assert!(options.node_ledger.is_none());
    }
}
