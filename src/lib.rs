//! # unabbyy
//!
//! Streaming ABBYY FineReader XML parser for Rust.
//!
//! This library reads the per-page OCR output of ABBYY FineReader (version 6
//! or 10 schema) and flattens it into one reading-ordered sequence of typed
//! content blocks. A post-pass finds running headers, footers and page
//! numbers so renderers can leave them out.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unabbyy::{parse_file, render};
//!
//! fn main() -> unabbyy::Result<()> {
//!     let doc = parse_file("book_abbyy.xml")?;
//!
//!     let options = render::RenderOptions::default();
//!     let markdown = render::to_markdown(&doc, None, &options)?;
//!     println!("{}", markdown);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Streaming**: only the page being flattened is held in memory
//! - **Both dialects**: FineReader 6 and FineReader 10 namespaces
//! - **Gzip input**: `*_abbyy.gz` exports are decompressed on the fly
//! - **Running elements**: page numbers, headers and footers detected
//! - **Multiple output formats**: Markdown, plain text, JSON

pub mod analyze;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use analyze::{DetectorOptions, Placement, RunningElementDetector, RunningElements};
pub use detect::{detect_schema, detect_schema_from_bytes, detect_schema_from_path, SchemaVersion};
pub use error::{Error, Result};
pub use model::{
    Bounds, ContentBlock, FlatDocument, Metadata, PageType, PageTypeIndex, PictureBlock, Role,
    StyleRecord, StyleTable, TextBlock,
};
pub use parser::{AbbyyParser, ParseOptions};
pub use render::{JsonFormat, RenderOptions};

use std::io::Read;
use std::path::Path;

/// Parse an ABBYY file and return the flat document.
///
/// # Example
///
/// ```no_run
/// use unabbyy::parse_file;
///
/// let doc = parse_file("book_abbyy.xml").unwrap();
/// println!("Blocks: {}", doc.block_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<FlatDocument> {
    let parser = AbbyyParser::open(path)?;
    parser.parse()
}

/// Parse an ABBYY file with custom options.
///
/// # Example
///
/// ```no_run
/// use unabbyy::{parse_file_with_options, ParseOptions};
///
/// let options = ParseOptions::new()
///     .with_metadata_file("book_meta.xml")
///     .with_page_markers(false);
/// let doc = parse_file_with_options("book_abbyy.gz", options).unwrap();
/// ```
pub fn parse_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ParseOptions,
) -> Result<FlatDocument> {
    let parser = AbbyyParser::open_with_options(path, options)?;
    parser.parse()
}

/// Parse an ABBYY document from bytes.
pub fn parse_bytes(data: &[u8]) -> Result<FlatDocument> {
    AbbyyParser::from_bytes(data).parse()
}

/// Parse an ABBYY document from bytes with custom options.
pub fn parse_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<FlatDocument> {
    AbbyyParser::from_bytes_with_options(data, options).parse()
}

/// Parse an ABBYY document from a reader.
///
/// # Example
///
/// ```no_run
/// use unabbyy::parse_reader;
/// use std::fs::File;
///
/// let file = File::open("book_abbyy.xml").unwrap();
/// let doc = parse_reader(file).unwrap();
/// ```
pub fn parse_reader<R: Read>(reader: R) -> Result<FlatDocument> {
    let parser = AbbyyParser::from_reader(reader)?;
    parser.parse()
}

/// Parse an ABBYY document from a reader with custom options.
pub fn parse_reader_with_options<R: Read>(reader: R, options: ParseOptions) -> Result<FlatDocument> {
    let parser = AbbyyParser::from_reader_with_options(reader, options)?;
    parser.parse()
}

/// Run the running-element detector and flag the matching text blocks.
///
/// # Example
///
/// ```no_run
/// use unabbyy::{find_running_elements, parse_file, DetectorOptions};
///
/// let mut doc = parse_file("book_abbyy.xml").unwrap();
/// let running = find_running_elements(&mut doc, DetectorOptions::default());
/// println!("Page numbers at foot: {}", running.last.arabic_confirmed);
/// ```
pub fn find_running_elements(doc: &mut FlatDocument, options: DetectorOptions) -> RunningElements {
    let running = RunningElementDetector::new(options).detect(&doc.blocks);
    let flagged = running.annotate(&mut doc.blocks);
    log::debug!("Suppressed {} running-element lines", flagged);
    running
}

/// Extract plain text from an ABBYY file, without running elements.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    to_text(path, &RenderOptions::default())
}

/// Convert an ABBYY file to Markdown.
///
/// # Example
///
/// ```no_run
/// use unabbyy::to_markdown;
///
/// let markdown = to_markdown("book_abbyy.xml").unwrap();
/// std::fs::write("book.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    to_markdown_with_options(path, &RenderOptions::default())
}

/// Convert an ABBYY file to Markdown with custom options.
pub fn to_markdown_with_options<P: AsRef<Path>>(
    path: P,
    options: &RenderOptions,
) -> Result<String> {
    let mut doc = parse_file(path)?;
    let running = find_running_elements(&mut doc, DetectorOptions::default());
    render::to_markdown(&doc, Some(&running), options)
}

/// Convert an ABBYY file to plain text.
pub fn to_text<P: AsRef<Path>>(path: P, options: &RenderOptions) -> Result<String> {
    let mut doc = parse_file(path)?;
    let running = find_running_elements(&mut doc, DetectorOptions::default());
    render::to_text(&doc, Some(&running), options)
}

/// Convert an ABBYY file to JSON.
///
/// Running elements are detected first, so suppressed blocks carry
/// `"suppressed": true`.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let mut doc = parse_file(path)?;
    find_running_elements(&mut doc, DetectorOptions::default());
    render::to_json(&doc, format)
}

/// Builder for parsing and converting ABBYY documents.
///
/// # Example
///
/// ```no_run
/// use unabbyy::Unabbyy;
///
/// let markdown = Unabbyy::new()
///     .with_metadata_file("book_meta.xml")
///     .with_scandata_file("book_scandata.xml")?
///     .with_frontmatter()
///     .parse("book_abbyy.gz")?
///     .to_markdown()?;
/// # Ok::<(), unabbyy::Error>(())
/// ```
pub struct Unabbyy {
    parse_options: ParseOptions,
    detector_options: DetectorOptions,
    render_options: RenderOptions,
}

impl Unabbyy {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::default(),
            detector_options: DetectorOptions::default(),
            render_options: RenderOptions::default(),
        }
    }

    /// Read metadata from a file.
    pub fn with_metadata_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.parse_options = self.parse_options.with_metadata_file(path);
        self
    }

    /// Read page types from a scan-description file.
    pub fn with_scandata_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let page_types = PageTypeIndex::from_scandata_path(path)?;
        self.parse_options = self.parse_options.with_page_types(page_types);
        Ok(self)
    }

    /// Use an existing page-type index.
    pub fn with_page_types(mut self, page_types: PageTypeIndex) -> Self {
        self.parse_options = self.parse_options.with_page_types(page_types);
        self
    }

    /// Set the detector thresholds.
    pub fn with_detector(mut self, options: DetectorOptions) -> Self {
        self.detector_options = options;
        self
    }

    /// Keep running headers, footers and page numbers in the output.
    pub fn keep_running_elements(mut self) -> Self {
        self.render_options = self.render_options.with_running_elements(false);
        self
    }

    /// Enable frontmatter in output.
    pub fn with_frontmatter(mut self) -> Self {
        self.render_options = self.render_options.with_frontmatter(true);
        self
    }

    /// Mark page ends in output.
    pub fn with_page_markers(mut self) -> Self {
        self.render_options = self.render_options.with_page_markers(true);
        self
    }

    /// Parse an ABBYY file and return a result wrapper.
    pub fn parse<P: AsRef<Path>>(self, path: P) -> Result<UnabbyyResult> {
        let parser = AbbyyParser::open_with_options(path, self.parse_options)?;
        let document = parser.parse()?;
        Ok(UnabbyyResult::new(
            document,
            &self.detector_options,
            self.render_options,
        ))
    }

    /// Parse an ABBYY document from bytes.
    pub fn parse_bytes(self, data: &[u8]) -> Result<UnabbyyResult> {
        let document = AbbyyParser::from_bytes_with_options(data, self.parse_options).parse()?;
        Ok(UnabbyyResult::new(
            document,
            &self.detector_options,
            self.render_options,
        ))
    }
}

impl Default for Unabbyy {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of parsing an ABBYY document, with running elements detected.
pub struct UnabbyyResult {
    /// The parsed document
    pub document: FlatDocument,
    /// Running-element findings
    pub running: RunningElements,
    render_options: RenderOptions,
}

impl UnabbyyResult {
    fn new(
        mut document: FlatDocument,
        detector: &DetectorOptions,
        render_options: RenderOptions,
    ) -> Self {
        let running = find_running_elements(&mut document, detector.clone());
        Self {
            document,
            running,
            render_options,
        }
    }

    /// Convert to Markdown.
    pub fn to_markdown(&self) -> Result<String> {
        render::to_markdown(&self.document, Some(&self.running), &self.render_options)
    }

    /// Convert to plain text.
    pub fn to_text(&self) -> Result<String> {
        render::to_text(&self.document, Some(&self.running), &self.render_options)
    }

    /// Convert to JSON, findings included.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json_with_findings(&self.document, &self.running, format)
    }

    /// Text of all blocks that are not suppressed.
    pub fn plain_text(&self) -> String {
        self.document.plain_text()
    }

    /// Get the document.
    pub fn document(&self) -> &FlatDocument {
        &self.document
    }
}
