//! ABBYY document parser: the pipeline driver.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::detect::{detect_schema_from_source, SchemaVersion};
use crate::error::Result;
use crate::model::{ContentBlock, FlatDocument};

use super::flatten::BlockFlattener;
use super::metadata::read_metadata;
use super::options::ParseOptions;
use super::page_stream::for_each_page;
use super::source::SourceDocument;
use super::styles::resolve_styles;

/// ABBYY FineReader document parser.
///
/// Runs schema detection, style resolution and page flattening in that
/// order, each as its own streaming pass over the input.
pub struct AbbyyParser {
    source: SourceDocument,
    options: ParseOptions,
}

impl AbbyyParser {
    /// Open an ABBYY file (plain or gzip).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open an ABBYY file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let source = SourceDocument::from_path("ABBYY", path)?;
        Ok(Self { source, options })
    }

    /// Parse an ABBYY document from bytes.
    pub fn from_bytes(data: impl Into<Arc<[u8]>>) -> Self {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse an ABBYY document from bytes with custom options.
    pub fn from_bytes_with_options(data: impl Into<Arc<[u8]>>, options: ParseOptions) -> Self {
        Self {
            source: SourceDocument::from_bytes("ABBYY", data),
            options,
        }
    }

    /// Parse an ABBYY document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    /// Parse an ABBYY document from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::from_bytes_with_options(data, options))
    }

    /// The parse options.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Detect the schema without parsing.
    pub fn schema(&self) -> Result<SchemaVersion> {
        detect_schema_from_source(&self.source)
    }

    /// Parse the document into a flat block sequence.
    pub fn parse(&self) -> Result<FlatDocument> {
        let schema = self.schema()?;
        let dialect = schema.dialect();
        log::debug!("Parsing {} as {}", self.source.name(), schema);

        let styles = if dialect.has_paragraph_styles {
            resolve_styles(&self.source, dialect)?
        } else {
            Default::default()
        };

        let mut document = FlatDocument::new(schema);
        document.style_count = styles.len();
        document.metadata = self.read_metadata()?;
        document
            .metadata
            .set("fr-version", vec![schema.label().to_string()]);

        let mut blocks: Vec<ContentBlock> = Vec::new();
        let mut flattener = BlockFlattener::new(&styles, dialect, &self.options);
        document.page_count = for_each_page(
            &self.source,
            dialect,
            self.options.node_ledger.clone(),
            |page| {
                flattener.flatten_page(page, &mut blocks);
                Ok(())
            },
        )?;

        document.pictures_by_page = flattener.into_pictures();
        document.blocks = blocks;
        log::debug!(
            "Flattened {} pages into {} blocks",
            document.page_count,
            document.blocks.len()
        );
        Ok(document)
    }

    fn read_metadata(&self) -> Result<crate::model::Metadata> {
        let source = if let Some(data) = &self.options.metadata_bytes {
            SourceDocument::from_bytes("metadata", Arc::clone(data))
        } else if let Some(path) = &self.options.metadata_file {
            SourceDocument::from_path("metadata", path)?
        } else {
            return Ok(Default::default());
        };
        read_metadata(&source)
    }
}
