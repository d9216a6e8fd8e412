//! Re-openable input documents.
//!
//! The pipeline reads the ABBYY document more than once (schema, styles,
//! pages), so inputs are described rather than held as a single reader.
//! gzip-compressed inputs are decompressed on every pass.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::bufread::MultiGzDecoder;

use crate::detect::is_gzip;
use crate::error::{Error, Result};

/// An input document that can be opened repeatedly.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    name: String,
    origin: Origin,
}

#[derive(Debug, Clone)]
enum Origin {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl SourceDocument {
    /// Describe a file on disk. Fails if the file does not exist.
    pub fn from_path<P: AsRef<Path>>(kind: &str, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingInput {
                document: kind.to_string(),
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            name: format!("{} document '{}'", kind, path.display()),
            origin: Origin::Path(path.to_path_buf()),
        })
    }

    /// Wrap an in-memory document.
    pub fn from_bytes(kind: &str, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: format!("{} document (in memory)", kind),
            origin: Origin::Bytes(data.into()),
        }
    }

    /// Human-readable description used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open a fresh buffered reader positioned at the start of the document.
    pub fn open(&self) -> Result<Box<dyn BufRead + '_>> {
        match &self.origin {
            Origin::Path(path) => {
                let mut reader = BufReader::new(File::open(path)?);
                if is_gzip(reader.fill_buf()?) {
                    Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
                } else {
                    Ok(Box::new(reader))
                }
            }
            Origin::Bytes(data) => {
                let data: &[u8] = data;
                if is_gzip(data) {
                    Ok(Box::new(BufReader::new(MultiGzDecoder::new(data))))
                } else {
                    Ok(Box::new(data))
                }
            }
        }
    }
}
