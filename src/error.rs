//! Error types for unabbyy library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for unabbyy operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Document label used before an error has been attributed to an input.
pub(crate) const UNKNOWN_DOCUMENT: &str = "<unknown>";

/// Fatal errors that abort a conversion.
///
/// Recoverable conditions (unresolved style ids, unknown block types, bad
/// picture bounds, undecodable Roman numerals) are logged and never surface
/// here.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required input document does not exist.
    #[error("Missing {document} document: {}", path.display())]
    MissingInput {
        /// Which input (e.g. "ABBYY", "metadata", "scandata")
        document: String,
        /// Path that was looked up
        path: PathBuf,
    },

    /// The root element does not declare a supported FineReader namespace.
    #[error("Unsupported schema in {document}: {found}")]
    UnsupportedSchema {
        /// Which input
        document: String,
        /// The namespaces that were found instead
        found: String,
    },

    /// The XML is malformed.
    #[error("XML parsing error in {document}: {message}")]
    Xml {
        /// Which input
        document: String,
        /// Parser message
        message: String,
    },

    /// The document ended inside an open element.
    #[error("Unexpected end of {document} inside an open element")]
    UnexpectedEof {
        /// Which input
        document: String,
    },

    /// Error during rendering (Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Attribute an XML-level error to a named input document.
    pub fn in_document(self, document: &str) -> Self {
        match self {
            Error::Xml { message, .. } => Error::Xml {
                document: document.to_string(),
                message,
            },
            Error::UnsupportedSchema { found, .. } => Error::UnsupportedSchema {
                document: document.to_string(),
                found,
            },
            Error::UnexpectedEof { .. } => Error::UnexpectedEof {
                document: document.to_string(),
            },
            other => other,
        }
    }

    /// Check if this error came from malformed XML.
    pub fn is_xml(&self) -> bool {
        matches!(self, Error::Xml { .. } | Error::UnexpectedEof { .. })
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(e) => Error::Io(io::Error::new(e.kind(), e.to_string())),
            _ => Error::Xml {
                document: UNKNOWN_DOCUMENT.to_string(),
                message: err.to_string(),
            },
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml {
            document: UNKNOWN_DOCUMENT.to_string(),
            message: err.to_string(),
        }
    }
}
