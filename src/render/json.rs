//! JSON rendering for flat documents.

use serde::Serialize;

use crate::analyze::RunningElements;
use crate::error::{Error, Result};
use crate::model::FlatDocument;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document to JSON.
pub fn to_json(doc: &FlatDocument, format: JsonFormat) -> Result<String> {
    serialize(doc, format)
}

/// Convert a document and its running-element findings to one JSON object
/// with `document` and `running_elements` keys.
pub fn to_json_with_findings(
    doc: &FlatDocument,
    running: &RunningElements,
    format: JsonFormat,
) -> Result<String> {
    #[derive(Serialize)]
    struct Output<'a> {
        document: &'a FlatDocument,
        running_elements: &'a RunningElements,
    }

    serialize(
        &Output {
            document: doc,
            running_elements: running,
        },
        format,
    )
}

fn serialize<T: Serialize>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
