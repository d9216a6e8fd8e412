//! Plain text rendering for flat documents.

use crate::analyze::RunningElements;
use crate::error::Result;
use crate::model::FlatDocument;

use super::{EventStream, RenderEvent, RenderOptions};

/// Convert a document to plain text.
///
/// Pictures are dropped and table cells are separated by tabs. Page markers,
/// when enabled, become form feeds.
pub fn to_text(
    doc: &FlatDocument,
    running: Option<&RunningElements>,
    options: &RenderOptions,
) -> Result<String> {
    let mut output = String::new();

    for event in EventStream::new(doc, running, options) {
        match event {
            RenderEvent::Heading { text, .. } | RenderEvent::Paragraph { text, .. } => {
                output.push_str(text);
                output.push_str("\n\n");
            }
            RenderEvent::Table(grid) => {
                for row in &grid.rows {
                    let cells: Vec<String> = row.iter().map(|c| c.replace('\n', " ")).collect();
                    output.push_str(&cells.join("\t"));
                    output.push('\n');
                }
                output.push('\n');
            }
            RenderEvent::Footnotes(notes) => {
                for note in notes {
                    output.push_str(note);
                    output.push_str("\n\n");
                }
            }
            RenderEvent::PageEnd { .. } if options.include_page_markers => {
                output.push_str("\u{c}\n");
            }
            RenderEvent::PageEnd { .. }
            | RenderEvent::ChapterStart { .. }
            | RenderEvent::Picture(_) => {}
        }
    }

    Ok(output.trim().to_string())
}
