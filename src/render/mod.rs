//! Reference renderers that re-walk the flat block sequence.

mod events;
mod json;
mod markdown;
mod options;
mod text;

pub use events::{EventStream, RenderEvent, TableGrid};
pub use json::{to_json, to_json_with_findings, JsonFormat};
pub use markdown::{to_markdown, MarkdownRenderer};
pub use options::RenderOptions;
pub use text::to_text;
