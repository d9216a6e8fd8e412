//! ABBYY parsing module.

mod abbyy_parser;
mod dialect;
mod flatten;
mod metadata;
mod options;
mod page_stream;
mod scandata;
mod source;
mod styles;
mod text;

pub use abbyy_parser::AbbyyParser;
pub use dialect::{BlockKind, Dialect};
pub use flatten::{contained_pictures, mark_last_text, BlockFlattener};
pub use metadata::{normalize_language_code, read_metadata, DEFAULT_LANGUAGE};
pub use options::ParseOptions;
pub use page_stream::{for_each_page, Element, NodeLedger, PageArena, PageRecord, PageStream};
pub use scandata::read_page_types;
pub use source::SourceDocument;
pub use styles::resolve_styles;
pub use text::{join_lines, TextCleaner};
