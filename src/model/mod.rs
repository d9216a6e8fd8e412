//! Document model types for flattened ABBYY content.
//!
//! This module defines the intermediate representation that bridges the
//! streaming parser and downstream renderers: the flat [`ContentBlock`]
//! sequence, resolved styles, metadata and page classifications.

mod block;
mod document;
mod page_type;
mod style;

pub use block::{BlockAttributes, Bounds, ContentBlock, PictureBlock, TextBlock};
pub use document::{FlatDocument, Metadata, PicturesByPage};
pub use page_type::{PageType, PageTypeIndex};
pub use style::{FontStyleRecord, Role, StyleRecord, StyleTable};
