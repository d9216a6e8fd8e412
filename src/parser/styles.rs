//! Paragraph and font style resolution.
//!
//! Styles are declared once near the top of an ABBYY document and referenced
//! by id from every paragraph. Font styles usually appear as children of the
//! paragraph styles that use them, but the order is not guaranteed, so both
//! kinds are collected independently and linked afterwards.

use std::collections::{BTreeMap, HashMap};

use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;

use super::page_stream::collect_attributes;
use super::{Dialect, SourceDocument};
use crate::error::{Error, Result, UNKNOWN_DOCUMENT};
use crate::model::{FontStyleRecord, StyleRecord, StyleTable};

/// Build the style table for a document in one streaming pass.
///
/// Page subtrees are skipped without being materialized.
pub fn resolve_styles(source: &SourceDocument, dialect: &Dialect) -> Result<StyleTable> {
    let (paragraphs, fonts) =
        collect_styles(source, dialect).map_err(|e| e.in_document(source.name()))?;
    let table = link_styles(paragraphs, &fonts);
    log::debug!(
        "Resolved {} paragraph styles and {} font styles",
        table.len(),
        fonts.len()
    );
    Ok(table)
}

type Attributes = BTreeMap<String, String>;

fn collect_styles(
    source: &SourceDocument,
    dialect: &Dialect,
) -> Result<(Vec<StyleRecord>, HashMap<String, FontStyleRecord>)> {
    let mut reader = Reader::from_reader(source.open()?);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut fonts = HashMap::new();
    let mut depth = 0usize;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?;
        match &event {
            Event::Start(e) if e.local_name().as_ref() == dialect.page => {
                let name = e.name().as_ref().to_vec();
                skip_buf.clear();
                reader.read_to_end_into(QName(&name), &mut skip_buf)?;
            }
            Event::Start(e) | Event::Empty(e) => {
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
                let local = e.local_name();
                if local.as_ref() == dialect.paragraph_style {
                    let attrs: Attributes = collect_attributes(e)?.into_iter().collect();
                    let id = attrs.get("id").cloned().unwrap_or_default();
                    paragraphs.push(StyleRecord::new(id, attrs));
                } else if local.as_ref() == dialect.font_style {
                    let attrs: Attributes = collect_attributes(e)?.into_iter().collect();
                    let id = attrs.get("id").cloned().unwrap_or_default();
                    fonts.insert(id.clone(), FontStyleRecord::new(id, attrs));
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof if depth > 0 => {
                return Err(Error::UnexpectedEof {
                    document: UNKNOWN_DOCUMENT.to_string(),
                })
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((paragraphs, fonts))
}

fn link_styles(paragraphs: Vec<StyleRecord>, fonts: &HashMap<String, FontStyleRecord>) -> StyleTable {
    let records = paragraphs.into_iter().map(|mut style| {
        if let Some(font_id) = style.main_font_style_id() {
            match fonts.get(font_id) {
                Some(font) => style.font = Some(font.clone()),
                None => log::debug!(
                    "Paragraph style {} references missing font style {}",
                    style.id,
                    font_id
                ),
            }
        }
        style
    });
    StyleTable::from_records(records)
}
