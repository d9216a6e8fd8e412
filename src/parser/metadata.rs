//! Metadata document reader.
//!
//! The metadata document is a flat list of `<key>value</key>` children under
//! a single root. Values are kept verbatim except for the language, which is
//! normalized to an ISO 639-1 code.

use isolang::Language;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::SourceDocument;
use crate::error::Result;
use crate::model::Metadata;

/// Language assumed when none is given or the given one is unknown.
pub const DEFAULT_LANGUAGE: &str = "en";

/// ISO 639-2 bibliographic codes that differ from their terminology code.
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("mao", "mri"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("tib", "bod"),
    ("wel", "cym"),
];

/// Read a metadata document into a multi-valued map.
pub fn read_metadata(source: &SourceDocument) -> Result<Metadata> {
    let mut metadata = collect_entries(source).map_err(|e| e.in_document(source.name()))?;
    normalize_language(&mut metadata);
    log::debug!("Read {} metadata keys", metadata.len());
    Ok(metadata)
}

fn collect_entries(source: &SourceDocument) -> Result<Metadata> {
    let mut reader = Reader::from_reader(source.open()?);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut metadata = Metadata::new();
    let mut depth = 0usize;
    let mut key: Option<String> = None;
    let mut value = String::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                if depth == 2 {
                    key = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    value.clear();
                }
            }
            Event::Text(t) if depth == 2 => value.push_str(&t.unescape()?),
            Event::CData(c) if depth == 2 => {
                value.push_str(&String::from_utf8_lossy(&c.into_inner()))
            }
            Event::End(_) => {
                if depth == 2 {
                    if let Some(key) = key.take() {
                        let text = value.trim();
                        if !text.is_empty() {
                            metadata.push(key, text);
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(metadata)
}

/// Resolve a language code or name to ISO 639-1.
///
/// Accepts ISO 639-1, 639-2/B, 639-2/T and 639-3 codes as well as English
/// language names. Languages without a two-letter code resolve to `None`.
pub fn normalize_language_code(code: &str) -> Option<&'static str> {
    let code = code.trim();
    let lower = code.to_lowercase();
    let language = match lower.len() {
        2 => Language::from_639_1(&lower),
        3 => {
            let term = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(bib, _)| *bib == lower)
                .map_or(lower.as_str(), |(_, term)| *term);
            Language::from_639_3(term)
        }
        _ => None,
    };
    language
        .or_else(|| Language::from_name(&title_case(code)))
        .and_then(|language| language.to_639_1())
}

/// "modern GREEK" -> "Modern Greek"
fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_language(metadata: &mut Metadata) {
    let mut languages = metadata.get("language").to_vec();
    match languages.first_mut() {
        None => languages.push(DEFAULT_LANGUAGE.to_string()),
        Some(first) => match normalize_language_code(first) {
            Some(code) => *first = code.to_string(),
            None => {
                log::debug!("Invalid language code {}. Setting to English", first);
                *first = DEFAULT_LANGUAGE.to_string();
            }
        },
    }
    metadata.set("language", languages);
}
