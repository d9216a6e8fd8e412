//! Scan description reader.
//!
//! Builds the page-type index from `<pageData><page leafNum="N"><pageType>`.

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::page_stream::collect_attributes;
use super::SourceDocument;
use crate::error::Result;
use crate::model::{PageType, PageTypeIndex};

/// Read the page-type index from a scan description.
pub fn read_page_types(source: &SourceDocument) -> Result<PageTypeIndex> {
    collect_page_types(source).map_err(|e| e.in_document(source.name()))
}

fn collect_page_types(source: &SourceDocument) -> Result<PageTypeIndex> {
    let mut reader = Reader::from_reader(source.open()?);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut index = PageTypeIndex::new();
    let mut path: Vec<String> = Vec::new();
    let mut leaf: Option<u32> = None;
    let mut label = String::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "page" && path.last().map(String::as_str) == Some("pageData") {
                    leaf = collect_attributes(&e)?
                        .into_iter()
                        .find(|(k, _)| k == "leafNum")
                        .and_then(|(_, v)| v.trim().parse().ok());
                } else if name == "pageType" {
                    label.clear();
                }
                path.push(name);
            }
            Event::Text(t) if path.last().map(String::as_str) == Some("pageType") => {
                label.push_str(&t.unescape()?);
            }
            Event::End(_) => {
                if let Some(name) = path.pop() {
                    if name == "pageType" {
                        if let Some(n) = leaf {
                            index.insert(n, PageType::from_label(&label));
                        }
                    } else if name == "page" {
                        leaf = None;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    log::debug!("Read {} page types", index.len());
    Ok(index)
}

impl PageTypeIndex {
    /// Read a scan description file (plain or gzip).
    pub fn from_scandata_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_page_types(&SourceDocument::from_path("scandata", path)?)
    }

    /// Read an in-memory scan description.
    pub fn from_scandata_bytes(data: &[u8]) -> Result<Self> {
        read_page_types(&SourceDocument::from_bytes("scandata", data.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCANDATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<book>
  <bookData><leafCount>4</leafCount></bookData>
  <pageData>
    <page leafNum="0"><pageType>Color Card</pageType><addToAccessFormats>false</addToAccessFormats></page>
    <page leafNum="1"><pageType>Cover</pageType></page>
    <page leafNum="2"><pageType>Title</pageType></page>
    <page leafNum="3"><pageType>Normal</pageType></page>
  </pageData>
</book>"#;

    #[test]
    fn test_read_page_types() {
        let index = PageTypeIndex::from_scandata_bytes(SCANDATA.as_bytes()).unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(index.get(0), Some(&PageType::ColorCard));
        assert_eq!(index.get(1), Some(&PageType::Cover));
        assert_eq!(index.get(3), Some(&PageType::Normal));
    }

    #[test]
    fn test_pages_outside_page_data_ignored() {
        let xml = r#"<book><page leafNum="9"><pageType>Cover</pageType></page></book>"#;
        let index = PageTypeIndex::from_scandata_bytes(xml.as_bytes()).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_missing_scandata_file() {
        let err = PageTypeIndex::from_scandata_path("/no/such/scandata.xml").unwrap_err();
        assert!(matches!(err, crate::Error::MissingInput { .. }));
    }
}
