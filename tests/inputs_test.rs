//! Integration tests for auxiliary inputs and page residency.

mod common;

use std::io::Write;

use common::{body, fr10, page, picture, SENTENCES};
use tempfile::NamedTempFile;
use unabbyy::model::{ContentBlock, PageType};
use unabbyy::parser::{for_each_page, NodeLedger, PageStream, SourceDocument};
use unabbyy::{
    parse_bytes_with_options, parse_file_with_options, AbbyyParser, Error, PageTypeIndex,
    ParseOptions, SchemaVersion, Unabbyy,
};

const META: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <identifier>whalingvoyage00smit</identifier>
  <title>A Whaling Voyage</title>
  <creator>Smith, John</creator>
  <creator>Doe, Jane</creator>
  <subject/>
  <language>eng</language>
</metadata>
"#;

const SCANDATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<book>
  <bookData><leafCount>6</leafCount></bookData>
  <pageData>
    <page leafNum="0"><pageType>Color Card</pageType></page>
    <page leafNum="1"><pageType>Cover</pageType></page>
    <page leafNum="2"><pageType>Title</pageType></page>
    <page leafNum="3"><pageType>Normal</pageType></page>
    <page leafNum="4"><pageType>White Card</pageType></page>
    <page leafNum="5"><pageType>Normal</pageType></page>
  </pageData>
</book>
"#;

fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn book() -> String {
    fr10(&[
        page(&[body("COVER"), picture(0, 0, 1000, 1500)]),
        page(&[body("A WHALING VOYAGE")]),
        page(&[body("It begins at sea.")]),
        page(&[body("Calibration white")]),
        page(&[body("It ends ashore.")]),
    ])
}

#[test]
fn test_metadata_file() {
    let abbyy = temp_file(&book());
    let meta = temp_file(META);

    let options = ParseOptions::new().with_metadata_file(meta.path());
    let doc = parse_file_with_options(abbyy.path(), options).unwrap();

    assert_eq!(doc.metadata.title(), Some("A Whaling Voyage"));
    assert_eq!(doc.metadata.get("creator"), &["Smith, John", "Doe, Jane"]);
    assert_eq!(doc.metadata.language(), Some("en"));
    assert!(!doc.metadata.contains("subject"));
    assert_eq!(doc.metadata.first("fr-version"), Some("FR10"));
}

#[test]
fn test_unknown_language_defaults_to_english() {
    let meta = META.replace("<language>eng</language>", "<language>Klingon</language>");
    let options = ParseOptions::new().with_metadata_bytes(meta.into_bytes());
    let doc = parse_bytes_with_options(book().as_bytes(), options).unwrap();
    assert_eq!(doc.metadata.get("language"), &["en"]);
}

#[test]
fn test_french_language_normalized() {
    let meta = META.replace("<language>eng</language>", "<language>fre</language>");
    let options = ParseOptions::new().with_metadata_bytes(meta.into_bytes());
    let doc = parse_bytes_with_options(book().as_bytes(), options).unwrap();
    assert_eq!(doc.metadata.language(), Some("fr"));
}

#[test]
fn test_missing_metadata_file_is_fatal() {
    let options = ParseOptions::new().with_metadata_file("/no/such/dir/book_meta.xml");
    let err = parse_bytes_with_options(book().as_bytes(), options).unwrap_err();
    match err {
        Error::MissingInput { document, .. } => assert_eq!(document, "metadata"),
        other => panic!("expected missing input, got {:?}", other),
    }
}

#[test]
fn test_scandata_page_types() {
    let index = PageTypeIndex::from_scandata_bytes(SCANDATA.as_bytes()).unwrap();
    assert_eq!(index.len(), 6);
    assert_eq!(index.get(0), Some(&PageType::ColorCard));
    assert_eq!(index.get(2), Some(&PageType::Title));
    assert_eq!(index.get(4), Some(&PageType::WhiteCard));
    assert_eq!(index.get(9), None);
}

#[test]
fn test_scandata_drives_flattening() {
    let index = PageTypeIndex::from_scandata_bytes(SCANDATA.as_bytes()).unwrap();
    let options = ParseOptions::new()
        .with_page_types(index)
        .with_page_markers(false);
    let doc = parse_bytes_with_options(book().as_bytes(), options).unwrap();

    let summary: Vec<String> = doc
        .blocks
        .iter()
        .map(|b| match b {
            ContentBlock::Text(t) => t.text.clone(),
            other => format!("<{}:{}>", other.kind(), other.page_no()),
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            "COVER",
            "A WHALING VOYAGE",
            "<section_break:3>",
            "It begins at sea.",
            "It ends ashore.",
        ]
    );
    assert!(doc.pictures_by_page.is_empty());
}

#[test]
fn test_builder_reads_scandata_file() {
    let abbyy = temp_file(&book());
    let scandata = temp_file(SCANDATA);

    let result = Unabbyy::new()
        .with_scandata_file(scandata.path())
        .unwrap()
        .parse(abbyy.path())
        .unwrap();
    assert!(!result.plain_text().contains("Calibration white"));
}

#[test]
fn test_missing_scandata_file_is_fatal() {
    let result = PageTypeIndex::from_scandata_path("/no/such/dir/book_scandata.xml");
    assert!(matches!(result, Err(Error::MissingInput { .. })));
}

fn long_book(pages: usize) -> String {
    let pages: Vec<String> = (0..pages)
        .map(|i| {
            let line = SENTENCES[i % SENTENCES.len()];
            page(&[body(line), body(line), body(&(i + 1).to_string())])
        })
        .collect();
    fr10(&pages)
}

#[test]
fn test_one_page_resident_at_a_time() {
    let xml = long_book(60);
    let source = SourceDocument::from_bytes("ABBYY", xml.into_bytes());
    let ledger = NodeLedger::new();

    let mut peak = 0;
    let mut callbacks = 0;
    let seen = for_each_page(
        &source,
        SchemaVersion::FineReader10.dialect(),
        Some(ledger.clone()),
        |page| {
            assert_eq!(ledger.live(), page.node_count());
            peak = peak.max(ledger.live());
            callbacks += 1;
            Ok(())
        },
    )
    .unwrap();

    assert_eq!(seen, 61);
    assert_eq!(callbacks, 60);
    assert_eq!(ledger.live(), 0);
    assert!(peak > 0);
}

#[test]
fn test_retained_pages_are_visible_to_ledger() {
    let xml = long_book(10);
    let ledger = NodeLedger::new();
    let stream = PageStream::new(xml.as_bytes(), SchemaVersion::FineReader10.dialect())
        .with_ledger(ledger.clone());

    // Holding on to every page defeats streaming; the ledger shows it.
    let pages: Vec<_> = stream.map(Result::unwrap).collect();
    let largest = pages.iter().map(|p| p.node_count()).max().unwrap();
    let total: usize = pages.iter().map(|p| p.node_count()).sum();
    assert_eq!(ledger.live(), total);
    assert!(ledger.live() > largest);

    drop(pages);
    assert_eq!(ledger.live(), 0);
}

#[test]
fn test_full_parse_releases_all_pages() {
    let ledger = NodeLedger::new();
    let options = ParseOptions::new().with_node_ledger(ledger.clone());
    let doc = AbbyyParser::from_bytes_with_options(long_book(25).into_bytes(), options)
        .parse()
        .unwrap();

    assert_eq!(ledger.live(), 0);
    assert_eq!(doc.text_blocks().count(), 75);
}
