//! Synthetic ABBYY documents shared by the integration tests.

#![allow(dead_code)]

use unabbyy::detect::{FINEREADER10_NS, FINEREADER6_NS};

/// Paragraph and font styles used by every FineReader 10 fixture.
pub const STYLES: &str = r#"<documentData>
  <paragraphStyles>
    <paragraphStyle id="body" name="Body" role="text" mainFontStyleId="serif"/>
    <paragraphStyle id="h1" name="Chapter" role="heading" roleLevel="1" mainFontStyleId="bold"/>
    <paragraphStyle id="h2" name="Section" role="heading" roleLevel="2"/>
    <paragraphStyle id="fn" name="Note" role="footnote"/>
    <paragraphStyle id="rt" name="Running" role="rt"/>
  </paragraphStyles>
  <fontStyles>
    <fontStyle id="serif" ff="Times New Roman" fs="10."/>
    <fontStyle id="bold" ff="Times New Roman" fs="16." bold="1"/>
  </fontStyles>
</documentData>"#;

/// A FineReader 10 document: styles, a calibration page, then `pages`.
pub fn fr10(pages: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<document xmlns=\"{}\">\n{}\n<page width=\"10\" height=\"10\"/>\n{}\n</document>\n",
        FINEREADER10_NS,
        STYLES,
        pages.join("\n")
    )
}

/// A FineReader 6 document: no styles, a calibration page, then `pages`.
pub fn fr6(pages: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<document xmlns=\"{}\">\n<page/>\n{}\n</document>\n",
        FINEREADER6_NS,
        pages.join("\n")
    )
}

/// A page with the given blocks.
pub fn page(blocks: &[String]) -> String {
    format!(
        "<page width=\"1000\" height=\"1500\">\n{}\n</page>",
        blocks.concat()
    )
}

/// A paragraph made of lines.
pub fn par(style: &str, lines: &[&str]) -> String {
    let lines: String = lines
        .iter()
        .map(|l| {
            format!(
                "\n  <line baseline=\"100\" l=\"0\" t=\"0\" r=\"10\" b=\"10\"><formatting lang=\"EnglishUnitedStates\">{}</formatting></line>",
                l
            )
        })
        .collect();
    format!("<par style=\"{}\">{}\n</par>", style, lines)
}

/// A text block holding paragraphs.
pub fn text(pars: &[String]) -> String {
    format!(
        "<block blockType=\"Text\" l=\"0\" t=\"0\" r=\"900\" b=\"900\"><text>{}</text></block>",
        pars.concat()
    )
}

/// A text block with one body paragraph of one line.
pub fn body(line: &str) -> String {
    text(&[par("body", &[line])])
}

/// A table block; every cell holds one body paragraph.
pub fn table(rows: &[&[&str]]) -> String {
    let rows: String = rows
        .iter()
        .map(|cells| {
            let cells: String = cells
                .iter()
                .map(|c| format!("<cell><text>{}</text></cell>", par("body", &[c])))
                .collect();
            format!("<row>{}</row>", cells)
        })
        .collect();
    format!(
        "<block blockType=\"Table\" l=\"0\" t=\"0\" r=\"900\" b=\"400\">{}</block>",
        rows
    )
}

/// A picture block.
pub fn picture(l: i64, t: i64, r: i64, b: i64) -> String {
    format!(
        "<block blockType=\"Picture\" l=\"{}\" t=\"{}\" r=\"{}\" b=\"{}\"/>",
        l, t, r, b
    )
}

/// A plain page with one body line on top and one at the foot.
pub fn two_line_page(top: &str, foot: &str) -> String {
    page(&[text(&[par("body", &[top]), par("body", &[foot])])])
}

/// Distinct sentences, so body lines never look like running elements.
pub const SENTENCES: &[&str] = &[
    "Call me Ishmael.",
    "The owls are not what they seem.",
    "It rained all through March.",
    "Bread was cheap that year.",
    "He lit a lamp and waited.",
    "Winter came early to the valley.",
    "Nobody answered the door.",
    "The river had frozen overnight.",
    "She counted every coin twice.",
    "A letter finally arrived from Lisbon.",
    "Smoke rose from the chimney.",
    "They argued until dawn.",
];
