//! Block flattening.
//!
//! Turns one materialized page into a run of [`ContentBlock`]s appended to the
//! shared output sequence. Text blocks are split per paragraph, tables are
//! linearized into open markers with `is_last_in_parent` flags for closing,
//! and pictures nested inside larger pictures are dropped.

use std::collections::HashSet;
use std::sync::Arc;

use super::page_stream::{Element, PageRecord};
use super::text::{join_lines, TextCleaner};
use super::{BlockKind, Dialect, ParseOptions};
use crate::model::{
    BlockAttributes, Bounds, ContentBlock, PageType, PageTypeIndex, PictureBlock, PicturesByPage,
    Role, StyleRecord, StyleTable, TextBlock,
};

/// Per-page flattening state.
struct PageState {
    page_no: u32,
    width: u32,
    height: u32,
    awaiting_first: bool,
}

impl PageState {
    /// Consume the first-on-page flag.
    fn take_first(&mut self) -> bool {
        std::mem::replace(&mut self.awaiting_first, false)
    }
}

/// Flattens pages into the shared block sequence.
///
/// One flattener is used for a whole document: it carries the picture index
/// and the section state across pages. Everything specific to one page lives
/// in the call frame of [`BlockFlattener::flatten_page`].
pub struct BlockFlattener<'a> {
    styles: &'a StyleTable,
    dialect: &'static Dialect,
    page_types: Option<&'a PageTypeIndex>,
    cleaner: TextCleaner,
    emit_page_markers: bool,
    suppress_cover_picture: bool,
    warned_styles: HashSet<String>,
    pictures: PicturesByPage,
    last_front_matter: Option<bool>,
}

impl<'a> BlockFlattener<'a> {
    /// Create a flattener for one document.
    pub fn new(styles: &'a StyleTable, dialect: &'static Dialect, options: &'a ParseOptions) -> Self {
        Self {
            styles,
            dialect,
            page_types: options.page_types.as_ref(),
            cleaner: TextCleaner::new(options.normalize_unicode),
            emit_page_markers: options.emit_page_markers,
            suppress_cover_picture: options.suppress_cover_picture,
            warned_styles: HashSet::new(),
            pictures: PicturesByPage::default(),
            last_front_matter: None,
        }
    }

    /// Finish and return the picture index.
    pub fn into_pictures(self) -> PicturesByPage {
        self.pictures
    }

    /// Flatten one page, appending its blocks to `out`.
    pub fn flatten_page(&mut self, page: &PageRecord, out: &mut Vec<ContentBlock>) {
        let page_no = page.page_no;
        let page_type = self.page_types.and_then(|index| index.get(page_no));
        if page_type.is_some_and(PageType::is_non_content) {
            log::debug!("Skipping page {} ({:?})", page_no, page_type);
            return;
        }

        let root = page.root();
        let blocks: Vec<Element<'_>> = root.children_named(self.dialect.block).collect();
        if blocks.is_empty() {
            return;
        }

        if self.page_types.is_some() {
            let front = page_type.is_some_and(PageType::is_front_matter);
            if self.last_front_matter.is_some_and(|previous| previous != front) {
                out.push(ContentBlock::SectionBreak { page_no });
            }
            self.last_front_matter = Some(front);
        }

        let start = out.len();
        let mut state = PageState {
            page_no,
            width: page.width,
            height: page.height,
            awaiting_first: true,
        };
        let pictures = self.page_pictures(&blocks, page_no, page_type);
        let mut last_table = None;

        for (i, block) in blocks.iter().enumerate() {
            let block_type = block.attr(self.dialect.block_type_attr);
            last_table = None;
            match self.dialect.block_kind(block_type) {
                BlockKind::Text => self.flatten_text(block, &mut state, out),
                BlockKind::Table => {
                    last_table = Some(out.len());
                    self.flatten_table(block, &mut state, out);
                }
                BlockKind::Picture => {
                    if let Some(bounds) = pictures[i] {
                        let picture = PictureBlock {
                            page_no,
                            bounds,
                            page_width: state.width,
                            page_height: state.height,
                        };
                        self.pictures.insert(picture.clone());
                        out.push(ContentBlock::Picture(picture));
                    }
                }
                BlockKind::Separator => out.push(ContentBlock::Separator { page_no }),
                BlockKind::Unrecognized => {
                    log::debug!(
                        "Ignoring block of type {:?} on page {}",
                        block_type,
                        page_no
                    );
                    out.push(ContentBlock::Unrecognized {
                        page_no,
                        block_type: block_type.map(str::to_string),
                    });
                }
            }
        }

        if let Some(ContentBlock::Table {
            is_last_in_parent, ..
        }) = last_table.and_then(|i| out.get_mut(i))
        {
            *is_last_in_parent = true;
        }

        mark_last_text(out, page_no);

        if self.emit_page_markers && out.len() > start {
            out.push(ContentBlock::PageMarker { page_no });
        }
    }

    fn flatten_text(&mut self, block: &Element<'_>, state: &mut PageState, out: &mut Vec<ContentBlock>) {
        // One block may hold paragraphs of several styles.
        for par in block.descendants(self.dialect.par) {
            let text = self.paragraph_text(&par);
            if text.is_empty() {
                continue;
            }
            let (role, style) = self.paragraph_style(&par);
            if role == Role::RunningTitle {
                continue;
            }
            let heading_level = role
                .is_heading()
                .then(|| style.role_level().filter(|level| *level >= 1).unwrap_or(1));

            out.push(ContentBlock::Text(TextBlock {
                page_no: state.page_no,
                text,
                role,
                style,
                is_first_on_page: state.take_first(),
                is_last_on_page: false,
                heading_level,
                suppressed: false,
            }));
        }
    }

    fn flatten_table(&mut self, block: &Element<'_>, state: &mut PageState, out: &mut Vec<ContentBlock>) {
        let page_no = state.page_no;
        let style: Arc<BlockAttributes> = Arc::new(block.attributes().iter().cloned().collect());

        out.push(ContentBlock::Table {
            page_no,
            style: Arc::clone(&style),
            is_last_in_parent: false,
        });

        let rows = block.descendants(self.dialect.row);
        let row_count = rows.len();
        for (r, row) in rows.iter().enumerate() {
            out.push(ContentBlock::TableRow {
                page_no,
                style: Arc::clone(&style),
                is_last_in_parent: r + 1 == row_count,
            });

            let cells = row.descendants(self.dialect.cell);
            let cell_count = cells.len();
            for (c, cell) in cells.iter().enumerate() {
                out.push(ContentBlock::TableCell {
                    page_no,
                    style: Arc::clone(&style),
                    is_last_in_parent: c + 1 == cell_count,
                });

                let texts: Vec<String> = cell
                    .descendants(self.dialect.par)
                    .iter()
                    .map(|par| self.paragraph_text(par))
                    .collect();
                let sole = texts.len() == 1;
                let mut kept: Vec<String> = texts
                    .into_iter()
                    .filter(|text| sole || !text.is_empty())
                    .collect();
                // Keep the cell in the table shape.
                if kept.is_empty() {
                    kept.push(String::new());
                }

                let kept_count = kept.len();
                for (k, text) in kept.into_iter().enumerate() {
                    out.push(ContentBlock::TableText {
                        page_no,
                        style: Arc::clone(&style),
                        text,
                        is_last_in_parent: k + 1 == kept_count,
                    });
                    state.awaiting_first = false;
                }
            }
        }
    }

    fn paragraph_text(&self, par: &Element<'_>) -> String {
        let lines = par.descendants(self.dialect.line);
        let text = if lines.is_empty() {
            par.text().trim().to_string()
        } else {
            let line_texts: Vec<String> = lines.iter().map(Element::text).collect();
            join_lines(line_texts.iter().map(String::as_str))
        };
        self.cleaner.clean(text)
    }

    fn paragraph_style(&mut self, par: &Element<'_>) -> (Role, Arc<StyleRecord>) {
        if !self.dialect.has_paragraph_styles {
            return (Role::Unstructured, self.styles.empty_style());
        }
        let id = par.attr(self.dialect.style_attr).unwrap_or_default();
        match self.styles.get(id) {
            Some(style) => (style.role(), Arc::clone(style)),
            None => {
                if self.warned_styles.insert(id.to_string()) {
                    log::info!("Paragraph style {:?} is not defined; using an empty style", id);
                }
                (Role::Text, self.styles.empty_style())
            }
        }
    }

    /// Bounds of the pictures to keep, indexed like `blocks`.
    fn page_pictures(
        &self,
        blocks: &[Element<'_>],
        page_no: u32,
        page_type: Option<&PageType>,
    ) -> Vec<Option<Bounds>> {
        let mut kept = vec![None; blocks.len()];
        let is_cover = page_no == 1 || page_type.is_some_and(PageType::is_cover);
        if self.suppress_cover_picture && is_cover {
            log::debug!("Page {} is the cover; its pictures are not flattened", page_no);
            return kept;
        }

        let mut candidates = Vec::new();
        for (i, block) in blocks.iter().enumerate() {
            let block_type = block.attr(self.dialect.block_type_attr);
            if self.dialect.block_kind(block_type) != BlockKind::Picture {
                continue;
            }
            match picture_bounds(block) {
                Some(bounds) => candidates.push((i, bounds)),
                None => log::warn!("Skipping picture with unusable bounds on page {}", page_no),
            }
        }

        let bounds: Vec<Bounds> = candidates.iter().map(|(_, b)| *b).collect();
        for ((i, b), contained) in candidates.into_iter().zip(contained_pictures(&bounds)) {
            if contained {
                log::debug!("Dropping picture nested in a larger picture on page {}", page_no);
            } else {
                kept[i] = Some(b);
            }
        }
        kept
    }
}

fn picture_bounds(block: &Element<'_>) -> Option<Bounds> {
    let edge = |name: &str| block.attr(name).and_then(|v| v.trim().parse::<i64>().ok());
    let bounds = Bounds::new(edge("l")?, edge("t")?, edge("r")?, edge("b")?);
    (bounds.width() > 0 && bounds.height() > 0).then_some(bounds)
}

/// Mark the final block of `page_no` as the page's last text when it is text.
///
/// A page whose final block is a table, picture or separator has no last
/// text block.
pub fn mark_last_text(blocks: &mut [ContentBlock], page_no: u32) {
    let Some(block) = blocks.last_mut() else {
        return;
    };
    if block.content_page() != Some(page_no) {
        return;
    }
    if let ContentBlock::Text(text) = block {
        text.is_last_on_page = true;
    }
}

/// For each box, whether it lies within some other, non-identical box.
///
/// Identical boxes never suppress each other.
pub fn contained_pictures(bounds: &[Bounds]) -> Vec<bool> {
    bounds
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            bounds
                .iter()
                .enumerate()
                .any(|(j, other)| i != j && candidate != other && candidate.is_within(other))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::FINEREADER10_NS;
    use crate::parser::PageStream;
    use std::collections::BTreeMap;

    fn styles() -> StyleTable {
        let style = |id: &str, pairs: &[(&str, &str)]| {
            let attrs: BTreeMap<String, String> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            StyleRecord::new(id, attrs)
        };
        StyleTable::from_records(vec![
            style("body", &[("role", "text")]),
            style("h1", &[("role", "heading"), ("roleLevel", "1")]),
            style("h2", &[("role", "heading"), ("roleLevel", "2")]),
            style("hx", &[("role", "heading")]),
            style("rt", &[("role", "rt")]),
            style("fn", &[("role", "footnote")]),
        ])
    }

    fn par(style: &str, lines: &[&str]) -> String {
        let lines: String = lines
            .iter()
            .map(|l| format!("<line><formatting>{}</formatting></line>", l))
            .collect();
        format!("<par style=\"{}\">{}</par>", style, lines)
    }

    fn text_block(pars: &[String]) -> String {
        format!(
            "<block blockType=\"Text\"><text>{}</text></block>",
            pars.concat()
        )
    }

    fn picture(l: i64, t: i64, r: i64, b: i64) -> String {
        format!(
            "<block blockType=\"Picture\" l=\"{}\" t=\"{}\" r=\"{}\" b=\"{}\"/>",
            l, t, r, b
        )
    }

    /// Pages 1..=n from bodies; page 0 is an empty calibration page.
    fn flatten(bodies: &[String], options: &ParseOptions) -> (Vec<ContentBlock>, PicturesByPage) {
        let pages: String = bodies
            .iter()
            .map(|b| format!("<page width=\"1000\" height=\"1600\">{}</page>", b))
            .collect();
        let xml = format!(
            "<document xmlns=\"{}\"><page/>{}</document>",
            FINEREADER10_NS, pages
        );
        let table = styles();
        let mut flattener = BlockFlattener::new(&table, &Dialect::FINEREADER10, options);
        let mut out = Vec::new();
        for page in PageStream::new(xml.as_bytes(), &Dialect::FINEREADER10) {
            flattener.flatten_page(&page.unwrap(), &mut out);
        }
        (out, flattener.into_pictures())
    }

    fn texts(blocks: &[ContentBlock]) -> Vec<&TextBlock> {
        blocks.iter().filter_map(ContentBlock::as_text).collect()
    }

    #[test]
    fn test_paragraphs_become_blocks() {
        let body = text_block(&[
            par("h1", &["Chapter One"]),
            par("body", &["It was a dark and storm-", "y night."]),
            par("body", &["   "]),
            par("fn", &["1. A footnote."]),
        ]);
        let (blocks, _) = flatten(&[body], &ParseOptions::default());
        let texts = texts(&blocks);

        assert_eq!(texts.len(), 3);
        assert_eq!(texts[0].text, "Chapter One");
        assert_eq!(texts[0].role, Role::Heading);
        assert_eq!(texts[0].heading_level, Some(1));
        assert!(texts[0].is_first_on_page);
        assert_eq!(texts[1].text, "It was a dark and stormy night.");
        assert!(!texts[1].is_first_on_page);
        assert_eq!(texts[2].role, Role::Footnote);
        assert!(texts[2].is_last_on_page);
        assert!(texts.iter().all(|t| t.page_no == 1));
        assert_eq!(blocks.last(), Some(&ContentBlock::PageMarker { page_no: 1 }));
    }

    #[test]
    fn test_running_title_skipped() {
        let body = text_block(&[par("rt", &["THE ILIAD"]), par("body", &["Sing, goddess"])]);
        let (blocks, _) = flatten(&[body], &ParseOptions::default());
        let texts = texts(&blocks);

        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].text, "Sing, goddess");
        assert!(texts[0].is_first_on_page);
    }

    #[test]
    fn test_heading_levels() {
        let body = text_block(&[par("h2", &["Section"]), par("hx", &["Untitled level"])]);
        let (blocks, _) = flatten(&[body], &ParseOptions::default());
        let texts = texts(&blocks);
        assert_eq!(texts[0].heading_level, Some(2));
        assert_eq!(texts[1].heading_level, Some(1));
    }

    #[test]
    fn test_unresolved_style_substitutes_empty() {
        let body = text_block(&[par("missing", &["Orphan"]), par("missing", &["Again"])]);
        let (blocks, _) = flatten(&[body], &ParseOptions::default());
        let texts = texts(&blocks);
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].role, Role::Text);
        assert!(texts[0].style.is_empty());
    }

    #[test]
    fn test_table_shape() {
        let cell = |content: &str| format!("<cell><text>{}</text></cell>", content);
        let row = |cells: &[String]| format!("<row>{}</row>", cells.concat());
        let table = format!(
            "<block blockType=\"Table\" l=\"0\">{}{}</block>",
            row(&[cell(&par("body", &["a"])), cell(&par("body", &[""]))]),
            row(&[cell(&par("body", &["c"])), cell(&format!("{}{}", par("body", &["d"]), par("body", &["e"])))]),
        );
        let (blocks, _) = flatten(&[table], &ParseOptions::default());

        let kinds: Vec<&str> = blocks.iter().map(ContentBlock::kind).collect();
        assert_eq!(
            kinds,
            vec![
                "table", "table_row", "table_cell", "table_text", "table_cell", "table_text",
                "table_row", "table_cell", "table_text", "table_cell", "table_text",
                "table_text", "page_marker"
            ]
        );

        let rows: Vec<bool> = blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::TableRow { is_last_in_parent, .. } => Some(*is_last_in_parent),
                _ => None,
            })
            .collect();
        assert_eq!(rows, vec![false, true]);

        let cells: Vec<bool> = blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::TableCell { is_last_in_parent, .. } => Some(*is_last_in_parent),
                _ => None,
            })
            .collect();
        assert_eq!(cells, vec![false, true, false, true]);

        let texts: Vec<(&str, bool)> = blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::TableText {
                    text,
                    is_last_in_parent,
                    ..
                } => Some((text.as_str(), *is_last_in_parent)),
                _ => None,
            })
            .collect();
        assert_eq!(
            texts,
            vec![("a", true), ("", true), ("c", true), ("d", false), ("e", true)]
        );

        match &blocks[0] {
            ContentBlock::Table {
                style,
                is_last_in_parent,
                ..
            } => {
                assert_eq!(style.get("l").map(String::as_str), Some("0"));
                assert!(*is_last_in_parent);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_paragraph_skipped_in_multi_paragraph_cell() {
        let table = format!(
            "<block blockType=\"Table\"><row><cell><text>{}{}</text></cell></row></block>",
            par("body", &[""]),
            par("body", &["x"])
        );
        let (blocks, _) = flatten(&[table], &ParseOptions::default());
        let table_texts: Vec<&ContentBlock> = blocks
            .iter()
            .filter(|b| matches!(b, ContentBlock::TableText { .. }))
            .collect();
        assert_eq!(table_texts.len(), 1);
    }

    #[test]
    fn test_cover_picture_suppressed() {
        let pages = vec![picture(0, 0, 500, 800), picture(10, 10, 200, 200)];
        let (blocks, pictures) = flatten(&pages, &ParseOptions::default());

        let pics: Vec<&ContentBlock> = blocks
            .iter()
            .filter(|b| matches!(b, ContentBlock::Picture(_)))
            .collect();
        assert_eq!(pics.len(), 1);
        assert_eq!(pics[0].page_no(), 2);
        assert!(pictures.on_page(1).is_empty());
        assert_eq!(pictures.on_page(2)[0].page_width, 1000);

        let (_, pictures) = flatten(&pages, &ParseOptions::default().keep_cover_picture());
        assert_eq!(pictures.len(), 2);
    }

    #[test]
    fn test_nested_picture_suppressed() {
        let body = format!("{}{}", picture(0, 0, 100, 100), picture(10, 10, 50, 50));
        let (_, pictures) = flatten(&[String::new(), body], &ParseOptions::default());
        let kept = pictures.on_page(2);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].bounds, Bounds::new(0, 0, 100, 100));
    }

    #[test]
    fn test_identical_pictures_both_kept() {
        let body = format!("{}{}", picture(0, 0, 100, 100), picture(0, 0, 100, 100));
        let (_, pictures) = flatten(&[String::new(), body], &ParseOptions::default());
        assert_eq!(pictures.on_page(2).len(), 2);
    }

    #[test]
    fn test_page_without_blocks_emits_nothing() {
        let body = text_block(&[par("body", &["Only page"])]);
        let (blocks, _) = flatten(&[String::new(), body], &ParseOptions::default());
        assert!(blocks.iter().all(|b| b.page_no() == 2));
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_separator_and_unknown_blocks() {
        let body = format!(
            "{}<block blockType=\"Separator\"/><block blockType=\"Barcode\"/>",
            text_block(&[par("body", &["Text"])])
        );
        let (blocks, _) = flatten(&[body], &ParseOptions::default().with_page_markers(false));
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[1], ContentBlock::Separator { page_no: 1 }));
        assert!(matches!(
            &blocks[2],
            ContentBlock::Unrecognized { block_type: Some(t), .. } if t == "Barcode"
        ));
        // The page ends on a non-text block.
        assert!(!blocks[0].as_text().unwrap().is_last_on_page);
    }

    #[test]
    fn test_page_types_skip_and_section_break() {
        let index: PageTypeIndex = vec![
            (1, PageType::Title),
            (2, PageType::ColorCard),
            (3, PageType::Normal),
        ]
        .into_iter()
        .collect();
        let body = |s: &str| text_block(&[par("body", &[s])]);
        let (blocks, _) = flatten(
            &[body("Title"), body("Card"), body("Body")],
            &ParseOptions::default().with_page_types(index),
        );

        assert!(texts(&blocks).iter().all(|t| t.text != "Card"));
        let kinds: Vec<&str> = blocks.iter().map(ContentBlock::kind).collect();
        assert_eq!(
            kinds,
            vec!["text", "page_marker", "section_break", "text", "page_marker"]
        );
    }

    #[test]
    fn test_mark_last_text_stops_at_page_boundary() {
        let mut blocks = vec![
            ContentBlock::Text(TextBlock::new(1, "previous page")),
            ContentBlock::PageMarker { page_no: 1 },
        ];
        mark_last_text(&mut blocks, 2);
        assert!(!blocks[0].as_text().unwrap().is_last_on_page);

        let mut blocks = vec![
            ContentBlock::Text(TextBlock::new(2, "a")),
            ContentBlock::Text(TextBlock::new(2, "b")),
        ];
        mark_last_text(&mut blocks, 2);
        assert!(!blocks[0].as_text().unwrap().is_last_on_page);
        assert!(blocks[1].as_text().unwrap().is_last_on_page);
    }

    #[test]
    fn test_mark_last_text_requires_text_at_page_end() {
        let mut blocks = vec![
            ContentBlock::Text(TextBlock::new(2, "caption above")),
            ContentBlock::Picture(PictureBlock {
                page_no: 2,
                bounds: Bounds::new(0, 0, 1, 1),
                page_width: 1,
                page_height: 1,
            }),
        ];
        mark_last_text(&mut blocks, 2);
        assert!(!blocks[0].as_text().unwrap().is_last_on_page);

        let mut blocks = vec![
            ContentBlock::Text(TextBlock::new(2, "a")),
            ContentBlock::Separator { page_no: 2 },
        ];
        mark_last_text(&mut blocks, 2);
        assert!(!blocks[0].as_text().unwrap().is_last_on_page);
    }

    #[test]
    fn test_contained_pictures() {
        let a = Bounds::new(0, 0, 100, 100);
        let b = Bounds::new(10, 10, 50, 50);
        let c = Bounds::new(0, 0, 100, 100);
        assert_eq!(contained_pictures(&[a, b]), vec![false, true]);
        assert_eq!(contained_pictures(&[a, c]), vec![false, false]);
        assert_eq!(contained_pictures(&[a, c, b]), vec![false, false, true]);
        assert!(contained_pictures(&[]).is_empty());
    }
}
