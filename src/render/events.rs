//! Structural events derived from the flat block sequence.
//!
//! The block sequence is flat on purpose: tables arrive as bracketing
//! blocks, chapters as level-1 headings or section breaks, footnotes as
//! ordinary text with a role. [`EventStream`] re-walks the sequence once and
//! turns it into events a renderer can print without further bookkeeping.
//!
//! # Example
//!
//! ```no_run
//! use unabbyy::render::{EventStream, RenderEvent, RenderOptions};
//!
//! fn main() -> unabbyy::Result<()> {
//!     let doc = unabbyy::parse_file("book_abbyy.xml")?;
//!     let options = RenderOptions::default();
//!     for event in EventStream::new(&doc, None, &options) {
//!         if let RenderEvent::Heading { text, level } = event {
//!             println!("{} {}", level, text);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::VecDeque;

use crate::analyze::RunningElements;
use crate::model::{ContentBlock, FlatDocument, PictureBlock, Role, TextBlock};

use super::RenderOptions;

/// Events emitted while re-walking a document.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent<'a> {
    /// A new chapter begins
    ChapterStart {
        /// Page the chapter starts on
        page_no: u32,
    },

    /// A heading; level 1 always follows a `ChapterStart`
    Heading {
        /// Heading text
        text: &'a str,
        /// Heading level, 1 or more
        level: u8,
    },

    /// A paragraph of text
    Paragraph {
        /// Paragraph text
        text: &'a str,
        /// Paragraph role
        role: Role,
    },

    /// A picture placeholder
    Picture(&'a PictureBlock),

    /// A complete table
    Table(TableGrid),

    /// Footnotes collected since the last chapter start
    Footnotes(Vec<&'a str>),

    /// The end of a page
    PageEnd {
        /// Page number
        page_no: u32,
    },
}

/// Table cells assembled from the bracketing blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableGrid {
    /// Rows of cells; a cell's paragraphs are joined with `\n`
    pub rows: Vec<Vec<String>>,
}

impl TableGrid {
    /// Widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check if the table has no cells.
    pub fn is_empty(&self) -> bool {
        self.column_count() == 0
    }
}

/// Table under construction. The flags of the open row and cell decide
/// when the table is complete.
#[derive(Debug, Default)]
struct OpenTable {
    grid: TableGrid,
    row_is_last: bool,
    cell_is_last: bool,
}

impl OpenTable {
    fn open_row(&mut self, is_last: bool) {
        self.grid.rows.push(Vec::new());
        self.row_is_last = is_last;
    }

    fn open_cell(&mut self, is_last: bool) {
        if self.grid.rows.is_empty() {
            self.open_row(false);
        }
        if let Some(row) = self.grid.rows.last_mut() {
            row.push(String::new());
        }
        self.cell_is_last = is_last;
    }

    /// Append a paragraph; returns true when this closes the table.
    fn push_text(&mut self, text: &str, is_last: bool) -> bool {
        if self.grid.rows.last().map_or(true, Vec::is_empty) {
            self.open_cell(false);
        }
        if let Some(cell) = self.grid.rows.last_mut().and_then(|row| row.last_mut()) {
            if !text.is_empty() {
                if !cell.is_empty() {
                    cell.push('\n');
                }
                cell.push_str(text);
            }
        }
        is_last && self.cell_is_last && self.row_is_last
    }
}

/// Iterator over the [`RenderEvent`]s of a document.
pub struct EventStream<'a> {
    blocks: std::slice::Iter<'a, ContentBlock>,
    running: Option<&'a RunningElements>,
    suppress_running: bool,
    queue: VecDeque<RenderEvent<'a>>,
    table: Option<OpenTable>,
    footnotes: Vec<&'a str>,
    chapter_pending: bool,
    finished: bool,
}

impl<'a> EventStream<'a> {
    /// Create a stream over `doc`.
    ///
    /// Suppression uses the flags set by [`RunningElements::annotate`] and,
    /// when given, the findings themselves.
    pub fn new(
        doc: &'a FlatDocument,
        running: Option<&'a RunningElements>,
        options: &RenderOptions,
    ) -> Self {
        Self {
            blocks: doc.blocks.iter(),
            running,
            suppress_running: options.suppress_running_elements,
            queue: VecDeque::new(),
            table: None,
            footnotes: Vec::new(),
            chapter_pending: false,
            finished: false,
        }
    }

    fn is_hidden(&self, block: &ContentBlock, text: &TextBlock) -> bool {
        self.suppress_running
            && (text.suppressed || self.running.is_some_and(|r| r.is_block_suppressed(block)))
    }

    fn flush_table(&mut self) {
        if let Some(table) = self.table.take() {
            self.emit(RenderEvent::Table(table.grid));
        }
    }

    fn flush_footnotes(&mut self) {
        if !self.footnotes.is_empty() {
            let notes = std::mem::take(&mut self.footnotes);
            self.queue.push_back(RenderEvent::Footnotes(notes));
        }
    }

    fn start_chapter(&mut self, page_no: u32) {
        self.flush_footnotes();
        if !self.chapter_pending {
            self.queue.push_back(RenderEvent::ChapterStart { page_no });
            self.chapter_pending = true;
        }
    }

    fn emit(&mut self, event: RenderEvent<'a>) {
        self.chapter_pending = false;
        self.queue.push_back(event);
    }

    fn table_mut(&mut self) -> &mut OpenTable {
        self.table.get_or_insert_with(OpenTable::default)
    }

    fn process(&mut self, block: &'a ContentBlock) {
        if !block.is_table_part() {
            self.flush_table();
        }

        match block {
            ContentBlock::Text(text) => {
                if self.is_hidden(block, text) {
                    return;
                }
                match text.role {
                    Role::Footnote => self.footnotes.push(&text.text),
                    Role::Heading => {
                        let level = text.heading_level.unwrap_or(1).max(1);
                        if text.starts_chapter() {
                            self.start_chapter(text.page_no);
                        }
                        self.emit(RenderEvent::Heading {
                            text: &text.text,
                            level,
                        });
                    }
                    role => self.emit(RenderEvent::Paragraph {
                        text: &text.text,
                        role,
                    }),
                }
            }
            ContentBlock::Picture(picture) => self.emit(RenderEvent::Picture(picture)),
            ContentBlock::Table { .. } => {
                self.flush_table();
                self.table = Some(OpenTable::default());
            }
            ContentBlock::TableRow {
                is_last_in_parent, ..
            } => self.table_mut().open_row(*is_last_in_parent),
            ContentBlock::TableCell {
                is_last_in_parent, ..
            } => self.table_mut().open_cell(*is_last_in_parent),
            ContentBlock::TableText {
                text,
                is_last_in_parent,
                ..
            } => {
                if self.table_mut().push_text(text, *is_last_in_parent) {
                    self.flush_table();
                }
            }
            ContentBlock::PageMarker { page_no } => {
                self.queue.push_back(RenderEvent::PageEnd { page_no: *page_no });
            }
            ContentBlock::SectionBreak { page_no } => self.start_chapter(*page_no),
            ContentBlock::Separator { .. } | ContentBlock::Unrecognized { .. } => {}
        }
    }
}

impl<'a> Iterator for EventStream<'a> {
    type Item = RenderEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Some(event);
            }
            if self.finished {
                return None;
            }
            match self.blocks.next() {
                Some(block) => self.process(block),
                None => {
                    self.flush_table();
                    self.flush_footnotes();
                    self.finished = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::SchemaVersion;
    use crate::model::BlockAttributes;
    use std::sync::Arc;

    fn heading(page_no: u32, text: &str, level: u8) -> ContentBlock {
        let mut block = TextBlock::new(page_no, text);
        block.role = Role::Heading;
        block.heading_level = Some(level);
        ContentBlock::Text(block)
    }

    fn footnote(page_no: u32, text: &str) -> ContentBlock {
        let mut block = TextBlock::new(page_no, text);
        block.role = Role::Footnote;
        ContentBlock::Text(block)
    }

    fn table(page_no: u32, shape: &[&[&[&str]]]) -> Vec<ContentBlock> {
        let style: Arc<BlockAttributes> = Arc::new(BlockAttributes::new());
        let mut out = vec![ContentBlock::Table {
            page_no,
            style: Arc::clone(&style),
            is_last_in_parent: false,
        }];
        for (r, row) in shape.iter().enumerate() {
            out.push(ContentBlock::TableRow {
                page_no,
                style: Arc::clone(&style),
                is_last_in_parent: r + 1 == shape.len(),
            });
            for (c, cell) in row.iter().enumerate() {
                out.push(ContentBlock::TableCell {
                    page_no,
                    style: Arc::clone(&style),
                    is_last_in_parent: c + 1 == row.len(),
                });
                for (t, text) in cell.iter().enumerate() {
                    out.push(ContentBlock::TableText {
                        page_no,
                        style: Arc::clone(&style),
                        text: text.to_string(),
                        is_last_in_parent: t + 1 == cell.len(),
                    });
                }
            }
        }
        out
    }

    fn doc(blocks: Vec<ContentBlock>) -> FlatDocument {
        let mut doc = FlatDocument::new(SchemaVersion::FineReader10);
        doc.blocks = blocks;
        doc
    }

    fn events(doc: &FlatDocument) -> Vec<RenderEvent<'_>> {
        EventStream::new(doc, None, &RenderOptions::default()).collect()
    }

    #[test]
    fn test_table_closed_by_flags() {
        let mut blocks = table(2, &[&[&["a"], &["b", "b2"]], &[&["c"], &[""]]]);
        blocks.push(ContentBlock::Text(TextBlock::new(2, "after")));
        let doc = doc(blocks);
        let events = events(&doc);

        assert_eq!(events.len(), 2);
        match &events[0] {
            RenderEvent::Table(grid) => {
                assert_eq!(grid.rows, vec![vec!["a", "b\nb2"], vec!["c", ""]]);
                assert_eq!(grid.column_count(), 2);
            }
            other => panic!("expected table, got {:?}", other),
        }
        assert_eq!(
            events[1],
            RenderEvent::Paragraph {
                text: "after",
                role: Role::Text
            }
        );
    }

    #[test]
    fn test_adjacent_tables_stay_separate() {
        let mut blocks = table(3, &[&[&["x"]]]);
        blocks.extend(table(3, &[&[&["y"]]]));
        let doc = doc(blocks);
        let tables: Vec<_> = events(&doc)
            .into_iter()
            .filter(|e| matches!(e, RenderEvent::Table(_)))
            .collect();
        assert_eq!(tables.len(), 2);
    }

    #[test]
    fn test_footnotes_deferred_to_chapter_end() {
        let doc = doc(vec![
            heading(1, "One", 1),
            ContentBlock::Text(TextBlock::new(1, "Body")),
            footnote(1, "Note a"),
            ContentBlock::Text(TextBlock::new(2, "More")),
            heading(3, "Two", 1),
            footnote(3, "Note b"),
        ]);
        let events = events(&doc);

        assert_eq!(events[0], RenderEvent::ChapterStart { page_no: 1 });
        assert_eq!(events[3], RenderEvent::Paragraph { text: "More", role: Role::Text });
        assert_eq!(events[4], RenderEvent::Footnotes(vec!["Note a"]));
        assert_eq!(events[5], RenderEvent::ChapterStart { page_no: 3 });
        assert_eq!(events.last(), Some(&RenderEvent::Footnotes(vec!["Note b"])));
    }

    #[test]
    fn test_section_break_and_heading_share_one_chapter() {
        let doc = doc(vec![
            ContentBlock::SectionBreak { page_no: 4 },
            heading(4, "Preface", 1),
            heading(4, "Sub", 2),
        ]);
        let events = events(&doc);
        assert_eq!(
            events,
            vec![
                RenderEvent::ChapterStart { page_no: 4 },
                RenderEvent::Heading { text: "Preface", level: 1 },
                RenderEvent::Heading { text: "Sub", level: 2 },
            ]
        );
    }

    #[test]
    fn test_suppressed_and_void_blocks_skipped() {
        let mut hidden = TextBlock::new(1, "HEADER");
        hidden.suppressed = true;
        let doc = doc(vec![
            ContentBlock::Text(hidden),
            ContentBlock::Separator { page_no: 1 },
            ContentBlock::Unrecognized {
                page_no: 1,
                block_type: Some("Barcode".to_string()),
            },
            ContentBlock::PageMarker { page_no: 1 },
        ]);
        assert_eq!(events(&doc), vec![RenderEvent::PageEnd { page_no: 1 }]);

        let keep = RenderOptions::new().with_running_elements(false);
        let all: Vec<_> = EventStream::new(&doc, None, &keep).collect();
        assert_eq!(all.len(), 2);
    }
}
