//! Page-at-a-time decomposition of an ABBYY document.
//!
//! The document is read as a stream of XML events. Only the subtree of the
//! page currently being read is materialized, in a [`PageArena`] owned by the
//! returned [`PageRecord`]; dropping the record releases every node of that
//! page. Nothing outside `<page>` elements is retained, and the calibration
//! page (page 0) is skipped without being built at all.

use std::io::BufRead;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;

use super::{Dialect, SourceDocument};
use crate::error::{Error, Result, UNKNOWN_DOCUMENT};

/// Index of a node inside a [`PageArena`].
pub type NodeId = usize;

/// Shared counter of live arena nodes.
///
/// Every node pushed into an arena carrying a ledger increments the count;
/// dropping the arena subtracts its nodes again. Used to verify that at most
/// one page is resident at a time.
#[derive(Debug, Clone, Default)]
pub struct NodeLedger(Arc<AtomicUsize>);

impl NodeLedger {
    /// Create a ledger at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently alive.
    pub fn live(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn add(&self, n: usize) {
        self.0.fetch_add(n, Ordering::SeqCst);
    }

    fn release(&self, n: usize) {
        self.0.fetch_sub(n, Ordering::SeqCst);
    }
}

#[derive(Debug)]
enum Node {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        children: Vec<NodeId>,
    },
    Text(String),
}

/// Flat storage for one page's subtree.
#[derive(Debug)]
pub struct PageArena {
    nodes: Vec<Node>,
    ledger: Option<NodeLedger>,
}

impl PageArena {
    fn new(ledger: Option<NodeLedger>) -> Self {
        Self {
            nodes: Vec::new(),
            ledger,
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        if let Some(ledger) = &self.ledger {
            ledger.add(1);
        }
        self.nodes.len() - 1
    }

    fn push_element(&mut self, name: String, attrs: Vec<(String, String)>) -> NodeId {
        self.push(Node::Element {
            name,
            attrs,
            children: Vec::new(),
        })
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(Node::Element { children, .. }) = self.nodes.get_mut(parent) {
            children.push(child);
        }
    }

    /// Number of nodes held.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Drop for PageArena {
    fn drop(&mut self) {
        if let Some(ledger) = &self.ledger {
            ledger.release(self.nodes.len());
        }
    }
}

/// A borrowed view of one element in a page arena.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    arena: &'a PageArena,
    id: NodeId,
}

impl<'a> Element<'a> {
    fn node(&self) -> &'a Node {
        &self.arena.nodes[self.id]
    }

    /// Local (unprefixed) element name.
    pub fn name(&self) -> &'a str {
        match self.node() {
            Node::Element { name, .. } => name,
            Node::Text(_) => "",
        }
    }

    /// Check the local name against a dialect tag.
    pub fn is(&self, name: &[u8]) -> bool {
        self.name().as_bytes() == name
    }

    /// Raw attributes in document order.
    pub fn attributes(&self) -> &'a [(String, String)] {
        match self.node() {
            Node::Element { attrs, .. } => attrs,
            Node::Text(_) => &[],
        }
    }

    /// Get an attribute by local name.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.attributes()
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn child_ids(&self) -> &'a [NodeId] {
        match self.node() {
            Node::Element { children, .. } => children,
            Node::Text(_) => &[],
        }
    }

    /// Element children in document order.
    pub fn children(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let arena = self.arena;
        self.child_ids()
            .iter()
            .filter(move |&&id| matches!(arena.nodes[id], Node::Element { .. }))
            .map(move |&id| Element { arena, id })
    }

    /// Element children with the given local name.
    pub fn children_named(&self, name: &'a [u8]) -> impl Iterator<Item = Element<'a>> + 'a {
        self.children().filter(move |e| e.is(name))
    }

    /// All descendants with the given local name, in document order.
    /// Matches nested inside matches are included.
    pub fn descendants(&self, name: &[u8]) -> Vec<Element<'a>> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.child_ids().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Node::Element { children, .. } = &self.arena.nodes[id] {
                let element = Element {
                    arena: self.arena,
                    id,
                };
                if element.is(name) {
                    found.push(element);
                }
                stack.extend(children.iter().rev().copied());
            }
        }
        found
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut text = String::new();
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            match &self.arena.nodes[id] {
                Node::Text(t) => text.push_str(t),
                Node::Element { children, .. } => stack.extend(children.iter().rev().copied()),
            }
        }
        text
    }
}

/// One materialized page.
#[derive(Debug)]
pub struct PageRecord {
    /// Page number; the calibration page is 0 and never yielded
    pub page_no: u32,
    /// Declared page width in pixels
    pub width: u32,
    /// Declared page height in pixels
    pub height: u32,
    arena: PageArena,
}

impl PageRecord {
    /// The `<page>` element.
    pub fn root(&self) -> Element<'_> {
        Element {
            arena: &self.arena,
            id: 0,
        }
    }

    /// Number of nodes materialized for this page.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }
}

enum Step {
    Open {
        qname: Vec<u8>,
        local: String,
        attrs: Vec<(String, String)>,
        empty: bool,
    },
    Close,
    Text(String),
    Eof,
    Skip,
}

/// Iterator over the content pages of an ABBYY document.
pub struct PageStream<R: BufRead> {
    reader: Reader<R>,
    dialect: &'static Dialect,
    buf: Vec<u8>,
    skip_buf: Vec<u8>,
    next_page_no: u32,
    pending: Option<PageArena>,
    stack: Vec<NodeId>,
    open_ancestors: usize,
    ledger: Option<NodeLedger>,
    document: String,
    finished: bool,
}

impl<R: BufRead> PageStream<R> {
    /// Create a page stream over a reader.
    pub fn new(reader: R, dialect: &'static Dialect) -> Self {
        let mut reader = Reader::from_reader(reader);
        reader.trim_text(false);
        Self {
            reader,
            dialect,
            buf: Vec::new(),
            skip_buf: Vec::new(),
            next_page_no: 0,
            pending: None,
            stack: Vec::new(),
            open_ancestors: 0,
            ledger: None,
            document: UNKNOWN_DOCUMENT.to_string(),
            finished: false,
        }
    }

    /// Account every materialized node in a ledger.
    pub fn with_ledger(mut self, ledger: NodeLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Name used when reporting errors.
    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document = name.into();
        self
    }

    /// Number of `<page>` elements seen so far, calibration page included.
    pub fn pages_seen(&self) -> u32 {
        self.next_page_no
    }

    /// Nodes currently held by the stream itself. Zero between pages.
    pub fn buffered_nodes(&self) -> usize {
        self.pending.as_ref().map_or(0, PageArena::len)
    }

    fn read_step(&mut self) -> Result<Step> {
        let inside_page = self.pending.is_some();
        let page = self.dialect.page;
        let char_params = self.dialect.char_params;

        let step = match self.reader.read_event_into(&mut self.buf)? {
            Event::Start(e) => {
                let step = open_step(&e, inside_page, page, char_params, false)?;
                // Elements enclosing the pages, the root among them
                if !inside_page && matches!(step, Step::Skip) {
                    self.open_ancestors += 1;
                }
                step
            }
            Event::Empty(e) => open_step(&e, inside_page, page, char_params, true)?,
            Event::End(_) if inside_page => Step::Close,
            Event::End(_) => {
                self.open_ancestors = self.open_ancestors.saturating_sub(1);
                Step::Skip
            }
            Event::Text(t) if inside_page => {
                let text = t.unescape()?;
                // Indentation between elements
                if text.contains('\n') && text.trim().is_empty() {
                    Step::Skip
                } else {
                    Step::Text(text.into_owned())
                }
            }
            Event::CData(c) if inside_page => {
                Step::Text(String::from_utf8_lossy(&c.into_inner()).into_owned())
            }
            Event::Eof => Step::Eof,
            _ => Step::Skip,
        };
        Ok(step)
    }

    fn advance(&mut self) -> Result<Option<PageRecord>> {
        loop {
            self.buf.clear();
            match self.read_step()? {
                Step::Open {
                    qname,
                    local,
                    attrs,
                    empty,
                } => {
                    if let Some(arena) = self.pending.as_mut() {
                        let id = arena.push_element(local, attrs);
                        if let Some(&parent) = self.stack.last() {
                            arena.append_child(parent, id);
                        }
                        if !empty {
                            self.stack.push(id);
                        }
                        continue;
                    }
                    if local.as_bytes() != self.dialect.page {
                        continue;
                    }

                    let page_no = self.next_page_no;
                    self.next_page_no += 1;

                    if page_no == 0 {
                        log::debug!("Skipping calibration page");
                        if !empty {
                            self.skip_buf.clear();
                            self.reader
                                .read_to_end_into(QName(&qname), &mut self.skip_buf)?;
                        }
                        continue;
                    }

                    let mut arena = PageArena::new(self.ledger.clone());
                    let root = arena.push_element(local, attrs);
                    if empty {
                        return Ok(Some(finish_page(page_no, arena)));
                    }
                    self.stack.push(root);
                    self.pending = Some(arena);
                }
                Step::Close => {
                    self.stack.pop();
                    if self.stack.is_empty() {
                        if let Some(arena) = self.pending.take() {
                            return Ok(Some(finish_page(self.next_page_no - 1, arena)));
                        }
                    }
                }
                Step::Text(text) => {
                    if let (Some(arena), Some(&parent)) = (self.pending.as_mut(), self.stack.last())
                    {
                        let id = arena.push(Node::Text(text));
                        arena.append_child(parent, id);
                    }
                }
                Step::Eof => {
                    if self.pending.is_some() || self.open_ancestors > 0 {
                        return Err(Error::UnexpectedEof {
                            document: UNKNOWN_DOCUMENT.to_string(),
                        });
                    }
                    return Ok(None);
                }
                Step::Skip => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for PageStream<R> {
    type Item = Result<PageRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.advance() {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                self.pending = None;
                self.stack.clear();
                Some(Err(e.in_document(&self.document)))
            }
        }
    }
}

fn open_step(
    e: &BytesStart<'_>,
    inside_page: bool,
    page: &[u8],
    char_params: &[u8],
    empty: bool,
) -> Result<Step> {
    let local_bytes = e.local_name();
    let local_bytes = local_bytes.as_ref();
    if !inside_page && local_bytes != page {
        return Ok(Step::Skip);
    }
    let attrs = if local_bytes == char_params {
        Vec::new()
    } else {
        collect_attributes(e)?
    };
    Ok(Step::Open {
        qname: e.name().as_ref().to_vec(),
        local: String::from_utf8_lossy(local_bytes).into_owned(),
        attrs,
        empty,
    })
}

fn finish_page(page_no: u32, arena: PageArena) -> PageRecord {
    let root = Element {
        arena: &arena,
        id: 0,
    };
    let dimension = |name: &str| {
        root.attr(name)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(0)
    };
    let width = dimension("width");
    let height = dimension("height");
    PageRecord {
        page_no,
        width,
        height,
        arena,
    }
}

/// Collect an element's attributes keyed by local name.
pub(crate) fn collect_attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}

/// Run `callback` once per content page, releasing each page before the next
/// is read. Returns the number of `<page>` elements seen.
pub fn for_each_page<F>(
    source: &SourceDocument,
    dialect: &'static Dialect,
    ledger: Option<NodeLedger>,
    mut callback: F,
) -> Result<u32>
where
    F: FnMut(&PageRecord) -> Result<()>,
{
    let mut stream = PageStream::new(source.open()?, dialect).with_document_name(source.name());
    if let Some(ledger) = ledger {
        stream = stream.with_ledger(ledger);
    }
    for page in stream.by_ref() {
        let page = page?;
        callback(&page)?;
    }
    Ok(stream.pages_seen())
}
