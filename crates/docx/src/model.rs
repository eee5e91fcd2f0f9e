//! Typed view of WordprocessingML story content.
//!
//! Block containers (a document body, a header, a footer, a table cell) hold [`Block`]s.
//! Paragraphs hold [`Inline`]s, of which [`Run`]s carry the text. Anything the model does not
//! need to edit is kept as an opaque [`Element`] and written back untouched.

use crate::xml::{Element, Node};

const PARAGRAPH: &str = "w:p";
const TABLE: &str = "w:tbl";
const TABLE_ROW: &str = "w:tr";
const TABLE_CELL: &str = "w:tc";
const RUN: &str = "w:r";
const RUN_PROPERTIES: &str = "w:rPr";
const TEXT: &str = "w:t";
const TAB: &str = "w:tab";
const BREAK: &str = "w:br";
const CARRIAGE_RETURN: &str = "w:cr";
const HYPERLINK: &str = "w:hyperlink";
const RELATIONSHIP_ID: &str = "r:id";

/// A block-level item inside a container.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Other(Element),
}

impl Block {
    pub(crate) fn from_element(element: Element) -> Self {
        match element.name.as_str() {
            PARAGRAPH => Block::Paragraph(Paragraph::from_element(element)),
            TABLE => Block::Table(Table::from_element(element)),
            _ => Block::Other(element),
        }
    }

    pub(crate) fn into_element(self) -> Element {
        match self {
            Block::Paragraph(paragraph) => paragraph.into_element(),
            Block::Table(table) => table.into_element(),
            Block::Other(element) => element,
        }
    }
}

/// Converts the element children of `element` into blocks, dropping inter-element whitespace.
pub(crate) fn blocks_from_children(children: Vec<Node>) -> Vec<Block> {
    children
        .into_iter()
        .filter_map(|node| match node {
            Node::Element(element) => Some(Block::from_element(element)),
            _ => None,
        })
        .collect()
}

pub(crate) fn blocks_into_children(blocks: Vec<Block>) -> Vec<Node> {
    blocks
        .into_iter()
        .map(|block| Node::Element(block.into_element()))
        .collect()
}

/// A paragraph-level item.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Run(Run),
    Hyperlink(Hyperlink),
    Other(Element),
}

impl Inline {
    fn from_element(element: Element) -> Self {
        match element.name.as_str() {
            RUN => Inline::Run(Run::from_element(element)),
            HYPERLINK => Inline::Hyperlink(Hyperlink::from_element(element)),
            _ => Inline::Other(element),
        }
    }

    fn into_element(self) -> Element {
        match self {
            Inline::Run(run) => run.into_element(),
            Inline::Hyperlink(hyperlink) => hyperlink.into_element(),
            Inline::Other(element) => element,
        }
    }
}

/// A `w:p` element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Inline>,
}

impl Paragraph {
    /// A paragraph made of one unstyled run per text.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes: Vec::new(),
            children: texts
                .into_iter()
                .map(|text| Inline::Run(Run::new(text)))
                .collect(),
        }
    }

    fn from_element(element: Element) -> Self {
        Self {
            attributes: element.attributes,
            children: element
                .children
                .into_iter()
                .filter_map(|node| match node {
                    Node::Element(element) => Some(Inline::from_element(element)),
                    _ => None,
                })
                .collect(),
        }
    }

    fn into_element(self) -> Element {
        Element {
            name: PARAGRAPH.to_string(),
            attributes: self.attributes,
            children: self
                .children
                .into_iter()
                .map(|inline| Node::Element(inline.into_element()))
                .collect(),
        }
    }

    /// The runs that are direct children of the paragraph, in order.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.children.iter().filter_map(|inline| match inline {
            Inline::Run(run) => Some(run),
            _ => None,
        })
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.children.iter_mut().filter_map(|inline| match inline {
            Inline::Run(run) => Some(run),
            _ => None,
        })
    }

    pub fn hyperlinks(&self) -> impl Iterator<Item = &Hyperlink> {
        self.children.iter().filter_map(|inline| match inline {
            Inline::Hyperlink(hyperlink) => Some(hyperlink),
            _ => None,
        })
    }

    /// Concatenated text of the direct runs. Hyperlink text is not included.
    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }

    /// Text as a reader sees it: runs and hyperlinks in document order.
    pub fn display_text(&self) -> String {
        self.children
            .iter()
            .map(|inline| match inline {
                Inline::Run(run) => run.text(),
                Inline::Hyperlink(hyperlink) => hyperlink.text(),
                Inline::Other(_) => String::new(),
            })
            .collect()
    }

    /// Offsets into [`Paragraph::text`] at which the non-run children sit, in order.
    pub fn anchor_offsets(&self) -> Vec<usize> {
        let mut offset = 0;
        let mut anchors = Vec::new();
        for inline in &self.children {
            match inline {
                Inline::Run(run) => offset += run.text().len(),
                _ => anchors.push(offset),
            }
        }
        anchors
    }

    /// Drops every direct run and inserts `pieces` in their place.
    ///
    /// Each piece is tagged with the offset into the old [`Paragraph::text`] where its text
    /// starts, and pieces must come in offset order. A non-run child (paragraph properties, a
    /// bookmark, an existing hyperlink or field) is put back before the first piece starting at
    /// or after its own offset, so it keeps its place relative to the text.
    pub fn replace_runs(&mut self, pieces: impl IntoIterator<Item = (usize, Inline)>) {
        let mut offset = 0;
        let mut kept = Vec::new();
        for inline in std::mem::take(&mut self.children) {
            match inline {
                Inline::Run(run) => offset += run.text().len(),
                other => kept.push((offset, other)),
            }
        }

        let mut kept = kept.into_iter().peekable();
        for (start, piece) in pieces {
            while let Some((_, inline)) = kept.next_if(|(at, _)| *at <= start) {
                self.children.push(inline);
            }
            self.children.push(piece);
        }
        self.children.extend(kept.map(|(_, inline)| inline));
    }
}

/// A piece of run content.
#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    Text(String),
    Tab,
    Break(Element),
    Other(Element),
}

/// A `w:r` element: optional properties plus content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Run {
    pub attributes: Vec<(String, String)>,
    pub properties: Option<Element>,
    pub content: Vec<RunContent>,
}

impl Run {
    /// An unstyled run holding `text`.
    pub fn new(text: impl Into<String>) -> Self {
        let mut run = Self::default();
        push_text(&mut run.content, &text.into());
        run
    }

    /// A run with the given `w:rPr` properties.
    pub fn styled(properties: Element, text: impl Into<String>) -> Self {
        let mut run = Self::new(text);
        run.properties = Some(properties);
        run
    }

    fn from_element(element: Element) -> Self {
        let mut run = Self {
            attributes: element.attributes,
            ..Self::default()
        };
        for node in element.children {
            let Node::Element(child) = node else {
                continue;
            };
            match child.name.as_str() {
                RUN_PROPERTIES => run.properties = Some(child),
                TEXT => run.content.push(RunContent::Text(child.text())),
                TAB => run.content.push(RunContent::Tab),
                BREAK | CARRIAGE_RETURN => run.content.push(RunContent::Break(child)),
                _ => run.content.push(RunContent::Other(child)),
            }
        }
        run
    }

    fn into_element(self) -> Element {
        let mut element = Element::new(RUN);
        element.attributes = self.attributes;
        if let Some(properties) = self.properties {
            element.children.push(Node::Element(properties));
        }
        for content in self.content {
            let child = match content {
                RunContent::Text(text) => text_element(text),
                RunContent::Tab => Element::new(TAB),
                RunContent::Break(element) | RunContent::Other(element) => element,
            };
            element.children.push(Node::Element(child));
        }
        element
    }

    /// The run text, with tabs as `\t` and breaks as `\n`.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for content in &self.content {
            match content {
                RunContent::Text(value) => text.push_str(value),
                RunContent::Tab => text.push('\t'),
                RunContent::Break(_) => text.push('\n'),
                RunContent::Other(_) => {}
            }
        }
        text
    }

    /// The run text cut at every tab, break or other non-text item. Joined, the pieces equal
    /// [`Run::text`]; adjacent `w:t` items form one piece.
    pub fn text_pieces(&self) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        for content in &self.content {
            match content {
                RunContent::Text(value) => current.push_str(value),
                RunContent::Tab => {
                    pieces.push(std::mem::take(&mut current));
                    pieces.push("\t".to_string());
                }
                RunContent::Break(_) => {
                    pieces.push(std::mem::take(&mut current));
                    pieces.push("\n".to_string());
                }
                RunContent::Other(_) => pieces.push(std::mem::take(&mut current)),
            }
        }
        pieces.push(current);
        pieces
    }

    /// Rewrites each stretch of adjacent text items with `replace`, which returns `None` to
    /// leave a stretch as it is. Tabs, breaks and other content stay exactly where they were.
    ///
    /// Returns whether any text changed.
    pub fn rewrite_text<F>(&mut self, mut replace: F) -> bool
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut changed = false;
        let mut stretch = Vec::new();
        let mut content = Vec::with_capacity(self.content.len());
        for item in std::mem::take(&mut self.content) {
            match item {
                RunContent::Text(text) => stretch.push(text),
                other => {
                    changed |= flush_stretch(&mut stretch, &mut content, &mut replace);
                    content.push(other);
                }
            }
        }
        changed |= flush_stretch(&mut stretch, &mut content, &mut replace);
        self.content = content;
        changed
    }
}

fn flush_stretch<F>(
    stretch: &mut Vec<String>,
    content: &mut Vec<RunContent>,
    replace: &mut F,
) -> bool
where
    F: FnMut(&str) -> Option<String>,
{
    if stretch.is_empty() {
        return false;
    }
    match replace(&stretch.concat()) {
        Some(text) => {
            stretch.clear();
            push_text(content, &text);
            true
        }
        None => {
            content.extend(stretch.drain(..).map(RunContent::Text));
            false
        }
    }
}

/// Appends `text` as run content, turning `\t` into `w:tab` and `\n` into `w:br`.
fn push_text(content: &mut Vec<RunContent>, text: &str) {
    let mut current = String::new();
    for ch in text.chars() {
        match ch {
            '\t' | '\n' => {
                if !current.is_empty() {
                    content.push(RunContent::Text(std::mem::take(&mut current)));
                }
                content.push(if ch == '\t' {
                    RunContent::Tab
                } else {
                    RunContent::Break(Element::new(BREAK))
                });
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        content.push(RunContent::Text(current));
    }
}

fn text_element(text: String) -> Element {
    let element = Element::new(TEXT);
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        element.with_attribute("xml:space", "preserve").with_text(text)
    } else {
        element.with_text(text)
    }
}

/// A `w:hyperlink` element.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperlink {
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Inline>,
}

impl Hyperlink {
    /// A hyperlink pointing at the relationship `relationship_id` and showing `runs`.
    pub fn external(relationship_id: impl Into<String>, runs: Vec<Run>) -> Self {
        Self {
            attributes: vec![(RELATIONSHIP_ID.to_string(), relationship_id.into())],
            children: runs.into_iter().map(Inline::Run).collect(),
        }
    }

    fn from_element(element: Element) -> Self {
        Self {
            attributes: element.attributes,
            children: element
                .children
                .into_iter()
                .filter_map(|node| match node {
                    Node::Element(element) => Some(Inline::from_element(element)),
                    _ => None,
                })
                .collect(),
        }
    }

    fn into_element(self) -> Element {
        Element {
            name: HYPERLINK.to_string(),
            attributes: self.attributes,
            children: self
                .children
                .into_iter()
                .map(|inline| Node::Element(inline.into_element()))
                .collect(),
        }
    }

    pub fn relationship_id(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == RELATIONSHIP_ID)
            .map(|(_, value)| value.as_str())
    }

    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.children.iter().filter_map(|inline| match inline {
            Inline::Run(run) => Some(run),
            _ => None,
        })
    }

    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }
}

/// A `w:tbl` element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub attributes: Vec<(String, String)>,
    pub children: Vec<TableItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableItem {
    Row(TableRow),
    Other(Element),
}

/// A `w:tr` element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    pub attributes: Vec<(String, String)>,
    pub children: Vec<RowItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowItem {
    Cell(TableCell),
    Other(Element),
}

/// A `w:tc` element. Cell properties are kept as an opaque leading block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableCell {
    pub attributes: Vec<(String, String)>,
    pub blocks: Vec<Block>,
}

impl Table {
    /// A table with one row per entry, each cell holding the given blocks.
    pub fn from_rows(rows: Vec<Vec<Vec<Block>>>) -> Self {
        Self {
            attributes: Vec::new(),
            children: rows
                .into_iter()
                .map(|cells| {
                    TableItem::Row(TableRow {
                        attributes: Vec::new(),
                        children: cells
                            .into_iter()
                            .map(|blocks| {
                                RowItem::Cell(TableCell {
                                    attributes: Vec::new(),
                                    blocks,
                                })
                            })
                            .collect(),
                    })
                })
                .collect(),
        }
    }

    fn from_element(element: Element) -> Self {
        let children = element
            .children
            .into_iter()
            .filter_map(|node| match node {
                Node::Element(child) if child.name == TABLE_ROW => {
                    Some(TableItem::Row(TableRow::from_element(child)))
                }
                Node::Element(child) => Some(TableItem::Other(child)),
                _ => None,
            })
            .collect();
        Self {
            attributes: element.attributes,
            children,
        }
    }

    fn into_element(self) -> Element {
        Element {
            name: TABLE.to_string(),
            attributes: self.attributes,
            children: self
                .children
                .into_iter()
                .map(|item| {
                    Node::Element(match item {
                        TableItem::Row(row) => row.into_element(),
                        TableItem::Other(element) => element,
                    })
                })
                .collect(),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.children.iter().filter_map(|item| match item {
            TableItem::Row(row) => Some(row),
            TableItem::Other(_) => None,
        })
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut TableRow> {
        self.children.iter_mut().filter_map(|item| match item {
            TableItem::Row(row) => Some(row),
            TableItem::Other(_) => None,
        })
    }
}

impl TableRow {
    fn from_element(element: Element) -> Self {
        let children = element
            .children
            .into_iter()
            .filter_map(|node| match node {
                Node::Element(child) if child.name == TABLE_CELL => {
                    Some(RowItem::Cell(TableCell {
                        attributes: child.attributes,
                        blocks: blocks_from_children(child.children),
                    }))
                }
                Node::Element(child) => Some(RowItem::Other(child)),
                _ => None,
            })
            .collect();
        Self {
            attributes: element.attributes,
            children,
        }
    }

    fn into_element(self) -> Element {
        Element {
            name: TABLE_ROW.to_string(),
            attributes: self.attributes,
            children: self
                .children
                .into_iter()
                .map(|item| {
                    Node::Element(match item {
                        RowItem::Cell(cell) => Element {
                            name: TABLE_CELL.to_string(),
                            attributes: cell.attributes,
                            children: blocks_into_children(cell.blocks),
                        },
                        RowItem::Other(element) => element,
                    })
                })
                .collect(),
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.children.iter().filter_map(|item| match item {
            RowItem::Cell(cell) => Some(cell),
            RowItem::Other(_) => None,
        })
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut TableCell> {
        self.children.iter_mut().filter_map(|item| match item {
            RowItem::Cell(cell) => Some(cell),
            RowItem::Other(_) => None,
        })
    }
}
