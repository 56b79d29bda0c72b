//! Arena-backed document tree.
//!
//! Nodes live in a flat [`NodeArena`] and refer to each other by [`NodeId`].
//! Text-bearing nodes hold [`Span`]s into the document's owned source rather
//! than copies of it.

use std::collections::{BTreeMap, HashMap};

/// Byte range into the document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Index of a node inside a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Attribute map of a tagged element; repeated keys accumulate values.
pub type Attributes = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementContent {
    /// `~tag~`
    Empty,
    /// Content parsed into child nodes.
    Nodes(Vec<NodeId>),
    /// Content kept verbatim (`raw` attribute or a verbatim tag).
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Attributes,
    /// Source text between the opening and closing delimiters.
    pub span: Option<Span>,
    pub content: ElementContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(Span),
    Paragraph(Vec<NodeId>),
    Header {
        level: u8,
        children: Vec<NodeId>,
        ordinal: usize,
    },
    List {
        ordered: bool,
        items: Vec<NodeId>,
    },
    ListItem {
        ordered: bool,
        indent: usize,
        children: Vec<NodeId>,
    },
    Table {
        head: Vec<NodeId>,
        rows: Vec<Vec<NodeId>>,
    },
    Cell(Vec<NodeId>),
    BlockQuote(Vec<NodeId>),
    CodeBlock {
        lang: Option<String>,
        raw: Span,
    },
    InlineCode {
        lang: Option<String>,
        raw: Span,
    },
    Bold(Vec<NodeId>),
    Italic(Vec<NodeId>),
    BoldItalic(Vec<NodeId>),
    Link {
        text: Span,
        href: String,
    },
    ObjectLink {
        id: String,
        span: Span,
    },
    Citation {
        id: String,
        span: Span,
    },
    TableOfContentsMarker,
    MathBlock {
        equation: Span,
        inline: bool,
    },
    Element(Element),
    /// Transient; removed by paragraph inflation.
    ParagraphBreak,
}

impl Node {
    /// Child ids in document order, whatever the variant.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::Paragraph(children)
            | Node::Header { children, .. }
            | Node::ListItem { children, .. }
            | Node::Cell(children)
            | Node::BlockQuote(children)
            | Node::Bold(children)
            | Node::Italic(children)
            | Node::BoldItalic(children) => children.clone(),
            Node::List { items, .. } => items.clone(),
            Node::Table { head, rows } => head
                .iter()
                .chain(rows.iter().flatten())
                .copied()
                .collect(),
            Node::Element(Element {
                content: ElementContent::Nodes(children),
                ..
            }) => children.clone(),
            Node::Text(_)
            | Node::CodeBlock { .. }
            | Node::InlineCode { .. }
            | Node::Link { .. }
            | Node::ObjectLink { .. }
            | Node::Citation { .. }
            | Node::TableOfContentsMarker
            | Node::MathBlock { .. }
            | Node::Element(_)
            | Node::ParagraphBreak => Vec::new(),
        }
    }

    /// Whether the node closes an open paragraph during inflation.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Node::Header { .. }
                | Node::List { .. }
                | Node::ListItem { .. }
                | Node::Table { .. }
                | Node::CodeBlock { .. }
                | Node::BlockQuote(_)
                | Node::TableOfContentsMarker
                | Node::ParagraphBreak
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Web,
    GovPub,
    Other,
}

impl ReferenceKind {
    pub fn from_type(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("web") => ReferenceKind::Web,
            Some("gov-pub") => ReferenceKind::GovPub,
            _ => ReferenceKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub id: String,
    pub ordinal: usize,
    pub kind: ReferenceKind,
    pub fields: BTreeMap<String, String>,
    /// Location of the `* id` line.
    pub span: Span,
}

impl Reference {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// References in definition order, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: Vec<Reference>,
    index_by_id: HashMap<String, usize>,
}

impl ReferenceTable {
    /// Adds a reference, numbering it after the ones already defined.
    /// Returns the rejected reference when the id is already taken.
    pub fn define(
        &mut self,
        id: String,
        kind: ReferenceKind,
        fields: BTreeMap<String, String>,
        span: Span,
    ) -> std::result::Result<&Reference, Reference> {
        let ordinal = self.entries.len() + 1;
        let reference = Reference {
            id,
            ordinal,
            kind,
            fields,
            span,
        };
        if self.index_by_id.contains_key(&reference.id) {
            return Err(reference);
        }
        self.index_by_id
            .insert(reference.id.clone(), self.entries.len());
        self.entries.push(reference);
        Ok(&self.entries[ordinal - 1])
    }

    pub fn get(&self, id: &str) -> Option<&Reference> {
        self.index_by_id.get(id).map(|&idx| &self.entries[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A parsed document. Immutable once built.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    arena: NodeArena,
    roots: Vec<NodeId>,
    references: ReferenceTable,
}

impl Document {
    pub(crate) fn new(
        source: String,
        arena: NodeArena,
        roots: Vec<NodeId>,
        references: ReferenceTable,
    ) -> Self {
        Self {
            source,
            arena,
            roots,
            references,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.arena.get(id)
    }

    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    /// Source text covered by `span`.
    pub fn text(&self, span: Span) -> &str {
        &self.source[span.start..span.end]
    }

    /// All nodes reachable from the roots, depth-first in document order.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children().into_iter().rev());
        }
        out
    }

    /// Concatenated textual content of a node, without markup.
    pub fn plain_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_plain_text(id, &mut out);
        out
    }

    fn collect_plain_text(&self, id: NodeId, out: &mut String) {
        match self.node(id) {
            Node::Text(span)
            | Node::InlineCode { raw: span, .. }
            | Node::Link { text: span, .. }
            | Node::MathBlock {
                equation: span, ..
            } => out.push_str(self.text(*span)),
            Node::ObjectLink { id, .. } => out.push_str(id),
            Node::Element(Element {
                content: ElementContent::Raw,
                span: Some(span),
                ..
            }) => out.push_str(self.text(*span)),
            node => {
                for child in node.children() {
                    self.collect_plain_text(child, out);
                }
            }
        }
    }
}
