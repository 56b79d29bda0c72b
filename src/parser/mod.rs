//! MML parser - turns source text into an arena-backed [`Document`].
//!
//! Parsing runs in two passes. The scanner walks the text once, recognising
//! constructs in a fixed priority order and recursing into sub-spans (tagged
//! element bodies, list items, table cells, blockquote lines). The flat token
//! stream it produces is then inflated into paragraphs, with runs of list
//! items rebuilt into nested lists.

mod element;
mod escape;
mod inflate;
mod lists;
mod references;
mod scanner;
mod table;

pub use escape::{find_unescaped, is_escaped, unescape_markup};

use crate::core::ast::{Document, Node, NodeArena, NodeId, ReferenceTable, Span};
use crate::error::{context_at, Error};
use crate::Result;
use std::borrow::Cow;

/// Parses a whole document.
pub fn parse(source: &str) -> Result<Document> {
    let normalized = normalize_line_endings(source);
    let source: &str = &normalized;
    let mut parser = Parser::new(source);
    let (tokens, _) = parser.parse_elements(0, source.len())?;
    let roots = parser.inflate(tokens);
    tracing::debug!(
        nodes = parser.arena.len(),
        roots = roots.len(),
        headers = parser.next_ordinal - 1,
        references = parser.references.len(),
        "parsed document"
    );
    Ok(Document::new(
        source.to_string(),
        parser.arena,
        roots,
        parser.references,
    ))
}

/// CRLF pairs become `\n`; offsets in the resulting document refer to the
/// normalized text.
fn normalize_line_endings(source: &str) -> Cow<'_, str> {
    if source.contains("\r\n") {
        Cow::Owned(source.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(source)
    }
}

/// Parser state for a single document.
pub(crate) struct Parser<'s> {
    source: &'s str,
    arena: NodeArena,
    references: ReferenceTable,
    /// Next header ordinal, handed out in document order.
    next_ordinal: usize,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            arena: NodeArena::default(),
            references: ReferenceTable::default(),
            next_ordinal: 1,
        }
    }

    fn at_line_start(&self, pos: usize) -> bool {
        pos == 0 || self.source.as_bytes()[pos - 1] == b'\n'
    }

    fn take_ordinal(&mut self) -> usize {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        ordinal
    }

    /// Appends a text span, extending the previous text token when contiguous.
    fn push_text(&mut self, tokens: &mut Vec<NodeId>, span: Span) {
        if span.is_empty() {
            return;
        }
        if let Some(&last) = tokens.last() {
            if let Node::Text(prev) = self.arena.get_mut(last) {
                if prev.end == span.start {
                    prev.end = span.end;
                    return;
                }
            }
        }
        tokens.push(self.arena.alloc(Node::Text(span)));
    }

    /// Span between `pos` and `end` with surrounding whitespace removed.
    fn trim_span(&self, span: Span) -> Span {
        let text = &self.source[span.start..span.end];
        let start = span.start + (text.len() - text.trim_start().len());
        let end = span.start + text.trim_end().len();
        Span::new(start, end.max(start))
    }

    /// Skips trailing blanks and one newline after a closing delimiter line.
    fn skip_line_end(&self, pos: usize, end: usize) -> usize {
        let bytes = self.source.as_bytes();
        let mut cursor = pos;
        while cursor < end && matches!(bytes[cursor], b' ' | b'\t' | b'\r') {
            cursor += 1;
        }
        if cursor < end && bytes[cursor] == b'\n' {
            cursor + 1
        } else {
            cursor
        }
    }

    fn unterminated(&self, construct: &'static str, offset: usize) -> Error {
        Error::UnterminatedConstruct {
            construct,
            offset,
            context: context_at(self.source, offset),
        }
    }
}
