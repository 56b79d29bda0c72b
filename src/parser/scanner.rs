//! Construct scanner.
//!
//! At every position the scanner tries each construct in [`PRIORITY`] order
//! and falls back to a literal run up to the next possible marker. Scanning is
//! strictly left to right, so an escaped backslash is consumed before it can
//! escape the character after it.

use super::escape::{find_line_delimiter, unescape_markup};
use super::Parser;
use crate::core::ast::{Node, NodeId, Span};
use crate::Result;
use regex::{Captures, Regex};
use std::sync::LazyLock;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("scanner pattern must compile"));
    };
}

pattern!(BOLD_ITALIC, r"^\*\*\*((?:\\.|[^*\\\n])+?)\*\*\*");
pattern!(BOLD, r"^\*\*((?:\\.|[^*\\\n])+?)\*\*");
pattern!(ITALIC, r"^\*((?:\\.|[^*\s\\])(?:\\.|[^*\\\n])*?)\*");
pattern!(LIST_ITEM, r"^([ \t]*)([-*$]) ([^\n]*)(?:\n|$)");
pattern!(HEADER, r"^(#{1,6})[ \t]+([^\n]*?)[ \t]*(?:\n|$)");
pattern!(OBJECT_LINK, r"^\[\[((?:\\.|[^\]\\\n])+)\]\]");
pattern!(LINK, r"^\[((?:\\.|[^\]\\\n])*)\]\(([^)\s]*)\)");
pattern!(CITATION, r"^\^\[((?:\\\S|[^\]\s\\])+)\]");
pattern!(CODE_FENCE, r"^```([A-Za-z0-9_+.#-]*)[ \t]*\n");
pattern!(INLINE_CODE, r"^`(?:<([A-Za-z0-9_+.#-]+)>)?([^`\n]*)`");
pattern!(TOC_DIRECTIVE, r"^@(?:TOC|TableOfContents)[ \t]*(?:\n|$)");
pattern!(BLANK_LINES, r"^(?:[ \t]*\n)+");
pattern!(PARAGRAPH_BREAK, r"^\n(?:[ \t]*\n)+");
pattern!(BLOCKQUOTE_LINE, r"^>[ \t]?([^\n]*)(?:\n|$)");
pattern!(MATH_BLOCK, r"^\$\$[ \t]*\n");
pattern!(MATH_INLINE, r"(?s)^\\\((.+?)\\\)");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    BoldItalic,
    Bold,
    Italic,
    ListItem,
    Header,
    ObjectLink,
    Link,
    Citation,
    References,
    TaggedElement,
    CodeFence,
    InlineCode,
    TocDirective,
    ParagraphBreak,
    BlockQuote,
    MathBlock,
    MathInline,
    Table,
    EscapedChar,
}

const PRIORITY: [Construct; 19] = [
    Construct::BoldItalic,
    Construct::Bold,
    Construct::Italic,
    Construct::ListItem,
    Construct::Header,
    Construct::ObjectLink,
    Construct::Link,
    Construct::Citation,
    Construct::References,
    Construct::TaggedElement,
    Construct::CodeFence,
    Construct::InlineCode,
    Construct::TocDirective,
    Construct::ParagraphBreak,
    Construct::BlockQuote,
    Construct::MathBlock,
    Construct::MathInline,
    Construct::Table,
    Construct::EscapedChar,
];

impl Construct {
    fn line_start_only(self) -> bool {
        matches!(
            self,
            Construct::ListItem
                | Construct::Header
                | Construct::References
                | Construct::CodeFence
                | Construct::TocDirective
                | Construct::BlockQuote
                | Construct::MathBlock
                | Construct::Table
        )
    }
}

/// Characters that may start an inline construct and so end a literal run.
fn ends_literal(ch: char) -> bool {
    matches!(ch, '\n' | '*' | '[' | '^' | '~' | '`' | '\\')
}

/// Absolute span of capture group `group`, when it participated.
fn group_span(caps: &Captures<'_>, group: usize, base: usize) -> Option<Span> {
    caps.get(group)
        .map(|m| Span::new(base + m.start(), base + m.end()))
}

fn whole_len(caps: &Captures<'_>) -> usize {
    caps.get(0).map_or(0, |m| m.end())
}

impl Parser<'_> {
    /// Parses `source[start..end]` into a flat token list.
    pub(super) fn parse_elements(&mut self, start: usize, end: usize) -> Result<(Vec<NodeId>, usize)> {
        let mut tokens = Vec::new();
        let mut pos = start;
        while pos < end {
            pos = match self.scan_construct(pos, end, &mut tokens)? {
                Some(next) => next,
                None => self.scan_literal(pos, end, &mut tokens),
            };
        }
        Ok((tokens, pos))
    }

    fn scan_construct(
        &mut self,
        pos: usize,
        end: usize,
        tokens: &mut Vec<NodeId>,
    ) -> Result<Option<usize>> {
        let line_start = self.at_line_start(pos);
        for construct in PRIORITY {
            if construct.line_start_only() && !line_start {
                continue;
            }
            let next = match construct {
                Construct::BoldItalic => self.scan_emphasis(pos, end, &BOLD_ITALIC, Node::BoldItalic, tokens),
                Construct::Bold => self.scan_emphasis(pos, end, &BOLD, Node::Bold, tokens),
                Construct::Italic => self.scan_emphasis(pos, end, &ITALIC, Node::Italic, tokens),
                Construct::ListItem => self.scan_list_item(pos, end, tokens)?,
                Construct::Header => self.scan_header(pos, end, tokens)?,
                Construct::ObjectLink => self.scan_object_link(pos, end, tokens),
                Construct::Link => self.scan_link(pos, end, tokens),
                Construct::Citation => self.scan_citation(pos, end, tokens),
                Construct::References => self.scan_references(pos, end)?,
                Construct::TaggedElement => self.scan_element(pos, end, tokens)?,
                Construct::CodeFence => self.scan_code_fence(pos, end, tokens)?,
                Construct::InlineCode => self.scan_inline_code(pos, end, tokens),
                Construct::TocDirective => self.scan_toc_directive(pos, end, tokens),
                Construct::ParagraphBreak => self.scan_paragraph_break(pos, end, line_start, tokens),
                Construct::BlockQuote => self.scan_blockquote(pos, end, tokens)?,
                Construct::MathBlock => self.scan_math_block(pos, end, tokens)?,
                Construct::MathInline => self.scan_math_inline(pos, end, tokens),
                Construct::Table => self.scan_table(pos, end, tokens)?,
                Construct::EscapedChar => self.scan_escaped_char(pos, end, tokens),
            };
            if let Some(next) = next {
                tracing::trace!(?construct, pos, next, "matched construct");
                return Ok(Some(next));
            }
        }
        Ok(None)
    }

    /// Consumes plain text up to the next marker candidate, or just past a newline.
    fn scan_literal(&mut self, pos: usize, end: usize, tokens: &mut Vec<NodeId>) -> usize {
        let source = self.source;
        let mut chars = source[pos..end].char_indices();
        let mut next = end;
        if let Some((_, first)) = chars.next() {
            next = pos + first.len_utf8();
            if first != '\n' {
                for (i, ch) in chars {
                    if ends_literal(ch) {
                        break;
                    }
                    next = pos + i + ch.len_utf8();
                }
            }
        }
        self.push_text(tokens, Span::new(pos, next));
        next
    }

    /// Pushes `span` as literal text, dropping the backslash of each escape.
    fn push_literal(&mut self, tokens: &mut Vec<NodeId>, span: Span) {
        let source = self.source;
        let bytes = source.as_bytes();
        let mut start = span.start;
        let mut i = span.start;
        while i < span.end {
            if bytes[i] == b'\\' && i + 1 < span.end {
                self.push_text(tokens, Span::new(start, i));
                let escaped_len = source[i + 1..].chars().next().map_or(1, char::len_utf8);
                self.push_text(tokens, Span::new(i + 1, i + 1 + escaped_len));
                i += 1 + escaped_len;
                start = i;
            } else {
                i += 1;
            }
        }
        self.push_text(tokens, Span::new(start, span.end));
    }

    fn scan_emphasis(
        &mut self,
        pos: usize,
        end: usize,
        pattern: &Regex,
        build: fn(Vec<NodeId>) -> Node,
        tokens: &mut Vec<NodeId>,
    ) -> Option<usize> {
        let source = self.source;
        let caps = pattern.captures(&source[pos..end])?;
        let inner = group_span(&caps, 1, pos)?;
        let mut children = Vec::new();
        self.push_literal(&mut children, inner);
        tokens.push(self.arena.alloc(build(children)));
        Some(pos + whole_len(&caps))
    }

    fn scan_list_item(
        &mut self,
        pos: usize,
        end: usize,
        tokens: &mut Vec<NodeId>,
    ) -> Result<Option<usize>> {
        let source = self.source;
        let Some(caps) = LIST_ITEM.captures(&source[pos..end]) else {
            return Ok(None);
        };
        let indent = caps[1].chars().count();
        let ordered = &caps[2] == "$";
        let text = group_span(&caps, 3, pos).unwrap_or_default();
        let (children, _) = self.parse_elements(text.start, text.end)?;
        tokens.push(self.arena.alloc(Node::ListItem {
            ordered,
            indent,
            children,
        }));
        Ok(Some(pos + whole_len(&caps)))
    }

    fn scan_header(
        &mut self,
        pos: usize,
        end: usize,
        tokens: &mut Vec<NodeId>,
    ) -> Result<Option<usize>> {
        let source = self.source;
        let Some(caps) = HEADER.captures(&source[pos..end]) else {
            return Ok(None);
        };
        let level = caps[1].len() as u8;
        let ordinal = self.take_ordinal();
        let text = group_span(&caps, 2, pos).unwrap_or_default();
        let (children, _) = self.parse_elements(text.start, text.end)?;
        tokens.push(self.arena.alloc(Node::Header {
            level,
            children,
            ordinal,
        }));
        Ok(Some(pos + whole_len(&caps)))
    }

    fn scan_object_link(&mut self, pos: usize, end: usize, tokens: &mut Vec<NodeId>) -> Option<usize> {
        let source = self.source;
        let caps = OBJECT_LINK.captures(&source[pos..end])?;
        let consumed = whole_len(&caps);
        tokens.push(self.arena.alloc(Node::ObjectLink {
            id: unescape_markup(caps[1].trim()),
            span: Span::new(pos, pos + consumed),
        }));
        Some(pos + consumed)
    }

    fn scan_link(&mut self, pos: usize, end: usize, tokens: &mut Vec<NodeId>) -> Option<usize> {
        let source = self.source;
        let caps = LINK.captures(&source[pos..end])?;
        let text = group_span(&caps, 1, pos)?;
        tokens.push(self.arena.alloc(Node::Link {
            text,
            href: caps[2].to_string(),
        }));
        Some(pos + whole_len(&caps))
    }

    fn scan_citation(&mut self, pos: usize, end: usize, tokens: &mut Vec<NodeId>) -> Option<usize> {
        let source = self.source;
        let caps = CITATION.captures(&source[pos..end])?;
        let consumed = whole_len(&caps);
        tokens.push(self.arena.alloc(Node::Citation {
            id: unescape_markup(&caps[1]),
            span: Span::new(pos, pos + consumed),
        }));
        Some(pos + consumed)
    }

    fn scan_code_fence(
        &mut self,
        pos: usize,
        end: usize,
        tokens: &mut Vec<NodeId>,
    ) -> Result<Option<usize>> {
        let source = self.source;
        let Some(caps) = CODE_FENCE.captures(&source[pos..end]) else {
            return Ok(None);
        };
        let body_start = pos + whole_len(&caps);
        let close = find_line_delimiter(source, body_start - 1, end, "```")
            .ok_or_else(|| self.unterminated("code fence", pos))?;
        let lang = Some(caps[1].to_string()).filter(|lang| !lang.is_empty());
        tokens.push(self.arena.alloc(Node::CodeBlock {
            lang,
            raw: Span::new(body_start, close.max(body_start)),
        }));
        Ok(Some(self.skip_line_end(close + 4, end)))
    }

    fn scan_inline_code(&mut self, pos: usize, end: usize, tokens: &mut Vec<NodeId>) -> Option<usize> {
        let source = self.source;
        let caps = INLINE_CODE.captures(&source[pos..end])?;
        let raw = group_span(&caps, 2, pos)?;
        tokens.push(self.arena.alloc(Node::InlineCode {
            lang: caps.get(1).map(|m| m.as_str().to_string()),
            raw,
        }));
        Some(pos + whole_len(&caps))
    }

    fn scan_toc_directive(&mut self, pos: usize, end: usize, tokens: &mut Vec<NodeId>) -> Option<usize> {
        let source = self.source;
        let found = TOC_DIRECTIVE.find(&source[pos..end])?;
        tokens.push(self.arena.alloc(Node::TableOfContentsMarker));
        Some(pos + found.end())
    }

    fn scan_paragraph_break(
        &mut self,
        pos: usize,
        end: usize,
        line_start: bool,
        tokens: &mut Vec<NodeId>,
    ) -> Option<usize> {
        let source = self.source;
        let pattern: &Regex = if line_start {
            &BLANK_LINES
        } else {
            &PARAGRAPH_BREAK
        };
        let found = pattern.find(&source[pos..end])?;
        tokens.push(self.arena.alloc(Node::ParagraphBreak));
        Some(pos + found.end())
    }

    fn scan_blockquote(
        &mut self,
        pos: usize,
        end: usize,
        tokens: &mut Vec<NodeId>,
    ) -> Result<Option<usize>> {
        let source = self.source;
        let mut children = Vec::new();
        let mut cursor = pos;
        while cursor < end {
            let Some(caps) = BLOCKQUOTE_LINE.captures(&source[cursor..end]) else {
                break;
            };
            if cursor > pos {
                // keep the line break between quoted lines
                self.push_text(&mut children, Span::new(cursor - 1, cursor));
            }
            let line = group_span(&caps, 1, cursor).unwrap_or_default();
            let (nodes, _) = self.parse_elements(line.start, line.end)?;
            children.extend(nodes);
            cursor += whole_len(&caps);
        }
        if cursor == pos {
            return Ok(None);
        }
        let children = self.inflate_nested(children);
        tokens.push(self.arena.alloc(Node::BlockQuote(children)));
        Ok(Some(cursor))
    }

    fn scan_math_block(
        &mut self,
        pos: usize,
        end: usize,
        tokens: &mut Vec<NodeId>,
    ) -> Result<Option<usize>> {
        let source = self.source;
        let Some(found) = MATH_BLOCK.find(&source[pos..end]) else {
            return Ok(None);
        };
        let body_start = pos + found.end();
        let close = find_line_delimiter(source, body_start - 1, end, "$$")
            .ok_or_else(|| self.unterminated("math block", pos))?;
        tokens.push(self.arena.alloc(Node::MathBlock {
            equation: Span::new(body_start, close.max(body_start)),
            inline: false,
        }));
        Ok(Some(self.skip_line_end(close + 3, end)))
    }

    fn scan_math_inline(&mut self, pos: usize, end: usize, tokens: &mut Vec<NodeId>) -> Option<usize> {
        let source = self.source;
        let caps = MATH_INLINE.captures(&source[pos..end])?;
        let equation = group_span(&caps, 1, pos)?;
        tokens.push(self.arena.alloc(Node::MathBlock {
            equation,
            inline: true,
        }));
        Some(pos + whole_len(&caps))
    }

    fn scan_escaped_char(&mut self, pos: usize, end: usize, tokens: &mut Vec<NodeId>) -> Option<usize> {
        let source = self.source;
        if source.as_bytes()[pos] != b'\\' {
            return None;
        }
        let escaped = source[pos + 1..end].chars().next()?;
        let next = pos + 1 + escaped.len_utf8();
        self.push_text(tokens, Span::new(pos + 1, next));
        Some(next)
    }
}
