//! Tagged elements: `~tag`, optional attribute segment, then a content segment.
//!
//! Content forms:
//! - `~tag~` self-closing
//! - `~tag{...}` brace body, closed by the balancing unescaped `}`
//! - `~tag rest of line` inline shorthand
//! - `~tag` + newline, closed by a line `~DELIM~` (`DELIM` defaults to the tag)

use super::escape::{find_closing_brace, find_line_delimiter};
use super::Parser;
use crate::core::ast::{Attributes, Element, ElementContent, Node, NodeId, Span};
use crate::error::{context_at, Error};
use crate::Result;
use regex::Regex;
use std::sync::LazyLock;

static TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^~([A-Za-z0-9_-]+)").expect("tag pattern must compile"));

/// Tags whose content is never parsed.
const VERBATIM_TAGS: [&str; 2] = ["pre", "verbatim"];

fn is_attribute_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

impl Parser<'_> {
    pub(super) fn scan_element(
        &mut self,
        pos: usize,
        end: usize,
        tokens: &mut Vec<NodeId>,
    ) -> Result<Option<usize>> {
        let source = self.source;
        let Some(caps) = TAG_NAME.captures(&source[pos..end]) else {
            return Ok(None);
        };
        let tag = caps[1].to_string();
        let mut cursor = pos + caps[0].len();

        let mut attrs = Attributes::new();
        if let Some(after) = self.parse_attributes(&tag, cursor, end, &mut attrs)? {
            cursor = after;
        }
        let delim = attrs
            .remove("delim")
            .and_then(|values| values.into_iter().next())
            .unwrap_or_else(|| tag.clone());
        let raw = attrs.remove("raw").is_some() || VERBATIM_TAGS.contains(&tag.as_str());

        let Some(intro) = source[cursor..end].chars().next() else {
            return Ok(None);
        };
        let (span, next) = match intro {
            '~' => (None, cursor + 1),
            '{' => {
                let open = cursor + 1;
                let close = find_closing_brace(source, open, end)
                    .ok_or_else(|| self.unterminated("brace block", cursor))?;
                (Some(Span::new(open, close)), close + 1)
            }
            ' ' => {
                let open = cursor + 1;
                let close = source[open..end].find('\n').map_or(end, |i| open + i);
                (Some(Span::new(open, close)), close)
            }
            '\n' => {
                let open = cursor + 1;
                let closing = format!("~{delim}~");
                let newline = find_line_delimiter(source, cursor, end, &closing)
                    .ok_or_else(|| self.unterminated("tagged element", pos))?;
                (
                    Some(Span::new(open, newline.max(open))),
                    newline + 1 + closing.len(),
                )
            }
            _ => return Ok(None),
        };

        let content = match span {
            None => ElementContent::Empty,
            Some(_) if raw => ElementContent::Raw,
            Some(body) => {
                let (nodes, _) = self.parse_elements(body.start, body.end)?;
                ElementContent::Nodes(self.inflate_nested(nodes))
            }
        };
        tracing::trace!(%tag, ?span, "tagged element");
        tokens.push(self.arena.alloc(Node::Element(Element {
            tag,
            attrs,
            span,
            content,
        })));
        Ok(Some(next))
    }

    /// Parses a `[k=v, ...]` or `::k=v;...::` segment starting at `pos`.
    /// Returns the position after the segment, or `None` when there is none.
    fn parse_attributes(
        &self,
        tag: &str,
        pos: usize,
        end: usize,
        attrs: &mut Attributes,
    ) -> Result<Option<usize>> {
        let source = self.source;
        let rest = &source[pos..end];
        let (closer, separator, body_start) = if rest.starts_with('[') {
            ("]".to_string(), ',', pos + 1)
        } else if rest.starts_with("::") {
            let run = rest.bytes().take_while(|&b| b == b':').count();
            (":".repeat(run), ';', pos + run)
        } else {
            return Ok(None);
        };

        let mut cursor = body_start;
        loop {
            cursor = self.skip_blanks(cursor, end);
            if cursor >= end {
                return Err(self.unterminated("attribute list", pos));
            }
            if source[cursor..end].starts_with(closer.as_str()) {
                return Ok(Some(cursor + closer.len()));
            }

            let key_len = source[cursor..end]
                .bytes()
                .take_while(|&b| is_attribute_key_byte(b))
                .count();
            if key_len == 0 {
                return Err(self.malformed_attributes(tag, cursor, "expected attribute name"));
            }
            let key = source[cursor..cursor + key_len].to_string();
            cursor = self.skip_blanks(cursor + key_len, end);

            let values = attrs.entry(key).or_default();
            if source[cursor..end].starts_with('=') {
                cursor = self.skip_blanks(cursor + 1, end);
                let (value, after) = self.parse_attribute_value(cursor, end, &closer, separator)?;
                values.push(value);
                cursor = self.skip_blanks(after, end);
            }

            if cursor >= end {
                return Err(self.unterminated("attribute list", pos));
            }
            if source[cursor..end].starts_with(closer.as_str()) {
                continue;
            }
            if source[cursor..end].starts_with(separator) {
                cursor += 1;
                continue;
            }
            return Err(self.malformed_attributes(
                tag,
                cursor,
                &format!("expected '{separator}' or '{closer}'"),
            ));
        }
    }

    /// Parses one value; quoted values may contain the separator and closer.
    fn parse_attribute_value(
        &self,
        pos: usize,
        end: usize,
        closer: &str,
        separator: char,
    ) -> Result<(String, usize)> {
        let source = self.source;
        let bytes = source.as_bytes();
        if pos < end && matches!(bytes[pos], b'"' | b'\'') {
            let quote = bytes[pos] as char;
            let mut value = String::new();
            let mut chars = source[pos + 1..end].char_indices();
            while let Some((i, ch)) = chars.next() {
                match ch {
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    c if c == quote => return Ok((value, pos + 1 + i + 1)),
                    c => value.push(c),
                }
            }
            return Err(self.unterminated("quoted attribute value", pos));
        }

        let mut cursor = pos;
        while cursor < end {
            let rest = &source[cursor..end];
            if rest.starts_with(closer) || rest.starts_with(separator) {
                break;
            }
            match rest.chars().next() {
                Some(ch) if !ch.is_whitespace() => cursor += ch.len_utf8(),
                _ => break,
            }
        }
        Ok((source[pos..cursor].to_string(), cursor))
    }

    fn skip_blanks(&self, pos: usize, end: usize) -> usize {
        let bytes = self.source.as_bytes();
        let mut cursor = pos;
        while cursor < end && matches!(bytes[cursor], b' ' | b'\t' | b'\r' | b'\n') {
            cursor += 1;
        }
        cursor
    }

    fn malformed_attributes(&self, tag: &str, offset: usize, reason: &str) -> Error {
        Error::MalformedElementAttributes {
            tag: tag.to_string(),
            offset,
            context: context_at(self.source, offset),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use crate::core::ast::{Document, Element, ElementContent, Node};
    use crate::Error;
    use pretty_assertions::assert_eq;

    fn elements(doc: &Document) -> Vec<Element> {
        doc.descendants()
            .into_iter()
            .filter_map(|id| match doc.node(id) {
                Node::Element(el) => Some(el.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_self_closing_element() {
        let doc = parse("line~br~break").unwrap();
        let els = elements(&doc);
        assert_eq!(els.len(), 1);
        assert_eq!(els[0].tag, "br");
        assert_eq!(els[0].span, None);
        assert_eq!(els[0].content, ElementContent::Empty);
    }

    #[test]
    fn test_inline_shorthand_runs_to_end_of_line() {
        let doc = parse("~span some *text*\nnext").unwrap();
        let els = elements(&doc);
        assert_eq!(doc.text(els[0].span.unwrap()), "some *text*");
    }

    #[test]
    fn test_block_element_with_custom_delimiter_contains_own_tag() {
        let source = "~div[delim=END]\ninner\n~div~\nstill inner\n~END~\nafter";
        let doc = parse(source).unwrap();
        let els = elements(&doc);
        assert_eq!(els[0].tag, "div");
        assert_eq!(doc.text(els[0].span.unwrap()), "inner\n~div~\nstill inner");
        assert!(!els[0].attrs.contains_key("delim"));
    }

    #[test]
    fn test_block_element_first_closing_marker_wins() {
        // the outer block claims the first `~div~`, so the nested opener
        // has no terminator left inside the outer body
        let source = "~div\nouter\n~div\ninner\n~div~\n~div~";
        let err = parse(source).unwrap_err();
        assert!(matches!(
            err,
            Error::UnterminatedConstruct {
                construct: "tagged element",
                offset: 11,
                ..
            }
        ));
    }

    #[test]
    fn test_bracket_attributes_with_quotes() {
        let doc = parse(r#"~a[href="x, ]y", class=big, class=red, hidden]{t}"#).unwrap();
        let el = &elements(&doc)[0];
        assert_eq!(el.attrs["href"], vec!["x, ]y".to_string()]);
        assert_eq!(el.attrs["class"], vec!["big".to_string(), "red".to_string()]);
        assert!(el.attrs["hidden"].is_empty());
    }

    #[test]
    fn test_colon_run_attributes() {
        let doc = parse("~img::src=a.png;alt='a;b'::~").unwrap();
        let el = &elements(&doc)[0];
        assert_eq!(el.attrs["src"], vec!["a.png".to_string()]);
        assert_eq!(el.attrs["alt"], vec!["a;b".to_string()]);
        assert_eq!(el.content, ElementContent::Empty);
    }

    #[test]
    fn test_raw_element_is_not_parsed() {
        let doc = parse("~pre{*keep* [[as]] is}").unwrap();
        let el = &elements(&doc)[0];
        assert_eq!(el.content, ElementContent::Raw);
        assert_eq!(doc.text(el.span.unwrap()), "*keep* [[as]] is");
    }

    #[test]
    fn test_tilde_without_name_is_literal() {
        let doc = parse("a ~ b ~~").unwrap();
        assert!(elements(&doc).is_empty());
        assert_eq!(doc.plain_text(doc.roots()[0]), "a ~ b ~~");
    }

    #[test]
    fn test_unterminated_block_element() {
        let err = parse("~tag\ncontent").unwrap_err();
        assert!(matches!(
            err,
            Error::UnterminatedConstruct {
                construct: "tagged element",
                offset: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_unterminated_brace() {
        let err = parse("x ~b{never closed \\}").unwrap_err();
        assert!(matches!(
            err,
            Error::UnterminatedConstruct {
                construct: "brace block",
                offset: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = parse(r#"~a[href="open]{x}"#).unwrap_err();
        assert!(matches!(
            err,
            Error::UnterminatedConstruct {
                construct: "quoted attribute value",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_attributes() {
        let err = parse("~a[=x]{y}").unwrap_err();
        assert!(matches!(err, Error::MalformedElementAttributes { ref tag, .. } if tag == "a"));
        let err = parse("~a[k=v junk]{y}").unwrap_err();
        assert!(matches!(err, Error::MalformedElementAttributes { .. }));
    }
}
