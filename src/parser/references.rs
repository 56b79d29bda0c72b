//! `@References` blocks.
//!
//! ```text
//! @References
//! * ieee-guide
//!   | type: web
//!   | website-title: IEEE Author Center
//! ```
//!
//! Entries go to the document's reference table and leave no node behind.

use super::Parser;
use crate::core::ast::{ReferenceKind, Span};
use crate::error::Error;
use crate::Result;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static BLOCK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@References[ \t]*(?:\n|$)").expect("references header pattern must compile")
});
static ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*\*[ \t]+(\S+)[ \t]*(?:\n|$)").expect("reference entry pattern must compile")
});
static PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]+\|[ \t]*([A-Za-z][A-Za-z0-9_-]*)[ \t]*:[ \t]*([^\n]*?)[ \t]*(?:\n|$)")
        .expect("reference property pattern must compile")
});

struct PendingReference {
    id: String,
    span: Span,
    fields: BTreeMap<String, String>,
}

impl Parser<'_> {
    pub(super) fn scan_references(&mut self, pos: usize, end: usize) -> Result<Option<usize>> {
        let source = self.source;
        let Some(header) = BLOCK_HEADER.find(&source[pos..end]) else {
            return Ok(None);
        };

        let mut cursor = pos + header.end();
        let mut pending: Vec<PendingReference> = Vec::new();
        while cursor < end {
            let rest = &source[cursor..end];
            if let Some(caps) = ENTRY.captures(rest) {
                let id = caps.get(1).map_or("", |m| m.as_str());
                pending.push(PendingReference {
                    id: id.to_string(),
                    span: Span::new(cursor, cursor + caps[0].trim_end().len()),
                    fields: BTreeMap::new(),
                });
                cursor += caps[0].len();
                continue;
            }
            if let Some(caps) = PROPERTY.captures(rest) {
                let Some(entry) = pending.last_mut() else {
                    break;
                };
                entry
                    .fields
                    .insert(caps[1].to_ascii_lowercase(), caps[2].to_string());
                cursor += caps[0].len();
                continue;
            }
            break;
        }

        if pending.is_empty() {
            return Ok(None);
        }

        for PendingReference {
            id,
            span,
            mut fields,
        } in pending
        {
            let kind = ReferenceKind::from_type(fields.remove("type").as_deref());
            if let Err(rejected) = self.references.define(id, kind, fields, span) {
                return Err(Error::InvalidReference {
                    id: rejected.id,
                    reason: "duplicate reference id".to_string(),
                });
            }
        }
        tracing::debug!(total = self.references.len(), "parsed references block");
        Ok(Some(cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use crate::core::ast::ReferenceKind;
    use crate::Error;
    use pretty_assertions::assert_eq;

    const BLOCK: &str = "Intro ^[b].\n\n@References\n* a\n  | type: web\n  | names: Alice\n  | link: https://a.example/x?y=1\n* b\n  | type: gov-pub\n  | agency: NASA\n\nAfter.\n";

    #[test]
    fn test_references_block_is_parsed_and_removed() {
        let doc = parse(BLOCK).unwrap();
        let refs = doc.references();
        assert_eq!(refs.len(), 2);

        let a = refs.get("a").unwrap();
        assert_eq!(a.ordinal, 1);
        assert_eq!(a.kind, ReferenceKind::Web);
        assert_eq!(a.field("names"), Some("Alice"));
        assert_eq!(a.field("link"), Some("https://a.example/x?y=1"));
        assert_eq!(a.field("type"), None);

        let b = refs.get("b").unwrap();
        assert_eq!(b.ordinal, 2);
        assert_eq!(b.kind, ReferenceKind::GovPub);

        let text: String = doc.roots().iter().map(|&id| doc.plain_text(id)).collect();
        assert!(!text.contains("References"));
        assert!(text.contains("After."));
    }

    #[test]
    fn test_reference_without_type_is_other() {
        let doc = parse("@References\n* x\n  | title: Book\n").unwrap();
        assert_eq!(doc.references().get("x").unwrap().kind, ReferenceKind::Other);
    }

    #[test]
    fn test_duplicate_reference_id_is_invalid() {
        let err = parse("@References\n* x\n* x\n").unwrap_err();
        assert!(matches!(err, Error::InvalidReference { ref id, .. } if id == "x"));
    }

    #[test]
    fn test_references_header_without_entries_is_text() {
        let doc = parse("@References\nnothing here").unwrap();
        assert!(doc.references().is_empty());
        assert!(doc.plain_text(doc.roots()[0]).starts_with("@References"));
    }
}
