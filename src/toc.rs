//! Table-of-contents builder.
//!
//! Headers are collected in document order from anywhere in the tree and
//! folded into a hierarchy with a stack of open entries under a synthetic
//! level-0 root.

use crate::core::ast::{Document, Node};
use crate::error::Error;
use crate::Result;

/// Anchor id of the synthetic bibliography entry.
pub const BIBLIOGRAPHY_ANCHOR: &str = "bibliography";

/// A header as seen by the TOC builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub level: u8,
    pub ordinal: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocNode {
    pub level: u8,
    pub anchor_id: String,
    pub title: String,
    pub children: Vec<TocNode>,
}

impl TocNode {
    fn root() -> Self {
        Self {
            level: 0,
            anchor_id: String::new(),
            title: String::new(),
            children: Vec::new(),
        }
    }

    fn leaf(level: u8, anchor_id: String, title: String) -> Self {
        Self {
            level,
            anchor_id,
            title,
            children: Vec::new(),
        }
    }
}

/// Anchor id for a header: lower-cased alphanumerics, everything else `-`,
/// suffixed with the header ordinal so repeated titles stay distinct.
pub fn anchor_id(title: &str, ordinal: usize) -> String {
    let mut id: String = title
        .chars()
        .flat_map(|c| {
            let mapped: Vec<char> = if c.is_alphanumeric() {
                c.to_lowercase().collect()
            } else {
                vec!['-']
            };
            mapped
        })
        .collect();
    id.push('-');
    id.push_str(&ordinal.to_string());
    id
}

/// All headers of the document in document order.
pub fn sections(document: &Document) -> Vec<Section> {
    document
        .descendants()
        .into_iter()
        .filter_map(|id| match document.node(id) {
            Node::Header { level, ordinal, .. } => Some(Section {
                title: document.plain_text(id).trim().to_string(),
                level: *level,
                ordinal: *ordinal,
            }),
            _ => None,
        })
        .collect()
}

/// Builds the TOC of `document`, appending a bibliography entry titled
/// `bibliography_title` when the document defines references.
pub fn build_toc(document: &Document, bibliography_title: &str) -> Result<TocNode> {
    let bibliography = if document.references().is_empty() {
        None
    } else {
        Some(bibliography_title)
    };
    build_toc_from_sections(&sections(document), bibliography)
}

pub fn build_toc_from_sections(sections: &[Section], bibliography: Option<&str>) -> Result<TocNode> {
    let mut stack = vec![TocNode::root()];
    for section in sections {
        while stack
            .last()
            .is_some_and(|open| open.level >= section.level)
        {
            if stack.len() == 1 {
                return Err(Error::InvalidHeaderLevel {
                    level: section.level,
                    ordinal: section.ordinal,
                });
            }
            close_top(&mut stack);
        }
        let parent_level = stack.last().map_or(0, |open| open.level);
        if section.level > parent_level + 1 {
            tracing::warn!(
                title = %section.title,
                level = section.level,
                parent_level,
                "header skips a level"
            );
        }
        stack.push(TocNode::leaf(
            section.level,
            anchor_id(&section.title, section.ordinal),
            section.title.clone(),
        ));
    }
    while stack.len() > 1 {
        close_top(&mut stack);
    }

    let mut root = stack.pop().unwrap_or_else(TocNode::root);
    if let Some(title) = bibliography {
        root.children.push(TocNode::leaf(
            1,
            BIBLIOGRAPHY_ANCHOR.to_string(),
            title.to_string(),
        ));
    }
    Ok(root)
}

/// Pops the innermost open entry into its parent.
fn close_top(stack: &mut Vec<TocNode>) {
    if let Some(done) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(done);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn outline(node: &TocNode) -> String {
        if node.children.is_empty() {
            return node.title.clone();
        }
        let inner: Vec<String> = node.children.iter().map(outline).collect();
        format!("{}({})", node.title, inner.join(","))
    }

    #[test]
    fn test_anchor_id_normalizes_and_appends_ordinal() {
        assert_eq!(anchor_id("Hello, World", 3), "hello--world-3");
        assert_eq!(anchor_id("Ünïcode Title", 1), "ünïcode-title-1");
    }

    #[test]
    fn test_repeated_titles_get_distinct_anchors() {
        let doc = parse("# Intro\n# Intro\n").unwrap();
        let toc = build_toc(&doc, "Bibliography").unwrap();
        let anchors: Vec<&str> = toc.children.iter().map(|c| c.anchor_id.as_str()).collect();
        assert_eq!(anchors, vec!["intro-1", "intro-2"]);
    }

    #[test]
    fn test_levels_fold_into_hierarchy() {
        let doc = parse("# A\n## B\n# C\n### D\n").unwrap();
        let toc = build_toc(&doc, "Bibliography").unwrap();
        assert_eq!(toc.level, 0);
        assert_eq!(outline(&toc), "(A(B),C(D))");
        assert_eq!(toc.children[1].children[0].level, 3);
    }

    #[test]
    fn test_bibliography_entry_appended_when_references_exist() {
        let doc = parse("# A\n\n@References\n* r\n  | title: T\n").unwrap();
        let toc = build_toc(&doc, "Bibliography").unwrap();
        let last = toc.children.last().unwrap();
        assert_eq!(last.title, "Bibliography");
        assert_eq!(last.level, 1);
        assert_eq!(last.anchor_id, BIBLIOGRAPHY_ANCHOR);
    }

    #[test]
    fn test_no_bibliography_entry_without_references() {
        let doc = parse("# A\n").unwrap();
        let toc = build_toc(&doc, "Bibliography").unwrap();
        assert_eq!(outline(&toc), "(A)");
    }

    #[test]
    fn test_headers_nested_in_elements_are_collected() {
        let doc = parse("# Top\n~section\n## Inner\n~section~\n").unwrap();
        let toc = build_toc(&doc, "Bibliography").unwrap();
        assert_eq!(outline(&toc), "(Top(Inner))");
    }

    #[test]
    fn test_level_zero_section_underflows() {
        let sections = vec![Section {
            title: "bad".into(),
            level: 0,
            ordinal: 1,
        }];
        let err = build_toc_from_sections(&sections, None).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidHeaderLevel {
                level: 0,
                ordinal: 1
            }
        ));
    }
}
