//! Paragraph inflation: groups a flat token stream into paragraphs.

use super::Parser;
use crate::core::ast::{Node, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Joins the open paragraph instead of closing it.
    Quote,
    ListItem,
    Break,
    Block,
    Inline,
}

fn role(node: &Node) -> Role {
    match node {
        Node::BlockQuote(_) => Role::Quote,
        Node::ListItem { .. } => Role::ListItem,
        Node::ParagraphBreak => Role::Break,
        node if node.is_structural() => Role::Block,
        _ => Role::Inline,
    }
}

impl Parser<'_> {
    pub(super) fn inflate(&mut self, tokens: Vec<NodeId>) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut paragraph = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let id = tokens[i];
            match role(self.arena.get(id)) {
                Role::Quote => {
                    paragraph.push(id);
                    i += 1;
                }
                Role::ListItem => {
                    self.close_paragraph(&mut paragraph, &mut out);
                    let (items, consumed) = self.list_run(&tokens[i..]);
                    let lists = self.reconstruct_lists(&items);
                    out.extend(lists);
                    i += consumed;
                }
                Role::Break => {
                    self.close_paragraph(&mut paragraph, &mut out);
                    i += 1;
                }
                Role::Block => {
                    self.close_paragraph(&mut paragraph, &mut out);
                    out.push(id);
                    i += 1;
                }
                Role::Inline => {
                    if !(paragraph.is_empty() && self.is_blank(id)) {
                        paragraph.push(id);
                    }
                    i += 1;
                }
            }
        }
        self.close_paragraph(&mut paragraph, &mut out);
        out
    }

    /// Inflates only when the tokens contain something structural, so that
    /// purely inline bodies stay inline.
    pub(super) fn inflate_nested(&mut self, tokens: Vec<NodeId>) -> Vec<NodeId> {
        if tokens.iter().any(|&id| self.arena.get(id).is_structural()) {
            self.inflate(tokens)
        } else {
            tokens
        }
    }

    /// Consecutive list items, looking through paragraph breaks between them.
    fn list_run(&self, tokens: &[NodeId]) -> (Vec<NodeId>, usize) {
        let mut items = Vec::new();
        let mut consumed = 0;
        for (j, &id) in tokens.iter().enumerate() {
            match self.arena.get(id) {
                Node::ListItem { .. } => {
                    items.push(id);
                    consumed = j + 1;
                }
                Node::ParagraphBreak => {}
                _ => break,
            }
        }
        (items, consumed)
    }

    fn close_paragraph(&mut self, paragraph: &mut Vec<NodeId>, out: &mut Vec<NodeId>) {
        if paragraph.iter().all(|&id| self.is_blank(id)) {
            paragraph.clear();
            return;
        }
        let children = std::mem::take(paragraph);
        out.push(self.arena.alloc(Node::Paragraph(children)));
    }

    fn is_blank(&self, id: NodeId) -> bool {
        match self.arena.get(id) {
            Node::Text(span) => self.source[span.start..span.end].trim().is_empty(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use crate::core::ast::Node;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_paragraphs_are_dropped() {
        let doc = parse("\n\n   \n# H\n\n\n").unwrap();
        assert_eq!(doc.roots().len(), 1);
        assert!(matches!(doc.node(doc.roots()[0]), Node::Header { .. }));
    }

    #[test]
    fn test_structural_token_closes_paragraph() {
        let doc = parse("text\n```\ncode\n```\nmore").unwrap();
        let kinds: Vec<_> = doc
            .roots()
            .iter()
            .map(|&id| std::mem::discriminant(doc.node(id)))
            .collect();
        assert_eq!(kinds.len(), 3);
        assert!(matches!(doc.node(doc.roots()[0]), Node::Paragraph(_)));
        assert!(matches!(doc.node(doc.roots()[1]), Node::CodeBlock { .. }));
        assert!(matches!(doc.node(doc.roots()[2]), Node::Paragraph(_)));
    }

    #[test]
    fn test_blockquote_opens_paragraph_when_none_is_open() {
        let doc = parse("> quoted").unwrap();
        assert_eq!(doc.roots().len(), 1);
        let Node::Paragraph(children) = doc.node(doc.roots()[0]) else {
            panic!("expected paragraph");
        };
        assert!(matches!(doc.node(children[0]), Node::BlockQuote(_)));
    }

    #[test]
    fn test_paragraph_break_between_items_keeps_one_list() {
        let doc = parse("- a\n\n- b\n").unwrap();
        assert_eq!(doc.roots().len(), 1);
        let Node::List { items, .. } = doc.node(doc.roots()[0]) else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_element_body_with_blocks_is_inflated() {
        let doc = parse("~aside\npara one\n\npara two\n~aside~").unwrap();
        let el = doc
            .descendants()
            .into_iter()
            .find_map(|id| match doc.node(id) {
                Node::Element(el) => Some(el.clone()),
                _ => None,
            })
            .unwrap();
        let crate::core::ast::ElementContent::Nodes(children) = el.content else {
            panic!("expected parsed content");
        };
        assert_eq!(children.len(), 2);
        assert!(children
            .iter()
            .all(|&id| matches!(doc.node(id), Node::Paragraph(_))));
    }
}
