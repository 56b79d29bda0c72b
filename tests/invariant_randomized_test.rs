use mmldoc::core::ast::{Document, Node, NodeId};
use mmldoc::{build_toc, parse, Error, MmlToHtml, TocNode};
use std::collections::HashSet;

#[derive(Debug, Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn next_bool(&mut self) -> bool {
        (self.next_u64() >> 33) & 1 == 1
    }

    fn next_inclusive(&mut self, low: usize, high: usize) -> usize {
        let span = (high - low + 1) as u64;
        low + ((self.next_u64() >> 33) % span) as usize
    }
}

const MARKERS: [char; 11] = ['*', '[', ']', '^', '~', '`', '\\', '#', '>', '|', '$'];

#[test]
fn randomized_escape_invariants() {
    let mut rng = Lcg::new(0x4D4D_4C00_2026_0001);

    for i in 0..64 {
        let mut source = String::new();
        let mut expected = String::new();
        for _ in 0..rng.next_inclusive(1, 12) {
            if rng.next_bool() {
                let marker = MARKERS[rng.next_inclusive(0, MARKERS.len() - 1)];
                source.push('\\');
                source.push(marker);
                expected.push(marker);
            } else {
                let word = ["ab", "word", "x", "mid dle"][rng.next_inclusive(0, 3)];
                source.push_str(word);
                expected.push_str(word);
            }
        }

        let doc = parse(&source)
            .unwrap_or_else(|e| panic!("iteration {i}: {source:?} failed: {e}"));
        let text: String = doc.roots().iter().map(|&id| doc.plain_text(id)).collect();
        assert_eq!(text, expected, "iteration {i}: {source:?}");
        for id in doc.descendants() {
            assert!(
                matches!(doc.node(id), Node::Paragraph(_) | Node::Text(_)),
                "iteration {i}: {source:?} produced {:?}",
                doc.node(id)
            );
        }
    }
}

#[test]
fn randomized_escapes_inside_emphasis() {
    let mut rng = Lcg::new(0x4D4D_4C00_2026_0005);

    for i in 0..64 {
        let mut inner = String::new();
        let mut expected = String::new();
        for _ in 0..rng.next_inclusive(1, 8) {
            if rng.next_bool() {
                let marker = MARKERS[rng.next_inclusive(0, MARKERS.len() - 1)];
                inner.push('\\');
                inner.push(marker);
                expected.push(marker);
            } else {
                let word = ["ab", "word", "x", "mid dle"][rng.next_inclusive(0, 3)];
                inner.push_str(word);
                expected.push_str(word);
            }
        }
        let source = format!("*{inner}*");

        let doc = parse(&source)
            .unwrap_or_else(|e| panic!("iteration {i}: {source:?} failed: {e}"));
        let italics: Vec<NodeId> = doc
            .descendants()
            .into_iter()
            .filter(|&id| matches!(doc.node(id), Node::Italic(_)))
            .collect();
        assert_eq!(italics.len(), 1, "iteration {i}: {source:?}");
        assert_eq!(doc.plain_text(italics[0]), expected, "iteration {i}: {source:?}");
        for id in doc.descendants() {
            assert!(
                matches!(doc.node(id), Node::Paragraph(_) | Node::Italic(_) | Node::Text(_)),
                "iteration {i}: {source:?} produced {:?}",
                doc.node(id)
            );
        }
    }
}

fn item_indent(doc: &Document, id: NodeId) -> usize {
    match doc.node(id) {
        Node::ListItem { indent, .. } => *indent,
        other => panic!("expected list item, got {other:?}"),
    }
}

/// Checks sibling and nesting invariants of one list; returns its item count.
fn check_list(doc: &Document, list: NodeId, parent_indent: Option<usize>) -> usize {
    let Node::List { items, .. } = doc.node(list) else {
        panic!("expected list");
    };
    let indent = item_indent(doc, items[0]);
    if let Some(parent) = parent_indent {
        assert!(indent > parent, "nested list must be deeper than its parent item");
    }
    let mut count = 0;
    for &item in items {
        assert_eq!(item_indent(doc, item), indent, "siblings share indentation");
        count += 1;
        if let Node::ListItem { children, .. } = doc.node(item) {
            for &child in children {
                if matches!(doc.node(child), Node::List { .. }) {
                    count += check_list(doc, child, Some(indent));
                }
            }
        }
    }
    count
}

#[test]
fn randomized_list_nesting_invariants() {
    let mut rng = Lcg::new(0x4D4D_4C00_2026_0002);

    for i in 0..48 {
        let lines = rng.next_inclusive(1, 10);
        let mut depth = 0;
        let mut top_level = 0;
        let mut source = String::new();
        for n in 0..lines {
            if n > 0 {
                depth = rng.next_inclusive(0, depth + 1);
            }
            if depth == 0 {
                top_level += 1;
            }
            source.push_str(&" ".repeat(depth * 2));
            source.push_str(&format!("- item{n}\n"));
        }

        let doc = parse(&source)
            .unwrap_or_else(|e| panic!("iteration {i}: {source:?} failed: {e}"));
        assert_eq!(doc.roots().len(), 1, "iteration {i}: {source:?}");
        let root = doc.roots()[0];
        let Node::List { items, .. } = doc.node(root) else {
            panic!("iteration {i}: expected a list root");
        };
        assert_eq!(items.len(), top_level, "iteration {i}: {source:?}");
        assert_eq!(check_list(&doc, root, None), lines, "iteration {i}: {source:?}");
    }
}

fn flatten(node: &TocNode, out: &mut Vec<(u8, String)>) {
    for child in &node.children {
        assert!(child.level > node.level, "child deeper than parent");
        out.push((child.level, child.anchor_id.clone()));
        flatten(child, out);
    }
}

#[test]
fn randomized_toc_shape_invariants() {
    let mut rng = Lcg::new(0x4D4D_4C00_2026_0003);

    for i in 0..48 {
        let count = rng.next_inclusive(1, 12);
        let mut source = String::new();
        let mut expected = Vec::new();
        for n in 0..count {
            let level = rng.next_inclusive(1, 6);
            source.push_str(&format!("{} Part {n}\n", "#".repeat(level)));
            expected.push((level as u8, format!("part-{}-{}", n, n + 1)));
        }

        let doc = parse(&source).expect("headers must parse");
        let toc = build_toc(&doc, "Bibliography")
            .unwrap_or_else(|e| panic!("iteration {i}: {source:?} failed: {e}"));
        assert_eq!(toc.level, 0);
        let mut flat = Vec::new();
        flatten(&toc, &mut flat);
        assert_eq!(flat, expected, "iteration {i}: {source:?}");
    }
}

#[test]
fn randomized_citation_resolution_invariants() {
    let mut rng = Lcg::new(0x4D4D_4C00_2026_0004);
    let converter = MmlToHtml::with_defaults();

    for i in 0..32 {
        let defined: Vec<usize> = (1..=3).filter(|_| rng.next_bool()).collect();
        let defined_set: HashSet<usize> = defined.iter().copied().collect();

        let mut body = String::new();
        let mut missing = false;
        for p in 0..rng.next_inclusive(1, 5) {
            let cited = rng.next_inclusive(1, 4);
            missing |= !defined_set.contains(&cited);
            body.push_str(&format!("case {i} para {p} ^[r{cited}].\n\n"));
        }

        let mut source = body;
        if !defined.is_empty() {
            source.push_str("@References\n");
            for id in &defined {
                source.push_str(&format!("* r{id}\n  | title: Work {id}\n"));
            }
        }

        match (missing, converter.convert_str(&source)) {
            (true, Err(Error::UnknownReference { .. })) => {}
            (false, Ok(rendered)) => {
                for (ordinal, id) in defined.iter().enumerate() {
                    let entry = rendered
                        .bibliography
                        .citation(&format!("r{id}"))
                        .expect("defined reference has an entry");
                    assert_eq!(entry.ordinal, ordinal + 1, "definition order numbering");
                }
            }
            (expect_missing, other) => panic!(
                "iteration {i}: expected missing={expect_missing}, got {:?}",
                other.map(|r| r.html)
            ),
        }
    }
}
