//! List reconstruction from flat list items.
//!
//! Nesting comes only from leading-whitespace length: a deeper item opens a
//! nested list under the previous item, a shallower item (or a marker of the
//! other kind at the same depth) ends the current list.

use super::Parser;
use crate::core::ast::{Node, NodeId};

impl Parser<'_> {
    /// Rebuilds a run of `ListItem` tokens into one or more top-level lists.
    pub(super) fn reconstruct_lists(&mut self, run: &[NodeId]) -> Vec<NodeId> {
        let mut lists = Vec::new();
        let mut i = 0;
        while i < run.len() {
            let (list, consumed) = self.build_list(&run[i..]);
            lists.push(list);
            i += consumed;
        }
        lists
    }

    /// Builds the list opened by `run[0]`; returns it and how many items it consumed.
    fn build_list(&mut self, run: &[NodeId]) -> (NodeId, usize) {
        let (ordered, indent) = self.item_shape(run[0]);
        let mut items: Vec<NodeId> = Vec::new();
        let mut i = 0;
        while i < run.len() {
            let (item_ordered, item_indent) = self.item_shape(run[i]);
            if item_indent == indent && item_ordered == ordered {
                items.push(run[i]);
                i += 1;
            } else if item_indent > indent {
                let Some(&parent) = items.last() else {
                    break;
                };
                let (nested, consumed) = self.build_list(&run[i..]);
                if let Node::ListItem { children, .. } = self.arena.get_mut(parent) {
                    children.push(nested);
                }
                i += consumed;
            } else {
                break;
            }
        }
        (self.arena.alloc(Node::List { ordered, items }), i)
    }

    fn item_shape(&self, id: NodeId) -> (bool, usize) {
        match self.arena.get(id) {
            Node::ListItem {
                ordered, indent, ..
            } => (*ordered, *indent),
            _ => (false, 0),
        }
    }
}
