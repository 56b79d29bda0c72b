//! Pipe tables: a head row, a dash separator row, then body rows.

use super::Parser;
use crate::core::ast::{Node, NodeId, Span};
use crate::error::{context_at, Error};
use crate::Result;

/// One physical row split into raw cell spans.
struct Row {
    cells: Vec<Span>,
    next: usize,
}

fn is_separator_cell(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.contains('-') && text.chars().all(|c| c == '-' || c == ':')
}

impl Parser<'_> {
    pub(super) fn scan_table(
        &mut self,
        pos: usize,
        end: usize,
        tokens: &mut Vec<NodeId>,
    ) -> Result<Option<usize>> {
        let source = self.source;
        let Some(head) = self.split_row(pos, end) else {
            return Ok(None);
        };
        let Some(separator) = self.split_row(head.next, end) else {
            return Ok(None);
        };
        if head.cells.is_empty()
            || separator.cells.is_empty()
            || !separator
                .cells
                .iter()
                .all(|cell| is_separator_cell(&source[cell.start..cell.end]))
        {
            return Ok(None);
        }

        let mut body = Vec::new();
        let mut cursor = separator.next;
        while let Some(row) = self.split_row(cursor, end) {
            cursor = row.next;
            body.push(row.cells);
        }
        if body.is_empty() {
            return Err(Error::MalformedTable {
                offset: pos,
                context: context_at(source, pos),
                reason: "table has no body rows".to_string(),
            });
        }

        let head = self.build_cells(&head.cells)?;
        let mut rows = Vec::with_capacity(body.len());
        for cells in &body {
            rows.push(self.build_cells(cells)?);
        }
        tracing::trace!(columns = head.len(), rows = rows.len(), "table");
        tokens.push(self.arena.alloc(Node::Table { head, rows }));
        Ok(Some(cursor))
    }

    fn build_cells(&mut self, cells: &[Span]) -> Result<Vec<NodeId>> {
        let mut out = Vec::with_capacity(cells.len());
        for &cell in cells {
            let trimmed = self.trim_span(cell);
            let (nodes, _) = self.parse_elements(trimmed.start, trimmed.end)?;
            let children = self.inflate_nested(nodes);
            out.push(self.arena.alloc(Node::Cell(children)));
        }
        Ok(out)
    }

    /// Splits the row starting at `pos` on unescaped pipes. An escaped
    /// newline continues the row on the next line.
    fn split_row(&self, pos: usize, end: usize) -> Option<Row> {
        let bytes = self.source.as_bytes();
        if pos >= end || bytes[pos] != b'|' {
            return None;
        }
        let mut cells = Vec::new();
        let mut cell_start = pos + 1;
        let mut line_end = end;
        let mut next = end;
        let mut i = pos + 1;
        while i < end {
            match bytes[i] {
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'|' => {
                    cells.push(Span::new(cell_start, i));
                    cell_start = i + 1;
                }
                b'\n' => {
                    line_end = i;
                    next = i + 1;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        let tail = &self.source[cell_start.min(line_end)..line_end];
        if !tail.trim().is_empty() {
            cells.push(Span::new(cell_start, line_end));
        }
        Some(Row { cells, next })
    }
}
