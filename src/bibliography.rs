//! Bibliography resolver - validates citations and formats IEEE-style entries.
//!
//! Entries are numbered in the order they are defined in `@References`, not
//! in order of first citation.

use crate::core::ast::{Document, Node, Reference, ReferenceKind};
use crate::error::{context_at, Error};
use crate::localization::LocalizationStrategy;
use crate::Result;
use std::collections::{HashMap, HashSet};

/// Prefix of the anchor id each entry is rendered under.
pub const ANCHOR_PREFIX: &str = "bib-ref-";

/// Output-agnostic piece of a formatted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPart {
    Text(String),
    /// Titles of containers (websites, books).
    Emphasis(String),
    Link(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibliographyEntry {
    pub ordinal: usize,
    pub id: String,
    pub anchor_id: String,
    pub parts: Vec<EntryPart>,
}

impl BibliographyEntry {
    /// The entry as plain text, including its `[n]` label.
    pub fn plain_text(&self) -> String {
        let mut out = format!("[{}] ", self.ordinal);
        for part in &self.parts {
            match part {
                EntryPart::Text(text) | EntryPart::Emphasis(text) | EntryPart::Link(text) => {
                    out.push_str(text)
                }
            }
        }
        out
    }
}

/// Resolved bibliography of one document.
#[derive(Debug, Clone, Default)]
pub struct Bibliography {
    entries: Vec<BibliographyEntry>,
    index_by_id: HashMap<String, usize>,
}

impl Bibliography {
    /// Validates every citation in `document` and formats all of its references.
    pub fn resolve(document: &Document, labels: &dyn LocalizationStrategy) -> Result<Self> {
        let entries = BibliographyResolver::new(labels).resolve(document)?;
        let index_by_id = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.id.clone(), idx))
            .collect();
        Ok(Self {
            entries,
            index_by_id,
        })
    }

    pub fn entries(&self) -> &[BibliographyEntry] {
        &self.entries
    }

    /// Entry a citation of `id` points to.
    pub fn citation(&self, id: &str) -> Option<&BibliographyEntry> {
        self.index_by_id.get(id).map(|&idx| &self.entries[idx])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Single pass over a document's references; owns the citation counter.
pub struct BibliographyResolver<'a> {
    labels: &'a dyn LocalizationStrategy,
    next_ordinal: usize,
}

#[derive(Clone, Copy)]
enum Style {
    Plain,
    Quoted,
    Emphasis,
}

impl<'a> BibliographyResolver<'a> {
    pub fn new(labels: &'a dyn LocalizationStrategy) -> Self {
        Self {
            labels,
            next_ordinal: 1,
        }
    }

    pub fn resolve(&mut self, document: &Document) -> Result<Vec<BibliographyEntry>> {
        let references = document.references();
        let mut cited = HashSet::new();
        for id in document.descendants() {
            if let Node::Citation { id: target, span } = document.node(id) {
                if references.get(target).is_none() {
                    return Err(Error::UnknownReference {
                        id: target.clone(),
                        offset: span.start,
                        context: context_at(document.source(), span.start),
                    });
                }
                cited.insert(target.as_str());
            }
        }

        let mut entries = Vec::with_capacity(references.len());
        for reference in references.iter() {
            if !cited.contains(reference.id.as_str()) {
                tracing::warn!(id = %reference.id, "reference is never cited");
            }
            entries.push(self.format(reference)?);
        }
        tracing::debug!(
            entries = entries.len(),
            citations = cited.len(),
            "resolved bibliography"
        );
        Ok(entries)
    }

    fn format(&mut self, reference: &Reference) -> Result<BibliographyEntry> {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;

        let mut parts = Vec::new();
        match reference.kind {
            ReferenceKind::Web => self.format_web(reference, &mut parts)?,
            ReferenceKind::GovPub => self.format_gov_pub(reference, &mut parts)?,
            ReferenceKind::Other => self.format_other(reference, &mut parts)?,
        }
        Ok(BibliographyEntry {
            ordinal,
            id: reference.id.clone(),
            anchor_id: format!("{}{}", ANCHOR_PREFIX, reference.id),
            parts,
        })
    }

    fn format_web(&self, reference: &Reference, parts: &mut Vec<EntryPart>) -> Result<()> {
        let head = [
            (Style::Plain, reference.field("names")),
            (Style::Quoted, reference.field("page-title")),
            (Style::Emphasis, reference.field("website-title")),
        ];
        require_any(reference, &head, "names, page-title or website-title")?;
        push_head(parts, &head);
        if let Some(published) = reference.field("published") {
            push_text(parts, format!(" {}.", published));
        }
        push_text(parts, format!(" {}.", self.labels.online_label()));
        self.push_access(reference, parts);
        Ok(())
    }

    fn format_gov_pub(&self, reference: &Reference, parts: &mut Vec<EntryPart>) -> Result<()> {
        let pages = reference.field("pages").map(|p| self.labels.pages(p));
        let head = [
            (Style::Plain, reference.field("author")),
            (Style::Plain, reference.field("agency")),
            (Style::Plain, reference.field("location")),
            (Style::Quoted, reference.field("title")),
            (Style::Plain, reference.field("doc-id")),
            (Style::Plain, reference.field("published")),
            (Style::Plain, pages.as_deref()),
        ];
        require_any(reference, &head[..4], "author, agency or title")?;
        push_head(parts, &head);
        if reference.field("link").is_some() {
            push_text(parts, format!(" {}.", self.labels.online_label()));
        }
        self.push_access(reference, parts);
        Ok(())
    }

    fn format_other(&self, reference: &Reference, parts: &mut Vec<EntryPart>) -> Result<()> {
        let head = [
            (Style::Plain, reference.field("names")),
            (Style::Emphasis, reference.field("title")),
            (Style::Plain, reference.field("publisher")),
            (Style::Plain, reference.field("published")),
        ];
        require_any(reference, &head[..2], "names or title")?;
        push_head(parts, &head);
        self.push_access(reference, parts);
        Ok(())
    }

    /// ` Available: <link>.` and ` Accessed <date>.` when present.
    fn push_access(&self, reference: &Reference, parts: &mut Vec<EntryPart>) {
        if let Some(link) = reference.field("link") {
            push_text(parts, format!(" {}: ", self.labels.available_label()));
            parts.push(EntryPart::Link(link.to_string()));
            push_text(parts, ".".to_string());
        }
        if let Some(accessed) = reference.field("accessed") {
            push_text(
                parts,
                format!(" {} {}.", self.labels.accessed_label(), accessed),
            );
        }
    }
}

fn require_any(reference: &Reference, head: &[(Style, Option<&str>)], what: &str) -> Result<()> {
    if head.iter().any(|(_, value)| value.is_some()) {
        return Ok(());
    }
    Err(Error::InvalidReference {
        id: reference.id.clone(),
        reason: format!("at least one of {} is required", what),
    })
}

/// Joins the present fields with commas and closes the run with a period.
/// Quoted fields keep the punctuation inside the quotes.
fn push_head(parts: &mut Vec<EntryPart>, head: &[(Style, Option<&str>)]) {
    let present: Vec<(Style, &str)> = head
        .iter()
        .filter_map(|(style, value)| value.map(|v| (*style, v)))
        .collect();
    for (i, (style, value)) in present.iter().enumerate() {
        let stop = if i + 1 == present.len() { "." } else { "," };
        match style {
            Style::Plain => push_text(parts, format!("{}{}", value, stop)),
            Style::Quoted => push_text(parts, format!("\"{}{}\"", value, stop)),
            Style::Emphasis => {
                parts.push(EntryPart::Emphasis(value.to_string()));
                push_text(parts, stop.to_string());
            }
        }
        if i + 1 < present.len() {
            push_text(parts, " ".to_string());
        }
    }
}

fn push_text(parts: &mut Vec<EntryPart>, text: String) {
    if let Some(EntryPart::Text(last)) = parts.last_mut() {
        last.push_str(&text);
    } else {
        parts.push(EntryPart::Text(text));
    }
}
