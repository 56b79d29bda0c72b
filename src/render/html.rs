use crate::bibliography::{Bibliography, EntryPart};
use crate::core::ast::{Document, Element, ElementContent, Node, NodeId};
use crate::error::{context_at, Error};
use crate::localization::LocalizationStrategy;
use crate::parser::unescape_markup;
use crate::render::escape::{escape_html_attr, escape_html_text};
use crate::render::Renderer;
use crate::toc::{anchor_id, TocNode, BIBLIOGRAPHY_ANCHOR};
use crate::{ArticleIndex, Result};

/// Serializes a parsed document to an HTML fragment.
pub struct HtmlRenderer<'a> {
    articles: &'a ArticleIndex,
    labels: &'a dyn LocalizationStrategy,
    include_bibliography: bool,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(
        articles: &'a ArticleIndex,
        labels: &'a dyn LocalizationStrategy,
        include_bibliography: bool,
    ) -> Self {
        Self {
            articles,
            labels,
            include_bibliography,
        }
    }

    fn render_nodes(&self, ctx: &Context<'_>, ids: &[NodeId], out: &mut String) -> Result<()> {
        for &id in ids {
            self.render_node(ctx, id, out)?;
        }
        Ok(())
    }

    /// Renders `ids` into a fresh buffer with outer whitespace removed.
    fn render_trimmed(&self, ctx: &Context<'_>, ids: &[NodeId]) -> Result<String> {
        let mut inner = String::new();
        self.render_nodes(ctx, ids, &mut inner)?;
        Ok(inner.trim().to_string())
    }

    fn render_node(&self, ctx: &Context<'_>, id: NodeId, out: &mut String) -> Result<()> {
        let doc = ctx.document;
        match doc.node(id) {
            Node::Text(span) => out.push_str(&escape_html_text(doc.text(*span))),
            Node::Paragraph(children) => {
                let inner = self.render_trimmed(ctx, children)?;
                out.push_str(&format!("<p>{}</p>\n", inner));
            }
            Node::Header {
                level, children, ..
            } => {
                let anchor = header_anchor(doc, id);
                let inner = self.render_trimmed(ctx, children)?;
                out.push_str(&format!(
                    "<h{level} id=\"{}\">{}</h{level}>\n",
                    escape_html_attr(&anchor),
                    inner
                ));
            }
            Node::List { ordered, items } => {
                let tag = if *ordered { "ol" } else { "ul" };
                out.push_str(&format!("<{}>\n", tag));
                self.render_nodes(ctx, items, out)?;
                out.push_str(&format!("</{}>\n", tag));
            }
            Node::ListItem { children, .. } => {
                let inner = self.render_trimmed(ctx, children)?;
                out.push_str(&format!("<li>{}</li>\n", inner));
            }
            Node::Table { head, rows } => {
                out.push_str("<table>\n<thead>\n<tr>");
                for &cell in head {
                    self.render_cell(ctx, "th", cell, out)?;
                }
                out.push_str("</tr>\n</thead>\n<tbody>\n");
                for row in rows {
                    out.push_str("<tr>");
                    for &cell in row {
                        self.render_cell(ctx, "td", cell, out)?;
                    }
                    out.push_str("</tr>\n");
                }
                out.push_str("</tbody>\n</table>\n");
            }
            // Only reached for a cell outside a table row.
            Node::Cell(_) => self.render_cell(ctx, "td", id, out)?,
            Node::BlockQuote(children) => {
                let inner = self.render_trimmed(ctx, children)?;
                out.push_str(&format!("<blockquote>{}</blockquote>", inner));
            }
            Node::CodeBlock { lang, raw } => {
                out.push_str(&format!(
                    "<pre><code{}>{}</code></pre>\n",
                    language_class(lang.as_deref()),
                    escape_html_text(doc.text(*raw))
                ));
            }
            Node::InlineCode { lang, raw } => {
                out.push_str(&format!(
                    "<code{}>{}</code>",
                    language_class(lang.as_deref()),
                    escape_html_text(doc.text(*raw))
                ));
            }
            Node::Bold(children) => {
                out.push_str("<strong>");
                self.render_nodes(ctx, children, out)?;
                out.push_str("</strong>");
            }
            Node::Italic(children) => {
                out.push_str("<em>");
                self.render_nodes(ctx, children, out)?;
                out.push_str("</em>");
            }
            Node::BoldItalic(children) => {
                out.push_str("<strong><em>");
                self.render_nodes(ctx, children, out)?;
                out.push_str("</em></strong>");
            }
            Node::Link { text, href } => {
                out.push_str(&format!(
                    "<a href=\"{}\">{}</a>",
                    escape_html_attr(href),
                    escape_html_text(&unescape_markup(doc.text(*text)))
                ));
            }
            Node::ObjectLink { id: target, span } => {
                let article =
                    self.articles
                        .get(target)
                        .ok_or_else(|| Error::UnresolvedObjectLink {
                            id: target.clone(),
                            offset: span.start,
                            context: context_at(doc.source(), span.start),
                        })?;
                out.push_str(&format!(
                    "<a class=\"object-link\" href=\"{}\">{}</a>",
                    escape_html_attr(&article.uri),
                    escape_html_text(&article.title)
                ));
            }
            Node::Citation { id: target, span } => {
                let entry = ctx.bibliography.citation(target).ok_or_else(|| {
                    Error::UnknownReference {
                        id: target.clone(),
                        offset: span.start,
                        context: context_at(doc.source(), span.start),
                    }
                })?;
                out.push_str(&format!(
                    "<a class=\"citation\" href=\"#{}\">[{}]</a>",
                    escape_html_attr(&entry.anchor_id),
                    entry.ordinal
                ));
            }
            Node::TableOfContentsMarker => {
                out.push_str(&render_toc(ctx.toc, self.labels.table_of_contents_title()));
            }
            Node::MathBlock { equation, inline } => {
                let equation = escape_html_text(doc.text(*equation).trim());
                if *inline {
                    out.push_str(&format!("<span class=\"math inline\">\\({}\\)</span>", equation));
                } else {
                    out.push_str(&format!(
                        "<div class=\"math display\">\\[{}\\]</div>\n",
                        equation
                    ));
                }
            }
            Node::Element(element) => self.render_element(ctx, element, out)?,
            Node::ParagraphBreak => {}
        }
        Ok(())
    }

    fn render_cell(&self, ctx: &Context<'_>, tag: &str, cell: NodeId, out: &mut String) -> Result<()> {
        let inner = match ctx.document.node(cell) {
            Node::Cell(children) => self.render_trimmed(ctx, children)?,
            _ => self.render_trimmed(ctx, &[cell])?,
        };
        out.push_str(&format!("<{tag}>{}</{tag}>", inner));
        Ok(())
    }

    fn render_element(&self, ctx: &Context<'_>, element: &Element, out: &mut String) -> Result<()> {
        out.push('<');
        out.push_str(&element.tag);
        for (key, values) in &element.attrs {
            out.push(' ');
            out.push_str(key);
            if !values.is_empty() {
                out.push_str(&format!("=\"{}\"", escape_html_attr(&values.join(" "))));
            }
        }
        match &element.content {
            ElementContent::Empty => out.push_str("/>"),
            ElementContent::Raw => {
                out.push('>');
                if let Some(span) = element.span {
                    out.push_str(&escape_html_text(ctx.document.text(span)));
                }
                out.push_str(&format!("</{}>", element.tag));
            }
            ElementContent::Nodes(children) => {
                out.push('>');
                self.render_nodes(ctx, children, out)?;
                out.push_str(&format!("</{}>", element.tag));
            }
        }
        Ok(())
    }

    fn render_bibliography(&self, bibliography: &Bibliography, out: &mut String) {
        out.push_str(&format!(
            "<section class=\"bibliography\">\n<h1 id=\"{}\">{}</h1>\n<ol class=\"references\">\n",
            BIBLIOGRAPHY_ANCHOR,
            escape_html_text(self.labels.bibliography_title())
        ));
        for entry in bibliography.entries() {
            out.push_str(&format!(
                "<li id=\"{}\">[{}] ",
                escape_html_attr(&entry.anchor_id),
                entry.ordinal
            ));
            for part in &entry.parts {
                match part {
                    EntryPart::Text(text) => out.push_str(&escape_html_text(text)),
                    EntryPart::Emphasis(text) => {
                        out.push_str(&format!("<em>{}</em>", escape_html_text(text)))
                    }
                    EntryPart::Link(href) => out.push_str(&format!(
                        "<a href=\"{}\">{}</a>",
                        escape_html_attr(href),
                        escape_html_text(href)
                    )),
                }
            }
            out.push_str("</li>\n");
        }
        out.push_str("</ol>\n</section>\n");
    }
}

impl Renderer for HtmlRenderer<'_> {
    fn render(&self, document: &Document, toc: &TocNode, bibliography: &Bibliography) -> Result<String> {
        let ctx = Context {
            document,
            toc,
            bibliography,
        };
        let mut out = String::new();
        for &root in document.roots() {
            self.render_node(&ctx, root, &mut out)?;
        }
        if self.include_bibliography && !bibliography.is_empty() {
            self.render_bibliography(bibliography, &mut out);
        }
        Ok(out)
    }
}

struct Context<'d> {
    document: &'d Document,
    toc: &'d TocNode,
    bibliography: &'d Bibliography,
}

fn header_anchor(document: &Document, id: NodeId) -> String {
    match document.node(id) {
        Node::Header { ordinal, .. } => anchor_id(document.plain_text(id).trim(), *ordinal),
        _ => String::new(),
    }
}

fn language_class(lang: Option<&str>) -> String {
    match lang {
        Some(lang) => format!(" class=\"language-{}\"", escape_html_attr(lang)),
        None => String::new(),
    }
}

/// Renders a TOC tree as a titled, nested ordered list.
pub fn render_toc(toc: &TocNode, title: &str) -> String {
    let mut out = format!("<nav class=\"toc\">\n<h2>{}</h2>\n", escape_html_text(title));
    render_toc_children(toc, &mut out);
    out.push_str("</nav>\n");
    out
}

fn render_toc_children(node: &TocNode, out: &mut String) {
    if node.children.is_empty() {
        return;
    }
    out.push_str("<ol>\n");
    for child in &node.children {
        out.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            escape_html_attr(&child.anchor_id),
            escape_html_text(&child.title)
        ));
        if !child.children.is_empty() {
            out.push('\n');
            render_toc_children(child, out);
        }
        out.push_str("</li>\n");
    }
    out.push_str("</ol>\n");
}
