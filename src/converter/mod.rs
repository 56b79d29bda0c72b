//! Pipeline façade: parse, build the TOC, resolve the bibliography, render.

use crate::bibliography::Bibliography;
use crate::core::ast::Document;
use crate::parser::parse;
use crate::render::{HtmlRenderer, Renderer};
use crate::toc::{build_toc, build_toc_from_sections, sections, TocNode};
use crate::{RenderOptions, Result};
use std::path::Path;

/// Everything produced for one document.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub document: Document,
    pub html: String,
    pub toc: TocNode,
    pub bibliography: Bibliography,
}

/// Main converter struct that orchestrates MML to HTML conversion.
pub struct MmlToHtml {
    options: RenderOptions,
}

impl MmlToHtml {
    /// Creates a new converter with the given options.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Creates a new converter with default options.
    pub fn with_defaults() -> Self {
        Self::new(RenderOptions::default())
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Converts an MML file to HTML.
    ///
    /// # Arguments
    /// * `path` - Path to the UTF-8 source file
    ///
    /// # Returns
    /// The rendered HTML fragment.
    pub fn convert<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "reading document");
        let source = std::fs::read_to_string(path)?;
        Ok(self.convert_str(&source)?.html)
    }

    /// Runs the whole pipeline over in-memory source text.
    ///
    /// Any error aborts the document; nothing is partially rendered.
    pub fn convert_str(&self, source: &str) -> Result<Rendered> {
        let labels = self.options.language.strategy();

        let document = parse(source)?;
        let toc = if self.options.include_bibliography {
            build_toc(&document, labels.bibliography_title())?
        } else {
            build_toc_from_sections(&sections(&document), None)?
        };
        let bibliography = Bibliography::resolve(&document, labels)?;

        let renderer = HtmlRenderer::new(
            &self.options.articles,
            labels,
            self.options.include_bibliography,
        );
        let html = renderer.render(&document, &toc, &bibliography)?;
        tracing::debug!(
            bytes = html.len(),
            toc_entries = toc.children.len(),
            references = bibliography.entries().len(),
            "rendered document"
        );

        Ok(Rendered {
            document,
            html,
            toc,
            bibliography,
        })
    }
}
