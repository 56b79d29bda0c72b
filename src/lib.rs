//! # mmldoc
//!
//! Parser and HTML renderer for MML, a Markdown-like markup with tagged
//! elements, tables, citations, a table-of-contents directive and math.
//!
//! ## Example
//!
//! ```no_run
//! use mmldoc::{ArticleIndex, ArticleRef, Language, MmlToHtml, RenderOptions};
//!
//! let mut articles = ArticleIndex::default();
//! articles.insert("intro", ArticleRef::new("Getting Started", "/intro.html"));
//!
//! let options = RenderOptions {
//!     articles,
//!     language: Language::En,
//!     ..Default::default()
//! };
//!
//! let converter = MmlToHtml::new(options);
//! let html = converter.convert("article.mml").unwrap();
//! println!("{}", html);
//! ```

pub mod bibliography;
pub mod converter;
pub mod core;
pub mod error;
pub mod localization;
pub mod parser;
pub mod render;
pub mod toc;

pub use bibliography::{Bibliography, BibliographyEntry};
pub use converter::{MmlToHtml, Rendered};
pub use error::{Error, Result};
pub use localization::{DefaultLocalization, KoreanLocalization, LocalizationStrategy};
pub use parser::parse;
pub use toc::{build_toc, TocNode};

use std::collections::HashMap;

/// Options for rendering an MML document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Whether to append the bibliography section after the document body.
    pub include_bibliography: bool,
    /// Known articles, used to resolve `[[id]]` object links.
    pub articles: ArticleIndex,
    /// Language of generated labels.
    pub language: Language,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_bibliography: true,
            articles: ArticleIndex::default(),
            language: Language::En,
        }
    }
}

/// Language of the fixed strings the renderer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Ko,
}

impl Language {
    /// Parses a language code such as `en` or `ko`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Language::En),
            "ko" | "korean" => Some(Language::Ko),
            _ => None,
        }
    }

    pub fn strategy(self) -> &'static dyn LocalizationStrategy {
        match self {
            Language::En => &DefaultLocalization,
            Language::Ko => &KoreanLocalization,
        }
    }
}

/// Title and location of a linkable article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRef {
    pub title: String,
    pub uri: String,
}

impl ArticleRef {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

/// Read-only index of articles keyed by id, supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct ArticleIndex {
    articles: HashMap<String, ArticleRef>,
}

impl ArticleIndex {
    pub fn insert(&mut self, id: impl Into<String>, article: ArticleRef) {
        self.articles.insert(id.into(), article);
    }

    pub fn get(&self, id: &str) -> Option<&ArticleRef> {
        self.articles.get(id)
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

impl FromIterator<(String, ArticleRef)> for ArticleIndex {
    fn from_iter<I: IntoIterator<Item = (String, ArticleRef)>>(iter: I) -> Self {
        Self {
            articles: iter.into_iter().collect(),
        }
    }
}

// Python bindings (only when 'python' feature is enabled)
#[cfg(feature = "python")]
mod python_bindings {
    use super::*;
    use pyo3::prelude::*;

    /// Converts MML source text to HTML.
    #[pyfunction]
    fn convert_mml(text: String) -> PyResult<String> {
        MmlToHtml::with_defaults()
            .convert_str(&text)
            .map(|rendered| rendered.html)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))
    }

    /// A Python module implemented in Rust.
    #[pymodule]
    pub fn mmldoc(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(convert_mml, m)?)?;
        Ok(())
    }
}
