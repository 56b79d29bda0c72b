mod escape;
mod html;

use crate::bibliography::Bibliography;
use crate::core::ast::Document;
use crate::toc::TocNode;
use crate::Result;

pub use escape::{escape_html_attr, escape_html_text};
pub use html::{render_toc, HtmlRenderer};

pub trait Renderer {
    fn render(&self, document: &Document, toc: &TocNode, bibliography: &Bibliography) -> Result<String>;
}
