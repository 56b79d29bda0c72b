//! Error types for mmldoc.

use thiserror::Error;

/// Result type for mmldoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while parsing, resolving or rendering a document.
#[derive(Error, Debug)]
pub enum Error {
    /// A tag, brace block, quote, fence or custom delimiter was never closed.
    #[error("Unterminated {construct} at {context}")]
    UnterminatedConstruct {
        construct: &'static str,
        offset: usize,
        context: String,
    },

    /// A header could not be placed in the table of contents.
    #[error("Invalid header level {level} for section {ordinal}")]
    InvalidHeaderLevel { level: u8, ordinal: usize },

    /// A citation points at an id missing from the `@References` block.
    #[error("Unknown reference '{id}' at {context}")]
    UnknownReference {
        id: String,
        offset: usize,
        context: String,
    },

    /// A bibliography entry is missing required fields or is duplicated.
    #[error("Invalid reference '{id}': {reason}")]
    InvalidReference { id: String, reason: String },

    /// An `[[id]]` link names an article the index does not know.
    #[error("Unresolved object link '{id}' at {context}")]
    UnresolvedObjectLink {
        id: String,
        offset: usize,
        context: String,
    },

    #[error("Malformed table at {context}: {reason}")]
    MalformedTable {
        offset: usize,
        context: String,
        reason: String,
    },

    #[error("Malformed attributes on element '{tag}' at {context}: {reason}")]
    MalformedElementAttributes {
        tag: String,
        offset: usize,
        context: String,
        reason: String,
    },

    /// Error occurred during file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Byte offset of the offending construct, when the error has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::UnterminatedConstruct { offset, .. }
            | Error::UnknownReference { offset, .. }
            | Error::UnresolvedObjectLink { offset, .. }
            | Error::MalformedTable { offset, .. }
            | Error::MalformedElementAttributes { offset, .. } => Some(*offset),
            Error::InvalidHeaderLevel { .. } | Error::InvalidReference { .. } | Error::Io(_) => {
                None
            }
        }
    }
}

/// Renders `line:column` plus the source line around `offset` for error messages.
pub fn context_at(source: &str, offset: usize) -> String {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[offset..]
        .find('\n')
        .map_or(source.len(), |i| offset + i);
    let line = source[..offset].matches('\n').count() + 1;
    let column = source[line_start..offset].chars().count() + 1;
    format!("{}:{}: {}", line, column, &source[line_start..line_end])
}
