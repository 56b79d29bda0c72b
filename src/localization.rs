//! Localization strategy for the fixed strings the renderer emits.

/// Strategy for language-specific labels in generated sections.
pub trait LocalizationStrategy: Send + Sync {
    /// Heading of the bibliography section and title of its TOC entry.
    fn bibliography_title(&self) -> &str;

    /// Heading rendered above an inline table of contents.
    fn table_of_contents_title(&self) -> &str;

    /// Marker for online sources, IEEE style.
    fn online_label(&self) -> &str;

    fn available_label(&self) -> &str;

    fn accessed_label(&self) -> &str;

    /// Formats a page range (e.g. "pp. 12-14").
    fn pages(&self, pages: &str) -> String;
}

/// Default localization strategy (English, IEEE wording).
pub struct DefaultLocalization;

impl LocalizationStrategy for DefaultLocalization {
    fn bibliography_title(&self) -> &str {
        "Bibliography"
    }

    fn table_of_contents_title(&self) -> &str {
        "Table of Contents"
    }

    fn online_label(&self) -> &str {
        "[Online]"
    }

    fn available_label(&self) -> &str {
        "Available"
    }

    fn accessed_label(&self) -> &str {
        "Accessed"
    }

    fn pages(&self, pages: &str) -> String {
        if pages.contains('-') || pages.contains(',') {
            format!("pp. {}", pages)
        } else {
            format!("p. {}", pages)
        }
    }
}

/// Korean localization strategy.
pub struct KoreanLocalization;

impl LocalizationStrategy for KoreanLocalization {
    fn bibliography_title(&self) -> &str {
        "참고문헌"
    }

    fn table_of_contents_title(&self) -> &str {
        "목차"
    }

    fn online_label(&self) -> &str {
        "[온라인]"
    }

    fn available_label(&self) -> &str {
        "이용 가능"
    }

    fn accessed_label(&self) -> &str {
        "접속일"
    }

    fn pages(&self, pages: &str) -> String {
        format!("{}쪽", pages)
    }
}
