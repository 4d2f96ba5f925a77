//! Page text selection: choose OCR or native text per page before segmentation.

use serde::{Deserialize, Serialize};

/// A page as delivered by the PDF/OCR collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    pub page_number: u32,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub ocr_text: Option<String>,
}

/// Selected, trimmed, non-empty text of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

impl PageText {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// Pick OCR text when it has content, native text otherwise; drop pages
/// that end up empty after trimming. Input order is preserved.
pub fn select_page_texts(pages: &[RawPage]) -> Vec<PageText> {
    pages
        .iter()
        .filter_map(|p| {
            let ocr = p.ocr_text.as_deref().map(str::trim).filter(|t| !t.is_empty());
            let native = p.text.as_deref().map(str::trim).filter(|t| !t.is_empty());
            ocr.or(native).map(|t| PageText::new(p.page_number, t))
        })
        .collect()
}

/// Full document text: page texts joined by a blank line.
pub fn join_pages(pages: &[PageText]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(n: u32, text: Option<&str>, ocr: Option<&str>) -> RawPage {
        RawPage {
            page_number: n,
            text: text.map(String::from),
            ocr_text: ocr.map(String::from),
        }
    }

    #[test]
    fn ocr_wins_when_present() {
        let pages = select_page_texts(&[raw(1, Some("native"), Some("  scanned  "))]);
        assert_eq!(pages, vec![PageText::new(1, "scanned")]);
    }

    #[test]
    fn blank_ocr_falls_back_to_native() {
        let pages = select_page_texts(&[raw(2, Some(" native "), Some("   "))]);
        assert_eq!(pages, vec![PageText::new(2, "native")]);
    }

    #[test]
    fn empty_pages_are_dropped() {
        let pages = select_page_texts(&[
            raw(1, None, None),
            raw(2, Some("\n\t"), None),
            raw(3, Some("Art. 1"), None),
        ]);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 3);
    }

    #[test]
    fn raw_page_deserialises_with_missing_fields() {
        let p: RawPage = serde_json::from_str(r#"{"page_number": 4, "text": "x"}"#).unwrap();
        assert_eq!(p.ocr_text, None);
        assert_eq!(p.text.as_deref(), Some("x"));
    }

    #[test]
    fn join_uses_blank_lines() {
        let joined = join_pages(&[PageText::new(1, "a"), PageText::new(2, "b")]);
        assert_eq!(joined, "a\n\nb");
    }
}
