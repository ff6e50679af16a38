// src/services/extractor.rs

//! Text extraction from fetched page bodies.
//!
//! Extractors must be deterministic: byte-identical input always yields the
//! same text, so unchanged pages keep their fingerprint.

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::ExtractError;

/// Elements whose text is page chrome rather than content.
const NOISE_ELEMENTS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "noscript", "iframe",
];

/// Content containers, most specific first.
const CONTENT_SELECTORS: &[&str] = &["main", "article", "[role=main]"];

/// Turns raw response bytes into normalized, line-oriented text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, raw: &[u8]) -> Result<String, ExtractError>;
}

/// Extracts the visible text of an HTML page, skipping navigation and
/// scripts, and preferring the main content area when one is marked up.
#[derive(Debug, Clone, Default)]
pub struct HtmlTextExtractor;

impl HtmlTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn content_root(document: &Html) -> ElementRef<'_> {
        CONTENT_SELECTORS
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .find_map(|sel| document.select(&sel).next())
            .unwrap_or_else(|| document.root_element())
    }
}

impl TextExtractor for HtmlTextExtractor {
    fn extract(&self, raw: &[u8]) -> Result<String, ExtractError> {
        let html = String::from_utf8_lossy(raw);
        let document = Html::parse_document(&html);
        let root = Self::content_root(&document);

        let mut chunks: Vec<&str> = Vec::new();
        for node in root.descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };
            let in_noise = node.ancestors().any(|ancestor| match ancestor.value() {
                Node::Element(el) => NOISE_ELEMENTS.contains(&el.name()),
                _ => false,
            });
            if !in_noise {
                chunks.push(&text.text);
            }
        }

        non_empty(normalize_lines(chunks))
    }
}

/// Treats the body as UTF-8 text.
#[derive(Debug, Clone, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, raw: &[u8]) -> Result<String, ExtractError> {
        let text = std::str::from_utf8(raw).map_err(|_| ExtractError::InvalidEncoding)?;
        non_empty(normalize_lines([text]))
    }
}

/// Trim every line, collapse inner whitespace, drop blank lines.
pub fn normalize_lines<'a>(chunks: impl IntoIterator<Item = &'a str>) -> String {
    chunks
        .into_iter()
        .flat_map(str::lines)
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn non_empty(text: String) -> Result<String, ExtractError> {
    if text.is_empty() {
        Err(ExtractError::Empty)
    } else {
        Ok(text)
    }
}
