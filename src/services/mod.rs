//! Service layer for the monitor.
//!
//! This module contains:
//! - Page fetching with retry (`HttpFetcher`)
//! - Text extraction from page bodies (`HtmlTextExtractor`, `PlainTextExtractor`)

mod extractor;
mod fetcher;

pub use extractor::{HtmlTextExtractor, PlainTextExtractor, TextExtractor, normalize_lines};
pub use fetcher::{HttpFetcher, PageFetcher};
