//! Generic HTTP/HTML extractor, grounded on
//! `original_source/app/content_extractor.py::_extract_with_beautifulsoup`:
//! fetch, reject non-HTML/non-text content types, strip `<script>`/`<style>`,
//! and take the body's text content.

use async_trait::async_trait;
use podcast_core::{ContentExtractor, ExtractedContent, Result};
use scraper::{Html, Selector};

use crate::error::ExtractionError;

pub struct GenericHttpExtractor {
    client: reqwest::Client,
}

impl GenericHttpExtractor {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for GenericHttpExtractor {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl ContentExtractor for GenericHttpExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedContent> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ExtractionError::Http { url: url.to_string(), source })?;

        if !response.status().is_success() {
            return Err(ExtractionError::HttpStatus { url: url.to_string(), status: response.status() }.into());
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        let body = response
            .text()
            .await
            .map_err(|source| ExtractionError::Http { url: url.to_string(), source })?;

        let text = if content_type.contains("html") {
            extract_body_text(&body)
        } else if content_type.contains("text/") {
            body
        } else {
            return Err(ExtractionError::UnsupportedContentType { url: url.to_string(), content_type }.into());
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ExtractionError::EmptyContent { url: url.to_string() }.into());
        }

        Ok(ExtractedContent { text, attribution: url.to_string() })
    }
}

/// Strips `<script>`/`<style>` and joins the remaining text nodes under
/// `<body>` with single spaces, falling back to the whole document when a
/// `<body>` tag is absent.
fn extract_body_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("static selector is valid");
    let skip_selector = Selector::parse("script, style").expect("static selector is valid");

    let skip_texts: std::collections::HashSet<_> =
        document.select(&skip_selector).flat_map(|el| el.text().collect::<Vec<_>>()).collect();

    let collect_from = |root: scraper::ElementRef| -> String {
        root.text()
            .filter(|t| !skip_texts.contains(t))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    };

    match document.select(&body_selector).next() {
        Some(body) => collect_from(body),
        None => document.root_element().text().map(str::trim).filter(|t| !t.is_empty()).collect::<Vec<_>>().join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style_text() {
        let html = "<html><body><script>var x = 1;</script><style>.a{color:red}</style>\
<p>Hello world</p></body></html>";
        let text = extract_body_text(html);
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn joins_multiple_elements_with_spaces() {
        let html = "<html><body><h1>Title</h1><p>Paragraph one.</p><p>Paragraph two.</p></body></html>";
        let text = extract_body_text(html);
        assert_eq!(text, "Title Paragraph one. Paragraph two.");
    }
}
