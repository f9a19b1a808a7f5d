// src/checker/html.rs
// =============================================================================
// This module extracts internal links from HTML documents.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Only link *discovery* happens here. Deciding what a link points to is the
// job of resolve.rs. We do classify each link once: anything external (has a
// scheme or a network location) or without a path is dropped, everything else
// is returned with its raw target text intact.
// =============================================================================

use scraper::{Html, Selector};
use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

use super::resolve;

// Every (element, attribute) pair that can reference another resource
const LINK_ATTRIBUTES: &[(&str, &str)] = &[
    ("a", "href"),
    ("area", "href"),
    ("link", "href"),
    ("img", "src"),
    ("script", "src"),
    ("iframe", "src"),
    ("frame", "src"),
    ("embed", "src"),
    ("source", "src"),
    ("audio", "src"),
    ("video", "src"),
    ("video", "poster"),
    ("track", "src"),
    ("input", "src"),
    ("form", "action"),
    ("object", "data"),
    ("blockquote", "cite"),
    ("q", "cite"),
    ("ins", "cite"),
    ("del", "cite"),
];

// Candidate elements, in document order
//
// The selector is a constant and known to be valid, so a failure here is a
// programmer error.
static CANDIDATES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[href], [src], [action], [data], [cite], [poster]")
        .expect("link selector is valid")
});

// Errors that make a document unusable for link extraction
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("document is empty")]
    Empty,
}

// A reference found inside a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Where the containing document lives (URL path or file path)
    pub source: String,
    /// Tag name of the element carrying the link ("a", "img", ...)
    pub element: String,
    /// Attribute holding the target ("href", "src", ...)
    pub attribute: &'static str,
    /// The target exactly as written in the document
    pub target: String,
    /// Document-order index among all link-bearing attributes
    pub position: usize,
}

// Parses raw document bytes into a DOM
//
// html5ever never rejects markup, so the only failure left is a document
// with nothing in it. Bytes that are not UTF-8 (a Latin-1 page, say) are
// decoded lossily: link targets are almost always ASCII, and a mangled
// accent in the body text doesn't change which links a page has.
pub fn parse_document(body: &[u8]) -> Result<Html, ParseError> {
    let text = String::from_utf8_lossy(body);
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(Html::parse_document(&text))
}

// Lists every link-bearing attribute in the document, external ones included
pub fn iter_links(document: &Html, location: &str) -> Vec<Link> {
    let mut links = Vec::new();

    for element in document.select(&CANDIDATES) {
        let name = element.value().name();

        for &(tag, attribute) in LINK_ATTRIBUTES {
            if tag != name {
                continue;
            }
            if let Some(target) = element.value().attr(attribute) {
                links.push(Link {
                    source: location.to_string(),
                    element: name.to_string(),
                    attribute,
                    target: target.to_string(),
                    position: links.len(),
                });
            }
        }
    }

    links
}

// Extracts the internal links of a document
//
// Parameters:
//   document: the parsed page
//   location: where the page was fetched from (kept on each Link)
//
// Returns: links without a scheme/network location and with a non-empty path
//
// Example:
//   <a href="/docs">, <a href="https://rust-lang.org">, <a href="#top">
//   result = [Link { target: "/docs", .. }]
pub fn extract_links(document: &Html, location: &str) -> Vec<Link> {
    iter_links(document, location)
        .into_iter()
        .filter(|link| resolve::internal_path(&link.target).is_some())
        .collect()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is LazyLock?
//    - A value computed the first time it is used, then shared
//    - Parsing a CSS selector is not free, so we do it once per process
//
// 2. Why &'static str for the attribute?
//    - Attribute names come from our LINK_ATTRIBUTES table, which lives for
//      the whole program, so there's no need to allocate a String
//
// 3. Why does select() give document order?
//    - scraper walks the tree depth-first from the root, which is the same
//      order the tags appear in the source
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(html: &str) -> Vec<String> {
        let document = parse_document(html.as_bytes()).unwrap();
        extract_links(&document, "/page")
            .into_iter()
            .map(|link| link.target)
            .collect()
    }

    #[test]
    fn test_skip_external_links() {
        let html = r#"
            <a href="https://www.rust-lang.org">Rust</a>
            <a href="mailto:test@example.com">Email</a>
            <script src="//cdn.example.com/app.js"></script>
        "#;
        assert!(targets(html).is_empty());
    }

    #[test]
    fn test_keep_raw_relative_targets() {
        let html = r#"
            <a href="/docs">Docs</a>
            <a href="../about">About</a>
            <a href="journal.html?year=2014">Journal</a>
        "#;
        assert_eq!(targets(html), vec!["/docs", "../about", "journal.html?year=2014"]);
    }

    #[test]
    fn test_skip_empty_and_anchor_only() {
        let html = r##"
            <a href="">Nothing</a>
            <a href="#top">Top</a>
            <a>No href</a>
        "##;
        assert!(targets(html).is_empty());
    }

    #[test]
    fn test_resource_references() {
        let html = r#"
            <html><head>
              <link rel="stylesheet" href="style.css">
              <script src="app.js"></script>
            </head><body>
              <img src="img/logo.png">
              <form action="/search"></form>
              <video src="clip.mp4" poster="poster.jpg"></video>
            </body></html>
        "#;
        let document = parse_document(html.as_bytes()).unwrap();
        let links = extract_links(&document, "/index.html");

        let pairs: Vec<_> = links
            .iter()
            .map(|l| (l.element.as_str(), l.attribute, l.target.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("link", "href", "style.css"),
                ("script", "src", "app.js"),
                ("img", "src", "img/logo.png"),
                ("form", "action", "/search"),
                ("video", "src", "clip.mp4"),
                ("video", "poster", "poster.jpg"),
            ]
        );
        assert!(links.iter().all(|l| l.source == "/index.html"));
    }

    #[test]
    fn test_iter_links_includes_external() {
        let html = r#"<a href="https://example.com">x</a><a href="/y">y</a>"#;
        let document = parse_document(html.as_bytes()).unwrap();
        let links = iter_links(&document, "/");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].position, 0);
        assert_eq!(links[1].position, 1);
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(parse_document(b""), Err(ParseError::Empty)));
        assert!(matches!(parse_document(b"   \n"), Err(ParseError::Empty)));
    }

    #[test]
    fn test_latin1_page_is_parsed() {
        let mut body = b"<html><head><meta charset=\"iso-8859-1\"></head><body>caf".to_vec();
        body.push(0xE9);
        body.extend_from_slice(br#" <a href="menu.html">Menu</a></body></html>"#);

        let document = parse_document(&body).unwrap();
        let links = extract_links(&document, "/index.html");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "menu.html");
    }
}
