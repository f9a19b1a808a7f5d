// src/crawl/page.rs
// =============================================================================
// Types handed to (and used by) the per-page validation hook.
//
// The hook is any `FnMut(&PageVisit) -> anyhow::Result<()>`. Returning an
// error aborts the whole crawl: that's how callers say "this page is wrong".
// =============================================================================

use regex::Regex;
use scraper::Html;
use std::collections::BTreeSet;

// Everything the engine knows about one fetched page
#[derive(Debug)]
pub struct PageVisit<'a> {
    /// Canonical path that was requested
    pub path: &'a str,
    pub status: u16,
    /// Address actually served, after redirects
    pub final_address: &'a str,
    /// Canonical path actually served, when it differs from `path`
    pub redirected_to: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
    /// Parsed DOM, or None when the page is not an HTML document
    pub document: Option<&'a Html>,
    /// Links on this page that matched the ignore rule
    pub skipped: &'a BTreeSet<String>,
}

impl PageVisit<'_> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// A compiled ignore pattern
//
// Matching is anchored at the start of the canonical path: "/doc" ignores
// "/doc/foo" but not "/view/doc".
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    regex: Regex,
}

impl IgnoreRule {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn matches(&self, path: &str) -> bool {
        // find() returns the leftmost match, so if any match starts at 0
        // this is it
        self.regex.find(path).is_some_and(|m| m.start() == 0)
    }
}
