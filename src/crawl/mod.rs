// src/crawl/mod.rs
// =============================================================================
// This module handles live crawling of a running site.
//
// Features:
// - Depth-first walk starting from the root path "/"
// - Only internal (scheme-less, host-less) links are followed
// - Each canonical path is fetched at most once
// - Ignore rule: matching paths are recorded as skipped, never fetched
// - A caller-supplied hook validates every fetched page
//
// Submodules:
// - fetch: The fetch collaborator (trait + reqwest implementation)
// - page: What the hook sees, and the ignore rule
// - queue: The frontier loop itself
// - error: Why a crawl stopped
// =============================================================================

mod error;
mod fetch;
mod page;
mod queue;

pub use error::CrawlError;
pub use fetch::{mime_essence, Fetch, FetchError, FetchedPage, HttpFetcher};
pub use page::{IgnoreRule, PageVisit};
pub use queue::{address_builder, crawl, CrawlReport};
