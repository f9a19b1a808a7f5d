// src/crawl/queue.rs
// =============================================================================
// This module implements the live crawl of a site's URL space.
//
// How it works:
// 1. Start with the root path "/" in a work list, marked as seen
// 2. Pop a path, fetch it, record it as processed
// 3. If the page is HTML, extract its internal links and resolve each one
// 4. Links matching the ignore rule are recorded as skipped, never fetched
// 5. Unseen links are pushed onto the work list and marked as seen
// 6. Hand the page to the caller's hook, then repeat until the list is empty
//
// One page is fully handled (fetch, extract, hook) before the next is popped,
// so the seen set never races. Any fetch failure, parse failure or hook error
// aborts the crawl; there is no retry.
//
// Rust concepts:
// - Vec as a stack: push()/pop() give us a reproducible LIFO order
// - HashSet: To track every path ever scheduled (O(1) lookup)
// - Generics: The fetcher and the hook are supplied by the caller
// =============================================================================

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, error};
use url::Url;

use super::error::CrawlError;
use super::fetch::Fetch;
use super::page::{IgnoreRule, PageVisit};
use crate::checker::{self, ROOT};

// The final partition of every internal path the crawl encountered
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    /// Paths that were fetched and handed to the hook
    pub processed: BTreeSet<String>,
    /// Paths that matched the ignore rule and were never fetched
    pub skipped: BTreeSet<String>,
}

// Characters escaped when a decoded canonical path goes back into an address
//
// '%' is in the set so a literal "100%.html" survives the round trip, and
// '?'/'#' so they stay part of the path.
const PATH_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

// Builds the address of a canonical path under a base URL
//
// Example:
//   base = "http://localhost:8080"
//   "/about" -> "http://localhost:8080/about"
//   "/my page.html" -> "http://localhost:8080/my%20page.html"
pub fn address_builder(base: &Url) -> impl Fn(&str) -> String {
    let prefix = base.as_str().trim_end_matches('/').to_string();
    move |path: &str| format!("{}{}", prefix, utf8_percent_encode(path, PATH_ESCAPES))
}

// Crawls every page reachable from the root through internal links
//
// Parameters:
//   fetcher: fetches one address at a time
//   url_builder: turns a canonical path into a fetchable address
//   ignore: paths matching this rule are skipped, never fetched
//   on_page: validation hook, called once per fetched page
//
// Returns: the processed and skipped path sets
pub async fn crawl<F, B, H>(
    fetcher: &F,
    url_builder: B,
    ignore: Option<&IgnoreRule>,
    mut on_page: H,
) -> Result<CrawlReport, CrawlError>
where
    F: Fetch,
    B: Fn(&str) -> String,
    H: FnMut(&PageVisit<'_>) -> anyhow::Result<()>,
{
    // Paths still to fetch
    let mut frontier = vec![ROOT.to_string()];

    // Every path ever scheduled, so nothing enters the frontier twice
    let mut seen = HashSet::from([ROOT.to_string()]);

    let mut report = CrawlReport::default();

    while let Some(path) = frontier.pop() {
        debug!("Processing: {}", path);
        report.processed.insert(path.clone());

        let address = url_builder(&path);
        let page = fetcher
            .fetch(&address)
            .await
            .map_err(|source| CrawlError::Fetch {
                path: path.clone(),
                source,
            })?;

        // Redirects are an anomaly, but we keep going with what we received
        let final_path = page.final_path();
        let redirected = final_path != path;
        if redirected {
            error!("Redirected: {} -> {}", path, final_path);
        }

        let mut skipped = BTreeSet::new();
        let document = if page.is_html() {
            let document = checker::parse_document(&page.body).map_err(|source| {
                CrawlError::Parse {
                    path: path.clone(),
                    source,
                }
            })?;

            for link in checker::extract_links(&document, &path) {
                let Some(target) = checker::resolve_url_path(&link.target, &path) else {
                    continue;
                };

                // Checked before the ignore rule so the root can never be
                // skipped once processed
                if seen.contains(&target) {
                    debug!("Seen: {}", target);
                    continue;
                }

                if ignore.is_some_and(|rule| rule.matches(&target)) {
                    debug!("Skipping: {}", target);
                    report.skipped.insert(target.clone());
                    skipped.insert(target);
                    continue;
                }

                debug!("Scheduling: {}", target);
                seen.insert(target.clone());
                frontier.push(target);
            }

            Some(document)
        } else {
            None
        };

        let visit = PageVisit {
            path: &path,
            status: page.status,
            final_address: &page.final_address,
            redirected_to: redirected.then_some(final_path.as_str()),
            content_type: page.content_type.as_deref(),
            body: &page.body,
            document: document.as_ref(),
            skipped: &skipped,
        };
        on_page(&visit).map_err(|source| CrawlError::Rejected {
            path: path.clone(),
            source,
        })?;
    }

    Ok(report)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a Vec and not a VecDeque?
//    - We don't promise breadth-first order, only "each page once"
//    - push()/pop() on a Vec is the simplest stack there is
//    - The order is still reproducible between runs of the same site
//
// 2. Why not recursion?
//    - A deep link graph would grow the call stack without bound
//    - An explicit work list keeps memory on the heap
//
// 3. What is `let ... else`?
//    - `let Some(x) = expr else { continue; };` binds x or leaves the loop body
//    - Handy for skipping items that don't match a pattern
//
// 4. Why does on_page take &PageVisit<'_>?
//    - The visit borrows the body and DOM we already hold
//    - No copies are made just to call the hook
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::fetch::{FetchError, FetchedPage};
    use std::cell::RefCell;
    use std::collections::HashMap;

    const BASE: &str = "http://site.test";

    // An in-memory site: path -> (content type, body)
    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, (String, String)>,
        redirects: HashMap<String, String>,
        fetched: RefCell<Vec<String>>,
    }

    impl FakeSite {
        fn html(mut self, path: &str, body: &str) -> Self {
            self.pages
                .insert(path.to_string(), ("text/html".to_string(), body.to_string()));
            self
        }

        fn other(mut self, path: &str, content_type: &str, body: &str) -> Self {
            self.pages
                .insert(path.to_string(), (content_type.to_string(), body.to_string()));
            self
        }

        fn redirect(mut self, from: &str, to: &str) -> Self {
            self.redirects.insert(from.to_string(), to.to_string());
            self
        }
    }

    impl Fetch for FakeSite {
        async fn fetch(&self, address: &str) -> Result<FetchedPage, FetchError> {
            let requested = address.strip_prefix(BASE).unwrap_or(address).to_string();
            self.fetched.borrow_mut().push(requested.clone());

            let served = self.redirects.get(&requested).unwrap_or(&requested);
            let (content_type, body) =
                self.pages.get(served).ok_or_else(|| FetchError::Other {
                    address: address.to_string(),
                    message: "connection refused".to_string(),
                })?;

            Ok(FetchedPage {
                status: 200,
                final_address: format!("{}{}", BASE, served),
                content_type: Some(content_type.clone()),
                body: body.as_bytes().to_vec(),
            })
        }
    }

    fn builder() -> impl Fn(&str) -> String {
        address_builder(&Url::parse(BASE).unwrap())
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    async fn crawl_site(site: &FakeSite, ignore: Option<&str>) -> Result<CrawlReport, CrawlError> {
        let rule = ignore.map(|p| IgnoreRule::new(p).unwrap());
        crawl(site, builder(), rule.as_ref(), |_: &PageVisit<'_>| Ok(())).await
    }

    #[test]
    fn test_address_builder() {
        let build = address_builder(&Url::parse("http://localhost:8080/").unwrap());
        assert_eq!(build("/about"), "http://localhost:8080/about");
        assert_eq!(build("/"), "http://localhost:8080/");
        assert_eq!(build("/my page.html"), "http://localhost:8080/my%20page.html");
        assert_eq!(build("/café/100%"), "http://localhost:8080/caf%C3%A9/100%25");
    }

    #[tokio::test]
    async fn test_two_pages_linking_each_other() {
        let site = FakeSite::default()
            .html("/", r#"<a href="/about">About</a>"#)
            .html("/about", r#"<a href="/">Home</a>"#);

        let report = crawl_site(&site, None).await.unwrap();
        assert_eq!(report.processed, set(&["/", "/about"]));
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_ignored_link_is_skipped_not_fetched() {
        let site = FakeSite::default().html("/", r#"<a href="/secret">Secret</a>"#);

        let report = crawl_site(&site, Some(r"/secret")).await.unwrap();
        assert_eq!(report.processed, set(&["/"]));
        assert_eq!(report.skipped, set(&["/secret"]));
        assert_eq!(*site.fetched.borrow(), vec!["/"]);
    }

    #[tokio::test]
    async fn test_root_is_never_skipped() {
        let site = FakeSite::default()
            .html("/", r#"<a href="/a">A</a>"#)
            .html("/a", r#"<a href="/">Home</a>"#);

        // "/" matches every path, including the root itself
        let report = crawl_site(&site, Some("/")).await.unwrap();
        assert_eq!(report.processed, set(&["/"]));
        assert_eq!(report.skipped, set(&["/a"]));
        assert!(report.processed.is_disjoint(&report.skipped));
    }

    #[tokio::test]
    async fn test_external_links_are_excluded() {
        let site = FakeSite::default().html(
            "/",
            r#"<a href="https://example.com/">x</a>
               <a href="mailto:me@example.com">y</a>
               <img src="//cdn.example.com/logo.png">"#,
        );

        let report = crawl_site(&site, Some(".*")).await.unwrap();
        assert_eq!(report.processed, set(&["/"]));
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_each_page_fetched_once() {
        let site = FakeSite::default()
            .html("/", r#"<a href="a/">A</a><a href="b/">B</a><a href="./a/">A again</a>"#)
            .html("/a/", r#"<a href="../b/">B</a><a href="../">Up</a><a href="x.html">X</a>"#)
            .html("/b/", r#"<a href="/a/x.html?v=1#top">X</a>"#)
            .html("/a/x.html", r#"<a href="/b/">B</a>"#);

        let report = crawl_site(&site, None).await.unwrap();
        assert_eq!(report.processed, set(&["/", "/a/", "/b/", "/a/x.html"]));

        let fetched = site.fetched.borrow();
        let unique: HashSet<_> = fetched.iter().collect();
        assert_eq!(unique.len(), fetched.len(), "fetched twice: {:?}", fetched);
    }

    #[tokio::test]
    async fn test_unreachable_pages_are_not_visited() {
        let site = FakeSite::default()
            .html("/", "<p>no links</p>")
            .html("/orphan", "<p>nobody links here</p>");

        let report = crawl_site(&site, None).await.unwrap();
        assert_eq!(report.processed, set(&["/"]));
    }

    #[tokio::test]
    async fn test_non_html_resources_are_not_scanned() {
        let site = FakeSite::default()
            .html("/", r#"<a href="/data.txt">Data</a>"#)
            .other("/data.txt", "text/plain", r#"<a href="/hidden">not a link</a>"#);

        let documents = RefCell::new(Vec::new());
        let report = crawl(&site, builder(), None, |page: &PageVisit<'_>| {
            documents
                .borrow_mut()
                .push((page.path.to_string(), page.document.is_some()));
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(report.processed, set(&["/", "/data.txt"]));
        let mut documents = documents.into_inner();
        documents.sort();
        assert_eq!(
            documents,
            vec![("/".to_string(), true), ("/data.txt".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn test_hook_receives_per_page_skips() {
        let site = FakeSite::default()
            .html("/", r#"<a href="/doc/a">a</a><a href="/page">p</a>"#)
            .html("/page", r#"<a href="/doc/b">b</a>"#);

        let mut per_page = Vec::new();
        let rule = IgnoreRule::new("/doc/").unwrap();
        let report = crawl(&site, builder(), Some(&rule), |page: &PageVisit<'_>| {
            per_page.push((page.path.to_string(), page.skipped.clone()));
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(report.skipped, set(&["/doc/a", "/doc/b"]));
        per_page.sort();
        assert_eq!(
            per_page,
            vec![
                ("/".to_string(), set(&["/doc/a"])),
                ("/page".to_string(), set(&["/doc/b"])),
            ]
        );
    }

    #[tokio::test]
    async fn test_hook_error_aborts_crawl() {
        let site = FakeSite::default()
            .html("/", r#"<a href="/bad">bad</a>"#)
            .html("/bad", r#"<a href="/never">never</a>"#)
            .html("/never", "<p>unreached</p>");

        let err = crawl(&site, builder(), None, |page: &PageVisit<'_>| {
            if page.path == "/bad" {
                anyhow::bail!("page has an error banner");
            }
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, CrawlError::Rejected { .. }));
        assert_eq!(err.path(), "/bad");
        assert!(!site.fetched.borrow().contains(&"/never".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_crawl() {
        let site = FakeSite::default().html("/", r#"<a href="/missing">m</a>"#);

        let err = crawl_site(&site, None).await.unwrap_err();
        assert!(matches!(err, CrawlError::Fetch { .. }));
        assert_eq!(err.path(), "/missing");
    }

    #[tokio::test]
    async fn test_parse_failure_aborts_crawl() {
        let site = FakeSite::default()
            .html("/", r#"<a href="/blank">b</a>"#)
            .html("/blank", "   ");

        let err = crawl_site(&site, None).await.unwrap_err();
        assert!(matches!(err, CrawlError::Parse { .. }));
        assert_eq!(err.path(), "/blank");
    }

    #[tokio::test]
    async fn test_redirect_is_reported_not_fatal() {
        let site = FakeSite::default()
            .html("/", r#"<a href="/old">old</a>"#)
            .redirect("/old", "/new")
            .html("/new", r#"<a href="sibling">s</a>"#)
            .html("/sibling", "<p>end</p>");

        let mut redirects = Vec::new();
        let report = crawl(&site, builder(), None, |page: &PageVisit<'_>| {
            redirects.push((page.path.to_string(), page.redirected_to.map(str::to_string)));
            Ok(())
        })
        .await
        .unwrap();

        // Links on the redirected page resolve against the requested path
        assert_eq!(report.processed, set(&["/", "/old", "/sibling"]));

        redirects.sort();
        assert_eq!(
            redirects,
            vec![
                ("/".to_string(), None),
                ("/old".to_string(), Some("/new".to_string())),
                ("/sibling".to_string(), None),
            ]
        );
    }

    #[tokio::test]
    async fn test_encoded_path_is_not_a_redirect() {
        let site = FakeSite::default()
            .html("/", r#"<a href="my%20page.html">a</a><a href="my page.html">b</a>"#)
            .html("/my%20page.html", "<p>spaced</p>");

        let mut redirects = Vec::new();
        let report = crawl(&site, builder(), None, |page: &PageVisit<'_>| {
            redirects.push(page.redirected_to.map(str::to_string));
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(report.processed, set(&["/", "/my page.html"]));
        assert_eq!(*site.fetched.borrow(), vec!["/", "/my%20page.html"]);
        assert!(redirects.iter().all(Option::is_none), "{:?}", redirects);
    }
}
