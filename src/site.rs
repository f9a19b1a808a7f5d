// src/site.rs
// =============================================================================
// Entry points that tie the pieces together.
//
// - scrape_directory: start the embedded server over a directory, crawl it,
//   shut the server down (on success AND on failure)
// - crawl_address: crawl a site that is already being served somewhere
// - validate_directory: offline validation of a rendered directory
// =============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::crawl::{self, CrawlError, CrawlReport, FetchError, HttpFetcher, IgnoreRule, PageVisit};
use crate::offline::{self, TreeReport, ValidateError};
use crate::server::{self, ServerConfig, ServerError};

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("invalid base address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Client(#[from] FetchError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    Crawl(#[from] CrawlError),

    #[error(transparent)]
    Validate(#[from] ValidateError),
}

// Settings for one live crawl
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub ignore: Option<IgnoreRule>,
    /// Per-request timeout of the HTTP fetcher
    pub timeout: Duration,
    /// Treat 4xx/5xx responses as fetch failures instead of passing them to
    /// the page hook
    pub error_status_fails: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            ignore: None,
            timeout: Duration::from_secs(10),
            error_status_fails: true,
        }
    }
}

// Serves `config.root` and crawls it
//
// The server's lifetime brackets exactly this one crawl.
pub async fn scrape_directory<H>(
    config: &ServerConfig,
    options: &CrawlOptions,
    on_page: H,
) -> Result<CrawlReport, SiteError>
where
    H: FnMut(&PageVisit<'_>) -> anyhow::Result<()>,
{
    ensure_directory(&config.root)?;

    let handle = server::start(config).await?;
    let result = crawl_address(&handle.base_url(), options, on_page).await;

    // A crawl error is more useful to the caller than a shutdown error
    match (result, handle.shutdown().await) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(err)) => Err(err.into()),
        (Err(err), shutdown) => {
            if let Err(shutdown_err) = shutdown {
                warn!("Server shutdown after failed crawl: {}", shutdown_err);
            }
            Err(err)
        }
    }
}

// Crawls a site served at `base_url`
pub async fn crawl_address<H>(
    base_url: &str,
    options: &CrawlOptions,
    on_page: H,
) -> Result<CrawlReport, SiteError>
where
    H: FnMut(&PageVisit<'_>) -> anyhow::Result<()>,
{
    let base = Url::parse(base_url).map_err(|source| SiteError::InvalidAddress {
        address: base_url.to_string(),
        source,
    })?;

    let fetcher = HttpFetcher::new(options.timeout, options.error_status_fails)?;

    info!("Crawling {}", base);
    let report = crawl::crawl(
        &fetcher,
        crawl::address_builder(&base),
        options.ignore.as_ref(),
        on_page,
    )
    .await?;
    info!(
        "Crawled {} page(s), skipped {}",
        report.processed.len(),
        report.skipped.len()
    );

    Ok(report)
}

// Validates every file under `root` against the filesystem
pub fn validate_directory(root: &Path) -> Result<TreeReport, SiteError> {
    ensure_directory(root)?;
    let report = offline::validate_tree(root)?;
    info!(
        "Validated {} file(s), {} missing target(s)",
        report.files.len(),
        report.missing.len()
    );
    Ok(report)
}

fn ensure_directory(path: &Path) -> Result<(), SiteError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(SiteError::NotADirectory(path.to_path_buf()))
    }
}
