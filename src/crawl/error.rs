use thiserror::Error;

use super::fetch::FetchError;
use crate::checker::ParseError;

// Anything that aborts a crawl, tagged with the path being processed
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("failed to fetch {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: FetchError,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    /// The page hook returned an error for this page
    #[error("page {path} rejected: {source}")]
    Rejected {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CrawlError {
    pub fn path(&self) -> &str {
        match self {
            CrawlError::Fetch { path, .. }
            | CrawlError::Parse { path, .. }
            | CrawlError::Rejected { path, .. } => path,
        }
    }
}
