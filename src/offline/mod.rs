// src/offline/mod.rs
// =============================================================================
// This module validates a directory of already-rendered HTML files.
//
// No network is involved. For each HTML file we extract its internal links,
// resolve them against the file's own location, and check that the target
// exists on disk. Targets that don't exist are findings, not errors: they are
// collected and returned to the caller.
//
// Root-relative links ("/css/site.css") are anchored at the site root the
// validator was created with.
// =============================================================================

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::checker::{self, FsPaths};

// Extensions of files we parse for links
const DOCUMENT_EXTENSIONS: &[&str] = &["html", "htm", "xhtml"];

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: checker::ParseError,
    },
}

// Result of validating one file
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Resolved targets that don't exist on disk
    pub missing: BTreeSet<PathBuf>,
    /// True if the file has zero length
    pub is_empty: bool,
}

// Result of validating a whole tree
#[derive(Debug, Default, Clone, Serialize)]
pub struct TreeReport {
    /// Every file found under the root
    pub files: Vec<PathBuf>,
    /// Union of the missing targets of all files
    pub missing: BTreeSet<PathBuf>,
    /// Files with zero length
    pub empty_files: BTreeSet<PathBuf>,
    /// Missing target -> files that reference it
    pub referrers: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

impl TreeReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
    }
}

// Validates files against a site root
#[derive(Debug, Clone)]
pub struct OfflineValidator {
    paths: FsPaths,
}

impl OfflineValidator {
    pub fn new(site_root: impl Into<PathBuf>) -> Self {
        Self {
            paths: FsPaths::new(site_root),
        }
    }

    pub fn site_root(&self) -> &Path {
        self.paths.root()
    }

    // Checks that every local target referenced by one file exists
    //
    // Empty files are reported as such without being parsed. Files that are
    // not HTML documents (by extension) are never scanned for links.
    pub fn validate_file(&self, path: &Path) -> Result<FileReport, ValidateError> {
        let contents = fs::read(path).map_err(|source| ValidateError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut report = FileReport {
            is_empty: contents.is_empty(),
            ..FileReport::default()
        };
        if report.is_empty || !is_document(path) {
            return Ok(report);
        }

        let document = checker::parse_document(&contents).map_err(|source| ValidateError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let base = path.to_path_buf();
        let location = path.to_string_lossy();
        for link in checker::extract_links(&document, &location) {
            let Some(target) = checker::resolve(&self.paths, &link.target, &base) else {
                continue;
            };
            if !target.exists() {
                debug!("Missing: {} -> {}", location, target.display());
                report.missing.insert(target);
            }
        }

        Ok(report)
    }

    // Validates every file below the site root
    pub fn validate_tree(&self) -> Result<TreeReport, ValidateError> {
        let mut report = TreeReport::default();

        let walker = WalkDir::new(self.site_root()).sort_by_file_name();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.into_path();
            info!("Validating: '{}'", path.display());
            let file = self.validate_file(&path)?;

            if file.is_empty {
                report.empty_files.insert(path.clone());
            }
            for target in file.missing {
                report
                    .referrers
                    .entry(target.clone())
                    .or_default()
                    .insert(path.clone());
                report.missing.insert(target);
            }
            report.files.push(path);
        }

        Ok(report)
    }
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

// Validates a single file, treating its directory as the site root
pub fn validate_file(path: &Path) -> Result<FileReport, ValidateError> {
    let root = path.parent().unwrap_or_else(|| Path::new(""));
    OfflineValidator::new(root).validate_file(path)
}

// Validates every file under `root`
pub fn validate_tree(root: &Path) -> Result<TreeReport, ValidateError> {
    OfflineValidator::new(root).validate_tree()
}
