// src/checker/resolve.rs
// =============================================================================
// This module turns raw link text into a canonical local path.
//
// Both crawl modes share ONE resolve function:
// - live mode resolves against URL paths ("/docs/index.html")
// - offline mode resolves against filesystem paths under a site root
//
// The difference between the two lives in a small `PathStyle` trait that
// answers three questions: is this target root-relative, how do I anchor it at
// the root, and how do I join it to the directory of the base document.
// Everything else (external detection, query/fragment stripping, dropping
// empty targets, percent-decoding) is shared, so both modes always agree on
// structure.
//
// Canonical paths are percent-DECODED: "my%20page.html" and "my page.html"
// name the same page, and the decoded form is also what the filesystem uses.
// =============================================================================

use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::hash::Hash;
use std::path::{Component, Path, PathBuf};

// The canonical path of the site root in live mode
pub const ROOT: &str = "/";

// How a crawl mode represents and combines locations
pub trait PathStyle {
    /// Canonical path type used as identity for deduplication
    type Path: Clone + Eq + Hash + Ord;

    /// True if the target is root-relative ("/css/site.css")
    fn is_absolute(&self, target: &str) -> bool;

    /// Anchors a root-relative target at the site root
    fn from_root(&self, target: &str) -> Self::Path;

    /// Joins a relative target to the directory portion of `base`
    fn join(&self, base: &Self::Path, target: &str) -> Self::Path;

    /// Collapses `.`/`..` and redundant separators
    fn normalize(&self, path: Self::Path) -> Self::Path;
}

// Resolves a raw link target relative to `base`
//
// Returns None when the target is external (has a scheme or a network
// location) or has no path at all (e.g. "#top" or "?page=2").
pub fn resolve<S: PathStyle>(style: &S, raw: &str, base: &S::Path) -> Option<S::Path> {
    let target = decode_path(internal_path(raw)?);

    let joined = if style.is_absolute(&target) {
        style.from_root(&target)
    } else {
        style.join(base, &target)
    };

    Some(style.normalize(joined))
}

// Returns the path component of an internal link, or None for external or
// path-less links
pub fn internal_path(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    if is_external(raw) {
        return None;
    }

    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let path = &raw[..end];
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

// A link is external when it carries a scheme ("https:", "mailto:") or a
// network location ("//cdn.example.com/x.js")
//
// This is purely syntactic. "http://localhost:99999/" has an invalid port
// but it is still somebody else's URL, never a path on our site.
pub fn is_external(raw: &str) -> bool {
    raw.starts_with("//") || has_scheme(raw)
}

// scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"
//
// None of '/', '?' or '#' may appear in a scheme, so a colon after any of
// them ("docs/a:b", "?q=a:b") never counts.
fn has_scheme(raw: &str) -> bool {
    let Some(colon) = raw.find(':') else {
        return false;
    };
    let mut chars = raw[..colon].chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

// Percent-decodes a path ("my%20page.html" -> "my page.html")
//
// Sequences that don't decode to UTF-8 are replaced, not rejected.
pub fn decode_path(path: &str) -> Cow<'_, str> {
    percent_decode_str(path).decode_utf8_lossy()
}

// -----------------------------------------------------------------------------
// Live mode: slash-separated URL paths
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct UrlPaths;

impl PathStyle for UrlPaths {
    type Path = String;

    fn is_absolute(&self, target: &str) -> bool {
        target.starts_with('/')
    }

    fn from_root(&self, target: &str) -> String {
        target.to_string()
    }

    fn join(&self, base: &String, target: &str) -> String {
        // "/docs/page.html" -> "/docs/", "/docs/" stays "/docs/"
        let dir = match base.rfind('/') {
            Some(idx) => &base[..=idx],
            None => ROOT,
        };
        format!("{}{}", dir, target)
    }

    fn normalize(&self, path: String) -> String {
        let keeps_slash = path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..");

        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                // ".." never climbs above the root, like a browser
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }

        let mut canonical = String::from(ROOT);
        canonical.push_str(&segments.join("/"));
        if keeps_slash && !segments.is_empty() {
            canonical.push('/');
        }
        canonical
    }
}

// Resolves a raw link found on the page at `base` (a canonical URL path)
pub fn resolve_url_path(raw: &str, base: &str) -> Option<String> {
    resolve(&UrlPaths, raw, &base.to_string())
}

// -----------------------------------------------------------------------------
// Offline mode: filesystem paths below a site root
// -----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FsPaths {
    root: PathBuf,
}

impl FsPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PathStyle for FsPaths {
    type Path = PathBuf;

    // Link text is always slash-separated, whatever the host OS
    fn is_absolute(&self, target: &str) -> bool {
        target.starts_with('/')
    }

    fn from_root(&self, target: &str) -> PathBuf {
        self.root.join(target.trim_start_matches('/'))
    }

    fn join(&self, base: &PathBuf, target: &str) -> PathBuf {
        base.parent().unwrap_or_else(|| Path::new("")).join(target)
    }

    fn normalize(&self, path: PathBuf) -> PathBuf {
        normalize_fs_path(&path)
    }
}

// Lexical normalization, no filesystem access
// (symlinks are not followed, so "a/link/.." becomes "a")
pub fn normalize_fs_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
