// src/checker/mod.rs
// =============================================================================
// This module contains the link logic shared by live crawls and offline
// validation.
//
// Submodules:
// - html: Finds link-bearing attributes in an HTML document
// - resolve: Turns raw link text into a canonical local path
//
// Rust concepts:
// - Modules: Organize code into namespaces
// - pub use: Re-export items to simplify imports for users of this module
// =============================================================================

mod html;
mod resolve;

pub use html::{extract_links, iter_links, parse_document, Link, ParseError};
pub use resolve::{
    decode_path, internal_path, is_external, normalize_fs_path, resolve, resolve_url_path,
    FsPaths, PathStyle, UrlPaths, ROOT,
};
