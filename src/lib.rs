// src/lib.rs
// =============================================================================
// site-guardian: crawl a rendered or locally served site and report internal
// links that point nowhere.
//
// Modules, leaves first:
// - checker: link extraction (HTML) and resolution (URL and filesystem paths)
// - crawl: live crawl engine with a per-page validation hook
// - offline: validation of a rendered directory against the filesystem
// - server: embedded static file server for live crawls
// - site: entry points that bracket a crawl with the server's lifetime
// =============================================================================

pub mod checker;
pub mod crawl;
pub mod offline;
pub mod server;
pub mod site;
