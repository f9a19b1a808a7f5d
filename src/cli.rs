// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Three subcommands:
// - serve: start an embedded server over a rendered directory and crawl it
// - crawl: crawl a site that is already being served
// - validate: check a rendered directory offline, no server involved
// =============================================================================

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "site-guardian",
    version = "0.1.0",
    about = "Find dangling internal links in a rendered or locally served site",
    long_about = "site-guardian follows every relative link of a site, visits each page once, \
                  and reports internal targets that don't exist. Run it before publishing a \
                  static site to make sure nothing points nowhere."
)]
pub struct Cli {
    /// Increase log verbosity (-v: info, -vv: debug). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve a directory of rendered files and crawl it
    ///
    /// Example: site-guardian serve ./public --ignore '/drafts/'
    Serve {
        /// Directory of rendered HTML files
        directory: PathBuf,

        /// Port for the embedded server (0 picks a free port)
        #[arg(long, default_value_t = 0)]
        port: u16,

        /// Log every request the embedded server handles (needs -vv)
        #[arg(long)]
        log_requests: bool,

        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Crawl a site that is already being served
    ///
    /// Example: site-guardian crawl http://localhost:8080
    Crawl {
        /// Base address of the site; crawling starts at its root path "/"
        base_url: String,

        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Check that every local link target in a rendered directory exists
    ///
    /// Example: site-guardian validate ./public --fail-on-empty
    Validate {
        /// Directory of rendered HTML files
        directory: PathBuf,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,

        /// Treat empty files as findings (exit code 1)
        #[arg(long)]
        fail_on_empty: bool,
    },
}

// Options shared by the two live-crawl subcommands
#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Regular expression of paths to record but never fetch
    ///
    /// Matched against the start of each canonical path, e.g. '/(doc|context)/'
    #[arg(long)]
    pub ignore: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Stop at the first page with an error status
    #[arg(long)]
    pub fail_fast: bool,

    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,
}
