// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, to stderr)
// 3. Dispatch to the appropriate subcommand handler
// 4. Print the report as a table or JSON
// 5. Exit with proper code (0 = clean, 1 = dangling links found, 2 = error)
// =============================================================================

mod cli; // src/cli.rs - command-line parsing

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, CrawlArgs};
use site_guardian::crawl::{self, CrawlReport, IgnoreRule, PageVisit};
use site_guardian::offline::TreeReport;
use site_guardian::server::ServerConfig;
use site_guardian::site::{self, CrawlOptions};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so that --json output on stdout stays parseable
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Returns:
//   Ok(0) = no dangling links
//   Ok(1) = findings (broken pages, missing targets)
//   Err = the run could not complete
async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Serve {
            directory,
            port,
            log_requests,
            crawl,
        } => {
            let server = ServerConfig {
                root: directory,
                port,
                quiet: !log_requests,
            };
            handle_serve(&server, &crawl).await
        }
        Commands::Crawl { base_url, crawl } => handle_crawl(&base_url, &crawl).await,
        Commands::Validate {
            directory,
            json,
            fail_on_empty,
        } => handle_validate(&directory, json, fail_on_empty),
    }
}

// A fetched page that answered with an error status
#[derive(Debug, Clone, Serialize)]
struct BrokenPage {
    path: String,
    status: u16,
}

#[derive(Serialize)]
struct CrawlOutput<'a> {
    #[serde(flatten)]
    report: &'a CrawlReport,
    broken: &'a [BrokenPage],
}

fn crawl_options(args: &CrawlArgs) -> Result<CrawlOptions> {
    let ignore = args
        .ignore
        .as_deref()
        .map(IgnoreRule::new)
        .transpose()
        .context("invalid --ignore pattern")?;

    Ok(CrawlOptions {
        ignore,
        timeout: Duration::from_secs(args.timeout),
        // Error statuses go to the page hook so they can be reported
        error_status_fails: false,
    })
}

// The CLI's page hook: records pages with an error status
//
// With fail_fast, the first such page aborts the crawl instead.
fn page_checker(
    broken: &mut Vec<BrokenPage>,
    fail_fast: bool,
) -> impl FnMut(&PageVisit<'_>) -> anyhow::Result<()> + '_ {
    move |page: &PageVisit<'_>| {
        if !page.skipped.is_empty() {
            tracing::debug!("{}: {} link(s) skipped", page.path, page.skipped.len());
        }
        if page.is_success() {
            return Ok(());
        }
        if fail_fast {
            anyhow::bail!("HTTP {}", page.status);
        }
        broken.push(BrokenPage {
            path: page.path.to_string(),
            status: page.status,
        });
        Ok(())
    }
}

// Handles the 'serve' subcommand
async fn handle_serve(server: &ServerConfig, args: &CrawlArgs) -> Result<i32> {
    if !args.json {
        println!("🔍 Serving and crawling: {}", server.root.display());
    }

    let options = crawl_options(args)?;
    let mut broken = Vec::new();
    let report = site::scrape_directory(server, &options, page_checker(&mut broken, args.fail_fast))
        .await
        .with_context(|| format!("crawl of {} failed", server.root.display()))?;

    finish_crawl(&report, &broken, args.json)
}

// Handles the 'crawl' subcommand
async fn handle_crawl(base_url: &str, args: &CrawlArgs) -> Result<i32> {
    if !args.json {
        println!("🔍 Crawling: {}", base_url);
    }

    let options = crawl_options(args)?;
    let mut broken = Vec::new();
    let report = site::crawl_address(base_url, &options, page_checker(&mut broken, args.fail_fast))
        .await
        .with_context(|| format!("crawl of {} failed", base_url))?;

    finish_crawl(&report, &broken, args.json)
}

fn finish_crawl(report: &CrawlReport, broken: &[BrokenPage], json: bool) -> Result<i32> {
    if json {
        let output = CrawlOutput { report, broken };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_crawl_table(report, broken);
    }

    Ok(if broken.is_empty() { 0 } else { 1 })
}

// Handles the 'validate' subcommand
fn handle_validate(directory: &Path, json: bool, fail_on_empty: bool) -> Result<i32> {
    if !json {
        println!("🔍 Validating: {}", directory.display());
    }

    let report = site::validate_directory(directory)
        .with_context(|| format!("validation of {} failed", directory.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_validation_table(&report);
    }

    let failed = !report.is_clean() || (fail_on_empty && !report.empty_files.is_empty());
    Ok(if failed { 1 } else { 0 })
}

fn print_crawl_table(report: &CrawlReport, broken: &[BrokenPage]) {
    if !broken.is_empty() {
        println!("{:<70} {:<10}", "PATH", "STATUS");
        println!("{}", "=".repeat(80));
        for page in broken {
            println!("{:<70} {:<10}", truncate(&page.path, 67), page.status);
        }
        println!();
    }

    if !report.skipped.is_empty() {
        println!("⏭️  Skipped:");
        for path in &report.skipped {
            println!("   {}", path);
        }
        println!();
    }

    println!("📊 Summary:");
    println!("   ✅ Processed: {}", report.processed.len());
    println!("   ⏭️  Skipped: {}", report.skipped.len());
    println!("   ❌ Broken: {}", broken.len());
}

fn print_validation_table(report: &TreeReport) {
    if !report.missing.is_empty() {
        println!("{:<60} {:<40}", "MISSING TARGET", "REFERENCED FROM");
        println!("{}", "=".repeat(100));
        for (target, referrers) in &report.referrers {
            for (i, referrer) in referrers.iter().enumerate() {
                let target = if i == 0 {
                    truncate(&target.display().to_string(), 57)
                } else {
                    String::new()
                };
                println!("{:<60} {:<40}", target, referrer.display());
            }
        }
        println!();
    }

    for empty in &report.empty_files {
        println!("⚠️  Empty file: {}", empty.display());
    }

    println!("📊 Summary:");
    println!("   📄 Files: {}", report.files.len());
    println!("   ❌ Missing: {}", report.missing.len());
    println!("   ⚠️  Empty: {}", report.empty_files.len());
}

// Truncate long values so the table stays aligned
fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let head: String = value.chars().take(max).collect();
        format!("{}...", head)
    } else {
        value.to_string()
    }
}
