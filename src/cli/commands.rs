//! CLI commands implementation.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::SiteConfig;
use crate::fetch::HttpFetcher;
use crate::rules::ScrapeRules;
use crate::scrape::Scraper;
use crate::storage::save_document;

#[derive(Parser)]
#[command(name = "brandscrape")]
#[command(about = "Config-driven product catalogue scraper")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a site and write the extracted document
    Scrape {
        /// Site configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,
    },

    /// Check a configuration file without fetching anything
    Validate {
        /// Site configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape { config } => cmd_scrape(&config).await,
        Commands::Validate { config } => cmd_validate(&config),
    }
}

async fn cmd_scrape(config_path: &PathBuf) -> anyhow::Result<()> {
    let config = SiteConfig::load(config_path)?;
    let rules = ScrapeRules::compile(&config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!(
        "Scraping {} ({} pages)...",
        rules.brand,
        rules.pages.len()
    ));

    let fetcher = HttpFetcher::new();
    let document = Scraper::new(&rules, &fetcher).run().await;
    let output_path = save_document(&rules.data_dir, &document)?;
    pb.finish_and_clear();

    let product_count = document.products.as_ref().map_or(0, Vec::len);
    println!(
        "{} {}: {} pages, {} products",
        style("✓").green(),
        rules.brand,
        document.pages.len(),
        product_count
    );
    println!("  {} {}", style("→").dim(), output_path.display());
    Ok(())
}

fn cmd_validate(config_path: &PathBuf) -> anyhow::Result<()> {
    let config = SiteConfig::load(config_path)?;
    let rules = ScrapeRules::compile(&config)?;

    let listing_pages = rules.pages.iter().filter(|p| p.is_listing()).count();
    println!("{} {} is valid", style("✓").green(), config_path.display());
    println!(
        "  brand: {}, pages: {} ({} listing), page rules: {}",
        rules.brand,
        rules.pages.len(),
        listing_pages,
        rules.page_extract.len()
    );
    if let Some(detail) = &rules.detail {
        println!(
            "  detail: {} name rules, {} extract rules",
            detail.product_name.len(),
            detail.extract.len()
        );
    }
    if let Some(images) = &rules.images {
        match &images.sources {
            Some(sources) => println!(
                "  images: {} sources (download: {})",
                sources.sources.len(),
                sources.download
            ),
            None => println!("  images: {} legacy blocks", images.blocks.len()),
        }
    }
    Ok(())
}
