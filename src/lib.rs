//! Brandscrape - config-driven product catalogue scraper.
//!
//! Extracts structured product records from brand websites according to a
//! JSON site configuration: listing pages yield product records, detail
//! pages enrich them, and image references are collected or downloaded.

pub mod cli;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod images;
pub mod models;
pub mod rules;
pub mod scrape;
pub mod storage;
pub mod utils;
