//! Configuration module for Legal-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use legal_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Crawler will use strategy: {}", config.crawler.strategy);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlStrategy, CrawlerConfig, ExtractionConfig, OutputConfig, UserAgentConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
