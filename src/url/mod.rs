//! URL handling module for Legal-Scout
//!
//! This module provides URL normalization, domain extraction, allowed-domain
//! matching, and the crawl admission policy.

mod domain;
mod matcher;
mod normalize;
mod policy;

pub use domain::{extract_domain, root_domain};
pub use matcher::matches_domain;
pub use normalize::{normalize_parsed, normalize_url};
pub use policy::{evaluate_url, is_domain_allowed, should_crawl_url, Admission};
