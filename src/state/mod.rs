//! Crawl-run state
//!
//! # Components
//!
//! - `VisitedSet`: normalized URLs already dequeued in this run
//! - `Pacer`: politeness spacing between consecutive requests
//! - `PageOutcome`: how each fetch attempt ended

mod outcome;
mod pacer;
mod visited;

pub use outcome::PageOutcome;
pub use pacer::Pacer;
pub use visited::VisitedSet;
