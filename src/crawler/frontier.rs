//! Crawl frontier
//!
//! This module handles:
//! - The visited set (marked at dequeue time)
//! - Three scheduling containers: FIFO queue, LIFO stack, and priority heap
//! - Nofollow filtering and URL policy admission on insertion
//! - The per-run page budget
//!
//! All three containers always exist, but links are only ever inserted into
//! the one matching the configured strategy, so the other two stay empty.

use super::parser::{ExtractedLink, PageMetadata};
use crate::config::{CrawlStrategy, CrawlerConfig};
use crate::relevance::discovery_hint;
use crate::state::VisitedSet;
use crate::url::evaluate_url;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

/// A URL waiting to be fetched, with the facts of its discovery
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlTarget {
    pub url: Url,

    /// 0 for seeds, parent depth + 1 for discovered links
    pub discovered_depth: u32,

    /// Page the link was found on (`None` for seeds)
    pub discovered_from: Option<String>,

    /// Priority-heap key in `[0.0, 1.0]`
    pub priority_hint: f64,
}

/// Heap entry: higher hints first, then insertion order
#[derive(Debug)]
struct PrioritizedTarget {
    seq: u64,
    target: CrawlTarget,
}

impl Ord for PrioritizedTarget {
    fn cmp(&self, other: &Self) -> Ordering {
        self.target
            .priority_hint
            .total_cmp(&other.target.priority_hint)
            // Earlier insertions pop first among equal hints
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PrioritizedTarget {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PrioritizedTarget {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PrioritizedTarget {}

/// Mutable exploration state of one crawl run
///
/// Not synchronized: the coordinator owns it behind a single mutex, so each
/// enqueue and dequeue is atomic with respect to the others.
#[derive(Debug)]
pub struct Frontier {
    config: Arc<CrawlerConfig>,

    /// URLs already handed out (plus effective URLs of fetched pages)
    visited: VisitedSet,

    /// URLs ever inserted into a container, so rediscovery is a no-op
    scheduled: VisitedSet,

    queue: VecDeque<CrawlTarget>,
    stack: Vec<CrawlTarget>,
    heap: BinaryHeap<PrioritizedTarget>,

    seq: u64,
    dequeued: usize,
}

impl Frontier {
    pub fn new(config: Arc<CrawlerConfig>) -> Self {
        Self {
            config,
            visited: VisitedSet::new(),
            scheduled: VisitedSet::new(),
            queue: VecDeque::new(),
            stack: Vec::new(),
            heap: BinaryHeap::new(),
            seq: 0,
            dequeued: 0,
        }
    }

    /// Adds a seed URL at depth 0
    ///
    /// Seeds skip the domain rule (they define it) but not the visited set.
    /// Returns false if the URL was already known.
    pub fn seed(&mut self, url: Url, priority_hint: f64) -> bool {
        let url = strip_fragment(url);
        if self.visited.contains(&url) || !self.scheduled.insert(&url) {
            return false;
        }

        self.push(CrawlTarget {
            url,
            discovered_depth: 0,
            discovered_from: None,
            priority_hint: priority_hint.clamp(0.0, 1.0),
        });
        true
    }

    /// Schedules the admissible links found on a page
    ///
    /// `depth` is the depth of the page the links were found on; admitted
    /// links are scheduled at `depth + 1`. If `page_metadata` carries a
    /// page-level `nofollow`, nothing is scheduled. Otherwise each link is
    /// dropped if its own `rel` is `nofollow` (unless `follow_nofollow` is
    /// set) or if the URL policy rejects it.
    ///
    /// Returns the number of links inserted.
    pub fn add_urls_to_queue(
        &mut self,
        links: &[ExtractedLink],
        base_url: &Url,
        depth: u32,
        page_metadata: Option<&PageMetadata>,
        parent_score: f64,
    ) -> usize {
        if page_metadata.is_some_and(|m| m.is_nofollow()) {
            debug!("Page-level nofollow on {}; skipping {} links", base_url, links.len());
            return 0;
        }

        let child_depth = depth.saturating_add(1);
        let mut added = 0;

        for link in links {
            if link.is_nofollow() && !self.config.follow_nofollow {
                trace!("Skipping rel=nofollow link {}", link.url);
                continue;
            }

            let admission =
                evaluate_url(&self.config, &self.visited, &link.url, base_url, child_depth);
            if !admission.is_admitted() {
                trace!("Rejected {}: {:?}", link.url, admission);
                continue;
            }

            let url = strip_fragment(link.url.clone());
            if !self.scheduled.insert(&url) {
                continue;
            }

            let priority_hint = discovery_hint(&url, &link.text, parent_score);
            self.push(CrawlTarget {
                url,
                discovered_depth: child_depth,
                discovered_from: Some(base_url.to_string()),
                priority_hint,
            });
            added += 1;
        }

        added
    }

    /// Pops the next target per strategy and marks it visited
    ///
    /// Returns `None` once the active container is empty or `max_pages`
    /// targets have been handed out.
    pub fn dequeue(&mut self) -> Option<CrawlTarget> {
        while self.dequeued < self.config.max_pages {
            let target = self.pop()?;

            if !self.visited.insert(&target.url) {
                trace!("Already visited {}", target.url);
                continue;
            }

            self.dequeued += 1;
            return Some(target);
        }

        None
    }

    /// Marks a URL visited without fetching it (e.g. a page's canonical URL)
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url)
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url)
    }

    /// Number of targets waiting in the active container
    pub fn len(&self) -> usize {
        match self.config.strategy {
            CrawlStrategy::Bfs => self.queue.len(),
            CrawlStrategy::Dfs => self.stack.len(),
            CrawlStrategy::Priority => self.heap.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true when no further dequeue can succeed
    pub fn is_exhausted(&self) -> bool {
        self.is_empty() || self.dequeued >= self.config.max_pages
    }

    pub fn dequeued_count(&self) -> usize {
        self.dequeued
    }

    /// Every URL waiting in any of the three containers
    pub fn pending_urls(&self) -> Vec<&Url> {
        self.queue
            .iter()
            .chain(self.stack.iter())
            .chain(self.heap.iter().map(|p| &p.target))
            .map(|t| &t.url)
            .collect()
    }

    /// Container sizes as (queue, stack, heap)
    pub fn container_sizes(&self) -> (usize, usize, usize) {
        (self.queue.len(), self.stack.len(), self.heap.len())
    }

    fn push(&mut self, target: CrawlTarget) {
        match self.config.strategy {
            CrawlStrategy::Bfs => self.queue.push_back(target),
            CrawlStrategy::Dfs => self.stack.push(target),
            CrawlStrategy::Priority => {
                self.seq += 1;
                self.heap.push(PrioritizedTarget {
                    seq: self.seq,
                    target,
                });
            }
        }
    }

    fn pop(&mut self) -> Option<CrawlTarget> {
        match self.config.strategy {
            CrawlStrategy::Bfs => self.queue.pop_front(),
            CrawlStrategy::Dfs => self.stack.pop(),
            CrawlStrategy::Priority => self.heap.pop().map(|p| p.target),
        }
    }
}

fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}
