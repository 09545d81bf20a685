//! Crawler coordinator - main crawl orchestration logic
//!
//! This module ties the pieces of a crawl run together:
//! - Seeding the frontier from the seed URL and discovered sitemaps
//! - Draining the frontier with a fixed pool of fetch workers
//! - Politeness pacing and optional robots.txt enforcement
//! - Feeding discovered links back into the frontier
//! - Cancellation with partial results

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{build_http_client, Fetcher, PageResult};
use crate::crawler::frontier::{CrawlTarget, Frontier};
use crate::extract::DocumentProcessor;
use crate::relevance::score_link;
use crate::robots::{discover_sitemap_seeds, fetch_robots_txt, RobotsTxt};
use crate::state::{Pacer, PageOutcome};
use crate::url::normalize_url;
use crate::{Result, ScoutError};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

/// Hint given to the seed URL so it is always fetched first
const SEED_PRIORITY: f64 = 1.0;

/// Drives crawl runs for one configuration
///
/// The configuration is frozen at construction. Each call to
/// [`Crawler::crawl`] is an independent run with its own frontier and
/// visited set; only the HTTP client is shared between runs.
#[derive(Debug)]
pub struct Crawler {
    config: Arc<CrawlerConfig>,
    robots_agent: String,
    client: Client,
    fetcher: Fetcher,
}

/// Mutable state shared by the workers of one run
struct CrawlState {
    frontier: Frontier,
    in_flight: usize,
    results: Vec<(usize, PageResult)>,
}

struct RunContext {
    state: Mutex<CrawlState>,
    wakeup: Notify,
    pacer: Pacer,
    cancel: CancellationToken,
    robots: Option<RobotsTxt>,
    /// robots.txt rules only cover URLs on the origin they were fetched from
    robots_origin: url::Origin,
    robots_agent: String,
    fetcher: Fetcher,
    max_pages: usize,
    started: Instant,
}

impl Crawler {
    /// Creates a crawler from a loaded configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to crawl
    /// * `Err(ScoutError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self> {
        let crawler_config = Arc::new(config.crawler);
        let client = build_http_client(&config.user_agent, &crawler_config)?;
        let processor = Arc::new(DocumentProcessor::from_config(
            &config.extraction,
            client.clone(),
        ));

        info!(
            "Crawler ready: strategy {}, max depth {}, max pages {}, extractors [{}]",
            crawler_config.strategy,
            crawler_config.max_depth,
            crawler_config.max_pages,
            processor.extractor_names().join(", ")
        );

        let fetcher = Fetcher::new(client.clone(), crawler_config.clone(), processor);

        Ok(Self {
            config: crawler_config,
            robots_agent: config.user_agent.crawler_name,
            client,
            fetcher,
        })
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawls from `seed_url` until the frontier is exhausted or `max_pages`
    /// pages have been fetched
    ///
    /// Single-page failures are returned as unsuccessful [`PageResult`]s;
    /// only an unusable seed URL makes this return `Err`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use legal_scout::{Config, Crawler};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let crawler = Crawler::new(Config::default())?;
    /// for page in crawler.crawl("https://example.com/").await? {
    ///     println!("{} {:.2}", page.effective_url, page.legal_score);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn crawl(&self, seed_url: &str) -> Result<Vec<PageResult>> {
        self.crawl_with_cancellation(seed_url, CancellationToken::new())
            .await
    }

    /// Same as [`Crawler::crawl`], stopping early when `cancel` fires
    ///
    /// After cancellation no new pages are dequeued, in-flight fetches run
    /// to completion, and the results gathered so far are returned.
    pub async fn crawl_with_cancellation(
        &self,
        seed_url: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<PageResult>> {
        let seed = normalize_url(seed_url)?;
        let started = Instant::now();
        info!("Starting crawl of {}", seed);

        let robots = if self.config.use_sitemaps || self.config.respect_robots_txt {
            fetch_robots_txt(&self.client, &seed).await
        } else {
            None
        };

        let mut frontier = Frontier::new(self.config.clone());
        frontier.seed(seed.clone(), SEED_PRIORITY);

        if self.config.use_sitemaps {
            let sitemap_urls =
                discover_sitemap_seeds(&self.client, &seed, robots.as_ref(), &self.config).await;
            let seeded = sitemap_urls
                .into_iter()
                .filter(|url| {
                    let hint = score_link(url, "");
                    frontier.seed(url.clone(), hint)
                })
                .count();
            if seeded > 0 {
                info!("Seeded {} URLs from sitemaps", seeded);
            }
        }

        let delay = self.politeness_delay(robots.as_ref());
        debug!("Politeness delay: {:?}", delay);

        // Child token so an internal abort never cancels the caller's token
        let run_cancel = cancel.child_token();
        let context = Arc::new(RunContext {
            state: Mutex::new(CrawlState {
                frontier,
                in_flight: 0,
                results: Vec::new(),
            }),
            wakeup: Notify::new(),
            pacer: Pacer::new(delay),
            cancel: run_cancel.clone(),
            robots: robots.filter(|_| self.config.respect_robots_txt),
            robots_origin: seed.origin(),
            robots_agent: self.robots_agent.clone(),
            fetcher: self.fetcher.clone(),
            max_pages: self.config.max_pages,
            started,
        });

        let mut workers = JoinSet::new();
        for worker_id in 0..self.config.max_concurrent_requests.max(1) {
            workers.spawn(run_worker(worker_id, context.clone()));
        }

        let mut worker_failure = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Crawl worker failed: {}", e);
                run_cancel.cancel();
                context.wakeup.notify_waiters();
                worker_failure.get_or_insert(e.to_string());
            }
        }

        if let Some(message) = worker_failure {
            return Err(ScoutError::Worker(message));
        }

        let mut results = {
            let mut state = context.state.lock().await;
            std::mem::take(&mut state.results)
        };
        results.sort_by_key(|(index, _)| *index);

        let fetched = results.len();
        let succeeded = results.iter().filter(|(_, r)| r.success).count();
        if cancel.is_cancelled() {
            info!("Crawl cancelled after {} pages", fetched);
        }
        info!(
            "Crawl completed: {} pages fetched ({} successful) in {:?}",
            fetched,
            succeeded,
            started.elapsed()
        );

        let min_score = self.config.min_legal_score;
        Ok(results
            .into_iter()
            .map(|(_, result)| result)
            .filter(|r| !r.success || r.legal_score >= min_score)
            .collect())
    }

    /// Fetches and scores a single URL without crawling
    ///
    /// Nothing is filtered: the result is returned whatever its score.
    pub async fn test_specific_url(&self, url: &str) -> Result<PageResult> {
        let url = Url::parse(url.trim())?;
        let target = CrawlTarget {
            url,
            discovered_depth: 0,
            discovered_from: None,
            priority_hint: SEED_PRIORITY,
        };

        let page = self.fetcher.fetch(&target).await;
        info!(
            "Tested {}: {} (score {:.2}, {} links)",
            page.result.url,
            page.result.outcome,
            page.result.legal_score,
            page.links.len()
        );
        Ok(page.result)
    }

    fn politeness_delay(&self, robots: Option<&RobotsTxt>) -> Duration {
        let configured = self.config.request_delay();
        if !self.config.respect_robots_txt {
            return configured;
        }

        match robots.and_then(|r| r.crawl_delay(&self.robots_agent)) {
            Some(seconds) if seconds.is_finite() && seconds > 0.0 => {
                configured.max(Duration::from_secs_f64(seconds))
            }
            _ => configured,
        }
    }
}

/// One fetch worker: dequeue, fetch, feed links back, repeat
async fn run_worker(worker_id: usize, context: Arc<RunContext>) {
    debug!("Worker {} started", worker_id);

    while let Some((index, target)) = next_target(&context).await {
        debug!(
            "Worker {} fetching {} (depth {})",
            worker_id, target.url, target.discovered_depth
        );

        let fetched = match robots_denial(&context, &target) {
            Some(denied) => Some((denied, Vec::new())),
            None => {
                tokio::select! {
                    _ = context.pacer.wait() => {
                        let page = context.fetcher.fetch(&target).await;
                        Some((page.result, page.links))
                    }
                    _ = context.cancel.cancelled() => None,
                }
            }
        };

        let mut state = context.state.lock().await;
        state.in_flight -= 1;

        if let Some((result, links)) = fetched {
            if result.success {
                if let Ok(effective) = Url::parse(&result.effective_url) {
                    state.frontier.mark_visited(&effective);
                }
            }

            let added = state.frontier.add_urls_to_queue(
                &links,
                &target.url,
                target.discovered_depth,
                Some(&result.metadata),
                result.legal_score,
            );
            if added > 0 {
                debug!("Queued {} new URLs from {}", added, target.url);
            }

            state.results.push((index, result));
            let done = state.results.len();
            if done % 10 == 0 {
                let rate = done as f64 / context.started.elapsed().as_secs_f64().max(f64::EPSILON);
                info!(
                    "Progress: {} pages fetched, {} in frontier, {:.2} pages/sec",
                    done,
                    state.frontier.len(),
                    rate
                );
            }
        }

        drop(state);
        context.wakeup.notify_waiters();
    }

    debug!("Worker {} finished", worker_id);
}

/// Waits for the next target, returning `None` once the run is over
///
/// A worker that finds the frontier empty while other fetches are still in
/// flight sleeps until one of them completes, since it may add links.
async fn next_target(context: &RunContext) -> Option<(usize, CrawlTarget)> {
    loop {
        let wakeup = context.wakeup.notified();
        {
            let mut state = context.state.lock().await;
            if context.cancel.is_cancelled() {
                return None;
            }

            if let Some(target) = state.frontier.dequeue() {
                state.in_flight += 1;
                return Some((state.frontier.dequeued_count(), target));
            }

            if state.in_flight == 0 || state.frontier.dequeued_count() >= context.max_pages {
                drop(state);
                context.wakeup.notify_waiters();
                return None;
            }
        }

        tokio::select! {
            _ = wakeup => {}
            _ = context.cancel.cancelled() => return None,
        }
    }
}

fn robots_denial(context: &RunContext, target: &CrawlTarget) -> Option<PageResult> {
    let robots = context.robots.as_ref()?;
    if target.url.origin() != context.robots_origin
        || robots.is_allowed(target.url.as_str(), &context.robots_agent)
    {
        return None;
    }

    warn!("{} disallowed by robots.txt", target.url);
    Some(PageResult::failure(
        target,
        PageOutcome::RobotsDenied,
        None,
        "Disallowed by robots.txt",
    ))
}
