use crate::url::normalize_parsed;
use std::collections::HashSet;
use url::Url;

/// URLs already dequeued during one crawl run
///
/// Keys are normalized, so `https://a.com/x/#top` and `https://a.com/x`
/// count as the same page. The set only grows; it is dropped with the run.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a URL; returns false if it was already present
    pub fn insert(&mut self, url: &Url) -> bool {
        self.urls.insert(visit_key(url))
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.urls.contains(&visit_key(url))
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

fn visit_key(url: &Url) -> String {
    normalize_parsed(url.clone())
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}
