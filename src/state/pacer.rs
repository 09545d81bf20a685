use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces out request starts so consecutive fetches are at least `delay` apart
///
/// Shared by all workers of a crawl run. Each caller reserves the next free
/// slot under the lock and then sleeps outside it, so workers queue up in
/// reservation order without holding the lock while waiting.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    /// The spacing enforced between request starts
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits until this caller may start its request
    pub async fn wait(&self) {
        let start = self.reserve(Instant::now()).await;
        tokio::time::sleep_until(start).await;
    }

    /// Reserves the next request slot at or after `now` and returns its start time
    pub async fn reserve(&self, now: Instant) -> Instant {
        let mut next_slot = self.next_slot.lock().await;
        let start = match *next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };
        *next_slot = Some(start + self.delay);
        start
    }
}
