use std::time::Duration;

use tokio::time::Instant;

/// Staggered appearance of overlay boxes: box `i` shows up `base + i * stride`
/// after the result is first rendered.
#[derive(Debug, Clone)]
pub struct StaggeredReveal {
    base: Duration,
    stride: Duration,
    key: Option<u64>,
    count: usize,
    started_at: Option<Instant>,
}

impl StaggeredReveal {
    pub fn new(base: Duration, stride: Duration) -> Self {
        Self {
            base,
            stride,
            key: None,
            count: 0,
            started_at: None,
        }
    }

    /// Point the reveal at a result. Re-syncing the same `key` keeps the
    /// running schedule; a new key starts over with nothing visible.
    pub fn sync(&mut self, key: Option<u64>, count: usize, now: Instant) {
        if self.key == key && self.count == count {
            return;
        }
        self.key = key;
        self.count = count;
        self.started_at = key.map(|_| now);
    }

    fn offset(&self, index: usize) -> Duration {
        self.base + self.stride * index as u32
    }

    /// Indices visible at `now`, in reveal order.
    pub fn visible(&self, now: Instant) -> Vec<usize> {
        let Some(started_at) = self.started_at else {
            return Vec::new();
        };
        let elapsed = now.saturating_duration_since(started_at);
        (0..self.count)
            .take_while(|&index| elapsed >= self.offset(index))
            .collect()
    }

    /// When the next hidden box appears, if any remain.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        let started_at = self.started_at?;
        let shown = self.visible(now).len();
        (shown < self.count).then(|| started_at + self.offset(shown))
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        self.visible(now).len() == self.count
    }
}
