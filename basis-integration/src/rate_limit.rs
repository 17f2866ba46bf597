use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, oneshot};

/// Priority levels for rate limited operations.
///
/// Order management acquires at `High`, market data snapshots at `Normal`, and
/// housekeeping (eg/ symbol info refresh) at `Low`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Priority {
    High,
    Normal,
    Low,
}

struct Waiter {
    tx: oneshot::Sender<()>,
}

struct Inner {
    capacity: usize,
    tokens: usize,
    interval: Duration,
    last_refill: Instant,
    base_interval: Duration,
    max_interval: Duration,
    suspended_until: Option<Instant>,
    high: VecDeque<Waiter>,
    normal: VecDeque<Waiter>,
    low: VecDeque<Waiter>,
}

impl Inner {
    fn refill(&mut self) {
        let now = Instant::now();

        // A venue-signalled suspension window (eg/ Http 429 Retry-After) blocks all
        // refills until it elapses.
        if let Some(until) = self.suspended_until {
            if now < until {
                return;
            }
            self.suspended_until = None;
        }

        if now.duration_since(self.last_refill) >= self.interval {
            let periods =
                now.duration_since(self.last_refill).as_millis() / self.interval.as_millis();
            let add_tokens = (periods as usize + 1) * self.capacity;
            self.last_refill = now;
            self.tokens = usize::min(self.tokens + add_tokens, self.capacity);
            while self.tokens > 0 {
                if let Some(waiter) = self
                    .high
                    .pop_front()
                    .or_else(|| self.normal.pop_front())
                    .or_else(|| self.low.pop_front())
                {
                    self.tokens -= 1;
                    let _ = waiter.tx.send(());
                } else {
                    break;
                }
            }
        }
    }
}

/// Token bucket rate limiter with priority queues, adaptive backoff, and venue-signalled
/// suspension windows.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Construct a new [`RateLimiter`] allowing `capacity` operations every `interval`.
    pub fn new(capacity: usize, interval: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                capacity,
                tokens: capacity,
                interval,
                last_refill: Instant::now(),
                base_interval: interval,
                max_interval: interval * 16,
                suspended_until: None,
                high: VecDeque::new(),
                normal: VecDeque::new(),
                low: VecDeque::new(),
            })),
        }
    }

    /// Acquire a permit according to the provided priority.
    pub async fn acquire(&self, priority: Priority) {
        loop {
            let rx = {
                let mut inner = self.inner.lock().await;
                inner.refill();
                if inner.tokens > 0 && inner.suspended_until.is_none() {
                    inner.tokens -= 1;
                    None
                } else {
                    let (tx, rx) = oneshot::channel();
                    let waiter = Waiter { tx };
                    match priority {
                        Priority::High => inner.high.push_back(waiter),
                        Priority::Normal => inner.normal.push_back(waiter),
                        Priority::Low => inner.low.push_back(waiter),
                    }
                    Some(rx)
                }
            };
            match rx {
                None => return,
                Some(rx) => {
                    let _ = rx.await;
                }
            }
        }
    }

    /// Suspend all permit grants for the provided window.
    ///
    /// Used when the venue returns an explicit Retry-After.
    pub async fn suspend_for(&self, window: Duration) {
        let mut inner = self.inner.lock().await;
        let until = Instant::now() + window;
        inner.suspended_until = Some(match inner.suspended_until {
            Some(existing) if existing > until => existing,
            _ => until,
        });
        inner.tokens = 0;
    }

    /// Determine if permit grants are currently suspended.
    pub async fn is_suspended(&self) -> bool {
        let inner = self.inner.lock().await;
        matches!(inner.suspended_until, Some(until) if Instant::now() < until)
    }

    /// Report a rate limit violation without an explicit window to trigger adaptive backoff.
    pub async fn report_violation(&self) {
        let mut inner = self.inner.lock().await;
        let next = inner.interval * 2;
        inner.interval = std::cmp::min(next, inner.max_interval);
    }

    /// Reset the current backoff to the base interval.
    pub async fn reset_backoff(&self) {
        let mut inner = self.inner.lock().await;
        inner.interval = inner.base_interval;
    }
}
