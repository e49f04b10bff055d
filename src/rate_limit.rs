//! Rate limiter for outgoing provider calls.
//!
//! Two constraints are enforced jointly: a sliding-window quota (no more than
//! `max_requests` calls in any trailing `window`) and a minimum spacing
//! between consecutive calls. Both are process-wide: a single limiter
//! instance is shared by every caller, injected rather than global so tests
//! can construct a fresh one per case.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

#[derive(Debug)]
struct WindowState {
    /// Timestamps of admitted calls, oldest first
    requests: VecDeque<Instant>,
    last_call: Option<Instant>,
}

/// Sliding-window rate limiter with minimum inter-call spacing.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<WindowState>,
    max_requests: usize,
    window: Duration,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration, min_interval: Duration) -> Self {
        Self {
            state: Mutex::new(WindowState {
                requests: VecDeque::new(),
                last_call: None,
            }),
            max_requests,
            window,
            min_interval,
        }
    }

    /// Wait until a call may proceed, then claim the slot.
    ///
    /// When a constraint is violated the caller sleeps the shortest remaining
    /// duration and re-checks; the slot is only claimed (timestamp recorded)
    /// once both constraints pass under the lock.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();

                // Discard timestamps that have left the window
                while let Some(&oldest) = state.requests.front() {
                    if now.duration_since(oldest) >= self.window {
                        state.requests.pop_front();
                    } else {
                        break;
                    }
                }

                let mut waits: Vec<Duration> = Vec::new();

                if state.requests.len() >= self.max_requests {
                    if let Some(&oldest) = state.requests.front() {
                        waits.push(self.window.saturating_sub(now.duration_since(oldest)));
                    }
                }

                if let Some(last) = state.last_call {
                    let since_last = now.duration_since(last);
                    if since_last < self.min_interval {
                        waits.push(self.min_interval - since_last);
                    }
                }

                match waits.into_iter().min() {
                    None => {
                        state.requests.push_back(now);
                        state.last_call = Some(now);
                        return;
                    }
                    Some(wait) => wait.max(Duration::from_millis(1)),
                }
            };

            debug!("rate limiter: waiting {:?} before next call", wait);
            sleep(wait).await;
        }
    }

    /// Number of calls currently inside the sliding window.
    pub async fn window_occupancy(&self) -> usize {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        while let Some(&oldest) = state.requests.front() {
            if now.duration_since(oldest) >= self.window {
                state.requests.pop_front();
            } else {
                break;
            }
        }
        state.requests.len()
    }
}
