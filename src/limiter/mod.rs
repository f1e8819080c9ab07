//! Per-client token-bucket rate limiting.
//!
//! The registry owns one bucket per client IP. Buckets are created on the first
//! request from an address and evicted by a background sweeper once idle for
//! longer than [`EVICTION_FACTOR`] sweep intervals.

mod bucket;

pub use bucket::TokenBucket;

use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::LimiterConfig;

/// Entries idle for more than this many sweep intervals are removed.
pub const EVICTION_FACTOR: u32 = 3;

#[derive(Debug)]
struct ClientEntry {
    bucket: TokenBucket,
    last_seen: Instant,
}

/// Concurrent registry of per-IP token buckets.
#[derive(Debug)]
pub struct RateLimiterRegistry {
    config: LimiterConfig,
    clients: DashMap<IpAddr, ClientEntry>,
}

impl RateLimiterRegistry {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            config,
            clients: DashMap::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn sweep_interval(&self) -> Duration {
        self.config.sweep_interval()
    }

    /// Take a token for `ip`, creating its bucket on first sight.
    pub fn allow(&self, ip: IpAddr) -> bool {
        self.allow_at(ip, Instant::now())
    }

    pub fn allow_at(&self, ip: IpAddr, now: Instant) -> bool {
        // The entry guard holds the shard lock: creation is load-or-create and the
        // token update below cannot interleave with another request for the same IP.
        let mut entry = self.clients.entry(ip).or_insert_with(|| ClientEntry {
            bucket: TokenBucket::new(self.config.burst, self.config.requests_per_second, now),
            last_seen: now,
        });
        entry.last_seen = now;
        entry.bucket.try_acquire(now)
    }

    /// Drop every client idle for longer than the eviction threshold. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let threshold = self
            .sweep_interval()
            .checked_mul(EVICTION_FACTOR)
            .unwrap_or(Duration::MAX);
        let before = self.clients.len();
        self.clients
            .retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= threshold);
        before.saturating_sub(self.clients.len())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Spawn the periodic sweep. The task runs until the returned handle is stopped.
    pub fn start_sweeper(self: &Arc<Self>) -> SweeperHandle {
        let (shutdown, mut stop) = watch::channel(false);
        let registry = Arc::clone(self);
        let period = registry.sweep_interval().max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = registry.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, remaining = registry.len(), "evicted idle rate limiter entries");
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("rate limiter sweeper stopped");
        });

        SweeperHandle { shutdown, task }
    }
}

/// Owns the background sweep task of a [`RateLimiterRegistry`].
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "rate limiter sweeper did not exit cleanly");
        }
    }
}
