//! Per-key sliding-window admission control.
//!
//! Each key (usually a client address) owns the instants of its admitted
//! requests. A request is admitted while fewer than `max_requests` of them
//! fall inside the trailing `window`; denied checks record nothing.
//!
//! ```
//! use shelfscout_governor::{GovernorConfig, RateGovernor};
//! use std::time::Duration;
//!
//! let gov = RateGovernor::new(GovernorConfig {
//!     max_requests: 2,
//!     window: Duration::from_secs(60),
//! })
//! .unwrap();
//!
//! assert!(gov.is_allowed("10.0.0.1"));
//! assert!(gov.is_allowed("10.0.0.1"));
//! assert!(!gov.is_allowed("10.0.0.1"));
//! assert_eq!(gov.remaining("10.0.0.1"), 0);
//! assert_eq!(gov.remaining("10.0.0.2"), 2);
//! ```

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GovernorError {
    #[error("invalid governor config: {0}")]
    InvalidConfig(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GovernorConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl GovernorConfig {
    pub fn validate(&self) -> Result<(), GovernorError> {
        if self.max_requests == 0 {
            return Err(GovernorError::InvalidConfig("max_requests must be at least 1"));
        }
        if self.window.is_zero() {
            return Err(GovernorError::InvalidConfig("window must be longer than zero"));
        }
        Ok(())
    }
}

/// Shared admission controller. Wrap in an `Arc` to share across handlers.
#[derive(Debug)]
pub struct RateGovernor {
    config: GovernorConfig,
    windows: DashMap<String, VecDeque<Instant>>,
}

impl RateGovernor {
    pub fn new(config: GovernorConfig) -> Result<Self, GovernorError> {
        config.validate()?;
        Ok(Self {
            config,
            windows: DashMap::new(),
        })
    }

    pub fn config(&self) -> GovernorConfig {
        self.config
    }

    pub fn is_allowed(&self, key: &str) -> bool {
        self.is_allowed_at(key, Instant::now())
    }

    pub fn remaining(&self, key: &str) -> u32 {
        self.remaining_at(key, Instant::now())
    }

    pub fn time_until_reset(&self, key: &str) -> Duration {
        self.time_until_reset_at(key, Instant::now())
    }

    /// Admission check observed at `now`.
    ///
    /// The key's entry stays locked from pruning to recording, so two
    /// concurrent callers can never both take the last slot.
    pub fn is_allowed_at(&self, key: &str, now: Instant) -> bool {
        let window = self.config.window;
        let mut stamps = self.windows.entry(key.to_owned()).or_default();
        prune(&mut stamps, now, window);

        if stamps.len() >= self.config.max_requests as usize {
            debug!(
                target: "governor",
                key,
                admitted = stamps.len(),
                "governor.denied"
            );
            return false;
        }
        // Callers may pass an earlier `now`; keep the deque ordered anyway.
        let at = stamps.partition_point(|t| *t <= now);
        stamps.insert(at, now);
        true
    }

    /// Slots left for `key` at `now`. Does not modify state.
    pub fn remaining_at(&self, key: &str, now: Instant) -> u32 {
        let used = self
            .windows
            .get(key)
            .map(|stamps| {
                stamps
                    .iter()
                    .filter(|t| in_window(**t, now, self.config.window))
                    .count()
            })
            .unwrap_or(0);
        self.config
            .max_requests
            .saturating_sub(u32::try_from(used).unwrap_or(u32::MAX))
    }

    /// Time until the oldest admission inside the window expires; zero when
    /// nothing is recorded. Does not modify state.
    pub fn time_until_reset_at(&self, key: &str, now: Instant) -> Duration {
        let window = self.config.window;
        self.windows
            .get(key)
            .and_then(|stamps| stamps.iter().copied().find(|t| in_window(*t, now, window)))
            .map(|oldest| window.saturating_sub(now.saturating_duration_since(oldest)))
            .unwrap_or(Duration::ZERO)
    }

    /// Drop keys with no admissions left inside the window. Returns how many
    /// keys were removed.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    pub fn evict_idle_at(&self, now: Instant) -> usize {
        let window = self.config.window;
        let mut evicted = 0;
        self.windows.retain(|_, stamps| {
            prune(stamps, now, window);
            let keep = !stamps.is_empty();
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    /// Number of keys currently holding state.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Run [`evict_idle`](Self::evict_idle) every `interval` until `cancel` fires.
    pub fn spawn_eviction(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let governor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = governor.evict_idle();
                        if evicted > 0 {
                            debug!(
                                target: "governor",
                                evicted,
                                tracked = governor.tracked_keys(),
                                "governor.evicted"
                            );
                        }
                    }
                }
            }
            info!(target: "governor", "governor.eviction.stopped");
        })
    }
}

fn in_window(t: Instant, now: Instant, window: Duration) -> bool {
    now.saturating_duration_since(t) < window
}

/// Stamps are kept sorted, so expired ones sit at the front.
fn prune(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while stamps.front().is_some_and(|t| !in_window(*t, now, window)) {
        stamps.pop_front();
    }
}
