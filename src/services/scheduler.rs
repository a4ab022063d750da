//! Named recurring timers
//!
//! A timer name is either absent or bound to exactly one running interval.
//! Scheduling under a name that is taken cancels the previous timer and
//! installs the new one while holding the table lock, so no caller can
//! observe two timers under one name.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Longest period a timer runs at; longer intervals are clamped
pub const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Timer callback
pub type TimerAction = Arc<dyn Fn() + Send + Sync>;

/// Identifies one scheduled timer instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimerToken {
    name: String,
    id: u64,
}

impl TimerToken {
    pub fn name(&self) -> &str {
        &self.name
    }
}

struct TimerEntry {
    id: u64,
    interval: Duration,
    handle: JoinHandle<()>,
}

/// Owner of every named timer of the service layer
#[derive(Default)]
pub struct Scheduler {
    timers: Mutex<HashMap<String, TimerEntry>>,
    next_id: AtomicU64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` every `interval` under `name`, replacing any timer there
    pub fn schedule(&self, name: &str, interval: Duration, action: TimerAction) -> TimerToken {
        let mut timers = self.timers.lock();
        if let Some(previous) = timers.remove(name) {
            debug!("Replacing timer {}", name);
            previous.handle.abort();
        }
        self.install(&mut timers, name, interval, action)
    }

    /// Like [`schedule`](Self::schedule) but keeps an existing timer
    pub fn schedule_if_absent(
        &self,
        name: &str,
        interval: Duration,
        action: TimerAction,
    ) -> TimerToken {
        let mut timers = self.timers.lock();
        if let Some(existing) = timers.get(name) {
            return TimerToken {
                name: name.to_string(),
                id: existing.id,
            };
        }
        self.install(&mut timers, name, interval, action)
    }

    fn install(
        &self,
        timers: &mut HashMap<String, TimerEntry>,
        name: &str,
        interval: Duration,
        action: TimerAction,
    ) -> TimerToken {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let period = interval.clamp(Duration::from_millis(1), MAX_PERIOD);
        info!("Scheduling timer {} every {:?}", name, period);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                action();
            }
        });

        timers.insert(
            name.to_string(),
            TimerEntry {
                id,
                interval: period,
                handle,
            },
        );
        TimerToken {
            name: name.to_string(),
            id,
        }
    }

    /// Cancel the timer under `name`
    pub fn cancel(&self, name: &str) -> bool {
        match self.timers.lock().remove(name) {
            Some(entry) => {
                entry.handle.abort();
                debug!("Cancelled timer {}", name);
                true
            }
            None => false,
        }
    }

    /// Cancel the timer only if `token` is still the one installed
    pub fn cancel_token(&self, token: &TimerToken) -> bool {
        let mut timers = self.timers.lock();
        match timers.get(&token.name) {
            Some(entry) if entry.id == token.id => {
                if let Some(entry) = timers.remove(&token.name) {
                    entry.handle.abort();
                }
                true
            }
            _ => false,
        }
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.timers.lock().contains_key(name)
    }

    pub fn interval_of(&self, name: &str) -> Option<Duration> {
        self.timers.lock().get(name).map(|entry| entry.interval)
    }

    pub fn active_count(&self) -> usize {
        self.timers.lock().len()
    }

    pub fn cancel_all(&self) {
        for (_, entry) in self.timers.lock().drain() {
            entry.handle.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
