use serde_json::{Map, Value};

use crate::{
    error::StoreError,
    management::{KeyValueStore, store::KEY_TIMER_STATE},
    types::{TimerSnapshot, TimerState},
};

pub const DEFAULT_MINUTES: u64 = 25;
pub const MAX_MINUTES: u64 = 24 * 60;

/// Pomodoro countdown in whole seconds.
///
/// Ticking is driven from outside (once per second); this type only does the
/// bookkeeping. Reaching zero stops the timer and resets it to its duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTimer {
    duration: u64,
    remaining: u64,
    running: bool,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self {
            duration: DEFAULT_MINUTES * 60,
            remaining: DEFAULT_MINUTES * 60,
            running: false,
        }
    }
}

impl FocusTimer {
    pub fn from_snapshot(snapshot: TimerSnapshot) -> Self {
        Self {
            duration: snapshot.duration,
            remaining: snapshot.remaining.min(snapshot.duration),
            running: snapshot.running && snapshot.remaining > 0,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            running: self.running,
            duration: self.duration,
            remaining: self.remaining,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts a fresh countdown; zero minutes means the default length and
    /// anything above [`MAX_MINUTES`] is capped.
    pub fn start(&mut self, minutes: u64) {
        let minutes = if minutes == 0 { DEFAULT_MINUTES } else { minutes };
        self.duration = minutes.min(MAX_MINUTES) * 60;
        self.remaining = self.duration;
        self.running = true;
    }

    /// Returns whether the timer was running.
    pub fn pause(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        was_running
    }

    /// Returns whether the timer started running again.
    pub fn resume(&mut self) -> bool {
        if self.running || self.remaining == 0 {
            return false;
        }
        self.running = true;
        true
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.remaining = self.duration;
    }

    /// Counts down one second. Returns `true` when this tick finished the session.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.stop();
            return true;
        }
        false
    }

    pub fn state(&self) -> TimerState {
        let progress = if self.duration == 0 {
            0.0
        } else {
            (self.duration - self.remaining) as f64 / self.duration as f64 * 100.0
        };

        TimerState {
            minutes: self.remaining / 60,
            seconds: self.remaining % 60,
            progress,
            running: self.running,
            remaining: self.remaining,
            duration: self.duration,
        }
    }
}

/// Reads the persisted timer; missing or unreadable snapshots yield the default.
pub async fn load(store: &dyn KeyValueStore) -> Result<FocusTimer, StoreError> {
    let stored = store.get(&[KEY_TIMER_STATE]).await?;
    Ok(stored
        .get(KEY_TIMER_STATE)
        .cloned()
        .and_then(|v| serde_json::from_value::<TimerSnapshot>(v).ok())
        .map(FocusTimer::from_snapshot)
        .unwrap_or_default())
}

pub async fn save(store: &dyn KeyValueStore, timer: &FocusTimer) -> Result<(), StoreError> {
    let mut item = Map::new();
    item.insert(
        KEY_TIMER_STATE.to_string(),
        serde_json::to_value(timer.snapshot())?,
    );
    store.set(item).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_a_stopped_pomodoro() {
        let timer = FocusTimer::default();
        assert!(!timer.is_running());
        assert_eq!(timer.state().remaining, 25 * 60);
        assert_eq!(timer.state().progress, 0.0);
    }

    #[test]
    fn from_snapshot_clamps_remaining() {
        let timer = FocusTimer::from_snapshot(TimerSnapshot {
            running: true,
            duration: 60,
            remaining: 600,
        });
        assert_eq!(timer.state().remaining, 60);

        let finished = FocusTimer::from_snapshot(TimerSnapshot {
            running: true,
            duration: 60,
            remaining: 0,
        });
        assert!(!finished.is_running());
    }
}
