//! Completion-driven combo state machine with wall-clock decay.
//!
//! The tracker never reads a clock itself: every operation receives `now`.
//! `evaluate_decay` may be called from any number of call sites (inline with
//! a completion, on a UI read, from a periodic tick) and is idempotent.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tiers::MomentumConfig;

/// Maximum gap between completions before the combo closes.
pub const DECAY_INTERVAL_MINUTES: i64 = 30;

/// Snapshot of the combo streak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumState {
    pub is_active: bool,
    pub streak_count: u32,
    pub multiplier: f64,
    /// Presentation hint in `[0, 1]`.
    pub flame_intensity: f64,
    pub last_completion_time: Option<DateTime<Utc>>,
}

impl Default for MomentumState {
    fn default() -> Self {
        Self {
            is_active: false,
            streak_count: 0,
            multiplier: 1.0,
            flame_intensity: 0.0,
            last_completion_time: None,
        }
    }
}

/// Owns the [`MomentumState`]; the only component allowed to mutate it.
#[derive(Debug, Clone)]
pub struct MomentumTracker {
    config: MomentumConfig,
    state: MomentumState,
}

impl MomentumTracker {
    pub fn new() -> Self {
        Self::with_config(MomentumConfig::default())
    }

    pub fn with_config(config: MomentumConfig) -> Self {
        Self {
            config,
            state: MomentumState::default(),
        }
    }

    pub fn decay_interval() -> Duration {
        Duration::minutes(DECAY_INTERVAL_MINUTES)
    }

    pub fn config(&self) -> &MomentumConfig {
        &self.config
    }

    /// Current state as last evaluated. Call [`evaluate_decay`](Self::evaluate_decay)
    /// first when the answer must reflect the present instant.
    pub fn state(&self) -> &MomentumState {
        &self.state
    }

    /// Record a task completion at `now`.
    ///
    /// Extends the streak when the previous completion is still inside the
    /// decay window; otherwise starts a new streak at 1.
    pub fn on_task_completed(&mut self, now: DateTime<Utc>) -> MomentumState {
        let continues = self.within_window(now);
        self.state.streak_count = if continues {
            self.state.streak_count.saturating_add(1)
        } else {
            1
        };
        // An out-of-order completion must not pull the window start backwards.
        let latest = self.state.last_completion_time.map_or(now, |last| last.max(now));
        self.state.last_completion_time = Some(latest);
        self.state.is_active = true;
        self.state.multiplier = self.config.multiplier_for(self.state.streak_count);
        self.state.flame_intensity = self.config.flame_intensity(self.state.streak_count);

        debug!(
            streak = self.state.streak_count,
            multiplier = self.state.multiplier,
            continued = continues,
            "task completion recorded"
        );
        self.state.clone()
    }

    /// Close the combo if the decay interval has elapsed.
    ///
    /// Streak and multiplier are kept for display; the next completion
    /// resets them.
    pub fn evaluate_decay(&mut self, now: DateTime<Utc>) -> MomentumState {
        let active = self.within_window(now);
        if self.state.is_active && !active {
            debug!(streak = self.state.streak_count, "combo decayed");
        }
        self.state.is_active = active;
        self.state.clone()
    }

    /// Time left before the combo closes, or `None` when it is not active.
    pub fn combo_time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if !self.state.is_active {
            return None;
        }
        let last = self.state.last_completion_time?;
        let remaining = Self::decay_interval() - (now - last);
        (remaining > Duration::zero()).then_some(remaining)
    }

    /// Completions still needed to reach the next multiplier tier.
    pub fn completions_to_next_tier(&self) -> Option<u32> {
        self.config
            .next_tier(self.state.streak_count)
            .map(|tier| tier.min_streak - self.state.streak_count)
    }

    /// Replace the state with one persisted by a collaborator.
    ///
    /// Derived fields are recomputed from the streak so a stale or hand-edited
    /// snapshot cannot break the multiplier invariants.
    pub fn restore(&mut self, state: MomentumState, now: DateTime<Utc>) {
        self.state = MomentumState {
            multiplier: self.config.multiplier_for(state.streak_count),
            flame_intensity: self.config.flame_intensity(state.streak_count),
            ..state
        };
        self.evaluate_decay(now);
    }

    /// Back to an empty, inactive combo.
    pub fn reset(&mut self) {
        self.state = MomentumState::default();
    }

    fn within_window(&self, now: DateTime<Utc>) -> bool {
        match self.state.last_completion_time {
            Some(last) => now - last < Self::decay_interval(),
            None => false,
        }
    }
}

impl Default for MomentumTracker {
    fn default() -> Self {
        Self::new()
    }
}
