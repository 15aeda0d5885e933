use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusState {
    /// No session.
    Idle,
    Running,
    Paused,
    /// Work interval finished; either waiting for a decision or counting
    /// down a break.
    BreakTime,
    /// Transient: reported once when a work interval reaches zero, never
    /// stored on a live session.
    Completed,
}

/// Which countdown the session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Work,
    Break,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    pub task_id: String,
    pub task_title: String,
    pub state: FocusState,
    pub phase: SessionPhase,
    /// Length of the current countdown in seconds.
    pub total_duration: u32,
    pub remaining_seconds: u32,
    /// Work intervals completed within this run.
    pub sessions_completed: u32,
    pub is_deep_focus: bool,
    pub started_at: DateTime<Utc>,
}

impl FocusSession {
    pub(crate) fn new(
        task_id: String,
        task_title: String,
        duration_seconds: u32,
        is_deep_focus: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            task_title,
            state: FocusState::Running,
            phase: SessionPhase::Work,
            total_duration: duration_seconds,
            remaining_seconds: duration_seconds,
            sessions_completed: 0,
            is_deep_focus,
            started_at,
        }
    }

    /// 0.0 .. 1.0 progress through the current countdown.
    pub fn progress(&self) -> f64 {
        if self.total_duration == 0 {
            return 0.0;
        }
        1.0 - f64::from(self.remaining_seconds) / f64::from(self.total_duration)
    }

    /// True while a countdown should be ticked.
    pub fn is_counting_down(&self) -> bool {
        match self.state {
            FocusState::Running => true,
            FocusState::BreakTime => self.phase == SessionPhase::Break,
            _ => false,
        }
    }

    /// True once a work interval has ended and no break countdown is running.
    pub fn is_awaiting_break(&self) -> bool {
        self.state == FocusState::BreakTime && self.phase == SessionPhase::Work
    }
}

/// Interval lengths for the focus timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break")]
    pub long_break_minutes: u32,
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
    /// Start the next work interval when a break runs out instead of going idle.
    #[serde(default)]
    pub auto_continue_after_break: bool,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_sessions_before_long_break() -> u32 {
    4
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break(),
            long_break_minutes: default_long_break(),
            sessions_before_long_break: default_sessions_before_long_break(),
            auto_continue_after_break: false,
        }
    }
}

impl FocusConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("focus.work_minutes", self.work_minutes),
            ("focus.short_break_minutes", self.short_break_minutes),
            ("focus.long_break_minutes", self.long_break_minutes),
            ("focus.sessions_before_long_break", self.sessions_before_long_break),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }

    pub fn work_seconds(&self) -> u32 {
        self.work_minutes.saturating_mul(60)
    }

    /// Break length after `sessions_completed` work intervals.
    pub fn break_seconds(&self, sessions_completed: u32) -> u32 {
        let every = self.sessions_before_long_break.max(1);
        let minutes = if sessions_completed > 0 && sessions_completed % every == 0 {
            self.long_break_minutes
        } else {
            self.short_break_minutes
        };
        minutes.saturating_mul(60)
    }
}
