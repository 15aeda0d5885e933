//! XP ledger: point awards, daily/weekly goal counters and the day streak.
//!
//! Day boundaries are calendar dates in the configured UTC offset, not rolling
//! 24-hour windows. The ledger reports when a goal is hit but never publishes
//! anything itself; the engine turns the flags into events.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Points needed per level.
pub const XP_PER_LEVEL: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_daily_goal")]
    pub daily_goal: u32,
    #[serde(default = "default_weekly_goal")]
    pub weekly_goal: u32,
    /// Base XP for one task completion before the combo multiplier.
    #[serde(default = "default_base_xp")]
    pub base_xp: u32,
    /// Offset used to decide which calendar day a completion belongs to.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

fn default_daily_goal() -> u32 {
    5
}
fn default_weekly_goal() -> u32 {
    25
}
fn default_base_xp() -> u32 {
    10
}
fn default_utc_offset_minutes() -> i32 {
    chrono::Local::now().offset().local_minus_utc() / 60
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            daily_goal: default_daily_goal(),
            weekly_goal: default_weekly_goal(),
            base_xp: default_base_xp(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.offset().is_none() {
            return Err(ConfigError::InvalidValue {
                key: "ledger.utc_offset_minutes".into(),
                message: format!("{} is not a valid UTC offset", self.utc_offset_minutes),
            });
        }
        Ok(())
    }

    fn offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }
}

/// Result of [`XpLedger::award`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub display_amount: u32,
    pub is_bonus: bool,
}

/// Counters after a completion has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionTally {
    pub today: u32,
    pub this_week: u32,
    /// True only on the completion that makes `today == daily_goal`.
    pub daily_goal_reached: bool,
    /// True only on the completion that makes `this_week == weekly_goal`.
    pub weekly_goal_reached: bool,
}

/// Everything a collaborator needs to persist the ledger across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub total_points: u64,
    pub tasks_completed_today: u32,
    pub tasks_completed_this_week: u32,
    pub last_active_day: Option<NaiveDate>,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// `None` keeps the configured goal on restore.
    #[serde(default)]
    pub daily_goal: Option<u32>,
    #[serde(default)]
    pub weekly_goal: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct XpLedger {
    config: LedgerConfig,
    offset: FixedOffset,
    total_points: u64,
    tasks_completed_today: u32,
    tasks_completed_this_week: u32,
    last_active_day: Option<NaiveDate>,
    current_streak: u32,
    longest_streak: u32,
}

impl XpLedger {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    /// Build a ledger. An out-of-range offset falls back to UTC.
    pub fn with_config(config: LedgerConfig) -> Self {
        let offset = config.offset().unwrap_or_else(|| Utc.fix());
        Self {
            config,
            offset,
            total_points: 0,
            tasks_completed_today: 0,
            tasks_completed_this_week: 0,
            last_active_day: None,
            current_streak: 0,
            longest_streak: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    pub fn base_xp(&self) -> u32 {
        self.config.base_xp
    }

    pub fn daily_goal(&self) -> u32 {
        self.config.daily_goal
    }

    pub fn weekly_goal(&self) -> u32 {
        self.config.weekly_goal
    }

    /// Consecutive calendar days with at least one completion.
    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    /// Completions on the calendar day containing `now`.
    pub fn tasks_completed_today(&self, now: DateTime<Utc>) -> u32 {
        if self.last_active_day == Some(self.day_of(now)) {
            self.tasks_completed_today
        } else {
            0
        }
    }

    /// Completions in the ISO week containing `now`.
    pub fn tasks_completed_this_week(&self, now: DateTime<Utc>) -> u32 {
        match self.last_active_day {
            Some(last) if same_week(last, self.day_of(now)) => self.tasks_completed_this_week,
            _ => 0,
        }
    }

    pub fn level(&self) -> u64 {
        self.total_points / XP_PER_LEVEL + 1
    }

    /// Fraction of the way to the next level, in `[0, 1)`.
    pub fn level_progress(&self) -> f64 {
        (self.total_points % XP_PER_LEVEL) as f64 / XP_PER_LEVEL as f64
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply the combo multiplier to `base_amount` and bank the result.
    pub fn award(&mut self, base_amount: u32, multiplier: f64) -> Award {
        let multiplier = if multiplier.is_finite() {
            multiplier.max(1.0)
        } else {
            1.0
        };
        let scaled = (f64::from(base_amount) * multiplier).round();
        let display_amount = if scaled >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            scaled as u32
        };
        self.total_points = self.total_points.saturating_add(u64::from(display_amount));
        Award {
            display_amount,
            is_bonus: display_amount > base_amount,
        }
    }

    /// Count a completion against the day and week it falls in.
    ///
    /// A completion dated before the last active day is counted into the
    /// current counters rather than reopening a past day.
    pub fn record_completion(&mut self, now: DateTime<Utc>) -> CompletionTally {
        let day = self.day_of(now);
        match self.last_active_day {
            Some(last) if day <= last => {}
            previous => self.roll_over(previous, day),
        }

        self.tasks_completed_today = self.tasks_completed_today.saturating_add(1);
        self.tasks_completed_this_week = self.tasks_completed_this_week.saturating_add(1);

        let tally = CompletionTally {
            today: self.tasks_completed_today,
            this_week: self.tasks_completed_this_week,
            daily_goal_reached: self.tasks_completed_today == self.config.daily_goal,
            weekly_goal_reached: self.tasks_completed_this_week == self.config.weekly_goal,
        };
        debug!(
            today = tally.today,
            this_week = tally.this_week,
            day_streak = self.current_streak,
            "completion counted"
        );
        tally
    }

    pub fn set_daily_goal(&mut self, goal: u32) {
        self.config.daily_goal = goal;
    }

    pub fn set_weekly_goal(&mut self, goal: u32) {
        self.config.weekly_goal = goal;
    }

    pub fn set_total_points(&mut self, points: u64) {
        self.total_points = points;
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            total_points: self.total_points,
            tasks_completed_today: self.tasks_completed_today,
            tasks_completed_this_week: self.tasks_completed_this_week,
            last_active_day: self.last_active_day,
            current_streak: self.current_streak,
            longest_streak: self.longest_streak,
            daily_goal: Some(self.config.daily_goal),
            weekly_goal: Some(self.config.weekly_goal),
        }
    }

    pub fn restore(&mut self, snapshot: LedgerSnapshot) {
        self.total_points = snapshot.total_points;
        self.tasks_completed_today = snapshot.tasks_completed_today;
        self.tasks_completed_this_week = snapshot.tasks_completed_this_week;
        self.last_active_day = snapshot.last_active_day;
        self.current_streak = snapshot.current_streak;
        self.longest_streak = snapshot.longest_streak.max(snapshot.current_streak);
        if let Some(goal) = snapshot.daily_goal {
            self.config.daily_goal = goal;
        }
        if let Some(goal) = snapshot.weekly_goal {
            self.config.weekly_goal = goal;
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn roll_over(&mut self, previous: Option<NaiveDate>, day: NaiveDate) {
        let consecutive = previous.and_then(|last| last.succ_opt()) == Some(day);
        self.current_streak = if consecutive {
            self.current_streak.saturating_add(1)
        } else {
            1
        };
        self.longest_streak = self.longest_streak.max(self.current_streak);

        self.tasks_completed_today = 0;
        if !previous.is_some_and(|last| same_week(last, day)) {
            self.tasks_completed_this_week = 0;
        }
        self.last_active_day = Some(day);
    }

    fn day_of(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }
}

impl Default for XpLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn same_week(a: NaiveDate, b: NaiveDate) -> bool {
    a.iso_week() == b.iso_week()
}
