//! Typed notifications for presentation.
//!
//! Every state change the engine makes is published as an [`EngineEvent`] on
//! the [`EventBus`]. Presentation subscribes and renders; it never reaches into
//! the engine's components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::blocking::BlockingSession;
use crate::focus::{EndKind, FocusSession};
use crate::momentum::MomentumState;

/// Capacity of the broadcast channel. A subscriber that falls further
/// behind receives `RecvError::Lagged` and skips to the newest event.
pub const EVENT_CAPACITY: usize = 256;

/// Where the reward animation should appear. Passed through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    MomentumChanged {
        state: MomentumState,
        at: DateTime<Utc>,
    },
    CelebrationTriggered {
        task_id: String,
        xp_earned: u32,
        multiplier: f64,
        is_bonus: bool,
        position: Option<ScreenPosition>,
        at: DateTime<Utc>,
    },
    DailyGoalReached {
        completed: u32,
        goal: u32,
        at: DateTime<Utc>,
    },
    WeeklyGoalReached {
        completed: u32,
        goal: u32,
        at: DateTime<Utc>,
    },
    /// The focus session changed. `None` means it went back to idle.
    FocusSessionChanged {
        session: Option<FocusSession>,
        at: DateTime<Utc>,
    },
    /// A work interval reached zero.
    FocusCompleted {
        session: FocusSession,
        at: DateTime<Utc>,
    },
    FocusEnded {
        task_id: String,
        kind: EndKind,
        at: DateTime<Utc>,
    },
    BlockingStateChanged {
        session: BlockingSession,
        at: DateTime<Utc>,
    },
    /// Starting or ending the shield failed; shown once.
    BlockingFailed {
        task_id: Option<String>,
        message: String,
        at: DateTime<Utc>,
    },
}

/// Fan-out channel for [`EngineEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Publish to every current subscriber. Having none is fine.
    pub fn publish(&self, event: EngineEvent) {
        if let Err(broadcast::error::SendError(event)) = self.tx.send(event) {
            trace!(?event, "event dropped: no subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
