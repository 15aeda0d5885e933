//! The composed engine.
//!
//! [`MomentumEngine`] owns one of each component and is the only place where
//! they meet:
//!
//! ```text
//! task completed -> MomentumTracker -> XpLedger -> EventBus
//! user action    -> FocusController -> BlockingCoordinator -> EventBus
//! ```
//!
//! All commands except the blocking-related ones are synchronous. The engine
//! is driven by a single owner (see [`crate::runtime::EngineRuntime`]), so a
//! tick that completes a work interval finishes tearing down blocking before
//! any other command can run.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::blocking::{
    BlockSelection, BlockingCoordinator, BlockingProvider, BlockingRequest, BlockingSession,
    EndOutcome, EndReason,
};
use crate::clock::Clock;
use crate::error::BlockingError;
use crate::events::{EngineEvent, EventBus, ScreenPosition};
use crate::focus::{FocusController, FocusSession, FocusState, FocusTransition};
use crate::ledger::{Award, CompletionTally, LedgerSnapshot, XpLedger};
use crate::momentum::{MomentumState, MomentumTracker};
use crate::storage::{BlockingConfig, Config, EngineState};

/// Inbound event from the task-management collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCompleted {
    pub task_id: String,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub momentum: MomentumState,
    pub award: Award,
    pub tally: CompletionTally,
}

/// Blocking to attach to a focus session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockingOptions {
    pub is_deep_focus: bool,
    /// Falls back to the configured default selection.
    pub selection: Option<BlockSelection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusRequest {
    pub task_id: String,
    pub task_title: String,
    pub duration_seconds: u32,
    pub blocking: Option<BlockingOptions>,
}

/// Result of a user-initiated stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped,
    /// There was no session to stop.
    Idle,
    /// Deep Focus blocking is active; the countdown was paused and blocking
    /// kept.
    Locked,
}

/// Everything presentation needs to draw the current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub momentum: MomentumState,
    pub combo_seconds_remaining: Option<i64>,
    pub completions_to_next_tier: Option<u32>,
    pub ledger: LedgerSnapshot,
    pub tasks_completed_today: u32,
    pub tasks_completed_this_week: u32,
    pub level: u64,
    pub level_progress: f64,
    pub focus_state: FocusState,
    pub focus: Option<FocusSession>,
    pub blocking: BlockingSession,
    pub at: DateTime<Utc>,
}

pub struct MomentumEngine {
    clock: Arc<dyn Clock>,
    tracker: MomentumTracker,
    ledger: XpLedger,
    focus: FocusController,
    blocking: BlockingCoordinator,
    blocking_defaults: BlockingConfig,
    bus: EventBus,
}

impl MomentumEngine {
    pub fn new(
        config: &Config,
        clock: Arc<dyn Clock>,
        provider: Arc<dyn BlockingProvider>,
    ) -> Self {
        Self {
            clock,
            tracker: MomentumTracker::with_config(config.momentum.clone()),
            ledger: XpLedger::with_config(config.ledger.clone()),
            focus: FocusController::new(config.focus.clone()),
            blocking: BlockingCoordinator::new(provider),
            blocking_defaults: config.blocking.clone(),
            bus: EventBus::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn ledger(&self) -> &XpLedger {
        &self.ledger
    }

    pub fn focus(&self) -> &FocusController {
        &self.focus
    }

    pub fn blocking(&self) -> &BlockingCoordinator {
        &self.blocking
    }

    /// Momentum as of now. Decay is evaluated lazily here; observers hear
    /// about a combo closing the first time anyone reads it.
    pub fn momentum(&mut self) -> MomentumState {
        let now = self.clock.now();
        let was_active = self.tracker.state().is_active;
        let state = self.tracker.evaluate_decay(now);
        if was_active && !state.is_active {
            self.bus.publish(EngineEvent::MomentumChanged {
                state: state.clone(),
                at: now,
            });
        }
        state
    }

    pub fn combo_time_remaining(&mut self) -> Option<Duration> {
        self.momentum();
        self.tracker.combo_time_remaining(self.clock.now())
    }

    /// Whether a stop control should be offered.
    pub fn can_cancel_session(&self) -> bool {
        self.blocking.can_cancel_session()
    }

    pub fn is_counting_down(&self) -> bool {
        self.focus.is_counting_down()
    }

    pub fn snapshot(&mut self) -> EngineSnapshot {
        let momentum = self.momentum();
        let now = self.clock.now();
        EngineSnapshot {
            combo_seconds_remaining: self
                .tracker
                .combo_time_remaining(now)
                .map(|d| d.num_seconds()),
            completions_to_next_tier: self.tracker.completions_to_next_tier(),
            ledger: self.ledger.snapshot(),
            tasks_completed_today: self.ledger.tasks_completed_today(now),
            tasks_completed_this_week: self.ledger.tasks_completed_this_week(now),
            level: self.ledger.level(),
            level_progress: self.ledger.level_progress(),
            focus_state: self.focus.state(),
            focus: self.focus.session().cloned(),
            blocking: self.blocking.session(),
            momentum,
            at: now,
        }
    }

    /// State a host should persist across restarts.
    pub fn export_state(&self) -> EngineState {
        EngineState {
            momentum: self.tracker.state().clone(),
            ledger: self.ledger.snapshot(),
        }
    }

    pub fn restore(&mut self, state: EngineState) {
        let now = self.clock.now();
        self.tracker.restore(state.momentum, now);
        self.ledger.restore(state.ledger);
    }

    // ── Momentum & XP ────────────────────────────────────────────────

    /// Feed a completion through tracker and ledger, then notify observers.
    ///
    /// `position` is handed back untouched in the celebration event.
    pub fn complete_task(
        &mut self,
        event: TaskCompleted,
        position: Option<ScreenPosition>,
    ) -> CompletionOutcome {
        let at = event.completed_at;
        let momentum = self.tracker.on_task_completed(at);
        let award = self.ledger.award(self.ledger.base_xp(), momentum.multiplier);
        let tally = self.ledger.record_completion(at);

        info!(
            task_id = %event.task_id,
            streak = momentum.streak_count,
            xp = award.display_amount,
            "task completed"
        );

        self.bus.publish(EngineEvent::MomentumChanged {
            state: momentum.clone(),
            at,
        });
        self.bus.publish(EngineEvent::CelebrationTriggered {
            task_id: event.task_id,
            xp_earned: award.display_amount,
            multiplier: momentum.multiplier,
            is_bonus: award.is_bonus,
            position,
            at,
        });
        if tally.daily_goal_reached {
            info!(goal = self.ledger.daily_goal(), "daily goal reached");
            self.bus.publish(EngineEvent::DailyGoalReached {
                completed: tally.today,
                goal: self.ledger.daily_goal(),
                at,
            });
        }
        if tally.weekly_goal_reached {
            info!(goal = self.ledger.weekly_goal(), "weekly goal reached");
            self.bus.publish(EngineEvent::WeeklyGoalReached {
                completed: tally.this_week,
                goal: self.ledger.weekly_goal(),
                at,
            });
        }

        CompletionOutcome {
            momentum,
            award,
            tally,
        }
    }

    pub fn set_daily_goal(&mut self, goal: u32) {
        self.ledger.set_daily_goal(goal);
    }

    pub fn set_weekly_goal(&mut self, goal: u32) {
        self.ledger.set_weekly_goal(goal);
    }

    // ── Focus & blocking ─────────────────────────────────────────────

    /// Start a focus session, acquiring blocking first when requested.
    ///
    /// Returns `Ok(None)` when the session is refused: another task is
    /// running, or this task holds Deep Focus blocking (a restart would reset
    /// the countdown that guards the lock). A blocking failure leaves both the
    /// focus controller and the coordinator untouched.
    pub async fn start_focus(
        &mut self,
        request: FocusRequest,
    ) -> Result<Option<FocusSession>, BlockingError> {
        if request.duration_seconds == 0 || !self.focus.can_start(&request.task_id) {
            return Ok(None);
        }
        // A same-task restart keeps the shield it already holds.
        let already_shielded = self.blocking.active_task_id() == Some(request.task_id.as_str());
        if already_shielded && self.blocking.is_deep_focus() {
            warn!(task_id = %request.task_id, "restart refused: deep focus active");
            return Ok(None);
        }
        let now = self.clock.now();
        let is_deep_focus = if already_shielded {
            self.blocking.is_deep_focus()
        } else {
            request
                .blocking
                .as_ref()
                .is_some_and(|options| options.is_deep_focus)
        };

        if let Some(options) = request.blocking.filter(|_| !already_shielded) {
            let blocking_request = BlockingRequest {
                title: format!("Focus: {}", request.task_title),
                duration_seconds: request.duration_seconds,
                task_id: request.task_id.clone(),
                task_title: request.task_title.clone(),
                is_deep_focus: options.is_deep_focus,
                selection: options
                    .selection
                    .unwrap_or_else(|| self.blocking_defaults.selection.clone()),
            };
            match self.blocking.start_session(blocking_request, now).await {
                Ok(session) => self.bus.publish(EngineEvent::BlockingStateChanged {
                    session,
                    at: now,
                }),
                Err(err) => {
                    self.bus.publish(EngineEvent::BlockingFailed {
                        task_id: Some(request.task_id.clone()),
                        message: err.to_string(),
                        at: now,
                    });
                    return Err(err);
                }
            }
        }

        let transition = self.focus.start_session(
            request.task_id,
            request.task_title,
            request.duration_seconds,
            is_deep_focus,
            now,
        );
        Ok(transition.and_then(|t| self.publish_focus(t, now)))
    }

    /// User-initiated stop.
    ///
    /// Consults the coordinator first. While Deep Focus blocking is active the
    /// stop is refused and the countdown is paused; blocking stays up until
    /// the session is resumed and runs to zero.
    pub async fn stop_focus(&mut self) -> Result<StopOutcome, BlockingError> {
        if self.focus.state() == FocusState::Idle {
            return Ok(StopOutcome::Idle);
        }
        let now = self.clock.now();

        match self.blocking.end_session(EndReason::UserCancel, now).await {
            Ok(EndOutcome::Ended { .. }) => self.publish_blocking(now),
            Ok(EndOutcome::NotActive) => {}
            Err(BlockingError::DeepFocusLocked) => {
                warn!("stop refused: deep focus active");
                if let Some(transition) = self.focus.pause_session() {
                    self.publish_focus(transition, now);
                }
                return Ok(StopOutcome::Locked);
            }
            Err(err) => {
                self.bus.publish(EngineEvent::BlockingFailed {
                    task_id: self.blocking.active_task_id().map(str::to_string),
                    message: err.to_string(),
                    at: now,
                });
                return Err(err);
            }
        }

        if let Some(transition) = self.focus.stop_session() {
            self.publish_focus(transition, now);
        }
        Ok(StopOutcome::Stopped)
    }

    pub fn pause_focus(&mut self) -> Option<FocusSession> {
        let transition = self.focus.pause_session()?;
        self.publish_focus(transition, self.clock.now())
    }

    pub fn resume_focus(&mut self) -> Option<FocusSession> {
        let transition = self.focus.resume_session()?;
        self.publish_focus(transition, self.clock.now())
    }

    pub fn start_break(&mut self) -> Option<FocusSession> {
        let transition = self.focus.start_break()?;
        self.publish_focus(transition, self.clock.now())
    }

    /// Returns true when the session went idle.
    pub fn skip_break(&mut self) -> bool {
        match self.focus.skip_break() {
            Some(transition) => {
                self.publish_focus(transition, self.clock.now());
                true
            }
            None => false,
        }
    }

    pub fn start_next_interval(&mut self) -> Option<FocusSession> {
        let transition = self.focus.start_next_interval()?;
        self.publish_focus(transition, self.clock.now())
    }

    /// One wall-clock second.
    ///
    /// When a work interval reaches zero, blocking is ended as a natural
    /// completion before this returns.
    pub async fn tick(&mut self) -> Option<FocusTransition> {
        let transition = self.focus.tick()?;
        let now = self.clock.now();

        if let FocusTransition::WorkCompleted(session) = &transition {
            self.bus.publish(EngineEvent::FocusCompleted {
                session: FocusSession {
                    state: FocusState::Completed,
                    ..session.clone()
                },
                at: now,
            });
            self.end_blocking_on_completion(now).await;
        }

        self.publish_focus(transition.clone(), now);
        Some(transition)
    }

    /// Reset boundary: tear everything down regardless of Deep Focus.
    pub async fn force_reset(&mut self) {
        let now = self.clock.now();
        if let EndOutcome::Ended { .. } = self.blocking.force_reset(now).await {
            self.publish_blocking(now);
        }
        if let Some(transition) = self.focus.stop_session() {
            self.publish_focus(transition, now);
        }
        self.tracker.reset();
        self.bus.publish(EngineEvent::MomentumChanged {
            state: self.tracker.state().clone(),
            at: now,
        });
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn end_blocking_on_completion(&mut self, now: DateTime<Utc>) {
        match self.blocking.end_session(EndReason::Completed, now).await {
            Ok(EndOutcome::Ended { .. }) => self.publish_blocking(now),
            Ok(EndOutcome::NotActive) => {}
            Err(err) => {
                warn!(error = %err, "failed to end blocking on completion");
                self.bus.publish(EngineEvent::BlockingFailed {
                    task_id: self.blocking.active_task_id().map(str::to_string),
                    message: err.to_string(),
                    at: now,
                });
            }
        }
    }

    fn publish_blocking(&self, now: DateTime<Utc>) {
        self.bus.publish(EngineEvent::BlockingStateChanged {
            session: self.blocking.session(),
            at: now,
        });
    }

    /// Publish a focus transition and return the resulting session.
    fn publish_focus(&self, transition: FocusTransition, now: DateTime<Utc>) -> Option<FocusSession> {
        if let FocusTransition::Ended { task_id, kind } = &transition {
            self.bus.publish(EngineEvent::FocusEnded {
                task_id: task_id.clone(),
                kind: *kind,
                at: now,
            });
        }
        let session = transition.session().cloned();
        self.bus.publish(EngineEvent::FocusSessionChanged {
            session: session.clone(),
            at: now,
        });
        session
    }
}
