//! Focus session state machine.
//!
//! Every command returns `Some(transition)` when it changed something and
//! `None` when it was issued from a state where it does not apply. Callers
//! treat `None` as a silent no-op; UI races must never crash the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::session::{FocusConfig, FocusSession, FocusState, SessionPhase};

/// Why a session went back to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndKind {
    Stopped,
    BreakSkipped,
    BreakFinished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FocusTransition {
    Started(FocusSession),
    Paused(FocusSession),
    Resumed(FocusSession),
    /// A countdown moved by one second without changing state.
    Ticked(FocusSession),
    /// The work interval reached zero. The session is now in `BreakTime`.
    WorkCompleted(FocusSession),
    BreakStarted(FocusSession),
    /// A new work interval began from `BreakTime`.
    IntervalStarted(FocusSession),
    /// The session was destroyed.
    Ended { task_id: String, kind: EndKind },
}

impl FocusTransition {
    /// The session after the transition, if one still exists.
    pub fn session(&self) -> Option<&FocusSession> {
        match self {
            FocusTransition::Started(s)
            | FocusTransition::Paused(s)
            | FocusTransition::Resumed(s)
            | FocusTransition::Ticked(s)
            | FocusTransition::WorkCompleted(s)
            | FocusTransition::BreakStarted(s)
            | FocusTransition::IntervalStarted(s) => Some(s),
            FocusTransition::Ended { .. } => None,
        }
    }
}

/// Exclusive owner of the single [`FocusSession`].
#[derive(Debug, Clone, Default)]
pub struct FocusController {
    config: FocusConfig,
    session: Option<FocusSession>,
}

impl FocusController {
    pub fn new(config: FocusConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &FocusConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&FocusSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> FocusState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(FocusState::Idle)
    }

    /// Whether `start_session` for `task_id` would be accepted.
    pub fn can_start(&self, task_id: &str) -> bool {
        match &self.session {
            Some(s) if matches!(s.state, FocusState::Running | FocusState::Paused) => {
                s.task_id == task_id
            }
            _ => true,
        }
    }

    pub fn is_counting_down(&self) -> bool {
        self.session.as_ref().is_some_and(FocusSession::is_counting_down)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh work interval.
    ///
    /// Refused while another task's session is running or paused. A session
    /// for the same task, or one sitting in `BreakTime`, is replaced.
    pub fn start_session(
        &mut self,
        task_id: impl Into<String>,
        task_title: impl Into<String>,
        duration_seconds: u32,
        is_deep_focus: bool,
        now: DateTime<Utc>,
    ) -> Option<FocusTransition> {
        let task_id = task_id.into();
        if duration_seconds == 0 || !self.can_start(&task_id) {
            debug!(%task_id, "focus start ignored");
            return None;
        }
        let session = FocusSession::new(
            task_id,
            task_title.into(),
            duration_seconds,
            is_deep_focus,
            now,
        );
        info!(
            task_id = %session.task_id,
            duration_seconds,
            is_deep_focus,
            "focus session started"
        );
        self.session = Some(session.clone());
        Some(FocusTransition::Started(session))
    }

    pub fn pause_session(&mut self) -> Option<FocusTransition> {
        let session = self.session.as_mut()?;
        if session.state != FocusState::Running {
            return None;
        }
        session.state = FocusState::Paused;
        Some(FocusTransition::Paused(session.clone()))
    }

    pub fn resume_session(&mut self) -> Option<FocusTransition> {
        let session = self.session.as_mut()?;
        if session.state != FocusState::Paused {
            return None;
        }
        session.state = FocusState::Running;
        Some(FocusTransition::Resumed(session.clone()))
    }

    /// Drop the session from any non-idle state. Blocking teardown is the
    /// caller's job.
    pub fn stop_session(&mut self) -> Option<FocusTransition> {
        let session = self.session.take()?;
        info!(task_id = %session.task_id, "focus session stopped");
        Some(FocusTransition::Ended {
            task_id: session.task_id,
            kind: EndKind::Stopped,
        })
    }

    /// Advance the live countdown by one second.
    pub fn tick(&mut self) -> Option<FocusTransition> {
        let session = self.session.as_mut()?;
        if !session.is_counting_down() {
            return None;
        }
        session.remaining_seconds = session.remaining_seconds.saturating_sub(1);
        if session.remaining_seconds > 0 {
            return Some(FocusTransition::Ticked(session.clone()));
        }

        let phase = session.phase;
        match phase {
            SessionPhase::Work => {
                session.state = FocusState::BreakTime;
                session.sessions_completed = session.sessions_completed.saturating_add(1);
                info!(
                    task_id = %session.task_id,
                    sessions_completed = session.sessions_completed,
                    "work interval completed"
                );
                Some(FocusTransition::WorkCompleted(session.clone()))
            }
            SessionPhase::Break => self.finish_break(),
        }
    }

    /// Start the break countdown after a completed work interval.
    pub fn start_break(&mut self) -> Option<FocusTransition> {
        let config = &self.config;
        let session = self.session.as_mut()?;
        if !session.is_awaiting_break() {
            return None;
        }
        let seconds = config.break_seconds(session.sessions_completed);
        session.phase = SessionPhase::Break;
        session.total_duration = seconds;
        session.remaining_seconds = seconds;
        debug!(task_id = %session.task_id, seconds, "break started");
        Some(FocusTransition::BreakStarted(session.clone()))
    }

    /// Leave `BreakTime` without a break.
    pub fn skip_break(&mut self) -> Option<FocusTransition> {
        if self.state() != FocusState::BreakTime {
            return None;
        }
        let session = self.session.take()?;
        Some(FocusTransition::Ended {
            task_id: session.task_id,
            kind: EndKind::BreakSkipped,
        })
    }

    /// Begin another work interval for the same task from `BreakTime`.
    pub fn start_next_interval(&mut self) -> Option<FocusTransition> {
        let seconds = self.config.work_seconds();
        let session = self.session.as_mut()?;
        if session.state != FocusState::BreakTime {
            return None;
        }
        session.state = FocusState::Running;
        session.phase = SessionPhase::Work;
        session.total_duration = seconds;
        session.remaining_seconds = seconds;
        Some(FocusTransition::IntervalStarted(session.clone()))
    }

    fn finish_break(&mut self) -> Option<FocusTransition> {
        if self.config.auto_continue_after_break {
            return self.start_next_interval();
        }
        let session = self.session.take()?;
        debug!(task_id = %session.task_id, "break finished");
        Some(FocusTransition::Ended {
            task_id: session.task_id,
            kind: EndKind::BreakFinished,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 2, 10, 0, 0).unwrap()
    }

    fn short_config() -> FocusConfig {
        FocusConfig {
            work_minutes: 1,
            short_break_minutes: 1,
            long_break_minutes: 2,
            sessions_before_long_break: 2,
            auto_continue_after_break: false,
        }
    }

    fn run_to_zero(controller: &mut FocusController) -> Option<FocusTransition> {
        let mut last = None;
        while controller.is_counting_down() {
            last = controller.tick();
        }
        last
    }

    #[test]
    fn start_pause_resume() {
        let mut controller = FocusController::default();
        assert_eq!(controller.state(), FocusState::Idle);

        assert!(controller.start_session("a", "Alpha", 60, false, now()).is_some());
        assert_eq!(controller.state(), FocusState::Running);

        assert!(controller.pause_session().is_some());
        assert_eq!(controller.state(), FocusState::Paused);
        assert!(controller.pause_session().is_none());

        assert!(controller.resume_session().is_some());
        assert_eq!(controller.state(), FocusState::Running);
        assert!(controller.resume_session().is_none());
    }

    #[test]
    fn usage_errors_are_no_ops() {
        let mut controller = FocusController::default();
        assert!(controller.pause_session().is_none());
        assert!(controller.resume_session().is_none());
        assert!(controller.stop_session().is_none());
        assert!(controller.start_break().is_none());
        assert!(controller.skip_break().is_none());
        assert!(controller.tick().is_none());
        assert_eq!(controller.state(), FocusState::Idle);
    }

    #[test]
    fn second_task_rejected_while_running_or_paused() {
        let mut controller = FocusController::default();
        controller.start_session("a", "Alpha", 60, false, now());
        assert!(controller.start_session("b", "Beta", 60, false, now()).is_none());
        assert_eq!(controller.session().map(|s| s.task_id.as_str()), Some("a"));

        controller.pause_session();
        assert!(controller.start_session("b", "Beta", 60, false, now()).is_none());
    }

    #[test]
    fn same_task_restarts_fresh() {
        let mut controller = FocusController::default();
        controller.start_session("a", "Alpha", 60, false, now());
        controller.tick();
        controller.tick();
        let restarted = controller.start_session("a", "Alpha", 90, false, now());
        let session = restarted.as_ref().and_then(FocusTransition::session).unwrap();
        assert_eq!(session.remaining_seconds, 90);
    }

    #[test]
    fn zero_duration_is_ignored() {
        let mut controller = FocusController::default();
        assert!(controller.start_session("a", "Alpha", 0, false, now()).is_none());
    }

    #[test]
    fn paused_session_does_not_tick() {
        let mut controller = FocusController::default();
        controller.start_session("a", "Alpha", 10, false, now());
        controller.pause_session();
        assert!(controller.tick().is_none());
        assert_eq!(controller.session().unwrap().remaining_seconds, 10);
    }

    #[test]
    fn last_tick_enters_break_time_once() {
        let mut controller = FocusController::default();
        controller.start_session("a", "Alpha", 2, false, now());
        assert!(matches!(controller.tick(), Some(FocusTransition::Ticked(_))));
        let done = controller.tick();
        assert!(matches!(done, Some(FocusTransition::WorkCompleted(_))));

        let session = controller.session().unwrap();
        assert_eq!(session.state, FocusState::BreakTime);
        assert_eq!(session.remaining_seconds, 0);
        assert_eq!(session.sessions_completed, 1);

        // Awaiting a decision: further ticks change nothing.
        assert!(controller.tick().is_none());
        assert_eq!(controller.session().unwrap().sessions_completed, 1);
    }

    #[test]
    fn other_task_may_start_during_break_time() {
        let mut controller = FocusController::default();
        controller.start_session("a", "Alpha", 1, false, now());
        controller.tick();
        assert!(controller.start_session("b", "Beta", 60, false, now()).is_some());
        assert_eq!(controller.session().unwrap().sessions_completed, 0);
    }

    #[test]
    fn break_countdown_returns_to_idle() {
        let mut controller = FocusController::new(short_config());
        controller.start_session("a", "Alpha", 3, false, now());
        run_to_zero(&mut controller);

        let started = controller.start_break();
        let session = started.as_ref().and_then(FocusTransition::session).unwrap();
        assert_eq!(session.phase, SessionPhase::Break);
        assert_eq!(session.remaining_seconds, 60);
        assert!(controller.start_break().is_none());

        let last = run_to_zero(&mut controller);
        assert_eq!(
            last,
            Some(FocusTransition::Ended {
                task_id: "a".into(),
                kind: EndKind::BreakFinished
            })
        );
        assert_eq!(controller.state(), FocusState::Idle);
    }

    #[test]
    fn break_auto_continues_into_next_interval() {
        let mut controller = FocusController::new(FocusConfig {
            auto_continue_after_break: true,
            ..short_config()
        });
        controller.start_session("a", "Alpha", 3, false, now());
        run_to_zero(&mut controller);
        controller.start_break();
        for _ in 0..59 {
            controller.tick();
        }
        let next = controller.tick();
        assert!(matches!(next, Some(FocusTransition::IntervalStarted(_))));
        let session = controller.session().unwrap();
        assert_eq!(session.state, FocusState::Running);
        assert_eq!(session.remaining_seconds, 60);
        assert_eq!(session.sessions_completed, 1);
    }

    #[test]
    fn second_completed_interval_earns_long_break() {
        let mut controller = FocusController::new(short_config());
        controller.start_session("a", "Alpha", 1, false, now());
        controller.tick();
        controller.start_next_interval();
        run_to_zero(&mut controller);
        assert_eq!(controller.session().unwrap().sessions_completed, 2);

        controller.start_break();
        assert_eq!(controller.session().unwrap().remaining_seconds, 120);
    }

    #[test]
    fn skip_break_goes_idle() {
        let mut controller = FocusController::default();
        controller.start_session("a", "Alpha", 1, false, now());
        controller.tick();
        assert!(matches!(
            controller.skip_break(),
            Some(FocusTransition::Ended {
                kind: EndKind::BreakSkipped,
                ..
            })
        ));
        assert!(controller.session().is_none());
    }

    #[test]
    fn stop_from_every_live_state() {
        let mut controller = FocusController::default();
        controller.start_session("a", "Alpha", 5, false, now());
        assert!(controller.stop_session().is_some());

        controller.start_session("a", "Alpha", 5, false, now());
        controller.pause_session();
        assert!(controller.stop_session().is_some());

        controller.start_session("a", "Alpha", 1, false, now());
        controller.tick();
        assert!(controller.stop_session().is_some());
        assert_eq!(controller.state(), FocusState::Idle);
        assert!(controller.tick().is_none());
    }
}
