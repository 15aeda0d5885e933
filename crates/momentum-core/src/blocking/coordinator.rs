//! Owner of the single blocking session.
//!
//! `start_session` and `end_session` are the only suspending operations in
//! the engine. Neither changes local state unless the provider confirmed
//! the change, with one exception: a natural completion always clears the
//! session, because the focus interval it guarded is over.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::provider::{AuthorizationStatus, BlockingProvider};
use super::selection::BlockSelection;
use crate::error::BlockingError;

/// Parameters for a new blocking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingRequest {
    pub title: String,
    pub duration_seconds: u32,
    pub task_id: String,
    pub task_title: String,
    pub is_deep_focus: bool,
    pub selection: BlockSelection,
}

/// Read-only view of the blocking state, as published to presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingSession {
    pub is_blocking: bool,
    pub is_deep_focus: bool,
    /// Drives the stop control and the "locked" indicator.
    pub can_cancel: bool,
    pub selection_summary: String,
    pub task_id: Option<String>,
    pub task_title: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

impl BlockingSession {
    fn inactive() -> Self {
        Self {
            is_blocking: false,
            is_deep_focus: false,
            can_cancel: true,
            selection_summary: BlockSelection::default().summary(),
            task_id: None,
            task_title: None,
            started_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The focus countdown reached zero.
    Completed,
    /// The user asked to stop early.
    UserCancel,
}

impl EndReason {
    pub fn is_completed(self) -> bool {
        self == EndReason::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum EndOutcome {
    Ended { completed: bool },
    /// There was nothing to end.
    NotActive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndedBlocking {
    pub task_id: String,
    pub completed: bool,
    pub forced: bool,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockingHistory {
    pub completed: u32,
    pub cancelled: u32,
    pub forced_resets: u32,
    pub last_ended: Option<EndedBlocking>,
}

#[derive(Debug, Clone)]
struct ActiveBlock {
    request: BlockingRequest,
    started_at: DateTime<Utc>,
}

pub struct BlockingCoordinator {
    provider: Arc<dyn BlockingProvider>,
    active: Option<ActiveBlock>,
    history: BlockingHistory,
}

impl BlockingCoordinator {
    pub fn new(provider: Arc<dyn BlockingProvider>) -> Self {
        Self {
            provider,
            active: None,
            history: BlockingHistory::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_blocking(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_deep_focus(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|block| block.request.is_deep_focus)
    }

    /// Whether a user-initiated stop would be honored right now.
    pub fn can_cancel_session(&self) -> bool {
        !self.is_deep_focus()
    }

    pub fn selection_summary(&self) -> String {
        self.active
            .as_ref()
            .map(|block| block.request.selection.summary())
            .unwrap_or_else(|| BlockSelection::default().summary())
    }

    pub fn session(&self) -> BlockingSession {
        match &self.active {
            Some(block) => BlockingSession {
                is_blocking: true,
                is_deep_focus: block.request.is_deep_focus,
                can_cancel: !block.request.is_deep_focus,
                selection_summary: block.request.selection.summary(),
                task_id: Some(block.request.task_id.clone()),
                task_title: Some(block.request.task_title.clone()),
                started_at: Some(block.started_at),
            },
            None => BlockingSession::inactive(),
        }
    }

    pub fn active_task_id(&self) -> Option<&str> {
        self.active.as_ref().map(|block| block.request.task_id.as_str())
    }

    pub fn history(&self) -> &BlockingHistory {
        &self.history
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Acquire the external shield for a focus session.
    ///
    /// On any failure the coordinator stays in its previous, non-blocking
    /// state.
    pub async fn start_session(
        &mut self,
        request: BlockingRequest,
        now: DateTime<Utc>,
    ) -> Result<BlockingSession, BlockingError> {
        if let Some(block) = &self.active {
            return Err(BlockingError::AlreadyActive {
                task_id: block.request.task_id.clone(),
            });
        }

        let mut status = self.provider.authorization_status().await;
        if status == AuthorizationStatus::NotDetermined {
            status = self.provider.request_authorization().await?;
        }
        if status != AuthorizationStatus::Approved {
            warn!(provider = self.provider.name(), "blocking not authorized");
            return Err(BlockingError::Unauthorized);
        }

        if let Err(err) = self.provider.apply(&request).await {
            warn!(
                provider = self.provider.name(),
                task_id = %request.task_id,
                error = %err,
                "failed to start blocking"
            );
            return Err(err);
        }

        info!(
            task_id = %request.task_id,
            deep_focus = request.is_deep_focus,
            selection = %request.selection.summary(),
            "blocking started"
        );
        self.active = Some(ActiveBlock {
            request,
            started_at: now,
        });
        Ok(self.session())
    }

    /// Tear the shield down.
    ///
    /// A `UserCancel` of a Deep Focus session is refused with
    /// [`BlockingError::DeepFocusLocked`] and blocking stays active, whatever
    /// the caller believed `can_cancel` to be. `Completed` always clears the
    /// session.
    pub async fn end_session(
        &mut self,
        reason: EndReason,
        now: DateTime<Utc>,
    ) -> Result<EndOutcome, BlockingError> {
        let Some(block) = &self.active else {
            return Ok(EndOutcome::NotActive);
        };

        if reason == EndReason::UserCancel && block.request.is_deep_focus {
            warn!(task_id = %block.request.task_id, "refused to cancel deep focus blocking");
            return Err(BlockingError::DeepFocusLocked);
        }

        let completed = reason.is_completed();
        if let Err(err) = self.provider.remove(completed).await {
            if !completed {
                warn!(error = %err, "failed to cancel blocking");
                return Err(err);
            }
            warn!(error = %err, "shield teardown failed after completion; clearing anyway");
        }

        self.finish(completed, false, now);
        Ok(EndOutcome::Ended { completed })
    }

    /// Unconditional teardown for reset boundaries (reinstall, data wipe).
    pub async fn force_reset(&mut self, now: DateTime<Utc>) -> EndOutcome {
        if self.active.is_none() {
            return EndOutcome::NotActive;
        }
        if let Err(err) = self.provider.remove(false).await {
            warn!(error = %err, "shield teardown failed during forced reset");
        }
        self.finish(false, true, now);
        EndOutcome::Ended { completed: false }
    }

    fn finish(&mut self, completed: bool, forced: bool, now: DateTime<Utc>) {
        let Some(block) = self.active.take() else {
            return;
        };
        if forced {
            self.history.forced_resets = self.history.forced_resets.saturating_add(1);
        } else if completed {
            self.history.completed = self.history.completed.saturating_add(1);
        } else {
            self.history.cancelled = self.history.cancelled.saturating_add(1);
        }
        info!(task_id = %block.request.task_id, completed, forced, "blocking ended");
        self.history.last_ended = Some(EndedBlocking {
            task_id: block.request.task_id,
            completed,
            forced,
            ended_at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocking::InMemoryBlocker;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 8, 30, 0).unwrap()
    }

    fn request(deep: bool) -> BlockingRequest {
        BlockingRequest {
            title: "Focus: Draft report".into(),
            duration_seconds: 1500,
            task_id: "task-1".into(),
            task_title: "Draft report".into(),
            is_deep_focus: deep,
            selection: BlockSelection {
                apps: vec!["Chat".into()],
                categories: vec!["Games".into(), "Social".into()],
                domains: vec![],
            },
        }
    }

    fn coordinator(blocker: &InMemoryBlocker) -> BlockingCoordinator {
        BlockingCoordinator::new(Arc::new(blocker.clone()))
    }

    #[tokio::test]
    async fn start_applies_shield() {
        let blocker = InMemoryBlocker::new();
        let mut coordinator = coordinator(&blocker);

        let session = coordinator.start_session(request(false), now()).await.unwrap();
        assert!(session.is_blocking);
        assert!(session.can_cancel);
        assert_eq!(session.selection_summary, "1 app, 2 categories");
        assert!(blocker.is_shielding());
    }

    #[tokio::test]
    async fn unauthorized_start_leaves_state_untouched() {
        let blocker = InMemoryBlocker::denied();
        let mut coordinator = coordinator(&blocker);

        let err = coordinator.start_session(request(true), now()).await.unwrap_err();
        assert_eq!(err, BlockingError::Unauthorized);
        assert!(!coordinator.is_blocking());
        assert!(!blocker.is_shielding());
    }

    #[tokio::test]
    async fn provider_failure_is_surfaced() {
        let blocker = InMemoryBlocker::new();
        blocker.fail_apply_with(Some("screen time unavailable"));
        let mut coordinator = coordinator(&blocker);

        let err = coordinator.start_session(request(false), now()).await.unwrap_err();
        assert!(matches!(err, BlockingError::Provider(_)));
        assert!(!coordinator.is_blocking());
        assert_eq!(coordinator.session(), BlockingSession::inactive());
    }

    #[tokio::test]
    async fn only_one_session_at_a_time() {
        let blocker = InMemoryBlocker::new();
        let mut coordinator = coordinator(&blocker);
        coordinator.start_session(request(false), now()).await.unwrap();

        let err = coordinator.start_session(request(false), now()).await.unwrap_err();
        assert!(matches!(err, BlockingError::AlreadyActive { .. }));
        assert_eq!(blocker.applied_count(), 1);
    }

    #[tokio::test]
    async fn deep_focus_cancel_is_refused() {
        let blocker = InMemoryBlocker::new();
        let mut coordinator = coordinator(&blocker);
        coordinator.start_session(request(true), now()).await.unwrap();
        assert!(!coordinator.can_cancel_session());

        let err = coordinator
            .end_session(EndReason::UserCancel, now())
            .await
            .unwrap_err();
        assert!(err.is_locked());
        assert!(coordinator.is_blocking());
        assert!(blocker.is_shielding());
    }

    #[tokio::test]
    async fn completion_ends_deep_focus() {
        let blocker = InMemoryBlocker::new();
        let mut coordinator = coordinator(&blocker);
        coordinator.start_session(request(true), now()).await.unwrap();

        let outcome = coordinator.end_session(EndReason::Completed, now()).await.unwrap();
        assert_eq!(outcome, EndOutcome::Ended { completed: true });
        assert!(!coordinator.is_blocking());
        assert_eq!(blocker.removals(), vec![true]);
        assert_eq!(coordinator.history().completed, 1);
    }

    #[tokio::test]
    async fn regular_cancel_is_recorded() {
        let blocker = InMemoryBlocker::new();
        let mut coordinator = coordinator(&blocker);
        coordinator.start_session(request(false), now()).await.unwrap();

        let outcome = coordinator.end_session(EndReason::UserCancel, now()).await.unwrap();
        assert_eq!(outcome, EndOutcome::Ended { completed: false });
        let history = coordinator.history();
        assert_eq!(history.cancelled, 1);
        assert_eq!(
            history.last_ended.as_ref().map(|e| e.completed),
            Some(false)
        );
    }

    #[tokio::test]
    async fn cancel_teardown_failure_keeps_blocking() {
        let blocker = InMemoryBlocker::new();
        let mut coordinator = coordinator(&blocker);
        coordinator.start_session(request(false), now()).await.unwrap();
        blocker.fail_remove_with(Some("busy"));

        let err = coordinator
            .end_session(EndReason::UserCancel, now())
            .await
            .unwrap_err();
        assert!(matches!(err, BlockingError::Provider(_)));
        assert!(coordinator.is_blocking());
    }

    #[tokio::test]
    async fn completion_clears_even_if_teardown_fails() {
        let blocker = InMemoryBlocker::new();
        let mut coordinator = coordinator(&blocker);
        coordinator.start_session(request(true), now()).await.unwrap();
        blocker.fail_remove_with(Some("busy"));

        let outcome = coordinator.end_session(EndReason::Completed, now()).await.unwrap();
        assert_eq!(outcome, EndOutcome::Ended { completed: true });
        assert!(!coordinator.is_blocking());
    }

    #[tokio::test]
    async fn end_without_session_is_not_active() {
        let blocker = InMemoryBlocker::new();
        let mut coordinator = coordinator(&blocker);
        let outcome = coordinator.end_session(EndReason::UserCancel, now()).await.unwrap();
        assert_eq!(outcome, EndOutcome::NotActive);
        assert!(coordinator.can_cancel_session());
    }

    #[tokio::test]
    async fn force_reset_overrides_deep_focus() {
        let blocker = InMemoryBlocker::new();
        let mut coordinator = coordinator(&blocker);
        coordinator.start_session(request(true), now()).await.unwrap();

        assert_eq!(
            coordinator.force_reset(now()).await,
            EndOutcome::Ended { completed: false }
        );
        assert!(!coordinator.is_blocking());
        assert_eq!(coordinator.history().forced_resets, 1);
        assert_eq!(coordinator.force_reset(now()).await, EndOutcome::NotActive);
    }

    #[tokio::test]
    async fn undetermined_authorization_is_requested() {
        let blocker = InMemoryBlocker::new();
        blocker.set_authorization(AuthorizationStatus::NotDetermined);
        let mut coordinator = coordinator(&blocker);

        // The in-memory provider reports the unchanged status when asked.
        let err = coordinator.start_session(request(false), now()).await.unwrap_err();
        assert_eq!(err, BlockingError::Unauthorized);
    }
}
