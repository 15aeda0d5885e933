use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::coordinator::BlockingRequest;
use crate::error::BlockingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotDetermined,
    Denied,
    Approved,
}

/// The external, possibly slow, authorization-gated shield.
///
/// Implementations must either fully apply a shield or return an error; the
/// coordinator records nothing unless `apply` succeeds.
#[async_trait]
pub trait BlockingProvider: Send + Sync {
    /// Unique identifier (e.g. "screen-time", "hosts").
    fn name(&self) -> &str;

    async fn authorization_status(&self) -> AuthorizationStatus;

    /// Prompt for permission. Defaults to reporting the current status.
    async fn request_authorization(&self) -> Result<AuthorizationStatus, BlockingError> {
        Ok(self.authorization_status().await)
    }

    async fn apply(&self, request: &BlockingRequest) -> Result<(), BlockingError>;

    /// Lift the shield. `completed` tells the provider whether the session ran
    /// to its natural end.
    async fn remove(&self, completed: bool) -> Result<(), BlockingError>;
}

#[derive(Debug, Default)]
struct BlockerInner {
    authorization: Option<AuthorizationStatus>,
    fail_apply: Option<String>,
    fail_remove: Option<String>,
    active: Option<BlockingRequest>,
    applied: u32,
    removed: Vec<bool>,
}

/// Process-local provider that just remembers what is shielded.
///
/// Used by the CLI and by tests; clones share state so a test can keep a
/// handle after passing one to the coordinator.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlocker {
    inner: Arc<Mutex<BlockerInner>>,
}

impl InMemoryBlocker {
    pub fn new() -> Self {
        let blocker = Self::default();
        blocker.lock().authorization = Some(AuthorizationStatus::Approved);
        blocker
    }

    /// A provider whose user has refused the permission.
    pub fn denied() -> Self {
        let blocker = Self::default();
        blocker.lock().authorization = Some(AuthorizationStatus::Denied);
        blocker
    }

    pub fn set_authorization(&self, status: AuthorizationStatus) {
        self.lock().authorization = Some(status);
    }

    /// Make the next `apply` calls fail with a provider error.
    pub fn fail_apply_with(&self, message: Option<&str>) {
        self.lock().fail_apply = message.map(str::to_string);
    }

    /// Make the next `remove` calls fail with a provider error.
    pub fn fail_remove_with(&self, message: Option<&str>) {
        self.lock().fail_remove = message.map(str::to_string);
    }

    pub fn is_shielding(&self) -> bool {
        self.lock().active.is_some()
    }

    pub fn active_request(&self) -> Option<BlockingRequest> {
        self.lock().active.clone()
    }

    pub fn applied_count(&self) -> u32 {
        self.lock().applied
    }

    /// `completed` flags passed to each successful `remove`, in order.
    pub fn removals(&self) -> Vec<bool> {
        self.lock().removed.clone()
    }

    fn lock(&self) -> MutexGuard<'_, BlockerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BlockingProvider for InMemoryBlocker {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn authorization_status(&self) -> AuthorizationStatus {
        self.lock()
            .authorization
            .unwrap_or(AuthorizationStatus::NotDetermined)
    }

    async fn apply(&self, request: &BlockingRequest) -> Result<(), BlockingError> {
        let mut inner = self.lock();
        if inner.authorization != Some(AuthorizationStatus::Approved) {
            return Err(BlockingError::Unauthorized);
        }
        if let Some(message) = &inner.fail_apply {
            return Err(BlockingError::Provider(message.clone()));
        }
        debug!(task_id = %request.task_id, "shield applied");
        inner.active = Some(request.clone());
        inner.applied = inner.applied.saturating_add(1);
        Ok(())
    }

    async fn remove(&self, completed: bool) -> Result<(), BlockingError> {
        let mut inner = self.lock();
        if let Some(message) = &inner.fail_remove {
            return Err(BlockingError::Provider(message.clone()));
        }
        inner.active = None;
        inner.removed.push(completed);
        Ok(())
    }
}
