//! Async host for a [`MomentumEngine`].
//!
//! The engine sits behind a tokio mutex so every command is serialized. A
//! background ticker calls [`MomentumEngine::tick`] once per interval while a
//! countdown is live and exits on its own when the countdown stops.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::debug;

use crate::engine::{
    CompletionOutcome, EngineSnapshot, FocusRequest, MomentumEngine, StopOutcome, TaskCompleted,
};
use crate::error::BlockingError;
use crate::events::{EngineEvent, ScreenPosition};
use crate::focus::FocusSession;
use crate::momentum::MomentumState;
use crate::storage::EngineState;

#[derive(Clone)]
pub struct EngineRuntime {
    engine: Arc<Mutex<MomentumEngine>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
}

impl EngineRuntime {
    pub fn new(engine: MomentumEngine) -> Self {
        Self::with_tick_interval(engine, Duration::from_secs(1))
    }

    /// Shorter intervals make a countdown run faster than wall time; useful
    /// for demos and tests.
    pub fn with_tick_interval(engine: MomentumEngine, tick_interval: Duration) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval,
        }
    }

    /// Direct access for anything not wrapped here.
    pub async fn lock(&self) -> MutexGuard<'_, MomentumEngine> {
        self.engine.lock().await
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.engine.lock().await.subscribe()
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        self.engine.lock().await.snapshot()
    }

    pub async fn momentum(&self) -> MomentumState {
        self.engine.lock().await.momentum()
    }

    pub async fn export_state(&self) -> EngineState {
        self.engine.lock().await.export_state()
    }

    pub async fn complete_task(
        &self,
        event: TaskCompleted,
        position: Option<ScreenPosition>,
    ) -> CompletionOutcome {
        self.engine.lock().await.complete_task(event, position)
    }

    pub async fn start_focus(
        &self,
        request: FocusRequest,
    ) -> Result<Option<FocusSession>, BlockingError> {
        let mut engine = self.engine.lock().await;
        let session = engine.start_focus(request).await?;
        if session.is_some() {
            self.spawn_ticker().await;
        }
        Ok(session)
    }

    pub async fn stop_focus(&self) -> Result<StopOutcome, BlockingError> {
        let mut engine = self.engine.lock().await;
        let outcome = engine.stop_focus().await?;
        // Locked pauses the countdown, so the ticker goes either way.
        if matches!(outcome, StopOutcome::Stopped | StopOutcome::Locked) {
            self.cancel_ticker().await;
        }
        Ok(outcome)
    }

    pub async fn pause_focus(&self) -> Option<FocusSession> {
        let mut engine = self.engine.lock().await;
        let session = engine.pause_focus()?;
        self.cancel_ticker().await;
        Some(session)
    }

    pub async fn resume_focus(&self) -> Option<FocusSession> {
        let mut engine = self.engine.lock().await;
        let session = engine.resume_focus()?;
        self.spawn_ticker().await;
        Some(session)
    }

    pub async fn start_break(&self) -> Option<FocusSession> {
        let mut engine = self.engine.lock().await;
        let session = engine.start_break()?;
        self.spawn_ticker().await;
        Some(session)
    }

    pub async fn skip_break(&self) -> bool {
        let mut engine = self.engine.lock().await;
        let skipped = engine.skip_break();
        if skipped {
            self.cancel_ticker().await;
        }
        skipped
    }

    pub async fn start_next_interval(&self) -> Option<FocusSession> {
        let mut engine = self.engine.lock().await;
        let session = engine.start_next_interval()?;
        self.spawn_ticker().await;
        Some(session)
    }

    pub async fn force_reset(&self) {
        let mut engine = self.engine.lock().await;
        engine.force_reset().await;
        self.cancel_ticker().await;
    }

    pub async fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the ticker without touching engine state.
    pub async fn shutdown(&self) {
        self.cancel_ticker().await;
    }

    // Called with the engine lock held, so the old ticker can never be
    // aborted in the middle of a tick.
    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let engine = self.engine.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;

                let mut guard = engine.lock().await;
                if !guard.is_counting_down() {
                    break;
                }
                guard.tick().await;
                if !guard.is_counting_down() {
                    debug!("countdown finished; ticker exiting");
                    break;
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}
