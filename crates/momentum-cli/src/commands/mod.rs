pub mod complete;
pub mod config;
pub mod focus;
pub mod goal;
pub mod status;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use momentum_core::{
    Config, EngineEvent, EngineState, InMemoryBlocker, MomentumEngine, SystemClock,
};
use serde::Serialize;
use tokio::sync::broadcast;

/// An engine restored from the data directory, plus where to save it back.
pub struct Workspace {
    pub config: Config,
    pub engine: MomentumEngine,
    pub state_path: PathBuf,
}

impl Workspace {
    pub fn open() -> Result<Self> {
        let config = Config::load().context("failed to load config")?;
        let state_path = EngineState::path()?;
        let state = EngineState::load_from(&state_path)
            .with_context(|| format!("failed to read {}", state_path.display()))?;

        // The CLI has no OS shield to drive; the in-memory provider keeps the
        // blocking rules (Deep Focus lock included) observable.
        let mut engine = MomentumEngine::new(
            &config,
            Arc::new(SystemClock),
            Arc::new(InMemoryBlocker::new()),
        );
        engine.restore(state);
        Ok(Self {
            config,
            engine,
            state_path,
        })
    }

    pub fn save(&self) -> Result<()> {
        save_state(&self.engine.export_state(), &self.state_path)
    }
}

pub fn save_state(state: &EngineState, path: &Path) -> Result<()> {
    state
        .save_to(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Everything already published on `rx`.
pub fn drain_events(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
