//! Engine state persisted between process runs.
//!
//! The core never writes this on its own; the CLI (or any other host) loads
//! it at startup and saves it after mutating the engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::Result;
use crate::ledger::LedgerSnapshot;
use crate::momentum::MomentumState;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    #[serde(default)]
    pub momentum: MomentumState,
    #[serde(default)]
    pub ledger: LedgerSnapshot,
}

impl EngineState {
    /// Default location: `<data dir>/state.json`.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("state.json"))
    }

    /// Read the state, or an empty one if nothing has been saved yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
