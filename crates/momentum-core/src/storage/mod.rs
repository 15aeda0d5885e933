mod config;
mod state;

pub use config::{BlockingConfig, Config};
pub use state::EngineState;

use std::path::PathBuf;

use crate::error::{CoreError, Result};

/// Returns the data directory, creating it if needed.
///
/// `MOMENTUM_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/momentum[-dev]/`, with `MOMENTUM_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("MOMENTUM_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .ok_or_else(|| CoreError::DataDir("home directory not found".into()))?
                .join(".config");
            let env = std::env::var("MOMENTUM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("momentum-dev")
            } else {
                base_dir.join("momentum")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
