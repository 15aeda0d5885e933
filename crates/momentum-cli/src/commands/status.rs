use anyhow::Result;
use serde_json::json;

use super::{drain_events, print_json, Workspace};

pub fn run() -> Result<()> {
    let mut workspace = Workspace::open()?;
    let snapshot = workspace.engine.snapshot();
    // Reading applies decay; persist it so the next run starts from the same view.
    workspace.save()?;
    print_json(&snapshot)
}

pub async fn reset() -> Result<()> {
    let mut workspace = Workspace::open()?;
    let mut rx = workspace.engine.subscribe();
    workspace.engine.force_reset().await;
    workspace.save()?;
    print_json(&json!({
        "type": "engine_reset",
        "events": drain_events(&mut rx),
    }))
}
