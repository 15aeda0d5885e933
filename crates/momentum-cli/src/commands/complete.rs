use anyhow::Result;
use clap::Args;
use momentum_core::{ScreenPosition, TaskCompleted};
use serde_json::json;

use super::{drain_events, print_json, Workspace};

#[derive(Args)]
pub struct CompleteArgs {
    /// Task ID
    task_id: String,
    /// Horizontal position of the celebration
    #[arg(long, requires = "y", allow_negative_numbers = true)]
    x: Option<f64>,
    /// Vertical position of the celebration
    #[arg(long, requires = "x", allow_negative_numbers = true)]
    y: Option<f64>,
}

pub fn run(args: CompleteArgs) -> Result<()> {
    let mut workspace = Workspace::open()?;
    let mut rx = workspace.engine.subscribe();

    let position = match (args.x, args.y) {
        (Some(x), Some(y)) => Some(ScreenPosition { x, y }),
        _ => None,
    };
    let completed_at = workspace.engine.now();
    let outcome = workspace.engine.complete_task(
        TaskCompleted {
            task_id: args.task_id,
            completed_at,
        },
        position,
    );
    workspace.save()?;

    print_json(&json!({
        "outcome": outcome,
        "events": drain_events(&mut rx),
    }))
}
