use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use momentum_core::{
    BlockSelection, BlockingOptions, EngineEvent, EngineRuntime, FocusRequest, StopOutcome,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::{save_state, Workspace};

#[derive(Subcommand)]
pub enum FocusAction {
    /// Start a session and stream its events as JSON lines.
    /// Ctrl-C asks to stop (refused under Deep Focus).
    Start(StartArgs),
}

#[derive(Args)]
pub struct StartArgs {
    /// Task ID
    task_id: String,
    /// Task title (defaults to the task ID)
    #[arg(long)]
    title: Option<String>,
    /// Session length in minutes (defaults to focus.work_minutes)
    #[arg(long, conflicts_with = "seconds")]
    minutes: Option<u32>,
    /// Session length in seconds
    #[arg(long)]
    seconds: Option<u32>,
    /// Block distractions during the session
    #[arg(long)]
    block: bool,
    /// Deep Focus: blocking that cannot be stopped early (implies --block)
    #[arg(long)]
    deep: bool,
    /// Apps to block, comma separated
    #[arg(long, value_delimiter = ',')]
    apps: Vec<String>,
    /// App categories to block, comma separated
    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,
    /// Websites to block, comma separated
    #[arg(long, value_delimiter = ',')]
    domains: Vec<String>,
    /// Run the break after the work interval instead of exiting
    #[arg(long)]
    take_break: bool,
    /// Milliseconds per countdown second
    #[arg(long, default_value = "1000")]
    tick_ms: u64,
}

impl StartArgs {
    fn selection(&self) -> Option<BlockSelection> {
        let selection = BlockSelection {
            apps: self.apps.clone(),
            categories: self.categories.clone(),
            domains: self.domains.clone(),
        };
        (!selection.is_empty()).then_some(selection)
    }
}

pub async fn run(action: FocusAction) -> Result<()> {
    match action {
        FocusAction::Start(args) => start(args).await,
    }
}

async fn start(args: StartArgs) -> Result<()> {
    let workspace = Workspace::open()?;
    let duration_seconds = match (args.seconds, args.minutes) {
        (Some(seconds), _) => seconds,
        (None, Some(minutes)) => minutes.saturating_mul(60),
        (None, None) => workspace.config.focus.work_seconds(),
    };
    if duration_seconds == 0 {
        bail!("session length must be greater than zero");
    }

    let wants_blocking = args.block || args.deep || args.selection().is_some();
    let blocking = wants_blocking.then(|| BlockingOptions {
        is_deep_focus: args.deep || workspace.config.blocking.deep_focus_by_default,
        selection: args.selection(),
    });
    let request = FocusRequest {
        task_title: args.title.clone().unwrap_or_else(|| args.task_id.clone()),
        task_id: args.task_id.clone(),
        duration_seconds,
        blocking,
    };

    let state_path = workspace.state_path.clone();
    let runtime = EngineRuntime::with_tick_interval(
        workspace.engine,
        Duration::from_millis(args.tick_ms.max(1)),
    );
    let mut rx = runtime.subscribe().await;

    if runtime
        .start_focus(request)
        .await
        .context("failed to start focus session")?
        .is_none()
    {
        bail!("another focus session is running");
    }
    info!(task_id = %args.task_id, duration_seconds, "focus session started");

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event)?);
                    match &event {
                        EngineEvent::FocusSessionChanged { session: Some(session), .. }
                            if session.is_awaiting_break() =>
                        {
                            if !args.take_break {
                                break;
                            }
                            runtime.start_break().await;
                        }
                        EngineEvent::FocusEnded { .. } => break,
                        _ => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event output fell behind"),
                Err(RecvError::Closed) => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                match runtime.stop_focus().await {
                    Ok(StopOutcome::Locked) => {
                        eprintln!("Deep Focus active - cannot stop");
                        // The refused stop paused the countdown; keep it going.
                        runtime.resume_focus().await;
                    }
                    Ok(StopOutcome::Stopped) | Ok(StopOutcome::Idle) => {}
                    Err(err) => eprintln!("error: {err}"),
                }
            }
        }
    }

    runtime.shutdown().await;
    save_state(&runtime.export_state().await, &state_path)
}
