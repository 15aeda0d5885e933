use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

use super::{print_json, Workspace};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Show goals and progress
    Show,
    /// Set the daily completion goal
    Daily {
        /// Completions per day
        goal: u32,
    },
    /// Set the weekly completion goal
    Weekly {
        /// Completions per week
        goal: u32,
    },
}

pub fn run(action: GoalAction) -> Result<()> {
    let mut workspace = Workspace::open()?;
    match action {
        GoalAction::Show => {}
        GoalAction::Daily { goal } => workspace.engine.set_daily_goal(goal),
        GoalAction::Weekly { goal } => workspace.engine.set_weekly_goal(goal),
    }
    workspace.save()?;

    let now = workspace.engine.now();
    let ledger = workspace.engine.ledger();
    print_json(&json!({
        "daily_goal": ledger.daily_goal(),
        "weekly_goal": ledger.weekly_goal(),
        "tasks_completed_today": ledger.tasks_completed_today(now),
        "tasks_completed_this_week": ledger.tasks_completed_this_week(now),
    }))
}
