//! Pomodoro-style focus sessions.
//!
//! The controller is a tick-driven state machine: the owner calls
//! [`FocusController::tick`] once per wall-clock second while a countdown is
//! live. It has no thread of its own and knows nothing about blocking; the
//! engine reacts to the transitions it returns.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> (Completed) -> BreakTime -> Running | Idle
//! Running | Paused | BreakTime -> Idle   (stop)
//! ```

mod controller;
mod session;

pub use controller::{EndKind, FocusController, FocusTransition};
pub use session::{FocusConfig, FocusSession, FocusState, SessionPhase};
