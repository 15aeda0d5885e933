//! # Momentum Core Library
//!
//! Core logic for a focus companion that rewards finishing tasks in quick
//! succession. The CLI is a thin layer over this crate; any other host (a
//! desktop shell, a widget) drives the same engine and subscribes to the same
//! events.
//!
//! ## Architecture
//!
//! - **Momentum**: combo streak with a 30-minute decay window and tiered
//!   XP multipliers
//! - **Ledger**: XP totals, daily and weekly counters, day streaks
//! - **Focus**: a per-second countdown state machine with work and break
//!   intervals
//! - **Blocking**: the single external distraction shield, including the
//!   Deep Focus lock
//! - **Events**: a broadcast bus every state change is published on
//! - **Storage**: TOML configuration and a JSON state file
//!
//! ## Key Components
//!
//! - [`MomentumEngine`]: owns one of each component and wires them together
//! - [`EngineRuntime`]: async host with a background ticker
//! - [`Clock`]: injected time source
//! - [`Config`]: application configuration management

pub mod blocking;
pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod focus;
pub mod ledger;
pub mod momentum;
pub mod runtime;
pub mod storage;

pub use blocking::{
    AuthorizationStatus, BlockSelection, BlockingCoordinator, BlockingProvider, BlockingSession,
    EndOutcome, EndReason, InMemoryBlocker,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{
    BlockingOptions, CompletionOutcome, EngineSnapshot, FocusRequest, MomentumEngine,
    StopOutcome, TaskCompleted,
};
pub use error::{BlockingError, ConfigError, CoreError};
pub use events::{EngineEvent, EventBus, ScreenPosition};
pub use focus::{EndKind, FocusConfig, FocusController, FocusSession, FocusState, FocusTransition};
pub use ledger::{Award, CompletionTally, LedgerConfig, LedgerSnapshot, XpLedger};
pub use momentum::{MomentumConfig, MomentumState, MomentumTracker, MultiplierTier};
pub use runtime::EngineRuntime;
pub use storage::{data_dir, BlockingConfig, Config, EngineState};
