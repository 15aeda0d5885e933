//! Distraction blocking tied to a focus session.
//!
//! The external shield (an OS screen-time API, a hosts-file writer, a
//! browser extension) sits behind [`BlockingProvider`]. The
//! [`BlockingCoordinator`] owns the single [`BlockingSession`] and is the
//! source of truth for whether it may be cancelled: a Deep Focus session ends
//! only by natural completion or a forced reset.

mod coordinator;
mod provider;
mod selection;

pub use coordinator::{
    BlockingCoordinator, BlockingHistory, BlockingRequest, BlockingSession, EndOutcome, EndReason,
    EndedBlocking,
};
pub use provider::{AuthorizationStatus, BlockingProvider, InMemoryBlocker};
pub use selection::BlockSelection;
