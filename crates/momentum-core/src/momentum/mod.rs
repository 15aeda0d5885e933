//! Combo streak ("momentum") tracking.
//!
//! A combo stays open while completions keep arriving less than
//! [`DECAY_INTERVAL_MINUTES`] apart. The streak length selects an XP
//! multiplier from a tier table.

mod tiers;
mod tracker;

pub use tiers::{MomentumConfig, MultiplierTier};
pub use tracker::{MomentumState, MomentumTracker, DECAY_INTERVAL_MINUTES};
