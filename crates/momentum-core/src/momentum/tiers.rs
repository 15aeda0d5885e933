//! Multiplier tier table.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Streak threshold at which a multiplier starts to apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierTier {
    pub min_streak: u32,
    pub multiplier: f64,
}

/// Tuning for the momentum tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Streak length at which the flame is drawn at full intensity.
    #[serde(default = "default_full_intensity_streak")]
    pub full_intensity_streak: u32,
    /// Tiers ordered by `min_streak`. Streaks below the first tier earn 1.0x.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<MultiplierTier>,
}

fn default_tiers() -> Vec<MultiplierTier> {
    vec![
        MultiplierTier { min_streak: 3, multiplier: 1.5 },
        MultiplierTier { min_streak: 5, multiplier: 2.0 },
        MultiplierTier { min_streak: 10, multiplier: 2.5 },
    ]
}

fn default_full_intensity_streak() -> u32 {
    10
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            full_intensity_streak: default_full_intensity_streak(),
            tiers: default_tiers(),
        }
    }
}

impl MomentumConfig {
    /// Reject tables that would make the multiplier decrease or drop below 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.full_intensity_streak == 0 {
            return Err(ConfigError::InvalidValue {
                key: "momentum.full_intensity_streak".into(),
                message: "must be greater than zero".into(),
            });
        }

        let mut previous: Option<&MultiplierTier> = None;
        for tier in &self.tiers {
            if !tier.multiplier.is_finite() || tier.multiplier < 1.0 {
                return Err(ConfigError::InvalidValue {
                    key: "momentum.tiers".into(),
                    message: format!(
                        "multiplier {} at streak {} is below 1.0",
                        tier.multiplier, tier.min_streak
                    ),
                });
            }
            if let Some(prev) = previous {
                if tier.min_streak <= prev.min_streak || tier.multiplier < prev.multiplier {
                    return Err(ConfigError::InvalidValue {
                        key: "momentum.tiers".into(),
                        message: format!(
                            "tier at streak {} must follow streak {} with a multiplier >= {}",
                            tier.min_streak, prev.min_streak, prev.multiplier
                        ),
                    });
                }
            }
            previous = Some(tier);
        }
        Ok(())
    }

    /// Multiplier earned by a streak of the given length.
    pub fn multiplier_for(&self, streak: u32) -> f64 {
        self.tiers
            .iter()
            .take_while(|tier| tier.min_streak <= streak)
            .last()
            .map(|tier| tier.multiplier)
            .unwrap_or(1.0)
            .max(1.0)
    }

    /// Streak length at which the next higher tier begins, if any.
    pub fn next_tier(&self, streak: u32) -> Option<&MultiplierTier> {
        self.tiers.iter().find(|tier| tier.min_streak > streak)
    }

    /// Flame intensity in `[0, 1]` for a streak.
    pub fn flame_intensity(&self, streak: u32) -> f64 {
        let full = self.full_intensity_streak.max(1) as f64;
        (streak as f64 / full).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tiers_step_up() {
        let config = MomentumConfig::default();
        assert_eq!(config.multiplier_for(0), 1.0);
        assert_eq!(config.multiplier_for(2), 1.0);
        assert_eq!(config.multiplier_for(3), 1.5);
        assert_eq!(config.multiplier_for(4), 1.5);
        assert_eq!(config.multiplier_for(5), 2.0);
        assert_eq!(config.multiplier_for(9), 2.0);
        assert_eq!(config.multiplier_for(10), 2.5);
        assert_eq!(config.multiplier_for(500), 2.5);
    }

    #[test]
    fn next_tier_points_at_following_threshold() {
        let config = MomentumConfig::default();
        assert_eq!(config.next_tier(0).map(|t| t.min_streak), Some(3));
        assert_eq!(config.next_tier(3).map(|t| t.min_streak), Some(5));
        assert!(config.next_tier(10).is_none());
    }

    #[test]
    fn flame_intensity_saturates() {
        let config = MomentumConfig::default();
        assert_eq!(config.flame_intensity(0), 0.0);
        assert_eq!(config.flame_intensity(5), 0.5);
        assert_eq!(config.flame_intensity(25), 1.0);
    }

    #[test]
    fn validate_rejects_decreasing_multiplier() {
        let config = MomentumConfig {
            tiers: vec![
                MultiplierTier { min_streak: 3, multiplier: 2.0 },
                MultiplierTier { min_streak: 5, multiplier: 1.5 },
            ],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_sub_unit_multiplier() {
        let config = MomentumConfig {
            tiers: vec![MultiplierTier { min_streak: 2, multiplier: 0.5 }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(MomentumConfig::default().validate().is_ok());
    }
}
