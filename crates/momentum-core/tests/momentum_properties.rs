//! Property tests for the combo tracker and the XP ledger.

use chrono::{DateTime, Duration, TimeZone, Utc};
use momentum_core::{MomentumTracker, XpLedger};
use proptest::prelude::*;

fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
}

proptest! {
    #[test]
    fn streak_grows_while_gaps_stay_inside_window(gaps in prop::collection::vec(0i64..1800, 1..40)) {
        let mut tracker = MomentumTracker::new();
        let mut now = origin();
        let mut previous = tracker.on_task_completed(now).streak_count;
        for gap in gaps {
            now += Duration::seconds(gap);
            let streak = tracker.on_task_completed(now).streak_count;
            prop_assert_eq!(streak, previous + 1);
            previous = streak;
        }
    }

    #[test]
    fn gap_of_window_or_more_restarts_streak(warmup in 1usize..12, gap in 1800i64..100_000) {
        let mut tracker = MomentumTracker::new();
        let mut now = origin();
        for _ in 0..warmup {
            tracker.on_task_completed(now);
            now += Duration::minutes(1);
        }
        now += Duration::seconds(gap);
        let state = tracker.on_task_completed(now);
        prop_assert_eq!(state.streak_count, 1);
        prop_assert_eq!(state.multiplier, 1.0);
    }

    #[test]
    fn multiplier_never_drops_while_streak_grows(count in 1usize..60) {
        let mut tracker = MomentumTracker::new();
        let mut now = origin();
        let mut last = 1.0;
        for _ in 0..count {
            let state = tracker.on_task_completed(now);
            prop_assert!(state.multiplier >= 1.0);
            prop_assert!(state.multiplier >= last);
            prop_assert!((0.0..=1.0).contains(&state.flame_intensity));
            last = state.multiplier;
            now += Duration::minutes(29);
        }
    }

    #[test]
    fn award_matches_rounded_product(base in 0u32..10_000, tier in 0usize..3) {
        let multiplier = [1.0, 1.5, 2.0][tier];
        let mut ledger = XpLedger::new();
        let award = ledger.award(base, multiplier);
        let expected = (f64::from(base) * multiplier).round() as u32;
        prop_assert_eq!(award.display_amount, expected);
        prop_assert_eq!(award.is_bonus, expected > base);
        prop_assert_eq!(ledger.total_points(), u64::from(expected));
    }

    #[test]
    fn award_never_shrinks_base(base in 0u32..10_000, multiplier in -10.0f64..0.999) {
        let mut ledger = XpLedger::new();
        let award = ledger.award(base, multiplier);
        prop_assert_eq!(award.display_amount, base);
        prop_assert!(!award.is_bonus);
    }
}
