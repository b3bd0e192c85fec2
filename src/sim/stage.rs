//! Stage resolution
//!
//! Maps a cumulative score onto its difficulty tier. Stateless: the config is
//! recomputed on demand and never mutated.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

static DEFAULT_TUNING: LazyLock<Tuning> = LazyLock::new(Tuning::default);

/// Difficulty settings in effect for a score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// 1-based stage number
    pub stage: u32,
    pub time_limit_secs: u32,
    pub min_operand: u32,
    pub max_operand: u32,
    pub subtraction_chance: f64,
}

/// Stage config for a score under the built-in tuning
pub fn resolve_stage(score: u32) -> StageConfig {
    DEFAULT_TUNING.resolve_stage(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_stage_table() {
        let cases = [
            (0, 1, 5, 10),
            (9, 1, 5, 10),
            (10, 2, 10, 20),
            (19, 2, 10, 20),
            (20, 3, 15, 40),
            (29, 3, 15, 40),
            (1000, 3, 15, 40),
        ];
        for (score, stage, time_limit, max_operand) in cases {
            let config = resolve_stage(score);
            assert_eq!(config.stage, stage, "stage at score {score}");
            assert_eq!(config.time_limit_secs, time_limit, "time at score {score}");
            assert_eq!(config.max_operand, max_operand, "max at score {score}");
        }
    }

    #[test]
    fn test_stage_three_raises_operand_floor() {
        assert_eq!(resolve_stage(0).min_operand, 1);
        assert_eq!(resolve_stage(15).min_operand, 1);
        assert_eq!(resolve_stage(25).min_operand, 15);
    }

    #[test]
    fn test_stage_one_never_subtracts() {
        assert_eq!(resolve_stage(3).subtraction_chance, 0.0);
        assert_eq!(resolve_stage(12).subtraction_chance, 0.6);
    }

    proptest! {
        #[test]
        fn stage_is_bounded(score in any::<u32>()) {
            let stage = resolve_stage(score).stage;
            prop_assert!((1..=3).contains(&stage));
        }

        #[test]
        fn stage_is_monotonic(a in 0u32..10_000, b in 0u32..10_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(resolve_stage(lo).stage <= resolve_stage(hi).stage);
        }

        #[test]
        fn resolve_is_idempotent(score in any::<u32>()) {
            prop_assert_eq!(resolve_stage(score), resolve_stage(score));
        }
    }
}
