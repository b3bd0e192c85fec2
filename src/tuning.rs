//! Data-driven stage table
//!
//! The difficulty curve is a list of tiers indexed by `score / stage_span`.
//! The last tier covers every score past the end of the table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::StageConfig;

/// Invalid tuning table
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("Failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Tuning has no stages")]
    NoStages,

    #[error("Stage span must be non-zero")]
    ZeroStageSpan,

    #[error("Win score must be non-zero")]
    ZeroWinScore,

    #[error("Tick interval must be non-zero")]
    ZeroTickInterval,

    #[error("Stage {stage} has a zero time limit")]
    ZeroTimeLimit { stage: u32 },

    #[error("Stage {stage} operand floor must be at least 1")]
    ZeroOperandFloor { stage: u32 },

    #[error("Stage {stage} operand range is empty: floor {min} must be below max {max}")]
    OperandRange { stage: u32, min: u32, max: u32 },

    #[error("Stage {stage} max operand {max} is too large: sums and decoys would overflow")]
    OperandOverflow { stage: u32, max: u32 },

    #[error("Stage {stage} subtraction chance {chance} is outside [0, 1]")]
    SubtractionChance { stage: u32, chance: f64 },

    #[error("Stage 1 must be addition only, got subtraction chance {0}")]
    FirstStageSubtraction(f64),
}

/// One difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTier {
    /// Seconds on the countdown for each problem
    pub time_limit_secs: u32,
    /// Smallest operand drawn (inclusive)
    pub min_operand: u32,
    /// Largest operand drawn (inclusive)
    pub max_operand: u32,
    /// Probability that a problem is a subtraction
    pub subtraction_chance: f64,
}

const DEFAULT_TIERS: [StageTier; 3] = [
    StageTier {
        time_limit_secs: 5,
        min_operand: 1,
        max_operand: 10,
        subtraction_chance: 0.0,
    },
    StageTier {
        time_limit_secs: 10,
        min_operand: 1,
        max_operand: 20,
        subtraction_chance: 0.6,
    },
    StageTier {
        time_limit_secs: 15,
        min_operand: 15,
        max_operand: 40,
        subtraction_chance: 0.6,
    },
];

/// Shape on the wire; converted through `validate` on load
#[derive(Deserialize)]
struct TuningFile {
    win_score: u32,
    stage_span: u32,
    #[serde(default = "default_resolve_delay")]
    resolve_delay_ms: u64,
    #[serde(default = "default_tick_interval")]
    tick_interval_ms: u64,
    tiers: Vec<StageTier>,
}

fn default_resolve_delay() -> u64 {
    RESOLVE_DELAY_MS
}

fn default_tick_interval() -> u64 {
    TICK_INTERVAL_MS
}

/// Game balance table. Always holds at least one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TuningFile")]
pub struct Tuning {
    win_score: u32,
    stage_span: u32,
    resolve_delay_ms: u64,
    tick_interval_ms: u64,
    tiers: Vec<StageTier>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            win_score: WIN_SCORE,
            stage_span: STAGE_SPAN,
            resolve_delay_ms: RESOLVE_DELAY_MS,
            tick_interval_ms: TICK_INTERVAL_MS,
            tiers: DEFAULT_TIERS.to_vec(),
        }
    }
}

impl TryFrom<TuningFile> for Tuning {
    type Error = TuningError;

    fn try_from(file: TuningFile) -> Result<Self, Self::Error> {
        Tuning::new(
            file.win_score,
            file.stage_span,
            file.resolve_delay_ms,
            file.tick_interval_ms,
            file.tiers,
        )
    }
}

impl Tuning {
    /// Build a validated table
    pub fn new(
        win_score: u32,
        stage_span: u32,
        resolve_delay_ms: u64,
        tick_interval_ms: u64,
        tiers: Vec<StageTier>,
    ) -> Result<Self, TuningError> {
        let tuning = Self {
            win_score,
            stage_span,
            resolve_delay_ms,
            tick_interval_ms,
            tiers,
        };
        tuning.validate()?;
        Ok(tuning)
    }

    /// Parse and validate a JSON table
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        log::info!(
            "Loaded tuning: {} stages, win at {}",
            tuning.tiers.len(),
            tuning.win_score
        );
        Ok(tuning)
    }

    fn validate(&self) -> Result<(), TuningError> {
        if self.tiers.is_empty() {
            return Err(TuningError::NoStages);
        }
        if self.stage_span == 0 {
            return Err(TuningError::ZeroStageSpan);
        }
        if self.win_score == 0 {
            return Err(TuningError::ZeroWinScore);
        }
        if self.tick_interval_ms == 0 {
            return Err(TuningError::ZeroTickInterval);
        }

        for (stage, tier) in (1u32..).zip(&self.tiers) {
            if tier.time_limit_secs == 0 {
                return Err(TuningError::ZeroTimeLimit { stage });
            }
            if tier.min_operand == 0 {
                return Err(TuningError::ZeroOperandFloor { stage });
            }
            // A stage with a raised floor relies on its max sitting above it
            if tier.min_operand >= tier.max_operand {
                return Err(TuningError::OperandRange {
                    stage,
                    min: tier.min_operand,
                    max: tier.max_operand,
                });
            }
            // Largest answer plus the widest decoy offset must fit in u32
            let fits = tier
                .max_operand
                .checked_mul(2)
                .and_then(|sum| sum.checked_add(MAX_DECOY_OFFSET))
                .is_some();
            if !fits {
                return Err(TuningError::OperandOverflow {
                    stage,
                    max: tier.max_operand,
                });
            }
            if !(0.0..=1.0).contains(&tier.subtraction_chance) {
                return Err(TuningError::SubtractionChance {
                    stage,
                    chance: tier.subtraction_chance,
                });
            }
        }

        let first = self.tiers[0].subtraction_chance;
        if first != 0.0 {
            return Err(TuningError::FirstStageSubtraction(first));
        }
        Ok(())
    }

    pub fn win_score(&self) -> u32 {
        self.win_score
    }

    pub fn resolve_delay_ms(&self) -> u64 {
        self.resolve_delay_ms
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }

    /// Difficulty tier for a cumulative score
    pub fn resolve_stage(&self, score: u32) -> StageConfig {
        let last = self.tiers.len() - 1;
        let index = ((score / self.stage_span) as usize).min(last);
        let tier = &self.tiers[index];

        StageConfig {
            stage: index as u32 + 1,
            time_limit_secs: tier.time_limit_secs,
            min_operand: tier.min_operand,
            max_operand: tier.max_operand,
            subtraction_chance: tier.subtraction_chance,
        }
    }
}
