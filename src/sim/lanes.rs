//! Answer lanes
//!
//! Three fixed positions, one carrying the correct answer and two carrying
//! nearby decoys.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::error::SimError;
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanePosition {
    Left,
    Middle,
    Right,
}

/// Direction of a focus move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDirection {
    Left,
    Right,
}

impl LanePosition {
    /// All positions, left to right
    pub const ALL: [LanePosition; LANE_COUNT] =
        [LanePosition::Left, LanePosition::Middle, LanePosition::Right];

    pub fn index(&self) -> usize {
        match self {
            LanePosition::Left => 0,
            LanePosition::Middle => 1,
            LanePosition::Right => 2,
        }
    }

    pub fn from_index(index: usize) -> Result<Self, SimError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| SimError::InvalidSelection(format!("lane index {index}")))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LanePosition::Left => "left",
            LanePosition::Middle => "middle",
            LanePosition::Right => "right",
        }
    }

    /// Neighbouring lane in a direction, staying put at the edges
    pub fn step(self, direction: FocusDirection) -> Self {
        match (self, direction) {
            (LanePosition::Right, FocusDirection::Left) => LanePosition::Middle,
            (_, FocusDirection::Left) => LanePosition::Left,
            (LanePosition::Left, FocusDirection::Right) => LanePosition::Middle,
            (_, FocusDirection::Right) => LanePosition::Right,
        }
    }
}

impl fmt::Display for LanePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanePosition {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(LanePosition::Left),
            "middle" | "center" => Ok(LanePosition::Middle),
            "right" => Ok(LanePosition::Right),
            _ => Err(SimError::InvalidSelection(s.to_string())),
        }
    }
}

/// Visual verdict of a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneState {
    #[default]
    Default,
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    pub position: LanePosition,
    pub value: u32,
    pub state: LaneState,
}

/// Build three lanes around the correct answer.
///
/// Decoys are `answer ± [1, MAX_DECOY_OFFSET]`, clamped at zero. Values are
/// collected in draw order so a seeded RNG replays exactly, then shuffled
/// across the positions.
pub fn generate_lanes<R: Rng + ?Sized>(
    rng: &mut R,
    answer: u32,
) -> Result<[Lane; LANE_COUNT], SimError> {
    let mut values = Vec::with_capacity(LANE_COUNT);
    values.push(answer);

    let mut attempts = 0;
    while values.len() < LANE_COUNT {
        if attempts == MAX_DECOY_ATTEMPTS {
            return Err(SimError::LaneGenerationExhausted { answer, attempts });
        }
        attempts += 1;

        let offset = rng.random_range(1..=MAX_DECOY_OFFSET);
        let decoy = if rng.random_bool(0.5) {
            answer + offset
        } else {
            answer.saturating_sub(offset)
        };
        if !values.contains(&decoy) {
            values.push(decoy);
        }
    }

    values.shuffle(rng);

    Ok(LanePosition::ALL.map(|position| Lane {
        position,
        value: values[position.index()],
        state: LaneState::Default,
    }))
}
