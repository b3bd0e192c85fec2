//! Cosmic Math - a three-lane rocket arithmetic game
//!
//! Core modules:
//! - `sim`: Deterministic round engine (stages, problems, lanes, timers)
//! - `tuning`: Data-driven stage table
//! - `input`: Key/tap binding onto lane focus and submission
//! - `audio`: Sound effect mapping, music loop and Web Audio playback
//! - `settings`: In-memory audio preferences

pub mod audio;
pub mod input;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use input::{InputAction, InputBinding};
pub use settings::Settings;
pub use tuning::{StageTier, Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Score that ends the game with a win
    pub const WIN_SCORE: u32 = 30;
    /// Points per stage (stage = score / span + 1)
    pub const STAGE_SPAN: u32 = 10;

    /// Countdown tick interval (one second)
    pub const TICK_INTERVAL_MS: u64 = 1000;
    /// Delay between an answer and the round outcome
    pub const RESOLVE_DELAY_MS: u64 = 1500;
    /// How long the stage-advanced banner swallows key input
    pub const STAGE_BANNER_MS: u64 = 2500;

    /// Number of answer lanes
    pub const LANE_COUNT: usize = 3;
    /// Decoys sit at most this far from the correct answer
    pub const MAX_DECOY_OFFSET: u32 = 5;
    /// Decoy draws before lane generation gives up
    pub const MAX_DECOY_ATTEMPTS: u32 = 64;
}
