//! Invariant violations raised by the round engine
//!
//! Timeouts and wrong answers are ordinary phase transitions, not errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid lane selection: {0}")]
    InvalidSelection(String),

    #[error("Could not find distinct decoys for answer {answer} after {attempts} draws")]
    LaneGenerationExhausted { answer: u32, attempts: u32 },
}
