//! Deterministic round engine
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Integer millisecond clock driven by the caller
//! - Seeded RNG only
//! - Scheduled tasks fire in deadline order, ties in scheduling order
//! - No rendering, audio or platform dependencies

pub mod error;
pub mod lanes;
pub mod problem;
pub mod schedule;
pub mod stage;
pub mod state;
pub mod tick;

pub use error::SimError;
pub use lanes::{FocusDirection, Lane, LanePosition, LaneState, generate_lanes};
pub use problem::{Operator, Problem, generate_problem, problem_for_score};
pub use schedule::{Scheduler, Task, TaskId};
pub use stage::{StageConfig, resolve_stage};
pub use state::{
    GameEvent, GamePhase, GameState, LossReason, Outcome, RngState, RoundSession, Snapshot,
};
pub use tick::{Selection, advance, confirm, focus_lane, move_focus, restart, submit_selection};
