//! Game state and round session types
//!
//! `GameState` owns the single in-flight `RoundSession`. Sessions are replaced
//! wholesale at round boundaries; only the engine functions in `tick` mutate
//! them.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::error::SimError;
use super::lanes::{Lane, LanePosition, generate_lanes};
use super::problem::{Problem, problem_for_score};
use super::schedule::{Scheduler, Task, TaskId};
use crate::consts::LANE_COUNT;
use crate::tuning::Tuning;

/// Current phase of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Problem on screen, countdown running
    AwaitingInput,
    /// Lane chosen, waiting out the resolve delay
    Resolving,
    /// Building the next round
    RoundTransition,
    /// Ran out of time or picked a decoy
    Lost,
    /// Reached the win score
    Won,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    Timeout,
    WrongAnswer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Lose(LossReason),
}

impl Outcome {
    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Win)
    }
}

/// Observable transitions, drained by the driver for audio and HUD effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A fresh problem is on screen
    RoundStarted { round: u32, stage: u32, score: u32 },
    /// One second elapsed on the countdown
    CountdownTick { remaining: u32 },
    /// Focus move accepted (fires even when pinned at an edge)
    FocusMoved { lane: LanePosition },
    /// A lane was submitted
    AnswerChecked {
        lane: LanePosition,
        correct: bool,
        score: u32,
    },
    /// Score crossed into a higher stage
    StageAdvanced { stage: u32 },
    /// Terminal; pushed exactly once per session
    GameOver { final_score: u32, outcome: Outcome },
}

/// RNG seed record
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// State of the round in flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSession {
    /// 1-based round counter
    pub round: u32,
    pub score: u32,
    pub problem: Problem,
    pub lanes: [Lane; LANE_COUNT],
    /// Whole seconds left on the countdown
    pub time_remaining: u32,
    pub time_limit: u32,
    /// Set once a lane is chosen; gates further selections and the timeout
    pub is_resolving: bool,
}

impl RoundSession {
    /// Draw a fresh round for `score`
    pub fn begin(
        rng: &mut Pcg32,
        tuning: &Tuning,
        round: u32,
        score: u32,
    ) -> Result<Self, SimError> {
        let config = tuning.resolve_stage(score);
        let problem = problem_for_score(rng, tuning, score);
        let lanes = generate_lanes(rng, problem.answer)?;

        Ok(Self {
            round,
            score,
            problem,
            lanes,
            time_remaining: config.time_limit_secs,
            time_limit: config.time_limit_secs,
            is_resolving: false,
        })
    }

    pub fn lane(&self, position: LanePosition) -> &Lane {
        &self.lanes[position.index()]
    }
}

/// Read-only view handed to the presentation layer after each change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub score: u32,
    pub stage: u32,
    pub problem: Problem,
    pub lanes: [Lane; LANE_COUNT],
    pub time_remaining: u32,
    pub time_limit: u32,
    pub is_resolving: bool,
    pub focused: LanePosition,
    pub phase: GamePhase,
    pub outcome: Option<Outcome>,
}

impl Snapshot {
    /// Fraction of the countdown left, for the timer bar
    pub fn time_fraction(&self) -> f32 {
        if self.time_limit == 0 {
            0.0
        } else {
            self.time_remaining as f32 / self.time_limit as f32
        }
    }
}

/// Complete game state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng_state: RngState,
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,
    pub session: RoundSession,
    pub phase: GamePhase,
    /// Lane a confirm applies to; never touches problem or lane state
    pub focused: LanePosition,
    /// Engine clock (milliseconds since start)
    pub clock_ms: u64,
    pub(crate) scheduler: Scheduler,
    /// Pending countdown tick, if armed
    pub(crate) countdown: Option<TaskId>,
    pub outcome: Option<(u32, Outcome)>,
    pub(crate) events: Vec<GameEvent>,
    /// Bumped on every observable change
    revision: u64,
}

impl GameState {
    /// Start a new game with the built-in tuning
    pub fn new(seed: u64) -> Result<Self, SimError> {
        Self::with_tuning(seed, Tuning::default())
    }

    /// Start a new game with a custom tuning table
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Result<Self, SimError> {
        let rng_state = RngState::new(seed);
        let mut rng = rng_state.to_rng();
        let session = RoundSession::begin(&mut rng, &tuning, 1, 0)?;

        let mut state = Self {
            seed,
            rng_state,
            rng,
            tuning,
            session,
            phase: GamePhase::AwaitingInput,
            focused: LanePosition::Middle,
            clock_ms: 0,
            scheduler: Scheduler::new(),
            countdown: None,
            outcome: None,
            events: Vec::new(),
            revision: 0,
        };
        state.arm_countdown();
        state.announce_round();
        Ok(state)
    }

    /// Current stage number
    pub fn stage(&self) -> u32 {
        self.tuning.resolve_stage(self.session.score).stage
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of pending scheduled tasks
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// Take queued events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            score: self.session.score,
            stage: self.stage(),
            problem: self.session.problem,
            lanes: self.session.lanes,
            time_remaining: self.session.time_remaining,
            time_limit: self.session.time_limit,
            is_resolving: self.session.is_resolving,
            focused: self.focused,
            phase: self.phase,
            outcome: self.outcome.map(|(_, outcome)| outcome),
        }
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
        self.revision += 1;
    }

    pub(crate) fn arm_countdown(&mut self) {
        let due = self.clock_ms + self.tuning.tick_interval_ms();
        self.countdown = Some(self.scheduler.schedule(due, Task::CountdownTick));
    }

    pub(crate) fn announce_round(&mut self) {
        let stage = self.stage();
        log::info!(
            "Round {} (stage {}, score {}): {}",
            self.session.round,
            stage,
            self.session.score,
            self.session.problem
        );
        self.push_event(GameEvent::RoundStarted {
            round: self.session.round,
            stage,
            score: self.session.score,
        });
    }
}
