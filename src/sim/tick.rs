//! Round engine transitions
//!
//! Every function here takes the state, applies one input or one slice of
//! time, and leaves it in a consistent phase. Terminal phases ignore all
//! further input.

use super::error::SimError;
use super::lanes::{FocusDirection, LanePosition, LaneState};
use super::schedule::Task;
use super::state::{GameEvent, GamePhase, GameState, LossReason, Outcome, RoundSession};

/// Result of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Not accepting input (resolving, between rounds or game over)
    Ignored,
    Correct { score: u32 },
    Incorrect,
}

/// Advance the engine clock by `dt_ms`, firing every task that falls due
pub fn advance(state: &mut GameState, dt_ms: u64) -> Result<(), SimError> {
    let target = state.clock_ms.saturating_add(dt_ms);

    while let Some((due, task)) = state.scheduler.pop_due(target) {
        state.clock_ms = due;
        match task {
            Task::CountdownTick => {
                state.countdown = None;
                countdown_tick(state);
            }
            Task::ResolveRound { correct } => resolve_round(state, correct)?,
        }
    }

    state.clock_ms = target;
    Ok(())
}

/// Submit a lane for the current problem. At most one submission per round
/// is accepted; the rest return `Selection::Ignored`.
pub fn submit_selection(
    state: &mut GameState,
    position: LanePosition,
) -> Result<Selection, SimError> {
    if state.phase != GamePhase::AwaitingInput || state.session.is_resolving {
        log::debug!("Selection of {} ignored in {:?}", position, state.phase);
        return Ok(Selection::Ignored);
    }

    let answer = state.session.problem.answer;
    let lane = state
        .session
        .lanes
        .iter_mut()
        .find(|l| l.position == position)
        .ok_or_else(|| SimError::InvalidSelection(position.to_string()))?;

    let correct = lane.value == answer;
    lane.state = if correct {
        LaneState::Correct
    } else {
        LaneState::Incorrect
    };

    state.session.is_resolving = true;
    state.phase = GamePhase::Resolving;
    if let Some(id) = state.countdown.take() {
        state.scheduler.cancel(id);
    }

    let prev_stage = state.stage();
    if correct {
        state.session.score += 1;
    }
    let score = state.session.score;

    state.push_event(GameEvent::AnswerChecked {
        lane: position,
        correct,
        score,
    });

    let stage = state.stage();
    if stage > prev_stage {
        log::info!("Stage advanced to {} at score {}", stage, score);
        state.push_event(GameEvent::StageAdvanced { stage });
    }

    let due = state.clock_ms + state.tuning.resolve_delay_ms();
    state.scheduler.schedule(due, Task::ResolveRound { correct });

    Ok(if correct {
        Selection::Correct { score }
    } else {
        Selection::Incorrect
    })
}

/// Move the focused lane one step. Returns false when input is not accepted.
pub fn move_focus(state: &mut GameState, direction: FocusDirection) -> bool {
    let target = state.focused.step(direction);
    focus_lane(state, target)
}

/// Focus a lane directly (pointer/touch)
pub fn focus_lane(state: &mut GameState, position: LanePosition) -> bool {
    if state.phase != GamePhase::AwaitingInput {
        return false;
    }
    state.focused = position;
    log::debug!("Focus on {}", position);
    state.push_event(GameEvent::FocusMoved { lane: position });
    true
}

/// Submit the focused lane
pub fn confirm(state: &mut GameState) -> Result<Selection, SimError> {
    let focused = state.focused;
    submit_selection(state, focused)
}

/// Throw away the session and start over. Pending tasks go with it.
pub fn restart(state: &mut GameState, seed: u64) -> Result<(), SimError> {
    let tuning = state.tuning.clone();
    *state = GameState::with_tuning(seed, tuning)?;
    log::info!("Game restarted with seed: {}", seed);
    Ok(())
}

fn countdown_tick(state: &mut GameState) {
    if state.phase != GamePhase::AwaitingInput || state.session.is_resolving {
        return;
    }

    state.session.time_remaining = state.session.time_remaining.saturating_sub(1);
    let remaining = state.session.time_remaining;
    log::debug!("Countdown: {}s left", remaining);
    state.push_event(GameEvent::CountdownTick { remaining });

    if remaining == 0 {
        let score = state.session.score;
        end_game(state, score, Outcome::Lose(LossReason::Timeout));
    } else {
        state.arm_countdown();
    }
}

fn resolve_round(state: &mut GameState, correct: bool) -> Result<(), SimError> {
    if state.phase != GamePhase::Resolving {
        return Ok(());
    }

    // Read the score now; it was already bumped at selection time
    let score = state.session.score;

    if !correct {
        end_game(state, score, Outcome::Lose(LossReason::WrongAnswer));
        return Ok(());
    }

    if score >= state.tuning.win_score() {
        end_game(state, score, Outcome::Win);
        return Ok(());
    }

    state.phase = GamePhase::RoundTransition;
    let round = state.session.round + 1;
    state.session = RoundSession::begin(&mut state.rng, &state.tuning, round, score)?;
    state.phase = GamePhase::AwaitingInput;
    state.arm_countdown();
    state.announce_round();
    Ok(())
}

fn end_game(state: &mut GameState, final_score: u32, outcome: Outcome) {
    state.scheduler.cancel_all();
    state.countdown = None;
    state.phase = if outcome.is_win() {
        GamePhase::Won
    } else {
        GamePhase::Lost
    };
    state.outcome = Some((final_score, outcome));
    log::info!("Game over: {:?} with score {}", outcome, final_score);
    state.push_event(GameEvent::GameOver {
        final_score,
        outcome,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::{Lane, Operator, Problem};

    fn correct_lane(state: &GameState) -> LanePosition {
        let answer = state.session.problem.answer;
        state
            .session
            .lanes
            .iter()
            .find(|l| l.value == answer)
            .map(|l| l.position)
            .unwrap()
    }

    fn wrong_lane(state: &GameState) -> LanePosition {
        let answer = state.session.problem.answer;
        state
            .session
            .lanes
            .iter()
            .find(|l| l.value != answer)
            .map(|l| l.position)
            .unwrap()
    }

    /// Put the session at `score` with a fresh problem for that stage
    fn state_at_score(seed: u64, score: u32) -> GameState {
        let mut state = GameState::new(seed).unwrap();
        state.session = RoundSession::begin(&mut state.rng, &state.tuning, 1, score).unwrap();
        state.scheduler.cancel_all();
        state.countdown = None;
        state.arm_countdown();
        state.drain_events();
        state
    }

    fn answer_correctly(state: &mut GameState) {
        let lane = correct_lane(state);
        let result = submit_selection(state, lane).unwrap();
        assert!(matches!(result, Selection::Correct { .. }));
        advance(state, RESOLVE_DELAY_MS).unwrap();
    }

    fn game_overs(events: &[GameEvent]) -> Vec<(u32, Outcome)> {
        events
            .iter()
            .filter_map(|e| match *e {
                GameEvent::GameOver {
                    final_score,
                    outcome,
                } => Some((final_score, outcome)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_initial_state() {
        let mut state = GameState::new(1).unwrap();
        assert_eq!(state.phase, GamePhase::AwaitingInput);
        assert_eq!(state.session.score, 0);
        assert_eq!(state.session.time_remaining, 5);
        assert_eq!(state.session.time_limit, 5);
        assert_eq!(state.focused, LanePosition::Middle);
        assert!(!state.session.is_resolving);
        assert_eq!(state.pending_tasks(), 1);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::RoundStarted {
                round: 1,
                stage: 1,
                score: 0
            }]
        );
    }

    #[test]
    fn test_countdown_ticks_once_per_second() {
        let mut state = GameState::new(2).unwrap();
        state.drain_events();

        advance(&mut state, 999).unwrap();
        assert_eq!(state.session.time_remaining, 5);
        advance(&mut state, 1).unwrap();
        assert_eq!(state.session.time_remaining, 4);
        advance(&mut state, 2500).unwrap();
        assert_eq!(state.session.time_remaining, 2);
        assert_eq!(
            state.drain_events(),
            vec![
                GameEvent::CountdownTick { remaining: 4 },
                GameEvent::CountdownTick { remaining: 3 },
                GameEvent::CountdownTick { remaining: 2 },
            ]
        );
    }

    #[test]
    fn test_scenario_a_ten_correct_answers_reach_stage_two() {
        let mut state = GameState::new(10).unwrap();
        let mut events = state.drain_events();

        for _ in 0..10 {
            answer_correctly(&mut state);
            events.extend(state.drain_events());
        }

        assert_eq!(state.session.score, 10);
        assert_eq!(state.phase, GamePhase::AwaitingInput);
        assert_eq!(state.stage(), 2);
        assert_eq!(state.session.time_limit, 10);
        let advanced: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, GameEvent::StageAdvanced { .. }))
            .collect();
        assert_eq!(advanced, vec![&GameEvent::StageAdvanced { stage: 2 }]);
    }

    #[test]
    fn test_scenario_b_timeout_loses_once() {
        let mut state = state_at_score(20, 5);

        advance(&mut state, 4 * TICK_INTERVAL_MS).unwrap();
        assert_eq!(state.phase, GamePhase::AwaitingInput);
        advance(&mut state, TICK_INTERVAL_MS).unwrap();
        assert_eq!(state.phase, GamePhase::Lost);
        // More time passing must not report again
        advance(&mut state, 10 * TICK_INTERVAL_MS).unwrap();

        let events = state.drain_events();
        assert_eq!(
            game_overs(&events),
            vec![(5, Outcome::Lose(LossReason::Timeout))]
        );
        assert_eq!(state.outcome, Some((5, Outcome::Lose(LossReason::Timeout))));
        assert_eq!(state.pending_tasks(), 0);
    }

    #[test]
    fn test_scenario_c_win_at_thirty() {
        let mut state = state_at_score(30, 29);
        answer_correctly(&mut state);

        assert_eq!(state.phase, GamePhase::Won);
        assert_eq!(state.session.score, 30);
        let events = state.drain_events();
        assert_eq!(game_overs(&events), vec![(30, Outcome::Win)]);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, GameEvent::RoundStarted { .. }))
        );
        assert_eq!(state.pending_tasks(), 0);
    }

    #[test]
    fn test_scenario_d_known_problem() {
        let mut state = GameState::new(40).unwrap();
        state.session.problem = Problem::new(3, 7, Operator::Add);
        state.session.lanes = [
            Lane {
                position: LanePosition::Left,
                value: 8,
                state: LaneState::Default,
            },
            Lane {
                position: LanePosition::Middle,
                value: 13,
                state: LaneState::Default,
            },
            Lane {
                position: LanePosition::Right,
                value: 10,
                state: LaneState::Default,
            },
        ];

        let result = submit_selection(&mut state, LanePosition::Right).unwrap();
        assert_eq!(result, Selection::Correct { score: 1 });
        assert_eq!(state.session.lane(LanePosition::Right).state, LaneState::Correct);
        assert_eq!(state.session.lane(LanePosition::Left).state, LaneState::Default);
        assert_eq!(state.session.lane(LanePosition::Middle).state, LaneState::Default);
        assert_eq!(state.session.score, 1);
        assert_eq!(state.phase, GamePhase::Resolving);
    }

    #[test]
    fn test_wrong_answer_loses_without_increment() {
        let mut state = state_at_score(50, 7);
        let lane = wrong_lane(&state);
        assert_eq!(submit_selection(&mut state, lane).unwrap(), Selection::Incorrect);
        assert_eq!(state.session.lane(lane).state, LaneState::Incorrect);
        assert_eq!(state.session.score, 7);

        advance(&mut state, RESOLVE_DELAY_MS - 1).unwrap();
        assert_eq!(state.phase, GamePhase::Resolving);
        advance(&mut state, 1).unwrap();
        assert_eq!(state.phase, GamePhase::Lost);
        assert_eq!(
            state.outcome,
            Some((7, Outcome::Lose(LossReason::WrongAnswer)))
        );
    }

    #[test]
    fn test_second_selection_is_ignored() {
        let mut state = GameState::new(60).unwrap();
        let right = correct_lane(&state);
        let wrong = wrong_lane(&state);

        submit_selection(&mut state, right).unwrap();
        let lanes = state.session.lanes;
        let score = state.session.score;

        assert_eq!(submit_selection(&mut state, wrong).unwrap(), Selection::Ignored);
        assert_eq!(submit_selection(&mut state, right).unwrap(), Selection::Ignored);
        assert_eq!(state.session.lanes, lanes);
        assert_eq!(state.session.score, score);
    }

    #[test]
    fn test_no_timeout_after_selection() {
        let mut state = GameState::new(70).unwrap();
        // Answer with a sliver of time left, then let far more than the limit pass
        advance(&mut state, 4 * TICK_INTERVAL_MS + 900).unwrap();
        let lane = correct_lane(&state);
        submit_selection(&mut state, lane).unwrap();
        advance(&mut state, 200).unwrap();
        assert_eq!(state.phase, GamePhase::Resolving);

        advance(&mut state, RESOLVE_DELAY_MS).unwrap();
        assert_eq!(state.phase, GamePhase::AwaitingInput);
        assert_eq!(state.session.round, 2);
        assert_eq!(state.session.time_remaining, state.session.time_limit);
        assert!(state.outcome.is_none());
    }

    #[test]
    fn test_next_round_resets_lanes_and_timer() {
        let mut state = state_at_score(80, 12);
        advance(&mut state, 3 * TICK_INTERVAL_MS).unwrap();
        answer_correctly(&mut state);

        assert_eq!(state.session.score, 13);
        assert_eq!(state.session.time_remaining, 10);
        assert!(!state.session.is_resolving);
        assert!(
            state
                .session
                .lanes
                .iter()
                .all(|l| l.state == LaneState::Default)
        );
        // Countdown runs from the moment the round started
        advance(&mut state, TICK_INTERVAL_MS).unwrap();
        assert_eq!(state.session.time_remaining, 9);
    }

    #[test]
    fn test_focus_moves_without_touching_round() {
        let mut state = GameState::new(90).unwrap();
        let session = state.session.clone();

        assert!(move_focus(&mut state, FocusDirection::Left));
        assert_eq!(state.focused, LanePosition::Left);
        assert!(move_focus(&mut state, FocusDirection::Left));
        assert_eq!(state.focused, LanePosition::Left);
        assert!(move_focus(&mut state, FocusDirection::Right));
        assert_eq!(state.focused, LanePosition::Middle);
        assert_eq!(state.session, session);

        state.focused = correct_lane(&state);
        assert!(matches!(confirm(&mut state).unwrap(), Selection::Correct { .. }));
        assert!(!move_focus(&mut state, FocusDirection::Right));
    }

    #[test]
    fn test_terminal_state_ignores_input() {
        let mut state = GameState::new(100).unwrap();
        advance(&mut state, 5 * TICK_INTERVAL_MS).unwrap();
        assert_eq!(state.phase, GamePhase::Lost);

        let lane = correct_lane(&state);
        assert_eq!(submit_selection(&mut state, lane).unwrap(), Selection::Ignored);
        assert!(!focus_lane(&mut state, LanePosition::Left));
        assert_eq!(state.session.score, 0);
    }

    #[test]
    fn test_restart_cancels_pending_resolution() {
        let mut state = GameState::new(110).unwrap();
        let lane = wrong_lane(&state);
        submit_selection(&mut state, lane).unwrap();

        restart(&mut state, 111).unwrap();
        assert_eq!(state.seed, 111);
        assert_eq!(state.phase, GamePhase::AwaitingInput);
        assert_eq!(state.clock_ms, 0);

        advance(&mut state, RESOLVE_DELAY_MS).unwrap();
        assert_eq!(state.phase, GamePhase::AwaitingInput);
        assert!(state.outcome.is_none());
        assert_eq!(state.session.time_remaining, 4);
    }

    #[test]
    fn test_large_step_fires_everything_in_order() {
        let mut state = GameState::new(120).unwrap();
        let lane = correct_lane(&state);
        submit_selection(&mut state, lane).unwrap();
        state.drain_events();

        // One big step: resolve, start round 2, then run its countdown out
        advance(&mut state, 60_000).unwrap();
        let events = state.drain_events();
        assert!(matches!(events.first(), Some(GameEvent::RoundStarted { round: 2, .. })));
        assert_eq!(
            game_overs(&events),
            vec![(1, Outcome::Lose(LossReason::Timeout))]
        );
        assert_eq!(state.clock_ms, 60_000);
    }

    #[test]
    fn test_determinism() {
        let play = |seed: u64| {
            let mut state = GameState::new(seed).unwrap();
            let mut problems = Vec::new();
            for _ in 0..15 {
                problems.push(state.session.problem);
                advance(&mut state, 700).unwrap();
                answer_correctly(&mut state);
            }
            (problems, state.session.clone())
        };

        assert_eq!(play(99999), play(99999));
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut state = GameState::new(130).unwrap();
        let before = state.revision();
        let lane = correct_lane(&state);
        submit_selection(&mut state, lane).unwrap();
        assert!(state.revision() > before);

        let snap = state.snapshot();
        assert_eq!(snap.score, 1);
        assert_eq!(snap.stage, 1);
        assert!(snap.is_resolving);
        assert_eq!(snap.phase, GamePhase::Resolving);
        assert_eq!(snap.time_fraction(), 1.0);
        assert!(serde_json::to_string(&snap).is_ok());
    }

    #[test]
    fn test_stage_three_advance() {
        let mut state = GameState::new(140).unwrap();
        state.drain_events();
        let mut advanced = Vec::new();

        for _ in 0..29 {
            answer_correctly(&mut state);
            advanced.extend(
                state
                    .drain_events()
                    .into_iter()
                    .filter(|e| matches!(e, GameEvent::StageAdvanced { .. })),
            );
        }

        assert_eq!(state.session.score, 29);
        assert_eq!(state.stage(), 3);
        assert_eq!(state.session.time_limit, 15);
        assert_eq!(
            advanced,
            vec![
                GameEvent::StageAdvanced { stage: 2 },
                GameEvent::StageAdvanced { stage: 3 },
            ]
        );

        // The winning answer stays in stage 3
        let lane = correct_lane(&state);
        submit_selection(&mut state, lane).unwrap();
        assert!(
            !state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::StageAdvanced { .. }))
        );
    }

    #[test]
    fn test_selection_cancels_only_the_countdown() {
        let mut state = GameState::new(150).unwrap();
        assert!(state.countdown.is_some());

        let lane = correct_lane(&state);
        submit_selection(&mut state, lane).unwrap();
        assert!(state.countdown.is_none());
        assert_eq!(state.pending_tasks(), 1);

        advance(&mut state, RESOLVE_DELAY_MS).unwrap();
        assert!(state.countdown.is_some());
        assert_eq!(state.pending_tasks(), 1);
    }
}
