//! Input binding
//!
//! Turns raw key names and lane taps into focus moves and submissions. Key
//! input is swallowed while the stage-advanced banner is showing; taps are
//! not, since the lane buttons stay clickable under the banner.

use crate::consts::STAGE_BANNER_MS;
use crate::sim::{self, FocusDirection, GameEvent, GameState, LanePosition, Selection, SimError};

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    MoveFocus(FocusDirection),
    Confirm,
}

/// Map a `KeyboardEvent.key` value onto an action
pub fn action_for_key(key: &str) -> Option<InputAction> {
    match key {
        "ArrowLeft" => Some(InputAction::MoveFocus(FocusDirection::Left)),
        "ArrowRight" => Some(InputAction::MoveFocus(FocusDirection::Right)),
        "ArrowUp" | " " | "Enter" => Some(InputAction::Confirm),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputBinding {
    banner_remaining_ms: u64,
}

impl InputBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch engine events; a stage change starts the banner
    pub fn observe(&mut self, event: &GameEvent) {
        if let GameEvent::StageAdvanced { stage } = event {
            log::debug!("Stage {} banner up", stage);
            self.banner_remaining_ms = STAGE_BANNER_MS;
        }
    }

    pub fn advance(&mut self, dt_ms: u64) {
        self.banner_remaining_ms = self.banner_remaining_ms.saturating_sub(dt_ms);
    }

    pub fn banner_active(&self) -> bool {
        self.banner_remaining_ms > 0
    }

    /// Drop the banner (new game)
    pub fn reset(&mut self) {
        self.banner_remaining_ms = 0;
    }

    /// Apply a key press. Returns the action taken, if any, so the caller
    /// can suppress the browser default.
    pub fn handle_key(
        &mut self,
        state: &mut GameState,
        key: &str,
    ) -> Result<Option<InputAction>, SimError> {
        let Some(action) = action_for_key(key) else {
            return Ok(None);
        };
        if self.banner_active() || state.session.is_resolving {
            return Ok(None);
        }

        match action {
            InputAction::MoveFocus(direction) => {
                sim::move_focus(state, direction);
            }
            InputAction::Confirm => {
                sim::confirm(state)?;
            }
        }
        Ok(Some(action))
    }

    /// A lane was clicked or tapped: focus it, then submit it
    pub fn handle_lane_tap(
        &mut self,
        state: &mut GameState,
        position: LanePosition,
    ) -> Result<Selection, SimError> {
        if !sim::focus_lane(state, position) {
            return Ok(Selection::Ignored);
        }
        sim::submit_selection(state, position)
    }
}
