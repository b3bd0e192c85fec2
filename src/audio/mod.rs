//! Audio
//!
//! The portable half decides *what* to play: which effect an engine event
//! triggers and which note the background loop is on. `web::AudioManager`
//! plays it through the Web Audio API.

use crate::sim::{GameEvent, LossReason, Outcome};

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Right lane picked - rising chime
    Correct,
    /// Wrong lane or time out - buzz
    Incorrect,
    /// Rocket changed lane
    Whoosh,
}

impl SoundEffect {
    /// Effect an engine event should trigger, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::AnswerChecked { correct: true, .. } => Some(SoundEffect::Correct),
            GameEvent::AnswerChecked { correct: false, .. } => Some(SoundEffect::Incorrect),
            GameEvent::FocusMoved { .. } => Some(SoundEffect::Whoosh),
            GameEvent::GameOver {
                outcome: Outcome::Lose(LossReason::Timeout),
                ..
            } => Some(SoundEffect::Incorrect),
            _ => None,
        }
    }
}

/// One note of the background loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub freq_hz: f32,
    pub duration_secs: f64,
}

/// C4 D4 E4 C4 G4 F4
pub const MELODY: [Note; 6] = [
    Note {
        freq_hz: 261.63,
        duration_secs: 0.4,
    },
    Note {
        freq_hz: 293.66,
        duration_secs: 0.4,
    },
    Note {
        freq_hz: 329.63,
        duration_secs: 0.4,
    },
    Note {
        freq_hz: 261.63,
        duration_secs: 0.4,
    },
    Note {
        freq_hz: 392.00,
        duration_secs: 0.8,
    },
    Note {
        freq_hz: 349.23,
        duration_secs: 0.8,
    },
];

/// Peak gain of a music note before volume scaling
pub const MUSIC_GAIN: f32 = 0.08;

/// Position in the background loop. Start/stop are idempotent.
#[derive(Debug, Clone, Default)]
pub struct MusicSequencer {
    playing: bool,
    index: usize,
}

impl MusicSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if already playing
    pub fn start(&mut self) -> bool {
        if self.playing {
            return false;
        }
        self.playing = true;
        true
    }

    /// Stop and rewind to the first note. Returns false if already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        self.playing = false;
        self.index = 0;
        true
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Take the current note and move on, wrapping at the end of the loop
    pub fn next_note(&mut self) -> Option<Note> {
        if !self.playing {
            return None;
        }
        let note = MELODY[self.index];
        self.index = (self.index + 1) % MELODY.len();
        Some(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::LanePosition;

    #[test]
    fn test_event_sounds() {
        let correct = GameEvent::AnswerChecked {
            lane: LanePosition::Left,
            correct: true,
            score: 1,
        };
        let wrong = GameEvent::AnswerChecked {
            lane: LanePosition::Left,
            correct: false,
            score: 0,
        };
        let timeout = GameEvent::GameOver {
            final_score: 3,
            outcome: Outcome::Lose(LossReason::Timeout),
        };
        let wrong_end = GameEvent::GameOver {
            final_score: 3,
            outcome: Outcome::Lose(LossReason::WrongAnswer),
        };

        assert_eq!(SoundEffect::for_event(&correct), Some(SoundEffect::Correct));
        assert_eq!(SoundEffect::for_event(&wrong), Some(SoundEffect::Incorrect));
        assert_eq!(SoundEffect::for_event(&timeout), Some(SoundEffect::Incorrect));
        // Buzz already played when the lane was checked
        assert_eq!(SoundEffect::for_event(&wrong_end), None);
        assert_eq!(
            SoundEffect::for_event(&GameEvent::FocusMoved {
                lane: LanePosition::Right
            }),
            Some(SoundEffect::Whoosh)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::CountdownTick { remaining: 2 }),
            None
        );
    }

    #[test]
    fn test_sequencer_loops() {
        let mut seq = MusicSequencer::new();
        assert_eq!(seq.next_note(), None);

        assert!(seq.start());
        assert!(!seq.start());
        let notes: Vec<_> = (0..7).filter_map(|_| seq.next_note()).collect();
        assert_eq!(notes.len(), 7);
        assert_eq!(notes[0], MELODY[0]);
        assert_eq!(notes[5], MELODY[5]);
        assert_eq!(notes[6], MELODY[0]);
    }

    #[test]
    fn test_stop_rewinds() {
        let mut seq = MusicSequencer::new();
        seq.start();
        seq.next_note();
        seq.next_note();

        assert!(seq.stop());
        assert!(!seq.stop());
        assert!(!seq.is_playing());

        seq.start();
        assert_eq!(seq.next_note(), Some(MELODY[0]));
    }
}
