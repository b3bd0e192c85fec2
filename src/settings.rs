//! Audio preferences
//!
//! Held in memory for the lifetime of the page; nothing is persisted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Mute toggle from the HUD button
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 1.0,
            muted: false,
        }
    }
}

impl Settings {
    /// Flip mute, returning the new value
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Effective sound effect volume (respects mute)
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Effective music volume (respects mute)
    pub fn effective_music_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_zeroes_volumes() {
        let mut settings = Settings::default();
        assert!(settings.effective_sfx_volume() > 0.0);
        assert!(settings.toggle_mute());
        assert_eq!(settings.effective_sfx_volume(), 0.0);
        assert_eq!(settings.effective_music_volume(), 0.0);
        assert!(!settings.toggle_mute());
        assert!(settings.effective_music_volume() > 0.0);
    }

    #[test]
    fn test_volumes_scale_by_master() {
        let settings = Settings {
            master_volume: 0.5,
            sfx_volume: 0.5,
            music_volume: 1.0,
            muted: false,
        };
        assert_eq!(settings.effective_sfx_volume(), 0.25);
        assert_eq!(settings.effective_music_volume(), 0.5);
    }
}
