//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects and music - no external files needed!

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use super::{MUSIC_GAIN, MusicSequencer, Note, SoundEffect};
use crate::settings::Settings;

/// Schedule music notes this far ahead of the audio clock
const MUSIC_LOOKAHEAD_SECS: f64 = 0.1;

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    settings: Settings,
    music: MusicSequencer,
    /// Audio-clock time the next music note starts
    next_note_at: f64,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl AudioManager {
    pub fn new(settings: Settings) -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            settings,
            music: MusicSequencer::new(),
            next_note_at: 0.0,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    pub fn is_muted(&self) -> bool {
        self.settings.muted
    }

    /// Flip mute, returning the new value
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.settings.toggle_mute();
        log::info!("Audio {}", if muted { "muted" } else { "unmuted" });
        muted
    }

    /// Start the background loop (no-op if already playing)
    pub fn play_music(&mut self) {
        if self.music.start() {
            self.next_note_at = self.ctx.as_ref().map_or(0.0, |c| c.current_time());
        }
    }

    /// Stop the background loop (no-op if already stopped)
    pub fn stop_music(&mut self) {
        self.music.stop();
    }

    /// Queue music notes that fall inside the lookahead window. Call every frame.
    pub fn update(&mut self) {
        let Some(ctx) = self.ctx.clone() else { return };
        if !self.music.is_playing() {
            return;
        }

        let now = ctx.current_time();
        // Fell behind (tab in background); restart the phrase timing from now
        if self.next_note_at < now {
            self.next_note_at = now;
        }
        while self.next_note_at < now + MUSIC_LOOKAHEAD_SECS {
            let Some(note) = self.music.next_note() else { break };
            self.play_note(&ctx, note, self.next_note_at);
            self.next_note_at += note.duration_secs;
        }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.settings.effective_sfx_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Correct => self.play_correct(ctx, vol),
            SoundEffect::Incorrect => self.play_incorrect(ctx, vol),
            SoundEffect::Whoosh => self.play_whoosh(ctx, vol),
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Music note - soft sine with a decaying tail
    fn play_note(&self, ctx: &AudioContext, note: Note, at: f64) {
        let vol = MUSIC_GAIN * self.settings.effective_music_volume();
        let Some((osc, gain)) = self.create_osc(ctx, note.freq_hz, OscillatorType::Sine) else {
            return;
        };

        // Muted notes still run so the phrase keeps its place
        gain.gain().set_value_at_time(vol.max(0.00001), at).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.00001, at + note.duration_secs - 0.05)
            .ok();

        osc.start_with_when(at).ok();
        osc.stop_with_when(at + note.duration_secs).ok();
    }

    /// Correct answer - rising chime
    fn play_correct(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 440.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.5, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();
        osc.frequency().set_value_at_time(440.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(880.0, t + 0.2)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.25).ok();

        // Bright overtone
        if let Some((osc2, gain2)) = self.create_osc(ctx, 1320.0, OscillatorType::Triangle) {
            gain2.gain().set_value_at_time(vol * 0.15, t).ok();
            gain2
                .gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                .ok();
            osc2.start().ok();
            osc2.stop_with_when(t + 0.2).ok();
        }
    }

    /// Incorrect answer - low buzz
    fn play_incorrect(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 110.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();
        // Rough wobble
        osc.frequency().set_value_at_time(110.0, t).ok();
        osc.frequency().set_value_at_time(95.0, t + 0.05).ok();
        osc.frequency().set_value_at_time(120.0, t + 0.1).ok();
        osc.frequency().set_value_at_time(90.0, t + 0.15).ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.25).ok();
    }

    /// Lane change - quick falling sweep
    fn play_whoosh(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 900.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(0.01, t).ok();
        gain.gain()
            .linear_ramp_to_value_at_time(vol * 0.2, t + 0.03)
            .ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();
        osc.frequency().set_value_at_time(900.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(200.0, t + 0.2)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.22).ok();
    }
}
