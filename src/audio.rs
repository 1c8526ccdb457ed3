//! Audio playback seam
//!
//! The game only decides *what* to play and how loud; a backend does the
//! actual output. The native default just logs.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Passed an obstacle
    Score,
    /// Crashed
    Hit,
}

impl SoundEffect {
    /// Asset name the backend should load
    pub fn resource(&self) -> &'static str {
        match self {
            SoundEffect::Score => "score.mp3",
            SoundEffect::Hit => "hit.mp3",
        }
    }
}

/// Looping music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicTrack {
    Background,
}

impl MusicTrack {
    pub fn resource(&self) -> &'static str {
        match self {
            MusicTrack::Background => "music.m4a",
        }
    }
}

/// Something that can actually make noise
pub trait AudioBackend {
    /// Start a looping track, replacing the current one
    fn play_music(&mut self, track: MusicTrack, volume: f32);
    fn stop_music(&mut self);
    /// Fire-and-forget effect
    fn play_effect(&mut self, effect: SoundEffect, volume: f32);
}

/// Backend that only logs what would be played
#[derive(Debug, Clone, Copy, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn play_music(&mut self, track: MusicTrack, volume: f32) {
        log::debug!("music: {} (looping, volume {:.2})", track.resource(), volume);
    }

    fn stop_music(&mut self) {
        log::debug!("music stopped");
    }

    fn play_effect(&mut self, effect: SoundEffect, volume: f32) {
        log::debug!("sfx: {} (volume {:.2})", effect.resource(), volume);
    }
}

/// Audio manager for the game
#[derive(Debug)]
pub struct AudioManager<B: AudioBackend = LogBackend> {
    backend: B,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
    music: Option<MusicTrack>,
}

impl<B: AudioBackend> AudioManager<B> {
    pub fn new(backend: B) -> Self {
        Self::from_settings(backend, &Settings::default())
    }

    pub fn from_settings(backend: B, settings: &Settings) -> Self {
        Self {
            backend,
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            music_volume: settings.music_volume.clamp(0.0, 1.0),
            muted: settings.muted,
            music: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
        self.refresh_music();
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
        self.refresh_music();
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.refresh_music();
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Track that should currently be looping
    pub fn current_music(&self) -> Option<MusicTrack> {
        self.music
    }

    fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    fn effective_music_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_sfx_volume();
        if vol <= 0.0 {
            return;
        }
        self.backend.play_effect(effect, vol);
    }

    /// Start looping a track (remembered across mute toggles)
    pub fn play_music(&mut self, track: MusicTrack) {
        self.music = Some(track);
        self.refresh_music();
    }

    pub fn stop_music(&mut self) {
        if self.music.take().is_some() {
            self.backend.stop_music();
        }
    }

    /// Restart the current track at the effective volume, or silence it
    fn refresh_music(&mut self) {
        let Some(track) = self.music else { return };
        let vol = self.effective_music_volume();
        if vol <= 0.0 {
            self.backend.stop_music();
        } else {
            self.backend.play_music(track, vol);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        effects: Vec<(SoundEffect, f32)>,
        music: Vec<(MusicTrack, f32)>,
        stops: u32,
    }

    impl AudioBackend for Recorder {
        fn play_music(&mut self, track: MusicTrack, volume: f32) {
            self.music.push((track, volume));
        }

        fn stop_music(&mut self) {
            self.stops += 1;
        }

        fn play_effect(&mut self, effect: SoundEffect, volume: f32) {
            self.effects.push((effect, volume));
        }
    }

    #[test]
    fn test_effect_volume_scales() {
        let settings = Settings {
            master_volume: 0.5,
            sfx_volume: 0.5,
            ..Settings::default()
        };
        let mut audio = AudioManager::from_settings(Recorder::default(), &settings);
        audio.play(SoundEffect::Score);
        assert_eq!(audio.backend().effects, vec![(SoundEffect::Score, 0.25)]);
    }

    #[test]
    fn test_muted_skips_playback() {
        let mut audio = AudioManager::new(Recorder::default());
        audio.play_music(MusicTrack::Background);
        audio.set_muted(true);
        audio.play(SoundEffect::Hit);

        assert!(audio.backend().effects.is_empty());
        assert_eq!(audio.backend().music.len(), 1);
        assert_eq!(audio.backend().stops, 1);

        // Unmuting resumes the remembered track
        audio.set_muted(false);
        assert_eq!(audio.backend().music.len(), 2);
        assert_eq!(audio.current_music(), Some(MusicTrack::Background));
    }

    #[test]
    fn test_stop_music_only_once() {
        let mut audio = AudioManager::new(Recorder::default());
        audio.stop_music();
        assert_eq!(audio.backend().stops, 0);
        audio.play_music(MusicTrack::Background);
        audio.stop_music();
        audio.stop_music();
        assert_eq!(audio.backend().stops, 1);
        assert_eq!(audio.current_music(), None);
    }

    #[test]
    fn test_volumes_are_clamped() {
        let mut audio = AudioManager::new(Recorder::default());
        audio.set_master_volume(3.0);
        audio.set_sfx_volume(-1.0);
        audio.play(SoundEffect::Score);
        assert!(audio.backend().effects.is_empty());

        audio.set_sfx_volume(1.0);
        audio.play(SoundEffect::Score);
        assert_eq!(audio.backend().effects, vec![(SoundEffect::Score, 1.0)]);
    }
}
