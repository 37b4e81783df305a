use std::collections::{HashMap, HashSet};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::MusicConfig;

/// Closed set of background music tracks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicTrack {
    Intro,
    InGame,
    Win,
}

impl MusicTrack {
    pub const ALL: [MusicTrack; 3] = [MusicTrack::Intro, MusicTrack::InGame, MusicTrack::Win];

    pub fn looping(self) -> bool {
        self != MusicTrack::Win
    }

    pub fn asset_key(self) -> &'static str {
        match self {
            MusicTrack::Intro => "music:intro",
            MusicTrack::InGame => "music:ingame",
            MusicTrack::Win => "music:win",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sfx {
    Hit,
    BossAttack,
    Super,
}

#[derive(Clone, Copy, Debug)]
pub struct SfxProfile {
    pub volume: f32,
    pub duck: bool,
    pub stop_previous: bool,
    pub fade_out_after_ms: Option<f64>,
    pub fade_out_ms: f64,
}

impl Sfx {
    pub fn asset_key(self) -> &'static str {
        match self {
            Sfx::Hit => "sfx:hit",
            Sfx::BossAttack => "sfx:boss_attack",
            Sfx::Super => "sfx:super",
        }
    }

    pub fn profile(self) -> SfxProfile {
        match self {
            Sfx::Hit => SfxProfile {
                volume: 1.0,
                duck: true,
                stop_previous: false,
                fade_out_after_ms: None,
                fade_out_ms: 220.0,
            },
            // Spammed by the boss: restart instead of stacking, and tail off early.
            Sfx::BossAttack => SfxProfile {
                volume: 0.9,
                duck: true,
                stop_previous: true,
                fade_out_after_ms: Some(450.0),
                fade_out_ms: 220.0,
            },
            Sfx::Super => SfxProfile {
                volume: 1.0,
                duck: true,
                stop_previous: false,
                fade_out_after_ms: None,
                fade_out_ms: 220.0,
            },
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Easing {
    Linear,
    SineInOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::SineInOut => 0.5 - 0.5 * (std::f32::consts::PI * t).cos(),
        }
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Session-wide music volume. Mutated only through explicit set calls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioSessionConfig {
    base_volume: f32,
}

impl AudioSessionConfig {
    pub fn new(base_volume: f32) -> Self {
        Self {
            base_volume: base_volume.clamp(0.0, 1.0),
        }
    }

    pub fn base_volume(&self) -> f32 {
        self.base_volume
    }

    pub fn set_base_volume(&mut self, volume: f32) -> f32 {
        self.base_volume = volume.clamp(0.0, 1.0);
        self.base_volume
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DuckParams {
    pub floor: f32,
    pub attack_ms: f64,
    pub hold_ms: f64,
    pub release_ms: f64,
}

impl From<&MusicConfig> for DuckParams {
    fn from(cfg: &MusicConfig) -> Self {
        Self {
            floor: cfg.duck_floor,
            attack_ms: cfg.duck_attack_ms,
            hold_ms: cfg.duck_hold_ms,
            release_ms: cfg.duck_release_ms,
        }
    }
}

/// Attack → hold → release volume dip, evaluated purely from elapsed time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DuckEnvelope {
    pub started_at_ms: f64,
    pub from: f32,
    pub floor: f32,
    pub base: f32,
    pub attack_ms: f64,
    pub hold_ms: f64,
    pub release_ms: f64,
}

impl DuckEnvelope {
    pub fn total_ms(&self) -> f64 {
        self.attack_ms + self.hold_ms + self.release_ms
    }

    pub fn volume_at(&self, now_ms: f64) -> f32 {
        let t = (now_ms - self.started_at_ms).max(0.0);
        let hold_end = self.attack_ms + self.hold_ms;
        if t < self.attack_ms {
            lerp(self.from, self.floor, (t / self.attack_ms) as f32)
        } else if t < hold_end {
            self.floor
        } else if t < hold_end + self.release_ms {
            lerp(self.floor, self.base, ((t - hold_end) / self.release_ms) as f32)
        } else {
            self.base
        }
    }

    pub fn is_finished(&self, now_ms: f64) -> bool {
        now_ms - self.started_at_ms >= self.total_ms()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct FadeRamp {
    started_at_ms: f64,
    from: f32,
    to: f32,
    duration_ms: f64,
    easing: Easing,
}

impl FadeRamp {
    fn volume_at(&self, now_ms: f64) -> f32 {
        if self.duration_ms <= 0.0 {
            return self.to;
        }
        let t = ((now_ms - self.started_at_ms) / self.duration_ms) as f32;
        lerp(self.from, self.to, self.easing.apply(t))
    }

    fn is_finished(&self, now_ms: f64) -> bool {
        now_ms - self.started_at_ms >= self.duration_ms
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum VolumeEnvelope {
    Duck(DuckEnvelope),
    Fade(FadeRamp),
}

impl VolumeEnvelope {
    fn volume_at(&self, now_ms: f64) -> f32 {
        match self {
            Self::Duck(d) => d.volume_at(now_ms),
            Self::Fade(f) => f.volume_at(now_ms),
        }
    }

    fn is_finished(&self, now_ms: f64) -> bool {
        match self {
            Self::Duck(d) => d.is_finished(now_ms),
            Self::Fade(f) => f.is_finished(now_ms),
        }
    }
}

/// What the audio-output collaborator should do.
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AudioCommand {
    TrackStarted {
        track: MusicTrack,
        looping: bool,
    },
    TrackStopped {
        track: MusicTrack,
    },
    TrackVolume {
        track: MusicTrack,
        volume: f32,
    },
    SfxPlayed {
        sfx: Sfx,
        volume: f32,
        stop_previous: bool,
        fade_out_after_ms: Option<f64>,
        fade_out_ms: f64,
    },
}

#[derive(Default)]
struct TrackState {
    playing: bool,
    volume: f32,
    envelope: Option<VolumeEnvelope>,
    reported: Option<f32>,
}

impl TrackState {
    fn volume_at(&self, now_ms: f64) -> f32 {
        self.envelope
            .map(|e| e.volume_at(now_ms))
            .unwrap_or(self.volume)
    }
}

const VOLUME_EPSILON: f32 = 1e-4;

/// Music volume control: one envelope per track, never louder than the session base.
pub struct MusicMixer {
    session: AudioSessionConfig,
    duck: DuckParams,
    fade_in_ms: f64,
    available: HashSet<MusicTrack>,
    tracks: HashMap<MusicTrack, TrackState>,
    pending: Vec<AudioCommand>,
}

impl MusicMixer {
    pub fn new(session: AudioSessionConfig, cfg: &MusicConfig) -> Self {
        Self {
            session,
            duck: DuckParams::from(cfg),
            fade_in_ms: cfg.fade_in_ms,
            available: cfg.available_tracks.iter().copied().collect(),
            tracks: HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub fn session(&self) -> AudioSessionConfig {
        self.session
    }

    pub fn base_volume(&self) -> f32 {
        self.session.base_volume()
    }

    pub fn fade_in_ms(&self) -> f64 {
        self.fade_in_ms
    }

    pub fn is_playing(&self, track: MusicTrack) -> bool {
        self.tracks.get(&track).is_some_and(|s| s.playing)
    }

    /// Volume as of the last `tick` (or the last explicit change).
    pub fn volume(&self, track: MusicTrack) -> Option<f32> {
        self.tracks.get(&track).map(|s| s.volume)
    }

    /// Starts `track` and stops every other one. A track that is already playing keeps
    /// playing and snaps back to the base volume.
    pub fn play(&mut self, track: MusicTrack, now_ms: f64, fade_in_ms: f64) {
        let mut others: Vec<MusicTrack> = self
            .tracks
            .iter()
            .filter(|(other, state)| **other != track && state.playing)
            .map(|(other, _)| *other)
            .collect();
        others.sort_by_key(|t| *t as u8);
        for other in others {
            self.stop(other);
        }

        let base = self.session.base_volume();
        if let Some(state) = self.tracks.get_mut(&track).filter(|s| s.playing) {
            state.envelope = None;
            state.volume = base;
            return;
        }
        if !self.available.contains(&track) {
            warn!("[Encounter audio] No asset for {}; staying silent", track.asset_key());
            return;
        }

        let state = self.tracks.entry(track).or_default();
        state.playing = true;
        state.reported = None;
        if fade_in_ms > 0.0 {
            state.volume = 0.0;
            state.envelope = Some(VolumeEnvelope::Fade(FadeRamp {
                started_at_ms: now_ms,
                from: 0.0,
                to: base,
                duration_ms: fade_in_ms,
                easing: Easing::SineInOut,
            }));
        } else {
            state.volume = base;
            state.envelope = None;
        }
        self.pending.push(AudioCommand::TrackStarted {
            track,
            looping: track.looping(),
        });
    }

    pub fn stop(&mut self, track: MusicTrack) {
        if let Some(state) = self.tracks.get_mut(&track).filter(|s| s.playing) {
            state.playing = false;
            state.envelope = None;
            state.reported = None;
            self.pending.push(AudioCommand::TrackStopped { track });
        }
    }

    /// Replaces any in-flight envelope on `track` with a fresh dip that starts from the
    /// volume the track has right now. Unknown tracks are ignored.
    pub fn duck(
        &mut self,
        track: MusicTrack,
        floor: f32,
        attack_ms: f64,
        hold_ms: f64,
        release_ms: f64,
        now_ms: f64,
    ) {
        let base = self.session.base_volume();
        let Some(state) = self.tracks.get_mut(&track) else {
            debug!("[Encounter audio] duck on unknown track {}", track.asset_key());
            return;
        };
        let current = state.volume_at(now_ms).min(base);
        state.volume = current;
        state.envelope = Some(VolumeEnvelope::Duck(DuckEnvelope {
            started_at_ms: now_ms,
            from: current,
            floor: floor.clamp(0.0, base),
            base,
            attack_ms: attack_ms.max(0.0),
            hold_ms: hold_ms.max(0.0),
            release_ms: release_ms.max(0.0),
        }));
    }

    /// Duck with the configured defaults.
    pub fn duck_default(&mut self, track: MusicTrack, now_ms: f64) {
        let d = self.duck;
        self.duck(track, d.floor, d.attack_ms, d.hold_ms, d.release_ms, now_ms);
    }

    /// Cancels running envelopes and moves every known track to the new base at once.
    pub fn set_base_volume(&mut self, volume: f32) -> f32 {
        let v = self.session.set_base_volume(volume);
        for state in self.tracks.values_mut() {
            state.envelope = None;
            state.volume = v;
        }
        v
    }

    /// Plays a one-shot effect, ducking the in-game music first when the effect asks for it.
    pub fn play_sfx(&mut self, sfx: Sfx, now_ms: f64) {
        let profile = sfx.profile();
        if profile.duck {
            self.duck_default(MusicTrack::InGame, now_ms);
        }
        self.pending.push(AudioCommand::SfxPlayed {
            sfx,
            volume: profile.volume.clamp(0.0, 1.0),
            stop_previous: profile.stop_previous,
            fade_out_after_ms: profile.fade_out_after_ms,
            fade_out_ms: profile.fade_out_ms,
        });
    }

    /// Advances envelopes and queues a volume command for every playing track whose
    /// effective volume moved.
    pub fn tick(&mut self, now_ms: f64) {
        let base = self.session.base_volume();
        let mut tracks: Vec<MusicTrack> = self.tracks.keys().copied().collect();
        tracks.sort_by_key(|t| *t as u8);
        for track in tracks {
            let Some(state) = self.tracks.get_mut(&track) else {
                continue;
            };
            if let Some(env) = state.envelope {
                state.volume = env.volume_at(now_ms);
                if env.is_finished(now_ms) {
                    state.envelope = None;
                }
            }
            state.volume = state.volume.clamp(0.0, base);
            if !state.playing {
                continue;
            }
            let changed = state
                .reported
                .map_or(true, |r| (r - state.volume).abs() > VOLUME_EPSILON);
            if changed {
                state.reported = Some(state.volume);
                self.pending.push(AudioCommand::TrackVolume {
                    track,
                    volume: state.volume,
                });
            }
        }
    }

    pub fn drain_commands(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.pending)
    }
}
