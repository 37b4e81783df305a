use std::io::ErrorKind;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::audio::MusicTrack;

/// Level geometry in world pixels. `y` grows downward, as in the physics provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub width: f32,
    pub height: f32,
    /// Top of the ground collider; everything walks on this line.
    pub ground_top_y: f32,
    /// Player is lost once it falls this far below the world.
    pub fall_margin_px: f32,
    /// Enemies this far behind the camera's left edge are despawned.
    pub enemy_cleanup_margin_px: f32,
    /// Spawns appear this far past the camera's right edge.
    pub spawn_lead_px: f32,
    /// Spawn positions keep at least this distance from either level edge.
    pub spawn_edge_px: f32,
    /// Sky parallax factor for the camera-anchored background.
    pub sky_parallax: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            width: 16000.0,
            height: 540.0,
            ground_top_y: 340.0,
            fall_margin_px: 300.0,
            enemy_cleanup_margin_px: 300.0,
            spawn_lead_px: 240.0,
            spawn_edge_px: 80.0,
            sky_parallax: 0.15,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            viewport_width: 960.0,
            viewport_height: 540.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Spawn x of the player body center at level build.
    pub start_x: f32,
    pub body_width: f32,
    pub body_height: f32,
    pub attack_cooldown_ms: f64,
    /// Delay between the attack press and the hitbox going live.
    pub attack_windup_ms: f64,
    pub attack_duration_ms: f64,
    pub attack_anim_ms: f64,
    pub hitbox_min_size: f32,
    pub hitbox_padding: f32,
    pub melee_damage: i32,
    pub super_kills_required: u32,
    pub super_boss_damage: i32,
    pub coyote_ms: f64,
    pub jump_buffer_ms: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_x: 140.0,
            body_width: 40.0,
            body_height: 110.0,
            attack_cooldown_ms: 280.0,
            attack_windup_ms: 300.0,
            attack_duration_ms: 160.0,
            attack_anim_ms: 460.0,
            hitbox_min_size: 48.0,
            hitbox_padding: 12.0,
            melee_damage: 1,
            super_kills_required: 4,
            super_boss_damage: 2,
            coyote_ms: 90.0,
            jump_buffer_ms: 110.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub hp: i32,
    pub speed: f32,
    pub width: f32,
    pub height: f32,
    pub spawn_initial_ms: f64,
    pub spawn_min_ms: f64,
    pub spawn_ramp_ms: f64,
    pub max_spawned: u32,
    pub first_spawn_delay_ms: f64,
    pub dead_zone_retry_ms: f64,
    pub spacing_retry_ms: f64,
    pub cap_retry_ms: f64,
    /// Minimum gap to the rightmost live enemy, in enemy widths.
    pub spacing_widths: f32,
    pub death_cleanup_ms: f64,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            hp: 1,
            speed: 170.0,
            width: 80.0,
            height: 90.0,
            spawn_initial_ms: 2200.0,
            spawn_min_ms: 900.0,
            spawn_ramp_ms: 25000.0,
            max_spawned: 20,
            first_spawn_delay_ms: 800.0,
            dead_zone_retry_ms: 250.0,
            spacing_retry_ms: 120.0,
            cap_retry_ms: 250.0,
            spacing_widths: 3.0,
            death_cleanup_ms: 1000.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub hp: i32,
    pub speed: f32,
    pub width: f32,
    pub height: f32,
    pub attack_cooldown_ms: f64,
    pub attack_anim_ms: f64,
    pub proximity_px: f32,
    pub flash_ms: f64,
    /// Horizontal offset from the boss center where the projectile is released.
    pub release_offset_px: f32,
    pub arena_left: f32,
    /// `None` confines the boss to the whole level.
    pub arena_right: Option<f32>,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            hp: 10,
            speed: 90.0,
            width: 150.0,
            height: 260.0,
            attack_cooldown_ms: 900.0,
            attack_anim_ms: 640.0,
            proximity_px: 220.0,
            flash_ms: 80.0,
            release_offset_px: 150.0,
            arena_left: 0.0,
            arena_right: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub radius: f32,
    pub speed: f32,
    pub max_lifetime_ms: f64,
    pub despawn_margin_px: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            radius: 12.0,
            speed: 340.0,
            max_lifetime_ms: 6000.0,
            despawn_margin_px: 400.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    pub base_volume: f32,
    pub duck_floor: f32,
    pub duck_attack_ms: f64,
    pub duck_hold_ms: f64,
    pub duck_release_ms: f64,
    pub fade_in_ms: f64,
    /// Tracks the audio collaborator has assets for. Others degrade to silence.
    pub available_tracks: Vec<MusicTrack>,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            base_volume: 0.8,
            duck_floor: 0.35,
            duck_attack_ms: 60.0,
            duck_hold_ms: 120.0,
            duck_release_ms: 520.0,
            fade_in_ms: 600.0,
            available_tracks: MusicTrack::ALL.to_vec(),
        }
    }
}

#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    pub level: LevelConfig,
    pub camera: CameraConfig,
    pub player: PlayerConfig,
    pub enemy: EnemyConfig,
    pub boss: BossConfig,
    pub projectile: ProjectileConfig,
    pub music: MusicConfig,
    pub rng_seed: u64,
}

impl DirectorConfig {
    /// Reads `ENCOUNTER_CONFIG` (default `director.json`). A missing file means defaults.
    pub fn load() -> Self {
        let path = std::env::var("ENCOUNTER_CONFIG")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "director.json".to_string());
        match Self::read(Path::new(&path)) {
            Ok(Some(cfg)) => cfg,
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("[Encounter] Ignoring {}: {}", path, e);
                Self::default()
            }
        }
    }

    /// `Ok(None)` when the file does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>, String> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.to_string()),
        }
    }

    pub fn from_json(contents: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(contents).map_err(|e| e.to_string())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("level.width", self.level.width),
            ("camera.viewport_width", self.camera.viewport_width),
            ("enemy.width", self.enemy.width),
            ("enemy.height", self.enemy.height),
            ("enemy.speed", self.enemy.speed),
            ("boss.speed", self.boss.speed),
            ("projectile.speed", self.projectile.speed),
            ("boss.width", self.boss.width),
            ("boss.height", self.boss.height),
            ("projectile.radius", self.projectile.radius),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(format!("{name} must be positive (got {value})"));
            }
        }
        if self.enemy.spawn_min_ms > self.enemy.spawn_initial_ms {
            return Err(format!(
                "enemy.spawn_min_ms ({}) exceeds enemy.spawn_initial_ms ({})",
                self.enemy.spawn_min_ms, self.enemy.spawn_initial_ms
            ));
        }
        if !(0.0..=1.0).contains(&self.music.base_volume) {
            return Err(format!(
                "music.base_volume must be within 0..1 (got {})",
                self.music.base_volume
            ));
        }
        if self.enemy.hp <= 0 {
            return Err("enemy.hp must be positive".to_string());
        }
        if self.boss.hp <= 0 {
            return Err("boss.hp must be positive".to_string());
        }
        Ok(())
    }

    /// Right edge of the boss arena.
    pub fn arena_right(&self) -> f32 {
        self.boss.arena_right.unwrap_or(self.level.width)
    }
}
