use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use encounter_director::audio::AudioCommand;
use encounter_director::events::DirectorEvent;
use encounter_director::level::{Buttons, LevelPhase, PlayerSample};
use encounter_director::plugin::{DirectorInput, DirectorNotice, SetMusicVolume};
use encounter_director::preferences::preferences_path;
use encounter_director::{DirectorConfig, EncounterDirector, EncounterPlugin};

const FRAME_MS: u64 = 16;
const WALK_SPEED: f32 = 200.0;
const JUMP_SPEED: f32 = 700.0;
const GRAVITY: f32 = 1800.0;
const ATTACK_RANGE: f32 = 260.0;
const DODGE_RANGE: f32 = 180.0;

struct RunArgs {
    frames: u64,
    music_volume: Option<f32>,
}

fn parse_args() -> RunArgs {
    let args: Vec<String> = std::env::args().collect();
    let value_after = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };
    let frames = value_after("--frames")
        .and_then(|v| v.parse().ok())
        .unwrap_or(3600);
    let music_volume = value_after("--music-volume").and_then(|v| v.parse().ok());
    RunArgs {
        frames,
        music_volume,
    }
}

/// Stand-in for the physics provider and the player: walks right, swings at whatever is
/// ahead, hops over projectiles and answers every prompt.
#[derive(Resource)]
struct Autopilot {
    x: f32,
    y: f32,
    vy: f32,
    ground_y: f32,
    level_width: f32,
    viewport_width: f32,
    frame: u64,
}

fn drive_autopilot(
    time: Res<Time>,
    director: Res<EncounterDirector>,
    mut pilot: ResMut<Autopilot>,
    mut input: ResMut<DirectorInput>,
) {
    pilot.frame += 1;
    let intent = director.player_intent();
    if let Some((x, y)) = intent.respawn_at {
        pilot.x = x;
        pilot.y = y;
        pilot.vy = 0.0;
    }

    let dt = time.delta_secs();
    let on_ground = pilot.y >= pilot.ground_y;
    if !intent.frozen {
        if intent.jump && on_ground {
            pilot.vy = -JUMP_SPEED;
        }
        pilot.vy += GRAVITY * dt;
        pilot.y += pilot.vy * dt;
        if pilot.y >= pilot.ground_y {
            pilot.y = pilot.ground_y;
            pilot.vy = 0.0;
        }
        pilot.x = (pilot.x + WALK_SPEED * dt).min(pilot.level_width - 40.0);
    }

    let x = pilot.x;
    let threat_ahead = director
        .enemies()
        .iter()
        .filter(|e| e.actor.active)
        .map(|e| e.actor.x - x)
        .chain(director.boss().filter(|b| b.is_alive()).map(|b| b.actor.x - x))
        .any(|dx| dx > 0.0 && dx < ATTACK_RANGE);
    let incoming = director
        .projectiles()
        .iter()
        .any(|p| (p.x - x) * p.vx.signum() < 0.0 && (p.x - x).abs() < DODGE_RANGE);

    let phase = director.phase();
    let restart = matches!(phase, LevelPhase::Defeat | LevelPhase::Victory) && pilot.frame % 2 == 0;
    input.buttons = Buttons {
        right: true,
        jump: incoming,
        attack: threat_ahead,
        super_attack: director.hud().super_ready && threat_ahead,
        restart,
        restart_held: restart,
        acknowledge: phase == LevelPhase::AllClearBossWarning,
        ..Buttons::default()
    };
    input.player = PlayerSample {
        x,
        y: pilot.y,
        on_ground: pilot.y >= pilot.ground_y,
    };
    input.camera.scroll_x = (x - pilot.viewport_width * 0.5)
        .clamp(0.0, (pilot.level_width - pilot.viewport_width).max(0.0));
}

fn log_notices(mut notices: EventReader<DirectorNotice>) {
    for DirectorNotice(event) in notices.read() {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                warn!("[Encounter] Unserializable event {:?}: {}", event, e);
                continue;
            }
        };
        // Volume ramps report every frame.
        if matches!(event, DirectorEvent::Music(AudioCommand::TrackVolume { .. })) {
            debug!("[Encounter] {}", json);
        } else {
            info!("[Encounter] {}", json);
        }
    }
}

fn main() {
    let args = parse_args();
    let config = DirectorConfig::load();
    let prefs_path = preferences_path();

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(bevy::log::LogPlugin::default())
        .add_plugins(bevy::state::app::StatesPlugin)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
            FRAME_MS,
        )))
        .insert_resource(Autopilot {
            x: config.player.start_x,
            y: config.level.ground_top_y - config.player.body_height * 0.5,
            vy: 0.0,
            ground_y: config.level.ground_top_y - config.player.body_height * 0.5,
            level_width: config.level.width,
            viewport_width: config.camera.viewport_width,
            frame: 0,
        })
        .add_plugins(EncounterPlugin {
            config,
            probe_overlaps: true,
            preferences_path: Some(prefs_path),
        })
        .add_systems(PreUpdate, drive_autopilot)
        .add_systems(PostUpdate, log_notices);

    if let Some(volume) = args.music_volume {
        app.world_mut().send_event(SetMusicVolume(volume));
    }

    app.finish();
    app.cleanup();
    info!("[Encounter] Running {} headless frames", args.frames);
    for _ in 0..args.frames {
        app.update();
    }

    let director = app.world().resource::<EncounterDirector>();
    let hud = director.hud();
    info!(
        "[Encounter] Finished in {:?}: spawned {}, kills {}, boss hp {:?}",
        hud.phase,
        director.spawned_count(),
        hud.kills,
        hud.boss_hp
    );
}
