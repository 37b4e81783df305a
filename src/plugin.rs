use std::path::PathBuf;

use bevy::prelude::*;

use crate::audio::AudioSessionConfig;
use crate::config::DirectorConfig;
use crate::events::{DirectorEvent, DirectorEventLog};
use crate::feedback::{CameraShake, RecordedFeedback};
use crate::level::{
    Buttons, CameraView, EncounterDirector, LevelPhase, Overlap, PlayerSample, TickInput,
};
use crate::preferences::AudioPreferences;

/// Per-frame input the host fills in before `Update`: camera, the physics provider's
/// player body, button edges and overlap notifications.
#[derive(Resource, Clone, Debug, Default)]
pub struct DirectorInput {
    pub camera: CameraView,
    pub player: PlayerSample,
    pub buttons: Buttons,
    pub overlaps: Vec<Overlap>,
}

/// Director output re-published as a Bevy event.
#[derive(Event, Clone, Debug, PartialEq)]
pub struct DirectorNotice(pub DirectorEvent);

/// Request to change (and persist) the music base volume.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct SetMusicVolume(pub f32);

/// Where volume changes are persisted. `None` keeps them for the session only.
#[derive(Resource, Clone, Debug, Default)]
pub struct PreferencesFile(pub Option<PathBuf>);

/// Whether the director derives overlaps from its own bodies.
#[derive(Resource, Clone, Copy, Debug)]
pub struct OverlapProbe(pub bool);

pub struct EncounterPlugin {
    pub config: DirectorConfig,
    /// Set when no external collision provider reports overlaps.
    pub probe_overlaps: bool,
    pub preferences_path: Option<PathBuf>,
}

impl Plugin for EncounterPlugin {
    fn build(&self, app: &mut App) {
        let fallback = self.config.music.base_volume;
        let prefs = match &self.preferences_path {
            Some(path) => AudioPreferences::load_or_default(path, fallback),
            None => AudioPreferences {
                music_base_volume: fallback,
            },
        };
        let director = EncounterDirector::new(
            self.config.clone(),
            AudioSessionConfig::new(prefs.music_base_volume),
        );
        let input = DirectorInput {
            camera: CameraView {
                scroll_x: 0.0,
                width: self.config.camera.viewport_width,
                height: self.config.camera.viewport_height,
            },
            player: PlayerSample {
                x: director.player().actor.x,
                y: director.player().actor.y,
                on_ground: true,
            },
            ..Default::default()
        };

        app.insert_resource(self.config.clone())
            .insert_resource(director)
            .insert_resource(prefs)
            .insert_resource(input)
            .insert_resource(DirectorEventLog::default())
            .insert_resource(PreferencesFile(self.preferences_path.clone()))
            .insert_resource(OverlapProbe(self.probe_overlaps))
            .add_event::<DirectorNotice>()
            .add_event::<CameraShake>()
            .add_event::<SetMusicVolume>()
            .init_state::<LevelPhase>()
            .add_systems(
                PreUpdate,
                keyboard_to_buttons.run_if(resource_exists::<ButtonInput<KeyCode>>),
            )
            .add_systems(
                Update,
                (
                    apply_volume_requests,
                    probe_overlaps
                        .run_if(overlap_probe_enabled)
                        .run_if(gameplay_active),
                    tick_director,
                    publish_director_events,
                    sync_phase_state,
                )
                    .chain(),
            )
            .add_systems(Last, end_frame);
    }
}

pub fn gameplay_active(director: Option<Res<EncounterDirector>>) -> bool {
    director
        .map(|d| d.phase().is_gameplay_active())
        .unwrap_or(false)
}

fn overlap_probe_enabled(probe: Res<OverlapProbe>) -> bool {
    probe.0
}

/// Arrows move, Up/Space jump, F attacks, X fires the super, R restarts, Space/Enter
/// dismisses the boss warning.
fn keyboard_to_buttons(keyboard: Res<ButtonInput<KeyCode>>, mut input: ResMut<DirectorInput>) {
    let held = |keys: &[KeyCode]| keys.iter().any(|k| keyboard.pressed(*k));
    let tapped = |keys: &[KeyCode]| keys.iter().any(|k| keyboard.just_pressed(*k));
    input.buttons = Buttons {
        left: held(&[KeyCode::ArrowLeft, KeyCode::KeyA]),
        right: held(&[KeyCode::ArrowRight, KeyCode::KeyD]),
        jump: tapped(&[KeyCode::ArrowUp, KeyCode::Space]),
        attack: tapped(&[KeyCode::KeyF]),
        super_attack: tapped(&[KeyCode::KeyX]),
        restart: tapped(&[KeyCode::KeyR]),
        restart_held: held(&[KeyCode::KeyR]),
        acknowledge: tapped(&[KeyCode::Space, KeyCode::Enter]),
    };
}

fn apply_volume_requests(
    mut requests: EventReader<SetMusicVolume>,
    mut director: ResMut<EncounterDirector>,
    mut prefs: ResMut<AudioPreferences>,
    file: Res<PreferencesFile>,
) {
    // Last writer within the frame wins.
    let Some(SetMusicVolume(volume)) = requests.read().last().copied() else {
        return;
    };
    prefs.music_base_volume = director.set_music_base_volume(volume);
    if let Some(path) = &file.0 {
        if let Err(e) = prefs.save(path) {
            warn!("[Encounter] Could not persist music volume: {e}");
        }
    }
}

fn probe_overlaps(director: Res<EncounterDirector>, mut input: ResMut<DirectorInput>) {
    let found = director.probe_overlaps(&input.player);
    input.overlaps.extend(found);
}

fn tick_director(
    time: Res<Time>,
    mut input: ResMut<DirectorInput>,
    mut director: ResMut<EncounterDirector>,
    mut shakes: EventWriter<CameraShake>,
) {
    let tick = TickInput {
        dt_ms: time.delta_secs_f64() * 1000.0,
        now_ms: time.elapsed_secs_f64() * 1000.0,
        camera: input.camera,
        player: input.player,
        buttons: input.buttons,
        overlaps: std::mem::take(&mut input.overlaps),
    };
    let mut fx = RecordedFeedback::default();
    director.tick(&tick, &mut fx);
    for shake in fx.shakes {
        shakes.send(shake);
    }
}

fn publish_director_events(
    mut director: ResMut<EncounterDirector>,
    mut log: ResMut<DirectorEventLog>,
    mut notices: EventWriter<DirectorNotice>,
) {
    for event in director.drain_events() {
        log.push(event.clone());
        notices.send(DirectorNotice(event));
    }
}

fn sync_phase_state(
    director: Res<EncounterDirector>,
    state: Res<State<LevelPhase>>,
    mut next_state: ResMut<NextState<LevelPhase>>,
) {
    let desired = director.phase();
    if state.get() != &desired {
        next_state.set(desired);
    }
}

fn end_frame(mut input: ResMut<DirectorInput>, mut log: ResMut<DirectorEventLog>) {
    let held = input.buttons;
    input.buttons = Buttons {
        left: held.left,
        right: held.right,
        restart_held: held.restart_held,
        ..Buttons::default()
    };
    input.overlaps.clear();
    log.advance_frame();
}
