use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::audio::{AudioSessionConfig, MusicMixer, MusicTrack, Sfx};
use crate::boss::{Boss, BossAction, BossAnim, BossContext, HitOutcome};
use crate::combat::super_attack::{self, SUPER_SHAKE};
use crate::combat::{
    DespawnReason, HitboxController, HitboxHandle, HitboxSpec, ProjectileEvent, ProjectileId,
    ProjectileSimulator,
};
use crate::config::DirectorConfig;
use crate::entities::{DeathCause, Enemy, EntityId, EntityIds, EntityKind};
use crate::events::DirectorEvent;
use crate::feedback::Feedback;
use crate::geometry::Aabb;
use crate::player::Player;
use crate::spawn::{candidate_x, LiveEnemy, SpawnContext, SpawnDecision, SpawnScheduler};
use crate::timers::Scheduler;

const MELEE_KILL_SHAKE: (u32, f32) = (50, 0.005);
const BOSS_HIT_SHAKE: (u32, f32) = (70, 0.006);

#[derive(States, Default, Clone, Copy, Eq, PartialEq, Debug, Hash, Serialize)]
pub enum LevelPhase {
    #[default]
    Intro,
    Spawning,
    AllClearBossWarning,
    BossFight,
    Victory,
    Defeat,
}

impl LevelPhase {
    pub fn can_transition_to(self, next: LevelPhase) -> bool {
        use LevelPhase::*;
        matches!(
            (self, next),
            (Intro, Spawning)
                | (Spawning, AllClearBossWarning)
                | (AllClearBossWarning, BossFight)
                | (BossFight, Victory)
                | (Spawning | BossFight, Defeat)
                | (Defeat | Victory, Intro)
        )
    }

    /// Gameplay ticks only run in these phases; every other phase is frozen.
    pub fn is_gameplay_active(self) -> bool {
        matches!(self, LevelPhase::Spawning | LevelPhase::BossFight)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraView {
    pub scroll_x: f32,
    pub width: f32,
    pub height: f32,
}

impl CameraView {
    pub fn right(&self) -> f32 {
        self.scroll_x + self.width
    }
}

/// Player body as last resolved by the physics provider. `x`/`y` is the body center.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerSample {
    pub x: f32,
    pub y: f32,
    pub on_ground: bool,
}

/// Input edges for one tick. `left`/`right`/`restart_held` are levels, the rest are
/// "just pressed".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Buttons {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub attack: bool,
    pub super_attack: bool,
    pub restart: bool,
    pub restart_held: bool,
    pub acknowledge: bool,
}

/// Overlap notifications from the collision provider. May repeat every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Overlap {
    PlayerEnemy(EntityId),
    HitboxEnemy(HitboxHandle, EntityId),
    HitboxBoss(HitboxHandle, EntityId),
    PlayerBoss(EntityId),
    PlayerProjectile(ProjectileId),
}

#[derive(Clone, Debug, Default)]
pub struct TickInput {
    pub dt_ms: f64,
    pub now_ms: f64,
    pub camera: CameraView,
    pub player: PlayerSample,
    pub buttons: Buttons,
    pub overlaps: Vec<Overlap>,
}

/// What the physics provider should do with the player body after this tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlayerIntent {
    pub facing: f32,
    pub jump: bool,
    /// Zero velocities and skip integration.
    pub frozen: bool,
    pub attacking: bool,
    /// Set on the tick a level is rebuilt.
    pub respawn_at: Option<(f32, f32)>,
}

impl Default for PlayerIntent {
    fn default() -> Self {
        Self {
            facing: 1.0,
            jump: false,
            frozen: false,
            attacking: false,
            respawn_at: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub kills: u32,
    pub super_ready: bool,
    pub boss_hp: Option<i32>,
    pub boss_max_hp: Option<i32>,
    pub boss_anim: Option<BossAnim>,
    /// White hit flash on the boss sprite.
    pub boss_flashing: bool,
    pub phase: LevelPhase,
    /// Camera-anchored sky texture offset.
    pub sky_offset_x: f32,
}

#[derive(Clone, Copy, Debug)]
enum Timed {
    MeleeWindup { facing: f32 },
    HitboxExpired(HitboxHandle),
    EnemyRemoved(EntityId),
    BossAttackComplete,
}

/// Everything discarded on restart. Dropping it cancels every pending timer.
struct LevelState {
    ids: EntityIds,
    clock: Scheduler<Timed>,
    player: Player,
    enemies: Vec<Enemy>,
    boss: Option<Boss>,
    hitboxes: HitboxController,
    active_hitbox: Option<HitboxHandle>,
    projectiles: ProjectileSimulator,
    spawner: SpawnScheduler,
}

impl LevelState {
    fn new(cfg: &DirectorConfig) -> Self {
        let mut ids = EntityIds::default();
        let mut player = Player::new(ids.allocate(), &cfg.player);
        player.actor.x = cfg.player.start_x;
        player.actor.y = cfg.level.ground_top_y - cfg.player.body_height * 0.5;
        Self {
            ids,
            clock: Scheduler::new(),
            player,
            enemies: Vec::new(),
            boss: None,
            hitboxes: HitboxController::default(),
            active_hitbox: None,
            projectiles: ProjectileSimulator::new(cfg.projectile.despawn_margin_px),
            spawner: SpawnScheduler::new(cfg.enemy.clone(), 0.0),
        }
    }
}

/// Owns one level's worth of encounter state and advances it one tick at a time.
///
/// Gameplay timers run on a clock that only moves while the phase is active, so a modal
/// freeze pauses cooldowns, spawns and lifetimes along with physics. Music runs on the
/// caller's real clock.
#[derive(Resource)]
pub struct EncounterDirector {
    config: DirectorConfig,
    phase: LevelPhase,
    restart_armed: bool,
    level: LevelState,
    mixer: MusicMixer,
    rng: SmallRng,
    events: Vec<DirectorEvent>,
    hud: HudSnapshot,
    intent: PlayerIntent,
    camera: CameraView,
    real_now_ms: f64,
}

impl EncounterDirector {
    pub fn new(config: DirectorConfig, session: AudioSessionConfig) -> Self {
        let camera = CameraView {
            scroll_x: 0.0,
            width: config.camera.viewport_width,
            height: config.camera.viewport_height,
        };
        let mut director = Self {
            phase: LevelPhase::Intro,
            restart_armed: false,
            level: LevelState::new(&config),
            mixer: MusicMixer::new(session, &config.music),
            rng: SmallRng::seed_from_u64(config.rng_seed),
            events: Vec::new(),
            hud: HudSnapshot::default(),
            intent: PlayerIntent::default(),
            camera,
            real_now_ms: 0.0,
            config,
        };
        director.announce_player();
        director.transition(LevelPhase::Spawning);
        director.flush_audio();
        director.refresh_hud(0.0);
        director
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    pub fn phase(&self) -> LevelPhase {
        self.phase
    }

    pub fn hud(&self) -> &HudSnapshot {
        &self.hud
    }

    pub fn player_intent(&self) -> PlayerIntent {
        self.intent
    }

    pub fn player(&self) -> &Player {
        &self.level.player
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.level.enemies
    }

    pub fn boss(&self) -> Option<&Boss> {
        self.level.boss.as_ref()
    }

    pub fn hitboxes(&self) -> &HitboxController {
        &self.level.hitboxes
    }

    pub fn projectiles(&self) -> &ProjectileSimulator {
        &self.level.projectiles
    }

    pub fn music(&self) -> &MusicMixer {
        &self.mixer
    }

    pub fn spawned_count(&self) -> u32 {
        self.level.spawner.spawned()
    }

    /// Gameplay clock; stands still while frozen.
    pub fn gameplay_now_ms(&self) -> f64 {
        self.level.clock.now_ms()
    }

    pub fn drain_events(&mut self) -> Vec<DirectorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Applies immediately to every known track and to later track starts.
    pub fn set_music_base_volume(&mut self, volume: f32) -> f32 {
        let v = self.mixer.set_base_volume(volume);
        info!("[Encounter] Music base volume set to {:.2}", v);
        v
    }

    /// Moves to `to` if the edge exists. Anything else is ignored.
    pub fn transition(&mut self, to: LevelPhase) -> bool {
        let from = self.phase;
        if !from.can_transition_to(to) {
            debug!("[Encounter] Ignoring transition {:?} -> {:?}", from, to);
            return false;
        }
        self.phase = to;
        info!("[Encounter] Phase {:?} -> {:?}", from, to);
        self.events.push(DirectorEvent::PhaseChanged { from, to });
        self.enter(to);
        true
    }

    fn enter(&mut self, phase: LevelPhase) {
        match phase {
            LevelPhase::Intro => {
                self.rebuild_level();
                self.transition(LevelPhase::Spawning);
            }
            LevelPhase::Spawning => {
                let fade = self.mixer.fade_in_ms();
                self.mixer.play(MusicTrack::InGame, self.real_now_ms, fade);
            }
            LevelPhase::AllClearBossWarning => {
                self.level.player.actor.halt();
            }
            LevelPhase::BossFight => {
                self.level.player.controller.clear_jump_buffer();
                self.intent.jump = false;
                self.spawn_boss();
            }
            LevelPhase::Victory => {
                self.halt_all();
                self.restart_armed = false;
                self.mixer.play(MusicTrack::Win, self.real_now_ms, 0.0);
            }
            LevelPhase::Defeat => {
                self.halt_all();
                self.restart_armed = false;
            }
        }
    }

    pub fn tick(&mut self, input: &TickInput, fx: &mut dyn Feedback) {
        self.real_now_ms = input.now_ms;
        self.camera = input.camera;
        self.intent.jump = false;
        self.intent.respawn_at = None;

        let mut buttons = input.buttons;
        let modal_open = self.phase == LevelPhase::AllClearBossWarning;
        let rebuilt = self.handle_modal_input(&buttons);
        if modal_open {
            // The dismiss press must not come back as a jump or a swing.
            buttons.jump = false;
            buttons.attack = false;
        }
        if !rebuilt && self.phase.is_gameplay_active() {
            self.tick_gameplay(input, &buttons, fx);
        }

        self.mixer.tick(input.now_ms);
        self.flush_audio();
        self.refresh_hud(input.camera.scroll_x);

        let now = self.level.clock.now_ms();
        self.intent.frozen = !self.phase.is_gameplay_active();
        self.intent.facing = self.level.player.controller.facing;
        self.intent.attacking = self.level.player.controller.is_attacking(now);
    }

    /// Returns true when the level was rebuilt this tick.
    fn handle_modal_input(&mut self, buttons: &Buttons) -> bool {
        match self.phase {
            LevelPhase::AllClearBossWarning if buttons.acknowledge => {
                self.transition(LevelPhase::BossFight);
                false
            }
            LevelPhase::Defeat | LevelPhase::Victory => {
                if !self.restart_armed {
                    // The press that ended the level has to be released first.
                    self.restart_armed = !buttons.restart && !buttons.restart_held;
                    false
                } else if buttons.restart {
                    self.transition(LevelPhase::Intro)
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn tick_gameplay(&mut self, input: &TickInput, buttons: &Buttons, fx: &mut dyn Feedback) {
        if input.player.y > self.config.level.height + self.config.level.fall_margin_px {
            info!("[Encounter] Player fell out of the world");
            self.transition(LevelPhase::Defeat);
            return;
        }

        let dt_ms = input.dt_ms.max(0.0);
        let dt_secs = (dt_ms / 1000.0) as f32;
        let fired = self.level.clock.advance(dt_ms);
        let now = self.level.clock.now_ms();

        let player = &mut self.level.player.actor;
        player.x = input.player.x;
        player.y = input.player.y;

        for action in fired {
            self.run_timed(action, now);
        }

        if self.phase == LevelPhase::Spawning {
            let live = self.level.enemies.iter().filter(|e| e.actor.active).count();
            if self.level.spawner.check_boss_trigger(live) {
                self.transition(LevelPhase::AllClearBossWarning);
                return;
            }
        }

        self.update_player(buttons, input.player.on_ground, now, fx);
        if !self.phase.is_gameplay_active() {
            return;
        }
        self.follow_hitbox();

        if self.phase == LevelPhase::Spawning {
            self.update_spawns(now);
        }
        self.update_enemies(dt_secs, input.camera.scroll_x);
        if self.phase == LevelPhase::BossFight {
            self.update_boss(now, dt_secs);
        }
        self.update_projectiles(dt_secs, now, input.camera.scroll_x);

        for overlap in &input.overlaps {
            if !self.phase.is_gameplay_active() {
                break;
            }
            self.resolve_overlap(*overlap, now, fx);
        }
    }

    fn run_timed(&mut self, action: Timed, now: f64) {
        match action {
            Timed::MeleeWindup { facing } => self.spawn_melee_hitbox(facing, now),
            Timed::HitboxExpired(handle) => {
                self.level.hitboxes.destroy(handle);
                if self.level.active_hitbox == Some(handle) {
                    self.level.active_hitbox = None;
                }
            }
            Timed::EnemyRemoved(id) => {
                let Some(idx) = self.level.enemies.iter().position(|e| e.actor.id == id) else {
                    return;
                };
                self.level.enemies.remove(idx);
                self.events.push(DirectorEvent::EntityDestroyed {
                    id,
                    kind: EntityKind::Enemy,
                });
            }
            Timed::BossAttackComplete => self.release_projectile(now),
        }
    }

    fn update_player(
        &mut self,
        buttons: &Buttons,
        on_ground: bool,
        now: f64,
        fx: &mut dyn Feedback,
    ) {
        let pcfg = &self.config.player;
        let controller = &mut self.level.player.controller;
        controller.update_facing(buttons.left, buttons.right);
        self.intent.jump = controller.update_jump(now, on_ground, buttons.jump, pcfg);

        if buttons.attack {
            if let Some(facing) = controller.try_begin_melee(now, pcfg) {
                self.level
                    .clock
                    .after(pcfg.attack_windup_ms, Timed::MeleeWindup { facing });
            }
        }
        if buttons.super_attack && controller.try_super(pcfg) {
            self.activate_super(now, fx);
        }
    }

    fn spawn_melee_hitbox(&mut self, facing: f32, now: f64) {
        let pcfg = &self.config.player;
        let player = &self.level.player;
        let (width, height) = player.hitbox_size(pcfg);
        let (x, y) = player.hitbox_anchor(facing, width, pcfg);
        if let Some(previous) = self.level.active_hitbox.take() {
            self.level.hitboxes.destroy(previous);
        }
        let handle = self.level.hitboxes.spawn(
            HitboxSpec {
                x,
                y,
                width,
                height,
                duration_ms: pcfg.attack_duration_ms,
                dir: facing,
                damage: pcfg.melee_damage,
            },
            now,
        );
        self.level.active_hitbox = Some(handle);
        self.level
            .clock
            .after(pcfg.attack_duration_ms, Timed::HitboxExpired(handle));
    }

    fn follow_hitbox(&mut self) {
        let Some(handle) = self.level.active_hitbox else {
            return;
        };
        let pcfg = &self.config.player;
        let player = &self.level.player;
        let width = self
            .level
            .hitboxes
            .get(handle)
            .map_or(0.0, |hb| hb.width);
        let (x, y) = player.hitbox_anchor(player.controller.facing, width, pcfg);
        self.level.hitboxes.reposition(handle, x, y);
    }

    fn update_spawns(&mut self, now: f64) {
        let live: Vec<LiveEnemy> = self
            .level
            .enemies
            .iter()
            .filter(|e| e.actor.active)
            .map(|e| LiveEnemy {
                x: e.actor.x,
                width: e.actor.width,
            })
            .collect();
        let lvl = &self.config.level;
        let ctx = SpawnContext {
            now_ms: now,
            player_x: self.level.player.actor.x,
            dead_zone_px: self.config.camera.viewport_width,
            candidate_x: candidate_x(
                self.camera.right(),
                lvl.spawn_lead_px,
                lvl.spawn_edge_px,
                lvl.width,
            ),
            live_enemies: &live,
        };
        match self.level.spawner.poll(&ctx) {
            SpawnDecision::Spawn { x } => self.spawn_enemy(x),
            SpawnDecision::Deferred(reason) => {
                debug!("[Encounter] Spawn deferred: {:?}", reason);
            }
            SpawnDecision::NotDue | SpawnDecision::Halted => {}
        }
    }

    fn spawn_enemy(&mut self, x: f32) {
        let id = self.level.ids.allocate();
        let ecfg = &self.config.enemy;
        let mut enemy = Enemy::new(
            id,
            x,
            self.config.level.ground_top_y,
            ecfg.width,
            ecfg.height,
            ecfg.speed,
        );
        enemy.actor.health = ecfg.hp;
        let y = enemy.actor.y;
        self.level.enemies.push(enemy);
        self.events.push(DirectorEvent::EntitySpawned {
            id,
            kind: EntityKind::Enemy,
            x,
            y,
        });
    }

    fn update_enemies(&mut self, dt_secs: f32, scroll_x: f32) {
        let kill_x = scroll_x - self.config.level.enemy_cleanup_margin_px;
        for enemy in &mut self.level.enemies {
            enemy.step(dt_secs);
            if enemy.actor.active
                && enemy.actor.x < kill_x
                && enemy.die(DeathCause::Despawn, &mut self.rng)
            {
                self.events.push(DirectorEvent::EntityDied {
                    id: enemy.actor.id,
                    kind: EntityKind::Enemy,
                    cause: DeathCause::Despawn,
                });
                self.level
                    .clock
                    .after(0.0, Timed::EnemyRemoved(enemy.actor.id));
            }
        }
    }

    fn spawn_boss(&mut self) {
        if self.level.boss.is_some() {
            warn!("[Encounter] Boss already spawned for this level");
            return;
        }
        let lvl = &self.config.level;
        let x = candidate_x(
            self.camera.right(),
            lvl.spawn_lead_px,
            lvl.spawn_edge_px,
            lvl.width,
        );
        let id = self.level.ids.allocate();
        let boss = Boss::new(id, x, lvl.ground_top_y, &self.config.boss);
        self.events.push(DirectorEvent::EntitySpawned {
            id,
            kind: EntityKind::Boss,
            x,
            y: boss.actor.y,
        });
        self.events.push(DirectorEvent::BossHealthChanged {
            hp: boss.hp(),
            max_hp: boss.max_hp,
        });
        self.level.boss = Some(boss);
    }

    fn update_boss(&mut self, now: f64, dt_secs: f32) {
        let Some(boss) = self.level.boss.as_mut() else {
            return;
        };
        let ctx = BossContext {
            now_ms: now,
            dt_secs,
            player_x: self.level.player.actor.x,
            arena_left: self.config.boss.arena_left,
            arena_right: self.config.arena_right(),
        };
        if let BossAction::AttackStarted { dir } = boss.update(&ctx, &self.config.boss) {
            debug!("[Encounter] Boss attack toward {}", dir);
            self.level
                .clock
                .after(self.config.boss.attack_anim_ms, Timed::BossAttackComplete);
            self.mixer.play_sfx(Sfx::BossAttack, self.real_now_ms);
        }
    }

    fn release_projectile(&mut self, now: f64) {
        let Some(boss) = self.level.boss.as_mut() else {
            return;
        };
        let Some(launch) = boss.complete_attack(&self.config.boss) else {
            return;
        };
        let pcfg = &self.config.projectile;
        // Rolls along the ground line.
        let y = self.config.level.ground_top_y - pcfg.radius;
        let vx = launch.dir * pcfg.speed;
        let id = self
            .level
            .projectiles
            .spawn(launch.x, y, vx, pcfg.radius, now, pcfg.max_lifetime_ms);
        self.events.push(DirectorEvent::ProjectileSpawned {
            id,
            x: launch.x,
            y,
            vx,
        });
    }

    fn update_projectiles(&mut self, dt_secs: f32, now: f64, scroll_x: f32) {
        let target = Some(self.level.player.actor.bounds());
        let outcomes = self.level.projectiles.step(dt_secs, now, scroll_x, target);
        for outcome in outcomes {
            match outcome {
                ProjectileEvent::Hit(id) => {
                    self.events.push(DirectorEvent::ProjectileDestroyed {
                        id,
                        reason: DespawnReason::HitTarget,
                    });
                    if self.phase.is_gameplay_active() {
                        info!("[Encounter] Player hit by projectile");
                        self.transition(LevelPhase::Defeat);
                    }
                }
                ProjectileEvent::Despawned(id, reason) => {
                    self.events
                        .push(DirectorEvent::ProjectileDestroyed { id, reason });
                }
            }
        }
    }

    fn resolve_overlap(&mut self, overlap: Overlap, now: f64, fx: &mut dyn Feedback) {
        match overlap {
            Overlap::PlayerEnemy(id) => {
                if self.enemy_is_active(id) {
                    info!("[Encounter] Player caught by enemy {:?}", id);
                    self.transition(LevelPhase::Defeat);
                }
            }
            Overlap::PlayerBoss(id) => {
                if self.boss_is_active(id) {
                    info!("[Encounter] Player caught by boss");
                    self.transition(LevelPhase::Defeat);
                }
            }
            Overlap::PlayerProjectile(id) => {
                if self.level.projectiles.take(id).is_some() {
                    self.events.push(DirectorEvent::ProjectileDestroyed {
                        id,
                        reason: DespawnReason::HitTarget,
                    });
                    info!("[Encounter] Player hit by projectile");
                    self.transition(LevelPhase::Defeat);
                }
            }
            Overlap::HitboxEnemy(handle, id) => self.melee_enemy(handle, id, now, fx),
            Overlap::HitboxBoss(handle, id) => self.melee_boss(handle, id, now, fx),
        }
    }

    fn enemy_is_active(&self, id: EntityId) -> bool {
        self.level
            .enemies
            .iter()
            .any(|e| e.actor.id == id && e.actor.active)
    }

    fn boss_is_active(&self, id: EntityId) -> bool {
        self.level
            .boss
            .as_ref()
            .is_some_and(|b| b.actor.id == id && b.is_alive())
    }

    fn melee_enemy(&mut self, handle: HitboxHandle, id: EntityId, now: f64, fx: &mut dyn Feedback) {
        let Some(enemy) = self
            .level
            .enemies
            .iter_mut()
            .find(|e| e.actor.id == id && e.actor.active)
        else {
            return;
        };
        if !self.level.hitboxes.try_hit(handle, id, now) {
            return;
        }
        let damage = self.level.hitboxes.get(handle).map_or(1, |hb| hb.damage);
        enemy.actor.health -= damage;
        if enemy.actor.health > 0 {
            self.events.push(DirectorEvent::HitLanded {
                attacker: EntityKind::Player,
                target: id,
                damage,
            });
            self.mixer.play_sfx(Sfx::Hit, self.real_now_ms);
            return;
        }
        enemy.die(DeathCause::Melee, &mut self.rng);

        self.events.push(DirectorEvent::HitLanded {
            attacker: EntityKind::Player,
            target: id,
            damage,
        });
        self.events.push(DirectorEvent::EntityDied {
            id,
            kind: EntityKind::Enemy,
            cause: DeathCause::Melee,
        });
        self.level
            .clock
            .after(self.config.enemy.death_cleanup_ms, Timed::EnemyRemoved(id));

        let controller = &mut self.level.player.controller;
        let kills = controller.add_kill();
        self.events.push(DirectorEvent::KillCountChanged {
            kills,
            super_ready: controller.super_ready(&self.config.player),
        });
        fx.camera_shake(MELEE_KILL_SHAKE.0, MELEE_KILL_SHAKE.1);
        self.mixer.play_sfx(Sfx::Hit, self.real_now_ms);
    }

    fn melee_boss(&mut self, handle: HitboxHandle, id: EntityId, now: f64, fx: &mut dyn Feedback) {
        let Some(boss) = self
            .level
            .boss
            .as_mut()
            .filter(|b| b.actor.id == id && b.is_alive())
        else {
            return;
        };
        if !self.level.hitboxes.try_hit(handle, id, now) {
            return;
        }
        let damage = self.level.hitboxes.get(handle).map_or(1, |hb| hb.damage);
        let outcome = boss.take_hit(damage, now, &self.config.boss);
        fx.camera_shake(BOSS_HIT_SHAKE.0, BOSS_HIT_SHAKE.1);
        self.mixer.play_sfx(Sfx::Hit, self.real_now_ms);
        self.apply_boss_outcome(outcome, DeathCause::Melee, damage);
    }

    fn activate_super(&mut self, now: f64, fx: &mut dyn Feedback) {
        let player = &self.level.player;
        let (x, y, dir) = (player.actor.x, player.actor.y, player.controller.facing);
        info!("[Encounter] Super attack at x={:.0}", x);
        self.events.push(DirectorEvent::SuperActivated { x, y, dir });
        fx.camera_shake(SUPER_SHAKE.0, SUPER_SHAKE.1);
        self.mixer.play_sfx(Sfx::Super, self.real_now_ms);

        let damage = self.config.player.super_boss_damage;
        let outcome = super_attack::activate(
            &mut self.level.enemies,
            self.level.boss.as_mut(),
            damage,
            now,
            &self.config.boss,
            &mut self.rng,
        );
        for id in outcome.killed {
            self.events.push(DirectorEvent::EntityDied {
                id,
                kind: EntityKind::Enemy,
                cause: DeathCause::Super,
            });
            self.level
                .clock
                .after(self.config.enemy.death_cleanup_ms, Timed::EnemyRemoved(id));
        }
        self.events.push(DirectorEvent::KillCountChanged {
            kills: self.level.player.controller.kills(),
            super_ready: false,
        });
        self.apply_boss_outcome(outcome.boss, DeathCause::Super, damage);
    }

    fn apply_boss_outcome(&mut self, outcome: HitOutcome, cause: DeathCause, damage: i32) {
        let Some(boss) = self.level.boss.as_ref() else {
            return;
        };
        let (id, max_hp) = (boss.actor.id, boss.max_hp);
        match outcome {
            HitOutcome::Ignored => {}
            HitOutcome::Damaged { hp } => {
                self.events.push(DirectorEvent::HitLanded {
                    attacker: EntityKind::Player,
                    target: id,
                    damage,
                });
                self.events
                    .push(DirectorEvent::BossHealthChanged { hp, max_hp });
            }
            HitOutcome::Killed => {
                self.events.push(DirectorEvent::HitLanded {
                    attacker: EntityKind::Player,
                    target: id,
                    damage,
                });
                self.events.push(DirectorEvent::BossHealthChanged {
                    hp: boss.hp().max(0),
                    max_hp,
                });
                self.events.push(DirectorEvent::EntityDied {
                    id,
                    kind: EntityKind::Boss,
                    cause,
                });
                info!("[Encounter] Boss defeated");
                self.transition(LevelPhase::Victory);
            }
        }
    }

    fn halt_all(&mut self) {
        self.level.player.actor.halt();
        for enemy in &mut self.level.enemies {
            enemy.actor.halt();
        }
        if let Some(boss) = self.level.boss.as_mut() {
            boss.actor.halt();
        }
        self.level.projectiles.halt();
    }

    fn rebuild_level(&mut self) {
        let old = std::mem::replace(&mut self.level, LevelState::new(&self.config));
        for projectile in old.projectiles.iter() {
            self.events.push(DirectorEvent::ProjectileDestroyed {
                id: projectile.id,
                reason: DespawnReason::Teardown,
            });
        }
        for enemy in &old.enemies {
            self.events.push(DirectorEvent::EntityDestroyed {
                id: enemy.actor.id,
                kind: EntityKind::Enemy,
            });
        }
        if let Some(boss) = &old.boss {
            self.events.push(DirectorEvent::EntityDestroyed {
                id: boss.actor.id,
                kind: EntityKind::Boss,
            });
        }
        self.events.push(DirectorEvent::EntityDestroyed {
            id: old.player.actor.id,
            kind: EntityKind::Player,
        });

        self.restart_armed = false;
        self.announce_player();
        let player = &self.level.player.actor;
        self.intent = PlayerIntent {
            respawn_at: Some((player.x, player.y)),
            ..PlayerIntent::default()
        };
    }

    fn announce_player(&mut self) {
        let player = &self.level.player.actor;
        self.events.push(DirectorEvent::EntitySpawned {
            id: player.id,
            kind: EntityKind::Player,
            x: player.x,
            y: player.y,
        });
    }

    fn flush_audio(&mut self) {
        self.events
            .extend(self.mixer.drain_commands().into_iter().map(DirectorEvent::Music));
    }

    fn refresh_hud(&mut self, scroll_x: f32) {
        let controller = &self.level.player.controller;
        let now = self.level.clock.now_ms();
        let boss = self.level.boss.as_ref().filter(|b| b.is_alive());
        self.hud = HudSnapshot {
            kills: controller.kills(),
            super_ready: controller.super_ready(&self.config.player),
            boss_hp: boss.map(|b| b.hp()),
            boss_max_hp: boss.map(|b| b.max_hp),
            boss_anim: boss.map(|b| b.anim()),
            boss_flashing: boss.is_some_and(|b| b.is_flashing(now)),
            phase: self.phase,
            sky_offset_x: (scroll_x * self.config.level.sky_parallax).floor(),
        };
    }

    /// Box-overlap stand-in for an external collision provider, using the director's own
    /// view of every body.
    pub fn probe_overlaps(&self, player: &PlayerSample) -> Vec<Overlap> {
        let mut overlaps = Vec::new();
        if !self.phase.is_gameplay_active() {
            return overlaps;
        }
        let pcfg = &self.config.player;
        let body = Aabb::from_center(player.x, player.y, pcfg.body_width, pcfg.body_height);
        let boss = self.level.boss.as_ref().filter(|b| b.is_alive());
        let live_enemies = || self.level.enemies.iter().filter(|e| e.actor.active);

        for enemy in live_enemies() {
            if body.overlaps(&enemy.actor.bounds()) {
                overlaps.push(Overlap::PlayerEnemy(enemy.actor.id));
            }
        }
        if let Some(boss) = boss.filter(|b| body.overlaps(&b.actor.bounds())) {
            overlaps.push(Overlap::PlayerBoss(boss.actor.id));
        }
        for projectile in self.level.projectiles.iter() {
            if body.overlaps(&projectile.bounds()) {
                overlaps.push(Overlap::PlayerProjectile(projectile.id));
            }
        }

        let now = self.level.clock.now_ms();
        for (handle, hitbox) in self.level.hitboxes.iter() {
            if !self.level.hitboxes.is_live(handle, now) {
                continue;
            }
            let reach = hitbox.bounds();
            for enemy in live_enemies() {
                if reach.overlaps(&enemy.actor.bounds()) {
                    overlaps.push(Overlap::HitboxEnemy(handle, enemy.actor.id));
                }
            }
            if let Some(boss) = boss.filter(|b| reach.overlaps(&b.actor.bounds())) {
                overlaps.push(Overlap::HitboxBoss(handle, boss.actor.id));
            }
        }
        overlaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioCommand;
    use crate::feedback::{NoFeedback, RecordedFeedback};

    const GROUND_Y: f32 = 285.0;

    struct Rig {
        director: EncounterDirector,
        now: f64,
        player_x: f32,
        player_y: f32,
        fx: RecordedFeedback,
        events: Vec<DirectorEvent>,
    }

    impl Rig {
        fn new(cfg: DirectorConfig) -> Self {
            let mut director = EncounterDirector::new(cfg, AudioSessionConfig::new(0.8));
            let events = director.drain_events();
            Self {
                director,
                now: 0.0,
                player_x: 3000.0,
                player_y: GROUND_Y,
                fx: RecordedFeedback::default(),
                events,
            }
        }

        fn step(&mut self, buttons: Buttons, overlaps: Vec<Overlap>) {
            let mut fx = std::mem::take(&mut self.fx);
            self.step_with(buttons, overlaps, &mut fx);
            self.fx = fx;
        }

        fn step_with(&mut self, buttons: Buttons, overlaps: Vec<Overlap>, fx: &mut dyn Feedback) {
            self.now += 16.0;
            let input = TickInput {
                dt_ms: 16.0,
                now_ms: self.now,
                camera: CameraView {
                    scroll_x: (self.player_x - 480.0).max(0.0),
                    width: 960.0,
                    height: 540.0,
                },
                player: PlayerSample {
                    x: self.player_x,
                    y: self.player_y,
                    on_ground: true,
                },
                buttons,
                overlaps,
            };
            self.director.tick(&input, fx);
            self.events.extend(self.director.drain_events());
        }

        fn idle(&mut self, ticks: usize) {
            for _ in 0..ticks {
                self.step(Buttons::default(), Vec::new());
            }
        }

        fn count(&self, pred: impl Fn(&DirectorEvent) -> bool) -> usize {
            self.events.iter().filter(|e| pred(e)).count()
        }

        fn until_enemy(&mut self) -> EntityId {
            for _ in 0..1000 {
                if let Some(e) = self.director.enemies().iter().find(|e| e.actor.active) {
                    return e.actor.id;
                }
                self.idle(1);
            }
            panic!("no enemy spawned");
        }

        /// Straight to the boss fight with no wave.
        fn boss_fight(cfg: DirectorConfig) -> Self {
            let mut rig = Self::new(DirectorConfig {
                enemy: crate::config::EnemyConfig {
                    max_spawned: 0,
                    ..cfg.enemy.clone()
                },
                ..cfg
            });
            rig.idle(1);
            assert_eq!(rig.director.phase(), LevelPhase::AllClearBossWarning);
            // Same key acknowledges and jumps.
            rig.step(
                Buttons {
                    acknowledge: true,
                    jump: true,
                    ..Buttons::default()
                },
                Vec::new(),
            );
            assert_eq!(rig.director.phase(), LevelPhase::BossFight);
            rig
        }

        fn swing(&mut self) -> HitboxHandle {
            self.step(
                Buttons {
                    attack: true,
                    ..Buttons::default()
                },
                Vec::new(),
            );
            for _ in 0..40 {
                if let Some((handle, _)) = self.director.hitboxes().iter().next() {
                    return handle;
                }
                self.idle(1);
            }
            panic!("hitbox never spawned");
        }
    }

    fn press_restart() -> Buttons {
        Buttons {
            restart: true,
            restart_held: true,
            ..Buttons::default()
        }
    }

    #[test]
    fn transitions_follow_defined_edges() {
        use LevelPhase::*;
        assert!(Intro.can_transition_to(Spawning));
        assert!(Spawning.can_transition_to(Defeat));
        assert!(BossFight.can_transition_to(Defeat));
        assert!(Victory.can_transition_to(Intro));
        assert!(!Victory.can_transition_to(Defeat));
        assert!(!AllClearBossWarning.can_transition_to(Defeat));
        assert!(!Spawning.can_transition_to(BossFight));
        assert!(!Defeat.can_transition_to(Spawning));
    }

    #[test]
    fn construction_enters_spawning_and_starts_music() {
        let rig = Rig::new(DirectorConfig::default());
        assert_eq!(rig.director.phase(), LevelPhase::Spawning);
        assert_eq!(
            rig.count(|e| *e
                == DirectorEvent::PhaseChanged {
                    from: LevelPhase::Intro,
                    to: LevelPhase::Spawning
                }),
            1
        );
        assert_eq!(
            rig.count(|e| matches!(
                e,
                DirectorEvent::Music(AudioCommand::TrackStarted {
                    track: MusicTrack::InGame,
                    looping: true
                })
            )),
            1
        );
    }

    #[test]
    fn undefined_transition_is_ignored() {
        let mut rig = Rig::new(DirectorConfig::default());
        assert!(!rig.director.transition(LevelPhase::BossFight));
        assert!(!rig.director.transition(LevelPhase::Victory));
        assert_eq!(rig.director.phase(), LevelPhase::Spawning);
        assert!(rig.director.drain_events().is_empty());
    }

    #[test]
    fn full_wave_leads_to_exactly_one_boss() {
        let mut rig = Rig::new(DirectorConfig::default());
        let mut ticks = 0;
        while rig.director.phase() == LevelPhase::Spawning && ticks < 20_000 {
            rig.idle(1);
            ticks += 1;
        }
        assert_eq!(rig.director.phase(), LevelPhase::AllClearBossWarning);
        assert_eq!(rig.director.spawned_count(), 20);
        assert!(rig.director.enemies().iter().all(|e| !e.actor.active));
        assert!(rig.director.boss().is_none());

        // Modal stays up until acknowledged.
        rig.idle(10);
        assert_eq!(rig.director.phase(), LevelPhase::AllClearBossWarning);

        let ack = Buttons {
            acknowledge: true,
            jump: true,
            ..Buttons::default()
        };
        rig.step(ack, Vec::new());
        rig.step(ack, Vec::new());
        assert_eq!(rig.director.phase(), LevelPhase::BossFight);
        assert!(!rig.director.transition(LevelPhase::BossFight));
        assert_eq!(
            rig.count(|e| matches!(
                e,
                DirectorEvent::EntitySpawned {
                    kind: EntityKind::Boss,
                    ..
                }
            )),
            1
        );
    }

    #[test]
    fn dismiss_press_does_not_jump() {
        let mut rig = Rig::boss_fight(DirectorConfig::default());
        assert!(!rig.director.player_intent().jump);
        rig.idle(1);
        assert!(!rig.director.player_intent().jump);
    }

    #[test]
    fn frozen_phase_skips_gameplay_but_refreshes_hud() {
        let cfg = DirectorConfig {
            enemy: crate::config::EnemyConfig {
                max_spawned: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut rig = Rig::new(cfg);
        rig.idle(1);
        assert_eq!(rig.director.phase(), LevelPhase::AllClearBossWarning);
        let frozen_at = rig.director.gameplay_now_ms();

        rig.player_x = 4000.0;
        rig.idle(5);
        assert_eq!(rig.director.gameplay_now_ms(), frozen_at);
        let hud = rig.director.hud();
        assert_eq!(hud.phase, LevelPhase::AllClearBossWarning);
        assert_eq!(hud.sky_offset_x, (3520.0_f32 * 0.15).floor());
        assert!(rig.director.player_intent().frozen);
    }

    #[test]
    fn enemy_contact_defeats_exactly_once() {
        let mut rig = Rig::new(DirectorConfig::default());
        let enemy = rig.until_enemy();
        for _ in 0..5 {
            rig.step(Buttons::default(), vec![Overlap::PlayerEnemy(enemy)]);
        }
        assert_eq!(rig.director.phase(), LevelPhase::Defeat);
        assert_eq!(
            rig.count(|e| matches!(
                e,
                DirectorEvent::PhaseChanged {
                    to: LevelPhase::Defeat,
                    ..
                }
            )),
            1
        );
        assert!(rig.director.enemies().iter().all(|e| e.actor.vx == 0.0));
    }

    fn defeats(rig: &Rig) -> usize {
        rig.count(|e| {
            matches!(
                e,
                DirectorEvent::PhaseChanged {
                    to: LevelPhase::Defeat,
                    ..
                }
            )
        })
    }

    #[test]
    fn boss_contact_defeats_exactly_once() {
        let mut rig = Rig::boss_fight(DirectorConfig::default());
        let boss = rig.director.boss().map(|b| b.actor.id).unwrap_or(EntityId(0));
        for _ in 0..5 {
            rig.step_with(Buttons::default(), vec![Overlap::PlayerBoss(boss)], &mut NoFeedback);
        }
        assert_eq!(rig.director.phase(), LevelPhase::Defeat);
        assert_eq!(defeats(&rig), 1);
        assert!(rig.events.contains(&DirectorEvent::PhaseChanged {
            from: LevelPhase::BossFight,
            to: LevelPhase::Defeat
        }));
        assert!(rig.director.boss().is_some_and(|b| b.actor.vx == 0.0));
    }

    #[test]
    fn projectile_overlap_is_lethal_once() {
        let mut rig = Rig::boss_fight(DirectorConfig::default());
        let boss_x = rig.director.boss().map(|b| b.actor.x).unwrap_or_default();
        // Close enough to draw an attack, high enough that the ball rolls underneath.
        rig.player_x = boss_x - 150.0;
        rig.player_y = GROUND_Y - 250.0;
        let mut ball = None;
        for _ in 0..80 {
            ball = rig.director.projectiles().iter().next().map(|p| p.id);
            if ball.is_some() {
                break;
            }
            rig.idle(1);
        }
        let ball = ball.expect("boss never released a projectile");
        assert_eq!(rig.director.phase(), LevelPhase::BossFight);

        for _ in 0..3 {
            rig.step(Buttons::default(), vec![Overlap::PlayerProjectile(ball)]);
        }
        assert_eq!(rig.director.phase(), LevelPhase::Defeat);
        assert_eq!(defeats(&rig), 1);
        assert_eq!(
            rig.count(|e| *e
                == DirectorEvent::ProjectileDestroyed {
                    id: ball,
                    reason: DespawnReason::HitTarget
                }),
            1
        );
        assert!(rig.director.projectiles().is_empty());
    }

    #[test]
    fn restart_drops_pending_timers() {
        let mut rig = Rig::new(DirectorConfig::default());
        let enemy = rig.until_enemy();
        let swing = rig.swing();
        // Corpse cleanup and hitbox expiry are now pending on the old level's clock.
        rig.step(Buttons::default(), vec![Overlap::HitboxEnemy(swing, enemy)]);
        assert_eq!(rig.director.hitboxes().len(), 1);

        rig.player_y = 900.0;
        rig.idle(1);
        assert_eq!(rig.director.phase(), LevelPhase::Defeat);
        rig.player_y = GROUND_Y;
        rig.idle(1);
        rig.step(press_restart(), Vec::new());
        assert_eq!(rig.director.phase(), LevelPhase::Spawning);
        assert!(rig.director.hitboxes().is_empty());
        let destroyed = |rig: &Rig| {
            rig.count(|e| {
                *e == DirectorEvent::EntityDestroyed {
                    id: enemy,
                    kind: EntityKind::Enemy,
                }
            })
        };
        assert_eq!(destroyed(&rig), 1);

        // The new level reuses the old id; a stale cleanup would remove the newcomer.
        rig.idle(80);
        assert!(rig
            .director
            .enemies()
            .iter()
            .any(|e| e.actor.id == enemy && e.actor.active));
        assert_eq!(destroyed(&rig), 1);
        assert!(rig.director.hitboxes().is_empty());
        assert_eq!(rig.director.phase(), LevelPhase::Spawning);
    }

    #[test]
    fn restart_needs_release_then_press() {
        let mut rig = Rig::new(DirectorConfig::default());
        let enemy = rig.until_enemy();
        rig.step(press_restart(), vec![Overlap::PlayerEnemy(enemy)]);
        assert_eq!(rig.director.phase(), LevelPhase::Defeat);

        rig.step(press_restart(), Vec::new());
        rig.step(
            Buttons {
                restart_held: true,
                ..Buttons::default()
            },
            Vec::new(),
        );
        assert_eq!(rig.director.phase(), LevelPhase::Defeat);

        rig.idle(1);
        assert_eq!(rig.director.phase(), LevelPhase::Defeat);
        rig.step(press_restart(), Vec::new());
        assert_eq!(rig.director.phase(), LevelPhase::Spawning);
        assert_eq!(
            rig.count(|e| *e
                == DirectorEvent::PhaseChanged {
                    from: LevelPhase::Defeat,
                    to: LevelPhase::Intro
                }),
            1
        );
        assert_eq!(rig.director.spawned_count(), 0);
        assert!(rig.director.enemies().is_empty());
        assert_eq!(rig.director.gameplay_now_ms(), 0.0);
        assert_eq!(
            rig.director.player_intent().respawn_at,
            Some((140.0, GROUND_Y))
        );
    }

    #[test]
    fn falling_out_of_the_world_is_lethal() {
        let mut rig = Rig::new(DirectorConfig::default());
        rig.player_y = 900.0;
        rig.idle(1);
        assert_eq!(rig.director.phase(), LevelPhase::Defeat);
    }

    #[test]
    fn melee_kills_once_per_swing_and_banks_kills() {
        let mut rig = Rig::new(DirectorConfig::default());
        let enemy = rig.until_enemy();
        let swing = rig.swing();
        for _ in 0..3 {
            rig.step(Buttons::default(), vec![Overlap::HitboxEnemy(swing, enemy)]);
        }
        assert_eq!(
            rig.count(|e| matches!(
                e,
                DirectorEvent::EntityDied {
                    cause: DeathCause::Melee,
                    ..
                }
            )),
            1
        );
        assert_eq!(rig.director.hud().kills, 1);
        assert_eq!(rig.fx.shakes.len(), 1);
        assert_eq!(rig.fx.shakes[0].duration_ms, 50);
        assert_eq!(rig.director.phase(), LevelPhase::Spawning);

        // Corpse is cleaned up after the death animation.
        rig.idle(70);
        assert_eq!(
            rig.count(|e| *e
                == DirectorEvent::EntityDestroyed {
                    id: enemy,
                    kind: EntityKind::Enemy
                }),
            1
        );
    }

    #[test]
    fn wounding_hit_plays_hit_sound() {
        let mut cfg = DirectorConfig::default();
        cfg.enemy.hp = 2;
        let mut rig = Rig::new(cfg);
        let enemy = rig.until_enemy();
        let swing = rig.swing();
        rig.step(Buttons::default(), vec![Overlap::HitboxEnemy(swing, enemy)]);
        assert!(rig.events.contains(&DirectorEvent::HitLanded {
            attacker: EntityKind::Player,
            target: enemy,
            damage: 1
        }));
        assert_eq!(
            rig.count(|e| matches!(e, DirectorEvent::EntityDied { .. })),
            0
        );
        assert_eq!(
            rig.count(|e| matches!(
                e,
                DirectorEvent::Music(AudioCommand::SfxPlayed { sfx: Sfx::Hit, .. })
            )),
            1
        );
    }

    #[test]
    fn boss_hit_flashes_in_hud() {
        let mut rig = Rig::boss_fight(DirectorConfig::default());
        let boss = rig.director.boss().map(|b| b.actor.id).unwrap_or(EntityId(0));
        rig.player_x = rig.director.boss().map(|b| b.actor.x).unwrap_or_default() - 600.0;
        let swing = rig.swing();
        assert!(!rig.director.hud().boss_flashing);
        assert_eq!(rig.director.hud().boss_anim, Some(BossAnim::Walk));

        rig.step(Buttons::default(), vec![Overlap::HitboxBoss(swing, boss)]);
        assert!(rig.director.hud().boss_flashing);
        assert_eq!(rig.director.hud().boss_hp, Some(9));
        rig.idle(6);
        assert!(!rig.director.hud().boss_flashing);
    }

    #[test]
    fn hitbox_expires_on_gameplay_clock() {
        let mut rig = Rig::new(DirectorConfig::default());
        rig.swing();
        assert_eq!(rig.director.hitboxes().len(), 1);
        rig.idle(11);
        assert!(rig.director.hitboxes().is_empty());
    }

    #[test]
    fn super_clears_field_and_resets_charge() {
        let mut rig = Rig::new(DirectorConfig::default());
        for _ in 0..4 {
            let enemy = rig.until_enemy();
            let swing = rig.swing();
            rig.step(Buttons::default(), vec![Overlap::HitboxEnemy(swing, enemy)]);
            rig.idle(20);
        }
        assert!(rig.director.hud().super_ready);
        let enemy = rig.until_enemy();
        rig.step(
            Buttons {
                super_attack: true,
                ..Buttons::default()
            },
            Vec::new(),
        );
        assert!(!rig.director.hud().super_ready);
        assert_eq!(rig.director.hud().kills, 0);
        assert!(rig.events.contains(&DirectorEvent::EntityDied {
            id: enemy,
            kind: EntityKind::Enemy,
            cause: DeathCause::Super
        }));
        assert!(rig
            .fx
            .shakes
            .iter()
            .any(|s| s.duration_ms == 220 && s.intensity == 0.02));
    }

    #[test]
    fn boss_projectile_hits_player() {
        let mut rig = Rig::boss_fight(DirectorConfig::default());
        let boss_x = rig.director.boss().map(|b| b.actor.x).unwrap_or_default();
        rig.player_x = boss_x - 150.0;
        rig.idle(60);
        assert_eq!(rig.director.phase(), LevelPhase::Defeat);
        assert_eq!(
            rig.count(|e| matches!(e, DirectorEvent::ProjectileSpawned { .. })),
            1
        );
        assert_eq!(
            rig.count(|e| matches!(
                e,
                DirectorEvent::ProjectileDestroyed {
                    reason: DespawnReason::HitTarget,
                    ..
                }
            )),
            1
        );
        assert!(rig.events.iter().any(|e| matches!(
            e,
            DirectorEvent::Music(AudioCommand::SfxPlayed {
                sfx: Sfx::BossAttack,
                ..
            })
        )));
    }

    #[test]
    fn victory_is_terminal_until_restart() {
        let mut cfg = DirectorConfig::default();
        cfg.boss.hp = 1;
        let mut rig = Rig::boss_fight(cfg);
        let boss = rig.director.boss().map(|b| b.actor.id).unwrap_or(EntityId(0));
        rig.player_x = rig.director.boss().map(|b| b.actor.x).unwrap_or_default() - 600.0;
        let swing = rig.swing();
        rig.step(Buttons::default(), vec![Overlap::HitboxBoss(swing, boss)]);
        assert_eq!(rig.director.phase(), LevelPhase::Victory);
        assert!(rig.director.hud().boss_hp.is_none());
        assert!(rig.events.iter().any(|e| matches!(
            e,
            DirectorEvent::Music(AudioCommand::TrackStarted {
                track: MusicTrack::Win,
                looping: false
            })
        )));

        assert!(!rig.director.transition(LevelPhase::Defeat));
        rig.step(Buttons::default(), vec![Overlap::PlayerBoss(boss)]);
        assert_eq!(rig.director.phase(), LevelPhase::Victory);

        rig.step(press_restart(), Vec::new());
        assert_eq!(rig.director.phase(), LevelPhase::Spawning);
        assert!(rig.director.boss().is_none());
    }

    #[test]
    fn probe_reports_player_enemy_contact() {
        let mut rig = Rig::new(DirectorConfig::default());
        let id = rig.until_enemy();
        let enemy = rig
            .director
            .enemies()
            .iter()
            .find(|e| e.actor.id == id)
            .map(|e| e.actor.x)
            .unwrap_or_default();
        let sample = PlayerSample {
            x: enemy,
            y: GROUND_Y,
            on_ground: true,
        };
        assert!(rig
            .director
            .probe_overlaps(&sample)
            .contains(&Overlap::PlayerEnemy(id)));
    }
}
