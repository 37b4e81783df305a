use serde::Serialize;

use crate::config::BossConfig;
use crate::entities::{Actor, EntityId, EntityKind};

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum BossState {
    Approach,
    /// Locked in place until the attack animation completes. `dir` is fixed at attack start.
    Attacking { dir: f32 },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BossAnim {
    Idle,
    Walk,
    Attack,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HitOutcome {
    /// Boss already dead or gone.
    Ignored,
    Damaged { hp: i32 },
    Killed,
}

pub struct BossContext {
    pub now_ms: f64,
    pub dt_secs: f32,
    pub player_x: f32,
    pub arena_left: f32,
    pub arena_right: f32,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum BossAction {
    None,
    AttackStarted { dir: f32 },
}

/// Where the ranged attack leaves the boss once the animation completes.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ProjectileLaunch {
    pub x: f32,
    pub dir: f32,
}

pub struct Boss {
    pub actor: Actor,
    pub max_hp: i32,
    state: BossState,
    anim: BossAnim,
    next_attack_at_ms: f64,
    flash_until_ms: f64,
}

impl Boss {
    pub fn new(id: EntityId, x: f32, ground_top_y: f32, cfg: &BossConfig) -> Self {
        let mut actor = Actor::new(
            id,
            EntityKind::Boss,
            x,
            ground_top_y - cfg.height * 0.5,
            cfg.width,
            cfg.height,
        );
        actor.health = cfg.hp;
        actor.facing = -1.0;
        Self {
            actor,
            max_hp: cfg.hp,
            state: BossState::Approach,
            anim: BossAnim::Idle,
            next_attack_at_ms: 0.0,
            flash_until_ms: f64::NEG_INFINITY,
        }
    }

    pub fn state(&self) -> BossState {
        self.state
    }

    pub fn anim(&self) -> BossAnim {
        self.anim
    }

    pub fn hp(&self) -> i32 {
        self.actor.health
    }

    pub fn is_alive(&self) -> bool {
        self.actor.active
    }

    pub fn is_flashing(&self, now_ms: f64) -> bool {
        now_ms < self.flash_until_ms
    }

    /// Approach/attack cadence for one tick. Inactive bosses do nothing.
    pub fn update(&mut self, ctx: &BossContext, cfg: &BossConfig) -> BossAction {
        if !self.actor.active {
            return BossAction::None;
        }
        let actor = &mut self.actor;
        actor.facing = if ctx.player_x < actor.x { -1.0 } else { 1.0 };
        actor.x = actor.x.clamp(ctx.arena_left, ctx.arena_right);

        if self.state == BossState::Approach {
            let step = (ctx.player_x - actor.x).clamp(-1.0, 1.0);
            actor.vx = step * cfg.speed;
            self.anim = if step.abs() > 0.1 {
                BossAnim::Walk
            } else {
                BossAnim::Idle
            };
        }

        let close = (ctx.player_x - actor.x).abs() < cfg.proximity_px;
        if close && ctx.now_ms >= self.next_attack_at_ms && self.state == BossState::Approach {
            let dir = actor.facing;
            self.state = BossState::Attacking { dir };
            self.next_attack_at_ms = ctx.now_ms + cfg.attack_cooldown_ms;
            self.anim = BossAnim::Attack;
            actor.vx = 0.0;
            return BossAction::AttackStarted { dir };
        }

        actor.x = (actor.x + actor.vx * ctx.dt_secs).clamp(ctx.arena_left, ctx.arena_right);
        BossAction::None
    }

    /// Attack animation finished: unlock movement and release the projectile in the
    /// direction captured when the attack began.
    pub fn complete_attack(&mut self, cfg: &BossConfig) -> Option<ProjectileLaunch> {
        let BossState::Attacking { dir } = self.state else {
            return None;
        };
        self.state = BossState::Approach;
        if !self.actor.active {
            return None;
        }
        Some(ProjectileLaunch {
            x: self.actor.x + dir * cfg.release_offset_px,
            dir,
        })
    }

    pub fn take_hit(&mut self, amount: i32, now_ms: f64, cfg: &BossConfig) -> HitOutcome {
        if !self.actor.active {
            return HitOutcome::Ignored;
        }
        self.actor.health -= amount;
        self.flash_until_ms = now_ms + cfg.flash_ms;
        if self.actor.health <= 0 {
            self.actor.active = false;
            self.actor.halt();
            return HitOutcome::Killed;
        }
        HitOutcome::Damaged {
            hp: self.actor.health,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(now_ms: f64, player_x: f32) -> BossContext {
        BossContext {
            now_ms,
            dt_secs: 0.016,
            player_x,
            arena_left: 0.0,
            arena_right: 16000.0,
        }
    }

    fn boss_at(x: f32) -> Boss {
        Boss::new(EntityId(1), x, 340.0, &BossConfig::default())
    }

    #[test]
    fn approaches_player_when_far() {
        let cfg = BossConfig::default();
        let mut boss = boss_at(2000.0);
        assert_eq!(boss.update(&ctx(0.0, 1000.0), &cfg), BossAction::None);
        assert_eq!(boss.actor.vx, -cfg.speed);
        assert_eq!(boss.actor.facing, -1.0);
        assert_eq!(boss.anim(), BossAnim::Walk);
        assert!(boss.actor.x < 2000.0);
    }

    #[test]
    fn attacks_when_close_and_locks_movement() {
        let cfg = BossConfig::default();
        let mut boss = boss_at(1100.0);
        let action = boss.update(&ctx(0.0, 1000.0), &cfg);
        assert_eq!(action, BossAction::AttackStarted { dir: -1.0 });
        assert_eq!(boss.actor.vx, 0.0);
        assert_eq!(boss.state(), BossState::Attacking { dir: -1.0 });

        // Still attacking: no new attack, no movement.
        assert_eq!(boss.update(&ctx(500.0, 1000.0), &cfg), BossAction::None);
        assert_eq!(boss.actor.x, 1100.0);
    }

    #[test]
    fn release_uses_direction_from_attack_start() {
        let cfg = BossConfig::default();
        let mut boss = boss_at(1100.0);
        boss.update(&ctx(0.0, 1000.0), &cfg);
        // Player jumps over the boss mid-attack.
        boss.update(&ctx(300.0, 1200.0), &cfg);
        assert_eq!(boss.actor.facing, 1.0);
        let launch = boss.complete_attack(&cfg).expect("projectile released");
        assert_eq!(launch.dir, -1.0);
        assert_eq!(launch.x, 1100.0 - cfg.release_offset_px);
        assert_eq!(boss.state(), BossState::Approach);
        assert!(boss.complete_attack(&cfg).is_none());
    }

    #[test]
    fn cooldown_gates_next_attack() {
        let cfg = BossConfig::default();
        let mut boss = boss_at(1100.0);
        boss.update(&ctx(0.0, 1000.0), &cfg);
        boss.complete_attack(&cfg);
        assert_eq!(boss.update(&ctx(640.0, 1000.0), &cfg), BossAction::None);
        assert!(matches!(
            boss.update(&ctx(900.0, 1000.0), &cfg),
            BossAction::AttackStarted { .. }
        ));
    }

    #[test]
    fn confined_to_arena() {
        let cfg = BossConfig::default();
        let mut boss = boss_at(5000.0);
        let c = BossContext {
            arena_left: 0.0,
            arena_right: 4000.0,
            ..ctx(0.0, 9000.0)
        };
        boss.update(&c, &cfg);
        assert!(boss.actor.x <= 4000.0);
    }

    #[test]
    fn damage_flashes_and_kills() {
        let cfg = BossConfig::default();
        let mut boss = boss_at(1000.0);
        assert_eq!(boss.take_hit(1, 100.0, &cfg), HitOutcome::Damaged { hp: 9 });
        assert!(boss.is_flashing(150.0));
        assert!(!boss.is_flashing(180.0));
        assert_eq!(boss.take_hit(9, 200.0, &cfg), HitOutcome::Killed);
        assert!(!boss.is_alive());
        assert_eq!(boss.take_hit(1, 300.0, &cfg), HitOutcome::Ignored);
        assert_eq!(boss.update(&ctx(400.0, 1000.0), &cfg), BossAction::None);
    }

    #[test]
    fn dead_boss_releases_nothing() {
        let cfg = BossConfig::default();
        let mut boss = boss_at(1100.0);
        boss.update(&ctx(0.0, 1000.0), &cfg);
        boss.take_hit(10, 100.0, &cfg);
        assert!(boss.complete_attack(&cfg).is_none());
    }
}
