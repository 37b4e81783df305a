use crate::config::PlayerConfig;
use crate::entities::{Actor, EntityId, EntityKind};
use crate::geometry::Aabb;

/// Player state the director owns. Position itself comes from the physics provider.
pub struct PlayerController {
    pub facing: f32,
    kills: u32,
    next_attack_at_ms: f64,
    attacking_until_ms: f64,
    last_on_ground_ms: f64,
    last_jump_pressed_ms: Option<f64>,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self {
            facing: 1.0,
            kills: 0,
            next_attack_at_ms: 0.0,
            attacking_until_ms: f64::NEG_INFINITY,
            last_on_ground_ms: f64::NEG_INFINITY,
            last_jump_pressed_ms: None,
        }
    }
}

impl PlayerController {
    /// Facing follows the held direction; both or neither keeps the last one.
    pub fn update_facing(&mut self, left: bool, right: bool) {
        if left != right {
            self.facing = if left { -1.0 } else { 1.0 };
        }
    }

    /// Coyote time and jump buffering. Returns true when a jump should start this tick.
    pub fn update_jump(
        &mut self,
        now_ms: f64,
        on_ground: bool,
        jump_pressed: bool,
        cfg: &PlayerConfig,
    ) -> bool {
        if on_ground {
            self.last_on_ground_ms = now_ms;
        }
        if jump_pressed {
            self.last_jump_pressed_ms = Some(now_ms);
        }
        let can_coyote = now_ms - self.last_on_ground_ms <= cfg.coyote_ms;
        let buffered = self
            .last_jump_pressed_ms
            .is_some_and(|at| now_ms - at <= cfg.jump_buffer_ms);
        if buffered && (on_ground || can_coyote) {
            self.last_jump_pressed_ms = None;
            return true;
        }
        false
    }

    pub fn clear_jump_buffer(&mut self) {
        self.last_jump_pressed_ms = None;
    }

    pub fn is_attacking(&self, now_ms: f64) -> bool {
        now_ms < self.attacking_until_ms
    }

    /// Starts a swing if the cooldown allows it. Returns the facing captured at the press.
    pub fn try_begin_melee(&mut self, now_ms: f64, cfg: &PlayerConfig) -> Option<f32> {
        if now_ms < self.next_attack_at_ms || self.is_attacking(now_ms) {
            return None;
        }
        self.next_attack_at_ms = now_ms + cfg.attack_cooldown_ms;
        self.attacking_until_ms = now_ms + cfg.attack_anim_ms;
        Some(self.facing)
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn add_kill(&mut self) -> u32 {
        self.kills = self.kills.saturating_add(1);
        self.kills
    }

    pub fn super_ready(&self, cfg: &PlayerConfig) -> bool {
        self.kills >= cfg.super_kills_required
    }

    /// Consumes the charge. False when not enough kills have been banked.
    pub fn try_super(&mut self, cfg: &PlayerConfig) -> bool {
        if !self.super_ready(cfg) {
            return false;
        }
        self.kills = 0;
        true
    }
}

pub struct Player {
    pub actor: Actor,
    pub controller: PlayerController,
}

impl Player {
    pub fn new(id: EntityId, cfg: &PlayerConfig) -> Self {
        Self {
            actor: Actor::new(id, EntityKind::Player, 0.0, 0.0, cfg.body_width, cfg.body_height),
            controller: PlayerController::default(),
        }
    }

    pub fn hitbox_size(&self, cfg: &PlayerConfig) -> (f32, f32) {
        (
            cfg.hitbox_min_size.max(self.actor.width * 1.25),
            cfg.hitbox_min_size.max(self.actor.height * 0.8),
        )
    }

    /// Hitbox center just in front of the body, slightly above mid-height so it meets
    /// enemies standing on the ground line.
    pub fn hitbox_anchor(&self, facing: f32, hitbox_width: f32, cfg: &PlayerConfig) -> (f32, f32) {
        let body: Aabb = self.actor.bounds();
        (
            body.center_x()
                + facing * (body.width() * 0.5 + hitbox_width * 0.5 + cfg.hitbox_padding),
            body.center_y() - body.height() * 0.15,
        )
    }
}
