use serde::Serialize;

use crate::geometry::Aabb;

/// Stable identity of a spawned actor within one level build.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize)]
pub struct EntityId(pub u64);

#[derive(Default)]
pub struct EntityIds {
    next: u64,
}

impl EntityIds {
    pub fn allocate(&mut self) -> EntityId {
        self.next = self.next.saturating_add(1);
        EntityId(self.next)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Enemy,
    Boss,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Melee,
    Super,
    /// Left behind the camera; removed without a death animation.
    Despawn,
}

/// Position, velocity and liveness shared by every actor. `x`/`y` is the body center.
#[derive(Clone, Debug)]
pub struct Actor {
    pub id: EntityId,
    pub kind: EntityKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub width: f32,
    pub height: f32,
    /// Inactive actors take part in no collision and no AI.
    pub active: bool,
    pub health: i32,
    /// -1 faces left, 1 faces right.
    pub facing: f32,
}

impl Actor {
    pub fn new(id: EntityId, kind: EntityKind, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            kind,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            width,
            height,
            active: true,
            health: 1,
            facing: 1.0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.x, self.y, self.width, self.height)
    }

    pub fn halt(&mut self) {
        self.vx = 0.0;
        self.vy = 0.0;
    }
}

/// Which of the two death presentations an enemy plays.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum DeathVariant {
    First,
    Second,
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub actor: Actor,
    pub death: Option<(DeathCause, Option<DeathVariant>)>,
}

impl Enemy {
    /// Enemies walk left at constant speed along the ground line; no gravity.
    pub fn new(id: EntityId, x: f32, ground_top_y: f32, width: f32, height: f32, speed: f32) -> Self {
        let mut actor = Actor::new(
            id,
            EntityKind::Enemy,
            x,
            ground_top_y - height * 0.5,
            width,
            height,
        );
        actor.facing = -1.0;
        actor.vx = -speed;
        Self { actor, death: None }
    }

    pub fn is_dead(&self) -> bool {
        self.death.is_some()
    }

    /// Returns false if the enemy was already dead.
    pub fn die(&mut self, cause: DeathCause, rng: &mut impl rand::Rng) -> bool {
        if self.is_dead() {
            return false;
        }
        let variant = match cause {
            DeathCause::Despawn => None,
            _ if rng.gen_bool(0.5) => Some(DeathVariant::First),
            _ => Some(DeathVariant::Second),
        };
        self.death = Some((cause, variant));
        self.actor.active = false;
        self.actor.halt();
        true
    }

    pub fn step(&mut self, dt_secs: f32) {
        if !self.actor.active {
            return;
        }
        self.actor.x += self.actor.vx * dt_secs;
    }
}
