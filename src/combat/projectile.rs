use serde::Serialize;

use crate::geometry::Aabb;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct ProjectileId(u64);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DespawnReason {
    /// Fell into the kill zone trailing the camera.
    BehindCamera,
    Expired,
    HitTarget,
    /// Discarded together with the level.
    Teardown,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProjectileEvent {
    Hit(ProjectileId),
    Despawned(ProjectileId, DespawnReason),
}

/// A rolling ball moving along a fixed line.
#[derive(Clone, Debug)]
pub struct Projectile {
    pub id: ProjectileId,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub radius: f32,
    /// Visual rotation in radians.
    pub rotation: f32,
    pub spawned_at_ms: f64,
    pub max_lifetime_ms: f64,
}

impl Projectile {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_radius(self.x, self.y, self.radius)
    }
}

/// Ranged attacks are stepped here by hand instead of going through the physics
/// provider's broad phase: many can spawn in one tick and none of them needs more than
/// a horizontal move and a box test.
pub struct ProjectileSimulator {
    next_id: u64,
    despawn_margin_px: f32,
    projectiles: Vec<Projectile>,
}

impl ProjectileSimulator {
    pub fn new(despawn_margin_px: f32) -> Self {
        Self {
            next_id: 0,
            despawn_margin_px,
            projectiles: Vec::new(),
        }
    }

    pub fn spawn(
        &mut self,
        x: f32,
        y: f32,
        vx: f32,
        radius: f32,
        now_ms: f64,
        max_lifetime_ms: f64,
    ) -> ProjectileId {
        self.next_id += 1;
        let id = ProjectileId(self.next_id);
        self.projectiles.push(Projectile {
            id,
            x,
            y,
            vx,
            radius: radius.max(0.001),
            rotation: 0.0,
            spawned_at_ms: now_ms,
            max_lifetime_ms,
        });
        id
    }

    /// Moves every projectile, then tests it against `target`, then against the despawn
    /// rules. A hit short-circuits the despawn check for that projectile this tick.
    pub fn step(
        &mut self,
        dt_secs: f32,
        now_ms: f64,
        camera_scroll_x: f32,
        target: Option<Aabb>,
    ) -> Vec<ProjectileEvent> {
        let kill_x = camera_scroll_x - self.despawn_margin_px;
        let mut events = Vec::new();
        self.projectiles.retain_mut(|p| {
            let dx = p.vx * dt_secs;
            p.x += dx;
            p.rotation += dx / p.radius;

            if target.is_some_and(|t| p.bounds().overlaps(&t)) {
                events.push(ProjectileEvent::Hit(p.id));
                return false;
            }
            if p.x < kill_x {
                events.push(ProjectileEvent::Despawned(p.id, DespawnReason::BehindCamera));
                return false;
            }
            if now_ms - p.spawned_at_ms >= p.max_lifetime_ms {
                events.push(ProjectileEvent::Despawned(p.id, DespawnReason::Expired));
                return false;
            }
            true
        });
        events
    }

    /// Removes a projectile reported by an external overlap. None if already gone.
    pub fn take(&mut self, id: ProjectileId) -> Option<Projectile> {
        let idx = self.projectiles.iter().position(|p| p.id == id)?;
        Some(self.projectiles.remove(idx))
    }

    pub fn halt(&mut self) {
        for p in &mut self.projectiles {
            p.vx = 0.0;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }
}
