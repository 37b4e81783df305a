use std::collections::HashMap;

use serde::Serialize;

use crate::combat::ledger::HitLedger;
use crate::entities::EntityId;
use crate::geometry::Aabb;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct HitboxHandle(u64);

#[derive(Clone, Copy, Debug)]
pub struct HitboxSpec {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub duration_ms: f64,
    pub dir: f32,
    pub damage: i32,
}

/// Non-rendered hit volume of a single swing. It never moves by itself.
#[derive(Debug)]
pub struct MeleeHitbox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub dir: f32,
    pub damage: i32,
    pub spawned_at_ms: f64,
    pub expires_at_ms: f64,
    ledger: HitLedger,
}

impl MeleeHitbox {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.x, self.y, self.width, self.height)
    }
}

/// Owns every live hitbox. Destroying a hitbox drops its ledger with it.
#[derive(Default)]
pub struct HitboxController {
    next_id: u64,
    live: HashMap<HitboxHandle, MeleeHitbox>,
}

impl HitboxController {
    pub fn spawn(&mut self, spec: HitboxSpec, now_ms: f64) -> HitboxHandle {
        self.next_id += 1;
        let handle = HitboxHandle(self.next_id);
        self.live.insert(
            handle,
            MeleeHitbox {
                x: spec.x,
                y: spec.y,
                width: spec.width,
                height: spec.height,
                dir: spec.dir,
                damage: spec.damage,
                spawned_at_ms: now_ms,
                expires_at_ms: now_ms + spec.duration_ms.max(0.0),
                ledger: HitLedger::default(),
            },
        );
        handle
    }

    /// Called once per tick by the owner to track a moving attacker.
    pub fn reposition(&mut self, handle: HitboxHandle, x: f32, y: f32) -> bool {
        match self.live.get_mut(&handle) {
            Some(hb) => {
                hb.x = x;
                hb.y = y;
                true
            }
            None => false,
        }
    }

    /// Live means not destroyed and not past its deadline, whatever the tick rate.
    pub fn is_live(&self, handle: HitboxHandle, now_ms: f64) -> bool {
        self.live
            .get(&handle)
            .is_some_and(|hb| now_ms < hb.expires_at_ms)
    }

    /// Credits `target` against this swing. False for repeats and for dead hitboxes.
    pub fn try_hit(&mut self, handle: HitboxHandle, target: EntityId, now_ms: f64) -> bool {
        match self.live.get_mut(&handle) {
            Some(hb) if now_ms < hb.expires_at_ms => hb.ledger.try_hit(target),
            _ => false,
        }
    }

    /// Idempotent.
    pub fn destroy(&mut self, handle: HitboxHandle) -> bool {
        self.live.remove(&handle).is_some()
    }

    pub fn get(&self, handle: HitboxHandle) -> Option<&MeleeHitbox> {
        self.live.get(&handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (HitboxHandle, &MeleeHitbox)> {
        self.live.iter().map(|(h, hb)| (*h, hb))
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
