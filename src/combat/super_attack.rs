use crate::boss::{Boss, HitOutcome};
use crate::config::BossConfig;
use crate::entities::{DeathCause, Enemy, EntityId};

/// Camera shake for the super attack: (duration ms, intensity).
pub const SUPER_SHAKE: (u32, f32) = (220, 0.02);

#[derive(Debug)]
pub struct SuperOutcome {
    pub killed: Vec<EntityId>,
    pub boss: HitOutcome,
}

/// Clears every active enemy and deals chunk damage to a live boss.
pub fn activate(
    enemies: &mut [Enemy],
    boss: Option<&mut Boss>,
    boss_damage: i32,
    now_ms: f64,
    boss_cfg: &BossConfig,
    rng: &mut impl rand::Rng,
) -> SuperOutcome {
    let killed = enemies
        .iter_mut()
        .filter(|e| e.actor.active)
        .filter_map(|e| e.die(DeathCause::Super, &mut *rng).then_some(e.actor.id))
        .collect();
    let boss = match boss {
        Some(boss) => boss.take_hit(boss_damage, now_ms, boss_cfg),
        None => HitOutcome::Ignored,
    };
    SuperOutcome { killed, boss }
}
