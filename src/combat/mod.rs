pub mod hitbox;
pub mod ledger;
pub mod projectile;
pub mod super_attack;

pub use hitbox::{HitboxController, HitboxHandle, HitboxSpec};
pub use ledger::HitLedger;
pub use projectile::{DespawnReason, ProjectileEvent, ProjectileId, ProjectileSimulator};
