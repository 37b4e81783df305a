use std::collections::VecDeque;

use bevy::prelude::*;
use serde::Serialize;

use crate::audio::AudioCommand;
use crate::combat::{DespawnReason, ProjectileId};
use crate::entities::{DeathCause, EntityId, EntityKind};
use crate::level::LevelPhase;

const MAX_EVENTS: usize = 500;

/// Everything the director tells the renderer, HUD and audio output about.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DirectorEvent {
    PhaseChanged {
        from: LevelPhase,
        to: LevelPhase,
    },
    EntitySpawned {
        id: EntityId,
        kind: EntityKind,
        x: f32,
        y: f32,
    },
    EntityDied {
        id: EntityId,
        kind: EntityKind,
        cause: DeathCause,
    },
    /// Presentation can be detached.
    EntityDestroyed {
        id: EntityId,
        kind: EntityKind,
    },
    HitLanded {
        attacker: EntityKind,
        target: EntityId,
        damage: i32,
    },
    KillCountChanged {
        kills: u32,
        super_ready: bool,
    },
    BossHealthChanged {
        hp: i32,
        max_hp: i32,
    },
    ProjectileSpawned {
        id: ProjectileId,
        x: f32,
        y: f32,
        vx: f32,
    },
    ProjectileDestroyed {
        id: ProjectileId,
        reason: DespawnReason,
    },
    SuperActivated {
        x: f32,
        y: f32,
        dir: f32,
    },
    Music(AudioCommand),
}

#[derive(Serialize, Clone)]
pub struct LoggedEvent {
    pub frame: u64,
    pub event: DirectorEvent,
}

/// Recent director output, newest last.
#[derive(Resource, Default)]
pub struct DirectorEventLog {
    pub recent: VecDeque<LoggedEvent>,
    pub frame: u64,
    pub dropped_events: u64,
    last_overflow_log_frame: u64,
}

impl DirectorEventLog {
    pub fn push(&mut self, event: DirectorEvent) {
        self.recent.push_back(LoggedEvent {
            frame: self.frame,
            event,
        });
        if self.recent.len() > MAX_EVENTS {
            let excess = self.recent.len() - MAX_EVENTS;
            for _ in 0..excess {
                self.recent.pop_front();
            }
            self.dropped_events = self.dropped_events.saturating_add(excess as u64);
            if self.frame.saturating_sub(self.last_overflow_log_frame) >= 60 {
                self.last_overflow_log_frame = self.frame;
                warn!(
                    "[Encounter events] Dropped {} logged events (total dropped: {})",
                    excess, self.dropped_events
                );
            }
        }
    }

    pub fn advance_frame(&mut self) {
        self.frame = self.frame.saturating_add(1);
    }
}
