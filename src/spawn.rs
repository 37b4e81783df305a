use crate::config::EnemyConfig;

/// A live enemy as the spacing guard sees it.
#[derive(Clone, Copy, Debug)]
pub struct LiveEnemy {
    pub x: f32,
    pub width: f32,
}

pub struct SpawnContext<'a> {
    pub now_ms: f64,
    pub player_x: f32,
    /// Player must be at least this far from the level start before anything spawns.
    pub dead_zone_px: f32,
    pub candidate_x: f32,
    pub live_enemies: &'a [LiveEnemy],
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeferReason {
    DeadZone,
    CapReached,
    Spacing,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SpawnDecision {
    /// Boss phase has been triggered; the scheduler is done for this level.
    Halted,
    NotDue,
    Deferred(DeferReason),
    Spawn { x: f32 },
}

/// Spawn position just beyond the camera's right edge, kept inside the level.
pub fn candidate_x(camera_right: f32, lead_px: f32, edge_px: f32, level_width: f32) -> f32 {
    (camera_right + lead_px).clamp(edge_px, (level_width - edge_px).max(edge_px))
}

/// Decides once per tick whether a new enemy materializes.
pub struct SpawnScheduler {
    cfg: EnemyConfig,
    level_start_ms: f64,
    next_spawn_at_ms: f64,
    spawned: u32,
    boss_triggered: bool,
}

impl SpawnScheduler {
    pub fn new(cfg: EnemyConfig, level_start_ms: f64) -> Self {
        let next_spawn_at_ms = level_start_ms + cfg.first_spawn_delay_ms;
        Self {
            cfg,
            level_start_ms,
            next_spawn_at_ms,
            spawned: 0,
            boss_triggered: false,
        }
    }

    /// Lifetime spawn count for this level (not the number currently alive).
    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn next_spawn_at_ms(&self) -> f64 {
        self.next_spawn_at_ms
    }

    /// Delay until the next spawn: linear from `spawn_initial_ms` to `spawn_min_ms` over
    /// `spawn_ramp_ms` of level time, then flat.
    pub fn cadence_delay_ms(&self, elapsed_ms: f64) -> f64 {
        let t = if self.cfg.spawn_ramp_ms <= 0.0 {
            1.0
        } else {
            (elapsed_ms / self.cfg.spawn_ramp_ms).clamp(0.0, 1.0)
        };
        (self.cfg.spawn_initial_ms + (self.cfg.spawn_min_ms - self.cfg.spawn_initial_ms) * t)
            .round()
    }

    pub fn poll(&mut self, ctx: &SpawnContext) -> SpawnDecision {
        if self.boss_triggered {
            return SpawnDecision::Halted;
        }
        if ctx.now_ms < self.next_spawn_at_ms {
            return SpawnDecision::NotDue;
        }
        if ctx.player_x < ctx.dead_zone_px {
            self.next_spawn_at_ms = ctx.now_ms + self.cfg.dead_zone_retry_ms;
            return SpawnDecision::Deferred(DeferReason::DeadZone);
        }
        if self.spawned >= self.cfg.max_spawned {
            self.next_spawn_at_ms = ctx.now_ms + self.cfg.cap_retry_ms;
            return SpawnDecision::Deferred(DeferReason::CapReached);
        }

        let rightmost = ctx
            .live_enemies
            .iter()
            .copied()
            .max_by(|a, b| a.x.total_cmp(&b.x));
        if let Some(enemy) = rightmost {
            let min_gap = enemy.width * self.cfg.spacing_widths;
            if ctx.candidate_x - enemy.x < min_gap {
                // Retry soon; the ramp is measured from level start so it is unaffected.
                self.next_spawn_at_ms = ctx.now_ms + self.cfg.spacing_retry_ms;
                return SpawnDecision::Deferred(DeferReason::Spacing);
            }
        }

        self.spawned += 1;
        let elapsed = ctx.now_ms - self.level_start_ms;
        self.next_spawn_at_ms = ctx.now_ms + self.cadence_delay_ms(elapsed);
        SpawnDecision::Spawn { x: ctx.candidate_x }
    }

    /// Fires exactly once: when every allowed enemy has spawned and none is left alive.
    pub fn check_boss_trigger(&mut self, live_count: usize) -> bool {
        if self.boss_triggered || self.spawned < self.cfg.max_spawned || live_count > 0 {
            return false;
        }
        self.boss_triggered = true;
        true
    }
}
