use std::collections::HashSet;

use crate::entities::EntityId;

/// Targets already credited by one attack instance.
///
/// Overlap notifications repeat every tick while two volumes touch, so the ledger is what
/// turns "overlapping" into "hit once". It lives exactly as long as its attack instance.
#[derive(Default, Debug, Clone)]
pub struct HitLedger {
    credited: HashSet<EntityId>,
}

impl HitLedger {
    /// True the first time `target` is presented, false on every later call.
    pub fn try_hit(&mut self, target: EntityId) -> bool {
        self.credited.insert(target)
    }

    pub fn contains(&self, target: EntityId) -> bool {
        self.credited.contains(&target)
    }

    pub fn len(&self) -> usize {
        self.credited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credited.is_empty()
    }
}
