/// Handle for a pending delayed action. Ids are never reused within a scheduler.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TimerId(u64);

struct Pending<A> {
    id: TimerId,
    due_ms: f64,
    action: A,
}

/// Cancellable delayed actions against a monotonic millisecond clock.
///
/// Actions never fire inside the call that scheduled them: `advance` only hands back what
/// was pending when it was called, so anything scheduled while handling those actions waits
/// for the next tick boundary.
pub struct Scheduler<A> {
    now_ms: f64,
    next_id: u64,
    pending: Vec<Pending<A>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn after(&mut self, delay_ms: f64, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due_ms: self.now_ms + delay_ms.max(0.0),
            action,
        });
        id
    }

    /// Returns false when the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Moves the clock forward and returns every action now due, oldest deadline first.
    pub fn advance(&mut self, dt_ms: f64) -> Vec<A> {
        self.now_ms += dt_ms.max(0.0);
        let now = self.now_ms;
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due_ms <= now);
        self.pending = rest;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.id.0.cmp(&b.id.0)));
        due.into_iter().map(|p| p.action).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
