use serde::{Deserialize, Serialize};

use crate::kernel::module::{ModuleHandle, ModuleId};
use crate::kernel::time::Tick;

/// Ordinal rank of a request. Higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Priority(pub i32);

impl Priority {
    pub const NOT_IMPORTANT: Priority = Priority(0);
    pub const IMPORTANT_FOR_USAGE_1: Priority = Priority(10);
    pub const IMPORTANT_FOR_USAGE_2: Priority = Priority(20);
    pub const IMPORTANT_FOR_USAGE_3: Priority = Priority(30);
    pub const IMPORTANT_FOR_PLAYER_LIFE: Priority = Priority(40);
    pub const IMPORTANT_FOR_USER_SAFETY: Priority = Priority(50);
}

pub struct Request<T> {
    pub lifetime_ticks: u32,
    pub priority: Priority,
    pub owner: ModuleHandle,
    pub value: T,
}

impl<T> Request<T> {
    pub fn new(lifetime_ticks: u32, priority: Priority, owner: ModuleHandle, value: T) -> Self {
        Self { lifetime_ticks, priority, owner, value }
    }
}

struct Contender<T> {
    request: Request<T>,
    expires_at: Tick,
    seq: u64,
}

impl<T> Contender<T> {
    fn is_live(&self, now: Tick) -> bool {
        self.expires_at > now && self.request.owner.is_active()
    }
}

/// Countdown + priority arbitration over a single shared resource.
///
/// At most one request is active at any time: the live contender with the
/// highest priority, ties going to the most recent submission. Outranked
/// requests stay as standby contenders (one per owner) and take over if they
/// outlive the winner. A request submitted with lifetime `n` survives `n`
/// calls to [`ArbitrationSlot::tick`].
pub struct ArbitrationSlot<T> {
    now: Tick,
    next_seq: u64,
    contenders: Vec<Contender<T>>,
}

impl<T> Default for ArbitrationSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ArbitrationSlot<T> {
    pub fn new() -> Self {
        Self {
            now: Tick::new(),
            next_seq: 0,
            contenders: Vec::new(),
        }
    }

    /// Submits a request. Nothing is reported back: an outranked request simply
    /// does not become active.
    pub fn request(&mut self, request: Request<T>) {
        if request.lifetime_ticks == 0 || !request.owner.is_active() {
            return;
        }

        // A module only ever contends with its newest request.
        let owner = request.owner.id();
        self.contenders.retain(|c| c.request.owner.id() != owner);

        let seq = self.next_seq;
        self.next_seq += 1;
        let expires_at = self.now.after(request.lifetime_ticks);
        self.contenders.push(Contender { request, expires_at, seq });
    }

    fn winner(&self) -> Option<&Contender<T>> {
        self.contenders
            .iter()
            .filter(|c| c.is_live(self.now))
            .max_by_key(|c| (c.request.priority, c.seq))
    }

    pub fn active_value(&self) -> Option<&T> {
        self.winner().map(|c| &c.request.value)
    }

    pub fn active_request(&self) -> Option<&Request<T>> {
        self.winner().map(|c| &c.request)
    }

    pub fn active_owner(&self) -> Option<ModuleId> {
        self.winner().map(|c| c.request.owner.id())
    }

    /// Ticks left before the active request expires.
    pub fn active_remaining(&self) -> Option<u64> {
        self.winner().map(|c| c.expires_at.ticks_since(self.now))
    }

    /// Advances the countdown by one step and evicts expired or orphaned requests.
    /// Returns how many were evicted.
    pub fn tick(&mut self) -> usize {
        self.now = self.now.next();
        let before = self.contenders.len();
        let now = self.now;
        self.contenders.retain(|c| c.is_live(now));
        before - self.contenders.len()
    }

    pub fn clear(&mut self) {
        self.contenders.clear();
    }

    pub fn contender_count(&self) -> usize {
        self.contenders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contenders.is_empty()
    }
}
