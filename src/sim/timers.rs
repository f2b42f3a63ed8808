//! Scheduled-event queue
//!
//! Replaces host `setTimeout` callbacks. Every schedule gets a fresh,
//! monotonically increasing token; a session remembers the token of its one
//! outstanding timer, and a fired event whose token doesn't match is stale.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::host::PlayerId;

/// What to do when a timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// The order ran out of time
    OrderExpired,
    /// Pacing delay after a completed order
    NextOrder,
}

/// A scheduled timer, as remembered by its session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub token: u64,
    pub kind: TimerKind,
    pub due: u64,
}

/// A timer that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub player: PlayerId,
    pub handle: TimerHandle,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    /// (due tick, token) min-heap; cancelled tokens are skipped lazily
    heap: BinaryHeap<Reverse<(u64, u64)>>,
    pending: HashMap<u64, FiredTimer>,
    next_token: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` for `player` at tick `due`
    pub fn schedule(&mut self, player: PlayerId, kind: TimerKind, due: u64) -> TimerHandle {
        self.next_token += 1;
        let handle = TimerHandle {
            token: self.next_token,
            kind,
            due,
        };
        self.heap.push(Reverse((due, handle.token)));
        self.pending.insert(handle.token, FiredTimer { player, handle });
        handle
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.pending.remove(&handle.token).is_some()
    }

    /// Cancel everything scheduled for a player
    pub fn cancel_player(&mut self, player: PlayerId) {
        self.pending.retain(|_, t| t.player != player);
    }

    /// Pop the next timer due at or before `now`
    pub fn pop_due(&mut self, now: u64) -> Option<FiredTimer> {
        while let Some(&Reverse((due, token))) = self.heap.peek() {
            if due > now {
                return None;
            }
            self.heap.pop();
            if let Some(fired) = self.pending.remove(&token) {
                return Some(fired);
            }
        }
        None
    }

    /// Outstanding timers for one player
    pub fn pending_for(&self, player: PlayerId) -> usize {
        self.pending.values().filter(|t| t.player == player).count()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
