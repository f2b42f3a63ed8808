//! Per-player session state
//!
//! One [`PlayerSession`] per connected player. Its live items and timer are
//! owned exclusively by the session.

use std::collections::HashSet;
use std::fmt;

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::timers::TimerHandle;
use crate::catalog::ItemCode;
use crate::host::{EntityHandle, PlayerId};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created, no order handed out yet
    Idle,
    /// Working on an order (or waiting for the next one)
    InProgress,
    /// Out of lives
    GameOver,
}

/// Item lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    /// Dropping toward the floor (lane-drop only)
    Falling,
    /// Resting in the world
    Grounded,
    Collected,
    Expired,
}

/// Session-local item id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

/// A placed, collectible item
#[derive(Debug, Clone)]
pub struct ItemInstance {
    pub id: ItemId,
    pub code: ItemCode,
    pub handle: EntityHandle,
    pub position: Vec3,
    pub spawned_at: u64,
    pub state: ItemState,
    /// Falling items below this height have hit the floor
    pub floor_y: Option<f32>,
    /// Tick at which the item times out
    pub expires_at: Option<u64>,
}

/// Why a life was lost
#[derive(Debug, Clone, PartialEq)]
pub enum LifeLossReason {
    TimeExpired,
    WrongItem { expected: ItemCode, got: ItemCode },
    Dropped { code: ItemCode },
}

impl fmt::Display for LifeLossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifeLossReason::TimeExpired => f.write_str("time expired"),
            LifeLossReason::WrongItem { expected, .. } => {
                write!(f, "wrong item, expected {expected}")
            }
            LifeLossReason::Dropped { code } => write!(f, "{code} hit the floor"),
        }
    }
}

/// One player's complete game state
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub player: PlayerId,
    pub score: u64,
    pub lives: u8,
    pub current_order: Vec<ItemCode>,
    /// Index of the next required item; equals the order length once fulfilled
    pub order_progress: usize,
    /// Orders started this session
    pub order_count: u32,
    pub orders_completed: u32,
    pub status: SessionStatus,
    /// Placed, uncollected items (sorted by id)
    pub live_items: Vec<ItemInstance>,
    /// The one outstanding order timer (expiry or next-order delay)
    pub active_timer: Option<TimerHandle>,
    /// Items we already sent a proximity hint for
    pub recently_notified: HashSet<ItemId>,
    /// Wrong items we already told the player about (ignore policy)
    pub not_next_notified: HashSet<ItemId>,
    /// Current combo streak
    pub combo: u32,
    /// Best streak within the current order
    pub order_best_combo: u32,
    pub last_collect_tick: Option<u64>,
    /// Tick the current order expires at (for the UI countdown)
    pub order_deadline: Option<u64>,
    pub muted: bool,
    /// State changed since the last UI push
    pub dirty: bool,
    /// Final score already went to the leaderboard
    pub score_recorded: bool,
    pub rng: Pcg32,
    next_item_id: u32,
}

impl PlayerSession {
    pub fn new(player: PlayerId, lives: u8, seed: u64) -> Self {
        Self {
            player,
            score: 0,
            lives,
            current_order: Vec::new(),
            order_progress: 0,
            order_count: 0,
            orders_completed: 0,
            status: SessionStatus::Idle,
            live_items: Vec::new(),
            active_timer: None,
            recently_notified: HashSet::new(),
            not_next_notified: HashSet::new(),
            combo: 0,
            order_best_combo: 0,
            last_collect_tick: None,
            order_deadline: None,
            muted: false,
            dirty: true,
            score_recorded: false,
            rng: Pcg32::seed_from_u64(seed ^ player.0.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
            next_item_id: 1,
        }
    }

    /// Allocate a new item id
    pub fn next_item_id(&mut self) -> ItemId {
        let id = ItemId(self.next_item_id);
        self.next_item_id += 1;
        id
    }

    pub fn is_game_over(&self) -> bool {
        self.status == SessionStatus::GameOver
    }

    pub fn order_fulfilled(&self) -> bool {
        !self.current_order.is_empty() && self.order_progress >= self.current_order.len()
    }

    /// Next item the player has to pick up
    pub fn required_code(&self) -> Option<&ItemCode> {
        self.current_order.get(self.order_progress)
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemInstance> {
        self.live_items.iter().find(|i| i.id == id)
    }

    /// Remove an item from the live set. Returns None if it was already gone,
    /// so each item leaves the set exactly once.
    pub fn take_item(&mut self, id: ItemId, state: ItemState) -> Option<ItemInstance> {
        let idx = self.live_items.iter().position(|i| i.id == id)?;
        let mut item = self.live_items.remove(idx);
        item.state = state;
        self.recently_notified.remove(&id);
        self.not_next_notified.remove(&id);
        Some(item)
    }

    /// Remove every live item
    pub fn drain_items(&mut self) -> Vec<ItemInstance> {
        self.recently_notified.clear();
        self.not_next_notified.clear();
        std::mem::take(&mut self.live_items)
    }

    pub fn has_live_code(&self, code: &ItemCode) -> bool {
        self.live_items.iter().any(|i| &i.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(session: &mut PlayerSession, code: &str) -> ItemId {
        let id = session.next_item_id();
        session.live_items.push(ItemInstance {
            id,
            code: code.into(),
            handle: EntityHandle(id.0 as u64),
            position: Vec3::ZERO,
            spawned_at: 0,
            state: ItemState::Grounded,
            floor_y: None,
            expires_at: None,
        });
        id
    }

    #[test]
    fn test_new_session_defaults() {
        let session = PlayerSession::new(PlayerId(7), 3, 1);
        assert_eq!(session.score, 0);
        assert_eq!(session.lives, 3);
        assert_eq!(session.order_count, 0);
        assert_eq!(session.status, SessionStatus::Idle);
        assert!(session.required_code().is_none());
        assert!(!session.order_fulfilled());
    }

    #[test]
    fn test_take_item_only_once() {
        let mut session = PlayerSession::new(PlayerId(1), 3, 1);
        let a = item(&mut session, "B");
        let _b = item(&mut session, "F");
        session.recently_notified.insert(a);
        session.not_next_notified.insert(a);

        let taken = session.take_item(a, ItemState::Collected).unwrap();
        assert_eq!(taken.state, ItemState::Collected);
        assert!(!session.recently_notified.contains(&a));
        assert!(!session.not_next_notified.contains(&a));
        assert!(session.take_item(a, ItemState::Expired).is_none());
        assert_eq!(session.live_items.len(), 1);
    }

    #[test]
    fn test_reason_display() {
        let reason = LifeLossReason::WrongItem {
            expected: "B".into(),
            got: "N".into(),
        };
        assert_eq!(reason.to_string(), "wrong item, expected B");
        assert_eq!(LifeLossReason::TimeExpired.to_string(), "time expired");
    }
}
