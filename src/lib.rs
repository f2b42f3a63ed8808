//! McOrder Dash - an order-collecting mini-game for a hosted 3D game server
//!
//! Core modules:
//! - `sim`: Per-player order state machine, item placement, collection detection
//! - `catalog`: Items and canned order templates
//! - `host`: Narrow capability interface onto the host runtime
//! - `settings`: Data-driven game tuning and variant presets
//! - `commands`, `ui`, `audio`, `highscores`: player-facing plumbing

pub mod audio;
pub mod catalog;
pub mod commands;
pub mod headless;
pub mod highscores;
pub mod host;
pub mod settings;
pub mod sim;
pub mod ui;

pub use catalog::{ItemCode, OrderCatalog};
pub use highscores::HighScores;
pub use host::{Host, PlayerId};
pub use settings::{GameSettings, Variant};
pub use sim::SessionRegistry;

use glam::{Vec3, Vec3Swizzles};

/// Game configuration constants
pub mod consts {
    /// Host tick rate (ticks per second)
    pub const TICK_RATE_HZ: u32 = 60;

    /// Lives a fresh session starts with
    pub const STARTING_LIVES: u8 = 3;
    /// Items placed per order (required + random extras)
    pub const ITEMS_PER_ORDER: usize = 6;

    /// Score for each correct item
    pub const POINTS_PER_ITEM: u64 = 10;
    /// Bonus for completing an order
    pub const ORDER_BONUS: u64 = 50;

    /// Time allowed per order
    pub const ORDER_TIME_SECS: f32 = 60.0;
    /// Pause between a completed order and the next one
    pub const NEXT_ORDER_DELAY_SECS: f32 = 2.0;

    /// Horizontal pickup radius
    pub const COLLECT_RADIUS: f32 = 1.5;
    /// Vertical pickup tolerance (checked separately from horizontal)
    pub const VERTICAL_TOLERANCE: f32 = 2.0;
    /// "Nearby" hint band (horizontal distance)
    pub const NEARBY_MIN: f32 = 3.0;
    pub const NEARBY_MAX: f32 = 8.0;

    /// Players below this height get teleported back
    pub const MIN_SAFE_Y: f32 = -10.0;
}

/// Convert a duration in seconds to whole host ticks (at least one)
#[inline]
pub fn secs_to_ticks(secs: f32) -> u64 {
    ((secs.max(0.0) * consts::TICK_RATE_HZ as f32).round() as u64).max(1)
}

/// Distance in the XZ plane, ignoring height
#[inline]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    a.xz().distance(b.xz())
}

/// Absolute height difference
#[inline]
pub fn vertical_distance(a: Vec3, b: Vec3) -> f32 {
    (a.y - b.y).abs()
}
