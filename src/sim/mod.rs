//! Deterministic game core
//!
//! All gameplay logic lives here. Everything runs off the host tick:
//! - Time is measured in ticks only
//! - Seeded per-session RNG only
//! - Stable iteration order (sessions by player id, items by id)
//! - The host is reached through the `Host` trait, never directly

pub mod detector;
pub mod order;
pub mod placement;
pub mod registry;
pub mod state;
pub mod timers;

pub use detector::{ScanReport, scan_session};
pub use order::{CollectOutcome, ExpiryCause, OrderContext};
pub use placement::PlacementStrategy;
pub use registry::SessionRegistry;
pub use state::{ItemId, ItemInstance, ItemState, LifeLossReason, PlayerSession, SessionStatus};
pub use timers::{TimerHandle, TimerKind, TimerQueue};
