//! Host runtime capability interface
//!
//! The game core only ever talks to the host through [`Host`]: player
//! position queries, entity spawn/despawn, chat notices, UI pushes and sound.
//! Everything else (physics, rendering, maps) belongs to the host.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::SoundCue;
use crate::catalog::ItemCode;
use crate::sim::state::LifeLossReason;
use crate::ui::UiState;

/// Connected player identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Host-side entity handle for a spawned item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub u64);

/// Chat message color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const WHITE: Color = Color(0xff, 0xff, 0xff);
    pub const GREEN: Color = Color(0x4c, 0xd9, 0x64);
    pub const YELLOW: Color = Color(0xff, 0xd6, 0x0a);
    pub const ORANGE: Color = Color(0xff, 0x95, 0x00);
    pub const RED: Color = Color(0xff, 0x3b, 0x30);
    pub const GRAY: Color = Color(0x8e, 0x8e, 0x93);

    /// "RRGGBB", the form most hosts take for chat colors
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// What a notice is about (lets callers and tests match without parsing text)
#[derive(Debug, Clone, PartialEq)]
pub enum NoticeKind {
    NewOrder { order: Vec<ItemCode> },
    Collected { code: ItemCode, points: u64 },
    NextItem { code: ItemCode },
    OrderComplete { bonus: u64 },
    Mistake { reason: LifeLossReason, lives_left: u8 },
    OrderReset { first: ItemCode },
    GameOver { final_score: u64 },
    Nearby { code: ItemCode, required: bool },
    NotNext { code: ItemCode, expected: ItemCode },
    Teleported,
    Info,
}

/// A text notification for one player
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub color: Color,
}

impl Notice {
    pub fn new(kind: NoticeKind, text: impl Into<String>, color: Color) -> Self {
        Self {
            kind,
            text: text.into(),
            color,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, text, Color::WHITE)
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("host refused to spawn {visual_ref}: {reason}")]
    SpawnRejected { visual_ref: String, reason: String },
    #[error("audio cue {cue} failed: {reason}")]
    Audio { cue: &'static str, reason: String },
}

/// Everything the game needs from the host runtime
pub trait Host {
    /// Current position of the player's entity (None mid-disconnect)
    fn player_position(&self, player: PlayerId) -> Option<Vec3>;

    /// Move the player's entity
    fn teleport(&mut self, player: PlayerId, position: Vec3);

    /// Spawn a visual item entity. `falling` asks the host to simulate gravity on it.
    fn spawn_item(
        &mut self,
        visual_ref: &str,
        position: Vec3,
        falling: bool,
    ) -> Result<EntityHandle, HostError>;

    /// Remove an entity; unknown handles are ignored
    fn despawn(&mut self, handle: EntityHandle);

    /// Current position of a spawned entity (None if the host no longer has it)
    fn entity_position(&self, handle: EntityHandle) -> Option<Vec3>;

    /// Send a chat notice to one player
    fn notify(&mut self, player: PlayerId, notice: &Notice);

    /// Push structured state to the player's UI layer
    fn push_ui(&mut self, player: PlayerId, state: &UiState);

    /// Play a named sound cue for one player
    fn play_sound(&mut self, player: PlayerId, cue: SoundCue, looped: bool) -> Result<(), HostError>;
}
