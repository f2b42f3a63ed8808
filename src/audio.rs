//! Sound cues
//!
//! Sound is best-effort: a failed cue is logged and never touches scoring
//! or order progress.

use crate::host::{Host, PlayerId};

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// A new order was handed out
    NewOrder,
    /// Correct item picked up
    Collect,
    /// Wrong item or timeout
    Mistake,
    /// Order finished
    OrderComplete,
    /// Out of lives
    GameOver,
    /// Fell off the map and got put back
    Teleport,
}

impl SoundCue {
    /// Asset name the host resolves
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCue::NewOrder => "audio/sfx/order-up.mp3",
            SoundCue::Collect => "audio/sfx/collect.mp3",
            SoundCue::Mistake => "audio/sfx/wrong.mp3",
            SoundCue::OrderComplete => "audio/sfx/order-complete.mp3",
            SoundCue::GameOver => "audio/sfx/game-over.mp3",
            SoundCue::Teleport => "audio/sfx/whoosh.mp3",
        }
    }
}

/// Play a cue for one player unless they muted sound
pub fn play(host: &mut dyn Host, player: PlayerId, muted: bool, cue: SoundCue) {
    if muted {
        return;
    }
    if let Err(e) = host.play_sound(player, cue, false) {
        log::warn!("Sound cue {:?} for {} failed: {}", cue, player, e);
    }
}
