//! In-process host with no rendering
//!
//! Keeps players and entities in memory and records everything the game
//! sends. Used by the demo binary and the tests.

use std::collections::{BTreeMap, HashMap, HashSet};

use glam::Vec3;

use crate::audio::SoundCue;
use crate::host::{EntityHandle, Host, HostError, Notice, PlayerId};
use crate::ui::UiState;

/// Fall speed for entities spawned with `falling` (units/second)
pub const FALL_SPEED: f32 = 8.0;

#[derive(Debug, Clone)]
pub struct Entity {
    pub visual_ref: String,
    pub position: Vec3,
    pub falling: bool,
}

#[derive(Debug, Default)]
pub struct HeadlessHost {
    players: BTreeMap<PlayerId, Vec3>,
    entities: HashMap<u64, Entity>,
    notices: Vec<(PlayerId, Notice)>,
    sounds: Vec<(PlayerId, SoundCue)>,
    ui: HashMap<PlayerId, (usize, UiState)>,
    rejected_visuals: HashSet<String>,
    audio_broken: bool,
    next_player: u64,
    next_entity: u64,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a player at `position`
    pub fn add_player(&mut self, position: Vec3) -> PlayerId {
        self.next_player += 1;
        let player = PlayerId(self.next_player);
        self.players.insert(player, position);
        player
    }

    pub fn move_player(&mut self, player: PlayerId, position: Vec3) {
        if let Some(p) = self.players.get_mut(&player) {
            *p = position;
        }
    }

    /// Drop the player's entity (as if mid-disconnect)
    pub fn remove_player(&mut self, player: PlayerId) {
        self.players.remove(&player);
    }

    pub fn position_of(&self, player: PlayerId) -> Result<Vec3, HostError> {
        self.players
            .get(&player)
            .copied()
            .ok_or(HostError::UnknownPlayer(player))
    }

    /// Advance host physics by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        for entity in self.entities.values_mut().filter(|e| e.falling) {
            entity.position.y -= FALL_SPEED * dt;
        }
    }

    /// Refuse every future spawn of this visual
    pub fn reject_visual(&mut self, visual_ref: &str) {
        self.rejected_visuals.insert(visual_ref.to_string());
    }

    pub fn set_audio_broken(&mut self, broken: bool) {
        self.audio_broken = broken;
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&Entity> {
        self.entities.get(&handle.0)
    }

    pub fn notices_for(&self, player: PlayerId) -> impl Iterator<Item = &Notice> {
        self.notices
            .iter()
            .filter(move |(p, _)| *p == player)
            .map(|(_, n)| n)
    }

    pub fn sounds(&self) -> &[(PlayerId, SoundCue)] {
        &self.sounds
    }

    /// Number of UI pushes a player received
    pub fn ui_pushes(&self, player: PlayerId) -> usize {
        self.ui.get(&player).map(|(n, _)| *n).unwrap_or(0)
    }

    pub fn last_ui(&self, player: PlayerId) -> Option<&UiState> {
        self.ui.get(&player).map(|(_, state)| state)
    }
}

impl Host for HeadlessHost {
    fn player_position(&self, player: PlayerId) -> Option<Vec3> {
        self.players.get(&player).copied()
    }

    fn teleport(&mut self, player: PlayerId, position: Vec3) {
        match self.players.get_mut(&player) {
            Some(p) => *p = position,
            None => log::debug!("teleport for unknown {}", player),
        }
    }

    fn spawn_item(
        &mut self,
        visual_ref: &str,
        position: Vec3,
        falling: bool,
    ) -> Result<EntityHandle, HostError> {
        if self.rejected_visuals.contains(visual_ref) {
            return Err(HostError::SpawnRejected {
                visual_ref: visual_ref.to_string(),
                reason: "visual rejected".into(),
            });
        }
        self.next_entity += 1;
        self.entities.insert(
            self.next_entity,
            Entity {
                visual_ref: visual_ref.to_string(),
                position,
                falling,
            },
        );
        Ok(EntityHandle(self.next_entity))
    }

    fn despawn(&mut self, handle: EntityHandle) {
        if let Some(entity) = self.entities.remove(&handle.0) {
            log::trace!("despawned {} ({})", handle.0, entity.visual_ref);
        }
    }

    fn entity_position(&self, handle: EntityHandle) -> Option<Vec3> {
        self.entities.get(&handle.0).map(|e| e.position)
    }

    fn notify(&mut self, player: PlayerId, notice: &Notice) {
        log::debug!("[{}] #{} {}", player, notice.color.hex(), notice.text);
        self.notices.push((player, notice.clone()));
    }

    fn push_ui(&mut self, player: PlayerId, state: &UiState) {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("ui {} {}", player, state.to_json());
        }
        let entry = self.ui.entry(player).or_insert_with(|| (0, state.clone()));
        entry.0 += 1;
        entry.1 = state.clone();
    }

    fn play_sound(&mut self, player: PlayerId, cue: SoundCue, _looped: bool) -> Result<(), HostError> {
        if self.audio_broken {
            return Err(HostError::Audio {
                cue: cue.as_str(),
                reason: "no audio device".into(),
            });
        }
        self.sounds.push((player, cue));
        Ok(())
    }
}
