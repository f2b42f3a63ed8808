//! Game settings and variant presets
//!
//! Every tunable lives here. Loaded from JSON; anything missing falls back
//! to the defaults in [`crate::consts`].

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::secs_to_ticks;
use crate::sim::placement::PlacementStrategy;

/// Script variants the game ships with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Variant {
    /// Items scattered around the player, wrong item costs a life
    #[default]
    Classic,
    /// Scattered items, combo bonus, wrong items are ignored
    Combo,
    /// Items drop from above into lanes
    Rush,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Classic => "Classic",
            Variant::Combo => "Combo",
            Variant::Rush => "Rush",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(Variant::Classic),
            "combo" => Some(Variant::Combo),
            "rush" | "drop" => Some(Variant::Rush),
            _ => None,
        }
    }
}

/// What happens when a player picks up something that isn't next on the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Lose a life and restart the order
    #[default]
    Penalize,
    /// Leave the item where it is, no credit, no penalty
    Ignore,
}

/// Combo scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboSettings {
    /// Max gap between required pickups to keep the streak going
    pub window_secs: f32,
    /// Paid per streak step beyond the first, at order completion
    pub bonus_per_step: u64,
}

impl Default for ComboSettings {
    fn default() -> Self {
        Self {
            window_secs: 3.0,
            bonus_per_step: 15,
        }
    }
}

/// Proximity tuning for the collection detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub collect_radius: f32,
    pub vertical_tolerance: f32,
    pub nearby_min: f32,
    pub nearby_max: f32,
    /// Send nearby hints at all
    pub nearby_hints: bool,
    pub min_safe_y: f32,
    pub safe_position: Vec3,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            collect_radius: COLLECT_RADIUS,
            vertical_tolerance: VERTICAL_TOLERANCE,
            nearby_min: NEARBY_MIN,
            nearby_max: NEARBY_MAX,
            nearby_hints: true,
            min_safe_y: MIN_SAFE_Y,
            safe_position: Vec3::new(0.0, 10.0, 0.0),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Game tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub variant: Variant,

    // === Lives & Scoring ===
    pub starting_lives: u8,
    pub points_per_item: u64,
    pub order_bonus: u64,
    /// None disables combo scoring
    pub combo: Option<ComboSettings>,
    pub mismatch: MismatchPolicy,

    // === Timing ===
    pub order_time_secs: f32,
    pub next_order_delay_secs: f32,
    /// None = items stay until collected or the order ends
    pub item_lifetime_secs: Option<f32>,

    // === Items ===
    pub items_per_order: usize,
    pub placement: PlacementStrategy,
    pub detection: DetectionSettings,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            variant: Variant::Classic,

            starting_lives: STARTING_LIVES,
            points_per_item: POINTS_PER_ITEM,
            order_bonus: ORDER_BONUS,
            combo: None,
            mismatch: MismatchPolicy::Penalize,

            order_time_secs: ORDER_TIME_SECS,
            next_order_delay_secs: NEXT_ORDER_DELAY_SECS,
            item_lifetime_secs: None,

            items_per_order: ITEMS_PER_ORDER,
            placement: PlacementStrategy::default(),
            detection: DetectionSettings::default(),
        }
    }
}

impl GameSettings {
    /// Settings for a variant (applies the variant's defaults)
    pub fn from_variant(variant: Variant) -> Self {
        let mut settings = Self::default();
        settings.apply_variant(variant);
        settings
    }

    /// Switch variant, adjusting the settings that define it
    pub fn apply_variant(&mut self, variant: Variant) {
        self.variant = variant;
        match variant {
            Variant::Classic => {
                self.placement = PlacementStrategy::default();
                self.mismatch = MismatchPolicy::Penalize;
                self.combo = None;
            }
            Variant::Combo => {
                self.placement = PlacementStrategy::default();
                self.mismatch = MismatchPolicy::Ignore;
                self.combo = Some(ComboSettings::default());
            }
            Variant::Rush => {
                self.placement = PlacementStrategy::lane_drop();
                self.mismatch = MismatchPolicy::Penalize;
                self.combo = None;
                self.detection.nearby_hints = false;
            }
        }
    }

    pub fn order_ticks(&self) -> u64 {
        secs_to_ticks(self.order_time_secs)
    }

    pub fn next_order_delay_ticks(&self) -> u64 {
        secs_to_ticks(self.next_order_delay_secs)
    }

    pub fn item_lifetime_ticks(&self) -> Option<u64> {
        self.item_lifetime_secs.map(secs_to_ticks)
    }

    pub fn combo_window_ticks(&self) -> Option<u64> {
        self.combo.map(|c| secs_to_ticks(c.window_secs))
    }

    /// Reject settings the game can't run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.starting_lives == 0 {
            return Err(SettingsError::Invalid("starting_lives must be at least 1".into()));
        }
        if self.order_time_secs <= 0.0 {
            return Err(SettingsError::Invalid("order_time_secs must be positive".into()));
        }
        let d = &self.detection;
        if d.collect_radius <= 0.0 || d.vertical_tolerance <= 0.0 {
            return Err(SettingsError::Invalid("collection radii must be positive".into()));
        }
        if d.nearby_min > d.nearby_max {
            return Err(SettingsError::Invalid("nearby_min exceeds nearby_max".into()));
        }
        self.placement.validate().map_err(SettingsError::Invalid)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings from disk, falling back to `fallback` on any error
    pub fn load_or(path: &Path, fallback: Self) -> Self {
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({}): {}", path.display(), e);
                fallback
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
