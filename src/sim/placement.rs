//! Item placement policy
//!
//! Decides where items go: scatter in a ring around the player, scatter
//! anywhere inside fixed world bounds, or drop from above into discrete lanes.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{ItemInstance, ItemState, PlayerSession};
use crate::catalog::{ItemCode, OrderCatalog};
use crate::host::Host;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Uniform angle, uniform radius in [min_radius, max_radius] around the player
    ScatterNearPlayer {
        min_radius: f32,
        max_radius: f32,
        /// Height above the player's feet
        height_offset: f32,
    },
    /// Uniform over an XZ rectangle of the map, at a fixed height
    ScatterInBounds {
        min_x: f32,
        max_x: f32,
        min_z: f32,
        max_z: f32,
        height: f32,
    },
    /// Items start above one of `lanes` lanes and fall (host-simulated)
    LaneDrop {
        lanes: u32,
        lane_spacing: f32,
        /// Spawn height above the player
        spawn_height: f32,
        /// Extra height per batch position so items arrive one after another
        drop_stagger: f32,
        /// Lanes sit this far in front of the player (+Z)
        forward_offset: f32,
        /// Items falling this far below the player's height have hit the floor
        floor_depth: f32,
    },
}

impl Default for PlacementStrategy {
    fn default() -> Self {
        PlacementStrategy::ScatterNearPlayer {
            min_radius: 4.0,
            max_radius: 12.0,
            height_offset: 0.5,
        }
    }
}

impl PlacementStrategy {
    /// Default lane-drop tuning
    pub fn lane_drop() -> Self {
        PlacementStrategy::LaneDrop {
            lanes: 5,
            lane_spacing: 2.5,
            spawn_height: 15.0,
            drop_stagger: 4.0,
            forward_offset: 3.0,
            floor_depth: 1.0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match *self {
            PlacementStrategy::ScatterNearPlayer {
                min_radius,
                max_radius,
                ..
            } => {
                if min_radius < 0.0 || max_radius < min_radius {
                    return Err(format!(
                        "scatter radius band [{min_radius}, {max_radius}] is invalid"
                    ));
                }
            }
            PlacementStrategy::ScatterInBounds {
                min_x,
                max_x,
                min_z,
                max_z,
                ..
            } => {
                if max_x < min_x || max_z < min_z {
                    return Err("scatter bounds are inverted".into());
                }
            }
            PlacementStrategy::LaneDrop { lanes, .. } => {
                if lanes == 0 {
                    return Err("lane_drop needs at least one lane".into());
                }
            }
        }
        Ok(())
    }

    pub fn is_falling(&self) -> bool {
        matches!(self, PlacementStrategy::LaneDrop { .. })
    }

    /// Position for the `index`-th item of a batch around `origin`
    pub fn sample_position<R: Rng>(&self, origin: Vec3, index: usize, rng: &mut R) -> Vec3 {
        match *self {
            PlacementStrategy::ScatterNearPlayer {
                min_radius,
                max_radius,
                height_offset,
            } => {
                let angle = rng.random_range(0.0..TAU);
                let dist = if max_radius > min_radius {
                    rng.random_range(min_radius..=max_radius)
                } else {
                    min_radius
                };
                origin + Vec3::new(angle.cos() * dist, height_offset, angle.sin() * dist)
            }
            PlacementStrategy::ScatterInBounds {
                min_x,
                max_x,
                min_z,
                max_z,
                height,
            } => Vec3::new(
                sample_span(rng, min_x, max_x),
                height,
                sample_span(rng, min_z, max_z),
            ),
            PlacementStrategy::LaneDrop {
                lanes,
                lane_spacing,
                spawn_height,
                drop_stagger,
                forward_offset,
                ..
            } => {
                let lane = rng.random_range(0..lanes);
                // Lanes centered on the player
                let offset = (lane as f32 - (lanes - 1) as f32 / 2.0) * lane_spacing;
                origin
                    + Vec3::new(
                        offset,
                        spawn_height + index as f32 * drop_stagger,
                        forward_offset,
                    )
            }
        }
    }

    /// Height below which a dropped item counts as missed
    pub fn floor_y(&self, origin: Vec3) -> Option<f32> {
        match *self {
            PlacementStrategy::LaneDrop { floor_depth, .. } => Some(origin.y - floor_depth),
            PlacementStrategy::ScatterNearPlayer { .. }
            | PlacementStrategy::ScatterInBounds { .. } => None,
        }
    }
}

fn sample_span<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}

/// Everything a placement request needs besides the session
pub struct Placement<'a> {
    pub strategy: &'a PlacementStrategy,
    pub catalog: &'a OrderCatalog,
    pub origin: Vec3,
    pub now: u64,
    pub lifetime_ticks: Option<u64>,
}

/// Place a batch of items for a session. Unknown codes and host refusals are
/// logged and skipped; the rest of the batch still goes out.
pub fn place_batch(
    session: &mut PlayerSession,
    host: &mut dyn Host,
    placement: &Placement<'_>,
    codes: &[ItemCode],
) -> Vec<ItemInstance> {
    let falling = placement.strategy.is_falling();
    let floor_y = placement.strategy.floor_y(placement.origin);
    let mut placed = Vec::with_capacity(codes.len());

    for (index, code) in codes.iter().enumerate() {
        let Some(def) = placement.catalog.item(code) else {
            log::warn!("{}: skipping placement of unknown item code {}", session.player, code);
            continue;
        };

        let position = placement
            .strategy
            .sample_position(placement.origin, index, &mut session.rng);

        let handle = match host.spawn_item(&def.visual_ref, position, falling) {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("{}: could not place {}: {}", session.player, code, e);
                continue;
            }
        };

        placed.push(ItemInstance {
            id: session.next_item_id(),
            code: code.clone(),
            handle,
            position,
            spawned_at: placement.now,
            state: if falling {
                ItemState::Falling
            } else {
                ItemState::Grounded
            },
            floor_y,
            expires_at: placement.lifetime_ticks.map(|t| placement.now + t),
        });
    }

    log::debug!(
        "{}: placed {}/{} items",
        session.player,
        placed.len(),
        codes.len()
    );
    placed
}
