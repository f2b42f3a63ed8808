//! McOrder Dash headless demo
//!
//! Runs the game core against the in-memory host with two scripted players
//! and logs how they did.
//!
//! Usage: `mcorder-dash [classic|combo|rush] [settings.json] [scores.json]`

use std::path::PathBuf;

use glam::Vec3;
use mcorder_dash::consts::TICK_RATE_HZ;
use mcorder_dash::headless::HeadlessHost;
use mcorder_dash::host::HostError;
use mcorder_dash::sim::SessionStatus;
use mcorder_dash::{GameSettings, HighScores, OrderCatalog, PlayerId, SessionRegistry, Variant};

/// Ticks the demo runs for
const DEMO_TICKS: u64 = 5 * 60 * TICK_RATE_HZ as u64;
/// Bot walking speed (units/second)
const BOT_SPEED: f32 = 6.0;
const SEED: u64 = 0x0D0E_F00D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BotStyle {
    /// Walks to the required item
    Careful,
    /// Walks to whatever is closest
    Greedy,
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let variant = args
        .next()
        .map(|s| {
            Variant::from_str(&s).unwrap_or_else(|| {
                log::warn!("Unknown variant '{}', using classic", s);
                Variant::Classic
            })
        })
        .unwrap_or_default();
    let settings = match args.next().map(PathBuf::from) {
        Some(path) => GameSettings::load_or(&path, GameSettings::from_variant(variant)),
        None => GameSettings::from_variant(variant),
    };
    let scores_path = args.next().map(PathBuf::from);

    log::info!("McOrder Dash ({}) starting, seed {:#x}", settings.variant.as_str(), SEED);

    let mut host = HeadlessHost::new();
    let mut registry = SessionRegistry::new(OrderCatalog::default(), settings, SEED);
    if let Some(path) = &scores_path {
        registry.set_leaderboard(HighScores::load(path));
    }

    let bots = [
        (host.add_player(Vec3::ZERO), BotStyle::Careful),
        (host.add_player(Vec3::new(40.0, 0.0, 0.0)), BotStyle::Greedy),
    ];
    for (player, _) in bots {
        registry.join(&mut host, player);
    }

    let dt = 1.0 / TICK_RATE_HZ as f32;
    for _ in 0..DEMO_TICKS {
        for (player, style) in bots {
            if let Err(e) = steer(&mut host, &registry, player, style, dt) {
                log::warn!("Bot {} stalled: {}", player, e);
            }
        }
        host.step(dt);
        registry.tick(&mut host);

        if registry
            .sessions()
            .all(|s| s.status == SessionStatus::GameOver)
        {
            break;
        }
    }

    for session in registry.sessions() {
        log::info!(
            "{}: score {}, {} orders completed, {} lives left, {:?}",
            session.player,
            session.score,
            session.orders_completed,
            session.lives,
            session.status
        );
    }
    log::info!("Leaderboard after {} ticks:\n{}", registry.now(), registry.leaderboard().format_table());

    for (player, _) in bots {
        registry.leave(&mut host, player);
    }
    if let Some(path) = &scores_path {
        if let Err(e) = registry.leaderboard().save(path) {
            log::warn!("Could not save high scores: {}", e);
        }
    }
}

/// Move one bot a single tick toward its target item
fn steer(
    host: &mut HeadlessHost,
    registry: &SessionRegistry,
    player: PlayerId,
    style: BotStyle,
    dt: f32,
) -> Result<(), HostError> {
    let position = host.position_of(player)?;
    let Some(session) = registry.session(player) else {
        return Ok(());
    };
    if session.status != SessionStatus::InProgress {
        return Ok(());
    }

    let target = match style {
        BotStyle::Careful => session.required_code().and_then(|code| {
            session
                .live_items
                .iter()
                .filter(|i| &i.code == code)
                .map(|i| i.position)
                .min_by(|a, b| a.distance(position).total_cmp(&b.distance(position)))
        }),
        BotStyle::Greedy => session
            .live_items
            .iter()
            .map(|i| i.position)
            .min_by(|a, b| a.distance(position).total_cmp(&b.distance(position))),
    };
    let Some(target) = target else {
        return Ok(());
    };

    // Walk on the ground plane; items above are reached once they fall
    let mut to = target - position;
    to.y = 0.0;
    let step = BOT_SPEED * dt;
    let next = if to.length() <= step {
        Vec3::new(target.x, position.y, target.z)
    } else {
        position + to.normalize() * step
    };
    host.move_player(player, next);
    Ok(())
}
