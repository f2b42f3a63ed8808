//! Collection detector
//!
//! Once per tick per session: keep the player on the map, then check every
//! live item. Horizontal (XZ) and vertical distance are tested separately so
//! floor/ceiling height differences don't block a pickup.

use glam::Vec3;

use super::order::{self, CollectOutcome, ExpiryCause, OrderContext};
use super::state::{ItemId, ItemInstance, PlayerSession};
use crate::audio::{self, SoundCue};
use crate::host::{Color, Notice, NoticeKind};
use crate::{horizontal_distance, vertical_distance};

/// What the scan found for one item
#[derive(Debug, Clone, Copy, PartialEq)]
enum Finding {
    Collectible { distance: f32 },
    Expired(ExpiryCause),
    Nearby,
    Away,
}

/// Summary of one session scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// No player position this tick; session skipped
    pub skipped: bool,
    pub teleported: bool,
    pub collected: usize,
    pub expired: usize,
}

/// Run the detector for one session
pub fn scan_session(session: &mut PlayerSession, ctx: &mut OrderContext<'_>) -> ScanReport {
    let mut report = ScanReport::default();

    let Some(player_pos) = ctx.host.player_position(session.player) else {
        log::debug!("{}: no position this tick, skipping", session.player);
        report.skipped = true;
        return report;
    };

    // Environment safety, independent of the game state
    let detection = &ctx.settings.detection;
    if player_pos.y < detection.min_safe_y {
        log::info!("{}: fell off the map, teleporting back", session.player);
        ctx.host.teleport(session.player, detection.safe_position);
        ctx.host.notify(
            session.player,
            &Notice::new(NoticeKind::Teleported, "Whoops! Back you go.", Color::GRAY),
        );
        audio::play(ctx.host, session.player, session.muted, SoundCue::Teleport);
        report.teleported = true;
        return report;
    }

    if session.is_game_over() {
        return report;
    }

    refresh_positions(session, ctx);

    let findings: Vec<(ItemId, Finding)> = session
        .live_items
        .iter()
        .map(|item| (item.id, classify(item, player_pos, ctx)))
        .collect();

    for &(id, finding) in &findings {
        if let Finding::Expired(cause) = finding {
            order::on_item_expired(session, id, cause, ctx);
            report.expired += 1;
        }
    }

    if ctx.settings.detection.nearby_hints {
        for &(id, finding) in &findings {
            match finding {
                Finding::Nearby => send_nearby_hint(session, id, ctx),
                Finding::Away => {
                    session.recently_notified.remove(&id);
                }
                _ => {}
            }
        }
    }

    // Nearest first, so two items in reach resolve predictably
    let mut collectible: Vec<(ItemId, f32)> = findings
        .iter()
        .filter_map(|&(id, f)| match f {
            Finding::Collectible { distance } => Some((id, distance)),
            _ => None,
        })
        .collect();
    collectible.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    for (id, _) in collectible {
        match order::on_item_collected(session, id, ctx) {
            CollectOutcome::Progress | CollectOutcome::Completed => report.collected += 1,
            CollectOutcome::Mistake => break,
            _ => {}
        }
        if session.is_game_over() {
            break;
        }
    }

    order::replenish(session, ctx);
    report
}

/// Pull current positions for falling items from the host. Entities the host
/// lost are dropped from the live set without a despawn.
fn refresh_positions(session: &mut PlayerSession, ctx: &mut OrderContext<'_>) {
    let mut vanished = Vec::new();
    for item in &mut session.live_items {
        match ctx.host.entity_position(item.handle) {
            Some(pos) => item.position = pos,
            None => vanished.push(item.id),
        }
    }
    for id in vanished {
        log::debug!("{}: host lost item {:?}", session.player, id);
        order::on_item_expired(session, id, ExpiryCause::Vanished, ctx);
    }
}

fn classify(item: &ItemInstance, player_pos: Vec3, ctx: &OrderContext<'_>) -> Finding {
    if item.floor_y.is_some_and(|floor| item.position.y < floor) {
        return Finding::Expired(ExpiryCause::Floor);
    }
    if item.expires_at.is_some_and(|at| ctx.now >= at) {
        return Finding::Expired(ExpiryCause::Lifetime);
    }

    let detection = &ctx.settings.detection;
    let horizontal = horizontal_distance(item.position, player_pos);
    let vertical = vertical_distance(item.position, player_pos);

    if horizontal < detection.collect_radius && vertical < detection.vertical_tolerance {
        Finding::Collectible {
            distance: horizontal,
        }
    } else if (detection.nearby_min..=detection.nearby_max).contains(&horizontal) {
        Finding::Nearby
    } else {
        Finding::Away
    }
}

fn send_nearby_hint(session: &mut PlayerSession, id: ItemId, ctx: &mut OrderContext<'_>) {
    let Some(item) = session.item(id) else {
        return;
    };
    if session.recently_notified.contains(&id) {
        return;
    }
    let code = item.code.clone();
    let required = session.required_code() == Some(&code);
    session.recently_notified.insert(id);

    let name = ctx.catalog.display_name(&code);
    let (text, color) = if required {
        (format!("{name} nearby, that's the one you need!"), Color::GREEN)
    } else {
        (format!("{name} nearby, not the one you need"), Color::GRAY)
    };
    ctx.host.notify(
        session.player,
        &Notice::new(NoticeKind::Nearby { code, required }, text, color),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OrderCatalog;
    use crate::headless::HeadlessHost;
    use crate::host::Host;
    use crate::settings::{GameSettings, Variant};
    use crate::sim::state::ItemState;
    use crate::sim::timers::TimerQueue;

    fn scan(
        session: &mut PlayerSession,
        host: &mut HeadlessHost,
        timers: &mut TimerQueue,
        settings: &GameSettings,
        now: u64,
    ) -> ScanReport {
        let catalog = OrderCatalog::default();
        let mut ctx = OrderContext {
            catalog: &catalog,
            settings,
            host,
            timers,
            now,
        };
        scan_session(session, &mut ctx)
    }

    fn start(
        session: &mut PlayerSession,
        host: &mut HeadlessHost,
        timers: &mut TimerQueue,
        settings: &GameSettings,
    ) {
        let catalog = OrderCatalog::default();
        let mut ctx = OrderContext {
            catalog: &catalog,
            settings,
            host,
            timers,
            now: 0,
        };
        order::start_new_order(session, &mut ctx);
    }

    fn item_pos(session: &PlayerSession, code: &str) -> Vec3 {
        session
            .live_items
            .iter()
            .find(|i| i.code.as_str() == code)
            .unwrap()
            .position
    }

    /// Forget every live item except the first with `code`
    fn keep_only_first(session: &mut PlayerSession, code: &str) {
        let keep = session
            .live_items
            .iter()
            .find(|i| i.code.as_str() == code)
            .map(|i| i.id);
        session.live_items.retain(|i| Some(i.id) == keep);
    }

    /// Spawn an item with `code` at `position` and hand it to the session
    fn plant_at(session: &mut PlayerSession, host: &mut HeadlessHost, code: &str, position: Vec3) {
        let handle = host.spawn_item("test", position, false).unwrap();
        let id = session.next_item_id();
        session.live_items.push(ItemInstance {
            id,
            code: code.into(),
            handle,
            position,
            spawned_at: 0,
            state: ItemState::Grounded,
            floor_y: None,
            expires_at: None,
        });
    }

    #[test]
    fn test_wrong_items_underfoot_notify_once_each() {
        let settings = GameSettings::from_variant(Variant::Combo);
        let mut host = HeadlessHost::new();
        let player = host.add_player(Vec3::ZERO);
        let mut timers = TimerQueue::new();
        let mut session = PlayerSession::new(player, 3, 5);
        start(&mut session, &mut host, &mut timers, &settings);

        plant_at(&mut session, &mut host, "N", Vec3::new(0.2, 0.0, 0.0));
        plant_at(&mut session, &mut host, "S", Vec3::new(-0.2, 0.0, 0.0));
        for now in 1..=10 {
            scan(&mut session, &mut host, &mut timers, &settings, now);
        }

        let not_next = host
            .notices_for(player)
            .filter(|n| matches!(n.kind, NoticeKind::NotNext { .. }))
            .count();
        assert_eq!(not_next, 2);
        assert_eq!(session.lives, 3);
        assert!(session.has_live_code(&"N".into()));
        assert!(session.has_live_code(&"S".into()));
    }

    #[test]
    fn test_walk_onto_required_item() {
        let settings = GameSettings::default();
        let mut host = HeadlessHost::new();
        let player = host.add_player(Vec3::ZERO);
        let mut timers = TimerQueue::new();
        let mut session = PlayerSession::new(player, 3, 5);
        start(&mut session, &mut host, &mut timers, &settings);

        // Standing still: everything is 4-12 units away, nothing collected
        let report = scan(&mut session, &mut host, &mut timers, &settings, 1);
        assert_eq!(report.collected, 0);

        // Step onto the burger, but 1.5 units higher (within vertical tolerance)
        keep_only_first(&mut session, "B");
        let target = item_pos(&session, "B") + Vec3::new(0.0, 1.5, 0.0);
        host.move_player(player, target);
        let report = scan(&mut session, &mut host, &mut timers, &settings, 2);
        assert_eq!(report.collected, 1);
        assert_eq!(session.order_progress, 1);
        assert_eq!(session.score, settings.points_per_item);
    }

    #[test]
    fn test_vertical_gap_blocks_pickup() {
        let settings = GameSettings::default();
        let mut host = HeadlessHost::new();
        let player = host.add_player(Vec3::ZERO);
        let mut timers = TimerQueue::new();
        let mut session = PlayerSession::new(player, 3, 5);
        start(&mut session, &mut host, &mut timers, &settings);

        let target = item_pos(&session, "B") + Vec3::new(0.0, 5.0, 0.0);
        host.move_player(player, target);
        scan(&mut session, &mut host, &mut timers, &settings, 1);
        assert_eq!(session.order_progress, 0);
        assert_eq!(session.lives, 3);
    }

    #[test]
    fn test_fall_off_map_teleports() {
        let settings = GameSettings::default();
        let mut host = HeadlessHost::new();
        let player = host.add_player(Vec3::new(0.0, -50.0, 0.0));
        let mut timers = TimerQueue::new();
        let mut session = PlayerSession::new(player, 3, 5);

        let report = scan(&mut session, &mut host, &mut timers, &settings, 1);
        assert!(report.teleported);
        assert_eq!(
            host.player_position(player),
            Some(settings.detection.safe_position)
        );

        // Still active after game over
        session.status = crate::sim::state::SessionStatus::GameOver;
        host.move_player(player, Vec3::new(0.0, -50.0, 0.0));
        assert!(scan(&mut session, &mut host, &mut timers, &settings, 2).teleported);
    }

    #[test]
    fn test_missing_player_is_skipped() {
        let settings = GameSettings::default();
        let mut host = HeadlessHost::new();
        let player = host.add_player(Vec3::ZERO);
        let mut timers = TimerQueue::new();
        let mut session = PlayerSession::new(player, 3, 5);
        start(&mut session, &mut host, &mut timers, &settings);

        host.remove_player(player);
        let report = scan(&mut session, &mut host, &mut timers, &settings, 1);
        assert!(report.skipped);
        assert_eq!(session.lives, 3);
    }

    #[test]
    fn test_nearby_hint_sent_once() {
        let settings = GameSettings::default();
        let mut host = HeadlessHost::new();
        let player = host.add_player(Vec3::ZERO);
        let mut timers = TimerQueue::new();
        let mut session = PlayerSession::new(player, 3, 5);
        start(&mut session, &mut host, &mut timers, &settings);

        let hints = |host: &HeadlessHost| {
            host.notices_for(player)
                .filter(|n| matches!(n.kind, NoticeKind::Nearby { .. }))
                .count()
        };

        scan(&mut session, &mut host, &mut timers, &settings, 1);
        let first = hints(&host);
        scan(&mut session, &mut host, &mut timers, &settings, 2);
        assert_eq!(hints(&host), first);
        assert_eq!(session.recently_notified.len(), first);

        // Walk far away: flags clear, come back: hints again
        host.move_player(player, Vec3::new(500.0, 0.0, 500.0));
        scan(&mut session, &mut host, &mut timers, &settings, 3);
        assert!(session.recently_notified.is_empty());
        host.move_player(player, Vec3::ZERO);
        scan(&mut session, &mut host, &mut timers, &settings, 4);
        assert_eq!(hints(&host), first * 2);
    }

    #[test]
    fn test_lane_drop_floor_expiry() {
        let settings = GameSettings::from_variant(Variant::Rush);
        let mut host = HeadlessHost::new();
        let player = host.add_player(Vec3::ZERO);
        let mut timers = TimerQueue::new();
        let mut session = PlayerSession::new(player, 3, 5);
        start(&mut session, &mut host, &mut timers, &settings);
        assert!(session.live_items.iter().all(|i| i.state == ItemState::Falling));

        // Park the player away from the lanes and let everything fall through
        host.move_player(player, Vec3::new(100.0, 0.0, 100.0));
        let mut now = 1;
        while session.lives == 3 && now < 10_000 {
            host.step(1.0 / 60.0);
            scan(&mut session, &mut host, &mut timers, &settings, now);
            now += 1;
        }
        assert_eq!(session.lives, 2);
        assert_eq!(session.order_progress, 0);
        // Retry batch went out
        assert!(session.has_live_code(&"B".into()));
    }

    #[test]
    fn test_lifetime_expiry_replenishes_required() {
        let settings = GameSettings {
            item_lifetime_secs: Some(1.0),
            ..GameSettings::default()
        };
        let mut host = HeadlessHost::new();
        let player = host.add_player(Vec3::ZERO);
        let mut timers = TimerQueue::new();
        let mut session = PlayerSession::new(player, 3, 5);
        start(&mut session, &mut host, &mut timers, &settings);

        let report = scan(&mut session, &mut host, &mut timers, &settings, 60);
        assert_eq!(report.expired, settings.items_per_order);
        assert_eq!(session.lives, 3);
        assert_eq!(session.live_items.len(), 1);
        assert!(session.has_live_code(&"B".into()));
    }

    #[test]
    fn test_vanished_entity_is_dropped_quietly() {
        let settings = GameSettings::default();
        let mut host = HeadlessHost::new();
        let player = host.add_player(Vec3::ZERO);
        let mut timers = TimerQueue::new();
        let mut session = PlayerSession::new(player, 3, 5);
        start(&mut session, &mut host, &mut timers, &settings);

        let victim = session.live_items.iter().find(|i| i.code.as_str() != "B").map(|i| i.handle);
        if let Some(handle) = victim {
            host.despawn(handle);
            let before = session.live_items.len();
            scan(&mut session, &mut host, &mut timers, &settings, 1);
            assert!(session.live_items.len() < before);
            assert_eq!(session.lives, 3);
        }
    }
}
