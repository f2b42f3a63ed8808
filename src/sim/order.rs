//! Order state machine
//!
//! `Idle -> InProgress -> (InProgress | GameOver)`. Owns scoring, lives,
//! order progress and the session's single order timer.
//!
//! Invariants kept here:
//! - `order_progress <= current_order.len()`
//! - at most one outstanding timer per session; any new timer cancels the old
//! - nothing scores, spawns or schedules once the session is `GameOver`

use glam::Vec3;
use rand::Rng;
use rand::seq::SliceRandom;

use super::placement::{Placement, place_batch};
use super::state::{ItemId, ItemState, LifeLossReason, PlayerSession, SessionStatus};
use super::timers::{FiredTimer, TimerKind, TimerQueue};
use crate::audio::{self, SoundCue};
use crate::catalog::{ItemCode, OrderCatalog};
use crate::host::{Color, Host, Notice, NoticeKind};
use crate::settings::{GameSettings, MismatchPolicy};

/// Shared collaborators for every state machine call
pub struct OrderContext<'a> {
    pub catalog: &'a OrderCatalog,
    pub settings: &'a GameSettings,
    pub host: &'a mut dyn Host,
    pub timers: &'a mut TimerQueue,
    /// Current host tick
    pub now: u64,
}

/// Result of handing a collected item to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// Session over, order already fulfilled, or no order yet
    Ignored,
    /// Item no longer live
    Stale,
    /// Correct item, order continues
    Progress,
    /// Correct item, order done
    Completed,
    /// Wrong item, left in place (ignore policy)
    NotNext,
    /// Wrong item, life lost
    Mistake,
}

/// Why an item left the world without being collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryCause {
    /// Fell below the floor threshold
    Floor,
    /// Lifetime ran out
    Lifetime,
    /// Host no longer has the entity
    Vanished,
}

/// Required items plus random extras, shuffled so spawn order reveals nothing
pub fn build_batch<R: Rng>(
    order: &[ItemCode],
    catalog: &OrderCatalog,
    items_per_order: usize,
    rng: &mut R,
) -> Vec<ItemCode> {
    let mut batch = order.to_vec();
    let items = catalog.items();
    if !items.is_empty() {
        for _ in 0..items_per_order.saturating_sub(order.len()) {
            let pick = rng.random_range(0..items.len());
            batch.push(items[pick].code.clone());
        }
    }
    batch.shuffle(rng);
    batch
}

/// Hand the session its next order
pub fn start_new_order(session: &mut PlayerSession, ctx: &mut OrderContext<'_>) {
    if session.is_game_over() {
        log::debug!("{}: no new order after game over", session.player);
        return;
    }

    cancel_timer(session, ctx.timers);
    despawn_all(session, ctx.host);

    session.order_count += 1;
    let template = if session.order_count == 1 {
        ctx.catalog.tutorial()
    } else {
        let regular = ctx.catalog.regular_templates();
        regular[session.rng.random_range(0..regular.len())].as_slice()
    };

    session.current_order = template.to_vec();
    session.order_progress = 0;
    session.status = SessionStatus::InProgress;
    session.combo = 0;
    session.order_best_combo = 0;
    session.last_collect_tick = None;

    place_order_batch(session, ctx);

    let text = format!(
        "New order #{}: {}",
        session.order_count,
        ctx.catalog.describe_order(&session.current_order)
    );
    log::info!("{}: {}", session.player, text);
    notify(
        session,
        ctx,
        NoticeKind::NewOrder {
            order: session.current_order.clone(),
        },
        text,
        Color::YELLOW,
    );
    audio::play(ctx.host, session.player, session.muted, SoundCue::NewOrder);

    arm_order_timer(session, ctx);
    session.dirty = true;
}

/// The player touched a live item
pub fn on_item_collected(
    session: &mut PlayerSession,
    item_id: ItemId,
    ctx: &mut OrderContext<'_>,
) -> CollectOutcome {
    if session.is_game_over()
        || session.status != SessionStatus::InProgress
        || session.order_fulfilled()
    {
        return CollectOutcome::Ignored;
    }
    let Some(code) = session.item(item_id).map(|i| i.code.clone()) else {
        return CollectOutcome::Stale;
    };
    let Some(required) = session.required_code().cloned() else {
        return CollectOutcome::Ignored;
    };

    if code != required {
        return match ctx.settings.mismatch {
            MismatchPolicy::Penalize => {
                lose_life(
                    session,
                    LifeLossReason::WrongItem {
                        expected: required,
                        got: code,
                    },
                    ctx,
                );
                CollectOutcome::Mistake
            }
            MismatchPolicy::Ignore => {
                if session.not_next_notified.insert(item_id) {
                    let text = format!(
                        "{} isn't next, grab the {} first",
                        ctx.catalog.display_name(&code),
                        ctx.catalog.display_name(&required)
                    );
                    notify(
                        session,
                        ctx,
                        NoticeKind::NotNext {
                            code,
                            expected: required,
                        },
                        text,
                        Color::GRAY,
                    );
                }
                CollectOutcome::NotNext
            }
        };
    }

    if let Some(item) = session.take_item(item_id, ItemState::Collected) {
        ctx.host.despawn(item.handle);
    }

    let points = ctx.settings.points_per_item;
    session.order_progress += 1;
    session.score += points;
    update_combo(session, ctx);
    session.dirty = true;

    let text = format!("Collected {}! (+{})", ctx.catalog.display_name(&code), points);
    notify(session, ctx, NoticeKind::Collected { code, points }, text, Color::GREEN);
    audio::play(ctx.host, session.player, session.muted, SoundCue::Collect);

    if let Some(next) = session.required_code().cloned() {
        let text = format!("Next: {}", ctx.catalog.display_name(&next));
        notify(session, ctx, NoticeKind::NextItem { code: next }, text, Color::WHITE);
        CollectOutcome::Progress
    } else {
        complete_order(session, ctx);
        CollectOutcome::Completed
    }
}

/// Lose a life; retry the same order from the top or end the game
pub fn lose_life(session: &mut PlayerSession, reason: LifeLossReason, ctx: &mut OrderContext<'_>) {
    if session.is_game_over() {
        return;
    }

    session.lives = session.lives.saturating_sub(1);
    session.combo = 0;
    session.dirty = true;

    let detail = match &reason {
        LifeLossReason::WrongItem { expected, .. } => {
            format!("Wrong item, expected {}", ctx.catalog.display_name(expected))
        }
        LifeLossReason::TimeExpired => "Time's up".to_string(),
        LifeLossReason::Dropped { code } => {
            format!("The {} hit the floor", ctx.catalog.display_name(code))
        }
    };
    let text = format!("{}! Lives left: {}", detail, session.lives);
    log::info!("{}: lost a life ({})", session.player, reason);
    notify(
        session,
        ctx,
        NoticeKind::Mistake {
            reason,
            lives_left: session.lives,
        },
        text,
        Color::ORANGE,
    );
    audio::play(ctx.host, session.player, session.muted, SoundCue::Mistake);

    if session.lives == 0 {
        game_over(session, ctx);
        return;
    }

    let Some(first) = session.current_order.first().cloned() else {
        start_new_order(session, ctx);
        return;
    };

    session.order_progress = 0;
    let text = format!(
        "Order reset, start again from the {}",
        ctx.catalog.display_name(&first)
    );
    notify(session, ctx, NoticeKind::OrderReset { first }, text, Color::YELLOW);

    // Already-collected items are gone, so the retry gets a fresh batch and clock
    despawn_all(session, ctx.host);
    place_order_batch(session, ctx);
    arm_order_timer(session, ctx);
}

/// An order timer fired. Stale timers (cancelled, replaced, or from before a
/// restart) are dropped by token comparison.
pub fn on_timer(session: &mut PlayerSession, fired: FiredTimer, ctx: &mut OrderContext<'_>) {
    if session.active_timer.map(|h| h.token) != Some(fired.handle.token) {
        log::debug!(
            "{}: dropping stale {:?} timer #{}",
            session.player,
            fired.handle.kind,
            fired.handle.token
        );
        return;
    }
    session.active_timer = None;

    if session.is_game_over() {
        return;
    }

    match fired.handle.kind {
        TimerKind::OrderExpired => {
            session.order_deadline = None;
            if session.status == SessionStatus::InProgress && !session.order_fulfilled() {
                lose_life(session, LifeLossReason::TimeExpired, ctx);
            }
        }
        TimerKind::NextOrder => start_new_order(session, ctx),
    }
}

/// A live item left the world uncollected
pub fn on_item_expired(
    session: &mut PlayerSession,
    item_id: ItemId,
    cause: ExpiryCause,
    ctx: &mut OrderContext<'_>,
) {
    let Some(item) = session.take_item(item_id, ItemState::Expired) else {
        return;
    };
    if cause != ExpiryCause::Vanished {
        ctx.host.despawn(item.handle);
    }
    log::debug!("{}: {} expired ({:?})", session.player, item.code, cause);

    let was_required = session.required_code() == Some(&item.code);
    if cause == ExpiryCause::Floor
        && was_required
        && session.status == SessionStatus::InProgress
        && !session.order_fulfilled()
    {
        lose_life(session, LifeLossReason::Dropped { code: item.code }, ctx);
    }
}

/// Keep the order solvable: if nothing live carries the required code, place one
pub fn replenish(session: &mut PlayerSession, ctx: &mut OrderContext<'_>) {
    if session.is_game_over()
        || session.status != SessionStatus::InProgress
        || session.order_fulfilled()
    {
        return;
    }
    let Some(required) = session.required_code().cloned() else {
        return;
    };
    if session.has_live_code(&required) {
        return;
    }

    log::info!("{}: no {} left in the world, placing another", session.player, required);
    let origin = placement_origin(session, ctx);
    let placement = Placement {
        strategy: &ctx.settings.placement,
        catalog: ctx.catalog,
        origin,
        now: ctx.now,
        lifetime_ticks: ctx.settings.item_lifetime_ticks(),
    };
    let placed = place_batch(session, ctx.host, &placement, std::slice::from_ref(&required));
    session.live_items.extend(placed);
}

/// Reset score, lives and order fields in place and start over
pub fn restart(session: &mut PlayerSession, ctx: &mut OrderContext<'_>) {
    cancel_timer(session, ctx.timers);
    despawn_all(session, ctx.host);

    session.score = 0;
    session.lives = ctx.settings.starting_lives;
    session.current_order.clear();
    session.order_progress = 0;
    session.order_count = 0;
    session.orders_completed = 0;
    session.status = SessionStatus::Idle;
    session.combo = 0;
    session.order_best_combo = 0;
    session.last_collect_tick = None;
    session.score_recorded = false;
    session.dirty = true;

    log::info!("{}: restarted", session.player);
    notify(session, ctx, NoticeKind::Info, "Restarting, good luck!".to_string(), Color::WHITE);
    start_new_order(session, ctx);
}

/// Cancel timers and remove items (player leaving)
pub fn shutdown(session: &mut PlayerSession, host: &mut dyn Host, timers: &mut TimerQueue) {
    cancel_timer(session, timers);
    despawn_all(session, host);
}

fn complete_order(session: &mut PlayerSession, ctx: &mut OrderContext<'_>) {
    let combo_bonus = ctx
        .settings
        .combo
        .map(|c| c.bonus_per_step * u64::from(session.order_best_combo.saturating_sub(1)))
        .unwrap_or(0);
    let bonus = ctx.settings.order_bonus + combo_bonus;
    session.score += bonus;
    session.orders_completed += 1;

    cancel_timer(session, ctx.timers);
    despawn_all(session, ctx.host);

    let text = if combo_bonus > 0 {
        format!(
            "Order complete! +{} bonus (x{} combo), score {}",
            bonus, session.order_best_combo, session.score
        )
    } else {
        format!("Order complete! +{} bonus, score {}", bonus, session.score)
    };
    log::info!("{}: order #{} complete", session.player, session.order_count);
    notify(session, ctx, NoticeKind::OrderComplete { bonus }, text, Color::GREEN);
    audio::play(ctx.host, session.player, session.muted, SoundCue::OrderComplete);

    let due = ctx.now + ctx.settings.next_order_delay_ticks();
    session.active_timer = Some(ctx.timers.schedule(session.player, TimerKind::NextOrder, due));
}

fn game_over(session: &mut PlayerSession, ctx: &mut OrderContext<'_>) {
    session.status = SessionStatus::GameOver;
    cancel_timer(session, ctx.timers);
    despawn_all(session, ctx.host);

    log::info!("{}: game over, final score {}", session.player, session.score);
    let text = format!(
        "Game over! Final score: {} ({} orders). Type /restart to play again",
        session.score, session.orders_completed
    );
    notify(
        session,
        ctx,
        NoticeKind::GameOver {
            final_score: session.score,
        },
        text,
        Color::RED,
    );
    audio::play(ctx.host, session.player, session.muted, SoundCue::GameOver);
}

fn update_combo(session: &mut PlayerSession, ctx: &OrderContext<'_>) {
    let in_window = match (ctx.settings.combo_window_ticks(), session.last_collect_tick) {
        (Some(window), Some(last)) => ctx.now.saturating_sub(last) <= window,
        _ => false,
    };
    session.combo = if in_window { session.combo + 1 } else { 1 };
    session.order_best_combo = session.order_best_combo.max(session.combo);
    session.last_collect_tick = Some(ctx.now);
}

fn arm_order_timer(session: &mut PlayerSession, ctx: &mut OrderContext<'_>) {
    cancel_timer(session, ctx.timers);
    let due = ctx.now + ctx.settings.order_ticks();
    session.active_timer = Some(ctx.timers.schedule(session.player, TimerKind::OrderExpired, due));
    session.order_deadline = Some(due);
}

fn cancel_timer(session: &mut PlayerSession, timers: &mut TimerQueue) {
    if let Some(handle) = session.active_timer.take() {
        timers.cancel(handle);
    }
    session.order_deadline = None;
}

fn despawn_all(session: &mut PlayerSession, host: &mut dyn Host) {
    for item in session.drain_items() {
        host.despawn(item.handle);
    }
}

fn place_order_batch(session: &mut PlayerSession, ctx: &mut OrderContext<'_>) {
    let batch = build_batch(
        &session.current_order,
        ctx.catalog,
        ctx.settings.items_per_order,
        &mut session.rng,
    );
    let origin = placement_origin(session, ctx);
    let placement = Placement {
        strategy: &ctx.settings.placement,
        catalog: ctx.catalog,
        origin,
        now: ctx.now,
        lifetime_ticks: ctx.settings.item_lifetime_ticks(),
    };
    let placed = place_batch(session, ctx.host, &placement, &batch);
    session.live_items.extend(placed);
}

fn placement_origin(session: &PlayerSession, ctx: &OrderContext<'_>) -> Vec3 {
    ctx.host.player_position(session.player).unwrap_or_else(|| {
        log::debug!("{}: no position, placing around the safe spot", session.player);
        ctx.settings.detection.safe_position
    })
}

fn notify(
    session: &PlayerSession,
    ctx: &mut OrderContext<'_>,
    kind: NoticeKind,
    text: String,
    color: Color,
) {
    ctx.host.notify(session.player, &Notice::new(kind, text, color));
}
