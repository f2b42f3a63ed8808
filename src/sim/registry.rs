//! Session registry and the global tick
//!
//! Owns every [`PlayerSession`], the shared timer queue and the leaderboard.
//! Handlers get the registry by reference; there is no global state.

use std::collections::BTreeMap;

use super::detector::{self, ScanReport};
use super::order::{self, OrderContext};
use super::state::PlayerSession;
use super::timers::TimerQueue;
use crate::catalog::OrderCatalog;
use crate::commands::Command;
use crate::highscores::HighScores;
use crate::host::{Host, Notice, PlayerId};
use crate::consts::TICK_RATE_HZ;
use crate::horizontal_distance;
use crate::settings::GameSettings;
use crate::ui::UiState;

pub struct SessionRegistry {
    /// Keyed by player; BTreeMap keeps tick iteration order stable
    sessions: BTreeMap<PlayerId, PlayerSession>,
    catalog: OrderCatalog,
    settings: GameSettings,
    timers: TimerQueue,
    leaderboard: HighScores,
    seed: u64,
    now: u64,
}

impl SessionRegistry {
    pub fn new(catalog: OrderCatalog, settings: GameSettings, seed: u64) -> Self {
        Self {
            sessions: BTreeMap::new(),
            catalog,
            settings,
            timers: TimerQueue::new(),
            leaderboard: HighScores::new(),
            seed,
            now: 0,
        }
    }

    /// Current tick
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &OrderCatalog {
        &self.catalog
    }

    pub fn session(&self, player: PlayerId) -> Option<&PlayerSession> {
        self.sessions.get(&player)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &PlayerSession> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn leaderboard(&self) -> &HighScores {
        &self.leaderboard
    }

    pub fn set_leaderboard(&mut self, leaderboard: HighScores) {
        self.leaderboard = leaderboard;
    }

    /// Player joined. Idempotent: an existing session is reused as-is.
    pub fn join(&mut self, host: &mut dyn Host, player: PlayerId) -> &PlayerSession {
        let Self {
            sessions,
            catalog,
            settings,
            timers,
            seed,
            now,
            ..
        } = self;

        if !sessions.contains_key(&player) {
            log::info!("{} joined", player);
            let mut session = PlayerSession::new(player, settings.starting_lives, *seed);
            host.notify(
                player,
                &Notice::info(format!(
                    "Welcome to McOrder Dash ({})! Collect each order in sequence. Commands: /restart, /collect, /mute",
                    settings.variant.as_str()
                )),
            );
            let mut ctx = OrderContext {
                catalog,
                settings,
                host,
                timers,
                now: *now,
            };
            order::start_new_order(&mut session, &mut ctx);
            sessions.insert(player, session);
        } else {
            log::debug!("{} joined again, reusing session", player);
        }
        &sessions[&player]
    }

    /// Player left: cancel timer, despawn items, drop the session
    pub fn leave(&mut self, host: &mut dyn Host, player: PlayerId) -> bool {
        let Some(mut session) = self.sessions.remove(&player) else {
            return false;
        };
        order::shutdown(&mut session, host, &mut self.timers);
        self.timers.cancel_player(player);
        log::info!("{} left with score {}", player, session.score);
        true
    }

    /// Reset score, lives and order in place and start over
    pub fn restart(&mut self, host: &mut dyn Host, player: PlayerId) -> bool {
        let restarted = self
            .with_session(host, player, |session, ctx| order::restart(session, ctx))
            .is_some();
        if restarted {
            log::debug!("{} restarted at tick {}", player, self.now);
        }
        restarted
    }

    /// Force-collect the live item nearest the player, wherever it is
    pub fn force_collect(&mut self, host: &mut dyn Host, player: PlayerId) -> bool {
        let Some(position) = host.player_position(player) else {
            return false;
        };
        let Some(session) = self.sessions.get(&player) else {
            return false;
        };
        let Some(nearest) = session
            .live_items
            .iter()
            .min_by(|a, b| {
                horizontal_distance(a.position, position)
                    .total_cmp(&horizontal_distance(b.position, position))
            })
            .map(|i| i.id)
        else {
            host.notify(player, &Notice::info("Nothing to collect right now"));
            return false;
        };
        self.with_session(host, player, |session, ctx| {
            order::on_item_collected(session, nearest, ctx)
        })
        .is_some()
    }

    /// Toggle sound cues for a player; returns the new muted state
    pub fn toggle_mute(&mut self, host: &mut dyn Host, player: PlayerId) -> Option<bool> {
        let session = self.sessions.get_mut(&player)?;
        session.muted = !session.muted;
        let text = if session.muted {
            "Sound muted"
        } else {
            "Sound unmuted"
        };
        host.notify(player, &Notice::info(text));
        Some(session.muted)
    }

    /// Dispatch a chat line. Returns false if it wasn't a command.
    pub fn handle_chat(&mut self, host: &mut dyn Host, player: PlayerId, line: &str) -> bool {
        match Command::parse(line) {
            Ok(Command::Restart) => {
                self.restart(host, player);
            }
            Ok(Command::Collect) => {
                self.force_collect(host, player);
            }
            Ok(Command::Mute) => {
                self.toggle_mute(host, player);
            }
            Err(crate::commands::CommandError::NotACommand) => return false,
            Err(e) => {
                host.notify(player, &Notice::info(format!("{e}. Try {}", Command::usage())));
            }
        }
        self.flush_ui(host);
        true
    }

    /// Advance one host tick: fire due timers, scan every session, push UI.
    /// Never fails; each session's problems stay with that session.
    pub fn tick(&mut self, host: &mut dyn Host) -> Vec<(PlayerId, ScanReport)> {
        self.now += 1;
        self.fire_timers(host);

        let Self {
            sessions,
            catalog,
            settings,
            timers,
            now,
            ..
        } = self;

        let mut reports = Vec::with_capacity(sessions.len());
        for session in sessions.values_mut() {
            let mut ctx = OrderContext {
                catalog,
                settings,
                host: &mut *host,
                timers: &mut *timers,
                now: *now,
            };
            let report = detector::scan_session(session, &mut ctx);
            reports.push((session.player, report));
        }

        self.record_game_overs();
        self.flush_ui(host);
        reports
    }

    /// Run `f` against one session with a fully wired context
    fn with_session<T>(
        &mut self,
        host: &mut dyn Host,
        player: PlayerId,
        f: impl FnOnce(&mut PlayerSession, &mut OrderContext<'_>) -> T,
    ) -> Option<T> {
        let Self {
            sessions,
            catalog,
            settings,
            timers,
            now,
            ..
        } = self;
        let session = sessions.get_mut(&player)?;
        let mut ctx = OrderContext {
            catalog,
            settings,
            host,
            timers,
            now: *now,
        };
        let result = f(session, &mut ctx);
        self.record_game_overs();
        Some(result)
    }

    fn fire_timers(&mut self, host: &mut dyn Host) {
        while let Some(fired) = self.timers.pop_due(self.now) {
            // Session may have left since scheduling
            if self.sessions.contains_key(&fired.player) {
                self.with_session(host, fired.player, |session, ctx| {
                    order::on_timer(session, fired, ctx)
                });
            }
        }
    }

    fn record_game_overs(&mut self) {
        for session in self.sessions.values_mut() {
            if session.is_game_over() && !session.score_recorded {
                session.score_recorded = true;
                if let Some(rank) = self.leaderboard.add_score(
                    session.player,
                    session.score,
                    session.orders_completed,
                    self.now,
                ) {
                    log::info!("{} placed #{} on the leaderboard", session.player, rank);
                }
            }
        }
    }

    /// Push UI state for every session that changed. Running order clocks
    /// also refresh once a second.
    fn flush_ui(&mut self, host: &mut dyn Host) {
        let second_boundary = self.now % u64::from(TICK_RATE_HZ) == 0;
        for session in self.sessions.values_mut() {
            let clock_running = second_boundary && session.order_deadline.is_some();
            if session.dirty || clock_running {
                session.dirty = false;
                let state = UiState::from_session(session, &self.catalog, self.now);
                host.push_ui(session.player, &state);
            }
        }
    }
}
