//! UI state pushed to a player's UI layer
//!
//! A plain snapshot of the session; the host decides how to draw it.

use serde::Serialize;

use crate::catalog::{ItemCode, OrderCatalog};
use crate::consts::TICK_RATE_HZ;
use crate::sim::state::{PlayerSession, SessionStatus};

/// One line of the order checklist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    pub code: ItemCode,
    pub name: String,
    pub collected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiState {
    pub score: u64,
    pub lives: u8,
    pub combo: u32,
    pub order: Vec<OrderLine>,
    pub progress: usize,
    pub status: &'static str,
    pub orders_completed: u32,
    /// Whole seconds until the order times out (None between orders)
    pub seconds_left: Option<u32>,
}

impl UiState {
    pub fn from_session(session: &PlayerSession, catalog: &OrderCatalog, now: u64) -> Self {
        let order = session
            .current_order
            .iter()
            .enumerate()
            .map(|(i, code)| OrderLine {
                code: code.clone(),
                name: catalog.display_name(code).to_string(),
                collected: i < session.order_progress,
            })
            .collect();

        let seconds_left = session.order_deadline.map(|due| {
            let ticks = due.saturating_sub(now);
            ticks.div_ceil(u64::from(TICK_RATE_HZ)) as u32
        });

        Self {
            score: session.score,
            lives: session.lives,
            combo: session.combo,
            order,
            progress: session.order_progress,
            status: match session.status {
                SessionStatus::Idle => "idle",
                SessionStatus::InProgress => "in_progress",
                SessionStatus::GameOver => "game_over",
            },
            orders_completed: session.orders_completed,
            seconds_left,
        }
    }

    /// JSON payload for hosts that take UI data as text
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::warn!("UI state failed to serialize: {}", e);
            "{}".to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PlayerId;

    #[test]
    fn test_snapshot_marks_collected_lines() {
        let catalog = OrderCatalog::default();
        let mut session = PlayerSession::new(PlayerId(1), 3, 1);
        session.current_order = vec!["B".into(), "F".into(), "S".into()];
        session.order_progress = 1;
        session.status = SessionStatus::InProgress;
        session.score = 10;
        session.order_deadline = Some(200);

        let ui = UiState::from_session(&session, &catalog, 100);
        let collected: Vec<bool> = ui.order.iter().map(|l| l.collected).collect();
        assert_eq!(collected, vec![true, false, false]);
        assert_eq!(ui.order[1].name, "Fries");
        assert_eq!(ui.seconds_left, Some(2));
        assert_eq!(ui.status, "in_progress");
    }

    #[test]
    fn test_json_shape() {
        let catalog = OrderCatalog::default();
        let session = PlayerSession::new(PlayerId(1), 3, 1);
        let json = UiState::from_session(&session, &catalog, 0).to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["lives"], 3);
        assert_eq!(value["status"], "idle");
        assert!(value["seconds_left"].is_null());
    }
}
