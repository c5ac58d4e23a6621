//! Outbound notifications and the envelopes the notifier worker drains.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::mpsc;

use crate::game::entities::{ActionType, Card, CardView, Chips, SeatNumber, Stage};
use crate::table::{ConnectionId, TableAction, TableSnapshot};

/// Everything the transport layer can be asked to deliver. Serialized as an
/// internally-tagged JSON object (`"type": "GAME_STATE_UPDATE"`, ...).
///
/// All payloads are copies taken at emit time; none of them borrow live
/// table state.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    /// The betting stage, board, pot, or outstanding bets changed.
    #[serde(rename_all = "camelCase")]
    GameStateUpdate {
        stage: Stage,
        community_cards: Vec<Card>,
        pot: Chips,
        bets: BTreeMap<SeatNumber, Chips>,
    },
    /// The action is on `seat`; `None` between hands.
    TurnUpdate { seat: Option<SeatNumber> },
    /// A seat acted (including the two forced blinds).
    PlayerAction {
        seat: SeatNumber,
        action: ActionType,
        amount: Chips,
        bets: BTreeMap<SeatNumber, Chips>,
    },
    /// Personalized: the recipient's own cards are shown, all others hidden.
    #[serde(rename_all = "camelCase")]
    HoleCards {
        per_seat: BTreeMap<SeatNumber, Vec<CardView>>,
    },
    PlayerStacks {
        stacks: BTreeMap<SeatNumber, Chips>,
    },
    TableUpdate {
        action: TableAction,
        table: TableSnapshot,
    },
    /// Targeted at the connection whose request failed; other observers
    /// never see it.
    Error { message: String },
}

/// Envelopes on the outbound channel. The game worker only ever enqueues;
/// the notifier owns the sink map and does all delivery.
#[derive(Debug)]
pub enum OutboundEvent {
    Register {
        connection: ConnectionId,
        sink: mpsc::Sender<Notification>,
    },
    Unregister {
        connection: ConnectionId,
    },
    Deliver {
        connection: ConnectionId,
        payload: Notification,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit;

    #[test]
    fn notifications_tag_with_screaming_snake_type() {
        let json = serde_json::to_string(&Notification::TurnUpdate { seat: Some(3) }).unwrap();
        assert_eq!(json, r#"{"type":"TURN_UPDATE","seat":3}"#);

        let json = serde_json::to_string(&Notification::TurnUpdate { seat: None }).unwrap();
        assert_eq!(json, r#"{"type":"TURN_UPDATE","seat":null}"#);
    }

    #[test]
    fn game_state_update_uses_camel_case_fields() {
        let update = Notification::GameStateUpdate {
            stage: Stage::Flop,
            community_cards: vec![Card(14, Suit::Spade)],
            pot: 120,
            bets: BTreeMap::new(),
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains(r#""type":"GAME_STATE_UPDATE""#));
        assert!(json.contains(r#""stage":"FLOP""#));
        assert!(json.contains("communityCards"));
    }
}
