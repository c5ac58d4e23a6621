//! Tables: seating, waiting list, dealer rotation, and session lifecycle.
//!
//! A `Table` owns its seat map, waiting list, observer set, dealer button,
//! and the zero-or-one active `GameSession`. All mutation happens on the
//! game worker (single-writer rule); the table records outbound
//! notifications in an internal buffer which the worker drains and routes
//! after every call. Payloads are built from copies at emit time, never
//! from live references, so routing cannot race the next mutation.

pub mod config;
pub mod errors;
pub mod registry;

pub use config::TableConfig;
pub use errors::TableError;
pub use registry::Registry;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

use crate::dispatch::outbound::Notification;
use crate::game::entities::{
    ActionType, CardView, Chips, Seat, SeatNumber, SeatView, Stage, TableId, User, UserId,
};
use crate::game::errors::ActionError;
use crate::game::session::{GameSession, Seats, SessionEvent};

/// Connections are identified by opaque ids minted at connect time. What a
/// connection actually is (a socket, a test harness) stays outside the
/// engine.
pub type ConnectionId = Uuid;

/// What changed, for `TABLE_UPDATE` notifications.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableAction {
    Created,
    Deleted,
    ObserverJoined,
    ObserverLeft,
    SeatTaken,
    SeatLeft,
    PlayerRelocated,
    WaitlistJoined,
    HandStarted,
    HandFinished,
    HandAbandoned,
}

/// Who a buffered notification is for. The worker resolves `User` targets
/// to the connection currently bound to that identity; `Observers` fans out
/// to every connection watching the table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Recipients {
    Observers,
    User(UserId),
}

/// A routed notification, drained by the game worker after each table call.
#[derive(Clone, Debug)]
pub struct TableEvent {
    pub to: Recipients,
    pub payload: Notification,
}

/// Public projection of a table for listings and `TABLE_UPDATE` payloads.
/// Everything in here is safe for any observer to see.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub id: TableId,
    pub name: String,
    pub max_seats: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub min_buy_in: Chips,
    pub max_buy_in: Chips,
    pub seats: Vec<SeatView>,
    pub waiting: usize,
    pub hand_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Table {
    id: TableId,
    config: TableConfig,
    created_at: DateTime<Utc>,
    seats: Seats,
    waitlist: VecDeque<(User, Chips)>,
    observers: HashSet<ConnectionId>,
    /// Seat number of the dealer button for the hand in progress (or the
    /// last one played). `None` until the first hand.
    dealer: Option<SeatNumber>,
    session: Option<GameSession>,
    events: VecDeque<TableEvent>,
}

impl Table {
    pub fn new(id: TableId, config: TableConfig) -> Self {
        Self {
            id,
            config,
            created_at: Utc::now(),
            seats: Seats::new(),
            waitlist: VecDeque::new(),
            observers: HashSet::new(),
            dealer: None,
            session: None,
            events: VecDeque::new(),
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn occupied(&self) -> usize {
        self.seats.len()
    }

    pub fn seats(&self) -> &Seats {
        &self.seats
    }

    pub fn observers(&self) -> impl Iterator<Item = &ConnectionId> {
        self.observers.iter()
    }

    pub fn hand_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_actor(&self) -> Option<SeatNumber> {
        self.session.as_ref().and_then(GameSession::current_actor)
    }

    pub fn seat_of(&self, user_id: UserId) -> Option<SeatNumber> {
        self.seats
            .values()
            .find(|seat| seat.user.id == user_id)
            .map(|seat| seat.seat_number)
    }

    /// Take the buffered events, oldest first.
    pub fn drain_events(&mut self) -> Vec<TableEvent> {
        self.events.drain(..).collect()
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            id: self.id,
            name: self.config.name.clone(),
            max_seats: self.config.max_seats,
            small_blind: self.config.blinds.small,
            big_blind: self.config.blinds.big,
            min_buy_in: self.config.min_buy_in,
            max_buy_in: self.config.max_buy_in,
            seats: self.seats.values().map(Seat::view).collect(),
            waiting: self.waitlist.len(),
            hand_active: self.hand_active(),
            created_at: self.created_at,
        }
    }

    /// A connection started watching this table.
    pub fn join_observer(&mut self, connection: ConnectionId) {
        if self.observers.insert(connection) {
            self.emit_table_update(TableAction::ObserverJoined);
        }
    }

    /// A connection stopped watching this table.
    pub fn leave_observer(&mut self, connection: ConnectionId) {
        if self.observers.remove(&connection) {
            self.emit_table_update(TableAction::ObserverLeft);
        }
    }

    /// Seat `user` at `seat_number` with `buy_in` chips.
    ///
    /// A player already seated elsewhere at this table is relocated with
    /// their stack and in-hand state carried over; the buy-in is ignored in
    /// that case. Seating a second funded player auto-starts a hand if none
    /// is running.
    pub fn take_seat(
        &mut self,
        seat_number: SeatNumber,
        user: User,
        buy_in: Chips,
    ) -> Result<(), TableError> {
        if seat_number >= self.config.max_seats {
            return Err(TableError::InvalidSeat {
                seat: seat_number,
                max_seats: self.config.max_seats,
            });
        }
        if self.seats.contains_key(&seat_number) {
            return Err(TableError::SeatTaken(seat_number));
        }

        if let Some(from) = self.seat_of(user.id) {
            let mut seat = match self.seats.remove(&from) {
                Some(seat) => seat,
                None => unreachable!("seat_of returned a vacant seat"),
            };
            seat.seat_number = seat_number;
            self.seats.insert(seat_number, seat);
            if let Some(session) = &mut self.session {
                session.relocate(from, seat_number);
            }
            info!("table {}: {user} relocated seat {from} -> {seat_number}", self.id);
            self.emit_table_update(TableAction::PlayerRelocated);
            return Ok(());
        }

        if self.seats.len() >= self.config.max_seats {
            return Err(TableError::TableFull);
        }
        if !self.config.buy_in_allowed(buy_in) {
            return Err(TableError::InvalidBuyIn {
                buy_in,
                min: self.config.min_buy_in,
                max: self.config.max_buy_in,
            });
        }

        info!("table {}: {user} took seat {seat_number} for {buy_in}", self.id);
        self.seats.insert(seat_number, Seat::new(seat_number, user, buy_in));
        self.emit_table_update(TableAction::SeatTaken);
        self.maybe_start_hand();
        Ok(())
    }

    /// Vacate `seat_number`, returning the cashed-out stack. Fails if the
    /// seat is empty or held by someone else. A seat leaving mid-hand is
    /// folded in place first; if that drops the table below two occupied
    /// seats the hand is voided with no payout.
    pub fn leave_seat(
        &mut self,
        seat_number: SeatNumber,
        user_id: UserId,
    ) -> Result<Chips, TableError> {
        let seat = self
            .seats
            .get(&seat_number)
            .ok_or(TableError::SeatEmpty(seat_number))?;
        if seat.user.id != user_id {
            return Err(TableError::NotOwner(seat_number));
        }
        Ok(self.remove_seat(seat_number))
    }

    /// Drop every trace of `user_id`: their waitlist entry and, if seated,
    /// their seat. Used when a connection goes away.
    pub fn evict_user(&mut self, user_id: UserId) {
        self.waitlist.retain(|(user, _)| user.id != user_id);
        if let Some(seat_number) = self.seat_of(user_id) {
            info!("table {}: evicting user {user_id} from seat {seat_number}", self.id);
            self.remove_seat(seat_number);
        }
    }

    /// Queue `user` for the next free seat. The buy-in is validated now and
    /// spent when the seat is actually taken.
    pub fn join_waitlist(&mut self, user: User, buy_in: Chips) -> Result<(), TableError> {
        if self.seat_of(user.id).is_some() {
            return Err(TableError::AlreadySeated);
        }
        if self.waitlist.iter().any(|(queued, _)| queued.id == user.id) {
            return Err(TableError::AlreadyWaitlisted);
        }
        if !self.config.buy_in_allowed(buy_in) {
            return Err(TableError::InvalidBuyIn {
                buy_in,
                min: self.config.min_buy_in,
                max: self.config.max_buy_in,
            });
        }

        info!("table {}: {user} joined the waiting list", self.id);
        self.waitlist.push_back((user, buy_in));
        self.emit_table_update(TableAction::WaitlistJoined);
        self.seat_from_waitlist();
        self.maybe_start_hand();
        Ok(())
    }

    /// Forward a voluntary action from `user_id` to the active session.
    pub fn submit_action(
        &mut self,
        user_id: UserId,
        action: ActionType,
        amount: Chips,
    ) -> Result<(), ActionError> {
        let seat_number = self.seat_of(user_id).ok_or(ActionError::NotSeated)?;
        let session = self.session.as_mut().ok_or(ActionError::HandOver)?;
        let result = session.act(&mut self.seats, seat_number, action, amount);
        self.forward_session_events();
        self.settle_finished_hand();
        result
    }

    /// Start a hand if none is running and at least two funded seats are
    /// occupied. Zero-stack seats sit out until they rebuy (externally).
    fn maybe_start_hand(&mut self) {
        if self.session.is_some() {
            return;
        }
        let funded: Vec<SeatNumber> = self
            .seats
            .values()
            .filter(|seat| seat.stack > 0)
            .map(|seat| seat.seat_number)
            .collect();
        if funded.len() < 2 {
            return;
        }

        // Advance the button to the next funded seat, wrapping; the seat
        // after the button posts the small blind.
        let dealer = match self.dealer {
            Some(previous) => funded
                .iter()
                .copied()
                .find(|&n| n > previous)
                .unwrap_or(funded[0]),
            None => funded[0],
        };
        self.dealer = Some(dealer);

        let pivot = match funded.iter().position(|&n| n == dealer) {
            Some(i) => i,
            None => unreachable!("dealer is drawn from the funded seats"),
        };
        let mut ordering = Vec::with_capacity(funded.len());
        ordering.extend_from_slice(&funded[pivot + 1..]);
        ordering.extend_from_slice(&funded[..=pivot]);

        let session = GameSession::start(
            self.config.blinds,
            self.config.min_raise,
            ordering,
            &mut self.seats,
        );
        info!("table {}: hand {} started, button at seat {dealer}", self.id, session.id());
        self.session = Some(session);
        self.emit_table_update(TableAction::HandStarted);
        self.forward_session_events();
        // Blind posting alone can finish a degenerate hand (both blinds
        // all-in with nobody left to act).
        self.settle_finished_hand();
    }

    /// Vacate a seat unconditionally, folding it in place first if a hand
    /// is running, and resolve the session afterwards.
    fn remove_seat(&mut self, seat_number: SeatNumber) -> Chips {
        if let Some(session) = &mut self.session {
            session.handle_leave(&mut self.seats, seat_number);
        }
        self.forward_session_events();

        let seat = match self.seats.remove(&seat_number) {
            Some(seat) => seat,
            None => unreachable!("remove_seat called on a vacant seat"),
        };
        info!(
            "table {}: seat {seat_number} vacated, {} cashed out {}",
            self.id, seat.user, seat.stack
        );
        self.emit_table_update(TableAction::SeatLeft);

        match &self.session {
            Some(session) if session.stage() == Stage::Finished => {
                self.session = None;
                self.emit_table_update(TableAction::HandFinished);
            }
            Some(session) if self.seats.len() < 2 => {
                warn!(
                    "table {}: hand {} abandoned below two seats, pot voided",
                    self.id,
                    session.id()
                );
                self.abandon_hand();
            }
            _ => {}
        }

        self.seat_from_waitlist();
        self.maybe_start_hand();
        seat.stack
    }

    /// Void the hand in progress: no payout, committed chips are forfeited,
    /// stacks stand as they are.
    fn abandon_hand(&mut self) {
        self.session = None;
        for seat in self.seats.values_mut() {
            seat.reset_for_hand();
        }
        self.emit_table_update(TableAction::HandAbandoned);
        self.emit_stacks();
    }

    /// Fill free seats from the waiting list, FIFO, lowest seat number
    /// first.
    fn seat_from_waitlist(&mut self) {
        while !self.waitlist.is_empty() && self.seats.len() < self.config.max_seats {
            let free = match (0..self.config.max_seats).find(|n| !self.seats.contains_key(n)) {
                Some(n) => n,
                None => unreachable!("occupancy below max_seats leaves a free seat"),
            };
            let (user, buy_in) = match self.waitlist.pop_front() {
                Some(entry) => entry,
                None => unreachable!("waitlist checked non-empty"),
            };
            info!("table {}: {user} seated from the waiting list at seat {free}", self.id);
            self.seats.insert(free, Seat::new(free, user, buy_in));
            self.emit_table_update(TableAction::SeatTaken);
        }
    }

    /// Translate buffered session events into routed notifications.
    fn forward_session_events(&mut self) {
        let events = match &mut self.session {
            Some(session) => session.drain_events(),
            None => return,
        };
        for event in events {
            match event {
                SessionEvent::StateChanged {
                    stage,
                    community,
                    pot,
                    bets,
                } => self.emit_broadcast(Notification::GameStateUpdate {
                    stage,
                    community_cards: community,
                    pot,
                    bets,
                }),
                SessionEvent::TurnChanged { seat } => {
                    self.emit_broadcast(Notification::TurnUpdate { seat });
                }
                SessionEvent::ActionTaken {
                    seat,
                    action,
                    amount,
                    bets,
                } => self.emit_broadcast(Notification::PlayerAction {
                    seat,
                    action,
                    amount,
                    bets,
                }),
                SessionEvent::HoleCardsDealt => self.emit_hole_cards(),
                SessionEvent::StacksChanged { stacks } => {
                    self.emit_broadcast(Notification::PlayerStacks { stacks });
                }
                SessionEvent::HandFinished { winners, share } => {
                    info!(
                        "table {}: hand finished, {share} chips to each of {winners:?}",
                        self.id
                    );
                }
            }
        }
    }

    /// If the hand just reached FINISHED, drop it and immediately start the
    /// next one with the button advanced.
    fn settle_finished_hand(&mut self) {
        let finished = self
            .session
            .as_ref()
            .is_some_and(|session| session.stage() == Stage::Finished);
        if finished {
            self.session = None;
            self.emit_table_update(TableAction::HandFinished);
            self.maybe_start_hand();
        }
    }

    /// Personalized hole-card payloads: each dealt-in player sees their own
    /// two cards face up and everyone else's as hidden.
    fn emit_hole_cards(&mut self) {
        let dealt: Vec<(SeatNumber, UserId)> = self
            .seats
            .values()
            .filter(|seat| seat.in_hand)
            .map(|seat| (seat.seat_number, seat.user.id))
            .collect();

        for &(me, user_id) in &dealt {
            let per_seat = dealt
                .iter()
                .map(|&(n, _)| {
                    let seat = &self.seats[&n];
                    let cards: Vec<CardView> = if n == me {
                        seat.hole_cards.iter().map(|&card| card.into()).collect()
                    } else {
                        vec![CardView::Hidden; seat.hole_cards.len()]
                    };
                    (n, cards)
                })
                .collect();
            self.events.push_back(TableEvent {
                to: Recipients::User(user_id),
                payload: Notification::HoleCards { per_seat },
            });
        }
    }

    fn emit_stacks(&mut self) {
        let stacks = self
            .seats
            .values()
            .map(|seat| (seat.seat_number, seat.stack))
            .collect();
        self.emit_broadcast(Notification::PlayerStacks { stacks });
    }

    fn emit_broadcast(&mut self, payload: Notification) {
        self.events.push_back(TableEvent {
            to: Recipients::Observers,
            payload,
        });
    }

    fn emit_table_update(&mut self, action: TableAction) {
        let payload = Notification::TableUpdate {
            action,
            table: self.snapshot(),
        };
        self.emit_broadcast(payload);
    }
}
