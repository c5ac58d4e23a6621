//! The betting state machine for one hand.
//!
//! A `GameSession` runs a single hand from blind posting to payout. It does
//! not own the seats; the table passes its seat map into every call and the
//! session mutates stacks, bets, and participation flags in place. State
//! changes are pushed into an internal event buffer which the table drains
//! after each call and converts into outbound notifications.
//!
//! Stages advance `WAITING_FOR_PLAYERS → PRE_FLOP → FLOP → TURN → RIVER →
//! SHOWDOWN → FINISHED`. Per-seat bets accumulate in `Seat::bet_amount`
//! during a round and are swept into the pot when the round closes, so at
//! any instant `Σ stack + Σ bet_amount + pot` equals the chips bought in.

use log::{info, warn};
use std::collections::{BTreeMap, VecDeque};
use uuid::Uuid;

use super::entities::{ActionType, Blinds, Card, Chips, Deck, Seat, SeatNumber, Stage};
use super::errors::ActionError;
use super::eval::{self, HandRank};

/// Seat maps are owned by the table and borrowed by the session per call.
pub type Seats = BTreeMap<SeatNumber, Seat>;

/// State changes recorded while the session mutates seats. Payload maps are
/// captured at emit time, so draining later never races a newer mutation.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    StateChanged {
        stage: Stage,
        community: Vec<Card>,
        pot: Chips,
        bets: BTreeMap<SeatNumber, Chips>,
    },
    TurnChanged {
        seat: Option<SeatNumber>,
    },
    ActionTaken {
        seat: SeatNumber,
        action: ActionType,
        amount: Chips,
        bets: BTreeMap<SeatNumber, Chips>,
    },
    /// Hole cards were dealt; the table builds the personalized payloads.
    HoleCardsDealt,
    StacksChanged {
        stacks: BTreeMap<SeatNumber, Chips>,
    },
    HandFinished {
        winners: Vec<SeatNumber>,
        share: Chips,
    },
}

#[derive(Debug)]
pub struct GameSession {
    id: Uuid,
    stage: Stage,
    community: Vec<Card>,
    pot: Chips,
    deck: Deck,
    /// Seats dealt into this hand, dealer-relative: the first entry posts
    /// the small blind and action wraps from there.
    ordering: Vec<SeatNumber>,
    /// Seats still owed a voluntary action this round, after the current
    /// actor. Never contains a folded or all-in seat by the time it is
    /// popped.
    queue: VecDeque<SeatNumber>,
    current_actor: Option<SeatNumber>,
    blinds: Blinds,
    min_raise: Chips,
    events: VecDeque<SessionEvent>,
}

impl GameSession {
    /// Start a hand over `ordering` (dealer-relative seat numbers): deal two
    /// hole cards per seat, post both blinds, and hand the turn to the first
    /// voluntary actor.
    ///
    /// The table gates session creation on having at least two funded
    /// occupied seats; fewer is a caller bug and panics.
    pub fn start(blinds: Blinds, min_raise: Chips, ordering: Vec<SeatNumber>, seats: &mut Seats) -> Self {
        assert!(
            ordering.len() >= 2,
            "a hand needs at least 2 dealt-in seats, got {}",
            ordering.len()
        );

        let mut deck = Deck::default();
        deck.shuffle();
        let mut session = Self {
            id: Uuid::new_v4(),
            stage: Stage::WaitingForPlayers,
            community: Vec::with_capacity(5),
            pot: 0,
            deck,
            ordering,
            queue: VecDeque::new(),
            current_actor: None,
            blinds,
            min_raise,
            events: VecDeque::new(),
        };
        session.begin(seats);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn pot(&self) -> Chips {
        self.pot
    }

    pub fn community(&self) -> &[Card] {
        &self.community
    }

    pub fn current_actor(&self) -> Option<SeatNumber> {
        self.current_actor
    }

    pub fn contains(&self, seat_number: SeatNumber) -> bool {
        self.ordering.contains(&seat_number)
    }

    /// Take the buffered events, oldest first.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    /// Apply a voluntary action from `seat_number`.
    ///
    /// Protocol violations (wrong turn, unknown seat, finished hand, raise
    /// below the minimum) come back as errors with no state change. Soft
    /// rule violations (checking into a bet, short or zero calls, raises
    /// the stack cannot cover) are logged and ignored, leaving the turn
    /// with the same seat.
    pub fn act(
        &mut self,
        seats: &mut Seats,
        seat_number: SeatNumber,
        action: ActionType,
        amount: Chips,
    ) -> Result<(), ActionError> {
        if self.stage == Stage::Finished {
            return Err(ActionError::HandOver);
        }
        if !self.ordering.contains(&seat_number) || !seats.contains_key(&seat_number) {
            return Err(ActionError::UnknownPlayer(seat_number));
        }
        if self.current_actor != Some(seat_number) {
            return Err(ActionError::NotYourTurn(seat_number));
        }

        match action {
            ActionType::SmallBlind | ActionType::BigBlind => {
                warn!("seat {seat_number} submitted a blind; blinds are posted by the engine");
                Ok(())
            }
            ActionType::Fold => {
                self.fold_seat(seats, seat_number);
                if self.stage != Stage::Finished {
                    self.advance_turn(seats);
                }
                Ok(())
            }
            ActionType::Check => {
                self.apply_check(seats, seat_number);
                Ok(())
            }
            ActionType::Call => {
                self.apply_call(seats, seat_number, amount);
                Ok(())
            }
            ActionType::Raise => self.apply_raise(seats, seat_number, amount),
        }
    }

    /// A seated player left mid-hand: fold them in place. If they were the
    /// current actor the turn moves on; if they were the last live seat the
    /// hand finishes immediately.
    ///
    /// The table removes the seat right after this call, so the departing
    /// seat's uncollected round bet is flushed into the pot here; a later
    /// sweep would miss it.
    pub fn handle_leave(&mut self, seats: &mut Seats, seat_number: SeatNumber) {
        if self.stage == Stage::Finished || !self.ordering.contains(&seat_number) {
            return;
        }
        let live = seats.get(&seat_number).is_some_and(|seat| seat.in_hand);
        let was_current = self.current_actor == Some(seat_number);
        if live {
            info!("seat {seat_number} left mid-hand, folding in place");
            self.fold_seat(seats, seat_number);
        } else {
            self.queue.retain(|&q| q != seat_number);
        }
        if self.stage != Stage::Finished {
            if let Some(seat) = seats.get_mut(&seat_number) {
                self.pot += seat.bet_amount;
                seat.bet_amount = 0;
            }
            if live && was_current {
                self.advance_turn(seats);
            }
        }
    }

    /// The table moved a dealt-in player to a different seat number; follow
    /// them so turn order and bet tracking stay coherent. The seat map entry
    /// has already been re-keyed by the caller.
    pub fn relocate(&mut self, from: SeatNumber, to: SeatNumber) {
        for n in self.ordering.iter_mut().chain(self.queue.iter_mut()) {
            if *n == from {
                *n = to;
            }
        }
        if self.current_actor == Some(from) {
            self.current_actor = Some(to);
        }
    }

    fn begin(&mut self, seats: &mut Seats) {
        let order = self.ordering.clone();
        for &n in &order {
            let cards = [self.deck.draw(), self.deck.draw()];
            let seat = seat_mut(seats, n);
            seat.reset_for_hand();
            seat.in_hand = true;
            seat.hole_cards.extend(cards);
        }
        self.stage = Stage::PreFlop;
        self.queue = order.iter().copied().collect();

        // The blinds come off the head of the queue, consuming those seats'
        // pre-flop turns.
        let small = match self.queue.pop_front() {
            Some(n) => n,
            None => unreachable!("ordering holds at least 2 seats"),
        };
        let big = match self.queue.pop_front() {
            Some(n) => n,
            None => unreachable!("ordering holds at least 2 seats"),
        };
        self.post_blind(seats, small, self.blinds.small, ActionType::SmallBlind);
        self.post_blind(seats, big, self.blinds.big, ActionType::BigBlind);

        // Heads-up leaves nobody behind the blinds; rebuild so both seats
        // still get a voluntary pre-flop action.
        if self.queue.is_empty() {
            self.queue = self.actable(seats).into();
        }

        info!(
            "hand {} started with {} seats at blinds {}",
            self.id,
            self.ordering.len(),
            self.blinds
        );

        self.events.push_back(SessionEvent::HoleCardsDealt);
        self.emit_stacks(seats);
        self.emit_state(seats);
        self.advance_turn(seats);
    }

    fn post_blind(&mut self, seats: &mut Seats, n: SeatNumber, blind: Chips, action: ActionType) {
        let seat = seat_mut(seats, n);
        let posted = blind.min(seat.stack);
        if posted < blind {
            warn!("seat {n} is short the {blind} blind, posting {posted} all-in");
        }
        seat.commit(posted);
        self.emit_action(seats, n, action, posted);
    }

    fn apply_check(&mut self, seats: &mut Seats, n: SeatNumber) {
        let highest = self.highest_bet(seats);
        let own = seats[&n].bet_amount;
        if own < highest {
            warn!("seat {n} checked into a {highest} chip bet, ignoring");
            return;
        }
        self.emit_action(seats, n, ActionType::Check, 0);
        self.advance_turn(seats);
    }

    fn apply_call(&mut self, seats: &mut Seats, n: SeatNumber, amount: Chips) {
        let highest = self.highest_bet(seats);
        let (own, stack) = {
            let seat = &seats[&n];
            (seat.bet_amount, seat.stack)
        };
        if amount == 0 {
            warn!("seat {n} called with a non-positive amount, ignoring");
            return;
        }
        if own >= highest {
            warn!("seat {n} called with nothing outstanding to call, ignoring");
            return;
        }
        if amount > stack {
            warn!("seat {n} called {amount} with only {stack} behind, ignoring");
            return;
        }
        if own.saturating_add(amount) < highest {
            warn!("seat {n} called {amount} against an outstanding {highest}, ignoring");
            return;
        }
        seat_mut(seats, n).commit(amount);
        self.emit_action(seats, n, ActionType::Call, amount);
        self.advance_turn(seats);
    }

    fn apply_raise(
        &mut self,
        seats: &mut Seats,
        n: SeatNumber,
        amount: Chips,
    ) -> Result<(), ActionError> {
        if amount == 0 {
            warn!("seat {n} raised a non-positive amount, ignoring");
            return Ok(());
        }
        if amount < self.min_raise {
            return Err(ActionError::InvalidAmount {
                amount,
                min_raise: self.min_raise,
            });
        }
        let stack = seats[&n].stack;
        if amount > stack {
            warn!("seat {n} raised {amount} with only {stack} behind, ignoring");
            return Ok(());
        }
        seat_mut(seats, n).commit(amount);

        // Everyone else still live owes a response to the raise; the raiser
        // is not re-queued unless raised against in turn.
        self.queue = self
            .actable(seats)
            .into_iter()
            .filter(|&q| q != n)
            .collect();

        self.emit_action(seats, n, ActionType::Raise, amount);
        self.advance_turn(seats);
        Ok(())
    }

    /// Fold `n` out of the hand. Shared by voluntary folds and mid-hand
    /// leaves; finishes the hand early when at most one live seat remains.
    fn fold_seat(&mut self, seats: &mut Seats, n: SeatNumber) {
        seat_mut(seats, n).fold();
        self.queue.retain(|&q| q != n);
        self.emit_action(seats, n, ActionType::Fold, 0);
        if self.live_count(seats) <= 1 {
            self.finish_early(seats);
        }
    }

    /// Hand the turn to the next queued seat still able to act; when the
    /// queue runs dry the betting round is over.
    fn advance_turn(&mut self, seats: &mut Seats) {
        while let Some(n) = self.queue.pop_front() {
            let actable = seats
                .get(&n)
                .is_some_and(|seat| seat.in_hand && !seat.all_in);
            if actable {
                self.current_actor = Some(n);
                self.emit_turn();
                return;
            }
        }
        self.current_actor = None;
        self.close_round(seats);
    }

    /// Sweep round bets into the pot and deal the next street. Streets with
    /// fewer than two seats able to bet are run out without another round;
    /// past the river the hand goes to showdown.
    fn close_round(&mut self, seats: &mut Seats) {
        loop {
            self.sweep_bets(seats);
            match self.stage {
                Stage::PreFlop => {
                    self.deal_community(3);
                    self.stage = Stage::Flop;
                }
                Stage::Flop => {
                    self.deal_community(1);
                    self.stage = Stage::Turn;
                }
                Stage::Turn => {
                    self.deal_community(1);
                    self.stage = Stage::River;
                }
                Stage::River => {
                    self.stage = Stage::Showdown;
                    self.emit_state(seats);
                    self.showdown(seats);
                    return;
                }
                Stage::WaitingForPlayers | Stage::Showdown | Stage::Finished => {
                    unreachable!("no betting round to close during {}", self.stage)
                }
            }
            self.emit_state(seats);

            let actable = self.actable(seats);
            if actable.len() >= 2 {
                self.queue = actable.into();
                self.current_actor = self.queue.pop_front();
                self.emit_turn();
                return;
            }
        }
    }

    /// ≤1 live seat remains: collect outstanding bets and settle now,
    /// whatever street the hand was on.
    fn finish_early(&mut self, seats: &mut Seats) {
        self.sweep_bets(seats);
        self.stage = Stage::Showdown;
        self.emit_state(seats);
        self.showdown(seats);
    }

    fn showdown(&mut self, seats: &mut Seats) {
        debug_assert_eq!(self.stage, Stage::Showdown);

        let contenders: Vec<SeatNumber> = self
            .ordering
            .iter()
            .copied()
            .filter(|n| seats.get(n).is_some_and(|seat| seat.in_hand))
            .collect();

        let winners: Vec<SeatNumber> = match contenders.len() {
            0 => {
                warn!(
                    "hand {} ended with no contenders, {} chip pot forfeited",
                    self.id, self.pot
                );
                Vec::new()
            }
            1 => contenders,
            _ => {
                let hands: Vec<HandRank> = contenders
                    .iter()
                    .map(|&n| {
                        let seat = &seats[&n];
                        let mut cards = seat.hole_cards.clone();
                        cards.extend(self.community.iter().copied());
                        eval::evaluate(&cards)
                    })
                    .collect();
                for (&n, hand) in contenders.iter().zip(&hands) {
                    info!("hand {}: seat {n} shows {hand}", self.id);
                }
                eval::winners(&hands)
                    .into_iter()
                    .map(|i| contenders[i])
                    .collect()
            }
        };

        // Integer split; the remainder of an uneven pot is dropped rather
        // than reconciled.
        let share = if winners.is_empty() {
            0
        } else {
            self.pot / winners.len() as Chips
        };
        for &n in &winners {
            seat_mut(seats, n).stack += share;
        }
        if !winners.is_empty() {
            info!(
                "hand {}: pot of {} pays {} to seats {winners:?}",
                self.id, self.pot, share
            );
        }

        self.pot = 0;
        self.stage = Stage::Finished;
        self.current_actor = None;
        self.events
            .push_back(SessionEvent::HandFinished { winners, share });
        self.emit_stacks(seats);
        self.emit_state(seats);
        self.emit_turn();
    }

    fn sweep_bets(&mut self, seats: &mut Seats) {
        for seat in seats.values_mut() {
            self.pot += seat.bet_amount;
            seat.bet_amount = 0;
        }
    }

    fn deal_community(&mut self, count: usize) {
        for _ in 0..count {
            self.community.push(self.deck.draw());
        }
    }

    /// Dealt-in seats still able to take a voluntary action, in hand order.
    fn actable(&self, seats: &Seats) -> Vec<SeatNumber> {
        self.ordering
            .iter()
            .copied()
            .filter(|n| {
                seats
                    .get(n)
                    .is_some_and(|seat| seat.in_hand && !seat.all_in)
            })
            .collect()
    }

    fn live_count(&self, seats: &Seats) -> usize {
        self.ordering
            .iter()
            .filter(|n| seats.get(n).is_some_and(|seat| seat.in_hand))
            .count()
    }

    /// Highest current-round bet across the hand, folded seats included;
    /// their chips are still in front of them until the sweep.
    fn highest_bet(&self, seats: &Seats) -> Chips {
        self.ordering
            .iter()
            .filter_map(|n| seats.get(n).map(|seat| seat.bet_amount))
            .max()
            .unwrap_or(0)
    }

    fn bets_map(&self, seats: &Seats) -> BTreeMap<SeatNumber, Chips> {
        self.ordering
            .iter()
            .filter_map(|&n| seats.get(&n).map(|seat| (n, seat.bet_amount)))
            .collect()
    }

    fn emit_state(&mut self, seats: &Seats) {
        let event = SessionEvent::StateChanged {
            stage: self.stage,
            community: self.community.clone(),
            pot: self.pot,
            bets: self.bets_map(seats),
        };
        self.events.push_back(event);
    }

    fn emit_turn(&mut self) {
        self.events.push_back(SessionEvent::TurnChanged {
            seat: self.current_actor,
        });
    }

    fn emit_action(&mut self, seats: &Seats, n: SeatNumber, action: ActionType, amount: Chips) {
        let event = SessionEvent::ActionTaken {
            seat: n,
            action,
            amount,
            bets: self.bets_map(seats),
        };
        self.events.push_back(event);
    }

    fn emit_stacks(&mut self, seats: &Seats) {
        let stacks = seats
            .iter()
            .map(|(&n, seat)| (n, seat.stack))
            .collect();
        self.events.push_back(SessionEvent::StacksChanged { stacks });
    }
}

fn seat_mut(seats: &mut Seats, n: SeatNumber) -> &mut Seat {
    match seats.get_mut(&n) {
        Some(seat) => seat,
        None => unreachable!("seat {n} vanished mid-hand"),
    }
}
