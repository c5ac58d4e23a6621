//! Table-level scenarios: seating, dealer rotation, waiting list, eviction.

use table_stakes::game::{ActionType, Blinds, Chips, User, UserId};
use table_stakes::table::{Table, TableConfig, TableError};

fn config() -> TableConfig {
    TableConfig {
        name: "integration".to_string(),
        max_seats: 4,
        blinds: Blinds { small: 10, big: 20 },
        min_raise: 20,
        min_buy_in: 100,
        max_buy_in: 2_000,
    }
}

fn user(id: UserId) -> User {
    User::new(id, &format!("user{id}"))
}

fn total_stacks(table: &Table) -> Chips {
    table.seats().values().map(|s| s.stack + s.bet_amount).sum()
}

#[test]
fn table_fills_then_rejects() {
    let mut table = Table::new(7, config());
    for (i, id) in [(0, 1), (1, 2), (2, 3), (3, 4)] {
        table.take_seat(i, user(id), 500).unwrap();
    }
    assert_eq!(table.occupied(), 4);
    assert_eq!(
        table.take_seat(0, user(5), 500).unwrap_err(),
        TableError::SeatTaken(0)
    );
    // Every seat is held, so a new player cannot sit anywhere.
    for seat in 0..4 {
        assert!(table.take_seat(seat, user(5), 500).is_err());
    }
}

#[test]
fn hands_chain_across_fold_outs_and_chips_survive() {
    let mut table = Table::new(7, config());
    table.take_seat(0, user(1), 500).unwrap();
    table.take_seat(1, user(2), 500).unwrap();
    table.take_seat(2, user(3), 500).unwrap();
    assert!(table.hand_active());

    // Play five hands by folding every voluntary action. Fold-only hands
    // award the whole pot to the last live seat, so no chips are lost and
    // each finish rolls straight into the next hand.
    for _ in 0..5 {
        for _ in 0..2 {
            let actor = table.current_actor().expect("hand in progress");
            let user_id = table.seats()[&actor].user.id;
            table.submit_action(user_id, ActionType::Fold, 0).unwrap();
        }
        assert!(table.hand_active(), "the next hand starts immediately");
        assert_eq!(total_stacks(&table), 1_500);
    }
}

#[test]
fn mid_hand_relocation_preserves_the_turn() {
    let mut table = Table::new(7, config());
    table.take_seat(0, user(1), 500).unwrap();
    table.take_seat(1, user(2), 500).unwrap();
    table.take_seat(2, user(3), 500).unwrap();

    // With the button at seat 0 the blinds sit at 1 and 2, so the dealer
    // acts first pre-flop. Moving that player to the empty seat 3 carries
    // the turn along with them.
    assert_eq!(table.current_actor(), Some(0));
    table.take_seat(3, user(1), 0).unwrap();
    assert_eq!(table.current_actor(), Some(3));
    table.submit_action(1, ActionType::Call, 20).unwrap();
    assert_eq!(table.seats()[&3].total_contribution, 20);
}

#[test]
fn leaving_mid_hand_folds_the_seat_and_the_hand_continues() {
    let mut table = Table::new(7, config());
    table.take_seat(0, user(1), 500).unwrap();
    table.take_seat(1, user(2), 500).unwrap();
    table.take_seat(2, user(3), 500).unwrap();

    // The departing dealer has posted nothing yet, so the full buy-in comes
    // back; the two blind seats play the hand out between themselves.
    assert_eq!(table.current_actor(), Some(0));
    let cashed = table.leave_seat(0, 1).unwrap();
    assert_eq!(cashed, 500);
    assert_eq!(table.occupied(), 2);
    assert!(table.hand_active());
    assert_eq!(table.current_actor(), Some(1));
}

#[test]
fn eviction_mid_hand_reseats_from_the_waitlist() {
    let mut table = Table::new(
        7,
        TableConfig {
            max_seats: 2,
            ..config()
        },
    );
    table.take_seat(0, user(1), 500).unwrap();
    table.take_seat(1, user(2), 500).unwrap();
    table.join_waitlist(user(3), 300).unwrap();

    // User 1 disconnects: their seat folds, the survivor collects the
    // blinds, the waitlisted player takes the freed seat, and the next
    // hand starts between the survivor and the newcomer.
    table.evict_user(1);
    assert_eq!(table.seat_of(3), Some(0));
    assert!(table.hand_active());
    assert_eq!(table.snapshot().waiting, 0);
}

#[test]
fn snapshot_reflects_live_state() {
    let mut table = Table::new(42, config());
    table.take_seat(2, user(1), 500).unwrap();
    let snapshot = table.snapshot();

    assert_eq!(snapshot.id, 42);
    assert_eq!(snapshot.name, "integration");
    assert_eq!(snapshot.max_seats, 4);
    assert_eq!(snapshot.small_blind, 10);
    assert_eq!(snapshot.big_blind, 20);
    assert_eq!(snapshot.seats.len(), 1);
    assert_eq!(snapshot.seats[0].seat_number, 2);
    assert_eq!(snapshot.seats[0].stack, 500);
    assert!(!snapshot.hand_active);

    // Snapshots never leak hole cards.
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(!json.contains("holeCards"));
    assert!(!json.contains("suit"));
}
