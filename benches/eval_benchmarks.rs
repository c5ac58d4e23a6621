use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use table_stakes::game::{
    ActionType, Blinds, Card, Chips, GameSession, Seat, SeatNumber, Seats, Stage, Suit, User,
    evaluate, winners,
};

const BLINDS: Blinds = Blinds { small: 10, big: 20 };
const MIN_RAISE: Chips = 20;

fn seats_for(n: usize) -> Seats {
    (0..n)
        .map(|i| {
            let user = User::new(i as i64 + 1, &format!("player{i}"));
            (i, Seat::new(i, user, 1_000))
        })
        .collect()
}

/// Run a whole hand: start, call or check every turn, pay out at showdown.
fn play_checked_hand(mut seats: Seats) {
    let ordering: Vec<SeatNumber> = seats.keys().copied().collect();
    let mut session = GameSession::start(BLINDS, MIN_RAISE, ordering, &mut seats);
    while session.stage() != Stage::Finished {
        let actor = session.current_actor().expect("betting round is open");
        let highest: Chips = seats.values().map(|s| s.bet_amount).max().unwrap_or(0);
        let owed = highest - seats[&actor].bet_amount;
        if owed > 0 {
            session.act(&mut seats, actor, ActionType::Call, owed).unwrap();
        } else {
            session.act(&mut seats, actor, ActionType::Check, 0).unwrap();
        }
    }
}

/// Benchmark evaluation of exactly five cards (one subset).
fn bench_eval_5_cards(c: &mut Criterion) {
    let cards = [
        Card(14, Suit::Spade),
        Card(13, Suit::Spade),
        Card(9, Suit::Heart),
        Card(9, Suit::Diamond),
        Card(2, Suit::Club),
    ];
    c.bench_function("eval_5_cards", |b| {
        b.iter(|| evaluate(&cards));
    });
}

/// Benchmark the showdown case: seven cards, 21 subsets.
fn bench_eval_7_cards(c: &mut Criterion) {
    let cards = [
        Card(14, Suit::Spade),
        Card(13, Suit::Spade),
        Card(12, Suit::Spade),
        Card(11, Suit::Spade),
        Card(10, Suit::Spade),
        Card(2, Suit::Heart),
        Card(3, Suit::Diamond),
    ];
    c.bench_function("eval_7_cards", |b| {
        b.iter(|| evaluate(&cards));
    });
}

/// Benchmark evaluation across 100 distinct seven-card boards.
fn bench_eval_100_hands(c: &mut Criterion) {
    let hands: Vec<Vec<Card>> = (0..100)
        .map(|i| {
            let base = (i % 8) as u8 + 2;
            Suit::ALL
                .iter()
                .cycle()
                .take(7)
                .enumerate()
                .map(|(offset, &suit)| Card(base + offset as u8 / 2, suit))
                .collect()
        })
        .collect();

    c.bench_function("eval_100_hands", |b| {
        b.iter(|| {
            hands
                .iter()
                .map(|cards| evaluate(cards))
                .collect::<Vec<_>>()
        });
    });
}

/// Benchmark winner selection over a table of ranked hands.
fn bench_winner_selection(c: &mut Criterion) {
    let ranked: Vec<_> = (0..9)
        .map(|i| {
            evaluate(&[
                Card(2 + i, Suit::Club),
                Card(5, Suit::Heart),
                Card(9, Suit::Diamond),
                Card(11, Suit::Spade),
                Card(13, Suit::Heart),
            ])
        })
        .collect();

    c.bench_function("winner_selection_9_hands", |b| {
        b.iter(|| winners(&ranked));
    });
}

/// Benchmark a complete checked-down hand, blinds to payout, by table size.
fn bench_full_hand(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_hand");
    for n_players in [2, 6, 9] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{n_players}_players")),
            &n_players,
            |b, &n| {
                b.iter_batched(
                    || seats_for(n),
                    play_checked_hand,
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

criterion_group!(
    hand_evaluation,
    bench_eval_5_cards,
    bench_eval_7_cards,
    bench_eval_100_hands,
    bench_winner_selection,
);

criterion_group!(game_operations, bench_full_hand);

criterion_main!(hand_evaluation, game_operations);
