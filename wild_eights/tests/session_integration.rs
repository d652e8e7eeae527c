//! Integration tests for room session flows: dealing, card effects,
//! penalty stacks, the wild-color gate, rankings, and connectivity.

use rand::SeedableRng;
use rand::rngs::StdRng;

use wild_eights::constants::DECK_SIZE;
use wild_eights::entities::{Card, CardColor, ConnectionState, GameKind, Nickname, RoomStatus};
use wild_eights::game::deck::Deck;
use wild_eights::game::session::{GraceOutcome, SessionEvent};
use wild_eights::game::{GameError, GameSession, GameSettings};
use wild_eights::{PlayerId, RoomSnapshot};

fn new_room(settings: GameSettings) -> GameSession {
    GameSession::with_rng(
        "TEST42".to_string(),
        GameKind::WildEights,
        settings,
        StdRng::seed_from_u64(42),
    )
    .unwrap()
}

fn join_n(session: &mut GameSession, names: &[&str]) -> Vec<PlayerId> {
    names
        .iter()
        .map(|name| session.join(Nickname::new(name)).unwrap())
        .collect()
}

/// The full 108-card multiset, mirroring the engine's composition.
fn full_set() -> Vec<Card> {
    let mut cards = Vec::new();
    for color in CardColor::ALL {
        cards.push(Card::Number { color, rank: 0 });
        for rank in 1..=9 {
            cards.push(Card::Number { color, rank });
            cards.push(Card::Number { color, rank });
        }
        for _ in 0..2 {
            cards.push(Card::Skip { color });
            cards.push(Card::Reverse { color });
            cards.push(Card::DrawTwo { color });
        }
    }
    for _ in 0..4 {
        cards.push(Card::Wild);
        cards.push(Card::WildFour);
    }
    cards
}

fn remove_one(pool: &mut Vec<Card>, card: &Card) {
    let index = pool
        .iter()
        .position(|c| c == card)
        .expect("card available in the full set");
    pool.remove(index);
}

/// Build a full 108-card deck arranged so the deal hands seat `i` exactly
/// `hands[i]`, the first flip is `first_discard`, and later draws come
/// from the rest of the set.
fn rigged_deck(hands: &[Vec<Card>], first_discard: Card) -> Deck {
    let mut pool = full_set();
    for hand in hands {
        for card in hand {
            remove_one(&mut pool, card);
        }
    }
    remove_one(&mut pool, &first_discard);

    let mut draw_pile = pool;
    draw_pile.push(first_discard);
    for hand in hands.iter().rev() {
        for card in hand {
            draw_pile.push(*card);
        }
    }
    Deck::from_parts(draw_pile, Vec::new())
}

fn card_index(session: &GameSession, player: PlayerId, card: &Card) -> usize {
    session
        .hand(player)
        .unwrap()
        .iter()
        .position(|c| c == card)
        .expect("card in hand")
}

fn number(color: CardColor, rank: u8) -> Card {
    Card::Number { color, rank }
}

/// Seven green/yellow number cards that stay out of the way of the red
/// scenario cards. `salt` keeps sibling hands inside the two-copy limit.
fn filler_hand(salt: u8) -> Vec<Card> {
    let color = if salt % 2 == 0 {
        CardColor::Green
    } else {
        CardColor::Yellow
    };
    (1..=7).map(|rank| number(color, rank)).collect()
}

#[test]
fn starting_a_game_deals_seven_and_conserves_the_deck() {
    let mut session = new_room(GameSettings::default());
    let players = join_n(&mut session, &["ada", "lin", "mo", "kit"]);
    session.start_game(players[0]).unwrap();

    for player in &players {
        assert_eq!(session.hand(*player).unwrap().len(), 7);
    }
    assert_eq!(session.status(), RoomStatus::Playing);
    assert_eq!(session.total_cards(), DECK_SIZE);

    let snapshot = session.snapshot_for(None);
    assert!(matches!(snapshot.discard_top, Some(Card::Number { .. })));
    assert!(snapshot.current_color.is_some());
    assert_eq!(snapshot.turn_seat, Some(0));
}

#[test]
fn games_need_a_host_and_two_seated_players() {
    let mut session = new_room(GameSettings::default());
    let host = session.join(Nickname::new("ada")).unwrap();
    assert_eq!(
        session.start_game(host),
        Err(GameError::NotEnoughPlayers)
    );

    let guest = session.join(Nickname::new("lin")).unwrap();
    assert_eq!(session.start_game(guest), Err(GameError::NotHost));
    session.start_game(host).unwrap();
    assert_eq!(session.start_game(host), Err(GameError::RoomNotJoinable));
}

#[test]
fn draw_two_without_stacking_forces_the_draw_and_skips() {
    let settings = GameSettings {
        stack_draw_penalties: false,
        ..GameSettings::default()
    };
    let mut session = new_room(settings);
    let players = join_n(&mut session, &["ada", "lin", "mo", "kit"]);
    let [a, b, c, _d] = players[..] else { panic!() };

    let mut a_hand = filler_hand(0);
    a_hand[6] = Card::DrawTwo {
        color: CardColor::Red,
    };
    let hands = vec![a_hand, filler_hand(1), filler_hand(2), filler_hand(3)];
    let deck = rigged_deck(&hands, number(CardColor::Red, 5));
    session.start_game_with_deck(a, deck).unwrap();
    session.drain_events();

    let draw_two = Card::DrawTwo {
        color: CardColor::Red,
    };
    session
        .play_card(a, card_index(&session, a, &draw_two))
        .unwrap();

    // The next player drew the whole penalty and lost the turn.
    assert_eq!(session.hand(b).unwrap().len(), 9);
    assert_eq!(session.pending_draw(), 0);
    assert_eq!(session.current_turn(), Some(c));
    assert_eq!(session.total_cards(), DECK_SIZE);

    let events = session.drain_events();
    assert!(events.contains(&SessionEvent::PenaltyApplied {
        player: b,
        amount: 2
    }));
}

#[test]
fn draw_penalties_stack_until_someone_draws() {
    let mut session = new_room(GameSettings::default());
    let players = join_n(&mut session, &["ada", "lin", "mo", "kit"]);
    let [a, b, c, d] = players[..] else { panic!() };

    let mut a_hand = filler_hand(0);
    a_hand[6] = Card::DrawTwo {
        color: CardColor::Red,
    };
    let mut b_hand = filler_hand(1);
    b_hand[6] = Card::DrawTwo {
        color: CardColor::Blue,
    };
    let hands = vec![a_hand, b_hand, filler_hand(2), filler_hand(3)];
    let deck = rigged_deck(&hands, number(CardColor::Red, 5));
    session.start_game_with_deck(a, deck).unwrap();

    let red_draw_two = Card::DrawTwo {
        color: CardColor::Red,
    };
    let blue_draw_two = Card::DrawTwo {
        color: CardColor::Blue,
    };

    session
        .play_card(a, card_index(&session, a, &red_draw_two))
        .unwrap();
    assert_eq!(session.pending_draw(), 2);
    assert_eq!(session.current_turn(), Some(b));

    // Only another penalty card keeps the chain alive.
    let filler_index = card_index(&session, b, &number(CardColor::Yellow, 1));
    assert_eq!(session.play_card(b, filler_index), Err(GameError::IllegalPlay));
    session
        .play_card(b, card_index(&session, b, &blue_draw_two))
        .unwrap();
    assert_eq!(session.pending_draw(), 4);
    assert_eq!(session.current_turn(), Some(c));

    // Drawing consumes the whole stack and the turn.
    session.drain_events();
    session.draw_card(c).unwrap();
    assert_eq!(session.hand(c).unwrap().len(), 11);
    assert_eq!(session.pending_draw(), 0);
    assert_eq!(session.current_turn(), Some(d));
    assert_eq!(session.total_cards(), DECK_SIZE);

    let events = session.drain_events();
    assert!(events.contains(&SessionEvent::PenaltyApplied {
        player: c,
        amount: 4
    }));
}

#[test]
fn wild_four_gates_the_turn_until_a_color_arrives() {
    let settings = GameSettings {
        stack_draw_penalties: false,
        ..GameSettings::default()
    };
    let mut session = new_room(settings);
    let players = join_n(&mut session, &["ada", "lin", "mo", "kit"]);
    let [a, b, c, _d] = players[..] else { panic!() };

    let mut a_hand = filler_hand(0);
    a_hand[6] = Card::WildFour;
    let hands = vec![a_hand, filler_hand(1), filler_hand(2), filler_hand(3)];
    let deck = rigged_deck(&hands, number(CardColor::Red, 5));
    session.start_game_with_deck(a, deck).unwrap();
    session.drain_events();

    session
        .play_card(a, card_index(&session, a, &Card::WildFour))
        .unwrap();
    assert_eq!(session.awaiting_color_from(), Some(a));
    assert!(
        session
            .drain_events()
            .contains(&SessionEvent::ColorChoiceRequested(a))
    );

    // Everyone else is locked out while the gate is open.
    assert_eq!(session.play_card(b, 0), Err(GameError::AwaitingColorChoice));
    assert_eq!(session.draw_card(b), Err(GameError::AwaitingColorChoice));
    assert_eq!(
        session.choose_color(b, CardColor::Blue),
        Err(GameError::AwaitingColorChoice)
    );

    session.choose_color(a, CardColor::Green).unwrap();
    assert_eq!(session.current_color(), Some(CardColor::Green));

    // The next player drew four and lost the turn.
    assert_eq!(session.hand(b).unwrap().len(), 11);
    assert_eq!(session.pending_draw(), 0);
    assert_eq!(session.current_turn(), Some(c));
    assert_eq!(session.total_cards(), DECK_SIZE);

    // A second answer hits a closed gate.
    assert_eq!(
        session.choose_color(a, CardColor::Red),
        Err(GameError::NoColorChoicePending)
    );
}

#[test]
fn reverse_with_two_contenders_hands_the_turn_straight_back() {
    let settings = GameSettings {
        starting_hand_size: 2,
        ..GameSettings::default()
    };
    let mut session = new_room(settings);
    let players = join_n(&mut session, &["ada", "lin"]);
    let [a, b] = players[..] else { panic!() };

    let reverse = Card::Reverse {
        color: CardColor::Red,
    };
    let hands = vec![
        vec![reverse, number(CardColor::Green, 1)],
        vec![number(CardColor::Yellow, 1), number(CardColor::Yellow, 2)],
    ];
    let deck = rigged_deck(&hands, number(CardColor::Red, 5));
    session.start_game_with_deck(a, deck).unwrap();

    session
        .play_card(a, card_index(&session, a, &reverse))
        .unwrap();
    assert_eq!(session.current_turn(), Some(a));
    let _ = b;
}

#[test]
fn emptied_hands_rank_in_order_and_the_last_seat_closes_the_game() {
    let settings = GameSettings {
        starting_hand_size: 1,
        ..GameSettings::default()
    };
    let mut session = new_room(settings);
    let players = join_n(&mut session, &["ada", "lin", "mo"]);
    let [a, b, c] = players[..] else { panic!() };

    let hands = vec![
        vec![number(CardColor::Red, 7)],
        vec![number(CardColor::Red, 9)],
        vec![number(CardColor::Red, 3)],
    ];
    let deck = rigged_deck(&hands, number(CardColor::Red, 5));
    session.start_game_with_deck(a, deck).unwrap();

    session.play_card(a, 0).unwrap();
    assert_eq!(session.finish_rank_of(a), Some(1));
    // Finished seats never receive turns again.
    assert_eq!(session.current_turn(), Some(b));
    assert_eq!(session.play_card(a, 0), Err(GameError::NotYourTurn));

    session.drain_events();
    session.play_card(b, 0).unwrap();

    // One unfinished seat remains: the game is over and the straggler
    // takes the last rank.
    assert_eq!(session.status(), RoomStatus::Finished);
    let rankings = session.rankings();
    let placed: Vec<(PlayerId, u8)> = rankings.iter().map(|r| (r.player, r.rank)).collect();
    assert_eq!(placed, vec![(a, 1), (b, 2), (c, 3)]);

    let events = session.drain_events();
    assert!(events.iter().any(|event| matches!(
        event,
        SessionEvent::GameEnded { winner, .. } if winner.as_str() == "ada"
    )));

    // Finished rooms accept no newcomers.
    assert_eq!(
        session.join(Nickname::new("late")),
        Err(GameError::RoomNotJoinable)
    );
}

#[test]
fn a_silent_one_card_hand_is_penalized_on_its_next_turn() {
    let settings = GameSettings {
        starting_hand_size: 2,
        ..GameSettings::default()
    };
    let mut session = new_room(settings);
    let players = join_n(&mut session, &["ada", "lin"]);
    let [a, b] = players[..] else { panic!() };

    let hands = vec![
        vec![number(CardColor::Red, 7), number(CardColor::Green, 1)],
        vec![number(CardColor::Yellow, 1), number(CardColor::Yellow, 2)],
    ];
    let deck = rigged_deck(&hands, number(CardColor::Red, 5));
    session.start_game_with_deck(a, deck).unwrap();
    session.drain_events();

    session
        .play_card(a, card_index(&session, a, &number(CardColor::Red, 7)))
        .unwrap();
    assert_eq!(session.hand(a).unwrap().len(), 1);

    // The turn comes back around and the missed call costs two cards.
    session.draw_card(b).unwrap();
    assert_eq!(session.current_turn(), Some(a));
    assert_eq!(session.hand(a).unwrap().len(), 3);
    let events = session.drain_events();
    assert!(events.contains(&SessionEvent::PenaltyApplied {
        player: a,
        amount: 2
    }));
    assert_eq!(session.total_cards(), DECK_SIZE);
}

#[test]
fn calling_before_the_play_avoids_the_penalty() {
    let settings = GameSettings {
        starting_hand_size: 2,
        ..GameSettings::default()
    };
    let mut session = new_room(settings);
    let players = join_n(&mut session, &["ada", "lin"]);
    let [a, b] = players[..] else { panic!() };

    let hands = vec![
        vec![number(CardColor::Red, 7), number(CardColor::Green, 1)],
        vec![number(CardColor::Yellow, 1), number(CardColor::Yellow, 2)],
    ];
    let deck = rigged_deck(&hands, number(CardColor::Red, 5));
    session.start_game_with_deck(a, deck).unwrap();

    session.call_uno(a).unwrap();
    assert!(session.drain_events().contains(&SessionEvent::UnoCalled(a)));

    session
        .play_card(a, card_index(&session, a, &number(CardColor::Red, 7)))
        .unwrap();
    session.draw_card(b).unwrap();

    assert_eq!(session.current_turn(), Some(a));
    assert_eq!(session.hand(a).unwrap().len(), 1);
    assert!(!session
        .drain_events()
        .iter()
        .any(|event| matches!(event, SessionEvent::PenaltyApplied { .. })));
}

#[test]
fn a_spectator_seated_mid_game_gets_a_fresh_seven_card_hand() {
    let mut session = new_room(GameSettings::default());
    let players = join_n(&mut session, &["ada", "lin", "mo"]);
    let a = players[0];
    session.start_game(a).unwrap();

    let late = session.join(Nickname::new("kit")).unwrap();
    assert_eq!(session.seat_of(late), None);
    let before = session.snapshot_for(None);
    assert_eq!(before.spectators.len(), 1);

    session.assign_seat(a, late, 3).unwrap();
    assert_eq!(session.seat_of(late), Some(3));
    assert_eq!(session.hand(late).unwrap().len(), 7);
    assert_eq!(session.total_cards(), DECK_SIZE);

    let after = session.snapshot_for(None);
    assert!(after.seats[3].is_some());
    assert!(after.spectators.is_empty());
}

#[test]
fn seat_assignment_rejects_taken_and_invalid_positions() {
    let mut session = new_room(GameSettings::default());
    let players = join_n(&mut session, &["ada", "lin"]);
    let [a, b] = players[..] else { panic!() };

    // Both joiners were auto-seated at 0 and 1.
    let late = session.join(Nickname::new("mo")).unwrap();
    assert_eq!(session.seat_of(late), Some(2));

    let spectator = {
        // Fill the table, then one more join has nowhere to sit.
        let kit = session.join(Nickname::new("kit")).unwrap();
        assert_eq!(session.seat_of(kit), Some(3));
        session.join(Nickname::new("late")).unwrap()
    };
    assert_eq!(session.seat_of(spectator), None);
    assert_eq!(
        session.assign_seat(spectator, spectator, 0),
        Err(GameError::SeatOccupied)
    );
    assert_eq!(
        session.assign_seat(spectator, spectator, 4),
        Err(GameError::InvalidSeat)
    );
    // Seating someone else is the host's prerogative.
    assert_eq!(
        session.assign_seat(b, spectator, 0),
        Err(GameError::NotHost)
    );
    let _ = a;
}

#[test]
fn host_grace_expiry_elects_the_lowest_online_seat_once() {
    let mut session = new_room(GameSettings::default());
    let players = join_n(&mut session, &["ada", "lin", "mo"]);
    let [a, b, _c] = players[..] else { panic!() };
    session.start_game(a).unwrap();
    session.drain_events();

    session.mark_disconnected(a).unwrap();
    assert_eq!(session.connection_of(a), Some(ConnectionState::Grace));

    let outcome = session.grace_expired(a);
    assert_eq!(outcome, GraceOutcome::HostMigrated(b));
    assert_eq!(session.host(), Some(b));
    assert_eq!(session.connection_of(a), Some(ConnectionState::Offline));

    let events = session.drain_events();
    let migrations = events
        .iter()
        .filter(|event| matches!(event, SessionEvent::HostMigrated(_)))
        .count();
    assert_eq!(migrations, 1);

    // The abandoned seat is skipped in rotation but keeps its cards.
    assert_ne!(session.current_turn(), Some(a));
    assert_eq!(session.hand(a).unwrap().len(), 7);
}

#[test]
fn a_reconnect_beats_its_own_grace_expiry() {
    let mut session = new_room(GameSettings::default());
    let players = join_n(&mut session, &["ada", "lin"]);
    let [a, b] = players[..] else { panic!() };
    session.start_game(a).unwrap();

    session.mark_disconnected(b).unwrap();
    session.mark_reconnected(b).unwrap();
    assert_eq!(session.grace_expired(b), GraceOutcome::Stale);
    assert_eq!(session.connection_of(b), Some(ConnectionState::Online));
}

#[test]
fn a_finished_room_losing_its_host_asks_everyone_to_leave() {
    let settings = GameSettings {
        starting_hand_size: 1,
        ..GameSettings::default()
    };
    let mut session = new_room(settings);
    let players = join_n(&mut session, &["ada", "lin"]);
    let [a, b] = players[..] else { panic!() };

    let hands = vec![
        vec![number(CardColor::Red, 7)],
        vec![number(CardColor::Red, 9)],
    ];
    let deck = rigged_deck(&hands, number(CardColor::Red, 5));
    session.start_game_with_deck(a, deck).unwrap();
    session.play_card(a, 0).unwrap();
    assert_eq!(session.status(), RoomStatus::Finished);

    session.mark_disconnected(a).unwrap();
    assert_eq!(session.grace_expired(a), GraceOutcome::CloseRoom);
    let _ = b;
}

#[test]
fn leaving_returns_the_hand_to_the_deck() {
    let mut session = new_room(GameSettings::default());
    let players = join_n(&mut session, &["ada", "lin", "mo"]);
    let [a, b, _c] = players[..] else { panic!() };
    session.start_game(a).unwrap();

    let outcome = session.leave(b).unwrap();
    assert!(!outcome.room_empty);
    assert!(!session.contains_player(b));
    assert_eq!(session.total_cards(), DECK_SIZE);
    assert_eq!(session.status(), RoomStatus::Playing);

    let snapshot: RoomSnapshot = session.snapshot_for(None);
    assert!(snapshot.seats[1].is_none());
}

#[test]
fn kicks_are_host_only_and_pauses_gate_play() {
    let mut session = new_room(GameSettings::default());
    let players = join_n(&mut session, &["ada", "lin", "mo"]);
    let [a, b, c] = players[..] else { panic!() };
    session.start_game(a).unwrap();

    assert_eq!(session.kick(b, c), Err(GameError::NotHost));
    assert_eq!(session.pause(b), Err(GameError::NotHost));

    session.pause(a).unwrap();
    assert_eq!(session.status(), RoomStatus::Paused);
    let turn_holder = session.snapshot_for(None).turn_seat.unwrap();
    let holder_id = [a, b, c][turn_holder];
    assert_eq!(session.play_card(holder_id, 0), Err(GameError::GamePaused));

    session.resume(a).unwrap();
    assert_eq!(session.status(), RoomStatus::Playing);

    session.kick(a, c).unwrap();
    assert!(!session.contains_player(c));
    assert_eq!(session.total_cards(), DECK_SIZE);
}

#[test]
fn only_the_card_game_is_hosted_here() {
    let result = GameSession::new(
        "TTT001".to_string(),
        GameKind::TicTacToe,
        GameSettings::default(),
    );
    assert!(matches!(result, Err(GameError::UnsupportedGame)));
}
