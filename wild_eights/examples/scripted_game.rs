//! Play a scripted two-player game against the engine and print what
//! each side would see on the wire.
//!
//! ```sh
//! cargo run --example scripted_game
//! ```

use wild_eights::entities::{Card, CardColor, GameKind, Nickname, RoomStatus};
use wild_eights::game::deck::Deck;
use wild_eights::game::{GameSession, GameSettings};

fn main() {
    let settings = GameSettings {
        starting_hand_size: 3,
        ..GameSettings::default()
    };
    let mut room = GameSession::new("DEMO42".to_string(), GameKind::WildEights, settings)
        .expect("card game rooms are hosted here");

    let ada = room.join(Nickname::new("ada")).unwrap();
    let lin = room.join(Nickname::new("lin")).unwrap();

    // A deck stacked so the demo is short: the draw pile is popped from
    // the end, so ada's hand sits on top, then lin's, then the flip.
    let ada_hand = [
        Card::Number {
            color: CardColor::Red,
            rank: 7,
        },
        Card::DrawTwo {
            color: CardColor::Red,
        },
        Card::Wild,
    ];
    let lin_hand = [
        Card::Number {
            color: CardColor::Blue,
            rank: 4,
        },
        Card::Number {
            color: CardColor::Green,
            rank: 4,
        },
        Card::Skip {
            color: CardColor::Yellow,
        },
    ];
    let mut draw_pile = vec![
        Card::Number {
            color: CardColor::Green,
            rank: 9,
        },
        Card::Number {
            color: CardColor::Blue,
            rank: 9,
        },
        Card::Number {
            color: CardColor::Yellow,
            rank: 9,
        },
        Card::Number {
            color: CardColor::Red,
            rank: 5,
        },
    ];
    draw_pile.extend(lin_hand.iter().rev());
    draw_pile.extend(ada_hand.iter().rev());
    room.start_game_with_deck(ada, Deck::from_parts(draw_pile, Vec::new()))
        .unwrap();

    println!("== deal ==");
    println!("ada holds: {}", format_hand(room.hand(ada).unwrap()));
    println!("lin holds: {}", format_hand(room.hand(lin).unwrap()));
    println!(
        "discard opens on {}",
        room.snapshot_for(None).discard_top.unwrap()
    );

    // ada: red seven on the red five.
    play_by_name(&mut room, ada, "red 7");
    // lin answers with nothing red; they draw instead.
    room.draw_card(lin).unwrap();
    println!("lin draws; hand is now {} cards", room.hand(lin).unwrap().len());

    // ada: announce the one-card hand first, then the draw-two. lin eats
    // the stack.
    room.call_uno(ada).unwrap();
    println!("ada calls uno");
    play_by_name(&mut room, ada, "red draw-two");
    room.draw_card(lin).unwrap();
    println!(
        "lin draws the penalty stack; hand is now {} cards",
        room.hand(lin).unwrap().len()
    );

    // ada: the wild goes out last and the color choice ends the game.
    play_by_name(&mut room, ada, "wild");
    room.choose_color(ada, CardColor::Green).unwrap();

    println!("== result ==");
    assert_eq!(room.status(), RoomStatus::Finished);
    for entry in room.rankings() {
        println!("  {}. {}", entry.rank, entry.nickname);
    }
    for event in room.drain_events() {
        println!("  event: {event}");
    }
}

fn play_by_name(room: &mut GameSession, player: wild_eights::PlayerId, name: &str) {
    let index = room
        .hand(player)
        .unwrap()
        .iter()
        .position(|card| card.to_string() == name)
        .expect("scripted card in hand");
    room.play_card(player, index).unwrap();
    println!("ada plays {name}");
}

fn format_hand(hand: &[Card]) -> String {
    hand.iter()
        .map(|card| card.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
