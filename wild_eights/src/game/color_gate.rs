//! The suspended-turn state that follows a wild play.

use std::collections::HashMap;

use super::entities::{Card, CardColor, PlayerId};

/// Gate between accepting a wild play and advancing the turn.
///
/// While open, every play/draw command from any player is rejected; only
/// the player who laid the wild may supply a color. The gate carries the
/// draw penalty of the wild so it is applied after the choice, not
/// before.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ColorChoiceGate {
    #[default]
    Idle,
    Awaiting {
        player: PlayerId,
        draw_penalty: u8,
    },
}

impl ColorChoiceGate {
    pub fn open(&mut self, player: PlayerId, draw_penalty: u8) {
        *self = Self::Awaiting {
            player,
            draw_penalty,
        };
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Awaiting { .. })
    }

    pub fn awaiting_player(&self) -> Option<PlayerId> {
        match self {
            Self::Awaiting { player, .. } => Some(*player),
            Self::Idle => None,
        }
    }

    /// Close the gate, handing back the acting player and the penalty the
    /// wild carried. Closing an idle gate yields nothing, which is what
    /// makes a second `chooseColor` a rejection instead of a re-apply.
    pub fn close(&mut self) -> Option<(PlayerId, u8)> {
        match std::mem::take(self) {
            Self::Awaiting {
                player,
                draw_penalty,
            } => Some((player, draw_penalty)),
            Self::Idle => None,
        }
    }
}

/// Fallback color when the acting player never answers: the most frequent
/// color left in their hand, ties broken in fixed color order, red for an
/// empty hand.
pub fn fallback_color(hand: &[Card]) -> CardColor {
    let mut counts: HashMap<CardColor, usize> = HashMap::new();
    for card in hand {
        if let Some(color) = card.color() {
            *counts.entry(color).or_default() += 1;
        }
    }
    // max_by_key keeps the last maximum, so walk the order backwards to
    // let the earliest color win ties.
    CardColor::ALL
        .into_iter()
        .rev()
        .max_by_key(|color| counts.get(color).copied().unwrap_or(0))
        .unwrap_or(CardColor::Red)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn close_is_single_shot() {
        let mut gate = ColorChoiceGate::default();
        let player = Uuid::new_v4();

        gate.open(player, 4);
        assert_eq!(gate.awaiting_player(), Some(player));
        assert_eq!(gate.close(), Some((player, 4)));
        assert_eq!(gate.close(), None);
        assert!(!gate.is_open());
    }

    #[test]
    fn fallback_picks_dominant_color() {
        let hand = vec![
            Card::Number {
                color: CardColor::Green,
                rank: 3,
            },
            Card::Skip {
                color: CardColor::Green,
            },
            Card::Number {
                color: CardColor::Blue,
                rank: 7,
            },
            Card::Wild,
        ];
        assert_eq!(fallback_color(&hand), CardColor::Green);
    }

    #[test]
    fn fallback_breaks_ties_in_color_order_and_defaults_red() {
        let hand = vec![
            Card::Number {
                color: CardColor::Yellow,
                rank: 1,
            },
            Card::Number {
                color: CardColor::Blue,
                rank: 2,
            },
        ];
        // Blue comes before yellow in the fixed order.
        assert_eq!(fallback_color(&hand), CardColor::Blue);
        assert_eq!(fallback_color(&[]), CardColor::Red);
        assert_eq!(fallback_color(&[Card::Wild]), CardColor::Red);
    }
}
