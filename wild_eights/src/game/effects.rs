//! Card legality and effect resolution.

use super::constants::{DRAW_TWO_PENALTY, WILD_FOUR_PENALTY};
use super::entities::{Card, CardColor};

/// What a played card does to pending turn state.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PlayEffect {
    /// Rotation direction flips before the next advance.
    pub reversed: bool,
    /// The next contending player loses their turn outright.
    pub skip_next: bool,
    /// Cards added to the forced-draw stack owed by the next player.
    pub draw_penalty: u8,
    /// The turn cannot advance until the player supplies a color.
    pub needs_color: bool,
}

/// Resolve a card's rule effect.
///
/// `contender_count` matters only for reverses: with two contenders a
/// reverse hands the turn straight back, which is the same thing as a
/// skip.
pub fn resolve(card: &Card, contender_count: usize) -> PlayEffect {
    match card {
        Card::Number { .. } => PlayEffect::default(),
        Card::Skip { .. } => PlayEffect {
            skip_next: true,
            ..PlayEffect::default()
        },
        Card::Reverse { .. } => PlayEffect {
            reversed: true,
            skip_next: contender_count == 2,
            ..PlayEffect::default()
        },
        Card::DrawTwo { .. } => PlayEffect {
            draw_penalty: DRAW_TWO_PENALTY,
            ..PlayEffect::default()
        },
        Card::Wild => PlayEffect {
            needs_color: true,
            ..PlayEffect::default()
        },
        Card::WildFour => PlayEffect {
            needs_color: true,
            draw_penalty: WILD_FOUR_PENALTY,
            ..PlayEffect::default()
        },
    }
}

/// The legal-play predicate.
///
/// A card may be played when it matches the current color, matches the
/// top card's rank (numbers) or kind (actions), or is itself wild. The
/// current color already reflects a wild top card's chosen color. While a
/// draw stack is pending and stacking is enabled, only another penalty
/// card keeps the chain alive.
pub fn is_legal_play(
    card: &Card,
    top: &Card,
    current_color: CardColor,
    pending_draw: u8,
    stacking: bool,
) -> bool {
    if pending_draw > 0 && stacking {
        return matches!(card, Card::DrawTwo { .. } | Card::WildFour);
    }
    match card {
        Card::Wild | Card::WildFour => true,
        Card::Number { color, rank } => {
            *color == current_color
                || matches!(top, Card::Number { rank: top_rank, .. } if top_rank == rank)
        }
        Card::Skip { color } | Card::Reverse { color } | Card::DrawTwo { color } => {
            *color == current_color || card.same_kind(top)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOP: Card = Card::Number {
        color: CardColor::Red,
        rank: 5,
    };

    #[test]
    fn color_rank_and_kind_matches_are_legal() {
        let same_color = Card::Skip {
            color: CardColor::Red,
        };
        let same_rank = Card::Number {
            color: CardColor::Blue,
            rank: 5,
        };
        let wrong = Card::Number {
            color: CardColor::Blue,
            rank: 9,
        };

        assert!(is_legal_play(&same_color, &TOP, CardColor::Red, 0, true));
        assert!(is_legal_play(&same_rank, &TOP, CardColor::Red, 0, true));
        assert!(!is_legal_play(&wrong, &TOP, CardColor::Red, 0, true));

        let top_skip = Card::Skip {
            color: CardColor::Green,
        };
        let other_skip = Card::Skip {
            color: CardColor::Yellow,
        };
        assert!(is_legal_play(&other_skip, &top_skip, CardColor::Green, 0, true));
    }

    #[test]
    fn wilds_are_always_legal_without_a_pending_stack() {
        assert!(is_legal_play(&Card::Wild, &TOP, CardColor::Red, 0, true));
        assert!(is_legal_play(&Card::WildFour, &TOP, CardColor::Red, 0, true));
    }

    #[test]
    fn a_pending_stack_only_accepts_penalty_cards() {
        let matching_number = Card::Number {
            color: CardColor::Red,
            rank: 2,
        };
        let draw_two = Card::DrawTwo {
            color: CardColor::Blue,
        };

        assert!(!is_legal_play(&matching_number, &TOP, CardColor::Red, 2, true));
        assert!(is_legal_play(&draw_two, &TOP, CardColor::Red, 2, true));
        assert!(is_legal_play(&Card::WildFour, &TOP, CardColor::Red, 2, true));
    }

    #[test]
    fn reverse_acts_as_skip_for_two_contenders() {
        let reverse = Card::Reverse {
            color: CardColor::Red,
        };
        assert!(resolve(&reverse, 2).skip_next);
        assert!(!resolve(&reverse, 3).skip_next);
        assert!(resolve(&reverse, 3).reversed);
    }

    #[test]
    fn penalties_carry_their_card_amounts() {
        let draw_two = Card::DrawTwo {
            color: CardColor::Red,
        };
        assert_eq!(resolve(&draw_two, 4).draw_penalty, 2);
        assert_eq!(resolve(&Card::WildFour, 4).draw_penalty, 4);
        assert!(resolve(&Card::WildFour, 4).needs_color);
        assert!(resolve(&Card::Wild, 4).needs_color);
        assert_eq!(resolve(&Card::Wild, 4).draw_penalty, 0);
    }
}
