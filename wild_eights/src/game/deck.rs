//! Draw pile and discard pile management.

use rand::Rng;
use rand::seq::SliceRandom;

use super::constants::MAX_RANK;
use super::entities::{Card, CardColor};
use super::errors::GameError;

/// The room's deck: a draw pile and a discard pile.
///
/// The deck is owned exclusively by the session; every card not in a hand
/// is in exactly one of the two piles, so the full card set is conserved
/// at every quiescent point.
#[derive(Clone, Debug)]
pub struct Deck {
    /// Draw stack. Cards are popped from the end.
    draw_pile: Vec<Card>,
    /// Discard stack. The last element is the visible top card.
    discard_pile: Vec<Card>,
}

impl Deck {
    /// Build the full card set and shuffle it into the draw pile.
    ///
    /// Per color: one 0, two of each 1-9, two skips, two reverses, two
    /// draw-twos; plus four wilds and four wild draw-fours. 108 cards.
    pub fn shuffled(rng: &mut impl Rng) -> Self {
        let mut draw_pile = Self::full_set();
        draw_pile.shuffle(rng);
        Self {
            draw_pile,
            discard_pile: Vec::new(),
        }
    }

    /// Assemble a deck from explicit piles.
    ///
    /// The draw pile is popped from the end, the last discard element is
    /// the top. Used for scripted games and for restoring persisted
    /// state; card-set conservation is only as good as the piles given.
    pub fn from_parts(draw_pile: Vec<Card>, discard_pile: Vec<Card>) -> Self {
        Self {
            draw_pile,
            discard_pile,
        }
    }

    fn full_set() -> Vec<Card> {
        let mut cards = Vec::with_capacity(super::constants::DECK_SIZE);
        for color in CardColor::ALL {
            cards.push(Card::Number { color, rank: 0 });
            for rank in 1..=MAX_RANK {
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

    /// Draw up to `n` cards, recycling the discard pile (minus its top
    /// card) mid-draw if the draw pile runs dry.
    ///
    /// Fails with `DeckExhausted` only when the combined remaining cards
    /// cannot satisfy the request, in which case nothing is drawn.
    pub fn draw(&mut self, n: usize, rng: &mut impl Rng) -> Result<Vec<Card>, GameError> {
        if self.remaining() < n {
            return Err(GameError::DeckExhausted);
        }
        let mut drawn = Vec::with_capacity(n);
        for _ in 0..n {
            if self.draw_pile.is_empty() {
                self.recycle(rng);
            }
            let Some(card) = self.draw_pile.pop() else {
                return Err(GameError::DeckExhausted);
            };
            drawn.push(card);
        }
        Ok(drawn)
    }

    /// Push a played card onto the discard pile as the new top.
    pub fn play(&mut self, card: Card) {
        self.discard_pile.push(card);
    }

    /// The visible top of the discard pile.
    pub fn top(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    /// Move everything but the discard top back into the draw pile and
    /// re-randomize. Order is never preserved across a recycle.
    fn recycle(&mut self, rng: &mut impl Rng) {
        let top = self.discard_pile.pop();
        self.draw_pile.append(&mut self.discard_pile);
        self.draw_pile.shuffle(rng);
        if let Some(top) = top {
            self.discard_pile.push(top);
        }
    }

    /// Return loose cards (an abandoned hand, set-aside deal cards) to
    /// the draw pile and re-randomize it.
    pub fn return_to_draw(&mut self, cards: Vec<Card>, rng: &mut impl Rng) {
        self.draw_pile.extend(cards);
        self.draw_pile.shuffle(rng);
    }

    /// Cards still drawable: the draw pile plus the recyclable part of
    /// the discard pile.
    pub fn remaining(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len().saturating_sub(1)
    }

    pub fn draw_pile_size(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn discard_pile_size(&self) -> usize {
        self.discard_pile.len()
    }

    /// Total cards held by the deck (both piles).
    pub fn total(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::DECK_SIZE;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn full_set_is_108_cards() {
        let mut rng = StdRng::seed_from_u64(7);
        let deck = Deck::shuffled(&mut rng);
        assert_eq!(deck.total(), DECK_SIZE);
        assert_eq!(deck.draw_pile_size(), DECK_SIZE);
        assert_eq!(deck.discard_pile_size(), 0);
    }

    #[test]
    fn draw_recycles_discard_minus_top() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut deck = Deck::shuffled(&mut rng);

        // Move everything except two cards into the discard pile.
        let played = deck.draw(DECK_SIZE - 2, &mut rng).unwrap();
        for card in played {
            deck.play(card);
        }
        let top_before = *deck.top().unwrap();

        // Drawing more than the draw pile holds forces a recycle.
        let drawn = deck.draw(10, &mut rng).unwrap();
        assert_eq!(drawn.len(), 10);
        assert_eq!(deck.total() + 10, DECK_SIZE);
        assert_eq!(deck.top(), Some(&top_before));
    }

    #[test]
    fn draw_fails_only_when_combined_piles_cannot_cover() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut deck = Deck::shuffled(&mut rng);

        let all = deck.draw(DECK_SIZE, &mut rng).unwrap();
        assert_eq!(all.len(), DECK_SIZE);
        assert_eq!(deck.draw(1, &mut rng), Err(GameError::DeckExhausted));

        // A lone discard top is not recyclable.
        deck.play(all[0]);
        assert_eq!(deck.remaining(), 0);
        assert_eq!(deck.draw(1, &mut rng), Err(GameError::DeckExhausted));
    }
}
