//! Turn pointer and rotation direction.

use super::constants::SEAT_COUNT;
use super::entities::{Direction, SeatIndex};

/// Tracks whose turn it is and which way play rotates.
///
/// The cursor walks seat positions directly; callers supply a mask of the
/// seats that still contend for turns (seated, unfinished, reachable), so
/// vacant and finished seats are stepped over transparently.
#[derive(Clone, Copy, Debug)]
pub struct TurnCursor {
    current: SeatIndex,
    direction: Direction,
}

impl TurnCursor {
    pub fn starting_at(seat: SeatIndex) -> Self {
        Self {
            current: seat,
            direction: Direction::Clockwise,
        }
    }

    pub fn current(&self) -> SeatIndex {
        self.current
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn reverse(&mut self) {
        self.direction = self.direction.flipped();
    }

    /// Step to the next contending seat.
    ///
    /// Returns the seat the cursor landed on, or `None` (leaving the
    /// cursor untouched) when fewer than two seats contend -- at that
    /// point turn advancement is meaningless and the game is over or
    /// stalled, which the caller decides.
    pub fn advance(&mut self, contending: &[bool; SEAT_COUNT]) -> Option<SeatIndex> {
        if contending.iter().filter(|c| **c).count() < 2 {
            return None;
        }
        let step = match self.direction {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => SEAT_COUNT - 1,
        };
        let mut seat = self.current;
        for _ in 0..SEAT_COUNT {
            seat = (seat + step) % SEAT_COUNT;
            if contending[seat] {
                self.current = seat;
                return Some(seat);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_skips_non_contending_seats() {
        let mut cursor = TurnCursor::starting_at(0);
        let contending = [true, false, true, false];

        assert_eq!(cursor.advance(&contending), Some(2));
        assert_eq!(cursor.advance(&contending), Some(0));
    }

    #[test]
    fn advance_walks_backwards_after_reverse() {
        let mut cursor = TurnCursor::starting_at(0);
        let contending = [true, true, true, true];

        cursor.reverse();
        assert_eq!(cursor.advance(&contending), Some(3));
        assert_eq!(cursor.advance(&contending), Some(2));
    }

    #[test]
    fn advance_is_a_noop_with_one_contender() {
        let mut cursor = TurnCursor::starting_at(1);
        let contending = [false, true, false, false];

        assert_eq!(cursor.advance(&contending), None);
        assert_eq!(cursor.current(), 1);
    }
}
