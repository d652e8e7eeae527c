//! The fixed table of four seats.

use super::constants::SEAT_COUNT;
use super::entities::{PlayerId, SeatIndex};
use super::errors::GameError;

/// Maps the four fixed table positions to player identities.
#[derive(Clone, Debug, Default)]
pub struct SeatAssignment {
    seats: [Option<PlayerId>; SEAT_COUNT],
}

impl SeatAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seat `player` at `position`.
    pub fn assign(&mut self, player: PlayerId, position: SeatIndex) -> Result<(), GameError> {
        if position >= SEAT_COUNT {
            return Err(GameError::InvalidSeat);
        }
        if self.seats[position].is_some() {
            return Err(GameError::SeatOccupied);
        }
        self.seats[position] = Some(player);
        Ok(())
    }

    /// Seat `player` at the lowest-numbered vacant position.
    pub fn auto_assign(&mut self, player: PlayerId) -> Result<SeatIndex, GameError> {
        let position = self
            .seats
            .iter()
            .position(Option::is_none)
            .ok_or(GameError::RoomFull)?;
        self.seats[position] = Some(player);
        Ok(position)
    }

    pub fn vacate(&mut self, position: SeatIndex) -> Option<PlayerId> {
        self.seats.get_mut(position).and_then(Option::take)
    }

    pub fn occupant(&self, position: SeatIndex) -> Option<PlayerId> {
        self.seats.get(position).copied().flatten()
    }

    pub fn seat_of(&self, player: PlayerId) -> Option<SeatIndex> {
        self.seats.iter().position(|s| *s == Some(player))
    }

    pub fn occupied(&self) -> impl Iterator<Item = (SeatIndex, PlayerId)> + '_ {
        self.seats
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|p| (i, p)))
    }

    pub fn occupied_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    pub fn has_vacancy(&self) -> bool {
        self.seats.iter().any(Option::is_none)
    }
}
