//! The per-room aggregate owning all mutable game state.
//!
//! A `GameSession` is only ever driven by a single writer (the room
//! actor), so every command here runs as one logical transaction: either
//! it fails with a [`GameError`] and leaves the session untouched, or it
//! commits and queues the notifications the actor broadcasts afterwards.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use log::{debug, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::color_gate::{ColorChoiceGate, fallback_color};
use super::constants::{MIN_PLAYERS_TO_START, SEAT_COUNT, STARTING_HAND_SIZE, UNO_PENALTY_CARDS};
use super::deck::Deck;
use super::effects::{self, PlayEffect};
use super::entities::{
    Card, CardColor, ConnectionState, GameKind, Nickname, Player, PlayerId, RoomStatus, SeatIndex,
};
use super::errors::GameError;
use super::ranking::RankingTracker;
use super::seats::SeatAssignment;
use super::turn::TurnCursor;
use super::uno::UnoCallLedger;
use crate::net::events::{HandView, RankEntry, RoomSnapshot, SeatView, SpectatorView};

/// Rule knobs for a session.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    /// Whether consecutive penalty cards accumulate into one forced draw.
    /// Off means the owed cards are drawn the moment the turn reaches the
    /// penalized player, so chains never form.
    pub stack_draw_penalties: bool,
    /// Cards dealt per player at start and on mid-game seating.
    pub starting_hand_size: usize,
    /// Cards drawn for a missed one-card announcement.
    pub uno_penalty: u8,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            stack_draw_penalties: true,
            starting_hand_size: STARTING_HAND_SIZE,
            uno_penalty: UNO_PENALTY_CARDS,
        }
    }
}

/// Notifications produced by committed mutations, drained by the actor
/// and fanned out to the room's connections.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    GameStarted,
    ColorChoiceRequested(PlayerId),
    UnoCalled(PlayerId),
    PenaltyApplied { player: PlayerId, amount: u8 },
    PlayerFinished { player: PlayerId, rank: u8 },
    GameEnded {
        winner: Nickname,
        rankings: Vec<RankEntry>,
    },
    HostMigrated(PlayerId),
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameStarted => write!(f, "game started"),
            Self::ColorChoiceRequested(player) => {
                write!(f, "waiting on {player} to pick a color")
            }
            Self::UnoCalled(player) => write!(f, "{player} called uno"),
            Self::PenaltyApplied { player, amount } => {
                write!(f, "{player} draws {amount} as a penalty")
            }
            Self::PlayerFinished { player, rank } => {
                write!(f, "{player} finished at rank {rank}")
            }
            Self::GameEnded { winner, .. } => write!(f, "game over, {winner} wins"),
            Self::HostMigrated(player) => write!(f, "{player} is the new host"),
        }
    }
}

/// What a leave/kick left behind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LeaveOutcome {
    pub room_empty: bool,
}

/// Result of a grace-period expiry, telling the actor which follow-up it
/// owes (if any).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GraceOutcome {
    /// Nothing beyond the state change; broadcast and move on.
    SeatHeldOffline,
    /// The player held no seat and is simply gone.
    SpectatorDropped,
    /// A replacement host was elected.
    HostMigrated(PlayerId),
    /// The host went away with nobody online to take over.
    AutoPaused,
    /// The room is finished and its host is gone; tell everyone to leave.
    CloseRoom,
    /// Stale expiry: the player reconnected or already left.
    Stale,
}

/// The aggregate room object: deck, seats, turn order, pending effects,
/// connectivity, and rankings behind one command surface.
#[derive(Debug)]
pub struct GameSession {
    code: String,
    kind: GameKind,
    status: RoomStatus,
    settings: GameSettings,
    players: HashMap<PlayerId, Player>,
    /// Nicknames survive here after a player leaves so standings stay
    /// printable.
    name_ledger: HashMap<PlayerId, Nickname>,
    seats: SeatAssignment,
    deck: Deck,
    cursor: TurnCursor,
    pending_draw: u8,
    current_color: Option<CardColor>,
    gate: ColorChoiceGate,
    uno: UnoCallLedger,
    ranking: RankingTracker,
    host: Option<PlayerId>,
    /// Set when the engine paused the game itself (host lost with nobody
    /// online); cleared by the first reconnect.
    auto_paused: bool,
    events: VecDeque<SessionEvent>,
    rng: StdRng,
}

impl GameSession {
    /// Create an empty room. Only the card game is hosted here; other
    /// kinds belong to sibling engines.
    pub fn new(code: String, kind: GameKind, settings: GameSettings) -> Result<Self, GameError> {
        Self::with_rng(code, kind, settings, StdRng::from_os_rng())
    }

    /// Like [`GameSession::new`] with a caller-seeded RNG, which makes
    /// shuffles reproducible.
    pub fn with_rng(
        code: String,
        kind: GameKind,
        settings: GameSettings,
        mut rng: StdRng,
    ) -> Result<Self, GameError> {
        if kind != GameKind::WildEights {
            return Err(GameError::UnsupportedGame);
        }
        let deck = Deck::shuffled(&mut rng);
        Ok(Self {
            code,
            kind,
            status: RoomStatus::Waiting,
            settings,
            players: HashMap::new(),
            name_ledger: HashMap::new(),
            seats: SeatAssignment::new(),
            deck,
            cursor: TurnCursor::starting_at(0),
            pending_draw: 0,
            current_color: None,
            gate: ColorChoiceGate::default(),
            uno: UnoCallLedger::new(),
            ranking: RankingTracker::new(),
            host: None,
            auto_paused: false,
            events: VecDeque::new(),
            rng,
        })
    }

    // ------------------------------------------------------------------
    // Command surface
    // ------------------------------------------------------------------

    /// Admit a player. The first joiner becomes host. While the room is
    /// waiting, joiners take the lowest vacant seat; once play has begun
    /// they enter as spectators and can be seated explicitly.
    pub fn join(&mut self, nickname: Nickname) -> Result<PlayerId, GameError> {
        if self.status == RoomStatus::Finished {
            return Err(GameError::RoomNotJoinable);
        }
        if nickname.is_empty() {
            return Err(GameError::validation("nickname must not be empty"));
        }

        let mut player = Player::new(nickname);
        let id = player.id;
        if self.status == RoomStatus::Waiting && self.seats.has_vacancy() {
            let position = self.seats.auto_assign(id)?;
            player.seat = Some(position);
        }
        self.name_ledger.insert(id, player.nickname.clone());
        self.players.insert(id, player);
        if self.host.is_none() {
            self.host = Some(id);
        }
        debug!("room {}: player {} joined", self.code, id);
        Ok(id)
    }

    /// Seat a player (self-service, or the host seating anyone). Seating
    /// during an active game deals a fresh hand from the live deck.
    pub fn assign_seat(
        &mut self,
        actor: PlayerId,
        target: PlayerId,
        position: SeatIndex,
    ) -> Result<(), GameError> {
        if actor != target && self.host != Some(actor) {
            return Err(GameError::NotHost);
        }
        match self.status {
            RoomStatus::Waiting | RoomStatus::Playing => {}
            RoomStatus::Paused => return Err(GameError::GamePaused),
            RoomStatus::Finished => return Err(GameError::RoomNotJoinable),
        }
        if !self.players.contains_key(&actor) || !self.players.contains_key(&target) {
            return Err(GameError::UnknownPlayer);
        }
        if position >= SEAT_COUNT {
            return Err(GameError::InvalidSeat);
        }
        if self.seats.occupant(position).is_some() {
            return Err(GameError::SeatOccupied);
        }
        if self
            .players
            .get(&target)
            .is_some_and(|p| p.seat.is_some())
        {
            return Err(GameError::validation("player is already seated"));
        }

        // Deal before touching the seat table so a short deck rejects the
        // whole command.
        let hand = if self.status == RoomStatus::Playing {
            self.deck.draw(self.settings.starting_hand_size, &mut self.rng)?
        } else {
            Vec::new()
        };

        self.seats.assign(target, position)?;
        let hand_size = hand.len();
        if let Some(player) = self.players.get_mut(&target) {
            player.seat = Some(position);
            player.hand = hand;
        }
        if hand_size > 0 {
            self.uno.note_hand_size(target, hand_size);
        }
        debug!(
            "room {}: player {} seated at {} ({} cards dealt)",
            self.code, target, position, hand_size
        );
        Ok(())
    }

    /// Start the game: host-only, needs two seated players, deals
    /// everyone a hand and flips the first discard.
    pub fn start_game(&mut self, actor: PlayerId) -> Result<(), GameError> {
        let deck = Deck::shuffled(&mut self.rng);
        self.start_game_with_deck(actor, deck)
    }

    /// Start from a prepared deck (scripted demos, replays, tests). The
    /// draw pile is dealt from its end, lowest seat first, then cards are
    /// flipped until a number card opens the discard; set-aside flips are
    /// shuffled back into the draw pile.
    pub fn start_game_with_deck(&mut self, actor: PlayerId, deck: Deck) -> Result<(), GameError> {
        if self.host != Some(actor) {
            return Err(GameError::NotHost);
        }
        if self.status != RoomStatus::Waiting {
            return Err(GameError::RoomNotJoinable);
        }
        if self.seats.occupied_count() < MIN_PLAYERS_TO_START {
            return Err(GameError::NotEnoughPlayers);
        }

        self.deck = deck;
        let seated: Vec<(SeatIndex, PlayerId)> = self.seats.occupied().collect();
        for (_, player_id) in &seated {
            let hand = self
                .deck
                .draw(self.settings.starting_hand_size, &mut self.rng)?;
            if let Some(player) = self.players.get_mut(player_id) {
                player.hand = hand;
            }
        }

        // The discard opens on a number card so the first turn never
        // starts inside an effect.
        let mut set_aside = Vec::new();
        loop {
            let card = self.deck.draw(1, &mut self.rng)?.remove(0);
            match card {
                Card::Number { color, .. } => {
                    self.deck.play(card);
                    self.current_color = Some(color);
                    break;
                }
                other => set_aside.push(other),
            }
        }
        if !set_aside.is_empty() {
            self.deck.return_to_draw(set_aside, &mut self.rng);
        }

        let first_seat = seated.first().map(|(seat, _)| *seat).unwrap_or(0);
        self.cursor = TurnCursor::starting_at(first_seat);
        self.pending_draw = 0;
        self.status = RoomStatus::Playing;
        self.events.push_back(SessionEvent::GameStarted);
        debug!(
            "room {}: game started with {} players",
            self.code,
            seated.len()
        );
        Ok(())
    }

    /// Play the card at `index` in the acting player's hand.
    pub fn play_card(&mut self, actor: PlayerId, index: usize) -> Result<(), GameError> {
        self.require_playing()?;
        self.require_gate_closed()?;
        self.require_turn(actor)?;

        let player = self.players.get(&actor).ok_or(GameError::UnknownPlayer)?;
        let card = *player
            .hand
            .get(index)
            .ok_or_else(|| GameError::validation("no card at that position"))?;
        let Some(&top) = self.deck.top() else {
            return Err(GameError::GameNotStarted);
        };
        let current_color = self.current_color.ok_or(GameError::GameNotStarted)?;
        if !effects::is_legal_play(
            &card,
            &top,
            current_color,
            self.pending_draw,
            self.settings.stack_draw_penalties,
        ) {
            return Err(GameError::IllegalPlay);
        }

        // Commit.
        let hand_size = {
            let player = self
                .players
                .get_mut(&actor)
                .ok_or(GameError::UnknownPlayer)?;
            player.hand.remove(index);
            player.hand.len()
        };
        self.deck.play(card);
        self.uno.note_hand_size(actor, hand_size);
        debug!("room {}: {} plays {}", self.code, actor, card);
        if hand_size == 0 {
            self.finish_player(actor);
        }

        let effect = effects::resolve(&card, self.contender_count());
        if effect.needs_color {
            self.gate.open(actor, effect.draw_penalty);
            self.events
                .push_back(SessionEvent::ColorChoiceRequested(actor));
            return Ok(());
        }
        if let Some(color) = card.color() {
            self.current_color = Some(color);
        }
        self.apply_effect(effect);
        Ok(())
    }

    /// Draw instead of playing. With a pending stack this consumes the
    /// whole stack and the turn; otherwise it draws one card and ends the
    /// turn.
    pub fn draw_card(&mut self, actor: PlayerId) -> Result<(), GameError> {
        self.require_playing()?;
        self.require_gate_closed()?;
        self.require_turn(actor)?;

        if self.pending_draw > 0 {
            // Only reachable with stacking on; without it the stack was
            // already forced onto this player when their turn began.
            self.apply_forced_draw(actor);
        } else {
            let cards = self.deck.draw(1, &mut self.rng)?;
            let hand_size = {
                let player = self
                    .players
                    .get_mut(&actor)
                    .ok_or(GameError::UnknownPlayer)?;
                player.hand.extend(cards);
                player.hand.len()
            };
            self.uno.note_hand_size(actor, hand_size);
            debug!("room {}: {} draws a card", self.code, actor);
        }
        self.pass_turn();
        Ok(())
    }

    /// Resolve an open color-choice gate. Only the player who laid the
    /// wild may answer; everyone else (and a second answer) is rejected.
    pub fn choose_color(&mut self, actor: PlayerId, color: CardColor) -> Result<(), GameError> {
        self.require_playing()?;
        match self.gate.awaiting_player() {
            None => return Err(GameError::NoColorChoicePending),
            Some(player) if player != actor => return Err(GameError::AwaitingColorChoice),
            Some(_) => {}
        }
        let Some((_, draw_penalty)) = self.gate.close() else {
            return Err(GameError::NoColorChoicePending);
        };
        self.current_color = Some(color);
        debug!("room {}: {} chose {}", self.code, actor, color);
        self.apply_effect(PlayEffect {
            draw_penalty,
            ..PlayEffect::default()
        });
        Ok(())
    }

    /// Timer fallback for a stalled color choice. Returns the color the
    /// engine picked, or `None` when the gate already closed (stale
    /// timer).
    pub fn choose_color_timeout(&mut self) -> Option<CardColor> {
        let player = self.gate.awaiting_player()?;
        let color = self
            .players
            .get(&player)
            .map(|p| fallback_color(&p.hand))
            .unwrap_or(CardColor::Red);
        let (_, draw_penalty) = self.gate.close()?;
        self.current_color = Some(color);
        warn!(
            "room {}: color choice timed out, picking {} for {}",
            self.code, color, player
        );
        self.apply_effect(PlayEffect {
            draw_penalty,
            ..PlayEffect::default()
        });
        Some(color)
    }

    /// Record an announcement of a one-card hand. Always accepted while a
    /// game is underway, however many cards the caller holds.
    pub fn call_uno(&mut self, actor: PlayerId) -> Result<(), GameError> {
        match self.status {
            RoomStatus::Playing | RoomStatus::Paused => {}
            RoomStatus::Waiting => return Err(GameError::GameNotStarted),
            RoomStatus::Finished => return Err(GameError::RoomNotJoinable),
        }
        let player = self.players.get(&actor).ok_or(GameError::UnknownPlayer)?;
        if player.seat.is_none() {
            return Err(GameError::NotSeated);
        }
        self.uno.call(actor);
        self.events.push_back(SessionEvent::UnoCalled(actor));
        Ok(())
    }

    pub fn pause(&mut self, actor: PlayerId) -> Result<(), GameError> {
        if self.host != Some(actor) {
            return Err(GameError::NotHost);
        }
        match self.status {
            RoomStatus::Playing => {
                self.status = RoomStatus::Paused;
                Ok(())
            }
            RoomStatus::Waiting => Err(GameError::GameNotStarted),
            RoomStatus::Paused | RoomStatus::Finished => Err(GameError::RoomNotJoinable),
        }
    }

    pub fn resume(&mut self, actor: PlayerId) -> Result<(), GameError> {
        if self.host != Some(actor) {
            return Err(GameError::NotHost);
        }
        match self.status {
            RoomStatus::Paused => {
                self.status = RoomStatus::Playing;
                self.auto_paused = false;
                Ok(())
            }
            RoomStatus::Waiting => Err(GameError::GameNotStarted),
            RoomStatus::Playing | RoomStatus::Finished => Err(GameError::RoomNotJoinable),
        }
    }

    /// Confirmed departure. The seat empties, the abandoned hand returns
    /// to the draw pile, and the host role moves on if needed.
    pub fn leave(&mut self, actor: PlayerId) -> Result<LeaveOutcome, GameError> {
        if !self.players.contains_key(&actor) {
            return Err(GameError::UnknownPlayer);
        }
        self.remove_player(actor);
        Ok(LeaveOutcome {
            room_empty: self.players.is_empty(),
        })
    }

    /// Host-only removal of another player.
    pub fn kick(&mut self, actor: PlayerId, target: PlayerId) -> Result<LeaveOutcome, GameError> {
        if self.host != Some(actor) {
            return Err(GameError::NotHost);
        }
        if actor == target {
            return Err(GameError::validation("leave the room instead"));
        }
        if !self.players.contains_key(&target) {
            return Err(GameError::UnknownPlayer);
        }
        self.remove_player(target);
        Ok(LeaveOutcome {
            room_empty: self.players.is_empty(),
        })
    }

    // ------------------------------------------------------------------
    // Connectivity transitions (driven by the supervisor/actor)
    // ------------------------------------------------------------------

    /// A transport dropped; the player enters their grace window.
    pub fn mark_disconnected(&mut self, player: PlayerId) -> Result<(), GameError> {
        let player = self
            .players
            .get_mut(&player)
            .ok_or(GameError::UnknownPlayer)?;
        player.connection = ConnectionState::Grace;
        Ok(())
    }

    /// A transport (re)bound. Ties against a racing grace expiry favor
    /// the reconnect: the caller cancels the timer before this runs, and
    /// a stale expiry is ignored anyway.
    pub fn mark_reconnected(&mut self, player_id: PlayerId) -> Result<(), GameError> {
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(GameError::UnknownPlayer)?;
        player.connection = ConnectionState::Online;

        if self.auto_paused && self.status == RoomStatus::Paused {
            self.status = RoomStatus::Playing;
            self.auto_paused = false;
            let host_online = self
                .host
                .and_then(|h| self.players.get(&h))
                .is_some_and(|h| h.connection == ConnectionState::Online);
            if !host_online {
                self.host = Some(player_id);
                self.events.push_back(SessionEvent::HostMigrated(player_id));
            }
            // The cursor may still sit on the seat whose loss caused the
            // pause; move it to someone who can actually act.
            let stuck = !self.contending_mask()[self.cursor.current()];
            if stuck {
                self.pass_turn();
            }
        }
        Ok(())
    }

    /// The grace window elapsed without a reconnect.
    pub fn grace_expired(&mut self, player_id: PlayerId) -> GraceOutcome {
        let Some(player) = self.players.get_mut(&player_id) else {
            return GraceOutcome::Stale;
        };
        if player.connection != ConnectionState::Grace {
            return GraceOutcome::Stale;
        }
        player.connection = ConnectionState::Offline;
        let seat = player.seat;

        // Spectators hold no seat worth keeping warm.
        if seat.is_none() {
            self.remove_player(player_id);
            return GraceOutcome::SpectatorDropped;
        }

        if self.status == RoomStatus::Finished {
            return if self.host == Some(player_id) {
                GraceOutcome::CloseRoom
            } else {
                GraceOutcome::SeatHeldOffline
            };
        }

        // A wild left hanging by the departed player resolves itself.
        if self.gate.awaiting_player() == Some(player_id) {
            self.choose_color_timeout();
            if self.status == RoomStatus::Finished {
                // Resolving the wild ended the game.
                return if self.host == Some(player_id) {
                    GraceOutcome::CloseRoom
                } else {
                    GraceOutcome::SeatHeldOffline
                };
            }
        }

        let outcome = if self.host == Some(player_id) {
            match self.elect_host() {
                Some(new_host) => GraceOutcome::HostMigrated(new_host),
                None => {
                    if self.status == RoomStatus::Playing {
                        self.status = RoomStatus::Paused;
                        self.auto_paused = true;
                    }
                    GraceOutcome::AutoPaused
                }
            }
        } else {
            GraceOutcome::SeatHeldOffline
        };

        // The offline seat no longer contends for turns.
        if self.status == RoomStatus::Playing {
            if self.contender_count() < 2 {
                self.end_game();
            } else if seat == Some(self.cursor.current()) {
                self.pass_turn();
            }
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Build the room as seen by `viewer`. Only the viewer's own hand is
    /// dealt face up; every other hand is a card-back count. `None` gets
    /// the fully redacted view.
    pub fn snapshot_for(&self, viewer: Option<PlayerId>) -> RoomSnapshot {
        let seats = std::array::from_fn(|position| {
            self.seats.occupant(position).and_then(|id| {
                self.players.get(&id).map(|player| SeatView {
                    player: id,
                    nickname: player.nickname.clone(),
                    connection: player.connection,
                    finish_rank: player.finish_rank,
                    called_uno: self.uno.has_called(id),
                    hand: if viewer == Some(id) {
                        HandView::Cards {
                            cards: player.hand.clone(),
                        }
                    } else {
                        HandView::Hidden {
                            count: player.hand.len(),
                        }
                    },
                })
            })
        });
        let spectators = self
            .players
            .values()
            .filter(|p| p.seat.is_none())
            .map(|p| SpectatorView {
                player: p.id,
                nickname: p.nickname.clone(),
            })
            .collect();
        let turn_seat = matches!(self.status, RoomStatus::Playing | RoomStatus::Paused)
            .then(|| self.cursor.current());

        RoomSnapshot {
            code: self.code.clone(),
            status: self.status,
            seats,
            spectators,
            discard_top: self.deck.top().copied(),
            current_color: self.current_color,
            direction: self.cursor.direction(),
            turn_seat,
            pending_draw: self.pending_draw,
            awaiting_color_from: self.gate.awaiting_player(),
            host: self.host,
            draw_pile_size: self.deck.draw_pile_size(),
            discard_pile_size: self.deck.discard_pile_size(),
            rankings: self.rankings(),
        }
    }

    /// Standings so far, best rank first.
    pub fn rankings(&self) -> Vec<RankEntry> {
        self.ranking
            .standings()
            .map(|(player, rank)| RankEntry {
                player,
                nickname: self.nickname_of(player),
                rank,
            })
            .collect()
    }

    pub fn drain_events(&mut self) -> VecDeque<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.host
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains_player(&self, player: PlayerId) -> bool {
        self.players.contains_key(&player)
    }

    pub fn hand(&self, player: PlayerId) -> Option<&[Card]> {
        self.players.get(&player).map(|p| p.hand.as_slice())
    }

    pub fn seat_of(&self, player: PlayerId) -> Option<SeatIndex> {
        self.players.get(&player).and_then(|p| p.seat)
    }

    pub fn connection_of(&self, player: PlayerId) -> Option<ConnectionState> {
        self.players.get(&player).map(|p| p.connection)
    }

    pub fn finish_rank_of(&self, player: PlayerId) -> Option<u8> {
        self.ranking.rank_of(player)
    }

    pub fn current_turn(&self) -> Option<PlayerId> {
        (self.status == RoomStatus::Playing)
            .then(|| self.seats.occupant(self.cursor.current()))
            .flatten()
    }

    pub fn current_color(&self) -> Option<CardColor> {
        self.current_color
    }

    pub fn pending_draw(&self) -> u8 {
        self.pending_draw
    }

    pub fn awaiting_color_from(&self) -> Option<PlayerId> {
        self.gate.awaiting_player()
    }

    /// Cards across the deck and every hand; conserved at every quiescent
    /// point of a started game.
    pub fn total_cards(&self) -> usize {
        self.deck.total() + self.players.values().map(|p| p.hand.len()).sum::<usize>()
    }

    fn nickname_of(&self, player: PlayerId) -> Nickname {
        self.players
            .get(&player)
            .map(|p| p.nickname.clone())
            .or_else(|| self.name_ledger.get(&player).cloned())
            .unwrap_or_else(|| Nickname::new("unknown"))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_playing(&self) -> Result<(), GameError> {
        match self.status {
            RoomStatus::Playing => Ok(()),
            RoomStatus::Waiting => Err(GameError::GameNotStarted),
            RoomStatus::Paused => Err(GameError::GamePaused),
            RoomStatus::Finished => Err(GameError::RoomNotJoinable),
        }
    }

    fn require_gate_closed(&self) -> Result<(), GameError> {
        if self.gate.is_open() {
            return Err(GameError::AwaitingColorChoice);
        }
        Ok(())
    }

    fn require_turn(&self, player_id: PlayerId) -> Result<(), GameError> {
        let player = self
            .players
            .get(&player_id)
            .ok_or(GameError::UnknownPlayer)?;
        let seat = player.seat.ok_or(GameError::NotSeated)?;
        if seat != self.cursor.current() {
            return Err(GameError::NotYourTurn);
        }
        Ok(())
    }

    /// Seats still contending for turns: occupied, unfinished, and not
    /// abandoned.
    fn contending_mask(&self) -> [bool; SEAT_COUNT] {
        std::array::from_fn(|position| {
            self.seats
                .occupant(position)
                .and_then(|id| self.players.get(&id))
                .is_some_and(|p| {
                    p.finish_rank.is_none() && p.connection != ConnectionState::Offline
                })
        })
    }

    fn contender_count(&self) -> usize {
        self.contending_mask().iter().filter(|c| **c).count()
    }

    /// Apply a resolved play effect and hand the turn onwards.
    fn apply_effect(&mut self, effect: PlayEffect) {
        if effect.reversed {
            self.cursor.reverse();
        }
        self.pending_draw = self.pending_draw.saturating_add(effect.draw_penalty);

        if self.contender_count() < 2 {
            self.end_game();
            return;
        }
        self.cursor.advance(&self.contending_mask());
        if effect.skip_next {
            self.cursor.advance(&self.contending_mask());
        }
        self.on_turn_granted();
    }

    /// End-of-command turn handoff: advance once and run turn-start
    /// bookkeeping, or finish the game if nobody is left to fight.
    fn pass_turn(&mut self) {
        if self.contender_count() < 2 {
            self.end_game();
            return;
        }
        self.cursor.advance(&self.contending_mask());
        self.on_turn_granted();
    }

    /// Bookkeeping owed the moment a seat receives the turn: the missed-
    /// announcement check, then any forced draw owed under non-stacking
    /// rules (which also consumes the turn).
    fn on_turn_granted(&mut self) {
        let Some(player_id) = self.seats.occupant(self.cursor.current()) else {
            return;
        };
        if self.uno.is_vulnerable(player_id) {
            self.apply_uno_penalty(player_id);
        }
        if self.pending_draw > 0 && !self.settings.stack_draw_penalties {
            self.apply_forced_draw(player_id);
            self.pass_turn();
        }
    }

    /// Draw the whole pending stack into `player_id`'s hand.
    fn apply_forced_draw(&mut self, player_id: PlayerId) {
        let owed = self.pending_draw as usize;
        self.pending_draw = 0;
        let amount = owed.min(self.deck.remaining());
        if amount < owed {
            // Deck math makes this all but unreachable; shorting the draw
            // beats wedging the room.
            warn!(
                "room {}: deck can only cover {amount} of {owed} forced cards",
                self.code
            );
        }
        if amount == 0 {
            return;
        }
        match self.deck.draw(amount, &mut self.rng) {
            Ok(cards) => {
                let hand_size = match self.players.get_mut(&player_id) {
                    Some(player) => {
                        player.hand.extend(cards);
                        player.hand.len()
                    }
                    None => return,
                };
                self.uno.note_hand_size(player_id, hand_size);
                self.events.push_back(SessionEvent::PenaltyApplied {
                    player: player_id,
                    amount: amount as u8,
                });
            }
            Err(err) => warn!("room {}: forced draw failed: {err}", self.code),
        }
    }

    /// The automatic missed-announcement check.
    fn apply_uno_penalty(&mut self, player_id: PlayerId) {
        let amount = (self.settings.uno_penalty as usize).min(self.deck.remaining());
        if amount == 0 {
            return;
        }
        match self.deck.draw(amount, &mut self.rng) {
            Ok(cards) => {
                let hand_size = match self.players.get_mut(&player_id) {
                    Some(player) => {
                        player.hand.extend(cards);
                        player.hand.len()
                    }
                    None => return,
                };
                self.uno.note_hand_size(player_id, hand_size);
                self.events.push_back(SessionEvent::PenaltyApplied {
                    player: player_id,
                    amount: amount as u8,
                });
                debug!(
                    "room {}: {} missed the call, drew {}",
                    self.code, player_id, amount
                );
            }
            Err(err) => warn!("room {}: uno penalty draw failed: {err}", self.code),
        }
    }

    fn finish_player(&mut self, player_id: PlayerId) {
        let rank = self.ranking.record_finish(player_id);
        if let Some(player) = self.players.get_mut(&player_id) {
            player.finish_rank = Some(rank);
        }
        self.events.push_back(SessionEvent::PlayerFinished {
            player: player_id,
            rank,
        });
    }

    /// Close out the game: the last contender ranks next, abandoned
    /// offline seats rank after them, and the room flips to finished.
    fn end_game(&mut self) {
        let mask = self.contending_mask();
        for (position, player_id) in self.seats.occupied().collect::<Vec<_>>() {
            if mask[position] && !self.ranking.is_finished(player_id) {
                self.finish_player(player_id);
            }
        }
        for (_, player_id) in self.seats.occupied().collect::<Vec<_>>() {
            if !self.ranking.is_finished(player_id) {
                self.finish_player(player_id);
            }
        }
        self.gate.close();
        self.pending_draw = 0;
        self.status = RoomStatus::Finished;

        let rankings = self.rankings();
        let winner = rankings
            .first()
            .map(|entry| entry.nickname.clone())
            .unwrap_or_else(|| Nickname::new("nobody"));
        self.events
            .push_back(SessionEvent::GameEnded { winner, rankings });
        debug!("room {}: game over", self.code);
    }

    /// Deterministic host election: the lowest-numbered online seat.
    fn elect_host(&mut self) -> Option<PlayerId> {
        let new_host = self.seats.occupied().find_map(|(_, id)| {
            self.players
                .get(&id)
                .filter(|p| p.connection == ConnectionState::Online)
                .map(|p| p.id)
        })?;
        self.host = Some(new_host);
        self.events.push_back(SessionEvent::HostMigrated(new_host));
        Some(new_host)
    }

    /// Shared terminal-removal path behind `leave` and `kick`.
    fn remove_player(&mut self, player_id: PlayerId) {
        // A hanging wild resolves before its owner disappears.
        if self.gate.awaiting_player() == Some(player_id) {
            self.choose_color_timeout();
        }

        let Some(player) = self.players.remove(&player_id) else {
            return;
        };
        let seat = player.seat;
        let had_turn = self.status == RoomStatus::Playing && seat == Some(self.cursor.current());
        if let Some(position) = seat {
            self.seats.vacate(position);
        }
        if !player.hand.is_empty() {
            self.deck.return_to_draw(player.hand, &mut self.rng);
        }
        self.uno.forget(player_id);
        if player.finish_rank.is_none() {
            self.ranking.forget(player_id);
        }
        debug!("room {}: player {} removed", self.code, player_id);

        if self.host == Some(player_id) {
            self.host = None;
            if !self.players.is_empty() && self.elect_host().is_none() {
                // Nobody seated is online; fall back to any remaining
                // seat, then any spectator, so the role is never vacant
                // while the room lives.
                let fallback = self
                    .seats
                    .occupied()
                    .map(|(_, id)| id)
                    .next()
                    .or_else(|| {
                        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
                        ids.sort();
                        ids.first().copied()
                    });
                self.host = fallback;
                if let Some(fallback) = fallback {
                    self.events.push_back(SessionEvent::HostMigrated(fallback));
                }
            }
        }

        if self.status == RoomStatus::Playing && seat.is_some() {
            if self.contender_count() < 2 {
                self.end_game();
            } else if had_turn {
                self.pass_turn();
            }
        }
    }
}
