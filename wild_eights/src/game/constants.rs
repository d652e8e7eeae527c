//! Fixed rule constants for the card game.

/// Total number of cards in a full deck.
pub const DECK_SIZE: usize = 108;

/// Number of table positions that participate in turn rotation.
pub const SEAT_COUNT: usize = 4;

/// Cards dealt to each player at game start (and to a player seated
/// mid-game).
pub const STARTING_HAND_SIZE: usize = 7;

/// Minimum number of seated players required to start a game.
pub const MIN_PLAYERS_TO_START: usize = 2;

/// Cards drawn as a penalty for failing to announce a one-card hand.
///
/// The exact amount is a house-rule knob; keep it a single constant so it
/// is trivially correctable.
pub const UNO_PENALTY_CARDS: u8 = 2;

/// Cards owed per draw-two card.
pub const DRAW_TWO_PENALTY: u8 = 2;

/// Cards owed per wild-draw-four card.
pub const WILD_FOUR_PENALTY: u8 = 4;

/// Highest rank printed on a number card.
pub const MAX_RANK: u8 = 9;

/// Maximum accepted length of raw user input strings.
pub const MAX_USER_INPUT_LENGTH: usize = 64;

/// Default seconds a disconnected player's seat is held before the grace
/// period expires.
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 30;

/// Default seconds a wild player has to pick a color before the engine
/// picks one for them.
pub const DEFAULT_COLOR_CHOICE_TIMEOUT_SECS: u64 = 15;

/// Default seconds a finished (or emptied) room lingers before eviction.
pub const DEFAULT_FINISHED_ROOM_TTL_SECS: u64 = 120;
