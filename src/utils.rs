use std::fmt::Debug;
use std::hash::Hash;
use crate::error::Result;

// ---------- Tune-ables ---------- //
pub const EXPLORATION: f64 = 1.4;  // UCB1 exploration constant
pub const TIE_JITTER: f64 = 0.000001;  // Random nudge added to UCB1 so exact ties break uniformly
pub const DEFAULT_DIFFICULTY: usize = 5_000;  // Simulations per move for the first bot
pub const HARD_DIFFICULTY: usize = 50_000;  // Simulations per move for the second bot

// ---------- Basic types (renamed for pretty) ---------- //
pub type Reward = f64;

pub const WIN: Reward = 1.0;
pub const TIE: Reward = 0.5;
pub const LOSS: Reward = 0.0;

/// Two player game, P1 marks with X and always moves first
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Player { P1, P2 }

impl Player {
    #[inline] pub fn other(self) -> Player {
        match self { Player::P1 => Player::P2, Player::P2 => Player::P1 }
    }
    pub fn mark(self) -> char {
        match self { Player::P1 => 'X', Player::P2 => 'O' }
    }
    /// Where this player's bits start inside a packed (two 9-bit halves) word
    #[inline] pub fn offset(self) -> u32 {
        match self { Player::P1 => 0, Player::P2 => 9 }
    }
}

/// How a finished game ended
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Outcome { Won(Player), Tied }

impl Outcome {
    /// Result in [0, 1] from the point of view of `player`
    pub fn reward(self, player: Player) -> Reward {
        match self {
            Outcome::Won(p) if p == player => WIN,
            Outcome::Won(_) => LOSS,
            Outcome::Tied => TIE,
        }
    }
}

// ---------- Traits the game must provide ----------
/// Properties we want all game actions to have
pub trait ActionI: Clone + Eq + Hash + Debug {}
impl<T: Clone + Eq + Hash + Debug> ActionI for T {}

pub trait Game: Sized + Clone + Debug + PartialEq {
    /// One full ply, as the mover specified it (also the search-tree identity of a move)
    type Action: ActionI;

    /// Requires a constructor for the starting position
    fn new() -> Self;

    /// The player whose turn it is
    fn active_player(&self) -> Player;
    /// What actions the active_player can take
    fn available_actions(&self) -> Vec<Self::Action>;
    /// Apply one full ply in place. Nothing changes if this returns an error
    fn play(&mut self, action: &Self::Action) -> Result<()>;
    /// Who completed a winning line, if anyone
    fn winner(&self) -> Option<Player>;
    /// Check if the game is over
    fn is_over(&self) -> bool;
    /// The most recent ply, so a search tree can follow moves it did not choose
    fn last_action(&self) -> Option<Self::Action>;

    fn outcome(&self) -> Option<Outcome> {
        match self.winner() {
            Some(p) => Some(Outcome::Won(p)),
            None if self.is_over() => Some(Outcome::Tied),
            None => None,
        }
    }
}
