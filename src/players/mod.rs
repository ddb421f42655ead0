//! Things that can take a turn: the search-driven bot and a person at a terminal

pub mod ai;
pub mod human;

use crate::error::Result;
use crate::utils::Game;
pub use ai::MctsPlayer;
pub use human::HumanPlayer;

pub trait Agent<G: Game> {
    /// Make exactly one full ply for the active player
    fn play_turn(&mut self, game: &mut G) -> Result<()>;
}
