pub mod error;
pub mod utils;
pub mod games;
pub mod mcts;
pub mod players;
pub mod self_play;
pub mod tournament;
