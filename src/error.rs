//! Error types for the rules engine, the search and the agents

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("no sub-board selected: choose where to play before placing a mark")]
    NoSubBoardSelected,

    #[error("sub-board {forced} is already forced, cannot choose sub-board {requested}")]
    SubBoardAlreadyForced { forced: usize, requested: usize },

    #[error("sub-board {board} is already finished")]
    SubBoardFinished { board: usize },

    #[error("cell row={row} col={col} of sub-board {board} is already occupied")]
    CellOccupied { board: usize, row: usize, col: usize },

    #[error("{what} {value} is out of bounds (must be 0-{max})")]
    OutOfBounds { what: &'static str, value: usize, max: usize },

    #[error("game already over")]
    GameOver,

    #[error("no simulations have been run from this position")]
    NoSimulations,

    #[error("search tree does not match the position: {0}")]
    TreeMismatch(String),

    #[error("illegal action for this position: {0}")]
    IllegalAction(String),

    #[error("corrupt board state: {0}")]
    CorruptState(String),

    #[error("input closed before a move was entered")]
    InputClosed,

    #[error("agent for {0} returned without making a move")]
    NoMoveMade(char),

    #[error("worker thread {0} panicked")]
    WorkerPanicked(usize),

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "read or write the terminal".to_string(),
            source,
        }
    }
}
