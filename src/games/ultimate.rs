//! # Ultimate Tic-Tac-Toe
//!
//! Nine 3x3 sub-boards laid out on a 3x3 meta-board. The cell a player marks
//! decides which sub-board the opponent must play in next, unless that
//! sub-board is already finished, in which case the opponent may pick any
//! unfinished one. Winning three sub-boards in a line wins the game.
//!
//! Every 3x3 grid (the nine sub-boards and the meta-board of won sub-boards)
//! is packed into one word: X marks in the low 9 bits, O marks in the next 9.
//! Win detection is a handful of mask tests against the lines through the
//! cell that was just played.

use std::fmt::{Display, Formatter};
use crate::error::{Error, Result};
use crate::utils::*;

/*
+-------------------+-------------------+
| O: bits 17 ... 9  | X: bits  8 ... 0  |
+-------------------+-------------------+
        cell bit = 3 * row + col

  0 | 1 | 2
  3 | 4 | 5      (sub-boards use the same numbering on the meta-board)
  6 | 7 | 8
*/

const FULL: u32 = 0o777;

const LINES: [u32; 8] = [
    0b000_000_111, 0b000_111_000, 0b111_000_000,  // rows
    0b001_001_001, 0b010_010_010, 0b100_100_100,  // columns
    0b100_010_001, 0b001_010_100,  // diagonals
];

#[inline]
fn half(word: u32, player: Player) -> u32 {
    (word >> player.offset()) & FULL
}

#[inline]
fn both(word: u32) -> u32 {
    half(word, Player::P1) | half(word, Player::P2)
}

/// Only the lines through (row, col) can have been completed by a mark there
fn completes_line(marks: u32, row: usize, col: usize) -> bool {
    let hit = |mask: u32| marks & mask == mask;
    hit(LINES[row])
        || hit(LINES[3 + col])
        || (row == col && hit(LINES[6]))
        || (row + col == 2 && hit(LINES[7]))
}

fn has_line(marks: u32) -> bool {
    LINES.iter().any(|&mask| marks & mask == mask)
}

fn check_coord(what: &'static str, value: usize, max: usize) -> Result<()> {
    if value > max {
        return Err(Error::OutOfBounds { what, value, max });
    }
    Ok(())
}

fn check_position(board: usize, row: usize, col: usize) -> Result<()> {
    check_coord("sub-board", board, 8)?;
    check_coord("row", row, 2)?;
    check_coord("col", col, 2)
}

// ---------- Move ----------
/// One ply. `board` is only given when the mover was free to choose the sub-board,
/// which makes this both the legal-move decoding and the search tree's node identity.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Move {
    pub row: usize,
    pub col: usize,
    pub board: Option<usize>,
}

impl Move {
    pub fn forced(row: usize, col: usize) -> Self {
        Move { row, col, board: None }
    }

    pub fn anywhere(board: usize, row: usize, col: usize) -> Self {
        Move { row, col, board: Some(board) }
    }

    #[inline]
    pub fn cell(&self) -> usize {
        3 * self.row + self.col
    }

    /// `3*row + col` when forced, `9*board + 3*row + col` when the board was chosen
    pub fn encode(&self) -> u8 {
        let code = match self.board {
            Some(board) => 9 * board + self.cell(),
            None => self.cell(),
        };
        code as u8
    }

    /// Inverse of `encode`; callers must know whether the position is constrained
    pub fn decode(code: u8, constrained: bool) -> Self {
        let code = code as usize;
        if constrained {
            Move::forced(code / 3, code % 3)
        } else {
            let cell = code % 9;
            Move::anywhere(code / 9, cell / 3, cell % 3)
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.board {
            Some(board) => write!(f, "row={} col={} board={}", self.row, self.col, board),
            None => write!(f, "row={} col={} board=forced", self.row, self.col),
        }
    }
}

// ---------- Packed snapshot ----------
/// The raw bit state of a board, for replay checks and for setting up positions
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct PackedBoard {
    pub sub_boards: [u32; 9],
    pub won: u32,
    pub tied: u16,
    pub player_two: bool,
    pub forced: Option<u8>,
    pub has_won: bool,
}

// ---------- Board ----------
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Board {
    sub_boards: [u32; 9],
    won: u32,
    tied: u16,
    active: Player,
    forced: Option<usize>,
    chosen: bool,  // forced came from select_sub_board during the current ply
    has_won: bool,
    last_move: Option<Move>,
}

impl Default for Board {
    fn default() -> Self {
        Board {
            sub_boards: [0; 9],
            won: 0,
            tied: 0,
            active: Player::P1,
            forced: None,
            chosen: false,
            has_won: false,
            last_move: None,
        }
    }
}

impl Board {
    /// Pick the sub-board to play in. Only legal while the position is unconstrained
    pub fn select_sub_board(&mut self, n: usize) -> Result<()> {
        self.ensure_playing()?;
        self.check_sub_board(n)?;
        self.forced = Some(n);
        self.chosen = true;
        Ok(())
    }

    /// Mark (row, col) of the selected sub-board for the active player
    pub fn apply_move(&mut self, row: usize, col: usize) -> Result<()> {
        self.ensure_playing()?;
        let board = self.forced.ok_or(Error::NoSubBoardSelected)?;
        self.check_cell(board, row, col)?;

        let player = self.active;
        let offset = player.offset();
        self.sub_boards[board] |= 1 << (Move::forced(row, col).cell() as u32 + offset);

        let word = self.sub_boards[board];
        if completes_line(half(word, player), row, col) {
            // Same test one level up: the sub-board is a cell of the meta-board
            self.won |= 1 << (board as u32 + offset);
            if completes_line(half(self.won, player), board / 3, board % 3) {
                self.has_won = true;
            }
        } else if both(word) == FULL {
            self.tied |= 1 << board;
        }

        self.last_move = Some(Move { row, col, board: self.chosen.then_some(board) });
        self.chosen = false;
        self.active = player.other();
        let next = Move::forced(row, col).cell();
        self.forced = if self.is_over() || self.is_finished(next) { None } else { Some(next) };
        Ok(())
    }

    /// Won by either player or tied: nothing more can be placed there
    pub fn is_finished(&self, n: usize) -> bool {
        n < 9 && ((self.won >> n) & 1 == 1 || (self.won >> (n + 9)) & 1 == 1 || (self.tied >> n) & 1 == 1)
    }

    /// Is (row, col) taken in the currently selected sub-board
    pub fn is_filled(&self, row: usize, col: usize) -> Result<bool> {
        let board = self.forced.ok_or(Error::NoSubBoardSelected)?;
        check_coord("row", row, 2)?;
        check_coord("col", col, 2)?;
        Ok(self.occupied(board, row, col))
    }

    /// Is (row, col) taken in any sub-board
    pub fn is_filled_in(&self, board: usize, row: usize, col: usize) -> Result<bool> {
        check_position(board, row, col)?;
        Ok(self.occupied(board, row, col))
    }

    fn occupied(&self, board: usize, row: usize, col: usize) -> bool {
        (both(self.sub_boards[board]) >> Move::forced(row, col).cell()) & 1 == 1
    }

    /// Every sub-board is finished but nobody has three in a row on the meta-board
    pub fn is_tied(&self) -> bool {
        !self.has_won && (self.tied as u32 | both(self.won)) == FULL
    }

    pub fn has_won(&self) -> bool {
        self.has_won
    }

    pub fn is_board_forced(&self) -> bool {
        self.forced.is_some()
    }

    pub fn forced_board(&self) -> Option<usize> {
        self.forced
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    /// Who holds (row, col) of a sub-board
    pub fn cell(&self, board: usize, row: usize, col: usize) -> Result<Option<Player>> {
        check_position(board, row, col)?;
        Ok(self.owner(board, row, col))
    }

    fn owner(&self, board: usize, row: usize, col: usize) -> Option<Player> {
        let bit = Move::forced(row, col).cell();
        [Player::P1, Player::P2]
            .into_iter()
            .find(|&p| (half(self.sub_boards[board], p) >> bit) & 1 == 1)
    }

    /// How a sub-board ended, if it has
    pub fn sub_board_outcome(&self, n: usize) -> Option<Outcome> {
        if let Some(p) = [Player::P1, Player::P2].into_iter().find(|&p| (half(self.won, p) >> n) & 1 == 1) {
            Some(Outcome::Won(p))
        } else if (self.tied >> n) & 1 == 1 {
            Some(Outcome::Tied)
        } else {
            None
        }
    }

    /// Encoded playable positions: `3*row + col` when forced, `9*board + 3*row + col` otherwise.
    /// Decode with `Move::decode(code, self.is_board_forced())`
    pub fn legal_moves(&self) -> Vec<u8> {
        if self.is_over() {
            return vec![];
        }
        match self.forced {
            Some(board) => Self::open_cells(self.sub_boards[board]).map(|cell| cell as u8).collect(),
            None => (0..9)
                .filter(|&board| !self.is_finished(board))
                .flat_map(|board| Self::open_cells(self.sub_boards[board]).map(move |cell| (9 * board + cell) as u8))
                .collect(),
        }
    }

    fn open_cells(word: u32) -> impl Iterator<Item = usize> {
        let taken = both(word);
        (0..9).filter(move |cell| (taken >> cell) & 1 == 0)
    }

    // ---------- Validation ----------
    fn ensure_playing(&self) -> Result<()> {
        if self.is_over() {
            return Err(Error::GameOver);
        }
        Ok(())
    }

    fn check_sub_board(&self, n: usize) -> Result<()> {
        if let Some(forced) = self.forced {
            return Err(Error::SubBoardAlreadyForced { forced, requested: n });
        }
        check_coord("sub-board", n, 8)?;
        if self.is_finished(n) {
            return Err(Error::SubBoardFinished { board: n });
        }
        Ok(())
    }

    fn check_cell(&self, board: usize, row: usize, col: usize) -> Result<()> {
        check_coord("row", row, 2)?;
        check_coord("col", col, 2)?;
        if self.occupied(board, row, col) {
            return Err(Error::CellOccupied { board, row, col });
        }
        Ok(())
    }

    // ---------- Snapshots ----------
    pub fn encode(&self) -> PackedBoard {
        PackedBoard {
            sub_boards: self.sub_boards,
            won: self.won,
            tied: self.tied,
            player_two: self.active == Player::P2,
            forced: self.forced.map(|b| b as u8),
            has_won: self.has_won,
        }
    }

    /// Rebuild a board from raw bits, rejecting anything legal play could not produce
    pub fn decode(state: &PackedBoard) -> Result<Self> {
        let corrupt = |msg: String| Err(Error::CorruptState(msg));
        let active = if state.player_two { Player::P2 } else { Player::P1 };

        let mut marks = [0u32; 2];
        for (i, &word) in state.sub_boards.iter().enumerate() {
            let (x, o) = (half(word, Player::P1), half(word, Player::P2));
            if word >> 18 != 0 {
                return corrupt(format!("sub-board {} has bits above the two 9-bit halves", i));
            }
            if x & o != 0 {
                return corrupt(format!("sub-board {} has cells marked by both players", i));
            }
            let (x_line, o_line) = (has_line(x), has_line(o));
            if x_line && o_line {
                return corrupt(format!("sub-board {} has lines for both players", i));
            }
            if (half(state.won, Player::P1) >> i) & 1 == 1 && !x_line
                || (half(state.won, Player::P2) >> i) & 1 == 1 && !o_line
                || (state.won >> i) & 1 == 0 && x_line
                || (state.won >> (i + 9)) & 1 == 0 && o_line {
                return corrupt(format!("won bits of sub-board {} do not match its lines", i));
            }
            let tied = (state.tied >> i) & 1 == 1;
            if tied != (x | o == FULL && !x_line && !o_line) {
                return corrupt(format!("tied bit of sub-board {} does not match its cells", i));
            }
            marks[0] += x.count_ones();
            marks[1] += o.count_ones();
        }
        if state.won >> 18 != 0 || state.tied >> 9 != 0 {
            return corrupt("meta-board masks exceed 9 bits".to_string());
        }
        let expected_p2 = marks[0] == marks[1] + 1;
        if !(marks[0] == marks[1] || expected_p2) || expected_p2 != state.player_two {
            return corrupt(format!("{} X marks and {} O marks do not fit {:?} to move", marks[0], marks[1], active));
        }

        let (meta_x, meta_o) = (has_line(half(state.won, Player::P1)), has_line(half(state.won, Player::P2)));
        let last_mover_won = has_line(half(state.won, active.other()));
        if state.has_won != (meta_x || meta_o) || (state.has_won && !last_mover_won) {
            return corrupt("terminal flag does not match the meta-board".to_string());
        }

        let mut board = Board {
            sub_boards: state.sub_boards,
            won: state.won,
            tied: state.tied,
            active,
            forced: None,
            chosen: false,
            has_won: state.has_won,
            last_move: None,
        };
        if let Some(f) = state.forced {
            let f = f as usize;
            if f >= 9 || board.is_finished(f) || board.is_over() {
                return corrupt(format!("sub-board {} cannot be forced", f));
            }
            board.forced = Some(f);
        }
        Ok(board)
    }
}

impl Game for Board {
    type Action = Move;

    fn new() -> Self {
        Board::default()
    }

    fn active_player(&self) -> Player {
        self.active
    }

    fn available_actions(&self) -> Vec<Self::Action> {
        let constrained = self.is_board_forced();
        self.legal_moves().into_iter().map(|code| Move::decode(code, constrained)).collect()
    }

    fn play(&mut self, action: &Self::Action) -> Result<()> {
        match (action.board, self.forced) {
            (Some(board), None) => {
                // Validate the whole ply before touching anything
                self.ensure_playing()?;
                self.check_sub_board(board)?;
                self.check_cell(board, action.row, action.col)?;
                self.select_sub_board(board)?;
                self.apply_move(action.row, action.col)
            }
            (None, Some(_)) => self.apply_move(action.row, action.col),
            (Some(requested), Some(forced)) => Err(Error::SubBoardAlreadyForced { forced, requested }),
            (None, None) => Err(Error::NoSubBoardSelected),
        }
    }

    fn winner(&self) -> Option<Player> {
        self.has_won.then(|| self.active.other())
    }

    fn is_over(&self) -> bool {
        self.has_won || self.is_tied()
    }

    fn last_action(&self) -> Option<Self::Action> {
        self.last_move
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mark = |p: Option<Player>| p.map_or('-', Player::mark);
        for row in 0..9 {
            let line = (0..9)
                .map(|col| mark(self.owner(3 * (row / 3) + col / 3, row % 3, col % 3)).to_string())
                .collect::<Vec<_>>()
                .chunks(3)
                .map(|chunk| chunk.join(" "))
                .collect::<Vec<_>>()
                .join(" | ");
            writeln!(f, "{}", line)?;
            if row == 2 || row == 5 {
                writeln!(f, "------+-------+------")?;
            }
        }

        writeln!(f, "\nMega Board viewed as a whole:")?;
        for row in 0..3 {
            let line = (0..3)
                .map(|col| match self.sub_board_outcome(3 * row + col) {
                    Some(Outcome::Won(p)) => p.mark(),
                    Some(Outcome::Tied) => '#',
                    None => '-',
                }.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "{}", line)?;
        }

        if let Some(p) = self.winner() {
            writeln!(f, "Player {} has won", p.mark())?;
        } else if self.is_tied() {
            writeln!(f, "Tied")?;
        } else {
            let next = self.forced.map_or("anywhere".to_string(), |b| format!("Board {}", b));
            writeln!(f, "Next placement: {} by player {}", next, self.active.mark())?;
        }
        match self.last_move {
            Some(mv) => writeln!(f, "Previous placement: {}", mv),
            None => writeln!(f, "Previous placement: none"),
        }
    }
}
