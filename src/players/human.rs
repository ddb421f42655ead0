use std::collections::VecDeque;
use std::io::{BufRead, Write};
use log::debug;
use crate::error::{Error, Result};
use crate::games::ultimate::{Board, Move};
use crate::players::Agent;
use crate::utils::Game;

/// Reads whitespace separated numbers, so "1 2" on one line and "1\n2" both work
pub struct HumanPlayer<R: BufRead, W: Write> {
    input: R,
    output: W,
    pending: VecDeque<String>,
}

impl<R: BufRead, W: Write> HumanPlayer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        HumanPlayer { input, output, pending: VecDeque::new() }
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()?;
        Ok(())
    }

    fn next_token(&mut self) -> Result<String> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(token);
            }
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(Error::InputClosed);
            }
            self.pending.extend(line.split_whitespace().map(str::to_string));
        }
    }

    /// Next non-negative number, or None (after saying so) when the token was something else
    fn next_number(&mut self) -> Result<Option<usize>> {
        let token = self.next_token()?;
        match token.parse() {
            Ok(n) => Ok(Some(n)),
            Err(_) => {
                debug!("Could not parse {:?}", token);
                self.pending.clear();
                self.say("Please enter numbers only")?;
                Ok(None)
            }
        }
    }

    fn choose_sub_board(&mut self, board: &Board) -> Result<usize> {
        loop {
            self.say("Choose starting location:")?;
            let Some(n) = self.next_number()? else { continue };
            if n > 8 {
                self.say("That location does not exist")?;
            } else if board.is_finished(n) {
                self.say("That location is finished")?;
            } else {
                return Ok(n);
            }
        }
    }

    fn choose_cell(&mut self, board: &Board, sub_board: usize) -> Result<(usize, usize)> {
        loop {
            self.say("row col:")?;
            let Some(row) = self.next_number()? else { continue };
            let Some(col) = self.next_number()? else { continue };
            if row > 2 || col > 2 {
                self.say("That cell does not exist")?;
            } else if board.is_filled_in(sub_board, row, col)? {
                self.say("That cell is not empty")?;
            } else {
                return Ok((row, col));
            }
        }
    }
}

impl<R: BufRead, W: Write> Agent<Board> for HumanPlayer<R, W> {
    /// Nothing is placed until the whole ply has been read
    fn play_turn(&mut self, game: &mut Board) -> Result<()> {
        let (sub_board, chosen) = match game.forced_board() {
            Some(n) => (n, None),
            None => {
                let n = self.choose_sub_board(game)?;
                (n, Some(n))
            }
        };
        let (row, col) = self.choose_cell(game, sub_board)?;
        game.play(&Move { row, col, board: chosen })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::utils::Player;

    fn human(script: &str) -> HumanPlayer<Cursor<Vec<u8>>, Vec<u8>> {
        HumanPlayer::new(Cursor::new(script.as_bytes().to_vec()), Vec::new())
    }

    fn transcript(player: &HumanPlayer<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(player.output.clone()).unwrap()
    }

    #[test]
    fn unconstrained_turn_asks_for_a_board_first() {
        let mut board = Board::new();
        let mut player = human("4\n1 1\n");
        player.play_turn(&mut board).unwrap();
        assert_eq!(board.last_move(), Some(Move::anywhere(4, 1, 1)));
        assert_eq!(transcript(&player), "Choose starting location:\nrow col:\n");
    }

    #[test]
    fn forced_turn_only_asks_for_a_cell() {
        let mut board = Board::new();
        board.play(&Move::anywhere(4, 1, 1)).unwrap();
        let mut player = human("1 1\n0\n2\n");
        player.play_turn(&mut board).unwrap();
        assert_eq!(board.cell(4, 0, 2).unwrap(), Some(Player::P2));
        assert_eq!(transcript(&player), "row col:\nThat cell is not empty\nrow col:\n");
    }

    #[test]
    fn bad_input_is_asked_again() {
        let mut board = Board::new();
        board.play(&Move::anywhere(4, 1, 1)).unwrap();
        board.play(&Move::forced(0, 0)).unwrap();  // O, X now forced into board 0
        let mut player = human("x y\n5 0\n2 2\n");
        player.play_turn(&mut board).unwrap();
        assert_eq!(board.cell(0, 2, 2).unwrap(), Some(Player::P1));
        assert_eq!(
            transcript(&player),
            "row col:\nPlease enter numbers only\nrow col:\nThat cell does not exist\nrow col:\n"
        );
    }

    #[test]
    fn finished_location_is_refused() {
        let mut board = Board::new();
        for mv in [
            Move::anywhere(4, 1, 0),
            Move::forced(1, 1),
            Move::forced(1, 2),
            Move::forced(1, 1),
            Move::forced(1, 1),
        ] {
            board.play(&mv).unwrap();
        }
        let mut player = human("4\n9\n0\n0 0\n");
        player.play_turn(&mut board).unwrap();
        assert_eq!(board.cell(0, 0, 0).unwrap(), Some(Player::P2));
        let text = transcript(&player);
        assert!(text.contains("That location is finished"));
        assert!(text.contains("That location does not exist"));
    }

    #[test]
    fn end_of_input_is_an_error() {
        let mut board = Board::new();
        let mut player = human("4\n");
        assert!(matches!(player.play_turn(&mut board), Err(Error::InputClosed)));
        assert_eq!(board, Board::new());
    }
}
