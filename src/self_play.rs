use log::info;
use crate::error::{Error, Result};
use crate::players::Agent;
use crate::utils::{Game, Outcome, Player};

/// Let two agents take turns on `game` until it ends.
/// `on_turn` sees the position before every ply and once more at the end.
pub fn play_match<G: Game>(
    game: &mut G,
    p1: &mut dyn Agent<G>,
    p2: &mut dyn Agent<G>,
    mut on_turn: impl FnMut(&G),
) -> Result<Outcome> {
    let mut plies = 0;
    loop {
        on_turn(game);
        if let Some(outcome) = game.outcome() {
            info!("Game over after {} plies: {:?}", plies, outcome);
            return Ok(outcome);
        }

        let mover = game.active_player();
        match mover {
            Player::P1 => p1.play_turn(game)?,
            Player::P2 => p2.play_turn(game)?,
        }
        if game.active_player() == mover && !game.is_over() {
            return Err(Error::NoMoveMade(mover.mark()));
        }
        plies += 1;
    }
}
