use log::{debug, info};
use crate::error::Result;
use crate::mcts::{MoveTree, SearchConfig};
use crate::players::Agent;
use crate::utils::Game;

/// Bot that keeps one search tree for the whole game
pub struct MctsPlayer<G: Game> {
    tree: MoveTree<G>,
    difficulty: usize,
    /// Position the tree's root stands for, once the tree has been used
    root_position: Option<G>,
}

impl<G: Game> MctsPlayer<G> {
    pub fn new(config: SearchConfig) -> Self {
        let difficulty = config.iterations;
        MctsPlayer { tree: MoveTree::new(config), difficulty, root_position: None }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn tree(&self) -> &MoveTree<G> {
        &self.tree
    }

    /// Move the root to the position `game` is in now.
    /// Move identities repeat across sub-boards, so this compares positions, not moves.
    fn catch_up(&mut self, game: &G) {
        if self.root_position.as_ref() == Some(game) {
            return;
        }
        let last = game.last_action();
        let follows = match (&self.root_position, &last) {
            (Some(position), Some(action)) => {
                let mut next = position.clone();
                next.play(action).is_ok() && next == *game
            }
            _ => false,
        };
        if !follows {
            // New game, or a position this tree never stood before
            debug!("Tree is not one ply behind the game, starting over");
            self.tree.reset();
        }
        if let Some(action) = &last {
            self.tree.reuse_subtree(action);
        }
        self.root_position = Some(game.clone());
    }
}

impl<G: Game> Agent<G> for MctsPlayer<G> {
    fn play_turn(&mut self, game: &mut G) -> Result<()> {
        self.catch_up(game);
        self.tree.search(game)?;

        let best = self.tree.get(self.tree.best_child()?);
        info!(
            "{:?} plays {:?} ({:.1} wins / {} visits)",
            game.active_player(),
            best.action,
            best.win_sum,
            best.visits
        );
        let action = self.tree.best_move()?;
        game.play(&action)?;
        self.tree.reuse_subtree(&action);
        self.root_position = Some(game.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::ultimate::{Board, Move};
    use crate::self_play::play_match;
    use crate::utils::Player;

    fn bot(seed: u64) -> MctsPlayer<Board> {
        MctsPlayer::new(SearchConfig::for_testing().with_iterations(100).with_seed(seed))
    }

    /// Visits the tree already has for `action` below the root, if it was explored
    fn known_visits(player: &MctsPlayer<Board>, action: Move) -> u32 {
        let tree = player.tree();
        tree.children(tree.root())
            .find(|c| c.action == Some(action))
            .map_or(0, |c| c.visits)
    }

    fn assert_root_matches(player: &MctsPlayer<Board>, board: &Board) {
        let tree = player.tree();
        let legal = board.available_actions();
        assert_eq!(tree.get(tree.root()).action, board.last_move());
        for child in tree.children(tree.root()) {
            assert!(legal.contains(&child.action.unwrap()), "{:?} is not legal here", child.action);
        }
    }

    #[test]
    fn plays_one_legal_ply() {
        let mut board = Board::new();
        let mut player = bot(1);
        assert_eq!(player.difficulty(), 100);
        player.play_turn(&mut board).unwrap();

        assert_eq!(board.active_player(), Player::P2);
        let mv = board.last_move().unwrap();
        assert!(mv.board.is_some());
        // the tree now sits on the move it just made
        assert_eq!(player.tree().get(player.tree().root()).action, Some(mv));
    }

    #[test]
    fn follows_the_opponents_reply() {
        let mut board = Board::new();
        let mut player = bot(2);
        player.play_turn(&mut board).unwrap();
        let reply = board.available_actions()[0];
        let expected = known_visits(&player, reply);
        board.play(&reply).unwrap();

        player.catch_up(&board);
        assert_root_matches(&player, &board);
        assert_eq!(player.tree().get(player.tree().root()).visits, expected);

        // catching up twice changes nothing
        let len = player.tree().len();
        player.catch_up(&board);
        assert_eq!(player.tree().len(), len);
    }

    #[test]
    fn reply_with_the_same_move_is_followed() {
        for seed in 0..20 {
            // O answers in board 4, X sends it back with the very same (row, col)
            let mut board = Board::new();
            board.play(&Move::anywhere(4, 1, 1)).unwrap();
            let mut player = bot(seed);
            player.play_turn(&mut board).unwrap();
            let own = board.last_move().unwrap();
            assert_eq!(own.board, None);

            let reply = Move::forced(own.row, own.col);
            let expected = known_visits(&player, reply);
            board.play(&reply).unwrap();
            assert_eq!(board.last_move(), Some(own));

            player.catch_up(&board);
            assert_root_matches(&player, &board);
            assert_eq!(player.tree().get(player.tree().root()).visits, expected);

            player.play_turn(&mut board).unwrap();
            let next = board.last_move().unwrap();
            let target = own.cell();
            assert_eq!(board.cell(target, next.row, next.col).unwrap(), Some(Player::P2));
        }
    }

    #[test]
    fn bots_play_whole_games() {
        for seed in 0..3 {
            let mut board = Board::new();
            let config = SearchConfig::for_testing().with_iterations(30);
            let mut x: MctsPlayer<Board> = MctsPlayer::new(config.clone().with_seed(2 * seed));
            let mut o: MctsPlayer<Board> = MctsPlayer::new(config.with_seed(2 * seed + 1));
            let outcome = play_match(&mut board, &mut x, &mut o, |_| {}).unwrap();
            assert_eq!(board.outcome(), Some(outcome));
        }
    }

    #[test]
    fn second_player_starts_from_the_first_move() {
        let mut board = Board::new();
        board.play(&Move::anywhere(4, 1, 1)).unwrap();
        let mut player = bot(3);
        player.play_turn(&mut board).unwrap();
        // O was sent to board 4, so its move names no board
        let reply = board.last_move().unwrap();
        assert_eq!(reply.board, None);
        assert_eq!(board.cell(4, reply.row, reply.col).unwrap(), Some(Player::P2));
        assert_eq!(board.active_player(), Player::P1);
    }

    #[test]
    fn new_game_resets_the_tree() {
        let mut player = bot(4);
        let mut board = Board::new();
        player.play_turn(&mut board).unwrap();

        let mut fresh = Board::new();
        player.play_turn(&mut fresh).unwrap();
        let root = player.tree().get(player.tree().root());
        assert_eq!(root.action, fresh.last_move());
        assert!(root.visits <= 100);
    }
}
