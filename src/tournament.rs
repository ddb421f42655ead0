//! Many bot-vs-bot games spread over worker threads.
//!
//! Each game owns its board and both search trees; threads only share a
//! counter of games left to hand out and the list of results.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use log::{debug, info};
use crate::error::{Error, Result};
use crate::mcts::SearchConfig;
use crate::players::MctsPlayer;
use crate::self_play::play_match;
use crate::utils::{Game, Outcome, Player, Reward};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub p1_wins: usize,
    pub p2_wins: usize,
    pub ties: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Won(Player::P1) => self.p1_wins += 1,
            Outcome::Won(Player::P2) => self.p2_wins += 1,
            Outcome::Tied => self.ties += 1,
        }
    }

    pub fn games(&self) -> usize {
        self.p1_wins + self.p2_wins + self.ties
    }

    /// Average result for `player`, ties counting half
    pub fn score(&self, player: Player) -> Reward {
        if self.games() == 0 {
            return 0.0;
        }
        let wins = match player {
            Player::P1 => self.p1_wins,
            Player::P2 => self.p2_wins,
        };
        (wins as Reward + 0.5 * self.ties as Reward) / self.games() as Reward
    }
}

/// Both sides of game `index`, each on its own seed stream, so seeded tournaments are
/// reproducible whatever the thread count
fn game_configs(p1: &SearchConfig, p2: &SearchConfig, index: usize) -> (SearchConfig, SearchConfig) {
    let stream = 2 * index as u64;
    (p1.for_stream(stream), p2.for_stream(stream + 1))
}

/// Play `num_games` games of `p1` against `p2` on `num_threads` threads
pub fn play_many<G: Game + 'static>(
    num_games: usize,
    num_threads: usize,
    p1: &SearchConfig,
    p2: &SearchConfig,
) -> Result<Tally> {
    let results: Arc<Mutex<Vec<(usize, Result<Outcome>)>>> = Arc::new(Mutex::new(Vec::new()));
    let next_game = Arc::new(Mutex::new(0usize));
    let mut handles = vec![];

    for worker in 0..num_threads.max(1) {
        let results = Arc::clone(&results);
        let next_game = Arc::clone(&next_game);
        let (p1, p2) = (p1.clone(), p2.clone());

        let handle = thread::spawn(move || loop {
            let index = {
                let mut next = next_game.lock().unwrap_or_else(PoisonError::into_inner);
                if *next >= num_games {
                    break;
                }
                *next += 1;
                *next - 1
            };

            debug!("Worker {} starts game {}", worker, index);
            let mut game = G::new();
            let (x, o) = game_configs(&p1, &p2, index);
            let mut first: MctsPlayer<G> = MctsPlayer::new(x);
            let mut second: MctsPlayer<G> = MctsPlayer::new(o);
            let outcome = play_match(&mut game, &mut first, &mut second, |_| {});
            results.lock().unwrap_or_else(PoisonError::into_inner).push((index, outcome));
        });
        handles.push(handle);
    }

    for (worker, handle) in handles.into_iter().enumerate() {
        handle.join().map_err(|_| Error::WorkerPanicked(worker))?;
    }

    let mut results = std::mem::take(&mut *results.lock().unwrap_or_else(PoisonError::into_inner));
    results.sort_by_key(|(index, _)| *index);
    let mut tally = Tally::default();
    for (index, outcome) in results {
        let outcome = outcome?;
        info!("Game {}: {:?}", index, outcome);
        tally.record(outcome);
    }
    info!("{} games: {:?}", tally.games(), tally);
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::ultimate::Board;

    fn quick(seed: u64) -> SearchConfig {
        SearchConfig::for_testing().with_iterations(30).with_seed(seed)
    }

    #[test]
    fn tally_counts_every_outcome() {
        let mut tally = Tally::default();
        tally.record(Outcome::Won(Player::P1));
        tally.record(Outcome::Won(Player::P1));
        tally.record(Outcome::Tied);
        tally.record(Outcome::Won(Player::P2));
        assert_eq!(tally, Tally { p1_wins: 2, p2_wins: 1, ties: 1 });
        assert_eq!(tally.score(Player::P1), 0.625);
        assert_eq!(tally.score(Player::P1) + tally.score(Player::P2), 1.0);
        assert_eq!(Tally::default().score(Player::P2), 0.0);
    }

    #[test]
    fn no_two_bots_share_a_seed() {
        let base = SearchConfig::default().with_seed(42);
        let mut seeds = vec![];
        for index in 0..20 {
            let (x, o) = game_configs(&base, &base, index);
            seeds.extend([x.seed.unwrap(), o.seed.unwrap()]);
        }
        let mut unique = seeds.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), seeds.len());
    }

    #[test]
    fn every_game_is_played_once() {
        let tally = play_many::<Board>(5, 3, &quick(1), &quick(2)).unwrap();
        assert_eq!(tally.games(), 5);
    }

    #[test]
    fn seeded_results_ignore_thread_count() {
        let one = play_many::<Board>(4, 1, &quick(9), &quick(10)).unwrap();
        let many = play_many::<Board>(4, 4, &quick(9), &quick(10)).unwrap();
        assert_eq!(one, many);
    }

    #[test]
    fn zero_threads_still_plays() {
        let tally = play_many::<Board>(1, 0, &quick(3), &quick(4)).unwrap();
        assert_eq!(tally.games(), 1);
    }
}
