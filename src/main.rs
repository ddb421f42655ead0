use std::io;
use std::process::ExitCode;
use std::str::FromStr;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::error;
use ultimate_tictactoe::error::Result;
use ultimate_tictactoe::games::ultimate::Board;
use ultimate_tictactoe::mcts::SearchConfig;
use ultimate_tictactoe::players::{Agent, HumanPlayer, MctsPlayer};
use ultimate_tictactoe::self_play::play_match;
use ultimate_tictactoe::tournament::play_many;
use ultimate_tictactoe::utils::{Game, Outcome, DEFAULT_DIFFICULTY, HARD_DIFFICULTY};

/// Who sits on one side of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seat {
    Human,
    Bot(usize),
}

impl FromStr for Seat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("human") {
            return Ok(Seat::Human);
        }
        match s.parse::<usize>() {
            Ok(0) => Err("a bot needs at least one simulation per move".to_string()),
            Ok(n) => Ok(Seat::Bot(n)),
            Err(_) => Err(format!("expected a simulation count or \"human\", got {:?}", s)),
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Ultimate tic-tac-toe against a Monte-Carlo tree search bot")]
struct Args {
    /// X player: simulations per move, or "human"
    #[arg(long, default_value_t = Seat::Bot(DEFAULT_DIFFICULTY), value_parser = Seat::from_str)]
    p1: Seat,

    /// O player: simulations per move, or "human"
    #[arg(long, default_value_t = Seat::Bot(HARD_DIFFICULTY), value_parser = Seat::from_str)]
    p2: Seat,

    /// Random seed for reproducible bots
    #[arg(long)]
    seed: Option<u64>,

    /// Number of bot-vs-bot games; more than one only prints the tally
    #[arg(long, short = 'g', default_value_t = 1)]
    games: usize,

    /// Worker threads for multi-game runs
    #[arg(long, short = 't', default_value_t = 1)]
    threads: usize,

    /// Do not print the board between moves
    #[arg(long, short = 'q')]
    quiet: bool,
}

impl Args {
    /// Checks clap cannot express on its own
    fn validate(&self) -> std::result::Result<(), clap::Error> {
        if self.games > 1 && (self.p1 == Seat::Human || self.p2 == Seat::Human) {
            return Err(Args::command().error(
                ErrorKind::ArgumentConflict,
                "--games above 1 plays bot against bot; --p1 and --p2 must both be simulation counts",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Seat::Human => write!(f, "human"),
            Seat::Bot(n) => write!(f, "{}", n),
        }
    }
}

fn bot_config(iterations: usize, seed: Option<u64>) -> SearchConfig {
    let config = SearchConfig::default().with_iterations(iterations);
    match seed {
        Some(s) => config.with_seed(s),
        None => config,
    }
}

fn seat(seat: Seat, seed: Option<u64>, side: u64) -> Box<dyn Agent<Board>> {
    match seat {
        Seat::Human => Box::new(HumanPlayer::new(io::BufReader::new(io::stdin()), io::stdout())),
        Seat::Bot(n) => Box::new(MctsPlayer::<Board>::new(bot_config(n, seed).for_stream(side))),
    }
}

fn single_game(args: &Args) -> Result<()> {
    let mut board = Board::new();
    let mut p1 = seat(args.p1, args.seed, 0);
    let mut p2 = seat(args.p2, args.seed, 1);
    let quiet = args.quiet;
    let outcome = play_match(&mut board, p1.as_mut(), p2.as_mut(), |b| {
        if !quiet {
            println!("{}", b);
        }
    })?;
    match outcome {
        Outcome::Won(p) => println!("That was the winning move! {} wins", p.mark()),
        Outcome::Tied => println!("Tied"),
    }
    if quiet {
        println!("{}", board);
    }
    Ok(())
}

fn tournament(args: &Args, n1: usize, n2: usize) -> Result<()> {
    let tally = play_many::<Board>(
        args.games,
        args.threads,
        &bot_config(n1, args.seed),
        &bot_config(n2, args.seed),
    )?;
    println!(
        "X ({} sims) won {}, O ({} sims) won {}, {} tied",
        n1, tally.p1_wins, n2, tally.p2_wins, tally.ties
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = args.validate() {
        e.exit();
    }

    let result = match (args.p1, args.p2) {
        (Seat::Bot(n1), Seat::Bot(n2)) if args.games > 1 => tournament(&args, n1, n2),
        _ => single_game(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
