use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use std::io::{stdin, stdout, Stdin, Write};
use std::path::PathBuf;

use dropgrid::arena::Arena;
use dropgrid::config::{AppConfig, Controller};
use dropgrid::engine::{LogObserver, SearchEngine};
use dropgrid::game::{Match, MatchStatus};
use dropgrid::grid::Player;
use dropgrid::record::{self, MatchRecord};
use dropgrid::strategy::{RandomStrategy, Strategy};

mod display;
use display::display;

/// Play a gravity grid game against the computer or another person.
#[derive(Parser)]
#[command(name = "dropgrid", about = "Drop pieces, line them up")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "dropgrid.toml")]
    config: PathBuf,

    /// Override the search depth
    #[arg(long)]
    depth: Option<u32>,

    /// Override the number of rows
    #[arg(long)]
    rows: Option<usize>,

    /// Override the number of columns
    #[arg(long)]
    cols: Option<usize>,

    /// Override the number of aligned pieces needed to win
    #[arg(long)]
    win_length: Option<usize>,

    /// Start from this 1-indexed move string instead of an empty board
    #[arg(long)]
    moves: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Play a series of computer-vs-computer games
    Arena {
        /// Override the number of games
        #[arg(long)]
        games: Option<usize>,

        /// Override the base seed for the random players
        #[arg(long)]
        seed: Option<u64>,
    },
}

enum Side {
    Human,
    Random(RandomStrategy),
    Minimax(SearchEngine),
}

impl Side {
    fn new(controller: Controller, player: Player, depth: u32) -> Self {
        match controller {
            Controller::Human => Side::Human,
            Controller::Random => Side::Random(RandomStrategy::new()),
            Controller::Minimax => {
                Side::Minimax(SearchEngine::new(depth, player).with_observer(LogObserver))
            }
        }
    }

    fn is_human(&self) -> bool {
        matches!(self, Side::Human)
    }
}

fn ask_yes_no(stdin: &Stdin, question: &str) -> Result<bool> {
    loop {
        let mut buffer = String::new();
        print!("{} y/n: ", question);
        stdout().flush()?;
        stdin.read_line(&mut buffer)?;
        match buffer.to_lowercase().chars().next() {
            Some('y') => return Ok(true),
            Some('n') => return Ok(false),
            _ => println!("Unknown answer given"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(depth) = cli.depth {
        config.search.depth = depth;
    }
    if let Some(rows) = cli.rows {
        config.board.rows = rows;
    }
    if let Some(cols) = cli.cols {
        config.board.cols = cols;
    }
    if let Some(win_length) = cli.win_length {
        config.board.win_length = win_length;
    }
    if let Some(Command::Arena { games, seed }) = cli.command {
        if let Some(games) = games {
            config.arena.games = games;
        }
        if let Some(seed) = seed {
            config.arena.seed = seed;
        }
    }
    config.validate().context("invalid configuration")?;

    match cli.command {
        Some(Command::Arena { .. }) => run_arena(&config),
        None => {
            // without a config file, ask who plays each side
            if !cli.config.exists() {
                let stdin = stdin();
                for &player in &[Player::One, Player::Two] {
                    let ai = ask_yes_no(&stdin, &format!("Is {} AI controlled?", player))?;
                    let controller = if ai { Controller::Minimax } else { Controller::Human };
                    match player {
                        Player::One => config.players.one = controller,
                        Player::Two => config.players.two = controller,
                    }
                }
            }
            play(&config, cli.moves.as_deref())
        }
    }
}

fn run_arena(config: &AppConfig) -> Result<()> {
    println!(
        "Playing {} games of {:?} vs {:?} on a {}x{} board",
        config.arena.games,
        config.players.one,
        config.players.two,
        config.board.rows,
        config.board.cols
    );
    let summary = Arena::from_config(config).show_progress(true).run()?;

    println!("{:?} (player 1) wins: {}", config.players.one, summary.player_one_wins);
    println!("{:?} (player 2) wins: {}", config.players.two, summary.player_two_wins);
    println!("Draws: {}", summary.draws);
    println!("First mover wins: {}", summary.first_mover_wins);
    println!("Average game length: {:.1} moves", summary.average_length());
    Ok(())
}

fn play(config: &AppConfig, moves: Option<&str>) -> Result<()> {
    let mut game = match moves {
        Some(moves) => record::replay_from(moves, config.board, config.players.first)?,
        None => Match::with_first_player(config.board, config.players.first)?,
    };
    let mut sides = [
        Side::new(config.players.one, Player::One, config.search.depth),
        Side::new(config.players.two, Player::Two, config.search.depth),
    ];
    let all_computer = sides.iter().all(|side| !side.is_human());

    let stdin = stdin();

    println!("Welcome to Connect {}\n", config.board.win_length);

    // game loop
    loop {
        display(&game)?;

        match game.status() {
            MatchStatus::InProgress => {
                let player = game.active_player();
                let index = match player {
                    Player::One => 0,
                    Player::Two => 1,
                };

                let column = if sides[index].is_human() {
                    match read_human_move(&stdin, &game)? {
                        HumanInput::Column(column) => column,
                        HumanInput::Undo => {
                            undo_to_human(&mut game, &sides);
                            continue;
                        }
                        HumanInput::Quit => return Ok(()),
                        HumanInput::Invalid => continue,
                    }
                } else {
                    // slow down play if both players are AI
                    if all_computer {
                        std::thread::sleep(std::time::Duration::from_millis(500));
                    }
                    computer_move(&mut sides[index], &game)?
                };

                if !game.play_turn(column) {
                    println!("Invalid move, column {} full", column + 1);
                }
            }

            // end states
            MatchStatus::Won(player) => {
                println!("{} wins!", player);
                break;
            }
            MatchStatus::Draw => {
                println!("Draw!");
                break;
            }
        }
    }

    if let Some(record) = MatchRecord::from_match(&game) {
        println!("{}", serde_json::to_string_pretty(&record)?);
    }
    Ok(())
}

enum HumanInput {
    Column(usize),
    Undo,
    Quit,
    Invalid,
}

fn read_human_move(stdin: &Stdin, game: &Match) -> Result<HumanInput> {
    print!("{} move input (u to undo, q to quit) > ", game.active_player());
    stdout().flush()?;
    let mut input_str = String::new();
    if stdin.read_line(&mut input_str)? == 0 {
        return Ok(HumanInput::Quit);
    }

    let cols = game.grid().cols();
    Ok(match input_str.trim() {
        "q" => HumanInput::Quit,
        "u" => HumanInput::Undo,
        input => match input.parse::<usize>() {
            Ok(column) if (1..=cols).contains(&column) => HumanInput::Column(column - 1),
            _ => {
                println!("Invalid move, columns must be between 1 and {}", cols);
                HumanInput::Invalid
            }
        },
    })
}

fn computer_move(side: &mut Side, game: &Match) -> Result<usize> {
    let player = game.active_player();
    let column = match side {
        Side::Human => None,
        Side::Random(strategy) => strategy.propose(game.grid()),
        Side::Minimax(engine) => {
            println!("AI is thinking...");
            stdout().flush()?;

            let column = engine.get_move(game.grid());
            if !engine.last_scores().is_empty() {
                let scores: Vec<String> = engine
                    .last_scores()
                    .iter()
                    .map(|(column, score)| format!("{}: {}", column + 1, score))
                    .collect();
                println!("Column scores: {}", scores.join(", "));
            }
            column
        }
    };
    let column = column.ok_or_else(|| anyhow!("no valid column for {}", player))?;
    println!("Best move: {}", column + 1);
    Ok(column)
}

/// Takes back moves until a human is to move again
fn undo_to_human(game: &mut Match, sides: &[Side; 2]) {
    if !game.undo() {
        println!("Nothing to undo");
        return;
    }
    loop {
        let side = match game.active_player() {
            Player::One => &sides[0],
            Player::Two => &sides[1],
        };
        if side.is_human() || !game.undo() {
            break;
        }
    }
}
