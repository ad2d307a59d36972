//! Computer-vs-computer series
//!
//! Each game is an independent [`Match`] with its own strategies, so games run
//! in parallel on the rayon pool while the calling thread collects results and
//! drives the progress bar.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use std::sync::mpsc::*;
use std::thread;

use crate::config::{AppConfig, Controller};
use crate::engine::SearchEngine;
use crate::error::ConfigError;
use crate::game::{Match, MatchStatus};
use crate::grid::{GridConfig, Player};
use crate::strategy::{RandomStrategy, Strategy};

/// The outcome of one arena game
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub index: usize,
    pub first_player: Player,
    pub status: MatchStatus,
    pub moves: usize,
}

/// Totals over a series; wins are keyed by side, and each side keeps its
/// controller for the whole series
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaSummary {
    pub games: usize,
    pub player_one_wins: usize,
    pub player_two_wins: usize,
    pub draws: usize,
    /// Games won by whichever side moved first
    pub first_mover_wins: usize,
    pub total_moves: usize,
}

impl ArenaSummary {
    pub fn from_results(results: &[GameResult]) -> Self {
        let mut summary = ArenaSummary {
            games: results.len(),
            ..Default::default()
        };
        for result in results {
            summary.total_moves += result.moves;
            match result.status {
                MatchStatus::Won(Player::One) => summary.player_one_wins += 1,
                MatchStatus::Won(Player::Two) => summary.player_two_wins += 1,
                MatchStatus::Draw => summary.draws += 1,
                MatchStatus::InProgress => {}
            }
            if result.status.winner() == Some(result.first_player) {
                summary.first_mover_wins += 1;
            }
        }
        summary
    }

    pub fn wins(&self, player: Player) -> usize {
        match player {
            Player::One => self.player_one_wins,
            Player::Two => self.player_two_wins,
        }
    }

    pub fn average_length(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_moves as f64 / self.games as f64
        }
    }
}

#[derive(Clone, Debug)]
pub struct Arena {
    board: GridConfig,
    depth: u32,
    controllers: [Controller; 2],
    games: usize,
    seed: u64,
    show_progress: bool,
}

impl Arena {
    pub fn new(board: GridConfig, depth: u32, one: Controller, two: Controller) -> Self {
        Self {
            board,
            depth,
            controllers: [one, two],
            games: 1,
            seed: 0,
            show_progress: false,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.board,
            config.search.depth,
            config.players.one,
            config.players.two,
        )
        .games(config.arena.games)
        .seed(config.arena.seed)
    }

    pub fn games(mut self, games: usize) -> Self {
        self.games = games;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn controller(&self, player: Player) -> Controller {
        match player {
            Player::One => self.controllers[0],
            Player::Two => self.controllers[1],
        }
    }

    /// Player one moves first in even games, player two in odd ones
    pub fn first_player(index: usize) -> Player {
        if index % 2 == 0 {
            Player::One
        } else {
            Player::Two
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.board.validate()?;
        if self.games == 0 {
            return Err(ConfigError::Validation("arena needs at least one game".into()));
        }
        for &player in &[Player::One, Player::Two] {
            if self.controller(player) == Controller::Human {
                return Err(ConfigError::Validation(format!(
                    "{} cannot be human controlled in the arena",
                    player
                )));
            }
        }
        Ok(())
    }

    fn strategy(&self, index: usize, player: Player) -> Box<dyn Strategy> {
        match self.controller(player) {
            Controller::Minimax => Box::new(SearchEngine::new(self.depth, player)),
            _ => Box::new(RandomStrategy::seeded(game_seed(self.seed, index, player))),
        }
    }

    /// Plays a single game of the series to completion
    pub fn play_game(&self, index: usize) -> Result<GameResult, ConfigError> {
        let first_player = Self::first_player(index);
        let mut game = Match::with_first_player(self.board, first_player)?;
        let mut strategies = [
            self.strategy(index, Player::One),
            self.strategy(index, Player::Two),
        ];

        while !game.is_over() {
            let strategy = match game.active_player() {
                Player::One => &mut strategies[0],
                Player::Two => &mut strategies[1],
            };
            let column = match strategy.propose(game.grid()) {
                Some(column) => column,
                None => break,
            };
            if !game.play_turn(column) {
                break;
            }
        }

        log::debug!(
            "arena game {} finished after {} moves: {:?}",
            index,
            game.move_count(),
            game.status()
        );

        Ok(GameResult {
            index,
            first_player,
            status: game.status(),
            moves: game.move_count(),
        })
    }

    /// Plays every game of the series, returning results ordered by game index
    pub fn run_games(&self) -> Result<Vec<GameResult>, ConfigError> {
        self.validate()?;

        enum Message {
            Played(GameResult),
            Failed(ConfigError),
        }
        let (tx, rx) = channel();

        let arena = self.clone();
        thread::spawn(move || {
            (0..arena.games)
                .into_par_iter()
                .for_each_with(tx, |tx, index| {
                    let message = match arena.play_game(index) {
                        Ok(result) => Message::Played(result),
                        Err(err) => Message::Failed(err),
                    };
                    // the receiver only hangs up after a failure
                    let _ = tx.send(message);
                });
        });

        let progress = if self.show_progress {
            ProgressBar::new(self.games as u64)
        } else {
            ProgressBar::hidden()
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template("Playing games: {bar:40.cyan/blue} {msg} ~{eta} remaining")
                .progress_chars("█▓▒░  "),
        );

        let mut results = Vec::with_capacity(self.games);
        // the channel closes once every worker has finished
        for message in rx {
            match message {
                Message::Played(result) => results.push(result),
                Message::Failed(err) => return Err(err),
            }
            progress.inc(1);
            progress.set_message(&format!("({} / {})", results.len(), self.games));
        }
        progress.finish();

        results.sort_unstable_by_key(|result| result.index);
        Ok(results)
    }

    pub fn run(&self) -> Result<ArenaSummary, ConfigError> {
        let summary = ArenaSummary::from_results(&self.run_games()?);
        log::info!(
            "arena: {} games, {:?} won {}, {:?} won {}, {} draws",
            summary.games,
            self.controllers[0],
            summary.player_one_wins,
            self.controllers[1],
            summary.player_two_wins,
            summary.draws
        );
        Ok(summary)
    }
}

/// A distinct, reproducible seed for each side of each game
pub fn game_seed(base: u64, index: usize, player: Player) -> u64 {
    base.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(2 * index as u64 + u64::from(player.number()))
}
