//! Archival form of a finished match
//!
//! Columns are written 1-indexed. A match on a board of up to nine columns is
//! written as a plain digit string (`"4435"`); wider boards separate columns
//! with commas (`"10,4,11"`).

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;

use crate::game::{Match, MatchStatus};
use crate::grid::{GridConfig, Player};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub rows: usize,
    pub cols: usize,
    pub win_length: usize,
    /// Columns played, 1-indexed, oldest first
    pub sequence: Vec<usize>,
    /// The same match reflected left to right
    pub mirrored: Vec<usize>,
    pub outcome: MatchStatus,
    /// The winning line as (row, column), row 0 at the bottom; empty for a draw
    pub winning_cells: Vec<(usize, usize)>,
}

impl MatchRecord {
    /// Builds the record of a finished match, or `None` while it is still in progress
    pub fn from_match(game: &Match) -> Option<Self> {
        if !game.is_over() {
            return None;
        }
        let grid = game.grid();
        let sequence: Vec<usize> = game.moves().iter().map(|m| m.column + 1).collect();
        Some(Self {
            rows: grid.rows(),
            cols: grid.cols(),
            win_length: grid.win_length(),
            mirrored: mirror(&sequence, grid.cols())?,
            sequence,
            outcome: game.status(),
            winning_cells: game.winning_cells(),
        })
    }

    /// Replays an archived move string and records the finished match
    pub fn parse<S: AsRef<str>>(moves: S, config: GridConfig) -> Result<Self> {
        let game = replay(moves, config)?;
        Self::from_match(&game).ok_or_else(|| anyhow!("Invalid record, match is not finished"))
    }

    pub fn notation(&self) -> String {
        format_sequence(&self.sequence, self.cols)
    }

    pub fn mirrored_notation(&self) -> String {
        format_sequence(&self.mirrored, self.cols)
    }

    /// True if `other` is this match played on the mirrored board, or the same match
    pub fn is_duplicate_of(&self, other: &MatchRecord) -> bool {
        self.cols == other.cols
            && (self.sequence == other.sequence || self.mirrored == other.sequence)
    }
}

/// Records sort by their archival [`notation`](MatchRecord::notation) as a
/// string, so on boards wider than nine columns `"10,1"` comes before `"2,1"`.
/// Ties fall back to every other field, keeping the order consistent with `==`.
impl Ord for MatchRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.notation()
            .cmp(&other.notation())
            .then_with(|| self.rows.cmp(&other.rows))
            .then_with(|| self.cols.cmp(&other.cols))
            .then_with(|| self.win_length.cmp(&other.win_length))
            .then_with(|| self.sequence.cmp(&other.sequence))
            .then_with(|| self.mirrored.cmp(&other.mirrored))
            .then_with(|| outcome_rank(self.outcome).cmp(&outcome_rank(other.outcome)))
            .then_with(|| self.winning_cells.cmp(&other.winning_cells))
    }
}

fn outcome_rank(outcome: MatchStatus) -> u8 {
    match outcome {
        MatchStatus::InProgress => 0,
        MatchStatus::Won(Player::One) => 1,
        MatchStatus::Won(Player::Two) => 2,
        MatchStatus::Draw => 3,
    }
}

impl PartialOrd for MatchRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reflects 1-indexed columns across the middle of a board `cols` wide, or
/// `None` if any column lies outside `1..=cols`
pub fn mirror(sequence: &[usize], cols: usize) -> Option<Vec<usize>> {
    sequence
        .iter()
        .map(|&column| {
            if (1..=cols).contains(&column) {
                Some(cols + 1 - column)
            } else {
                None
            }
        })
        .collect()
}

fn format_sequence(sequence: &[usize], cols: usize) -> String {
    let columns = sequence.iter().map(|column| column.to_string());
    if cols <= 9 {
        columns.collect()
    } else {
        columns.collect::<Vec<_>>().join(",")
    }
}

/// Plays a 1-indexed move string from the start of a match with player one
/// moving first.
///
/// Fails on unparsable or out-of-range columns, full columns, and moves made
/// after the match has ended.
pub fn replay<S: AsRef<str>>(moves: S, config: GridConfig) -> Result<Match> {
    replay_from(moves, config, Player::One)
}

/// Like [`replay`], with `first_player` making the first move
pub fn replay_from<S: AsRef<str>>(
    moves: S,
    config: GridConfig,
    first_player: Player,
) -> Result<Match> {
    let mut game = Match::with_first_player(config, first_player)?;
    let moves = moves.as_ref().trim();

    let tokens: Vec<&str> = if moves.contains(',') {
        moves.split(',').map(str::trim).collect()
    } else {
        moves
            .char_indices()
            .map(|(i, c)| &moves[i..i + c.len_utf8()])
            .collect()
    };

    for token in tokens.into_iter().filter(|token| !token.is_empty()) {
        let column = match token.parse::<usize>() {
            Ok(column) if (1..=config.cols).contains(&column) => column - 1,
            _ => return Err(anyhow!("could not parse '{}' as a valid move", token)),
        };
        if game.is_over() {
            return Err(anyhow!("Invalid position, game is over"));
        }
        if !game.play_turn(column) {
            return Err(anyhow!("Invalid move, column {} full", column + 1));
        }
    }
    Ok(game)
}
