//! Turn sequencing for a single match
//!
//! A [`Match`] owns the authoritative [`Grid`] and is the only way the
//! surrounding application mutates it.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SnapshotError};
use crate::grid::{Cell, Grid, GridConfig, Player};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum MatchStatus {
    InProgress,
    Won(Player),
    Draw,
}

impl MatchStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, MatchStatus::InProgress)
    }

    pub fn winner(&self) -> Option<Player> {
        match self {
            MatchStatus::Won(player) => Some(*player),
            _ => None,
        }
    }
}

/// One entry of the move log
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Move {
    pub column: usize,
    pub player: Player,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Snapshot", into = "Snapshot")]
pub struct Match {
    grid: Grid,
    first_player: Player,
    active_player: Player,
    status: MatchStatus,
    moves: Vec<Move>,
}

impl Match {
    /// Starts a match on an empty grid with player one to move
    pub fn new(config: GridConfig) -> Result<Self, ConfigError> {
        Self::with_first_player(config, Player::One)
    }

    pub fn with_first_player(config: GridConfig, first_player: Player) -> Result<Self, ConfigError> {
        Ok(Self {
            grid: Grid::new(config)?,
            first_player,
            active_player: first_player,
            status: MatchStatus::InProgress,
            moves: Vec::new(),
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn active_player(&self) -> Player {
        self.active_player
    }

    pub fn first_player(&self) -> Player {
        self.first_player
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn winner(&self) -> Option<Player> {
        self.status.winner()
    }

    pub fn is_over(&self) -> bool {
        self.status.is_finished()
    }

    /// The move log, oldest first
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    /// Playable columns in ascending order, or none once the match is over
    pub fn valid_moves(&self) -> Vec<usize> {
        if self.is_over() {
            return Vec::new();
        }
        self.grid.valid_columns()
    }

    /// The winning line, if the match was won
    pub fn winning_cells(&self) -> Vec<(usize, usize)> {
        match self.status.winner() {
            Some(player) => self.grid.winning_cells(player),
            None => Vec::new(),
        }
    }

    /// Drops the active player's piece in `column`.
    ///
    /// Returns false without changing anything if the match is over or the
    /// column cannot take a piece.
    pub fn play_turn(&mut self, column: usize) -> bool {
        if self.is_over() || !self.grid.is_valid(column) {
            return false;
        }
        let row = match self.grid.next_open_row(column) {
            Some(row) => row,
            None => return false,
        };

        let player = self.active_player;
        self.grid.place(row, column, player);
        self.moves.push(Move { column, player });

        if self.grid.check_win(player) {
            self.status = MatchStatus::Won(player);
        } else if self.grid.is_full() {
            self.status = MatchStatus::Draw;
        } else {
            self.active_player = player.other();
        }
        true
    }

    /// Takes back the last move, handing the turn back to whoever made it
    pub fn undo(&mut self) -> bool {
        let last = match self.moves.pop() {
            Some(last) => last,
            None => return false,
        };
        self.grid.undo();
        self.active_player = last.player;
        self.status = MatchStatus::InProgress;
        true
    }

    /// Clears the board for a new match with the same dimensions and first player
    pub fn reset(&mut self) {
        self.grid = self.grid.empty_like();
        self.active_player = self.first_player;
        self.status = MatchStatus::InProgress;
        self.moves.clear();
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from(self.clone())
    }

    /// Rebuilds a match from a snapshot, replaying the placement history and
    /// checking it against the persisted grid
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, SnapshotError> {
        let config = GridConfig::new(snapshot.rows, snapshot.cols, snapshot.win_length);
        let mut grid = Grid::new(config)?;

        let cells = decode_matrix(&snapshot.grid, &config)?;

        if snapshot.history.len() != snapshot.moves.len() {
            return Err(SnapshotError::MoveLogMismatch);
        }
        let mut expected = snapshot.first_player;
        let mut ended = false;
        for (index, (&(row, col), logged)) in
            snapshot.history.iter().zip(snapshot.moves.iter()).enumerate()
        {
            if logged.column != col {
                return Err(SnapshotError::MoveLogMismatch);
            }
            if ended {
                return Err(SnapshotError::MoveAfterEnd { index });
            }
            if logged.player != expected {
                return Err(SnapshotError::OutOfTurn {
                    index,
                    recorded: logged.player,
                    expected,
                });
            }
            if grid.next_open_row(col) != Some(row) {
                return Err(SnapshotError::HistoryMismatch);
            }
            if cells[row][col].player() != Some(logged.player) {
                return Err(SnapshotError::HistoryMismatch);
            }
            grid.place(row, col, logged.player);
            ended = grid.check_win(logged.player) || grid.is_full();
            expected = logged.player.other();
        }
        let replayed_matches = (0..config.rows)
            .all(|row| (0..config.cols).all(|col| grid.get(row, col) == cells[row][col]));
        if !replayed_matches {
            return Err(SnapshotError::HistoryMismatch);
        }

        let (status, expected_active) = match snapshot.moves.last() {
            None => (MatchStatus::InProgress, snapshot.first_player),
            Some(last) if grid.check_win(last.player) => (MatchStatus::Won(last.player), last.player),
            Some(last) if grid.is_full() => (MatchStatus::Draw, last.player),
            Some(last) => (MatchStatus::InProgress, last.player.other()),
        };
        if status != snapshot.status {
            return Err(SnapshotError::StatusMismatch {
                recorded: snapshot.status,
                actual: status,
            });
        }
        if expected_active != snapshot.active_player {
            return Err(SnapshotError::TurnMismatch {
                recorded: snapshot.active_player,
                expected: expected_active,
            });
        }

        Ok(Self {
            grid,
            first_player: snapshot.first_player,
            active_player: snapshot.active_player,
            status,
            moves: snapshot.moves,
        })
    }
}

fn decode_matrix(matrix: &[Vec<u8>], config: &GridConfig) -> Result<Vec<Vec<Cell>>, SnapshotError> {
    if matrix.len() != config.rows {
        return Err(SnapshotError::RowCount {
            expected: config.rows,
            found: matrix.len(),
        });
    }
    matrix
        .iter()
        .enumerate()
        .map(|(row, codes)| {
            if codes.len() != config.cols {
                return Err(SnapshotError::ColumnCount {
                    row,
                    expected: config.cols,
                    found: codes.len(),
                });
            }
            codes
                .iter()
                .enumerate()
                .map(|(col, &code)| {
                    Cell::from_code(code).ok_or(SnapshotError::CellCode { row, col, code })
                })
                .collect()
        })
        .collect()
}

/// The persisted form of a [`Match`]
///
/// `grid` holds cell codes (see [`Cell::code`]) with the bottom row first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub rows: usize,
    pub cols: usize,
    pub win_length: usize,
    pub grid: Vec<Vec<u8>>,
    pub history: Vec<(usize, usize)>,
    pub moves: Vec<Move>,
    pub first_player: Player,
    pub active_player: Player,
    pub status: MatchStatus,
}

impl From<Match> for Snapshot {
    fn from(game: Match) -> Self {
        Self {
            rows: game.grid.rows(),
            cols: game.grid.cols(),
            win_length: game.grid.win_length(),
            grid: game.grid.to_matrix(),
            history: game.grid.history().to_vec(),
            moves: game.moves,
            first_player: game.first_player,
            active_player: game.active_player,
            status: game.status,
        }
    }
}

impl TryFrom<Snapshot> for Match {
    type Error = SnapshotError;

    fn try_from(snapshot: Snapshot) -> Result<Self, Self::Error> {
        Match::from_snapshot(snapshot)
    }
}
