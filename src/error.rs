use std::path::PathBuf;

use crate::game::MatchStatus;
use crate::grid::Player;

/// Errors raised while building a grid or loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("board must have at least one row and one column (got {rows}x{cols})")]
    EmptyBoard { rows: usize, cols: usize },

    #[error("win length must be at least 2 (got {0})")]
    WinLengthTooShort(usize),

    #[error("win length {win_length} does not fit a {rows}x{cols} board")]
    WinLengthTooLong {
        rows: usize,
        cols: usize,
        win_length: usize,
    },

    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors raised when rebuilding a match from a persisted snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("invalid board configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("grid has {found} rows, expected {expected}")]
    RowCount { expected: usize, found: usize },

    #[error("grid row {row} has {found} cells, expected {expected}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown cell code {code} at ({row}, {col})")]
    CellCode { row: usize, col: usize, code: u8 },

    #[error("placement history does not match the grid contents")]
    HistoryMismatch,

    #[error("move log does not match the placement history")]
    MoveLogMismatch,

    #[error("recorded status {recorded:?} disagrees with the grid ({actual:?})")]
    StatusMismatch {
        recorded: MatchStatus,
        actual: MatchStatus,
    },

    #[error("recorded active player {recorded} should be {expected}")]
    TurnMismatch { recorded: Player, expected: Player },

    #[error("move {index} was made by {recorded}, but it was {expected}'s turn")]
    OutOfTurn {
        index: usize,
        recorded: Player,
        expected: Player,
    },

    #[error("move {index} was made after the match had ended")]
    MoveAfterEnd { index: usize },
}
