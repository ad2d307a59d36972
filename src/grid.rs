//! The playing grid: cell storage, gravity, and line detection
//!
//! Rows are indexed from the physical bottom of the board, so row 0 is where
//! the first piece dropped into an empty column lands.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::error::ConfigError;
use crate::{DEFAULT_COLS, DEFAULT_ROWS, DEFAULT_WIN_LENGTH};

/// Direction vectors as (row step, column step), in scan order:
/// along the row, up the column, and the two diagonals.
pub const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// One of the two sides of a match
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn other(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// The cell value this player's pieces occupy
    pub fn cell(self) -> Cell {
        match self {
            Player::One => Cell::PlayerOne,
            Player::Two => Cell::PlayerTwo,
        }
    }

    /// 1 or 2, for display
    pub fn number(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    PlayerOne,
    PlayerTwo,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::PlayerOne => Some(Player::One),
            Cell::PlayerTwo => Some(Player::Two),
        }
    }

    /// Numeric code used by the persisted grid matrix (0 empty, 1 and 2 for the players)
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::PlayerOne => 1,
            Cell::PlayerTwo => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Cell> {
        match code {
            0 => Some(Cell::Empty),
            1 => Some(Cell::PlayerOne),
            2 => Some(Cell::PlayerTwo),
            _ => None,
        }
    }
}

/// Board dimensions and the number of aligned pieces needed to win
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    pub win_length: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            win_length: DEFAULT_WIN_LENGTH,
        }
    }
}

impl GridConfig {
    pub fn new(rows: usize, cols: usize, win_length: usize) -> Self {
        Self {
            rows,
            cols,
            win_length,
        }
    }

    /// Rejects boards on which the game cannot be played as specified:
    /// both dimensions must hold a full winning line.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyBoard {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.win_length < 2 {
            return Err(ConfigError::WinLengthTooShort(self.win_length));
        }
        if self.win_length > self.rows || self.win_length > self.cols {
            return Err(ConfigError::WinLengthTooLong {
                rows: self.rows,
                cols: self.cols,
                win_length: self.win_length,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    win_length: usize,
    cells: Vec<Cell>, // cells are stored left-to-right, bottom-to-top
    history: Vec<(usize, usize)>,
}

impl Grid {
    /// Creates an empty grid, rejecting invalid dimensions
    pub fn new(config: GridConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rows: config.rows,
            cols: config.cols,
            win_length: config.win_length,
            cells: vec![Cell::Empty; config.rows * config.cols],
            history: Vec::new(),
        })
    }

    pub fn config(&self) -> GridConfig {
        GridConfig::new(self.rows, self.cols, self.win_length)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn win_length(&self) -> usize {
        self.win_length
    }

    /// Placements in the order they were made, as (row, column)
    pub fn history(&self) -> &[(usize, usize)] {
        &self.history
    }

    /// The cell at (row, col); row 0 is the bottom. Panics if out of range.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[self.index(row, col)]
    }

    /// The cell at a signed coordinate, or `None` off the board
    fn cell_at(&self, row: isize, col: isize) -> Option<Cell> {
        if row < 0 || col < 0 || row as usize >= self.rows || col as usize >= self.cols {
            return None;
        }
        Some(self.cells[self.index(row as usize, col as usize)])
    }

    fn index(&self, row: usize, col: usize) -> usize {
        col + self.cols * row
    }

    /// A column accepts a piece while its top cell is empty
    pub fn is_valid(&self, col: usize) -> bool {
        col < self.cols && self.get(self.rows - 1, col).is_empty()
    }

    /// The lowest empty row of a column, scanning up from the bottom
    pub fn next_open_row(&self, col: usize) -> Option<usize> {
        if col >= self.cols {
            return None;
        }
        (0..self.rows).find(|&row| self.get(row, col).is_empty())
    }

    /// Playable columns in ascending order
    pub fn valid_columns(&self) -> Vec<usize> {
        (0..self.cols).filter(|&col| self.is_valid(col)).collect()
    }

    /// Sets a cell and records the placement.
    ///
    /// `row` must come from [`Grid::next_open_row`] for the same column;
    /// placing onto an occupied cell breaks the undo order.
    pub fn place(&mut self, row: usize, col: usize, player: Player) {
        let index = self.index(row, col);
        self.cells[index] = player.cell();
        self.history.push((row, col));
    }

    /// Drops a piece under gravity, returning the row it landed in
    pub fn drop_piece(&mut self, col: usize, player: Player) -> Option<usize> {
        let row = self.next_open_row(col)?;
        self.place(row, col, player);
        Some(row)
    }

    /// Removes the most recent placement
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some((row, col)) => {
                let index = self.index(row, col);
                self.cells[index] = Cell::Empty;
                true
            }
            None => false,
        }
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    pub fn check_win(&self, player: Player) -> bool {
        self.find_winning_run(player).is_some()
    }

    /// Coordinates of the first winning line found for `player`, in the same
    /// scan order as [`Grid::check_win`], or an empty vector
    pub fn winning_cells(&self, player: Player) -> Vec<(usize, usize)> {
        match self.find_winning_run(player) {
            Some((row, col, (d_row, d_col))) => (0..self.win_length as isize)
                .map(|i| {
                    (
                        (row as isize + i * d_row) as usize,
                        (col as isize + i * d_col) as usize,
                    )
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Scans cells in row-major order and directions in [`DIRECTIONS`] order,
    /// returning the start cell and direction of the first complete run
    fn find_winning_run(&self, player: Player) -> Option<(usize, usize, (isize, isize))> {
        let piece = player.cell();
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.get(row, col) != piece {
                    continue;
                }
                for &direction in DIRECTIONS.iter() {
                    if self.run_from(row, col, direction, piece) {
                        return Some((row, col, direction));
                    }
                }
            }
        }
        None
    }

    fn run_from(&self, row: usize, col: usize, (d_row, d_col): (isize, isize), piece: Cell) -> bool {
        (0..self.win_length as isize).all(|i| {
            self.cell_at(row as isize + i * d_row, col as isize + i * d_col) == Some(piece)
        })
    }

    /// An empty grid with the same dimensions
    pub fn empty_like(&self) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            win_length: self.win_length,
            cells: vec![Cell::Empty; self.rows * self.cols],
            history: Vec::new(),
        }
    }

    /// Returns a fully independent copy of the grid
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Rows of cell codes, bottom row first
    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|cell| cell.code()).collect())
            .collect()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..self.rows).rev() {
            let line: String = (0..self.cols)
                .map(|col| match self.get(row, col) {
                    Cell::Empty => '.',
                    Cell::PlayerOne => 'X',
                    Cell::PlayerTwo => 'O',
                })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: usize, cols: usize) -> Grid {
        Grid::new(GridConfig::new(rows, cols, 4)).unwrap()
    }

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(GridConfig::default()).unwrap();
        assert_eq!((grid.rows(), grid.cols(), grid.win_length()), (8, 9, 4));
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                assert_eq!(grid.get(row, col), Cell::Empty);
            }
        }
        assert!(grid.history().is_empty());
    }

    #[test]
    fn test_rejects_invalid_dimensions() {
        assert!(matches!(
            Grid::new(GridConfig::new(3, 9, 4)),
            Err(ConfigError::WinLengthTooLong { .. })
        ));
        assert!(matches!(
            Grid::new(GridConfig::new(0, 7, 4)),
            Err(ConfigError::EmptyBoard { .. })
        ));
        assert!(matches!(
            Grid::new(GridConfig::new(6, 7, 1)),
            Err(ConfigError::WinLengthTooShort(1))
        ));
    }

    #[test]
    fn test_gravity() {
        let mut grid = grid(6, 7);
        assert_eq!(grid.drop_piece(3, Player::One), Some(0));
        assert_eq!(grid.drop_piece(3, Player::Two), Some(1));
        assert_eq!(grid.get(0, 3), Cell::PlayerOne);
        assert_eq!(grid.get(1, 3), Cell::PlayerTwo);
        assert_eq!(grid.next_open_row(3), Some(2));
        assert_eq!(grid.next_open_row(4), Some(0));
    }

    #[test]
    fn test_full_column_is_invalid() {
        let mut grid = grid(6, 7);
        for _ in 0..6 {
            assert!(grid.is_valid(0));
            grid.drop_piece(0, Player::One);
        }
        assert!(!grid.is_valid(0));
        assert_eq!(grid.next_open_row(0), None);
        assert_eq!(grid.drop_piece(0, Player::Two), None);
        assert_eq!(grid.valid_columns(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_out_of_range_column() {
        let grid = grid(6, 7);
        assert!(!grid.is_valid(7));
        assert_eq!(grid.next_open_row(7), None);
    }

    #[test]
    fn test_horizontal_win() {
        let mut grid = grid(6, 7);
        for col in 2..5 {
            grid.drop_piece(col, Player::Two);
        }
        assert!(!grid.check_win(Player::Two));
        grid.drop_piece(5, Player::Two);
        assert!(grid.check_win(Player::Two));
        assert!(!grid.check_win(Player::One));
        assert_eq!(grid.winning_cells(Player::Two), vec![(0, 2), (0, 3), (0, 4), (0, 5)]);
    }

    #[test]
    fn test_vertical_win_cells_bottom_up() {
        let mut grid = grid(6, 7);
        for _ in 0..4 {
            grid.drop_piece(6, Player::One);
        }
        assert_eq!(grid.winning_cells(Player::One), vec![(0, 6), (1, 6), (2, 6), (3, 6)]);
    }

    #[test]
    fn test_rising_diagonal_win() {
        let mut grid = grid(6, 7);
        grid.drop_piece(0, Player::One);

        grid.drop_piece(1, Player::Two);
        grid.drop_piece(1, Player::One);

        grid.drop_piece(2, Player::Two);
        grid.drop_piece(2, Player::Two);
        grid.drop_piece(2, Player::One);

        grid.drop_piece(3, Player::Two);
        grid.drop_piece(3, Player::Two);
        grid.drop_piece(3, Player::Two);
        assert!(!grid.check_win(Player::One));
        grid.drop_piece(3, Player::One);

        assert!(grid.check_win(Player::One));
        assert_eq!(grid.winning_cells(Player::One), vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_falling_diagonal_win() {
        let mut grid = grid(6, 7);
        grid.drop_piece(6, Player::One);

        grid.drop_piece(5, Player::Two);
        grid.drop_piece(5, Player::One);

        grid.drop_piece(4, Player::Two);
        grid.drop_piece(4, Player::Two);
        grid.drop_piece(4, Player::One);

        grid.drop_piece(3, Player::Two);
        grid.drop_piece(3, Player::Two);
        grid.drop_piece(3, Player::Two);
        grid.drop_piece(3, Player::One);

        assert!(grid.check_win(Player::One));
        // the scan meets (0, 6) before (3, 3), walking up and to the left
        assert_eq!(grid.winning_cells(Player::One), vec![(0, 6), (1, 5), (2, 4), (3, 3)]);
    }

    #[test]
    fn test_first_run_in_scan_order_is_reported() {
        // five in a row: the run starting at the leftmost cell wins the tie
        let mut grid = grid(6, 7);
        for col in 1..6 {
            grid.drop_piece(col, Player::One);
        }
        assert_eq!(grid.winning_cells(Player::One), vec![(0, 1), (0, 2), (0, 3), (0, 4)]);
    }

    #[test]
    fn test_win_length_three() {
        let mut grid = Grid::new(GridConfig::new(4, 4, 3)).unwrap();
        grid.drop_piece(0, Player::One);
        grid.drop_piece(1, Player::One);
        assert!(!grid.check_win(Player::One));
        grid.drop_piece(2, Player::One);
        assert!(grid.check_win(Player::One));
    }

    #[test]
    fn test_undo_is_lifo() {
        let mut grid = grid(6, 7);
        grid.drop_piece(2, Player::One);
        grid.drop_piece(2, Player::Two);
        grid.drop_piece(4, Player::One);

        assert!(grid.undo());
        assert_eq!(grid.get(0, 4), Cell::Empty);
        assert!(grid.undo());
        assert_eq!(grid.get(1, 2), Cell::Empty);
        assert_eq!(grid.get(0, 2), Cell::PlayerOne);
        assert!(grid.undo());
        assert!(!grid.undo());
        assert_eq!(grid, self::grid(6, 7));
    }

    #[test]
    fn test_copy_is_independent() {
        let mut original = grid(6, 7);
        original.drop_piece(3, Player::One);
        let snapshot = original.clone();

        let mut copy = original.copy();
        copy.drop_piece(3, Player::Two);
        copy.drop_piece(0, Player::One);
        copy.undo();
        copy.undo();
        copy.undo();

        assert_eq!(original, snapshot);
        assert!(copy.history().is_empty());
    }

    #[test]
    fn test_is_full() {
        let mut grid = grid(4, 4);
        for col in 0..4 {
            for _ in 0..4 {
                assert!(!grid.is_full());
                grid.drop_piece(col, Player::One);
            }
        }
        assert!(grid.is_full());
        assert!(grid.valid_columns().is_empty());
    }

    #[test]
    fn test_display_puts_bottom_row_last() {
        let mut grid = grid(4, 4);
        grid.drop_piece(0, Player::One);
        grid.drop_piece(0, Player::Two);
        assert_eq!(grid.to_string(), "....\n....\nO...\nX...\n");
        assert_eq!(grid.to_matrix()[0], vec![1, 0, 0, 0]);
        assert_eq!(grid.to_matrix()[1], vec![2, 0, 0, 0]);
    }
}
