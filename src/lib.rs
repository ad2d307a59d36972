//! Engine for gravity-based grid games in the style of 'Connect 4'
//!
//! Pieces fall to the lowest free cell of the chosen column; the first player
//! to align `win_length` pieces along a row, column, or diagonal wins. The board
//! size and the win length are configurable.
//!
//! The computer opponent searches a bounded number of plies with minimax and
//! alpha-beta pruning over a simple heuristic, after checking for an immediate
//! win or an immediate block.
//!
//! # Basic Usage
//!
//! ```
//! use dropgrid::{game::Match, grid::{GridConfig, Player}, engine::SearchEngine};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let mut game = Match::new(GridConfig::new(6, 7, 4))?;
//! for column in [0, 1, 0, 1, 0, 1] {
//!     game.play_turn(column);
//! }
//!
//! let mut engine = SearchEngine::new(4, Player::One);
//! assert_eq!(engine.get_move(game.grid()), Some(0));
//!# Ok(())
//!# }
//! ```

use static_assertions::*;

pub mod error;

pub mod grid;

pub mod game;

pub mod engine;

pub mod strategy;

pub mod record;

pub mod config;

pub mod arena;


/// The default number of rows on the board
pub const DEFAULT_ROWS: usize = 8;

/// The default number of columns on the board
pub const DEFAULT_COLS: usize = 9;

/// The default number of aligned pieces needed to win
pub const DEFAULT_WIN_LENGTH: usize = 4;

/// The default number of plies the search engine looks ahead
pub const DEFAULT_DEPTH: u32 = 4;

// the default board must be able to hold a winning line in every direction
const_assert!(DEFAULT_WIN_LENGTH >= 2);
const_assert!(DEFAULT_ROWS >= DEFAULT_WIN_LENGTH);
const_assert!(DEFAULT_COLS >= DEFAULT_WIN_LENGTH);
