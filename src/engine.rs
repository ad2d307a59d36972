//! A depth-bounded search agent for choosing moves

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::grid::{Cell, Grid, Player};
use crate::DEFAULT_DEPTH;

/// The score of a position the engine has won
pub const WIN_SCORE: i32 = 100_000;
/// The score of a position the opponent has won
pub const LOSS_SCORE: i32 = -WIN_SCORE;
/// The number of consecutive cells scored together by the heuristic
pub const WINDOW_LENGTH: usize = 4;
/// The bonus for each of the engine's pieces in the middle column
pub const CENTER_BONUS: i32 = 3;

/// Window start directions for the heuristic: along rows, up columns, and the
/// rising and falling diagonals
const WINDOW_DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (-1, 1)];

/// Structured progress reports from a search, delivered to a [`SearchObserver`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchEvent {
    Started {
        piece: Player,
        depth: u32,
        valid_columns: Vec<usize>,
    },
    NoMove,
    ImmediateWin {
        column: usize,
    },
    ImmediateBlock {
        column: usize,
    },
    Pruned {
        remaining_depth: u32,
        column: usize,
        alpha: i32,
        beta: i32,
    },
    Finished {
        column: usize,
        score: i32,
        node_count: usize,
        column_scores: BTreeMap<usize, i32>,
    },
}

/// Receives [`SearchEvent`]s while a search runs
pub trait SearchObserver {
    fn on_event(&self, event: &SearchEvent);
}

impl<F> SearchObserver for F
where
    F: Fn(&SearchEvent),
{
    fn on_event(&self, event: &SearchEvent) {
        self(event)
    }
}

/// Forwards search events to the `log` facade
#[derive(Copy, Clone, Debug, Default)]
pub struct LogObserver;

impl SearchObserver for LogObserver {
    fn on_event(&self, event: &SearchEvent) {
        match event {
            SearchEvent::Started {
                piece,
                depth,
                valid_columns,
            } => log::debug!(
                "{} searching to depth {} over columns {:?}",
                piece,
                depth,
                valid_columns
            ),
            SearchEvent::NoMove => log::debug!("no valid column available"),
            SearchEvent::ImmediateWin { column } => {
                log::debug!("winning move found in column {}", column)
            }
            SearchEvent::ImmediateBlock { column } => {
                log::debug!("blocking opponent threat in column {}", column)
            }
            SearchEvent::Pruned {
                remaining_depth,
                column,
                alpha,
                beta,
            } => log::trace!(
                "pruned after column {} with {} plies left (alpha {}, beta {})",
                column,
                remaining_depth,
                alpha,
                beta
            ),
            SearchEvent::Finished {
                column,
                score,
                node_count,
                column_scores,
            } => log::debug!(
                "chose column {} (score {}, {} nodes), one-ply scores {:?}",
                column,
                score,
                node_count,
                column_scores
            ),
        }
    }
}

/// An agent choosing columns with minimax search and alpha-beta pruning
///
/// # Notes
/// Before searching, the engine plays any column that wins on the spot, and
/// otherwise blocks the first column (in ascending order) where the opponent
/// would win on their next move. Only a single threat is blocked; positions
/// where the opponent has two winning columns are left to the search.
///
/// # Position Scoring
/// A position won by the engine scores [`WIN_SCORE`], one won by the opponent
/// [`LOSS_SCORE`]. Every other leaf is scored by [`evaluate`] from the engine's
/// own point of view, at maximizing and minimizing nodes alike.
#[derive(Clone)]
pub struct SearchEngine {
    depth: u32,
    piece: Player,

    /// The number of nodes searched by the last call to `get_move` (for diagnostics only)
    pub node_count: usize,
    last_scores: BTreeMap<usize, i32>,
    observer: Option<Arc<dyn SearchObserver + Send + Sync>>,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH, Player::Two)
    }
}

impl SearchEngine {
    /// Creates a new `SearchEngine` playing `piece`, looking `depth` plies ahead
    pub fn new(depth: u32, piece: Player) -> Self {
        Self {
            depth,
            piece,
            node_count: 0,
            last_scores: BTreeMap::new(),
            observer: None,
        }
    }

    /// Attaches an observer that receives the engine's [`SearchEvent`]s
    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: SearchObserver + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn set_depth(&mut self, depth: u32) {
        self.depth = depth;
    }

    pub fn piece(&self) -> Player {
        self.piece
    }

    /// Switches the side the engine plays
    pub fn set_piece(&mut self, piece: Player) {
        self.piece = piece;
    }

    pub fn opponent(&self) -> Player {
        self.piece.other()
    }

    /// The one-ply heuristic score of each valid column from the last search.
    /// Empty when the last move came from a shortcut.
    pub fn last_scores(&self) -> &BTreeMap<usize, i32> {
        &self.last_scores
    }

    fn notify<F>(&self, event: F)
    where
        F: FnOnce() -> SearchEvent,
    {
        if let Some(observer) = &self.observer {
            observer.on_event(&event());
        }
    }

    /// Chooses a column for the engine's piece, or `None` if every column is full.
    ///
    /// The grid is never modified; all exploration happens on copies.
    pub fn get_move(&mut self, grid: &Grid) -> Option<usize> {
        self.last_scores.clear();
        self.node_count = 0;

        let valid_columns = grid.valid_columns();
        self.notify(|| SearchEvent::Started {
            piece: self.piece,
            depth: self.depth,
            valid_columns: valid_columns.clone(),
        });

        let first_valid = match valid_columns.first() {
            Some(&column) => column,
            None => {
                self.notify(|| SearchEvent::NoMove);
                return None;
            }
        };

        if let Some(column) = winning_column(grid, self.piece) {
            self.notify(|| SearchEvent::ImmediateWin { column });
            return Some(column);
        }

        if let Some(column) = winning_column(grid, self.opponent()) {
            self.notify(|| SearchEvent::ImmediateBlock { column });
            return Some(column);
        }

        self.last_scores = self.column_scores(grid);

        let (best_move, score) = self.minimax(grid, self.depth, i32::MIN, i32::MAX, true);
        // a zero-depth search names no column
        let column = best_move.unwrap_or(first_valid);

        self.notify(|| SearchEvent::Finished {
            column,
            score,
            node_count: self.node_count,
            column_scores: self.last_scores.clone(),
        });
        Some(column)
    }

    /// The heuristic score after dropping the engine's piece in each valid column
    pub fn column_scores(&self, grid: &Grid) -> BTreeMap<usize, i32> {
        grid.valid_columns()
            .into_iter()
            .filter_map(|column| {
                let mut next = grid.copy();
                next.drop_piece(column, self.piece)?;
                Some((column, evaluate(&next, self.piece)))
            })
            .collect()
    }

    /// Performs game tree search
    ///
    /// Returns the chosen column (`None` at leaves) and the value of `node`
    /// (see [Position Scoring]). Columns are tried in ascending order and ties
    /// keep the earlier column.
    ///
    /// [Position Scoring]: #position-scoring
    pub fn minimax(
        &mut self,
        node: &Grid,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
    ) -> (Option<usize>, i32) {
        self.node_count += 1;

        if node.check_win(self.piece) {
            return (None, WIN_SCORE);
        }
        if node.check_win(self.opponent()) {
            return (None, LOSS_SCORE);
        }
        if depth == 0 || node.is_full() {
            return (None, evaluate(node, self.piece));
        }

        let mover = if maximizing {
            self.piece
        } else {
            self.opponent()
        };
        let mut best_move = None;
        let mut best_value = if maximizing { i32::MIN } else { i32::MAX };

        for column in node.valid_columns() {
            let mut next = node.copy();
            if next.drop_piece(column, mover).is_none() {
                continue;
            }
            let (_, value) = self.minimax(&next, depth - 1, alpha, beta, !maximizing);

            if maximizing {
                if value > best_value {
                    best_value = value;
                    best_move = Some(column);
                }
                alpha = alpha.max(best_value);
            } else {
                if value < best_value {
                    best_value = value;
                    best_move = Some(column);
                }
                beta = beta.min(best_value);
            }

            // the other side already has a better alternative higher up the tree
            if alpha >= beta {
                self.notify(|| SearchEvent::Pruned {
                    remaining_depth: depth,
                    column,
                    alpha,
                    beta,
                });
                break;
            }
        }

        (best_move, best_value)
    }
}

/// The first valid column (ascending) where dropping a piece of `player` wins for them
pub fn winning_column(grid: &Grid, player: Player) -> Option<usize> {
    grid.valid_columns().into_iter().find(|&column| {
        let mut next = grid.copy();
        next.drop_piece(column, player).is_some() && next.check_win(player)
    })
}

/// Scores a single window from `piece`'s point of view
pub fn score_window(window: &[Cell], piece: Player) -> i32 {
    let own = window.iter().filter(|&&cell| cell == piece.cell()).count();
    let opponent = window
        .iter()
        .filter(|&&cell| cell == piece.other().cell())
        .count();
    let empty = window.len() - own - opponent;

    match (own, opponent, empty) {
        (4, 0, 0) => 100,
        (3, 0, 1) => 5,
        (2, 0, 2) => 2,
        (0, 3, 1) => -4,
        _ => 0,
    }
}

/// Heuristic value of a position for `piece`: the sum of [`score_window`] over
/// every run of [`WINDOW_LENGTH`] cells, plus [`CENTER_BONUS`] for each of
/// `piece`'s pieces in the middle column
pub fn evaluate(grid: &Grid, piece: Player) -> i32 {
    let center = grid.cols() / 2;
    let center_count = (0..grid.rows())
        .filter(|&row| grid.get(row, center) == piece.cell())
        .count() as i32;
    let mut score = center_count * CENTER_BONUS;

    let (rows, cols) = (grid.rows() as isize, grid.cols() as isize);
    let span = WINDOW_LENGTH as isize - 1;
    let mut window = [Cell::Empty; WINDOW_LENGTH];

    for &(d_row, d_col) in WINDOW_DIRECTIONS.iter() {
        for row in 0..rows {
            for col in 0..cols {
                let (end_row, end_col) = (row + span * d_row, col + span * d_col);
                if end_row < 0 || end_row >= rows || end_col >= cols {
                    continue;
                }
                for (i, cell) in window.iter_mut().enumerate() {
                    let i = i as isize;
                    *cell = grid.get((row + i * d_row) as usize, (col + i * d_col) as usize);
                }
                score += score_window(&window, piece);
            }
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridConfig;

    use std::sync::Mutex;

    fn grid_from_moves(rows: usize, cols: usize, moves: &[usize]) -> Grid {
        let mut grid = Grid::new(GridConfig::new(rows, cols, 4)).unwrap();
        let mut player = Player::One;
        for &column in moves {
            grid.drop_piece(column, player).unwrap();
            player = player.other();
        }
        grid
    }

    /// Minimax without the alpha-beta cutoff, with the same ordering and tie-breaks
    fn plain_minimax(engine: &SearchEngine, node: &Grid, depth: u32, maximizing: bool) -> (Option<usize>, i32) {
        if node.check_win(engine.piece()) {
            return (None, WIN_SCORE);
        }
        if node.check_win(engine.opponent()) {
            return (None, LOSS_SCORE);
        }
        if depth == 0 || node.is_full() {
            return (None, evaluate(node, engine.piece()));
        }
        let mover = if maximizing { engine.piece() } else { engine.opponent() };
        let mut best = (None, if maximizing { i32::MIN } else { i32::MAX });
        for column in node.valid_columns() {
            let mut next = node.copy();
            next.drop_piece(column, mover);
            let (_, value) = plain_minimax(engine, &next, depth - 1, !maximizing);
            if (maximizing && value > best.1) || (!maximizing && value < best.1) {
                best = (Some(column), value);
            }
        }
        best
    }

    #[test]
    fn test_window_scores() {
        let (e, a, b) = (Cell::Empty, Cell::PlayerOne, Cell::PlayerTwo);
        assert_eq!(score_window(&[a, a, a, a], Player::One), 100);
        assert_eq!(score_window(&[a, e, a, a], Player::One), 5);
        assert_eq!(score_window(&[e, a, a, e], Player::One), 2);
        assert_eq!(score_window(&[b, b, e, b], Player::One), -4);
        assert_eq!(score_window(&[b, b, b, b], Player::One), 0);
        assert_eq!(score_window(&[a, a, a, b], Player::One), 0);
        assert_eq!(score_window(&[a, e, e, e], Player::One), 0);
        assert_eq!(score_window(&[b, b, e, b], Player::Two), 5);
    }

    #[test]
    fn test_evaluate_empty_board() {
        let grid = grid_from_moves(6, 7, &[]);
        assert_eq!(evaluate(&grid, Player::One), 0);
        assert_eq!(evaluate(&grid, Player::Two), 0);
    }

    #[test]
    fn test_evaluate_center_and_pairs() {
        let mut grid = grid_from_moves(6, 7, &[]);
        grid.drop_piece(3, Player::One);
        assert_eq!(evaluate(&grid, Player::One), 3);

        grid.drop_piece(2, Player::One);
        // three horizontal windows hold both pieces and two empty cells
        assert_eq!(evaluate(&grid, Player::One), 3 + 3 * 2);
    }

    #[test]
    fn test_evaluate_opponent_threat() {
        let mut grid = grid_from_moves(6, 7, &[]);
        for column in 0..3 {
            grid.drop_piece(column, Player::Two);
        }
        assert_eq!(evaluate(&grid, Player::One), -4);
    }

    #[test]
    fn test_evaluate_is_not_symmetric() {
        let mut grid = grid_from_moves(6, 7, &[]);
        for column in 0..3 {
            grid.drop_piece(column, Player::Two);
        }
        // the owner of the three sees +5 and a pair bonus, not the negation of -4
        assert_eq!(evaluate(&grid, Player::Two), 5 + 2);
    }

    #[test]
    fn test_immediate_win_at_depth_zero() {
        let grid = grid_from_moves(6, 7, &[0, 1, 0, 1, 0, 6]);
        let mut engine = SearchEngine::new(0, Player::One);
        assert_eq!(engine.get_move(&grid), Some(0));
        assert!(engine.last_scores().is_empty());
        assert_eq!(engine.node_count, 0);
    }

    #[test]
    fn test_immediate_win_beats_block() {
        // both sides have three stacked; the engine (player one) is to move
        let grid = grid_from_moves(6, 7, &[5, 1, 5, 1, 5, 1]);
        let mut engine = SearchEngine::new(4, Player::One);
        assert_eq!(engine.get_move(&grid), Some(5));
    }

    #[test]
    fn test_blocks_first_threat_column() {
        let mut grid = grid_from_moves(6, 7, &[]);
        for column in 1..4 {
            grid.drop_piece(column, Player::Two);
        }
        grid.drop_piece(6, Player::One);
        let mut engine = SearchEngine::new(4, Player::One);
        // columns 0 and 4 both complete the line; the lower index is blocked
        assert_eq!(engine.get_move(&grid), Some(0));
    }

    #[test]
    fn test_no_move_on_full_board() {
        let mut grid = grid_from_moves(4, 4, &[]);
        let pattern = [
            [Player::One, Player::One, Player::Two, Player::Two],
            [Player::Two, Player::Two, Player::One, Player::One],
            [Player::One, Player::One, Player::Two, Player::Two],
            [Player::Two, Player::Two, Player::One, Player::One],
        ];
        for row in pattern.iter() {
            for (column, &player) in row.iter().enumerate() {
                grid.drop_piece(column, player);
            }
        }
        assert!(grid.is_full());
        let mut engine = SearchEngine::new(3, Player::One);
        assert_eq!(engine.get_move(&grid), None);
    }

    #[test]
    fn test_depth_zero_falls_back_to_first_valid_column() {
        let mut grid = grid_from_moves(6, 7, &[]);
        for i in 0..6 {
            let player = if i % 2 == 0 { Player::One } else { Player::Two };
            grid.drop_piece(0, player);
        }
        let mut engine = SearchEngine::new(0, Player::Two);
        assert_eq!(engine.get_move(&grid), Some(1));
    }

    #[test]
    fn test_depth_one_prefers_center() {
        let mut engine = SearchEngine::new(1, Player::One);
        assert_eq!(engine.get_move(&grid_from_moves(6, 7, &[])), Some(3));
        assert_eq!(engine.get_move(&grid_from_moves(8, 9, &[])), Some(4));
        assert_eq!(engine.last_scores().len(), 9);
        assert_eq!(engine.last_scores()[&4], 3);
        assert_eq!(engine.last_scores()[&0], 0);
    }

    #[test]
    fn test_get_move_leaves_grid_untouched() {
        let grid = grid_from_moves(6, 7, &[3, 3, 2, 4, 4]);
        let before = grid.clone();
        let mut engine = SearchEngine::new(4, Player::Two);
        let column = engine.get_move(&grid).unwrap();
        assert_eq!(grid, before);
        assert!(grid.valid_columns().contains(&column));
        assert!(engine.node_count > 0);
    }

    #[test]
    fn test_pruning_matches_plain_minimax() {
        let positions: [&[usize]; 5] = [
            &[],
            &[3],
            &[3, 3, 2, 4],
            &[0, 6, 1, 5, 3, 3, 4],
            &[3, 2, 3, 4, 4, 2, 5, 5, 1],
        ];
        for moves in positions.iter() {
            let grid = grid_from_moves(6, 7, moves);
            let piece = if moves.len() % 2 == 0 { Player::One } else { Player::Two };
            for depth in 1..=4 {
                let mut engine = SearchEngine::new(depth, piece);
                let pruned = engine.minimax(&grid, depth, i32::MIN, i32::MAX, true);
                let plain = plain_minimax(&engine, &grid, depth, true);
                assert_eq!(pruned, plain, "position {:?} at depth {}", moves, depth);
            }
        }
    }

    #[test]
    fn test_minimax_scores_finished_positions() {
        let grid = grid_from_moves(6, 7, &[0, 1, 0, 1, 0, 1, 0]);
        let mut engine = SearchEngine::new(3, Player::One);
        assert_eq!(engine.minimax(&grid, 3, i32::MIN, i32::MAX, false), (None, WIN_SCORE));
        engine.set_piece(Player::Two);
        assert_eq!(engine.minimax(&grid, 3, i32::MIN, i32::MAX, true), (None, LOSS_SCORE));
    }

    #[test]
    fn test_observer_receives_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let mut engine = SearchEngine::new(2, Player::One).with_observer(move |event: &SearchEvent| {
            sink.lock().unwrap().push(event.clone());
        });

        engine.get_move(&grid_from_moves(6, 7, &[3, 3]));
        let events = events.lock().unwrap();
        assert!(matches!(events.first(), Some(SearchEvent::Started { depth: 2, .. })));
        match events.last() {
            Some(SearchEvent::Finished { column_scores, .. }) => assert_eq!(column_scores.len(), 7),
            other => panic!("unexpected last event {:?}", other),
        }
    }

    #[test]
    fn test_observer_sees_block() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let mut engine = SearchEngine::new(2, Player::Two).with_observer(move |event: &SearchEvent| {
            sink.lock().unwrap().push(event.clone());
        });

        engine.get_move(&grid_from_moves(6, 7, &[2, 6, 3, 6, 4]));
        let events = events.lock().unwrap();
        assert_eq!(events.last(), Some(&SearchEvent::ImmediateBlock { column: 1 }));
    }
}
