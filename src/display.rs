use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::io::{stdout, Write};

use dropgrid::game::Match;
use dropgrid::grid::Cell;

/// Column labels, one character per column; wide boards wrap the label at 10
fn column_labels(cols: usize) -> String {
    (1..=cols).map(|x| (x % 10).to_string()).collect()
}

pub fn display(game: &Match) -> Result<()> {
    let grid = game.grid();
    let winning = game.winning_cells();
    let mut stdout = stdout();

    stdout.queue(PrintStyledContent(style(column_labels(grid.cols()) + "\n")))?;
    for _ in 0..grid.rows() {
        stdout.queue(PrintStyledContent(style("\n")))?;
    }
    stdout.flush()?;

    let (origin_x, origin_y) = crossterm::cursor::position()?;
    // the bottom row sits on the line above the cursor
    let origin_y = origin_y.saturating_sub(1);

    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let background = if winning.contains(&(row, col)) {
                Color::DarkGreen
            } else {
                Color::DarkBlue
            };
            stdout
                .queue(MoveTo(
                    origin_x + col as u16,
                    origin_y.saturating_sub(row as u16),
                ))?
                .queue(PrintStyledContent(
                    style("O")
                        .attribute(Attribute::Bold)
                        .on(background)
                        .with(match grid.get(row, col) {
                            Cell::PlayerOne => Color::Red,
                            Cell::PlayerTwo => Color::Yellow,
                            Cell::Empty => background,
                        }),
                ))?;
        }
    }
    stdout
        .queue(MoveTo(origin_x + grid.cols() as u16, origin_y))?
        .queue(PrintStyledContent(style("\n")))?;
    stdout.flush()?;
    Ok(())
}
