use std::io::{self, stdout, Stdout};

use ratatui::{
    backend::{Backend, CrosstermBackend},
    style::Color,
    text::Line,
    widgets::{Block, Paragraph},
    Frame, Terminal, TerminalOptions, Viewport,
};

use crate::{
    display::{CharacterDisplay, COLUMNS, ROWS},
    error::DisplayError,
};

// +- EDDM ----------+
// |LH2471 LAND      |
// |    14:05:09     |
// +-----------------+

/// Draws the 16x2 panel inline in the terminal, for machines without the LCD.
pub struct TerminalDisplay<B: Backend> {
    terminal: Terminal<B>,
    title: String,
    rows: [[char; COLUMNS]; ROWS],
}

impl TerminalDisplay<CrosstermBackend<Stdout>> {
    pub fn new(title: &str) -> Result<Self, DisplayError> {
        let terminal = Terminal::with_options(
            CrosstermBackend::new(stdout()),
            TerminalOptions {
                viewport: Viewport::Inline(ROWS as u16 + 2),
            },
        )?;

        TerminalDisplay::with_terminal(terminal, title)
    }
}

impl<B: Backend> TerminalDisplay<B> {
    pub fn with_terminal(terminal: Terminal<B>, title: &str) -> Result<Self, DisplayError> {
        let mut display = TerminalDisplay {
            terminal,
            title: title.to_owned(),
            rows: [[' '; COLUMNS]; ROWS],
        };
        display.redraw()?;
        Ok(display)
    }

    fn ui(frame: &mut Frame, title: &str, rows: &[[char; COLUMNS]; ROWS]) {
        let lines: Vec<Line> = rows
            .iter()
            .map(|row| Line::from(row.iter().collect::<String>()))
            .collect();

        let block = Block::bordered().title(title.to_owned()).border_style(Color::Cyan);
        let area = frame.size();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn redraw(&mut self) -> io::Result<()> {
        let title = &self.title;
        let rows = &self.rows;
        self.terminal.draw(|frame| Self::ui(frame, title, rows))?;
        Ok(())
    }
}

impl<B: Backend> CharacterDisplay for TerminalDisplay<B> {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.rows = [[' '; COLUMNS]; ROWS];
        self.redraw()?;
        Ok(())
    }

    fn write(&mut self, column: u8, row: u8, text: &str) -> Result<(), DisplayError> {
        let cells = self
            .rows
            .get_mut(row as usize)
            .ok_or(DisplayError::Position { row })?;

        // whatever runs past the last column is off screen
        for (cell, c) in cells.iter_mut().skip(column as usize).zip(text.chars()) {
            *cell = c;
        }

        self.redraw()?;
        Ok(())
    }
}
