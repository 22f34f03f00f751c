//! A terminal standing in for the screen: one character cell is one pixel, and the window
//! is a rectangle of cells painted on the alternate screen.

use crate::display::{Display, Renderer};
use crate::layout::{Rect, TextMetrics};
use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
};
use crossterm::style::{Color, Colors, Print, ResetColor, SetColors};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use log::warn;
use std::io::{Stdout, Write};
use std::ops::Range;
use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    /// `None` for the right half of a wide character.
    symbol: Option<char>,
    fg: Color,
    bg: Color,
}

const BLANK: Cell = Cell {
    symbol: Some(' '),
    fg: Color::Reset,
    bg: Color::Reset,
};

/// The backing drawable.
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![BLANK; width as usize * height as usize],
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok().filter(|x| *x < self.width)?;
        let y = u32::try_from(y).ok().filter(|y| *y < self.height)?;
        Some(y as usize * self.width as usize + x as usize)
    }

    fn cell(&self, x: u32, y: u32) -> Cell {
        let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) else {
            return BLANK;
        };
        self.index(x, y).map(|i| self.cells[i]).unwrap_or(BLANK)
    }

    pub fn fill(&mut self, rect: Rect, color: Color) {
        let rows = visible(rect.y, rect.height, self.height);
        let columns = visible(rect.x, rect.width, self.width);
        for y in rows {
            for x in columns.clone() {
                if let Some(i) = self.index(x, y) {
                    self.cells[i] = Cell {
                        symbol: Some(' '),
                        fg: self.cells[i].fg,
                        bg: color,
                    };
                }
            }
        }
    }

    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, fg: Color) {
        let mut x = x;
        for c in text.chars() {
            let width = match c.width() {
                Some(w) if w > 0 => w as i32,
                _ => continue,
            };
            if let Some(i) = self.index(x, y) {
                self.cells[i].symbol = Some(c);
                self.cells[i].fg = fg;
            }
            for covered in 1..width {
                if let Some(i) = self.index(x.saturating_add(covered), y) {
                    self.cells[i].symbol = None;
                    self.cells[i].fg = fg;
                }
            }
            x = x.saturating_add(width);
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: u32) -> String {
        (0..self.width)
            .filter_map(|x| self.cell(x, y).symbol)
            .collect()
    }
}

pub struct Terminal<W: Write> {
    out: W,
    canvas: Canvas,
    screen: (u16, u16),
    window: Rect,
    mapped: bool,
    owns_tty: bool,
}

impl Terminal<Stdout> {
    /// Takes over the controlling terminal: raw mode, alternate screen, mouse reporting.
    /// Everything is restored on drop.
    pub fn open() -> Result<Self> {
        let screen = crossterm::terminal::size().context("failed to query terminal size")?;
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut terminal = Terminal::new(std::io::stdout(), screen);
        terminal.owns_tty = true;
        execute!(
            terminal.out,
            EnterAlternateScreen,
            Hide,
            EnableMouseCapture,
            EnableFocusChange,
            Clear(ClearType::All)
        )
        .context("failed to set up terminal")?;
        Ok(terminal)
    }
}

impl<W: Write> Terminal<W> {
    /// A terminal that writes to `out` without touching any tty modes.
    pub fn new(out: W, screen: (u16, u16)) -> Self {
        Self {
            out,
            canvas: Canvas::default(),
            screen,
            window: Rect::default(),
            mapped: false,
            owns_tty: false,
        }
    }

    /// Cells are drawn in whatever font the terminal itself uses.
    pub fn set_font(&self, font: &str) {
        warn!("terminal cells use the terminal's own font, ignoring {font:?}");
    }

    /// Records the new screen size. Whatever was on screen is wiped, the window is
    /// painted again on the next present.
    pub fn set_screen_size(&mut self, columns: u16, rows: u16) -> Result<()> {
        self.screen = (columns, rows);
        queue!(self.out, ResetColor, Clear(ClearType::All))?;
        Ok(())
    }

    /// Translates a screen cell into window coordinates, if it lies on the shown window.
    pub fn window_point(&self, column: u16, row: u16) -> Option<(i32, i32)> {
        if !self.mapped || !self.window.contains(i32::from(column), i32::from(row)) {
            return None;
        }
        Some((
            i32::from(column) - self.window.x,
            i32::from(row) - self.window.y,
        ))
    }

    fn visible_columns(&self, x: i32, width: u32) -> Range<i32> {
        visible(x, width, u32::from(self.screen.0))
    }

    fn visible_rows(&self, y: i32, height: u32) -> Range<i32> {
        visible(y, height, u32::from(self.screen.1))
    }

    fn erase(&mut self, rect: Rect) -> Result<()> {
        let columns = self.visible_columns(rect.x, rect.width);
        if columns.is_empty() {
            return Ok(());
        }
        let blank = " ".repeat(columns.len());
        queue!(self.out, ResetColor)?;
        for y in self.visible_rows(rect.y, rect.height) {
            queue!(self.out, MoveTo(columns.start as u16, y as u16), Print(&blank))?;
        }
        Ok(())
    }
}

/// The part of `start..start + len` that lies within `0..limit`.
fn visible(start: i32, len: u32, limit: u32) -> Range<i32> {
    let end = (i64::from(start) + i64::from(len))
        .min(i64::from(limit))
        .min(i64::from(i32::MAX));
    start.max(0)..end as i32
}

impl<W: Write> Drop for Terminal<W> {
    fn drop(&mut self) {
        if self.owns_tty {
            let _ = execute!(
                self.out,
                ResetColor,
                DisableFocusChange,
                DisableMouseCapture,
                Show,
                LeaveAlternateScreen
            );
            let _ = disable_raw_mode();
        }
    }
}

impl<W: Write> TextMetrics for Terminal<W> {
    fn text_width(&self, text: &str) -> u32 {
        text.chars().filter_map(|c| c.width()).sum::<usize>() as u32
    }

    fn line_height(&self) -> u32 {
        1
    }
}

impl<W: Write> Renderer for Terminal<W> {
    fn allocate(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas = Canvas::new(width, height);
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.canvas.fill(rect, color);
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, color: Color) {
        self.canvas.draw_text(x, y, text, color);
    }
}

impl<W: Write> Display for Terminal<W> {
    fn screen_size(&self) -> (u32, u32) {
        (u32::from(self.screen.0), u32::from(self.screen.1))
    }

    fn map(&mut self) -> Result<()> {
        self.mapped = true;
        Ok(())
    }

    fn unmap(&mut self) -> Result<()> {
        if self.mapped {
            self.erase(self.window)?;
            self.out.flush()?;
            self.mapped = false;
        }
        Ok(())
    }

    // A terminal has a single layer.
    fn restack(&mut self, _on_top: bool) -> Result<()> {
        Ok(())
    }

    fn move_resize(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        let next = Rect::new(x, y, width, height);
        if self.mapped && next != self.window {
            self.erase(self.window)?;
        }
        self.window = next;
        Ok(())
    }

    fn present(&mut self, width: u32, height: u32) -> Result<()> {
        if !self.mapped {
            return Ok(());
        }
        let origin = (self.window.x, self.window.y);
        let columns = self.visible_columns(origin.0, width);
        let mut colors = None;
        for row in self.visible_rows(origin.1, height) {
            // rows and columns lie on screen at or after the origin
            let y = (i64::from(row) - i64::from(origin.1)) as u32;
            let mut positioned = false;
            for column in columns.clone() {
                let x = (i64::from(column) - i64::from(origin.0)) as u32;
                let cell = self.canvas.cell(x, y);
                let Some(symbol) = cell.symbol else {
                    continue;
                };
                let cell_width = symbol.width().unwrap_or(1).max(1) as i32;
                if column + cell_width > columns.end {
                    positioned = false;
                    continue;
                }
                if !positioned {
                    queue!(self.out, MoveTo(column as u16, row as u16))?;
                    positioned = true;
                }
                if colors != Some((cell.fg, cell.bg)) {
                    queue!(self.out, SetColors(Colors::new(cell.fg, cell.bg)))?;
                    colors = Some((cell.fg, cell.bg));
                }
                queue!(self.out, Print(symbol))?;
            }
        }
        queue!(self.out, ResetColor)?;
        self.out.flush().context("failed to write to terminal")
    }
}
