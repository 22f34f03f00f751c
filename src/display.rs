//! Capabilities the engine needs from the window system. The engine only ever talks to
//! these traits; [crate::terminal] provides the implementation the binary uses.

use crate::layout::{Rect, TextMetrics};
use anyhow::Result;
use crossterm::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    pub fg: Color,
    pub bg: Color,
}

/// Colors for ordinary text and for the word under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    pub normal: ColorPair,
    pub hover: ColorPair,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            normal: ColorPair {
                fg: Color::Black,
                bg: Color::Rgb {
                    r: 0xcc,
                    g: 0xcc,
                    b: 0xcc,
                },
            },
            hover: ColorPair {
                fg: Color::White,
                bg: Color::Black,
            },
        }
    }
}

/// Draws into the backing drawable. Coordinates are relative to the window.
pub trait Renderer: TextMetrics {
    /// Replaces the backing drawable with one of the given size.
    fn allocate(&mut self, width: u32, height: u32) -> Result<()>;

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draws `text` with its top-left corner at `(x, y)`.
    fn draw_text(&mut self, x: i32, y: i32, text: &str, color: Color);
}

/// The window itself.
pub trait Display {
    fn screen_size(&self) -> (u32, u32);

    fn map(&mut self) -> Result<()>;

    fn unmap(&mut self) -> Result<()>;

    /// Raises the window above its siblings, or lowers it below them.
    fn restack(&mut self, on_top: bool) -> Result<()>;

    fn move_resize(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<()>;

    /// Copies the backing drawable onto the window and flushes the connection.
    fn present(&mut self, width: u32, height: u32) -> Result<()>;
}
