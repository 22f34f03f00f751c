//! Turns a child's raw output into frame text.
//!
//! Bytes are decoded as they arrive and appended to a pending [TextBuffer]. A line made of
//! nothing but a form feed commits the pending text as a finished frame without waiting for
//! the child to exit; end of stream commits whatever is left.

use crate::text_buffer::TextBuffer;
use crate::vte_actions::{VteAction, VteActionParser};

/// The control byte that, alone on a line, ends a frame early.
pub const SENTINEL: u8 = 0x0c;

const TAB_STOP: usize = 8;

pub struct TextStream {
    parser: VteActionParser,
    pending: TextBuffer,
    column: usize,
    at_line_start: bool,
    sentinel_seen: bool,
    received: bool,
    committed: bool,
}

impl Default for TextStream {
    fn default() -> Self {
        Self::new()
    }
}

impl TextStream {
    pub fn new() -> Self {
        Self {
            parser: VteActionParser::new(),
            pending: TextBuffer::new(),
            column: 0,
            at_line_start: true,
            sentinel_seen: false,
            received: false,
            committed: false,
        }
    }

    /// Forgets everything, ready for a fresh child.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Consumes a chunk of output. Returns the most recent frame completed by a sentinel
    /// line within this chunk; earlier frames in the same chunk are superseded.
    pub fn feed(&mut self, bytes: &[u8]) -> Option<TextBuffer> {
        let mut ready = None;
        for action in self.parser.parse_bytes(bytes) {
            match action {
                VteAction::Text(c) => {
                    self.sentinel_seen = false;
                    self.pending.push(c);
                    self.advance_column(1);
                }
                VteAction::Tab => {
                    self.sentinel_seen = false;
                    let spaces = TAB_STOP - self.column % TAB_STOP;
                    for _ in 0..spaces {
                        self.pending.push(' ');
                    }
                    self.advance_column(spaces);
                }
                VteAction::LineFeed => {
                    if self.sentinel_seen {
                        ready = Some(self.commit());
                    } else {
                        self.pending.push('\n');
                        self.received = true;
                    }
                    self.column = 0;
                    self.at_line_start = true;
                }
                VteAction::FormFeed => {
                    if self.at_line_start {
                        self.sentinel_seen = true;
                    }
                }
                VteAction::CarriageReturn => {}
            }
        }
        ready
    }

    /// End of stream. Returns the final frame, if there is one to show.
    pub fn finish(&mut self) -> Option<TextBuffer> {
        let frame = if self.sentinel_seen || self.received || !self.committed {
            Some(self.commit())
        } else {
            None
        };
        self.reset();
        frame
    }

    fn advance_column(&mut self, columns: usize) {
        self.column += columns;
        self.at_line_start = false;
        self.received = true;
    }

    fn commit(&mut self) -> TextBuffer {
        self.sentinel_seen = false;
        self.received = false;
        self.committed = true;
        self.pending.take()
    }
}
