use crate::text_stream::SENTINEL;
use crate::vte_actions::VteAction::{CarriageReturn, FormFeed, LineFeed, Tab, Text};
use vte::{Params, Parser, Perform};

/// What a command's output means once terminal control sequences are stripped away.
/// Anything that would move the cursor or change colors is dropped, the overlay only
/// shows plain lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VteAction {
    Text(char),
    Tab,
    LineFeed,
    CarriageReturn,
    FormFeed,
}

/// A wrapper over [Parser] and [Perform] which takes bytes in and exposes the semantic
/// actions. Parser state survives between calls, so escape sequences and UTF-8 characters
/// split across reads decode correctly.
pub struct VteActionParser {
    parser: Parser,
}

impl Default for VteActionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VteActionParser {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Vec<VteAction> {
        let mut performer = Performer::new();
        for byte in bytes {
            self.parser.advance(&mut performer, *byte)
        }
        performer.actions
    }
}

// Private struct to hide this implementation detail
struct Performer {
    actions: Vec<VteAction>,
}

impl Performer {
    fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }
}

impl Perform for Performer {
    fn print(&mut self, c: char) {
        self.actions.push(Text(c))
    }

    fn execute(&mut self, byte: u8) {
        let action = match byte {
            0x09 => Tab,
            0x0a => LineFeed,
            SENTINEL => FormFeed,
            0x0d => CarriageReturn,
            _ => return,
        };
        self.actions.push(action);
    }

    // SGR and cursor movement make no sense for a line list.
    fn csi_dispatch(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, _c: char) {}
}

#[cfg(test)]
mod test {
    use super::VteAction::*;
    use super::*;

    #[test]
    fn plain_lines() {
        let actions = VteActionParser::new().parse_bytes(b"ab\n");
        assert_eq!(actions, vec![Text('a'), Text('b'), LineFeed]);
    }

    #[test]
    fn strips_color_sequences() {
        let actions = VteActionParser::new().parse_bytes(b"\x1b[1;31mX\x1b[0m\r\n");
        assert_eq!(actions, vec![Text('X'), CarriageReturn, LineFeed]);
    }

    #[test]
    fn form_feed_and_tab() {
        let actions = VteActionParser::new().parse_bytes(b"\x0c\n\t");
        assert_eq!(actions, vec![FormFeed, LineFeed, Tab]);
    }

    #[test]
    fn utf8_split_across_reads() {
        let mut parser = VteActionParser::new();
        let bytes = "é".as_bytes();
        assert_eq!(parser.parse_bytes(&bytes[..1]), vec![]);
        assert_eq!(parser.parse_bytes(&bytes[1..]), vec![Text('é')]);
    }

    #[test]
    fn ignores_other_controls() {
        let actions = VteActionParser::new().parse_bytes(b"\x07a\x08");
        assert_eq!(actions, vec![Text('a')]);
    }
}
