use crate::tokenizer::Word;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && i64::from(x) < i64::from(self.x) + i64::from(self.width)
            && i64::from(y) < i64::from(self.y) + i64::from(self.height)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Alignment {
    #[default]
    #[value(alias = "l")]
    Left,
    #[value(alias = "r")]
    Right,
    #[value(alias = "c")]
    Center,
}

/// Measurements a renderer provides for its font.
pub trait TextMetrics {
    /// Horizontal advance of `text` in pixels.
    fn text_width(&self, text: &str) -> u32;

    /// Ascent plus descent; every line is this tall.
    fn line_height(&self) -> u32;
}

/// Size of the window for the current frame, border included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFrame {
    pub width: u32,
    pub height: u32,
    pub hidden: bool,
}

impl WindowFrame {
    pub const HIDDEN: WindowFrame = WindowFrame {
        width: 0,
        height: 0,
        hidden: true,
    };

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for WindowFrame {
    fn default() -> Self {
        Self::HIDDEN
    }
}

/// Measures and positions every word, returning the window size that fits them.
pub fn layout(
    text: &str,
    words: &mut [Word],
    metrics: &impl TextMetrics,
    alignment: Alignment,
    border: u32,
) -> WindowFrame {
    let line_height = metrics.line_height();
    for word in words.iter_mut() {
        word.rect.width = metrics.text_width(word.text(text));
        word.rect.height = line_height;
    }

    let mut content_width = 0;
    let mut content_height: u32 = 0;
    for line in lines(words) {
        content_width = content_width.max(line_width(line));
        content_height = content_height.saturating_add(line_height);
    }

    let border_px = i32::try_from(border).unwrap_or(i32::MAX);
    let mut y = border_px;
    let mut start = 0;
    for len in line_lengths(words) {
        let line = &mut words[start..start + len];
        let slack = content_width - line_width(line);
        let indent = match alignment {
            Alignment::Left => 0,
            Alignment::Right => slack,
            Alignment::Center => slack / 2,
        };
        let mut x = border_px.saturating_add(to_px(indent));
        for word in line.iter_mut() {
            word.rect.x = x;
            word.rect.y = y;
            x = x.saturating_add(to_px(word.rect.width));
        }
        y = y.saturating_add(to_px(line_height));
        start += len;
    }

    WindowFrame {
        width: content_width.saturating_add(border.saturating_mul(2)),
        height: content_height.saturating_add(border.saturating_mul(2)),
        hidden: content_width == 0 || content_height == 0,
    }
}

/// Index of the clickable word under a window-relative point.
pub fn word_at(words: &[Word], x: i32, y: i32) -> Option<usize> {
    words
        .iter()
        .position(|w| w.clickable && w.rect.contains(x, y))
}

fn line_width(line: &[Word]) -> u32 {
    line.iter().fold(0, |width, w| width.saturating_add(w.rect.width))
}

fn to_px(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

fn lines(words: &[Word]) -> impl Iterator<Item = &[Word]> {
    words.split_inclusive(|w| w.eol)
}

fn line_lengths(words: &[Word]) -> Vec<usize> {
    lines(words).map(<[Word]>::len).collect()
}
