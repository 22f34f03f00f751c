use log::warn;

const INITIAL_CAPACITY: usize = 64;

/// Upper bound on the text kept for a single frame.
pub const MAX_FRAME_BYTES: usize = 1 << 20;

/// Decoded text of one frame. Capacity grows by doubling and the length never exceeds
/// `limit`; text past the limit is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    limit: usize,
    truncated: bool,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_FRAME_BYTES)
    }
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            text: String::new(),
            limit,
            truncated: false,
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.text.capacity()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether anything was dropped because of the limit.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn push(&mut self, c: char) {
        let len = c.len_utf8();
        if self.truncated {
            return;
        }
        if self.text.len() + len > self.limit {
            if !self.truncated {
                warn!("frame text exceeds {} bytes, dropping the rest", self.limit);
                self.truncated = true;
            }
            return;
        }
        self.grow_for(len);
        self.text.push(c);
    }

    pub fn push_str(&mut self, s: &str) {
        for c in s.chars() {
            self.push(c);
        }
    }

    /// Text of the span `offset..offset + len`, or `""` when out of range.
    pub fn slice(&self, offset: usize, len: usize) -> &str {
        self.text.get(offset..offset + len).unwrap_or("")
    }

    /// Hands the contents over and leaves an empty buffer behind, keeping its allocation
    /// policy but not its memory.
    pub fn take(&mut self) -> TextBuffer {
        let limit = self.limit;
        std::mem::replace(self, TextBuffer::with_limit(limit))
    }

    fn grow_for(&mut self, additional: usize) {
        let needed = self.text.len() + additional;
        if needed <= self.text.capacity() {
            return;
        }
        let mut capacity = self.text.capacity().max(INITIAL_CAPACITY);
        while capacity < needed {
            capacity *= 2;
        }
        self.text.reserve_exact(capacity - self.text.len());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn starts_empty_without_allocation() {
        let buffer = TextBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 0);
    }

    #[test]
    fn capacity_doubles() {
        let mut buffer = TextBuffer::new();
        buffer.push('a');
        assert!(buffer.capacity() >= INITIAL_CAPACITY);
        let first = buffer.capacity();
        buffer.push_str(&"b".repeat(first));
        assert!(buffer.capacity() >= first * 2);
        assert_eq!(buffer.len(), first + 1);
    }

    #[test]
    fn drops_text_past_limit() {
        let mut buffer = TextBuffer::with_limit(4);
        buffer.push_str("abcdef");
        assert_eq!(buffer.as_str(), "abcd");
        assert!(buffer.truncated());
    }

    #[test]
    fn never_splits_a_character_at_the_limit() {
        let mut buffer = TextBuffer::with_limit(3);
        buffer.push_str("aé€");
        assert_eq!(buffer.as_str(), "aé");
    }

    #[test]
    fn take_leaves_empty_buffer() {
        let mut buffer = TextBuffer::with_limit(4);
        buffer.push_str("abcdef");
        let taken = buffer.take();
        assert_eq!(taken.as_str(), "abcd");
        assert!(buffer.is_empty());
        assert!(!buffer.truncated());
    }

    #[test]
    fn slice_out_of_range_is_empty() {
        let mut buffer = TextBuffer::new();
        buffer.push_str("hello");
        assert_eq!(buffer.slice(1, 3), "ell");
        assert_eq!(buffer.slice(4, 3), "");
    }
}
