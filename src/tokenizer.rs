use crate::layout::Rect;
use regex::Regex;

/// A span of frame text. `rect` is only meaningful after [crate::layout::layout] has run
/// for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Word {
    pub offset: usize,
    pub len: usize,
    pub clickable: bool,
    /// Last word of its line.
    pub eol: bool,
    pub rect: Rect,
}

impl Word {
    fn new(offset: usize, len: usize, clickable: bool) -> Self {
        Self {
            offset,
            len,
            clickable,
            eol: false,
            rect: Rect::default(),
        }
    }

    pub fn text<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.offset..self.offset + self.len).unwrap_or("")
    }
}

/// Splits frame text into words. Without a pattern every line is one word; with one, each
/// match becomes a clickable word and the text between matches becomes plain words.
/// A trailing newline does not start another line.
pub fn tokenize(text: &str, clickable: Option<&Regex>) -> Vec<Word> {
    let mut words = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);
        match clickable {
            None => words.push(Word::new(offset, content.len(), false)),
            Some(pattern) => split_line(content, offset, pattern, &mut words),
        }
        if let Some(last) = words.last_mut() {
            last.eol = true;
        }
        offset += line.len();
    }
    words
}

fn split_line(line: &str, base: usize, pattern: &Regex, words: &mut Vec<Word>) {
    let mut pos = 0;
    loop {
        let rest = &line[pos..];
        // An empty match would never advance.
        let found = pattern.find_iter(rest).find(|m| !m.as_str().is_empty());
        match found {
            None => {
                words.push(Word::new(base + pos, rest.len(), false));
                return;
            }
            Some(m) if m.start() > 0 => {
                words.push(Word::new(base + pos, m.start(), false));
                pos += m.start();
            }
            Some(m) => {
                words.push(Word::new(base + pos, m.end(), true));
                pos += m.end();
                if pos == line.len() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn summary(text: &str, words: &[Word]) -> Vec<String> {
        words
            .iter()
            .map(|w| {
                format!(
                    "{}{}{}",
                    if w.clickable { "*" } else { "" },
                    w.text(text),
                    if w.eol { "$" } else { "" }
                )
            })
            .collect()
    }

    #[test]
    fn one_word_per_line_without_pattern() {
        let text = "first line\n\nthird";
        let words = tokenize(text, None);
        assert_eq!(summary(text, &words), vec!["first line$", "$", "third$"]);
    }

    #[test]
    fn reconstructs_lines_without_pattern() {
        for text in ["a\nbb\n", "", "\n", "x", "  spaced  \n\ttab\n\n\nend\n", "é€\n日本"] {
            let words = tokenize(text, None);
            let lines: Vec<&str> = words.iter().map(|w| w.text(text)).collect();
            assert_eq!(lines, text.lines().collect::<Vec<_>>(), "{text:?}");
            assert!(words.iter().all(|w| w.eol && !w.clickable));
        }
    }

    #[test]
    fn empty_text_has_no_words() {
        assert!(tokenize("", None).is_empty());
    }

    #[test]
    fn splits_around_matches() {
        let pattern = Regex::new(r"\[[a-z]+\]").unwrap();
        let text = "12:00 [mail] [cal]\n[wifi] up\nplain\n";
        let words = tokenize(text, Some(&pattern));
        insta::assert_debug_snapshot!(summary(text, &words), @r###"
        [
            "12:00 ",
            "*[mail]",
            " ",
            "*[cal]$",
            "*[wifi]",
            " up$",
            "plain$",
        ]
        "###);
    }

    #[test]
    fn skips_empty_matches() {
        let pattern = Regex::new(r"\d*").unwrap();
        let text = "ab12cd";
        let words = tokenize(text, Some(&pattern));
        assert_eq!(summary(text, &words), vec!["ab", "*12", "cd$"]);
    }

    #[test]
    fn deterministic() {
        let pattern = Regex::new(r"\w+").unwrap();
        let text = "one two\nthree";
        assert_eq!(
            tokenize(text, Some(&pattern)),
            tokenize(text, Some(&pattern))
        );
    }
}
