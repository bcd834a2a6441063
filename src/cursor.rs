//! Character source with line/column bookkeeping.

use std::fmt::Display;

/// A position within a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Cursor {
    pub line: usize,
    pub column: usize,
}

impl Cursor {
    pub fn start() -> Self {
        Cursor { line: 1, column: 1 }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::start()
    }
}

impl Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cursor {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.line, self.column).cmp(&(other.line, other.column))
    }
}

/// A source document with cursor-aware read operations.
///
/// Advancing is done character-by-character; newlines reset the column and
/// bump the line. `peek_n` never fails past EOF, it simply returns fewer
/// characters than asked for.
#[derive(Debug, Clone)]
pub struct TextDocument {
    chars: Vec<char>,
    pos: usize,
    cursor: Cursor,
    source: String,
}

impl TextDocument {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        TextDocument {
            chars: source.chars().collect(),
            pos: 0,
            cursor: Cursor::start(),
            source,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn caret(&self) -> Cursor {
        self.cursor
    }

    pub fn finished(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn current_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Peek `n` characters ahead of the current one (0 == current char).
    pub fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    /// Peek the next `k` characters as a vec; shorter than `k` at EOF.
    pub fn peek_n(&self, k: usize) -> Vec<char> {
        let end = (self.pos + k).min(self.chars.len());
        self.chars[self.pos..end].to_vec()
    }

    pub fn advance(&mut self, n: usize) {
        for _ in 0..n {
            let Some(c) = self.current_char() else {
                break;
            };
            self.pos += 1;
            if c == '\n' {
                self.cursor.line += 1;
                self.cursor.column = 1;
            } else {
                self.cursor.column += 1;
            }
        }
    }

    pub fn slice(&self, start: usize, len: usize) -> String {
        let end = (start + len).min(self.chars.len());
        self.chars[start.min(self.chars.len())..end].iter().collect()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Render the offending line(s) around `cursor` with a `^` caret marker
    /// underneath, for use in error messages.
    pub fn indicate(&self, cursor: Cursor) -> Vec<String> {
        let lines: Vec<&str> = self.source.lines().collect();
        let Some(line) = lines.get(cursor.line.saturating_sub(1)) else {
            return vec![format!("at {cursor}")];
        };
        let margin = cursor.line.to_string().len();
        let mut out = vec![format!("{:>margin$} | {}", cursor.line, line, margin = margin)];
        let pad = " ".repeat(margin + 3 + cursor.column.saturating_sub(1));
        out.push(format!("{pad}^"));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_line_and_column() {
        let mut doc = TextDocument::new("ab\ncd");
        assert_eq!(doc.caret(), Cursor { line: 1, column: 1 });
        doc.advance(3);
        assert_eq!(doc.caret(), Cursor { line: 2, column: 1 });
        doc.advance(2);
        assert_eq!(doc.caret(), Cursor { line: 2, column: 3 });
        assert!(doc.finished());
    }

    #[test]
    fn peek_n_past_eof_is_short() {
        let doc = TextDocument::new("ab");
        assert_eq!(doc.peek_n(5), vec!['a', 'b']);
    }

    #[test]
    fn indicate_marks_caret_under_column() {
        let doc = TextDocument::new("let x = 1\nlet y = @");
        let lines = doc.indicate(Cursor { line: 2, column: 9 });
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("let y = @"));
        assert!(lines[1].ends_with('^'));
    }
}
