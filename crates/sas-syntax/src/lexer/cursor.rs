//! Character cursor over a [`TextModel`].
//!
//! Line breaks are reported as `'\n'` so the scanner can treat the document as
//! one character stream while positions stay line/column addressed.

use crate::text::{Position, TextModel};

#[derive(Clone)]
pub(crate) struct Cursor<'m> {
    model: &'m TextModel,
    pos: Position,
}

impl<'m> Cursor<'m> {
    pub(crate) fn new(model: &'m TextModel, pos: Position) -> Self {
        Self {
            model,
            pos: model.clamp(pos),
        }
    }

    pub(crate) fn pos(&self) -> Position {
        self.pos
    }

    pub(crate) fn model(&self) -> &'m TextModel {
        self.model
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.peek().is_none()
    }

    /// Text from the cursor to the end of the current line.
    pub(crate) fn rest_of_line(&self) -> &'m str {
        self.model
            .line(self.pos.line)
            .and_then(|text| text.get(self.pos.column as usize..))
            .unwrap_or("")
    }

    /// Text of the current line before the cursor.
    pub(crate) fn line_prefix(&self) -> &'m str {
        self.model
            .line(self.pos.line)
            .and_then(|text| text.get(..self.pos.column as usize))
            .unwrap_or("")
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.model.char_at(self.pos)
    }

    /// Peeks `n` characters ahead (0 = current).
    pub(crate) fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars().nth(n)
    }

    /// Iterates characters from the cursor without consuming them.
    pub(crate) fn chars(&self) -> impl Iterator<Item = char> + 'm {
        let mut ahead = self.clone();
        std::iter::from_fn(move || ahead.bump())
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        if ch == '\n' {
            self.pos = Position::new(self.pos.line + 1, 0);
        } else {
            self.pos.column += u32::try_from(ch.len_utf8()).unwrap_or(1);
        }
        Some(ch)
    }

    pub(crate) fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            if self.bump().is_none() {
                break;
            }
        }
    }

    pub(crate) fn eat_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.bump();
        }
    }

    /// Moves to `pos`, which must not be before the cursor.
    pub(crate) fn advance_to(&mut self, pos: Position) {
        if pos > self.pos {
            self.pos = self.model.clamp(pos);
        }
    }

    /// Returns `true` if the current line continues with `word` (ASCII case
    /// insensitive).
    pub(crate) fn at_word_ignore_case(&self, word: &str) -> bool {
        let rest = self.rest_of_line();
        rest.len() >= word.len()
            && rest
                .get(..word.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_crosses_lines() {
        let model = TextModel::new("ab\nc");
        let mut cursor = Cursor::new(&model, Position::default());
        assert_eq!(cursor.bump(), Some('a'));
        assert_eq!(cursor.bump(), Some('b'));
        assert_eq!(cursor.bump(), Some('\n'));
        assert_eq!(cursor.pos(), Position::new(1, 0));
        assert_eq!(cursor.peek_nth(0), Some('c'));
        assert_eq!(cursor.bump(), Some('c'));
        assert!(cursor.is_eof());
    }
}
