//! Raw scanning of embedded language blocks (`PROC PYTHON`, `PROC LUA`).
//!
//! Between `SUBMIT;` and `ENDSUBMIT;` the text belongs to another language.
//! The matchers here only know enough of that language to skip its strings
//! and comments, so an `ENDSUBMIT` inside a string does not end the block.

use super::cursor::Cursor;
use super::literals::is_name_char;

/// A language that can be embedded in a SUBMIT block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddedLanguage {
    /// `PROC PYTHON`.
    Python,
    /// `PROC LUA`.
    Lua,
}

impl EmbeddedLanguage {
    /// Looks up a language by procedure name (upper case).
    #[must_use]
    pub fn from_procedure(name: &str) -> Option<Self> {
        match name {
            "PYTHON" => Some(Self::Python),
            "LUA" => Some(Self::Lua),
            _ => None,
        }
    }
}

/// Why raw scanning stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EmbeddedExit {
    /// Stopped before `ENDSUBMIT;` / `ENDINTERACTIVE;`.
    Marker,
    /// Stopped before a line starting with `DATA`, `PROC` or `%MACRO`.
    NestedSection,
    /// Ran to the end of the document.
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    /// Quoted string; `triple` for Python's `'''` / `"""`.
    Quoted { quote: char, triple: bool },
    /// Lua `--[==[ ... ]==]`.
    LongComment { level: usize },
    /// Lua `[==[ ... ]==]`.
    LongString { level: usize },
}

/// Advances `cursor` over embedded code and reports why it stopped.
pub(crate) fn scan(cursor: &mut Cursor<'_>, language: EmbeddedLanguage) -> EmbeddedExit {
    let mut state = State::Code;
    let mut prev: Option<char> = None;

    loop {
        let Some(ch) = cursor.peek() else {
            return EmbeddedExit::Eof;
        };

        if state == State::Code {
            let at_boundary = !prev.is_some_and(is_name_char);
            if at_boundary && at_exit_marker(cursor) {
                return EmbeddedExit::Marker;
            }
            if cursor.line_prefix().trim().is_empty() && at_nested_section(cursor) {
                return EmbeddedExit::NestedSection;
            }
        }

        state = match (state, language) {
            (State::Code, _) => enter(cursor, language),
            (State::LineComment, _) => {
                cursor.bump();
                if ch == '\n' {
                    State::Code
                } else {
                    State::LineComment
                }
            }
            (State::Quoted { quote, triple }, _) => scan_quoted(cursor, quote, triple),
            (State::LongComment { level }, _) => {
                if close_long_bracket(cursor, level) {
                    State::Code
                } else {
                    cursor.bump();
                    State::LongComment { level }
                }
            }
            (State::LongString { level }, _) => {
                if close_long_bracket(cursor, level) {
                    State::Code
                } else {
                    cursor.bump();
                    State::LongString { level }
                }
            }
        };
        prev = Some(ch);
    }
}

/// Consumes one step of code and returns the state it leads to.
fn enter(cursor: &mut Cursor<'_>, language: EmbeddedLanguage) -> State {
    let ch = cursor.peek().unwrap_or('\n');
    match language {
        EmbeddedLanguage::Python => match ch {
            '#' => {
                cursor.bump();
                State::LineComment
            }
            '\'' | '"' => {
                let triple = cursor.peek_nth(1) == Some(ch) && cursor.peek_nth(2) == Some(ch);
                cursor.bump_n(if triple { 3 } else { 1 });
                State::Quoted { quote: ch, triple }
            }
            _ => {
                cursor.bump();
                State::Code
            }
        },
        EmbeddedLanguage::Lua => match ch {
            '-' if cursor.peek_nth(1) == Some('-') => {
                cursor.bump_n(2);
                match open_long_bracket(cursor) {
                    Some(level) => State::LongComment { level },
                    None => State::LineComment,
                }
            }
            '[' => match open_long_bracket(cursor) {
                Some(level) => State::LongString { level },
                None => {
                    cursor.bump();
                    State::Code
                }
            },
            '\'' | '"' => {
                cursor.bump();
                State::Quoted {
                    quote: ch,
                    triple: false,
                }
            }
            _ => {
                cursor.bump();
                State::Code
            }
        },
    }
}

fn scan_quoted(cursor: &mut Cursor<'_>, quote: char, triple: bool) -> State {
    let Some(ch) = cursor.bump() else {
        return State::Code;
    };
    match ch {
        '\\' => {
            cursor.bump();
            State::Quoted { quote, triple }
        }
        '\n' if !triple => State::Code,
        c if c == quote => {
            if !triple {
                State::Code
            } else if cursor.peek() == Some(quote) && cursor.peek_nth(1) == Some(quote) {
                cursor.bump_n(2);
                State::Code
            } else {
                State::Quoted { quote, triple }
            }
        }
        _ => State::Quoted { quote, triple },
    }
}

/// Consumes `[`, `=`*level, `[` and returns the level.
fn open_long_bracket(cursor: &mut Cursor<'_>) -> Option<usize> {
    let mut chars = cursor.chars();
    if chars.next() != Some('[') {
        return None;
    }
    let mut level = 0;
    loop {
        match chars.next() {
            Some('=') => level += 1,
            Some('[') => break,
            _ => return None,
        }
    }
    cursor.bump_n(level + 2);
    Some(level)
}

/// Consumes `]`, `=`*level, `]` if present.
fn close_long_bracket(cursor: &mut Cursor<'_>, level: usize) -> bool {
    let mut chars = cursor.chars();
    if chars.next() != Some(']') {
        return false;
    }
    for _ in 0..level {
        if chars.next() != Some('=') {
            return false;
        }
    }
    if chars.next() != Some(']') {
        return false;
    }
    cursor.bump_n(level + 2);
    true
}

fn at_exit_marker(cursor: &Cursor<'_>) -> bool {
    ["ENDSUBMIT", "ENDINTERACTIVE"].iter().any(|marker| {
        if !cursor.at_word_ignore_case(marker) {
            return false;
        }
        let rest = cursor.chars().skip(marker.len());
        let mut rest = rest.skip_while(|ch| ch.is_whitespace());
        rest.next() == Some(';')
    })
}

fn at_nested_section(cursor: &Cursor<'_>) -> bool {
    if cursor.at_word_ignore_case("%MACRO") {
        return cursor
            .chars()
            .nth("%MACRO".len())
            .is_some_and(char::is_whitespace);
    }
    ["DATA", "PROC"].iter().any(|word| {
        if !cursor.at_word_ignore_case(word) {
            return false;
        }
        let mut rest = cursor.chars().skip(word.len());
        let Some(next) = rest.next() else {
            return false;
        };
        if next == ';' {
            return true;
        }
        if !next.is_whitespace() {
            return false;
        }
        let mut rest = rest.skip_while(|ch| ch.is_whitespace());
        rest.next()
            .is_some_and(|ch| ch == ';' || ch == '_' || ch.is_alphabetic())
    })
}
