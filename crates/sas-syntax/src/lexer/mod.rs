//! Scanner for SAS source.
//!
//! The scanner classifies characters directly instead of running a generated
//! grammar: most of SAS lexing depends on context (statement start, macro
//! quoting, `DATALINES;` blocks, embedded `SUBMIT` code), so the scanner keeps
//! a small amount of state between tokens. That state is reset whenever
//! scanning restarts at a position.

mod cursor;
mod embedded;
mod literals;
mod macros;
mod tokens;

pub use embedded::EmbeddedLanguage;
pub use literals::{days_in_month, is_name_char, is_name_start, is_valid_date};
pub use macros::{is_macro_keyword, is_macro_section_keyword, is_macro_statement, QuotingState};
pub use tokens::TokenKind;

use smol_str::SmolStr;

use crate::text::{Position, Range, TextModel};
use cursor::Cursor;
use embedded::EmbeddedExit;
use literals::{classify_suffix, date_run_len, format_tail_len, numeric_len};
use macros::{quote_class, Quoting};

/// Multi-character operators, longest first.
const OPERATORS: [&str; 16] = [
    "^=:", "~=:", "¬=:", "<=:", ">=:", "**", "||", "!!", "<>", "><", "<=", ">=", "^=", "~=",
    "¬=", "=:",
];

/// A token produced by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, start: Position, end: Position) -> Self {
        Self { kind, start, end }
    }

    /// The token's range.
    #[must_use]
    pub fn range(&self) -> Range {
        Range::new(self.start, self.end)
    }

    /// Returns true if the token has zero length.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns the token text.
    #[must_use]
    pub fn text(&self, model: &TextModel) -> String {
        model.slice(self.range())
    }
}

/// Scanner configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerOptions {
    /// Procedures whose `SUBMIT` blocks are scanned as embedded code.
    pub embedded_languages: Vec<EmbeddedLanguage>,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            embedded_languages: vec![EmbeddedLanguage::Python, EmbeddedLanguage::Lua],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardsState {
    None,
    /// `DATALINES` seen, waiting for its `;`.
    Armed { four: bool },
    /// The next token is the data block.
    Data { four: bool },
    /// The next token is the `;` / `;;;;` terminator.
    Terminator { four: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmbeddedState {
    None,
    /// Inside `PROC PYTHON` / `PROC LUA`, waiting for `SUBMIT`.
    Watching(EmbeddedLanguage),
    /// `SUBMIT` seen, waiting for its `;`.
    Armed(EmbeddedLanguage),
    /// The next token is raw embedded code.
    Raw(EmbeddedLanguage),
}

/// The last significant (non-trivia) token.
#[derive(Debug, Clone)]
struct Previous {
    kind: TokenKind,
    upper: SmolStr,
    starts_statement: bool,
}

impl Previous {
    fn ends_statement(&self) -> bool {
        self.kind == TokenKind::Separator && self.upper == ";"
    }
}

/// Scanner over a [`TextModel`].
///
/// The scanner is an iterator over tokens. It never fails: unterminated
/// constructs run to the end of the document and unknown characters are
/// single-character separators.
#[derive(Clone)]
pub struct Scanner<'m> {
    cursor: Cursor<'m>,
    options: ScannerOptions,
    quoting: Quoting,
    prev: Option<Previous>,
    cards: CardsState,
    embedded: EmbeddedState,
}

impl<'m> Scanner<'m> {
    /// Creates a scanner starting at `start` with default options.
    #[must_use]
    pub fn new(model: &'m TextModel, start: Position) -> Self {
        Self::with_options(model, start, ScannerOptions::default())
    }

    /// Creates a scanner starting at `start`.
    #[must_use]
    pub fn with_options(model: &'m TextModel, start: Position, options: ScannerOptions) -> Self {
        Self {
            cursor: Cursor::new(model, start),
            options,
            quoting: Quoting::default(),
            prev: None,
            cards: CardsState::None,
            embedded: EmbeddedState::None,
        }
    }

    /// Restarts scanning at `pos`, dropping all context.
    pub fn restart(&mut self, pos: Position) {
        self.cursor = Cursor::new(self.cursor.model(), pos);
        self.quoting = Quoting::default();
        self.prev = None;
        self.cards = CardsState::None;
        self.embedded = EmbeddedState::None;
    }

    /// The scanned document.
    #[must_use]
    pub fn model(&self) -> &'m TextModel {
        self.cursor.model()
    }

    /// Position of the next token.
    #[must_use]
    pub fn position(&self) -> Position {
        self.cursor.pos()
    }

    /// Current macro quoting state.
    #[must_use]
    pub fn quoting(&self) -> QuotingState {
        self.quoting.state
    }

    /// Returns `true` if the next significant token starts a statement.
    #[must_use]
    pub fn at_statement_start(&self) -> bool {
        self.prev.as_ref().is_none_or(Previous::ends_statement)
    }

    /// Returns `true` if the scanner carries no context that a fresh scanner
    /// started at the current position would lack.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.quoting.is_clean()
            && self.cards == CardsState::None
            && !matches!(
                self.embedded,
                EmbeddedState::Armed(_) | EmbeddedState::Raw(_)
            )
            && self.at_statement_start()
    }

    fn scan_mode_token(&mut self) -> Option<Token> {
        let start = self.cursor.pos();
        match self.cards {
            CardsState::Data { four } => {
                let mut ahead = self.cursor.clone();
                loop {
                    ahead.eat_while(|ch| ch != ';');
                    if ahead.is_eof() || !four || ahead.at_word_ignore_case(";;;;") {
                        break;
                    }
                    ahead.bump();
                }
                self.cards = if ahead.is_eof() {
                    CardsState::None
                } else {
                    CardsState::Terminator { four }
                };
                self.cursor.advance_to(ahead.pos());
                if self.cursor.pos() > start {
                    return Some(Token::new(TokenKind::CardsData, start, self.cursor.pos()));
                }
                return self.scan_mode_token();
            }
            CardsState::Terminator { four } => {
                self.cursor.bump_n(if four { 4 } else { 1 });
                self.cards = CardsState::None;
                self.prev = Some(Previous {
                    kind: TokenKind::Separator,
                    upper: SmolStr::new_static(";"),
                    starts_statement: false,
                });
                return Some(Token::new(TokenKind::Separator, start, self.cursor.pos()));
            }
            CardsState::None | CardsState::Armed { .. } => {}
        }

        if let EmbeddedState::Raw(language) = self.embedded {
            let exit = embedded::scan(&mut self.cursor, language);
            self.embedded = match exit {
                EmbeddedExit::Marker => EmbeddedState::Watching(language),
                EmbeddedExit::NestedSection | EmbeddedExit::Eof => EmbeddedState::None,
            };
            if self.cursor.pos() > start {
                return Some(Token::new(TokenKind::EmbeddedCode, start, self.cursor.pos()));
            }
        }
        None
    }

    fn scan_token(&mut self, ch: char, at_start: bool) -> TokenKind {
        let quoting = self.quoting.state.is_quoting();
        match ch {
            c if c.is_whitespace() || c == '\u{feff}' => {
                self.cursor
                    .eat_while(|c| c.is_whitespace() || c == '\u{feff}');
                TokenKind::Blank
            }
            '/' if self.cursor.peek_nth(1) == Some('*') => {
                self.cursor.bump_n(2);
                while let Some(c) = self.cursor.bump() {
                    if c == '*' && self.cursor.eat_char('/') {
                        break;
                    }
                }
                TokenKind::Comment
            }
            '*' if at_start && !quoting => {
                self.eat_statement();
                TokenKind::Comment
            }
            '%' => self.scan_percent(at_start),
            '&' => self.scan_ampersand(),
            '\'' | '"' => self.scan_quoted(ch),
            '$' => self.scan_dollar(),
            c if c.is_ascii_digit()
                || (c == '.' && self.cursor.peek_nth(1).is_some_and(|n| n.is_ascii_digit())) =>
            {
                self.scan_number()
            }
            c if is_name_start(c) => self.scan_word(at_start),
            ';' => {
                self.cursor.bump();
                if quoting {
                    return TokenKind::Text;
                }
                self.quoting.state.format_suppressed = false;
                if let CardsState::Armed { four } = self.cards {
                    self.cards = CardsState::Data { four };
                }
                if let EmbeddedState::Armed(language) = self.embedded {
                    self.embedded = EmbeddedState::Raw(language);
                }
                TokenKind::Separator
            }
            '(' => {
                self.cursor.bump();
                self.quoting.open_paren();
                TokenKind::Separator
            }
            ')' => {
                self.cursor.bump();
                self.quoting.close_paren();
                TokenKind::Separator
            }
            _ => {
                let rest = self.cursor.rest_of_line();
                match OPERATORS.iter().find(|op| rest.starts_with(*op)) {
                    Some(op) => self.cursor.bump_n(op.chars().count()),
                    None => {
                        self.cursor.bump();
                    }
                }
                TokenKind::Separator
            }
        }
    }

    /// Consumes text through the next `;` (inclusive) or to the end.
    fn eat_statement(&mut self) {
        self.cursor.eat_while(|c| c != ';');
        self.cursor.eat_char(';');
    }

    fn scan_percent(&mut self, at_start: bool) -> TokenKind {
        let next = self.cursor.peek_nth(1);
        if self.quoting.state.is_quoting() && matches!(next, Some('\'' | '"' | '(' | ')' | '%')) {
            self.cursor.bump_n(2);
            return TokenKind::Text;
        }
        if next == Some('*') && at_start {
            self.eat_statement();
            return TokenKind::MacroComment;
        }
        if !next.is_some_and(is_name_start) {
            self.cursor.bump();
            return TokenKind::Separator;
        }

        self.cursor.bump();
        let name_start = self.cursor.pos();
        self.cursor.eat_while(is_name_char);
        let name = self
            .cursor
            .model()
            .slice(Range::new(name_start, self.cursor.pos()))
            .to_ascii_uppercase();

        if is_macro_section_keyword(&name) {
            if at_start {
                self.embedded = EmbeddedState::None;
            }
            return TokenKind::MacroSectionKeyword;
        }
        if !is_macro_keyword(&name) {
            return TokenKind::MacroRef;
        }
        if let Some(class) = quote_class(&name) {
            if self.cursor.peek() == Some('(') {
                self.quoting.arm(class);
            } else {
                self.quoting.disarm();
            }
        }
        if name == "PUT" {
            self.quoting.state.format_suppressed = true;
        }
        TokenKind::MacroKeyword
    }

    fn scan_ampersand(&mut self) -> TokenKind {
        let mut ahead = self.cursor.clone();
        ahead.eat_while(|c| c == '&');
        if ahead.peek().is_some_and(is_name_start) {
            ahead.eat_while(is_name_char);
            ahead.eat_char('.');
            self.cursor = ahead;
            TokenKind::MacroRef
        } else {
            self.cursor.bump();
            TokenKind::Separator
        }
    }

    fn scan_quoted(&mut self, quote: char) -> TokenKind {
        if self.quoting.in_byte_quote() {
            self.cursor.bump();
            return TokenKind::Text;
        }
        self.cursor.bump();
        let content_start = self.cursor.pos();
        let content_end = loop {
            let before = self.cursor.pos();
            match self.cursor.bump() {
                // Unterminated: runs to the end of the document.
                None => return TokenKind::String,
                Some(c) if c == quote => {
                    if !self.cursor.eat_char(quote) {
                        break before;
                    }
                }
                Some(_) => {}
            }
        };
        let content = self
            .cursor
            .model()
            .slice(Range::new(content_start, content_end));
        let (kind, consumed) = classify_suffix(&content, self.cursor.rest_of_line());
        self.cursor.bump_n(consumed);
        kind
    }

    fn scan_dollar(&mut self) -> TokenKind {
        let mut ahead = self.cursor.clone();
        ahead.bump();
        if ahead.peek().is_some_and(is_name_start) && !self.quoting.state.format_suppressed {
            ahead.eat_while(is_name_char);
            if let Some(tail) = format_tail_len(ahead.rest_of_line()) {
                ahead.bump_n(tail);
                self.cursor = ahead;
                return TokenKind::Format;
            }
        }
        self.cursor.bump();
        TokenKind::Separator
    }

    fn scan_number(&mut self) -> TokenKind {
        let rest = self.cursor.rest_of_line();
        if let Some(len) = date_run_len(rest) {
            if is_valid_date(&rest[..len]) {
                self.cursor.bump_n(len);
                return TokenKind::Date;
            }
        }
        self.cursor.bump_n(numeric_len(rest).max(1));
        TokenKind::Numeric
    }

    fn scan_word(&mut self, at_start: bool) -> TokenKind {
        let start = self.cursor.pos();
        self.cursor.eat_while(is_name_char);

        if !self.quoting.state.format_suppressed {
            if let Some(tail) = format_tail_len(self.cursor.rest_of_line()) {
                self.cursor.bump_n(tail);
                return TokenKind::Format;
            }
        }

        let upper = self
            .cursor
            .model()
            .slice(Range::new(start, self.cursor.pos()))
            .to_ascii_uppercase();

        if at_start {
            self.statement_word(&upper);
        } else if self.prev.as_ref().is_some_and(|prev| {
            prev.starts_statement && matches!(prev.upper.as_str(), "PROC" | "PROCEDURE")
        }) {
            if let Some(language) = EmbeddedLanguage::from_procedure(&upper)
                .filter(|language| self.options.embedded_languages.contains(language))
            {
                self.embedded = EmbeddedState::Watching(language);
            }
        }
        TokenKind::Text
    }

    /// Mode switches triggered by the first word of a statement.
    fn statement_word(&mut self, upper: &str) {
        match upper {
            "RUN" | "QUIT" | "DATA" | "PROC" | "PROCEDURE" => {
                self.embedded = EmbeddedState::None;
            }
            "SUBMIT" | "INTERACTIVE" => {
                if let EmbeddedState::Watching(language) = self.embedded {
                    self.embedded = EmbeddedState::Armed(language);
                }
            }
            "CARDS" | "CARDS4" | "DATALINES" | "DATALINES4" | "LINES" | "LINES4" | "PARMCARDS"
            | "PARMCARDS4" => {
                let followed_by_semicolon = self
                    .cursor
                    .chars()
                    .find(|c| !c.is_whitespace())
                    .is_some_and(|c| c == ';');
                if followed_by_semicolon {
                    self.cards = CardsState::Armed {
                        four: upper.ends_with('4'),
                    };
                }
            }
            _ => {}
        }
    }

    fn record(&mut self, token: &Token, at_start: bool) {
        if token.kind.is_trivia() {
            return;
        }
        let upper = SmolStr::new(token.text(self.cursor.model()).to_ascii_uppercase());
        self.prev = Some(Previous {
            kind: token.kind,
            upper,
            starts_statement: at_start,
        });
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.scan_mode_token() {
            return Some(token);
        }

        let start = self.cursor.pos();
        let ch = self.cursor.peek()?;
        let at_start = self.at_statement_start();
        let kind = self.scan_token(ch, at_start);
        let token = Token::new(kind, start, self.cursor.pos());
        self.record(&token, at_start);
        Some(token)
    }
}

/// Scan the entire document and return all tokens.
#[must_use]
pub fn lex(model: &TextModel) -> Vec<Token> {
    Scanner::new(model, Position::default()).collect()
}

/// Scan a document and return tokens paired with their text.
///
/// Useful for debugging and testing.
#[must_use]
pub fn lex_with_text(model: &TextModel) -> Vec<(Token, String)> {
    Scanner::new(model, Position::default())
        .map(|token| (token, token.text(model)))
        .collect()
}
