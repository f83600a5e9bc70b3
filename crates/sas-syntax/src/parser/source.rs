//! Statement view for the grammar.
//!
//! A [`Statement`] owns the tokens of one statement and gives the grammar
//! indexed access to its significant (non-trivia) tokens. Token kinds are
//! rewritten in place as words are recognized.

use smol_str::SmolStr;

use crate::lexer::{is_macro_statement, Token, TokenKind};
use crate::text::{Position, TextModel};

pub(crate) struct Statement {
    pub(crate) tokens: Vec<Token>,
    /// Index into `tokens` of each significant token.
    sig: Vec<usize>,
    /// Upper-cased text of each significant token.
    upper: Vec<SmolStr>,
    /// Significant tokens belonging to a nested macro statement.
    nested: Vec<bool>,
}

impl Statement {
    pub(crate) fn new(tokens: Vec<Token>, model: &TextModel) -> Self {
        let sig: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| !token.kind.is_trivia())
            .map(|(index, _)| index)
            .collect();
        let upper: Vec<SmolStr> = sig
            .iter()
            .map(|&index| SmolStr::new(tokens[index].text(model).to_ascii_uppercase()))
            .collect();

        let mut nested = vec![false; sig.len()];
        let mut inside = false;
        for (i, &index) in sig.iter().enumerate() {
            let kind = tokens[index].kind;
            if i > 0 && kind == TokenKind::MacroKeyword && is_macro_statement(&upper[i]) {
                inside = true;
            }
            nested[i] = inside;
            if inside && kind == TokenKind::Separator && upper[i].starts_with(';') {
                inside = false;
            }
        }

        Self {
            tokens,
            sig,
            upper,
            nested,
        }
    }

    /// Number of significant tokens.
    pub(crate) fn len(&self) -> usize {
        self.sig.len()
    }

    pub(crate) fn token(&self, i: usize) -> Option<Token> {
        self.sig.get(i).map(|&index| self.tokens[index])
    }

    pub(crate) fn kind(&self, i: usize) -> Option<TokenKind> {
        self.token(i).map(|token| token.kind)
    }

    /// Upper-cased text of significant token `i`, `""` past the end.
    pub(crate) fn upper(&self, i: usize) -> &str {
        self.upper.get(i).map_or("", SmolStr::as_str)
    }

    pub(crate) fn set_kind(&mut self, i: usize, kind: TokenKind) {
        if let Some(&index) = self.sig.get(i) {
            self.tokens[index].kind = kind;
        }
    }

    pub(crate) fn is_nested(&self, i: usize) -> bool {
        self.nested.get(i).copied().unwrap_or(false)
    }

    /// Returns `true` if token `i` is the separator `text`.
    pub(crate) fn is_separator(&self, i: usize, text: &str) -> bool {
        self.kind(i) == Some(TokenKind::Separator) && self.upper(i) == text
    }

    /// Returns `true` if token `i` is a word outside nested macro statements.
    pub(crate) fn is_word(&self, i: usize) -> bool {
        self.kind(i).is_some_and(TokenKind::is_word) && !self.is_nested(i)
    }

    /// Returns `true` if token `i` can name a data set.
    pub(crate) fn is_name(&self, i: usize) -> bool {
        self.is_word(i)
            || matches!(
                self.kind(i),
                Some(TokenKind::MacroRef | TokenKind::NameLiteral)
            )
    }

    /// Index of the `)` / `]` / `}` closing the bracket at `open`, or
    /// [`Statement::len`] if it is never closed.
    pub(crate) fn matching_close(&self, open: usize) -> usize {
        let mut depth = 0usize;
        for i in open..self.len() {
            match self.upper(i) {
                "(" | "[" | "{" if self.kind(i) == Some(TokenKind::Separator) => depth += 1,
                ")" | "]" | "}" if self.kind(i) == Some(TokenKind::Separator) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i;
                    }
                }
                _ => {}
            }
        }
        self.len()
    }

    /// Start of the first token.
    pub(crate) fn start(&self) -> Position {
        self.tokens.first().map(|token| token.start).unwrap_or_default()
    }

    /// End of the last token.
    pub(crate) fn end(&self) -> Position {
        self.tokens.last().map(|token| token.end).unwrap_or_default()
    }

    /// Start of significant token `i`, or the statement end.
    pub(crate) fn start_of(&self, i: usize) -> Position {
        self.token(i).map_or_else(|| self.end(), |token| token.start)
    }
}
