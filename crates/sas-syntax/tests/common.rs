//! Shared helpers for scanner, parser and incremental tests.
#![allow(dead_code, unused_imports)]

pub use sas_syntax::{
    lex, parse, reparse, EditDescriptor, ParseOutput, ParserOptions, Position, Range,
    StaticKeywordDatabase, TextModel, Token, TokenKind,
};

/// Parses `source` with the built-in catalog and default options.
pub fn parse_source(source: &str) -> (TextModel, ParseOutput) {
    let model = TextModel::new(source);
    let output = parse(&model, StaticKeywordDatabase::builtin(), &ParserOptions::default());
    (model, output)
}

/// Non-blank tokens as `(kind, text)` pairs.
pub fn significant(source: &str) -> Vec<(TokenKind, String)> {
    let model = TextModel::new(source);
    lex(&model)
        .into_iter()
        .filter(|token| token.kind != TokenKind::Blank)
        .map(|token| (token.kind, token.text(&model)))
        .collect()
}

/// Classified non-blank tokens as `(kind, text)` pairs.
pub fn classified(source: &str) -> Vec<(TokenKind, String)> {
    let (model, output) = parse_source(source);
    output
        .tokens
        .into_iter()
        .filter(|token| token.kind != TokenKind::Blank)
        .map(|token| (token.kind, token.text(&model)))
        .collect()
}

/// Dumps classified tokens one per line, for expect-test snapshots.
pub fn token_dump(source: &str) -> String {
    classified(source)
        .into_iter()
        .map(|(kind, text)| format!("{kind:?} {text:?}\n"))
        .collect()
}

pub fn pos(line: u32, column: u32) -> Position {
    Position::new(line, column)
}

/// Asserts that the tokens tile `model` without gaps or overlaps.
pub fn assert_covers(model: &TextModel, tokens: &[Token]) {
    let mut at = Position::default();
    for token in tokens {
        assert_eq!(token.start, at, "gap or overlap before {token:?}");
        assert!(token.end > token.start, "empty token {token:?}");
        at = token.end;
    }
    assert_eq!(at, model.end(), "tokens stop before the end");
    let text: String = tokens.iter().map(|token| token.text(model)).collect();
    assert_eq!(text, model.text());
}

/// Applies `edit` incrementally and checks the result against a full parse.
///
/// Returns `true` if the edit was handled incrementally.
pub fn check_edit(source: &str, range: Range, text: &str) -> bool {
    let kb = StaticKeywordDatabase::builtin();
    let options = ParserOptions::default();
    let mut model = TextModel::new(source);
    let old = parse(&model, kb, &options);
    let edit = EditDescriptor::replace(&model, range, text);
    model.apply(&edit);

    let full = parse(&model, kb, &options);
    let Some(splice) = reparse(&old.tree, &edit, &model, kb, &options) else {
        return false;
    };
    let tokens = splice.merge_tokens(&old.tokens, &edit);
    assert_eq!(
        tokens, full.tokens,
        "tokens differ after replacing {range} with {text:?} in\n{source}"
    );
    assert_eq!(
        splice.tree.outline(),
        full.tree.outline(),
        "blocks differ after replacing {range} with {text:?} in\n{source}"
    );
    assert_eq!(splice.tree, full.tree);
    true
}
