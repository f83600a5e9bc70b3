//! Shared helpers for syntax table and zone tests.
#![allow(dead_code, unused_imports)]

pub use sas_ide::{
    classify_position, document_symbols, AnalysisConfig, Classification, SyntaxTable, Zone,
    ZoneClassifier,
};
pub use sas_syntax::{EditDescriptor, Position, Range, StaticKeywordDatabase, TokenKind};

/// Cursor marker in test sources.
pub const CURSOR: &str = "$0";

/// Builds a table over `source` with the built-in catalog.
pub fn table(source: &str) -> SyntaxTable<'static> {
    SyntaxTable::new(source, StaticKeywordDatabase::builtin(), &AnalysisConfig::default())
}

/// Strips the cursor marker, returning the text and the marker position.
pub fn extract_cursor(marked: &str) -> (String, Position) {
    let offset = marked.find(CURSOR).expect("source has no cursor marker");
    let before = &marked[..offset];
    let line = u32::try_from(before.matches('\n').count()).unwrap();
    let column = u32::try_from(before.len() - before.rfind('\n').map_or(0, |at| at + 1)).unwrap();
    let text = format!("{before}{}", &marked[offset + CURSOR.len()..]);
    (text, Position::new(line, column))
}

/// Classifies the marked position of `marked`.
pub fn classify(marked: &str) -> Classification {
    let (text, pos) = extract_cursor(marked);
    let table = table(&text);
    classify_position(&table, StaticKeywordDatabase::builtin(), pos)
}

/// The zone at the marked position of `marked`.
pub fn zone(marked: &str) -> Zone {
    classify(marked).zone
}

/// Renders a classification on one line, for compact assertions.
pub fn describe(classification: &Classification) -> String {
    let mut out = format!("{:?}", classification.zone);
    let names = [
        ("procedure", &classification.procedure),
        ("statement", &classification.statement),
        ("option", &classification.option),
        ("sub_option", &classification.sub_option),
        ("library", &classification.library),
    ];
    for (label, value) in names {
        if let Some(value) = value {
            out.push_str(&format!(" {label}={value}"));
        }
    }
    out
}

/// Asserts that `table` matches a table built from scratch over its text.
pub fn assert_matches_fresh(table: &SyntaxTable<'_>) {
    let fresh = self::table(&table.text());
    assert_eq!(table.tokens(), fresh.tokens(), "tokens differ from a fresh parse");
    assert_eq!(
        document_symbols(table.blocks()),
        document_symbols(fresh.blocks()),
        "blocks differ from a fresh parse"
    );
    assert_eq!(table.line_count(), fresh.line_count());
    for line in 0..fresh.line_count() {
        assert_eq!(table.line(line), fresh.line(line), "style spans differ on line {line}");
    }
}
