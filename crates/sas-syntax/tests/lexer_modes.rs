mod common;

use common::*;
use sas_syntax::{Scanner, ScannerOptions};

#[test]
fn test_spans_cover_a_mixed_program() {
    let source = "\u{feff}options nodate;\r\n/* header */\n%macro m(x=1);\n  %put &x.;\n%mend;\n\
        data a;\n  input v;\n  datalines;\n1\n2\n;\nrun;\n\
        proc python;\nsubmit;\nprint('x; y')\nendsubmit;\nrun;\n* trailing;";
    let model = TextModel::new(source);
    let tokens = lex(&model);
    assert_covers(&model, &tokens);
}

#[test]
fn test_cards_data_is_one_token() {
    let tokens = significant("data a;\ninput x;\ncards;\n1\n2\n;\nrun;");
    let cards: Vec<_> = tokens
        .iter()
        .filter(|(kind, _)| *kind == TokenKind::CardsData)
        .collect();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].1, "\n1\n2\n");
}

#[test]
fn test_cards4_ends_at_four_semicolons() {
    let tokens = significant("data a;\ninput x $;\ndatalines4;\na;b\n;;;;\nrun;");
    let position = tokens
        .iter()
        .position(|(kind, _)| *kind == TokenKind::CardsData)
        .expect("cards data");
    assert_eq!(tokens[position].1, "\na;b\n");
    assert_eq!(tokens[position + 1], (TokenKind::Separator, ";;;;".to_string()));
    assert_eq!(tokens[position + 2], (TokenKind::Text, "run".to_string()));
}

#[test]
fn test_cards_word_not_followed_by_semicolon_is_text() {
    let tokens = significant("cards = 1;");
    assert!(!tokens.iter().any(|(kind, _)| *kind == TokenKind::CardsData));
}

#[test]
fn test_python_submit_block_is_embedded_code() {
    let source = "proc python;\nsubmit;\nx = 'a; b' # endsubmit;\nprint(x)\nendsubmit;\nrun;";
    let tokens = significant(source);
    let code: Vec<_> = tokens
        .iter()
        .filter(|(kind, _)| *kind == TokenKind::EmbeddedCode)
        .collect();
    assert_eq!(code.len(), 1);
    assert_eq!(code[0].1, "\nx = 'a; b' # endsubmit;\nprint(x)\n");
    assert!(tokens.contains(&(TokenKind::Text, "endsubmit".to_string())));
}

#[test]
fn test_lua_long_comments_hide_the_exit_marker() {
    let source = "proc lua;\nsubmit;\n--[==[ endsubmit; ]==]\nprint([[x]])\nendsubmit;\nrun;";
    let tokens = significant(source);
    let code = tokens
        .iter()
        .find(|(kind, _)| *kind == TokenKind::EmbeddedCode)
        .expect("embedded code");
    assert_eq!(code.1, "\n--[==[ endsubmit; ]==]\nprint([[x]])\n");
}

#[test]
fn test_embedded_code_stops_at_line_start_step() {
    let source = "proc python;\nsubmit;\nx = 1\ndata b;\nrun;";
    let tokens = significant(source);
    let code = tokens
        .iter()
        .find(|(kind, _)| *kind == TokenKind::EmbeddedCode)
        .expect("embedded code");
    assert_eq!(code.1, "\nx = 1\n");
    assert!(tokens.contains(&(TokenKind::Text, "data".to_string())));
}

#[test]
fn test_disabled_language_is_scanned_as_sas() {
    let model = TextModel::new("proc python;\nsubmit;\nx = 1\nendsubmit;\nrun;");
    let options = ScannerOptions {
        embedded_languages: Vec::new(),
    };
    let tokens: Vec<_> = Scanner::with_options(&model, Position::default(), options).collect();
    assert!(!tokens.iter().any(|token| token.kind == TokenKind::EmbeddedCode));
}

#[test]
fn test_macro_quoting_makes_semicolons_text() {
    let tokens = significant("%let s = %str(a;b);");
    assert!(tokens.contains(&(TokenKind::Text, ";".to_string())));
    assert_eq!(tokens.last(), Some(&(TokenKind::Separator, ";".to_string())));
}

#[test]
fn test_macro_quoting_needs_an_open_paren() {
    let tokens = significant("%let s = %str;");
    assert_eq!(tokens.last(), Some(&(TokenKind::Separator, ";".to_string())));
}

#[test]
fn test_escaped_characters_inside_quoting_are_text() {
    let tokens = significant("%let s = %str(it%'s);");
    assert!(tokens.contains(&(TokenKind::Text, "%'".to_string())));
    assert!(!tokens.iter().any(|(kind, _)| *kind == TokenKind::String));
}

#[test]
fn test_byte_quoting_makes_bare_quotes_text() {
    let tokens = significant("%let s = %bquote(it's);");
    assert!(!tokens.iter().any(|(kind, _)| *kind == TokenKind::String));
    assert_eq!(tokens.last(), Some(&(TokenKind::Separator, ";".to_string())));
}

#[test]
fn test_macro_words() {
    let tokens = significant("%macro m; %let x = &y..z; %mycall(1); %mend;");
    assert_eq!(tokens[0], (TokenKind::MacroSectionKeyword, "%macro".to_string()));
    assert!(tokens.contains(&(TokenKind::MacroKeyword, "%let".to_string())));
    assert!(tokens.contains(&(TokenKind::MacroRef, "&y.".to_string())));
    assert!(tokens.contains(&(TokenKind::MacroRef, "%mycall".to_string())));
    assert!(tokens.contains(&(TokenKind::MacroSectionKeyword, "%mend".to_string())));
}

#[test]
fn test_macro_comment_only_at_statement_start() {
    let tokens = significant("%* note; x = 1;");
    assert_eq!(tokens[0], (TokenKind::MacroComment, "%* note;".to_string()));
}

#[test]
fn test_restarted_scanner_matches_fresh_scanner() {
    let model = TextModel::new("data a;\n  x = 1;\nrun;\nproc print;\nrun;");
    let mut scanner = Scanner::new(&model, Position::default());
    for _ in scanner.by_ref().take(5) {}
    scanner.restart(Position::new(3, 0));
    let restarted: Vec<_> = scanner.collect();
    let fresh: Vec<_> = Scanner::new(&model, Position::new(3, 0)).collect();
    assert_eq!(restarted, fresh);
}
