mod common;

use common::*;
use expect_test::expect;
use sas_syntax::parser::Continuation;
use sas_syntax::{BlockKind, BlockParser};

fn outline(source: &str) -> String {
    let (_, output) = parse_source(source);
    let problems = output.tree.violations();
    assert!(problems.is_empty(), "{problems:?}");
    output.tree.outline()
}

#[test]
fn test_sibling_procedures_fold_separately() {
    expect![[r#"
Procedure "PRINT" 0:0..2:4 fold=2
Procedure "SORT" 3:0..5:4 fold=5
"#]]
    .assert_eq(&outline(
        "proc print data=a;\n  var x;\nrun;\nproc sort data=a;\n  by x;\nrun;",
    ));
}

#[test]
fn test_fold_steps_back_when_next_block_shares_the_line() {
    expect![[r#"
Procedure "PRINT" 0:0..2:4 fold=1
Procedure "SORT" 2:5..4:4 fold=4
"#]]
    .assert_eq(&outline(
        "proc print;\n  var x;\nrun; proc sort;\n  by x;\nrun;",
    ));
}

#[test]
fn test_global_statements_form_a_block() {
    expect![[r#"
Global "" 0:0..1:10 fold=1 implicit
Procedure "PRINT" 2:0..3:4 fold=3
"#]]
    .assert_eq(&outline("options nodate;\ntitle 'x';\nproc print;\nrun;"));
}

#[test]
fn test_data_step_name_includes_library() {
    expect![[r#"
Data "WORK.A" 0:0..2:4 fold=2
"#]]
    .assert_eq(&outline("data work.a;\n  x = 1;\nrun;"));
}

#[test]
fn test_next_step_closes_an_unterminated_step() {
    expect![[r#"
Data "A" 0:0..1:8 fold=1 implicit
Procedure "PRINT" 2:0..3:4 fold=3
"#]]
    .assert_eq(&outline("data a;\n  x = 1;\nproc print;\nrun;"));
}

#[test]
fn test_macro_contains_steps_and_globals() {
    expect![[r#"
Macro "M" 0:0..5:6 fold=5
  Data "A" 1:2..3:6 fold=3
  Global "" 4:2..4:10 fold=4 implicit
"#]]
    .assert_eq(&outline(
        "%macro m(x);\n  data a;\n    set b;\n  run;\n  %put &x;\n%mend;",
    ));
}

#[test]
fn test_unterminated_macro_runs_to_document_end() {
    expect![[r#"
Macro "M" 0:0..3:0 fold=3 implicit
  Data "A" 1:0..2:4 fold=2
"#]]
    .assert_eq(&outline("%macro m;\ndata a;\nrun;\n"));
}

#[test]
fn test_mend_closes_open_step_inside_macro() {
    expect![[r#"
Macro "M" 0:0..3:6 fold=3
  Procedure "PRINT" 1:0..2:8 fold=2 implicit
"#]]
    .assert_eq(&outline("%macro m;\nproc print;\n  var x;\n%mend;"));
}

#[test]
fn test_region_contains_the_steps_it_covers() {
    expect![[r#"
Custom "Load" 0:0..4:15 fold=4
  Data "A" 1:0..3:4 fold=3
Procedure "PRINT" 5:0..6:4 fold=6
"#]]
    .assert_eq(&outline(
        "/* region Load */\ndata a;\n  set b;\nrun;\n/* endregion */\nproc print;\nrun;",
    ));
}

#[test]
fn test_region_inside_macro_is_its_child() {
    expect![[r#"
Macro "M" 0:0..4:6 fold=4
  Custom "inner" 1:0..3:14 fold=3
    Global "" 2:0..2:8 fold=2 implicit
"#]]
    .assert_eq(&outline(
        "%macro m;\n* region inner;\n%put hi;\n* endregion x;\n%mend;",
    ));
}

#[test]
fn test_unclosed_region_is_clamped_to_document_end() {
    expect![[r#"
Custom "" 0:0..2:4 fold=2 implicit
  Data "A" 1:0..2:4 fold=2
"#]]
    .assert_eq(&outline("/* region */\ndata a;\nrun;"));
}

#[test]
fn test_region_boundaries_cut_global_blocks() {
    expect![[r#"
Global "" 0:0..0:15 fold=0 implicit
Custom "Titles" 1:0..3:15 fold=3
  Global "" 2:0..2:15 fold=2 implicit
Global "" 4:0..4:13 fold=4 implicit
"#]]
    .assert_eq(&outline(
        "options nodate;\n/* region Titles */\ntitle 'Report';\n/* endregion */\nfootnote 'x';",
    ));
}

#[test]
fn test_region_opened_inside_a_step_wraps_it() {
    expect![[r#"
Custom "Body" 0:0..4:4 fold=3
  Procedure "PRINT" 0:0..4:4 fold=4
Procedure "SORT" 4:5..5:4 fold=5
"#]]
    .assert_eq(&outline(
        "proc print;\n/* region Body */\n  var x;\n/* endregion */\nrun; proc sort;\nrun;",
    ));
}

#[test]
fn test_region_ending_inside_a_step_waits_for_the_step() {
    expect![[r#"
Custom "Load" 0:0..3:4 fold=3
  Data "A" 1:0..3:4 fold=3
Procedure "PRINT" 4:0..5:4 fold=5
"#]]
    .assert_eq(&outline(
        "/* region Load */\ndata a;\n/* endregion */\nrun;\nproc print;\nrun;",
    ));
}

#[test]
fn test_nested_regions_steps_and_macros_keep_the_tree_consistent() {
    let sources = [
        "/* region A */\nproc print; run;\n/* endregion */",
        "/* region A */\n%macro m;\n/* region B */\ndata a; run;\n%mend;\n/* endregion */",
        "%macro m;\n/* region A */\nproc print;\n%mend;\n/* endregion */\nrun;",
        "data a;\n/* region A */\n/* region B */\nx = 1;\n/* endregion */\n/* endregion */\nrun;",
        "/* region A */\noptions nodate;\nproc sort; by x;\n/* endregion */\n/* endregion */\nrun;",
        "/* region A */\n/* region B */\ndata a; run;\n/* endregion */\nproc print; run;",
    ];
    for source in sources {
        let (model, output) = parse_source(source);
        let problems = output.tree.violations();
        assert!(problems.is_empty(), "{problems:?} in\n{source}\n{}", output.tree.outline());
        assert_covers(&model, &output.tokens);
    }
}

#[test]
fn test_run_does_not_close_run_group_procedures() {
    expect![[r#"
Procedure "SQL" 0:0..4:5 fold=4
"#]]
    .assert_eq(&outline(
        "proc sql;\n  select * from a;\nrun;\n  select * from b;\nquit;",
    ));
}

#[test]
fn test_run_group_is_configurable() {
    let model = TextModel::new("proc print;\nrun;\n  var x;\nquit;");
    let mut options = ParserOptions::default();
    options.run_group_procedures.insert("PRINT".into());
    let tree = parse(&model, StaticKeywordDatabase::builtin(), &options).tree;
    assert_eq!(tree.roots().len(), 1);
    assert_eq!(tree.block(tree.roots()[0]).end, pos(3, 5));
}

#[test]
fn test_stray_run_is_a_global_statement() {
    expect![[r#"
Global "" 0:0..0:4 fold=0 implicit
Procedure "PRINT" 1:0..2:4 fold=2
"#]]
    .assert_eq(&outline("run;\nproc print;\nrun;"));
}

#[test]
fn test_run_as_variable_or_label_does_not_close() {
    expect![[r#"
Data "A" 0:0..2:4 fold=2
"#]]
    .assert_eq(&outline("data a;\n  run = 1;\nrun;"));
    expect![[r#"
Data "A" 0:0..2:4 fold=2
"#]]
    .assert_eq(&outline("data a;\n  run: x = 1;\nrun;"));
}

#[test]
fn test_procedure_keywords_are_classified() {
    expect![[r#"
SectionKeyword "proc"
ProcName "print"
Keyword "data"
Separator "="
Text "a"
Keyword "noobs"
Separator ";"
Keyword "var"
Text "x"
Text "y"
Separator ";"
SectionKeyword "run"
Separator ";"
"#]]
    .assert_eq(&token_dump("proc print data=a noobs;\n  var x y;\nrun;"));
}

#[test]
fn test_data_set_options_are_keywords() {
    let tokens = classified("data out(keep=a b);\n  set in(where=(x>1)) end=eof;\nrun;");
    let keywords: Vec<_> = tokens
        .iter()
        .filter(|(kind, _)| *kind == TokenKind::Keyword)
        .map(|(_, text)| text.as_str())
        .collect();
    assert_eq!(keywords, vec!["keep", "set", "where", "end"]);
}

#[test]
fn test_delimited_options_start_after_slash() {
    let tokens = classified("%macro m(x, y) / minoperator;\n%mend;");
    assert!(tokens.contains(&(TokenKind::Keyword, "minoperator".to_string())));
    assert!(!tokens.contains(&(TokenKind::Keyword, "x".to_string())));
}

#[test]
fn test_multi_word_statements_match_greedily() {
    let tokens = classified("ods html close;");
    assert_eq!(tokens[0], (TokenKind::Keyword, "ods".to_string()));
    assert_eq!(tokens[1], (TokenKind::Keyword, "html".to_string()));
    assert_eq!(tokens[2], (TokenKind::Keyword, "close".to_string()));

    let tokens = classified("proc sql;\n  create table x as select 1 from y;\nquit;");
    assert!(tokens.contains(&(TokenKind::Keyword, "create".to_string())));
    assert!(tokens.contains(&(TokenKind::Keyword, "table".to_string())));
}

#[test]
fn test_nested_macro_statement_keeps_enclosing_statement_open() {
    expect![[r#"
Data "A" 0:0..2:4 fold=2
"#]]
    .assert_eq(&outline("data a;\n  x = 1 %let y = 2; + 3;\nrun;"));
}

#[test]
fn test_parser_tokens_cover_source() {
    let source = "options nodate;\n%macro m;\n/* region r */\ndata a;\n  input x;\ncards;\n1\n;\nrun;\n\
        /* endregion */\n%mend;\nproc python;\nsubmit;\nprint(1)\nendsubmit;\nrun;\n'open";
    let (model, output) = parse_source(source);
    assert_covers(&model, &output.tokens);
    assert!(output.tree.violations().is_empty());
}

#[test]
fn test_parser_can_start_mid_document() {
    let source = "data a;\nrun;\nproc print;\nrun;";
    let model = TextModel::new(source);
    let kb = StaticKeywordDatabase::builtin();
    let mut parser = BlockParser::starting_at(&model, kb, ParserOptions::default(), pos(2, 0));
    let tokens: Vec<_> = parser.by_ref().collect();
    let tree = parser.finish();
    assert_eq!(tokens[0].start, pos(2, 0));
    assert_eq!(tree.roots().len(), 1);
    assert_eq!(tree.block(tree.roots()[0]).kind, BlockKind::Procedure);
}

#[test]
fn test_literal_spans_are_recorded_on_blocks() {
    let (_, output) = parse_source("data a;\n  x = 'text'; /* note */\n  d = '01jan2024'd;\nrun;");
    let block = output.tree.block(output.tree.roots()[0]);
    assert_eq!(block.aux_ranges.len(), 3);
}

// =============================================================================
// Special statement frames
// =============================================================================

fn keywords(source: &str) -> Vec<String> {
    classified(source)
        .into_iter()
        .filter(|(kind, _)| *kind == TokenKind::Keyword)
        .map(|(_, text)| text)
        .collect()
}

/// Frame continuations left on the stack once `source` is consumed.
fn frames_after(source: &str) -> Vec<Continuation> {
    let model = TextModel::new(source);
    let mut parser =
        BlockParser::new(&model, StaticKeywordDatabase::builtin(), ParserOptions::default());
    parser.by_ref().for_each(drop);
    parser.frames().iter().map(|frame| frame.continuation).collect()
}

#[test]
fn test_expression_operators_in_data_step() {
    let source = "data b;\n  set a;\n  where x between 1 and 3 or name like 'A_';\n  \
        if not missing(y) then output;\nrun;";
    assert_eq!(
        keywords(source),
        vec!["set", "where", "between", "and", "or", "like", "if", "not", "missing", "then", "output"]
    );
    expect![[r#"
Data "B" 0:0..4:4 fold=4
"#]]
    .assert_eq(&outline(source));
}

#[test]
fn test_where_statement_in_procedure() {
    let source = "proc print data=a;\n  where x eq 1 and y in (1, 2);\nrun;";
    assert_eq!(keywords(source), vec!["data", "where", "eq", "and", "in"]);
    expect![[r#"
Procedure "PRINT" 0:0..2:4 fold=2
"#]]
    .assert_eq(&outline(source));
}

#[test]
fn test_style_attribute_brackets() {
    let source = "proc print data=a style=[backgroundcolor=red font_weight=bold];\nrun;";
    assert_eq!(
        keywords(source),
        vec!["data", "style", "backgroundcolor", "font_weight"]
    );
    let tokens = classified(source);
    assert!(tokens.contains(&(TokenKind::Separator, "[".to_string())));
    assert!(tokens.contains(&(TokenKind::Separator, "]".to_string())));
    assert!(!tokens.contains(&(TokenKind::Keyword, "red".to_string())));
    expect![[r#"
Procedure "PRINT" 0:0..1:4 fold=1
"#]]
    .assert_eq(&outline(source));
}

#[test]
fn test_ods_dotted_destination() {
    let source = "ods tagsets.excelxp file='x.xml' style=minimal;";
    assert_eq!(keywords(source), vec!["ods", "tagsets", "file", "style"]);
    let tokens = classified(source);
    assert!(tokens.contains(&(TokenKind::Separator, ".".to_string())));
    expect![[r#"
Global "" 0:0..0:47 fold=0 implicit
"#]]
    .assert_eq(&outline(source));
}

#[test]
fn test_ods_all_close() {
    let source = "ods _all_ close;";
    assert_eq!(keywords(source), vec!["ods", "_all_", "close"]);
    expect![[r#"
Global "" 0:0..0:16 fold=0 implicit
"#]]
    .assert_eq(&outline(source));
}

#[test]
fn test_begingraph_and_endgraph() {
    let head = "proc template;\n  define statgraph g;\n    begingraph;\n";
    assert_eq!(
        frames_after(head),
        vec![
            Continuation::SectionBody,
            Continuation::SectionBody,
            Continuation::TemplateDefine,
            Continuation::Graph,
        ]
    );
    let closed = format!("{head}      scatterplot x=a y=b;\n    endgraph;\n");
    assert_eq!(
        frames_after(&closed),
        vec![
            Continuation::SectionBody,
            Continuation::SectionBody,
            Continuation::TemplateDefine,
        ]
    );

    let source = format!("{closed}  end;\nquit;");
    let found = keywords(&source);
    for word in ["define", "statgraph", "begingraph", "scatterplot", "endgraph", "end"] {
        assert!(found.contains(&word.to_string()), "{word} in {found:?}");
    }
    expect![[r#"
Procedure "TEMPLATE" 0:0..6:5 fold=6
"#]]
    .assert_eq(&outline(&source));
}

#[test]
fn test_define_tagset_and_event() {
    let head = "proc template;\n  define tagset t;\n    define event e;\n";
    assert_eq!(
        frames_after(head),
        vec![
            Continuation::SectionBody,
            Continuation::SectionBody,
            Continuation::TagsetDefine,
            Continuation::EventDefine,
        ]
    );
    let body = format!("{head}      put 'x';\n    end;\n");
    assert_eq!(
        frames_after(&body),
        vec![
            Continuation::SectionBody,
            Continuation::SectionBody,
            Continuation::TagsetDefine,
        ]
    );
    let inner = format!("{body}  end;\n");
    assert_eq!(
        frames_after(&inner),
        vec![Continuation::SectionBody, Continuation::SectionBody]
    );

    let source = format!("{inner}quit;");
    assert_eq!(frames_after(&source), vec![Continuation::SectionBody]);
    let found = keywords(&source);
    assert_eq!(found.iter().filter(|word| *word == "define").count(), 2);
    assert_eq!(found.iter().filter(|word| *word == "end").count(), 2);
    assert!(found.contains(&"tagset".to_string()));
    assert!(found.contains(&"event".to_string()));
    expect![[r#"
Procedure "TEMPLATE" 0:0..6:5 fold=6
"#]]
    .assert_eq(&outline(&source));
}

#[test]
fn test_run_cancel_closes_the_step() {
    let source = "data a;\n  x = 1;\nrun cancel;\nproc print;\nrun;";
    let tokens = classified(source);
    assert!(tokens.contains(&(TokenKind::SectionKeyword, "run".to_string())));
    assert!(tokens.contains(&(TokenKind::Keyword, "cancel".to_string())));
    expect![[r#"
Data "A" 0:0..2:11 fold=2
Procedure "PRINT" 3:0..4:4 fold=4
"#]]
    .assert_eq(&outline(source));
}
