//! Cursor zone classification scenarios.

mod common;

use common::*;

fn described(marked: &str) -> String {
    describe(&classify(marked))
}

// =============================================================================
// Literals and boundaries
// =============================================================================

#[test]
fn test_literal_zones() {
    assert_eq!(zone("title 'Rep$0ort';"), Zone::QuotedString);
    assert_eq!(zone("/* no$0te */\ndata a;\nrun;"), Zone::Comment);
    assert_eq!(zone("data a;\n  x = 12$034;\nrun;"), Zone::Numeric);
    assert_eq!(zone("data a;\n  x = '01jan20$020'd;\nrun;"), Zone::Literal);
}

#[test]
fn test_unterminated_comment_at_document_end() {
    assert_eq!(zone("data a;\n/* open$0"), Zone::Comment);
}

#[test]
fn test_token_boundaries() {
    // Start of a token belongs to what precedes it, end to the token.
    assert_eq!(zone("data a;\n  x = $01234;\nrun;"), Zone::Expression);
    assert_eq!(zone("data a;\n  x = 1234$0;\nrun;"), Zone::Numeric);
    assert_eq!(zone("title $0'Report';"), Zone::GlobalStatementOption);
}

#[test]
fn test_outside_document_is_restricted() {
    let table = table("data a;\nrun;\n");
    let kb = StaticKeywordDatabase::builtin();
    assert_eq!(
        classify_position(&table, kb, Position::new(9, 0)),
        Classification::default()
    );
    assert_eq!(
        classify_position(&table, kb, Position::new(0, 40)).zone,
        Zone::Restricted
    );
}

// =============================================================================
// Procedures
// =============================================================================

#[test]
fn test_procedure_option_value() {
    assert_eq!(
        described("proc print data=$0"),
        "ProcedureOptionValue procedure=PRINT statement=PROC option=DATA"
    );
}

#[test]
fn test_procedure_name_and_options() {
    assert_eq!(
        described("proc pri$0nt;"),
        "ProcedureName procedure=PRINT statement=PROC"
    );
    assert_eq!(
        described("proc print noo$0bs;"),
        "ProcedureOption procedure=PRINT statement=PROC option=NOOBS"
    );
    assert_eq!(zone("pro$0c print;"), Zone::GlobalStatement);
}

#[test]
fn test_blank_line_in_procedure() {
    assert_eq!(
        described("proc print;\n  $0\nrun;\n"),
        "ProcedureStatement procedure=PRINT"
    );
}

#[test]
fn test_procedure_statement_options() {
    let by = "proc sort data=a;\n  by descen$0ding x;\nrun;\n";
    assert_eq!(
        described(by),
        "ProcedureStatementOption procedure=SORT statement=BY option=DESCENDING"
    );
    assert_eq!(
        zone("proc sort data=a;\n  by descending x$0;\nrun;\n"),
        Zone::ProcedureStatementArgument
    );
    assert_eq!(
        zone("proc sort data=a;\n  b$0y x;\nrun;\n"),
        Zone::ProcedureStatement
    );
}

#[test]
fn test_delimited_procedure_statement() {
    assert_eq!(
        zone("proc freq data=a;\n  tables x$0 / nocol;\nrun;\n"),
        Zone::ProcedureStatementArgument
    );
    assert_eq!(
        described("proc freq data=a;\n  tables x / noco$0l;\nrun;\n"),
        "ProcedureStatementOption procedure=FREQ statement=TABLES option=NOCOL"
    );
}

#[test]
fn test_color_sub_option() {
    let source = "proc sgplot data=a;\n  scatter x=h y=w / markerattrs=(color=$0);\nrun;\n";
    assert_eq!(
        described(source),
        "Color procedure=SGPLOT statement=SCATTER option=MARKERATTRS sub_option=COLOR"
    );
}

#[test]
fn test_style_overrides() {
    assert_eq!(
        described("proc print data=a style(hea$0der)=[color=red];"),
        "StyleLocation procedure=PRINT statement=PROC option=STYLE"
    );
    assert_eq!(
        described("proc print data=a style(header)=[backgroundcolor=$0];"),
        "Color procedure=PRINT statement=PROC option=STYLE sub_option=BACKGROUNDCOLOR"
    );
}

#[test]
fn test_where_in_procedure() {
    assert_eq!(
        zone("proc print data=a;\n  where x$0 > 1;\nrun;\n"),
        Zone::WhereExpression
    );
}

#[test]
fn test_where_clause_in_sql_select() {
    let source = "proc sql;\n  select * from a where x$0 = 1;\nquit;\n";
    assert_eq!(
        described(source),
        "WhereExpression procedure=SQL statement=SELECT"
    );
    assert_eq!(
        zone("proc sql;\n  select * from a where x > 1 and y$0 < 2;\nquit;\n"),
        Zone::WhereExpression
    );
}

// =============================================================================
// Data step
// =============================================================================

#[test]
fn test_data_step_definition() {
    assert_eq!(zone("data$0 a;\nrun;"), Zone::DataStepDefinition);
    assert_eq!(
        described("data wor$0k.a;\nrun;"),
        "LibraryName statement=DATA library=WORK"
    );
    assert_eq!(
        described("data a / vi$0ew=b;\nrun;"),
        "DataStepDefinitionOption statement=DATA option=VIEW"
    );
}

#[test]
fn test_data_set_library_and_member() {
    assert_eq!(
        described("data a;\n  set sashelp.cl$0ass;\nrun;\n"),
        "DataSetName statement=SET library=SASHELP"
    );
    assert_eq!(
        described("data a;\n  set sash$0elp.class;\nrun;\n"),
        "LibraryName statement=SET library=SASHELP"
    );
}

#[test]
fn test_data_set_options() {
    assert_eq!(
        described("data a;\n  set b(kee$0p=x);\nrun;\n"),
        "DataSetOption statement=SET sub_option=KEEP"
    );
    assert_eq!(
        described("data a;\n  set b(where=(x$0 > 1));\nrun;\n"),
        "WhereExpression statement=SET sub_option=WHERE"
    );
}

#[test]
fn test_expressions_and_functions() {
    assert_eq!(zone("data a;\n  i$0f x then y = 1;\nrun;\n"), Zone::DataStepStatement);
    assert_eq!(zone("data a;\n  if x$0 then y = 1;\nrun;\n"), Zone::Expression);
    assert_eq!(zone("data a;\n  x = subs$0tr(y, 1);\nrun;\n"), Zone::Function);
    assert_eq!(zone("data a;\n  x = substr(y$0, 1);\nrun;\n"), Zone::FunctionArgument);
    assert_eq!(zone("data a;\n  x = &my$0var;\nrun;\n"), Zone::MacroReference);
}

#[test]
fn test_call_routines() {
    assert_eq!(zone("data a;\n  call sym$0put('x', y);\nrun;\n"), Zone::CallRoutine);
    assert_eq!(
        zone("data a;\n  call symput('x', y$0);\nrun;\n"),
        Zone::CallRoutineArgument
    );
}

#[test]
fn test_format_statement() {
    assert_eq!(zone("data a;\n  format d date9.$0;\nrun;\n"), Zone::Format);
    assert_eq!(zone("data a;\n  format d $0;\nrun;\n"), Zone::Format);
    assert_eq!(zone("data a;\n  informat d $0;\nrun;\n"), Zone::Informat);
    assert_eq!(zone("data a;\n  format d$0 date9.;\nrun;\n"), Zone::Expression);
}

// =============================================================================
// Global statements, ODS, macro language
// =============================================================================

#[test]
fn test_global_statements() {
    assert_eq!(zone("opt$0ions nodate;"), Zone::GlobalStatement);
    assert_eq!(
        described("options nod$0ate;"),
        "GlobalStatementOption statement=OPTIONS option=NODATE"
    );
}

#[test]
fn test_ods_statements() {
    assert_eq!(zone("ods ht$0ml;"), Zone::OdsDestination);
    assert_eq!(zone("ods tagsets.excel$0xp;"), Zone::TagsetName);
    assert_eq!(
        described("ods html fi$0le='a.html';"),
        "OdsStatementOption statement=ODS HTML option=FILE"
    );
    assert_eq!(
        described("ods _all_ clo$0se;"),
        "OdsStatementOption statement=ODS _ALL_ option=CLOSE"
    );
}

#[test]
fn test_macro_definition() {
    assert_eq!(
        described("%macro foo(x,y) /$0"),
        "MacroDefinitionOption statement=%MACRO"
    );
    assert_eq!(zone("%macro foo(x$0, y);"), Zone::MacroParameter);
    assert_eq!(zone("%macro fo$0o(x, y);"), Zone::MacroDefinition);
}

#[test]
fn test_macro_statements() {
    assert_eq!(zone("%let my$0var = 1;"), Zone::MacroVariable);
    assert_eq!(zone("%let x = ab$0c;"), Zone::MacroStatementBody);
    assert_eq!(zone("%le$0t x = 1;"), Zone::MacroStatement);
    assert_eq!(zone("%let x = %upc$0ase(&y);"), Zone::MacroFunction);
    assert_eq!(zone("%report(ds$0=a);"), Zone::MacroFunctionArgument);
}

#[test]
fn test_proc_template_statements() {
    let graph = "proc template;\n define statgraph g;\n  begingraph;\n   scatter$0plot x=a y=b;\n  endgraph;\n end;\nrun;\n";
    assert_eq!(zone(graph), Zone::GraphStatement);
    let option = "proc template;\n define statgraph g;\n  begingraph;\n   scatterplot x$0=a y=b;\n  endgraph;\n end;\nrun;\n";
    assert_eq!(zone(option), Zone::GraphStatementOption);
    let style = "proc template;\n define style s;\n  style header / backgroundcolor=$0;\n end;\nrun;\n";
    assert_eq!(
        described(style),
        "Color procedure=TEMPLATE statement=STYLE option=BACKGROUNDCOLOR"
    );
}

// =============================================================================
// Classifier state
// =============================================================================

#[test]
fn test_classifier_remembers_names() {
    let (text, pos) = extract_cursor("proc sort data=a;\n  by descen$0ding x;\nrun;\n");
    let table = table(&text);
    let mut classifier = ZoneClassifier::new(StaticKeywordDatabase::builtin());

    assert_eq!(classifier.classify(&table, pos), Zone::ProcedureStatementOption);
    assert_eq!(classifier.current_procedure_name(), Some("SORT"));
    assert_eq!(classifier.current_statement_name(), Some("BY"));
    assert_eq!(classifier.current_option_name(), Some("DESCENDING"));
    assert_eq!(classifier.current_sub_option_name(), None);
    assert_eq!(classifier.current_library_name(), None);

    classifier.classify(&table, Position::new(0, 2));
    assert_eq!(classifier.current_option_name(), None);
}

#[test]
fn test_classification_is_repeatable() {
    let source = "proc sgplot data=a;\n  scatter x=h y=w / markerattrs=(color=red);\nrun;\n";
    let table = table(source);
    let kb = StaticKeywordDatabase::builtin();
    for line in 0..table.line_count() {
        let len = u32::try_from(source.lines().nth(line as usize).map_or(0, str::len)).unwrap();
        for column in 0..=len {
            let pos = Position::new(line, column);
            assert_eq!(
                classify_position(&table, kb, pos),
                classify_position(&table, kb, pos),
                "classification at {pos} changed between calls"
            );
        }
    }
}

#[test]
fn test_classification_follows_edits() {
    let mut table = table("proc print;\nrun;\n");
    let kb = StaticKeywordDatabase::builtin();
    let edit = EditDescriptor::insert(table.model(), Position::new(0, 10), " data=");
    table.apply(edit);
    let classification = classify_position(&table, kb, Position::new(0, 16));
    assert_eq!(classification.zone, Zone::ProcedureOptionValue);
    assert_eq!(classification.option.as_deref(), Some("DATA"));
}
