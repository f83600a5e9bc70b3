//! Finding and parsing the statement around the cursor.

use sas_syntax::lexer::is_macro_statement;
use sas_syntax::{BlockKind, KeywordDatabase, Position, Scanner, StatementContext, TokenKind};
use smol_str::SmolStr;

use super::ast::{parse_statement, Leaf, Shape, StatementAst};
use super::ZoneError;
use crate::syntax_table::{BlockQuery, SyntaxTable};

/// The step the statement belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Section {
    Global,
    Procedure(SmolStr),
    DataStep,
}

/// The grammar a statement is classified with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RuleSet {
    Global,
    ProcedureDefinition,
    ProcedureStatement,
    DataStepDefinition,
    DataStepStatement,
    MacroDefinition,
    MacroStatement,
    Ods,
    /// A `PROC TEMPLATE` statement; `graph` inside `BEGINGRAPH`.
    Template { graph: bool },
    /// `STYLE` and `CLASS` inside `PROC TEMPLATE`.
    Style,
    If,
    Where,
    SetFamily,
    Call,
    FormatFamily,
    Assignment,
}

impl RuleSet {
    fn shape(self, head: usize) -> Shape {
        match self {
            RuleSet::If | RuleSet::Where | RuleSet::Call => Shape::Expression { head },
            RuleSet::Assignment => Shape::Assignment,
            _ => Shape::Options,
        }
    }
}

/// The statement around a cursor position.
#[derive(Debug, Clone)]
pub(crate) struct Statement {
    pub(crate) section: Section,
    /// Inside `BEGINGRAPH ... ENDGRAPH` of `PROC TEMPLATE`.
    pub(crate) graph: bool,
    /// `None` when the cursor is before the statement's first word.
    pub(crate) rules: Option<RuleSet>,
    /// Upper-case statement name, multi-word names joined by one space.
    pub(crate) name: SmolStr,
    /// Number of top-level items making up the statement name.
    pub(crate) head_items: usize,
    pub(crate) ast: StatementAst,
}

pub(crate) fn statement_at(
    table: &SyntaxTable<'_>,
    kb: &dyn KeywordDatabase,
    pos: Position,
) -> Result<Statement, ZoneError> {
    let floor = table
        .block_at(
            pos,
            BlockQuery {
                ignore_custom: true,
                ..BlockQuery::default()
            },
        )
        .map_or(Position::default(), |id| table.blocks().block(id).start);
    let start = statement_start(table, pos, floor);
    let (section, graph) = section_at(table, start);

    let (mut leaves, end) = rescan(table, start, pos)?;
    if section == Section::DataStep
        && leaves.len() >= 2
        && leaves[0].is_name()
        && leaves[1].is_separator(":")
        && leaves[1].end <= pos
    {
        leaves = leaves.split_off(2);
    }

    let rules = leaves
        .first()
        .filter(|first| first.start < pos)
        .map(|_| rule_set(&section, &leaves, graph));
    let (name, head_words) = match rules {
        Some(rules) => statement_name(rules, &section, &leaves, kb),
        None => (SmolStr::default(), 0),
    };
    let head = if rules == Some(RuleSet::If)
        && leaves
            .get(1)
            .is_some_and(|leaf| matches!(leaf.text.as_str(), "WHILE" | "UNTIL"))
    {
        2
    } else {
        1
    };
    let ast = parse_statement(&leaves, rules.map_or(Shape::Options, |rules| rules.shape(head)), end);
    let head_items = leaves
        .get(head_words.saturating_sub(1))
        .filter(|_| head_words > 0)
        .map_or(0, |last| {
            ast.items
                .iter()
                .take_while(|item| item.start() < last.end)
                .count()
        });
    Ok(Statement {
        section,
        graph,
        rules,
        name,
        head_items,
        ast,
    })
}

/// Scans back from `pos` to where the statement under the cursor begins.
fn statement_start(table: &SyntaxTable<'_>, pos: Position, floor: Position) -> Position {
    let model = table.model();
    let tokens = table.tokens();
    let before = tokens.partition_point(|token| token.start < pos);
    for token in tokens[..before].iter().rev() {
        if token.end <= floor {
            return floor;
        }
        match token.kind {
            TokenKind::Separator if token.end <= pos && model.char_at(token.start) == Some(';') => {
                return token.end;
            }
            TokenKind::MacroSectionKeyword => return token.start,
            TokenKind::MacroKeyword => {
                let word = token.text(model).to_ascii_uppercase();
                if is_macro_statement(&word) {
                    return token.start;
                }
                if token.end < pos && matches!(word.as_str(), "%THEN" | "%ELSE") {
                    return token.end;
                }
            }
            kind if kind.is_word() && token.end < pos => {
                let word = token.text(model).to_ascii_uppercase();
                if matches!(word.as_str(), "THEN" | "ELSE") {
                    return token.end;
                }
            }
            _ => {}
        }
    }
    floor
}

/// The step containing a statement start, and whether it lies inside a
/// `BEGINGRAPH` block of `PROC TEMPLATE`.
fn section_at(table: &SyntaxTable<'_>, start: Position) -> (Section, bool) {
    let strict = BlockQuery {
        strict: true,
        ignore_custom: true,
        ignore_global: false,
    };
    let id = table.block_at(start, strict).or_else(|| {
        table
            .block_at(
                start,
                BlockQuery {
                    ignore_custom: true,
                    ..BlockQuery::default()
                },
            )
            .filter(|&id| !table.blocks().block(id).explicitly_terminated)
    });
    let Some(block) = id.map(|id| table.blocks().block(id)) else {
        return (Section::Global, false);
    };
    match block.kind {
        BlockKind::Procedure => {
            let graph = block.name == "TEMPLATE" && graph_depth(table, block.start, start) > 0;
            (Section::Procedure(block.name.clone()), graph)
        }
        BlockKind::Data => (Section::DataStep, false),
        BlockKind::Macro | BlockKind::Global | BlockKind::Custom => (Section::Global, false),
    }
}

fn graph_depth(table: &SyntaxTable<'_>, from: Position, to: Position) -> i32 {
    let model = table.model();
    table
        .tokens()
        .iter()
        .skip_while(|token| token.start < from)
        .take_while(|token| token.start < to)
        .filter(|token| token.kind.is_word())
        .map(|token| match token.text(model).to_ascii_uppercase().as_str() {
            "BEGINGRAPH" => 1,
            "ENDGRAPH" => -1,
            _ => 0,
        })
        .sum()
}

/// Re-scans the statement from `start` to its `;`, returning its significant
/// tokens and where it ends.
fn rescan(
    table: &SyntaxTable<'_>,
    start: Position,
    pos: Position,
) -> Result<(Vec<Leaf>, Position), ZoneError> {
    let model = table.model();
    let mut leaves = Vec::new();
    for token in Scanner::with_options(model, start, table.options().scanner.clone()) {
        if token.kind == TokenKind::Separator && model.char_at(token.start) == Some(';') {
            return Ok((leaves, token.start));
        }
        if token.kind.is_opaque() && token.start < pos && pos < token.end {
            return Err(ZoneError::Desync { pos });
        }
        if !token.kind.is_trivia() {
            leaves.push(Leaf::from_token(&token, model));
        }
    }
    Ok((leaves, model.end()))
}

fn rule_set(section: &Section, leaves: &[Leaf], graph: bool) -> RuleSet {
    let Some(first) = leaves.first() else {
        return section_rules(section, graph);
    };
    let assigns = leaves.get(1).is_some_and(|leaf| leaf.is_separator("="));
    match first.kind {
        TokenKind::MacroSectionKeyword if first.text == "%MACRO" => RuleSet::MacroDefinition,
        TokenKind::MacroSectionKeyword | TokenKind::MacroKeyword => RuleSet::MacroStatement,
        kind if kind.is_word() => match (first.text.as_str(), section) {
            ("DATA", _) if !assigns => RuleSet::DataStepDefinition,
            ("PROC" | "PROCEDURE", _) => RuleSet::ProcedureDefinition,
            ("ODS", _) => RuleSet::Ods,
            ("STYLE" | "CLASS", Section::Procedure(procedure)) if procedure == "TEMPLATE" => {
                RuleSet::Style
            }
            (_, Section::Procedure(procedure)) if procedure == "TEMPLATE" => {
                RuleSet::Template { graph }
            }
            ("WHERE", _) => RuleSet::Where,
            ("FORMAT" | "INFORMAT", Section::Procedure(_) | Section::DataStep) => {
                RuleSet::FormatFamily
            }
            (_, Section::Procedure(_)) => RuleSet::ProcedureStatement,
            ("IF" | "DO" | "WHEN" | "SELECT" | "WHILE" | "UNTIL", Section::DataStep) => RuleSet::If,
            ("SET" | "MERGE" | "UPDATE" | "MODIFY", Section::DataStep) => RuleSet::SetFamily,
            ("CALL", Section::DataStep) => RuleSet::Call,
            (_, Section::DataStep) if assigns => RuleSet::Assignment,
            (_, Section::DataStep) => RuleSet::DataStepStatement,
            (_, Section::Global) => RuleSet::Global,
        },
        TokenKind::MacroRef if assigns && *section == Section::DataStep => RuleSet::Assignment,
        _ => section_rules(section, graph),
    }
}

fn section_rules(section: &Section, graph: bool) -> RuleSet {
    match section {
        Section::Global => RuleSet::Global,
        Section::Procedure(procedure) if procedure == "TEMPLATE" => RuleSet::Template { graph },
        Section::Procedure(_) => RuleSet::ProcedureStatement,
        Section::DataStep => RuleSet::DataStepStatement,
    }
}

/// Longest statement name the knowledge base knows, up to four words.
fn statement_name(
    rules: RuleSet,
    section: &Section,
    leaves: &[Leaf],
    kb: &dyn KeywordDatabase,
) -> (SmolStr, usize) {
    let fixed = match rules {
        RuleSet::ProcedureDefinition => Some("PROC"),
        RuleSet::DataStepDefinition => Some("DATA"),
        RuleSet::MacroDefinition => Some("%MACRO"),
        _ => None,
    };
    if let Some(name) = fixed {
        return (SmolStr::new(name), 1);
    }
    let words: Vec<&str> = leaves
        .iter()
        .take(4)
        .take_while(|leaf| leaf.kind.is_word() || leaf.kind == TokenKind::MacroKeyword)
        .map(|leaf| leaf.text.as_str())
        .collect();
    let known = |name: &str| match (rules, section) {
        (RuleSet::MacroStatement, _) => kb.is_statement(StatementContext::Macro, name),
        (_, Section::Procedure(procedure)) => kb.is_procedure_statement(procedure, name),
        (_, Section::DataStep) => kb.is_statement(StatementContext::DataStep, name),
        (_, Section::Global) => kb.is_statement(StatementContext::Global, name),
    };
    (1..=words.len())
        .rev()
        .map(|n| (words[..n].join(" "), n))
        .find(|(name, _)| known(name))
        .map_or_else(
            || {
                (
                    leaves.first().map(|leaf| leaf.text.clone()).unwrap_or_default(),
                    1,
                )
            },
            |(name, n)| (SmolStr::new(name), n),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use sas_syntax::StaticKeywordDatabase;

    fn statement(source: &str, line: u32, column: u32) -> Statement {
        let kb = StaticKeywordDatabase::builtin();
        let table = SyntaxTable::new(source, kb, &AnalysisConfig::default());
        statement_at(&table, kb, Position::new(line, column)).expect("statement")
    }

    #[test]
    fn starts_after_the_previous_semicolon() {
        let found = statement("data a;\n  set b;\n  if x then y = 1;\nrun;\n", 1, 7);
        assert_eq!(found.section, Section::DataStep);
        assert_eq!(found.rules, Some(RuleSet::SetFamily));
        assert_eq!(found.name, "SET");
    }

    #[test]
    fn then_starts_a_statement() {
        let found = statement("data a;\n  if x then y = 1;\nrun;\n", 1, 15);
        assert_eq!(found.rules, Some(RuleSet::Assignment));
        let found = statement("data a;\n  if x then y = 1;\nrun;\n", 1, 7);
        assert_eq!(found.rules, Some(RuleSet::If));
    }

    #[test]
    fn multi_word_statement_names() {
        let found = statement("proc sql;\n  create table x as select;\nquit;\n", 1, 16);
        assert_eq!(found.section, Section::Procedure("SQL".into()));
        assert_eq!(found.name, "CREATE TABLE");
        assert_eq!(found.head_items, 2);

        let found = statement("ods tagsets.excelxp file='x';\n", 0, 24);
        assert_eq!(found.rules, Some(RuleSet::Ods));
        assert_eq!(found.name, "ODS TAGSETS");
        assert_eq!(found.head_items, 2);
    }

    #[test]
    fn cursor_before_first_word_has_no_rules() {
        let found = statement("proc print;\n  \nrun;\n", 1, 2);
        assert_eq!(found.rules, None);
        assert_eq!(found.section, Section::Procedure("PRINT".into()));
    }

    #[test]
    fn terminated_step_is_left_at_its_end() {
        let found = statement("data a;\nrun;\n", 1, 4);
        assert_eq!(found.section, Section::Global);
        assert_eq!(found.rules, None);
    }

    #[test]
    fn macro_statement_inside_a_step() {
        let found = statement("data a;\n  %let x = 1;\nrun;\n", 1, 11);
        assert_eq!(found.rules, Some(RuleSet::MacroStatement));
        assert_eq!(found.name, "%LET");
    }

    #[test]
    fn graph_blocks_of_proc_template() {
        let source = "proc template;\n define statgraph g;\n  begingraph;\n   scatterplot x=a y=b;\n  endgraph;\n end;\nrun;\n";
        assert_eq!(statement(source, 3, 10).rules, Some(RuleSet::Template { graph: true }));
        assert_eq!(statement(source, 5, 3).rules, Some(RuleSet::Template { graph: false }));
    }
}
