//! Statements with their own sub-grammar: expressions, ODS, style
//! attribute lists and PROC TEMPLATE definitions.

use smol_str::SmolStr;

use crate::knowledge::{OptionOwner, StatementContext};
use crate::lexer::TokenKind;
use crate::parser::frame::Continuation;
use crate::parser::source::Statement;

use super::super::BlockParser;

/// Word operators inside `IF`, `WHERE` and `DO` expressions.
const EXPRESSION_OPERATORS: &[&str] = &[
    "AND", "OR", "NOT", "IN", "EQ", "NE", "GT", "LT", "GE", "LE", "BETWEEN", "LIKE", "CONTAINS",
    "IS", "NULL", "MISSING", "TO", "BY", "WHILE", "UNTIL", "SAME", "ALSO",
];

/// Template kinds opened by `DEFINE <kind>` and closed by `END;`.
const TEMPLATE_KINDS: &[&str] = &[
    "STYLE", "TABLE", "STATGRAPH", "COLUMN", "HEADER", "FOOTER", "TAGSET", "EVENT", "CROSSTABS",
];

impl BlockParser<'_, '_> {
    // =========================================================================
    // Expressions
    // =========================================================================

    /// Marks word operators and known functions from `from` on. A `THEN` or
    /// `ELSE` ends the expression and restarts statement classification.
    pub(crate) fn expression(&mut self, stmt: &mut Statement, from: usize) {
        self.push_frame(Continuation::Expression, "");
        let mut j = from;
        while j < stmt.len() {
            if !stmt.is_word(j) {
                j += 1;
                continue;
            }
            let word = SmolStr::new(stmt.upper(j));
            if matches!(word.as_str(), "THEN" | "ELSE") {
                stmt.set_kind(j, TokenKind::Keyword);
                self.pop_frame();
                self.body_statement(stmt, j + 1);
                return;
            }
            if EXPRESSION_OPERATORS.contains(&word.as_str())
                || (stmt.is_separator(j + 1, "(") && self.kb.is_function(&word))
            {
                stmt.set_kind(j, TokenKind::Keyword);
            }
            j += 1;
        }
        self.pop_frame();
    }

    // =========================================================================
    // ODS
    // =========================================================================

    /// `ODS <destination>[.<tagset>] options;`
    pub(crate) fn ods_statement(&mut self, stmt: &mut Statement, i: usize) -> bool {
        if stmt.upper(i) != "ODS" || !stmt.is_word(i) {
            return false;
        }
        let kb = self.kb;
        let (n, name) = self
            .match_words(stmt, i, |name| kb.is_statement(StatementContext::Global, name))
            .unwrap_or((1, SmolStr::new_static("ODS")));
        Self::mark_keywords(stmt, i, n);
        self.push_frame(Continuation::Ods, &name);

        let mut j = i + n;
        // Dotted tagset name: `ODS TAGSETS.EXCELXP`.
        while stmt.is_separator(j, ".") && stmt.is_name(j + 1) {
            j += 2;
        }
        let delimited = kb.requires_option_delimiter(None, &name);
        let owner = OptionOwner::Statement {
            context: StatementContext::Global,
            statement: &name,
        };
        self.options(stmt, j, owner, delimited);
        self.pop_frame();
        true
    }

    // =========================================================================
    // Style attributes
    // =========================================================================

    /// `[attr=value ...]` or `{attr=value ...}` starting at the bracket
    /// `open`. Returns the index after the closing bracket.
    pub(crate) fn style_attributes(&mut self, stmt: &mut Statement, open: usize) -> usize {
        self.push_frame(Continuation::Style, "");
        let close = stmt.matching_close(open);
        for k in open + 1..close {
            if stmt.is_word(k)
                && stmt.is_separator(k + 1, "=")
                && self.kb.is_option(OptionOwner::Style, stmt.upper(k))
            {
                stmt.set_kind(k, TokenKind::Keyword);
            }
        }
        self.pop_frame();
        close + 1
    }

    // =========================================================================
    // PROC TEMPLATE
    // =========================================================================

    /// Template definition statements. Returns `false` if the statement is
    /// an ordinary procedure statement.
    pub(crate) fn template_statement(&mut self, stmt: &mut Statement, i: usize) -> bool {
        let word = SmolStr::new(stmt.upper(i));
        match word.as_str() {
            "DEFINE" => {
                stmt.set_kind(i, TokenKind::Keyword);
                let kind = SmolStr::new(stmt.upper(i + 1));
                if !stmt.is_word(i + 1) || !TEMPLATE_KINDS.contains(&kind.as_str()) {
                    return true;
                }
                stmt.set_kind(i + 1, TokenKind::Keyword);
                let continuation = match kind.as_str() {
                    "TAGSET" => Continuation::TagsetDefine,
                    "EVENT" => Continuation::EventDefine,
                    _ => Continuation::TemplateDefine,
                };
                self.push_frame(continuation, &kind);
                true
            }
            "END" => {
                stmt.set_kind(i, TokenKind::Keyword);
                if self
                    .frames
                    .last()
                    .is_some_and(|frame| frame.continuation.is_template_define())
                {
                    self.frames.pop();
                }
                true
            }
            "BEGINGRAPH" => {
                stmt.set_kind(i, TokenKind::Keyword);
                self.push_frame(Continuation::Graph, "BEGINGRAPH");
                true
            }
            "ENDGRAPH" => {
                stmt.set_kind(i, TokenKind::Keyword);
                if self
                    .frames
                    .last()
                    .is_some_and(|frame| frame.continuation == Continuation::Graph)
                {
                    self.frames.pop();
                }
                true
            }
            "STYLE" | "CLASS" if self.in_style_template() => {
                stmt.set_kind(i, TokenKind::Keyword);
                let mut j = i + 1;
                if stmt.is_name(j) {
                    j += 1;
                }
                if stmt.upper(j) == "FROM" && stmt.is_word(j) {
                    stmt.set_kind(j, TokenKind::Keyword);
                    j += 2;
                }
                self.options(stmt, j, OptionOwner::Style, true);
                true
            }
            _ => false,
        }
    }

    fn in_style_template(&self) -> bool {
        self.frames.iter().rev().any(|frame| {
            frame.continuation == Continuation::TemplateDefine && frame.name == "STYLE"
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::knowledge::StaticKeywordDatabase;
    use crate::lexer::TokenKind;
    use crate::parser::{parse, ParserOptions};
    use crate::text::TextModel;

    fn keywords(source: &str) -> Vec<String> {
        let model = TextModel::new(source);
        let output = parse(&model, StaticKeywordDatabase::builtin(), &ParserOptions::default());
        output
            .tokens
            .iter()
            .filter(|token| token.kind == TokenKind::Keyword)
            .map(|token| token.text(&model).to_ascii_uppercase())
            .collect()
    }

    #[test]
    fn then_restarts_classification() {
        let found = keywords("data a; set b; if x > 1 and y then output; run;");
        assert!(found.contains(&"IF".to_string()));
        assert!(found.contains(&"AND".to_string()));
        assert!(found.contains(&"THEN".to_string()));
        assert!(found.contains(&"OUTPUT".to_string()));
    }

    #[test]
    fn template_define_and_end_are_keywords() {
        let found = keywords("proc template; define style mystyle; end; run; quit;");
        assert_eq!(found.iter().filter(|word| *word == "DEFINE").count(), 1);
        assert!(found.contains(&"END".to_string()));
    }
}
