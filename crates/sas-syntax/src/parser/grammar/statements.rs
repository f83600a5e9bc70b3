//! Statement keyword resolution.
//!
//! Statement names are matched greedily over up to four words against the
//! knowledge base table chosen by the enclosing section. Matched words
//! become keywords, then the option list is walked with the statement as
//! option owner.

use smol_str::SmolStr;

use crate::knowledge::{OptionOwner, OptionType, StatementContext};
use crate::lexer::TokenKind;
use crate::parser::frame::{Continuation, ParserFrame};
use crate::parser::source::Statement;

use super::super::BlockParser;

/// Longest multi-word statement name.
const MAX_STATEMENT_WORDS: usize = 4;

/// Data step statements followed by data set names.
const DATASET_STATEMENTS: &[&str] = &["SET", "MERGE", "UPDATE", "MODIFY"];

impl BlockParser<'_, '_> {
    // =========================================================================
    // Matching helpers
    // =========================================================================

    /// Greedy longest match of 1-4 words starting at `i`.
    ///
    /// Returns the number of words matched and the joined name.
    pub(crate) fn match_words(
        &self,
        stmt: &Statement,
        i: usize,
        accept: impl Fn(&str) -> bool,
    ) -> Option<(usize, SmolStr)> {
        let available = (i..stmt.len())
            .take(MAX_STATEMENT_WORDS)
            .take_while(|&j| stmt.is_word(j))
            .count();
        (1..=available).rev().find_map(|n| {
            let name = (i..i + n)
                .map(|j| stmt.upper(j))
                .collect::<Vec<_>>()
                .join(" ");
            accept(&name).then(|| (n, SmolStr::new(name)))
        })
    }

    pub(crate) fn mark_keywords(stmt: &mut Statement, i: usize, n: usize) {
        for j in i..i + n {
            stmt.set_kind(j, TokenKind::Keyword);
        }
    }

    pub(crate) fn push_frame(&mut self, continuation: Continuation, name: &str) {
        let frame = match self.frames.last() {
            Some(top) => top.nested(continuation, name),
            None => ParserFrame::root().nested(continuation, name),
        };
        self.frames.push(frame);
    }

    pub(crate) fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    // =========================================================================
    // Statements by section
    // =========================================================================

    pub(crate) fn procedure_statement(&mut self, stmt: &mut Statement, i: usize, procedure: &str) {
        if procedure == "TEMPLATE" && self.template_statement(stmt, i) {
            return;
        }
        let kb = self.kb;
        if let Some((n, name)) =
            self.match_words(stmt, i, |name| kb.is_procedure_statement(procedure, name))
        {
            Self::mark_keywords(stmt, i, n);
            self.push_frame(Continuation::Statement, &name);
            if name == "WHERE" {
                self.expression(stmt, i + n);
            } else {
                let delimited = kb.requires_option_delimiter(Some(procedure), &name);
                let owner = OptionOwner::ProcedureStatement {
                    procedure,
                    statement: &name,
                };
                self.options(stmt, i + n, owner, delimited);
            }
            self.pop_frame();
            return;
        }
        self.global_statement(stmt, i);
    }

    pub(crate) fn data_step_statement(&mut self, stmt: &mut Statement, i: usize) {
        let word = SmolStr::new(stmt.upper(i));
        match word.as_str() {
            "IF" | "WHERE" | "DO" | "WHEN" => {
                stmt.set_kind(i, TokenKind::Keyword);
                self.expression(stmt, i + 1);
                return;
            }
            "ELSE" | "OTHERWISE" => {
                stmt.set_kind(i, TokenKind::Keyword);
                self.body_statement(stmt, i + 1);
                return;
            }
            "CALL" => {
                stmt.set_kind(i, TokenKind::Keyword);
                if stmt.is_word(i + 1) && self.kb.is_call_routine(stmt.upper(i + 1)) {
                    stmt.set_kind(i + 1, TokenKind::Keyword);
                }
                return;
            }
            _ => {}
        }

        let kb = self.kb;
        let Some((n, name)) = self.match_words(stmt, i, |name| {
            kb.is_statement(StatementContext::DataStep, name)
        }) else {
            self.global_statement(stmt, i);
            return;
        };
        Self::mark_keywords(stmt, i, n);
        self.push_frame(Continuation::Statement, &name);
        let owner = OptionOwner::Statement {
            context: StatementContext::DataStep,
            statement: &name,
        };
        if DATASET_STATEMENTS.contains(&name.as_str()) {
            self.dataset_list(stmt, i + n, owner);
        } else {
            let delimited = kb.requires_option_delimiter(None, &name);
            self.options(stmt, i + n, owner, delimited);
        }
        self.pop_frame();
    }

    /// Statements valid in any section (`TITLE`, `OPTIONS`, `ODS ...`).
    pub(crate) fn global_statement(&mut self, stmt: &mut Statement, i: usize) -> bool {
        if self.ods_statement(stmt, i) {
            return true;
        }
        let kb = self.kb;
        let Some((n, name)) = self.match_words(stmt, i, |name| {
            kb.is_statement(StatementContext::Global, name)
        }) else {
            return false;
        };
        Self::mark_keywords(stmt, i, n);
        self.push_frame(Continuation::Statement, &name);
        let delimited = kb.requires_option_delimiter(None, &name);
        let owner = OptionOwner::Statement {
            context: StatementContext::Global,
            statement: &name,
        };
        self.options(stmt, i + n, owner, delimited);
        self.pop_frame();
        true
    }

    /// `%LET`, `%PUT`, `%GLOBAL` ... as a statement of their own.
    pub(crate) fn macro_statement(&mut self, stmt: &mut Statement, i: usize) {
        let name = SmolStr::new(stmt.upper(i));
        if !self.kb.is_statement(StatementContext::Macro, &name) {
            return;
        }
        self.push_frame(Continuation::Statement, &name);
        let delimited = self.kb.requires_option_delimiter(None, &name);
        let owner = OptionOwner::Statement {
            context: StatementContext::Macro,
            statement: &name,
        };
        self.options(stmt, i + 1, owner, delimited);
        self.pop_frame();
    }

    // =========================================================================
    // Options
    // =========================================================================

    /// Walks an option list from token `from` to the end of the statement.
    ///
    /// With `delimited`, options only start after a top-level `/`.
    pub(crate) fn options(
        &mut self,
        stmt: &mut Statement,
        from: usize,
        owner: OptionOwner<'_>,
        delimited: bool,
    ) {
        self.push_frame(Continuation::StatementOptions, "");
        if let Some(frame) = self.frames.last_mut() {
            frame.has_option_delimiter = delimited;
        }

        let mut active = !delimited;
        let mut depth = 0usize;
        let mut j = from;
        while j < stmt.len() {
            if stmt.is_nested(j) {
                j += 1;
                continue;
            }
            let upper = SmolStr::new(stmt.upper(j));
            match upper.as_str() {
                "/" if depth == 0 && stmt.is_separator(j, "/") => active = true,
                "(" | "[" | "{" if stmt.kind(j) == Some(TokenKind::Separator) => depth += 1,
                ")" | "]" | "}" if stmt.kind(j) == Some(TokenKind::Separator) => {
                    depth = depth.saturating_sub(1);
                }
                word if active
                    && depth == 0
                    && stmt.is_word(j)
                    && self.kb.is_option(owner, word) =>
                {
                    stmt.set_kind(j, TokenKind::Keyword);
                    j = self.option_value(stmt, j, owner);
                    continue;
                }
                _ => {}
            }
            j += 1;
        }
        self.pop_frame();
    }

    /// Classifies what follows option `j`: sub-options in parentheses, then
    /// `= value`. Returns the index after the value.
    fn option_value(&mut self, stmt: &mut Statement, j: usize, owner: OptionOwner<'_>) -> usize {
        let option = SmolStr::new(stmt.upper(j));
        let kind = self.kb.option_type(owner, &option);
        let mut k = j + 1;

        if stmt.is_separator(k, "(") {
            k = self.sub_options(stmt, k, owner, &option);
        }
        if !stmt.is_separator(k, "=") {
            return k;
        }
        k += 1;

        if stmt.is_separator(k, "[") || stmt.is_separator(k, "{") {
            return self.style_attributes(stmt, k);
        }
        if stmt.is_separator(k, "(") {
            return self.sub_options(stmt, k, owner, &option);
        }
        if kind == Some(OptionType::DataSet) && stmt.is_name(k) {
            return self.dataset_spec(stmt, k);
        }
        k + 1
    }

    /// Marks sub-options between the bracket at `open` and its match.
    fn sub_options(
        &mut self,
        stmt: &mut Statement,
        open: usize,
        owner: OptionOwner<'_>,
        option: &str,
    ) -> usize {
        let close = stmt.matching_close(open);
        for k in open + 1..close {
            if stmt.is_word(k) && self.kb.is_sub_option(owner, option, stmt.upper(k)) {
                stmt.set_kind(k, TokenKind::Keyword);
            }
        }
        close + 1
    }

    // =========================================================================
    // Data sets
    // =========================================================================

    /// `[libref.]name[(option=value ...)]` starting at `k`. Returns the index
    /// after the specification.
    pub(crate) fn dataset_spec(&mut self, stmt: &mut Statement, k: usize) -> usize {
        let mut next = k + 1;
        if stmt.is_separator(next, ".") && stmt.is_name(next + 1) {
            next += 2;
        }
        if !stmt.is_separator(next, "(") {
            return next;
        }

        self.push_frame(Continuation::DatasetOptions, stmt.upper(k));
        let close = stmt.matching_close(next);
        let mut m = next + 1;
        while m < close {
            if stmt.is_separator(m, "(") {
                m = stmt.matching_close(m) + 1;
                continue;
            }
            if stmt.is_word(m) && self.kb.is_option(OptionOwner::DataSet, stmt.upper(m)) {
                stmt.set_kind(m, TokenKind::Keyword);
            }
            m += 1;
        }
        self.pop_frame();
        close + 1
    }

    /// `SET a b(keep=x) end=eof;`: data set names mixed with statement
    /// options.
    fn dataset_list(&mut self, stmt: &mut Statement, from: usize, owner: OptionOwner<'_>) {
        let mut j = from;
        while j < stmt.len() {
            if stmt.is_nested(j) {
                j += 1;
                continue;
            }
            if stmt.is_word(j)
                && stmt.is_separator(j + 1, "=")
                && self.kb.is_option(owner, stmt.upper(j))
            {
                stmt.set_kind(j, TokenKind::Keyword);
                j = self.option_value(stmt, j, owner);
            } else if stmt.is_name(j) {
                j = self.dataset_spec(stmt, j);
            } else {
                j += 1;
            }
        }
    }
}
