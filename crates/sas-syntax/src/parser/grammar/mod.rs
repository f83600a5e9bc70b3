//! Statement grammar.
//!
//! Each statement is dispatched on its first word:
//! - `%MACRO` / `%MEND`: macro definitions
//! - `DATA`, `PROC` / `PROCEDURE`: step definitions
//! - `RUN` / `QUIT`: step ends
//! - anything else: a statement of the enclosing section, resolved against
//!   the knowledge base

mod sections;
mod special;
mod statements;

use smol_str::SmolStr;

use crate::lexer::TokenKind;
use crate::parser::frame::SectionState;
use crate::parser::source::Statement;

use super::BlockParser;

impl BlockParser<'_, '_> {
    /// Classifies one statement and updates the block tree.
    pub(crate) fn statement(&mut self, stmt: &mut Statement) {
        if stmt.len() == 0 {
            return;
        }

        // `label:` prefix.
        let mut i = 0;
        if stmt.kind(0) == Some(TokenKind::Text) && stmt.is_separator(1, ":") {
            i = 2;
        }

        let assignment = stmt.is_separator(i + 1, "=");
        let head = SmolStr::new(stmt.upper(i));
        match (stmt.kind(i), head.as_str()) {
            (Some(TokenKind::MacroSectionKeyword), "%MACRO") => self.macro_definition(stmt, i),
            (Some(TokenKind::MacroSectionKeyword), "%MEND") => self.macro_end(stmt),
            (Some(TokenKind::Text), "DATA") if !assignment => self.data_definition(stmt, i),
            (Some(TokenKind::Text), "PROC" | "PROCEDURE") if !assignment => {
                self.procedure_definition(stmt, i);
            }
            (Some(TokenKind::Text), "RUN" | "QUIT") if !assignment => self.step_end(stmt, i),
            _ => {
                self.ensure_section(stmt);
                self.body_statement(stmt, i);
                self.extend_open_blocks(stmt.end());
            }
        }
    }

    /// Classifies a statement of the current section starting at token `i`.
    pub(crate) fn body_statement(&mut self, stmt: &mut Statement, i: usize) {
        if i >= stmt.len() || stmt.is_nested(i) {
            return;
        }
        if stmt.kind(i) == Some(TokenKind::MacroKeyword) {
            self.macro_statement(stmt, i);
            return;
        }
        if !stmt.is_word(i) || stmt.is_separator(i + 1, "=") {
            return;
        }

        let frame = self.frames.last().cloned().unwrap_or_else(super::ParserFrame::root);
        match frame.state {
            SectionState::Procedure => {
                let procedure = frame.procedure_name.unwrap_or_default();
                self.procedure_statement(stmt, i, &procedure);
            }
            SectionState::Data => self.data_step_statement(stmt, i),
            SectionState::Global | SectionState::Macro => {
                self.global_statement(stmt, i);
            }
        }
    }
}
