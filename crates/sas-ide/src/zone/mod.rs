//! Cursor zone classification.
//!
//! Given a position in a [`SyntaxTable`], the classifier decides what kind
//! of thing belongs there: a procedure name, an option of a procedure
//! statement, a data set name, a macro variable and so on. Completion and
//! hover use the zone to pick their candidates.
//!
//! Classification runs in four steps:
//!
//! 1. A position strictly inside a comment, literal, cards data or embedded
//!    code token maps to that literal zone directly.
//! 2. The table is scanned backward to the start of the statement under the
//!    cursor, and the enclosing step selects the rule set.
//! 3. The statement is re-scanned and parsed into a small AST, and the
//!    cursor is located in it.
//! 4. The cursor's role in the AST, the rule set and the option value types
//!    from the [`KeywordDatabase`] give the zone.

mod ast;
mod locate;
mod mapping;
mod statement;

use sas_syntax::{KeywordDatabase, Position, Token, TokenKind};
use serde::Serialize;
use smol_str::SmolStr;
use thiserror::Error;
use tracing::{debug, trace};

use crate::syntax_table::SyntaxTable;

/// What kind of text belongs at a cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Zone {
    // =========================================================================
    // LITERALS
    // =========================================================================
    /// Nothing can be suggested.
    #[default]
    Restricted,
    /// Inside a comment.
    Comment,
    /// Inside a `%*` macro comment.
    MacroComment,
    /// Inside a quoted string.
    QuotedString,
    /// Inside a date, time, hex, bit mask or name literal.
    Literal,
    /// Inside `CARDS` / `DATALINES` data.
    LiteralData,
    /// Inside embedded Python or Lua code.
    EmbeddedCode,
    /// On a numeric literal.
    Numeric,

    // =========================================================================
    // GLOBAL STATEMENTS
    // =========================================================================
    /// A statement keyword outside any step.
    GlobalStatement,
    /// An option of a global statement.
    GlobalStatementOption,
    /// An option value of a global statement.
    GlobalStatementOptionValue,
    /// A sub-option of a global statement.
    GlobalStatementSubOption,
    /// A sub-option value of a global statement.
    GlobalStatementSubOptionValue,

    // =========================================================================
    // PROCEDURES
    // =========================================================================
    /// The name after `PROC`.
    ProcedureName,
    /// An option of the `PROC` statement.
    ProcedureOption,
    /// An option value of the `PROC` statement.
    ProcedureOptionValue,
    /// A sub-option of the `PROC` statement.
    ProcedureSubOption,
    /// A sub-option value of the `PROC` statement.
    ProcedureSubOptionValue,
    /// A statement keyword inside a procedure.
    ProcedureStatement,
    /// A positional argument of a procedure statement.
    ProcedureStatementArgument,
    /// An option of a procedure statement.
    ProcedureStatementOption,
    /// An option value of a procedure statement.
    ProcedureStatementOptionValue,
    /// A sub-option of a procedure statement.
    ProcedureStatementSubOption,
    /// A sub-option value of a procedure statement.
    ProcedureStatementSubOptionValue,

    // =========================================================================
    // DATA STEP
    // =========================================================================
    /// The `DATA` keyword.
    DataStepDefinition,
    /// An option of the `DATA` statement, after `/`.
    DataStepDefinitionOption,
    /// An option value of the `DATA` statement.
    DataStepDefinitionOptionValue,
    /// A statement keyword inside a data step.
    DataStepStatement,
    /// An option of a data step statement.
    DataStepStatementOption,
    /// An option value of a data step statement.
    DataStepStatementOptionValue,
    /// A sub-option of a data step statement.
    DataStepStatementSubOption,
    /// A sub-option value of a data step statement.
    DataStepStatementSubOptionValue,

    // =========================================================================
    // DATA SETS
    // =========================================================================
    /// A data set name, or the member part of `lib.name`.
    DataSetName,
    /// A data set option inside `name(...)`.
    DataSetOption,
    /// A data set option value.
    DataSetOptionValue,
    /// A library reference.
    LibraryName,

    // =========================================================================
    // MACRO LANGUAGE
    // =========================================================================
    /// `%MACRO` or the macro name.
    MacroDefinition,
    /// A parameter of a macro definition.
    MacroParameter,
    /// An option of `%MACRO`, after `/`.
    MacroDefinitionOption,
    /// An option value of `%MACRO`.
    MacroDefinitionOptionValue,
    /// A macro statement keyword.
    MacroStatement,
    /// An option of a macro statement.
    MacroStatementOption,
    /// An option value of a macro statement.
    MacroStatementOptionValue,
    /// Free text of a macro statement.
    MacroStatementBody,
    /// A macro variable name.
    MacroVariable,
    /// A macro function such as `%SYSFUNC`.
    MacroFunction,
    /// An argument of a macro function or macro call.
    MacroFunctionArgument,
    /// `&var` or a `%name` macro call.
    MacroReference,

    // =========================================================================
    // ODS
    // =========================================================================
    /// The `ODS` keyword and statement words.
    OdsStatement,
    /// An option of an ODS statement.
    OdsStatementOption,
    /// An option value of an ODS statement.
    OdsStatementOptionValue,
    /// A sub-option of an ODS statement.
    OdsStatementSubOption,
    /// A sub-option value of an ODS statement.
    OdsStatementSubOptionValue,
    /// The destination after `ODS`.
    OdsDestination,
    /// The tagset name after `TAGSETS.`.
    TagsetName,

    // =========================================================================
    // STYLES
    // =========================================================================
    /// `header` in `style(header)=`.
    StyleLocation,
    /// A style element name.
    StyleElement,
    /// A style attribute name.
    StyleAttribute,
    /// A style attribute value.
    StyleAttributeValue,

    // =========================================================================
    // EXPRESSIONS
    // =========================================================================
    /// An expression operand.
    Expression,
    /// An operand of a `WHERE` expression.
    WhereExpression,
    /// A function name.
    Function,
    /// A function argument.
    FunctionArgument,
    /// A `CALL` routine name.
    CallRoutine,
    /// A `CALL` routine argument.
    CallRoutineArgument,
    /// A format name.
    Format,
    /// An informat name.
    Informat,
    /// A color value.
    Color,

    // =========================================================================
    // PROC TEMPLATE
    // =========================================================================
    /// A `PROC TEMPLATE` statement keyword.
    TemplateStatement,
    /// An option of a template statement.
    TemplateStatementOption,
    /// An option value of a template statement.
    TemplateStatementOptionValue,
    /// A statement keyword inside `BEGINGRAPH`.
    GraphStatement,
    /// An option of a graph statement.
    GraphStatementOption,
    /// An option value of a graph statement.
    GraphStatementOptionValue,
}

/// A zone with the names around it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// The zone.
    pub zone: Zone,
    /// Enclosing procedure.
    pub procedure: Option<SmolStr>,
    /// Statement under the cursor.
    pub statement: Option<SmolStr>,
    /// Option under the cursor or owning the value under it.
    pub option: Option<SmolStr>,
    /// Sub-option, data set option or style attribute.
    pub sub_option: Option<SmolStr>,
    /// Library prefix of a `lib.name` reference.
    pub library: Option<SmolStr>,
}

/// Internal classification failures. [`classify_position`] degrades them to
/// [`Zone::Restricted`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ZoneError {
    /// The position is past the end of its line or of the document.
    #[error("position {pos} is outside the document")]
    OutsideDocument {
        /// Requested position.
        pos: Position,
    },
    /// Re-scanning the statement disagrees with the table about the token
    /// under the cursor.
    #[error("statement re-scan disagrees with the token table at {pos}")]
    Desync {
        /// Requested position.
        pos: Position,
    },
}

/// Classifies `pos` in `table`.
#[must_use]
pub fn classify_position(
    table: &SyntaxTable<'_>,
    kb: &dyn KeywordDatabase,
    pos: Position,
) -> Classification {
    match try_classify(table, kb, pos) {
        Ok(classification) => {
            trace!(
                line = pos.line,
                column = pos.column,
                zone = ?classification.zone,
                "classified"
            );
            classification
        }
        Err(err) => {
            debug!(line = pos.line, column = pos.column, "zone classification failed: {err}");
            Classification::default()
        }
    }
}

fn try_classify(
    table: &SyntaxTable<'_>,
    kb: &dyn KeywordDatabase,
    pos: Position,
) -> Result<Classification, ZoneError> {
    let model = table.model();
    if pos.line >= model.line_count() || pos.column > model.line_len(pos.line) {
        return Err(ZoneError::OutsideDocument { pos });
    }
    if let Some(zone) = literal_zone(table, pos) {
        return Ok(Classification {
            zone,
            ..Classification::default()
        });
    }
    let statement = statement::statement_at(table, kb, pos)?;
    Ok(mapping::classify_statement(kb, &statement, pos))
}

/// The zone of a literal token strictly containing `pos`, or of an
/// unterminated one the cursor ends.
fn literal_zone(table: &SyntaxTable<'_>, pos: Position) -> Option<Zone> {
    let token = table.token_at(pos)?;
    let inside = token.start < pos && pos < token.end;
    let open_end = pos == token.end && pos == table.model().end() && is_open_ended(table, &token);
    if !inside && !open_end {
        return None;
    }
    match token.kind {
        TokenKind::Comment => Some(Zone::Comment),
        TokenKind::MacroComment => Some(Zone::MacroComment),
        TokenKind::String => Some(Zone::QuotedString),
        kind if kind.is_quoted_literal() => Some(Zone::Literal),
        TokenKind::CardsData => Some(Zone::LiteralData),
        TokenKind::EmbeddedCode => Some(Zone::EmbeddedCode),
        TokenKind::Numeric if inside => Some(Zone::Numeric),
        _ => None,
    }
}

/// Whether a token runs to the end of the document without its closing
/// delimiter.
fn is_open_ended(table: &SyntaxTable<'_>, token: &Token) -> bool {
    let text = token.text(table.model());
    match token.kind {
        TokenKind::Comment if text.starts_with("/*") => text.len() < 4 || !text.ends_with("*/"),
        TokenKind::Comment | TokenKind::MacroComment => !text.ends_with(';'),
        TokenKind::String => text
            .chars()
            .next()
            .is_none_or(|quote| text.len() < 2 || !text.ends_with(quote)),
        TokenKind::CardsData | TokenKind::EmbeddedCode => true,
        _ => false,
    }
}

/// Stateful classifier keeping the names of the last classification.
pub struct ZoneClassifier<'k> {
    kb: &'k dyn KeywordDatabase,
    last: Classification,
}

impl<'k> ZoneClassifier<'k> {
    /// Creates a classifier.
    #[must_use]
    pub fn new(kb: &'k dyn KeywordDatabase) -> Self {
        Self {
            kb,
            last: Classification::default(),
        }
    }

    /// Classifies `pos` and remembers the result for the accessors.
    pub fn classify(&mut self, table: &SyntaxTable<'_>, pos: Position) -> Zone {
        self.last = classify_position(table, self.kb, pos);
        self.last.zone
    }

    /// The last classification.
    #[must_use]
    pub fn classification(&self) -> &Classification {
        &self.last
    }

    /// Procedure of the last classified position.
    #[must_use]
    pub fn current_procedure_name(&self) -> Option<&str> {
        self.last.procedure.as_deref()
    }

    /// Statement of the last classified position.
    #[must_use]
    pub fn current_statement_name(&self) -> Option<&str> {
        self.last.statement.as_deref()
    }

    /// Option of the last classified position.
    #[must_use]
    pub fn current_option_name(&self) -> Option<&str> {
        self.last.option.as_deref()
    }

    /// Sub-option of the last classified position.
    #[must_use]
    pub fn current_sub_option_name(&self) -> Option<&str> {
        self.last.sub_option.as_deref()
    }

    /// Library prefix of the last classified position.
    #[must_use]
    pub fn current_library_name(&self) -> Option<&str> {
        self.last.library.as_deref()
    }
}
