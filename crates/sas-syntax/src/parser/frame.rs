//! Parser frames.
//!
//! The block parser keeps an explicit stack of frames instead of recursing.
//! Section and template frames persist across statements; the statement
//! level frames (`Statement`, `StatementOptions`, `DatasetOptions`, ...) are
//! pushed while a statement is classified and popped before the next one.

use smol_str::SmolStr;

/// What the frame is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Continuation {
    /// Inside the opening statement of a section.
    SectionDefinition,
    /// Between the opening statement and the end of a section.
    SectionBody,
    /// Statement keyword resolved, classifying the rest.
    Statement,
    /// Inside the option list of a statement.
    StatementOptions,
    /// Inside `name(...)` data set options.
    DatasetOptions,
    /// Inside an `IF` / `WHERE` / `DO` expression.
    Expression,
    /// Inside a `[...]` / `{...}` style attribute list.
    Style,
    /// Inside an `ODS` statement.
    Ods,
    /// PROC TEMPLATE `DEFINE STYLE|TABLE|STATGRAPH|COLUMN ...; ... END;`
    TemplateDefine,
    /// PROC TEMPLATE `BEGINGRAPH; ... ENDGRAPH;`
    Graph,
    /// PROC TEMPLATE `DEFINE TAGSET ...; ... END;`
    TagsetDefine,
    /// `DEFINE EVENT ...; ... END;` inside a tagset.
    EventDefine,
}

impl Continuation {
    /// Returns `true` for frames closed by a template `END;` statement.
    #[must_use]
    pub fn is_template_define(self) -> bool {
        matches!(
            self,
            Self::TemplateDefine | Self::TagsetDefine | Self::EventDefine
        )
    }
}

/// The kind of section a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionState {
    /// Outside any step.
    Global,
    /// Inside a macro definition, outside any step.
    Macro,
    /// Inside a procedure.
    Procedure,
    /// Inside a data step.
    Data,
}

/// One entry of the parser's frame stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserFrame {
    /// What the frame is waiting for.
    pub continuation: Continuation,
    /// Enclosing section kind.
    pub state: SectionState,
    /// Statement, option or template name the frame belongs to.
    pub name: SmolStr,
    /// Name of the enclosing procedure.
    pub procedure_name: Option<SmolStr>,
    /// Options of the current statement follow a `/`.
    pub has_option_delimiter: bool,
}

impl ParserFrame {
    /// The bottom frame.
    #[must_use]
    pub fn root() -> Self {
        Self {
            continuation: Continuation::SectionBody,
            state: SectionState::Global,
            name: SmolStr::default(),
            procedure_name: None,
            has_option_delimiter: false,
        }
    }

    /// The frame opened by a DATA, PROC or %MACRO statement.
    #[must_use]
    pub fn section(state: SectionState, name: SmolStr, procedure_name: Option<SmolStr>) -> Self {
        Self {
            continuation: Continuation::SectionDefinition,
            state,
            name,
            procedure_name,
            has_option_delimiter: false,
        }
    }

    /// A frame nested in this one, inheriting its section.
    #[must_use]
    pub fn nested(&self, continuation: Continuation, name: impl Into<SmolStr>) -> Self {
        Self {
            continuation,
            state: self.state,
            name: name.into(),
            procedure_name: self.procedure_name.clone(),
            has_option_delimiter: false,
        }
    }
}
