//! Keyword knowledge base.
//!
//! The parser and the zone classifier ask the knowledge base whether a word
//! is a procedure, a statement, an option and so on. Names are passed upper
//! case; multi-word names are joined by a single space (`"ODS HTML"`,
//! `"DEFINE STYLE"`). Procedure-statement lookups take the procedure name
//! without `PROC`.
//!
//! [`StaticKeywordDatabase`] is an in-memory implementation backed by a JSON
//! catalog. A small built-in catalog ships with the crate.

use std::path::Path;

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use smol_str::SmolStr;
use thiserror::Error;
use tracing::error;

/// Which statement table a context-free statement lookup uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementContext {
    /// Global statements (`LIBNAME`, `OPTIONS`, `TITLE`, `ODS ...`).
    Global,
    /// Data step statements (`SET`, `IF`, `OUTPUT`).
    DataStep,
    /// Macro statements (`%LET`, `%PUT`), keyed with the leading `%`.
    Macro,
}

/// The owner of an option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionOwner<'a> {
    /// Options of a `PROC name` statement.
    Procedure {
        /// Procedure name.
        procedure: &'a str,
    },
    /// Options of a statement inside a procedure.
    ProcedureStatement {
        /// Procedure name.
        procedure: &'a str,
        /// Statement name.
        statement: &'a str,
    },
    /// Options of a context-free statement.
    Statement {
        /// Statement table.
        context: StatementContext,
        /// Statement name.
        statement: &'a str,
    },
    /// Data set options (`name(keep=...)`).
    DataSet,
    /// Options of the `DATA` statement after `/`.
    DataStepDefinition,
    /// Options of `%MACRO name(...) /`.
    MacroDefinition,
    /// Style attributes (`style={...}`, `style(header)=[...]`).
    Style,
}

/// Kind of value an option expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionType {
    /// Free-form value.
    #[default]
    Value,
    /// The option takes no value.
    Flag,
    /// A color name or code.
    Color,
    /// A data set name, optionally with data set options.
    DataSet,
    /// A library reference.
    Library,
    /// A format or informat name.
    Format,
    /// One of a fixed list of values.
    Choice,
}

/// Queries the parser and the zone classifier need answered.
pub trait KeywordDatabase {
    /// Returns `true` if `name` is a procedure.
    fn is_procedure(&self, name: &str) -> bool;

    /// Returns `true` if `statement` is a statement of `procedure`.
    fn is_procedure_statement(&self, procedure: &str, statement: &str) -> bool;

    /// Returns `true` if `statement` is a context-free statement of `context`.
    fn is_statement(&self, context: StatementContext, statement: &str) -> bool;

    /// Returns `true` if `option` belongs to `owner`.
    fn is_option(&self, owner: OptionOwner<'_>, option: &str) -> bool;

    /// Returns `true` if `sub_option` belongs to `option` of `owner`.
    fn is_sub_option(&self, owner: OptionOwner<'_>, option: &str, sub_option: &str) -> bool;

    /// The value type of `option`, if it is known.
    fn option_type(&self, owner: OptionOwner<'_>, option: &str) -> Option<OptionType>;

    /// The value type of `sub_option` of `option`, if it is known.
    fn sub_option_type(
        &self,
        owner: OptionOwner<'_>,
        option: &str,
        sub_option: &str,
    ) -> Option<OptionType>;

    /// Returns `true` if options of the statement follow a `/`.
    fn requires_option_delimiter(&self, procedure: Option<&str>, statement: &str) -> bool;

    /// Returns `true` if `name` is a data step function.
    fn is_function(&self, name: &str) -> bool;

    /// Returns `true` if `name` is a `CALL` routine.
    fn is_call_routine(&self, name: &str) -> bool;
}

/// Errors raised while loading a keyword catalog.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// The catalog file could not be read.
    #[error("failed to read keyword catalog {path}: {source}")]
    Io {
        /// Catalog path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog is not valid JSON or does not match the schema.
    #[error("invalid keyword catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One option entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OptionSpec {
    /// Value type.
    #[serde(rename = "type")]
    pub kind: OptionType,
    /// Allowed values for [`OptionType::Choice`].
    pub values: Vec<SmolStr>,
    /// Nested options (`out=x(keep=a)` style sub-options).
    pub sub_options: FxHashMap<SmolStr, OptionSpec>,
}

/// One statement entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatementSpec {
    /// Options are written after a `/`.
    pub delimiter: bool,
    /// Statement options.
    pub options: FxHashMap<SmolStr, OptionSpec>,
}

/// One procedure entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcedureSpec {
    /// Options of the `PROC` statement.
    pub options: FxHashMap<SmolStr, OptionSpec>,
    /// Statements valid inside the procedure.
    pub statements: FxHashMap<SmolStr, StatementSpec>,
}

/// The JSON catalog document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeywordData {
    /// Procedures by name.
    pub procedures: FxHashMap<SmolStr, ProcedureSpec>,
    /// Global statements.
    pub global_statements: FxHashMap<SmolStr, StatementSpec>,
    /// Data step statements.
    pub data_step_statements: FxHashMap<SmolStr, StatementSpec>,
    /// Macro statements, with the leading `%`.
    pub macro_statements: FxHashMap<SmolStr, StatementSpec>,
    /// Data set options.
    pub data_set_options: FxHashMap<SmolStr, OptionSpec>,
    /// `DATA` statement options.
    pub data_step_definition_options: FxHashMap<SmolStr, OptionSpec>,
    /// `%MACRO` statement options.
    pub macro_definition_options: FxHashMap<SmolStr, OptionSpec>,
    /// Style attributes.
    pub style_attributes: FxHashMap<SmolStr, OptionSpec>,
    /// Function names.
    pub functions: FxHashSet<SmolStr>,
    /// `CALL` routine names.
    pub call_routines: FxHashSet<SmolStr>,
}

impl KeywordData {
    /// Upper-cases every key so lookups can compare directly.
    fn normalized(self) -> Self {
        Self {
            procedures: upper_keys(self.procedures, |spec| ProcedureSpec {
                options: normalize_options(spec.options),
                statements: upper_keys(spec.statements, normalize_statement),
            }),
            global_statements: upper_keys(self.global_statements, normalize_statement),
            data_step_statements: upper_keys(self.data_step_statements, normalize_statement),
            macro_statements: upper_keys(self.macro_statements, normalize_statement),
            data_set_options: normalize_options(self.data_set_options),
            data_step_definition_options: normalize_options(self.data_step_definition_options),
            macro_definition_options: normalize_options(self.macro_definition_options),
            style_attributes: normalize_options(self.style_attributes),
            functions: self.functions.into_iter().map(upper).collect(),
            call_routines: self.call_routines.into_iter().map(upper).collect(),
        }
    }
}

fn upper(name: SmolStr) -> SmolStr {
    SmolStr::new(name.to_ascii_uppercase())
}

fn upper_keys<T>(map: FxHashMap<SmolStr, T>, f: impl Fn(T) -> T) -> FxHashMap<SmolStr, T> {
    map.into_iter().map(|(key, value)| (upper(key), f(value))).collect()
}

fn normalize_options(options: FxHashMap<SmolStr, OptionSpec>) -> FxHashMap<SmolStr, OptionSpec> {
    upper_keys(options, |spec| OptionSpec {
        kind: spec.kind,
        values: spec.values.into_iter().map(upper).collect(),
        sub_options: normalize_options(spec.sub_options),
    })
}

fn normalize_statement(spec: StatementSpec) -> StatementSpec {
    StatementSpec {
        delimiter: spec.delimiter,
        options: normalize_options(spec.options),
    }
}

const BUILTIN_CATALOG: &str = include_str!("../data/keywords.json");

static BUILTIN: Lazy<StaticKeywordDatabase> = Lazy::new(|| {
    StaticKeywordDatabase::from_json(BUILTIN_CATALOG).unwrap_or_else(|err| {
        error!("built-in keyword catalog failed to load: {err}");
        StaticKeywordDatabase::default()
    })
});

/// In-memory [`KeywordDatabase`] built from a [`KeywordData`] document.
#[derive(Debug, Clone, Default)]
pub struct StaticKeywordDatabase {
    data: KeywordData,
}

impl StaticKeywordDatabase {
    /// Builds a database from catalog data.
    #[must_use]
    pub fn new(data: KeywordData) -> Self {
        Self {
            data: data.normalized(),
        }
    }

    /// Parses a JSON catalog.
    pub fn from_json(json: &str) -> Result<Self, KnowledgeError> {
        let data: KeywordData = serde_json::from_str(json)?;
        Ok(Self::new(data))
    }

    /// Reads and parses a JSON catalog file.
    pub fn from_path(path: &Path) -> Result<Self, KnowledgeError> {
        let json = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The catalog shipped with the crate.
    #[must_use]
    pub fn builtin() -> &'static StaticKeywordDatabase {
        &BUILTIN
    }

    /// The underlying catalog.
    #[must_use]
    pub fn data(&self) -> &KeywordData {
        &self.data
    }

    fn statements(&self, context: StatementContext) -> &FxHashMap<SmolStr, StatementSpec> {
        match context {
            StatementContext::Global => &self.data.global_statements,
            StatementContext::DataStep => &self.data.data_step_statements,
            StatementContext::Macro => &self.data.macro_statements,
        }
    }

    fn options(&self, owner: OptionOwner<'_>) -> Option<&FxHashMap<SmolStr, OptionSpec>> {
        match owner {
            OptionOwner::Procedure { procedure } => {
                self.data.procedures.get(procedure).map(|spec| &spec.options)
            }
            OptionOwner::ProcedureStatement {
                procedure,
                statement,
            } => self
                .data
                .procedures
                .get(procedure)
                .and_then(|spec| spec.statements.get(statement))
                .map(|spec| &spec.options),
            OptionOwner::Statement { context, statement } => {
                self.statements(context).get(statement).map(|spec| &spec.options)
            }
            OptionOwner::DataSet => Some(&self.data.data_set_options),
            OptionOwner::DataStepDefinition => Some(&self.data.data_step_definition_options),
            OptionOwner::MacroDefinition => Some(&self.data.macro_definition_options),
            OptionOwner::Style => Some(&self.data.style_attributes),
        }
    }

    fn option(&self, owner: OptionOwner<'_>, option: &str) -> Option<&OptionSpec> {
        self.options(owner)?.get(option)
    }
}

impl KeywordDatabase for StaticKeywordDatabase {
    fn is_procedure(&self, name: &str) -> bool {
        self.data.procedures.contains_key(name)
    }

    fn is_procedure_statement(&self, procedure: &str, statement: &str) -> bool {
        self.data
            .procedures
            .get(procedure)
            .is_some_and(|spec| spec.statements.contains_key(statement))
    }

    fn is_statement(&self, context: StatementContext, statement: &str) -> bool {
        self.statements(context).contains_key(statement)
    }

    fn is_option(&self, owner: OptionOwner<'_>, option: &str) -> bool {
        self.option(owner, option).is_some()
    }

    fn is_sub_option(&self, owner: OptionOwner<'_>, option: &str, sub_option: &str) -> bool {
        self.option(owner, option)
            .is_some_and(|spec| spec.sub_options.contains_key(sub_option))
    }

    fn option_type(&self, owner: OptionOwner<'_>, option: &str) -> Option<OptionType> {
        self.option(owner, option).map(|spec| spec.kind)
    }

    fn sub_option_type(
        &self,
        owner: OptionOwner<'_>,
        option: &str,
        sub_option: &str,
    ) -> Option<OptionType> {
        self.option(owner, option)
            .and_then(|spec| spec.sub_options.get(sub_option))
            .map(|spec| spec.kind)
    }

    fn requires_option_delimiter(&self, procedure: Option<&str>, statement: &str) -> bool {
        match procedure {
            Some(procedure) => self
                .data
                .procedures
                .get(procedure)
                .and_then(|spec| spec.statements.get(statement))
                .is_some_and(|spec| spec.delimiter),
            None => [
                StatementContext::Global,
                StatementContext::DataStep,
                StatementContext::Macro,
            ]
            .into_iter()
            .filter_map(|context| self.statements(context).get(statement))
            .any(|spec| spec.delimiter),
        }
    }

    fn is_function(&self, name: &str) -> bool {
        self.data.functions.contains(name)
    }

    fn is_call_routine(&self, name: &str) -> bool {
        self.data.call_routines.contains(name)
    }
}
