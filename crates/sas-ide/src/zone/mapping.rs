//! Mapping a located cursor to a [`Zone`].

use sas_syntax::lexer::is_macro_statement;
use sas_syntax::{KeywordDatabase, OptionOwner, OptionType, Position, StatementContext, TokenKind};
use smol_str::SmolStr;

use super::ast::{Leaf, Node};
use super::locate::{locate, Location, Step, Terminal};
use super::statement::{RuleSet, Section, Statement};
use super::{Classification, Zone};

/// The zones of one kind of option list.
#[derive(Debug, Clone, Copy)]
struct Family {
    statement: Zone,
    option: Zone,
    value: Zone,
    sub_option: Zone,
    sub_value: Zone,
}

const GLOBAL: Family = Family {
    statement: Zone::GlobalStatement,
    option: Zone::GlobalStatementOption,
    value: Zone::GlobalStatementOptionValue,
    sub_option: Zone::GlobalStatementSubOption,
    sub_value: Zone::GlobalStatementSubOptionValue,
};

const PROCEDURE: Family = Family {
    statement: Zone::ProcedureName,
    option: Zone::ProcedureOption,
    value: Zone::ProcedureOptionValue,
    sub_option: Zone::ProcedureSubOption,
    sub_value: Zone::ProcedureSubOptionValue,
};

const PROCEDURE_STATEMENT: Family = Family {
    statement: Zone::ProcedureStatement,
    option: Zone::ProcedureStatementOption,
    value: Zone::ProcedureStatementOptionValue,
    sub_option: Zone::ProcedureStatementSubOption,
    sub_value: Zone::ProcedureStatementSubOptionValue,
};

const DATA_STEP_DEFINITION: Family = Family {
    statement: Zone::DataStepDefinition,
    option: Zone::DataStepDefinitionOption,
    value: Zone::DataStepDefinitionOptionValue,
    sub_option: Zone::DataStepDefinitionOption,
    sub_value: Zone::DataStepDefinitionOptionValue,
};

const DATA_STEP_STATEMENT: Family = Family {
    statement: Zone::DataStepStatement,
    option: Zone::DataStepStatementOption,
    value: Zone::DataStepStatementOptionValue,
    sub_option: Zone::DataStepStatementSubOption,
    sub_value: Zone::DataStepStatementSubOptionValue,
};

const MACRO_DEFINITION: Family = Family {
    statement: Zone::MacroDefinition,
    option: Zone::MacroDefinitionOption,
    value: Zone::MacroDefinitionOptionValue,
    sub_option: Zone::MacroDefinitionOption,
    sub_value: Zone::MacroDefinitionOptionValue,
};

const MACRO_STATEMENT: Family = Family {
    statement: Zone::MacroStatement,
    option: Zone::MacroStatementOption,
    value: Zone::MacroStatementOptionValue,
    sub_option: Zone::MacroStatementOption,
    sub_value: Zone::MacroStatementOptionValue,
};

const ODS: Family = Family {
    statement: Zone::OdsStatement,
    option: Zone::OdsStatementOption,
    value: Zone::OdsStatementOptionValue,
    sub_option: Zone::OdsStatementSubOption,
    sub_value: Zone::OdsStatementSubOptionValue,
};

const TEMPLATE: Family = Family {
    statement: Zone::TemplateStatement,
    option: Zone::TemplateStatementOption,
    value: Zone::TemplateStatementOptionValue,
    sub_option: Zone::TemplateStatementOption,
    sub_value: Zone::TemplateStatementOptionValue,
};

const GRAPH: Family = Family {
    statement: Zone::GraphStatement,
    option: Zone::GraphStatementOption,
    value: Zone::GraphStatementOptionValue,
    sub_option: Zone::GraphStatementOption,
    sub_value: Zone::GraphStatementOptionValue,
};

/// Macro keywords that belong to macro statements rather than being
/// functions.
const MACRO_CLAUSES: &[&str] = &["%THEN", "%ELSE", "%TO", "%BY", "%WHILE", "%UNTIL"];

pub(crate) fn classify_statement(
    kb: &dyn KeywordDatabase,
    statement: &Statement,
    pos: Position,
) -> Classification {
    let mut mapper = Mapper {
        kb,
        statement,
        pos,
        result: Classification::default(),
    };
    let zone = mapper.zone();
    Classification {
        zone,
        ..mapper.result
    }
}

struct Mapper<'a> {
    kb: &'a dyn KeywordDatabase,
    statement: &'a Statement,
    pos: Position,
    result: Classification,
}

impl<'a> Mapper<'a> {
    fn zone(&mut self) -> Zone {
        let statement = self.statement;
        if let Section::Procedure(procedure) = &statement.section {
            self.result.procedure = Some(procedure.clone());
        }
        let Some(rules) = statement.rules else {
            return self.section_statement();
        };
        if !statement.name.is_empty() {
            self.result.statement = Some(statement.name.clone());
        }
        let location = locate(&statement.ast, self.pos);
        if let Some(zone) = self.lexical(&location) {
            return zone;
        }
        let name = statement.name.as_str();
        match rules {
            RuleSet::ProcedureDefinition => self.procedure_definition(&location),
            RuleSet::ProcedureStatement => self.procedure_statement(&location),
            RuleSet::DataStepDefinition => self.data_step_definition(&location),
            RuleSet::MacroDefinition => self.macro_definition(&location),
            RuleSet::MacroStatement => self.macro_statement(&location),
            RuleSet::Ods => self.ods(&location),
            RuleSet::Style => self.style_statement(&location),
            RuleSet::Template { graph } => self.headed(
                &location,
                if graph { GRAPH } else { TEMPLATE },
                OptionOwner::ProcedureStatement {
                    procedure: "TEMPLATE",
                    statement: name,
                },
            ),
            RuleSet::Global => self.headed(
                &location,
                GLOBAL,
                OptionOwner::Statement {
                    context: StatementContext::Global,
                    statement: name,
                },
            ),
            RuleSet::DataStepStatement => self.headed(
                &location,
                DATA_STEP_STATEMENT,
                OptionOwner::Statement {
                    context: StatementContext::DataStep,
                    statement: name,
                },
            ),
            RuleSet::If => self.expression(&location, Zone::Expression, true),
            RuleSet::Assignment => self.expression(&location, Zone::Expression, false),
            RuleSet::Where => self.expression(&location, Zone::WhereExpression, true),
            RuleSet::Call => self.call_routine(&location),
            RuleSet::SetFamily => self.set_family(&location),
            RuleSet::FormatFamily => self.format_family(&location),
        }
    }

    /// The zone of a statement keyword in the current step.
    fn section_statement(&self) -> Zone {
        match &self.statement.section {
            Section::Global => Zone::GlobalStatement,
            Section::Procedure(procedure) if procedure == "TEMPLATE" => {
                if self.statement.graph {
                    Zone::GraphStatement
                } else {
                    Zone::TemplateStatement
                }
            }
            Section::Procedure(_) => Zone::ProcedureStatement,
            Section::DataStep => Zone::DataStepStatement,
        }
    }

    /// Zones decided by the token itself: literals and macro language.
    fn lexical(&self, location: &Location<'_>) -> Option<Zone> {
        if let Terminal::Word { leaf, .. } = location.terminal {
            match leaf.kind {
                TokenKind::Numeric => return Some(Zone::Numeric),
                TokenKind::String => return Some(Zone::QuotedString),
                kind if kind.is_quoted_literal() => return Some(Zone::Literal),
                TokenKind::MacroRef => return Some(Zone::MacroReference),
                TokenKind::MacroKeyword if !self.is_macro_statement_word(&leaf.text) => {
                    return Some(Zone::MacroFunction)
                }
                _ => {}
            }
        }
        location
            .steps
            .iter()
            .any(|step| {
                matches!(step, Step::Args { callee: Some(callee), .. } if callee.text.starts_with('%'))
            })
            .then_some(Zone::MacroFunctionArgument)
    }

    fn is_macro_statement_word(&self, word: &str) -> bool {
        is_macro_statement(word)
            || MACRO_CLAUSES.contains(&word)
            || self.kb.is_statement(StatementContext::Macro, word)
    }

    /// Statement name words, then options.
    fn headed(&mut self, location: &Location<'_>, family: Family, owner: OptionOwner<'_>) -> Zone {
        if location.is_top() && location.index < self.statement.head_items.max(1) {
            return family.statement;
        }
        self.options(&location.steps, location.terminal, family, owner)
    }

    // =========================================================================
    // Option lists
    // =========================================================================

    fn options(
        &mut self,
        steps: &[Step<'_>],
        terminal: Terminal<'_>,
        family: Family,
        owner: OptionOwner<'_>,
    ) -> Zone {
        match steps.split_first() {
            None => {
                if let Terminal::Word { leaf, .. } = terminal {
                    self.result.option = Some(leaf.text.clone());
                }
                family.option
            }
            Some((Step::Target { name }, rest)) => {
                self.result.option = name.cloned();
                let option = name.map_or("", |name| name.as_str());
                match rest.split_first() {
                    Some((Step::Args { .. }, _)) if option == "STYLE" => Zone::StyleLocation,
                    Some((Step::Args { .. }, inner)) => {
                        self.sub_options(inner, terminal, family, owner, option)
                    }
                    _ => family.option,
                }
            }
            Some((Step::Value { option }, rest)) => {
                self.result.option = Some(option.clone());
                self.option_value(option, rest, terminal, family, owner)
            }
            Some((Step::Args { callee: Some(callee), .. }, rest)) => {
                self.result.option = Some(callee.text.clone());
                if callee.text == "STYLE" {
                    Zone::StyleLocation
                } else {
                    self.sub_options(rest, terminal, family, owner, &callee.text)
                }
            }
            Some((Step::Args { bracket, .. }, rest)) if matches!(*bracket, '[' | '{') => {
                self.style_attributes(rest, terminal, false)
            }
            Some((Step::Args { .. } | Step::Operand, _)) => family.value,
        }
    }

    fn option_value(
        &mut self,
        option: &str,
        steps: &[Step<'_>],
        terminal: Terminal<'_>,
        family: Family,
        owner: OptionOwner<'_>,
    ) -> Zone {
        if let Some((Step::Args { bracket: '[' | '{', .. }, inner)) = steps.split_first() {
            return self.style_attributes(inner, terminal, false);
        }
        match self.kb.option_type(owner, option) {
            Some(OptionType::DataSet) => self.data_set(steps, terminal, family.value),
            Some(OptionType::Library) => {
                if let Terminal::Word { leaf, .. } = terminal {
                    self.result.library = Some(leaf.text.clone());
                }
                Zone::LibraryName
            }
            Some(OptionType::Color) => Zone::Color,
            Some(OptionType::Format) => Zone::Format,
            _ => match steps.split_first() {
                Some((Step::Args { .. }, inner)) => {
                    self.sub_options(inner, terminal, family, owner, option)
                }
                _ => family.value,
            },
        }
    }

    fn sub_options(
        &mut self,
        steps: &[Step<'_>],
        terminal: Terminal<'_>,
        family: Family,
        owner: OptionOwner<'_>,
        option: &str,
    ) -> Zone {
        match steps.first() {
            None => {
                if let Terminal::Word { leaf, .. } = terminal {
                    self.result.sub_option = Some(leaf.text.clone());
                }
                family.sub_option
            }
            Some(Step::Target { name }) => {
                self.result.sub_option = name.cloned();
                family.sub_option
            }
            Some(Step::Value { option: sub_option }) => {
                self.result.sub_option = Some(sub_option.clone());
                if self.kb.sub_option_type(owner, option, sub_option) == Some(OptionType::Color) {
                    Zone::Color
                } else {
                    family.sub_value
                }
            }
            Some(_) => family.sub_value,
        }
    }

    /// `[attribute=value ...]` lists. Attribute names are recorded as the
    /// option of a `STYLE` statement and as the sub-option elsewhere.
    fn style_attributes(&mut self, steps: &[Step<'_>], terminal: Terminal<'_>, top: bool) -> Zone {
        let attribute = match steps.first() {
            None => match terminal {
                Terminal::Word { leaf, .. } => Some(leaf.text.clone()),
                Terminal::Gap => None,
            },
            Some(Step::Target { name }) => name.cloned(),
            Some(Step::Value { option }) => Some(option.clone()),
            Some(_) => return Zone::StyleAttributeValue,
        };
        let zone = match steps.first() {
            Some(Step::Value { option })
                if self.kb.option_type(OptionOwner::Style, option) == Some(OptionType::Color) =>
            {
                Zone::Color
            }
            Some(Step::Value { .. }) => Zone::StyleAttributeValue,
            _ => Zone::StyleAttribute,
        };
        if top {
            self.result.option = attribute;
        } else {
            self.result.sub_option = attribute;
        }
        zone
    }

    /// A data set reference: `name`, `lib.name`, `name(options)`.
    fn data_set(&mut self, steps: &[Step<'_>], terminal: Terminal<'_>, fallback: Zone) -> Zone {
        match steps.split_first() {
            None => match terminal {
                Terminal::Word { leaf, .. } => self.data_set_name(leaf, fallback),
                Terminal::Gap => fallback,
            },
            Some((Step::Args { callee: Some(_), bracket: '(' }, inner)) => match inner.first() {
                None => {
                    if let Terminal::Word { leaf, .. } = terminal {
                        self.result.sub_option = Some(leaf.text.clone());
                    }
                    Zone::DataSetOption
                }
                Some(Step::Target { name }) => {
                    self.result.sub_option = name.cloned();
                    Zone::DataSetOption
                }
                Some(Step::Value { option }) => {
                    self.result.sub_option = Some(option.clone());
                    if option == "WHERE" {
                        Zone::WhereExpression
                    } else {
                        Zone::DataSetOptionValue
                    }
                }
                Some(_) => Zone::DataSetOptionValue,
            },
            Some(_) => fallback,
        }
    }

    /// `lib.name` resolves textually: before the dot is the library.
    fn data_set_name(&mut self, leaf: &Leaf, fallback: Zone) -> Zone {
        match self.split_dotted(leaf) {
            Some(true) => Zone::DataSetName,
            Some(false) => Zone::LibraryName,
            None => fallback,
        }
    }

    /// For a dotted name, records the prefix as library and tells whether
    /// the cursor is after the dot.
    fn split_dotted(&mut self, leaf: &Leaf) -> Option<bool> {
        let dot = leaf.text.find('.')?;
        self.result.library = Some(SmolStr::new(&leaf.text[..dot]));
        Some(
            u32::try_from(dot)
                .is_ok_and(|dot| self.pos.column > leaf.start.column + dot)
                || self.pos.line > leaf.start.line,
        )
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn procedure_definition(&mut self, location: &Location<'_>) -> Zone {
        let procedure = self
            .statement
            .ast
            .items
            .get(1)
            .and_then(Node::as_leaf)
            .filter(|leaf| leaf.is_name())
            .map(|leaf| leaf.text.clone());
        if procedure.is_some() {
            self.result.procedure.clone_from(&procedure);
        }
        if location.is_top() {
            match location.index {
                0 => return Zone::GlobalStatement,
                1 => return Zone::ProcedureName,
                _ => {}
            }
        }
        let Some(procedure) = procedure else {
            return Zone::ProcedureOption;
        };
        self.options(
            &location.steps,
            location.terminal,
            PROCEDURE,
            OptionOwner::Procedure {
                procedure: procedure.as_str(),
            },
        )
    }

    fn procedure_statement(&mut self, location: &Location<'_>) -> Zone {
        let statement = self.statement;
        let Section::Procedure(procedure) = &statement.section else {
            return self.headed(
                location,
                GLOBAL,
                OptionOwner::Statement {
                    context: StatementContext::Global,
                    statement: statement.name.as_str(),
                },
            );
        };
        let name = statement.name.as_str();
        if location.is_top() && location.index < statement.head_items.max(1) {
            return Zone::ProcedureStatement;
        }
        if self.in_where_clause(location) {
            return self.expression(location, Zone::WhereExpression, false);
        }
        if !self.kb.is_procedure_statement(procedure, name) {
            if self.kb.is_statement(StatementContext::Global, name) {
                return self.headed(
                    location,
                    GLOBAL,
                    OptionOwner::Statement {
                        context: StatementContext::Global,
                        statement: name,
                    },
                );
            }
            return Zone::ProcedureStatementArgument;
        }
        let owner = OptionOwner::ProcedureStatement {
            procedure: procedure.as_str(),
            statement: name,
        };
        let delimited = self
            .kb
            .requires_option_delimiter(Some(procedure.as_str()), name);
        if delimited && !location.after_delimiter {
            return Zone::ProcedureStatementArgument;
        }
        if !location.after_delimiter && location.is_top() {
            return match location.terminal {
                Terminal::Word { leaf, .. } if self.kb.is_option(owner, &leaf.text) => {
                    self.result.option = Some(leaf.text.clone());
                    Zone::ProcedureStatementOption
                }
                _ => Zone::ProcedureStatementArgument,
            };
        }
        self.options(&location.steps, location.terminal, PROCEDURE_STATEMENT, owner)
    }

    /// A bare `WHERE` before the cursor, as in `SELECT ... WHERE ...`.
    fn in_where_clause(&self, location: &Location<'_>) -> bool {
        self.statement
            .ast
            .items
            .iter()
            .take(location.index)
            .filter_map(Node::as_leaf)
            .any(|leaf| leaf.kind.is_word() && leaf.text == "WHERE")
    }

    fn data_step_definition(&mut self, location: &Location<'_>) -> Zone {
        if location.is_top() && location.index == 0 {
            return Zone::DataStepDefinition;
        }
        if location.after_delimiter {
            return self.options(
                &location.steps,
                location.terminal,
                DATA_STEP_DEFINITION,
                OptionOwner::DataStepDefinition,
            );
        }
        self.data_set(&location.steps, location.terminal, Zone::DataSetName)
    }

    fn macro_definition(&mut self, location: &Location<'_>) -> Zone {
        if location.after_delimiter {
            return self.options(
                &location.steps,
                location.terminal,
                MACRO_DEFINITION,
                OptionOwner::MacroDefinition,
            );
        }
        match location.steps.first() {
            Some(Step::Args { .. }) => Zone::MacroParameter,
            _ => Zone::MacroDefinition,
        }
    }

    fn macro_statement(&mut self, location: &Location<'_>) -> Zone {
        if location.is_top() && location.index == 0 {
            return Zone::MacroStatement;
        }
        let statement = self.statement;
        let name = statement.name.as_str();
        let owner = OptionOwner::Statement {
            context: StatementContext::Macro,
            statement: name,
        };
        match name {
            "%LET" => match location.steps.first() {
                Some(Step::Target { .. }) => Zone::MacroVariable,
                None if location.index == 1 => Zone::MacroVariable,
                _ => Zone::MacroStatementBody,
            },
            "%GLOBAL" | "%LOCAL" | "%SYMDEL" if !location.after_delimiter => Zone::MacroVariable,
            _ if location.after_delimiter => {
                self.options(&location.steps, location.terminal, MACRO_STATEMENT, owner)
            }
            _ => match location.terminal {
                Terminal::Word { leaf, .. }
                    if location.is_top() && self.kb.is_option(owner, &leaf.text) =>
                {
                    self.result.option = Some(leaf.text.clone());
                    Zone::MacroStatementOption
                }
                _ => Zone::MacroStatementBody,
            },
        }
    }

    fn ods(&mut self, location: &Location<'_>) -> Zone {
        if location.is_top() {
            match location.index {
                0 => return Zone::OdsStatement,
                1 => {
                    return match location.terminal {
                        Terminal::Word { leaf, .. } if leaf.text.starts_with("TAGSETS.") => {
                            match self.split_dotted(leaf) {
                                Some(true) => Zone::TagsetName,
                                _ => Zone::OdsDestination,
                            }
                        }
                        _ => Zone::OdsDestination,
                    };
                }
                index if index < self.statement.head_items => return Zone::OdsStatement,
                _ => {}
            }
        }
        let statement = self.statement;
        self.options(
            &location.steps,
            location.terminal,
            ODS,
            OptionOwner::Statement {
                context: StatementContext::Global,
                statement: statement.name.as_str(),
            },
        )
    }

    fn style_statement(&mut self, location: &Location<'_>) -> Zone {
        if location.is_top() && location.index == 0 {
            return Zone::TemplateStatement;
        }
        if location.after_delimiter {
            return self.style_attributes(&location.steps, location.terminal, true);
        }
        Zone::StyleElement
    }

    fn expression(&mut self, location: &Location<'_>, base: Zone, headed: bool) -> Zone {
        if headed && location.is_top() && location.index == 0 {
            return self.section_statement();
        }
        if let Terminal::Word { call: true, .. } = location.terminal {
            return Zone::Function;
        }
        if location
            .steps
            .iter()
            .any(|step| matches!(step, Step::Args { callee: Some(_), .. }))
        {
            return Zone::FunctionArgument;
        }
        base
    }

    fn call_routine(&mut self, location: &Location<'_>) -> Zone {
        if location.is_top() {
            return if location.index == 0 {
                Zone::DataStepStatement
            } else {
                Zone::CallRoutine
            };
        }
        if let Terminal::Word { call: true, .. } = location.terminal {
            return Zone::Function;
        }
        let calls = location
            .steps
            .iter()
            .filter(|step| matches!(step, Step::Args { callee: Some(_), .. }))
            .count();
        match calls {
            0 => Zone::Expression,
            1 => Zone::CallRoutineArgument,
            _ => Zone::FunctionArgument,
        }
    }

    fn set_family(&mut self, location: &Location<'_>) -> Zone {
        if location.is_top() && location.index == 0 {
            return Zone::DataStepStatement;
        }
        let statement = self.statement;
        let owner = OptionOwner::Statement {
            context: StatementContext::DataStep,
            statement: statement.name.as_str(),
        };
        let option = match location.steps.first() {
            Some(Step::Target { name }) => name.map(SmolStr::as_str),
            Some(Step::Value { option }) => Some(option.as_str()),
            None => match location.terminal {
                Terminal::Word { leaf, .. } => Some(leaf.text.as_str()),
                Terminal::Gap => None,
            },
            Some(_) => None,
        };
        if option.is_some_and(|option| self.kb.is_option(owner, option)) {
            return self.options(&location.steps, location.terminal, DATA_STEP_STATEMENT, owner);
        }
        self.data_set(&location.steps, location.terminal, Zone::DataSetName)
    }

    fn format_family(&mut self, location: &Location<'_>) -> Zone {
        if location.is_top() && location.index == 0 {
            return self.section_statement();
        }
        let format = if self.statement.name == "INFORMAT" {
            Zone::Informat
        } else {
            Zone::Format
        };
        match location.terminal {
            Terminal::Word { leaf, .. } if leaf.kind == TokenKind::Format => format,
            Terminal::Word { .. } => Zone::Expression,
            Terminal::Gap if !location.is_top() || location.index <= 1 => Zone::Expression,
            Terminal::Gap => {
                let previous = self.statement.ast.items.get(location.index - 1);
                match previous.and_then(Node::as_leaf) {
                    Some(leaf) if leaf.kind == TokenKind::Format => Zone::Expression,
                    _ => format,
                }
            }
        }
    }
}
