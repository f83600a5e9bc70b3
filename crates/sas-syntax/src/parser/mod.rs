//! Block parser for SAS source.
//!
//! The parser consumes the scanner's tokens one statement at a time,
//! rewrites the kinds of words it recognizes (keywords, section keywords,
//! procedure names) and builds the block tree: DATA steps, procedures,
//! macro definitions, synthesized GLOBAL blocks and custom regions.
//!
//! # Design
//!
//! - **Never fails**: malformed input still yields tokens covering the whole
//!   document and a well-formed block tree.
//! - **Restartable**: a parser can start at any statement boundary, which
//!   incremental re-derivation relies on (see [`crate::incremental`]).
//! - **Explicit state**: nesting is tracked on a frame stack
//!   ([`ParserFrame`]) rather than by recursion.

#![allow(clippy::module_inception)]

mod frame;
mod grammar;
mod parser;
mod source;

pub use frame::{Continuation, ParserFrame, SectionState};
pub use parser::BlockParser;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::blocks::BlockTree;
use crate::knowledge::KeywordDatabase;
use crate::lexer::{ScannerOptions, Token};
use crate::text::TextModel;

/// Procedures in which `RUN` ends a run group instead of the procedure.
pub const RUN_GROUP_PROCEDURES: &[&str] = &[
    "ANOVA", "CATALOG", "DATASETS", "GCHART", "GLM", "GPLOT", "IML", "OPTMODEL", "PLOT", "REG",
    "SQL", "TEMPLATE",
];

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Scanner configuration.
    pub scanner: ScannerOptions,
    /// Comment prefix opening a custom region.
    pub region_start_marker: SmolStr,
    /// Comment prefix closing a custom region.
    pub region_end_marker: SmolStr,
    /// Procedures where `RUN` does not close the block.
    pub run_group_procedures: FxHashSet<SmolStr>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            scanner: ScannerOptions::default(),
            region_start_marker: SmolStr::new_static("region"),
            region_end_marker: SmolStr::new_static("endregion"),
            run_group_procedures: RUN_GROUP_PROCEDURES
                .iter()
                .map(|&name| SmolStr::new_static(name))
                .collect(),
        }
    }
}

impl ParserOptions {
    /// Returns `true` if `RUN` does not close `procedure`.
    #[must_use]
    pub fn is_run_group(&self, procedure: &str) -> bool {
        self.run_group_procedures.contains(procedure)
    }
}

/// Result of parsing a whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutput {
    /// Classified tokens covering the document.
    pub tokens: Vec<Token>,
    /// The block tree.
    pub tree: BlockTree,
}

/// Parses a whole document.
#[must_use]
pub fn parse(
    model: &TextModel,
    kb: &dyn KeywordDatabase,
    options: &ParserOptions,
) -> ParseOutput {
    let mut parser = BlockParser::new(model, kb, options.clone());
    let tokens: Vec<Token> = parser.by_ref().collect();
    let tree = parser.finish();
    ParseOutput { tokens, tree }
}
