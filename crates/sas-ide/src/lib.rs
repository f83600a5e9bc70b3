//! `sas-ide` - Editor-facing analysis for SAS programs.
//!
//! Built on top of [`sas_syntax`], this crate keeps a document's tokens and
//! blocks up to date across edits and answers cursor questions:
//!
//! - **Syntax table**: [`SyntaxTable`] owns the text, applies queued edits
//!   incrementally and exposes per-line style spans and block lookups
//! - **Zones**: [`ZoneClassifier`] tells what kind of text belongs at a
//!   cursor position, for completion and hover
//! - **Symbols**: block names for outline views
//! - **Config**: `sas-analysis.toml` loading
//!
//! # Example
//!
//! ```
//! use sas_ide::{AnalysisConfig, SyntaxTable, Zone, ZoneClassifier};
//! use sas_syntax::{Position, StaticKeywordDatabase};
//!
//! let kb = StaticKeywordDatabase::builtin();
//! let table = SyntaxTable::new("proc print data=", kb, &AnalysisConfig::default());
//! let mut classifier = ZoneClassifier::new(kb);
//!
//! assert_eq!(classifier.classify(&table, Position::new(0, 16)), Zone::ProcedureOptionValue);
//! assert_eq!(classifier.current_procedure_name(), Some("PRINT"));
//! assert_eq!(classifier.current_option_name(), Some("DATA"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod symbols;
pub mod syntax_table;
pub mod zone;

pub use config::{AnalysisConfig, ConfigError};
pub use symbols::{document_symbols, symbol_name, DocumentSymbol};
pub use syntax_table::{BlockQuery, EditError, StyleSpan, SyntaxTable, TableStats};
pub use zone::{classify_position, Classification, Zone, ZoneClassifier, ZoneError};
