//! `sas-syntax` - Scanner, block parser and incremental damage computation
//! for SAS programs.
//!
//! This crate provides the syntactic layer of the SAS language service:
//!
//! - **Text**: a line/column addressed document buffer and edit descriptors
//! - **Lexer**: the [`Scanner`], a restartable tokenizer covering macro
//!   quoting, literal data and embedded Python/Lua blocks
//! - **Knowledge**: the [`KeywordDatabase`] trait and an in-memory catalog
//! - **Parser**: the [`BlockParser`], which classifies keywords and builds
//!   the [`BlockTree`] of DATA steps, procedures, macros and regions
//! - **Incremental**: damage computation and splicing after an edit
//!
//! # Design Principles
//!
//! - **Lossless**: tokens concatenate to the source byte for byte
//! - **Error-tolerant**: malformed input never fails, unterminated
//!   constructs run to the end of the document
//! - **Incremental**: top-level blocks are the unit of re-derivation
//!
//! # Example
//!
//! ```
//! use sas_syntax::{parse, ParserOptions, StaticKeywordDatabase, TextModel, TokenKind};
//!
//! let model = TextModel::new("proc print data=a;\nrun;\n");
//! let output = parse(&model, StaticKeywordDatabase::builtin(), &ParserOptions::default());
//!
//! assert_eq!(output.tree.roots().len(), 1);
//! assert_eq!(output.tokens[0].kind, TokenKind::SectionKeyword);
//! assert_eq!(output.tokens[2].kind, TokenKind::ProcName);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod blocks;
pub mod incremental;
pub mod knowledge;
pub mod lexer;
pub mod parser;
pub mod text;

pub use blocks::{AuxKind, AuxRange, Block, BlockId, BlockKind, BlockTree};
pub use incremental::{compute_damage, reparse, splice, DamageRange, ReparseOutcome, Splice};
pub use knowledge::{
    KeywordDatabase, KnowledgeError, OptionOwner, OptionType, StatementContext,
    StaticKeywordDatabase,
};
pub use lexer::{lex, EmbeddedLanguage, QuotingState, Scanner, ScannerOptions, Token, TokenKind};
pub use parser::{parse, BlockParser, ParseOutput, ParserOptions};
pub use text::{EditDescriptor, Position, Range, TextModel};
