//! Incrementally maintained token and block table.
//!
//! The table owns the document text, its classified tokens, per-line style
//! spans and the block tree. Edits are queued and applied in order; each one
//! is re-derived incrementally when the damage can be bounded, otherwise the
//! whole table is rebuilt once.

use std::collections::VecDeque;

use sas_syntax::{
    parse, reparse, BlockId, BlockKind, BlockTree, EditDescriptor, KeywordDatabase,
    ParserOptions, Position, Range, Splice, TextModel, Token, TokenKind,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::symbols::symbol_name;

/// The part of a token on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleSpan {
    /// First column.
    pub start: u32,
    /// Column after the span.
    pub end: u32,
    /// Token kind.
    pub kind: TokenKind,
    /// The token started on an earlier line.
    pub continued: bool,
}

/// Filters for [`SyntaxTable::block_at`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockQuery {
    /// Exclude the block end position.
    pub strict: bool,
    /// Skip custom regions.
    pub ignore_custom: bool,
    /// Skip synthesized GLOBAL blocks.
    pub ignore_global: bool,
}

impl BlockQuery {
    fn accepts(self, kind: BlockKind) -> bool {
        match kind {
            BlockKind::Custom => !self.ignore_custom,
            BlockKind::Global => !self.ignore_global,
            _ => true,
        }
    }
}

/// Counters of re-derivations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Edits applied.
    pub edits: usize,
    /// Edits re-derived incrementally.
    pub incremental: usize,
    /// Full re-derivations, including the initial one.
    pub full: usize,
}

/// An edit that does not fit the document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditError {
    /// The removed range lies outside the document.
    #[error("edit range {range} outside document ending at {end}")]
    OutOfBounds {
        /// Removed range of the edit.
        range: Range,
        /// Document end.
        end: Position,
    },
    /// The removed text does not match the document.
    #[error("removed text of edit at {range} does not match the document")]
    StaleText {
        /// Removed range of the edit.
        range: Range,
    },
}

/// Token and block table of one document.
pub struct SyntaxTable<'k> {
    model: TextModel,
    kb: &'k dyn KeywordDatabase,
    options: ParserOptions,
    tokens: Vec<Token>,
    tree: BlockTree,
    lines: Vec<Vec<StyleSpan>>,
    pending: VecDeque<EditDescriptor>,
    stats: TableStats,
}

impl<'k> SyntaxTable<'k> {
    /// Builds the table for `text`.
    #[must_use]
    pub fn new(text: &str, kb: &'k dyn KeywordDatabase, config: &AnalysisConfig) -> Self {
        Self::with_options(text, kb, config.parser_options())
    }

    /// Builds the table with explicit parser options.
    #[must_use]
    pub fn with_options(text: &str, kb: &'k dyn KeywordDatabase, options: ParserOptions) -> Self {
        let mut table = Self {
            model: TextModel::new(text),
            kb,
            options,
            tokens: Vec::new(),
            tree: BlockTree::new(),
            lines: Vec::new(),
            pending: VecDeque::new(),
            stats: TableStats::default(),
        };
        table.rebuild();
        table
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Queues `edit` and applies every queued edit.
    pub fn apply(&mut self, edit: EditDescriptor) {
        self.enqueue(edit);
        self.flush();
    }

    /// Queues `edit` without applying it.
    pub fn enqueue(&mut self, edit: EditDescriptor) {
        self.pending.push_back(edit);
    }

    /// Number of queued edits.
    #[must_use]
    pub fn pending_edits(&self) -> usize {
        self.pending.len()
    }

    /// Applies the queued edits in order.
    pub fn flush(&mut self) {
        while let Some(edit) = self.pending.pop_front() {
            self.apply_one(edit);
        }
    }

    /// Re-derives the whole table.
    pub fn rebuild(&mut self) {
        let output = parse(&self.model, self.kb, &self.options);
        self.tokens = output.tokens;
        self.tree = output.tree;
        self.lines = line_spans(&self.model, &self.tokens, 0, self.model.line_count());
        self.stats.full += 1;
        debug!(
            lines = self.model.line_count(),
            tokens = self.tokens.len(),
            blocks = self.tree.len(),
            "full rebuild"
        );
    }

    fn apply_one(&mut self, edit: EditDescriptor) {
        let edit = match self.check(&edit) {
            Ok(()) => edit,
            Err(err) => {
                warn!("{err}; clamping");
                let range = edit.removed_range;
                EditDescriptor::replace(&self.model, range, &edit.inserted_text)
            }
        };
        self.stats.edits += 1;
        self.model.apply(&edit);

        match reparse(&self.tree, &edit, &self.model, self.kb, &self.options) {
            Some(splice) => {
                debug!(
                    line = edit.removed_range.start.line,
                    blocks = ?splice.replaced,
                    outcome = "partial",
                    "applied edit"
                );
                let tokens = splice.merge_tokens(&self.tokens, &edit);
                self.update_lines(&splice, &edit, &tokens);
                self.tokens = tokens;
                self.tree = splice.tree;
                self.stats.incremental += 1;
            }
            None => {
                debug!(
                    line = edit.removed_range.start.line,
                    outcome = "full",
                    "applied edit"
                );
                self.rebuild();
            }
        }
    }

    fn check(&self, edit: &EditDescriptor) -> Result<(), EditError> {
        let range = edit.removed_range;
        if self.model.clamp(range.start) != range.start
            || self.model.clamp(range.end) != range.end
            || range.end < range.start
        {
            return Err(EditError::OutOfBounds {
                range,
                end: self.model.end(),
            });
        }
        if self.model.slice(range) != edit.removed_text {
            return Err(EditError::StaleText { range });
        }
        Ok(())
    }

    /// Recomputes the style spans of the re-derived lines and shifts the
    /// rest.
    fn update_lines(&mut self, splice: &Splice, edit: &EditDescriptor, tokens: &[Token]) {
        let first = splice.start.line as usize;
        let line_count = self.model.line_count();
        let (last, kept_from) = match splice.resume {
            Some(resume) => (resume.line + 1, edit.unshift(resume).line as usize + 1),
            None => (line_count, self.lines.len()),
        };

        let mut lines = Vec::with_capacity(line_count as usize);
        lines.extend_from_slice(&self.lines[..first.min(self.lines.len())]);
        lines.extend(line_spans(&self.model, tokens, splice.start.line, last));
        lines.extend_from_slice(&self.lines[kept_from.min(self.lines.len())..]);

        if lines.len() == line_count as usize {
            self.lines = lines;
        } else {
            warn!(
                expected = line_count,
                found = lines.len(),
                "style lines out of step, recomputing"
            );
            self.lines = line_spans(&self.model, tokens, 0, line_count);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Style spans of line `line`; empty past the end of the document.
    #[must_use]
    pub fn line(&self, line: u32) -> &[StyleSpan] {
        self.lines.get(line as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of lines.
    #[must_use]
    pub fn line_count(&self) -> u32 {
        self.model.line_count()
    }

    /// All tokens, in order.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The token at `pos`: the one with `start <= pos < end`, or the last
    /// token at the end of the document.
    #[must_use]
    pub fn token_at(&self, pos: Position) -> Option<Token> {
        let pos = self.model.clamp(pos);
        let spans = self.line(pos.line);
        if let Some(index) = spans
            .iter()
            .position(|span| span.start <= pos.column && pos.column < span.end)
        {
            let start = self.span_start(pos.line, index);
            let at = self.tokens.partition_point(|token| token.start < start);
            if let Some(token) = self.tokens.get(at).filter(|token| token.start == start) {
                return Some(*token);
            }
        }
        let at = self.tokens.partition_point(|token| token.end <= pos);
        self.tokens.get(at).or(self.tokens.last()).copied()
    }

    /// Start of the token owning span `index` of `line`, following
    /// continued spans back to the line the token starts on.
    fn span_start(&self, mut line: u32, index: usize) -> Position {
        let mut span = self.line(line)[index];
        while span.continued && line > 0 {
            line -= 1;
            match self.line(line).last() {
                Some(previous) => span = *previous,
                None => break,
            }
        }
        Position::new(line, span.start)
    }

    /// Tokens overlapping `range`. For an empty range, the token containing
    /// its position.
    #[must_use]
    pub fn tokens_in(&self, range: Range) -> &[Token] {
        let from = self.tokens.partition_point(|token| token.end <= range.start);
        let to = self
            .tokens
            .partition_point(|token| token.start < range.end)
            .max(from);
        &self.tokens[from..to]
    }

    /// The innermost block containing `pos` that `query` accepts.
    #[must_use]
    pub fn block_at(&self, pos: Position, query: BlockQuery) -> Option<BlockId> {
        self.tree
            .path_at(pos, query.strict)
            .into_iter()
            .rev()
            .find(|&id| query.accepts(self.tree.block(id).kind))
    }

    /// The block tree.
    #[must_use]
    pub fn blocks(&self) -> &BlockTree {
        &self.tree
    }

    /// Display name of block `id`.
    #[must_use]
    pub fn symbol_name(&self, id: BlockId) -> String {
        symbol_name(self.tree.block(id))
    }

    /// The document text.
    #[must_use]
    pub fn text(&self) -> String {
        self.model.text()
    }

    /// The document buffer.
    #[must_use]
    pub fn model(&self) -> &TextModel {
        &self.model
    }

    /// Parser options in use.
    #[must_use]
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// The keyword knowledge base.
    #[must_use]
    pub fn kb(&self) -> &'k dyn KeywordDatabase {
        self.kb
    }

    /// Re-derivation counters.
    #[must_use]
    pub fn stats(&self) -> TableStats {
        self.stats
    }
}

/// Style spans of lines `first..last` from `tokens`.
fn line_spans(model: &TextModel, tokens: &[Token], first: u32, last: u32) -> Vec<Vec<StyleSpan>> {
    let mut lines: Vec<Vec<StyleSpan>> = vec![Vec::new(); last.saturating_sub(first) as usize];
    let from = tokens.partition_point(|token| token.end <= Position::new(first, 0));
    for token in tokens[from..]
        .iter()
        .take_while(|token| token.start.line < last)
    {
        let lo = token.start.line.max(first);
        let hi = token.end.line.min(last.saturating_sub(1));
        for line in lo..=hi {
            let start = if line == token.start.line { token.start.column } else { 0 };
            let end = if line == token.end.line {
                token.end.column
            } else {
                model.line_len(line)
            };
            let interior = line > token.start.line && line < token.end.line;
            if end > start || interior {
                lines[(line - first) as usize].push(StyleSpan {
                    start,
                    end,
                    kind: token.kind,
                    continued: line > token.start.line,
                });
            }
        }
    }
    lines
}
