//! Main parser implementation.

use std::collections::VecDeque;

use tracing::trace;

use crate::blocks::{AuxKind, AuxRange, BlockId, BlockKind, BlockTree};
use crate::knowledge::KeywordDatabase;
use crate::lexer::{is_macro_statement, Scanner, Token, TokenKind};
use crate::parser::frame::ParserFrame;
use crate::parser::source::Statement;
use crate::parser::ParserOptions;
use crate::text::{Position, TextModel};

/// A block that has been opened and not yet closed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenBlock {
    pub(crate) id: BlockId,
    pub(crate) kind: BlockKind,
    /// Frame stack height to restore when the block closes.
    pub(crate) frame_depth: usize,
}

/// A region whose end marker was seen while a step was still open. It ends
/// with the step.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingRegion {
    pub(crate) id: BlockId,
    /// Start of the end marker comment.
    pub(crate) footer_start: Position,
}

/// Statement-at-a-time parser producing classified tokens and blocks.
///
/// The parser is an iterator over classified tokens. Once the iterator is
/// exhausted (or whenever the caller decides to stop), [`BlockParser::finish`]
/// closes the open blocks and returns the tree.
pub struct BlockParser<'m, 'k> {
    pub(crate) model: &'m TextModel,
    scanner: Scanner<'m>,
    pub(crate) kb: &'k dyn KeywordDatabase,
    pub(crate) options: ParserOptions,
    peeked: Option<Token>,
    output: VecDeque<Token>,
    pub(crate) frames: Vec<ParserFrame>,
    pub(crate) tree: BlockTree,
    /// Open DATA/PROC/GLOBAL/MACRO blocks, outermost first.
    pub(crate) open: Vec<OpenBlock>,
    /// Open MACRO and CUSTOM blocks, outermost first.
    pub(crate) containers: Vec<BlockId>,
    pub(crate) pending_regions: Vec<PendingRegion>,
}

impl<'m, 'k> BlockParser<'m, 'k> {
    /// Creates a parser for the whole document.
    #[must_use]
    pub fn new(model: &'m TextModel, kb: &'k dyn KeywordDatabase, options: ParserOptions) -> Self {
        Self::starting_at(model, kb, options, Position::default())
    }

    /// Creates a parser starting at `start`, which must be a statement
    /// boundary.
    #[must_use]
    pub fn starting_at(
        model: &'m TextModel,
        kb: &'k dyn KeywordDatabase,
        options: ParserOptions,
        start: Position,
    ) -> Self {
        Self {
            model,
            scanner: Scanner::with_options(model, start, options.scanner.clone()),
            kb,
            options,
            peeked: None,
            output: VecDeque::new(),
            frames: vec![ParserFrame::root()],
            tree: BlockTree::new(),
            open: Vec::new(),
            containers: Vec::new(),
            pending_regions: Vec::new(),
        }
    }

    /// The current frame stack, bottom first.
    #[must_use]
    pub fn frames(&self) -> &[ParserFrame] {
        &self.frames
    }

    /// Returns the next classified token.
    pub fn next_token(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.output.pop_front() {
                return Some(token);
            }
            if !self.process_unit() {
                return None;
            }
        }
    }

    /// If the parser sits between two statements in a state that a fresh
    /// parser started here would share, returns the position of the next
    /// token.
    ///
    /// That is the case when no macro definition or custom region is open,
    /// nothing is buffered and the scanner carries no context. An open DATA,
    /// PROC or GLOBAL block is allowed: the next section start closes it the
    /// same way either parser would.
    #[must_use]
    pub fn sync_position(&self) -> Option<Position> {
        let synchronizable = self.output.is_empty()
            && self.peeked.is_none()
            && self.containers.is_empty()
            && self.pending_regions.is_empty()
            && self.scanner.is_clean();
        synchronizable.then(|| self.scanner.position())
    }

    /// Closes every open block and returns the tree, numbered in pre-order.
    ///
    /// Steps and GLOBAL blocks end at their last statement; macro
    /// definitions and custom regions still open are clamped to the end of
    /// the document.
    #[must_use]
    pub fn finish(mut self) -> BlockTree {
        let doc_end = self.model.end();
        for id in std::mem::take(&mut self.containers) {
            let block = self.tree.block_mut(id);
            block.end = doc_end;
            block.footer_start = doc_end;
        }
        while !self.open.is_empty() {
            self.close_block(false, Position::default());
        }
        let mut tree = self.tree.renumbered();
        tree.recompute_fold_ends();
        tree
    }

    fn raw_next(&mut self) -> Option<Token> {
        self.peeked.take().or_else(|| self.scanner.next())
    }

    fn is_semicolon(&self, token: &Token) -> bool {
        token.kind == TokenKind::Separator && self.model.char_at(token.start) == Some(';')
    }

    fn is_nested_macro_statement(&self, token: &Token) -> bool {
        token.kind == TokenKind::MacroKeyword
            && is_macro_statement(&token.text(self.model).to_ascii_uppercase())
    }

    /// Reads and processes one unit: a trivia token, a data token, or a
    /// statement through its `;`.
    fn process_unit(&mut self) -> bool {
        let Some(first) = self.raw_next() else {
            return false;
        };

        if first.kind.is_trivia() || matches!(first.kind, TokenKind::CardsData | TokenKind::EmbeddedCode) {
            self.lone_token(first);
            return true;
        }

        let mut tokens = vec![first];
        if !self.is_semicolon(&first) {
            let mut in_nested = false;
            while let Some(token) = self.raw_next() {
                if matches!(
                    token.kind,
                    TokenKind::CardsData | TokenKind::EmbeddedCode | TokenKind::MacroSectionKeyword
                ) {
                    self.peeked = Some(token);
                    break;
                }
                tokens.push(token);
                if self.is_nested_macro_statement(&token) {
                    in_nested = true;
                } else if self.is_semicolon(&token) {
                    if in_nested {
                        in_nested = false;
                    } else {
                        break;
                    }
                }
            }
        }

        // Trailing trivia stays outside the statement.
        let mut trailing = Vec::new();
        while tokens.last().is_some_and(|token| token.kind.is_trivia()) {
            if let Some(token) = tokens.pop() {
                trailing.push(token);
            }
        }

        let mut statement = Statement::new(tokens, self.model);
        trace!(start = %statement.start(), end = %statement.end(), "statement");
        self.statement(&mut statement);
        for token in &statement.tokens {
            self.record_aux(token);
        }
        self.output.extend(statement.tokens);

        for token in trailing.into_iter().rev() {
            self.lone_token(token);
        }
        true
    }

    fn lone_token(&mut self, token: Token) {
        match token.kind {
            TokenKind::Comment | TokenKind::MacroComment => self.region_comment(&token),
            TokenKind::CardsData | TokenKind::EmbeddedCode => self.extend_open_blocks(token.end),
            _ => {}
        }
        self.record_aux(&token);
        self.output.push_back(token);
    }

    /// Records literal, comment and data spans on the innermost open block.
    fn record_aux(&mut self, token: &Token) {
        let kind = match token.kind {
            TokenKind::Comment | TokenKind::MacroComment => AuxKind::Comment,
            TokenKind::CardsData | TokenKind::EmbeddedCode => AuxKind::CardsData,
            TokenKind::Date => AuxKind::Literal,
            kind if kind.is_quoted_literal() => AuxKind::Literal,
            _ => return,
        };
        let innermost = self
            .containers
            .last()
            .copied()
            .into_iter()
            .chain(self.open.last().map(|open| open.id))
            .filter(|&id| self.tree.block(id).start <= token.start)
            .max_by_key(|&id| self.tree.block(id).start);
        if let Some(id) = innermost {
            self.tree.block_mut(id).aux_ranges.push(AuxRange {
                kind,
                range: token.range(),
            });
        }
    }
}

impl Iterator for BlockParser<'_, '_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}
