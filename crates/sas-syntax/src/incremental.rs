//! Incremental re-derivation after an edit.
//!
//! Top-level blocks are the unit of damage. [`compute_damage`] picks the
//! run of top-level blocks an edit can affect and widens it for constructs
//! that reach past it (an unclosed `%MACRO`, a token running over the range
//! end). An unterminated block comment or string starting inside the range
//! cannot be bounded and asks for a full re-derivation instead.
//!
//! [`splice`] then re-parses from the damage start with a fresh parser and
//! keeps going past the damage end until the parser sits, in a state a
//! fresh parser would share, at the shifted start of a kept DATA, PROC or
//! %MACRO block. Everything before the damage start is kept as is and
//! everything from the synchronization point on is shifted by the edit.

use std::ops::Range as IndexRange;

use tracing::debug;

use crate::blocks::{BlockKind, BlockTree};
use crate::knowledge::KeywordDatabase;
use crate::lexer::{Scanner, Token, TokenKind};
use crate::parser::{BlockParser, ParserOptions};
use crate::text::{EditDescriptor, Position, TextModel};

/// The part of the document an edit invalidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageRange {
    /// Start of re-derivation. Text before it is unchanged by the edit, so
    /// the position is valid before and after the edit.
    pub start: Position,
    /// End of the damaged text, in pre-edit coordinates.
    pub end: Position,
    /// Indices into the pre-edit [`BlockTree::roots`] of the damaged blocks.
    pub blocks: IndexRange<usize>,
}

/// Result of [`compute_damage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReparseOutcome {
    /// Only the given range needs to be re-derived.
    Partial(DamageRange),
    /// The edit cannot be bounded; re-derive the whole document.
    RequiresFull,
}

/// Re-derived part of the document, ready to be merged with the old state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    /// Where the new tokens start.
    pub start: Position,
    /// Post-edit position where the old tokens take over again, or `None`
    /// if re-derivation ran to the end of the document.
    pub resume: Option<Position>,
    /// Classified tokens covering `start..resume`.
    pub tokens: Vec<Token>,
    /// The complete post-edit block tree.
    pub tree: BlockTree,
    /// Indices into the pre-edit roots that were replaced.
    pub replaced: IndexRange<usize>,
}

impl Splice {
    /// Merges the re-derived tokens into the pre-edit token list.
    #[must_use]
    pub fn merge_tokens(&self, old: &[Token], edit: &EditDescriptor) -> Vec<Token> {
        let before = old.partition_point(|token| token.start < self.start);
        let mut tokens = Vec::with_capacity(old.len() + self.tokens.len());
        tokens.extend_from_slice(&old[..before]);
        tokens.extend_from_slice(&self.tokens);
        if let Some(resume) = self.resume {
            let from = edit.unshift(resume);
            let after = old.partition_point(|token| token.start < from);
            tokens.extend(old[after..].iter().map(|token| {
                Token::new(token.kind, edit.shift(token.start), edit.shift(token.end))
            }));
        }
        tokens
    }
}

/// Computes the damage of `edit` on the document whose pre-edit block tree
/// is `tree`. `model` is the post-edit text.
#[must_use]
pub fn compute_damage(tree: &BlockTree, edit: &EditDescriptor, model: &TextModel) -> ReparseOutcome {
    let roots = tree.roots();
    let removed = edit.removed_range;
    let old_end = edit.unshift(model.end());

    // First damaged block.
    let mut first = tree.root_index_at(removed.start);
    if let Some(index) = first {
        if removed.intersects(&tree.block(roots[index]).header()) {
            first = index.checked_sub(1);
        }
    }
    let (first, start) = match first {
        Some(index) => (index, tree.block(roots[index]).start),
        None => (0, Position::default()),
    };

    // One past the last damaged block.
    let mut last_end = match roots
        .iter()
        .enumerate()
        .skip(first)
        .find(|(_, &id)| tree.block(id).end >= removed.end)
    {
        Some((index, &id)) => {
            let block = tree.block(id);
            if removed.intersects(&block.footer()) || !block.explicitly_terminated {
                (index + 2).min(roots.len())
            } else {
                index + 1
            }
        }
        None => roots.len(),
    };
    let mut end = damage_end(tree, first..last_end, removed.end, old_end);

    // Open-ended constructs.
    let mut macro_depth = 0usize;
    for token in Scanner::new(model, start) {
        let shifted_end = edit.shift(end);
        if token.start >= shifted_end && macro_depth == 0 {
            break;
        }
        if is_unterminated(&token, model) && token.start < shifted_end {
            debug!(start = %token.start, kind = ?token.kind, "unterminated token, full reparse");
            return ReparseOutcome::RequiresFull;
        }
        if token.kind == TokenKind::MacroSectionKeyword {
            if token.text(model).eq_ignore_ascii_case("%macro") {
                macro_depth += 1;
            } else {
                macro_depth = macro_depth.saturating_sub(1);
            }
        }
        let reaches_past = token.start < shifted_end && token.end > shifted_end;
        let closes_macro = token.start >= shifted_end && macro_depth == 0;
        if reaches_past || closes_macro {
            let unshifted = edit.unshift(token.end);
            match tree.root_index_at(unshifted) {
                Some(index) if index + 1 > last_end => {
                    last_end = index + 1;
                    end = damage_end(tree, first..last_end, unshifted, old_end);
                }
                _ => end = end.max(unshifted.min(old_end)),
            }
        }
    }
    if macro_depth > 0 {
        // %MACRO without %MEND: everything after it is macro body.
        last_end = roots.len();
        end = old_end;
    }

    let damage = DamageRange {
        start,
        end,
        blocks: first..last_end,
    };
    debug!(start = %damage.start, end = %damage.end, blocks = ?damage.blocks, "damage");
    ReparseOutcome::Partial(damage)
}

/// Re-derives the damaged part of the document and merges it with the
/// kept blocks of `old`.
///
/// Blocks are grafted in document order, so ids come out in the same
/// pre-order as a full parse.
#[must_use]
pub fn splice(
    old: &BlockTree,
    edit: &EditDescriptor,
    model: &TextModel,
    kb: &dyn KeywordDatabase,
    options: &ParserOptions,
    damage: &DamageRange,
) -> Splice {
    let roots = old.roots();
    let candidates: Vec<(usize, Position)> = (damage.blocks.end..roots.len())
        .filter(|&index| {
            let block = old.block(roots[index]);
            matches!(
                block.kind,
                BlockKind::Data | BlockKind::Procedure | BlockKind::Macro
            )
        })
        .map(|index| (index, edit.shift(old.block(roots[index]).start)))
        .collect();

    let mut parser = BlockParser::starting_at(model, kb, options.clone(), damage.start);
    let mut tokens = Vec::new();
    let mut next = 0;
    let mut resume = None;
    loop {
        if let Some(pos) = parser.sync_position() {
            while candidates.get(next).is_some_and(|&(_, at)| at < pos) {
                next += 1;
            }
            if let Some(&(index, at)) = candidates.get(next).filter(|&&(_, at)| at == pos) {
                resume = Some((index, at));
                break;
            }
        }
        match parser.next_token() {
            Some(token) => tokens.push(token),
            None => break,
        }
    }
    let partial = parser.finish();

    let kept_from = resume.map_or(roots.len(), |(index, _)| index);
    let mut tree = BlockTree::new();
    for &id in &roots[..damage.blocks.start] {
        tree.graft(old, id, None, &|pos| pos);
    }
    for &id in partial.roots() {
        tree.graft(&partial, id, None, &|pos| pos);
    }
    for &id in &roots[kept_from..] {
        tree.graft(old, id, None, &|pos| edit.shift(pos));
    }
    tree.recompute_fold_ends();

    debug!(
        start = %damage.start,
        resume = ?resume.map(|(_, at)| at),
        tokens = tokens.len(),
        "spliced"
    );
    Splice {
        start: damage.start,
        resume: resume.map(|(_, at)| at),
        tokens,
        tree,
        replaced: damage.blocks.start..kept_from,
    }
}

/// [`compute_damage`] followed by [`splice`]. Returns `None` when the
/// whole document must be re-derived.
#[must_use]
pub fn reparse(
    old: &BlockTree,
    edit: &EditDescriptor,
    model: &TextModel,
    kb: &dyn KeywordDatabase,
    options: &ParserOptions,
) -> Option<Splice> {
    match compute_damage(old, edit, model) {
        ReparseOutcome::Partial(damage) => Some(splice(old, edit, model, kb, options, &damage)),
        ReparseOutcome::RequiresFull => None,
    }
}

/// End of the damage: the furthest end among `blocks`, at least `at_least`.
fn damage_end(
    tree: &BlockTree,
    blocks: IndexRange<usize>,
    at_least: Position,
    old_end: Position,
) -> Position {
    let roots = tree.roots();
    let furthest = roots[blocks.clone()]
        .iter()
        .map(|&id| tree.block(id).end)
        .max()
        .unwrap_or(old_end);
    if blocks.end == roots.len() {
        return old_end;
    }
    furthest.max(at_least).min(old_end)
}

/// A `/*` comment or quoted string that runs to the end of the document
/// without its closer.
fn is_unterminated(token: &Token, model: &TextModel) -> bool {
    if token.end != model.end() {
        return false;
    }
    let text = token.text(model);
    match token.kind {
        TokenKind::Comment if text.starts_with("/*") => text.len() < 4 || !text.ends_with("*/"),
        TokenKind::String => match text.chars().next() {
            Some(quote @ ('\'' | '"')) => text.len() < 2 || !text.ends_with(quote),
            _ => false,
        },
        _ => false,
    }
}
