//! Block arena.
//!
//! Blocks are stored in a flat vector and address each other by [`BlockId`].
//! Top-level blocks are listed in [`BlockTree::roots`] in start order.
//! Trees handed out by the parser and by incremental splicing are numbered
//! in pre-order, so two trees with the same structure compare equal.

use std::fmt::Write as _;

use serde::Serialize;
use smol_str::SmolStr;

use crate::text::{Position, Range};

/// Index of a block in its [`BlockTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BlockId(u32);

impl BlockId {
    /// The raw index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of a logical block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    /// `DATA ...; ... RUN;`
    Data,
    /// `PROC ...; ... RUN;` / `QUIT;`
    Procedure,
    /// `%MACRO ...; ... %MEND;`
    Macro,
    /// Consecutive statements outside any step.
    Global,
    /// `/* region */ ... /* endregion */`
    Custom,
}

impl BlockKind {
    /// Returns `true` for DATA and PROCEDURE blocks.
    #[must_use]
    pub fn is_step(self) -> bool {
        matches!(self, Self::Data | Self::Procedure)
    }
}

/// Kind of an auxiliary range recorded on a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuxKind {
    /// String or date-family literal.
    Literal,
    /// Comment.
    Comment,
    /// Cards data or embedded code.
    CardsData,
}

/// A literal, comment or data span inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AuxRange {
    /// Span kind.
    pub kind: AuxKind,
    /// Span.
    pub range: Range,
}

/// A logical block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    /// Block kind.
    pub kind: BlockKind,
    /// Upper-cased name: procedure name, first data set, macro name or
    /// region label.
    pub name: SmolStr,
    /// Start of the opening keyword (or region comment).
    pub start: Position,
    /// End of the closing statement, or of the last statement for blocks
    /// that were closed implicitly.
    pub end: Position,
    /// Last line that should be folded.
    pub fold_end: u32,
    /// End of the opening statement.
    pub header_end: Position,
    /// Start of the closing statement (`end` when implicitly closed).
    pub footer_start: Position,
    /// `true` if closed by `RUN`/`QUIT`/`%MEND`/`endregion`.
    pub explicitly_terminated: bool,
    /// Enclosing block.
    pub parent: Option<BlockId>,
    /// Nested blocks in start order.
    pub children: Vec<BlockId>,
    /// Literal, comment and data spans.
    pub aux_ranges: Vec<AuxRange>,
}

impl Block {
    /// Creates an open block starting at `start`.
    #[must_use]
    pub fn new(kind: BlockKind, name: impl Into<SmolStr>, start: Position) -> Self {
        Self {
            kind,
            name: name.into(),
            start,
            end: start,
            fold_end: start.line,
            header_end: start,
            footer_start: start,
            explicitly_terminated: false,
            parent: None,
            children: Vec::new(),
            aux_ranges: Vec::new(),
        }
    }

    /// The block's range.
    #[must_use]
    pub fn range(&self) -> Range {
        Range::new(self.start, self.end)
    }

    /// The opening statement's range.
    #[must_use]
    pub fn header(&self) -> Range {
        Range::new(self.start, self.header_end)
    }

    /// The closing statement's range.
    #[must_use]
    pub fn footer(&self) -> Range {
        Range::new(self.footer_start, self.end)
    }
}

/// Arena of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockTree {
    blocks: Vec<Block>,
    roots: Vec<BlockId>,
}

impl BlockTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if there are no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Top-level blocks in start order.
    #[must_use]
    pub fn roots(&self) -> &[BlockId] {
        &self.roots
    }

    /// Returns the block for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// Returns the block for `id`, if it exists.
    #[must_use]
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.index()]
    }

    /// Adds `block` as the last child of `parent` (or as a root).
    pub fn push(&mut self, mut block: Block, parent: Option<BlockId>) -> BlockId {
        let id = BlockId(u32::try_from(self.blocks.len()).unwrap_or(u32::MAX));
        block.parent = parent;
        self.blocks.push(block);
        match parent {
            Some(parent) => self.blocks[parent.index()].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Inserts `block` between `child` and its parent, taking `child`'s
    /// place among its siblings.
    pub(crate) fn wrap(&mut self, child: BlockId, mut block: Block) -> BlockId {
        let id = BlockId(u32::try_from(self.blocks.len()).unwrap_or(u32::MAX));
        let parent = self.blocks[child.index()].parent;
        block.parent = parent;
        block.children = vec![child];
        self.blocks.push(block);
        let siblings = match parent {
            Some(parent) => &mut self.blocks[parent.index()].children,
            None => &mut self.roots,
        };
        if let Some(slot) = siblings.iter_mut().find(|slot| **slot == child) {
            *slot = id;
        }
        self.blocks[child.index()].parent = Some(id);
        id
    }

    /// A copy of the tree with ids assigned in pre-order.
    #[must_use]
    pub fn renumbered(&self) -> BlockTree {
        let mut tree = BlockTree::new();
        for &root in &self.roots {
            tree.graft(self, root, None, &|pos| pos);
        }
        tree
    }

    /// Iterates all blocks in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> + '_ {
        let mut stack: Vec<BlockId> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let block = self.block(id);
            stack.extend(block.children.iter().rev().copied());
            Some((id, block))
        })
    }

    /// Blocks whose range contains `pos`, outermost first.
    ///
    /// With `strict`, a block contains `pos` only if `start <= pos < end`;
    /// otherwise the end position counts as inside.
    #[must_use]
    pub fn path_at(&self, pos: Position, strict: bool) -> Vec<BlockId> {
        let inside = |block: &Block| {
            if strict {
                block.range().contains(pos)
            } else {
                block.range().contains_inclusive(pos)
            }
        };
        let mut path = Vec::new();
        let mut level: &[BlockId] = &self.roots;
        loop {
            let next = level
                .iter()
                .copied()
                .filter(|&id| inside(self.block(id)))
                .min_by_key(|&id| {
                    let block = self.block(id);
                    (block.end.line - block.start.line, block.end.column)
                });
            match next {
                Some(id) => {
                    path.push(id);
                    level = &self.block(id).children;
                }
                None => return path,
            }
        }
    }

    /// Index in [`BlockTree::roots`] of the last root starting at or before
    /// `pos`.
    #[must_use]
    pub fn root_index_at(&self, pos: Position) -> Option<usize> {
        self.roots
            .partition_point(|&id| self.block(id).start <= pos)
            .checked_sub(1)
    }

    /// Copies the subtree rooted at `id` of `source` into this tree, mapping
    /// every position through `map`.
    pub fn graft(
        &mut self,
        source: &BlockTree,
        id: BlockId,
        parent: Option<BlockId>,
        map: &impl Fn(Position) -> Position,
    ) -> BlockId {
        let original = source.block(id);
        let mut block = Block {
            children: Vec::new(),
            aux_ranges: original
                .aux_ranges
                .iter()
                .map(|aux| AuxRange {
                    kind: aux.kind,
                    range: Range::new(map(aux.range.start), map(aux.range.end)),
                })
                .collect(),
            ..original.clone()
        };
        block.start = map(original.start);
        block.end = map(original.end);
        block.header_end = map(original.header_end);
        block.footer_start = map(original.footer_start);
        let new_id = self.push(block, parent);
        for &child in &original.children {
            self.graft(source, child, Some(new_id), map);
        }
        new_id
    }

    /// Recomputes [`Block::fold_end`] for every block.
    ///
    /// A block that ends on the line where its next sibling starts folds up
    /// to the previous line, so that both blocks stay foldable.
    pub fn recompute_fold_ends(&mut self) {
        let mut levels = vec![self.roots.clone()];
        levels.extend(self.blocks.iter().map(|block| block.children.clone()));
        for level in levels {
            for (index, &id) in level.iter().enumerate() {
                let next_start = level
                    .get(index + 1)
                    .map(|&next| self.block(next).start.line);
                let block = self.block_mut(id);
                block.fold_end = match next_start {
                    Some(line) if line == block.end.line && block.end.line > block.start.line => {
                        block.end.line - 1
                    }
                    _ => block.end.line,
                };
            }
        }
    }

    /// Checks the structural invariants and returns a description of every
    /// violation.
    ///
    /// Children lie inside their parent and siblings do not overlap.
    #[must_use]
    pub fn violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut levels: Vec<(Option<BlockId>, &[BlockId])> = vec![(None, &self.roots)];
        levels.extend(
            self.iter()
                .map(|(id, block)| (Some(id), block.children.as_slice())),
        );
        for (parent, level) in levels {
            for pair in level.windows(2) {
                let (a, b) = (self.block(pair[0]), self.block(pair[1]));
                if a.start > b.start {
                    problems.push(format!("siblings out of order: {} after {}", a.start, b.start));
                }
                if a.end > b.start {
                    problems.push(format!(
                        "siblings overlap: {:?} {} and {:?} {}",
                        a.kind,
                        a.range(),
                        b.kind,
                        b.range()
                    ));
                }
            }
            for &id in level {
                let block = self.block(id);
                if block.start > block.end {
                    problems.push(format!("inverted block {:?} {}", block.kind, block.range()));
                }
                if block.parent != parent {
                    problems.push(format!("wrong parent link at {}", block.start));
                }
                if let Some(parent) = parent {
                    let outer = self.block(parent);
                    if !outer.range().covers(&block.range()) {
                        problems.push(format!(
                            "{:?} {} escapes {:?} {}",
                            block.kind,
                            block.range(),
                            outer.kind,
                            outer.range()
                        ));
                    }
                    if outer.kind.is_step() || outer.kind == BlockKind::Global {
                        problems.push(format!("{:?} nested in {:?}", block.kind, outer.kind));
                    }
                }
            }
        }
        problems
    }

    /// Indented outline of the tree, one block per line.
    #[must_use]
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for &root in &self.roots {
            self.outline_block(root, 0, &mut out);
        }
        out
    }

    fn outline_block(&self, id: BlockId, depth: usize, out: &mut String) {
        let block = self.block(id);
        let _ = writeln!(
            out,
            "{:indent$}{:?} {:?} {} fold={}{}",
            "",
            block.kind,
            block.name.as_str(),
            block.range(),
            block.fold_end,
            if block.explicitly_terminated { "" } else { " implicit" },
            indent = depth * 2
        );
        for &child in &block.children {
            self.outline_block(child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, column: u32) -> Position {
        Position::new(line, column)
    }

    fn closed(kind: BlockKind, start: Position, end: Position) -> Block {
        let mut block = Block::new(kind, "", start);
        block.end = end;
        block.explicitly_terminated = true;
        block
    }

    #[test]
    fn fold_end_steps_back_on_shared_line() {
        let mut tree = BlockTree::new();
        tree.push(closed(BlockKind::Procedure, pos(0, 0), pos(2, 4)), None);
        tree.push(closed(BlockKind::Procedure, pos(2, 5), pos(4, 4)), None);
        tree.recompute_fold_ends();
        let folds: Vec<_> = tree.iter().map(|(_, block)| block.fold_end).collect();
        assert_eq!(folds, vec![1, 4]);
    }

    #[test]
    fn path_prefers_innermost() {
        let mut tree = BlockTree::new();
        let outer = tree.push(closed(BlockKind::Macro, pos(0, 0), pos(9, 6)), None);
        let inner = tree.push(closed(BlockKind::Data, pos(1, 0), pos(3, 4)), Some(outer));
        assert_eq!(tree.path_at(pos(2, 0), true), vec![outer, inner]);
        assert_eq!(tree.path_at(pos(9, 6), true), Vec::<BlockId>::new());
        assert_eq!(tree.path_at(pos(9, 6), false), vec![outer]);
        assert!(tree.violations().is_empty());
    }

    #[test]
    fn violations_report_escaping_child() {
        let mut tree = BlockTree::new();
        let outer = tree.push(closed(BlockKind::Macro, pos(0, 0), pos(2, 0)), None);
        tree.push(closed(BlockKind::Data, pos(1, 0), pos(3, 0)), Some(outer));
        assert_eq!(tree.violations().len(), 1);
    }

    #[test]
    fn violations_report_overlapping_regions() {
        let mut tree = BlockTree::new();
        tree.push(closed(BlockKind::Custom, pos(0, 0), pos(2, 15)), None);
        tree.push(closed(BlockKind::Procedure, pos(1, 0), pos(1, 16)), None);
        assert_eq!(tree.violations().len(), 1);
    }

    #[test]
    fn wrap_takes_the_child_slot() {
        let mut tree = BlockTree::new();
        let outer = tree.push(closed(BlockKind::Macro, pos(0, 0), pos(9, 6)), None);
        let first = tree.push(closed(BlockKind::Data, pos(1, 0), pos(3, 4)), Some(outer));
        let second = tree.push(closed(BlockKind::Data, pos(4, 0), pos(5, 4)), Some(outer));
        let region = tree.wrap(first, closed(BlockKind::Custom, pos(1, 0), pos(3, 4)));
        assert_eq!(tree.block(outer).children, vec![region, second]);
        assert_eq!(tree.block(region).children, vec![first]);
        assert_eq!(tree.block(first).parent, Some(region));
        assert!(tree.violations().is_empty());

        let renumbered = tree.renumbered();
        let order: Vec<_> = renumbered.iter().map(|(id, block)| (id.index(), block.kind)).collect();
        assert_eq!(
            order,
            vec![
                (0, BlockKind::Macro),
                (1, BlockKind::Custom),
                (2, BlockKind::Data),
                (3, BlockKind::Data)
            ]
        );
    }

    #[test]
    fn graft_maps_positions() {
        let mut source = BlockTree::new();
        let id = source.push(closed(BlockKind::Data, pos(1, 0), pos(2, 4)), None);
        let mut target = BlockTree::new();
        target.graft(&source, id, None, &|p| Position::new(p.line + 3, p.column));
        let block = target.block(target.roots()[0]);
        assert_eq!(block.range(), Range::new(pos(4, 0), pos(5, 4)));
    }
}
