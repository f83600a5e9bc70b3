//! Section statements and block bookkeeping.
//!
//! DATA, PROC and %MACRO open blocks; RUN, QUIT and %MEND close them.
//! Statements outside any step are gathered into synthesized GLOBAL blocks.
//! Region comments open and close CUSTOM blocks. Blocks opened inside a
//! region are its children. A region that starts inside a DATA or PROC step
//! wraps that step instead of splitting it, and its end waits for the step to
//! end; a GLOBAL block is cut at the region boundary.

use smol_str::SmolStr;
use tracing::trace;

use crate::blocks::{Block, BlockId, BlockKind};
use crate::knowledge::OptionOwner;
use crate::lexer::{is_name_char, Token, TokenKind};
use crate::parser::frame::{Continuation, ParserFrame, SectionState};
use crate::parser::parser::{OpenBlock, PendingRegion};
use crate::parser::source::Statement;
use crate::text::Position;

use super::super::BlockParser;

impl BlockParser<'_, '_> {
    // =========================================================================
    // Block stack
    // =========================================================================

    /// The open step or GLOBAL block, if the innermost open block is one.
    pub(crate) fn current_section(&self) -> Option<OpenBlock> {
        self.open
            .last()
            .copied()
            .filter(|open| open.kind != BlockKind::Macro)
    }

    fn innermost_macro(&self) -> Option<BlockId> {
        self.open
            .iter()
            .rev()
            .find(|open| open.kind == BlockKind::Macro)
            .map(|open| open.id)
    }

    fn open_block(&mut self, kind: BlockKind, name: SmolStr, start: Position) -> BlockId {
        let parent = self.containers.last().copied();
        let id = self.tree.push(Block::new(kind, name, start), parent);
        self.open.push(OpenBlock {
            id,
            kind,
            frame_depth: self.frames.len(),
        });
        trace!(?kind, %start, "open block");
        id
    }

    /// Sets the end of every open block (except regions) to `end`.
    pub(crate) fn extend_open_blocks(&mut self, end: Position) {
        for open in &self.open {
            let block = self.tree.block_mut(open.id);
            if block.end < end {
                block.end = end;
            }
        }
    }

    /// Pops the innermost open block and ends the regions waiting for it.
    pub(crate) fn close_block(&mut self, explicit: bool, footer_start: Position) {
        let Some(open) = self.open.pop() else {
            return;
        };
        self.frames.truncate(open.frame_depth.max(1));
        let block = self.tree.block_mut(open.id);
        block.explicitly_terminated = explicit;
        block.footer_start = if explicit { footer_start } else { block.end };
        let end = block.end;
        trace!(kind = ?open.kind, %end, explicit, "close block");

        for pending in std::mem::take(&mut self.pending_regions).into_iter().rev() {
            let region = self.tree.block_mut(pending.id);
            region.end = region.end.max(end);
            region.footer_start = pending.footer_start;
            region.explicitly_terminated = true;
            trace!(start = %region.start, end = %region.end, "close region");
        }
    }

    /// Implicitly closes an open GLOBAL block at its last statement.
    fn close_open_global(&mut self) {
        if self
            .current_section()
            .is_some_and(|open| open.kind == BlockKind::Global)
        {
            self.close_block(false, Position::default());
        }
    }

    /// Implicitly closes an open step or GLOBAL block at its last statement.
    fn close_open_section(&mut self) {
        if self.current_section().is_some() {
            self.close_block(false, Position::default());
        }
    }

    /// Opens a GLOBAL block if the statement is not inside a step.
    pub(crate) fn ensure_section(&mut self, stmt: &Statement) {
        if self.current_section().is_none() {
            let id = self.open_block(BlockKind::Global, SmolStr::default(), stmt.start());
            self.tree.block_mut(id).header_end = stmt.end();
        }
    }

    fn finish_header(&mut self, id: BlockId, stmt: &Statement) {
        self.tree.block_mut(id).header_end = stmt.end();
        self.extend_open_blocks(stmt.end());
        if let Some(frame) = self.frames.last_mut() {
            frame.continuation = Continuation::SectionBody;
        }
    }

    // =========================================================================
    // Steps
    // =========================================================================

    pub(crate) fn data_definition(&mut self, stmt: &mut Statement, i: usize) {
        self.close_open_section();
        stmt.set_kind(i, TokenKind::SectionKeyword);

        let name = dataset_name(stmt, i + 1);
        let id = self.open_block(BlockKind::Data, name.clone(), stmt.start_of(i));
        self.frames
            .push(ParserFrame::section(SectionState::Data, name, None));

        let mut j = i + 1;
        while j < stmt.len() {
            if stmt.is_separator(j, "/") {
                self.options(stmt, j + 1, OptionOwner::DataStepDefinition, false);
                break;
            }
            j = if stmt.is_name(j) {
                self.dataset_spec(stmt, j)
            } else {
                j + 1
            };
        }
        self.finish_header(id, stmt);
    }

    pub(crate) fn procedure_definition(&mut self, stmt: &mut Statement, i: usize) {
        self.close_open_section();
        stmt.set_kind(i, TokenKind::SectionKeyword);

        let name = if stmt.is_word(i + 1) {
            stmt.set_kind(i + 1, TokenKind::ProcName);
            SmolStr::new(stmt.upper(i + 1))
        } else {
            SmolStr::default()
        };
        let id = self.open_block(BlockKind::Procedure, name.clone(), stmt.start_of(i));
        self.frames.push(ParserFrame::section(
            SectionState::Procedure,
            name.clone(),
            Some(name.clone()),
        ));

        self.options(stmt, i + 2, OptionOwner::Procedure { procedure: &name }, false);
        self.finish_header(id, stmt);
    }

    /// `RUN;`, `RUN CANCEL;`, `QUIT;`
    pub(crate) fn step_end(&mut self, stmt: &mut Statement, i: usize) {
        let Some(section) = self.current_section().filter(|open| open.kind.is_step()) else {
            stmt.set_kind(i, TokenKind::SectionKeyword);
            self.ensure_section(stmt);
            self.extend_open_blocks(stmt.end());
            return;
        };

        let block = self.tree.block(section.id);
        if stmt.upper(i) == "RUN"
            && block.kind == BlockKind::Procedure
            && self.options.is_run_group(&block.name)
        {
            stmt.set_kind(i, TokenKind::Keyword);
            self.extend_open_blocks(stmt.end());
            return;
        }

        stmt.set_kind(i, TokenKind::SectionKeyword);
        if stmt.upper(i + 1) == "CANCEL" && stmt.is_word(i + 1) {
            stmt.set_kind(i + 1, TokenKind::Keyword);
        }
        self.extend_open_blocks(stmt.end());
        self.close_block(true, stmt.start());
    }

    // =========================================================================
    // Macro definitions
    // =========================================================================

    pub(crate) fn macro_definition(&mut self, stmt: &mut Statement, i: usize) {
        self.close_open_section();

        let name = if stmt.is_word(i + 1) {
            SmolStr::new(stmt.upper(i + 1))
        } else {
            SmolStr::default()
        };
        let id = self.open_block(BlockKind::Macro, name.clone(), stmt.start_of(i));
        self.containers.push(id);
        self.frames
            .push(ParserFrame::section(SectionState::Macro, name, None));

        let mut j = i + 2;
        while j < stmt.len() {
            if stmt.is_separator(j, "(") {
                j = stmt.matching_close(j) + 1;
                continue;
            }
            if stmt.is_separator(j, "/") {
                self.options(stmt, j + 1, OptionOwner::MacroDefinition, false);
                break;
            }
            j += 1;
        }
        self.finish_header(id, stmt);
    }

    pub(crate) fn macro_end(&mut self, stmt: &Statement) {
        let Some(macro_id) = self.innermost_macro() else {
            self.ensure_section(stmt);
            self.extend_open_blocks(stmt.end());
            return;
        };

        while self.open.last().is_some_and(|open| open.id != macro_id) {
            self.close_block(false, Position::default());
        }
        while let Some(&id) = self.containers.last() {
            if id == macro_id {
                self.containers.pop();
                break;
            }
            self.containers.pop();
            let region = self.tree.block_mut(id);
            region.end = stmt.end();
            region.footer_start = stmt.end();
            region.explicitly_terminated = false;
        }
        self.extend_open_blocks(stmt.end());
        self.close_block(true, stmt.start());
    }

    // =========================================================================
    // Custom regions
    // =========================================================================

    /// Opens or closes a custom region if `token` is a region comment.
    pub(crate) fn region_comment(&mut self, token: &Token) {
        let text = token.text(self.model);
        let body = comment_body(&text);

        if strip_marker(body, &self.options.region_end_marker).is_some() {
            let Some(&id) = self.containers.last() else {
                return;
            };
            if self.tree.block(id).kind != BlockKind::Custom {
                return;
            }
            self.close_open_global();
            self.containers.pop();
            let step_open = self.current_section().is_some();
            let region = self.tree.block_mut(id);
            region.end = token.end;
            if step_open {
                self.pending_regions.push(PendingRegion {
                    id,
                    footer_start: token.start,
                });
                return;
            }
            region.footer_start = token.start;
            region.explicitly_terminated = true;
            trace!(start = %region.start, end = %region.end, "close region");
        } else if let Some(label) = strip_marker(body, &self.options.region_start_marker) {
            self.close_open_global();
            let step = self.current_section().map(|open| open.id);
            let start = step.map_or(token.start, |id| self.tree.block(id).start);
            let mut region = Block::new(BlockKind::Custom, label.trim(), start);
            region.end = token.end;
            region.header_end = token.end;
            let id = match step {
                Some(step) => self.tree.wrap(step, region),
                None => {
                    let parent = self.containers.last().copied();
                    self.tree.push(region, parent)
                }
            };
            self.containers.push(id);
            trace!(%start, "open region");
        }
    }
}

/// Name of the data set at token `i`: `WORK.A`, `A`, or empty.
fn dataset_name(stmt: &Statement, i: usize) -> SmolStr {
    if stmt.kind(i) == Some(TokenKind::Format) {
        return SmolStr::new(stmt.upper(i).trim_end_matches('.'));
    }
    if !stmt.is_name(i) {
        return SmolStr::default();
    }
    if stmt.is_separator(i + 1, ".") && stmt.is_name(i + 2) {
        return SmolStr::new(format!("{}.{}", stmt.upper(i), stmt.upper(i + 2)));
    }
    SmolStr::new(stmt.upper(i))
}

/// Text of a comment without its delimiters.
fn comment_body(text: &str) -> &str {
    let body = text
        .strip_prefix("/*")
        .map(|rest| rest.strip_suffix("*/").unwrap_or(rest))
        .or_else(|| {
            text.strip_prefix("%*")
                .or_else(|| text.strip_prefix('*'))
                .map(|rest| rest.strip_suffix(';').unwrap_or(rest))
        })
        .unwrap_or(text);
    body.trim()
}

/// If `body` starts with `marker` (ASCII case insensitive) as a whole word,
/// returns the text after it.
fn strip_marker<'a>(body: &'a str, marker: &str) -> Option<&'a str> {
    let head = body.get(..marker.len())?;
    if !head.eq_ignore_ascii_case(marker) {
        return None;
    }
    let rest = &body[marker.len()..];
    if rest.chars().next().is_some_and(is_name_char) {
        return None;
    }
    Some(rest)
}
