//! Block names and the document outline.

use sas_syntax::{Block, BlockId, BlockKind, BlockTree, Range};
use serde::Serialize;

/// Display name of a block: `PROC PRINT`, `DATA WORK.A`, `%MACRO FOO`, the
/// region label or `GLOBAL`.
#[must_use]
pub fn symbol_name(block: &Block) -> String {
    match block.kind {
        BlockKind::Procedure => with_name("PROC", &block.name),
        BlockKind::Data => with_name("DATA", &block.name),
        BlockKind::Macro => with_name("%MACRO", &block.name),
        BlockKind::Global => "GLOBAL".to_string(),
        BlockKind::Custom if block.name.is_empty() => "REGION".to_string(),
        BlockKind::Custom => block.name.to_string(),
    }
}

fn with_name(keyword: &str, name: &str) -> String {
    if name.is_empty() {
        keyword.to_string()
    } else {
        format!("{keyword} {name}")
    }
}

/// One entry of the document outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSymbol {
    /// Display name.
    pub name: String,
    /// Block kind.
    pub kind: BlockKind,
    /// Full range of the block.
    pub range: Range,
    /// Range of the opening statement.
    pub selection_range: Range,
    /// Last line of the folding range.
    pub fold_end: u32,
    /// Nested symbols.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentSymbol>,
}

/// Builds the outline of a block tree.
#[must_use]
pub fn document_symbols(tree: &BlockTree) -> Vec<DocumentSymbol> {
    tree.roots().iter().map(|&id| symbol(tree, id)).collect()
}

fn symbol(tree: &BlockTree, id: BlockId) -> DocumentSymbol {
    let block = tree.block(id);
    DocumentSymbol {
        name: symbol_name(block),
        kind: block.kind,
        range: block.range(),
        selection_range: block.header(),
        fold_end: block.fold_end,
        children: block.children.iter().map(|&child| symbol(tree, child)).collect(),
    }
}
