//! Cursor location inside a statement AST.
//!
//! The cursor at a token's start is before the token, so the left context
//! wins; a zero-width placeholder owns its position. Touching the `)` of a
//! closed list puts the cursor after the list, in the enclosing context.

use sas_syntax::Position;
use smol_str::SmolStr;

use super::ast::{Leaf, Node, StatementAst};

/// One level entered on the way down to the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step<'a> {
    /// The target of `name=value`.
    Target { name: Option<&'a SmolStr> },
    /// The value of `name=value`.
    Value { option: SmolStr },
    /// A bracketed list, with the name it is attached to.
    Args { callee: Option<&'a Leaf>, bracket: char },
    /// An operand of an operator.
    Operand,
}

/// What the cursor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Terminal<'a> {
    /// A token other than punctuation. `call` is set for the name of a call.
    Word { leaf: &'a Leaf, call: bool },
    /// Between tokens, on punctuation or on a placeholder.
    Gap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Location<'a> {
    /// Index of the top-level item the cursor is on, or the index a new
    /// item would get.
    pub(crate) index: usize,
    /// A top-level `/` precedes the cursor.
    pub(crate) after_delimiter: bool,
    pub(crate) steps: Vec<Step<'a>>,
    pub(crate) terminal: Terminal<'a>,
}

impl Location<'_> {
    /// The cursor is on a top-level item or in a top-level gap.
    pub(crate) fn is_top(&self) -> bool {
        self.steps.is_empty()
    }
}

pub(crate) fn locate(ast: &StatementAst, pos: Position) -> Location<'_> {
    let after_delimiter = ast
        .items
        .iter()
        .any(|item| item.as_leaf().is_some_and(|leaf| leaf.is_separator("/") && leaf.end <= pos));
    let mut steps = Vec::new();
    let covering = ast.items.iter().rposition(|item| item.covers(pos));
    let (index, terminal) = match covering {
        Some(index) => match descend(&ast.items[index], pos, &mut steps) {
            Some(terminal) => (index, terminal),
            None => {
                steps.clear();
                (index + 1, Terminal::Gap)
            }
        },
        None => (
            ast.items.iter().filter(|item| item.start() < pos).count(),
            Terminal::Gap,
        ),
    };
    Location {
        index,
        after_delimiter,
        steps,
        terminal,
    }
}

/// Walks down from a node covering `pos`. `None` means the cursor is just
/// past the node.
fn descend<'a>(node: &'a Node, pos: Position, steps: &mut Vec<Step<'a>>) -> Option<Terminal<'a>> {
    match node {
        Node::Leaf(leaf) => Some(leaf_terminal(leaf, false)),
        Node::Missing { .. } => Some(Terminal::Gap),
        Node::Unary { op, operand } => {
            if operand.covers(pos) {
                steps.push(Step::Operand);
                descend_or_gap(operand, pos, steps)
            } else {
                Some(leaf_terminal(op, false))
            }
        }
        Node::Binary { op, lhs, rhs } => {
            if rhs.covers(pos) {
                steps.push(Step::Operand);
                descend_or_gap(rhs, pos, steps)
            } else if lhs.covers(pos) {
                steps.push(Step::Operand);
                descend_or_gap(lhs, pos, steps)
            } else {
                Some(leaf_terminal(op, false))
            }
        }
        Node::ArgList { .. } => list(node, None, pos, steps),
        Node::Call { name, args } => {
            if pos <= name.end {
                Some(leaf_terminal(name, true))
            } else {
                list(args, Some(name), pos, steps)
            }
        }
        Node::Assign { target, value, .. } => {
            if pos <= target.end() {
                steps.push(Step::Target {
                    name: target.head_name(),
                });
                descend_or_gap(target, pos, steps)
            } else {
                steps.push(Step::Value {
                    option: target.head_name().cloned().unwrap_or_default(),
                });
                if value.covers(pos) {
                    descend(value, pos, steps)
                } else {
                    Some(Terminal::Gap)
                }
            }
        }
    }
}

/// Descends into a child; past the child's end the cursor is in a gap of
/// the current level.
fn descend_or_gap<'a>(
    node: &'a Node,
    pos: Position,
    steps: &mut Vec<Step<'a>>,
) -> Option<Terminal<'a>> {
    let depth = steps.len();
    match descend(node, pos, steps) {
        Some(terminal) => Some(terminal),
        None => {
            steps.truncate(depth);
            Some(Terminal::Gap)
        }
    }
}

fn list<'a>(
    node: &'a Node,
    callee: Option<&'a Leaf>,
    pos: Position,
    steps: &mut Vec<Step<'a>>,
) -> Option<Terminal<'a>> {
    let Node::ArgList { open, items, close } = node else {
        return descend(node, pos, steps);
    };
    if close.as_ref().is_some_and(|close| close.start < pos) {
        return None;
    }
    steps.push(Step::Args {
        callee,
        bracket: open.bracket().unwrap_or('('),
    });
    match items.iter().rev().find(|item| item.covers(pos)) {
        Some(item) => descend_or_gap(item, pos, steps),
        None => Some(Terminal::Gap),
    }
}

fn leaf_terminal(leaf: &Leaf, call: bool) -> Terminal<'_> {
    if leaf.kind == sas_syntax::TokenKind::Separator {
        Terminal::Gap
    } else {
        Terminal::Word { leaf, call }
    }
}

#[cfg(test)]
mod tests {
    use super::super::ast::{parse_statement, Shape};
    use super::*;
    use sas_syntax::{lex, TextModel};

    fn located(source: &str, shape: Shape, column: u32) -> String {
        let model = TextModel::new(source);
        let leaves: Vec<Leaf> = lex(&model)
            .iter()
            .filter(|token| !token.kind.is_trivia())
            .map(|token| Leaf::from_token(token, &model))
            .collect();
        let ast = parse_statement(&leaves, shape, model.end());
        let location = locate(&ast, Position::new(0, column));
        let steps: Vec<String> = location
            .steps
            .iter()
            .map(|step| match step {
                Step::Target { .. } => "target".to_string(),
                Step::Value { option } => format!("value {option}"),
                Step::Args { callee, bracket } => format!(
                    "args {}{bracket}",
                    callee.map_or("", |callee| callee.text.as_str())
                ),
                Step::Operand => "operand".to_string(),
            })
            .collect();
        let terminal = match location.terminal {
            Terminal::Word { leaf, call: true } => format!("call {}", leaf.text),
            Terminal::Word { leaf, call: false } => format!("word {}", leaf.text),
            Terminal::Gap => "gap".to_string(),
        };
        format!(
            "{}{} [{}] {terminal}",
            location.index,
            if location.after_delimiter { "/" } else { "" },
            steps.join(", ")
        )
    }

    #[test]
    fn word_start_belongs_to_the_left() {
        let source = "proc print data=a";
        assert_eq!(located(source, Shape::Options, 4), "0 [] word PROC");
        assert_eq!(located(source, Shape::Options, 5), "1 [] gap");
        assert_eq!(located(source, Shape::Options, 7), "1 [] word PRINT");
        assert_eq!(located(source, Shape::Options, 11), "2 [] gap");
        assert_eq!(located(source, Shape::Options, 13), "2 [target] word DATA");
        assert_eq!(located(source, Shape::Options, 16), "2 [value DATA] gap");
        assert_eq!(located(source, Shape::Options, 17), "2 [value DATA] word A");
    }

    #[test]
    fn empty_value_is_a_placeholder() {
        assert_eq!(
            located("proc print data=", Shape::Options, 16),
            "2 [value DATA] gap"
        );
        assert_eq!(
            located("proc print data= noobs", Shape::Options, 17),
            "2 [value DATA] gap"
        );
    }

    #[test]
    fn closing_bracket_moves_out_of_the_list() {
        let source = "%macro foo(x,y) /";
        assert_eq!(located(source, Shape::Options, 12), "1 [args FOO(] word X");
        assert_eq!(located(source, Shape::Options, 14), "1 [args FOO(] word Y");
        assert_eq!(located(source, Shape::Options, 15), "2 [] gap");
        assert_eq!(located(source, Shape::Options, 17), "2/ [] gap");
    }

    #[test]
    fn nested_lists() {
        let source = "data=work.a(keep=x) style={color=red}";
        assert_eq!(located(source, Shape::Options, 11), "0 [value DATA] call WORK.A");
        assert_eq!(
            located(source, Shape::Options, 18),
            "0 [value DATA, args WORK.A(, value KEEP] word X"
        );
        assert_eq!(
            located(source, Shape::Options, 33),
            "1 [value STYLE, args {, value COLOR] gap"
        );
    }

    #[test]
    fn expression_operands() {
        let source = "if x > substr(y, 1)";
        assert_eq!(
            located(source, Shape::Expression { head: 1 }, 4),
            "1 [operand] word X"
        );
        assert_eq!(
            located(source, Shape::Expression { head: 1 }, 13),
            "1 [operand] call SUBSTR"
        );
        assert_eq!(
            located(source, Shape::Expression { head: 1 }, 15),
            "1 [operand, args SUBSTR(] word Y"
        );
    }
}
