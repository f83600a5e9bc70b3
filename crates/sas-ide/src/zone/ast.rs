//! Statement AST for cursor classification.
//!
//! The classifier re-scans one statement and parses it into a small tagged
//! tree. The grammar is shallow: option lists are flat sequences of words,
//! `name=value` assignments, calls and bracketed lists; expressions add
//! unary and binary operators. Missing operands and values are represented
//! by [`Node::Missing`] placeholders spanning the gap where they would be,
//! so a cursor in that gap lands on them.

use sas_syntax::{Position, TextModel, Token, TokenKind};
use smol_str::SmolStr;

/// A token of the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Leaf {
    pub(crate) kind: TokenKind,
    pub(crate) start: Position,
    pub(crate) end: Position,
    /// Upper-cased text.
    pub(crate) text: SmolStr,
}

impl Leaf {
    pub(crate) fn from_token(token: &Token, model: &TextModel) -> Self {
        Self {
            kind: token.kind,
            start: token.start,
            end: token.end,
            text: SmolStr::new(token.text(model).to_ascii_uppercase()),
        }
    }

    /// Words, formats and macro references: things a name can be made of.
    pub(crate) fn is_name(&self) -> bool {
        self.kind.is_word() || matches!(self.kind, TokenKind::Format | TokenKind::MacroRef)
    }

    pub(crate) fn is_separator(&self, text: &str) -> bool {
        self.kind == TokenKind::Separator && self.text == text
    }

    fn is_open(&self) -> bool {
        self.is_separator("(") || self.is_separator("[") || self.is_separator("{")
    }

    fn is_close(&self) -> bool {
        self.is_separator(")") || self.is_separator("]") || self.is_separator("}")
    }

    /// The opening bracket character, if this is one.
    pub(crate) fn bracket(&self) -> Option<char> {
        self.is_open().then(|| self.text.chars().next()).flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Leaf(Leaf),
    /// Placeholder for an absent operand or value.
    Missing { start: Position, end: Position },
    Unary { op: Leaf, operand: Box<Node> },
    Binary { op: Leaf, lhs: Box<Node>, rhs: Box<Node> },
    ArgList { open: Leaf, items: Vec<Node>, close: Option<Leaf> },
    Assign { target: Box<Node>, eq: Leaf, value: Box<Node> },
    Call { name: Leaf, args: Box<Node> },
}

impl Node {
    pub(crate) fn start(&self) -> Position {
        match self {
            Node::Leaf(leaf) => leaf.start,
            Node::Missing { start, .. } => *start,
            Node::Unary { op, .. } => op.start,
            Node::Binary { lhs, .. } => lhs.start(),
            Node::ArgList { open, .. } => open.start,
            Node::Assign { target, .. } => target.start(),
            Node::Call { name, .. } => name.start,
        }
    }

    pub(crate) fn end(&self) -> Position {
        match self {
            Node::Leaf(leaf) => leaf.end,
            Node::Missing { end, .. } => *end,
            Node::Unary { operand, .. } => operand.end(),
            Node::Binary { rhs, .. } => rhs.end(),
            Node::ArgList { open, items, close } => close
                .as_ref()
                .map(|close| close.end)
                .or_else(|| items.last().map(Node::end))
                .unwrap_or(open.end),
            Node::Assign { value, .. } => value.end(),
            Node::Call { args, .. } => args.end(),
        }
    }

    /// Whether the cursor at `pos` belongs to this node.
    ///
    /// The cursor at a node's start is before the node; the one at its end
    /// is on it. A zero-width node owns exactly its position.
    pub(crate) fn covers(&self, pos: Position) -> bool {
        let (start, end) = (self.start(), self.end());
        if start == end {
            pos == start
        } else {
            start < pos && pos <= end
        }
    }

    pub(crate) fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Name of an assignment target or call: `DATA` in `data=`, `STYLE` in
    /// `style(header)=`.
    pub(crate) fn head_name(&self) -> Option<&SmolStr> {
        match self {
            Node::Leaf(leaf) if leaf.is_name() => Some(&leaf.text),
            Node::Call { name, .. } => Some(&name.text),
            _ => None,
        }
    }
}

/// How the items after the statement keyword are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// Flat option list.
    Options,
    /// `IF`, `WHERE`, `DO`: `head` keyword words, then an expression.
    Expression { head: usize },
    /// `target = expression`.
    Assignment,
}

/// A parsed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatementAst {
    pub(crate) items: Vec<Node>,
    /// End of the statement: the start of its `;`, or the end of its last
    /// token.
    pub(crate) end: Position,
}

pub(crate) fn parse_statement(leaves: &[Leaf], shape: Shape, end: Position) -> StatementAst {
    let mut parser = AstParser {
        leaves,
        at: 0,
        end,
        last_end: leaves.first().map_or(end, |leaf| leaf.start),
    };
    let mut items = Vec::new();
    match shape {
        Shape::Options => {}
        Shape::Expression { head } => {
            for _ in 0..head {
                if let Some(leaf) = parser.bump() {
                    items.push(Node::Leaf(leaf));
                }
            }
            items.push(parser.expression(0));
        }
        Shape::Assignment => {
            if let Some(target) = parser.name_or_call(false) {
                match parser.peek() {
                    Some(eq) if eq.is_separator("=") => {
                        let eq = eq.clone();
                        parser.bump();
                        let value = parser.expression(0);
                        items.push(Node::Assign {
                            target: Box::new(target),
                            eq,
                            value: Box::new(value),
                        });
                    }
                    _ => items.push(target),
                }
            }
        }
    }
    while let Some(item) = parser.option_item() {
        items.push(item);
    }
    StatementAst { items, end }
}

struct AstParser<'a> {
    leaves: &'a [Leaf],
    at: usize,
    end: Position,
    last_end: Position,
}

/// Binary operators by precedence level, lowest first.
const BINARY_LEVELS: &[&[&str]] = &[
    &["TO", "BY", "WHILE", "UNTIL"],
    &["OR", "|", "!"],
    &["AND", "&"],
    &[
        "=", "^=", "~=", "¬=", "<", ">", "<=", ">=", "<>", "><", "=:", "EQ", "NE", "LT", "GT", "LE",
        "GE", "IN", "BETWEEN", "LIKE", "CONTAINS", "IS",
    ],
    &["||", "!!"],
    &["+", "-"],
    &["*", "/"],
    &["**"],
];

const UNARY_OPERATORS: &[&str] = &["NOT", "-", "+", "^", "~", "¬"];

/// Words that end an expression.
const EXPRESSION_STOPS: &[&str] = &["THEN", "ELSE"];

impl AstParser<'_> {
    fn peek(&self) -> Option<&Leaf> {
        self.leaves.get(self.at)
    }

    fn peek_nth(&self, n: usize) -> Option<&Leaf> {
        self.leaves.get(self.at + n)
    }

    fn bump(&mut self) -> Option<Leaf> {
        let leaf = self.leaves.get(self.at)?.clone();
        self.at += 1;
        self.last_end = leaf.end;
        Some(leaf)
    }

    fn next_start(&self) -> Position {
        self.peek().map_or(self.end, |leaf| leaf.start)
    }

    fn missing(&self) -> Node {
        Node::Missing {
            start: self.last_end,
            end: self.next_start().max(self.last_end),
        }
    }

    /// A name, merging adjacent dotted parts: `work.a`, `tagsets.excelxp`.
    fn name(&mut self) -> Option<Leaf> {
        let mut leaf = self.bump()?;
        if !leaf.is_name() {
            return Some(leaf);
        }
        loop {
            let dotted = leaf.text.ends_with('.');
            let merges = match self.peek() {
                Some(next) if next.start != leaf.end => false,
                Some(next) if dotted => next.is_name(),
                Some(next) => next.is_separator("."),
                None => false,
            };
            if !merges {
                return Some(leaf);
            }
            let next = self.bump()?;
            leaf = Leaf {
                kind: TokenKind::Text,
                start: leaf.start,
                end: next.end,
                text: SmolStr::new(format!("{}{}", leaf.text, next.text)),
            };
        }
    }

    /// A name or macro function, optionally followed by a parenthesized
    /// argument list.
    fn name_or_call(&mut self, expression_args: bool) -> Option<Node> {
        let name = self.name()?;
        let callable = name.is_name() || name.kind == TokenKind::MacroKeyword;
        if callable && self.peek().is_some_and(|next| next.is_separator("(")) {
            let open = self.bump()?;
            let args = self.arg_list(open, expression_args);
            return Some(Node::Call {
                name,
                args: Box::new(args),
            });
        }
        Some(Node::Leaf(name))
    }

    /// Items up to the bracket matching `open`.
    fn arg_list(&mut self, open: Leaf, expression: bool) -> Node {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return Node::ArgList {
                        open,
                        items,
                        close: None,
                    }
                }
                Some(leaf) if leaf.is_close() => {
                    let close = self.bump();
                    return Node::ArgList { open, items, close };
                }
                Some(leaf) if expression && leaf.is_separator(",") => {
                    if let Some(comma) = self.bump() {
                        items.push(Node::Leaf(comma));
                    }
                }
                Some(_) if expression => {
                    let before = self.at;
                    let item = self.expression(0);
                    if self.at == before {
                        if let Some(leaf) = self.bump() {
                            items.push(Node::Leaf(leaf));
                        }
                    } else {
                        items.push(item);
                    }
                }
                Some(_) => match self.option_item() {
                    Some(item) => items.push(item),
                    None => {
                        return Node::ArgList {
                            open,
                            items,
                            close: None,
                        }
                    }
                },
            }
        }
    }

    // =========================================================================
    // Option lists
    // =========================================================================

    fn option_item(&mut self) -> Option<Node> {
        let first = self.peek()?;
        if first.is_open() {
            let open = self.bump()?;
            return Some(self.arg_list(open, false));
        }
        let target = self.name_or_call(false)?;
        let is_target = matches!(&target, Node::Call { .. })
            || target.as_leaf().is_some_and(Leaf::is_name);
        if !is_target || !self.peek().is_some_and(|next| next.is_separator("=")) {
            return Some(target);
        }
        let eq = self.bump()?;
        let option = target.head_name().cloned().unwrap_or_default();
        let value = self.option_value(&option);
        Some(Node::Assign {
            target: Box::new(target),
            eq,
            value: Box::new(value),
        })
    }

    fn option_value(&mut self, option: &str) -> Node {
        match self.peek() {
            Some(leaf) if leaf.is_open() => match self.bump() {
                Some(open) => self.arg_list(open, option == "WHERE"),
                None => self.missing(),
            },
            Some(leaf) if leaf.kind == TokenKind::Separator && !is_sign(leaf) => self.missing(),
            Some(_) => self.name_or_call(false).unwrap_or_else(|| self.missing()),
            None => self.missing(),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn at_expression_stop(&self) -> bool {
        match self.peek() {
            None => true,
            Some(leaf) => {
                leaf.is_close()
                    || leaf.is_separator(",")
                    || (leaf.kind.is_word() && EXPRESSION_STOPS.contains(&leaf.text.as_str()))
            }
        }
    }

    fn binary_level(&self) -> Option<usize> {
        let leaf = self.peek()?;
        if !(leaf.kind == TokenKind::Separator || leaf.kind.is_word()) {
            return None;
        }
        BINARY_LEVELS
            .iter()
            .position(|level| level.contains(&leaf.text.as_str()))
    }

    fn expression(&mut self, min_level: usize) -> Node {
        let mut lhs = self.unary();
        while let Some(level) = self.binary_level().filter(|&level| level >= min_level) {
            let Some(op) = self.bump() else {
                break;
            };
            let rhs = if self.at_expression_stop() {
                self.missing()
            } else {
                self.expression(level + 1)
            };
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        lhs
    }

    fn unary(&mut self) -> Node {
        if self.at_expression_stop() {
            return self.missing();
        }
        let is_unary = self.peek().is_some_and(|leaf| {
            (leaf.kind == TokenKind::Separator || leaf.kind.is_word())
                && UNARY_OPERATORS.contains(&leaf.text.as_str())
        });
        if is_unary {
            if let Some(op) = self.bump() {
                let operand = self.unary();
                return Node::Unary {
                    op,
                    operand: Box::new(operand),
                };
            }
        }
        self.primary()
    }

    fn primary(&mut self) -> Node {
        match self.peek() {
            Some(leaf) if leaf.is_open() => match self.bump() {
                Some(open) => self.arg_list(open, true),
                None => self.missing(),
            },
            Some(leaf) if leaf.kind == TokenKind::Separator => self.missing(),
            Some(_) => self.name_or_call(true).unwrap_or_else(|| self.missing()),
            None => self.missing(),
        }
    }
}

fn is_sign(leaf: &Leaf) -> bool {
    leaf.is_separator("-") || leaf.is_separator("+")
}
