//! Syntax tree
//!
//! Nodes live in an [`Arena`] owned by the [`Ast`] and refer to each other by
//! [`NodeId`]. The whole tree is released at once when the `Ast` is dropped.

use std::fmt;

use super::lexer::{SourcePos, TokenKind};
use crate::memory::{Arena, ArenaId, StrSlice, StringScratch};
use crate::runtime::Atom;
use crate::value::write_escaped;

/// Handle to a node in an [`Ast`]
pub type NodeId = ArenaId<Node>;

/// Precedence of member access and calls
pub const CALL_PRECEDENCE: u32 = 2;

/// Ceiling used for a full expression
pub const INITIAL_PRECEDENCE: u32 = 100;

/// Binary operators. Lower precedence numbers bind tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Member,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Dot => Some(BinaryOp::Member),
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            _ => None,
        }
    }

    pub fn precedence(self) -> u32 {
        match self {
            BinaryOp::Member => CALL_PRECEDENCE,
            BinaryOp::Mul | BinaryOp::Div => 5,
            BinaryOp::Add | BinaryOp::Sub => 6,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Member => ".",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// String literal, stored in the lexer's scratch region
    Str(StrSlice),
    /// Identifier
    Atom(Atom),
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
    },
}

/// A syntax tree node
///
/// `pos` is where the token that introduced the node starts: the literal or
/// identifier itself, the operator of a binary node, the `(` of a call.
/// `depth` is the height of the subtree rooted here; a leaf has depth 1.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub pos: SourcePos,
    pub depth: u32,
}

/// Arena of syntax tree nodes
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Arena<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    /// Number of nodes allocated, including any abandoned by backtracking
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn new_str(&mut self, slice: StrSlice, pos: SourcePos) -> NodeId {
        self.nodes.alloc(Node {
            kind: NodeKind::Str(slice),
            pos,
            depth: 1,
        })
    }

    pub fn new_atom(&mut self, atom: Atom, pos: SourcePos) -> NodeId {
        self.nodes.alloc(Node {
            kind: NodeKind::Atom(atom),
            pos,
            depth: 1,
        })
    }

    pub fn new_binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId, pos: SourcePos) -> NodeId {
        let depth = 1 + self[lhs].depth.max(self[rhs].depth);
        self.nodes.alloc(Node {
            kind: NodeKind::Binary { op, lhs, rhs },
            pos,
            depth,
        })
    }

    pub fn new_call(&mut self, callee: NodeId, args: Vec<NodeId>, pos: SourcePos) -> NodeId {
        let depth = args
            .iter()
            .chain(std::iter::once(&callee))
            .map(|&child| self[child].depth)
            .max()
            .unwrap_or(0)
            + 1;
        self.nodes.alloc(Node {
            kind: NodeKind::Call { callee, args },
            pos,
            depth,
        })
    }

    /// Render a node: binary nodes fully parenthesized, calls as
    /// `callee(arg, ...)`, strings quoted
    pub fn display<'a>(&'a self, node: NodeId, scratch: &'a StringScratch) -> AstDisplay<'a> {
        AstDisplay {
            ast: self,
            scratch,
            node,
        }
    }
}

impl std::ops::Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.get(id)
    }
}

pub struct AstDisplay<'a> {
    ast: &'a Ast,
    scratch: &'a StringScratch,
    node: NodeId,
}

impl AstDisplay<'_> {
    fn child(&self, node: NodeId) -> Self {
        AstDisplay {
            ast: self.ast,
            scratch: self.scratch,
            node,
        }
    }
}

impl fmt::Display for AstDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ast[self.node].kind {
            NodeKind::Str(slice) => {
                f.write_str("\"")?;
                write_escaped(f, self.scratch.get(*slice))?;
                f.write_str("\"")
            }
            NodeKind::Atom(atom) => write!(f, "{atom}"),
            NodeKind::Binary {
                op: BinaryOp::Member,
                lhs,
                rhs,
            } => write!(f, "({}.{})", self.child(*lhs), self.child(*rhs)),
            NodeKind::Binary { op, lhs, rhs } => {
                write!(f, "({} {op} {})", self.child(*lhs), self.child(*rhs))
            }
            NodeKind::Call { callee, args } => {
                write!(f, "{}(", self.child(*callee))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", self.child(*arg))?;
                }
                f.write_str(")")
            }
        }
    }
}
