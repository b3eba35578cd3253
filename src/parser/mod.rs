//! JavaScript parser and compiler
//!
//! Source bytes go through the lexer, the expression parser builds an
//! arena-allocated syntax tree, and the compiler lowers the tree to bytecode.

pub mod ast;
pub mod compiler;
pub mod grammar;
pub mod lexer;

// Re-exports
pub use ast::{Ast, BinaryOp, Node, NodeId, NodeKind};
pub use compiler::{CompileError, CompileResult, Compiler};
pub use grammar::{ParseError, ParseErrorKind, ParseResult, Parser, SyntaxErrors};
pub use lexer::{LexError, Lexer, LexerSnapshot, SourcePos, Token, TokenKind};
