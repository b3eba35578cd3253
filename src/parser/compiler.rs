//! Bytecode compiler
//!
//! Walks the syntax tree and emits a flat [`Program`].

use tracing::debug;

use super::ast::{Ast, BinaryOp, NodeId, NodeKind};
use super::lexer::SourcePos;
use crate::memory::StringScratch;
use crate::runtime::Atom;
use crate::vm::{Instruction, Program};

/// Compilation error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("{pos}: unsupported operator '{op}'")]
    UnsupportedOperator { op: BinaryOp, pos: SourcePos },
    #[error("internal compiler error: {0}")]
    Internal(String),
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Compiler state
pub struct Compiler<'a> {
    ast: &'a Ast,
    scratch: &'a StringScratch,
    code: Vec<Instruction>,
    statements: Vec<usize>,
}

impl<'a> Compiler<'a> {
    /// Create a compiler over a parsed tree and the scratch region its
    /// string literals live in
    pub fn new(ast: &'a Ast, scratch: &'a StringScratch) -> Self {
        Compiler {
            ast,
            scratch,
            code: Vec::new(),
            statements: Vec::new(),
        }
    }

    /// Compile every statement and return the program
    pub fn compile_program(mut self, statements: &[NodeId]) -> CompileResult<Program> {
        for &statement in statements {
            self.statements.push(self.code.len());
            self.compile(statement)?;
        }
        debug!(
            statements = statements.len(),
            instructions = self.code.len(),
            "compiled program"
        );
        Ok(self.finish())
    }

    /// Append the instructions for one expression
    pub fn compile(&mut self, node: NodeId) -> CompileResult<()> {
        let ast = self.ast;
        let node = &ast[node];
        match &node.kind {
            NodeKind::Atom(atom) => self.emit(Instruction::LoadGlobal(atom.clone())),
            NodeKind::Str(slice) => {
                let bytes: Box<[u8]> = self.scratch.get(*slice).into();
                self.emit(Instruction::PushString(bytes));
            }
            NodeKind::Binary {
                op: BinaryOp::Member,
                lhs,
                rhs,
            } => {
                self.compile(*lhs)?;
                let name = self.member_name(*rhs)?;
                self.emit(Instruction::LoadMember(name));
            }
            NodeKind::Binary { op, .. } => {
                return Err(CompileError::UnsupportedOperator {
                    op: *op,
                    pos: node.pos,
                });
            }
            NodeKind::Call { callee, args } => {
                match &ast[*callee].kind {
                    NodeKind::Binary {
                        op: BinaryOp::Member,
                        lhs,
                        rhs,
                    } => {
                        // The object is both receiver and member source
                        self.compile(*lhs)?;
                        self.emit(Instruction::Dup);
                        let name = self.member_name(*rhs)?;
                        self.emit(Instruction::LoadMember(name));
                    }
                    _ => {
                        self.emit(Instruction::LoadThis);
                        self.compile(*callee)?;
                    }
                }
                // First argument ends up on top
                for &arg in args.iter().rev() {
                    self.compile(arg)?;
                }
                self.emit(Instruction::Call { argc: args.len() });
            }
        }
        Ok(())
    }

    /// Take the emitted instructions
    pub fn finish(self) -> Program {
        Program {
            instructions: self.code,
            statements: self.statements,
        }
    }

    fn member_name(&self, node: NodeId) -> CompileResult<Atom> {
        match &self.ast[node].kind {
            NodeKind::Atom(atom) => Ok(atom.clone()),
            other => Err(CompileError::Internal(format!(
                "member name must be an identifier, found {other:?}"
            ))),
        }
    }

    fn emit(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }
}
