//! Bytecode instruction definitions
//!
//! The bytecode is stack-based and straight-line: there are no jumps, so a
//! program is executed exactly once from the first instruction to the last.
//!
//! | instruction    | stack effect                             |
//! |----------------|------------------------------------------|
//! | `load_global`  | `-> value`                               |
//! | `load_member`  | `obj -> value`                           |
//! | `push_str`     | `-> string`                              |
//! | `call n`       | `this func arg(n-1) .. arg0 -> (result)` |
//! | `dup`          | `a -> a a`                               |
//! | `load_this`    | `-> undefined`                           |

use std::fmt;

use crate::runtime::Atom;
use crate::value::write_escaped;

/// One VM operation
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Push the global bound to the atom, or undefined
    LoadGlobal(Atom),
    /// Pop an object and push its property
    LoadMember(Atom),
    /// Push a fresh string with these bytes
    PushString(Box<[u8]>),
    /// Call with this many arguments
    Call { argc: usize },
    /// Duplicate the top of the stack
    Dup,
    /// Push the receiver placeholder for a plain call
    LoadThis,
}

impl Instruction {
    /// Mnemonic used in listings
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::LoadGlobal(_) => "load_global",
            Instruction::LoadMember(_) => "load_member",
            Instruction::PushString(_) => "push_str",
            Instruction::Call { .. } => "call",
            Instruction::Dup => "dup",
            Instruction::LoadThis => "load_this",
        }
    }

    /// Net change in stack depth, for instructions where it is fixed
    ///
    /// `call` depends on what the callee pushes, so it reports None.
    pub fn stack_effect(&self) -> Option<isize> {
        match self {
            Instruction::LoadGlobal(_)
            | Instruction::PushString(_)
            | Instruction::Dup
            | Instruction::LoadThis => Some(1),
            Instruction::LoadMember(_) => Some(0),
            Instruction::Call { .. } => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::LoadGlobal(atom) | Instruction::LoadMember(atom) => {
                write!(f, "{} {}", self.name(), atom)
            }
            Instruction::PushString(bytes) => {
                write!(f, "{} \"", self.name())?;
                write_escaped(f, bytes)?;
                f.write_str("\"")
            }
            Instruction::Call { argc } => write!(f, "{} {}", self.name(), argc),
            Instruction::Dup | Instruction::LoadThis => f.write_str(self.name()),
        }
    }
}

/// A compiled program: the instructions in execution order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    /// Index of the first instruction of each statement, ascending
    ///
    /// The interpreter discards a statement's leftover values when the next
    /// statement starts.
    pub statements: Vec<usize>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    /// Whether an instruction begins a statement
    pub fn starts_statement(&self, pc: usize) -> bool {
        self.statements.binary_search(&pc).is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Program {
            instructions,
            statements: Vec::new(),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, inst) in self.instructions.iter().enumerate() {
            writeln!(f, "{pc:04}: {inst}")?;
        }
        Ok(())
    }
}
