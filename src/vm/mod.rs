//! Virtual machine module
//!
//! The VM executes straight-line bytecode using a stack-based architecture.

pub mod interpreter;
pub mod opcode;
pub mod stack;

pub use interpreter::{Interpreter, InterpreterError, InterpreterResult};
pub use opcode::{Instruction, Program};
pub use stack::Stack;
