//! Bytecode interpreter
//!
//! Executes a [`Program`] against a globals object using a stack-based
//! virtual machine. Programs are straight-line, so the only state is the
//! operand stack and the object graph reachable from the globals.

use std::io::Write;

use tracing::{debug, trace, warn};

use crate::runtime::{NativeCall, ObjectAllocError, ObjectRef};
use crate::value::Value;
use crate::vm::opcode::{Instruction, Program};
use crate::vm::stack::Stack;

/// Interpreter error
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    /// Stack underflow
    #[error("stack underflow")]
    StackUnderflow,
    /// Stack overflow
    #[error("stack overflow")]
    StackOverflow,
    /// Type error
    #[error("TypeError: {0}")]
    TypeError(String),
    /// Object storage could not grow
    #[error(transparent)]
    OutOfMemory(#[from] ObjectAllocError),
    /// Writing program output failed
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
    /// Internal error
    #[error("InternalError: {0}")]
    InternalError(String),
}

impl InterpreterError {
    /// Check if this is a runtime type error
    pub fn is_type_error(&self) -> bool {
        matches!(self, InterpreterError::TypeError(_))
    }
}

/// Result type for interpreter operations
pub type InterpreterResult<T> = Result<T, InterpreterError>;

/// Interpreter state
pub struct Interpreter {
    /// Value stack
    stack: Stack,
}

impl Interpreter {
    /// Default stack capacity
    pub const DEFAULT_STACK_SIZE: usize = 1024;

    /// Create a new interpreter
    pub fn new() -> Self {
        Self::with_config(Self::DEFAULT_STACK_SIZE)
    }

    /// Create an interpreter with custom settings
    pub fn with_config(stack_size: usize) -> Self {
        Interpreter {
            stack: Stack::new(stack_size),
        }
    }

    /// The operand stack
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Discard everything left on the operand stack
    pub fn reset(&mut self) {
        self.stack.clear();
    }

    /// Run every instruction of `program` in order
    ///
    /// Values left over by a statement are dropped when the next statement
    /// begins, so the stack limit bounds the depth of a single statement.
    /// Stops at the first failing instruction; values pushed before the
    /// failure stay on the stack.
    pub fn execute(
        &mut self,
        program: &Program,
        globals: &ObjectRef,
        output: &mut dyn Write,
    ) -> InterpreterResult<()> {
        debug!(
            instructions = program.len(),
            statements = program.statements.len(),
            "executing program"
        );
        let base = self.stack.len();
        let mut boundaries = program.statements.iter().peekable();
        for (pc, inst) in program.instructions.iter().enumerate() {
            if boundaries.next_if_eq(&&pc).is_some() {
                self.stack.truncate(base);
            }
            trace!(pc, depth = self.stack.len(), "{inst}");
            if let Err(err) = self.step(inst, globals, output) {
                debug!(pc, %inst, error = %err, "runtime error");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Execute a single instruction
    pub fn step(
        &mut self,
        inst: &Instruction,
        globals: &ObjectRef,
        output: &mut dyn Write,
    ) -> InterpreterResult<()> {
        match inst {
            Instruction::PushString(bytes) => self.stack.push(Value::string(bytes)),

            Instruction::LoadGlobal(atom) => {
                let value = globals.borrow().get(atom).cloned().unwrap_or_default();
                self.stack.push(value)
            }

            Instruction::LoadMember(atom) => {
                let target = self.stack.pop().ok_or(InterpreterError::StackUnderflow)?;
                let Value::Object(obj) = &target else {
                    return Err(InterpreterError::TypeError(format!(
                        "cannot read property '{}' of {}",
                        atom,
                        target.type_name()
                    )));
                };
                let member = obj.borrow().get(atom).cloned();
                let value = member.unwrap_or_else(|| {
                    warn!(member = %atom, object = %target, "failed to get member");
                    Value::undefined()
                });
                self.stack.push(value)
            }

            Instruction::Call { argc } => self.call(*argc, output),

            Instruction::Dup => self.stack.dup(),

            Instruction::LoadThis => self.stack.push(Value::undefined()),
        }
    }

    /// Invoke the callee sitting below `argc` arguments
    ///
    /// Stack on entry, bottom to top: `this func arg(argc-1) .. arg0`.
    fn call(&mut self, argc: usize, output: &mut dyn Write) -> InterpreterResult<()> {
        if self.stack.len() < argc + 2 {
            return Err(InterpreterError::StackUnderflow);
        }
        let callee = self
            .stack
            .remove_at(argc)
            .ok_or(InterpreterError::StackUnderflow)?;
        let this = self
            .stack
            .remove_at(argc)
            .ok_or(InterpreterError::StackUnderflow)?;

        let Some(func) = callee.as_function().cloned() else {
            return Err(InterpreterError::TypeError(format!(
                "{} is not a function",
                callee.type_name()
            )));
        };

        let mut call = NativeCall::new(this, callee, &mut self.stack, argc, output);
        func.call(&mut call)?;
        if call.remaining() != 0 {
            return Err(InterpreterError::InternalError(format!(
                "native function '{}' left {} of {} arguments on the stack",
                func.name(),
                call.remaining(),
                argc
            )));
        }
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
