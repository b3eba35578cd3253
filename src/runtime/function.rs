//! Function values
//!
//! Everything callable from bytecode implements [`Callable`]. Built-ins are
//! [`NativeFunction`]s: a name plus a plain function pointer. Embedders can
//! implement the trait directly to expose stateful callables.
//!
//! # Calling convention
//! When `call(argc)` runs, the receiver and the callee have already been
//! taken off the stack and the `argc` arguments are on top of it, first
//! argument uppermost. The callee must pop exactly `argc` values and may push
//! at most one result.

use std::fmt;
use std::io::Write;

use crate::value::Value;
use crate::vm::{InterpreterError, InterpreterResult, Stack};

/// Native function signature
pub type NativeFunctionPtr = fn(call: &mut NativeCall<'_>) -> InterpreterResult<()>;

/// Something that can be the target of a `call` instruction
pub trait Callable {
    /// Name used when the function is printed
    fn name(&self) -> &str;

    /// Invoke the function
    fn call(&self, call: &mut NativeCall<'_>) -> InterpreterResult<()>;
}

/// Built-in function implemented in Rust
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub func: NativeFunctionPtr,
}

impl NativeFunction {
    pub const fn new(name: &'static str, func: NativeFunctionPtr) -> Self {
        NativeFunction { name, func }
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        self.name
    }

    fn call(&self, call: &mut NativeCall<'_>) -> InterpreterResult<()> {
        (self.func)(call)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// Everything a callee can see during one call
pub struct NativeCall<'a> {
    /// Receiver (`this`)
    pub this: Value,
    /// The function value being called
    pub callee: Value,
    /// Sink for program output
    pub output: &'a mut dyn Write,
    /// Operand stack with the arguments on top
    stack: &'a mut Stack,
    /// Arguments not yet popped
    remaining: usize,
    /// Argument count the call was made with
    argc: usize,
    /// Whether a result has been pushed
    pushed: bool,
}

impl<'a> NativeCall<'a> {
    pub fn new(
        this: Value,
        callee: Value,
        stack: &'a mut Stack,
        argc: usize,
        output: &'a mut dyn Write,
    ) -> Self {
        NativeCall {
            this,
            callee,
            stack,
            output,
            remaining: argc,
            argc,
            pushed: false,
        }
    }

    /// Argument count the call was made with
    #[inline]
    pub fn argc(&self) -> usize {
        self.argc
    }

    /// Arguments still on the stack
    #[inline]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Pop the next argument (first argument comes off first)
    pub fn pop_arg(&mut self) -> InterpreterResult<Value> {
        if self.remaining == 0 {
            return Err(InterpreterError::InternalError(
                "native function popped more arguments than it was given".to_string(),
            ));
        }
        // The result sits above any unpopped arguments
        if self.pushed {
            return Err(InterpreterError::InternalError(
                "native function popped an argument after pushing its result".to_string(),
            ));
        }
        let value = self.stack.pop().ok_or(InterpreterError::StackUnderflow)?;
        self.remaining -= 1;
        Ok(value)
    }

    /// Pop every remaining argument, in argument order
    pub fn pop_args(&mut self) -> InterpreterResult<Vec<Value>> {
        let mut args = Vec::with_capacity(self.remaining);
        while self.remaining > 0 {
            args.push(self.pop_arg()?);
        }
        Ok(args)
    }

    /// Push the call's result
    ///
    /// A call produces at most one result.
    pub fn push_result(&mut self, value: Value) -> InterpreterResult<()> {
        if self.pushed {
            return Err(InterpreterError::InternalError(
                "native function pushed more than one result".to_string(),
            ));
        }
        self.stack.push(value)?;
        self.pushed = true;
        Ok(())
    }
}
