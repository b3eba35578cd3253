//! Value stack for the VM

use crate::value::Value;
use crate::vm::interpreter::{InterpreterError, InterpreterResult};

/// Operand stack for bytecode execution
pub struct Stack {
    /// Stack storage
    values: Vec<Value>,
    /// Maximum number of values
    limit: usize,
}

impl Stack {
    /// Create a new stack holding at most `limit` values
    pub fn new(limit: usize) -> Self {
        Stack {
            values: Vec::with_capacity(limit.min(1024)),
            limit,
        }
    }

    /// Maximum number of values
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Push a value onto the stack
    #[inline]
    pub fn push(&mut self, value: Value) -> InterpreterResult<()> {
        if self.values.len() >= self.limit {
            return Err(InterpreterError::StackOverflow);
        }
        self.values.push(value);
        Ok(())
    }

    /// Pop a value from the stack
    #[inline]
    pub fn pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    /// Peek at the top value without removing it
    #[inline]
    pub fn peek(&self) -> Option<&Value> {
        self.values.last()
    }

    /// Peek at a value at offset from top (0 = top)
    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<&Value> {
        let len = self.values.len();
        if offset < len {
            Some(&self.values[len - 1 - offset])
        } else {
            None
        }
    }

    /// Get the current stack depth
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the stack is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop n values from the stack
    pub fn drop_n(&mut self, n: usize) {
        let new_len = self.values.len().saturating_sub(n);
        self.values.truncate(new_len);
    }

    /// Shorten the stack to `len` values
    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    /// Remove every value
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Duplicate the top value
    pub fn dup(&mut self) -> InterpreterResult<()> {
        let val = self.peek().cloned().ok_or(InterpreterError::StackUnderflow)?;
        self.push(val)
    }

    /// Remove and return the value `offset` slots below the top (0 = top)
    pub fn remove_at(&mut self, offset: usize) -> Option<Value> {
        let len = self.values.len();
        if offset < len {
            Some(self.values.remove(len - 1 - offset))
        } else {
            None
        }
    }

    /// View the stack bottom to top
    #[inline]
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }
}
