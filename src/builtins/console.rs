//! The `console` object

use std::io::Write;

use crate::runtime::{AtomTable, NativeCall, Object, ObjectAllocError, ObjectRef};
use crate::value::Value;
use crate::vm::InterpreterResult;

/// Result of `console.toString()`
pub const CONSOLE_TAG: &str = "[object console]";

/// `console.log(...args)`
///
/// Prints every argument, separated by spaces, followed by a newline.
pub fn console_log(call: &mut NativeCall<'_>) -> InterpreterResult<()> {
    let args = call.pop_args()?;
    let mut line = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&arg.to_string());
    }
    writeln!(call.output, "{line}")?;
    Ok(())
}

/// `console.toString()`
pub fn console_to_string(call: &mut NativeCall<'_>) -> InterpreterResult<()> {
    call.pop_args()?;
    call.push_result(Value::string(CONSOLE_TAG))
}

/// Build the `console` object
pub fn create(atoms: &mut AtomTable) -> Result<ObjectRef, ObjectAllocError> {
    let console = Object::new_ref();
    {
        let mut obj = console.borrow_mut();
        obj.reserve(2)?;
        obj.insert(atoms.intern_str("log"), Value::native("log", console_log))?;
        obj.insert(
            atoms.intern_str("toString"),
            Value::native("toString", console_to_string),
        )?;
    }
    Ok(console)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::Stack;

    #[test]
    fn test_log_formats_arguments() {
        let mut stack = Stack::new(8);
        // Arguments are pushed last-first
        stack.push(Value::undefined()).unwrap();
        stack.push(Value::string("hello")).unwrap();

        let mut out = Vec::new();
        let mut call = NativeCall::new(Value::undefined(), Value::undefined(), &mut stack, 2, &mut out);
        console_log(&mut call).unwrap();

        assert_eq!(out, b"hello undefined\n");
        assert!(stack.is_empty());
    }

    #[test]
    fn test_log_without_arguments() {
        let mut stack = Stack::new(8);
        let mut out = Vec::new();
        let mut call = NativeCall::new(Value::undefined(), Value::undefined(), &mut stack, 0, &mut out);
        console_log(&mut call).unwrap();

        assert_eq!(out, b"\n");
    }

    #[test]
    fn test_to_string_pushes_tag() {
        let mut stack = Stack::new(8);
        let mut out = Vec::new();
        let mut call = NativeCall::new(Value::undefined(), Value::undefined(), &mut stack, 0, &mut out);
        console_to_string(&mut call).unwrap();

        assert_eq!(stack.pop().unwrap().as_bytes(), Some(CONSOLE_TAG.as_bytes()));
        assert!(out.is_empty());
    }

    #[test]
    fn test_console_members() {
        let mut atoms = AtomTable::new();
        let console = create(&mut atoms).unwrap();
        let console = console.borrow();

        assert_eq!(console.len(), 2);
        assert!(console.get(&atoms.intern_str("log")).unwrap().is_function());
        assert!(console.get(&atoms.intern_str("toString")).unwrap().is_function());
    }
}
