//! Runtime value representation
//!
//! A [`Value`] is one of four kinds. Cloning a value deep-copies string
//! bytes and shares objects and functions by reference count, so a value
//! read out of an object or duplicated on the stack never aliases a string
//! buffer.
//!
//! # Formatting
//! `Display` renders values the way `console.log` prints them:
//! - `undefined`
//! - functions as `<Function: NAME>`
//! - objects as `{key: value, ...}` in bucket order; strings nested inside an
//!   object are quoted
//! - an object reached again while it is still being printed as `[Circular]`
//! - strings with printable ASCII verbatim and every other byte as `\xHH`

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::runtime::{Callable, NativeFunction, NativeFunctionPtr, Object, ObjectRef};
use crate::util::unicode::is_printable_ascii;

/// JavaScript value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    String(Vec<u8>),
    Object(ObjectRef),
    Function(Rc<dyn Callable>),
}

impl Value {
    /// Create the undefined value
    #[inline]
    pub const fn undefined() -> Self {
        Value::Undefined
    }

    /// Create a string value from bytes
    #[inline]
    pub fn string(bytes: impl AsRef<[u8]>) -> Self {
        Value::String(bytes.as_ref().to_vec())
    }

    /// Wrap an object handle
    #[inline]
    pub fn object(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }

    /// Create a fresh, empty object value
    pub fn new_object() -> Self {
        Value::Object(Object::new_ref())
    }

    /// Create a native function value
    pub fn native(name: &'static str, func: NativeFunctionPtr) -> Self {
        Value::Function(Rc::new(NativeFunction::new(name, func)))
    }

    /// Wrap any callable
    pub fn function(callable: Rc<dyn Callable>) -> Self {
        Value::Function(callable)
    }

    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// String contents, if this is a string
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Object handle, if this is an object
    #[inline]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Callable, if this is a function
    #[inline]
    pub fn as_function(&self) -> Option<&Rc<dyn Callable>> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Name of the value's kind, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Check if both values are the same object or function, or equal strings
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `open` holds the objects currently being printed, outermost first
    fn fmt_value(
        &self,
        f: &mut fmt::Formatter<'_>,
        nested: bool,
        open: &mut Vec<*const RefCell<Object>>,
    ) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Function(func) => write!(f, "<Function: {}>", func.name()),
            Value::String(bytes) if nested => {
                f.write_str("\"")?;
                write_escaped(f, bytes)?;
                f.write_str("\"")
            }
            Value::String(bytes) => write_escaped(f, bytes),
            Value::Object(obj) => {
                let ptr = Rc::as_ptr(obj);
                if open.contains(&ptr) {
                    return f.write_str("[Circular]");
                }
                open.push(ptr);
                let obj = obj.borrow();
                f.write_str("{")?;
                for (i, (key, value)) in obj.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: ")?;
                    value.fmt_value(f, true, open)?;
                }
                open.pop();
                f.write_str("}")
            }
        }
    }
}

/// Write bytes with printable ASCII verbatim and everything else as `\xHH`
pub fn write_escaped(f: &mut impl fmt::Write, bytes: &[u8]) -> fmt::Result {
    for &b in bytes {
        if is_printable_ascii(b) {
            f.write_char(b as char)?;
        } else {
            write!(f, "\\x{b:02X}")?;
        }
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_value(f, false, &mut Vec::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::String(bytes) => write!(f, "String({:?})", String::from_utf8_lossy(bytes)),
            Value::Object(_) => write!(f, "Object({self})"),
            Value::Function(func) => write!(f, "Function({})", func.name()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}
