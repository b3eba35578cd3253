//! Runtime support
//!
//! This module contains the core runtime types for execution:
//! - Atoms (interned identifier strings)
//! - Object representation (chained hash map keyed by atom)
//! - Function types (the `Callable` capability and native functions)

pub mod atom;
pub mod function;
pub mod object;

pub use atom::{Atom, AtomTable};
pub use function::{Callable, NativeCall, NativeFunction, NativeFunctionPtr};
pub use object::{Object, ObjectAllocError, ObjectRef};
