//! jsvm - a miniature JavaScript engine
//!
//! Runs a tiny JavaScript subset: string literals, identifiers, member
//! access and calls, enough for `console.log("hello")`.
//!
//! # Pipeline
//! - Lexer with snapshot-based lookahead, interning identifiers as atoms
//! - Precedence-climbing parser building an arena-allocated syntax tree
//! - Compiler lowering the tree to a flat instruction sequence
//! - Stack VM over reference-counted objects with chained-hash property maps
//!
//! # Example
//! ```
//! use jsvm::Context;
//!
//! let mut ctx = Context::new();
//! let mut out = Vec::new();
//! ctx.eval("hello.js", b"console.log(\"hello\")", &mut out).unwrap();
//! assert_eq!(out, b"hello\n");
//! ```

// Core modules
pub mod context;
pub mod value;

// Arena and string scratch storage
pub mod memory;

// Virtual machine
pub mod vm;

// Parser and compiler
pub mod parser;

// Built-in objects
pub mod builtins;

// Runtime support
pub mod runtime;

// Utilities
pub mod util;

// Re-export main types
pub use context::{Context, ContextConfig, EvalError, ParsedProgram};
pub use runtime::{Atom, AtomTable, Callable, NativeCall, NativeFunction, Object, ObjectRef};
pub use value::Value;
