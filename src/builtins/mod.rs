//! Built-in global objects
//!
//! The global object starts out with a single entry, `console`.

pub mod console;

use crate::runtime::{AtomTable, Object, ObjectAllocError, ObjectRef};
use crate::value::Value;

/// Build a fresh global object with every built-in installed
pub fn create_globals(atoms: &mut AtomTable) -> Result<ObjectRef, ObjectAllocError> {
    let globals = Object::new_ref();
    let console = console::create(atoms)?;
    globals
        .borrow_mut()
        .insert(atoms.intern_str("console"), Value::object(console))?;
    Ok(globals)
}
