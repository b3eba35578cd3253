//! JavaScript execution context
//!
//! The Context is the main entry point for the engine. It owns the atom
//! table, the global object and the interpreter, and drives source through
//! lexing, parsing, compilation and execution.

use std::io::{self, Write};

use tracing::debug;

use crate::builtins;
use crate::memory::StringScratch;
use crate::parser::{Ast, CompileError, Compiler, Lexer, NodeId, Parser, SyntaxErrors};
use crate::runtime::{AtomTable, ObjectAllocError, ObjectRef};
use crate::value::Value;
use crate::vm::{Interpreter, InterpreterError, Program};

/// Context settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextConfig {
    /// Bytes available for decoded string literals per evaluation
    pub scratch_capacity: usize,
    /// Maximum operand stack depth
    pub stack_limit: usize,
    /// Maximum expression nesting depth
    pub max_depth: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            scratch_capacity: StringScratch::DEFAULT_CAPACITY,
            stack_limit: Interpreter::DEFAULT_STACK_SIZE,
            max_depth: Parser::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Error from JavaScript evaluation
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Lexical or syntax errors, all of them
    #[error(transparent)]
    Syntax(#[from] SyntaxErrors),
    /// Compilation error
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
    /// Runtime error
    #[error("runtime error: {0}")]
    Runtime(#[from] InterpreterError),
}

/// A parsed source: the tree, its statements and the literal storage
pub struct ParsedProgram {
    pub ast: Ast,
    pub scratch: StringScratch,
    pub statements: Vec<NodeId>,
}

impl ParsedProgram {
    /// Render each statement on its own line
    pub fn display_statements(&self) -> Vec<String> {
        self.statements
            .iter()
            .map(|&node| self.ast.display(node, &self.scratch).to_string())
            .collect()
    }
}

/// JavaScript execution context
pub struct Context {
    config: ContextConfig,
    atoms: AtomTable,
    globals: ObjectRef,
    interpreter: Interpreter,
}

impl Context {
    /// Create a context with default settings
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    /// Create a context with the given settings
    ///
    /// # Panics
    /// Panics if the global object cannot be allocated.
    pub fn with_config(config: ContextConfig) -> Self {
        let mut atoms = AtomTable::new();
        let globals = match builtins::create_globals(&mut atoms) {
            Ok(globals) => globals,
            Err(err) => panic!("failed to create global object: {err}"),
        };

        Context {
            config,
            atoms,
            globals,
            interpreter: Interpreter::with_config(config.stack_limit),
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut AtomTable {
        &mut self.atoms
    }

    /// The global object
    pub fn globals(&self) -> &ObjectRef {
        &self.globals
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Bind a global, returning the previous value
    pub fn define_global(
        &mut self,
        name: &str,
        value: Value,
    ) -> Result<Option<Value>, ObjectAllocError> {
        let atom = self.atoms.intern_str(name);
        self.globals.borrow_mut().insert(atom, value)
    }

    /// Look up a global
    pub fn global(&self, name: &str) -> Option<Value> {
        let atom = self.atoms.get(name.as_bytes())?;
        self.globals.borrow().get(&atom).cloned()
    }

    /// Lexer over `source` writing literals into `scratch`
    pub fn lexer<'a>(
        &'a mut self,
        path: &'a str,
        source: &'a [u8],
        scratch: &'a mut StringScratch,
    ) -> Lexer<'a> {
        Lexer::new(path, source, &mut self.atoms, scratch)
    }

    /// Parse `source` into a syntax tree
    pub fn parse(&mut self, path: &str, source: &[u8]) -> Result<ParsedProgram, SyntaxErrors> {
        let mut scratch = StringScratch::new(self.config.scratch_capacity);
        let mut ast = Ast::new();
        let statements = {
            let lexer = Lexer::new(path, source, &mut self.atoms, &mut scratch);
            Parser::with_max_depth(lexer, &mut ast, self.config.max_depth).parse_program()?
        };
        debug!(
            path,
            nodes = ast.len(),
            literal_bytes = scratch.used(),
            "built syntax tree"
        );
        Ok(ParsedProgram {
            ast,
            scratch,
            statements,
        })
    }

    /// Compile `source` to bytecode without executing it
    pub fn compile(&mut self, path: &str, source: &[u8]) -> Result<Program, EvalError> {
        let parsed = self.parse(path, source)?;
        let program = Compiler::new(&parsed.ast, &parsed.scratch).compile_program(&parsed.statements)?;
        Ok(program)
    }

    /// Execute pre-compiled bytecode
    ///
    /// The operand stack starts out empty on every run.
    pub fn execute(&mut self, program: &Program, output: &mut dyn Write) -> Result<(), EvalError> {
        self.interpreter.reset();
        self.interpreter.execute(program, &self.globals, output)?;
        Ok(())
    }

    /// Evaluate JavaScript source, writing program output to `output`
    ///
    /// Nothing runs unless the whole source parses and compiles.
    pub fn eval(&mut self, path: &str, source: &[u8], output: &mut dyn Write) -> Result<(), EvalError> {
        let program = self.compile(path, source)?;
        self.execute(&program, output)
    }

    /// Evaluate JavaScript source with output going to stdout
    pub fn eval_to_stdout(&mut self, path: &str, source: &[u8]) -> Result<(), EvalError> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        let result = self.eval(path, source, &mut lock);
        lock.flush().map_err(InterpreterError::from)?;
        result
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::parser::ParseErrorKind;
    use crate::runtime::{Callable, NativeCall, Object};
    use crate::vm::InterpreterResult;

    fn eval(ctx: &mut Context, source: &str) -> (Result<(), EvalError>, String) {
        let mut out = Vec::new();
        let result = ctx.eval("test.js", source.as_bytes(), &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    /// Records the receiver and arguments of every call
    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(String, Vec<String>)>>,
    }

    impl Callable for Recorder {
        fn name(&self) -> &str {
            "record"
        }

        fn call(&self, call: &mut NativeCall<'_>) -> InterpreterResult<()> {
            let args = call.pop_args()?;
            self.calls.borrow_mut().push((
                call.this.to_string(),
                args.iter().map(Value::to_string).collect(),
            ));
            call.push_result(Value::string("recorded"))
        }
    }

    #[test]
    fn test_create_context() {
        let ctx = Context::new();
        assert_eq!(*ctx.config(), ContextConfig::default());
        assert!(ctx.global("console").is_some_and(|v| v.is_object()));
        assert!(ctx.global("window").is_none());
    }

    #[test]
    fn test_eval_empty() {
        let mut ctx = Context::new();
        let (result, out) = eval(&mut ctx, "");
        assert!(result.is_ok());
        assert!(out.is_empty());
    }

    #[test]
    fn test_console_log() {
        let mut ctx = Context::new();
        let (result, out) = eval(&mut ctx, "console.log(\"hi\");");
        result.unwrap();
        assert_eq!(out, "hi\n");
    }

    #[test]
    fn test_console_log_values() {
        let mut ctx = Context::new();
        let (result, out) = eval(
            &mut ctx,
            "console.log(\"a\", missing, console.log);\n\
             console.log(console);\n\
             console.log(console.toString());\n\
             console.log(\"tab\\there\", \"\\0\")",
        );
        result.unwrap();
        assert_eq!(
            out,
            "a undefined <Function: log>\n\
             {log: <Function: log>, toString: <Function: toString>}\n\
             [object console]\n\
             tab\\x09here \\x00\n"
        );
    }

    #[test]
    fn test_call_receiver_and_arguments() {
        let mut ctx = Context::new();
        let recorder = Rc::new(Recorder::default());

        let obj = Object::new_ref();
        obj.borrow_mut()
            .insert(ctx.atoms_mut().intern_str("m"), Value::function(recorder.clone()))
            .unwrap();
        ctx.define_global("obj", Value::object(obj)).unwrap();
        ctx.define_global("rec", Value::function(recorder.clone())).unwrap();

        let (result, out) = eval(&mut ctx, "obj.m(\"a\", \"b\"); console.log(rec(\"x\"))");
        result.unwrap();
        assert_eq!(out, "recorded\n");

        let calls = recorder.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "{m: <Function: record>}");
        assert_eq!(calls[0].1, vec!["a", "b"]);
        assert_eq!(calls[1], ("undefined".to_string(), vec!["x".to_string()]));
    }

    #[test]
    fn test_member_of_string_is_type_error() {
        let mut ctx = Context::new();
        let (result, out) = eval(&mut ctx, "console.log(\"before\"); \"x\".y; console.log(\"after\")");

        let Err(EvalError::Runtime(err)) = &result else {
            panic!("expected runtime error, got {result:?}");
        };
        assert!(err.is_type_error());
        assert_eq!(err.to_string(), "TypeError: cannot read property 'y' of string");
        assert_eq!(out, "before\n");
    }

    #[test]
    fn test_call_non_function() {
        let mut ctx = Context::new();
        let (result, _) = eval(&mut ctx, "nothing()");
        let Err(EvalError::Runtime(err)) = &result else {
            panic!("expected runtime error, got {result:?}");
        };
        assert_eq!(err.to_string(), "TypeError: undefined is not a function");

        // The context stays usable after a runtime error
        let (result, out) = eval(&mut ctx, "console.log(\"ok\")");
        result.unwrap();
        assert_eq!(out, "ok\n");
        assert!(ctx.interpreter().stack().is_empty());
    }

    #[test]
    fn test_syntax_errors_accumulate() {
        let mut ctx = Context::new();
        let (result, out) = eval(&mut ctx, "console.log(\"x\"); a(b,; c(;");

        let Err(EvalError::Syntax(errors)) = &result else {
            panic!("expected syntax errors, got {result:?}");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e.kind, ParseErrorKind::UnexpectedToken { .. })));
        // Nothing runs when the source does not parse
        assert!(out.is_empty());
    }

    #[test]
    fn test_unsupported_operator() {
        let mut ctx = Context::new();
        let (result, _) = eval(&mut ctx, "a + b");
        assert!(matches!(result, Err(EvalError::Compile(CompileError::UnsupportedOperator { .. }))));
    }

    #[test]
    fn test_parse_and_compile() {
        let mut ctx = Context::new();
        let parsed = ctx.parse("test.js", b"a.b() + c; f(\"s\")").unwrap();
        assert_eq!(parsed.display_statements(), vec!["((a.b)() + c)", "f(\"s\")"]);

        let program = ctx.compile("test.js", b"console.log(\"hi\")").unwrap();
        assert_eq!(
            program.to_string(),
            "0000: load_global console\n\
             0001: dup\n\
             0002: load_member log\n\
             0003: push_str \"hi\"\n\
             0004: call 1\n"
        );
    }

    #[test]
    fn test_small_scratch() {
        let mut ctx = Context::with_config(ContextConfig {
            scratch_capacity: 4,
            ..ContextConfig::default()
        });
        let (result, _) = eval(&mut ctx, "console.log(\"too long\")");
        let Err(EvalError::Syntax(errors)) = &result else {
            panic!("expected syntax errors, got {result:?}");
        };
        assert!(errors.errors[0].is_fatal());
    }

    #[test]
    fn test_stack_limit() {
        let mut ctx = Context::with_config(ContextConfig {
            stack_limit: 2,
            ..ContextConfig::default()
        });
        let (result, _) = eval(&mut ctx, "console.log(\"a\", \"b\")");
        assert!(matches!(result, Err(EvalError::Runtime(InterpreterError::StackOverflow))));
    }

    #[test]
    fn test_many_statements() {
        let mut ctx = Context::new();
        let mut source = "console;\n".repeat(1100);
        source.push_str("console.log(\"done\")");

        let (result, out) = eval(&mut ctx, &source);
        result.unwrap();
        assert_eq!(out, "done\n");
    }

    #[test]
    fn test_max_depth() {
        let mut ctx = Context::with_config(ContextConfig {
            max_depth: 3,
            ..ContextConfig::default()
        });
        let (result, out) = eval(&mut ctx, "console.log(console.toString(console.log(\"x\")))");
        let Err(EvalError::Syntax(errors)) = &result else {
            panic!("expected syntax errors, got {result:?}");
        };
        assert_eq!(errors.errors[0].kind, ParseErrorKind::TooDeep { limit: 3 });
        assert!(out.is_empty());

        let (result, out) = eval(&mut ctx, "console.log(\"x\")");
        result.unwrap();
        assert_eq!(out, "x\n");
    }

    #[test]
    fn test_log_global_object_through_itself() {
        let mut ctx = Context::new();
        let globals = ctx.globals().clone();
        ctx.define_global("self", Value::object(globals)).unwrap();

        let (result, out) = eval(&mut ctx, "console.log(self)");
        result.unwrap();
        assert!(out.contains("self: [Circular]"), "{out}");
        assert!(out.contains("console: {log: <Function: log>"), "{out}");

        // Drop the cycle through the global object
        ctx.define_global("self", Value::undefined()).unwrap();
    }

    #[test]
    fn test_method_call_round_trip() {
        let mut ctx = Context::new();
        let recorder = Rc::new(Recorder::default());
        let foo = Object::new_ref();
        foo.borrow_mut()
            .insert(ctx.atoms_mut().intern_str("bar"), Value::function(recorder.clone()))
            .unwrap();
        ctx.define_global("foo", Value::object(foo)).unwrap();

        let program = ctx.compile("test.js", b"foo.bar(\"x\")").unwrap();
        assert_eq!(
            program.to_string(),
            "0000: load_global foo\n\
             0001: dup\n\
             0002: load_member bar\n\
             0003: push_str \"x\"\n\
             0004: call 1\n"
        );

        let mut out = Vec::new();
        ctx.execute(&program, &mut out).unwrap();
        let calls = recorder.calls.borrow();
        assert_eq!(
            *calls,
            vec![("{bar: <Function: record>}".to_string(), vec!["x".to_string()])]
        );
    }
}
