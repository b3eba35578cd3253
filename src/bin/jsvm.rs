//! jsvm command line
//!
//! Runs a script file, or starts an interactive shell when no file is given.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use jsvm::memory::StringScratch;
use jsvm::parser::TokenKind;
use jsvm::{Context, ContextConfig, EvalError};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "jsvm", version, about = "Run a tiny JavaScript subset on a bytecode VM")]
struct Cli {
    /// Script to run; starts a REPL when omitted
    file: Option<PathBuf>,

    /// Print every token before running
    #[arg(long)]
    dump_tokens: bool,

    /// Print the syntax tree of every statement before running
    #[arg(long)]
    dump_ast: bool,

    /// Print the compiled bytecode before running
    #[arg(long)]
    dump_bytecode: bool,

    /// Bytes available for string literals per run
    #[arg(long, default_value_t = StringScratch::DEFAULT_CAPACITY)]
    scratch_capacity: usize,

    /// Maximum operand stack depth
    #[arg(long, default_value_t = jsvm::vm::Interpreter::DEFAULT_STACK_SIZE)]
    stack_limit: usize,

    /// Maximum expression nesting depth
    #[arg(long, default_value_t = jsvm::parser::Parser::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

impl Cli {
    fn config(&self) -> ContextConfig {
        ContextConfig {
            scratch_capacity: self.scratch_capacity,
            stack_limit: self.stack_limit,
            max_depth: self.max_depth,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jsvm=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut ctx = Context::with_config(cli.config());

    match &cli.file {
        Some(path) => run_file(&mut ctx, &cli, path),
        None => run_repl(&mut ctx, &cli),
    }
}

fn run_file(ctx: &mut Context, cli: &Cli, path: &Path) -> ExitCode {
    let source = match std::fs::read(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error reading {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let name = path.display().to_string();
    match run_source(ctx, cli, &name, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run_repl(ctx: &mut Context, cli: &Cli) -> ExitCode {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("Error starting line editor: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("jsvm {}", env!("CARGO_PKG_VERSION"));
    println!("Type JavaScript code to evaluate, Ctrl+D to exit.\n");

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                // History is a convenience; a failure to record it is not an error
                let _ = editor.add_history_entry(line);
                if let Err(err) = run_source(ctx, cli, "<repl>", line.as_bytes()) {
                    report(&err);
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error reading input: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

/// Print any requested dumps, then evaluate
fn run_source(ctx: &mut Context, cli: &Cli, name: &str, source: &[u8]) -> Result<(), EvalError> {
    if cli.dump_tokens {
        dump_tokens(ctx, name, source);
    }
    if cli.dump_ast {
        for statement in ctx.parse(name, source)?.display_statements() {
            println!("{statement}");
        }
    }

    let program = ctx.compile(name, source)?;
    if cli.dump_bytecode {
        print!("{program}");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    ctx.execute(&program, &mut out)
}

fn dump_tokens(ctx: &mut Context, name: &str, source: &[u8]) {
    let mut scratch = StringScratch::new(ctx.config().scratch_capacity);
    let mut lexer = ctx.lexer(name, source, &mut scratch);
    loop {
        let token = lexer.next_token();
        println!("{}", lexer.render_token(&token));
        match token.kind {
            TokenKind::Eof => break,
            TokenKind::Error(err) if err.is_fatal() => break,
            _ => {}
        }
    }
}

fn report(err: &EvalError) {
    match err {
        EvalError::Syntax(errors) => {
            for err in errors.iter() {
                eprintln!("SyntaxError: {err}");
            }
        }
        other => eprintln!("{other}"),
    }
}
