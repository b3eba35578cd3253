//! Expression parser
//!
//! Precedence climbing over the token stream. The right operand of a binary
//! operator is first parsed as a bare primary; when the following operator
//! binds tighter, the lexer is rewound and the operand is parsed again as a
//! sub-expression. Equal precedence therefore associates to the left.

use tracing::{debug, warn};

use super::ast::{Ast, BinaryOp, NodeId, CALL_PRECEDENCE, INITIAL_PRECEDENCE};
use super::lexer::{LexError, Lexer, SourcePos, Token, TokenKind};

/// Kind of a syntax error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("unexpected {found}")]
    UnexpectedToken { found: String },
    #[error("expected ',' or ')' in argument list, found {found}")]
    MalformedArguments { found: String },
    #[error("expression nested deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// A syntax error with its location
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}:{}:{}: {}", .path, .pos.line, .pos.column, .kind)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub path: String,
    pub pos: SourcePos,
}

impl ParseError {
    pub fn is_fatal(&self) -> bool {
        matches!(&self.kind, ParseErrorKind::Lex(err) if err.is_fatal())
    }
}

/// Every syntax error found in one source
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} syntax error(s){}", .errors.len(), first_error(.errors))]
pub struct SyntaxErrors {
    pub errors: Vec<ParseError>,
}

fn first_error(errors: &[ParseError]) -> String {
    errors
        .first()
        .map(|err| format!(", first: {err}"))
        .unwrap_or_default()
}

impl SyntaxErrors {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.errors.iter()
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parser state
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    ast: &'a mut Ast,
    /// Active `parse_expression` calls
    depth: usize,
    /// Limit on expression nesting and on syntax tree height
    max_depth: usize,
}

impl<'a> Parser<'a> {
    /// Default nesting limit
    pub const DEFAULT_MAX_DEPTH: usize = 256;

    pub fn new(lexer: Lexer<'a>, ast: &'a mut Ast) -> Self {
        Self::with_max_depth(lexer, ast, Self::DEFAULT_MAX_DEPTH)
    }

    /// Create a parser with a custom nesting limit
    pub fn with_max_depth(lexer: Lexer<'a>, ast: &'a mut Ast, max_depth: usize) -> Self {
        Parser {
            lexer,
            ast,
            depth: 0,
            max_depth,
        }
    }

    pub fn lexer(&self) -> &Lexer<'a> {
        &self.lexer
    }

    /// Parse a whole source as a sequence of `;`-separated expressions
    ///
    /// After an error the parser skips past the next `;` and continues, so
    /// every statement gets checked. A fatal lexical error ends the scan.
    pub fn parse_program(&mut self) -> Result<Vec<NodeId>, SyntaxErrors> {
        let mut statements = Vec::new();
        let mut errors = Vec::new();

        loop {
            match self.lexer.peek_next().kind {
                TokenKind::Eof => break,
                TokenKind::Semicolon => {
                    self.lexer.next_token();
                }
                _ => match self.parse_expression(INITIAL_PRECEDENCE) {
                    Ok(node) => statements.push(node),
                    Err(err) => {
                        let fatal = err.is_fatal();
                        self.record(&mut errors, err);
                        if fatal || !self.synchronize(&mut errors) {
                            break;
                        }
                    }
                },
            }
        }

        debug!(
            path = self.lexer.path(),
            statements = statements.len(),
            errors = errors.len(),
            "parsed program"
        );
        if errors.is_empty() {
            Ok(statements)
        } else {
            Err(SyntaxErrors { errors })
        }
    }

    /// Parse an expression whose operators all have precedence at most
    /// `max_precedence`
    ///
    /// Fails with [`ParseErrorKind::TooDeep`] once calls nest or the tree
    /// grows beyond the parser's depth limit.
    pub fn parse_expression(&mut self, max_precedence: u32) -> ParseResult<NodeId> {
        if self.depth >= self.max_depth {
            let pos = self.lexer.peek_next().start;
            return Err(self.too_deep(pos));
        }
        self.depth += 1;
        let result = self.parse_operators(max_precedence);
        self.depth -= 1;
        result
    }

    fn parse_operators(&mut self, max_precedence: u32) -> ParseResult<NodeId> {
        let mut lhs = self.parse_primary()?;

        loop {
            let token = self.lexer.peek_next();
            if token.kind == TokenKind::LParen {
                if CALL_PRECEDENCE > max_precedence {
                    return Ok(lhs);
                }
                self.lexer.next_token();
                let args = self.parse_arguments()?;
                lhs = self.ast.new_call(lhs, args, token.start);
                self.check_height(lhs)?;
                continue;
            }

            let Some(op) = BinaryOp::from_token(&token.kind) else {
                return Ok(lhs);
            };
            let precedence = op.precedence();
            if precedence > max_precedence {
                return Ok(lhs);
            }
            self.lexer.next_token();

            let snapshot = self.lexer.snapshot();
            let mut rhs = self.parse_primary()?;
            if self.next_binds_tighter(precedence) {
                self.lexer.restore(snapshot);
                rhs = self.parse_expression(precedence - 1)?;
            }
            lhs = self.ast.new_binary(op, lhs, rhs, token.start);
            self.check_height(lhs)?;
        }
    }

    /// Long operator chains build tall trees without nesting calls
    fn check_height(&self, node: NodeId) -> ParseResult<()> {
        let node = &self.ast[node];
        if node.depth as usize > self.max_depth {
            return Err(self.too_deep(node.pos));
        }
        Ok(())
    }

    /// Whether the upcoming operator binds tighter than `precedence`
    fn next_binds_tighter(&mut self, precedence: u32) -> bool {
        match self.lexer.peek_next().kind {
            TokenKind::LParen => CALL_PRECEDENCE < precedence,
            ref kind => BinaryOp::from_token(kind).is_some_and(|op| op.precedence() < precedence),
        }
    }

    /// Parse a string literal or identifier
    ///
    /// `;` and end of input are reported but left in place for the
    /// statement driver.
    fn parse_primary(&mut self) -> ParseResult<NodeId> {
        let next = self.lexer.peek_next();
        if matches!(next.kind, TokenKind::Semicolon | TokenKind::Eof) {
            return Err(self.unexpected(&next));
        }

        let token = self.lexer.next_token();
        match token.kind {
            TokenKind::Str(slice) => Ok(self.ast.new_str(slice, token.start)),
            TokenKind::Ident(atom) => Ok(self.ast.new_atom(atom, token.start)),
            _ => Err(self.unexpected(&token)),
        }
    }

    /// Parse a call's argument list; the `(` has been consumed
    fn parse_arguments(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut args = Vec::new();
        if self.lexer.peek_next().kind == TokenKind::RParen {
            self.lexer.next_token();
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression(INITIAL_PRECEDENCE)?);

            let token = self.lexer.peek_next();
            match token.kind {
                TokenKind::Comma => {
                    self.lexer.next_token();
                }
                TokenKind::RParen => {
                    self.lexer.next_token();
                    return Ok(args);
                }
                TokenKind::Error(err) => {
                    self.lexer.next_token();
                    return Err(self.error_at(token.start, ParseErrorKind::Lex(err)));
                }
                TokenKind::Semicolon | TokenKind::Eof => {
                    return Err(self.malformed_arguments(&token));
                }
                _ => {
                    self.lexer.next_token();
                    return Err(self.malformed_arguments(&token));
                }
            }
        }
    }

    /// Skip to just past the next `;`
    ///
    /// Lexical errors met on the way are recorded too. Returns `false` when
    /// one of them is fatal.
    fn synchronize(&mut self, errors: &mut Vec<ParseError>) -> bool {
        loop {
            let token = self.lexer.next_token();
            match token.kind {
                TokenKind::Semicolon | TokenKind::Eof => return true,
                TokenKind::Error(err) => {
                    let fatal = err.is_fatal();
                    let err = self.error_at(token.start, ParseErrorKind::Lex(err));
                    self.record(errors, err);
                    if fatal {
                        return false;
                    }
                }
                _ => {}
            }
        }
    }

    fn record(&self, errors: &mut Vec<ParseError>, err: ParseError) {
        warn!(%err, "syntax error");
        errors.push(err);
    }

    fn unexpected(&self, token: &Token) -> ParseError {
        let kind = match &token.kind {
            TokenKind::Error(err) => ParseErrorKind::Lex(*err),
            other => ParseErrorKind::UnexpectedToken {
                found: other.describe(),
            },
        };
        self.error_at(token.start, kind)
    }

    fn malformed_arguments(&self, token: &Token) -> ParseError {
        self.error_at(
            token.start,
            ParseErrorKind::MalformedArguments {
                found: token.kind.describe(),
            },
        )
    }

    fn too_deep(&self, pos: SourcePos) -> ParseError {
        self.error_at(
            pos,
            ParseErrorKind::TooDeep {
                limit: self.max_depth,
            },
        )
    }

    fn error_at(&self, pos: SourcePos, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            path: self.lexer.path().to_string(),
            pos,
        }
    }
}
