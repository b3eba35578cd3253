//! JavaScript lexer/tokenizer
//!
//! Converts UTF-8 source bytes into a stream of tokens. Identifiers are
//! interned into the [`AtomTable`] and decoded string literals are copied into
//! the caller's [`StringScratch`].
//!
//! Lookahead works by snapshotting the scan position and the scratch head,
//! lexing forward and restoring the snapshot. Re-lexing after a restore
//! writes the same bytes at the same scratch offsets, so a token seen through
//! [`Lexer::peek_token`] compares equal to the one later returned by
//! [`Lexer::next_token`].

use std::fmt;

use crate::memory::{ScratchMark, StrSlice, StringScratch};
use crate::runtime::{Atom, AtomTable};
use crate::util::{decode_next, unicode};
use crate::value::write_escaped;

/// Lexical error
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    /// String literal hit a newline or the end of input
    #[error("unterminated string literal")]
    UnterminatedString,
    /// Code point that does not fit in a string byte
    #[error("invalid character {} in string literal", CodePoint(*.0))]
    InvalidCharInString(u32),
    /// Character that starts no token
    #[error("unexpected character {}", CodePoint(*.0))]
    UnexpectedChar(u32),
    /// Decoded string literals outgrew the scratch region
    #[error("string literal storage exhausted ({capacity} bytes)")]
    ScratchExhausted { capacity: usize },
}

impl LexError {
    /// Fatal errors stop scanning of the whole source
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LexError::UnexpectedChar(_) | LexError::ScratchExhausted { .. }
        )
    }
}

struct CodePoint(u32);

impl fmt::Display for CodePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match char::from_u32(self.0) {
            Some(c) if !c.is_control() => write!(f, "'{c}' (U+{:04X})", self.0),
            _ => write!(f, "U+{:04X}", self.0),
        }
    }
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Dot,       // .
    LParen,    // (
    RParen,    // )
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Comma,     // ,
    Semicolon, // ;

    Ident(Atom),
    Str(StrSlice),

    Eof,
    Error(LexError),
}

impl TokenKind {
    /// Human readable description for diagnostics
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Ident(atom) => format!("identifier '{atom}'"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Error(err) => err.to_string(),
        }
    }
}

/// Source position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourcePos {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A token with the source range it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: SourcePos,
    pub end: SourcePos,
}

/// Saved lexer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerSnapshot {
    pos: usize,
    line: usize,
    column: usize,
    scratch: ScratchMark,
}

/// Lexer for JavaScript source code
pub struct Lexer<'a> {
    path: &'a str,
    source: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    atoms: &'a mut AtomTable,
    scratch: &'a mut StringScratch,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source
    pub fn new(
        path: &'a str,
        source: &'a [u8],
        atoms: &'a mut AtomTable,
        scratch: &'a mut StringScratch,
    ) -> Self {
        Lexer {
            path,
            source,
            pos: 0,
            line: 1,
            column: 1,
            atoms,
            scratch,
        }
    }

    /// Logical path of the source, for diagnostics
    pub fn path(&self) -> &'a str {
        self.path
    }

    /// Get the current source position
    pub fn position(&self) -> SourcePos {
        SourcePos {
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    /// The region decoded string literals are stored in
    pub fn scratch(&self) -> &StringScratch {
        self.scratch
    }

    /// Bytes of a string literal token
    pub fn string_bytes(&self, slice: StrSlice) -> &[u8] {
        self.scratch.get(slice)
    }

    /// Render a token as `line:column description` for token dumps
    pub fn render_token(&self, token: &Token) -> String {
        let text = match &token.kind {
            TokenKind::Str(slice) => {
                let mut text = String::from("string \"");
                // Writing into a String cannot fail
                let _ = write_escaped(&mut text, self.string_bytes(*slice));
                text.push('"');
                text
            }
            other => other.describe(),
        };
        format!("{} {}", token.start, text)
    }

    /// Save the scan state
    pub fn snapshot(&self) -> LexerSnapshot {
        LexerSnapshot {
            pos: self.pos,
            line: self.line,
            column: self.column,
            scratch: self.scratch.mark(),
        }
    }

    /// Return to a saved scan state
    pub fn restore(&mut self, snapshot: LexerSnapshot) {
        self.pos = snapshot.pos;
        self.line = snapshot.line;
        self.column = snapshot.column;
        self.scratch.reset(snapshot.scratch);
    }

    /// Return the token `ahead` positions past the next one without
    /// consuming anything (`peek_token(0)` is the next token)
    pub fn peek_token(&mut self, ahead: usize) -> Token {
        let snapshot = self.snapshot();
        let mut token = self.next_token();
        for _ in 0..ahead {
            token = self.next_token();
        }
        self.restore(snapshot);
        token
    }

    /// Return the next token without consuming it
    #[inline]
    pub fn peek_next(&mut self) -> Token {
        self.peek_token(0)
    }

    /// Peek at the current character without consuming it
    fn peek_char(&self) -> Option<u32> {
        decode_next(&self.source[self.pos..]).map(|(c, _)| c)
    }

    /// Peek at the character after the current one
    fn peek_char_n(&self, n: usize) -> Option<u32> {
        let mut pos = self.pos;
        let mut c = None;
        for _ in 0..=n {
            let (cp, len) = decode_next(&self.source[pos..])?;
            pos += len;
            c = Some(cp);
        }
        c
    }

    /// Consume the current character
    fn next_char(&mut self) -> Option<u32> {
        let (c, len) = decode_next(&self.source[self.pos..])?;
        self.pos += len;
        if c == '\n' as u32 {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Skip whitespace and comments
    fn skip_whitespace(&mut self) {
        const SLASH: u32 = '/' as u32;
        const STAR: u32 = '*' as u32;

        loop {
            match self.peek_char() {
                Some(c) if unicode::is_whitespace(c) => {
                    self.next_char();
                }
                Some(SLASH) if self.peek_char_n(1) == Some(SLASH) => {
                    // Line comment
                    while let Some(c) = self.next_char() {
                        if c == '\n' as u32 {
                            break;
                        }
                    }
                }
                Some(SLASH) if self.peek_char_n(1) == Some(STAR) => {
                    // Block comment
                    self.next_char(); // /
                    self.next_char(); // *
                    while let Some(c) = self.next_char() {
                        if c == STAR && self.peek_char() == Some(SLASH) {
                            self.next_char();
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Read the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.position();
        let kind = self.scan();
        Token {
            kind,
            start,
            end: self.position(),
        }
    }

    fn scan(&mut self) -> TokenKind {
        let Some(c) = self.peek_char() else {
            return TokenKind::Eof;
        };

        if c == '"' as u32 {
            return match self.read_string() {
                Ok(slice) => TokenKind::Str(slice),
                Err(err) => TokenKind::Error(err),
            };
        }

        if unicode::is_id_start(c) {
            return self.read_identifier();
        }

        self.next_char();
        match char::from_u32(c) {
            Some('.') => TokenKind::Dot,
            Some('(') => TokenKind::LParen,
            Some(')') => TokenKind::RParen,
            Some('+') => TokenKind::Plus,
            Some('-') => TokenKind::Minus,
            Some('*') => TokenKind::Star,
            Some('/') => TokenKind::Slash,
            Some(',') => TokenKind::Comma,
            Some(';') => TokenKind::Semicolon,
            _ => TokenKind::Error(LexError::UnexpectedChar(c)),
        }
    }

    /// Read an identifier and intern it
    fn read_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek_char().is_some_and(unicode::is_id_continue) {
            self.next_char();
        }
        TokenKind::Ident(self.atoms.intern(&self.source[start..self.pos]))
    }

    /// Read a double-quoted string literal into the scratch region
    ///
    /// An out-of-range character is reported only after the closing quote
    /// has been consumed, so scanning resumes after the literal.
    fn read_string(&mut self) -> Result<StrSlice, LexError> {
        self.next_char(); // opening quote

        let mut bytes = Vec::new();
        let mut invalid = None;
        let mut escape = false;
        loop {
            let Some(c) = self.next_char() else {
                return Err(LexError::UnterminatedString);
            };
            if c == '\n' as u32 {
                return Err(LexError::UnterminatedString);
            }

            let byte = if escape {
                escape = false;
                match char::from_u32(c) {
                    Some('t') => b'\t',
                    Some('n') => b'\n',
                    Some('r') => b'\r',
                    Some('0') => 0,
                    _ => match u8::try_from(c) {
                        Ok(b) => b,
                        Err(_) => {
                            invalid.get_or_insert(c);
                            continue;
                        }
                    },
                }
            } else if c == '\\' as u32 {
                escape = true;
                continue;
            } else if c == '"' as u32 {
                break;
            } else {
                match u8::try_from(c) {
                    Ok(b) => b,
                    Err(_) => {
                        invalid.get_or_insert(c);
                        continue;
                    }
                }
            };
            bytes.push(byte);
        }

        if let Some(c) = invalid {
            return Err(LexError::InvalidCharInString(c));
        }
        self.scratch
            .alloc(&bytes)
            .ok_or(LexError::ScratchExhausted {
                capacity: self.scratch.capacity(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lex_all(source: &str) -> Vec<TokenKind> {
        let mut atoms = AtomTable::new();
        let mut scratch = StringScratch::default();
        let mut lexer = Lexer::new("test.js", source.as_bytes(), &mut atoms, &mut scratch);
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.kind == TokenKind::Eof {
                return kinds;
            }
            kinds.push(token.kind);
        }
    }

    fn lex_strings(source: &str) -> Vec<Result<Vec<u8>, LexError>> {
        let mut atoms = AtomTable::new();
        let mut scratch = StringScratch::default();
        let mut lexer = Lexer::new("test.js", source.as_bytes(), &mut atoms, &mut scratch);
        let mut out = Vec::new();
        loop {
            match lexer.next_token().kind {
                TokenKind::Eof => return out,
                TokenKind::Str(slice) => out.push(Ok(lexer.string_bytes(slice).to_vec())),
                TokenKind::Error(err) => out.push(Err(err)),
                _ => {}
            }
        }
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            lex_all(". ( ) + - * / , ;"),
            vec![
                TokenKind::Dot,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Comma,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_identifiers_are_interned() {
        let mut atoms = AtomTable::new();
        let mut scratch = StringScratch::default();
        let mut lexer = Lexer::new("test.js", b"foo _bar foo b4z", &mut atoms, &mut scratch);

        let kinds: Vec<_> = (0..4).map(|_| lexer.next_token().kind).collect();
        let TokenKind::Ident(first) = &kinds[0] else { panic!("expected identifier") };
        let TokenKind::Ident(third) = &kinds[2] else { panic!("expected identifier") };

        assert!(first.ptr_eq(third));
        assert!(matches!(&kinds[1], TokenKind::Ident(a) if a.as_bytes() == b"_bar"));
        assert!(matches!(&kinds[3], TokenKind::Ident(a) if a.as_bytes() == b"b4z"));
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        drop(lexer);
        assert_eq!(atoms.len(), 3);
    }

    #[test]
    fn test_unicode_identifier() {
        let kinds = lex_all("größe.ñ");
        assert!(matches!(&kinds[0], TokenKind::Ident(a) if a.as_bytes() == "größe".as_bytes()));
        assert_eq!(kinds[1], TokenKind::Dot);
        assert!(matches!(&kinds[2], TokenKind::Ident(a) if a.as_bytes() == "ñ".as_bytes()));
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            lex_strings(r#""hello" "" "a\tb\n\r\0" "q\"uote" "back\\slash""#),
            vec![
                Ok(b"hello".to_vec()),
                Ok(Vec::new()),
                Ok(b"a\tb\n\r\0".to_vec()),
                Ok(b"q\"uote".to_vec()),
                Ok(b"back\\slash".to_vec()),
            ]
        );
    }

    #[test]
    fn test_latin1_string_is_single_byte() {
        assert_eq!(lex_strings("\"é\""), vec![Ok(vec![0xE9])]);
    }

    #[test]
    fn test_string_rejects_wide_characters() {
        assert_eq!(
            lex_strings("\"a€b\" \"ok\""),
            vec![Err(LexError::InvalidCharInString(0x20AC)), Ok(b"ok".to_vec())]
        );
    }

    #[test]
    fn test_unterminated_strings() {
        assert_eq!(
            lex_strings("\"abc\n\"def\""),
            vec![Err(LexError::UnterminatedString), Ok(b"def".to_vec())]
        );
        assert_eq!(lex_strings("\"abc"), vec![Err(LexError::UnterminatedString)]);
        assert_eq!(lex_strings("\"abc\\"), vec![Err(LexError::UnterminatedString)]);
    }

    #[test]
    fn test_string_closing_at_end_of_input() {
        assert_eq!(lex_strings("\"end\""), vec![Ok(b"end".to_vec())]);
    }

    #[test]
    fn test_unexpected_character_is_fatal() {
        let kinds = lex_all("a # b");
        assert_eq!(kinds[1], TokenKind::Error(LexError::UnexpectedChar('#' as u32)));
        assert!(LexError::UnexpectedChar('#' as u32).is_fatal());
        assert!(!LexError::UnterminatedString.is_fatal());
    }

    #[test]
    fn test_scratch_exhaustion() {
        let mut atoms = AtomTable::new();
        let mut scratch = StringScratch::new(4);
        let mut lexer = Lexer::new("test.js", br#""abc" "de""#, &mut atoms, &mut scratch);

        assert!(matches!(lexer.next_token().kind, TokenKind::Str(_)));
        let err = lexer.next_token().kind;
        assert_eq!(err, TokenKind::Error(LexError::ScratchExhausted { capacity: 4 }));
    }

    #[test]
    fn test_comments() {
        let kinds = lex_all("a // line\n/* block\n */ . /* unterminated");
        assert_eq!(kinds.len(), 2);
        assert!(matches!(&kinds[0], TokenKind::Ident(a) if a.as_bytes() == b"a"));
        assert_eq!(kinds[1], TokenKind::Dot);
        assert_eq!(lex_all("a / b").len(), 3);
    }

    #[test]
    fn test_render_token() {
        let mut atoms = AtomTable::new();
        let mut scratch = StringScratch::default();
        let mut lexer = Lexer::new("test.js", b"log(\"a\\n\")", &mut atoms, &mut scratch);

        let rendered: Vec<String> = (0..5)
            .map(|_| {
                let token = lexer.next_token();
                lexer.render_token(&token)
            })
            .collect();
        assert_eq!(
            rendered,
            vec![
                "1:1 identifier 'log'",
                "1:4 '('",
                "1:5 string \"a\\x0A\"",
                "1:10 ')'",
                "1:11 end of input",
            ]
        );
    }

    #[test]
    fn test_positions() {
        let mut atoms = AtomTable::new();
        let mut scratch = StringScratch::default();
        let mut lexer = Lexer::new("test.js", b"ab\n  cd.e", &mut atoms, &mut scratch);

        let ab = lexer.next_token();
        assert_eq!((ab.start.line, ab.start.column), (1, 1));
        assert_eq!((ab.end.line, ab.end.column), (1, 3));

        let cd = lexer.next_token();
        assert_eq!((cd.start.line, cd.start.column), (2, 3));
        assert_eq!(cd.start.offset, 5);

        let dot = lexer.next_token();
        assert_eq!((dot.start.line, dot.start.column), (2, 5));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut atoms = AtomTable::new();
        let mut scratch = StringScratch::default();
        let mut lexer = Lexer::new("test.js", br#"a "s" ( b"#, &mut atoms, &mut scratch);

        let before = lexer.position();
        let peeked = lexer.peek_token(2);
        assert_eq!(peeked.kind, TokenKind::LParen);
        assert_eq!(lexer.position(), before);
        assert_eq!(lexer.scratch().used(), 0);

        let first = lexer.next_token();
        assert!(matches!(first.kind, TokenKind::Ident(_)));
        assert_eq!(lexer.peek_next(), lexer.peek_token(0));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut atoms = AtomTable::new();
        let mut scratch = StringScratch::default();
        let mut lexer = Lexer::new("test.js", br#""one" "two""#, &mut atoms, &mut scratch);

        let snapshot = lexer.snapshot();
        let one = lexer.next_token();
        let two = lexer.next_token();
        lexer.restore(snapshot);

        assert_eq!(lexer.next_token(), one);
        assert_eq!(lexer.next_token(), two);
        assert_eq!(lexer.scratch().used(), 6);
    }

    const PIECES: &[&str] = &[
        "foo", "bar", "_x", "\"s\"", "\"a\\nb\"", "\"\"", ".", "(", ")", "+", "-", "*", "/", ",",
        ";", "\"open\n", "/* c */", "// c\n",
    ];

    proptest! {
        #[test]
        fn prop_peek_matches_next(pieces in proptest::collection::vec(proptest::sample::select(PIECES), 0..24), k in 0usize..8) {
            let source = pieces.join(" ");
            let mut atoms = AtomTable::new();

            let direct: Vec<Token> = {
                let mut scratch = StringScratch::default();
                let mut lexer = Lexer::new("p.js", source.as_bytes(), &mut atoms, &mut scratch);
                (0..=k).map(|_| lexer.next_token()).collect()
            };

            let mut scratch = StringScratch::default();
            let mut lexer = Lexer::new("p.js", source.as_bytes(), &mut atoms, &mut scratch);
            let before = lexer.snapshot();
            let peeked = lexer.peek_token(k);
            prop_assert_eq!(lexer.snapshot(), before);

            let replayed: Vec<Token> = (0..=k).map(|_| lexer.next_token()).collect();
            prop_assert_eq!(&peeked, &replayed[k]);
            prop_assert_eq!(&replayed, &direct);
        }
    }
}
