//! Hand-written lexer for the LaForge domain language.
//!
//! Produces tokens carrying byte offsets plus line and column numbers for
//! diagnostics. Whitespace is insignificant; `//` and `/* */` comments are
//! skipped. Hook bodies are not tokenized: the parser asks the lexer for a
//! raw brace-balanced block instead.

use smol_str::SmolStr;

use crate::ast::Span;
use crate::error::{SchemaError, SchemaResult};

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token kind and payload.
    pub kind: TokenKind,
    /// Byte span in the source.
    pub span: Span,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

/// Token kinds of the domain language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Ident(SmolStr),
    /// Double-quoted string literal (unescaped content).
    Str(String),
    /// Backtick template string. Lexed so the policy parser can reject it
    /// with a precise diagnostic.
    TemplateStr,
    /// Numeric literal, raw text.
    Num(SmolStr),
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `:`
    Colon,
    /// `;`
    Semi,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `=>`
    Arrow,
    /// `===`
    EqEqEq,
    /// `==`
    EqEq,
    /// `!==`
    NeEqEq,
    /// `!=`
    NeEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Human-readable description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("`{}`", name),
            Self::Str(_) => "string literal".to_string(),
            Self::TemplateStr => "template string".to_string(),
            Self::Num(raw) => format!("`{}`", raw),
            Self::LBrace => "`{`".to_string(),
            Self::RBrace => "`}`".to_string(),
            Self::LParen => "`(`".to_string(),
            Self::RParen => "`)`".to_string(),
            Self::Colon => "`:`".to_string(),
            Self::Semi => "`;`".to_string(),
            Self::Comma => "`,`".to_string(),
            Self::Dot => "`.`".to_string(),
            Self::Arrow => "`=>`".to_string(),
            Self::EqEqEq => "`===`".to_string(),
            Self::EqEq => "`==`".to_string(),
            Self::NeEqEq => "`!==`".to_string(),
            Self::NeEq => "`!=`".to_string(),
            Self::Lt => "`<`".to_string(),
            Self::Le => "`<=`".to_string(),
            Self::Gt => "`>`".to_string(),
            Self::Ge => "`>=`".to_string(),
            Self::AndAnd => "`&&`".to_string(),
            Self::OrOr => "`||`".to_string(),
            Self::Bang => "`!`".to_string(),
            Self::Eof => "end of input".to_string(),
        }
    }
}

/// The lexer. Tokens are produced on demand.
pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over the given source.
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// The full source text, for error construction.
    pub fn source(&self) -> &str {
        self.src
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn skip_trivia(&mut self) -> SchemaResult<()> {
        loop {
            match self.peek_byte() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.bump();
                }
                Some(b'/') if self.peek_byte_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek_byte() {
                        if b == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some(b'/') if self.peek_byte_at(1) == Some(b'*') => {
                    let start = self.pos;
                    self.bump();
                    self.bump();
                    let mut closed = false;
                    while let Some(b) = self.peek_byte() {
                        if b == b'*' && self.peek_byte_at(1) == Some(b'/') {
                            self.bump();
                            self.bump();
                            closed = true;
                            break;
                        }
                        self.bump();
                    }
                    if !closed {
                        return Err(SchemaError::syntax(
                            self.src,
                            start,
                            2,
                            "unterminated block comment",
                        ));
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> SchemaResult<Token> {
        self.skip_trivia()?;

        let start = self.pos;
        let line = self.line;
        let column = self.column;

        let token = |kind: TokenKind, end: usize| Token {
            kind,
            span: Span::new(start, end),
            line,
            column,
        };

        let Some(b) = self.peek_byte() else {
            return Ok(token(TokenKind::Eof, start));
        };

        match b {
            b'{' => {
                self.bump();
                Ok(token(TokenKind::LBrace, self.pos))
            }
            b'}' => {
                self.bump();
                Ok(token(TokenKind::RBrace, self.pos))
            }
            b'(' => {
                self.bump();
                Ok(token(TokenKind::LParen, self.pos))
            }
            b')' => {
                self.bump();
                Ok(token(TokenKind::RParen, self.pos))
            }
            b':' => {
                self.bump();
                Ok(token(TokenKind::Colon, self.pos))
            }
            b';' => {
                self.bump();
                Ok(token(TokenKind::Semi, self.pos))
            }
            b',' => {
                self.bump();
                Ok(token(TokenKind::Comma, self.pos))
            }
            b'.' => {
                self.bump();
                Ok(token(TokenKind::Dot, self.pos))
            }
            b'=' => {
                self.bump();
                match self.peek_byte() {
                    Some(b'>') => {
                        self.bump();
                        Ok(token(TokenKind::Arrow, self.pos))
                    }
                    Some(b'=') => {
                        self.bump();
                        if self.peek_byte() == Some(b'=') {
                            self.bump();
                            Ok(token(TokenKind::EqEqEq, self.pos))
                        } else {
                            Ok(token(TokenKind::EqEq, self.pos))
                        }
                    }
                    _ => Err(SchemaError::syntax(
                        self.src,
                        start,
                        1,
                        "unexpected `=`; did you mean `==`?",
                    )),
                }
            }
            b'!' => {
                self.bump();
                if self.peek_byte() == Some(b'=') {
                    self.bump();
                    if self.peek_byte() == Some(b'=') {
                        self.bump();
                        Ok(token(TokenKind::NeEqEq, self.pos))
                    } else {
                        Ok(token(TokenKind::NeEq, self.pos))
                    }
                } else {
                    Ok(token(TokenKind::Bang, self.pos))
                }
            }
            b'<' => {
                self.bump();
                if self.peek_byte() == Some(b'=') {
                    self.bump();
                    Ok(token(TokenKind::Le, self.pos))
                } else {
                    Ok(token(TokenKind::Lt, self.pos))
                }
            }
            b'>' => {
                self.bump();
                if self.peek_byte() == Some(b'=') {
                    self.bump();
                    Ok(token(TokenKind::Ge, self.pos))
                } else {
                    Ok(token(TokenKind::Gt, self.pos))
                }
            }
            b'&' => {
                self.bump();
                if self.peek_byte() == Some(b'&') {
                    self.bump();
                    Ok(token(TokenKind::AndAnd, self.pos))
                } else {
                    Err(SchemaError::syntax(self.src, start, 1, "unexpected `&`"))
                }
            }
            b'|' => {
                self.bump();
                if self.peek_byte() == Some(b'|') {
                    self.bump();
                    Ok(token(TokenKind::OrOr, self.pos))
                } else {
                    Err(SchemaError::syntax(self.src, start, 1, "unexpected `|`"))
                }
            }
            b'"' => {
                let value = self.lex_string(start)?;
                Ok(token(TokenKind::Str(value), self.pos))
            }
            b'`' => {
                self.bump();
                while let Some(b) = self.peek_byte() {
                    self.bump();
                    if b == b'`' {
                        return Ok(token(TokenKind::TemplateStr, self.pos));
                    }
                }
                Err(SchemaError::syntax(
                    self.src,
                    start,
                    1,
                    "unterminated template string",
                ))
            }
            b'0'..=b'9' => {
                while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
                    self.bump();
                }
                if self.peek_byte() == Some(b'.')
                    && matches!(self.peek_byte_at(1), Some(b'0'..=b'9'))
                {
                    self.bump();
                    while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
                        self.bump();
                    }
                }
                let raw = SmolStr::new(&self.src[start..self.pos]);
                Ok(token(TokenKind::Num(raw), self.pos))
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                while matches!(
                    self.peek_byte(),
                    Some(b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')
                ) {
                    self.bump();
                }
                let name = SmolStr::new(&self.src[start..self.pos]);
                Ok(token(TokenKind::Ident(name), self.pos))
            }
            other => Err(SchemaError::syntax(
                self.src,
                start,
                1,
                format!("unexpected character `{}`", other as char),
            )),
        }
    }

    fn lex_string(&mut self, start: usize) -> SchemaResult<String> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek_byte() {
                None | Some(b'\n') => {
                    return Err(SchemaError::syntax(
                        self.src,
                        start,
                        self.pos - start,
                        "unterminated string literal",
                    ));
                }
                Some(b'"') => {
                    self.bump();
                    return Ok(value);
                }
                Some(b'\\') => {
                    self.bump();
                    match self.bump() {
                        Some(b'n') => value.push('\n'),
                        Some(b't') => value.push('\t'),
                        Some(b'"') => value.push('"'),
                        Some(b'\\') => value.push('\\'),
                        Some(other) => {
                            return Err(SchemaError::syntax(
                                self.src,
                                self.pos - 2,
                                2,
                                format!("unknown escape `\\{}`", other as char),
                            ));
                        }
                        None => {
                            return Err(SchemaError::syntax(
                                self.src,
                                start,
                                self.pos - start,
                                "unterminated string literal",
                            ));
                        }
                    }
                }
                Some(_) => {
                    // copy the full UTF-8 character, not just the lead byte
                    let ch_start = self.pos;
                    let ch = self.src[ch_start..].chars().next().unwrap_or('\u{FFFD}');
                    for _ in 0..ch.len_utf8() {
                        self.bump();
                    }
                    value.push(ch);
                }
            }
        }
    }

    /// Capture a raw brace-balanced block. The caller must have consumed
    /// the opening `{` as its most recent token. Strings and comments
    /// inside the block are respected so braces within them do not count.
    /// Returns the body text (trimmed) and its span; the lexer is left
    /// positioned just past the closing `}`.
    pub fn raw_block(&mut self) -> SchemaResult<(String, Span)> {
        let start = self.pos;
        let mut depth = 1usize;

        while let Some(b) = self.peek_byte() {
            match b {
                b'{' => {
                    self.bump();
                    depth += 1;
                }
                b'}' => {
                    let brace_pos = self.pos;
                    self.bump();
                    depth -= 1;
                    if depth == 0 {
                        let body = self.src[start..brace_pos].trim().to_string();
                        return Ok((body, Span::new(start, brace_pos)));
                    }
                }
                b'"' | b'\'' | b'`' => {
                    let quote = b;
                    self.bump();
                    while let Some(inner) = self.peek_byte() {
                        if inner == b'\\' {
                            self.bump();
                            self.bump();
                            continue;
                        }
                        self.bump();
                        if inner == quote {
                            break;
                        }
                    }
                }
                b'/' if self.peek_byte_at(1) == Some(b'/') => {
                    while let Some(inner) = self.peek_byte() {
                        if inner == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                b'/' if self.peek_byte_at(1) == Some(b'*') => {
                    self.bump();
                    self.bump();
                    while let Some(inner) = self.peek_byte() {
                        if inner == b'*' && self.peek_byte_at(1) == Some(b'/') {
                            self.bump();
                            self.bump();
                            break;
                        }
                        self.bump();
                    }
                }
                _ => {
                    self.bump();
                }
            }
        }

        Err(SchemaError::syntax(
            self.src,
            start.saturating_sub(1),
            1,
            "unbalanced braces in block",
        ))
    }
}
