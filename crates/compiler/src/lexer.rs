//! Lexical analysis for Delta source.
//!
//! Turns UTF-8 source text into a token stream, attaching the 1-based
//! source line to every token. Keywords and type words are rewritten on
//! identifier match; `true`/`false` become integer literals `1`/`0`;
//! char literals become integer literals carrying the ASCII value.

use crate::error::CompileError;
use crate::tokens::{Token, TokenKind, keyword_kind};
use crate::types::DataType;

pub struct Lexer {
    source: Vec<char>,
    position: usize,
    line: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            position: 0,
            line: 1,
        }
    }

    /// Tokenize the whole input.
    pub fn tokenize(mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() || c == '_' {
                tokens.push(self.lex_word());
            } else if c.is_ascii_digit() {
                tokens.push(self.lex_number());
            } else if c == '"' {
                tokens.push(self.lex_string()?);
            } else if c == '\'' {
                tokens.push(self.lex_char()?);
            } else if c == '/' && self.peek_at(1) == Some('/') {
                self.skip_line_comment();
            } else if c == '/' && self.peek_at(1) == Some('*') {
                self.skip_block_comment();
            } else if c.is_whitespace() {
                self.bump();
            } else {
                tokens.push(self.lex_punctuation()?);
            }
        }

        Ok(tokens)
    }

    fn lex_word(&mut self) -> Token {
        let line = self.line;
        let mut buf = String::new();
        buf.push(self.bump());
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                buf.push(self.bump());
            } else {
                break;
            }
        }

        if buf == "true" {
            return Token::with_text(TokenKind::IntLiteral, line, "1");
        }
        if buf == "false" {
            return Token::with_text(TokenKind::IntLiteral, line, "0");
        }
        if let Some(kind) = keyword_kind(&buf) {
            return Token::new(kind, line);
        }
        if DataType::from_name(&buf).is_some() {
            // Fold a trailing '*' into the type word: `int*` is one token.
            if self.peek() == Some('*') {
                self.bump();
                buf.push('*');
            }
            return Token::with_text(TokenKind::DataType, line, buf);
        }
        Token::with_text(TokenKind::Identifier, line, buf)
    }

    fn lex_number(&mut self) -> Token {
        let line = self.line;
        let mut buf = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                buf.push(self.bump());
            } else {
                break;
            }
        }

        // Fractional part makes it a float or double; trailing `f` picks float.
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            buf.push(self.bump());
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    buf.push(self.bump());
                } else {
                    break;
                }
            }
            if self.peek() == Some('f') {
                self.bump();
                return Token::with_text(TokenKind::FloatLiteral, line, buf);
            }
            return Token::with_text(TokenKind::DoubleLiteral, line, buf);
        }

        Token::with_text(TokenKind::IntLiteral, line, buf)
    }

    fn lex_string(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        self.bump(); // opening quote
        let mut buf = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(CompileError::lex("unterminated string literal", line));
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    let escaped = self
                        .peek()
                        .ok_or_else(|| CompileError::lex("unterminated string literal", line))?;
                    self.bump();
                    buf.push(unescape(escaped).ok_or_else(|| {
                        CompileError::lex(
                            format!("unknown escape sequence '\\{}'", escaped),
                            line,
                        )
                    })?);
                }
                Some(_) => buf.push(self.bump()),
            }
        }
        Ok(Token::with_text(TokenKind::StringLiteral, line, buf))
    }

    /// `'c'` lexes to an integer literal carrying the character's ASCII value.
    fn lex_char(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        self.bump(); // opening apostrophe
        let c = match self.peek() {
            None | Some('\'') => {
                return Err(CompileError::lex("empty character literal", line));
            }
            Some('\\') => {
                self.bump();
                let escaped = self
                    .peek()
                    .ok_or_else(|| CompileError::lex("unterminated character literal", line))?;
                self.bump();
                unescape(escaped).ok_or_else(|| {
                    CompileError::lex(format!("unknown escape sequence '\\{}'", escaped), line)
                })?
            }
            Some(_) => self.bump(),
        };
        if self.peek() != Some('\'') {
            return Err(CompileError::lex("unterminated character literal", line));
        }
        self.bump();
        Ok(Token::with_text(
            TokenKind::IntLiteral,
            line,
            (c as u32).to_string(),
        ))
    }

    fn skip_line_comment(&mut self) {
        self.bump();
        self.bump();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    /// `/* ... */`, non-nesting. A comment left open at end of input just
    /// consumes the rest of the source.
    fn skip_block_comment(&mut self) {
        self.bump();
        self.bump();
        while let Some(c) = self.peek() {
            if c == '*' && self.peek_at(1) == Some('/') {
                self.bump();
                self.bump();
                return;
            }
            self.bump();
        }
    }

    fn lex_punctuation(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        let c = self.bump();
        let kind = match c {
            // Multi-character forms first, matched greedily.
            '=' if self.peek() == Some('=') => {
                self.bump();
                TokenKind::DoubleEquals
            }
            '>' if self.peek() == Some('=') => {
                self.bump();
                TokenKind::GreaterEquals
            }
            '<' if self.peek() == Some('=') => {
                self.bump();
                TokenKind::LessEquals
            }
            '-' if self.peek() == Some('>') => {
                self.bump();
                TokenKind::Arrow
            }
            '.' if self.peek() == Some('.') && self.peek_at(1) == Some('.') => {
                self.bump();
                self.bump();
                TokenKind::Ellipsis
            }
            '=' => TokenKind::Equals,
            '>' => TokenKind::Greater,
            '<' => TokenKind::Less,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            '{' => TokenKind::OpenCurly,
            '}' => TokenKind::CloseCurly,
            '[' => TokenKind::OpenSquare,
            ']' => TokenKind::CloseSquare,
            '&' => TokenKind::Ampersand,
            '!' => TokenKind::Exclamation,
            '#' => TokenKind::Hash,
            _ => {
                return Err(CompileError::lex(
                    format!("unexpected character '{}'", c),
                    line,
                ));
            }
        };
        Ok(Token::new(kind, line))
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.position).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.source.get(self.position + ahead).copied()
    }

    /// Consume one character, advancing the line counter on newlines.
    fn bump(&mut self) -> char {
        let c = self.source[self.position];
        self.position += 1;
        if c == '\n' {
            self.line += 1;
        }
        c
    }
}

fn unescape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        '\'' => Some('\''),
        _ => None,
    }
}
