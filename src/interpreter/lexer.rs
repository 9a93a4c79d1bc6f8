use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::Chars;
use lazy_static::lazy_static;
use crate::util;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TokenKind {
    Identifier,
    Number, Text,
    True, False,

    // Keywords
    Var, Func, Class,
    If, Else, While,
    Return,

    Assign,
    Equal, NotEqual,
    Not,
    Less, LessEqual,
    Greater, GreaterEqual,
    And, Or,

    Plus, Minus, Star, Slash, Percent,

    ParenLeft, ParenRight,
    BraceLeft, BraceRight,
    Comma, Semicolon, Dot,

    Eof,
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, TokenKind> = {
        let mut keywords = HashMap::new();
        keywords.insert("var", TokenKind::Var);
        keywords.insert("func", TokenKind::Func);
        keywords.insert("class", TokenKind::Class);
        keywords.insert("if", TokenKind::If);
        keywords.insert("else", TokenKind::Else);
        keywords.insert("while", TokenKind::While);
        keywords.insert("true", TokenKind::True);
        keywords.insert("false", TokenKind::False);
        keywords.insert("return", TokenKind::Return);
        keywords
    };
}

/// Literal payload carried by `Number`, `Text`, `True`/`False` and
/// `Identifier` tokens (identifiers carry their name as `Text`).
#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Option<LiteralValue>,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, line: u32) -> Token {
        Token { kind, value: None, line }
    }

    pub fn with_value(kind: TokenKind, value: LiteralValue, line: u32) -> Token {
        Token { kind, value: Some(value), line }
    }

    /// The name carried by an identifier token.
    pub fn name(&self) -> &str {
        match &self.value {
            Some(LiteralValue::Text(name)) => name,
            _ => "",
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{:?}({:?})", self.kind, value),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LexerError {
    UnexpectedCharacter { line: u32, pos: usize, c: char },
    InvalidIntLiteral { line: u32 },
    InvalidFloatLiteral { line: u32 },
    UnterminatedString { line: u32 },
    UnterminatedEscape { line: u32 },
    InvalidEscape { line: u32, c: char },
    NewlineInString { line: u32 },
    LoneOperator { line: u32, c: char },
}

impl Display for LexerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LexerError::UnexpectedCharacter { line, pos, c } =>
                write!(f, "Unexpected character '{}' at line {} position {}", c, line, pos),
            LexerError::InvalidIntLiteral { line } =>
                write!(f, "Invalid integer literal at line {}", line),
            LexerError::InvalidFloatLiteral { line } =>
                write!(f, "Invalid float literal at line {}", line),
            LexerError::UnterminatedString { line } =>
                write!(f, "Unterminated string at line {}", line),
            LexerError::UnterminatedEscape { line } =>
                write!(f, "Unterminated escape sequence at line {}", line),
            LexerError::InvalidEscape { line, c } =>
                write!(f, "Invalid escape sequence '\\{}' at line {}", c, line),
            LexerError::NewlineInString { line } =>
                write!(f, "Unterminated string: newline not allowed without escape at line {}", line),
            LexerError::LoneOperator { line, c } =>
                write!(f, "Single '{}' is not supported at line {}", c, line),
        }
    }
}

type LexerResult<T> = Result<T, LexerError>;

/// Scans source text into a token sequence terminated by a single `Eof` token.
pub fn tokenize(source: &str) -> LexerResult<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.scan_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);

        if done {
            return Ok(tokens);
        }
    }
}

pub struct Lexer<'source> {
    input: &'source str,

    chars: Chars<'source>,
    peek_1: Option<char>,
    peek_2: Option<char>,

    start_index: usize,
    current_index: usize,

    line: u32,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Lexer<'source> {
        Lexer {
            input: source,

            chars: source.chars(),
            peek_1: None,
            peek_2: None,

            start_index: 0,
            current_index: 0,

            line: 1,
        }
    }

    pub fn scan_token(&mut self) -> LexerResult<Token> {
        self.skip_whitespace();
        self.start_index = self.current_index;

        let c = match self.consume() {
            Some(c) => c,
            None => return Ok(Token::new(TokenKind::Eof, self.line)),
        };

        if util::is_digit(c) {
            return self.scan_number();
        }

        if util::is_letter(c) {
            return Ok(self.scan_identifier());
        }

        if c == '"' {
            return self.scan_string();
        }

        match c {
            '+' => Ok(Token::new(TokenKind::Plus, self.line)),
            '-' => Ok(Token::new(TokenKind::Minus, self.line)),
            '*' => Ok(Token::new(TokenKind::Star, self.line)),
            '/' => Ok(Token::new(TokenKind::Slash, self.line)),
            '%' => Ok(Token::new(TokenKind::Percent, self.line)),

            '=' => Ok(if self.expect('=') { Token::new(TokenKind::Equal, self.line) } else {
                Token::new(TokenKind::Assign, self.line)
            }),
            '!' => Ok(if self.expect('=') { Token::new(TokenKind::NotEqual, self.line) } else {
                Token::new(TokenKind::Not, self.line)
            }),
            '<' => Ok(if self.expect('=') { Token::new(TokenKind::LessEqual, self.line) } else {
                Token::new(TokenKind::Less, self.line)
            }),
            '>' => Ok(if self.expect('=') { Token::new(TokenKind::GreaterEqual, self.line) } else {
                Token::new(TokenKind::Greater, self.line)
            }),

            // No bitwise operators exist, so a lone '&' or '|' has no meaning
            '&' => if self.expect('&') { Ok(Token::new(TokenKind::And, self.line)) } else {
                Err(LexerError::LoneOperator { line: self.line, c: '&' })
            },
            '|' => if self.expect('|') { Ok(Token::new(TokenKind::Or, self.line)) } else {
                Err(LexerError::LoneOperator { line: self.line, c: '|' })
            },

            '(' => Ok(Token::new(TokenKind::ParenLeft, self.line)),
            ')' => Ok(Token::new(TokenKind::ParenRight, self.line)),
            '{' => Ok(Token::new(TokenKind::BraceLeft, self.line)),
            '}' => Ok(Token::new(TokenKind::BraceRight, self.line)),
            ',' => Ok(Token::new(TokenKind::Comma, self.line)),
            ';' => Ok(Token::new(TokenKind::Semicolon, self.line)),
            '.' => Ok(Token::new(TokenKind::Dot, self.line)),

            _ => Err(LexerError::UnexpectedCharacter { line: self.line, pos: self.current_index, c }),
        }
    }

    fn scan_number(&mut self) -> LexerResult<Token> {
        while let Some('0'..='9') = self.peek() {
            let _ = self.consume();
        }

        if let Some('.') = self.peek() {
            // The decimal point must be followed by a digit
            match self.peek_next() {
                Some('0'..='9') => {},
                _ => return Err(LexerError::InvalidFloatLiteral { line: self.line }),
            }

            let _ = self.consume();

            while let Some('0'..='9') = self.peek() {
                let _ = self.consume();
            }

            let literal = &self.input[self.start_index..self.current_index];
            let number: f64 = literal.parse()
                .map_err(|_| LexerError::InvalidFloatLiteral { line: self.line })?;

            return Ok(Token::with_value(TokenKind::Number, LiteralValue::Float(number), self.line));
        }

        let literal = &self.input[self.start_index..self.current_index];
        // Only failure mode is an out-of-range value; the digits themselves
        // are already validated
        let number: i64 = literal.parse()
            .map_err(|_| LexerError::InvalidIntLiteral { line: self.line })?;

        Ok(Token::with_value(TokenKind::Number, LiteralValue::Int(number), self.line))
    }

    fn scan_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if !util::is_identifier_part(c) {
                break;
            }

            let _ = self.consume();
        }

        let name = &self.input[self.start_index..self.current_index];

        match KEYWORDS.get(name) {
            Some(TokenKind::True) => Token::with_value(TokenKind::True, LiteralValue::Bool(true), self.line),
            Some(TokenKind::False) => Token::with_value(TokenKind::False, LiteralValue::Bool(false), self.line),
            Some(&keyword) => Token::new(keyword, self.line),
            None => Token::with_value(TokenKind::Identifier, LiteralValue::Text(name.to_owned()), self.line),
        }
    }

    fn scan_string(&mut self) -> LexerResult<Token> {
        let mut text = String::new();

        loop {
            let c = match self.peek() {
                None => return Err(LexerError::UnterminatedString { line: self.line }),
                Some('"') => break,
                Some(c) => c,
            };
            let _ = self.consume();

            if c == '\\' {
                let escape = match self.consume() {
                    Some(escape) => escape,
                    None => return Err(LexerError::UnterminatedEscape { line: self.line }),
                };

                match escape {
                    'n' => text.push('\n'),
                    't' => text.push('\t'),
                    'r' => text.push('\r'),
                    'b' => text.push('\u{0008}'),
                    '"' => text.push('"'),
                    '\\' => text.push('\\'),
                    _ => return Err(LexerError::InvalidEscape { line: self.line, c: escape }),
                }
            } else if c == '\n' {
                return Err(LexerError::NewlineInString { line: self.line });
            } else {
                text.push(c);
            }
        }

        let _ = self.consume(); // the closing '"'
        Ok(Token::with_value(TokenKind::Text, LiteralValue::Text(text), self.line))
    }

    fn consume(&mut self) -> Option<char> {
        let next = if let Some(c) = self.peek_1.take() {
            self.peek_1 = self.peek_2.take();
            Some(c)
        } else {
            self.chars.next()
        };

        next.map(|c| {
            self.current_index += c.len_utf8();

            if c == '\n' {
                self.line += 1;
            }

            c
        })
    }

    fn peek(&mut self) -> Option<char> {
        if let Some(c) = self.peek_1 {
            Some(c)
        } else {
            self.peek_1 = self.chars.next();
            self.peek_1
        }
    }

    fn peek_next(&mut self) -> Option<char> {
        if self.peek_1.is_none() {
            self.peek_1 = self.chars.next();
            self.peek_1?;
        }

        if let Some(c) = self.peek_2 {
            Some(c)
        } else {
            self.peek_2 = self.chars.next();
            self.peek_2
        }
    }

    fn expect(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            let _ = self.consume();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                let _ = self.consume();
            } else if c == '/' && self.peek_next() == Some('/') {
                // A comment runs to the end of the line
                self.skip_line();
            } else {
                return;
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                return;
            }

            let _ = self.consume();
        }
    }
}

#[cfg(test)]
mod tests;
