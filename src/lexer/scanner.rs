use crate::error::{Error, Result};
use crate::lexer::token::{Token, TokenKind};

/// Hand-written scanner for the restricted Python grammar.
///
/// Tokenizes one source text into a flat token stream. Block structure is
/// carried by synthetic `Indent`/`Dedent` tokens computed from leading
/// whitespace against an indentation stack (starting at `[0]`); indentation
/// is ignored while inside `()` or `[]` (implicit line continuation). Tabs
/// advance to the next 8-column stop.
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    at_line_start: bool,
    indent_stack: Vec<usize>,
    bracket_depth: usize,
    tokens: Vec<Token>,
}

impl Scanner {
    /// Creates a scanner over the given source text
    pub fn new(source: &str) -> Self {
        Scanner {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 0,
            at_line_start: true,
            indent_stack: vec![0],
            bracket_depth: 0,
            tokens: Vec::new(),
        }
    }

    /// Scans the whole source into tokens, ending with `Eof`
    pub fn scan_tokens(mut self) -> Result<Vec<Token>> {
        while !self.is_at_end() {
            if self.at_line_start && self.bracket_depth == 0 {
                self.scan_indentation()?;
                if self.is_at_end() {
                    break;
                }
            }
            self.scan_token()?;
        }

        // A source that does not end in a newline still terminates its last
        // logical line.
        if matches!(
            self.tokens.last().map(|t| &t.kind),
            Some(k) if !matches!(k, TokenKind::Newline)
        ) {
            self.push(TokenKind::Newline, String::new());
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, String::new());
        }
        self.push(TokenKind::Eof, String::new());
        Ok(self.tokens)
    }

    /// Measures leading whitespace and emits Indent/Dedent tokens.
    ///
    /// Blank and comment-only lines are consumed whole and never affect the
    /// indentation stack.
    fn scan_indentation(&mut self) -> Result<()> {
        loop {
            let mut width = 0usize;
            loop {
                match self.peek() {
                    Some(' ') => {
                        width += 1;
                        self.advance();
                    }
                    Some('\t') => {
                        width = (width / 8 + 1) * 8;
                        self.advance();
                    }
                    _ => break,
                }
            }
            match self.peek() {
                // Blank line: swallow and retry on the next one
                Some('\n') => {
                    self.advance();
                    continue;
                }
                Some('#') => {
                    while !matches!(self.peek(), Some('\n') | None) {
                        self.advance();
                    }
                    continue;
                }
                None => return Ok(()),
                _ => {}
            }
            let current = *self.indent_stack.last().unwrap_or(&0);
            if width > current {
                self.indent_stack.push(width);
                self.push(TokenKind::Indent, String::new());
            } else if width < current {
                while *self.indent_stack.last().unwrap_or(&0) > width {
                    self.indent_stack.pop();
                    self.push(TokenKind::Dedent, String::new());
                }
                if *self.indent_stack.last().unwrap_or(&0) != width {
                    return Err(Error::IndentationError {
                        line: self.line,
                        message: "dedent does not match any outer indentation level".to_string(),
                    });
                }
            }
            self.at_line_start = false;
            return Ok(());
        }
    }

    fn scan_token(&mut self) -> Result<()> {
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(()),
        };
        match c {
            ' ' | '\t' | '\r' => {
                self.advance();
            }
            '\n' => {
                self.advance();
                if self.bracket_depth == 0 {
                    self.push(TokenKind::Newline, String::new());
                    self.at_line_start = true;
                }
            }
            '#' => {
                while !matches!(self.peek(), Some('\n') | None) {
                    self.advance();
                }
            }
            '\'' | '"' => self.scan_string(c)?,
            '0'..='9' => self.scan_number()?,
            c if c.is_alphabetic() || c == '_' => self.scan_word(),
            _ => self.scan_operator()?,
        }
        Ok(())
    }

    fn scan_string(&mut self, quote: char) -> Result<()> {
        let (start_line, start_col) = (self.line, self.col + 1);
        self.advance();
        let triple = self.peek() == Some(quote) && self.peek_next() == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }
        let mut value = String::new();
        loop {
            let c = match self.peek() {
                Some(c) => c,
                None => return Err(Error::UnexpectedEof),
            };
            if triple {
                if c == quote && self.peek_next() == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.advance();
                    self.advance();
                    self.advance();
                    break;
                }
            } else if c == quote {
                self.advance();
                break;
            } else if c == '\n' {
                return Err(Error::syntax(
                    start_line,
                    start_col,
                    "unterminated string literal",
                ));
            }
            if c == '\\' {
                self.advance();
                let escaped = match self.peek() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('\\') => '\\',
                    Some('\'') => '\'',
                    Some('"') => '"',
                    Some(other) => other,
                    None => return Err(Error::UnexpectedEof),
                };
                value.push(escaped);
                self.advance();
            } else {
                value.push(c);
                self.advance();
            }
        }
        self.tokens.push(Token::new(
            TokenKind::Str(value.clone()),
            value,
            start_line,
            start_col,
        ));
        Ok(())
    }

    fn scan_number(&mut self) -> Result<()> {
        let (start_line, start_col) = (self.line, self.col + 1);
        let mut text = String::new();
        let mut is_float = false;
        while matches!(self.peek(), Some('0'..='9')) {
            text.push(self.advance());
        }
        if self.peek() == Some('.') && matches!(self.peek_next(), Some('0'..='9')) {
            is_float = true;
            text.push(self.advance());
            while matches!(self.peek(), Some('0'..='9')) {
                text.push(self.advance());
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let after = self.peek_next();
            let exp_digits = matches!(after, Some('0'..='9'))
                || (matches!(after, Some('+') | Some('-'))
                    && matches!(self.peek_at(2), Some('0'..='9')));
            if exp_digits {
                is_float = true;
                text.push(self.advance());
                if matches!(self.peek(), Some('+') | Some('-')) {
                    text.push(self.advance());
                }
                while matches!(self.peek(), Some('0'..='9')) {
                    text.push(self.advance());
                }
            }
        }
        let kind = if is_float {
            let x: f64 = text
                .parse()
                .map_err(|_| Error::syntax(start_line, start_col, "invalid float literal"))?;
            TokenKind::Float(x)
        } else {
            let n: i64 = text
                .parse()
                .map_err(|_| Error::syntax(start_line, start_col, "integer literal out of range"))?;
            TokenKind::Int(n)
        };
        self.tokens.push(Token::new(kind, text, start_line, start_col));
        Ok(())
    }

    fn scan_word(&mut self) {
        let (start_line, start_col) = (self.line, self.col + 1);
        let mut text = String::new();
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            text.push(self.advance());
        }
        let kind = TokenKind::keyword(&text).unwrap_or_else(|| TokenKind::Name(text.clone()));
        self.tokens.push(Token::new(kind, text, start_line, start_col));
    }

    fn scan_operator(&mut self) -> Result<()> {
        let (start_line, start_col) = (self.line, self.col + 1);
        let c = self.advance();
        let kind = match c {
            '(' => {
                self.bracket_depth += 1;
                TokenKind::LParen
            }
            ')' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                TokenKind::RParen
            }
            '[' => {
                self.bracket_depth += 1;
                TokenKind::LBracket
            }
            ']' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                TokenKind::RBracket
            }
            '@' => TokenKind::At,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '~' => TokenKind::Tilde,
            '+' => self.with_eq(TokenKind::PlusAssign, TokenKind::Plus),
            '%' => self.with_eq(TokenKind::PercentAssign, TokenKind::Percent),
            '&' => self.with_eq(TokenKind::AmpAssign, TokenKind::Amp),
            '^' => self.with_eq(TokenKind::CaretAssign, TokenKind::Caret),
            '|' => self.with_eq(TokenKind::PipeAssign, TokenKind::Pipe),
            '*' => self.with_eq(TokenKind::StarAssign, TokenKind::Star),
            '/' => self.with_eq(TokenKind::SlashAssign, TokenKind::Slash),
            '=' => self.with_eq(TokenKind::EqEq, TokenKind::Assign),
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    return Err(Error::syntax(start_line, start_col, "unexpected character `!`"));
                }
            }
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    self.with_eq(TokenKind::MinusAssign, TokenKind::Minus)
                }
            }
            '<' => match self.peek() {
                Some('<') => {
                    self.advance();
                    self.with_eq(TokenKind::LShiftAssign, TokenKind::LShift)
                }
                Some('=') => {
                    self.advance();
                    TokenKind::LtEq
                }
                _ => TokenKind::Lt,
            },
            '>' => match self.peek() {
                Some('>') => {
                    self.advance();
                    self.with_eq(TokenKind::RShiftAssign, TokenKind::RShift)
                }
                Some('=') => {
                    self.advance();
                    TokenKind::GtEq
                }
                _ => TokenKind::Gt,
            },
            other => {
                return Err(Error::syntax(
                    start_line,
                    start_col,
                    format!("unexpected character `{}`", other),
                ));
            }
        };
        self.tokens
            .push(Token::new(kind, String::new(), start_line, start_col));
        Ok(())
    }

    /// Consumes a trailing `=` and picks the compound form if present
    fn with_eq(&mut self, with: TokenKind, without: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            with
        } else {
            without
        }
    }

    fn push(&mut self, kind: TokenKind, lexeme: String) {
        self.tokens
            .push(Token::new(kind, lexeme, self.line, self.col + 1));
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.pos];
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        c
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}
