use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where the token appears (1-indexed)
    pub line: usize,
    /// Column number where the token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }
}

/// All token types of the restricted Python grammar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer literal
    Int(i64),
    /// Floating-point literal
    Float(f64),
    /// String literal (quotes stripped, escapes resolved)
    Str(String),
    /// `True` literal
    True,
    /// `False` literal
    False,
    /// `None` literal
    NoneLit,

    /// Identifier
    Name(String),

    // Keywords
    /// `def` keyword
    Def,
    /// `class` keyword
    Class,
    /// `if` keyword
    If,
    /// `elif` keyword
    Elif,
    /// `else` keyword
    Else,
    /// `while` keyword
    While,
    /// `for` keyword
    For,
    /// `in` keyword
    In,
    /// `return` keyword
    Return,
    /// `pass` keyword
    Pass,
    /// `break` keyword
    Break,
    /// `continue` keyword
    Continue,
    /// `and` keyword
    And,
    /// `or` keyword
    Or,
    /// `not` keyword
    Not,
    /// `import` keyword (recognized so the translator can reject it cleanly)
    Import,
    /// `from` keyword
    From,

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `<<`
    LShift,
    /// `>>`
    RShift,
    /// `&`
    Amp,
    /// `^`
    Caret,
    /// `|`
    Pipe,
    /// `~`
    Tilde,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `*=`
    StarAssign,
    /// `/=`
    SlashAssign,
    /// `%=`
    PercentAssign,
    /// `<<=`
    LShiftAssign,
    /// `>>=`
    RShiftAssign,
    /// `&=`
    AmpAssign,
    /// `^=`
    CaretAssign,
    /// `|=`
    PipeAssign,
    /// `->`
    Arrow,
    /// `@` (decorator marker)
    At,

    // Delimiters
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,

    // Layout
    /// End of a logical line
    Newline,
    /// Indentation increased by one block level
    Indent,
    /// Indentation decreased by one block level
    Dedent,
    /// End of file marker
    Eof,
}

impl TokenKind {
    /// Maps a word to its keyword token, if it is one
    pub fn keyword(word: &str) -> Option<TokenKind> {
        match word {
            "def" => Some(TokenKind::Def),
            "class" => Some(TokenKind::Class),
            "if" => Some(TokenKind::If),
            "elif" => Some(TokenKind::Elif),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "for" => Some(TokenKind::For),
            "in" => Some(TokenKind::In),
            "return" => Some(TokenKind::Return),
            "pass" => Some(TokenKind::Pass),
            "break" => Some(TokenKind::Break),
            "continue" => Some(TokenKind::Continue),
            "and" => Some(TokenKind::And),
            "or" => Some(TokenKind::Or),
            "not" => Some(TokenKind::Not),
            "import" => Some(TokenKind::Import),
            "from" => Some(TokenKind::From),
            "True" => Some(TokenKind::True),
            "False" => Some(TokenKind::False),
            "None" => Some(TokenKind::NoneLit),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "{}", n),
            TokenKind::Float(x) => write!(f, "{}", x),
            TokenKind::Str(s) => write!(f, "\"{}\"", s),
            TokenKind::Name(id) => write!(f, "{}", id),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Indent => write!(f, "indent"),
            TokenKind::Dedent => write!(f, "dedent"),
            TokenKind::Eof => write!(f, "end of file"),
            _ => write!(f, "{:?}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_detection() {
        assert_eq!(TokenKind::keyword("def"), Some(TokenKind::Def));
        assert_eq!(TokenKind::keyword("elif"), Some(TokenKind::Elif));
        assert_eq!(TokenKind::keyword("True"), Some(TokenKind::True));
        assert_eq!(TokenKind::keyword("lambda"), None);
    }
}
