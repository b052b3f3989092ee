use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
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

    /// Text used when reporting this token in a syntax error
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

/// All possible token types in Patito
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer literal (`CTE_INT`)
    Integer(i64),
    /// Floating-point literal (`CTE_FLOAT`)
    Float(f64),
    /// String literal (`CTE_STRING`), escapes already resolved
    String(String),

    /// Identifier
    Identifier(String),

    // Keywords
    /// PROGRAM keyword
    Program,
    /// VAR keyword
    Var,
    /// INT type keyword
    IntType,
    /// FLOAT type keyword
    FloatType,
    /// VOID keyword
    Void,
    /// MAIN keyword
    Main,
    /// IF keyword
    If,
    /// ELSE keyword
    Else,
    /// WHILE keyword
    While,
    /// DO keyword
    Do,
    /// PRINT keyword
    Print,
    /// END keyword
    End,
    /// RETURN keyword
    Return,

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// >
    Greater,
    /// <
    Less,
    /// !=
    NotEqual,
    /// =
    Assign,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// {
    LeftBrace,
    /// }
    RightBrace,
    /// [
    LeftBracket,
    /// ]
    RightBracket,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// :
    Colon,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Keyword for a word, `None` for an ordinary identifier
    ///
    /// Keywords are case-sensitive.
    pub fn keyword(s: &str) -> Option<TokenKind> {
        let kind = match s {
            "program" => TokenKind::Program,
            "var" => TokenKind::Var,
            "int" => TokenKind::IntType,
            "float" => TokenKind::FloatType,
            "void" => TokenKind::Void,
            "main" => TokenKind::Main,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "print" => TokenKind::Print,
            "end" => TokenKind::End,
            "return" => TokenKind::Return,
            _ => return None,
        };
        Some(kind)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Float(x) => write!(f, "{}", x),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Identifier(name) => write!(f, "{}", name),
            TokenKind::Eof => write!(f, "end of input"),
            other => write!(f, "{:?}", other),
        }
    }
}
