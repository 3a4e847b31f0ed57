use strum_macros::{Display, EnumDiscriminants};

#[derive(Debug, Display, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(derive(Hash, Display))]
#[strum_discriminants(name(TokenType))]
pub enum TokenKind {
    Eof,
    Eol,

    // Identifiers and literals
    Ident(String),
    Number(f64),
    Str(String),

    // Operators
    Assign,
    Plus,
    Minus,
    Slash,
    Asterisk,
    Bang,
    LT,
    GT,
    LtEq,
    GtEq,
    Eq,
    NotEq,

    // Delimiters
    Comma,
    Dot,
    Semicolon,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Keywords
    And,
    Break,
    Class,
    Def,
    Do,
    Else,
    False,
    For,
    If,
    Inherits,
    Let,
    NoneValue,
    NumOf,
    Or,
    Return,
    SelfValue,
    StrOf,
    Super,
    Then,
    Times,
    True,
    While,
}

impl From<&str> for TokenKind {
    fn from(text: &str) -> Self {
        match text {
            "and" => Self::And,
            "break" => Self::Break,
            "class" => Self::Class,
            "def" => Self::Def,
            "do" => Self::Do,
            "else" => Self::Else,
            "false" => Self::False,
            "for" => Self::For,
            "if" => Self::If,
            "inherits" => Self::Inherits,
            "let" => Self::Let,
            "none" => Self::NoneValue,
            "numof" => Self::NumOf,
            "or" => Self::Or,
            "return" => Self::Return,
            "self" => Self::SelfValue,
            "strof" => Self::StrOf,
            "super" => Self::Super,
            "then" => Self::Then,
            "times" => Self::Times,
            "true" => Self::True,
            "while" => Self::While,
            identifier => Self::Ident(identifier.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: &str, line: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.to_owned(),
            line,
        }
    }

    pub fn is(&self, token_type: TokenType) -> bool {
        self.token_type() == token_type
    }

    pub fn token_type(&self) -> TokenType {
        TokenType::from(&self.kind)
    }

    /// How the token reads in an error message.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_owned(),
            TokenKind::Eol => "end of line".to_owned(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keywords_override_identifiers() {
        let cases = [
            ("let", TokenType::Let),
            ("inherits", TokenType::Inherits),
            ("self", TokenType::SelfValue),
            ("none", TokenType::NoneValue),
            ("strof", TokenType::StrOf),
            ("times", TokenType::Times),
            ("println", TokenType::Ident),
            ("letter", TokenType::Ident),
        ];

        for (text, expected) in cases.iter() {
            assert_eq!(TokenType::from(&TokenKind::from(*text)), *expected);
        }
    }

    #[test]
    fn test_describe() {
        assert_eq!(Token::new(TokenKind::Eof, "", 3).describe(), "end of input");
        assert_eq!(Token::new(TokenKind::RParen, ")", 3).describe(), "')'");
    }
}
