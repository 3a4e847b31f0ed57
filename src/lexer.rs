use crate::token::{Token, TokenKind, TokenType};
use custom_error::custom_error;
use tracing::trace;

custom_error! {
    #[derive(Clone, PartialEq)]
    pub LexError

    UnexpectedCharacter{line: usize, ch: char} = "line {line}: unexpected character '{ch}'",
    UnterminatedString{line: usize} = "line {line}: string not terminated (missing closing \")",
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            Self::UnexpectedCharacter { line, .. } => *line,
            Self::UnterminatedString { line } => *line,
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    start: usize,
    position: usize,
    line: usize,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alphanumeric(c: char) -> bool {
    is_letter(c) || c.is_ascii_digit()
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            start: 0,
            position: 0,
            line: 1,
            tokens: vec![],
            errors: vec![],
        }
    }

    /// Scans the whole input. The returned sequence always ends in an `Eof`
    /// token, even when lexical errors were found.
    pub fn scan(mut self) -> (Vec<Token>, Vec<LexError>) {
        while !self.at_end() {
            self.start = self.position;
            self.scan_token();
        }
        self.tokens.push(Token::new(TokenKind::Eof, "", self.line));

        trace!(
            tokens = self.tokens.len(),
            errors = self.errors.len(),
            "scanned source"
        );
        (self.tokens, self.errors)
    }

    fn at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn read_char(&mut self) -> char {
        let ch = self.input[self.position];
        self.position += 1;
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_second(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn next_is(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn lexeme(&self) -> String {
        self.input[self.start..self.position].iter().collect()
    }

    fn push(&mut self, kind: TokenKind) {
        let lexeme = self.lexeme();
        self.tokens.push(Token::new(kind, &lexeme, self.line));
    }

    fn push_either(&mut self, second: char, matched: TokenKind, single: TokenKind) {
        let kind = if self.next_is(second) { matched } else { single };
        self.push(kind);
    }

    fn scan_token(&mut self) {
        match self.read_char() {
            '(' => self.push(TokenKind::LParen),
            ')' => self.push(TokenKind::RParen),
            '{' => self.push(TokenKind::LBrace),
            '}' => self.push(TokenKind::RBrace),
            '[' => self.push(TokenKind::LBracket),
            ']' => self.push(TokenKind::RBracket),
            ',' => self.push(TokenKind::Comma),
            '.' => self.push(TokenKind::Dot),
            ';' => self.push(TokenKind::Semicolon),
            '+' => self.push(TokenKind::Plus),
            '-' => self.push(TokenKind::Minus),
            '*' => self.push(TokenKind::Asterisk),
            '/' => self.push(TokenKind::Slash),
            '!' => self.push_either('=', TokenKind::NotEq, TokenKind::Bang),
            '=' => self.push_either('=', TokenKind::Eq, TokenKind::Assign),
            '<' => self.push_either('=', TokenKind::LtEq, TokenKind::LT),
            '>' => self.push_either('=', TokenKind::GtEq, TokenKind::GT),
            '\n' => {
                if self.wants_end_of_line() {
                    self.push(TokenKind::Eol);
                }
                self.line += 1;
            }
            ' ' | '\t' | '\r' => {}
            '"' => self.read_string(),
            c if c.is_ascii_digit() => self.read_number(),
            c if is_letter(c) => self.read_identifier(),
            ch => self.errors.push(LexError::UnexpectedCharacter {
                line: self.line,
                ch,
            }),
        }
    }

    fn wants_end_of_line(&self) -> bool {
        match self.tokens.last() {
            Some(token) => !token.is(TokenType::Eol) && !token.is(TokenType::LBrace),
            None => false,
        }
    }

    fn read_string(&mut self) {
        let line = self.line;
        while let Some(c) = self.peek_char() {
            match c {
                '"' => break,
                '\\' => {
                    self.position += 1;
                    if self.peek_char() == Some('\n') {
                        self.line += 1;
                    }
                }
                '\n' => self.line += 1,
                _ => {}
            }
            self.position += 1;
        }

        if self.at_end() {
            self.errors.push(LexError::UnterminatedString { line });
            // Step past the end so the scan loop terminates.
            self.position = self.input.len() + 1;
            return;
        }

        // closing quote
        self.position += 1;
        let raw: String = self.input[self.start + 1..self.position - 1].iter().collect();
        let lexeme = self.lexeme();
        self.tokens
            .push(Token::new(TokenKind::Str(unescape(&raw)), &lexeme, line));
    }

    fn read_number(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.position += 1;
        }
        if self.peek_char() == Some('.') && self.peek_second().map_or(false, |c| c.is_ascii_digit())
        {
            self.position += 1;
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.position += 1;
            }
        }

        let lexeme = self.lexeme();
        // digits with at most one interior dot always parse
        let value = lexeme.parse::<f64>().unwrap_or_default();
        self.push(TokenKind::Number(value));
    }

    fn read_identifier(&mut self) {
        while self.peek_char().map_or(false, is_alphanumeric) {
            self.position += 1;
        }
        let lexeme = self.lexeme();
        self.push(TokenKind::from(lexeme.as_str()));
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn types(input: &str) -> Vec<TokenType> {
        let (tokens, errors) = Lexer::new(input).scan();
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        tokens.iter().map(Token::token_type).collect()
    }

    #[test]
    fn test_next_token() {
        let input = "let five = 5
let ten = 10.5

def add(x, y) {
  return x + y
}

let result = add(five, ten);
!-/*5 <= 10 >= 5 < 6 > 1
if five == 5 and ten != 9 or false then println(\"yes\") else print(none)
class B inherits A { }
do 3 times break
while true do self.x[0]
strof numof super
";

        let cases = [
            (TokenType::Let, "let"),
            (TokenType::Ident, "five"),
            (TokenType::Assign, "="),
            (TokenType::Number, "5"),
            (TokenType::Eol, "\n"),
            (TokenType::Let, "let"),
            (TokenType::Ident, "ten"),
            (TokenType::Assign, "="),
            (TokenType::Number, "10.5"),
            (TokenType::Eol, "\n"),
            (TokenType::Def, "def"),
            (TokenType::Ident, "add"),
            (TokenType::LParen, "("),
            (TokenType::Ident, "x"),
            (TokenType::Comma, ","),
            (TokenType::Ident, "y"),
            (TokenType::RParen, ")"),
            (TokenType::LBrace, "{"),
            (TokenType::Return, "return"),
            (TokenType::Ident, "x"),
            (TokenType::Plus, "+"),
            (TokenType::Ident, "y"),
            (TokenType::Eol, "\n"),
            (TokenType::RBrace, "}"),
            (TokenType::Eol, "\n"),
            (TokenType::Let, "let"),
            (TokenType::Ident, "result"),
            (TokenType::Assign, "="),
            (TokenType::Ident, "add"),
            (TokenType::LParen, "("),
            (TokenType::Ident, "five"),
            (TokenType::Comma, ","),
            (TokenType::Ident, "ten"),
            (TokenType::RParen, ")"),
            (TokenType::Semicolon, ";"),
            (TokenType::Eol, "\n"),
            (TokenType::Bang, "!"),
            (TokenType::Minus, "-"),
            (TokenType::Slash, "/"),
            (TokenType::Asterisk, "*"),
            (TokenType::Number, "5"),
            (TokenType::LtEq, "<="),
            (TokenType::Number, "10"),
            (TokenType::GtEq, ">="),
            (TokenType::Number, "5"),
            (TokenType::LT, "<"),
            (TokenType::Number, "6"),
            (TokenType::GT, ">"),
            (TokenType::Number, "1"),
            (TokenType::Eol, "\n"),
            (TokenType::If, "if"),
            (TokenType::Ident, "five"),
            (TokenType::Eq, "=="),
            (TokenType::Number, "5"),
            (TokenType::And, "and"),
            (TokenType::Ident, "ten"),
            (TokenType::NotEq, "!="),
            (TokenType::Number, "9"),
            (TokenType::Or, "or"),
            (TokenType::False, "false"),
            (TokenType::Then, "then"),
            (TokenType::Ident, "println"),
            (TokenType::LParen, "("),
            (TokenType::Str, "\"yes\""),
            (TokenType::RParen, ")"),
            (TokenType::Else, "else"),
            (TokenType::Ident, "print"),
            (TokenType::LParen, "("),
            (TokenType::NoneValue, "none"),
            (TokenType::RParen, ")"),
            (TokenType::Eol, "\n"),
            (TokenType::Class, "class"),
            (TokenType::Ident, "B"),
            (TokenType::Inherits, "inherits"),
            (TokenType::Ident, "A"),
            (TokenType::LBrace, "{"),
            (TokenType::RBrace, "}"),
            (TokenType::Eol, "\n"),
            (TokenType::Do, "do"),
            (TokenType::Number, "3"),
            (TokenType::Times, "times"),
            (TokenType::Break, "break"),
            (TokenType::Eol, "\n"),
            (TokenType::While, "while"),
            (TokenType::True, "true"),
            (TokenType::Do, "do"),
            (TokenType::SelfValue, "self"),
            (TokenType::Dot, "."),
            (TokenType::Ident, "x"),
            (TokenType::LBracket, "["),
            (TokenType::Number, "0"),
            (TokenType::RBracket, "]"),
            (TokenType::Eol, "\n"),
            (TokenType::StrOf, "strof"),
            (TokenType::NumOf, "numof"),
            (TokenType::Super, "super"),
            (TokenType::Eol, "\n"),
            (TokenType::Eof, ""),
        ];

        let (tokens, errors) = Lexer::new(input).scan();
        assert!(errors.is_empty());
        assert_eq!(tokens.len(), cases.len());

        for ((token_type, lexeme), token) in cases.iter().zip(tokens.iter()) {
            assert_eq!(token.token_type(), *token_type);
            assert_eq!(token.lexeme, *lexeme);
        }
    }

    #[test]
    fn test_blank_lines_and_open_braces_collapse_end_of_line() {
        assert_eq!(
            types("\n\nx\n\n\n{\n\ny\n}"),
            vec![
                TokenType::Ident,
                TokenType::Eol,
                TokenType::LBrace,
                TokenType::Ident,
                TokenType::Eol,
                TokenType::RBrace,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_line_numbers() {
        let (tokens, _) = Lexer::new("a\nb\n\n  c").scan();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 1, 2, 2, 4, 4]);
    }

    #[test]
    fn test_string_escapes() {
        let (tokens, errors) = Lexer::new(r#""a\tb\n\"q\" \\ \' \r\b\f \z""#).scan();
        assert!(errors.is_empty());
        assert_eq!(
            tokens[0].kind,
            TokenKind::Str("a\tb\n\"q\" \\ ' \r\u{8}\u{c} \\z".to_owned())
        );
    }

    #[test]
    fn test_multiline_string_advances_line() {
        let (tokens, _) = Lexer::new("\"one\ntwo\" x").scan();
        assert_eq!(tokens[0].kind, TokenKind::Str("one\ntwo".to_owned()));
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, errors) = Lexer::new("let s = \"abc").scan();
        assert_eq!(errors, vec![LexError::UnterminatedString { line: 1 }]);
        assert!(tokens.last().unwrap().is(TokenType::Eof));
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_unexpected_characters_are_reported_and_skipped() {
        let (tokens, errors) = Lexer::new("a @ b\n$ é").scan();
        assert_eq!(
            errors,
            vec![
                LexError::UnexpectedCharacter { line: 1, ch: '@' },
                LexError::UnexpectedCharacter { line: 2, ch: '$' },
                LexError::UnexpectedCharacter { line: 2, ch: 'é' },
            ]
        );
        let kinds: Vec<TokenType> = tokens.iter().map(Token::token_type).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::Ident,
                TokenType::Ident,
                TokenType::Eol,
                TokenType::Eof
            ]
        );
        assert_eq!(errors[0].line(), 1);
    }

    #[test]
    fn test_numbers_round_trip() {
        for literal in ["0", "7", "42.5", "3.14159", "1000000", "0.1", "123456789.000001"].iter() {
            let (tokens, _) = Lexer::new(literal).scan();
            match &tokens[0].kind {
                TokenKind::Number(n) => {
                    assert_eq!(*n, literal.parse::<f64>().unwrap());
                    assert_eq!(n.to_string().parse::<f64>().unwrap(), *n);
                }
                other => panic!("expected number, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_trailing_dot_is_not_part_of_number() {
        assert_eq!(
            types("1.x"),
            vec![
                TokenType::Number,
                TokenType::Dot,
                TokenType::Ident,
                TokenType::Eof
            ]
        );
    }
}
