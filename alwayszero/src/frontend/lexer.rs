use {
    crate::frontend::ParseError,
    core::fmt::{self, Display, Formatter},
};

/// Position of a token in the source, both 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Fn,
    Let,
    Call,
    Phi,
    Jump,
    Branch,
    Return,

    Ident(String),
    String(String),
    Integer(u64),
    Float(f64),

    /// `#[`
    AttributeStart,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Eq,
    Arrow,
    Star,
    Minus,

    Eof,
}

impl TokenKind {
    fn keyword(s: &str) -> Option<Self> {
        Some(match s {
            "fn" => Self::Fn,
            "let" => Self::Let,
            "call" => Self::Call,
            "phi" => Self::Phi,
            "jump" => Self::Jump,
            "branch" => Self::Branch,
            "return" => Self::Return,
            _ => return None,
        })
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fn => write!(f, "fn"),
            Self::Let => write!(f, "let"),
            Self::Call => write!(f, "call"),
            Self::Phi => write!(f, "phi"),
            Self::Jump => write!(f, "jump"),
            Self::Branch => write!(f, "branch"),
            Self::Return => write!(f, "return"),
            Self::Ident(s) => write!(f, "identifier `{s}`"),
            Self::String(s) => write!(f, "string {s:?}"),
            Self::Integer(i) => write!(f, "integer {i}"),
            Self::Float(v) => write!(f, "float {v:?}"),
            Self::AttributeStart => write!(f, "#["),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::LBrace => write!(f, "{{"),
            Self::RBrace => write!(f, "}}"),
            Self::LBracket => write!(f, "["),
            Self::RBracket => write!(f, "]"),
            Self::Comma => write!(f, ","),
            Self::Colon => write!(f, ":"),
            Self::Semicolon => write!(f, ";"),
            Self::Eq => write!(f, "="),
            Self::Arrow => write!(f, "->"),
            Self::Star => write!(f, "*"),
            Self::Minus => write!(f, "-"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenizes the whole input, the last token is always [`TokenKind::Eof`]
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if eof {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace_and_comments();

        let span = self.span();

        let Some(c) = self.advance() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span,
            });
        };

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '=' => TokenKind::Eq,
            '*' => TokenKind::Star,
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '#' => {
                if self.peek() != Some('[') {
                    return Err(ParseError::new(span, "expected `[` after `#`"));
                }
                self.advance();
                TokenKind::AttributeStart
            }
            '"' => self.lex_string(span)?,
            c if c.is_ascii_digit() => self.lex_number(c, span)?,
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_ident_or_keyword(c),
            c => return Err(ParseError::new(span, format!("unexpected character {c:?}"))),
        };

        Ok(Token { kind, span })
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;

        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(|c| c.is_whitespace()) {
                self.advance();
            }

            if self.peek() == Some('/') && self.peek_next() == Some('/') {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            return;
        }
    }

    fn lex_string(&mut self, span: Span) -> Result<TokenKind, ParseError> {
        let mut value = String::new();

        loop {
            match self.advance() {
                None => return Err(ParseError::new(span, "unterminated string literal")),
                Some('"') => return Ok(TokenKind::String(value)),
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some('\'') => value.push('\''),
                    Some(other) => {
                        return Err(ParseError::new(
                            span,
                            format!("unknown escape sequence `\\{other}`"),
                        ))
                    }
                    None => return Err(ParseError::new(span, "unterminated string literal")),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn lex_number(&mut self, first: char, span: Span) -> Result<TokenKind, ParseError> {
        let mut text = String::from(first);

        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            text.push(c);
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.advance();

            while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                text.push(c);
                self.advance();
            }

            return text
                .parse()
                .map(TokenKind::Float)
                .map_err(|_| ParseError::new(span, format!("invalid float literal `{text}`")));
        }

        text.parse()
            .map(TokenKind::Integer)
            .map_err(|_| ParseError::new(span, format!("integer literal `{text}` out of range")))
    }

    /// Identifiers may contain `.` after the first character (compiler
    /// temporaries such as `dummy_var.0`) and `-` when followed by a letter
    /// (mnemonics such as `cmp-eq`)
    fn lex_ident_or_keyword(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);

        while let Some(c) = self.peek() {
            let accept = c.is_ascii_alphanumeric()
                || c == '_'
                || c == '.'
                || (c == '-' && self.peek_next().is_some_and(|n| n.is_ascii_alphabetic()));

            if !accept {
                break;
            }

            text.push(c);
            self.advance();
        }

        TokenKind::keyword(&text).unwrap_or(TokenKind::Ident(text))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{Lexer, Span, TokenKind},
        pretty_assertions::assert_eq,
    };

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn declaration() {
        assert_eq!(
            kinds("#[user(\"alwayszero\")] fn bar() -> i32; // trailing"),
            vec![
                TokenKind::AttributeStart,
                TokenKind::Ident("user".into()),
                TokenKind::LParen,
                TokenKind::String("alwayszero".into()),
                TokenKind::RParen,
                TokenKind::RBracket,
                TokenKind::Fn,
                TokenKind::Ident("bar".into()),
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::Ident("i32".into()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn statements() {
        assert_eq!(
            kinds("dummy_var.0_3 = cmp-eq x_1, -2; y = 1.5;"),
            vec![
                TokenKind::Ident("dummy_var.0_3".into()),
                TokenKind::Eq,
                TokenKind::Ident("cmp-eq".into()),
                TokenKind::Ident("x_1".into()),
                TokenKind::Comma,
                TokenKind::Minus,
                TokenKind::Integer(2),
                TokenKind::Semicolon,
                TokenKind::Ident("y".into()),
                TokenKind::Eq,
                TokenKind::Float(1.5),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn positions() {
        let tokens = Lexer::new("fn\n  foo").tokenize().unwrap();
        assert_eq!(tokens[1].span, Span { line: 2, column: 3 });
    }

    #[test]
    fn errors_carry_position() {
        let err = Lexer::new("fn f() {\n  x = $;\n}").tokenize().unwrap_err();
        assert_eq!((err.line, err.column), (2, 7));

        assert!(Lexer::new("\"open").tokenize().is_err());
    }
}
