//! The tokenizer: a single forward pass turning source text into a flat
//! token sequence.

use svmc_util::{CompileError, CompileResult, Cursor, Interner, Origin};

use crate::token::{BinOpKind, CompOpKind, ParenKind, Token, TokenKind, UnOpKind};

/// The maximum byte length an identifier is allowed to keep; excess bytes
/// are silently truncated rather than rejected — matches the historical
/// behavior, a hard truncation rather than a Syntax error.
const MAX_IDENTIFIER_LEN: usize = 256;

pub struct Lexer<'src> {
    source: &'src str,
    chars: std::iter::Peekable<std::str::Chars<'src>>,
    byte_pos: usize,
    cursor: Cursor,
    prev: Option<Token>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
            byte_pos: 0,
            cursor: Cursor::new(),
            prev: None,
        }
    }

    /// Tokenize the entire input, returning the token sequence terminated
    /// by a trailing `TokenKind::Eof`.
    pub fn tokenize(mut self, interner: &mut Interner) -> CompileResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token(interner)?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            self.prev = Some(*tokens.last().unwrap());
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.byte_pos += ch.len_utf8();
        self.cursor.advance(ch);
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Would a `+`/`-` encountered right now be binary, given the previous
    /// token? Binary iff the previous token is a number, an identifier, or
    /// a closing round paren; unary (or the start of input) otherwise.
    fn prev_allows_binary_sign(&self) -> bool {
        self.prev
            .map(|t| t.allows_following_binary_sign())
            .unwrap_or(false)
    }

    fn next_token(&mut self, interner: &mut Interner) -> CompileResult<Token> {
        self.skip_whitespace();
        let origin = self.cursor.origin();

        let Some(ch) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, origin));
        };

        match ch {
            '(' => {
                self.bump();
                Ok(Token::new(
                    TokenKind::Parenthesis { kind: ParenKind::Round, open: true },
                    origin,
                ))
            }
            ')' => {
                self.bump();
                Ok(Token::new(
                    TokenKind::Parenthesis { kind: ParenKind::Round, open: false },
                    origin,
                ))
            }
            '{' => {
                self.bump();
                Ok(Token::new(
                    TokenKind::Parenthesis { kind: ParenKind::Curly, open: true },
                    origin,
                ))
            }
            '}' => {
                self.bump();
                Ok(Token::new(
                    TokenKind::Parenthesis { kind: ParenKind::Curly, open: false },
                    origin,
                ))
            }
            ',' => {
                self.bump();
                Ok(Token::new(TokenKind::Comma, origin))
            }
            ';' => {
                self.bump();
                Ok(Token::new(TokenKind::Semicolon, origin))
            }
            '*' => {
                self.bump();
                Ok(Token::new(TokenKind::BinOp(BinOpKind::Mul), origin))
            }
            '/' => {
                self.bump();
                Ok(Token::new(TokenKind::BinOp(BinOpKind::Div), origin))
            }
            '+' => {
                self.bump();
                let kind = if self.prev_allows_binary_sign() {
                    TokenKind::BinOp(BinOpKind::Add)
                } else {
                    TokenKind::UnOp(UnOpKind::Plus)
                };
                Ok(Token::new(kind, origin))
            }
            '-' => {
                self.bump();
                let kind = if self.prev_allows_binary_sign() {
                    TokenKind::BinOp(BinOpKind::Sub)
                } else {
                    TokenKind::UnOp(UnOpKind::Neg)
                };
                Ok(Token::new(kind, origin))
            }
            '<' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Token::new(TokenKind::CompOp(CompOpKind::Le), origin))
                } else {
                    Ok(Token::new(TokenKind::CompOp(CompOpKind::Lt), origin))
                }
            }
            '>' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Token::new(TokenKind::CompOp(CompOpKind::Ge), origin))
                } else {
                    Ok(Token::new(TokenKind::CompOp(CompOpKind::Gt), origin))
                }
            }
            '=' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Token::new(TokenKind::CompOp(CompOpKind::Eq), origin))
                } else {
                    Ok(Token::new(TokenKind::Assign, origin))
                }
            }
            '!' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Token::new(TokenKind::CompOp(CompOpKind::Ne), origin))
                } else {
                    Err(CompileError::syntax(origin, "unexpected character '!'"))
                }
            }
            c if c.is_ascii_digit() => self.lex_number(origin),
            c if c.is_alphabetic() => Ok(self.lex_identifier(origin, interner)),
            c => {
                self.bump();
                Err(CompileError::syntax(origin, format!("unexpected character '{c}'")))
            }
        }
    }

    /// Scans the longest prefix parseable as a decimal number, optionally
    /// with a fractional part and a signed exponent.
    fn lex_number(&mut self, origin: Origin) -> CompileResult<Token> {
        let start = self.byte_pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') {
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.bump();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.bump();
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        let text = &self.source[start..self.byte_pos];
        text.parse::<f64>()
            .map(|v| Token::new(TokenKind::Number(v), origin))
            .map_err(|_| CompileError::syntax(origin, format!("invalid numeric literal '{text}'")))
    }

    /// Scans an identifier or keyword. Identifiers longer than
    /// `MAX_IDENTIFIER_LEN` bytes are truncated, not rejected.
    fn lex_identifier(&mut self, origin: Origin, interner: &mut Interner) -> Token {
        let start = self.byte_pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric()) {
            self.bump();
        }
        let full = &self.source[start..self.byte_pos];
        let truncated = match full.char_indices().nth(MAX_IDENTIFIER_LEN) {
            Some((byte_idx, _)) => &full[..byte_idx],
            None => full,
        };
        Token::keyword_or_id(truncated, origin, interner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut interner = Interner::new();
        Lexer::new(src)
            .tokenize(&mut interner)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn plus_minus_disambiguation() {
        use TokenKind::*;
        let k = kinds("(+a - -b)");
        assert_eq!(
            k,
            vec![
                Parenthesis { kind: ParenKind::Round, open: true },
                UnOp(UnOpKind::Plus),
                Id(k.iter().find_map(|t| if let Id(s) = t { Some(*s) } else { None }).unwrap()),
                BinOp(BinOpKind::Sub),
                UnOp(UnOpKind::Neg),
                Id(k.iter().rev().find_map(|t| if let Id(s) = t { Some(*s) } else { None }).unwrap()),
                Parenthesis { kind: ParenKind::Round, open: false },
                Eof,
            ]
        );
    }

    #[test]
    fn closing_brace_does_not_enable_binary_sign() {
        let k = kinds("} -1");
        assert!(matches!(k[1], TokenKind::UnOp(UnOpKind::Neg)));
    }

    #[test]
    fn keywords_are_recognized() {
        let mut interner = Interner::new();
        let tokens = Lexer::new("func if else while var return")
            .tokenize(&mut interner)
            .unwrap();
        assert_eq!(tokens.len(), 7); // 6 keywords + eof
    }

    #[test]
    fn number_with_exponent() {
        let k = kinds("1.5e-3");
        assert!(matches!(k[0], TokenKind::Number(v) if (v - 1.5e-3).abs() < 1e-12));
    }

    #[test]
    fn long_identifier_is_truncated_not_rejected() {
        let mut interner = Interner::new();
        let long_name = "a".repeat(300);
        let tokens = Lexer::new(&long_name).tokenize(&mut interner).unwrap();
        if let TokenKind::Id(sym) = tokens[0].kind {
            assert_eq!(interner.resolve(sym).len(), 256);
        } else {
            panic!("expected identifier token");
        }
    }

    #[test]
    fn unknown_character_is_a_syntax_error() {
        let mut interner = Interner::new();
        let err = Lexer::new("@").tokenize(&mut interner).unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
    }
}
