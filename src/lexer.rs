use super::token::{Token, TokenType};

pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    // current position in input (points to current char)
    read_position: usize,
    // current reading position in input (after current char)
    ch: u8,
    // current char under examination
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        let mut l = Lexer {
            input,
            position: 0,
            read_position: 0,
            ch: 0,
            line: 1,
            column: 0,
        };
        l.read_char();
        l
    }

    fn read_char(&mut self) {
        if self.read_position > self.input.len() {
            // Already parked on EOF.
            return;
        }
        if self.ch == b'\n' {
            self.line += 1;
            self.column = 0;
        }
        self.ch = self.input.as_bytes().get(self.read_position).copied().unwrap_or(0);
        // columns count characters, so UTF-8 continuation bytes do not advance them
        if !is_continuation_byte(self.ch) {
            self.column += 1;
        }
        self.position = self.read_position;
        self.read_position += 1;
    }

    fn peek_char(&self) -> u8 {
        self.input.as_bytes().get(self.read_position).copied().unwrap_or(0)
    }

    fn peek_back(&self) -> u8 {
        if self.position == 0 {
            0
        } else {
            self.input.as_bytes()[self.position - 1]
        }
    }

    fn read_identifier(&mut self) -> &'a str {
        let position = self.position;
        while is_letter(self.ch) {
            self.read_char();
        }
        &self.input[position..self.position]
    }

    /// Reads a run of digits that may contain one `.`, provided the `.` touches a digit.
    fn read_number(&mut self) -> &'a str {
        let start_position = self.position;
        let mut seen_dot = false;
        loop {
            if is_digit(self.ch) {
                self.read_char();
            } else if self.ch == b'.'
                && !seen_dot
                && (is_digit(self.peek_char()) || is_digit(self.peek_back()))
            {
                seen_dot = true;
                self.read_char();
            } else {
                break;
            }
        }
        &self.input[start_position..self.position]
    }

    fn read_string(&mut self) -> Result<&'a str, &'a str> {
        let quote_position = self.position;
        loop {
            self.read_char();
            if self.ch == b'"' {
                return Ok(&self.input[quote_position + 1..self.position]);
            }
            if self.ch == 0 && self.position >= self.input.len() {
                return Err(&self.input[quote_position..]);
            }
        }
    }

    fn read_illegal(&mut self) -> String {
        let c = self.input[self.position..].chars().next().unwrap_or(self.ch as char);
        let width = c.len_utf8();
        for _ in 1..width {
            self.read_char();
        }
        c.to_string()
    }

    fn two_char_token(&mut self, second: u8, matched: TokenType, single: TokenType) -> (TokenType, String) {
        if self.peek_char() == second {
            let first = self.ch;
            self.read_char();
            (matched, format!("{}{}", first as char, self.ch as char))
        } else {
            (single, (self.ch as char).to_string())
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;
        let single = |ch: u8, token_type: TokenType| (token_type, (ch as char).to_string());

        let (token_type, literal) = match self.ch {
            b'=' => self.two_char_token(b'=', TokenType::Eq, TokenType::Assign),
            b'!' => self.two_char_token(b'=', TokenType::NotEq, TokenType::Bang),
            b'<' => self.two_char_token(b'=', TokenType::LtEq, TokenType::Lt),
            b'>' => self.two_char_token(b'=', TokenType::GtEq, TokenType::Gt),
            b';' => single(self.ch, TokenType::Semicolon),
            b'(' => single(self.ch, TokenType::LParen),
            b')' => single(self.ch, TokenType::RParen),
            b',' => single(self.ch, TokenType::Comma),
            b'+' => single(self.ch, TokenType::Plus),
            b'-' => single(self.ch, TokenType::Minus),
            b'/' => single(self.ch, TokenType::Slash),
            b'*' => single(self.ch, TokenType::Asterisk),
            b'{' => single(self.ch, TokenType::LBrace),
            b'}' => single(self.ch, TokenType::RBrace),
            b'.' if is_digit(self.peek_char()) => {
                let literal = self.read_number();
                return Token::new(TokenType::lookup_number(literal), literal.to_string(), line, column);
            }
            b'.' => single(self.ch, TokenType::Dot),
            b'"' => match self.read_string() {
                Ok(literal) => (TokenType::String, literal.to_string()),
                Err(rest) => {
                    return Token::new(TokenType::Illegal, rest.to_string(), line, column);
                }
            },
            0 if self.position >= self.input.len() => {
                return Token::new(TokenType::Eof, String::new(), line, column);
            }
            ch if is_letter(ch) => {
                let literal = self.read_identifier();
                return Token::new(TokenType::lookup_ident(literal), literal.to_string(), line, column);
            }
            ch if is_digit(ch) => {
                let literal = self.read_number();
                return Token::new(TokenType::lookup_number(literal), literal.to_string(), line, column);
            }
            _ => (TokenType::Illegal, self.read_illegal()),
        };

        self.read_char();
        Token::new(token_type, literal, line, column)
    }

    fn skip_whitespace(&mut self) {
        while self.ch == b' ' || self.ch == b'\t' || self.ch == b'\n' || self.ch == b'\r' {
            self.read_char();
        }
    }
}

/// Yields every token up to, but not including, EOF.
impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let tok = self.next_token();
        if tok.token_type == TokenType::Eof {
            None
        } else {
            Some(tok)
        }
    }
}

fn is_letter(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_digit(ch: u8) -> bool {
    ch.is_ascii_digit()
}

fn is_continuation_byte(ch: u8) -> bool {
    ch & 0xC0 == 0x80
}
