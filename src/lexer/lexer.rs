use crate::lexer::token::{Token, TokenKind};

use std::iter::Iterator;
use std::str;

/// Tokenizes WELT source. The lexer itself never fails: unknown input
/// becomes `TokenKind::Illegal` and is reported by the parser, so error
/// attribution stays in one place.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a [u8],
    current: usize,
    peek: usize,
    ch: u8,
    line: u32,
    line_has_tokens: bool,
}

/// Convenience wrapper: the full token stream, terminated by `Eof`.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = vec![];

    for token in Lexer::new(source.as_bytes()) {
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }

    tokens
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8]) -> Lexer<'a> {
        let mut lexer = Lexer {
            input,
            current: 0,
            peek: 0,
            ch: 0,
            line: 1,
            line_has_tokens: false,
        };

        lexer.read_char();

        lexer
    }

    fn read_char(&mut self) {
        if self.peek >= self.input.len() {
            self.ch = 0;
        } else {
            self.ch = self.input[self.peek];
        }
        self.current = self.peek;
        self.peek += 1;
    }

    fn peek_char(&self) -> u8 {
        if self.peek >= self.input.len() {
            0
        } else {
            self.input[self.peek]
        }
    }

    fn read_if_peek(&mut self, ch: u8, yes: TokenKind, no: TokenKind) -> TokenKind {
        if self.peek_char() == ch {
            self.read_char();
            yes
        } else {
            no
        }
    }

    fn read_while(&mut self, predicate: fn(u8) -> bool) -> &str {
        let position = self.current;

        while predicate(self.ch) {
            self.read_char()
        }

        str::from_utf8(&self.input[position..self.current]).unwrap()
    }

    fn skip_blanks(&mut self) {
        while self.ch == b' ' || self.ch == b'\t' || self.ch == b'\r' {
            self.read_char()
        }
    }

    fn skip_comment(&mut self) {
        while self.ch != b'\n' && self.ch != 0 {
            self.read_char()
        }
    }

    // A string literal runs to the closing quote on the same line. Escapes:
    // \n, \t, \", \\; any other escaped character stands for itself.
    fn read_string(&mut self) -> TokenKind {
        self.read_char(); // opening quote

        let mut value: Vec<u8> = vec![];

        loop {
            match self.ch {
                b'"' => {
                    self.read_char(); // closing quote
                    return TokenKind::Text(String::from_utf8_lossy(&value).into_owned());
                }
                b'\n' | 0 => {
                    return TokenKind::Illegal("unterminated string literal".to_string());
                }
                b'\\' => {
                    self.read_char();
                    match self.ch {
                        b'n' => value.push(b'\n'),
                        b't' => value.push(b'\t'),
                        b'\n' | 0 => {
                            return TokenKind::Illegal("unterminated string literal".to_string());
                        }
                        other => value.push(other),
                    }
                    self.read_char();
                }
                other => {
                    value.push(other);
                    self.read_char();
                }
            }
        }
    }

    fn read_word(&mut self) -> TokenKind {
        let word = self.read_while(is_word_char).to_uppercase();
        lookup_keyword(&word)
    }
}

fn lookup_keyword(word: &str) -> TokenKind {
    #[rustfmt::skip]
    let token = match word {
        "ERWACHE"     => TokenKind::Erwache,
        "VERNEINUNG"  => TokenKind::Verneinung,
        "DING"        => TokenKind::Ding,
        "VORSTELLUNG" => TokenKind::Vorstellung,
        "WILLE"       => TokenKind::Wille,
        "WENN"        => TokenKind::Wenn,
        "DANN"        => TokenKind::Dann,
        "SONST"       => TokenKind::Sonst,
        "SOLANGE"     => TokenKind::Solange,
        "ENDE"        => TokenKind::Ende,
        "MOD"         => TokenKind::Mod,
        _             => TokenKind::Illegal(format!("unexpected word `{}`", word)),
    };

    token
}

fn is_letter(ch: u8) -> bool {
    (ch as char).is_ascii_alphabetic() || (ch as char) == '_'
}

fn is_digit(ch: u8) -> bool {
    (ch as char).is_ascii_digit()
}

fn is_word_char(ch: u8) -> bool {
    is_letter(ch) || is_digit(ch)
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.skip_blanks();

            if self.ch == b';' {
                self.skip_comment();
                continue;
            }

            if self.ch == b'\n' {
                let line = self.line;
                self.read_char();
                self.line += 1;

                // Blank and comment-only lines produce nothing; at most one
                // newline token per source line reaches the parser.
                if self.line_has_tokens {
                    self.line_has_tokens = false;
                    return Some(Token::new(TokenKind::Newline, line));
                }
                continue;
            }

            let line = self.line;

            if self.ch == 0 {
                return Some(Token::new(TokenKind::Eof, line));
            }

            let kind = match self.ch {
                b'"' => {
                    let kind = self.read_string();
                    self.line_has_tokens = true;
                    return Some(Token::new(kind, line));
                }
                b'=' => TokenKind::Assign,
                b'+' => TokenKind::Plus,
                b'-' => TokenKind::Minus,
                b'*' => TokenKind::Asterisk,
                b'/' => TokenKind::Slash,
                b'<' => self.read_if_peek(b'=', TokenKind::Le, TokenKind::Lt),
                b'>' => self.read_if_peek(b'=', TokenKind::Ge, TokenKind::Gt),
                b'!' => self.read_if_peek(
                    b'=',
                    TokenKind::Neq,
                    TokenKind::Illegal("unexpected character `!`".to_string()),
                ),
                _ => {
                    if is_digit(self.ch) {
                        let kind = TokenKind::Int(self.read_while(is_digit).to_string());
                        self.line_has_tokens = true;
                        return Some(Token::new(kind, line));
                    } else if is_letter(self.ch) {
                        let kind = self.read_word();
                        self.line_has_tokens = true;
                        return Some(Token::new(kind, line));
                    } else {
                        TokenKind::Illegal(format!("unexpected character `{}`", self.ch as char))
                    }
                }
            };

            self.read_char();
            self.line_has_tokens = true;
            return Some(Token::new(kind, line));
        }
    }
}
