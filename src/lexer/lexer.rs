use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;
use super::token::{Token, TokenKind};

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum LexError {
    #[error("unterminated quote '{0}' starting at position {1}")]
    UnterminatedQuote(char, usize),
    #[error("dangling escape at position {0}")]
    DanglingEscape(usize),
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        let Some(&(start, ch)) = self.chars.peek() else {
            let end = self.input.len();
            return Ok(Token::new(TokenKind::Eof, "", (end, end)));
        };

        let operator = match ch {
            '|' => Some(TokenKind::Pipe),
            '<' => Some(TokenKind::RedirectIn),
            '>' => Some(TokenKind::RedirectOut),
            _ => None,
        };
        if let Some(kind) = operator {
            self.chars.next();
            return Ok(Token::new(kind, ch.to_string(), (start, start + ch.len_utf8())));
        }

        self.read_word(start)
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.chars.next();
        }
    }

    fn read_word(&mut self, start: usize) -> Result<Token, LexError> {
        let mut buf = String::new();

        while let Some(&(pos, ch)) = self.chars.peek() {
            match ch {
                c if c.is_whitespace() => break,
                '|' | '<' | '>' => break,
                '\'' => {
                    self.chars.next();
                    self.read_single_quoted(pos, &mut buf)?;
                }
                '"' => {
                    self.chars.next();
                    self.read_double_quoted(pos, &mut buf)?;
                }
                '\\' => {
                    self.chars.next();
                    match self.chars.next() {
                        Some((_, escaped)) => buf.push(escaped),
                        None => return Err(LexError::DanglingEscape(pos)),
                    }
                }
                _ => {
                    buf.push(ch);
                    self.chars.next();
                }
            }
        }

        let end = self.position();
        Ok(Token::new(TokenKind::Word, buf, (start, end)))
    }

    fn read_single_quoted(&mut self, open: usize, buf: &mut String) -> Result<(), LexError> {
        for (_, ch) in self.chars.by_ref() {
            if ch == '\'' {
                return Ok(());
            }
            buf.push(ch);
        }
        Err(LexError::UnterminatedQuote('\'', open))
    }

    fn read_double_quoted(&mut self, open: usize, buf: &mut String) -> Result<(), LexError> {
        while let Some((_, ch)) = self.chars.next() {
            match ch {
                '"' => return Ok(()),
                '\\' => match self.chars.next() {
                    // Inside double quotes only these keep the backslash meaning
                    Some((_, c @ ('"' | '\\'))) => buf.push(c),
                    Some((_, c)) => {
                        buf.push('\\');
                        buf.push(c);
                    }
                    None => break,
                },
                _ => buf.push(ch),
            }
        }
        Err(LexError::UnterminatedQuote('"', open))
    }

    fn position(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(pos, _)| pos)
    }
}
