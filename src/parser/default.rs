use std::path::PathBuf;
use crate::ast::{CommandLine, Stage};
use crate::lexer::{Token, TokenKind};
use super::{ParseError, Parser};

pub struct DefaultParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> DefaultParser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn at_end(&self) -> bool {
        self.peek().is_none_or(|t| t.kind == TokenKind::Eof)
    }

    fn current_offset(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.span.0)
    }

    fn expect_target(&mut self, op: &Token) -> Result<PathBuf, ParseError> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Word => {
                self.pos += 1;
                Ok(PathBuf::from(&t.lexeme))
            }
            _ => Err(ParseError::MissingRedirectTarget {
                op: op.lexeme.clone(),
                pos: op.span.0,
            }),
        }
    }
}

// line  := <empty> | stage ('|' stage)*
// stage := (WORD | '<' WORD | '>' WORD)+
impl Parser for DefaultParser<'_> {
    fn parse(&mut self) -> Result<CommandLine, ParseError> {
        if self.at_end() {
            return Ok(CommandLine::default());
        }

        // A stage only stops at '|' or the end of input.
        let mut stages = vec![self.parse_stage()?];
        while self.peek().is_some_and(|t| t.kind == TokenKind::Pipe) {
            self.pos += 1;
            stages.push(self.parse_stage()?);
        }
        Ok(CommandLine::new(stages))
    }
}

impl DefaultParser<'_> {
    fn parse_stage(&mut self) -> Result<Stage, ParseError> {
        let mut words = Vec::new();
        let mut input = None;
        let mut output = None;

        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::Word => {
                    words.push(tok.lexeme.clone());
                    self.pos += 1;
                }
                TokenKind::RedirectIn => {
                    self.pos += 1;
                    input = Some(self.expect_target(tok)?);
                }
                TokenKind::RedirectOut => {
                    self.pos += 1;
                    output = Some(self.expect_target(tok)?);
                }
                TokenKind::Pipe | TokenKind::Eof => break,
            }
        }

        let mut words = words.into_iter();
        let Some(program) = words.next() else {
            return Err(ParseError::EmptyStage { pos: self.current_offset() });
        };

        let mut stage = Stage::new(program, words.collect());
        if let Some(path) = input {
            stage = stage.with_input(path);
        }
        if let Some(path) = output {
            stage = stage.with_output(path);
        }
        Ok(stage)
    }
}
