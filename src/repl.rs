use std::io::{BufRead, ErrorKind};
use log::debug;
use crate::ast::CommandLine;
use crate::environment::Environment;
use crate::error::ShellError;
use crate::executor::{ExecOutcome, Executor};
use crate::lexer::Lexer;
use crate::parser::{DefaultParser, Parser};
use crate::prompt::ShellPrompt;

/// Status reported for a line that failed to parse.
const PARSE_ERROR_STATUS: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Terminate(i32),
}

pub fn parse_line(line: &str) -> Result<CommandLine, ShellError> {
    let tokens = Lexer::tokenize_all(line)?;
    Ok(DefaultParser::new(&tokens).parse()?)
}

/// The read / parse / dispatch loop.
pub struct Shell<E: Executor> {
    executor: E,
    env: Environment,
    prompt: ShellPrompt,
    last_status: i32,
}

impl<E: Executor> Shell<E> {
    pub fn new(executor: E, env: Environment, prompt: ShellPrompt) -> Self {
        Shell {
            executor,
            env,
            prompt,
            last_status: 0,
        }
    }

    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run until `exit` or end of input and return the shell's exit status.
    ///
    /// Only a failure to create processes or to read input ends the loop
    /// with an error.
    pub fn run<R: BufRead>(&mut self, mut input: R) -> Result<i32, ShellError> {
        let mut line = String::new();
        loop {
            if let Err(e) = self.prompt.show() {
                debug!("prompt not shown: {}", e);
            }

            line.clear();
            match input.read_line(&mut line) {
                Ok(0) => {
                    debug!("end of input");
                    self.prompt.finish();
                    return Ok(self.last_status);
                }
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    eprintln!("pipesh: {}", e);
                    self.last_status = 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            if let Step::Terminate(code) = self.execute_line(&line)? {
                return Ok(code);
            }
        }
    }

    /// Parse, classify and dispatch one line. The parsed command line is
    /// dropped before this returns.
    pub fn execute_line(&mut self, line: &str) -> Result<Step, ShellError> {
        let command_line = match parse_line(line) {
            Ok(command_line) => command_line,
            Err(e) => {
                eprintln!("pipesh: {}", e);
                self.last_status = PARSE_ERROR_STATUS;
                return Ok(Step::Continue);
            }
        };
        if command_line.is_empty() {
            return Ok(Step::Continue);
        }

        match self.executor.exec(&command_line, &mut self.env) {
            Ok(ExecOutcome::Code(code)) => {
                self.last_status = code;
                Ok(Step::Continue)
            }
            Ok(ExecOutcome::Exit(code)) => Ok(Step::Terminate(code.unwrap_or(self.last_status))),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                eprintln!("pipesh: {}", e);
                self.last_status = 1;
                Ok(Step::Continue)
            }
        }
    }
}
