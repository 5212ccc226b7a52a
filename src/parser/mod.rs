pub mod default;

use thiserror::Error;
use crate::ast::CommandLine;

pub use default::DefaultParser;

pub trait Parser {
    fn parse(&mut self) -> Result<CommandLine, ParseError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing command before or after '|' at position {pos}")]
    EmptyStage { pos: usize },
    #[error("missing file name after '{op}' at position {pos}")]
    MissingRedirectTarget { op: String, pos: usize },
}
