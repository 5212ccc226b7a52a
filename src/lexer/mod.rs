mod lexer;
mod token;

pub use lexer::{LexError, Lexer};
pub use token::{Token, TokenKind};

impl Lexer<'_> {
    pub fn tokenize_all(src: &str) -> Result<Vec<Token>, LexError> {
        Lexer::new(src).tokenize()
    }
}
