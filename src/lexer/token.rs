#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,          // Program name, argument or redirect target
    Pipe,          // |
    RedirectIn,    // <
    RedirectOut,   // >
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,       // Word text with quotes removed
    pub span: (usize, usize), // Position info [start, end)
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: (usize, usize)) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }
}
