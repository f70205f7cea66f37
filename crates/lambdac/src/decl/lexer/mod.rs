//! Lexer for declaration files

mod token;
mod scanner;

pub use token::{Token, TokenKind};
pub(crate) use token::escape;
pub use scanner::Lexer;
