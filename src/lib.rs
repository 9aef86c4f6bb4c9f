pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod parser_tracing;
pub mod error;
pub mod eval;
pub mod object;
pub mod env;
pub mod session;

pub use ast::{Node, Program};
pub use env::{Env, Environment};
pub use error::{InterpretError, ParseError};
pub use eval::eval;
pub use lexer::Lexer;
pub use object::Object;
pub use parser::Parser;
pub use session::Session;

/// Starts lexing `source`; pull tokens with [`Lexer::next_token`] or iterate.
pub fn tokenize(source: &str) -> Lexer<'_> {
    Lexer::new(source)
}

/// Parses `source`, returning the program along with every diagnostic as text.
/// A non-empty diagnostic list means the program is incomplete.
pub fn parse(source: &str) -> (Program, Vec<String>) {
    let mut p = Parser::new(tokenize(source));
    let program = p.parse_program();
    (program, p.error_messages())
}
