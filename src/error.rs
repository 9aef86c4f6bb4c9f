use thiserror::Error;
use crate::token::TokenType;

/// A parse diagnostic. Parsing keeps going after one of these is recorded,
/// so a parser may hand back several alongside a partial program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected next token to be {expected}, got {got} instead at line {line}, column {column}")]
    UnexpectedToken {
        expected: TokenType,
        got: TokenType,
        line: usize,
        column: usize,
    },

    #[error("no prefix parse function for {token_type} found at line {line}, column {column}")]
    NoPrefixParseFn {
        token_type: TokenType,
        line: usize,
        column: usize,
    },

    #[error("could not parse {literal:?} as integer at line {line}, column {column}")]
    InvalidInteger {
        literal: String,
        line: usize,
        column: usize,
    },

    #[error("could not parse {literal:?} as float at line {line}, column {column}")]
    InvalidFloat {
        literal: String,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { line, .. }
            | ParseError::NoPrefixParseFn { line, .. }
            | ParseError::InvalidInteger { line, .. }
            | ParseError::InvalidFloat { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { column, .. }
            | ParseError::NoPrefixParseFn { column, .. }
            | ParseError::InvalidInteger { column, .. }
            | ParseError::InvalidFloat { column, .. } => *column,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpretError {
    #[error("{} parse error(s):\n{}", .0.len(), render_all(.0))]
    Parse(Vec<ParseError>),
}

fn render_all(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| format!("\t{}", e))
        .collect::<Vec<_>>()
        .join("\n")
}
