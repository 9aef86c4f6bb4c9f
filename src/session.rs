use crate::env::{Env, Environment};
use crate::error::InterpretError;
use crate::eval::eval;
use crate::lexer::Lexer;
use crate::object::Object;
use crate::parser::Parser;

/// Runs successive pieces of source against one root scope, so bindings made
/// by an earlier run are visible to later ones.
pub struct Session {
    env: Env,
}

impl Session {
    pub fn new() -> Self {
        Session {
            env: Environment::new(),
        }
    }

    /// Lexes, parses and evaluates `source`.
    ///
    /// Any parse diagnostic rejects the whole input before evaluation starts,
    /// leaving the scope as it was. Runtime failures are not an `Err`: they come
    /// back as `Ok(Object::Error(..))`.
    pub fn run(&mut self, source: &str) -> Result<Object, InterpretError> {
        let lexer = Lexer::new(source);
        let mut p = Parser::new(lexer);
        let program = p.parse_program();
        if !p.errors().is_empty() {
            tracing::debug!(count = p.errors().len(), "rejecting input with parse errors");
            return Err(InterpretError::Parse(p.errors().to_vec()));
        }

        let result = eval(&program, &self.env);
        if result.is_error() {
            tracing::debug!(error = %result, "evaluation failed");
        }
        Ok(result)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}
