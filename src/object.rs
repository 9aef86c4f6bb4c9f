use std::fmt::{self, Debug, Display};
use std::rc::Rc;
use crate::ast;
use crate::env::Env;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Integer,
    Float,
    Boolean,
    Null,
    String,
    Error,
    Function,
    ReturnValue,
}

impl Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Integer => write!(f, "INTEGER"),
            ObjectType::Float => write!(f, "FLOAT"),
            ObjectType::Boolean => write!(f, "BOOLEAN"),
            ObjectType::Null => write!(f, "NULL"),
            ObjectType::String => write!(f, "STRING"),
            ObjectType::Error => write!(f, "ERROR"),
            ObjectType::Function => write!(f, "FUNCTION"),
            ObjectType::ReturnValue => write!(f, "RETURN_VALUE"),
        }
    }
}

/// A runtime value.
///
/// `Error` and `ReturnValue` are control markers as much as values: the
/// evaluator stops at the first one it sees and hands it outward unchanged.
#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Str(String),
    Null,
    Function(Rc<Function>),
    Error(String),
    ReturnValue(Box<Object>),
}

impl Object {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Integer(_) => ObjectType::Integer,
            Object::Float(_) => ObjectType::Float,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::Str(_) => ObjectType::String,
            Object::Null => ObjectType::Null,
            Object::Function(_) => ObjectType::Function,
            Object::Error(_) => ObjectType::Error,
            Object::ReturnValue(_) => ObjectType::ReturnValue,
        }
    }

    pub fn inspect(&self) -> String {
        self.to_string()
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    /// Everything except `false` and `null` counts as true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Null | Object::Boolean(false))
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(value) => write!(f, "{}", value),
            Object::Float(value) => write!(f, "{:.6}", value),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::Str(value) => f.write_str(value),
            Object::Null => f.write_str("null"),
            Object::Function(func) => write!(f, "{}", func),
            Object::Error(message) => f.write_str(message),
            Object::ReturnValue(value) => write!(f, "{}", value),
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::Float(a), Object::Float(b)) => a == b,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Str(a), Object::Str(b)) => a == b,
            (Object::Null, Object::Null) => true,
            // functions have identity, not structural equality
            (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),
            (Object::Error(a), Object::Error(b)) => a == b,
            (Object::ReturnValue(a), Object::ReturnValue(b)) => a == b,
            _ => false,
        }
    }
}

/// A closure: parameters and body plus the scope it was created in.
pub struct Function {
    pub parameters: Vec<ast::Identifier>,
    pub body: ast::BlockStatement,
    pub env: Env,
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameters.iter().map(|p| p.to_string()).collect();
        write!(f, "fn({}) {{ ... }}", params.join(", "))
    }
}

impl Debug for Function {
    // the captured scope may contain this very function
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("body", &self.body.to_string())
            .finish_non_exhaustive()
    }
}
