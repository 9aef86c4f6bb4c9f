use std::fmt::{self, Display};
use crate::token;

/// Anything produced by the parser can report the literal of the token it started at.
pub trait Node: Display {
    fn token_literal(&self) -> String;
}


#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Node for Program {
    fn token_literal(&self) -> String {
        if let Some(first_statement) = self.statements.first() {
            first_statement.token_literal()
        } else {
            "".to_string()
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.statements {
            write!(f, "{}", s)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let {
        token: token::Token,
        name: Identifier,
        value: Expression,
    },
    Return {
        token: token::Token,
        // the 'return' token
        value: Expression,
    },
    Expression {
        token: token::Token,
        // the first token of the expression
        expression: Expression,
    },
    Block(BlockStatement),
}

impl Node for Statement {
    fn token_literal(&self) -> String {
        match self {
            Statement::Let { token, .. }
            | Statement::Return { token, .. }
            | Statement::Expression { token, .. } => token.literal.clone(),
            Statement::Block(block) => block.token_literal(),
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { token, name, value } => write!(f, "{} {} = {};", token.literal, name, value),
            Statement::Return { token, value } => write!(f, "{} {};", token.literal, value),
            Statement::Expression { expression, .. } => write!(f, "{}", expression),
            Statement::Block(block) => write!(f, "{}", block),
        }
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub token: token::Token,
    pub statements: Vec<Statement>,
}

impl Node for BlockStatement {
    fn token_literal(&self) -> String {
        self.token.literal.clone()
    }
}

impl Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.statements {
            write!(f, "{}", s)?;
        }
        Ok(())
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub token: token::Token,
    pub value: String,
}

impl Identifier {
    pub fn new(token: token::Token, value: String) -> Self {
        Identifier {
            token,
            value,
        }
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    IntegerLiteral {
        token: token::Token,
        value: i64,
    },
    FloatLiteral {
        token: token::Token,
        value: f64,
    },
    BooleanLiteral {
        token: token::Token,
        value: bool,
    },
    StringLiteral {
        token: token::Token,
        value: String,
    },
    Prefix {
        token: token::Token,
        operator: String,
        right: Box<Expression>,
    },
    Infix {
        token: token::Token,
        left: Box<Expression>,
        operator: String,
        right: Box<Expression>,
    },
    If {
        token: token::Token,
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    FunctionLiteral {
        token: token::Token,
        parameters: Vec<Identifier>,
        body: BlockStatement,
    },
    Call {
        token: token::Token,
        // the '(' token
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
}

impl Node for Expression {
    fn token_literal(&self) -> String {
        match self {
            Expression::Identifier(ident) => ident.token.literal.clone(),
            Expression::IntegerLiteral { token, .. }
            | Expression::FloatLiteral { token, .. }
            | Expression::BooleanLiteral { token, .. }
            | Expression::StringLiteral { token, .. }
            | Expression::Prefix { token, .. }
            | Expression::Infix { token, .. }
            | Expression::If { token, .. }
            | Expression::FunctionLiteral { token, .. }
            | Expression::Call { token, .. } => token.literal.clone(),
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(ident) => write!(f, "{}", ident),
            Expression::IntegerLiteral { token, .. }
            | Expression::FloatLiteral { token, .. }
            | Expression::BooleanLiteral { token, .. } => f.write_str(&token.literal),
            Expression::StringLiteral { value, .. } => write!(f, "\"{}\"", value),
            Expression::Prefix { operator, right, .. } => write!(f, "({}{})", operator, right),
            Expression::Infix { left, operator, right, .. } => write!(f, "({} {} {})", left, operator, right),
            Expression::If { condition, consequence, alternative, .. } => {
                write!(f, "if{} {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, "else {}", alternative)?;
                }
                Ok(())
            }
            Expression::FunctionLiteral { token, parameters, body } => {
                write!(f, "{}({}) {}", token.literal, join(parameters), body)
            }
            Expression::Call { function, arguments, .. } => {
                write!(f, "{}({})", function, join(arguments))
            }
        }
    }
}

fn join<T: Display>(items: &[T]) -> String {
    items.iter().map(|item| item.to_string()).collect::<Vec<_>>().join(", ")
}
