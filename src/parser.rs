use std::collections::HashMap;
use crate::ast::{self, Expression, Statement};
use crate::error::ParseError;
use crate::lexer;
use crate::parser_tracing::{NoopTracer, Tracer};
use crate::token::{Token, TokenType};
use lazy_static::lazy_static;


#[derive(PartialOrd, PartialEq, Debug, Copy, Clone)]
pub enum Precedence {
    Lowest = 0,
    Equals,
    // == or !=
    LessGreater,
    // >, <, >= or <=
    Sum,
    // + or -
    Product,
    // * or /
    Prefix,
    // -X or !X
    Call,         // myFunction(X)
}

lazy_static! {
    static ref PRECEDENCES: HashMap<TokenType, Precedence> = {
        let mut m = HashMap::new();
        m.insert(TokenType::Eq, Precedence::Equals);
        m.insert(TokenType::NotEq, Precedence::Equals);
        m.insert(TokenType::Lt, Precedence::LessGreater);
        m.insert(TokenType::Gt, Precedence::LessGreater);
        m.insert(TokenType::LtEq, Precedence::LessGreater);
        m.insert(TokenType::GtEq, Precedence::LessGreater);
        m.insert(TokenType::Plus, Precedence::Sum);
        m.insert(TokenType::Minus, Precedence::Sum);
        m.insert(TokenType::Slash, Precedence::Product);
        m.insert(TokenType::Asterisk, Precedence::Product);
        m.insert(TokenType::LParen, Precedence::Call);
        m
    };
}

type PrefixParseFn<'a, T> = fn(&mut Parser<'a, T>) -> Option<Expression>;
type InfixParseFn<'a, T> = fn(&mut Parser<'a, T>, Expression) -> Option<Expression>;

/// Pratt parser over a [`lexer::Lexer`].
///
/// Malformed input never aborts the parse: each problem is recorded as a
/// [`ParseError`] and parsing resumes at the next statement boundary. Check
/// [`Parser::errors`] before trusting the returned program.
pub struct Parser<'a, T: Tracer = NoopTracer> {
    l: lexer::Lexer<'a>,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<ParseError>,
    prefix_parse_fns: HashMap<TokenType, PrefixParseFn<'a, T>>,
    infix_parse_fns: HashMap<TokenType, InfixParseFn<'a, T>>,
    block_depth: usize,
    tracer: T,
}

impl<'a> Parser<'a> {
    pub fn new(l: lexer::Lexer<'a>) -> Parser<'a> {
        Parser::with_tracer(l, NoopTracer)
    }
}

impl<'a, T: Tracer> Parser<'a, T> {
    pub fn with_tracer(l: lexer::Lexer<'a>, tracer: T) -> Parser<'a, T> {
        let mut p = Parser {
            l,
            cur_token: Token::default(),
            peek_token: Token::default(),
            errors: Vec::new(),
            prefix_parse_fns: HashMap::new(),
            infix_parse_fns: HashMap::new(),
            block_depth: 0,
            tracer,
        };
        p.register_prefix(TokenType::Ident, Self::parse_identifier);
        p.register_prefix(TokenType::Int, Self::parse_integer_literal);
        p.register_prefix(TokenType::Float, Self::parse_float_literal);
        p.register_prefix(TokenType::String, Self::parse_string_literal);
        p.register_prefix(TokenType::True, Self::parse_boolean);
        p.register_prefix(TokenType::False, Self::parse_boolean);
        p.register_prefix(TokenType::Bang, Self::parse_prefix_expression);
        p.register_prefix(TokenType::Minus, Self::parse_prefix_expression);
        p.register_prefix(TokenType::LParen, Self::parse_grouped_expression);
        p.register_prefix(TokenType::If, Self::parse_if_expression);
        p.register_prefix(TokenType::Function, Self::parse_function_literal);

        p.register_infix(TokenType::Plus, Self::parse_infix_expression);
        p.register_infix(TokenType::Minus, Self::parse_infix_expression);
        p.register_infix(TokenType::Slash, Self::parse_infix_expression);
        p.register_infix(TokenType::Asterisk, Self::parse_infix_expression);
        p.register_infix(TokenType::Eq, Self::parse_infix_expression);
        p.register_infix(TokenType::NotEq, Self::parse_infix_expression);
        p.register_infix(TokenType::Lt, Self::parse_infix_expression);
        p.register_infix(TokenType::Gt, Self::parse_infix_expression);
        p.register_infix(TokenType::LtEq, Self::parse_infix_expression);
        p.register_infix(TokenType::GtEq, Self::parse_infix_expression);
        p.register_infix(TokenType::LParen, Self::parse_call_expression);

        // read two tokens so cur_token and peek_token are both populated
        p.next_token();
        p.next_token();
        p
    }

    fn register_prefix(&mut self, token_type: TokenType, func: PrefixParseFn<'a, T>) {
        self.prefix_parse_fns.insert(token_type, func);
    }

    fn register_infix(&mut self, token_type: TokenType, func: InfixParseFn<'a, T>) {
        self.infix_parse_fns.insert(token_type, func);
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    fn traced<R>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.tracer.trace(name);
        let result = f(self);
        self.tracer.untrace(name);
        result
    }

    fn next_token(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, self.l.next_token());
    }

    pub fn parse_program(&mut self) -> ast::Program {
        let mut program = ast::Program::default();

        while !self.cur_token_is(TokenType::Eof) {
            match self.parse_statement() {
                Some(statement) => program.statements.push(statement),
                None => self.synchronize(),
            }
            self.next_token();
        }

        program
    }

    /// Skips the rest of a malformed statement. Stops on its `;`, at or before
    /// the `}` closing the enclosing block, or before EOF.
    fn synchronize(&mut self) {
        loop {
            if self.cur_token_is(TokenType::Semicolon)
                || self.cur_token_is(TokenType::Eof)
                || self.peek_token_is(TokenType::Eof)
            {
                return;
            }
            if self.block_depth > 0
                && (self.cur_token_is(TokenType::RBrace) || self.peek_token_is(TokenType::RBrace))
            {
                return;
            }
            self.next_token();
        }
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.cur_token.token_type {
            TokenType::Let => self.parse_let_statement(),
            TokenType::Return => self.parse_return_statement(),
            TokenType::LBrace => self.parse_block_statement().map(Statement::Block),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        self.traced("parse_let_statement", |p| {
            let token = p.cur_token.clone();

            if !p.expect_peek(TokenType::Ident) {
                return None;
            }

            let name = p.cur_identifier();

            if !p.expect_peek(TokenType::Assign) {
                return None;
            }

            p.next_token();

            let value = p.parse_expression(Precedence::Lowest)?;

            if p.peek_token_is(TokenType::Semicolon) {
                p.next_token();
            }

            Some(Statement::Let { token, name, value })
        })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        self.traced("parse_return_statement", |p| {
            let token = p.cur_token.clone();

            p.next_token();

            let value = p.parse_expression(Precedence::Lowest)?;

            if p.peek_token_is(TokenType::Semicolon) {
                p.next_token();
            }

            Some(Statement::Return { token, value })
        })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        self.traced("parse_expression_statement", |p| {
            let token = p.cur_token.clone();

            let expression = p.parse_expression(Precedence::Lowest)?;

            if p.peek_token_is(TokenType::Semicolon) {
                p.next_token();
            }

            Some(Statement::Expression { token, expression })
        })
    }

    fn parse_block_statement(&mut self) -> Option<ast::BlockStatement> {
        self.traced("parse_block_statement", |p| {
            let mut block = ast::BlockStatement {
                token: p.cur_token.clone(),
                statements: Vec::new(),
            };

            p.block_depth += 1;
            p.next_token();

            while !p.cur_token_is(TokenType::RBrace) && !p.cur_token_is(TokenType::Eof) {
                match p.parse_statement() {
                    Some(stmt) => block.statements.push(stmt),
                    None => {
                        p.synchronize();
                        // the statement failed on the closing brace itself
                        if p.cur_token_is(TokenType::RBrace) {
                            continue;
                        }
                    }
                }
                p.next_token();
            }
            p.block_depth -= 1;

            if p.cur_token_is(TokenType::Eof) {
                p.errors.push(ParseError::UnexpectedToken {
                    expected: TokenType::RBrace,
                    got: TokenType::Eof,
                    line: p.cur_token.line,
                    column: p.cur_token.column,
                });
            }

            Some(block)
        })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        self.traced("parse_expression", |p| {
            let prefix = match p.prefix_parse_fns.get(&p.cur_token.token_type) {
                Some(prefix) => *prefix,
                None => {
                    p.no_prefix_parse_fn_error();
                    return None;
                }
            };

            let mut left_exp = prefix(p)?;

            while !p.peek_token_is(TokenType::Semicolon) && precedence < p.peek_precedence() {
                let infix = match p.infix_parse_fns.get(&p.peek_token.token_type) {
                    Some(infix) => *infix,
                    None => return Some(left_exp),
                };
                p.next_token();
                left_exp = infix(p, left_exp)?;
            }

            Some(left_exp)
        })
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        self.traced("parse_identifier", |p| Some(Expression::Identifier(p.cur_identifier())))
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        self.traced("parse_integer_literal", |p| {
            let token = p.cur_token.clone();
            match token.literal.parse::<i64>() {
                Ok(value) => Some(Expression::IntegerLiteral { token, value }),
                Err(_) => {
                    p.errors.push(ParseError::InvalidInteger {
                        line: token.line,
                        column: token.column,
                        literal: token.literal,
                    });
                    None
                }
            }
        })
    }

    fn parse_float_literal(&mut self) -> Option<Expression> {
        self.traced("parse_float_literal", |p| {
            let token = p.cur_token.clone();
            match token.literal.parse::<f64>() {
                Ok(value) => Some(Expression::FloatLiteral { token, value }),
                Err(_) => {
                    p.errors.push(ParseError::InvalidFloat {
                        line: token.line,
                        column: token.column,
                        literal: token.literal,
                    });
                    None
                }
            }
        })
    }

    fn parse_string_literal(&mut self) -> Option<Expression> {
        Some(Expression::StringLiteral {
            token: self.cur_token.clone(),
            value: self.cur_token.literal.clone(),
        })
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        self.traced("parse_boolean", |p| {
            Some(Expression::BooleanLiteral {
                token: p.cur_token.clone(),
                value: p.cur_token_is(TokenType::True),
            })
        })
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        self.traced("parse_prefix_expression", |p| {
            let token = p.cur_token.clone();
            let operator = token.literal.clone();

            p.next_token();
            let right = p.parse_expression(Precedence::Prefix)?;

            Some(Expression::Prefix {
                token,
                operator,
                right: Box::new(right),
            })
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        self.traced("parse_infix_expression", |p| {
            let token = p.cur_token.clone();
            let operator = token.literal.clone();

            // binding the right side at our own precedence keeps the operator left-associative
            let precedence = p.cur_precedence();
            p.next_token();
            let right = p.parse_expression(precedence)?;

            Some(Expression::Infix {
                token,
                left: Box::new(left),
                operator,
                right: Box::new(right),
            })
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let exp = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenType::RParen) {
            return None;
        }

        Some(exp)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        self.traced("parse_if_expression", |p| {
            let token = p.cur_token.clone();

            if !p.expect_peek(TokenType::LParen) {
                return None;
            }

            p.next_token();
            let condition = p.parse_expression(Precedence::Lowest)?;

            if !p.expect_peek(TokenType::RParen) {
                return None;
            }

            if !p.expect_peek(TokenType::LBrace) {
                return None;
            }

            let consequence = p.parse_block_statement()?;

            let mut alternative = None;
            if p.peek_token_is(TokenType::Else) {
                p.next_token();

                if !p.expect_peek(TokenType::LBrace) {
                    return None;
                }

                alternative = Some(p.parse_block_statement()?);
            }

            Some(Expression::If {
                token,
                condition: Box::new(condition),
                consequence,
                alternative,
            })
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        self.traced("parse_function_literal", |p| {
            let token = p.cur_token.clone();

            if !p.expect_peek(TokenType::LParen) {
                return None;
            }

            let parameters = p.parse_function_parameters()?;

            if !p.expect_peek(TokenType::LBrace) {
                return None;
            }

            let body = p.parse_block_statement()?;

            Some(Expression::FunctionLiteral { token, parameters, body })
        })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<ast::Identifier>> {
        self.traced("parse_function_parameters", |p| {
            let mut identifiers = Vec::new();

            if p.peek_token_is(TokenType::RParen) {
                p.next_token();
                return Some(identifiers);
            }

            if !p.expect_peek(TokenType::Ident) {
                return None;
            }
            identifiers.push(p.cur_identifier());

            while p.peek_token_is(TokenType::Comma) {
                p.next_token();
                if !p.expect_peek(TokenType::Ident) {
                    return None;
                }
                identifiers.push(p.cur_identifier());
            }

            if !p.expect_peek(TokenType::RParen) {
                return None;
            }

            Some(identifiers)
        })
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        self.traced("parse_call_expression", |p| {
            let token = p.cur_token.clone();
            let arguments = p.parse_expression_list(TokenType::RParen)?;
            Some(Expression::Call {
                token,
                function: Box::new(function),
                arguments,
            })
        })
    }

    fn parse_expression_list(&mut self, end: TokenType) -> Option<Vec<Expression>> {
        let mut list = Vec::new();

        if self.peek_token_is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token_is(TokenType::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }

        Some(list)
    }

    fn cur_identifier(&self) -> ast::Identifier {
        ast::Identifier::new(self.cur_token.clone(), self.cur_token.literal.clone())
    }

    fn peek_precedence(&self) -> Precedence {
        *PRECEDENCES.get(&self.peek_token.token_type).unwrap_or(&Precedence::Lowest)
    }

    fn cur_precedence(&self) -> Precedence {
        *PRECEDENCES.get(&self.cur_token.token_type).unwrap_or(&Precedence::Lowest)
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    fn no_prefix_parse_fn_error(&mut self) {
        self.errors.push(ParseError::NoPrefixParseFn {
            token_type: self.cur_token.token_type,
            line: self.cur_token.line,
            column: self.cur_token.column,
        });
    }

    fn peek_error(&mut self, expected: TokenType) {
        self.errors.push(ParseError::UnexpectedToken {
            expected,
            got: self.peek_token.token_type,
            line: self.peek_token.line,
            column: self.peek_token.column,
        });
    }

    fn cur_token_is(&self, t: TokenType) -> bool {
        self.cur_token.token_type == t
    }

    fn peek_token_is(&self, t: TokenType) -> bool {
        self.peek_token.token_type == t
    }

    fn expect_peek(&mut self, t: TokenType) -> bool {
        if self.peek_token_is(t) {
            self.next_token();
            true
        } else {
            self.peek_error(t);
            false
        }
    }
}
