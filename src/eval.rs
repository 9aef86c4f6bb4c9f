use std::rc::Rc;
use crate::ast::{self, Expression, Statement};
use crate::env::{Env, Environment};
use crate::object::{Function, Object};

/// `Ok` is an ordinary value. `Err` carries an `Object::Error` or an
/// `Object::ReturnValue` that must unwind to the nearest call boundary.
type EvalResult = Result<Object, Object>;

/// Evaluates `program` against `env`, which persists any top-level `let` bindings.
pub fn eval(program: &ast::Program, env: &Env) -> Object {
    match eval_statements(&program.statements, env) {
        Ok(obj) => obj,
        Err(obj) => unwrap_return_value(obj),
    }
}

fn eval_statements(stmts: &[Statement], env: &Env) -> EvalResult {
    let mut result = Object::Null;
    for statement in stmts {
        result = eval_statement(statement, env)?;
    }
    Ok(result)
}

fn eval_statement(stmt: &Statement, env: &Env) -> EvalResult {
    match stmt {
        Statement::Expression { expression, .. } => eval_expression(expression, env),
        Statement::Block(block) => eval_statements(&block.statements, env),
        Statement::Return { value, .. } => {
            let val = eval_expression(value, env)?;
            Err(Object::ReturnValue(Box::new(val)))
        }
        Statement::Let { name, value, .. } => {
            let val = eval_expression(value, env)?;
            env.borrow_mut().set(name.value.clone(), val);
            Ok(Object::Null)
        }
    }
}

fn eval_expressions(exprs: &[Expression], env: &Env) -> Result<Vec<Object>, Object> {
    exprs.iter().map(|expr| eval_expression(expr, env)).collect()
}

fn eval_expression(expr: &Expression, env: &Env) -> EvalResult {
    match expr {
        Expression::IntegerLiteral { value, .. } => Ok(Object::Integer(*value)),
        Expression::FloatLiteral { value, .. } => Ok(Object::Float(*value)),
        Expression::BooleanLiteral { value, .. } => Ok(Object::Boolean(*value)),
        Expression::StringLiteral { value, .. } => Ok(Object::Str(value.clone())),
        Expression::Identifier(identifier) => eval_identifier(identifier, env),
        Expression::Prefix { operator, right, .. } => {
            let right = eval_expression(right, env)?;
            eval_prefix_expression(operator, right)
        }
        Expression::Infix { left, operator, right, .. } => {
            let left = eval_expression(left, env)?;
            let right = eval_expression(right, env)?;
            eval_infix_expression(operator, left, right)
        }
        Expression::If { condition, consequence, alternative, .. } => {
            eval_if_expression(condition, consequence, alternative.as_ref(), env)
        }
        Expression::FunctionLiteral { parameters, body, .. } => {
            Ok(Object::Function(Rc::new(Function {
                parameters: parameters.clone(),
                body: body.clone(),
                env: Rc::clone(env),
            })))
        }
        Expression::Call { function, arguments, .. } => {
            let func = match eval_expression(function, env)? {
                Object::Function(func) => func,
                other => return Err(new_error(format!("not a function: {}", other.object_type()))),
            };
            let args = eval_expressions(arguments, env)?;
            apply_function(&func, args)
        }
    }
}

fn new_error(message: String) -> Object {
    tracing::debug!(%message, "evaluation error");
    Object::Error(message)
}

fn eval_prefix_expression(operator: &str, right: Object) -> EvalResult {
    match operator {
        "!" => Ok(eval_bang_operator_expression(&right)),
        "-" => eval_minus_prefix_operator_expression(right),
        _ => Err(new_error(format!("unknown operator: {}{}", operator, right.object_type()))),
    }
}

fn eval_bang_operator_expression(right: &Object) -> Object {
    Object::Boolean(!right.is_truthy())
}

fn eval_minus_prefix_operator_expression(right: Object) -> EvalResult {
    match right {
        Object::Integer(value) => Ok(Object::Integer(value.wrapping_neg())),
        Object::Float(value) => Ok(Object::Float(-value)),
        other => Err(new_error(format!("unknown operator: -{}", other.object_type()))),
    }
}

fn eval_infix_expression(operator: &str, left: Object, right: Object) -> EvalResult {
    let result = match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix_expression(operator, *l, *r)?,
        // a Float on either side promotes the other operand
        (Object::Integer(l), Object::Float(r)) => eval_float_infix_expression(operator, *l as f64, *r),
        (Object::Float(l), Object::Integer(r)) => eval_float_infix_expression(operator, *l, *r as f64),
        (Object::Float(l), Object::Float(r)) => eval_float_infix_expression(operator, *l, *r),
        (Object::Boolean(l), Object::Boolean(r)) => eval_boolean_infix_expression(operator, *l, *r),
        (Object::Str(l), Object::Str(r)) => eval_string_infix_expression(operator, l, r),
        _ if left.object_type() != right.object_type() => {
            return Err(new_error(format!(
                "type mismatch: {} {} {}",
                left.object_type(),
                operator,
                right.object_type()
            )));
        }
        _ => None,
    };

    result.ok_or_else(|| {
        new_error(format!(
            "unknown operator: {} {} {}",
            left.object_type(),
            operator,
            right.object_type()
        ))
    })
}

fn eval_integer_infix_expression(operator: &str, left: i64, right: i64) -> Result<Option<Object>, Object> {
    let result = match operator {
        "+" => Object::Integer(left.wrapping_add(right)),
        "-" => Object::Integer(left.wrapping_sub(right)),
        "*" => Object::Integer(left.wrapping_mul(right)),
        "/" => {
            if right == 0 {
                return Err(new_error("division by zero".to_string()));
            }
            Object::Integer(left.wrapping_div(right))
        }
        "<" => Object::Boolean(left < right),
        ">" => Object::Boolean(left > right),
        "<=" => Object::Boolean(left <= right),
        ">=" => Object::Boolean(left >= right),
        "==" => Object::Boolean(left == right),
        "!=" => Object::Boolean(left != right),
        _ => return Ok(None),
    };
    Ok(Some(result))
}

fn eval_float_infix_expression(operator: &str, left: f64, right: f64) -> Option<Object> {
    let result = match operator {
        "+" => Object::Float(left + right),
        "-" => Object::Float(left - right),
        "*" => Object::Float(left * right),
        "/" => Object::Float(left / right),
        "<" => Object::Boolean(left < right),
        ">" => Object::Boolean(left > right),
        "<=" => Object::Boolean(left <= right),
        ">=" => Object::Boolean(left >= right),
        "==" => Object::Boolean(left == right),
        "!=" => Object::Boolean(left != right),
        _ => return None,
    };
    Some(result)
}

fn eval_boolean_infix_expression(operator: &str, left: bool, right: bool) -> Option<Object> {
    match operator {
        "==" => Some(Object::Boolean(left == right)),
        "!=" => Some(Object::Boolean(left != right)),
        _ => None,
    }
}

fn eval_string_infix_expression(operator: &str, left: &str, right: &str) -> Option<Object> {
    match operator {
        "+" => Some(Object::Str(format!("{}{}", left, right))),
        "==" => Some(Object::Boolean(left == right)),
        "!=" => Some(Object::Boolean(left != right)),
        _ => None,
    }
}

fn eval_if_expression(
    condition: &Expression,
    consequence: &ast::BlockStatement,
    alternative: Option<&ast::BlockStatement>,
    env: &Env,
) -> EvalResult {
    let condition = eval_expression(condition, env)?;
    if condition.is_truthy() {
        eval_statements(&consequence.statements, env)
    } else if let Some(alternative) = alternative {
        eval_statements(&alternative.statements, env)
    } else {
        Ok(Object::Null)
    }
}

fn eval_identifier(node: &ast::Identifier, env: &Env) -> EvalResult {
    env.borrow()
        .get(&node.value)
        .ok_or_else(|| new_error(format!("identifier not found: {}", node.value)))
}

#[tracing::instrument(level = "trace", skip_all, fields(arity = func.parameters.len()))]
fn apply_function(func: &Rc<Function>, args: Vec<Object>) -> EvalResult {
    if args.len() != func.parameters.len() {
        return Err(new_error(format!(
            "wrong number of arguments: want={}, got={}",
            func.parameters.len(),
            args.len()
        )));
    }

    let extended_env = extend_function_env(func, args);
    match eval_statements(&func.body.statements, &extended_env) {
        Ok(obj) => Ok(obj),
        Err(Object::ReturnValue(value)) => Ok(*value),
        Err(err) => Err(err),
    }
}

fn extend_function_env(func: &Function, args: Vec<Object>) -> Env {
    let env = Environment::new_enclosed(&func.env);
    for (param, arg) in func.parameters.iter().zip(args) {
        env.borrow_mut().set(param.value.clone(), arg);
    }
    env
}

fn unwrap_return_value(obj: Object) -> Object {
    match obj {
        Object::ReturnValue(value) => *value,
        obj => obj,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser;
    use pretty_assertions::assert_eq;

    struct TestInt {
        input: &'static str,
        expected: i64,
    }

    #[derive(Debug)]
    struct TestBool {
        input: &'static str,
        expected: bool,
    }

    struct TestIf {
        input: &'static str,
        expected: Option<i64>,
    }

    struct TestStr {
        input: &'static str,
        expected_message: &'static str,
    }

    #[test]
    fn test_eval_integer_expression() {
        let tests = vec![
            TestInt { input: "5", expected: 5 },
            TestInt { input: "10", expected: 10 },
            TestInt { input: "-5", expected: -5 },
            TestInt { input: "-10", expected: -10 },
            TestInt { input: "5 + 5 + 5 + 5 - 10", expected: 10 },
            TestInt { input: "2 * 2 * 2 * 2 * 2", expected: 32 },
            TestInt { input: "-50 + 100 + -50", expected: 0 },
            TestInt { input: "5 * 2 + 10", expected: 20 },
            TestInt { input: "5 + 2 * 10", expected: 25 },
            TestInt { input: "20 + 2 * -10", expected: 0 },
            TestInt { input: "50 / 2 * 2 + 10", expected: 60 },
            TestInt { input: "2 * (5 + 10)", expected: 30 },
            TestInt { input: "3 * 3 * 3 + 10", expected: 37 },
            TestInt { input: "3 * (3 * 3) + 10", expected: 37 },
            TestInt { input: "(5 + 10 * 2 + 15 / 3) * 2 + -10", expected: 50 },
            TestInt { input: "7 / 2", expected: 3 },
            TestInt { input: "9223372036854775807 + 1", expected: i64::MIN },
            TestInt { input: "-9223372036854775807 - 2", expected: i64::MAX },
        ];

        for tt in tests.iter() {
            let evaluated = test_eval(tt.input);
            test_integer_object(&evaluated, tt.expected);
        }
    }

    #[test]
    fn test_eval_float_expression() {
        let tests = vec![
            ("2.5", 2.5),
            ("-2.5", -2.5),
            (".5 + 5.", 5.5),
            ("5.0 * 2.5 + 10.0", 22.5),
            ("2 * 2 * 2 * 2 * 2.5", 40.0),
            ("1 / 2.0", 0.5),
            ("10.0 - 4", 6.0),
        ];

        for (input, expected) in tests {
            match test_eval(input) {
                Object::Float(value) => assert_eq!(value, expected, "For input: {}", input),
                other => panic!("object is not Float. got={:?} for {}", other, input),
            }
        }

        assert_eq!(test_eval("2 * 2 * 2 * 2 * 2.5").inspect(), "40.000000");
        assert_eq!(test_eval("1.0 / 0").inspect(), "inf");
    }

    #[test]
    fn test_eval_boolean_expression() {
        let tests = vec![
            TestBool { input: "true", expected: true },
            TestBool { input: "false", expected: false },
            TestBool { input: "1 < 2", expected: true },
            TestBool { input: "1 > 2", expected: false },
            TestBool { input: "1 <= 1", expected: true },
            TestBool { input: "2 >= 3", expected: false },
            TestBool { input: "1 == 1", expected: true },
            TestBool { input: "1 != 1", expected: false },
            TestBool { input: "1.5 < 2", expected: true },
            TestBool { input: "2 >= 1.5", expected: true },
            TestBool { input: "5 == 5.0", expected: true },
            TestBool { input: "5 != 5.5", expected: true },
            TestBool { input: r#""a" == "a""#, expected: true },
            TestBool { input: r#""a" != "b""#, expected: true },
        ];

        for test in tests {
            let evaluated = test_eval(test.input);
            test_boolean_object(&evaluated, test.expected);
        }
    }

    #[test]
    fn test_if_else_expressions() {
        let tests = vec![
            TestIf { input: "if (true) { 10 }", expected: Some(10) },
            TestIf { input: "if (false) { 10 }", expected: None },
            TestIf { input: "if (1) { 10 }", expected: Some(10) },
            TestIf { input: "if (1 < 2) { 10 }", expected: Some(10) },
            TestIf { input: "if (1 > 2) { 10 }", expected: None },
            TestIf { input: "if (1 > 2) { 10 } else { 20 }", expected: Some(20) },
            TestIf { input: "if (1 < 2) { 10 } else { 20 }", expected: Some(10) },
            TestIf { input: "if (0) { 10 } else { 20 }", expected: Some(10) },
            TestIf { input: "if (if (false) { 1 }) { 10 } else { 20 }", expected: Some(20) },
        ];

        for test in tests {
            let evaluated = test_eval(test.input);
            match test.expected {
                Some(val) => test_integer_object(&evaluated, val),
                None => test_null_object(&evaluated),
            }
        }
    }

    #[test]
    fn test_return_statements() {
        let tests = vec![
            TestInt { input: "return 10;", expected: 10 },
            TestInt { input: "return 10; 9;", expected: 10 },
            TestInt { input: "return 2 * 5; 9;", expected: 10 },
            TestInt { input: "9; return 2 * 5; 9;", expected: 10 },
            TestInt { input: "if (10 > 1) { if (10 > 1) { return 10; } return 1; }", expected: 10 },
            TestInt { input: "let f = fn(x) { return x; x + 10; }; f(10);", expected: 10 },
            TestInt { input: "let f = fn(x) { let result = x + 10; return result; return 10; }; f(10);", expected: 20 },
        ];

        for test in tests {
            let evaluated = test_eval(test.input);
            test_integer_object(&evaluated, test.expected);
        }
    }

    #[test]
    fn test_bang_operator() {
        let tests = vec![
            TestBool { input: "!true", expected: false },
            TestBool { input: "!false", expected: true },
            TestBool { input: "!5", expected: false },
            TestBool { input: "!!true", expected: true },
            TestBool { input: "!!false", expected: false },
            TestBool { input: "!!5", expected: true },
            TestBool { input: "!if (false) { 1 }", expected: true },
            TestBool { input: r#"!"""#, expected: false },
            TestBool { input: "true == true", expected: true },
            TestBool { input: "false == false", expected: true },
            TestBool { input: "true == false", expected: false },
            TestBool { input: "true != false", expected: true },
            TestBool { input: "false != true", expected: true },
            TestBool { input: "(1 < 2) == true", expected: true },
            TestBool { input: "(1 < 2) == false", expected: false },
            TestBool { input: "(1 > 2) == true", expected: false },
            TestBool { input: "(1 > 2) == false", expected: true },
        ];

        for test in tests {
            let evaluated = test_eval(test.input);
            test_boolean_object(&evaluated, test.expected);
        }
    }

    #[test]
    fn test_error_handling() {
        let tests = vec![
            TestStr { input: "5 + true;", expected_message: "type mismatch: INTEGER + BOOLEAN" },
            TestStr { input: "5 + true; 5;", expected_message: "type mismatch: INTEGER + BOOLEAN" },
            TestStr { input: "-true", expected_message: "unknown operator: -BOOLEAN" },
            TestStr { input: r#"-"a""#, expected_message: "unknown operator: -STRING" },
            TestStr { input: "true + false;", expected_message: "unknown operator: BOOLEAN + BOOLEAN" },
            TestStr { input: "5; true + false; 5", expected_message: "unknown operator: BOOLEAN + BOOLEAN" },
            TestStr { input: "if (10 > 1) { true + false; }", expected_message: "unknown operator: BOOLEAN + BOOLEAN" },
            TestStr {
                input: r#"
if (10 > 1) {
    if (10 > 1) {
        return true + false;
    }
    return 1;
}
"#,
                expected_message: "unknown operator: BOOLEAN + BOOLEAN",
            },
            TestStr { input: "foobar", expected_message: "identifier not found: foobar" },
            TestStr { input: r#""Hello" - "World""#, expected_message: "unknown operator: STRING - STRING" },
            TestStr { input: r#""a" + 1"#, expected_message: "type mismatch: STRING + INTEGER" },
            TestStr { input: "1.5 + true", expected_message: "type mismatch: FLOAT + BOOLEAN" },
            TestStr { input: "if (false) { 1 } == if (false) { 1 }", expected_message: "unknown operator: NULL == NULL" },
            TestStr { input: "10 / 0", expected_message: "division by zero" },
            TestStr { input: "let x = 1 / 0; x", expected_message: "division by zero" },
            TestStr { input: "5(1)", expected_message: "not a function: INTEGER" },
            TestStr { input: "fn(x) { x }(1, 2)", expected_message: "wrong number of arguments: want=1, got=2" },
            TestStr { input: "fn(x, y) { x }(1)", expected_message: "wrong number of arguments: want=2, got=1" },
            TestStr { input: "let f = fn(x) { x }; f(missing, 1 + true)", expected_message: "identifier not found: missing" },
            TestStr { input: "let f = fn() { 1 + true; 2 }; f() + 1", expected_message: "type mismatch: INTEGER + BOOLEAN" },
        ];

        for test in tests {
            let evaluated = test_eval(test.input);
            match evaluated {
                Object::Error(message) => {
                    assert_eq!(test.expected_message, message, "For input: {}", test.input);
                }
                other => panic!("no error object returned for {}. got={:?}", test.input, other),
            }
        }
    }

    #[test]
    fn test_let_statements() {
        let tests = vec![
            TestInt { input: "let a = 5; a;", expected: 5 },
            TestInt { input: "let a = 5 * 5; a;", expected: 25 },
            TestInt { input: "let a = 5; let b = a; b;", expected: 5 },
            TestInt { input: "let a = 5; let b = a; let c = a + b + 5; c;", expected: 15 },
            TestInt { input: "let a = 1; let a = a + 1; a", expected: 2 },
        ];

        for test in tests {
            test_integer_object(&test_eval(test.input), test.expected);
        }
    }

    #[test]
    fn test_let_and_empty_program_yield_null() {
        test_null_object(&test_eval("let a = 5;"));
        test_null_object(&test_eval(""));
        test_null_object(&test_eval("{ }"));
    }

    #[test]
    fn test_block_statement_shares_scope() {
        test_integer_object(&test_eval("{ let a = 3; } a * 2"), 6);
    }

    #[test]
    fn test_string_concatenation() {
        let input = r#""Hello" + " " + "World!""#;
        match test_eval(input) {
            Object::Str(s) => assert_eq!(s, "Hello World!", "String has wrong value. got={}", s),
            other => panic!("object is not a String. got={:?}", other),
        }
    }

    #[test]
    fn test_string_literal() {
        match test_eval(r#""Hello World!""#) {
            Object::Str(s) => assert_eq!(s, "Hello World!"),
            other => panic!("object is not StringLiteral. got={:?}", other),
        }
    }

    #[test]
    fn test_function_object() {
        let input = "fn(x) { x + 2; };";
        match test_eval(input) {
            Object::Function(fn_obj) => {
                assert_eq!(fn_obj.parameters.len(), 1, "Function has wrong parameters. Parameters={:?}", fn_obj.parameters);
                assert_eq!(fn_obj.parameters[0].to_string(), "x");
                assert_eq!(fn_obj.body.to_string(), "(x + 2)");
            }
            other => panic!("object is not Function. got={:?}", other),
        }
    }

    #[test]
    fn test_function_application() {
        let tests = vec![
            ("let identity = fn(x) { x; }; identity(5);", 5),
            ("let identity = fn(x) { return x; }; identity(5);", 5),
            ("let double = fn(x) { x * 2; }; double(5);", 10),
            ("let add = fn(x, y) { x + y; }; add(5, 5);", 10),
            ("let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));", 20),
            ("fn(x) { x; }(5)", 5),
            ("let noop = fn() { }; if (noop()) { 1 } else { 2 }", 2),
        ];

        for (input, expected) in tests {
            test_integer_object(&test_eval(input), expected);
        }
    }

    #[test]
    fn test_closures() {
        let input = "
        let newAdder = fn(x) {
            fn(y) { x + y };
        };

        let addTwo = newAdder(2);
        addTwo(2);";

        test_integer_object(&test_eval(input), 4);
    }

    #[test]
    fn test_closure_sees_later_bindings_in_defining_scope() {
        let input = "
        let getLate = fn() { late };
        let late = 7;
        getLate();";

        test_integer_object(&test_eval(input), 7);
    }

    #[test]
    fn test_recursive_function() {
        let input = "
        let fib = fn(n) {
            if (n < 2) { return n; }
            fib(n - 1) + fib(n - 2)
        };
        fib(15);";

        test_integer_object(&test_eval(input), 610);
    }

    #[test]
    fn test_parameters_shadow_without_leaking() {
        let input = "let x = 1; let f = fn(x) { let y = x * 10; y }; f(5) + x";
        test_integer_object(&test_eval(input), 51);

        let evaluated = test_eval("let f = fn() { let inner = 1; inner }; f(); inner");
        assert_eq!(evaluated, Object::Error("identifier not found: inner".to_string()));
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let l = Lexer::new("let a = 2; let f = fn(x) { x * a }; f(21)");
        let mut p = parser::Parser::new(l);
        let program = p.parse_program();
        assert!(p.errors().is_empty());

        let first = eval(&program, &Environment::new());
        let second = eval(&program, &Environment::new());
        assert_eq!(first, Object::Integer(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_env_persists_between_programs() {
        let env = Environment::new();
        let define = parser::Parser::new(Lexer::new("let counter = 41;")).parse_program();
        let read = parser::Parser::new(Lexer::new("counter + 1")).parse_program();

        eval(&define, &env);
        assert_eq!(eval(&read, &env), Object::Integer(42));
    }

    fn test_eval(input: &str) -> Object {
        let l = Lexer::new(input);
        let mut p = parser::Parser::new(l);
        let program = p.parse_program();
        assert!(p.errors().is_empty(), "parser errors for {}: {:?}", input, p.error_messages());
        let env = Environment::new();
        eval(&program, &env)
    }

    fn test_boolean_object(obj: &Object, expected: bool) {
        match obj {
            Object::Boolean(value) => assert_eq!(*value, expected, "object has wrong value. got={}, want={}", value, expected),
            other => panic!("object is not Boolean. got={:?}", other),
        }
    }

    fn test_integer_object(obj: &Object, expected: i64) {
        match obj {
            Object::Integer(value) => assert_eq!(*value, expected, "object has wrong value. got={}, want={}", value, expected),
            other => panic!("object is not Integer. got={:?}", other),
        }
    }

    fn test_null_object(obj: &Object) {
        assert_eq!(*obj, Object::Null, "object is not Null. got={:?}", obj);
    }
}
