//! Expression parsing and evaluation for derived parameters
//!
//! Function optimization specs describe a parameter as an arithmetic expression
//! of other parameters. Variables are field paths of numeric leaves in the same
//! tree, written with dots (`plasma.ip`, `layers.0.thickness`) or brackets
//! (`layers[0].thickness`).
//!
//! Supported syntax: numbers, `+ - * / ^`, unary minus, parentheses and the
//! functions `sin cos tan exp log ln log10 sqrt abs min max`.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{map_res, opt, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use std::collections::HashMap;
use thiserror::Error;

/// Error that can occur during expression parsing or evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String },
}

/// Result type for expression evaluation
type ExprResult<T> = Result<T, ExpressionError>;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant number
    Number(f64),

    /// Reference to another parameter
    Variable(String),

    /// Unary operations
    Unary(UnaryOp, Box<Expression>),

    /// Binary operations
    Binary(BinaryOp, Box<Expression>, Box<Expression>),

    /// Function call
    Function(String, Vec<Expression>),
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Context for expression evaluation, providing variable values
pub trait EvaluationContext {
    /// Get the value of a variable
    fn get_variable(&self, name: &str) -> ExprResult<f64>;
}

/// Simple implementation of EvaluationContext using a HashMap
#[derive(Debug, Clone, Default)]
pub struct SimpleContext {
    variables: HashMap<String, f64>,
}

impl SimpleContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable value
    pub fn set_variable(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_string(), value);
    }
}

impl EvaluationContext for SimpleContext {
    fn get_variable(&self, name: &str) -> ExprResult<f64> {
        self.variables.get_variable(name)
    }
}

impl EvaluationContext for HashMap<String, f64> {
    fn get_variable(&self, name: &str) -> ExprResult<f64> {
        self.get(name)
            .copied()
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }
}

impl Expression {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> ExprResult<Self> {
        match expr_parser(input.trim()) {
            Ok((remainder, expr)) => {
                if remainder.trim().is_empty() {
                    Ok(expr)
                } else {
                    Err(ExpressionError::ParseError {
                        message: format!("Unexpected trailing characters: '{}'", remainder),
                    })
                }
            }
            Err(e) => Err(ExpressionError::ParseError {
                message: format!("{:?}", e),
            }),
        }
    }

    /// Evaluate the expression with the given context
    pub fn evaluate<C: EvaluationContext + ?Sized>(&self, context: &C) -> ExprResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),

            Self::Variable(name) => context.get_variable(name),

            Self::Unary(UnaryOp::Neg, expr) => Ok(-expr.evaluate(context)?),

            Self::Binary(op, left, right) => {
                let lhs = left.evaluate(context)?;
                let rhs = right.evaluate(context)?;

                match op {
                    BinaryOp::Add => Ok(lhs + rhs),
                    BinaryOp::Sub => Ok(lhs - rhs),
                    BinaryOp::Mul => Ok(lhs * rhs),
                    BinaryOp::Div => {
                        if rhs == 0.0 {
                            Err(ExpressionError::DivisionByZero)
                        } else {
                            Ok(lhs / rhs)
                        }
                    }
                    BinaryOp::Pow => Ok(lhs.powf(rhs)),
                }
            }

            Self::Function(name, args) => {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(context))
                    .collect::<ExprResult<Vec<f64>>>()?;
                call_function(name, &values)
            }
        }
    }

    /// Find all variable names used in the expression, sorted and deduplicated
    pub fn variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<String>) {
        match self {
            Self::Number(_) => {}
            Self::Variable(name) => vars.push(name.clone()),
            Self::Unary(_, expr) => expr.collect_variables(vars),
            Self::Binary(_, left, right) => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }
            Self::Function(_, args) => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
        }
    }
}

fn call_function(name: &str, args: &[f64]) -> ExprResult<f64> {
    let unary: Option<fn(f64) -> f64> = match name {
        "sin" => Some(f64::sin),
        "cos" => Some(f64::cos),
        "tan" => Some(f64::tan),
        "exp" => Some(f64::exp),
        "log" | "ln" => Some(f64::ln),
        "log10" => Some(f64::log10),
        "sqrt" => Some(f64::sqrt),
        "abs" => Some(f64::abs),
        _ => None,
    };

    if let Some(f) = unary {
        return match args {
            [x] => Ok(f(*x)),
            _ => Err(ExpressionError::InvalidOperation {
                message: format!("{}() requires 1 argument, got {}", name, args.len()),
            }),
        };
    }

    match name {
        "max" | "min" => {
            if args.len() < 2 {
                return Err(ExpressionError::InvalidOperation {
                    message: format!(
                        "{}() requires at least 2 arguments, got {}",
                        name,
                        args.len()
                    ),
                });
            }
            let fold = if name == "max" { f64::max } else { f64::min };
            Ok(args[1..].iter().fold(args[0], |acc, &x| fold(acc, x)))
        }
        _ => Err(ExpressionError::UndefinedFunction {
            name: name.to_string(),
        }),
    }
}

// Parser functions using nom

/// Parse a plain identifier (function names)
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

/// Parse a field path used as a variable: an identifier followed by
/// `.name`, `.0` or `[0]` segments
fn path_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        identifier,
        many0(alt((
            recognize(pair(char('.'), alt((identifier, digit1)))),
            recognize((char('['), digit1, char(']'))),
        ))),
    ))
    .parse(input)
}

/// Recognize an unsigned float literal (`2`, `2.5`, `.5`, `1e-3`)
fn float_literal(input: &str) -> IResult<&str, &str> {
    alt((
        recognize((
            digit1,
            opt((char('.'), digit0)),
            opt((one_of("eE"), opt(one_of("+-")), digit1)),
        )),
        recognize((
            char('.'),
            digit1,
            opt((one_of("eE"), opt(one_of("+-")), digit1)),
        )),
    ))
    .parse(input)
}

/// Parse an unsigned number literal
fn number(input: &str) -> IResult<&str, Expression> {
    let (input, value) = map_res(float_literal, |text: &str| text.parse::<f64>()).parse(input)?;
    Ok((input, Expression::Number(value)))
}

/// Parse a function call
fn function_call(input: &str) -> IResult<&str, Expression> {
    let (input, name) = identifier(input)?;
    let (input, _) = (multispace0, char('('), multispace0).parse(input)?;
    let (input, args) = separated_list0(
        delimited(multispace0, char(','), multispace0),
        expr_parser,
    )
    .parse(input)?;
    let (input, _) = (multispace0, char(')')).parse(input)?;

    Ok((input, Expression::Function(name.to_string(), args)))
}

/// Parse a variable reference
fn variable(input: &str) -> IResult<&str, Expression> {
    let (input, name) = path_identifier(input)?;
    Ok((input, Expression::Variable(name.to_string())))
}

/// Parse a parenthesized expression
fn parens(input: &str) -> IResult<&str, Expression> {
    delimited(
        (char('('), multispace0),
        expr_parser,
        (multispace0, char(')')),
    )
    .parse(input)
}

/// Parse a primary expression (number, function call, variable, or parenthesized expression)
fn primary(input: &str) -> IResult<&str, Expression> {
    let (input, _) = multispace0.parse(input)?;
    alt((number, function_call, variable, parens)).parse(input)
}

/// Parse a power expression; `^` binds tighter than unary minus and is right-associative
fn power(input: &str) -> IResult<&str, Expression> {
    let (input, base) = primary(input)?;
    let (input, exponent) =
        opt(preceded((multispace0, char('^'), multispace0), unary)).parse(input)?;

    let expr = match exponent {
        Some(exp) => Expression::Binary(BinaryOp::Pow, Box::new(base), Box::new(exp)),
        None => base,
    };
    Ok((input, expr))
}

/// Parse a unary expression (-expr)
fn unary(input: &str) -> IResult<&str, Expression> {
    let (input, _) = multispace0.parse(input)?;
    if let Ok((rest, _)) = char::<&str, nom::error::Error<&str>>('-').parse(input) {
        let (rest, expr) = unary(rest)?;
        return Ok((rest, Expression::Unary(UnaryOp::Neg, Box::new(expr))));
    }
    power(input)
}

/// Fold `operand (op operand)*` into a left-associative chain
fn left_assoc<'a>(
    input: &'a str,
    operand: fn(&'a str) -> IResult<&'a str, Expression>,
    operators: &'static str,
) -> IResult<&'a str, Expression> {
    let (mut input, mut acc) = operand(input)?;
    loop {
        let step: IResult<&str, (&str, char, &str)> =
            (multispace0, one_of(operators), multispace0).parse(input);
        let Ok((after_op, (_, op, _))) = step else {
            return Ok((input, acc));
        };
        let (rest, rhs) = operand(after_op)?;
        let op = match op {
            '+' => BinaryOp::Add,
            '-' => BinaryOp::Sub,
            '*' => BinaryOp::Mul,
            _ => BinaryOp::Div,
        };
        acc = Expression::Binary(op, Box::new(acc), Box::new(rhs));
        input = rest;
    }
}

/// Parse a multiplicative expression (expr * expr, expr / expr)
fn term(input: &str) -> IResult<&str, Expression> {
    left_assoc(input, unary, "*/")
}

/// Parse an additive expression (expr + expr, expr - expr)
fn expr_parser(input: &str) -> IResult<&str, Expression> {
    let (input, _) = multispace0.parse(input)?;
    left_assoc(input, term, "+-")
}
