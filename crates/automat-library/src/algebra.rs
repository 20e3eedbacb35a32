//! Arithmetic expressions and single-variable equations.
//!
//! The grammar is deliberately small:
//!
//! ```text
//! statement  = expression [ "=" expression ]
//! expression = term { ("+" | "-") term }
//! term       = factor { ("*" | "/") factor }
//! factor     = "-" factor | number | identifier | "(" expression ")"
//! ```
//!
//! [`Statement::solve_for`] isolates a variable that occurs exactly once in
//! an equation by undoing the operations around it, one at a time:
//!
//! ```text
//! F = C * 9 / 5 + 32
//! solve_for("C")  ->  (((F - 32) * 5) / 9)
//! ```

use std::fmt;

use thiserror::Error;

/// Binary operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl Op {
    fn symbol(self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '*',
            Op::Div => '/',
        }
    }

    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Op::Add => a + b,
            Op::Sub => a - b,
            Op::Mul => a * b,
            Op::Div => a / b,
        }
    }
}

/// Arithmetic expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Literal.
    Number(f64),
    /// Named value.
    Variable(String),
    /// Unary minus.
    Neg(Box<Expr>),
    /// Binary operation.
    Binary(Op, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn binary(op: Op, a: Expr, b: Expr) -> Self {
        Expr::Binary(op, Box::new(a), Box::new(b))
    }

    /// Evaluates the expression, asking `lookup` for every variable.
    pub fn eval(&self, lookup: &mut dyn FnMut(&str) -> f64) -> f64 {
        match self {
            Expr::Number(value) => *value,
            Expr::Variable(name) => lookup(name),
            Expr::Neg(inner) => -inner.eval(lookup),
            Expr::Binary(op, a, b) => {
                let a = a.eval(lookup);
                op.apply(a, b.eval(lookup))
            }
        }
    }

    /// Distinct variables in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut found = Vec::new();
        self.collect_variables(&mut found);
        found
    }

    fn collect_variables<'a>(&'a self, found: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                if !found.contains(&name.as_str()) {
                    found.push(name);
                }
            }
            Expr::Neg(inner) => inner.collect_variables(found),
            Expr::Binary(_, a, b) => {
                a.collect_variables(found);
                b.collect_variables(found);
            }
        }
    }

    /// How many times `name` occurs.
    pub fn occurrences(&self, name: &str) -> usize {
        match self {
            Expr::Number(_) => 0,
            Expr::Variable(v) => usize::from(v == name),
            Expr::Neg(inner) => inner.occurrences(name),
            Expr::Binary(_, a, b) => a.occurrences(name) + b.occurrences(name),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{value}"),
            Expr::Variable(name) => f.write_str(name),
            Expr::Neg(inner) => write!(f, "-{inner}"),
            Expr::Binary(op, a, b) => write!(f, "({a} {} {b})", op.symbol()),
        }
    }
}

/// Parsed formula.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    /// A bare expression.
    Expression(Expr),
    /// Two expressions that must stay equal.
    Equation(Expr, Expr),
}

impl Statement {
    /// Distinct variables on both sides, in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        match self {
            Statement::Expression(expr) => expr.variables(),
            Statement::Equation(lhs, rhs) => {
                let mut found = lhs.variables();
                for name in rhs.variables() {
                    if !found.contains(&name) {
                        found.push(name);
                    }
                }
                found
            }
        }
    }

    /// Expression computing `name` from the other variables.
    ///
    /// Returns `None` for bare expressions and when `name` does not occur
    /// exactly once.
    pub fn solve_for(&self, name: &str) -> Option<Expr> {
        let Statement::Equation(lhs, rhs) = self else {
            return None;
        };
        match (lhs.occurrences(name), rhs.occurrences(name)) {
            (1, 0) => isolate(lhs, rhs.clone(), name),
            (0, 1) => isolate(rhs, lhs.clone(), name),
            _ => None,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Expression(expr) => write!(f, "{expr}"),
            Statement::Equation(lhs, rhs) => write!(f, "{lhs} = {rhs}"),
        }
    }
}

/// Rewrites `side = other` until `side` is the variable `name`.
fn isolate(side: &Expr, other: Expr, name: &str) -> Option<Expr> {
    let mut side = side;
    let mut other = other;
    loop {
        match side {
            Expr::Variable(v) if v == name => return Some(other),
            Expr::Neg(inner) => {
                other = Expr::Neg(Box::new(other));
                side = &**inner;
            }
            Expr::Binary(op, a, b) => {
                let in_a = a.occurrences(name) > 0;
                let (next, rest) = if in_a { (a, b) } else { (b, a) };
                let rest = (**rest).clone();
                other = match (op, in_a) {
                    (Op::Add, _) => Expr::binary(Op::Sub, other, rest),
                    (Op::Mul, _) => Expr::binary(Op::Div, other, rest),
                    (Op::Sub, true) => Expr::binary(Op::Add, other, rest),
                    (Op::Sub, false) => Expr::binary(Op::Sub, rest, other),
                    (Op::Div, true) => Expr::binary(Op::Mul, other, rest),
                    (Op::Div, false) => Expr::binary(Op::Div, rest, other),
                };
                side = &**next;
            }
            Expr::Number(_) | Expr::Variable(_) => return None,
        }
    }
}

/// Errors produced by [`parse`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The text ended in the middle of an expression.
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    /// A character that is not part of the grammar.
    #[error("unexpected character '{0}' at {1}")]
    UnexpectedChar(char, usize),
    /// A valid token in the wrong place.
    #[error("unexpected '{0}' at {1}")]
    UnexpectedToken(String, usize),
    /// A malformed number literal.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(String),
    Ident(String),
    Symbol(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(text) | Token::Ident(text) => f.write_str(text),
            Token::Symbol(c) => write!(f, "{c}"),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut number = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if !(c.is_ascii_digit() || c == '.') {
                    break;
                }
                number.push(c);
                chars.next();
            }
            tokens.push((Token::Number(number), start));
        } else if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if !(c.is_alphanumeric() || c == '_') {
                    break;
                }
                ident.push(c);
                chars.next();
            }
            tokens.push((Token::Ident(ident), start));
        } else if "+-*/()=".contains(c) {
            tokens.push((Token::Symbol(c), start));
            chars.next();
        } else {
            return Err(ParseError::UnexpectedChar(c, start));
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
}

impl Parser {
    fn peek_symbol(&self) -> Option<char> {
        match self.tokens.get(self.position) {
            Some((Token::Symbol(c), _)) => Some(*c),
            _ => None,
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.tokens.get(self.position) {
            Some((token, at)) => ParseError::UnexpectedToken(token.to_string(), *at),
            None => ParseError::UnexpectedEnd,
        }
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;
        while let Some(c @ ('+' | '-')) = self.peek_symbol() {
            self.position += 1;
            let op = if c == '+' { Op::Add } else { Op::Sub };
            expr = Expr::binary(op, expr, self.term()?);
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;
        while let Some(c @ ('*' | '/')) = self.peek_symbol() {
            self.position += 1;
            let op = if c == '*' { Op::Mul } else { Op::Div };
            expr = Expr::binary(op, expr, self.factor()?);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let Some((token, _)) = self.tokens.get(self.position).cloned() else {
            return Err(ParseError::UnexpectedEnd);
        };
        match token {
            Token::Symbol('-') => {
                self.position += 1;
                Ok(Expr::Neg(Box::new(self.factor()?)))
            }
            Token::Symbol('(') => {
                self.position += 1;
                let inner = self.expression()?;
                if self.peek_symbol() != Some(')') {
                    return Err(self.unexpected());
                }
                self.position += 1;
                Ok(inner)
            }
            Token::Number(text) => {
                self.position += 1;
                text.parse()
                    .map(Expr::Number)
                    .map_err(|_| ParseError::InvalidNumber(text))
            }
            Token::Ident(name) => {
                self.position += 1;
                Ok(Expr::Variable(name))
            }
            Token::Symbol(_) => Err(self.unexpected()),
        }
    }
}

/// Parses an expression or an equation.
pub fn parse(text: &str) -> Result<Statement, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(text)?,
        position: 0,
    };
    let lhs = parser.expression()?;
    let statement = if parser.peek_symbol() == Some('=') {
        parser.position += 1;
        Statement::Equation(lhs, parser.expression()?)
    } else {
        Statement::Expression(lhs)
    };
    if parser.position < parser.tokens.len() {
        return Err(parser.unexpected());
    }
    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn eval_with(expr: &Expr, values: &[(&str, f64)]) -> f64 {
        expr.eval(&mut |name| {
            values
                .iter()
                .find(|(n, _)| *n == name)
                .map_or(f64::NAN, |(_, v)| *v)
        })
    }

    #[test]
    fn precedence_and_associativity() {
        let Statement::Expression(expr) = parse("1 + 2 * 3 - 8 / 4 / 2").unwrap() else {
            panic!("expected an expression");
        };
        assert_eq!(eval_with(&expr, &[]), 6.0);
        assert_eq!(expr.to_string(), "((1 + (2 * 3)) - ((8 / 4) / 2))");
    }

    #[test]
    fn unary_minus_and_parentheses() {
        let Statement::Expression(expr) = parse("-(a - 3) * -2").unwrap() else {
            panic!("expected an expression");
        };
        assert_eq!(eval_with(&expr, &[("a", 5.0)]), 4.0);
    }

    #[test]
    fn equation_variables_in_order() {
        let statement = parse("F = C * 9 / 5 + 32").unwrap();
        assert_eq!(statement.variables(), ["F", "C"]);
    }

    #[test]
    fn solves_temperature_conversion() {
        let statement = parse("F = C * 9 / 5 + 32").unwrap();
        let celsius = statement.solve_for("C").unwrap();
        assert_eq!(celsius.to_string(), "(((F - 32) * 5) / 9)");
        assert_eq!(eval_with(&celsius, &[("F", 50.0)]), 10.0);

        let fahrenheit = statement.solve_for("F").unwrap();
        assert_eq!(eval_with(&fahrenheit, &[("C", 5.0)]), 41.0);
    }

    #[test]
    fn solves_through_subtraction_and_division_on_the_right() {
        let statement = parse("y = 10 - 20 / x").unwrap();
        let x = statement.solve_for("x").unwrap();
        assert_eq!(eval_with(&x, &[("y", 6.0)]), 5.0);
    }

    #[test]
    fn cannot_solve_repeated_or_missing_variables() {
        let statement = parse("y = x * x").unwrap();
        assert_eq!(statement.solve_for("x"), None);
        assert_eq!(statement.solve_for("z"), None);
        assert_eq!(parse("x + 1").unwrap().solve_for("x"), None);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse("1 +"), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse("a # b"), Err(ParseError::UnexpectedChar('#', 2)));
        assert_eq!(parse("(a"), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse("a = b = c"), Err(ParseError::UnexpectedToken("=".into(), 6)));
        assert_eq!(parse("1.2.3"), Err(ParseError::InvalidNumber("1.2.3".into())));
        assert_eq!(parse("a b"), Err(ParseError::UnexpectedToken("b".into(), 2)));
    }

    proptest! {
        /// Solving `y = x <op> k` for x and substituting back gives y.
        #[test]
        fn solutions_satisfy_the_equation(
            x in -1000i32..1000,
            k in 1i32..100,
            op in prop::sample::select(vec!['+', '-', '*', '/']),
            x_first in any::<bool>(),
        ) {
            let formula = if x_first {
                format!("y = x {op} {k}")
            } else {
                format!("y = {k} {op} x")
            };
            prop_assume!(x_first || op != '/' || x != 0);
            let statement = parse(&formula).unwrap();
            let Statement::Equation(_, rhs) = &statement else {
                panic!("expected an equation");
            };
            let y = eval_with(rhs, &[("x", f64::from(x))]);
            let solved = statement.solve_for("x").unwrap();
            let back = eval_with(&solved, &[("y", y)]);
            prop_assert!((back - f64::from(x)).abs() < 1e-6, "{formula}: {back} != {x}");
        }
    }
}
