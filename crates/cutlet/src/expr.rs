//! The infix expression evaluator behind the `expr` command.
//!
//! `expr` receives its arguments already evaluated, joins them with spaces,
//! and hands the text here. The grammar is small: integer and float
//! arithmetic (`+ - * / %`), parentheses, comparisons, and boolean
//! `and`/`or`/`not`. Operands that aren't numeric compare lexicographically
//! by their text, so `expr abc < abd` works the same way the string
//! operators do.

use std::fmt;

use crate::{
    exception::RunError,
    value::{VarRef, Variable},
};

/// Evaluates an expression, producing a runtime value.
pub fn evaluate(text: &str) -> Result<VarRef, RunError> {
    let tokens = scan(text)?;
    let mut parser = Parser { tokens, index: 0 };
    let value = parser.or_expr()?;
    if parser.index < parser.tokens.len() {
        return Err(RunError::new(format!(
            "Unexpected \"{}\" in expression",
            parser.tokens[parser.index]
        )));
    }
    Ok(match value {
        EvalValue::Int(v) => Variable::int(v),
        EvalValue::Float(v) => Variable::text(v.to_string()),
        EvalValue::Bool(v) => Variable::truth(v),
        EvalValue::Str(v) => Variable::text(v),
    })
}

#[derive(Debug, Clone, PartialEq)]
enum ExprToken {
    Int(i64),
    Float(f64),
    Word(String),
    Op(&'static str),
    LParen,
    RParen,
}

impl fmt::Display for ExprToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Word(v) => write!(f, "{v}"),
            Self::Op(v) => write!(f, "{v}"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum EvalValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl EvalValue {
    fn as_number(&self) -> Result<Number, RunError> {
        match self {
            Self::Int(v) => Ok(Number::Int(*v)),
            Self::Float(v) => Ok(Number::Float(*v)),
            Self::Bool(_) | Self::Str(_) => {
                let text = self.text();
                text.parse::<i64>().map(Number::Int).or_else(|_| {
                    text.parse::<f64>().map(Number::Float).map_err(|_| {
                        RunError::new(format!("Expected a number but got \"{text}\""))
                    })
                })
            }
        }
    }

    fn numeric(&self) -> Option<Number> {
        self.as_number().ok()
    }

    fn text(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Bool(v) => (if *v { "true" } else { "false" }).to_owned(),
            Self::Str(v) => v.clone(),
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Self::Bool(v) => *v,
            Self::Int(v) => *v != 0,
            Self::Float(v) => *v != 0.0,
            Self::Str(v) => !(v == "false" || v == "0" || v.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }
}

fn scan(text: &str) -> Result<Vec<ExprToken>, RunError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(ExprToken::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(ExprToken::RParen);
            }
            '+' | '-' | '*' | '/' | '%' => {
                chars.next();
                tokens.push(ExprToken::Op(match ch {
                    '+' => "+",
                    '-' => "-",
                    '*' => "*",
                    '/' => "/",
                    _ => "%",
                }));
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                }
                tokens.push(ExprToken::Op("=="));
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(ExprToken::Op("!="));
                } else {
                    return Err(RunError::new("Unexpected \"!\" in expression"));
                }
            }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some('=') => {
                        chars.next();
                        tokens.push(ExprToken::Op("<="));
                    }
                    Some('>') => {
                        chars.next();
                        tokens.push(ExprToken::Op("!="));
                    }
                    _ => tokens.push(ExprToken::Op("<")),
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(ExprToken::Op(">="));
                } else {
                    tokens.push(ExprToken::Op(">"));
                }
            }
            c if c.is_ascii_digit() => {
                let mut number = String::new();
                let mut is_float = false;
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        number.push(d);
                        chars.next();
                    } else if d == '.' && !is_float {
                        is_float = true;
                        number.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if is_float {
                    let value = number
                        .parse::<f64>()
                        .map_err(|_| RunError::new(format!("Invalid number \"{number}\"")))?;
                    tokens.push(ExprToken::Float(value));
                } else {
                    let value = number
                        .parse::<i64>()
                        .map_err(|_| RunError::new(format!("Invalid number \"{number}\"")))?;
                    tokens.push(ExprToken::Int(value));
                }
            }
            _ => {
                let mut word = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_whitespace() || "()+-*/%<>=!".contains(d) {
                        break;
                    }
                    word.push(d);
                    chars.next();
                }
                tokens.push(ExprToken::Word(word));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<ExprToken>,
    index: usize,
}

impl Parser {
    fn peek(&self) -> Option<&ExprToken> {
        self.tokens.get(self.index)
    }

    fn peek_op(&self) -> Option<&'static str> {
        match self.peek() {
            Some(ExprToken::Op(op)) => Some(*op),
            _ => None,
        }
    }

    fn peek_word(&self) -> Option<&str> {
        match self.peek() {
            Some(ExprToken::Word(word)) => Some(word.as_str()),
            _ => None,
        }
    }

    fn or_expr(&mut self) -> Result<EvalValue, RunError> {
        let mut left = self.and_expr()?;
        while self.peek_word() == Some("or") {
            self.index += 1;
            let right = self.and_expr()?;
            left = EvalValue::Bool(left.truthy() || right.truthy());
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<EvalValue, RunError> {
        let mut left = self.not_expr()?;
        while self.peek_word() == Some("and") {
            self.index += 1;
            let right = self.not_expr()?;
            left = EvalValue::Bool(left.truthy() && right.truthy());
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<EvalValue, RunError> {
        if self.peek_word() == Some("not") {
            self.index += 1;
            let value = self.not_expr()?;
            return Ok(EvalValue::Bool(!value.truthy()));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<EvalValue, RunError> {
        let left = self.additive()?;
        let Some(op) = self.peek_op() else {
            return Ok(left);
        };
        if !matches!(op, "==" | "!=" | "<" | "<=" | ">" | ">=") {
            return Ok(left);
        }
        self.index += 1;
        let right = self.additive()?;

        let result = match (left.numeric(), right.numeric()) {
            (Some(a), Some(b)) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                match op {
                    "==" => a == b,
                    "!=" => a != b,
                    "<" => a < b,
                    "<=" => a <= b,
                    ">" => a > b,
                    _ => a >= b,
                }
            }
            _ => {
                let (a, b) = (left.text(), right.text());
                match op {
                    "==" => a == b,
                    "!=" => a != b,
                    "<" => a < b,
                    "<=" => a <= b,
                    ">" => a > b,
                    _ => a >= b,
                }
            }
        };
        Ok(EvalValue::Bool(result))
    }

    fn additive(&mut self) -> Result<EvalValue, RunError> {
        let mut left = self.multiplicative()?;
        while let Some(op @ ("+" | "-")) = self.peek_op() {
            self.index += 1;
            let right = self.multiplicative()?;
            left = arith(op, &left, &right)?;
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<EvalValue, RunError> {
        let mut left = self.unary()?;
        while let Some(op @ ("*" | "/" | "%")) = self.peek_op() {
            self.index += 1;
            let right = self.unary()?;
            left = arith(op, &left, &right)?;
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<EvalValue, RunError> {
        if self.peek_op() == Some("-") {
            self.index += 1;
            let value = self.unary()?;
            return match value.as_number()? {
                Number::Int(v) => Ok(EvalValue::Int(
                    v.checked_neg()
                        .ok_or_else(|| RunError::new("Integer overflow in expression"))?,
                )),
                Number::Float(v) => Ok(EvalValue::Float(-v)),
            };
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<EvalValue, RunError> {
        match self.peek().cloned() {
            Some(ExprToken::Int(v)) => {
                self.index += 1;
                Ok(EvalValue::Int(v))
            }
            Some(ExprToken::Float(v)) => {
                self.index += 1;
                Ok(EvalValue::Float(v))
            }
            Some(ExprToken::Word(word)) => {
                self.index += 1;
                match word.as_str() {
                    "true" | "yes" | "on" => Ok(EvalValue::Bool(true)),
                    "false" | "no" | "off" => Ok(EvalValue::Bool(false)),
                    _ => Ok(EvalValue::Str(word)),
                }
            }
            Some(ExprToken::LParen) => {
                self.index += 1;
                let value = self.or_expr()?;
                match self.peek() {
                    Some(ExprToken::RParen) => {
                        self.index += 1;
                        Ok(value)
                    }
                    _ => Err(RunError::new("Unmatched ( in expression")),
                }
            }
            Some(other) => Err(RunError::new(format!(
                "Unexpected \"{other}\" in expression"
            ))),
            None => Err(RunError::new("Expected an expression")),
        }
    }
}

fn arith(op: &str, left: &EvalValue, right: &EvalValue) -> Result<EvalValue, RunError> {
    let (a, b) = (left.as_number()?, right.as_number()?);

    if let (Number::Int(a), Number::Int(b)) = (a, b) {
        let result = match op {
            "+" => a.checked_add(b),
            "-" => a.checked_sub(b),
            "*" => a.checked_mul(b),
            "/" => {
                if b == 0 {
                    return Err(RunError::new("Division by zero"));
                }
                a.checked_div(b)
            }
            _ => {
                if b == 0 {
                    return Err(RunError::new("Division by zero"));
                }
                a.checked_rem(b)
            }
        };
        return result
            .map(EvalValue::Int)
            .ok_or_else(|| RunError::new("Integer overflow in expression"));
    }

    let (a, b) = (a.as_f64(), b.as_f64());
    let result = match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => {
            if b == 0.0 {
                return Err(RunError::new("Division by zero"));
            }
            a / b
        }
        _ => a % b,
    };
    Ok(EvalValue::Float(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_text(text: &str) -> String {
        evaluate(text).expect("evaluates cleanly").to_string()
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(eval_text("2 + 3"), "5");
        assert_eq!(eval_text("2 + 3 * 4"), "14");
        assert_eq!(eval_text("(2 + 3) * 4"), "20");
        assert_eq!(eval_text("7 / 2"), "3");
        assert_eq!(eval_text("7 % 2"), "1");
        assert_eq!(eval_text("-4 + 1"), "-3");
    }

    #[test]
    fn float_arithmetic() {
        assert_eq!(eval_text("1.5 + 2"), "3.5");
        assert_eq!(eval_text("5.0 / 2"), "2.5");
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval_text("1 < 2"), "true");
        assert_eq!(eval_text("10 < 9"), "false");
        assert_eq!(eval_text("2 == 2"), "true");
        assert_eq!(eval_text("2 <> 3"), "true");
        assert_eq!(eval_text("abc < abd"), "true");
    }

    #[test]
    fn boolean_logic() {
        assert_eq!(eval_text("true and false"), "false");
        assert_eq!(eval_text("true or false"), "true");
        assert_eq!(eval_text("not true"), "false");
        assert_eq!(eval_text("1 < 2 and 3 < 4"), "true");
    }

    #[test]
    fn bare_term_passes_through() {
        assert_eq!(eval_text("hello"), "hello");
        assert_eq!(eval_text("42"), "42");
    }

    #[test]
    fn division_by_zero_fails() {
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("1 % 0").is_err());
    }

    #[test]
    fn non_numeric_arithmetic_fails() {
        assert!(evaluate("cat + 1").is_err());
    }

    #[test]
    fn trailing_garbage_fails() {
        assert!(evaluate("1 2").is_err());
    }
}
