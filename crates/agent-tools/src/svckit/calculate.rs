//! Calculator tool
//!
//! Recursive-descent evaluator over `+ - * / ^`, unary minus and
//! parentheses. `^` binds tighter than unary minus and is right-associative,
//! so `-2^2` is `-4` and `2^3^2` is `512`.

use async_trait::async_trait;

use agent_core::{tool::ParameterSchema, Result as CoreResult, Tool, ToolArguments, ToolResult, ToolSchema};

use crate::error::{required_str, Result, ToolError};

/// Longest accepted expression, in characters
const MAX_EXPRESSION_LEN: usize = 1024;

/// Deepest accepted nesting of parentheses, unary signs and powers
const MAX_DEPTH: usize = 128;

pub struct CalculateTool;

#[async_trait]
impl Tool for CalculateTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "Calculate".into(),
            description: "Evaluate an arithmetic expression with + - * / ^ and parentheses".into(),
            parameters: vec![ParameterSchema::new(
                "expression",
                "string",
                "Expression to evaluate (e.g., '2 + 2', '(3 + 4) * 2 ^ 3')",
            )
            .required()],
        }
    }

    async fn execute(&self, arguments: &ToolArguments) -> CoreResult<ToolResult> {
        let outcome = required_str(arguments, "expression")
            .and_then(|expr| evaluate(expr).map(|value| format!("{} = {value}", expr.trim())));
        Ok(super::finish("Calculate", outcome))
    }
}

/// Evaluate an arithmetic expression
pub fn evaluate(expr: &str) -> Result<f64> {
    let mut parser = Parser {
        chars: expr.chars().filter(|c| !c.is_whitespace()).collect(),
        pos: 0,
        depth: 0,
    };

    if parser.chars.len() > MAX_EXPRESSION_LEN {
        return Err(ToolError::Evaluation(format!(
            "expression longer than {MAX_EXPRESSION_LEN} characters"
        )));
    }

    if parser.chars.is_empty() {
        return Err(ToolError::Evaluation("empty expression".into()));
    }

    let value = parser.expression()?;
    if let Some(c) = parser.peek() {
        return Err(ToolError::Evaluation(format!("unexpected '{c}' at position {}", parser.pos)));
    }
    if !value.is_finite() {
        return Err(ToolError::Evaluation("result is not a finite number".into()));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        loop {
            if self.eat('*') {
                value *= self.unary()?;
            } else if self.eat('/') {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return Err(ToolError::Evaluation("division by zero".into()));
                }
                value /= divisor;
            } else {
                return Ok(value);
            }
        }
    }

    // every level of recursion passes through here
    fn unary(&mut self) -> Result<f64> {
        if self.depth >= MAX_DEPTH {
            return Err(ToolError::Evaluation("expression nested too deeply".into()));
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    // unary := '-' unary | '+' unary | power
    fn signed(&mut self) -> Result<f64> {
        if self.eat('-') {
            Ok(-self.unary()?)
        } else if self.eat('+') {
            self.unary()
        } else {
            self.power()
        }
    }

    // power := primary ('^' unary)?
    fn power(&mut self) -> Result<f64> {
        let base = self.primary()?;
        if self.eat('^') {
            Ok(base.powf(self.unary()?))
        } else {
            Ok(base)
        }
    }

    // primary := number | '(' expression ')'
    fn primary(&mut self) -> Result<f64> {
        if self.eat('(') {
            let value = self.expression()?;
            if !self.eat(')') {
                return Err(ToolError::Evaluation("missing closing parenthesis".into()));
            }
            return Ok(value);
        }

        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(match self.peek() {
                Some(c) => ToolError::Evaluation(format!("unexpected '{c}' at position {start}")),
                None => ToolError::Evaluation("unexpected end of expression".into()),
            });
        }

        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse()
            .map_err(|_| ToolError::Evaluation(format!("invalid number '{literal}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svckit::args;

    fn eval(expr: &str) -> f64 {
        evaluate(expr).unwrap()
    }

    #[test]
    fn test_calculator() {
        assert!((eval("2 + 2") - 4.0).abs() < f64::EPSILON);
        assert!((eval("10 * 5") - 50.0).abs() < f64::EPSILON);
        assert!((eval("(2 + 3) * 4") - 20.0).abs() < f64::EPSILON);
        assert!((eval("2 ^ 8") - 256.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert!((eval("2 + 3 * 4") - 14.0).abs() < f64::EPSILON);
        assert!((eval("10 - 4 - 3") - 3.0).abs() < f64::EPSILON);
        assert!((eval("100 / 10 / 5") - 2.0).abs() < f64::EPSILON);
        assert!((eval("2 ^ 3 ^ 2") - 512.0).abs() < f64::EPSILON);
        assert!((eval("-2 ^ 2") + 4.0).abs() < f64::EPSILON);
        assert!((eval("3 * -2") + 6.0).abs() < f64::EPSILON);
        assert!((eval("((1.5))") - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(evaluate("1 / 0"), Err(ToolError::Evaluation(_))));
        assert!(evaluate("").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 + 2)").is_err());
        assert!(evaluate("2 * x").is_err());
        assert!(evaluate("1..2").is_err());
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let nested = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert!(matches!(evaluate(&nested), Err(ToolError::Evaluation(msg)) if msg.contains("nested")));

        let negations = format!("{}1", "-".repeat(500));
        assert!(matches!(evaluate(&negations), Err(ToolError::Evaluation(msg)) if msg.contains("nested")));

        let powers = format!("2{}", "^2".repeat(300));
        assert!(evaluate(&powers).is_err());

        let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert!((eval(&shallow) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_oversized_input_is_rejected() {
        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(evaluate(&parens), Err(ToolError::Evaluation(msg)) if msg.contains("longer")));

        let negations = format!("{}1", "-".repeat(100_000));
        assert!(evaluate(&negations).is_err());
    }

    #[tokio::test]
    async fn test_execute_formats_result() {
        let result = CalculateTool
            .execute(&args(serde_json::json!({"expression": " (3 + 4) * 2 "})))
            .await
            .unwrap();
        assert_eq!(result.flatten_text(), "(3 + 4) * 2 = 14");

        let result = CalculateTool
            .execute(&args(serde_json::json!({"expression": "1/0"})))
            .await
            .unwrap();
        assert!(result.is_error);
    }
}
