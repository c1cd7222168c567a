use serde_json::json;
use tracing::debug;

use plugboard_core::{PlugboardError, Result};
use plugboard_host::{Plugin, ServerFacade};

/// Tool plugin: evaluates arithmetic expressions with a small recursive
/// descent parser instead of any `eval`-style dynamism.
///
/// Honors `tool_configs.calculator.precision` (decimal places of the result).
pub struct CalculatorPlugin;

impl Plugin for CalculatorPlugin {
    fn setup(&mut self, facade: &mut ServerFacade) -> Result<()> {
        let precision = facade
            .config()
            .tool_config("calculator")
            .get("precision")
            .and_then(|v| v.as_u64())
            .map(|p| p.min(17) as i32);

        facade.register_tool(
            "calculator",
            "Evaluate an arithmetic expression (+ - * / % ^, parentheses)",
            move |args| {
                let expression = args
                    .get("expression")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        PlugboardError::plugin("calculator", "missing 'expression' argument")
                    })?;
                debug!(expression, "evaluating expression");

                let mut result = eval(expression)?;
                if let Some(p) = precision {
                    let scale = 10f64.powi(p);
                    result = (result * scale).round() / scale;
                }
                Ok(json!({ "expression": expression, "result": result }))
            },
        );
        Ok(())
    }
}

/// Evaluate an expression. Grammar, lowest precedence first:
///
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := factor (('*' | '/' | '%') factor)*
/// factor := unary ('^' factor)?          -- right associative
/// unary  := '-' unary | primary
/// primary:= number | '(' expr ')'
/// ```
pub fn eval(expression: &str) -> Result<f64> {
    let mut parser = Parser {
        chars: expression.chars().filter(|c| !c.is_whitespace()).collect(),
        pos: 0,
    };
    let value = parser.expr()?;
    if parser.pos < parser.chars.len() {
        return Err(err(format!(
            "unexpected character '{}' at position {}",
            parser.chars[parser.pos], parser.pos
        )));
    }
    if !value.is_finite() {
        return Err(err("result is not a finite number"));
    }
    Ok(value)
}

fn err(reason: impl Into<String>) -> PlugboardError {
    PlugboardError::plugin("calculator", reason)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                '+' => {
                    self.bump();
                    value += self.term()?;
                }
                '-' => {
                    self.bump();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                '*' => {
                    self.bump();
                    value *= self.factor()?;
                }
                '/' => {
                    self.bump();
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(err("division by zero"));
                    }
                    value /= divisor;
                }
                '%' => {
                    self.bump();
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(err("modulo by zero"));
                    }
                    value %= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64> {
        let base = self.unary()?;
        if self.peek() == Some('^') {
            self.bump();
            let exponent = self.factor()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<f64> {
        if self.peek() == Some('-') {
            self.bump();
            return Ok(-self.unary()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<f64> {
        match self.peek() {
            Some('(') => {
                self.bump();
                let value = self.expr()?;
                if self.bump() != Some(')') {
                    return Err(err("unbalanced parentheses"));
                }
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(err(format!("unexpected character '{c}'"))),
            None => Err(err("unexpected end of expression")),
        }
    }

    fn number(&mut self) -> Result<f64> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.bump();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse()
            .map_err(|_| err(format!("invalid number '{text}'")))
    }
}
