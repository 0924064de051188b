//! Arithmetic evaluation tool.
//!
//! Symbolic expressions are evaluated directly with `evalexpr`. When the
//! input reads like prose (a word problem), one model call translates it
//! into a single arithmetic expression first, then that expression is
//! evaluated. Anything still unevaluable fails with `EvaluationFailed`.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use super::{Tool, ToolError};
use crate::llm::CompletionClient;

const TRANSLATE_TEMPLATE: &str = "Translate the following math problem into a single arithmetic \
expression using only numbers, parentheses and the operators + - * / % ^. \
Reply with the expression alone, no explanation and no units.\n\n\
Problem: {problem}\nExpression:";

/// Evaluate arithmetic expressions, translating word problems via the model.
pub struct Calculator {
    llm: Arc<dyn CompletionClient>,
}

impl Calculator {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }

    /// Ask the model to turn a word problem into one arithmetic expression.
    async fn translate(&self, problem: &str) -> Result<String, ToolError> {
        let prompt = TRANSLATE_TEMPLATE.replace("{problem}", problem);

        let reply = self
            .llm
            .complete(&prompt, None)
            .await
            .map_err(|e| ToolError::transport(e.to_string()))?;

        // First non-empty line, with fences and label prefixes stripped.
        let line = reply
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with("```"))
            .unwrap_or("");

        Ok(line
            .trim_start_matches("Expression:")
            .trim()
            .trim_matches('`')
            .to_string())
    }
}

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Perform mathematical calculations. Input: a single arithmetic expression, e.g. (18 * 35) / 15. Word problems are accepted but an explicit expression is more reliable."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let cleaned = sanitize(input);
        if cleaned.is_empty() {
            return Err(ToolError::evaluation_failed("empty expression"));
        }

        match evaluate(&cleaned) {
            Ok(result) => Ok(result),
            Err(direct_err) => {
                // Pure symbols that failed to evaluate stay failed; only
                // prose is worth a translation attempt.
                if !looks_like_prose(&cleaned) {
                    return Err(direct_err);
                }

                tracing::debug!(input = %input, "direct evaluation failed, translating via model");
                let expression = self.translate(input).await?;
                if expression.is_empty() {
                    return Err(ToolError::evaluation_failed(format!(
                        "could not derive an expression from: {}",
                        input
                    )));
                }

                evaluate(&sanitize(&expression)).map_err(|_| {
                    ToolError::evaluation_failed(format!(
                        "derived expression {:?} could not be evaluated",
                        expression
                    ))
                })
            }
        }
    }
}

/// Normalize an expression: strip wrapping quotes/backticks, unicode
/// operators, thousands separators and a trailing `=`.
fn sanitize(input: &str) -> String {
    let trimmed = input
        .trim()
        .trim_matches('`')
        .trim_matches('"')
        .trim_end_matches('=')
        .trim();

    let mapped: String = trimmed
        .chars()
        .map(|c| match c {
            '×' => '*',
            '÷' => '/',
            '−' => '-',
            _ => c,
        })
        .collect();

    // Drop commas used as thousands separators (1,000 -> 1000).
    let re = Regex::new(r"(\d),(\d)").expect("static regex");
    let mut out = mapped;
    loop {
        let next = re.replace_all(&out, "$1$2").into_owned();
        if next == out {
            break;
        }
        out = next;
    }
    out.trim().to_string()
}

/// True when the input contains alphabetic words, i.e. reads like prose
/// rather than a symbolic expression.
fn looks_like_prose(input: &str) -> bool {
    input.chars().any(|c| c.is_alphabetic())
}

/// Evaluate a symbolic expression to a numeric result rendered as text.
///
/// Integer literals are promoted to floats first so that division keeps
/// fractional parts (`10 / 4` is 2.5, not 2).
fn evaluate(expr: &str) -> Result<String, ToolError> {
    let promoted = promote_integers(expr);

    let value = evalexpr::eval(&promoted)
        .map_err(|e| ToolError::evaluation_failed(format!("{} (in {:?})", e, expr)))?;

    match value {
        evalexpr::Value::Float(f) if f.is_finite() => Ok(format_number(f)),
        evalexpr::Value::Int(i) => Ok(i.to_string()),
        evalexpr::Value::Float(_) => Err(ToolError::evaluation_failed(format!(
            "expression {:?} did not produce a finite number",
            expr
        ))),
        other => Err(ToolError::evaluation_failed(format!(
            "expression {:?} produced a non-numeric value: {}",
            expr, other
        ))),
    }
}

/// Rewrite bare integer literals as floats (`18` -> `18.0`).
fn promote_integers(expr: &str) -> String {
    let re = Regex::new(r"\d+(\.\d+)?").expect("static regex");
    re.replace_all(expr, |caps: &regex::Captures| {
        let m = &caps[0];
        if m.contains('.') {
            m.to_string()
        } else {
            format!("{}.0", m)
        }
    })
    .into_owned()
}

/// Render a float without a trailing `.0` for whole numbers.
fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}
