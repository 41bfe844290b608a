use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use super::operator::ConditionOp;

/// A rule-table cell together with the type it appears to hold.
///
/// Cells always arrive as text. The apparent type decides how a fact value is
/// coerced before comparison: a numeric literal reads the fact as a number, a
/// boolean literal reads it as a boolean, anything else compares as text.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    raw: String,
    kind: LiteralKind,
}

/// The apparent type of a [`Literal`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text,
}

impl Literal {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let kind = if let Ok(v) = trimmed.parse::<i64>() {
            LiteralKind::Int(v)
        } else if let Some(v) = trimmed.parse::<f64>().ok().filter(|v| v.is_finite()) {
            LiteralKind::Float(v)
        } else if trimmed.eq_ignore_ascii_case("true") {
            LiteralKind::Bool(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            LiteralKind::Bool(false)
        } else {
            LiteralKind::Text
        };
        Self {
            raw: raw.to_owned(),
            kind,
        }
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn kind(&self) -> LiteralKind {
        self.kind
    }

    /// Blank cells act as wildcards in condition columns.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// Test `fact_value <op> self`.
    #[must_use]
    pub fn test(&self, op: ConditionOp, fact_value: &Value) -> bool {
        if op.is_textual() {
            return self.test_text(op, fact_value);
        }
        self.compare_fact(fact_value)
            .is_some_and(|ord| op.accepts(ord))
    }

    #[allow(clippy::cast_precision_loss)]
    fn compare_fact(&self, fact_value: &Value) -> Option<Ordering> {
        match self.kind {
            LiteralKind::Int(lit) => {
                if let Some(v) = as_integer(fact_value) {
                    return Some(v.cmp(&lit));
                }
                if let Some(v) = as_number(fact_value) {
                    return v.partial_cmp(&(lit as f64));
                }
            }
            LiteralKind::Float(lit) => {
                if let Some(v) = as_number(fact_value) {
                    return v.partial_cmp(&lit);
                }
            }
            LiteralKind::Bool(lit) => {
                if let Some(v) = as_bool(fact_value) {
                    return Some(v.cmp(&lit));
                }
            }
            LiteralKind::Text => {}
        }
        // Values that do not coerce to the literal's type compare as text.
        Some(text_of(fact_value).as_ref().cmp(self.raw.as_str()))
    }

    fn test_text(&self, op: ConditionOp, fact_value: &Value) -> bool {
        let needle = self.raw.as_str();
        match op {
            ConditionOp::Contains => contains(fact_value, needle),
            ConditionOp::NotContains => !contains(fact_value, needle),
            ConditionOp::StartsWith => text_of(fact_value).starts_with(needle),
            ConditionOp::EndsWith => text_of(fact_value).ends_with(needle),
            _ => false,
        }
    }
}

fn contains(fact_value: &Value, needle: &str) -> bool {
    match fact_value {
        Value::Array(items) => items.iter().any(|item| text_of(item) == needle),
        other => text_of(other).contains(needle),
    }
}

/// Text form of a fact value used by string comparisons. `null` reads as "".
fn text_of(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

impl From<&str> for Literal {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.raw)
    }
}
