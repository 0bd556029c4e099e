//! Condition evaluation: a fixed, small operator set, not an expression
//! language. Pure, never panics, never returns an error; anything the
//! operator cannot meaningfully decide evaluates to `false` (fail-closed).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    NotContains,
    RegexMatch,
    Exists,
    NotExists,
    /// Any operator string this engine does not recognize. Evaluates to
    /// `false` for every input.
    #[serde(other)]
    Unknown,
}

/// Evaluate `actual <operator> expected`.
///
/// `None` and JSON `null` both mean "absent". `Exists`/`NotExists` look only
/// at presence and ignore `expected`. Ordering operators require both
/// operands to be numbers or both to be strings; any other pairing is
/// deterministically "not greater"/"not less".
pub fn evaluate(actual: Option<&Value>, operator: ConditionOperator, expected: &Value) -> bool {
    let present = matches!(actual, Some(v) if !v.is_null());

    match operator {
        ConditionOperator::Exists => present,
        ConditionOperator::NotExists => !present,
        _ if !present => false,
        ConditionOperator::Equals => actual == Some(expected),
        ConditionOperator::NotEquals => actual != Some(expected),
        ConditionOperator::GreaterThan => {
            compare(actual.unwrap_or(&Value::Null), expected) == Some(Ordering::Greater)
        }
        ConditionOperator::LessThan => {
            compare(actual.unwrap_or(&Value::Null), expected) == Some(Ordering::Less)
        }
        ConditionOperator::Contains => render(actual.unwrap_or(&Value::Null))
            .contains(&render(expected)),
        ConditionOperator::NotContains => !render(actual.unwrap_or(&Value::Null))
            .contains(&render(expected)),
        ConditionOperator::RegexMatch => {
            let Value::String(pattern) = expected else {
                return false;
            };
            match regex::Regex::new(pattern) {
                Ok(re) => re.is_match(&render(actual.unwrap_or(&Value::Null))),
                Err(_) => false,
            }
        }
        ConditionOperator::Unknown => false,
    }
}

/// Total-order comparison where one exists: numeric for two numbers,
/// lexical for two strings. `None` otherwise.
fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(e)) => a.as_f64()?.partial_cmp(&e.as_f64()?),
        (Value::String(a), Value::String(e)) => Some(a.cmp(e)),
        _ => None,
    }
}

/// String rendering used by the substring and regex operators. Strings
/// render without quotes; everything else renders as compact JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
