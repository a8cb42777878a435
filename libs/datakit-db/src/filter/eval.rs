use std::cmp::Ordering;

use chrono::DateTime;
use serde_json::Value;

use super::{FilterCondition, FilterOperator};

/// Order two scalar values the way a SQL store would.
///
/// Numbers compare numerically, RFC 3339 timestamps chronologically and other
/// strings lexically. Mixed or non-scalar pairs are incomparable.
#[must_use]
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => {
            match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
                (Ok(a), Ok(b)) => Some(a.cmp(&b)),
                _ => Some(a.cmp(b)),
            }
        }
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Equality consistent with [`compare_values`].
#[must_use]
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match compare_values(left, right) {
        Some(ordering) => ordering == Ordering::Equal,
        None => left == right,
    }
}

fn like(value: &Value, pattern: &Value) -> bool {
    let (Value::String(haystack), Value::String(needle)) = (value, pattern) else {
        return false;
    };
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn in_list(value: &Value, list: &Value) -> bool {
    match list {
        Value::Array(items) => items.iter().any(|item| values_equal(value, item)),
        _ => false,
    }
}

/// Evaluate one condition against a resolved column value.
///
/// A missing or null column never matches, not even for `ne`/`notIn`.
pub(crate) fn matches_condition(condition: &FilterCondition, value: Option<&Value>) -> bool {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return false;
    };
    let expected = &condition.value;
    let ordering = || compare_values(value, expected);

    match condition.operator {
        FilterOperator::Eq => values_equal(value, expected),
        FilterOperator::Ne => !values_equal(value, expected),
        FilterOperator::Gt => ordering() == Some(Ordering::Greater),
        FilterOperator::Gte => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
        FilterOperator::Lt => ordering() == Some(Ordering::Less),
        FilterOperator::Lte => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
        FilterOperator::Like => like(value, expected),
        FilterOperator::In => in_list(value, expected),
        FilterOperator::NotIn => matches!(expected, Value::Array(_)) && !in_list(value, expected),
        FilterOperator::Between => match expected {
            Value::Array(bounds) if bounds.len() == 2 => {
                matches!(
                    compare_values(value, &bounds[0]),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(
                    compare_values(value, &bounds[1]),
                    Some(Ordering::Less | Ordering::Equal)
                )
            }
            _ => false,
        },
    }
}
