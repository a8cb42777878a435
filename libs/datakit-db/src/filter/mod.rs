//! Typed filter conditions and their normalization.
//!
//! Domain filter structs describe *what* a caller wants to see using explicit
//! optional fields. The [`FilterSet`] trait turns such a struct into a flat
//! list of [`FilterCondition`]s; [`sanitize`] then drops every condition that
//! could not constrain a query in a meaningful way. Nothing in this module
//! fails: bad input is removed, never reported.
//!
//! # Example
//!
//! ```
//! use datakit_db::filter::{FilterSetBuilder, FilterOperator, JoinOperator};
//!
//! let conditions = FilterSetBuilder::new()
//!     .eq_opt("status", Some("active"))
//!     .search(Some("jane"), &["display_name", "email"])
//!     .range("progress", Some(10), None::<i64>)
//!     .build();
//!
//! assert_eq!(conditions.len(), 4);
//! assert_eq!(conditions[1].operator, FilterOperator::Like);
//! assert_eq!(conditions[1].join_operator, JoinOperator::Or);
//! ```

mod eval;
pub mod expr;

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub use eval::{compare_values, values_equal};
pub use expr::FilterExpr;

/// Comparison applied by a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-insensitive substring match.
    Like,
    In,
    NotIn,
    /// Inclusive range; the value is a `[low, high]` pair.
    Between,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Like => "like",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "notIn",
            FilterOperator::Between => "between",
        };
        f.write_str(s)
    }
}

/// How a condition joins the rest of the list.
///
/// `And` conditions are conjoined with each other, `Or` conditions form one
/// disjunctive group, and the two groups are conjoined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinOperator {
    #[default]
    And,
    Or,
}

/// A single `field <operator> value` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
    #[serde(default)]
    pub join_operator: JoinOperator,
}

impl FilterCondition {
    #[must_use]
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            join_operator: JoinOperator::And,
        }
    }

    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    #[must_use]
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Ne, value)
    }

    #[must_use]
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Gt, value)
    }

    #[must_use]
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Gte, value)
    }

    #[must_use]
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Lt, value)
    }

    #[must_use]
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Lte, value)
    }

    #[must_use]
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Like, Value::String(pattern.into()))
    }

    #[must_use]
    pub fn in_list<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(
            field,
            FilterOperator::In,
            Value::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    #[must_use]
    pub fn not_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(
            field,
            FilterOperator::NotIn,
            Value::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    #[must_use]
    pub fn between(field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::new(
            field,
            FilterOperator::Between,
            Value::Array(vec![low.into(), high.into()]),
        )
    }

    /// Tag this condition as a member of the `or` group.
    #[must_use]
    pub fn or(mut self) -> Self {
        self.join_operator = JoinOperator::Or;
        self
    }

    /// Whether the condition survives [`sanitize`].
    #[must_use]
    pub fn is_retainable(&self) -> bool {
        match (&self.value, self.operator) {
            (Value::Null, _) => false,
            (Value::Array(items), FilterOperator::In | FilterOperator::NotIn) => !items.is_empty(),
            (_, FilterOperator::In | FilterOperator::NotIn) => false,
            (Value::Array(bounds), FilterOperator::Between) => {
                bounds.len() == 2 && bounds.iter().all(|b| !b.is_null())
            }
            (_, FilterOperator::Between) => false,
            (Value::String(s), op) => op == FilterOperator::Like || !s.is_empty(),
            _ => true,
        }
    }
}

/// Drop every condition that cannot be retained.
///
/// Removes null values, empty strings on non-`like` operators, empty or
/// non-collection values for `in`/`notIn`, and malformed `between` ranges.
/// Running it twice yields the same list as running it once.
#[must_use]
pub fn sanitize(conditions: &[FilterCondition]) -> Vec<FilterCondition> {
    conditions
        .iter()
        .filter(|c| c.is_retainable())
        .cloned()
        .collect()
}

/// A typed per-entity filter object.
pub trait FilterSet {
    /// Expand the present fields into conditions (not yet sanitized).
    fn conditions(&self) -> Vec<FilterCondition>;

    /// Expanded and sanitized conditions, ready for a query builder.
    fn to_conditions(&self) -> Vec<FilterCondition> {
        sanitize(&self.conditions())
    }
}

/// Inclusive date window; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    #[must_use]
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }
}

/// One id or a set of ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdFilter {
    One(Uuid),
    Many(Vec<Uuid>),
}

impl From<Uuid> for IdFilter {
    fn from(id: Uuid) -> Self {
        IdFilter::One(id)
    }
}

impl From<Vec<Uuid>> for IdFilter {
    fn from(ids: Vec<Uuid>) -> Self {
        IdFilter::Many(ids)
    }
}

/// Encode a timestamp as fixed-width UTC text (nanosecond precision).
#[must_use]
pub fn timestamp_value(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

/// Encode an id the same way entity rows serialize it.
#[must_use]
pub fn id_value(id: Uuid) -> Value {
    Value::String(id.to_string())
}

/// Fluent helper used by [`FilterSet`] implementations.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct FilterSetBuilder {
    conditions: Vec<FilterCondition>,
}

impl FilterSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// `field = value` when the value is present.
    pub fn eq_opt<V: Into<Value>>(mut self, field: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.conditions.push(FilterCondition::eq(field, v));
        }
        self
    }

    /// Free-text search: one `like` per field, all in the `or` group.
    ///
    /// Blank terms add nothing.
    pub fn search(mut self, term: Option<&str>, fields: &[&str]) -> Self {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return self;
        };
        self.conditions.extend(
            fields
                .iter()
                .map(|field| FilterCondition::like(*field, term).or()),
        );
        self
    }

    /// `min <= field <= max`, each side only when present.
    pub fn range<V: Into<Value>>(mut self, field: &str, min: Option<V>, max: Option<V>) -> Self {
        if let Some(min) = min {
            self.conditions.push(FilterCondition::gte(field, min));
        }
        if let Some(max) = max {
            self.conditions.push(FilterCondition::lte(field, max));
        }
        self
    }

    pub fn date_range(self, field: &str, range: Option<&DateRange>) -> Self {
        match range {
            Some(r) => self.range(
                field,
                r.start.map(timestamp_value),
                r.end.map(timestamp_value),
            ),
            None => self,
        }
    }

    /// `eq` for a single id, `in` for several, nothing for none.
    pub fn ids(mut self, field: &str, filter: Option<&IdFilter>) -> Self {
        match filter {
            Some(IdFilter::One(id)) => self.conditions.push(FilterCondition::eq(field, id_value(*id))),
            Some(IdFilter::Many(ids)) => match ids.as_slice() {
                [] => {}
                [only] => self.conditions.push(FilterCondition::eq(field, id_value(*only))),
                many => self.conditions.push(FilterCondition::in_list(
                    field,
                    many.iter().copied().map(id_value),
                )),
            },
            None => {}
        }
        self
    }

    /// Sanitized conditions.
    #[must_use]
    pub fn build(self) -> Vec<FilterCondition> {
        sanitize(&self.conditions)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitize_drops_unusable_conditions() {
        let conditions = vec![
            FilterCondition::eq("status", Value::Null),
            FilterCondition::eq("status", ""),
            FilterCondition::like("name", ""),
            FilterCondition::in_list("id", Vec::<Value>::new()),
            FilterCondition::new("id", FilterOperator::NotIn, "x"),
            FilterCondition::new("age", FilterOperator::Between, json!([1])),
            FilterCondition::new("age", FilterOperator::Between, json!([1, null])),
            FilterCondition::eq("status", "active"),
            FilterCondition::between("age", 1, 5),
        ];

        let kept = sanitize(&conditions);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].operator, FilterOperator::Like);
        assert_eq!(kept[1].value, json!("active"));
        assert_eq!(kept[2].operator, FilterOperator::Between);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let conditions = vec![
            FilterCondition::eq("a", Value::Null),
            FilterCondition::eq("b", 1),
            FilterCondition::in_list("c", [1, 2]),
            FilterCondition::not_in("d", Vec::<i64>::new()),
            FilterCondition::like("e", "x").or(),
            FilterCondition::gte("f", ""),
        ];
        let once = sanitize(&conditions);
        let twice = sanitize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn blank_search_adds_nothing() {
        let conditions = FilterSetBuilder::new()
            .search(Some("   "), &["a", "b"])
            .search(None, &["a"])
            .build();
        assert!(conditions.is_empty());
    }

    #[test]
    fn search_is_trimmed_and_or_joined() {
        let conditions = FilterSetBuilder::new()
            .search(Some("  jane "), &["first", "last", "email"])
            .build();
        assert_eq!(conditions.len(), 3);
        for c in &conditions {
            assert_eq!(c.operator, FilterOperator::Like);
            assert_eq!(c.join_operator, JoinOperator::Or);
            assert_eq!(c.value, json!("jane"));
        }
    }

    #[test]
    fn ids_expand_to_eq_or_in() {
        let one = Uuid::new_v4();
        let two = Uuid::new_v4();

        let single = FilterSetBuilder::new().ids("id", Some(&IdFilter::One(one))).build();
        assert_eq!(single[0].operator, FilterOperator::Eq);

        let collapsed = FilterSetBuilder::new()
            .ids("id", Some(&IdFilter::Many(vec![one])))
            .build();
        assert_eq!(collapsed[0].operator, FilterOperator::Eq);

        let many = FilterSetBuilder::new()
            .ids("id", Some(&IdFilter::Many(vec![one, two])))
            .build();
        assert_eq!(many[0].operator, FilterOperator::In);
        assert_eq!(many[0].value, json!([one.to_string(), two.to_string()]));

        let none = FilterSetBuilder::new()
            .ids("id", Some(&IdFilter::Many(vec![])))
            .build();
        assert!(none.is_empty());
    }

    #[test]
    fn date_range_expands_to_gte_lte() {
        let start = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let conditions = FilterSetBuilder::new()
            .date_range("created_at", Some(&DateRange::new(Some(start), None)))
            .build();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].operator, FilterOperator::Gte);
        assert_eq!(conditions[0].value, json!("2024-01-01T00:00:00.000000000Z"));
    }

    #[test]
    fn operator_names_match_wire_format() {
        assert_eq!(FilterOperator::NotIn.to_string(), "notIn");
        assert_eq!(
            serde_json::to_value(FilterOperator::NotIn).unwrap(),
            json!("notIn")
        );
    }
}
