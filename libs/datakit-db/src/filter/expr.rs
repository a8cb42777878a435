//! Boolean filter trees.
//!
//! [`FilterExpr::from_conditions`] implements the default two-level rule:
//! every `and`-tagged condition is conjoined, every `or`-tagged condition
//! forms one disjunctive group, and the group is conjoined with the rest.
//! A condition list therefore cannot express `(a AND b) OR c`; build the tree
//! directly for that.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::eval::matches_condition;
use super::{FilterCondition, JoinOperator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterExpr {
    /// Conjunction. Empty means "always true".
    And(Vec<FilterExpr>),
    /// Disjunction. Empty means "always false".
    Or(Vec<FilterExpr>),
    Leaf(FilterCondition),
}

impl Default for FilterExpr {
    fn default() -> Self {
        FilterExpr::always()
    }
}

impl From<FilterCondition> for FilterExpr {
    fn from(condition: FilterCondition) -> Self {
        FilterExpr::Leaf(condition)
    }
}

impl FilterExpr {
    #[must_use]
    pub fn always() -> Self {
        FilterExpr::And(Vec::new())
    }

    #[must_use]
    pub fn never() -> Self {
        FilterExpr::Or(Vec::new())
    }

    /// Two-level combination of a flat condition list.
    #[must_use]
    pub fn from_conditions(conditions: &[FilterCondition]) -> Self {
        let (ors, ands): (Vec<_>, Vec<_>) = conditions
            .iter()
            .cloned()
            .partition(|c| c.join_operator == JoinOperator::Or);

        let mut children: Vec<FilterExpr> = ands.into_iter().map(FilterExpr::Leaf).collect();
        match ors.len() {
            0 => {}
            1 => children.extend(ors.into_iter().map(FilterExpr::Leaf)),
            _ => children.push(FilterExpr::Or(ors.into_iter().map(FilterExpr::Leaf).collect())),
        }

        if children.len() == 1 {
            children.remove(0)
        } else {
            FilterExpr::And(children)
        }
    }

    /// Conjoin with another expression, flattening nested conjunctions.
    #[must_use]
    pub fn and(self, other: FilterExpr) -> Self {
        let mut children = match self {
            FilterExpr::And(children) => children,
            other_kind => vec![other_kind],
        };
        match other {
            FilterExpr::And(more) => children.extend(more),
            other_kind => children.push(other_kind),
        }
        if children.len() == 1 {
            children.remove(0)
        } else {
            FilterExpr::And(children)
        }
    }

    /// True when the expression places no constraint at all.
    #[must_use]
    pub fn is_always(&self) -> bool {
        matches!(self, FilterExpr::And(children) if children.iter().all(FilterExpr::is_always))
    }

    /// Every leaf condition, depth first.
    #[must_use]
    pub fn leaves(&self) -> Vec<&FilterCondition> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FilterCondition>) {
        match self {
            FilterExpr::And(children) | FilterExpr::Or(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
            FilterExpr::Leaf(condition) => out.push(condition),
        }
    }

    /// Evaluate against a row, resolving columns through `lookup`.
    pub fn matches<'a, F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<&'a Value>,
    {
        match self {
            FilterExpr::And(children) => children.iter().all(|c| c.matches(lookup)),
            FilterExpr::Or(children) => children.iter().any(|c| c.matches(lookup)),
            FilterExpr::Leaf(condition) => matches_condition(condition, lookup(&condition.field)),
        }
    }
}
