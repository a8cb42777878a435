use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Implementation {
    New,
    Legacy,
}

impl Implementation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Implementation::New => "new",
            Implementation::Legacy => "legacy",
        }
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which implementation served one routed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    pub operation_name: String,
    pub implementation: Implementation,
    /// The new implementation failed and legacy served the call.
    pub fell_back: bool,
    pub timestamp: DateTime<Utc>,
}

impl RoutingDecision {
    #[must_use]
    pub fn new(operation_name: impl Into<String>, implementation: Implementation, fell_back: bool) -> Self {
        Self {
            operation_name: operation_name.into(),
            implementation,
            fell_back,
            timestamp: Utc::now(),
        }
    }
}
