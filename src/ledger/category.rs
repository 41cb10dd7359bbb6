use serde::{Deserialize, Serialize};

use super::lenient;

/// Group assigned to categories that have none.
pub const DEFAULT_GROUP: &str = "Other";

/// Monthly budget line, keyed by name inside [`super::BudgetMonth`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Category {
    #[serde(deserialize_with = "lenient::text")]
    pub group: String,
    #[serde(deserialize_with = "lenient::amount")]
    pub budget: f64,
}

impl Category {
    pub fn new(group: impl Into<String>, budget: f64) -> Self {
        Self {
            group: group.into(),
            budget,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP, 0.0)
    }
}
