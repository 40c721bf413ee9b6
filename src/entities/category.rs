// 🏷️ Category Entity - Budget categories and their monthly limits
//
// A category is just a unique name. Its monthly limit lives in a separate
// mapping keyed by that name, so removing a category drops its limit entry
// while expenses keep the name as free text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category text assigned to expenses recorded without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Monthly limit per category name
pub type CategoryLimits = BTreeMap<String, f64>;

// ============================================================================
// BUDGET STATUS
// ============================================================================

/// Spent/remaining figures for one category over the current month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    /// Category name
    pub name: String,

    /// Configured monthly limit (0 when none set)
    pub limit: f64,

    /// Sum of this month's expenses tagged with the category
    pub spent: f64,

    /// max(0, limit - spent)
    pub remaining: f64,

    /// spent > limit
    pub over_budget: bool,

    /// max(0, spent - limit)
    pub over_amount: f64,
}

impl BudgetStatus {
    pub fn new(name: impl Into<String>, limit: f64, spent: f64) -> Self {
        BudgetStatus {
            name: name.into(),
            limit,
            spent,
            remaining: (limit - spent).max(0.0),
            over_budget: spent > limit,
            over_amount: (spent - limit).max(0.0),
        }
    }

    /// Share of the limit used, capped at 100. A zero limit reports 0.
    pub fn used_percent(&self) -> f64 {
        if self.limit > 0.0 {
            (self.spent / self.limit * 100.0).min(100.0)
        } else {
            0.0
        }
    }

    /// How far past the limit spending went, as a percentage capped at 50.
    pub fn over_percent(&self) -> f64 {
        if self.limit > 0.0 && self.spent > self.limit {
            ((self.spent - self.limit) / self.limit * 100.0).min(50.0)
        } else {
            0.0
        }
    }

    /// Signed remaining amount (negative once over budget), as shown in
    /// the dashboard snapshot.
    pub fn balance(&self) -> f64 {
        self.limit - self.spent
    }
}

// ============================================================================
// TESTS
// ============================================================================
