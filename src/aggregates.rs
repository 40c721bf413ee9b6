// 📊 Derived Aggregates - Totals and budget status
//
// Everything here is recomputed from the current state on every read.
// "This month" means the calendar month and year of the `now` passed in,
// evaluated in `now`'s time zone (callers pass `Local::now()`).

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entities::{BudgetStatus, Expense};
use crate::state::AppState;

// ============================================================================
// TOTALS
// ============================================================================

/// Headline figures shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of all expense amounts
    pub total_spent: f64,

    /// Sum of amounts recorded in the current calendar month
    pub monthly_spent: f64,

    /// bank_balance - total_spent (may be negative)
    pub current_balance: f64,

    /// Sum of limits over existing categories
    pub total_monthly_budget: f64,

    /// total_monthly_budget - monthly_spent (may be negative)
    pub monthly_remaining: f64,
}

impl Totals {
    pub fn compute<Tz: TimeZone>(state: &AppState, now: &DateTime<Tz>) -> Self {
        let total_spent = total_spent(&state.expenses);
        let monthly_spent = monthly_spent(&state.expenses, now);
        let total_monthly_budget = total_monthly_budget(state);

        Totals {
            total_spent,
            monthly_spent,
            current_balance: state.bank_balance - total_spent,
            total_monthly_budget,
            monthly_remaining: total_monthly_budget - monthly_spent,
        }
    }

    /// Share of the monthly budget already spent, capped at 100.
    /// Reports 0 when no budget is configured.
    pub fn budget_used_percent(&self) -> f64 {
        if self.total_monthly_budget > 0.0 {
            (self.monthly_spent / self.total_monthly_budget * 100.0).min(100.0)
        } else {
            0.0
        }
    }

    pub fn is_overdrawn(&self) -> bool {
        self.current_balance < 0.0
    }
}

pub fn total_spent(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

pub fn monthly_spent<Tz: TimeZone>(expenses: &[Expense], now: &DateTime<Tz>) -> f64 {
    expenses
        .iter()
        .filter(|e| e.is_in_month_of(now))
        .map(|e| e.amount)
        .sum()
}

/// Sum of limits over categories that still exist. Limits left behind
/// for names no longer in the category list are ignored.
pub fn total_monthly_budget(state: &AppState) -> f64 {
    state
        .categories
        .iter()
        .map(|c| state.category_limits.get(c).copied().unwrap_or(0.0))
        .sum()
}

// ============================================================================
// BUDGET STATUS
// ============================================================================

/// This month's spend grouped by category text (including orphaned labels)
pub fn spent_this_month<Tz: TimeZone>(
    expenses: &[Expense],
    now: &DateTime<Tz>,
) -> HashMap<String, f64> {
    let mut spent: HashMap<String, f64> = HashMap::new();

    for expense in expenses.iter().filter(|e| e.is_in_month_of(now)) {
        *spent.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
    }

    spent
}

/// Budget status for every existing category, in category order
pub fn budget_overview<Tz: TimeZone>(state: &AppState, now: &DateTime<Tz>) -> Vec<BudgetStatus> {
    let spent = spent_this_month(&state.expenses, now);

    state
        .categories
        .iter()
        .map(|name| {
            BudgetStatus::new(
                name.clone(),
                state.category_limits.get(name).copied().unwrap_or(0.0),
                spent.get(name).copied().unwrap_or(0.0),
            )
        })
        .collect()
}

/// Budget status for one category (existing or not)
pub fn budget_status<Tz: TimeZone>(state: &AppState, category: &str, now: &DateTime<Tz>) -> BudgetStatus {
    let spent = state
        .expenses
        .iter()
        .filter(|e| e.category == category && e.is_in_month_of(now))
        .map(|e| e.amount)
        .sum();

    BudgetStatus::new(
        category,
        state.category_limits.get(category).copied().unwrap_or(0.0),
        spent,
    )
}

// ============================================================================
// EXPENSE FILTER
// ============================================================================

/// Dashboard list filter
///
/// All conditions must hold. Date bounds are inclusive calendar days in
/// the filter's time zone: `from` starts at 00:00:00, `to` ends at 23:59:59.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    /// Exact category name; None means "All"
    pub category: Option<String>,

    /// Case-insensitive description substring
    pub search: String,

    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl ExpenseFilter {
    pub fn is_active(&self) -> bool {
        self.category.is_some()
            || !self.search.is_empty()
            || self.date_from.is_some()
            || self.date_to.is_some()
    }

    pub fn matches<Tz: TimeZone>(&self, expense: &Expense, tz: &Tz) -> bool {
        if let Some(category) = &self.category {
            if &expense.category != category {
                return false;
            }
        }

        if !self.search.is_empty()
            && !expense
                .description
                .to_lowercase()
                .contains(&self.search.to_lowercase())
        {
            return false;
        }

        let when = expense.date.with_timezone(tz).naive_local();

        if let Some(from) = self.date_from {
            if when < from.and_hms_opt(0, 0, 0).unwrap_or_default() {
                return false;
            }
        }

        if let Some(to) = self.date_to {
            // End of day, 23:59:59 inclusive
            let end = to.and_hms_opt(23, 59, 59).unwrap_or_default() + Duration::seconds(1);
            if when >= end {
                return false;
            }
        }

        true
    }

    pub fn apply<'a, Tz: TimeZone>(&self, expenses: &'a [Expense], tz: &Tz) -> Vec<&'a Expense> {
        expenses.iter().filter(|e| self.matches(e, tz)).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
