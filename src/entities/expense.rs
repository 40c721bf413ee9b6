// 💸 Expense Entity - A single recorded spend
//
// An expense is created once and never mutated afterwards:
// - id is generated at creation (UUID v4)
// - date is stamped at creation and stays fixed
// - category is free text (a category name or the "Uncategorized" sentinel)
//
// Deleting a category does NOT rewrite the expenses that reference it.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::category::UNCATEGORIZED;

// ============================================================================
// EXPENSE ENTITY
// ============================================================================

/// Expense - immutable record of money spent
///
/// Serialized with camelCase keys so the persisted JSON matches the
/// layout used by earlier versions of the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Stable identity, unique per expense
    pub id: String,

    /// Free-text description (e.g., "Coffee", "Metro card")
    pub description: String,

    /// Non-negative amount spent
    pub amount: f64,

    /// Category name this expense is tagged with
    pub category: String,

    /// When the expense was recorded
    pub date: DateTime<Utc>,
}

impl Expense {
    /// Create a new expense stamped with a fresh id and the current time.
    ///
    /// The description is trimmed. An empty category falls back to
    /// `Uncategorized`.
    pub fn new(description: &str, amount: f64, category: &str) -> Self {
        Self::at(description, amount, category, Utc::now())
    }

    /// Create a new expense with an explicit timestamp.
    pub fn at(description: &str, amount: f64, category: &str, date: DateTime<Utc>) -> Self {
        let category = category.trim();

        Expense {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.trim().to_string(),
            amount,
            category: if category.is_empty() {
                UNCATEGORIZED.to_string()
            } else {
                category.to_string()
            },
            date,
        }
    }

    /// Check if the expense falls in the same calendar month and year as `now`,
    /// evaluated in `now`'s time zone.
    pub fn is_in_month_of<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        let local = self.date.with_timezone(&now.timezone());
        local.month() == now.month() && local.year() == now.year()
    }

    pub fn is_uncategorized(&self) -> bool {
        self.category == UNCATEGORIZED
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_expense_creation() {
        let expense = Expense::new("  Coffee  ", 120.0, "Food");

        assert!(!expense.id.is_empty());
        assert_eq!(expense.description, "Coffee");
        assert_eq!(expense.amount, 120.0);
        assert_eq!(expense.category, "Food");
        assert!(!expense.is_uncategorized());
    }

    #[test]
    fn test_expense_ids_are_unique() {
        let a = Expense::new("Coffee", 10.0, "Food");
        let b = Expense::new("Coffee", 10.0, "Food");

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_empty_category_falls_back_to_uncategorized() {
        let expense = Expense::new("Parking", 40.0, "   ");

        assert_eq!(expense.category, UNCATEGORIZED);
        assert!(expense.is_uncategorized());
    }

    #[test]
    fn test_is_in_month_of() {
        let expense = Expense::at("Rent", 9000.0, "Bills", utc(2026, 3, 15));

        assert!(expense.is_in_month_of(&utc(2026, 3, 1)));
        assert!(expense.is_in_month_of(&utc(2026, 3, 31)));
        assert!(!expense.is_in_month_of(&utc(2026, 4, 15)));

        // Same month, different year
        assert!(!expense.is_in_month_of(&utc(2025, 3, 15)));
    }

    #[test]
    fn test_json_layout_uses_camel_case() {
        let expense = Expense::at("Coffee", 50.0, "Food", utc(2026, 1, 2));
        let json = serde_json::to_value(&expense).unwrap();

        assert_eq!(json["description"], "Coffee");
        assert_eq!(json["amount"], 50.0);
        assert_eq!(json["category"], "Food");
        assert!(json["date"].as_str().unwrap().starts_with("2026-01-02T12:00:00"));
    }
}
