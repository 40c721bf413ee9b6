// Entity Models
//
// - Expense: immutable record of a spend (identity = UUID)
// - Category: a name plus a monthly limit kept in a separate mapping
// - Routine: remembered description, compared case-insensitively

pub mod expense;
pub mod category;
pub mod routine;

pub use expense::Expense;
pub use category::{BudgetStatus, CategoryLimits, UNCATEGORIZED};
