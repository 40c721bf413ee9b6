// ✅ Form Validation - Checks run before anything reaches the reducer
//
// Invalid input never becomes an Action: each form parses and validates
// its raw text, and only a valid result is turned into actions.

use thiserror::Error;

use crate::entities::routine::is_routine;
use crate::entities::Expense;
use crate::state::Action;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Description is required")]
    EmptyDescription,

    #[error("Amount must be a number greater than zero")]
    NonPositiveAmount,

    #[error("Pick a category")]
    NoCategory,

    #[error("Category name is required")]
    EmptyCategoryName,

    #[error("Limit must be a number greater than zero")]
    InvalidLimit,

    #[error("Balance must be a number of zero or more")]
    InvalidBalance,
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// ============================================================================
// EXPENSE FORM
// ============================================================================

/// Validated "add expense" input
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: f64,
    pub category: String,
}

impl ExpenseDraft {
    pub fn parse(description: &str, amount: &str, category: &str) -> Result<Self, ValidationError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }

        let amount = parse_number(amount)
            .filter(|a| *a > 0.0)
            .ok_or(ValidationError::NonPositiveAmount)?;

        let category = category.trim();
        if category.is_empty() {
            return Err(ValidationError::NoCategory);
        }

        Ok(ExpenseDraft {
            description: description.to_string(),
            amount,
            category: category.to_string(),
        })
    }

    /// Unknown descriptions trigger the "save as routine?" prompt
    pub fn needs_routine_prompt(&self, routines: &[String]) -> bool {
        !is_routine(routines, &self.description)
    }

    /// Actions for this draft. When `save_as_routine` is set the routine is
    /// recorded before the expense.
    pub fn into_actions(self, save_as_routine: bool) -> Vec<Action> {
        let mut actions = Vec::with_capacity(2);

        if save_as_routine {
            actions.push(Action::AddRoutine(self.description.clone()));
        }
        actions.push(Action::AddExpense(Expense::new(
            &self.description,
            self.amount,
            &self.category,
        )));

        actions
    }
}

// ============================================================================
// CATEGORY FORMS
// ============================================================================

/// New category with its monthly limit
pub fn new_category(name: &str, limit: &str) -> Result<Vec<Action>, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyCategoryName);
    }

    let limit = parse_limit(limit)?;

    Ok(vec![
        Action::AddCategory(name.to_string()),
        Action::SetCategoryLimit {
            category: name.to_string(),
            limit,
        },
    ])
}

/// Edited limit for an existing category
pub fn edit_limit(category: &str, limit: &str) -> Result<Action, ValidationError> {
    Ok(Action::SetCategoryLimit {
        category: category.to_string(),
        limit: parse_limit(limit)?,
    })
}

fn parse_limit(raw: &str) -> Result<f64, ValidationError> {
    parse_number(raw)
        .filter(|l| *l > 0.0)
        .ok_or(ValidationError::InvalidLimit)
}

// ============================================================================
// BANK BALANCE
// ============================================================================

pub fn bank_balance(raw: &str) -> Result<Action, ValidationError> {
    parse_number(raw)
        .filter(|b| *b >= 0.0)
        .map(Action::SetBankBalance)
        .ok_or(ValidationError::InvalidBalance)
}

// ============================================================================
// TESTS
// ============================================================================
