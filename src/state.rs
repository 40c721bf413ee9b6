// 🧠 Domain State + Reducer
//
// The reducer is a pure function `apply(&state, action) -> state'`:
// - the previous state is never modified
// - untouched slices are cloned, never shared mutably
// - every action is infallible; an action that does not apply is a no-op
//
// Form validation happens before dispatch (see `validation`), so the
// reducer trusts its inputs.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::entities::routine::is_routine;
use crate::entities::{CategoryLimits, Expense};

// ============================================================================
// DOMAIN STATE
// ============================================================================

/// Complete in-memory domain state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// Expenses, newest first
    pub expenses: Vec<Expense>,

    /// Category names, in creation order
    pub categories: Vec<String>,

    /// Monthly limit per category name
    pub category_limits: CategoryLimits,

    /// Remembered descriptions (unique, case-insensitive)
    pub routines: Vec<String>,

    /// Bank balance the user entered
    pub bank_balance: f64,

    /// Presentation theme flag
    pub dark_mode: bool,
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Every state transition the domain supports.
///
/// Wire form is `{"type": "ADD_EXPENSE", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddExpense(Expense),
    DeleteExpense(String),
    AddCategory(String),
    DeleteCategory(String),
    SetCategoryLimit { category: String, limit: f64 },
    AddRoutine(String),
    SetBankBalance(f64),
    ToggleDarkMode,

    /// Any action type this build does not know; applying it is a no-op
    Unknown,
}

/// Action envelope before the payload is interpreted
#[derive(Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct LimitPayload {
    category: String,
    limit: f64,
}

// Unknown types decode to `Unknown` whatever their payload; known types
// must carry a well-formed one.
impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawAction::deserialize(deserializer)?;
        decode_action(raw).map_err(de::Error::custom)
    }
}

fn decode_action(raw: RawAction) -> Result<Action, serde_json::Error> {
    let payload = raw.payload;

    let action = match raw.kind.as_str() {
        "ADD_EXPENSE" => Action::AddExpense(serde_json::from_value(payload)?),
        "DELETE_EXPENSE" => Action::DeleteExpense(serde_json::from_value(payload)?),
        "ADD_CATEGORY" => Action::AddCategory(serde_json::from_value(payload)?),
        "DELETE_CATEGORY" => Action::DeleteCategory(serde_json::from_value(payload)?),
        "SET_CATEGORY_LIMIT" => {
            let LimitPayload { category, limit } = serde_json::from_value(payload)?;
            Action::SetCategoryLimit { category, limit }
        }
        "ADD_ROUTINE" => Action::AddRoutine(serde_json::from_value(payload)?),
        "SET_BANK_BALANCE" => Action::SetBankBalance(serde_json::from_value(payload)?),
        "TOGGLE_DARK_MODE" => Action::ToggleDarkMode,
        other => {
            tracing::debug!(action = other, "ignoring unknown action type");
            Action::Unknown
        }
    };

    Ok(action)
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddExpense(_) => "ADD_EXPENSE",
            Action::DeleteExpense(_) => "DELETE_EXPENSE",
            Action::AddCategory(_) => "ADD_CATEGORY",
            Action::DeleteCategory(_) => "DELETE_CATEGORY",
            Action::SetCategoryLimit { .. } => "SET_CATEGORY_LIMIT",
            Action::AddRoutine(_) => "ADD_ROUTINE",
            Action::SetBankBalance(_) => "SET_BANK_BALANCE",
            Action::ToggleDarkMode => "TOGGLE_DARK_MODE",
            Action::Unknown => "UNKNOWN",
        }
    }
}

// ============================================================================
// REDUCER
// ============================================================================

/// Apply `action` to `state`, returning the next state.
pub fn apply(state: &AppState, action: &Action) -> AppState {
    match action {
        Action::AddExpense(expense) => {
            let mut expenses = Vec::with_capacity(state.expenses.len() + 1);
            expenses.push(expense.clone());
            expenses.extend(state.expenses.iter().cloned());

            AppState {
                expenses,
                ..state.clone()
            }
        }

        Action::DeleteExpense(id) => AppState {
            expenses: state
                .expenses
                .iter()
                .filter(|e| &e.id != id)
                .cloned()
                .collect(),
            ..state.clone()
        },

        Action::AddCategory(name) => {
            if state.categories.contains(name) {
                return state.clone();
            }

            let mut next = state.clone();
            next.categories.push(name.clone());
            next
        }

        Action::DeleteCategory(name) => {
            let mut next = state.clone();
            next.categories.retain(|c| c != name);
            next.category_limits.remove(name);
            next
        }

        Action::SetCategoryLimit { category, limit } => {
            let mut next = state.clone();
            next.category_limits.insert(category.clone(), *limit);
            next
        }

        Action::AddRoutine(text) => {
            if is_routine(&state.routines, text) {
                return state.clone();
            }

            let mut next = state.clone();
            next.routines.push(text.clone());
            next
        }

        Action::SetBankBalance(value) => AppState {
            bank_balance: *value,
            ..state.clone()
        },

        Action::ToggleDarkMode => AppState {
            dark_mode: !state.dark_mode,
            ..state.clone()
        },

        Action::Unknown => state.clone(),
    }
}

/// Replay a sequence of actions from `initial`.
pub fn replay<'a, I>(initial: &AppState, actions: I) -> AppState
where
    I: IntoIterator<Item = &'a Action>,
{
    actions
        .into_iter()
        .fold(initial.clone(), |state, action| apply(&state, action))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(description: &str, amount: f64, category: &str) -> Expense {
        Expense::new(description, amount, category)
    }

    #[test]
    fn test_add_expense_prepends() {
        let first = expense("Coffee", 50.0, "Food");
        let second = expense("Metro", 30.0, "Transport");

        let state = replay(
            &AppState::default(),
            &[Action::AddExpense(first.clone()), Action::AddExpense(second.clone())],
        );

        assert_eq!(state.expenses.len(), 2);
        assert_eq!(state.expenses[0], second, "Newest expense should come first");
        assert_eq!(state.expenses[1], first);
    }

    #[test]
    fn test_previous_state_is_untouched() {
        let before = AppState::default();
        let after = apply(&before, &Action::AddExpense(expense("Coffee", 50.0, "Food")));

        assert!(before.expenses.is_empty());
        assert_eq!(after.expenses.len(), 1);
    }

    #[test]
    fn test_delete_expense_is_idempotent() {
        let coffee = expense("Coffee", 50.0, "Food");
        let state = apply(&AppState::default(), &Action::AddExpense(coffee.clone()));

        let once = apply(&state, &Action::DeleteExpense(coffee.id.clone()));
        let twice = apply(&once, &Action::DeleteExpense(coffee.id.clone()));

        assert!(once.expenses.is_empty());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_delete_unknown_expense_is_noop() {
        let state = apply(
            &AppState::default(),
            &Action::AddExpense(expense("Coffee", 50.0, "Food")),
        );
        let next = apply(&state, &Action::DeleteExpense("missing".to_string()));

        assert_eq!(state, next);
    }

    #[test]
    fn test_add_category_rejects_exact_duplicates() {
        let state = replay(
            &AppState::default(),
            &[
                Action::AddCategory("Food".to_string()),
                Action::AddCategory("Food".to_string()),
                Action::AddCategory("food".to_string()),
            ],
        );

        // Exact match is case-sensitive, so "food" is a separate category
        assert_eq!(state.categories, vec!["Food".to_string(), "food".to_string()]);
    }

    #[test]
    fn test_delete_category_keeps_expense_labels() {
        let rent = expense("Rent", 9000.0, "Bills");
        let state = replay(
            &AppState::default(),
            &[
                Action::AddCategory("Bills".to_string()),
                Action::SetCategoryLimit {
                    category: "Bills".to_string(),
                    limit: 10000.0,
                },
                Action::AddExpense(rent),
                Action::DeleteCategory("Bills".to_string()),
            ],
        );

        assert!(state.categories.is_empty());
        assert!(!state.category_limits.contains_key("Bills"));
        assert_eq!(state.expenses[0].category, "Bills");
    }

    #[test]
    fn test_set_category_limit_upserts() {
        let state = replay(
            &AppState::default(),
            &[
                Action::SetCategoryLimit {
                    category: "Food".to_string(),
                    limit: 500.0,
                },
                Action::SetCategoryLimit {
                    category: "Food".to_string(),
                    limit: 750.0,
                },
            ],
        );

        assert_eq!(state.category_limits.len(), 1);
        assert_eq!(state.category_limits["Food"], 750.0);
    }

    #[test]
    fn test_add_routine_ignores_case_duplicates() {
        let state = replay(
            &AppState::default(),
            &[
                Action::AddRoutine("Coffee".to_string()),
                Action::AddRoutine("coffee".to_string()),
            ],
        );

        assert_eq!(state.routines, vec!["Coffee".to_string()]);
    }

    #[test]
    fn test_bank_balance_and_dark_mode() {
        let state = replay(
            &AppState::default(),
            &[
                Action::SetBankBalance(1000.0),
                Action::ToggleDarkMode,
                Action::SetBankBalance(2500.0),
            ],
        );

        assert_eq!(state.bank_balance, 2500.0);
        assert!(state.dark_mode);

        let toggled_back = apply(&state, &Action::ToggleDarkMode);
        assert!(!toggled_back.dark_mode);
    }

    #[test]
    fn test_action_json_shape() {
        let action = Action::SetCategoryLimit {
            category: "Food".to_string(),
            limit: 500.0,
        };
        let json = serde_json::to_value(&action).unwrap();

        assert_eq!(json["type"], "SET_CATEGORY_LIMIT");
        assert_eq!(json["payload"]["category"], "Food");
        assert_eq!(action.name(), "SET_CATEGORY_LIMIT");

        let toggle: Action = serde_json::from_str(r#"{"type":"TOGGLE_DARK_MODE"}"#).unwrap();
        assert_eq!(toggle, Action::ToggleDarkMode);
    }

    #[test]
    fn test_unknown_action_leaves_state_unchanged() {
        let action: Action = serde_json::from_str(r#"{"type":"RENAME_EVERYTHING"}"#).unwrap();
        assert_eq!(action, Action::Unknown);

        let state = apply(&AppState::default(), &Action::SetBankBalance(10.0));
        assert_eq!(apply(&state, &action), state);
    }

    #[test]
    fn test_unknown_action_with_payload_is_ignored() {
        for raw in [
            r#"{"type":"RENAME","payload":{"x":1}}"#,
            r#"{"type":"RENAME","payload":"abc"}"#,
            r#"{"type":"RENAME","payload":[1,2,3]}"#,
        ] {
            let action: Action = serde_json::from_str(raw).unwrap();
            assert_eq!(action, Action::Unknown, "{}", raw);
        }
    }

    #[test]
    fn test_known_actions_decode_from_wire_form() {
        let limit: Action = serde_json::from_str(
            r#"{"type":"SET_CATEGORY_LIMIT","payload":{"category":"Food","limit":500}}"#,
        )
        .unwrap();
        assert_eq!(
            limit,
            Action::SetCategoryLimit {
                category: "Food".to_string(),
                limit: 500.0
            }
        );

        let toggle: Action = serde_json::from_str(r#"{"type":"TOGGLE_DARK_MODE"}"#).unwrap();
        assert_eq!(toggle, Action::ToggleDarkMode);

        let expense = Expense::new("Coffee", 50.0, "Food");
        let json = serde_json::to_string(&Action::AddExpense(expense.clone())).unwrap();
        assert_eq!(
            serde_json::from_str::<Action>(&json).unwrap(),
            Action::AddExpense(expense)
        );
    }

    #[test]
    fn test_known_action_with_bad_payload_is_rejected() {
        let result = serde_json::from_str::<Action>(r#"{"type":"SET_BANK_BALANCE","payload":"lots"}"#);
        assert!(result.is_err());
    }
}
