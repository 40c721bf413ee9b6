//! Property tests for the reducer, the aggregates and the lock start rule.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use money_tracker::aggregates::{budget_status, total_monthly_budget, total_spent};
use money_tracker::lock::starts_locked;
use money_tracker::{apply, replay, Action, AppState, BudgetStatus, Expense};

fn arb_amount() -> impl Strategy<Value = f64> {
    (1u32..10_000_000).prop_map(|cents| cents as f64 / 100.0)
}

fn arb_description() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z ]{0,15}"
}

fn arb_category() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Food".to_string()),
        Just("Transport".to_string()),
        Just("Bills".to_string()),
        Just("Fun".to_string()),
    ]
}

fn arb_expenses() -> impl Strategy<Value = Vec<Expense>> {
    prop::collection::vec(
        (arb_description(), arb_amount(), arb_category())
            .prop_map(|(d, a, c)| Expense::new(&d, a, &c)),
        0..30,
    )
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #[test]
    fn prop_total_spent_is_sum_in_any_order(expenses in arb_expenses()) {
        let expected: f64 = expenses.iter().map(|e| e.amount).sum();

        let forward: Vec<Action> = expenses.iter().cloned().map(Action::AddExpense).collect();
        let backward: Vec<Action> = forward.iter().rev().cloned().collect();

        let a = replay(&AppState::default(), &forward);
        let b = replay(&AppState::default(), &backward);

        prop_assert!(close(total_spent(&a.expenses), expected));
        prop_assert!(close(total_spent(&b.expenses), expected));
        prop_assert_eq!(a.expenses.len(), expenses.len());
    }

    #[test]
    fn prop_newest_expense_first(expenses in arb_expenses()) {
        let actions: Vec<Action> = expenses.iter().cloned().map(Action::AddExpense).collect();
        let state = replay(&AppState::default(), &actions);

        let ids: Vec<&str> = state.expenses.iter().map(|e| e.id.as_str()).collect();
        let expected: Vec<&str> = expenses.iter().rev().map(|e| e.id.as_str()).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn prop_delete_expense_is_idempotent(expenses in arb_expenses(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!expenses.is_empty());

        let actions: Vec<Action> = expenses.iter().cloned().map(Action::AddExpense).collect();
        let state = replay(&AppState::default(), &actions);
        let target = pick.get(&expenses).id.clone();

        let once = apply(&state, &Action::DeleteExpense(target.clone()));
        let twice = apply(&once, &Action::DeleteExpense(target.clone()));

        prop_assert_eq!(&once, &twice);
        prop_assert!(once.expenses.iter().all(|e| e.id != target));
        prop_assert_eq!(once.expenses.len(), expenses.len() - 1);
    }

    #[test]
    fn prop_add_category_is_idempotent(name in arb_category(), others in prop::collection::vec(arb_category(), 0..6)) {
        let mut state = AppState::default();
        for other in &others {
            state = apply(&state, &Action::AddCategory(other.clone()));
        }

        let once = apply(&state, &Action::AddCategory(name.clone()));
        let twice = apply(&once, &Action::AddCategory(name.clone()));

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.categories.iter().filter(|c| **c == name).count(), 1);
    }

    #[test]
    fn prop_routines_are_case_insensitive(text in arb_description()) {
        let state = replay(
            &AppState::default(),
            &[
                Action::AddRoutine(text.clone()),
                Action::AddRoutine(text.to_uppercase()),
                Action::AddRoutine(text.to_lowercase()),
            ],
        );

        prop_assert_eq!(state.routines, vec![text]);
    }

    #[test]
    fn prop_budget_status_matches_limit(limit in arb_amount(), spent in 0u32..20_000_000) {
        let spent = spent as f64 / 100.0;
        let status = BudgetStatus::new("Food", limit, spent);

        prop_assert_eq!(status.over_budget, spent > limit);
        prop_assert!(close(status.remaining, (limit - spent).max(0.0)));
        prop_assert!(status.used_percent() <= 100.0);
        prop_assert!(status.over_percent() <= 50.0);
        if status.over_budget {
            prop_assert_eq!(status.remaining, 0.0);
            prop_assert!(status.over_amount > 0.0);
        }
    }

    #[test]
    fn prop_monthly_budget_ignores_deleted_categories(
        limits in prop::collection::vec(arb_amount(), 4),
        deleted in prop::sample::select(vec!["Food", "Transport", "Bills", "Fun"]),
    ) {
        let names = ["Food", "Transport", "Bills", "Fun"];
        let mut actions = Vec::new();
        for (name, limit) in names.iter().zip(&limits) {
            actions.push(Action::AddCategory(name.to_string()));
            actions.push(Action::SetCategoryLimit { category: name.to_string(), limit: *limit });
        }
        actions.push(Action::DeleteCategory(deleted.to_string()));

        let state = replay(&AppState::default(), &actions);
        let expected: f64 = names
            .iter()
            .zip(&limits)
            .filter(|(name, _)| **name != deleted)
            .map(|(_, limit)| *limit)
            .sum();

        prop_assert!(close(total_monthly_budget(&state), expected));
    }

    #[test]
    fn prop_lock_starts_locked_past_timeout(
        now in 1_000_000_000_000i64..2_000_000_000_000,
        idle in 0i64..1_000_000,
        timeout in 1i64..600_000,
    ) {
        prop_assert_eq!(starts_locked(now - idle, now, timeout), idle > timeout);
        prop_assert!(starts_locked(0, now, timeout));
    }
}

#[test]
fn test_budget_status_counts_only_current_month() {
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
    let last_month = Utc.with_ymd_and_hms(2026, 9, 30, 12, 0, 0).unwrap();

    let state = replay(
        &AppState::default(),
        &[
            Action::AddCategory("Food".to_string()),
            Action::SetCategoryLimit { category: "Food".to_string(), limit: 500.0 },
            Action::AddExpense(Expense::at("Lunch", 600.0, "Food", now)),
            Action::AddExpense(Expense::at("Dinner", 900.0, "Food", last_month)),
        ],
    );

    let status = budget_status(&state, "Food", &now);
    assert_eq!(status.spent, 600.0);
    assert!(status.over_budget);
    assert_eq!(status.over_amount, 100.0);
    assert_eq!(status.remaining, 0.0);
}
