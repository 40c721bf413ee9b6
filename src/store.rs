// 🗃️ Store - Single owner of the domain state
//
// The store is the only writer: consumers read through accessors and
// mutate through `dispatch`, which runs the pure reducer and mirrors each
// changed slice to storage.

use chrono::{DateTime, Local, TimeZone};

use crate::aggregates::{self, Totals};
use crate::entities::{BudgetStatus, Expense};
use crate::state::{apply, Action, AppState};
use crate::storage::{keys, Storage};

pub struct Store {
    state: AppState,
    storage: Storage,
}

impl Store {
    /// Hydrate state from storage, defaulting every missing or corrupt slice.
    pub fn open(storage: Storage) -> Self {
        let state = load_state(&storage);

        tracing::debug!(
            expenses = state.expenses.len(),
            categories = state.categories.len(),
            routines = state.routines.len(),
            "state hydrated"
        );

        Store { state, storage }
    }

    /// Store backed by volatile memory
    pub fn in_memory() -> Self {
        Self::open(Storage::in_memory())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.state.expenses
    }

    pub fn categories(&self) -> &[String] {
        &self.state.categories
    }

    pub fn routines(&self) -> &[String] {
        &self.state.routines
    }

    pub fn bank_balance(&self) -> f64 {
        self.state.bank_balance
    }

    pub fn dark_mode(&self) -> bool {
        self.state.dark_mode
    }

    pub fn limit_for(&self, category: &str) -> f64 {
        self.state
            .category_limits
            .get(category)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    /// Apply `action` and mirror the slices it changed.
    pub fn dispatch(&mut self, action: Action) -> &AppState {
        let next = apply(&self.state, &action);

        tracing::debug!(action = action.name(), "dispatch");

        persist_changes(&mut self.storage, &self.state, &next);
        self.state = next;
        &self.state
    }

    // ========================================================================
    // DERIVED READS
    // ========================================================================

    pub fn totals(&self) -> Totals {
        self.totals_at(&Local::now())
    }

    pub fn totals_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Totals {
        Totals::compute(&self.state, now)
    }

    pub fn budget_overview(&self) -> Vec<BudgetStatus> {
        self.budget_overview_at(&Local::now())
    }

    pub fn budget_overview_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<BudgetStatus> {
        aggregates::budget_overview(&self.state, now)
    }
}

fn load_state(storage: &Storage) -> AppState {
    AppState {
        expenses: storage.get_or_default(keys::EXPENSES),
        categories: storage.get_or_default(keys::CATEGORIES),
        category_limits: storage.get_or_default(keys::CATEGORY_LIMITS),
        routines: storage.get_or_default(keys::ROUTINES),
        bank_balance: storage.get_or_default(keys::BANK_BALANCE),
        dark_mode: storage.get_or_default(keys::DARK_MODE),
    }
}

fn persist_changes(storage: &mut Storage, prev: &AppState, next: &AppState) {
    if prev.expenses != next.expenses {
        storage.set_item(keys::EXPENSES, &next.expenses);
    }
    if prev.categories != next.categories {
        storage.set_item(keys::CATEGORIES, &next.categories);
    }
    if prev.category_limits != next.category_limits {
        storage.set_item(keys::CATEGORY_LIMITS, &next.category_limits);
    }
    if prev.routines != next.routines {
        storage.set_item(keys::ROUTINES, &next.routines);
    }
    if prev.bank_balance != next.bank_balance {
        storage.set_item(keys::BANK_BALANCE, &next.bank_balance);
    }
    if prev.dark_mode != next.dark_mode {
        storage.set_item(keys::DARK_MODE, &next.dark_mode);
    }
}

// ============================================================================
// TESTS
// ============================================================================
