// Money Tracker - Core Library
// Exposes the domain core for the terminal UI and tests

pub mod entities;     // Expense, category limits, routines
pub mod state;        // Domain state + pure reducer
pub mod aggregates;   // Totals, budget status, list filter
pub mod storage;      // Namespaced key-value persistence
pub mod store;        // State owner: hydrate, dispatch, mirror
pub mod lock;         // PIN lock + inactivity timeout
pub mod validation;   // Form checks before dispatch
pub mod format;       // Currency and date display
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use entities::{BudgetStatus, CategoryLimits, Expense, UNCATEGORIZED};
pub use state::{apply, replay, Action, AppState};
pub use aggregates::{budget_overview, budget_status, ExpenseFilter, Totals};
pub use storage::{keys, KeyValueStore, MemoryStore, SqliteStore, Storage};
pub use store::Store;
pub use lock::{
    IdleWatch, Interaction, LockMachine, LockOutcome, LockState, RejectReason,
    INACTIVITY_TIMEOUT_MS, LOCK_CHECK_INTERVAL, PIN_LENGTH,
};
pub use validation::{ExpenseDraft, ValidationError};
pub use config::AppConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
