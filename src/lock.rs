// 🔐 Lock State Machine - PIN lock with inactivity timeout
//
// States: Locked, Unlocked.
//
// Start:     Locked if no activity was ever recorded, or if the last
//            recorded activity is older than the inactivity timeout.
// Locked:    correct 4-digit PIN → Unlocked (records activity)
//            incomplete PIN      → Locked, error + shake, input kept
//            wrong PIN           → Locked, error + shake, input cleared
// Unlocked:  explicit lock       → Locked
//            tracked interaction → Unlocked (refreshes activity)
//            periodic check past the timeout → Locked
//
// There is no lockout or rate limiting: every failed attempt simply
// resets and shows an error.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::storage::{keys, Storage};

/// Idle time after which the app locks itself (5 minutes)
pub const INACTIVITY_TIMEOUT_MS: i64 = 5 * 60 * 1000;

/// How often the unlocked view checks for inactivity
pub const LOCK_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// PIN length the keypad accepts
pub const PIN_LENGTH: usize = 4;

/// How long the shake signal lasts after a failed attempt
pub const SHAKE_DURATION_MS: i64 = 500;

/// Fallback PIN when none is configured
pub const DEFAULT_PIN: &str = "1234";

/// Wall-clock time in epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Initial lock decision from the persisted activity timestamp
pub fn starts_locked(last_activity_ms: i64, now_ms: i64, timeout_ms: i64) -> bool {
    last_activity_ms == 0 || now_ms - last_activity_ms > timeout_ms
}

// ============================================================================
// STATES AND OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockState {
    Locked,
    Unlocked,
}

/// Tracked interactions that count as activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    PointerDown,
    KeyDown,
    TouchStart,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Fewer than PIN_LENGTH digits entered
    Incomplete,

    /// Full-length PIN that does not match
    Incorrect,
}

impl RejectReason {
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::Incomplete => "Enter your 4-digit PIN",
            RejectReason::Incorrect => "Incorrect PIN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Unlocked,
    Rejected(RejectReason),

    /// Submit while already unlocked
    Ignored,
}

// ============================================================================
// LOCK MACHINE
// ============================================================================

pub struct LockMachine {
    state: LockState,
    secret: String,
    timeout_ms: i64,

    /// Last activity seen by this session
    last_activity_ms: i64,

    /// Digits typed on the keypad so far
    entry: String,

    /// User-visible error from the last attempt
    error: Option<RejectReason>,

    /// Shake signal is active until this instant
    shake_until_ms: Option<i64>,
}

impl LockMachine {
    /// Build the machine from a known activity timestamp (0 = never).
    pub fn new(secret: &str, timeout_ms: i64, last_activity_ms: i64, now_ms: i64) -> Self {
        let state = if starts_locked(last_activity_ms, now_ms, timeout_ms) {
            LockState::Locked
        } else {
            LockState::Unlocked
        };

        LockMachine {
            state,
            secret: secret.to_string(),
            timeout_ms,
            // The session's own clock starts now
            last_activity_ms: now_ms,
            entry: String::new(),
            error: None,
            shake_until_ms: None,
        }
    }

    /// Build the machine from the activity timestamp kept in storage.
    pub fn restore(storage: &Storage, secret: &str, timeout_ms: i64, now_ms: i64) -> Self {
        let last = storage.get_or_default::<i64>(keys::LAST_ACTIVITY);
        let machine = Self::new(secret, timeout_ms, last, now_ms);

        tracing::info!(state = ?machine.state, last_activity_ms = last, "lock state restored");
        machine
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state == LockState::Locked
    }

    pub fn entered_len(&self) -> usize {
        self.entry.chars().count()
    }

    pub fn error(&self) -> Option<&'static str> {
        self.error.map(|e| e.message())
    }

    pub fn last_activity_ms(&self) -> i64 {
        self.last_activity_ms
    }

    pub fn is_shaking(&self, now_ms: i64) -> bool {
        self.shake_until_ms.map_or(false, |until| now_ms < until)
    }

    // ========================================================================
    // KEYPAD
    // ========================================================================

    /// Append a digit. Clears any shown error; ignored once the PIN is full.
    pub fn press_digit(&mut self, digit: char) {
        if !self.is_locked() || !digit.is_ascii_digit() {
            return;
        }

        self.error = None;
        if self.entered_len() < PIN_LENGTH {
            self.entry.push(digit);
        }
    }

    /// Remove the last entered digit.
    pub fn delete_digit(&mut self) {
        self.error = None;
        self.entry.pop();
    }

    /// Check the entered PIN.
    pub fn submit(&mut self, storage: &mut Storage, now_ms: i64) -> LockOutcome {
        if !self.is_locked() {
            return LockOutcome::Ignored;
        }

        if self.entered_len() != PIN_LENGTH {
            return self.reject(RejectReason::Incomplete, now_ms);
        }

        if self.entry == self.secret {
            self.entry.clear();
            self.error = None;
            self.shake_until_ms = None;
            self.state = LockState::Unlocked;
            self.touch(storage, now_ms);

            tracing::info!("unlocked");
            LockOutcome::Unlocked
        } else {
            self.entry.clear();
            self.reject(RejectReason::Incorrect, now_ms)
        }
    }

    fn reject(&mut self, reason: RejectReason, now_ms: i64) -> LockOutcome {
        self.error = Some(reason);
        self.shake_until_ms = Some(now_ms + SHAKE_DURATION_MS);

        tracing::warn!(reason = reason.message(), "unlock rejected");
        LockOutcome::Rejected(reason)
    }

    // ========================================================================
    // UNLOCKED TRANSITIONS
    // ========================================================================

    /// Explicit lock request.
    pub fn lock(&mut self) {
        if self.state == LockState::Unlocked {
            tracing::info!("locked by user");
        }
        self.state = LockState::Locked;
        self.entry.clear();
        self.error = None;
    }

    /// Refresh the activity timestamp for a tracked interaction.
    /// Interactions while locked are not tracked.
    pub fn record_activity(&mut self, _interaction: Interaction, storage: &mut Storage, now_ms: i64) {
        if self.state == LockState::Unlocked {
            self.touch(storage, now_ms);
        }
    }

    /// Periodic inactivity check. Returns true if this call locked the app.
    pub fn check_idle(&mut self, now_ms: i64) -> bool {
        if self.state == LockState::Unlocked && now_ms - self.last_activity_ms > self.timeout_ms {
            self.state = LockState::Locked;
            self.entry.clear();

            tracing::info!(idle_ms = now_ms - self.last_activity_ms, "locked after inactivity");
            return true;
        }

        false
    }

    fn touch(&mut self, storage: &mut Storage, now_ms: i64) {
        self.last_activity_ms = now_ms;
        storage.set_item(keys::LAST_ACTIVITY, &now_ms);
    }
}

// ============================================================================
// IDLE WATCH
// ============================================================================

/// Periodic inactivity check owned by the unlocked view.
///
/// The event loop polls `due()`; when it fires the owner calls
/// `LockMachine::check_idle`. Dropping the watch ends the checks.
#[derive(Debug, Clone)]
pub struct IdleWatch {
    interval_ms: i64,
    last_check_ms: i64,
}

impl IdleWatch {
    pub fn start(interval: Duration, now_ms: i64) -> Self {
        IdleWatch {
            interval_ms: i64::try_from(interval.as_millis()).unwrap_or(i64::MAX),
            last_check_ms: now_ms,
        }
    }

    /// True once per elapsed interval.
    pub fn due(&mut self, now_ms: i64) -> bool {
        if now_ms.saturating_sub(self.last_check_ms) >= self.interval_ms {
            self.last_check_ms = now_ms;
            return true;
        }
        false
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_760_000_000_000;

    fn locked_machine() -> LockMachine {
        LockMachine::new("1234", INACTIVITY_TIMEOUT_MS, 0, T0)
    }

    fn enter(machine: &mut LockMachine, pin: &str) {
        for c in pin.chars() {
            machine.press_digit(c);
        }
    }

    #[test]
    fn test_initial_state_from_activity() {
        // Never used
        assert!(starts_locked(0, T0, INACTIVITY_TIMEOUT_MS));

        // Recent activity
        assert!(!starts_locked(T0 - 1_000, T0, INACTIVITY_TIMEOUT_MS));

        // Exactly at the threshold stays unlocked
        assert!(!starts_locked(T0 - 300_000, T0, INACTIVITY_TIMEOUT_MS));

        // Just past the threshold
        assert!(starts_locked(T0 - 300_001, T0, INACTIVITY_TIMEOUT_MS));
    }

    #[test]
    fn test_correct_pin_unlocks_and_records_activity() {
        let mut storage = Storage::in_memory();
        let mut machine = locked_machine();

        enter(&mut machine, "1234");
        let outcome = machine.submit(&mut storage, T0 + 10);

        assert_eq!(outcome, LockOutcome::Unlocked);
        assert_eq!(machine.state(), LockState::Unlocked);
        assert_eq!(storage.get_item::<i64>(keys::LAST_ACTIVITY), Some(T0 + 10));
    }

    #[test]
    fn test_wrong_pin_clears_input_and_shakes() {
        let mut storage = Storage::in_memory();
        let mut machine = locked_machine();

        enter(&mut machine, "0000");
        let outcome = machine.submit(&mut storage, T0);

        assert_eq!(outcome, LockOutcome::Rejected(RejectReason::Incorrect));
        assert!(machine.is_locked());
        assert_eq!(machine.entered_len(), 0);
        assert_eq!(machine.error(), Some("Incorrect PIN"));
        assert!(machine.is_shaking(T0 + 100));
        assert!(!machine.is_shaking(T0 + SHAKE_DURATION_MS));
        assert_eq!(storage.get_item::<i64>(keys::LAST_ACTIVITY), None);
    }

    #[test]
    fn test_incomplete_pin_is_rejected_without_clearing() {
        let mut storage = Storage::in_memory();
        let mut machine = locked_machine();

        enter(&mut machine, "12");
        let outcome = machine.submit(&mut storage, T0);

        assert_eq!(outcome, LockOutcome::Rejected(RejectReason::Incomplete));
        assert_eq!(machine.entered_len(), 2);
        assert_eq!(machine.error(), Some("Enter your 4-digit PIN"));
        assert!(machine.is_shaking(T0));
    }

    #[test]
    fn test_keypad_caps_length_and_clears_error() {
        let mut storage = Storage::in_memory();
        let mut machine = locked_machine();

        enter(&mut machine, "99");
        machine.submit(&mut storage, T0);
        assert!(machine.error().is_some());

        enter(&mut machine, "12345");
        assert!(machine.error().is_none(), "Key press clears the error");
        assert_eq!(machine.entered_len(), PIN_LENGTH);

        machine.delete_digit();
        assert_eq!(machine.entered_len(), 3);

        // Non-digits are ignored
        machine.press_digit('x');
        assert_eq!(machine.entered_len(), 3);
    }

    #[test]
    fn test_repeated_failures_never_lock_out() {
        let mut storage = Storage::in_memory();
        let mut machine = locked_machine();

        for _ in 0..20 {
            enter(&mut machine, "9999");
            machine.submit(&mut storage, T0);
        }

        enter(&mut machine, "1234");
        assert_eq!(machine.submit(&mut storage, T0), LockOutcome::Unlocked);
    }

    #[test]
    fn test_explicit_lock() {
        let mut machine = LockMachine::new("1234", INACTIVITY_TIMEOUT_MS, T0 - 1_000, T0);
        assert!(!machine.is_locked());

        machine.lock();
        assert!(machine.is_locked());
    }

    #[test]
    fn test_activity_refreshes_timestamp_only_when_unlocked() {
        let mut storage = Storage::in_memory();

        let mut locked = locked_machine();
        locked.record_activity(Interaction::KeyDown, &mut storage, T0 + 5);
        assert_eq!(storage.get_item::<i64>(keys::LAST_ACTIVITY), None);

        let mut unlocked = LockMachine::new("1234", INACTIVITY_TIMEOUT_MS, T0 - 1_000, T0);
        unlocked.record_activity(Interaction::Scroll, &mut storage, T0 + 5);
        assert_eq!(unlocked.state(), LockState::Unlocked);
        assert_eq!(unlocked.last_activity_ms(), T0 + 5);
        assert_eq!(storage.get_item::<i64>(keys::LAST_ACTIVITY), Some(T0 + 5));
    }

    #[test]
    fn test_idle_check_locks_after_timeout() {
        let mut storage = Storage::in_memory();
        let mut machine = LockMachine::new("1234", INACTIVITY_TIMEOUT_MS, T0 - 1_000, T0);

        machine.record_activity(Interaction::PointerDown, &mut storage, T0 + 60_000);
        assert!(!machine.check_idle(T0 + 60_000 + INACTIVITY_TIMEOUT_MS));
        assert!(!machine.is_locked());

        assert!(machine.check_idle(T0 + 60_001 + INACTIVITY_TIMEOUT_MS));
        assert!(machine.is_locked());

        // Already locked: nothing more to do
        assert!(!machine.check_idle(T0 + 10 * INACTIVITY_TIMEOUT_MS));
    }

    #[test]
    fn test_restore_reads_persisted_activity() {
        let mut storage = Storage::in_memory();
        storage.set_item(keys::LAST_ACTIVITY, &(T0 - 60_000));

        let machine = LockMachine::restore(&storage, "1234", INACTIVITY_TIMEOUT_MS, T0);
        assert!(!machine.is_locked());

        let stale = LockMachine::restore(&storage, "1234", INACTIVITY_TIMEOUT_MS, T0 + INACTIVITY_TIMEOUT_MS);
        assert!(stale.is_locked());

        storage.set_item(keys::LAST_ACTIVITY, "garbage");
        let corrupt = LockMachine::restore(&storage, "1234", INACTIVITY_TIMEOUT_MS, T0);
        assert!(corrupt.is_locked(), "Unreadable timestamp counts as never used");
    }

    #[test]
    fn test_submit_while_unlocked_is_ignored() {
        let mut storage = Storage::in_memory();
        let mut machine = LockMachine::new("1234", INACTIVITY_TIMEOUT_MS, T0 - 1, T0);

        assert_eq!(machine.submit(&mut storage, T0), LockOutcome::Ignored);
    }

    #[test]
    fn test_idle_watch_fires_once_per_interval() {
        let mut watch = IdleWatch::start(LOCK_CHECK_INTERVAL, T0);

        assert!(!watch.due(T0 + 9_999));
        assert!(watch.due(T0 + 10_000));
        assert!(!watch.due(T0 + 15_000));
        assert!(watch.due(T0 + 20_000));
    }

    #[test]
    fn test_idle_watch_drives_timeout_lock() {
        let mut storage = Storage::in_memory();
        let mut machine = LockMachine::new("1234", INACTIVITY_TIMEOUT_MS, T0, T0);
        let mut watch = IdleWatch::start(LOCK_CHECK_INTERVAL, T0);
        machine.record_activity(Interaction::KeyDown, &mut storage, T0);

        let mut now = T0;
        while !machine.is_locked() {
            now += 1_000;
            if watch.due(now) {
                machine.check_idle(now);
            }
        }

        // First check past the 5 minute mark, on a 10 s boundary
        assert_eq!(now, T0 + INACTIVITY_TIMEOUT_MS + 10_000);
    }
}
