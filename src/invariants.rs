//! Runtime invariant checks with a process-wide contract log.
//!
//! Production code states its invariants with [`assert_invariant!`]; every
//! check is recorded by message so tests can prove the invariant was actually
//! exercised, not just declared.
//!
//! ```rust,ignore
//! assert_invariant!(
//!     open_devices <= 1,
//!     "at most one camera device is open",
//!     "coordinator"
//! );
//!
//! // later, in a test
//! camera_preview::invariants::require_checked("open/close", &[
//!     "at most one camera device is open",
//! ]);
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

lazy_static::lazy_static! {
    // The coordinator runs on a tokio worker, so the log cannot be thread-local.
    static ref INVARIANT_LOG: Mutex<HashMap<String, u64>> = Mutex::new(HashMap::new());
}

/// Assert an invariant and record that it was checked.
///
/// # Panics
/// Panics when the condition is false.
#[macro_export]
macro_rules! assert_invariant {
    ($condition:expr, $message:expr) => {
        $crate::invariants::__check_invariant($condition, $message, None)
    };
    ($condition:expr, $message:expr, $context:expr) => {
        $crate::invariants::__check_invariant($condition, $message, Some($context))
    };
}

#[doc(hidden)]
pub fn __check_invariant(condition: bool, message: &str, context: Option<&str>) {
    {
        let mut log = INVARIANT_LOG.lock().unwrap_or_else(|e| e.into_inner());
        *log.entry(message.to_string()).or_insert(0) += 1;
    }

    if !condition {
        let ctx = context.unwrap_or("unknown");
        log::error!("Invariant violated [{}]: {}", ctx, message);
        panic!("INVARIANT VIOLATION [{}]: {}", ctx, message);
    }
}

/// Number of times the invariant with this message has been checked.
pub fn times_checked(message: &str) -> u64 {
    INVARIANT_LOG
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .get(message)
        .copied()
        .unwrap_or(0)
}

/// Panic unless every listed invariant has been checked at least once.
pub fn require_checked(scenario: &str, invariants: &[&str]) {
    let missing: Vec<&str> = invariants
        .iter()
        .copied()
        .filter(|message| times_checked(message) == 0)
        .collect();

    if !missing.is_empty() {
        panic!(
            "CONTRACT FAILURE [{}]: invariants never checked:\n  - {}",
            scenario,
            missing.join("\n  - ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_invariant_is_counted() {
        let before = times_checked("invariants test: counted");
        crate::assert_invariant!(true, "invariants test: counted");
        crate::assert_invariant!(true, "invariants test: counted", "tests");
        assert_eq!(times_checked("invariants test: counted"), before + 2);
        require_checked("counting", &["invariants test: counted"]);
    }

    #[test]
    #[should_panic(expected = "INVARIANT VIOLATION [tests]")]
    fn test_violation_panics() {
        crate::assert_invariant!(false, "invariants test: violated", "tests");
    }

    #[test]
    #[should_panic(expected = "CONTRACT FAILURE")]
    fn test_unchecked_invariant_fails_contract() {
        require_checked("missing", &["invariants test: never asserted anywhere"]);
    }
}
