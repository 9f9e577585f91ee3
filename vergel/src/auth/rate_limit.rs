//! Password-reset request throttle.
//!
//! A small per-user state machine with two states, Normal and Lockout.
//! Attempts inside the rolling window accumulate a counter; exceeding the
//! configured threshold moves the user into Lockout for an exponentially
//! growing, capped duration. Once the lockout elapses the next request is
//! treated as a fresh first attempt.
//!
//! The decision logic is a pure function over the persisted state so it can
//! be tested without a database. Persistence of the resulting state is the
//! caller's job; concurrent requests race on read-modify-write and rely on
//! single-row transaction semantics only (this is a soft throttle).

use chrono::{DateTime, Duration, Utc};

use crate::config::ResetConfig;

/// Throttle state as persisted on the users row.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottleState {
    pub attempts: i32,
    pub last_attempt: Option<DateTime<Utc>>,
    pub lockout_until: Option<DateTime<Utc>>,
}

impl ThrottleState {
    pub fn new(attempts: i32, last_attempt: Option<DateTime<Utc>>, lockout_until: Option<DateTime<Utc>>) -> Self {
        Self {
            attempts,
            last_attempt,
            lockout_until,
        }
    }
}

/// Outcome of evaluating one reset request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The request may proceed to token issuance; persist `state`.
    Allow { state: ThrottleState },
    /// The request is rejected; persist `state` only when `persist` is set
    /// (a request arriving during an already-active lockout changes nothing).
    Reject {
        state: ThrottleState,
        retry_after_minutes: i64,
        persist: bool,
    },
}

fn remaining_minutes(until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (until - now).num_seconds().max(0);
    (secs + 59) / 60
}

/// Lockout duration for the given attempt count: base * 2^(attempts - max - 1),
/// capped at the configured maximum.
fn lockout_duration(attempts: i32, config: &ResetConfig) -> Duration {
    let exponent = (attempts - config.max_attempts - 1).clamp(0, 30) as u32;
    let base_secs = config.base_lockout.as_secs() as i64;
    let max_secs = config.max_lockout.as_secs() as i64;
    let secs = base_secs.saturating_mul(1i64 << exponent).min(max_secs);
    Duration::seconds(secs)
}

/// Evaluate one reset request against the persisted throttle state.
pub fn evaluate(state: &ThrottleState, now: DateTime<Utc>, config: &ResetConfig) -> Decision {
    // Active lockout rejects before any counter update
    if let Some(until) = state.lockout_until {
        if until > now {
            return Decision::Reject {
                state: state.clone(),
                retry_after_minutes: remaining_minutes(until, now),
                persist: false,
            };
        }
    }

    let window = Duration::from_std(config.attempt_window).unwrap_or_else(|_| Duration::hours(1));
    let attempts = match state.last_attempt {
        Some(last) if now - last < window => state.attempts + 1,
        _ => 1,
    };

    if attempts > config.max_attempts {
        let until = now + lockout_duration(attempts, config);
        return Decision::Reject {
            state: ThrottleState::new(attempts, Some(now), Some(until)),
            retry_after_minutes: remaining_minutes(until, now),
            persist: true,
        };
    }

    Decision::Allow {
        state: ThrottleState::new(attempts, Some(now), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ResetConfig {
        ResetConfig::default() // 5 attempts, 1h window, 15m base, 24h cap
    }

    fn fresh() -> ThrottleState {
        ThrottleState::new(0, None, None)
    }

    #[test]
    fn first_request_is_allowed() {
        let now = Utc::now();
        match evaluate(&fresh(), now, &config()) {
            Decision::Allow { state } => {
                assert_eq!(state.attempts, 1);
                assert_eq!(state.last_attempt, Some(now));
                assert_eq!(state.lockout_until, None);
            }
            other => panic!("expected Allow, got {other:?}"),
        }
    }

    #[test]
    fn attempts_accumulate_inside_the_window() {
        let now = Utc::now();
        let state = ThrottleState::new(2, Some(now - Duration::minutes(10)), None);
        match evaluate(&state, now, &config()) {
            Decision::Allow { state } => assert_eq!(state.attempts, 3),
            other => panic!("expected Allow, got {other:?}"),
        }
    }

    #[test]
    fn counter_resets_outside_the_window() {
        let now = Utc::now();
        let state = ThrottleState::new(4, Some(now - Duration::hours(2)), None);
        match evaluate(&state, now, &config()) {
            Decision::Allow { state } => assert_eq!(state.attempts, 1),
            other => panic!("expected Allow, got {other:?}"),
        }
    }

    #[test]
    fn exceeding_the_threshold_starts_a_future_lockout() {
        let now = Utc::now();
        let state = ThrottleState::new(5, Some(now - Duration::minutes(1)), None);
        match evaluate(&state, now, &config()) {
            Decision::Reject {
                state,
                retry_after_minutes,
                persist,
            } => {
                assert_eq!(state.attempts, 6);
                assert!(persist);
                let until = state.lockout_until.expect("lockout must be set");
                assert!(until > now, "lockout timestamp must be strictly in the future");
                // First violation: base lockout of 15 minutes
                assert_eq!(until, now + Duration::minutes(15));
                assert_eq!(retry_after_minutes, 15);
            }
            other => panic!("expected Reject, got {other:?}"),
        }
    }

    #[test]
    fn active_lockout_rejects_without_state_change() {
        let now = Utc::now();
        let until = now + Duration::minutes(7);
        let state = ThrottleState::new(6, Some(now - Duration::minutes(8)), Some(until));
        match evaluate(&state, now, &config()) {
            Decision::Reject {
                state: new_state,
                retry_after_minutes,
                persist,
            } => {
                assert!(!persist);
                assert_eq!(new_state, state);
                assert_eq!(retry_after_minutes, 7);
            }
            other => panic!("expected Reject, got {other:?}"),
        }
    }

    #[test]
    fn expired_lockout_allows_and_restarts_the_counter() {
        let now = Utc::now();
        let state = ThrottleState::new(6, Some(now - Duration::hours(2)), Some(now - Duration::minutes(1)));
        match evaluate(&state, now, &config()) {
            Decision::Allow { state } => {
                assert_eq!(state.attempts, 1);
                assert_eq!(state.lockout_until, None);
            }
            other => panic!("expected Allow, got {other:?}"),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let cfg = config();
        // attempts = max + 1 -> base
        assert_eq!(lockout_duration(6, &cfg), Duration::minutes(15));
        // attempts = max + 2 -> 2 * base
        assert_eq!(lockout_duration(7, &cfg), Duration::minutes(30));
        // attempts = max + 3 -> 4 * base
        assert_eq!(lockout_duration(8, &cfg), Duration::hours(1));
        // Far past the threshold the cap kicks in
        assert_eq!(lockout_duration(60, &cfg), Duration::hours(24));
    }
}
