//! Retry policy as an explicit state machine.
//!
//! A fetch moves through four states:
//!
//! ```text
//! Attempting(n) --outcome--> Success
//!                        \-> TerminalFailure(kind)
//!                        \-> Backoff(n + 1, delay) --sleep--> Attempting(n + 1)
//! ```
//!
//! [`RetryPolicy::transition`] is a pure function of the attempt number, the
//! classified [`AttemptOutcome`] and a jitter sample, so the whole status-code
//! policy is testable without a network. The fetch engine only performs the
//! I/O and the sleeping.
//!
//! Status policy per attempt:
//!
//! | outcome                         | result                                   |
//! |---------------------------------|------------------------------------------|
//! | 2xx, non-blank body             | `Success`                                |
//! | 2xx, blank body                 | retry, exhausts as `EmptyResponse`       |
//! | 429, or 403 with `Retry-After`  | cooldown + backoff, exhausts as `RateLimited` |
//! | 404, 401, bare 403              | `TerminalFailure(ClientError)` at once   |
//! | other 4xx                       | retry, exhausts as `ClientError`         |
//! | 5xx                             | retry, exhausts as `ServerError`         |
//! | timeout / transport failure     | retry, exhausts as `Timeout` / `TransportError` |

use std::time::Duration;

use crate::error::FetchErrorKind;

/// Default number of attempts (the first request included).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Outcome of a single request, classified before any policy is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A response arrived and its body was read.
    Response {
        status: u16,
        /// Whether the body was empty or whitespace only.
        blank_body: bool,
        /// Whether the response carried a `Retry-After` header.
        retry_after: bool,
    },
    /// The connect or total timeout elapsed.
    Timeout,
    /// Any other transport-level failure.
    Transport(String),
}

impl AttemptOutcome {
    /// The HTTP status, if a response arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The failure kind this outcome maps to, or `None` for a usable page.
    pub fn failure_kind(&self) -> Option<FetchErrorKind> {
        match self {
            Self::Response { status, blank_body, retry_after } => classify_status(*status, *blank_body, *retry_after),
            Self::Timeout => Some(FetchErrorKind::Timeout),
            Self::Transport(_) => Some(FetchErrorKind::TransportError),
        }
    }

    /// Short human description for logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Response { status, blank_body: true, .. } if (200..300).contains(status) => {
                format!("HTTP {status} with empty body")
            }
            Self::Response { status, .. } => format!("HTTP {status}"),
            Self::Timeout => "request timed out".to_string(),
            Self::Transport(msg) => msg.clone(),
        }
    }
}

fn classify_status(status: u16, blank_body: bool, retry_after: bool) -> Option<FetchErrorKind> {
    match status {
        200..=299 if blank_body => Some(FetchErrorKind::EmptyResponse),
        200..=299 => None,
        429 => Some(FetchErrorKind::RateLimited),
        403 if retry_after => Some(FetchErrorKind::RateLimited),
        400..=499 => Some(FetchErrorKind::ClientError),
        500..=599 => Some(FetchErrorKind::ServerError),
        _ => Some(FetchErrorKind::UnexpectedStatus),
    }
}

/// Statuses that end the loop on the first sighting.
fn is_terminal_status(status: u16, retry_after: bool) -> bool {
    matches!(status, 401 | 404) || (status == 403 && !retry_after)
}

/// States of a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    /// About to issue request number `attempt` (1-based).
    Attempting { attempt: u32 },
    /// Waiting `delay` before issuing request number `next_attempt`.
    Backoff { next_attempt: u32, delay: Duration, reason: FetchErrorKind },
    /// The last attempt produced a usable page.
    Success,
    /// No further attempts will be made.
    TerminalFailure { kind: FetchErrorKind, exhausted: bool },
}

impl RetryState {
    /// The state reached once a backoff sleep has completed.
    pub fn after_backoff(self) -> Self {
        match self {
            Self::Backoff { next_attempt, .. } => Self::Attempting { attempt: next_attempt },
            other => other,
        }
    }
}

/// Retry limits and delay scales.
///
/// The `Duration` fields scale the documented delays; production uses the
/// defaults, tests shrink them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first included (default: 3).
    pub max_retries: u32,
    /// Unit of the standard backoff `2^n + U(0,1)` (default: 1s).
    pub backoff_unit: Duration,
    /// Base of the rate-limit cooldown (default: 10s).
    pub cooldown_base: Duration,
    /// Cooldown increment per attempt already made (default: 5s).
    pub cooldown_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_unit: Duration::from_secs(1),
            cooldown_base: Duration::from_secs(10),
            cooldown_step: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Policy with the given attempt budget and default delays.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self { max_retries, ..Default::default() }
    }

    /// Standard wait after failed attempt `attempt`: `(2^attempt + jitter) * unit`.
    ///
    /// `jitter` is a sample from `[0, 1)`; it is clamped into that range.
    pub fn backoff(&self, attempt: u32, jitter: f64) -> Duration {
        let exponent = attempt.min(30);
        let factor = f64::from(1u32 << exponent) + jitter.clamp(0.0, 1.0);
        self.backoff_unit.mul_f64(factor)
    }

    /// Extra wait after a rate-limited attempt: `base + step * (attempt - 1)`.
    pub fn cooldown(&self, attempt: u32) -> Duration {
        self.cooldown_base + self.cooldown_step * attempt.saturating_sub(1)
    }

    /// Next state after attempt number `attempt` (1-based) produced `outcome`.
    pub fn transition(&self, attempt: u32, outcome: &AttemptOutcome, jitter: f64) -> RetryState {
        let Some(kind) = outcome.failure_kind() else {
            return RetryState::Success;
        };

        if let AttemptOutcome::Response { status, retry_after, .. } = outcome
            && is_terminal_status(*status, *retry_after)
        {
            return RetryState::TerminalFailure { kind, exhausted: false };
        }

        if attempt >= self.max_retries {
            return RetryState::TerminalFailure { kind, exhausted: true };
        }

        let mut delay = self.backoff(attempt, jitter);
        if kind == FetchErrorKind::RateLimited {
            delay += self.cooldown(attempt);
        }

        RetryState::Backoff { next_attempt: attempt + 1, delay, reason: kind }
    }
}
