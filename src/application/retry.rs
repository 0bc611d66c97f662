//! Retry with exponential backoff
//!
//! The dispatch engine never retries. Callers that want to resend after a
//! transport fault (hub restart, network blip) wrap the call with
//! [`retry_with_backoff`].

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use super::dispatch::{DispatchOutcome, OutcomeKind};
use crate::codec::HubResponse;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one).
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_multiplier: f64,
    /// Cap on the delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Only transport faults are worth resending; the hub never saw the
/// request or did not answer.
pub fn is_transient<T>(outcome: &DispatchOutcome<T>) -> bool {
    outcome.kind() == OutcomeKind::TransportFault
}

/// Exponential backoff, kept within `0..=max_delay`. A NaN multiplier
/// holds the current delay.
fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    let next = delay.as_secs_f64() * config.backoff_multiplier;
    if next.is_nan() {
        return delay.min(config.max_delay);
    }
    Duration::from_secs_f64(next.clamp(0.0, config.max_delay.as_secs_f64()))
}

/// Run a dispatch until it is not retryable or attempts run out.
///
/// # Example
/// ```ignore
/// let outcome = retry_with_backoff(
///     RetryConfig::default(),
///     || client.send_charge_detail_record(cdr.clone()),
///     is_transient,
///     "send_cdr",
/// ).await;
/// ```
pub async fn retry_with_backoff<F, Fut, T>(
    config: RetryConfig,
    mut operation: F,
    should_retry: impl Fn(&DispatchOutcome<T>) -> bool,
    operation_name: &str,
) -> DispatchOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DispatchOutcome<T>>,
    T: HubResponse,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.initial_delay;
    let mut attempt = 1;

    loop {
        let outcome = operation().await;

        if !outcome.is_fault() {
            if attempt > 1 {
                info!(operation = operation_name, attempt, "Succeeded after retry");
            }
            return outcome;
        }

        let code = outcome.status_code().code;
        if attempt >= max_attempts || !should_retry(&outcome) {
            warn!(
                operation = operation_name,
                attempt,
                max_attempts,
                outcome = outcome.kind().as_str(),
                code,
                "Giving up on hub request"
            );
            return outcome;
        }

        warn!(
            operation = operation_name,
            attempt,
            max_attempts,
            code,
            retry_in_ms = delay.as_millis() as u64,
            "Transient failure, retrying"
        );

        tokio::time::sleep(delay).await;

        delay = next_delay(delay, &config);
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Acknowledgement, StatusCode};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_stays_within_bounds_for_odd_multipliers() {
        let with = |backoff_multiplier: f64| RetryConfig {
            backoff_multiplier,
            max_delay: Duration::from_secs(4),
            ..fast()
        };
        let delay = Duration::from_secs(1);

        assert_eq!(next_delay(delay, &with(2.0)), Duration::from_secs(2));
        assert_eq!(next_delay(delay, &with(10.0)), Duration::from_secs(4));
        assert_eq!(next_delay(delay, &with(-3.0)), Duration::ZERO);
        assert_eq!(next_delay(delay, &with(f64::NAN)), delay);
        assert_eq!(next_delay(delay, &with(f64::INFINITY)), Duration::from_secs(4));
    }

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(4),
        }
    }

    fn unavailable() -> DispatchOutcome<Acknowledgement> {
        DispatchOutcome::TransportFault(Acknowledgement::failure(StatusCode::new(
            320,
            "Service not available",
        )))
    }

    #[tokio::test]
    async fn retries_transport_faults_until_success() {
        let calls = AtomicU32::new(0);
        let outcome = retry_with_backoff(
            fast(),
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    unavailable()
                } else {
                    DispatchOutcome::Success(Acknowledgement::success())
                }
            },
            is_transient,
            "push",
        )
        .await;

        assert_eq!(outcome.kind(), OutcomeKind::Success);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn protocol_faults_are_not_retried() {
        let calls = AtomicU32::new(0);
        let outcome = retry_with_backoff(
            fast(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                DispatchOutcome::ProtocolFault(Acknowledgement::failure(StatusCode::new(
                    22, "fault",
                )))
            },
            is_transient,
            "push",
        )
        .await;

        assert_eq!(outcome.kind(), OutcomeKind::ProtocolFault);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let outcome = retry_with_backoff(
            fast(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                unavailable()
            },
            is_transient,
            "push",
        )
        .await;

        assert_eq!(outcome.status_code().code, 320);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
