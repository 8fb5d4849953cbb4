//! The retry contract embedded in generated request wrappers.
//!
//! The algorithm lives twice: once here as a pure Rust state machine the test
//! suite exercises directly, and once as the canonical TypeScript
//! implementation every generated retry helper carries verbatim. The two must
//! agree; the Rust form is the reference.
//!
//! The contract is polymorphic over any outcome type that optionally exposes
//! a numeric status signal. An outcome without one can never trigger a
//! status-based retry and is returned as-is.

use tsmith_model::RetryPolicy;

/// A successful attempt result that may carry an HTTP status.
pub trait AttemptOutcome {
    /// The status signal, when the result shape exposes one.
    fn status_signal(&self) -> Option<u16>;
}

/// A failed attempt. `response_status` returning `None` means the request
/// never produced a response (a network error, always worth retrying on
/// idempotent methods); `Some` carries the HTTP error status.
pub trait AttemptFailure {
    fn response_status(&self) -> Option<u16>;
}

/// Runs `attempt` under the retry policy, sleeping via `sleep` between tries.
///
/// Termination is asymmetric: when attempts are exhausted, a still-retryable
/// *result* is returned as-is, while a still-retryable *error* is rethrown.
pub fn run_with_retry<T, E, A, S>(policy: &RetryPolicy, mut attempt: A, mut sleep: S) -> Result<T, E>
where
    T: AttemptOutcome,
    E: AttemptFailure,
    A: FnMut() -> Result<T, E>,
    S: FnMut(u64),
{
    if !policy.enabled {
        return attempt();
    }

    let is_idempotent = policy.is_idempotent();
    let mut attempt_num: u32 = 0;

    loop {
        match attempt() {
            Ok(result) => {
                let retryable = is_idempotent
                    && result
                        .status_signal()
                        .is_some_and(|status| policy.is_retryable_status(status));
                if !retryable {
                    return Ok(result);
                }
                attempt_num += 1;
                if attempt_num >= policy.max_attempts {
                    return Ok(result);
                }
                sleep(policy.backoff_delay_ms(attempt_num));
            }
            Err(error) => {
                let retryable = is_idempotent
                    && match error.response_status() {
                        None => true,
                        Some(status) => policy.is_retryable_status(status),
                    };
                if !retryable {
                    return Err(error);
                }
                attempt_num += 1;
                if attempt_num >= policy.max_attempts {
                    return Err(error);
                }
                sleep(policy.backoff_delay_ms(attempt_num));
            }
        }
    }
}

/// The canonical TypeScript implementation emitted into every retry helper.
/// Helper files may duplicate it, but every copy is byte-for-byte this text.
pub const REQUEST_WITH_RETRY_IMPL: &str = r#"const RETRY_DEFAULTS = {
  maxAttempts: 3,
  initialDelayMs: 250,
  multiplier: 2.0,
  retryStatuses: [429, 502, 503, 504],
  method: "GET",
  idempotentMethods: ["GET", "HEAD", "PUT", "DELETE", "OPTIONS"],
};

function sleep(ms: number): Promise<void> {
  return new Promise((resolve) => setTimeout(resolve, ms));
}

export async function requestWithRetryImpl<T>(
  attempt: () => Promise<T>,
  options: RetryOptions
): Promise<T> {
  if (!options.enabled) {
    return attempt();
  }
  const opts = { ...RETRY_DEFAULTS, ...options };
  const isIdempotent = opts.idempotentMethods.includes(opts.method.toUpperCase());
  let attemptNum = 0;
  for (;;) {
    let result: T;
    try {
      result = await attempt();
    } catch (error) {
      const response = (error as { response?: { status?: number } }).response;
      const retryable =
        isIdempotent &&
        (!response ||
          (response.status !== undefined &&
            opts.retryStatuses.includes(response.status)));
      if (!retryable) {
        throw error;
      }
      attemptNum += 1;
      if (attemptNum >= opts.maxAttempts) {
        throw error;
      }
      await sleep(
        Math.floor(opts.initialDelayMs * Math.pow(opts.multiplier, attemptNum - 1))
      );
      continue;
    }
    const status = (result as { status?: number }).status;
    const retryable =
      status !== undefined && isIdempotent && opts.retryStatuses.includes(status);
    if (!retryable) {
      return result;
    }
    attemptNum += 1;
    if (attemptNum >= opts.maxAttempts) {
      return result;
    }
    await sleep(
      Math.floor(opts.initialDelayMs * Math.pow(opts.multiplier, attemptNum - 1))
    );
  }
}
"#;
