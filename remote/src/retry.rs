//! HTTP retry policy with exponential backoff.
//!
//! # Retry Policy
//!
//! - Max retries: 2 (3 total attempts)
//! - Initial delay: 500ms
//! - Max delay: 8 seconds
//! - Jitter: down-jitter up to 25% (multiplier in [0.75, 1.0])
//!
//! # Retryable Conditions
//!
//! - HTTP 408, 429, 5xx
//! - Connection errors and timeouts
//! - Only `GET` and `PUT`. A repeated `PATCH` could apply a `toggle` twice and a
//!   repeated `POST` could create a second database, so both get one attempt.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode, header::HeaderMap};

/// Retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries (not counting initial request).
    pub max_retries: u32,
    /// Initial backoff delay before first retry.
    pub initial_delay: Duration,
    /// Maximum backoff delay.
    pub max_delay: Duration,
    /// Jitter factor for down-jitter (0.25 = up to 25% reduction).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_factor: 0.25,
        }
    }
}

impl RetryConfig {
    /// One attempt, no retries.
    #[must_use]
    pub fn single_attempt() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// The policy for `method`. Only `GET` and `PUT` are replayed; anything
    /// else gets a single attempt.
    #[must_use]
    pub fn for_method(&self, method: &Method) -> Self {
        if *method == Method::GET || *method == Method::PUT {
            self.clone()
        } else {
            Self::single_attempt()
        }
    }

    /// Backoff before the retry following `failed_attempts` failures.
    fn backoff(&self, failed_attempts: u32) -> Duration {
        let exponent = i32::try_from(failed_attempts.saturating_sub(1)).unwrap_or(i32::MAX);
        let ceiling = self.max_delay.as_secs_f64();
        let base = (self.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent)).min(ceiling);
        let factor = 1.0 - rand::random::<f64>() * self.jitter_factor;
        Duration::from_secs_f64(base * factor)
    }
}

const MAX_SERVER_HINT: Duration = Duration::from_secs(60);

fn usable_hint(delay: Duration) -> Option<Duration> {
    (delay > Duration::ZERO && delay < MAX_SERVER_HINT).then_some(delay)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

/// Server-requested delay from `Retry-After-Ms` (preferred) or `Retry-After`
/// in whole seconds. Zero, unparsable and minute-plus hints are ignored.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let millis = header_str(headers, "retry-after-ms")
        .and_then(|raw| raw.parse::<f64>().ok())
        .filter(|ms| ms.is_finite() && *ms > 0.0 && *ms < 60_000.0)
        .and_then(|ms| usable_hint(Duration::from_secs_f64(ms / 1000.0)));
    millis.or_else(|| {
        header_str(headers, "retry-after")
            .and_then(|raw| raw.parse::<u64>().ok())
            .and_then(|secs| usable_hint(Duration::from_secs(secs)))
    })
}

#[must_use]
pub fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// Delay before the next attempt, after `failed_attempts` failures (1 for the
/// first retry). A usable server hint replaces the jittered backoff.
#[must_use]
pub fn calculate_retry_delay(
    failed_attempts: u32,
    config: &RetryConfig,
    headers: Option<&HeaderMap>,
) -> Duration {
    headers
        .and_then(parse_retry_after)
        .unwrap_or_else(|| config.backoff(failed_attempts))
}

/// How a request ended once retries were used up or not applicable.
#[derive(Debug)]
pub enum RetryOutcome {
    /// 2xx response.
    Success(Response),
    /// Any other response; the body is left for the caller to read.
    HttpError(Response),
    /// The last of several attempts failed to connect or timed out.
    ConnectionError {
        attempts: u32,
        source: reqwest::Error,
    },
    /// A transport failure that was not retried.
    NonRetryable(reqwest::Error),
}

/// Send the request built by `build_request`, rebuilding it for each attempt.
pub async fn send_with_retry<F>(build_request: F, config: &RetryConfig) -> RetryOutcome
where
    F: Fn() -> RequestBuilder,
{
    let attempts = config.max_retries.saturating_add(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let out_of_attempts = attempt == attempts;

        let delay = match build_request().send().await {
            Ok(response) if response.status().is_success() => {
                return RetryOutcome::Success(response);
            }
            Ok(response) if out_of_attempts || !should_retry(response.status()) => {
                return RetryOutcome::HttpError(response);
            }
            Ok(response) => {
                let delay = calculate_retry_delay(attempt, config, Some(response.headers()));
                tracing::debug!(
                    status = %response.status(),
                    attempt,
                    delay_ms = delay.as_millis(),
                    "Retrying after error status"
                );
                delay
            }
            Err(e) if attempt == 1 && (attempts == 1 || !is_retryable_error(&e)) => {
                return RetryOutcome::NonRetryable(e);
            }
            Err(e) if out_of_attempts || !is_retryable_error(&e) => {
                return RetryOutcome::ConnectionError {
                    attempts: attempt,
                    source: e,
                };
            }
            Err(e) => {
                let delay = calculate_retry_delay(attempt, config, None);
                tracing::debug!(
                    error = %e,
                    attempt,
                    delay_ms = delay.as_millis(),
                    "Retrying after connection error"
                );
                delay
            }
        };
        tokio::time::sleep(delay).await;
    }
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout()
}
