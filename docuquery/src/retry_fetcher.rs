use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Stop,
}

/// 429 and every 5xx are transient; anything else is handed back to the caller.
pub fn retry_on_throttle_or_server_error(status: StatusCode) -> RetryDecision {
    if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 {
        RetryDecision::Retry
    } else {
        RetryDecision::Stop
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after every further failure.
    pub backoff_base: Duration,
    pub status_predicate: fn(StatusCode) -> RetryDecision,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: Duration::from_secs(1),
            status_predicate: retry_on_throttle_or_server_error,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// `backoff_base * 2^attempt`, no jitter and no cap.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(2u32.saturating_pow(attempt))
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("API request failed after multiple retries.")]
    Exhausted { attempts: u32, last_status: StatusCode },
}

/// Sends HTTP requests, retrying transient failures with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryingFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Runs the request built by `build` until it yields a response the policy
    /// does not retry, or until the attempts run out.
    ///
    /// A transport error on the final attempt is returned as-is; running out of
    /// attempts on retryable statuses yields [`FetchError::Exhausted`].
    pub async fn fetch_with_retry<F>(&self, build: F) -> Result<Response, FetchError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let attempts = self.policy.attempts();
        let mut last_status = StatusCode::INTERNAL_SERVER_ERROR;

        for attempt in 0..attempts {
            let is_last = attempt + 1 == attempts;

            match build(&self.client).send().await {
                Ok(response) => {
                    let status = response.status();
                    if (self.policy.status_predicate)(status) == RetryDecision::Stop {
                        return Ok(response);
                    }
                    last_status = status;
                    if is_last {
                        break;
                    }
                    let delay = self.policy.delay_for_attempt(attempt);
                    log::warn!(
                        "[Retry] Request failed with status {}. Retrying in {:?}...",
                        status.as_u16(),
                        delay
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    if is_last {
                        return Err(FetchError::Transport(err));
                    }
                    let delay = self.policy.delay_for_attempt(attempt);
                    log::warn!(
                        "[Retry] Request failed with error: {}. Retrying in {:?}...",
                        err,
                        delay
                    );
                    sleep(delay).await;
                }
            }
        }

        Err(FetchError::Exhausted {
            attempts,
            last_status,
        })
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Response, FetchError> {
        self.fetch_with_retry(|client| client.post(url).json(body)).await
    }
}
