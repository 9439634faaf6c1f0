//! Fetch-with-retry HTTP wrapper
//!
//! Performs a GET against a fully-formed URL and returns parsed JSON.
//! Transient HTTP failures are retried a bounded number of times with a
//! fixed backoff; 404 is treated as a permanent "not found" and never
//! retried. Connection and decode failures propagate immediately, so the
//! retry budget only applies to status-code failures.

use crate::config::WeatherConfig;
use crate::error::{ApiError, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("WeatherHub/", env!("CARGO_PKG_VERSION"));

/// Decide whether a failed status code is worth another attempt.
///
/// Kept as a pure function so the retry policy is testable without I/O.
/// Only 404 is definitively non-retriable; everything else (5xx, 429,
/// and the remaining 4xx) gets the full budget.
#[must_use]
pub fn should_retry(status: u16) -> bool {
    status != 404
}

/// HTTP client with bounded retry, shared by the weather fetch paths.
pub struct HttpClient {
    client: reqwest::Client,
    max_retries: u32,
    backoff: Duration,
}

impl HttpClient {
    /// Create a client from the weather section of the configuration.
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// GET `url` and decode the JSON body.
    ///
    /// Performs at most `max_retries + 1` attempts. A non-2xx response
    /// becomes [`ApiError::Http`]; when `should_retry` allows and budget
    /// remains, the client sleeps the fixed backoff and tries again.
    ///
    /// # Errors
    /// Propagates the final [`ApiError`] once the budget is exhausted or
    /// the failure is non-retriable.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let max_attempts = self.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(url, attempt, max_attempts, "Issuing HTTP request");

            match self.attempt(url).await {
                Err(ApiError::Http { status }) if should_retry(status) && attempt < max_attempts => {
                    warn!(
                        url,
                        status,
                        attempt,
                        backoff_ms = self.backoff.as_millis() as u64,
                        "Transient HTTP failure, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                result => return result,
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::malformed(format!("Failed to decode JSON body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::Deserialize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        value: u32,
    }

    fn test_client(max_retries: u32) -> HttpClient {
        let config = WeatherConfig {
            base_url: String::new(),
            timeout_seconds: 5,
            max_retries,
            retry_backoff_ms: 5,
        };
        HttpClient::new(&config).unwrap()
    }

    #[rstest]
    #[case(404, false)]
    #[case(400, true)]
    #[case(401, true)]
    #[case(429, true)]
    #[case(500, true)]
    #[case(503, true)]
    fn test_should_retry(#[case] status: u16, #[case] expected: bool) {
        assert_eq!(should_retry(status), expected);
    }

    #[tokio::test]
    async fn test_success_performs_single_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": 7
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(2);
        let payload: Payload = client
            .get_json(&format!("{}/data", server.uri()))
            .await
            .unwrap();
        assert_eq!(payload, Payload { value: 7 });
    }

    #[tokio::test]
    async fn test_transient_failure_uses_full_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3) // max_retries = 2 => exactly 3 attempts
            .mount(&server)
            .await;

        let client = test_client(2);
        let err = client
            .get_json::<Payload>(&format!("{}/data", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_not_found_is_never_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(2);
        let err = client
            .get_json::<Payload>(&format!("{}/data", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_recovery_after_one_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": 9
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(2);
        let payload: Payload = client
            .get_json(&format!("{}/data", server.uri()))
            .await
            .unwrap();
        assert_eq!(payload.value, 9);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_malformed_and_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(2);
        let err = client
            .get_json::<Payload>(&format!("{}/data", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Malformed { .. }));
    }
}
