//! Reservation service client implementation

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::error::{ClientError, Result};

/// Default connect timeout for status fetches
const FETCH_CONNECT_TIMEOUT: Duration = Duration::from_millis(800);
/// Default request timeout for status fetches
const FETCH_READ_TIMEOUT: Duration = Duration::from_millis(1000);
/// Default connect timeout for lock-change submits
const SUBMIT_CONNECT_TIMEOUT: Duration = Duration::from_millis(1000);
/// Default request timeout for lock-change submits
const SUBMIT_READ_TIMEOUT: Duration = Duration::from_millis(2000);
/// Default attempt budget for lock-change submits
const SUBMIT_MAX_RETRIES: u32 = 5;
/// Initial backoff between submit attempts, doubled per attempt
const SUBMIT_BACKOFF_BASE: Duration = Duration::from_millis(300);

/// Timeout and retry policy for the two remote operations.
///
/// Reads and writes differ: a fetch fails fast with no retry (the next
/// timer tick repeats it), a submit gets a longer timeout pair plus a
/// bounded retry budget.
#[derive(Debug, Clone, Copy)]
pub struct RemoteTimeouts {
    pub fetch_connect: Duration,
    pub fetch_read: Duration,
    pub submit_connect: Duration,
    pub submit_read: Duration,
    pub submit_max_retries: u32,
    /// Initial delay between submit attempts, doubled per attempt
    pub submit_backoff: Duration,
}

impl Default for RemoteTimeouts {
    fn default() -> Self {
        Self {
            fetch_connect: FETCH_CONNECT_TIMEOUT,
            fetch_read: FETCH_READ_TIMEOUT,
            submit_connect: SUBMIT_CONNECT_TIMEOUT,
            submit_read: SUBMIT_READ_TIMEOUT,
            submit_max_retries: SUBMIT_MAX_RETRIES,
            submit_backoff: SUBMIT_BACKOFF_BASE,
        }
    }
}

/// HTTP client for the delivery reservation service.
///
/// Returns raw response bodies; parsing and identity validation are the
/// caller's concern so that a stale or mismatched response can be
/// rejected with the full request context at hand.
#[derive(Debug, Clone)]
pub struct ReservationClient {
    fetch_client: Client,
    submit_client: Client,
    base_url: Url,
    submit_max_retries: u32,
    submit_backoff: Duration,
}

impl ReservationClient {
    /// Create a client with the default timeout and retry policy.
    pub fn new(base_url: &str, access_token: &str) -> Result<Self> {
        Self::with_timeouts(base_url, access_token, RemoteTimeouts::default())
    }

    /// Create a client with an explicit timeout and retry policy.
    ///
    /// Every request carries `Authorization: Token <access_token>` plus
    /// JSON accept/content-type headers.
    pub fn with_timeouts(
        base_url: &str,
        access_token: &str,
        timeouts: RemoteTimeouts,
    ) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // Endpoint paths are joined relative to the base, so a path
        // prefix in the configured URL must keep its trailing slash to
        // survive the join.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let token = HeaderValue::from_str(&format!("Token {}", access_token))
            .map_err(|_| ClientError::InvalidToken)?;
        headers.insert(AUTHORIZATION, token);

        let fetch_client = Client::builder()
            .connect_timeout(timeouts.fetch_connect)
            .timeout(timeouts.fetch_read)
            .default_headers(headers.clone())
            .build()
            .map_err(ClientError::Network)?;

        let submit_client = Client::builder()
            .connect_timeout(timeouts.submit_connect)
            .timeout(timeouts.submit_read)
            .default_headers(headers)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            fetch_client,
            submit_client,
            base_url,
            submit_max_retries: timeouts.submit_max_retries.max(1),
            submit_backoff: timeouts.submit_backoff,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self) -> Result<Url> {
        Ok(self.base_url.join("api/vehicle_status")?)
    }

    /// Fetch the current vehicle status.
    ///
    /// `GET <base>/api/vehicle_status?vehicle_id=<id>`. No retry: a
    /// transport or status failure is surfaced immediately, the next
    /// timer tick is the retry.
    pub async fn fetch_status(&self, vehicle_id: &str) -> Result<String> {
        let mut url = self.endpoint()?;
        url.query_pairs_mut().append_pair("vehicle_id", vehicle_id);

        let response = self
            .fetch_client
            .get(url)
            .send()
            .await
            .map_err(ClientError::Network)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClientError::Status(status.as_u16()));
        }
        response.text().await.map_err(ClientError::Network)
    }

    /// Submit a lock-flag change.
    ///
    /// `PATCH <base>/api/vehicle_status` with `{"vehicle_id", "lock_flg"}`.
    /// Transport-level failures are retried up to the configured attempt
    /// budget with exponential backoff; non-success HTTP statuses are
    /// permanent and returned immediately. The caller sees only the final
    /// outcome, never the attempt count.
    pub async fn submit_lock_change(&self, vehicle_id: &str, lock_engaged: bool) -> Result<String> {
        let url = self.endpoint()?;
        let payload = serde_json::json!({
            "vehicle_id": vehicle_id,
            "lock_flg": i64::from(lock_engaged),
        });

        let mut backoff = self.submit_backoff;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let sent = self
                .submit_client
                .patch(url.clone())
                .json(&payload)
                .send()
                .await;

            match sent {
                Ok(response) => {
                    let status = response.status();
                    if status != StatusCode::OK {
                        return Err(ClientError::Status(status.as_u16()));
                    }
                    return response.text().await.map_err(ClientError::Network);
                }
                Err(e) if attempt < self.submit_max_retries => {
                    debug!(attempt, "lock-change submit failed, retrying: {}", e);
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(ClientError::Network(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = ReservationClient::new("http://localhost:5000", "token");
        assert!(client.is_ok());
    }

    #[test]
    fn invalid_url_is_rejected() {
        let client = ReservationClient::new("not a url", "token");
        assert!(matches!(client, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn invalid_token_is_rejected() {
        let client = ReservationClient::new("http://localhost:5000", "bad\ntoken");
        assert!(matches!(client, Err(ClientError::InvalidToken)));
    }

    #[test]
    fn default_policy_matches_design_values() {
        let timeouts = RemoteTimeouts::default();
        assert_eq!(timeouts.fetch_connect, Duration::from_millis(800));
        assert_eq!(timeouts.fetch_read, Duration::from_millis(1000));
        assert_eq!(timeouts.submit_connect, Duration::from_millis(1000));
        assert_eq!(timeouts.submit_read, Duration::from_millis(2000));
        assert_eq!(timeouts.submit_max_retries, 5);
        assert_eq!(timeouts.submit_backoff, Duration::from_millis(300));
    }

    #[test]
    fn endpoint_preserves_base_path_prefix() {
        let client = ReservationClient::new("http://localhost:5000/tenant", "token").unwrap();
        assert_eq!(
            client.endpoint().unwrap().as_str(),
            "http://localhost:5000/tenant/api/vehicle_status"
        );

        let client = ReservationClient::new("http://localhost:5000/tenant/", "token").unwrap();
        assert_eq!(
            client.endpoint().unwrap().as_str(),
            "http://localhost:5000/tenant/api/vehicle_status"
        );
    }

    #[test]
    fn endpoint_without_prefix_targets_the_api_root() {
        let client = ReservationClient::new("http://localhost:5000", "token").unwrap();
        assert_eq!(
            client.endpoint().unwrap().as_str(),
            "http://localhost:5000/api/vehicle_status"
        );
    }
}
