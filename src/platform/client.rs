//! HTTP platform client
//!
//! Production implementation of [`AccessPlatform`] over the platform's JSON
//! API. Owns the identity credential and the HTTP transport; transient
//! transport failures are retried with exponential backoff before an error
//! surfaces to the control loop.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{PlatformError, PlatformResult};
use crate::identity::Identity;
use crate::model::AccessRequest;
use crate::platform::types::{AccessRequestRecord, LockBody, StateUpdateBody};
use crate::platform::{AccessPlatform, LockSpec, RequestDecision};

/// Per-call timeout; not operator-configurable.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transient transport failures are retried this many times.
const MAX_RETRIES: u32 = 3;

/// HTTP client for the access platform
pub struct PlatformClient {
    http: Client,
    base_url: String,
    identity: Identity,
}

impl PlatformClient {
    /// Create a client for the platform behind `proxy_addr` (host:port).
    pub fn new(proxy_addr: &str, identity: Identity) -> PlatformResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("jitwatch/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PlatformError::Request)?;

        Ok(Self {
            http,
            base_url: api_base(proxy_addr),
            identity,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.identity.credential())
    }

    /// Execute a request, retrying transient transport failures.
    async fn execute(&self, request: RequestBuilder) -> PlatformResult<Response> {
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
                debug!("Retrying platform request (attempt {})", attempt + 1);
            }

            let req = request.try_clone().ok_or_else(|| {
                PlatformError::InvalidResponse("Cannot clone request".to_string())
            })?;

            match req.send().await {
                Ok(response) => {
                    return handle_response(response).await;
                }
                Err(e) => {
                    warn!("Platform request failed: {}", e);
                    let err = PlatformError::Request(e);
                    let retryable = is_retryable(&err);
                    last_error = Some(err);

                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| PlatformError::InvalidResponse("Unknown error".to_string())))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> PlatformResult<T> {
        let request = self.authenticate(self.http.get(self.url(path)));
        let response = self.execute(request).await?;

        response.json().await.map_err(|e| {
            PlatformError::InvalidResponse(format!("Failed to parse response: {}", e))
        })
    }

    async fn put_no_content<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> PlatformResult<()> {
        let request = self.authenticate(self.http.put(self.url(path)).json(body));
        self.execute(request).await?;
        Ok(())
    }
}

#[async_trait]
impl AccessPlatform for PlatformClient {
    async fn ping(&self) -> PlatformResult<()> {
        let request = self.authenticate(self.http.get(self.url("/ping")));
        self.execute(request).await?;
        Ok(())
    }

    async fn list_access_requests(&self) -> PlatformResult<Vec<AccessRequest>> {
        let records: Vec<AccessRequestRecord> = self.get("/access-requests").await?;
        Ok(records
            .into_iter()
            .map(AccessRequestRecord::into_snapshot)
            .collect())
    }

    async fn set_request_state(
        &self,
        request_id: &str,
        decision: RequestDecision,
        reason: &str,
    ) -> PlatformResult<()> {
        let body = StateUpdateBody {
            state: decision.as_str(),
            reason,
        };
        self.put_no_content(&format!("/access-requests/{}/state", request_id), &body)
            .await
    }

    async fn upsert_lock(&self, lock: &LockSpec) -> PlatformResult<()> {
        let body = LockBody::from_spec(lock);
        self.put_no_content(&format!("/locks/{}", lock.name), &body)
            .await
    }
}

/// Normalize the proxy address into the API base URL.
fn api_base(proxy_addr: &str) -> String {
    let origin = if proxy_addr.starts_with("http://") || proxy_addr.starts_with("https://") {
        proxy_addr.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", proxy_addr.trim_end_matches('/'))
    };
    format!("{}/v1", origin)
}

async fn handle_response(response: Response) -> PlatformResult<Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(PlatformError::from_response(status.as_u16(), &body))
}

fn is_retryable(error: &PlatformError) -> bool {
    match error {
        PlatformError::Request(e) => e.is_connect() || e.is_timeout(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_adds_scheme() {
        assert_eq!(
            api_base("teleport.example.com:443"),
            "https://teleport.example.com:443/v1"
        );
    }

    #[test]
    fn test_api_base_keeps_explicit_scheme() {
        assert_eq!(api_base("http://127.0.0.1:3080"), "http://127.0.0.1:3080/v1");
        assert_eq!(
            api_base("https://proxy.internal/"),
            "https://proxy.internal/v1"
        );
    }
}
