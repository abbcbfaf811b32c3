//! Authenticated Dataverse Web API client with throttle-aware retry.

use crate::auth::TokenProvider;
use crate::error::{DataverseError, Result};
use crate::DataverseOpts;
use http_transport::{header_get, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use rand::Rng;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Attempt budget for throttled requests.
const MAX_RETRIES: u32 = 5;

/// Base of the exponential backoff schedule, in seconds.
const BACKOFF_BASE_SECS: f64 = 1.5;

/// Whole-request deadline for Web API reads.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Dataverse Web API client.
///
/// Owns its transport and token cache; construct one per run. Requests are
/// retried only on the throttling statuses (429, 503), with `Retry-After`
/// respected when the server sends one.
pub struct DataverseClient {
    transport: Arc<dyn HttpTransport>,
    auth: TokenProvider,
    resource_url: String,
}

impl std::fmt::Debug for DataverseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataverseClient")
            .field("resource_url", &self.resource_url)
            .finish_non_exhaustive()
    }
}

impl DataverseClient {
    /// Build a client from options, validating that every credential is
    /// present before anything touches the network.
    pub fn new(opts: &DataverseOpts, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        for (name, value) in [
            ("tenant id", &opts.dataverse_tenant_id),
            ("client id", &opts.dataverse_client_id),
            ("client secret", &opts.dataverse_client_secret),
            ("resource URL", &opts.dataverse_resource),
        ] {
            if value.trim().is_empty() {
                return Err(DataverseError::Config(format!("Dataverse {name} is not set")));
            }
        }

        let resource_url = opts.dataverse_resource.trim_end_matches('/').to_string();
        let auth = TokenProvider::new(
            &opts.dataverse_tenant_id,
            &opts.dataverse_client_id,
            &opts.dataverse_client_secret,
            &resource_url,
        );

        Ok(DataverseClient {
            transport,
            auth,
            resource_url,
        })
    }

    /// Environment URL with any trailing slash stripped.
    pub fn resource_url(&self) -> &str {
        &self.resource_url
    }

    /// GET `url` and decode the JSON payload.
    ///
    /// 429 and 503 sleep and retry up to the attempt budget; every other
    /// non-success status fails immediately with the response body attached.
    pub(crate) async fn get_json<T: DeserializeOwned>(&mut self, url: &str) -> Result<T> {
        for attempt in 0..MAX_RETRIES {
            let token = self.auth.access_token(self.transport.as_ref()).await?;
            let request = HttpRequest {
                method: HttpMethod::Get,
                url: url.to_string(),
                headers: vec![
                    ("Authorization".to_string(), format!("Bearer {token}")),
                    ("Accept".to_string(), "application/json".to_string()),
                    ("OData-MaxVersion".to_string(), "4.0".to_string()),
                    ("OData-Version".to_string(), "4.0".to_string()),
                ],
                body: Vec::new(),
                timeout: Some(REQUEST_TIMEOUT),
            };
            let response = self.transport.send(request).await?;

            if response.status == 429 || response.status == 503 {
                let wait = throttle_wait(&response, attempt);
                tracing::warn!(
                    "Dataverse throttled (status {}), retrying in {:.1}s",
                    response.status,
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
                continue;
            }
            if !(200..300).contains(&response.status) {
                return Err(DataverseError::Http {
                    status: response.status,
                    body: String::from_utf8_lossy(&response.body).into_owned(),
                });
            }
            return Ok(serde_json::from_slice(&response.body)?);
        }

        Err(DataverseError::RetryBudgetExceeded {
            attempts: MAX_RETRIES,
        })
    }
}

/// Wait before retrying a throttled response: `Retry-After` when the server
/// sent a usable one, exponential backoff otherwise, plus up to 30% jitter
/// so synchronized clients fan out.
fn throttle_wait(response: &HttpResponse, attempt: u32) -> Duration {
    let base = header_get(&response.headers, "Retry-After")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map_or_else(
            || BACKOFF_BASE_SECS * 2f64.powi(attempt as i32),
            |secs| secs as f64,
        );
    let jitter = rand::rng().random_range(0.0..0.3) * base;
    Duration::from_secs_f64(base + jitter)
}
