//! OAuth 2.0 client-credentials tokens for the Dataverse Web API.

use crate::error::{DataverseError, Result};
use http_transport::{HttpMethod, HttpRequest, HttpTransport};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;

/// Refresh this long before the reported expiry so a token never goes
/// stale mid-request.
const EXPIRY_SKEW: Duration = Duration::from_secs(300);

/// Whole-request deadline for the token endpoint.
const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    #[serde(default)]
    error_description: String,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Acquires bearer tokens and caches them until shortly before expiry.
///
/// One provider serves one client id / scope pair. The transport is passed
/// in per call so the provider itself stays transport-agnostic.
pub struct TokenProvider {
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cached: Option<CachedToken>,
}

impl TokenProvider {
    pub fn new(tenant_id: &str, client_id: &str, client_secret: &str, resource_url: &str) -> Self {
        TokenProvider {
            token_url: format!(
                "https://login.microsoftonline.com/{tenant_id}/oauth2/v2.0/token"
            ),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scope: format!("{resource_url}/.default"),
            cached: None,
        }
    }

    /// Return a valid bearer token, fetching a fresh one when the cache is
    /// empty or inside the refresh window.
    pub async fn access_token(&mut self, transport: &dyn HttpTransport) -> Result<String> {
        if let Some(cached) = &self.cached {
            if Instant::now() < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        let form = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("scope", &self.scope)
            .finish();

        let request = HttpRequest {
            method: HttpMethod::Post,
            url: self.token_url.clone(),
            headers: vec![(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            body: form.into_bytes(),
            timeout: Some(TOKEN_TIMEOUT),
        };
        let response = transport.send(request).await?;

        if response.status == 200 {
            if let Ok(token) = serde_json::from_slice::<TokenResponse>(&response.body) {
                let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_SKEW);
                tracing::debug!("Acquired Dataverse token, refresh in {}s", lifetime.as_secs());
                self.cached = Some(CachedToken {
                    access_token: token.access_token.clone(),
                    expires_at: Instant::now() + lifetime,
                });
                return Ok(token.access_token);
            }
        }

        let description = serde_json::from_slice::<TokenErrorBody>(&response.body)
            .ok()
            .map(|body| body.error_description)
            .filter(|description| !description.is_empty())
            .unwrap_or_else(|| format!("token endpoint returned status {}", response.status));
        Err(DataverseError::Auth(description))
    }
}
