//! Mailchimp marketing API client.

use crate::error::{Error, Result};
use crate::rate_limit::RateLimiter;
use crate::MailchimpOpts;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http_transport::{HttpMethod, HttpRequest, HttpTransport};
use md5::{Digest, Md5};
use std::sync::Arc;
use std::time::Duration;
use sync_core::{AudienceMember, AudienceSink};

/// Whole-request deadline for the connect-time ping.
const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Whole-request deadline for member writes.
const UPSERT_TIMEOUT: Duration = Duration::from_secs(30);

/// Stable member identity: hex MD5 of the lower-cased email address.
///
/// Casing variants of one address hash identically, which is what makes
/// the member PUT an upsert rather than a duplicate insert.
pub fn subscriber_hash(email: &str) -> String {
    hex::encode(Md5::digest(email.to_lowercase().as_bytes()))
}

/// Mailchimp API client bound to one audience.
///
/// `connect` resolves the regional endpoint from the API key and proves
/// the credentials against `/ping` before any record is processed, so a
/// bad key fails the run up front instead of on the first contact.
pub struct MailchimpClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    audience_id: String,
    auth_header: String,
    limiter: RateLimiter,
    dry_run: bool,
}

impl std::fmt::Debug for MailchimpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailchimpClient")
            .field("base_url", &self.base_url)
            .field("audience_id", &self.audience_id)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl MailchimpClient {
    pub async fn connect(
        opts: &MailchimpOpts,
        dry_run: bool,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let api_key = opts.mailchimp_api_key.as_str();
        let dc = match api_key.rsplit_once('-') {
            Some((_, dc)) if !dc.is_empty() => dc,
            _ => {
                return Err(Error::Config(
                    "MAILCHIMP_API_KEY is missing its datacenter suffix".to_string(),
                ))
            }
        };
        if opts.mailchimp_audience_id.trim().is_empty() {
            return Err(Error::Config("MAILCHIMP_AUDIENCE_ID is not set".to_string()));
        }
        if opts.mc_rate_limit == 0 {
            return Err(Error::Config(
                "MC_RATE_LIMIT must be at least 1 request per second".to_string(),
            ));
        }

        let client = MailchimpClient {
            transport,
            base_url: format!("https://{dc}.api.mailchimp.com/3.0"),
            audience_id: opts.mailchimp_audience_id.clone(),
            auth_header: format!("Basic {}", STANDARD.encode(format!("anystring:{api_key}"))),
            limiter: RateLimiter::new(opts.mc_rate_limit),
            dry_run,
        };
        client.ping().await?;
        Ok(client)
    }

    /// Credential check: `GET /ping` must answer 200.
    async fn ping(&self) -> Result<()> {
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/ping", self.base_url),
            headers: vec![("Authorization".to_string(), self.auth_header.clone())],
            body: Vec::new(),
            timeout: Some(PING_TIMEOUT),
        };
        let response = self.transport.send(request).await?;
        if response.status != 200 {
            return Err(Error::Credential {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        tracing::debug!("Mailchimp credentials verified");
        Ok(())
    }

    /// Create-or-update one audience member, keyed by subscriber hash.
    ///
    /// Every call consumes a rate-limiter permit before anything else, so
    /// dry runs rehearse production pacing. 200 and 201 are success;
    /// anything else is reported to the caller without retrying.
    pub async fn upsert_member(&self, member: &AudienceMember) -> Result<()> {
        self.limiter.acquire().await;

        if self.dry_run {
            tracing::info!("dry-run: would upsert {}", member.email_address);
            return Ok(());
        }

        let url = format!(
            "{}/lists/{}/members/{}",
            self.base_url,
            self.audience_id,
            subscriber_hash(&member.email_address)
        );
        let request = HttpRequest {
            method: HttpMethod::Put,
            url,
            headers: vec![
                ("Authorization".to_string(), self.auth_header.clone()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: serde_json::to_vec(member)?,
            timeout: Some(UPSERT_TIMEOUT),
        };
        let response = self.transport.send(request).await?;

        if !matches!(response.status, 200 | 201) {
            return Err(Error::Upsert {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        tracing::debug!("Upserted {}", member.email_address);
        Ok(())
    }
}

#[async_trait::async_trait]
impl AudienceSink for MailchimpClient {
    async fn upsert_member(&self, member: &AudienceMember) -> anyhow::Result<()> {
        Ok(MailchimpClient::upsert_member(self, member).await?)
    }
}
