//! Mailchimp audience sink for mailchimp-sync.
//!
//! Writes contacts into a Mailchimp audience as idempotent member upserts:
//!
//! - [`MailchimpClient`] - connect-time credential check, then rate-limited
//!   `PUT /lists/{id}/members/{hash}` calls
//! - [`RateLimiter`] - token bucket pacing every write, dry-run included
//! - [`MailchimpOpts`] - CLI/environment options, flattened into the binary
//!
//! Member identity is the MD5 of the lower-cased email address, which is
//! what makes repeat syncs converge instead of piling up duplicates.

use clap::Parser;

pub mod client;
pub mod error;
pub mod rate_limit;

pub use client::{subscriber_hash, MailchimpClient};
pub use error::{Error, Result};
pub use rate_limit::RateLimiter;

/// Mailchimp connection options.
#[derive(Debug, Clone, Parser)]
pub struct MailchimpOpts {
    /// Mailchimp API key; the datacenter suffix after the last '-' picks
    /// the regional endpoint
    #[arg(long, env = "MAILCHIMP_API_KEY")]
    pub mailchimp_api_key: String,

    /// Audience (list) id receiving the upserts
    #[arg(long, env = "MAILCHIMP_AUDIENCE_ID")]
    pub mailchimp_audience_id: String,

    /// Write budget in requests per second
    #[arg(long, env = "MC_RATE_LIMIT", default_value_t = 10)]
    pub mc_rate_limit: u32,
}
