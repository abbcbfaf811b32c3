//! Dataverse source for mailchimp-sync.
//!
//! Reads contacts modified after a watermark from the Dataverse Web API:
//!
//! - [`DataverseClient`] - authenticated GET with throttle-aware retry
//! - [`DataverseContactStream`] - lazy page-at-a-time contact stream
//! - [`DataverseOpts`] - CLI/environment options, flattened into the binary
//!
//! Authentication uses the OAuth 2.0 client-credentials grant against the
//! tenant's Microsoft login endpoint; tokens are cached and refreshed
//! shortly before expiry. Pagination follows `@odata.nextLink` exactly as
//! the server hands it out.

use clap::Parser;

pub mod auth;
pub mod client;
pub mod error;
pub mod stream;

pub use client::DataverseClient;
pub use error::{DataverseError, Result};
pub use stream::{contacts_url, DataverseContactStream};

/// Dataverse connection options.
///
/// All four are required; secrets normally arrive via the environment
/// rather than flags.
#[derive(Debug, Clone, Parser)]
pub struct DataverseOpts {
    /// Azure AD tenant id for the client-credentials grant
    #[arg(long, env = "DATAVERSE_TENANT_ID")]
    pub dataverse_tenant_id: String,

    /// OAuth client (application) id
    #[arg(long, env = "DATAVERSE_CLIENT_ID")]
    pub dataverse_client_id: String,

    /// OAuth client secret
    #[arg(long, env = "DATAVERSE_CLIENT_SECRET")]
    pub dataverse_client_secret: String,

    /// Dataverse environment URL, e.g. https://org.crm.dynamics.com
    #[arg(long, env = "DATAVERSE_RESOURCE")]
    pub dataverse_resource: String,
}
