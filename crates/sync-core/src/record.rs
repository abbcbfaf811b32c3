//! Record shapes at the two ends of the pipeline.
//!
//! [`Contact`] mirrors the Dataverse Web API row as selected by the source
//! client; [`AudienceMember`] is the body the destination client PUTs to the
//! Mailchimp members endpoint. Field renames pin both to their wire names so
//! the Rust side can use ordinary snake_case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contact row as returned by the Dataverse Web API.
///
/// Dataverse returns `null` (or omits the attribute entirely) for unset
/// fields, so everything is optional. Rows missing an email address still
/// flow through the pipeline and are counted as failures when the
/// destination rejects them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Contact {
    /// Primary key of the contact row.
    #[serde(rename = "contactid", default)]
    pub contact_id: Option<String>,

    /// Given name, used for the FNAME merge field.
    #[serde(rename = "firstname", default)]
    pub first_name: Option<String>,

    /// Family name, used for the LNAME merge field.
    #[serde(rename = "lastname", default)]
    pub last_name: Option<String>,

    /// Primary email address; the destination identity is derived from it.
    #[serde(rename = "emailaddress1", default)]
    pub email: Option<String>,

    /// Last modification instant, the attribute the watermark filters on.
    #[serde(rename = "modifiedon", default)]
    pub modified_on: Option<DateTime<Utc>>,
}

/// Member body for the Mailchimp `PUT /lists/{id}/members/{hash}` call.
///
/// `status_if_new` only applies when the PUT creates the member, so repeat
/// syncs never change the subscription status of someone who already
/// unsubscribed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudienceMember {
    pub email_address: String,
    pub status_if_new: String,
    pub merge_fields: MergeFields,
}

/// Name merge fields, keyed by their Mailchimp tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeFields {
    #[serde(rename = "FNAME")]
    pub first_name: String,

    #[serde(rename = "LNAME")]
    pub last_name: String,
}
