//! mailchimp-sync: incremental sync of Dataverse contacts into a Mailchimp
//! audience.
//!
//! A run pulls contacts modified after a watermark from the Dataverse Web
//! API, maps each one to an audience member, and upserts it into Mailchimp
//! keyed by the hash of its email address, so repeat runs converge on the
//! same destination state.
//!
//! The workspace splits along the data flow:
//!
//! - `dataverse-source` - OAuth, pagination, throttle-aware retry
//! - `sync-core` - record shapes, run types, the stream/sink seams
//! - `mailchimp-sink` - credential ping, rate-limited idempotent upserts
//! - `http-transport` - the mockable HTTP boundary both clients share
//!
//! This crate holds the engine that drives a [`sync::SyncEngine`] run and
//! the CLI binary around it.

pub mod sync;
pub mod watermark;

// Re-export main types for convenience
pub use sync::{map_contact, run_sync, SyncEngine};
