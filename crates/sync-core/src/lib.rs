//! Core types shared across the mailchimp-sync workspace.
//!
//! This crate defines the vocabulary the rest of the workspace speaks:
//!
//! - [`Contact`] / [`AudienceMember`] - the source and destination record shapes
//! - [`RunConfig`] / [`RunCounters`] / [`RunReport`] - per-run inputs and outcome
//! - [`ContactStream`] / [`AudienceSink`] - the seams the engine is generic over
//!
//! # Architecture
//!
//! The boundary crates depend on sync-core and never on each other, so either
//! side can be swapped or mocked without touching the other:
//!
//! ```text
//! dataverse-source ──▶ ContactStream ─┐
//!       (Contact)                     ├──▶ mailchimp-sync engine
//! mailchimp-sink   ──▶ AudienceSink  ─┘      (map + counters)
//!   (AudienceMember)
//! ```

pub mod record;
pub mod run;
pub mod traits;

// Re-exports for convenience
pub use record::{AudienceMember, Contact, MergeFields};
pub use run::{RunConfig, RunCounters, RunReport, RunStatus};
pub use traits::{AudienceSink, ContactStream};
