//! Trait seams between the engine and the boundary clients.

use crate::{AudienceMember, Contact};
use anyhow::Result;
use async_trait::async_trait;

/// A finite, forward-only sequence of contacts modified since a watermark.
///
/// Implementations buffer one source page at a time and fetch lazily, so a
/// caller that stops polling early causes no further page requests. Streams
/// cannot be rewound; re-reading means constructing a new stream.
#[async_trait]
pub trait ContactStream: Send {
    /// Yield the next contact, or `None` once the sequence is exhausted.
    ///
    /// An `Err` item ends the sequence: every poll after it returns `None`.
    async fn next(&mut self) -> Option<Result<Contact>>;
}

/// Destination for mapped audience members.
///
/// Implementations pace themselves (rate limiting happens inside the sink,
/// dry-run included) and report each write as a plain `Result`. Whether a
/// failed write aborts the run is the caller's policy, not the sink's.
#[async_trait]
pub trait AudienceSink: Send + Sync {
    /// Create or update one member, keyed by their hashed email address.
    async fn upsert_member(&self, member: &AudienceMember) -> Result<()>;
}
