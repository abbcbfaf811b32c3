//! The pull-map-push engine.
//!
//! [`SyncEngine`] drains a contact stream into an audience sink and keeps
//! the run counters. It is generic over the [`ContactStream`] and
//! [`AudienceSink`] seams, so the same loop runs against the real clients
//! in production and against in-memory fakes in tests.
//!
//! Failure policy is the engine's whole personality:
//!
//! - **Source errors are fatal.** A failed page fetch propagates out as an
//!   error; the run produces no report.
//! - **Write errors are policy.** Strict runs (the default) stop at the
//!   first failed upsert and report `Aborted`; `--allow-partial` runs log
//!   the failure, count it, and keep going.
//!
//! Either way the engine logs exactly one `sync_summary` line before
//! returning.

use anyhow::Result;
use dataverse_source::{DataverseClient, DataverseContactStream, DataverseOpts};
use http_transport::ReqwestTransport;
use mailchimp_sink::{MailchimpClient, MailchimpOpts};
use std::sync::Arc;
use sync_core::{
    AudienceMember, AudienceSink, Contact, ContactStream, MergeFields, RunConfig, RunCounters,
    RunReport, RunStatus,
};

/// Map a source contact to the destination member shape.
///
/// Names default to empty strings when the source has none. The email
/// passes through untouched (contacts without one fail at the destination
/// and are counted like any other write failure). `status_if_new` only
/// affects newly created members, so nobody who unsubscribed gets flipped
/// back.
pub fn map_contact(contact: &Contact) -> AudienceMember {
    AudienceMember {
        email_address: contact.email.clone().unwrap_or_default(),
        status_if_new: "subscribed".to_string(),
        merge_fields: MergeFields {
            first_name: contact.first_name.clone().unwrap_or_default(),
            last_name: contact.last_name.clone().unwrap_or_default(),
        },
    }
}

/// Drives one run: pull from the stream, map, push into the sink.
pub struct SyncEngine<S, K> {
    stream: S,
    sink: K,
    allow_partial: bool,
}

impl<S: ContactStream, K: AudienceSink> SyncEngine<S, K> {
    pub fn new(stream: S, sink: K, allow_partial: bool) -> Self {
        SyncEngine {
            stream,
            sink,
            allow_partial,
        }
    }

    /// Run to completion (or abort) and return the report.
    pub async fn run(mut self) -> Result<RunReport> {
        let mut counters = RunCounters::default();
        let mut status = RunStatus::Completed;

        while let Some(next) = self.stream.next().await {
            let contact = next?;
            counters.processed += 1;

            let member = map_contact(&contact);
            match self.sink.upsert_member(&member).await {
                Ok(()) => counters.succeeded += 1,
                Err(e) => {
                    counters.failed += 1;
                    tracing::error!("Upsert error for contact {}: {e:#}", member.email_address);
                    if !self.allow_partial {
                        status = RunStatus::Aborted;
                        break;
                    }
                }
            }
        }

        // One summary per run, aborted or not.
        tracing::info!(
            "sync_summary: processed={} succeeded={} failed={}",
            counters.processed,
            counters.succeeded,
            counters.failed
        );

        Ok(RunReport { counters, status })
    }
}

/// Build the real clients from options and run one sync.
pub async fn run_sync(
    config: &RunConfig,
    dataverse: &DataverseOpts,
    mailchimp: &MailchimpOpts,
) -> Result<RunReport> {
    // Separate transports: the two APIs never share a connection pool.
    let source_transport = Arc::new(ReqwestTransport::default());
    let client = DataverseClient::new(dataverse, source_transport)?;
    let stream = DataverseContactStream::new(client, config.since, config.limit);

    let dest_transport = Arc::new(ReqwestTransport::default());
    let sink = MailchimpClient::connect(mailchimp, config.dry_run, dest_transport).await?;

    SyncEngine::new(stream, sink, config.allow_partial).run().await
}
