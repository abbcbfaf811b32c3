//! Per-run configuration and outcome types.
//!
//! A run is one invocation of the pull-map-push loop. Its inputs are frozen
//! into a [`RunConfig`] up front; its outcome comes back as a [`RunReport`]
//! value rather than an error, so aborting on a write failure and finishing
//! normally share one code path for summaries and exit handling.

use chrono::{DateTime, Utc};

/// Validated inputs for a single sync run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Watermark: only contacts modified strictly after this instant are pulled.
    pub since: DateTime<Utc>,

    /// Upper bound on contacts processed; `None` means unbounded.
    pub limit: Option<u64>,

    /// Keep going after per-contact write failures instead of aborting.
    pub allow_partial: bool,

    /// Log would-be writes without calling the destination API.
    pub dry_run: bool,
}

/// Counters accumulated over one run.
///
/// `processed` counts contacts pulled from the stream; each of them lands in
/// exactly one of `succeeded` or `failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The contact sequence was drained to the end.
    Completed,
    /// A write failure stopped the run in strict mode.
    Aborted,
}

/// Outcome of a run.
///
/// Aborted runs are an expected result, not an error: the engine returns
/// this report either way and leaves exit-status policy to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub counters: RunCounters,
    pub status: RunStatus,
}

impl RunReport {
    /// True when a strict-mode write failure cut the run short.
    pub fn aborted(&self) -> bool {
        self.status == RunStatus::Aborted
    }
}
