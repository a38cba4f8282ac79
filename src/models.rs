//! Data models for the hash collector.
//!
//! This module contains the core data structures used throughout the
//! application: group profiles, per-tag query outcomes, and the aggregated
//! per-group collection result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// A threat-actor group profile driving one collection run.
///
/// Loaded from configuration at startup and never mutated afterwards. The
/// `tags` sequence is queried in order; ordering affects log output only,
/// never the final hash set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupProfile {
    /// Group name (e.g. "TEMP.Veles").
    pub name: String,
    /// Tracking identifier (e.g. the MITRE ATT&CK id "G0086").
    pub identifier: String,
    /// Search tags submitted to the sample database, queried in order.
    pub tags: Vec<String>,
}

impl GroupProfile {
    /// Whether a `--group` filter matches this profile.
    ///
    /// Matches the name or the identifier, case-insensitively.
    pub fn matches(&self, filter: &str) -> bool {
        self.name.eq_ignore_ascii_case(filter) || self.identifier.eq_ignore_ascii_case(filter)
    }
}

impl fmt::Display for GroupProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.identifier)
    }
}

/// Why a single tag query produced no hashes.
///
/// The closed failure taxonomy of the query client. Both variants are
/// recovered where they occur: the aggregator logs the reason and moves on
/// to the next tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryFailure {
    /// The request never produced a usable response: connection failure,
    /// timeout, non-2xx HTTP status, or an unparsable body.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered, but with a status other than success or
    /// "no results".
    #[error("service reported status '{0}'")]
    Protocol(String),
}

/// Outcome of querying one tag. Consumed immediately by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    /// Success: the deduplicated hashes associated with the tag.
    Hashes(BTreeSet<String>),
    /// The service explicitly reported no samples for the tag.
    Empty,
    /// The query failed; contributes nothing to the aggregate.
    Failed(QueryFailure),
}

impl TagOutcome {
    /// The hashes this outcome contributes to the group aggregate.
    ///
    /// `Empty` and `Failed` both contribute the empty set.
    pub fn into_hashes(self) -> BTreeSet<String> {
        match self {
            TagOutcome::Hashes(hashes) => hashes,
            TagOutcome::Empty | TagOutcome::Failed(_) => BTreeSet::new(),
        }
    }
}

/// Aggregated result of collecting one group's tags.
#[derive(Debug, Clone)]
pub struct GroupCollection {
    /// The profile this collection ran for.
    pub profile: GroupProfile,
    /// Union of all successfully retrieved hashes, unique and sorted.
    pub hashes: BTreeSet<String>,
    /// Number of tags queried (always the full tag list).
    pub tags_queried: usize,
    /// Tags the service answered with "no results".
    pub tags_empty: usize,
    /// Tags whose query failed (transport or protocol).
    pub tags_failed: usize,
}

impl GroupCollection {
    /// Total number of unique hashes collected.
    pub fn unique_hashes(&self) -> usize {
        self.hashes.len()
    }
}
