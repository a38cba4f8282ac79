//! MalwareBazaar query client.
//!
//! One `get_taginfo` POST per tag against the configured endpoint. Every
//! failure mode is folded into [`TagOutcome`] here; callers never see a
//! transport or protocol error as an `Err`.

use crate::config::ApiConfig;
use crate::models::{QueryFailure, TagOutcome};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of per-tag hash sets.
///
/// The aggregator only depends on this trait, so tests can drive it with a
/// canned source instead of the live API.
#[async_trait]
pub trait TagSource {
    /// Query one tag and classify the result. Never fails outright: a
    /// failed query is reported as [`TagOutcome::Failed`].
    async fn hashes_for_tag(&self, tag: &str) -> TagOutcome;
}

/// Form body of a `get_taginfo` query.
#[derive(Debug, Serialize)]
struct TagQueryForm<'a> {
    query: &'static str,
    tag: &'a str,
    limit: usize,
}

/// Response envelope of a tag query.
#[derive(Debug, Deserialize)]
struct TagQueryResponse {
    query_status: String,
    #[serde(default)]
    data: Vec<SampleRecord>,
}

/// One sample entry in the response. Only the hash is of interest; the
/// service sends many more fields per sample.
#[derive(Debug, Deserialize)]
struct SampleRecord {
    #[serde(default)]
    sha256_hash: Option<String>,
}

/// Client for the MalwareBazaar tag-query API.
pub struct BazaarClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    limit: usize,
    timeout_seconds: u64,
}

impl BazaarClient {
    /// Create a client with the configured endpoint, limit and timeout.
    pub fn new(api: &ApiConfig, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            endpoint: api.endpoint.clone(),
            api_key: api_key.to_string(),
            limit: api.limit,
            timeout_seconds: api.timeout_seconds,
        })
    }

    /// Issue the single POST for a tag and decode the response envelope.
    async fn query_tag(&self, tag: &str) -> Result<TagQueryResponse, QueryFailure> {
        let form = TagQueryForm {
            query: "get_taginfo",
            tag,
            limit: self.limit,
        };

        debug!("POST {} tag={} limit={}", self.endpoint, tag, self.limit);

        let response = self
            .http
            .post(&self.endpoint)
            .header("API-Key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    QueryFailure::Transport(format!(
                        "request timed out after {}s",
                        self.timeout_seconds
                    ))
                } else if e.is_connect() {
                    QueryFailure::Transport(format!("cannot connect to {}", self.endpoint))
                } else {
                    QueryFailure::Transport(format!("request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(QueryFailure::Transport(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        response
            .json::<TagQueryResponse>()
            .await
            .map_err(|e| QueryFailure::Transport(format!("malformed response body: {}", e)))
    }
}

#[async_trait]
impl TagSource for BazaarClient {
    async fn hashes_for_tag(&self, tag: &str) -> TagOutcome {
        match self.query_tag(tag).await {
            Ok(response) => classify_response(response),
            Err(failure) => {
                warn!("Query for tag '{}' failed: {}", tag, failure);
                TagOutcome::Failed(failure)
            }
        }
    }
}

/// Map a decoded response envelope onto the outcome taxonomy.
///
/// `ok` yields the deduplicated hashes (empty and missing values are
/// dropped), `no_results` is an explicit empty outcome, and any other
/// status is a protocol failure.
fn classify_response(response: TagQueryResponse) -> TagOutcome {
    match response.query_status.as_str() {
        "ok" => {
            let hashes: BTreeSet<String> = response
                .data
                .into_iter()
                .filter_map(|sample| sample.sha256_hash)
                .filter(|hash| !hash.is_empty())
                .collect();
            TagOutcome::Hashes(hashes)
        }
        "no_results" => TagOutcome::Empty,
        other => TagOutcome::Failed(QueryFailure::Protocol(other.to_string())),
    }
}
