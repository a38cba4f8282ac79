//! Per-group hash aggregation.
//!
//! Drives the query client over a group's tag list, one tag at a time, and
//! folds the outcomes into a single deduplicated hash set. A failing tag
//! contributes nothing and never aborts the remaining tags.

use crate::client::TagSource;
use crate::models::{GroupCollection, GroupProfile, TagOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

/// Collect the union of hashes across all tags of a profile.
///
/// Tags are queried strictly in order, each awaited before the next. The
/// result set is the union of every successful outcome; `Empty` and
/// `Failed` outcomes contribute the empty set, so tag order never changes
/// the final contents.
pub async fn collect_group(source: &impl TagSource, profile: &GroupProfile) -> GroupCollection {
    println!("🔎 Collecting hashes for {}", profile);
    println!("   Tags: {}", profile.tags.join(", "));

    let bar = ProgressBar::new(profile.tags.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut hashes = std::collections::BTreeSet::new();
    let mut tags_empty = 0;
    let mut tags_failed = 0;

    for tag in &profile.tags {
        bar.set_message(tag.clone());

        let outcome = source.hashes_for_tag(tag).await;
        match &outcome {
            TagOutcome::Hashes(found) => {
                bar.println(format!("   ✅ {}: {} hashes", tag, found.len()));
            }
            TagOutcome::Empty => {
                tags_empty += 1;
                bar.println(format!("   ➖ {}: no results", tag));
            }
            TagOutcome::Failed(failure) => {
                tags_failed += 1;
                warn!("Tag '{}' contributed nothing: {}", tag, failure);
                bar.println(format!("   ⚠️  {}: {}", tag, failure));
            }
        }

        hashes.extend(outcome.into_hashes());
        bar.inc(1);
    }

    bar.finish_and_clear();

    info!(
        "Collected {} unique hashes for {} ({} tags, {} empty, {} failed)",
        hashes.len(),
        profile,
        profile.tags.len(),
        tags_empty,
        tags_failed
    );

    GroupCollection {
        profile: profile.clone(),
        hashes,
        tags_queried: profile.tags.len(),
        tags_empty,
        tags_failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueryFailure;
    use async_trait::async_trait;
    use std::collections::{BTreeSet, HashMap};

    /// Canned tag source. Unknown tags answer `Empty`.
    struct StubSource {
        outcomes: HashMap<String, TagOutcome>,
    }

    impl StubSource {
        fn new(entries: Vec<(&str, TagOutcome)>) -> Self {
            Self {
                outcomes: entries
                    .into_iter()
                    .map(|(tag, outcome)| (tag.to_string(), outcome))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl TagSource for StubSource {
        async fn hashes_for_tag(&self, tag: &str) -> TagOutcome {
            self.outcomes
                .get(tag)
                .cloned()
                .unwrap_or(TagOutcome::Empty)
        }
    }

    fn hashes(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn profile(tags: &[&str]) -> GroupProfile {
        GroupProfile {
            name: "TEMP.Veles".to_string(),
            identifier: "G0086".to_string(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_union_across_tags() {
        let source = StubSource::new(vec![
            ("TRITON", TagOutcome::Hashes(hashes(&["a1", "b2"]))),
            ("G0086", TagOutcome::Hashes(hashes(&["c3"]))),
        ]);

        let collection = collect_group(&source, &profile(&["TRITON", "G0086"])).await;

        assert_eq!(collection.hashes, hashes(&["a1", "b2", "c3"]));
        assert_eq!(collection.unique_hashes(), 3);
        assert_eq!(collection.tags_queried, 2);
        assert_eq!(collection.tags_failed, 0);
    }

    #[tokio::test]
    async fn test_duplicates_across_tags_are_merged() {
        let source = StubSource::new(vec![
            ("TRITON", TagOutcome::Hashes(hashes(&["a1", "b2"]))),
            ("TRISIS", TagOutcome::Hashes(hashes(&["b2", "c3"]))),
        ]);

        let collection = collect_group(&source, &profile(&["TRITON", "TRISIS"])).await;

        assert_eq!(collection.hashes, hashes(&["a1", "b2", "c3"]));
    }

    #[tokio::test]
    async fn test_failure_contributes_nothing_and_does_not_abort() {
        let source = StubSource::new(vec![
            (
                "TRITON",
                TagOutcome::Failed(QueryFailure::Transport("connection refused".to_string())),
            ),
            ("G0086", TagOutcome::Hashes(hashes(&["c3"]))),
        ]);

        let collection = collect_group(&source, &profile(&["TRITON", "G0086"])).await;

        assert_eq!(collection.hashes, hashes(&["c3"]));
        assert_eq!(collection.tags_failed, 1);
        assert_eq!(collection.tags_queried, 2);
    }

    #[tokio::test]
    async fn test_no_results_is_counted_not_failed() {
        let source = StubSource::new(vec![
            ("ATK91", TagOutcome::Empty),
            ("G0086", TagOutcome::Hashes(hashes(&["c3"]))),
        ]);

        let collection = collect_group(&source, &profile(&["ATK91", "G0086"])).await;

        assert_eq!(collection.hashes, hashes(&["c3"]));
        assert_eq!(collection.tags_empty, 1);
        assert_eq!(collection.tags_failed, 0);
    }

    #[tokio::test]
    async fn test_tag_order_does_not_change_the_set() {
        let source = StubSource::new(vec![
            ("TRITON", TagOutcome::Hashes(hashes(&["a1", "b2"]))),
            ("G0086", TagOutcome::Hashes(hashes(&["b2", "c3"]))),
        ]);

        let forward = collect_group(&source, &profile(&["TRITON", "G0086"])).await;
        let reversed = collect_group(&source, &profile(&["G0086", "TRITON"])).await;

        assert_eq!(forward.hashes, reversed.hashes);
    }

    #[tokio::test]
    async fn test_all_tags_empty_yields_empty_set() {
        let source = StubSource::new(vec![]);

        let collection = collect_group(&source, &profile(&["ATK91", "cryptcat"])).await;

        assert!(collection.hashes.is_empty());
        assert_eq!(collection.tags_empty, 2);
    }
}
