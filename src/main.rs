//! HashHarvest - MalwareBazaar hash collector for threat-actor groups
//!
//! A CLI tool that queries MalwareBazaar for every search tag of the
//! configured group profiles and writes each group's unique SHA256 hashes
//! to a sorted, single-column CSV file.
//!
//! Exit codes:
//!   0 - Completed run (including zero-hash runs and failed writes)
//!   1 - Startup error (bad arguments, unreadable config, missing key)

mod cli;
mod client;
mod collector;
mod config;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use client::BazaarClient;
use config::Config;
use models::GroupProfile;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("HashHarvest v{}", env!("CARGO_PKG_VERSION"));

    // Run the collection
    match run_collection(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Collection failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .hashharvest.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".hashharvest.toml");

    if path.exists() {
        eprintln!("⚠️  .hashharvest.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .hashharvest.toml")?;

    println!("✅ Created .hashharvest.toml with default settings.");
    println!("   Edit it to add your groups, then set MALWAREBAZAAR_API_KEY.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete collection workflow.
async fn run_collection(args: Args) -> Result<()> {
    let start_time = Instant::now();
    let started_at = Utc::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    if let Err(e) = config.validate() {
        anyhow::bail!(e);
    }

    let groups = selected_groups(&config, args.group.as_deref())?;

    // Handle --dry-run: list groups and tags, no network
    if args.dry_run {
        return handle_dry_run(&groups);
    }

    let api_key = match config.api_key() {
        Some(key) => key.to_string(),
        None => anyhow::bail!(
            "An API key is required. Set MALWAREBAZAAR_API_KEY, pass --api-key, \
             or add `key` under [api] in the config file"
        ),
    };

    println!("🕸️  MalwareBazaar endpoint: {}", config.api.endpoint);
    println!(
        "   Per-tag limit: {} | Timeout: {}s | Groups: {}\n",
        config.api.limit,
        config.api.timeout_seconds,
        groups.len()
    );

    let client = BazaarClient::new(&config.api, &api_key)?;
    let output_dir = PathBuf::from(&config.output.dir);

    let mut total_hashes = 0usize;
    let mut files_written = 0usize;

    for profile in &groups {
        let collection = collector::collect_group(&client, profile).await;
        total_hashes += collection.unique_hashes();

        println!(
            "\n📊 {}: {} unique hashes ({} tags queried, {} empty, {} failed)",
            collection.profile,
            collection.unique_hashes(),
            collection.tags_queried,
            collection.tags_empty,
            collection.tags_failed
        );

        if persist_collection(&output_dir, &collection).is_some() {
            files_written += 1;
        }
    }

    let duration = start_time.elapsed().as_secs_f64();

    println!(
        "\n📦 Run complete: {} group(s), {} hashes collected, {} file(s) written",
        groups.len(),
        total_hashes,
        files_written
    );
    println!(
        "   Started: {} | Duration: {:.1}s",
        started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        duration
    );

    Ok(())
}

/// Write a group's CSV unless nothing was collected.
///
/// The writer is never invoked for an empty set; the skip is logged
/// instead. A write failure is logged with path and cause and reported as
/// `None`, leaving the rest of the run untouched.
fn persist_collection(
    output_dir: &std::path::Path,
    collection: &models::GroupCollection,
) -> Option<PathBuf> {
    if collection.hashes.is_empty() {
        println!(
            "ℹ️  No hashes collected for {}. Skipping CSV creation.",
            collection.profile
        );
        return None;
    }

    match report::write_group_csv(output_dir, &collection.profile, &collection.hashes) {
        Ok(path) => {
            println!(
                "✅ Saved {} unique SHA256 hashes to: {}",
                collection.unique_hashes(),
                path.display()
            );
            Some(path)
        }
        Err(e) => {
            error!("Failed to write output for {}: {:#}", collection.profile, e);
            eprintln!("⚠️  {:#}", e);
            None
        }
    }
}

/// Handle --dry-run: list the selected profiles and their tags, exit.
fn handle_dry_run(groups: &[GroupProfile]) -> Result<()> {
    println!("\n🔍 Dry run: listing configured groups (no queries issued)...\n");

    for profile in groups {
        println!("   {}: {} tag(s)", profile, profile.tags.len());
        for tag in &profile.tags {
            println!("     🏷️  {}", tag);
        }
    }

    println!("\n✅ Dry run complete. No queries were issued.");
    Ok(())
}

/// Resolve the group list for this run, honoring a --group filter.
fn selected_groups(config: &Config, filter: Option<&str>) -> Result<Vec<GroupProfile>> {
    match filter {
        Some(name) => {
            let groups: Vec<GroupProfile> = config
                .groups
                .iter()
                .filter(|g| g.matches(name))
                .cloned()
                .collect();

            if groups.is_empty() {
                anyhow::bail!("No configured group matches '{}'", name);
            }
            Ok(groups)
        }
        None => Ok(config.groups.clone()),
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .hashharvest.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::GroupCollection;
    use std::collections::BTreeSet;

    #[test]
    fn test_selected_groups_filter() {
        let config = Config::default();

        let all = selected_groups(&config, None).unwrap();
        assert_eq!(all.len(), 1);

        let by_id = selected_groups(&config, Some("g0086")).unwrap();
        assert_eq!(by_id[0].name, "TEMP.Veles");

        assert!(selected_groups(&config, Some("G9999")).is_err());
    }

    fn collection(hashes: &[&str]) -> GroupCollection {
        GroupCollection {
            profile: GroupProfile {
                name: "TEMP.Veles".to_string(),
                identifier: "G0086".to_string(),
                tags: vec!["TRITON".to_string()],
            },
            hashes: hashes.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            tags_queried: 1,
            tags_empty: 0,
            tags_failed: 0,
        }
    }

    #[test]
    fn test_empty_collection_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();

        let written = persist_collection(dir.path(), &collection(&[]));

        assert!(written.is_none());
        assert!(!dir.path().join("TEMP.Veles_G0086_SHA256.csv").exists());
    }

    #[test]
    fn test_nonempty_collection_is_written() {
        let dir = tempfile::tempdir().unwrap();

        let written = persist_collection(dir.path(), &collection(&["a1", "b2"]));

        let path = written.unwrap();
        assert!(path.exists());
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "SHA256_Hash\na1\nb2\n"
        );
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        assert!(persist_collection(&missing, &collection(&["a1"])).is_none());
    }
}
