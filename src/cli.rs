//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// HashHarvest - MalwareBazaar hash collector for threat-actor groups
///
/// Queries MalwareBazaar for every search tag of the configured group
/// profiles and writes each group's unique SHA256 hashes to a CSV file.
///
/// Examples:
///   hashharvest
///   hashharvest --config groups.toml --output-dir reports
///   hashharvest --group G0086 --limit 500
///   hashharvest --dry-run
///   hashharvest --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .hashharvest.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// MalwareBazaar auth key
    ///
    /// Required for live queries. Prefer the environment variable over the
    /// flag so the key stays out of shell history.
    #[arg(short = 'k', long, value_name = "KEY", env = "MALWAREBAZAAR_API_KEY")]
    pub api_key: Option<String>,

    /// API endpoint URL
    ///
    /// Overrides the configured endpoint. Mainly useful for pointing the
    /// client at a test server.
    #[arg(long, value_name = "URL", env = "HASHHARVEST_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Directory to write the per-group CSV files to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum samples requested per tag query (1-1000)
    #[arg(long, value_name = "COUNT")]
    pub limit: Option<usize>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Only collect the group whose name or identifier matches
    ///
    /// Example: --group G0086 or --group TEMP.Veles
    #[arg(short, long, value_name = "NAME")]
    pub group: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: list the configured groups and tags without querying
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .hashharvest.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref endpoint) = self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err("Endpoint must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(limit) = self.limit {
            if limit == 0 || limit > 1000 {
                return Err("Limit must be between 1 and 1000".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // The auth key is checked after the config merge, since it may
        // come from the config file rather than the CLI or environment.

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            config: None,
            api_key: Some("test-key".to_string()),
            endpoint: None,
            output_dir: None,
            limit: None,
            timeout: None,
            group: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_accepts_missing_api_key() {
        // The key may still come from the config file; checked later.
        let mut args = make_args();
        args.api_key = None;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_endpoint() {
        let mut args = make_args();
        args.endpoint = Some("ftp://mb-api.abuse.ch".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_limit_bounds() {
        let mut args = make_args();
        args.limit = Some(0);
        assert!(args.validate().is_err());

        args.limit = Some(1001);
        assert!(args.validate().is_err());

        args.limit = Some(1000);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
