//! CSV hash-list generation.
//!
//! Renders a group's collected hashes as a single-column CSV and writes it
//! to `<name>_<identifier>_SHA256.csv` in the output directory.

use crate::models::GroupProfile;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Column header of the generated file.
const CSV_HEADER: &str = "SHA256_Hash";

/// Suffix appended to the sanitized group name and identifier.
const FILE_SUFFIX: &str = "_SHA256.csv";

/// Build the output file name for a profile.
///
/// Whitespace in the name and identifier is replaced with underscores so
/// the result is a single shell-friendly token.
pub fn output_file_name(profile: &GroupProfile) -> String {
    format!(
        "{}_{}{}",
        sanitize(&profile.name),
        sanitize(&profile.identifier),
        FILE_SUFFIX
    )
}

fn sanitize(part: &str) -> String {
    part.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Render the CSV content: header row, then one hash per row.
///
/// `BTreeSet` iteration already yields ascending lexicographic order, so
/// the output is deterministic and diff-friendly across runs. Every row is
/// newline-terminated; there are no blank rows.
pub fn render_csv(hashes: &BTreeSet<String>) -> String {
    let mut output = String::with_capacity(CSV_HEADER.len() + 1 + hashes.len() * 65);

    output.push_str(CSV_HEADER);
    output.push('\n');

    for hash in hashes {
        output.push_str(hash);
        output.push('\n');
    }

    output
}

/// Write a group's hash set to its CSV file and return the absolute path.
///
/// An existing file of the same name is overwritten: each run produces a
/// fresh snapshot of the remote data set.
pub fn write_group_csv(
    dir: &Path,
    profile: &GroupProfile,
    hashes: &BTreeSet<String>,
) -> Result<PathBuf> {
    let path = dir.join(output_file_name(profile));
    let content = render_csv(hashes);

    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;

    // Prefer the canonical path in console output; fall back to the joined
    // path if the directory entry cannot be resolved.
    Ok(std::fs::canonicalize(&path).unwrap_or(path))
}
