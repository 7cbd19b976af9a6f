use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::diff::{clean_diff, produce_diff};
use crate::frontmatter::FrontMatter;

/// Merge two front-matter mappings under fixed precedence.
///
/// The conflict side wins for every key, in its own key order, with two
/// exceptions: `created` is always taken from the base side (the original
/// note predates any conflict copy), and a synthetic `updated_backup` records
/// the conflict side's `updated` value so nothing is lost by the overwrite.
/// Values are opaque strings; timestamps are never parsed or compared.
pub fn merge_headers(base: &FrontMatter, conflict: &FrontMatter) -> FrontMatter {
    let mut merged = conflict.clone();

    if let Some(created) = base.get("created") {
        merged.set("created", created);
    }

    if let Some(updated) = conflict.get("updated") {
        merged.set("updated_backup", updated);
    }

    merged
}

/// Merge one (source, conflict) file pair into `target`.
///
/// Runs the external diff into `diff_path`, parses both sides' front-matter,
/// merges the headers, cleans the diff output into a body, and writes the
/// reheadered result to `target`. The inputs are left untouched; archival
/// renames are committed by the group resolver once the whole fold has
/// succeeded.
pub fn merge_pair(
    source: &Path,
    conflict: &Path,
    diff_path: &Path,
    target: &Path,
    diff_command: &str,
    context_lines: u32,
) -> Result<()> {
    log::info!(
        "Merging {} and {} into {}",
        source.display(),
        conflict.display(),
        target.display()
    );

    produce_diff(diff_command, source, conflict, diff_path, context_lines)?;

    let base_header = FrontMatter::from_file(source)?;
    let conflict_header = FrontMatter::from_file(conflict)?;
    let merged_header = merge_headers(&base_header, &conflict_header);

    let raw_diff = fs::read_to_string(diff_path)
        .with_context(|| format!("Failed to read diff output: {}", diff_path.display()))?;
    let body = clean_diff(&raw_diff);

    let mut document = merged_header.to_block();
    document.push_str(&body);
    if !document.ends_with('\n') {
        document.push('\n');
    }

    fs::write(target, document)
        .with_context(|| format!("Failed to write merged note: {}", target.display()))?;

    Ok(())
}
