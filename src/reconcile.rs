use anyhow::{bail, ensure, Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Settings;
use crate::merge::merge_pair;
use crate::report::RunReport;
use crate::scanner;

/// Options driving one reconcile run
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub conflict_marker: String,
    pub diff_command: String,
    pub diff_context_lines: u32,
    pub dry_run: bool,
}

impl ReconcileOptions {
    pub fn from_settings(settings: &Settings, dry_run: bool) -> Self {
        ReconcileOptions {
            conflict_marker: settings.conflict_marker.clone(),
            diff_command: settings.diff_command.clone(),
            diff_context_lines: settings.diff_context_lines,
            dry_run,
        }
    }
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default(), false)
    }
}

/// Fold one conflict group into its canonical note.
///
/// Variants are processed in descending lexical order so naming schemes that
/// embed timestamps merge newest-first. Step 0 diffs the canonical file
/// against the first variant; every later step diffs the previous step's
/// merged output against the next variant. Intermediates are
/// `<canonical>.diff<i>` and `<canonical>.merged<i>`.
///
/// Renames are committed only after the whole fold has succeeded: each
/// variant to `<variant>.bak`, the original to `<canonical>.bak`, and the
/// final merged output onto the canonical path. A failure anywhere leaves
/// the canonical note and every variant exactly where they were.
pub fn resolve_group(
    canonical: &Path,
    variants: &[PathBuf],
    options: &ReconcileOptions,
) -> Result<()> {
    ensure!(!variants.is_empty(), "conflict group has no variants");

    if !canonical.exists() {
        bail!("canonical note does not exist: {}", canonical.display());
    }

    let mut sorted = variants.to_vec();
    sorted.sort();
    sorted.reverse();

    let mut source = canonical.to_path_buf();
    let mut final_merged = None;

    for (i, variant) in sorted.iter().enumerate() {
        let diff_path = step_path(canonical, "diff", i);
        let merged_path = step_path(canonical, "merged", i);

        merge_pair(
            &source,
            variant,
            &diff_path,
            &merged_path,
            &options.diff_command,
            options.diff_context_lines,
        )?;

        source = merged_path.clone();
        final_merged = Some(merged_path);
    }

    // Commit step: the inputs stay untouched until every pair merge in the
    // fold has succeeded.
    for variant in &sorted {
        rename_to_backup(variant)?;
    }
    rename_to_backup(canonical)?;

    let final_merged = final_merged.expect("non-empty group produced a merge");
    fs::rename(&final_merged, canonical).with_context(|| {
        format!(
            "Failed to promote {} to {}",
            final_merged.display(),
            canonical.display()
        )
    })?;

    Ok(())
}

/// Reconcile every conflict group under `root`, sequentially.
///
/// A group that fails is logged, recorded in the report, and left untouched;
/// the remaining groups are still processed. Renames already committed for
/// earlier groups are never rolled back.
pub fn run(root: &Path, options: &ReconcileOptions) -> Result<RunReport> {
    let groups = scanner::find_conflict_groups(root, &options.conflict_marker)?;
    let mut report = RunReport::new(root);

    if groups.is_empty() {
        println!("{}", "No conflicted notes found.".green());
        return Ok(report);
    }

    for (stem, variants) in &groups {
        let canonical = canonical_note_path(stem);

        if options.dry_run {
            println!(
                "Would merge {} variant(s) into {}",
                variants.len(),
                canonical.display()
            );
            continue;
        }

        match resolve_group(&canonical, variants, options) {
            Ok(()) => {
                println!("{} {}", "✓".green(), canonical.display());
                report.record_merged(&canonical, variants.len());
            }
            Err(e) => {
                log::error!("Failed to reconcile {}: {e:#}", canonical.display());
                println!("{} {}", "✗".red(), canonical.display());
                report.record_failed(&canonical, variants.len(), &format!("{e:#}"));
            }
        }
    }

    Ok(report)
}

/// Delete reconcile artifacts (`*.bak`, `*.diff<N>`, `*.merged<N>`) under
/// `root`, returning how many files were (or would be) removed.
pub fn clean_artifacts(root: &Path, dry_run: bool) -> Result<usize> {
    let mut removed = 0;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry =
            entry.with_context(|| format!("Failed to scan directory: {}", root.display()))?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !is_artifact(path) {
            continue;
        }

        if dry_run {
            println!("Would remove {}", path.display());
        } else {
            fs::remove_file(path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            log::debug!("Removed {}", path.display());
        }
        removed += 1;
    }

    Ok(removed)
}

/// Canonical note path for a group stem: the stem with `.md` restored
fn canonical_note_path(stem: &Path) -> PathBuf {
    let mut name = stem.as_os_str().to_os_string();
    name.push(".md");
    PathBuf::from(name)
}

/// Per-step intermediate path: `<canonical>.<kind><index>`
fn step_path(canonical: &Path, kind: &str, index: usize) -> PathBuf {
    let mut name = canonical.as_os_str().to_os_string();
    name.push(format!(".{kind}{index}"));
    PathBuf::from(name)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

fn rename_to_backup(path: &Path) -> Result<PathBuf> {
    let backup = backup_path(path);
    fs::rename(path, &backup)
        .with_context(|| format!("Failed to back up {}", path.display()))?;
    Ok(backup)
}

fn is_artifact(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    name.ends_with(".bak")
        || has_numbered_suffix(name, ".diff")
        || has_numbered_suffix(name, ".merged")
}

fn has_numbered_suffix(name: &str, kind: &str) -> bool {
    match name.rfind(kind) {
        Some(pos) => {
            let digits = &name[pos + kind.len()..];
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

// CLI-facing entry points

/// `merge` subcommand: reconcile conflicted notes under the resolved root
pub fn run_merge(cli_root: Option<&Path>, dry_run: bool) -> Result<()> {
    let settings = Settings::load()?;
    let root = settings.resolve_root(cli_root)?;
    let options = ReconcileOptions::from_settings(&settings, dry_run);

    let report = run(&root, &options)?;

    if !dry_run {
        report.print_summary();
        report.save_latest()?;
    }

    Ok(())
}

/// `scan` subcommand: list conflict groups without merging anything
pub fn run_scan(cli_root: Option<&Path>) -> Result<()> {
    let settings = Settings::load()?;
    let root = settings.resolve_root(cli_root)?;

    let groups = scanner::find_conflict_groups(&root, &settings.conflict_marker)?;

    if groups.is_empty() {
        println!("{}", "No conflicted notes found.".green());
        return Ok(());
    }

    println!(
        "{}",
        format!("{} conflicted note(s):", groups.len()).bold()
    );
    for (stem, variants) in &groups {
        println!("  {}", canonical_note_path(stem).display());
        for variant in variants {
            println!("    {}", variant.display().to_string().yellow());
        }
    }

    Ok(())
}

/// `clean` subcommand: sweep reconcile artifacts under the resolved root
pub fn run_clean(cli_root: Option<&Path>, dry_run: bool) -> Result<()> {
    let settings = Settings::load()?;
    let root = settings.resolve_root(cli_root)?;

    let removed = clean_artifacts(&root, dry_run)?;

    if dry_run {
        println!("{} file(s) would be removed", removed);
    } else {
        println!("{} Removed {} file(s)", "✓".green(), removed);
    }

    Ok(())
}
