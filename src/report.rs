use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::ConfigManager;

/// Summary of one reconcile run over a notes tree
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    /// ISO 8601 timestamp of when the run finished
    pub timestamp: String,

    /// Root directory that was scanned
    pub root: String,

    /// Groups merged back into their canonical note
    pub groups_merged: usize,

    /// Groups that failed and were left untouched
    pub groups_failed: usize,

    /// Conflict variants consumed across all merged groups
    pub variants_consumed: usize,

    /// Backup files created (originals plus variants)
    pub backups_created: usize,

    /// Per-group outcomes in processing order
    pub groups: Vec<GroupRecord>,
}

/// Outcome of one conflict group
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Canonical note path
    pub canonical: String,

    /// Number of conflict variants in the group
    pub variant_count: usize,

    /// "merged", or the error text for a failed group
    pub outcome: String,
}

impl RunReport {
    pub fn new(root: &Path) -> Self {
        RunReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            root: root.display().to_string(),
            groups_merged: 0,
            groups_failed: 0,
            variants_consumed: 0,
            backups_created: 0,
            groups: Vec::new(),
        }
    }

    /// Record a successfully merged group
    pub fn record_merged(&mut self, canonical: &Path, variant_count: usize) {
        self.groups_merged += 1;
        self.variants_consumed += variant_count;
        self.backups_created += variant_count + 1;
        self.groups.push(GroupRecord {
            canonical: canonical.display().to_string(),
            variant_count,
            outcome: "merged".to_string(),
        });
    }

    /// Record a group that failed and was left untouched
    pub fn record_failed(&mut self, canonical: &Path, variant_count: usize, error: &str) {
        self.groups_failed += 1;
        self.groups.push(GroupRecord {
            canonical: canonical.display().to_string(),
            variant_count,
            outcome: format!("failed: {error}"),
        });
    }

    /// Generate a JSON report
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report to JSON")
    }

    /// Generate a markdown report
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Note Reconcile Run Report\n\n");
        output.push_str(&format!("**Generated:** {}\n", self.timestamp));
        output.push_str(&format!("**Root:** `{}`\n", self.root));
        output.push_str(&format!("**Groups merged:** {}\n", self.groups_merged));
        output.push_str(&format!("**Groups failed:** {}\n", self.groups_failed));
        output.push_str(&format!(
            "**Backups created:** {}\n\n",
            self.backups_created
        ));

        if self.groups.is_empty() {
            output.push_str("No conflicted notes found.\n");
            return output;
        }

        output.push_str("## Groups\n\n");
        for (i, group) in self.groups.iter().enumerate() {
            output.push_str(&format!("### {}. `{}`\n\n", i + 1, group.canonical));
            output.push_str(&format!("- **Variants:** {}\n", group.variant_count));
            output.push_str(&format!("- **Outcome:** {}\n\n", group.outcome));
        }

        output
    }

    /// Print a colored console summary
    pub fn print_summary(&self) {
        println!("\n{}", "=== Reconcile Summary ===".bold().cyan());
        println!("{}: {}", "Root".bold(), self.root);
        println!(
            "{}: {}",
            "Groups merged".bold(),
            self.groups_merged.to_string().green()
        );

        if self.groups_failed > 0 {
            println!(
                "{}: {}",
                "Groups failed".bold(),
                self.groups_failed.to_string().red()
            );
        }

        println!(
            "{}: {}",
            "Backups created".bold(),
            self.backups_created.to_string().yellow()
        );

        for group in &self.groups {
            if group.outcome == "merged" {
                println!(
                    "  {} {} ({} variant{})",
                    "✓".green(),
                    group.canonical,
                    group.variant_count,
                    if group.variant_count == 1 { "" } else { "s" }
                );
            } else {
                println!("  {} {} — {}", "✗".red(), group.canonical, group.outcome);
            }
        }
    }

    /// Save this report as the latest run report in the config directory
    pub fn save_latest(&self) -> Result<()> {
        ConfigManager::ensure_config_dir()?;
        let path = ConfigManager::run_report_path()?;

        fs::write(&path, self.to_json()?)
            .with_context(|| format!("Failed to write run report: {}", path.display()))?;

        Ok(())
    }

    /// Load the latest saved run report
    pub fn load_latest() -> Result<Self> {
        let path = ConfigManager::run_report_path()?;

        let content = fs::read_to_string(&path).with_context(|| {
            format!(
                "No saved run report at {} (run 'note-reconcile merge' first)",
                path.display()
            )
        })?;

        serde_json::from_str(&content).context("Failed to parse saved run report")
    }
}

/// Render the latest saved run report in the requested format
pub fn generate_report(format: &str, output: Option<&Path>) -> Result<()> {
    let report = RunReport::load_latest()?;

    let rendered = match format {
        "json" => report.to_json()?,
        "markdown" => report.to_markdown(),
        other => anyhow::bail!("Unknown report format: '{other}' (expected json or markdown)"),
    };

    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            println!("{} Report written to {}", "✓".green(), path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_report() -> RunReport {
        let mut report = RunReport::new(Path::new("/notes"));
        report.record_merged(&PathBuf::from("/notes/Note.md"), 2);
        report.record_failed(&PathBuf::from("/notes/Bad.md"), 1, "diff exited with 2");
        report
    }

    #[test]
    fn test_counters_accumulate() {
        let report = sample_report();
        assert_eq!(report.groups_merged, 1);
        assert_eq!(report.groups_failed, 1);
        assert_eq!(report.variants_consumed, 2);
        assert_eq!(report.backups_created, 3);
        assert_eq!(report.groups.len(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample_report();
        let json = report.to_json().unwrap();
        let reloaded: RunReport = serde_json::from_str(&json).unwrap();

        assert_eq!(reloaded.groups_merged, report.groups_merged);
        assert_eq!(reloaded.groups.len(), report.groups.len());
        assert_eq!(reloaded.groups[1].outcome, "failed: diff exited with 2");
    }

    #[test]
    fn test_markdown_lists_groups() {
        let markdown = sample_report().to_markdown();
        assert!(markdown.contains("# Note Reconcile Run Report"));
        assert!(markdown.contains("/notes/Note.md"));
        assert!(markdown.contains("failed: diff exited with 2"));
    }

    #[test]
    fn test_markdown_empty_run() {
        let markdown = RunReport::new(Path::new("/notes")).to_markdown();
        assert!(markdown.contains("No conflicted notes found."));
    }
}
