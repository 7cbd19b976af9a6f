use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::process::Command;

use crate::frontmatter::is_delimiter;

/// Context line count passed to the diff tool. Large enough that every line
/// of both inputs appears in the output with nothing elided.
pub const DEFAULT_CONTEXT_LINES: u32 = 1_000_000;

/// Errors from the external diff tool
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Run the external diff tool over `left` and `right` and write the unified
/// diff to `output`.
///
/// Waits for the child process to exit before touching its output. Exit
/// status 0 (identical inputs) and 1 (differences found) are both success;
/// anything else, or a failed launch, is a [`DiffError`] that fails the
/// enclosing group.
pub fn produce_diff(
    command: &str,
    left: &Path,
    right: &Path,
    output: &Path,
    context_lines: u32,
) -> Result<()> {
    log::debug!(
        "Diffing {} against {} into {}",
        left.display(),
        right.display(),
        output.display()
    );

    let result = Command::new(command)
        .arg(format!("-U{context_lines}"))
        .arg(left)
        .arg(right)
        .output()
        .map_err(|source| DiffError::Launch {
            command: command.to_string(),
            source,
        })?;

    match result.status.code() {
        Some(0) | Some(1) => {}
        _ => {
            return Err(DiffError::Failed {
                command: command.to_string(),
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            }
            .into());
        }
    }

    fs::write(output, &result.stdout)
        .with_context(|| format!("Failed to write diff output: {}", output.display()))?;

    Ok(())
}

/// Turn raw unified-diff text into a note body.
///
/// In order: drop `@` hunk headers and `\` no-newline markers, drop the two
/// `---`/`+++` file-identifier lines, strip the one-character change marker
/// from every remaining line, then remove any embedded front-matter blocks
/// (both inputs' headers survive the diff as interleaved lines; a freshly
/// merged header replaces them).
///
/// Conflicting content lines stay interleaved exactly as the diff emitted
/// them. That is deliberate: both versions are surfaced for the human to
/// resolve, not collapsed automatically.
pub fn clean_diff(raw: &str) -> String {
    let kept: Vec<&str> = raw
        .lines()
        .filter(|line| !line.starts_with('@') && !line.starts_with('\\'))
        .collect();

    let unmarked: Vec<&str> = kept
        .iter()
        .skip(2)
        .map(|line| line.get(1..).unwrap_or(""))
        .collect();

    strip_embedded_front_matter(&unmarked).join("\n")
}

/// Remove every block that looks like front-matter: a `---` line, at least
/// one interior line, and the next `---` line. A lone unmatched `---` is
/// left alone.
fn strip_embedded_front_matter<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if is_delimiter(lines[i]) {
            if let Some(close) = (i + 2..lines.len()).find(|&j| is_delimiter(lines[j])) {
                i = close + 1;
                continue;
            }
        }
        out.push(lines[i]);
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const RAW_DIFF: &str = "\
--- Note.md\t2022-06-01 10:00:00
+++ Note (conflict 1).md\t2022-06-01 10:00:01
@@ -1,7 +1,7 @@
 ---
 created: 2020-01-01
-updated: 2021-01-01
+updated: 2022-06-01
 ---

-Hello
+Hello world
\\ No newline at end of file
";

    #[test]
    fn test_clean_diff_strips_markers_and_headers() {
        let body = clean_diff(RAW_DIFF);

        assert!(!body.contains("@@"));
        assert!(!body.contains("+++"));
        assert!(!body.contains("No newline"));
        assert!(body.contains("Hello"));
        assert!(body.contains("Hello world"));
    }

    #[test]
    fn test_clean_diff_removes_embedded_front_matter() {
        let body = clean_diff(RAW_DIFF);

        assert!(!body.contains("created:"));
        assert!(!body.contains("updated:"));
        assert!(!body.lines().any(|l| l == "---"));
    }

    #[test]
    fn test_clean_diff_output_has_no_hunk_or_marker_lines() {
        let body = clean_diff(RAW_DIFF);
        assert!(!body
            .lines()
            .any(|l| l.starts_with('@') || l.starts_with('\\')));
    }

    #[test]
    fn test_clean_diff_of_identical_inputs_is_empty() {
        // diff prints nothing when the inputs match
        assert_eq!(clean_diff(""), "");
    }

    #[test]
    fn test_lone_delimiter_is_preserved() {
        let raw = "\
--- a.md\t
+++ b.md\t
 body before
 ---
-old line
+new line
";
        let body = clean_diff(raw);
        assert!(body.contains("body before"));
        assert!(body.contains("---"));
        assert!(body.contains("old line"));
        assert!(body.contains("new line"));
    }

    #[test]
    fn test_produce_diff_writes_unified_output() {
        let dir = TempDir::new().unwrap();
        let left = dir.path().join("left.md");
        let right = dir.path().join("right.md");
        let out = dir.path().join("out.diff");

        fs::write(&left, "one\ntwo\n").unwrap();
        fs::write(&right, "one\nthree\n").unwrap();

        produce_diff("diff", &left, &right, &out, DEFAULT_CONTEXT_LINES).unwrap();

        let diff = fs::read_to_string(&out).unwrap();
        assert!(diff.contains("-two"));
        assert!(diff.contains("+three"));
        assert!(diff.contains(" one"));
    }

    #[test]
    fn test_produce_diff_identical_inputs_writes_empty_file() {
        let dir = TempDir::new().unwrap();
        let left = dir.path().join("left.md");
        let right = dir.path().join("right.md");
        let out = dir.path().join("out.diff");

        fs::write(&left, "same\n").unwrap();
        fs::write(&right, "same\n").unwrap();

        produce_diff("diff", &left, &right, &out, DEFAULT_CONTEXT_LINES).unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "");
    }

    #[test]
    fn test_produce_diff_missing_tool_is_launch_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.md");
        fs::write(&file, "x\n").unwrap();

        let err = produce_diff(
            "definitely-not-a-diff-tool",
            &file,
            &file,
            &dir.path().join("out.diff"),
            DEFAULT_CONTEXT_LINES,
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DiffError>(),
            Some(DiffError::Launch { .. })
        ));
    }

    #[test]
    fn test_produce_diff_missing_input_is_tool_failure() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.md");
        fs::write(&file, "x\n").unwrap();

        let err = produce_diff(
            "diff",
            &file,
            &dir.path().join("does-not-exist.md"),
            &dir.path().join("out.diff"),
            DEFAULT_CONTEXT_LINES,
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DiffError>(),
            Some(DiffError::Failed { .. })
        ));
    }
}
