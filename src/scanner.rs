use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Conflict groups keyed by canonical stem (the note path with the conflict
/// suffix and extension removed), each holding the variant paths found for
/// that note.
pub type ConflictGroups = BTreeMap<PathBuf, Vec<PathBuf>>;

/// Recursively scan `root` for conflict-variant Markdown files and group
/// them by canonical note.
///
/// A variant is any `.md` file whose path contains `marker` (e.g.
/// `(conflict`). The canonical stem is everything before the marker with
/// trailing spaces trimmed; the base note itself carries no marker and is
/// never listed. An unreadable directory aborts the scan.
pub fn find_conflict_groups(root: &Path, marker: &str) -> Result<ConflictGroups> {
    let mut groups = ConflictGroups::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry =
            entry.with_context(|| format!("Failed to scan directory: {}", root.display()))?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("md") {
            continue;
        }

        let text = path.to_string_lossy();
        if let Some(pos) = text.find(marker) {
            let stem = text[..pos].trim_end().to_string();
            groups
                .entry(PathBuf::from(stem))
                .or_default()
                .push(path.to_path_buf());
        }
    }

    log::debug!(
        "Found {} conflict group(s) under {}",
        groups.len(),
        root.display()
    );

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MARKER: &str = "(conflict";

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "---\ncreated: 2020-01-01\n---\nbody\n").unwrap();
    }

    #[test]
    fn test_groups_variants_by_canonical_stem() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Note.md");
        touch(dir.path(), "Note (conflict 1).md");
        touch(dir.path(), "Note (conflict 2).md");
        touch(dir.path(), "Other.md");

        let groups = find_conflict_groups(dir.path(), MARKER).unwrap();

        assert_eq!(groups.len(), 1);
        let variants = &groups[&dir.path().join("Note")];
        assert_eq!(variants.len(), 2);
    }

    #[test]
    fn test_base_notes_are_not_listed() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Clean.md");

        let groups = find_conflict_groups(dir.path(), MARKER).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn test_non_markdown_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Note (conflict 1).md");
        fs::write(dir.path().join("Note (conflict 1).txt"), "x").unwrap();

        let groups = find_conflict_groups(dir.path(), MARKER).unwrap();
        assert_eq!(groups[&dir.path().join("Note")].len(), 1);
    }

    #[test]
    fn test_scans_nested_directories() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("journal").join("2022");
        fs::create_dir_all(&sub).unwrap();
        touch(&sub, "Daily.md");
        touch(&sub, "Daily (conflict 2022-06-01).md");

        let groups = find_conflict_groups(dir.path(), MARKER).unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key(&sub.join("Daily")));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        assert!(find_conflict_groups(&missing, MARKER).is_err());
    }
}
