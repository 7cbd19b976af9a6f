use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Errors raised while extracting a front-matter block from a note
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    #[error("no front-matter block at the start of the document")]
    Missing,
    #[error("front-matter block is not terminated by a closing '---' line")]
    Unterminated,
}

/// An ordered key/value metadata block parsed from the top of a note.
///
/// Keys keep their insertion order so that serializing a parsed block
/// reproduces the original layout. Values are opaque strings; nothing is
/// interpreted, not even timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    entries: Vec<(String, String)>,
}

impl FrontMatter {
    /// Parse the front-matter block at the start of `text`.
    ///
    /// The document must open with a line consisting of exactly `---`,
    /// followed by one or more `key: value` lines and a closing `---` line.
    /// Interior lines without a `": "` separator are skipped with a warning.
    pub fn parse(text: &str) -> Result<Self, FrontMatterError> {
        let mut lines = text.lines();

        match lines.next() {
            Some(first) if is_delimiter(first) => {}
            _ => return Err(FrontMatterError::Missing),
        }

        let mut entries = Vec::new();
        for line in lines {
            if is_delimiter(line) {
                return Ok(FrontMatter { entries });
            }

            match line.split_once(": ") {
                Some((key, value)) => {
                    entries.push((key.to_string(), value.to_string()));
                }
                None => {
                    log::warn!("Skipping front-matter line without 'key: value' form: {line:?}");
                }
            }
        }

        Err(FrontMatterError::Unterminated)
    }

    /// Read a note from disk and parse its front-matter block
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read note: {}", path.display()))?;

        Self::parse(&text)
            .with_context(|| format!("Failed to parse front-matter in {}", path.display()))
    }

    /// Look up the value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set `key` to `value`, replacing an existing entry in place or
    /// appending a new one at the end
    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    /// Serialize back into a delimited block, trailing newline included
    pub fn to_block(&self) -> String {
        let mut block = String::from("---\n");
        for (key, value) in &self.entries {
            block.push_str(key);
            block.push_str(": ");
            block.push_str(value);
            block.push('\n');
        }
        block.push_str("---\n");
        block
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A front-matter delimiter line, CRLF tolerated
pub(crate) fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches('\r') == "---"
}
