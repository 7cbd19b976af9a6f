//! # note-reconcile
//!
//! A command-line tool that reconciles duplicate "conflicted" copies of
//! Markdown notes produced by file-sync systems.
//!
//! ## Overview
//!
//! When several devices edit the same note offline, sync clients keep every
//! divergent copy by writing files like `Note (conflict 1).md` next to
//! `Note.md`. `note-reconcile` scans a notes tree, groups each note with its
//! conflict variants, and folds every group back into a single file: the
//! variants are diffed against the original with the external `diff` tool,
//! the diff output is cleaned into a combined body with both versions' lines
//! interleaved for manual resolution, and the YAML-like front-matter headers
//! are merged under fixed precedence rules. Consumed files are archived as
//! `.bak` backups rather than deleted.
//!
//! ## Key behaviors
//!
//! - **Assisted merge**: content conflicts are surfaced side by side, never
//!   resolved automatically
//! - **Header precedence**: the conflict copy wins every key except
//!   `created` (kept from the original); the conflict's `updated` value is
//!   preserved as `updated_backup`
//! - **Safe by staging**: a group's files are renamed only after its whole
//!   merge chain has succeeded
//! - **Batch resilience**: a failed group is reported and skipped; the rest
//!   of the tree is still processed

/// Platform-aware configuration directory management and persisted settings.
///
/// Resolves the config directory per platform conventions (XDG on Linux,
/// Application Support on macOS, AppData on Windows) and stores the notes
/// root, conflict marker, and diff tool options in a TOML settings file.
pub mod config;

/// External diff invocation and diff-output cleaning.
///
/// Runs the line-oriented diff tool with an effectively unbounded context
/// window so both inputs appear in full, and strips the unified-diff
/// artifacts (hunk headers, file identifiers, change markers, embedded
/// front-matter) down to a usable note body.
pub mod diff;

/// Front-matter parsing and serialization.
///
/// Extracts the `---` delimited metadata block at the top of a note into an
/// insertion-ordered key/value mapping and serializes it back byte-for-byte
/// compatible with the input layout.
pub mod frontmatter;

/// Logging configuration and utilities.
///
/// Sets up dual logging to both console (configurable via `RUST_LOG`) and a
/// persistent log file in the config directory, with size-based rotation.
pub mod logger;

/// Header merging and single-pair file merging.
///
/// Combines two front-matter mappings under fixed precedence rules and
/// orchestrates one (source, conflict) merge: diff, parse, header merge,
/// clean, write.
pub mod merge;

/// Group folding, the batch orchestrator, and artifact cleanup.
///
/// Folds a chain of conflict variants into one final note via repeated
/// pairwise merges, drives the end-to-end run over every discovered group,
/// and sweeps `.bak`/`.diff<N>`/`.merged<N>` artifacts on request.
pub mod reconcile;

/// Run report generation and formatting.
///
/// Records per-group outcomes and counters for each run, renders them as
/// JSON, Markdown, or a colored console summary, and persists the latest
/// report in the config directory.
pub mod report;

/// Conflict-variant discovery.
///
/// Recursively scans a notes tree for Markdown files carrying the conflict
/// marker and groups them by canonical note name.
pub mod scanner;
