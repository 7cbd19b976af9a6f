use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use note_reconcile::{config, logger, reconcile, report};

#[derive(Parser)]
#[command(name = "note-reconcile")]
#[command(about = "Reconcile sync-conflicted Markdown notes back into a single merged file", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge every conflicted note under the notes directory
    Merge {
        /// Notes directory to scan (overrides the configured notes_dir)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// List what would be merged without touching any file
        #[arg(long)]
        dry_run: bool,
    },

    /// List conflicted notes without merging
    Scan {
        /// Notes directory to scan (overrides the configured notes_dir)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Remove reconcile artifacts (.bak, .diff<N>, .merged<N> files)
    Clean {
        /// Notes directory to sweep (overrides the configured notes_dir)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// List what would be removed without deleting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show or update settings
    Config {
        /// Set the notes directory to scan
        #[arg(long)]
        notes_dir: Option<PathBuf>,

        /// Set the substring that marks conflict variants
        #[arg(long)]
        conflict_marker: Option<String>,

        /// Show current settings
        #[arg(long)]
        show: bool,
    },

    /// View the latest run report
    Report {
        /// Output format: json or markdown
        #[arg(short, long, default_value = "markdown")]
        format: String,

        /// Output file (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logger::init_logger()?;
    logger::rotate_log_if_needed()?;

    match cli.command {
        Commands::Merge { root, dry_run } => {
            reconcile::run_merge(root.as_deref(), dry_run)?;
        }
        Commands::Scan { root } => {
            reconcile::run_scan(root.as_deref())?;
        }
        Commands::Clean { root, dry_run } => {
            reconcile::run_clean(root.as_deref(), dry_run)?;
        }
        Commands::Config {
            notes_dir,
            conflict_marker,
            show,
        } => {
            if show || (notes_dir.is_none() && conflict_marker.is_none()) {
                config::show_settings()?;
            } else {
                config::update_settings(notes_dir, conflict_marker)?;
            }
        }
        Commands::Report { format, output } => {
            report::generate_report(&format, output.as_deref())?;
        }
    }

    Ok(())
}
