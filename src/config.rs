use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::diff::DEFAULT_CONTEXT_LINES;

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the main configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/note-reconcile or ~/.config/note-reconcile
    /// - macOS: ~/Library/Application Support/note-reconcile
    /// - Windows: %APPDATA%\note-reconcile
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            // Follow XDG Base Directory Specification
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join("note-reconcile"))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join("note-reconcile"))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home
                .join("Library")
                .join("Application Support")
                .join("note-reconcile"))
        }

        #[cfg(target_os = "windows")]
        {
            Ok(dirs::config_dir()
                .context("Failed to get Windows config directory")?
                .join("note-reconcile"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(".note-reconcile"))
        }
    }

    /// Get the settings file path (config.toml)
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the latest run report path
    pub fn run_report_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("latest-run-report.json"))
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("note-reconcile.log"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
        Ok(config_dir)
    }
}

/// Persisted reconcile settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Root directory scanned for conflicted notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes_dir: Option<PathBuf>,

    /// Substring marking a file as a conflict variant
    #[serde(default = "default_conflict_marker")]
    pub conflict_marker: String,

    /// External diff command name
    #[serde(default = "default_diff_command")]
    pub diff_command: String,

    /// Context lines requested from the diff tool
    #[serde(default = "default_diff_context_lines")]
    pub diff_context_lines: u32,
}

fn default_conflict_marker() -> String {
    "(conflict".to_string()
}

fn default_diff_command() -> String {
    "diff".to_string()
}

fn default_diff_context_lines() -> u32 {
    DEFAULT_CONTEXT_LINES
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            notes_dir: None,
            conflict_marker: default_conflict_marker(),
            diff_command: default_diff_command(),
            diff_context_lines: default_diff_context_lines(),
        }
    }
}

impl Settings {
    /// Load settings from the config file, falling back to defaults
    pub fn load() -> Result<Self> {
        let path = ConfigManager::settings_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let settings: Settings =
            toml::from_str(&content).context("Failed to parse settings file")?;

        Ok(settings)
    }

    /// Save settings to the config file
    pub fn save(&self) -> Result<()> {
        let path = ConfigManager::settings_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;

        Ok(())
    }

    /// Resolve the notes root: an explicit CLI value wins, then the
    /// persisted `notes_dir`, otherwise fail with guidance.
    pub fn resolve_root(&self, cli_root: Option<&Path>) -> Result<PathBuf> {
        if let Some(root) = cli_root {
            return Ok(root.to_path_buf());
        }

        if let Some(root) = &self.notes_dir {
            return Ok(root.clone());
        }

        bail!(
            "No notes directory configured. Pass --root <PATH> or set one with \
             'note-reconcile config --notes-dir <PATH>'"
        );
    }
}

/// Print the current settings
pub fn show_settings() -> Result<()> {
    let settings = Settings::load()?;

    println!("{}", "Current settings:".bold().cyan());
    println!(
        "  Notes directory:    {}",
        settings
            .notes_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!("  Conflict marker:    {}", settings.conflict_marker);
    println!("  Diff command:       {}", settings.diff_command);
    println!("  Diff context lines: {}", settings.diff_context_lines);
    println!(
        "\nSettings file: {}",
        ConfigManager::settings_path()?.display()
    );

    Ok(())
}

/// Update persisted settings from CLI values
pub fn update_settings(notes_dir: Option<PathBuf>, conflict_marker: Option<String>) -> Result<()> {
    let mut settings = Settings::load()?;

    if let Some(dir) = notes_dir {
        settings.notes_dir = Some(dir);
    }

    if let Some(marker) = conflict_marker {
        if marker.is_empty() {
            bail!("Conflict marker cannot be empty");
        }
        settings.conflict_marker = marker;
    }

    settings.save()?;
    println!("{}", "✓ Settings updated".green());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_paths() {
        let config_dir = ConfigManager::config_dir().unwrap();
        assert!(config_dir.to_string_lossy().contains("note-reconcile"));

        let settings = ConfigManager::settings_path().unwrap();
        assert!(settings.to_string_lossy().contains("config.toml"));

        let report = ConfigManager::run_report_path().unwrap();
        assert!(report.to_string_lossy().contains("latest-run-report.json"));

        let log = ConfigManager::log_file_path().unwrap();
        assert!(log.to_string_lossy().contains("note-reconcile.log"));
    }

    #[test]
    #[serial]
    #[cfg(target_os = "linux")]
    fn test_xdg_config_home_respected() {
        std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-xdg-config");
        let config_dir = ConfigManager::config_dir().unwrap();
        assert!(config_dir
            .to_string_lossy()
            .contains("/tmp/test-xdg-config/note-reconcile"));
        std::env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.conflict_marker, "(conflict");
        assert_eq!(settings.diff_command, "diff");
        assert_eq!(settings.diff_context_lines, DEFAULT_CONTEXT_LINES);
        assert!(settings.notes_dir.is_none());
    }

    #[test]
    fn test_resolve_root_prefers_cli_value() {
        let settings = Settings {
            notes_dir: Some(PathBuf::from("/configured")),
            ..Settings::default()
        };

        let root = settings.resolve_root(Some(Path::new("/cli"))).unwrap();
        assert_eq!(root, PathBuf::from("/cli"));
    }

    #[test]
    fn test_resolve_root_falls_back_to_settings() {
        let settings = Settings {
            notes_dir: Some(PathBuf::from("/configured")),
            ..Settings::default()
        };

        let root = settings.resolve_root(None).unwrap();
        assert_eq!(root, PathBuf::from("/configured"));
    }

    #[test]
    fn test_resolve_root_unconfigured_is_an_error() {
        let settings = Settings::default();
        assert!(settings.resolve_root(None).is_err());
    }

    #[test]
    fn test_settings_toml_round_trip() {
        let settings = Settings {
            notes_dir: Some(PathBuf::from("/notes")),
            conflict_marker: "(conflicted copy".to_string(),
            diff_command: "gdiff".to_string(),
            diff_context_lines: 500,
        };

        let toml_text = toml::to_string_pretty(&settings).unwrap();
        let reloaded: Settings = toml::from_str(&toml_text).unwrap();

        assert_eq!(reloaded.notes_dir, settings.notes_dir);
        assert_eq!(reloaded.conflict_marker, settings.conflict_marker);
        assert_eq!(reloaded.diff_command, settings.diff_command);
        assert_eq!(reloaded.diff_context_lines, settings.diff_context_lines);
    }
}
