//! Tool settings and on-disk layout
//!
//! `Settings` covers the tunables (retention, lock timings) loaded from
//! `settings.toml`; `ConfigLayout` resolves every path the tool touches from
//! a single configuration root so tests can redirect the whole tree.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Default configuration root directory name under the home directory
const CONFIG_DIR_NAME: &str = ".provider-manager";

/// Tool settings persisted in `settings.toml`.
///
/// A missing settings file yields defaults; unknown fields are ignored so
/// newer settings files keep working with older binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of backups retained by automatic cleanup
    pub backup_keep_count: usize,
    /// Total time budget for acquiring the backup lock, in milliseconds
    pub lock_timeout_ms: u64,
    /// Polling interval between lock acquisition attempts, in milliseconds
    pub lock_retry_interval_ms: u64,
    /// Age after which a lock left by a crashed process is reclaimed
    pub lock_stale_after_secs: u64,
    /// Run retention cleanup automatically before each new backup
    pub auto_clean: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backup_keep_count: 10,
            lock_timeout_ms: 10_000,
            lock_retry_interval_ms: 250,
            lock_stale_after_secs: 600,
            auto_clean: true,
        }
    }
}

impl Settings {
    /// Load settings from `settings.toml` under the given layout.
    ///
    /// A missing file is not an error: defaults apply.
    pub fn load(layout: &ConfigLayout) -> Result<Self> {
        let path = layout.settings_file();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::Fs(prov_fs::Error::io(&path, e)))?;
        Ok(toml::from_str(&content)?)
    }

    /// Save settings to `settings.toml` atomically.
    pub fn save(&self, layout: &ConfigLayout) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        prov_fs::write_atomic(&layout.settings_file(), content.as_bytes())?;
        Ok(())
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn lock_retry_interval(&self) -> Duration {
        Duration::from_millis(self.lock_retry_interval_ms)
    }

    pub fn lock_stale_after(&self) -> Duration {
        Duration::from_secs(self.lock_stale_after_secs)
    }
}

/// Resolves every path under the tool's private configuration root.
#[derive(Debug, Clone)]
pub struct ConfigLayout {
    root: PathBuf,
}

impl ConfigLayout {
    /// Resolve the default layout under the user's home directory.
    pub fn resolve() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "home directory could not be determined",
            ))
        })?;
        Ok(Self {
            root: home.join(CONFIG_DIR_NAME),
        })
    }

    /// Use an explicit root; tests and the `--config-root` flag go through
    /// this.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `settings.toml` — tool settings
    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.toml")
    }

    /// `config.json` — active-provider record; watched by backups
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// `providers/` — one profile file per provider; watched by backups
    pub fn providers_dir(&self) -> PathBuf {
        self.root.join("providers")
    }

    /// `claude/` — agent configuration directory; watched by backups
    pub fn agent_dir(&self) -> PathBuf {
        self.root.join("claude")
    }

    /// `backups/` — snapshot root
    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    /// `.backup-lock` — lock sentinel; absent when idle
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(".backup-lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn settings_default_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ConfigLayout::at(dir.path());

        let settings = Settings::load(&layout).unwrap();
        assert_eq!(settings.backup_keep_count, 10);
        assert!(settings.auto_clean);
    }

    #[test]
    fn settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ConfigLayout::at(dir.path());

        let mut settings = Settings::default();
        settings.backup_keep_count = 3;
        settings.lock_timeout_ms = 500;
        settings.save(&layout).unwrap();

        let loaded = Settings::load(&layout).unwrap();
        assert_eq!(loaded.backup_keep_count, 3);
        assert_eq!(loaded.lock_timeout_ms, 500);
    }

    #[test]
    fn settings_ignore_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ConfigLayout::at(dir.path());
        std::fs::write(
            layout.settings_file(),
            "backup_keep_count = 5\nfuture_option = \"yes\"\n",
        )
        .unwrap();

        let settings = Settings::load(&layout).unwrap();
        assert_eq!(settings.backup_keep_count, 5);
    }

    #[test]
    fn layout_paths_hang_off_root() {
        let layout = ConfigLayout::at("/tmp/pm-test");
        assert_eq!(layout.lock_file(), PathBuf::from("/tmp/pm-test/.backup-lock"));
        assert_eq!(layout.backups_dir(), PathBuf::from("/tmp/pm-test/backups"));
        assert_eq!(layout.providers_dir(), PathBuf::from("/tmp/pm-test/providers"));
    }
}
