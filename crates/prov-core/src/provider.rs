//! Provider profile storage
//!
//! Profiles live as one JSON file per provider under `providers/`; the
//! active selection lives in `config.json`. All writes are atomic and
//! owner-only. Destructive bulk operations (reset) go through the backup
//! lock and take a safety snapshot first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::backup::BackupManager;
use crate::config::ConfigLayout;
use crate::{Error, Result};

/// Schema version for provider and active-config records
const CONFIG_VERSION: u32 = 1;

/// One named provider profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    /// Unique name; doubles as the file stem under `providers/`
    pub name: String,
    /// API endpoint, http or https
    pub base_url: String,
    /// API key, stored as the caller supplied it
    pub api_key: String,
    /// Request timeout override in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Default model override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// The `config.json` record: which provider is currently active.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveConfig {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub active_provider: Option<String>,
}

/// Draft of a new or updated provider before validation.
#[derive(Debug, Clone)]
pub struct ProviderDraft {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: Option<u64>,
    pub model: Option<String>,
}

impl ProviderDraft {
    fn validate(&self) -> Result<()> {
        prov_fs::validate_identifier(&self.name)?;
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::InvalidProvider {
                reason: format!("base_url must be http(s), got {:?}", self.base_url),
            });
        }
        if self.api_key.trim().is_empty() {
            return Err(Error::InvalidProvider {
                reason: "api_key must not be empty".to_string(),
            });
        }
        if self.timeout_ms == Some(0) {
            return Err(Error::InvalidProvider {
                reason: "timeout_ms must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// CRUD over provider profiles and the active selection.
pub struct ProviderStore {
    layout: ConfigLayout,
}

impl ProviderStore {
    pub fn new(layout: ConfigLayout) -> Self {
        Self { layout }
    }

    fn profile_path(&self, name: &str) -> PathBuf {
        self.layout.providers_dir().join(format!("{name}.json"))
    }

    /// Add a new provider. Duplicates are rejected.
    pub fn add(&self, draft: ProviderDraft) -> Result<Provider> {
        draft.validate()?;
        if self.profile_path(&draft.name).exists() {
            return Err(Error::ProviderExists { name: draft.name });
        }

        let now = Utc::now();
        let provider = Provider {
            name: draft.name,
            base_url: draft.base_url,
            api_key: draft.api_key,
            timeout_ms: draft.timeout_ms,
            model: draft.model,
            created: now,
            updated: now,
        };
        self.write_profile(&provider)?;
        tracing::info!(name = %provider.name, "provider added");
        Ok(provider)
    }

    /// Replace an existing provider's fields, keeping its creation time.
    pub fn update(&self, draft: ProviderDraft) -> Result<Provider> {
        draft.validate()?;
        let existing = self.get(&draft.name)?;

        let provider = Provider {
            name: draft.name,
            base_url: draft.base_url,
            api_key: draft.api_key,
            timeout_ms: draft.timeout_ms,
            model: draft.model,
            created: existing.created,
            updated: Utc::now(),
        };
        self.write_profile(&provider)?;
        tracing::info!(name = %provider.name, "provider updated");
        Ok(provider)
    }

    /// Load one provider by name.
    pub fn get(&self, name: &str) -> Result<Provider> {
        prov_fs::validate_identifier(name)?;
        let path = self.profile_path(name);
        let content = fs::read_to_string(&path).map_err(|_| Error::ProviderNotFound {
            name: name.to_string(),
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// List all providers, sorted by name. Unparsable profiles are skipped
    /// with a warning rather than failing the listing.
    pub fn list(&self) -> Result<Vec<Provider>> {
        let dir = self.layout.providers_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut providers = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| prov_fs::Error::io(&dir, e))? {
            let entry = entry.map_err(|e| prov_fs::Error::io(&dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .ok()
                .and_then(|c| serde_json::from_str::<Provider>(&c).ok())
            {
                Some(provider) => providers.push(provider),
                None => {
                    tracing::warn!(path = %path.display(), "skipping unparsable provider profile");
                }
            }
        }

        providers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(providers)
    }

    /// Remove a provider; clears the active pointer if it pointed there.
    pub fn remove(&self, name: &str) -> Result<()> {
        prov_fs::validate_identifier(name)?;
        let path = self.profile_path(name);
        if !path.exists() {
            return Err(Error::ProviderNotFound {
                name: name.to_string(),
            });
        }
        fs::remove_file(&path).map_err(|e| prov_fs::Error::io(&path, e))?;

        let mut config = self.active_config()?;
        if config.active_provider.as_deref() == Some(name) {
            config.active_provider = None;
            self.write_active_config(&config)?;
        }
        tracing::info!(name, "provider removed");
        Ok(())
    }

    /// Mark a provider as active.
    pub fn set_active(&self, name: &str) -> Result<()> {
        // Existence check doubles as name validation
        self.get(name)?;
        let mut config = self.active_config()?;
        config.active_provider = Some(name.to_string());
        self.write_active_config(&config)?;
        tracing::info!(name, "active provider set");
        Ok(())
    }

    /// The currently active provider, if any. A dangling pointer (profile
    /// deleted out-of-band) reads as no active provider.
    pub fn active(&self) -> Result<Option<Provider>> {
        let config = self.active_config()?;
        match config.active_provider {
            Some(name) => match self.get(&name) {
                Ok(provider) => Ok(Some(provider)),
                Err(Error::ProviderNotFound { .. }) => Ok(None),
                Err(e) => Err(e),
            },
            None => Ok(None),
        }
    }

    /// Remove all profiles and the active-provider record, taking a safety
    /// backup first. Runs under the backup lock.
    pub fn reset(&self, backups: &BackupManager) -> Result<String> {
        let opts = backups.acquire_options();
        backups.lock().with_lock("reset", &opts, || {
            let safety = backups.create_for_reset()?;
            prov_fs::remove_dir_if_exists(&self.layout.providers_dir())?;
            match fs::remove_file(self.layout.config_file()) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::Fs(prov_fs::Error::io(self.layout.config_file(), e))),
            }
            tracing::info!(backup = %safety.id, "configuration reset");
            Ok(safety.id)
        })
    }

    fn write_profile(&self, provider: &Provider) -> Result<()> {
        let path = self.profile_path(&provider.name);
        prov_fs::write_atomic(&path, serde_json::to_string_pretty(provider)?.as_bytes())?;
        prov_fs::restrict_permissions(&path)?;
        // Profile directory itself is owner-only as well
        prov_fs::restrict_permissions(&self.layout.providers_dir())?;
        Ok(())
    }

    fn active_config(&self) -> Result<ActiveConfig> {
        let path = self.layout.config_file();
        if !path.exists() {
            return Ok(ActiveConfig {
                version: CONFIG_VERSION,
                active_provider: None,
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| prov_fs::Error::io(&path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_active_config(&self, config: &ActiveConfig) -> Result<()> {
        let path = self.layout.config_file();
        prov_fs::write_atomic(&path, serde_json::to_string_pretty(config)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> ProviderDraft {
        ProviderDraft {
            name: name.to_string(),
            base_url: "https://api.example.com".to_string(),
            api_key: "sk-test".to_string(),
            timeout_ms: Some(30_000),
            model: None,
        }
    }

    fn store_at(root: &std::path::Path) -> ProviderStore {
        ProviderStore::new(ConfigLayout::at(root))
    }

    #[test]
    fn add_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());

        store.add(draft("openai")).unwrap();
        let loaded = store.get("openai").unwrap();
        assert_eq!(loaded.base_url, "https://api.example.com");
        assert_eq!(loaded.timeout_ms, Some(30_000));
    }

    #[test]
    fn add_rejects_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());

        store.add(draft("openai")).unwrap();
        let err = store.add(draft("openai")).unwrap_err();
        assert!(matches!(err, Error::ProviderExists { .. }));
    }

    #[test]
    fn add_rejects_bad_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());

        let mut bad = draft("openai");
        bad.base_url = "ftp://example.com".to_string();
        let err = store.add(bad).unwrap_err();
        assert!(matches!(err, Error::InvalidProvider { .. }));
    }

    #[test]
    fn list_is_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());

        store.add(draft("zeta")).unwrap();
        store.add(draft("alpha")).unwrap();

        let names: Vec<_> = store.list().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn remove_clears_active_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());

        store.add(draft("openai")).unwrap();
        store.set_active("openai").unwrap();
        assert!(store.active().unwrap().is_some());

        store.remove("openai").unwrap();
        assert!(store.active().unwrap().is_none());
    }

    #[test]
    fn set_active_requires_existing_provider() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());

        let err = store.set_active("ghost").unwrap_err();
        assert!(matches!(err, Error::ProviderNotFound { .. }));
    }

    #[test]
    fn update_preserves_created_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());

        let original = store.add(draft("openai")).unwrap();
        let mut changed = draft("openai");
        changed.model = Some("gpt-x".to_string());
        let updated = store.update(changed).unwrap();

        assert_eq!(updated.created, original.created);
        assert_eq!(updated.model.as_deref(), Some("gpt-x"));
    }
}
