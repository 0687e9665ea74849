//! Shared command context: resolved layout and settings

use std::path::PathBuf;

use prov_core::{BackupManager, ConfigLayout, ProviderStore, Settings};

use crate::error::Result;

/// Resolved configuration root plus loaded settings, built once per
/// invocation and handed to every command.
pub struct Context {
    pub layout: ConfigLayout,
    pub settings: Settings,
}

impl Context {
    pub fn resolve(config_root: Option<PathBuf>) -> Result<Self> {
        let layout = match config_root {
            Some(root) => ConfigLayout::at(root),
            None => ConfigLayout::resolve()?,
        };
        let settings = Settings::load(&layout)?;
        Ok(Self { layout, settings })
    }

    pub fn backups(&self) -> BackupManager {
        BackupManager::new(self.layout.clone(), self.settings.clone())
    }

    pub fn providers(&self) -> ProviderStore {
        ProviderStore::new(self.layout.clone())
    }
}
