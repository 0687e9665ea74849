//! Reset flow: safety backup plus full provider wipe under the lock

use prov_core::{BackupManager, ConfigLayout, ProviderDraft, ProviderStore, Settings};

fn draft(name: &str) -> ProviderDraft {
    ProviderDraft {
        name: name.to_string(),
        base_url: "https://api.example.com".to_string(),
        api_key: "sk-test".to_string(),
        timeout_ms: None,
        model: None,
    }
}

#[test]
fn reset_wipes_providers_after_taking_a_backup() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ConfigLayout::at(dir.path());
    let settings = Settings {
        lock_timeout_ms: 1_000,
        lock_retry_interval_ms: 10,
        ..Settings::default()
    };

    let store = ProviderStore::new(layout.clone());
    store.add(draft("openai")).unwrap();
    store.add(draft("anthropic")).unwrap();
    store.set_active("openai").unwrap();

    let backups = BackupManager::new(layout.clone(), settings);
    let safety_id = store.reset(&backups).unwrap();

    // Live state is gone
    assert!(!layout.providers_dir().exists());
    assert!(!layout.config_file().exists());
    assert!(store.list().unwrap().is_empty());
    assert!(store.active().unwrap().is_none());

    // The safety backup contains what was wiped and is restorable
    let entry = backups
        .list_backups()
        .unwrap()
        .into_iter()
        .find(|b| b.id == safety_id)
        .unwrap();
    assert_eq!(entry.description, "pre-reset");

    backups.restore_backup(&safety_id, false).unwrap();
    assert_eq!(store.list().unwrap().len(), 2);
    assert_eq!(store.active().unwrap().unwrap().name, "openai");

    // Lock is idle again
    assert!(!layout.lock_file().exists());
}
