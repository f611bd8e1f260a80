use anyhow::Result;
use chrono::NaiveDate;
use markt_stockstadt::adapters::{FixedClock, JsonFileStore, MemoryStore};
use markt_stockstadt::core::activation::{resolve_action, ActivationStore, VendorDirectory};
use markt_stockstadt::core::{ActivationRecord, ActivationStorage, ScanMode, VendorId, WeekKey};
use markt_stockstadt::domain::model::ScanRequest;
use markt_stockstadt::{MarketService, MarktError, PageRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tempfile::TempDir;

struct BrokenStorage;

#[async_trait]
impl ActivationStorage for BrokenStorage {
    async fn load(&self) -> markt_stockstadt::Result<ActivationRecord> {
        Err(MarktError::MalformedPersistedState {
            location: "broken".to_string(),
            message: "unreadable".to_string(),
        })
    }

    async fn save(&self, _record: &ActivationRecord) -> markt_stockstadt::Result<()> {
        Err(MarktError::PersistenceWriteFailure {
            location: "broken".to_string(),
            message: "disk full".to_string(),
        })
    }

    fn describe(&self) -> String {
        "broken".to_string()
    }
}

/// Reads an empty record fine, refuses every write.
struct ReadOnlyStorage;

#[async_trait]
impl ActivationStorage for ReadOnlyStorage {
    async fn load(&self) -> markt_stockstadt::Result<ActivationRecord> {
        Ok(ActivationRecord::new())
    }

    async fn save(&self, _record: &ActivationRecord) -> markt_stockstadt::Result<()> {
        Err(MarktError::PersistenceWriteFailure {
            location: "read-only".to_string(),
            message: "permission denied".to_string(),
        })
    }

    fn describe(&self) -> String {
        "read-only".to_string()
    }
}

fn week(year: i32, week: u32) -> WeekKey {
    WeekKey::new(year, week).unwrap()
}

#[tokio::test]
async fn test_scan_is_stored_for_current_week_only() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = JsonFileStore::new(temp_dir.path().join("activations.json"));
    let store = ActivationStore::new(&storage);
    let directory: VendorDirectory = [("UID_A", "vendorA")].into_iter().collect();

    let record = store.load().await;
    assert!(record.is_empty());

    let scan = ScanRequest {
        uid: "UID_A".to_string(),
        action: Some("on".to_string()),
    };
    let (record, outcome) = resolve_action(record, &directory, &scan, week(2025, 10), ScanMode::Explicit);
    assert_eq!(outcome.applied_vendor(), Some(&VendorId::from("vendorA")));
    assert!(store.save(&record).await);

    let reloaded = store.load().await;
    let vendor = VendorId::from("vendorA");
    assert!(reloaded.is_active(week(2025, 10), &vendor));
    assert!(!reloaded.is_active(week(2025, 9), &vendor));
    Ok(())
}

#[tokio::test]
async fn test_malformed_file_loads_empty_and_is_left_alone() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("activations.json");
    let garbage = r#"{"2025-10": {"metzger": true"#;
    std::fs::write(&path, garbage)?;

    let storage = JsonFileStore::new(&path);
    let record = ActivationStore::new(&storage).load().await;

    assert!(record.is_empty());
    assert_eq!(std::fs::read_to_string(&path)?, garbage);
    Ok(())
}

#[tokio::test]
async fn test_wrongly_typed_file_loads_empty() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("activations.json");

    for content in [
        r#"["2025-10"]"#,
        r#"{"2025-10": {"metzger": "yes"}}"#,
        r#"{"not-a-week": {"metzger": true}}"#,
    ] {
        std::fs::write(&path, content)?;
        let record = ActivationStore::new(&JsonFileStore::new(&path)).load().await;
        assert!(record.is_empty(), "{} should load as empty", content);
    }
    Ok(())
}

#[tokio::test]
async fn test_existing_file_format_is_read() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("activations.json");
    std::fs::write(
        &path,
        r#"{"2025-9": {"metzger": true, "baecker": false}, "2025-10": {"gemuese": true}}"#,
    )?;

    let record = ActivationStore::new(&JsonFileStore::new(&path)).load().await;
    assert!(record.is_active(week(2025, 9), &VendorId::from("metzger")));
    assert!(!record.is_active(week(2025, 9), &VendorId::from("baecker")));
    assert!(record.is_active(week(2025, 10), &VendorId::from("gemuese")));
    assert_eq!(record.week_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_broken_storage_never_fails_the_caller() {
    let storage = BrokenStorage;
    let store = ActivationStore::new(&storage);

    assert!(store.load().await.is_empty());

    let mut record = ActivationRecord::new();
    record.set_active(week(2025, 10), &VendorId::from("metzger"), true);
    assert!(!store.save(&record).await);
}

#[tokio::test]
async fn test_failed_save_still_shows_the_scanned_vendor() -> Result<()> {
    let today = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
    let directory: VendorDirectory = [("UID_A", "vendorA")].into_iter().collect();
    let service = MarketService::new(Arc::new(FixedClock::new(today)), directory, ScanMode::Explicit);

    let request = PageRequest {
        year: None,
        week: None,
        scan: Some(ScanRequest {
            uid: "UID_A".to_string(),
            action: Some("on".to_string()),
        }),
    };
    let overview = service.handle(&ReadOnlyStorage, &request).await?;

    assert!(!overview.persisted);
    assert_eq!(overview.displayed, week(2025, 10));
    let active: Vec<&str> = overview.active_vendors.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(active, vec!["vendorA"]);

    // nothing to write, nothing to report
    let overview = service.handle(&ReadOnlyStorage, &PageRequest::default()).await?;
    assert!(overview.persisted);
    assert!(overview.active_vendors.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_memory_store_keeps_state_between_loads() {
    let storage = MemoryStore::new();
    let store = ActivationStore::new(&storage);

    let mut record = store.load().await;
    record.toggle_active(week(2026, 42), &VendorId::from("baecker"));
    assert!(store.save(&record).await);

    assert!(store
        .load()
        .await
        .is_active(week(2026, 42), &VendorId::from("baecker")));
}
