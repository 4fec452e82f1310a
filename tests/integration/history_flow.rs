//! End-to-end flows over a SQLite-backed store: record, reload, replay, export

use super::common::determinism::DeterministicUuidGenerator;
use super::common::fixtures::{record_at, response_json, CENTER};
use qexplore::config::DisplaySettings;
use qexplore::export::{export_gpx, export_json};
use qexplore::history::{GenerationResponse, ResultType};
use qexplore::units::{self, MeasurementUnit, UnitSystem};
use qexplore::{Database, HistoryRecord, HistoryStore, ReplayEngine, SqliteStore};
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> (Database, HistoryStore) {
    let db = Database::open(dir.path().join("qexplore.db")).expect("Failed to open database");
    let store = HistoryStore::new(SqliteStore::from_database(&db));
    (db, store)
}

#[test]
fn test_generation_survives_reload_and_replays() {
    let dir = TempDir::new().unwrap();
    let response: GenerationResponse =
        serde_json::from_value(response_json("gen-paris", 30, ResultType::Void)).unwrap();
    {
        let (_db, mut store) = open_store(&dir);
        let record = HistoryRecord::from_response(&response).unwrap();
        assert_eq!(store.add(record).unwrap(), 1);
    }

    let (db, mut store) = open_store(&dir);
    let kv = SqliteStore::from_database(&db);
    let mut settings = DisplaySettings::load(&kv);
    settings.set("units", "imperial").unwrap();
    settings.save(&kv).unwrap();
    let settings = DisplaySettings::load(&kv);

    let state = ReplayEngine::replay(&mut store, "gen-paris", &settings).unwrap();
    assert_eq!(state.map.center, CENTER);
    assert_eq!(state.request.radius, 4000.0);
    assert_eq!(state.radius_display.unit, MeasurementUnit::Miles);
    assert_eq!(
        state.radius_display.value,
        units::from_canonical(4000.0, UnitSystem::Imperial.radius_unit())
    );
    assert_eq!(state.result_type, ResultType::Void);
    assert_eq!(state.active_winner().unwrap().circle_id, "petal_0");
    // Petal geometry is not kept
    assert!(state.view.circles.is_empty());
    assert_eq!(state.request, response.request);
}

#[test]
fn test_capacity_holds_across_reloads() {
    let dir = TempDir::new().unwrap();
    let ids = DeterministicUuidGenerator::new();
    let mut all = Vec::new();
    {
        let (_db, mut store) = open_store(&dir);
        for minute in 0..120 {
            let id = ids.next_id();
            all.push(id.clone());
            store.add(record_at(id, minute)).unwrap();
        }
    }

    let (_db, mut store) = open_store(&dir);
    let kept: Vec<String> = store.list().map(|r| r.id().to_string()).collect();
    assert_eq!(kept.len(), qexplore::MAX_HISTORY_ENTRIES);
    let newest_first: Vec<String> = all.iter().rev().take(100).cloned().collect();
    assert_eq!(kept, newest_first);
}

#[test]
fn test_json_export_restores_into_fresh_store() {
    let source_dir = TempDir::new().unwrap();
    let target_dir = TempDir::new().unwrap();
    let (_db, mut source) = open_store(&source_dir);
    for minute in [5, 1, 9] {
        source.add(record_at(format!("rec-{}", minute), minute)).unwrap();
    }
    let exported = export_json(source.list()).unwrap();

    let (_db2, mut target) = open_store(&target_dir);
    let report = target.import_bulk(&exported).unwrap();
    assert_eq!(report.accepted, 3);

    let source_records: Vec<HistoryRecord> = source.list().cloned().collect();
    let target_records: Vec<HistoryRecord> = target.list().cloned().collect();
    assert_eq!(source_records, target_records);

    // Importing the same file again is a no-op
    let again = target.import_bulk(&exported).unwrap();
    assert_eq!(again.accepted, 0);
    assert_eq!(again.duplicates, 3);
}

#[test]
fn test_gpx_export_has_waypoint_per_record() {
    let dir = TempDir::new().unwrap();
    let (_db, mut store) = open_store(&dir);
    store.add(record_at("11111111-aaaa", 1)).unwrap();
    store.add(record_at("22222222-bbbb", 2)).unwrap();

    let gpx = export_gpx(store.list());
    assert_eq!(gpx.matches("<wpt ").count(), 2);
    assert!(gpx.contains("<name>q-explore 22222222</name>"));
    assert!(gpx.find("22222222").unwrap() < gpx.find("11111111").unwrap());
}

#[test]
fn test_delete_and_clear_persist() {
    let dir = TempDir::new().unwrap();
    {
        let (_db, mut store) = open_store(&dir);
        store.add(record_at("keep", 1)).unwrap();
        store.add(record_at("drop", 2)).unwrap();
        assert!(store.remove("drop").unwrap());
        assert!(!store.remove("drop").unwrap());
    }
    {
        let (_db, mut store) = open_store(&dir);
        let ids: Vec<&str> = store.list().map(|r| r.id()).collect();
        assert_eq!(ids, ["keep"]);
        store.clear().unwrap();
    }
    let (_db, mut store) = open_store(&dir);
    assert!(store.is_empty());
}
