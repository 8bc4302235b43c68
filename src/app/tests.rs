use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use chrono::{TimeZone, Utc};
use podcast_core::{MemoryStore, SharedStore};

use super::display::*;
use super::*;
use crate::paths::state_db_path_from_env;

const CATALOG: &str = r#"[
  {
    "id": "s1",
    "title": "Show A",
    "image": "https://img.example/a.png",
    "description": "A show",
    "genres": [1, 2],
    "updated": "2024-02-01T10:00:00.000Z",
    "seasons": [
      {
        "title": "First",
        "image": "https://img.example/a1.png",
        "episodes": [
          {"title": "Pilot", "description": "", "file": "https://cdn.example/a1e1.mp3"},
          {"title": "Second", "description": "", "file": "https://cdn.example/a1e2.mp3"}
        ]
      }
    ]
  }
]"#;

struct TempCatalog {
    dir: PathBuf,
}

impl TempCatalog {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!(
            "podcast-state-test-{}-{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or(0)
        ));
        fs::create_dir_all(&dir).expect("temp dir should be created");
        fs::write(dir.join("catalog.json"), CATALOG).expect("catalog should be written");
        Self { dir }
    }

    fn path(&self) -> PathBuf {
        self.dir.join("catalog.json")
    }
}

impl Drop for TempCatalog {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn memory_store() -> SharedStore {
    Rc::new(MemoryStore::new())
}

#[test]
fn truncate_adds_ellipsis_only_when_needed() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a much longer title", 10), "a much ...");
}

#[test]
fn format_timestamp_renders_local_minutes() {
    let at = Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 0).unwrap();
    let rendered = format_timestamp(&at);
    assert!(rendered.starts_with("2024-03-"));
    assert_eq!(rendered.matches(':').count(), 2);
}

#[test]
fn state_db_path_prefers_env_override() {
    let path = state_db_path_from_env(Some(OsString::from("/tmp/custom.db")))
        .expect("override should resolve");
    assert_eq!(path, PathBuf::from("/tmp/custom.db"));
}

#[test]
fn state_db_path_falls_back_to_data_dir() {
    if let Ok(path) = state_db_path_from_env(Some(OsString::new())) {
        assert!(path.ends_with("podcast-app/state.db"));
    }
}

#[test]
fn favourite_from_catalog_then_remove() {
    let catalog = TempCatalog::new();
    let store = memory_store();

    let message = add_favourite(&store, &catalog.path(), "s1", 1, 2).expect("add should work");
    assert_eq!(message, "Added favourite: s1-S1-E2 (Second)");
    let again = add_favourite(&store, &catalog.path(), "s1", 1, 2).expect("add is idempotent");
    assert!(again.starts_with("Already a favourite"));

    let listing = list_favourites(&store, false);
    assert!(listing.contains("s1-S1-E2"));
    assert!(listing.contains("E2: Second"));

    let removed = remove_favourite(&store, "s1-S1-E2").expect("remove should work");
    assert_eq!(removed, "Removed favourite: s1-S1-E2");
    assert_eq!(list_favourites(&store, false), "No favourites yet.");
    assert_eq!(
        remove_favourite(&store, "s1-S1-E2").expect("second remove is a no-op"),
        "Not a favourite: s1-S1-E2"
    );
}

#[test]
fn favourite_rejects_out_of_range_coordinates() {
    let catalog = TempCatalog::new();
    let store = memory_store();

    assert!(add_favourite(&store, &catalog.path(), "s1", 0, 1).is_err());
    assert!(add_favourite(&store, &catalog.path(), "s1", 1, 3).is_err());
    assert!(add_favourite(&store, &catalog.path(), "missing", 1, 1).is_err());
    assert!(add_favourite(&store, &catalog.dir.join("none.json"), "s1", 1, 1).is_err());
}

#[test]
fn favourite_reports_storage_failure() {
    let catalog = TempCatalog::new();
    let store: SharedStore = Rc::new(MemoryStore::with_quota(10));
    let err = add_favourite(&store, &catalog.path(), "s1", 1, 1)
        .expect_err("quota should make the write fail");
    assert!(format!("{err:#}").contains("quota"));
}

#[test]
fn grouped_listing_shows_each_show_once() {
    let catalog = TempCatalog::new();
    let store = memory_store();
    add_favourite(&store, &catalog.path(), "s1", 1, 2).expect("add");
    add_favourite(&store, &catalog.path(), "s1", 1, 1).expect("add");

    let listing = list_favourites(&store, true);
    assert!(listing.starts_with("Show A (2)"));
    let second = listing.find("s1-S1-E2").expect("listed");
    let first = listing.find("s1-S1-E1").expect("listed");
    assert!(second < first);
}

#[test]
fn progress_listing_and_clear() {
    let store = memory_store();
    assert_eq!(list_progress(&store), "No listening progress saved.");

    let mut progress = ProgressTracker::load(store.clone());
    let _ = progress.save(&EpisodeId::from("s1-S1-E1"), 65.0, 130.0);

    let listing = list_progress(&store);
    assert!(listing.contains("s1-S1-E1"));
    assert!(listing.contains("1:05"));
    assert!(listing.contains("2:10"));
    assert!(listing.contains("50%"));

    let cleared = clear_progress(&store).expect("clear should work");
    assert_eq!(cleared, "Cleared listening progress for 1 episode(s).");
    assert_eq!(list_progress(&store), "No listening progress saved.");
}

#[test]
fn theme_toggle_and_status() {
    let store = memory_store();
    assert_eq!(theme(&store, false).expect("read"), "Theme: light");
    assert_eq!(theme(&store, true).expect("toggle"), "Theme switched to dark");
    assert_eq!(
        status(&store),
        "Favourites: 0\nEpisodes with progress: 0\nTheme: dark"
    );
}
