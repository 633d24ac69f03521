//! The episode store.
//!
//! `EpisodeStore` owns the episode collection and is its only writer.
//! Everything else reads through [`EpisodeStore::list`] and requests changes
//! through `add`, `update`, `remove` or `import_from`. Every change rewrites
//! the whole backing file, so the last write wins.

use super::files;
use super::validate::{self, ValidationOutcome};
use crate::error::StoreError;
use crate::models::Episode;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Summary of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Episodes now in the store.
    pub imported: usize,
    /// Field repairs applied while validating the file.
    pub repairs: usize,
}

/// The persisted collection of episodes.
#[derive(Debug)]
pub struct EpisodeStore {
    path: PathBuf,
    episodes: Vec<Episode>,
}

impl EpisodeStore {
    /// Open the store backed by `path`.
    ///
    /// A missing file is an empty diary. A file that is not valid JSON is
    /// copied aside and treated as empty. Records that fail validation are
    /// dropped with a warning, after the original file has been copied aside.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let episodes = match files::read_optional(&path)? {
            None => {
                debug!("No episode file at {}, starting empty", path.display());
                Vec::new()
            }
            Some(content) => match validate::parse_collection(&content) {
                Ok(outcome) => Self::accept_loaded(&path, outcome),
                Err(e) => {
                    warn!("Episode file {} is not valid JSON: {}", path.display(), e);
                    files::set_aside(&path);
                    Vec::new()
                }
            },
        };

        info!("Loaded {} episode(s) from {}", episodes.len(), path.display());
        Ok(Self { path, episodes })
    }

    fn accept_loaded(path: &Path, outcome: ValidationOutcome) -> Vec<Episode> {
        if !outcome.is_clean() {
            for issue in &outcome.rejected {
                warn!("Dropping invalid episode: {}", issue);
            }
            files::set_aside(path);
        }
        if outcome.repairs > 0 {
            info!(
                "Repaired {} field(s) in {}; they are saved on the next change",
                outcome.repairs,
                path.display()
            );
        }
        outcome.episodes
    }

    /// Path of the backing file.
    #[allow(dead_code)] // Used by tests
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All episodes, in insertion order.
    pub fn list(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn get(&self, id: &str) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    #[allow(dead_code)] // Companion to len
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Add a new episode and return its id.
    ///
    /// An empty id is replaced by one derived from the current time. A
    /// caller-supplied id must not already exist.
    ///
    /// The episode is normalized and range-checked first; a rejected
    /// episode leaves the store and its file untouched.
    pub fn add(&mut self, mut episode: Episode) -> Result<String, StoreError> {
        if episode.id.trim().is_empty() {
            episode.id = self.assign_id(Utc::now().timestamp_millis());
        }
        let episode =
            validate::normalize_episode(self.episodes.len(), episode).map_err(StoreError::Invalid)?;
        if self.get(&episode.id).is_some() {
            return Err(StoreError::DuplicateId(episode.id));
        }

        let id = episode.id.clone();
        let mut next = self.episodes.clone();
        next.push(episode);
        self.replace_all(next)?;

        debug!("Added episode {}", id);
        Ok(id)
    }

    /// Replace the episode with the same id. Its position is kept.
    pub fn update(&mut self, episode: Episode) -> Result<(), StoreError> {
        let index = self.position(episode.id.trim())?;
        let episode = validate::normalize_episode(index, episode).map_err(StoreError::Invalid)?;

        let id = episode.id.clone();
        let mut next = self.episodes.clone();
        next[index] = episode;
        self.replace_all(next)?;

        debug!("Updated episode {}", id);
        Ok(())
    }

    /// Remove an episode by id and return it.
    pub fn remove(&mut self, id: &str) -> Result<Episode, StoreError> {
        let index = self.position(id)?;

        let mut next = self.episodes.clone();
        let removed = next.remove(index);
        self.replace_all(next)?;

        debug!("Removed episode {}", id);
        Ok(removed)
    }

    /// Write the collection verbatim to `path`.
    pub fn export_to(&self, path: &Path) -> Result<usize, StoreError> {
        files::write_json_atomic(path, &self.episodes)?;
        info!("Exported {} episode(s) to {}", self.episodes.len(), path.display());
        Ok(self.episodes.len())
    }

    /// Replace the whole collection with the contents of `path`.
    ///
    /// The file must parse and every record must validate; otherwise the
    /// store and its backing file are left untouched.
    pub fn import_from(&mut self, path: &Path) -> Result<ImportSummary, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;

        let outcome =
            validate::parse_collection(&content).map_err(|source| StoreError::MalformedFile {
                path: path.to_path_buf(),
                source,
            })?;

        if !outcome.is_clean() {
            return Err(StoreError::InvalidRecords {
                path: path.to_path_buf(),
                issues: outcome.rejected,
            });
        }

        let summary = ImportSummary {
            imported: outcome.episodes.len(),
            repairs: outcome.repairs,
        };
        self.replace_all(outcome.episodes)?;

        info!(
            "Imported {} episode(s) from {} ({} repair(s))",
            summary.imported,
            path.display(),
            summary.repairs
        );
        Ok(summary)
    }

    /// Pick an id from a millisecond timestamp, bumped until unused.
    pub(crate) fn assign_id(&self, now_millis: i64) -> String {
        let mut candidate = now_millis;
        while self.get(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }

    fn position(&self, id: &str) -> Result<usize, StoreError> {
        self.episodes
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Persist `next` first, then swap it in; a failed write leaves the
    /// in-memory collection unchanged.
    fn replace_all(&mut self, next: Vec<Episode>) -> Result<(), StoreError> {
        files::write_json_atomic(&self.path, &next)?;
        self.episodes = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_time, Mood};
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn episode(id: &str, day: u32, intensity: u8) -> Episode {
        let mut e = Episode::new(
            NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            parse_time("09:00").unwrap(),
            intensity,
        );
        e.id = id.to_string();
        e.duration = 1.5;
        e.medications = vec!["Ibuprofen (400mg)".to_string()];
        e
    }

    fn open_temp() -> (TempDir, EpisodeStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = EpisodeStore::open(dir.path().join("episodes.json")).unwrap();
        (dir, store)
    }

    fn ids(store: &EpisodeStore) -> Vec<&str> {
        store.list().iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let (_dir, store) = open_temp();
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_persists_and_reloads() {
        let (dir, mut store) = open_temp();
        store.add(episode("a", 1, 5)).unwrap();
        store.add(episode("b", 2, 8)).unwrap();

        let reopened = EpisodeStore::open(dir.path().join("episodes.json")).unwrap();
        assert_eq!(reopened.list(), store.list());
    }

    #[test]
    fn test_add_assigns_id_when_empty() {
        let (_dir, mut store) = open_temp();
        let id = store.add(episode("", 1, 5)).unwrap();
        assert!(!id.is_empty());
        assert!(id.parse::<i64>().is_ok());
        assert!(store.get(&id).is_some());
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let (_dir, mut store) = open_temp();
        store.add(episode("a", 1, 5)).unwrap();
        let err = store.add(episode("a", 2, 6)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(id) if id == "a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_assign_id_skips_taken_values() {
        let (_dir, mut store) = open_temp();
        store.add(episode("1000", 1, 5)).unwrap();
        store.add(episode("1001", 1, 5)).unwrap();
        assert_eq!(store.assign_id(1000), "1002");
        assert_eq!(store.assign_id(999), "999");
    }

    #[test]
    fn test_update_replaces_in_place() {
        let (dir, mut store) = open_temp();
        for (id, day) in [("a", 1), ("b", 2), ("c", 3)] {
            store.add(episode(id, day, 4)).unwrap();
        }

        let mut changed = episode("b", 2, 9);
        changed.mood = Some(Mood::Bad);
        store.update(changed.clone()).unwrap();

        assert_eq!(ids(&store), vec!["a", "b", "c"]);
        assert_eq!(store.get("b"), Some(&changed));

        let reopened = EpisodeStore::open(dir.path().join("episodes.json")).unwrap();
        assert_eq!(ids(&reopened), vec!["a", "b", "c"]);
        assert_eq!(reopened.get("b"), Some(&changed));
    }

    #[test]
    fn test_add_rejects_out_of_range_values() {
        let (dir, mut store) = open_temp();
        store.add(episode("keep", 1, 5)).unwrap();
        let path = dir.path().join("episodes.json");
        let on_disk = fs::read_to_string(&path).unwrap();

        let mut too_stressed = episode("stress", 2, 5);
        too_stressed.stress_level = 0;
        let mut no_sleep = episode("sleep", 3, 5);
        no_sleep.sleep_hours = Some(-1.0);
        let mut endless = episode("duration", 4, 5);
        endless.duration = f64::NAN;

        for bad in [episode("hot", 2, 11), too_stressed, no_sleep, endless] {
            let id = bad.id.clone();
            let err = store.add(bad).unwrap_err();
            assert!(matches!(err, StoreError::Invalid(_)), "{id}: {err}");
        }

        let err = store.add(episode("hot", 2, 11)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid episode: record 1 (id hot): intensity 11 is outside 1-10 or not a whole number"
        );
        assert_eq!(ids(&store), vec!["keep"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), on_disk);
    }

    #[test]
    fn test_update_rejects_out_of_range_values() {
        let (dir, mut store) = open_temp();
        store.add(episode("a", 1, 5)).unwrap();
        let path = dir.path().join("episodes.json");
        let on_disk = fs::read_to_string(&path).unwrap();

        let err = store.update(episode("a", 1, 0)).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert_eq!(store.get("a").unwrap().intensity, 5);
        assert_eq!(fs::read_to_string(&path).unwrap(), on_disk);
    }

    #[test]
    fn test_add_normalizes_and_survives_export_import() {
        let (dir, mut store) = open_temp();
        let mut messy = episode(" m1 ", 6, 6);
        messy.triggers = vec![" Stress".to_string(), "Stress".to_string(), "".to_string()];
        messy.symptoms = vec!["Aura ".to_string()];
        messy.weather = Some("   ".to_string());
        messy.notes = Some(" slept badly ".to_string());
        store.add(messy).unwrap();

        let saved = store.get("m1").unwrap();
        assert_eq!(saved.triggers, vec!["Stress"]);
        assert_eq!(saved.symptoms, vec!["Aura"]);
        assert_eq!(saved.weather, None);
        assert_eq!(saved.notes.as_deref(), Some("slept badly"));

        let export_path = dir.path().join("backup.json");
        store.export_to(&export_path).unwrap();
        let before = store.list().to_vec();
        let summary = store.import_from(&export_path).unwrap();
        assert_eq!(summary.repairs, 0);
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn test_update_unknown_id() {
        let (_dir, mut store) = open_temp();
        let err = store.update(episode("ghost", 1, 4)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_remove_keeps_others_in_order() {
        let (dir, mut store) = open_temp();
        for (id, day) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            store.add(episode(id, day, 4)).unwrap();
        }

        let removed = store.remove("b").unwrap();
        assert_eq!(removed.id, "b");
        assert_eq!(ids(&store), vec!["a", "c", "d"]);

        let reopened = EpisodeStore::open(dir.path().join("episodes.json")).unwrap();
        assert_eq!(ids(&reopened), vec!["a", "c", "d"]);

        assert!(matches!(store.remove("b"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_export_then_import_is_identity() {
        let (dir, mut store) = open_temp();
        let mut rich = episode("x", 5, 7);
        rich.triggers = vec!["Stress".to_string(), "Bright light".to_string()];
        rich.symptoms = vec!["Aura".to_string()];
        rich.relieved_by = vec!["Sleep".to_string()];
        rich.mood = Some(Mood::Terrible);
        rich.weather = Some("Storm".to_string());
        rich.sleep_hours = Some(5.25);
        rich.notes = Some("left side".to_string());
        store.add(rich).unwrap();
        store.add(episode("y", 9, 3)).unwrap();
        store.add(episode("z", 2, 10)).unwrap();
        let before = store.list().to_vec();

        let export_path = dir.path().join("backup.json");
        assert_eq!(store.export_to(&export_path).unwrap(), 3);

        let other_dir = tempfile::tempdir().unwrap();
        let mut other = EpisodeStore::open(other_dir.path().join("episodes.json")).unwrap();
        other.add(episode("stale", 1, 1)).unwrap();
        let summary = other.import_from(&export_path).unwrap();

        assert_eq!(summary.imported, 3);
        assert_eq!(summary.repairs, 0);
        assert_eq!(other.list(), before.as_slice());
    }

    #[test]
    fn test_import_invalid_leaves_store_unchanged() {
        let (dir, mut store) = open_temp();
        store.add(episode("keep", 1, 5)).unwrap();
        let on_disk = fs::read_to_string(store.path()).unwrap();

        let bad = dir.path().join("bad.json");
        fs::write(
            &bad,
            r#"[{"id":"1","date":"2024-01-01","time":"10:00","intensity":15}]"#,
        )
        .unwrap();
        let err = store.import_from(&bad).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecords { ref issues, .. } if issues.len() == 1));

        let garbage = dir.path().join("garbage.json");
        fs::write(&garbage, "not json at all").unwrap();
        let err = store.import_from(&garbage).unwrap_err();
        assert!(matches!(err, StoreError::MalformedFile { .. }));

        assert_eq!(ids(&store), vec!["keep"]);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), on_disk);
    }

    #[test]
    fn test_open_malformed_file_starts_empty_and_keeps_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episodes.json");
        fs::write(&path, "[{ broken").unwrap();

        let store = EpisodeStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("episodes.json.corrupt")).unwrap(),
            "[{ broken"
        );
    }

    #[test]
    fn test_open_drops_invalid_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episodes.json");
        fs::write(
            &path,
            r#"[
                {"id":"1","date":"2024-01-01","time":"10:00","intensity":5,"duration":2,"stressLevel":2},
                {"id":"2","date":"not a date","time":"10:00","intensity":5},
                {"id":3,"date":"2024-01-03","time":"11:30","intensity":"8","mood":"muy bien"}
            ]"#,
        )
        .unwrap();

        let store = EpisodeStore::open(&path).unwrap();
        assert_eq!(ids(&store), vec!["1", "3"]);
        assert_eq!(store.get("3").unwrap().mood, Some(Mood::Great));
        assert!(dir.path().join("episodes.json.corrupt").exists());
    }
}
