//! Local persistence.
//!
//! All data lives as JSON documents inside one data directory:
//!
//! - `episodes.json`: the episode collection, owned by [`EpisodeStore`]
//! - `settings.json`: display settings
//! - `medications.json`: the customized medication catalog

pub mod episodes;
pub mod files;
pub mod preferences;
pub mod validate;

pub use episodes::EpisodeStore;
pub use preferences::AppSettings;

use crate::catalog::MedicationOption;
use crate::error::StoreError;
use std::path::{Path, PathBuf};

pub const EPISODES_FILE: &str = "episodes.json";
pub const SETTINGS_FILE: &str = "settings.json";
pub const MEDICATIONS_FILE: &str = "medications.json";

/// Layout of the data directory.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn episodes_path(&self) -> PathBuf {
        self.root.join(EPISODES_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn medications_path(&self) -> PathBuf {
        self.root.join(MEDICATIONS_FILE)
    }

    pub fn open_episodes(&self) -> Result<EpisodeStore, StoreError> {
        EpisodeStore::open(self.episodes_path())
    }

    pub fn load_settings(&self) -> AppSettings {
        AppSettings::load(&self.settings_path())
    }

    pub fn save_settings(&self, settings: &AppSettings) -> Result<(), StoreError> {
        settings.save(&self.settings_path())
    }

    pub fn load_medications(&self) -> Vec<MedicationOption> {
        preferences::load_medications(&self.medications_path())
    }

    pub fn save_medications(&self, medications: &[MedicationOption]) -> Result<(), StoreError> {
        preferences::save_medications(&self.medications_path(), medications)
    }

    /// Forget the customized medication list so the defaults apply again.
    pub fn reset_medications(&self) -> Result<bool, StoreError> {
        let path = self.medications_path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_medications;

    #[test]
    fn test_paths() {
        let data = DataDir::new("/tmp/diary");
        assert_eq!(data.episodes_path(), PathBuf::from("/tmp/diary/episodes.json"));
        assert_eq!(data.settings_path(), PathBuf::from("/tmp/diary/settings.json"));
        assert_eq!(
            data.medications_path(),
            PathBuf::from("/tmp/diary/medications.json")
        );
    }

    #[test]
    fn test_reset_medications() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataDir::new(dir.path());

        assert!(!data.reset_medications().unwrap());

        let mut meds = default_medications();
        meds.truncate(2);
        data.save_medications(&meds).unwrap();
        assert_eq!(data.load_medications().len(), 2);

        assert!(data.reset_medications().unwrap());
        assert_eq!(data.load_medications(), default_medications());
    }
}
