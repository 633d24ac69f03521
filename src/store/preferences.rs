//! Display settings and the customized medication catalog.
//!
//! Both documents are optional. Missing or damaged files fall back to
//! defaults so the diary always opens.

use super::files;
use crate::catalog::{default_medications, MedicationOption};
use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Presentation settings shown in report headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Diary owner's name.
    pub name: String,
    /// Color theme label.
    pub theme: String,
    /// Selected icon label.
    pub icon: String,
    /// Locale label, e.g. `es-ES`.
    pub locale: String,
    /// Timezone label, e.g. `Europe/Madrid`.
    pub timezone: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "Migraine Diary".to_string(),
            theme: "purple".to_string(),
            icon: "brain".to_string(),
            locale: "es-ES".to_string(),
            timezone: "Europe/Madrid".to_string(),
        }
    }
}

impl AppSettings {
    pub fn load(path: &Path) -> Self {
        files::load_or_default(path, Self::default)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        files::write_json_atomic(path, self)
    }
}

/// Load the medication catalog, or the built-in list if none was saved.
pub fn load_medications(path: &Path) -> Vec<MedicationOption> {
    files::load_or_default(path, default_medications)
}

pub fn save_medications(path: &Path, medications: &[MedicationOption]) -> Result<(), StoreError> {
    files::write_json_atomic(path, medications)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MedicationKind;
    use std::fs;

    #[test]
    fn test_settings_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"name":"Ana","theme":"teal"}"#).unwrap();

        let settings = AppSettings::load(&path);
        assert_eq!(settings.name, "Ana");
        assert_eq!(settings.theme, "teal");
        assert_eq!(settings.icon, AppSettings::default().icon);
    }

    #[test]
    fn test_settings_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = AppSettings {
            timezone: "America/Bogota".to_string(),
            ..AppSettings::default()
        };

        settings.save(&path).unwrap();
        assert_eq!(AppSettings::load(&path), settings);
    }

    #[test]
    fn test_settings_malformed_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2").unwrap();
        assert_eq!(AppSettings::load(&path), AppSettings::default());
    }

    #[test]
    fn test_medications_default_then_custom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medications.json");
        assert_eq!(load_medications(&path), default_medications());

        let custom = vec![MedicationOption {
            id: "riboflavin".to_string(),
            name: "Riboflavin".to_string(),
            dosage: "400mg".to_string(),
            kind: MedicationKind::Preventive,
        }];
        save_medications(&path, &custom).unwrap();
        assert_eq!(load_medications(&path), custom);
    }
}
